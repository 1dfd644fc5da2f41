//! Nominee Registry Tests
//!
//! Ownership checks, the status machine, access-code issue and
//! verification, and best-effort side effects routed to the advisory sink.

mod common;

use common::*;
use sampatti_core::{
    AccessError, AccessOrigin, AccessTier, CodeSource, NomineeStatus, NomineeUpdate, Principal,
};
use sampatti_server::core::{AdvisoryOperation, ACTION_CODE_VERIFIED};
use sampatti_server::{MemoryStore, NomineeRegistry, VaultStore};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use uuid::Uuid;

/// Hands out a fixed script of codes
#[derive(Debug)]
struct ScriptedCodes(Mutex<VecDeque<String>>);

impl ScriptedCodes {
    fn new(codes: &[&str]) -> Self {
        Self(Mutex::new(codes.iter().map(|c| c.to_string()).collect()))
    }
}

impl CodeSource for ScriptedCodes {
    fn generate(&self) -> String {
        self.0.lock().unwrap().pop_front().expect("code script exhausted")
    }
}

fn origin() -> AccessOrigin {
    AccessOrigin::new("203.0.113.7", "integration-test")
}

// =============================================================================
// Records and ownership
// =============================================================================

#[tokio::test]
async fn test_create_starts_pending_without_code() {
    let store = Arc::new(MemoryStore::new());
    let owner = seed_owner(store.as_ref(), "owner@example.com").await;
    let registry = registry(store.clone(), Arc::default());

    let nominee = registry
        .create(owner.id, new_nominee("asha@example.com", AccessTier::Full))
        .await
        .unwrap();

    assert_eq!(nominee.status, NomineeStatus::Pending);
    assert!(!nominee.has_access_code());
    assert_eq!(nominee.last_access_date, None);
    assert_eq!(registry.list(owner.id).await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_duplicate_email_per_owner_rejected() {
    let store = Arc::new(MemoryStore::new());
    let owner = seed_owner(store.as_ref(), "owner@example.com").await;
    let other = seed_owner(store.as_ref(), "other@example.com").await;
    let registry = registry(store.clone(), Arc::default());

    registry
        .create(owner.id, new_nominee("asha@example.com", AccessTier::Full))
        .await
        .unwrap();

    let err = registry
        .create(owner.id, new_nominee("asha@example.com", AccessTier::Limited))
        .await
        .unwrap_err();
    assert_eq!(err, AccessError::NomineeExists);

    // Same email under another owner is a different nominee
    assert!(registry
        .create(other.id, new_nominee("asha@example.com", AccessTier::Limited))
        .await
        .is_ok());
}

#[tokio::test]
async fn test_invalid_input_rejected() {
    let store = Arc::new(MemoryStore::new());
    let owner = seed_owner(store.as_ref(), "owner@example.com").await;
    let registry = registry(store.clone(), Arc::default());

    let mut blank_name = new_nominee("asha@example.com", AccessTier::Full);
    blank_name.name = "  ".into();
    assert!(matches!(
        registry.create(owner.id, blank_name).await,
        Err(AccessError::InvalidInput(_))
    ));

    assert!(matches!(
        registry
            .create(owner.id, new_nominee("not-an-email", AccessTier::Full))
            .await,
        Err(AccessError::InvalidInput(_))
    ));
}

#[tokio::test]
async fn test_foreign_owner_cannot_touch_nominee() {
    let store = Arc::new(MemoryStore::new());
    let owner = seed_owner(store.as_ref(), "owner@example.com").await;
    let intruder = seed_owner(store.as_ref(), "intruder@example.com").await;
    let registry = registry(store.clone(), Arc::default());

    let nominee = registry
        .create(owner.id, new_nominee("asha@example.com", AccessTier::Full))
        .await
        .unwrap();

    assert_eq!(
        registry.get(nominee.id, intruder.id).await.unwrap_err(),
        AccessError::Unauthorized
    );
    assert_eq!(
        registry.generate_invite(nominee.id, intruder.id).await.unwrap_err(),
        AccessError::Unauthorized
    );
    assert_eq!(
        registry.revoke(nominee.id, intruder.id).await.unwrap_err(),
        AccessError::Unauthorized
    );
    assert_eq!(
        registry.delete(nominee.id, intruder.id).await.unwrap_err(),
        AccessError::Unauthorized
    );
    assert_eq!(
        registry.get(Uuid::new_v4(), owner.id).await.unwrap_err(),
        AccessError::NomineeNotFound
    );

    let untouched = registry.get(nominee.id, owner.id).await.unwrap();
    assert_eq!(untouched.status, NomineeStatus::Pending);
}

#[tokio::test]
async fn test_update_preserves_email_status_and_code() {
    let store = Arc::new(MemoryStore::new());
    let owner = seed_owner(store.as_ref(), "owner@example.com").await;
    let registry = registry(store.clone(), Arc::default());

    let nominee = registry
        .create(owner.id, new_nominee("asha@example.com", AccessTier::Full))
        .await
        .unwrap();
    registry.send_invitation(nominee.id, owner.id).await.unwrap();
    let before = store.get_nominee(nominee.id).await.unwrap().unwrap();

    let updated = registry
        .update(
            nominee.id,
            owner.id,
            NomineeUpdate {
                name: "Asha K".into(),
                phone_number: "555-0100".into(),
                relationship: "Sibling".into(),
                access_level: AccessTier::DocumentsOnly,
            },
        )
        .await
        .unwrap();

    assert_eq!(updated.name, "Asha K");
    assert_eq!(updated.access_level, AccessTier::DocumentsOnly);
    assert_eq!(updated.email, before.email);
    assert_eq!(updated.status, NomineeStatus::Active);
    assert_eq!(updated.access_code_hash, before.access_code_hash);
}

// =============================================================================
// Access codes and verification
// =============================================================================

#[tokio::test]
async fn test_invite_stores_only_a_hash() {
    let store = Arc::new(MemoryStore::new());
    let owner = seed_owner(store.as_ref(), "owner@example.com").await;
    let registry = registry(store.clone(), Arc::default());

    let nominee = registry
        .create(owner.id, new_nominee("asha@example.com", AccessTier::Full))
        .await
        .unwrap();
    let code = registry.generate_invite(nominee.id, owner.id).await.unwrap();
    assert_eq!(code, ACCESS_CODE);

    let stored = store.get_nominee(nominee.id).await.unwrap().unwrap();
    let hash = stored.access_code_hash.unwrap();
    assert_ne!(hash, code);
    assert!(hash.starts_with("$argon2id$"));
    // Generating a code does not activate
    assert_eq!(stored.status, NomineeStatus::Pending);
}

#[tokio::test]
async fn test_verify_activates_logs_and_stamps() {
    let store = Arc::new(MemoryStore::new());
    let owner = seed_owner(store.as_ref(), "owner@example.com").await;
    let advisory = Arc::new(RecordingAdvisory::default());
    let registry = registry(store.clone(), advisory.clone());

    let nominee = registry
        .create(owner.id, new_nominee("asha@example.com", AccessTier::Limited))
        .await
        .unwrap();
    registry.generate_invite(nominee.id, owner.id).await.unwrap();

    let verified = registry
        .verify_access_code("asha@example.com", owner.id, ACCESS_CODE, &origin())
        .await
        .unwrap();
    assert_eq!(verified.status, NomineeStatus::Active);
    assert!(verified.last_access_date.is_some());

    let stored = store.get_nominee(nominee.id).await.unwrap().unwrap();
    assert_eq!(stored.status, NomineeStatus::Active);
    assert!(stored.last_access_date.is_some());

    let logs = store.list_access_logs(nominee.id).await.unwrap();
    assert_eq!(logs.len(), 1);
    assert_eq!(logs[0].action, ACTION_CODE_VERIFIED);
    assert_eq!(logs[0].ip_address, "203.0.113.7");
    assert_eq!(logs[0].device_info, "integration-test");

    assert!(advisory.failures().is_empty());
}

#[tokio::test]
async fn test_second_invite_supersedes_first() {
    let store = Arc::new(MemoryStore::new());
    let owner = seed_owner(store.as_ref(), "owner@example.com").await;
    let registry = NomineeRegistry::new(
        store.clone(),
        fast_verifier(),
        Arc::new(ScriptedCodes::new(&["FIRST111", "SECOND22"])),
        Arc::new(RecordingAdvisory::default()),
    );

    let nominee = registry
        .create(owner.id, new_nominee("asha@example.com", AccessTier::Full))
        .await
        .unwrap();
    let first = registry.generate_invite(nominee.id, owner.id).await.unwrap();
    let second = registry.generate_invite(nominee.id, owner.id).await.unwrap();
    assert_ne!(first, second);

    assert_eq!(
        registry
            .verify_access_code("asha@example.com", owner.id, &first, &origin())
            .await
            .unwrap_err(),
        AccessError::InvalidAccessCode
    );
    assert!(registry
        .verify_access_code("asha@example.com", owner.id, &second, &origin())
        .await
        .is_ok());
}

#[tokio::test]
async fn test_full_nominee_end_to_end() {
    let store = Arc::new(MemoryStore::new());
    let owner = seed_owner(store.as_ref(), "owner@example.com").await;
    let registry = registry(store.clone(), Arc::default());
    let codec = codec();

    let nominee = registry
        .create(owner.id, new_nominee("asha@example.com", AccessTier::Full))
        .await
        .unwrap();
    let code = registry.generate_invite(nominee.id, owner.id).await.unwrap();
    assert_eq!(code, "AB12CD34");

    let verified = registry
        .verify_access_code("asha@example.com", owner.id, &code, &origin())
        .await
        .unwrap();
    assert_eq!(verified.status, NomineeStatus::Active);
    assert_eq!(store.list_access_logs(nominee.id).await.unwrap().len(), 1);

    let token = codec
        .issue_nominee_token(verified.id, verified.user_id, verified.access_level)
        .unwrap();
    assert_eq!(
        codec.validate(&token).unwrap(),
        Principal::nominee(nominee.id, owner.id, AccessTier::Full)
    );

    assert_eq!(
        registry
            .verify_access_code("asha@example.com", owner.id, "wrongcode", &origin())
            .await
            .unwrap_err(),
        AccessError::InvalidAccessCode
    );
    assert_eq!(store.list_access_logs(nominee.id).await.unwrap().len(), 1);
    let stored = store.get_nominee(nominee.id).await.unwrap().unwrap();
    assert_eq!(stored.status, NomineeStatus::Active);
}

#[tokio::test]
async fn test_wrong_code_changes_nothing() {
    let store = Arc::new(MemoryStore::new());
    let owner = seed_owner(store.as_ref(), "owner@example.com").await;
    let registry = registry(store.clone(), Arc::default());

    let nominee = registry
        .create(owner.id, new_nominee("asha@example.com", AccessTier::Full))
        .await
        .unwrap();
    registry.generate_invite(nominee.id, owner.id).await.unwrap();

    let err = registry
        .verify_access_code("asha@example.com", owner.id, "wrongcode", &origin())
        .await
        .unwrap_err();
    assert_eq!(err, AccessError::InvalidAccessCode);

    let stored = store.get_nominee(nominee.id).await.unwrap().unwrap();
    assert_eq!(stored.status, NomineeStatus::Pending);
    assert_eq!(stored.last_access_date, None);
    assert!(store.list_access_logs(nominee.id).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_verify_without_code_or_nominee() {
    let store = Arc::new(MemoryStore::new());
    let owner = seed_owner(store.as_ref(), "owner@example.com").await;
    let registry = registry(store.clone(), Arc::default());

    registry
        .create(owner.id, new_nominee("asha@example.com", AccessTier::Full))
        .await
        .unwrap();

    assert_eq!(
        registry
            .verify_access_code("asha@example.com", owner.id, ACCESS_CODE, &origin())
            .await
            .unwrap_err(),
        AccessError::NoAccessCodeSet
    );
    assert_eq!(
        registry
            .verify_access_code("nobody@example.com", owner.id, ACCESS_CODE, &origin())
            .await
            .unwrap_err(),
        AccessError::NomineeNotFound
    );
    // Right email, wrong owner
    assert_eq!(
        registry
            .verify_access_code("asha@example.com", Uuid::new_v4(), ACCESS_CODE, &origin())
            .await
            .unwrap_err(),
        AccessError::NomineeNotFound
    );
}

#[tokio::test]
async fn test_verify_is_repeatable_while_active() {
    let store = Arc::new(MemoryStore::new());
    let owner = seed_owner(store.as_ref(), "owner@example.com").await;
    let registry = registry(store.clone(), Arc::default());

    let nominee = registry
        .create(owner.id, new_nominee("asha@example.com", AccessTier::Full))
        .await
        .unwrap();
    registry.send_invitation(nominee.id, owner.id).await.unwrap();

    for _ in 0..2 {
        let verified = registry
            .verify_access_code("asha@example.com", owner.id, ACCESS_CODE, &origin())
            .await
            .unwrap();
        assert_eq!(verified.status, NomineeStatus::Active);
    }
    assert_eq!(store.list_access_logs(nominee.id).await.unwrap().len(), 2);
}

#[tokio::test]
async fn test_revoked_is_terminal() {
    let store = Arc::new(MemoryStore::new());
    let owner = seed_owner(store.as_ref(), "owner@example.com").await;
    let registry = registry(store.clone(), Arc::default());

    let nominee = registry
        .create(owner.id, new_nominee("asha@example.com", AccessTier::Full))
        .await
        .unwrap();
    registry.send_invitation(nominee.id, owner.id).await.unwrap();
    let revoked = registry.revoke(nominee.id, owner.id).await.unwrap();
    assert_eq!(revoked.status, NomineeStatus::Revoked);

    assert_eq!(
        registry
            .verify_access_code("asha@example.com", owner.id, ACCESS_CODE, &origin())
            .await
            .unwrap_err(),
        AccessError::NomineeRevoked
    );
    assert_eq!(
        registry.generate_invite(nominee.id, owner.id).await.unwrap_err(),
        AccessError::NomineeRevoked
    );
    assert!(matches!(
        registry.activate(nominee.id, owner.id).await,
        Err(AccessError::InvalidTransition { .. })
    ));

    // A wrong code against a revoked nominee reads as a wrong code
    assert_eq!(
        registry
            .verify_access_code("asha@example.com", owner.id, "wrongcode", &origin())
            .await
            .unwrap_err(),
        AccessError::InvalidAccessCode
    );

    let stored = store.get_nominee(nominee.id).await.unwrap().unwrap();
    assert_eq!(stored.status, NomineeStatus::Revoked);
    assert!(store.list_access_logs(nominee.id).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_revocation_during_verify_is_not_undone() {
    let store = Arc::new(FlakyStore::default());
    let owner = seed_owner(store.as_ref(), "owner@example.com").await;
    let advisory = Arc::new(RecordingAdvisory::default());
    let registry = registry(store.clone(), advisory.clone());

    let nominee = registry
        .create(owner.id, new_nominee("asha@example.com", AccessTier::Full))
        .await
        .unwrap();
    registry.generate_invite(nominee.id, owner.id).await.unwrap();

    // Owner revokes after the registry has read the Pending record
    store.revoke_after_next_lookup();
    assert_eq!(
        registry
            .verify_access_code("asha@example.com", owner.id, ACCESS_CODE, &origin())
            .await
            .unwrap_err(),
        AccessError::NomineeRevoked
    );

    let stored = store.get_nominee(nominee.id).await.unwrap().unwrap();
    assert_eq!(stored.status, NomineeStatus::Revoked);
    assert_eq!(stored.last_access_date, None);
    assert!(store.list_access_logs(nominee.id).await.unwrap().is_empty());
    assert!(advisory.failures().is_empty());
}

#[tokio::test]
async fn test_revocation_during_activate_is_not_undone() {
    let store = Arc::new(FlakyStore::default());
    let owner = seed_owner(store.as_ref(), "owner@example.com").await;
    let registry = registry(store.clone(), Arc::default());

    let nominee = registry
        .create(owner.id, new_nominee("asha@example.com", AccessTier::Full))
        .await
        .unwrap();

    store.revoke_after_next_lookup();
    assert_eq!(
        registry.activate(nominee.id, owner.id).await.unwrap_err(),
        AccessError::InvalidTransition {
            from: NomineeStatus::Revoked,
            to: NomineeStatus::Active,
        }
    );

    let stored = store.get_nominee(nominee.id).await.unwrap().unwrap();
    assert_eq!(stored.status, NomineeStatus::Revoked);
}

#[tokio::test]
async fn test_delete_during_verify_fails() {
    let store = Arc::new(FlakyStore::default());
    let owner = seed_owner(store.as_ref(), "owner@example.com").await;
    let advisory = Arc::new(RecordingAdvisory::default());
    let registry = registry(store.clone(), advisory.clone());

    let nominee = registry
        .create(owner.id, new_nominee("asha@example.com", AccessTier::Full))
        .await
        .unwrap();
    registry.generate_invite(nominee.id, owner.id).await.unwrap();

    store.delete_after_next_lookup();

    assert_eq!(
        registry
            .verify_access_code("asha@example.com", owner.id, ACCESS_CODE, &origin())
            .await
            .unwrap_err(),
        AccessError::NomineeNotFound
    );
    assert!(advisory.failures().is_empty());
    assert!(store.list_access_logs(nominee.id).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_padded_email_verifies() {
    let store = Arc::new(MemoryStore::new());
    let owner = seed_owner(store.as_ref(), "owner@example.com").await;
    let registry = registry(store.clone(), Arc::default());

    let nominee = registry
        .create(owner.id, new_nominee("  asha@example.com ", AccessTier::Limited))
        .await
        .unwrap();
    assert_eq!(nominee.email, "asha@example.com");

    // The padded spelling is the same nominee
    assert_eq!(
        registry
            .create(owner.id, new_nominee("asha@example.com", AccessTier::Limited))
            .await
            .unwrap_err(),
        AccessError::NomineeExists
    );

    registry.generate_invite(nominee.id, owner.id).await.unwrap();
    for email in ["asha@example.com", " asha@example.com "] {
        let verified = registry
            .verify_access_code(email, owner.id, ACCESS_CODE, &origin())
            .await
            .unwrap();
        assert_eq!(verified.id, nominee.id);
    }
}

// =============================================================================
// Primary writes
// =============================================================================

#[tokio::test]
async fn test_failed_code_rotation_keeps_previous_code() {
    let store = Arc::new(FlakyStore::default());
    let owner = seed_owner(store.as_ref(), "owner@example.com").await;
    let registry = NomineeRegistry::new(
        store.clone(),
        fast_verifier(),
        Arc::new(ScriptedCodes::new(&["FIRST111", "SECOND22"])),
        Arc::new(RecordingAdvisory::default()),
    );

    let nominee = registry
        .create(owner.id, new_nominee("asha@example.com", AccessTier::Full))
        .await
        .unwrap();
    assert_eq!(
        registry.generate_invite(nominee.id, owner.id).await.unwrap(),
        "FIRST111"
    );

    store.set_primary_failing(true);
    assert!(matches!(
        registry.generate_invite(nominee.id, owner.id).await,
        Err(AccessError::Storage(_))
    ));
    store.set_primary_failing(false);

    registry
        .verify_access_code("asha@example.com", owner.id, "FIRST111", &origin())
        .await
        .unwrap();
    assert_eq!(
        registry
            .verify_access_code("asha@example.com", owner.id, "SECOND22", &origin())
            .await
            .unwrap_err(),
        AccessError::InvalidAccessCode
    );
}

#[tokio::test]
async fn test_failed_record_writes_propagate() {
    let store = Arc::new(FlakyStore::default());
    let owner = seed_owner(store.as_ref(), "owner@example.com").await;
    let registry = registry(store.clone(), Arc::default());

    let nominee = registry
        .create(owner.id, new_nominee("asha@example.com", AccessTier::Full))
        .await
        .unwrap();

    store.set_primary_failing(true);
    assert!(matches!(
        registry
            .create(owner.id, new_nominee("ravi@example.com", AccessTier::Limited))
            .await,
        Err(AccessError::Storage(_))
    ));
    assert!(matches!(
        registry
            .update(
                nominee.id,
                owner.id,
                NomineeUpdate {
                    name: "Renamed".into(),
                    phone_number: String::new(),
                    relationship: "Sister".into(),
                    access_level: AccessTier::Limited,
                },
            )
            .await,
        Err(AccessError::Storage(_))
    ));
    assert!(matches!(
        registry.delete(nominee.id, owner.id).await,
        Err(AccessError::Storage(_))
    ));
    store.set_primary_failing(false);

    let stored = registry.list(owner.id).await.unwrap();
    assert_eq!(stored.len(), 1);
    assert_eq!(stored[0].name, nominee.name);
    assert_eq!(stored[0].access_level, AccessTier::Full);
}

// =============================================================================
// Best-effort side effects
// =============================================================================

#[tokio::test]
async fn test_side_effect_failures_are_advisory() {
    let store = Arc::new(FlakyStore::default());
    let owner = seed_owner(store.as_ref(), "owner@example.com").await;
    let advisory = Arc::new(RecordingAdvisory::default());
    let registry = registry(store.clone(), advisory.clone());

    let nominee = registry
        .create(owner.id, new_nominee("asha@example.com", AccessTier::Full))
        .await
        .unwrap();
    registry.generate_invite(nominee.id, owner.id).await.unwrap();

    store.set_failing(true);
    let verified = registry
        .verify_access_code("asha@example.com", owner.id, ACCESS_CODE, &origin())
        .await
        .unwrap();
    store.set_failing(false);

    // The caller sees the transition even though it was not persisted
    assert_eq!(verified.status, NomineeStatus::Active);

    let operations: Vec<AdvisoryOperation> =
        advisory.failures().iter().map(|f| f.operation).collect();
    assert_eq!(
        operations,
        vec![
            AdvisoryOperation::StatusTransition,
            AdvisoryOperation::AccessLog,
            AdvisoryOperation::LastAccess,
        ]
    );
    assert!(advisory.failures().iter().all(|f| f.nominee_id == nominee.id));

    let stored = store.get_nominee(nominee.id).await.unwrap().unwrap();
    assert_eq!(stored.status, NomineeStatus::Pending);
    assert!(store.list_access_logs(nominee.id).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_explicit_log_action_is_strict() {
    let store = Arc::new(FlakyStore::default());
    let owner = seed_owner(store.as_ref(), "owner@example.com").await;
    let registry = registry(store.clone(), Arc::default());

    let nominee = registry
        .create(owner.id, new_nominee("asha@example.com", AccessTier::Full))
        .await
        .unwrap();

    assert!(matches!(
        registry.log_action(nominee.id, "   ", &origin()).await,
        Err(AccessError::InvalidInput(_))
    ));

    store.set_failing(true);
    assert!(matches!(
        registry.log_action(nominee.id, "Downloaded will", &origin()).await,
        Err(AccessError::Storage(_))
    ));
    store.set_failing(false);

    let entry = registry
        .log_action(nominee.id, "Downloaded will", &origin())
        .await
        .unwrap();
    assert_eq!(entry.action, "Downloaded will");
}

// =============================================================================
// Access log listing
// =============================================================================

#[tokio::test]
async fn test_access_logs_named_and_newest_first() {
    let store = Arc::new(MemoryStore::new());
    let owner = seed_owner(store.as_ref(), "owner@example.com").await;
    let registry = registry(store.clone(), Arc::default());

    let first = registry
        .create(owner.id, new_nominee("asha@example.com", AccessTier::Full))
        .await
        .unwrap();
    let mut second_new = new_nominee("ravi@example.com", AccessTier::Limited);
    second_new.name = "Ravi".into();
    let second = registry.create(owner.id, second_new).await.unwrap();

    registry.log_action(first.id, "one", &origin()).await.unwrap();
    registry.log_action(second.id, "two", &origin()).await.unwrap();
    registry.log_action(first.id, "three", &origin()).await.unwrap();

    let logs = registry.access_logs(owner.id).await.unwrap();
    assert_eq!(logs.len(), 3);
    assert!(logs.windows(2).all(|w| w[0].entry.date >= w[1].entry.date));

    let two = logs.iter().find(|l| l.entry.action == "two").unwrap();
    assert_eq!(two.nominee_name, "Ravi");

    // Deleting a nominee keeps its entries in storage
    registry.delete(first.id, owner.id).await.unwrap();
    assert_eq!(store.list_access_logs(first.id).await.unwrap().len(), 2);
    let logs = registry.access_logs(owner.id).await.unwrap();
    assert!(logs.iter().all(|l| l.entry.nominee_id == second.id));
}
