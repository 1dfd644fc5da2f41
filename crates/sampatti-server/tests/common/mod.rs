//! Shared test fixtures

#![allow(dead_code)]

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{header, Method, Request, StatusCode};
use axum::Router;
use chrono::{DateTime, Utc};
use http_body_util::BodyExt;
use sampatti_core::{
    AccessLogEntry, AccessTier, Argon2Verifier, Asset, Document, FixedCodeSource, NewNominee,
    Nominee, NomineeStatus, NomineeUpdate, ProfileUpdate, User,
};
use sampatti_credentials::TokenCodec;
use sampatti_server::core::{AdvisoryFailure, AdvisorySink};
use sampatti_server::{AppState, MemoryStore, NomineeRegistry, StorageError, VaultStore};
use serde_json::Value;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use tower::ServiceExt;
use uuid::Uuid;

pub const ACCESS_CODE: &str = "AB12CD34";
pub const ACCESS_SECRET: &str = "test-access-secret";
pub const REFRESH_SECRET: &str = "test-refresh-secret";

/// Argon2 with test-sized cost
pub fn fast_verifier() -> Arc<Argon2Verifier> {
    Arc::new(Argon2Verifier::with_params(1024, 1, 1).unwrap())
}

pub fn codec() -> TokenCodec {
    TokenCodec::builder()
        .access_secret(ACCESS_SECRET)
        .refresh_secret(REFRESH_SECRET)
        .build()
        .unwrap()
}

/// Collects advisory failures
#[derive(Debug, Default)]
pub struct RecordingAdvisory {
    failures: Mutex<Vec<AdvisoryFailure>>,
}

impl RecordingAdvisory {
    pub fn failures(&self) -> Vec<AdvisoryFailure> {
        self.failures.lock().unwrap().clone()
    }
}

impl AdvisorySink for RecordingAdvisory {
    fn report(&self, failure: AdvisoryFailure) {
        self.failures.lock().unwrap().push(failure);
    }
}

/// Memory store with injectable write failures and injectable concurrent
/// owner actions
#[derive(Debug, Default)]
pub struct FlakyStore {
    inner: MemoryStore,
    fail_side_effects: AtomicBool,
    fail_primary: AtomicBool,
    revoke_after_lookup: AtomicBool,
    delete_after_lookup: AtomicBool,
}

impl FlakyStore {
    /// Fail status, last-access and access-log writes
    pub fn set_failing(&self, failing: bool) {
        self.fail_side_effects.store(failing, Ordering::SeqCst);
    }

    /// Fail nominee create, update, delete and code-hash writes
    pub fn set_primary_failing(&self, failing: bool) {
        self.fail_primary.store(failing, Ordering::SeqCst);
    }

    /// Revoke the nominee returned by the next lookup, after the caller has
    /// read it
    pub fn revoke_after_next_lookup(&self) {
        self.revoke_after_lookup.store(true, Ordering::SeqCst);
    }

    /// Delete the nominee returned by the next lookup, after the caller has
    /// read it
    pub fn delete_after_next_lookup(&self) {
        self.delete_after_lookup.store(true, Ordering::SeqCst);
    }

    fn check(flag: &AtomicBool) -> Result<(), StorageError> {
        if flag.load(Ordering::SeqCst) {
            return Err(StorageError::Connection("injected failure".into()));
        }
        Ok(())
    }

    async fn after_lookup(&self, found: &Option<Nominee>) -> Result<(), StorageError> {
        if let Some(nominee) = found {
            if self.revoke_after_lookup.swap(false, Ordering::SeqCst) {
                self.inner
                    .transition_nominee_status(nominee.id, nominee.status, NomineeStatus::Revoked)
                    .await?;
            }
            if self.delete_after_lookup.swap(false, Ordering::SeqCst) {
                self.inner.delete_nominee(nominee.id).await?;
            }
        }
        Ok(())
    }
}

#[async_trait]
impl VaultStore for FlakyStore {
    async fn create_user(&self, user: User) -> Result<(), StorageError> {
        self.inner.create_user(user).await
    }

    async fn get_user(&self, id: Uuid) -> Result<Option<User>, StorageError> {
        self.inner.get_user(id).await
    }

    async fn get_user_by_email(&self, email: &str) -> Result<Option<User>, StorageError> {
        self.inner.get_user_by_email(email).await
    }

    async fn update_user_profile(
        &self,
        id: Uuid,
        update: &ProfileUpdate,
    ) -> Result<bool, StorageError> {
        self.inner.update_user_profile(id, update).await
    }

    async fn update_password_hash(&self, id: Uuid, hash: &str) -> Result<bool, StorageError> {
        self.inner.update_password_hash(id, hash).await
    }

    async fn record_login(&self, id: Uuid, at: DateTime<Utc>) -> Result<bool, StorageError> {
        self.inner.record_login(id, at).await
    }

    async fn create_nominee(&self, nominee: Nominee) -> Result<(), StorageError> {
        Self::check(&self.fail_primary)?;
        self.inner.create_nominee(nominee).await
    }

    async fn get_nominee(&self, id: Uuid) -> Result<Option<Nominee>, StorageError> {
        let found = self.inner.get_nominee(id).await?;
        self.after_lookup(&found).await?;
        Ok(found)
    }

    async fn get_nominee_by_email_and_owner(
        &self,
        email: &str,
        user_id: Uuid,
    ) -> Result<Option<Nominee>, StorageError> {
        let found = self
            .inner
            .get_nominee_by_email_and_owner(email, user_id)
            .await?;
        self.after_lookup(&found).await?;
        Ok(found)
    }

    async fn list_nominees(&self, user_id: Uuid) -> Result<Vec<Nominee>, StorageError> {
        self.inner.list_nominees(user_id).await
    }

    async fn update_nominee(
        &self,
        id: Uuid,
        update: &NomineeUpdate,
    ) -> Result<bool, StorageError> {
        Self::check(&self.fail_primary)?;
        self.inner.update_nominee(id, update).await
    }

    async fn transition_nominee_status(
        &self,
        id: Uuid,
        from: NomineeStatus,
        to: NomineeStatus,
    ) -> Result<bool, StorageError> {
        Self::check(&self.fail_side_effects)?;
        self.inner.transition_nominee_status(id, from, to).await
    }

    async fn update_access_code_hash(&self, id: Uuid, hash: &str) -> Result<bool, StorageError> {
        Self::check(&self.fail_primary)?;
        self.inner.update_access_code_hash(id, hash).await
    }

    async fn update_last_access(
        &self,
        id: Uuid,
        at: DateTime<Utc>,
    ) -> Result<bool, StorageError> {
        Self::check(&self.fail_side_effects)?;
        self.inner.update_last_access(id, at).await
    }

    async fn delete_nominee(&self, id: Uuid) -> Result<bool, StorageError> {
        Self::check(&self.fail_primary)?;
        self.inner.delete_nominee(id).await
    }

    async fn append_access_log(&self, entry: AccessLogEntry) -> Result<(), StorageError> {
        Self::check(&self.fail_side_effects)?;
        self.inner.append_access_log(entry).await
    }

    async fn list_access_logs(
        &self,
        nominee_id: Uuid,
    ) -> Result<Vec<AccessLogEntry>, StorageError> {
        self.inner.list_access_logs(nominee_id).await
    }

    async fn insert_asset(&self, asset: Asset) -> Result<(), StorageError> {
        self.inner.insert_asset(asset).await
    }

    async fn list_assets(&self, user_id: Uuid) -> Result<Vec<Asset>, StorageError> {
        self.inner.list_assets(user_id).await
    }

    async fn insert_document(&self, document: Document) -> Result<(), StorageError> {
        self.inner.insert_document(document).await
    }

    async fn get_document(&self, id: Uuid) -> Result<Option<Document>, StorageError> {
        self.inner.get_document(id).await
    }

    async fn list_documents(&self, user_id: Uuid) -> Result<Vec<Document>, StorageError> {
        self.inner.list_documents(user_id).await
    }

    async fn set_document_access(
        &self,
        id: Uuid,
        accessible_to_nominees: Option<bool>,
        nominee_ids: &[Uuid],
    ) -> Result<bool, StorageError> {
        self.inner
            .set_document_access(id, accessible_to_nominees, nominee_ids)
            .await
    }
}

/// Registry over `store` handing out [`ACCESS_CODE`]
pub fn registry(store: Arc<dyn VaultStore>, advisory: Arc<RecordingAdvisory>) -> NomineeRegistry {
    NomineeRegistry::new(
        store,
        fast_verifier(),
        Arc::new(FixedCodeSource::new(ACCESS_CODE)),
        advisory,
    )
}

/// Application state over `store` handing out [`ACCESS_CODE`]
pub fn app_state(store: Arc<dyn VaultStore>) -> Arc<AppState> {
    Arc::new(AppState::new(
        store,
        codec(),
        fast_verifier(),
        Arc::new(FixedCodeSource::new(ACCESS_CODE)),
        Arc::new(RecordingAdvisory::default()),
    ))
}

pub async fn seed_owner(store: &dyn VaultStore, email: &str) -> User {
    let user = User::new("Owner", email, "", "not-a-real-hash");
    store.create_user(user.clone()).await.unwrap();
    user
}

pub fn new_nominee(email: &str, tier: AccessTier) -> NewNominee {
    NewNominee {
        name: "Asha".into(),
        email: email.into(),
        phone_number: String::new(),
        relationship: "Sister".into(),
        access_level: tier,
    }
}

pub fn asset(owner: Uuid, name: &str) -> Asset {
    Asset {
        id: Uuid::new_v4(),
        user_id: owner,
        asset_name: name.into(),
        asset_type: "Savings".into(),
        institution: "Bank".into(),
        current_value: 1000.0,
    }
}

pub fn document(owner: Uuid, title: &str, flagged: bool, granted_to: Vec<Uuid>) -> Document {
    Document {
        id: Uuid::new_v4(),
        user_id: owner,
        title: title.into(),
        document_type: "Will".into(),
        accessible_to_nominees: flagged,
        granted_to,
    }
}

// =============================================================================
// HTTP helpers
// =============================================================================

/// Send one request through the router; returns status and JSON body
pub async fn send(
    app: &Router,
    method: Method,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    send_with_auth(app, method, uri, token.map(|t| format!("Bearer {}", t)), body).await
}

/// Like [`send`] with a raw `Authorization` header value
pub async fn send_with_auth(
    app: &Router,
    method: Method,
    uri: &str,
    authorization: Option<String>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::USER_AGENT, "sampatti-tests")
        .header("x-forwarded-for", "198.51.100.9");
    if let Some(value) = authorization {
        builder = builder.header(header::AUTHORIZATION, value);
    }

    let request = match body {
        Some(json) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(serde_json::to_vec(&json).unwrap()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let json = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::Null)
    };
    (status, json)
}
