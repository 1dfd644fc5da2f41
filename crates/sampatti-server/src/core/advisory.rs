//! Advisory channel for failed best-effort side effects
//!
//! Audit writes, the Pending → Active transition on verification and the
//! last-access stamp never fail the request that triggered them. Their
//! failures are handed to an [`AdvisorySink`] instead.

use std::fmt::Debug;
use uuid::Uuid;

/// The side effect that failed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdvisoryOperation {
    AccessLog,
    StatusTransition,
    LastAccess,
}

impl std::fmt::Display for AdvisoryOperation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            AdvisoryOperation::AccessLog => "access_log",
            AdvisoryOperation::StatusTransition => "status_transition",
            AdvisoryOperation::LastAccess => "last_access",
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdvisoryFailure {
    pub operation: AdvisoryOperation,
    pub nominee_id: Uuid,
    pub error: String,
}

/// Receives advisory failures
pub trait AdvisorySink: Send + Sync + Debug {
    fn report(&self, failure: AdvisoryFailure);
}

/// Reports advisory failures as `warn!` events
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingAdvisory;

impl AdvisorySink for TracingAdvisory {
    fn report(&self, failure: AdvisoryFailure) {
        tracing::warn!(
            operation = %failure.operation,
            nominee_id = %failure.nominee_id,
            error = %failure.error,
            "Best-effort side effect failed"
        );
    }
}
