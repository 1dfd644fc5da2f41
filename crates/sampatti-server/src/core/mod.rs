//! Domain services behind the HTTP API

pub mod accounts;
pub mod advisory;
pub mod audit;
pub mod data;
pub mod registry;

pub use accounts::{Accounts, Registration, Session, StoreDirectory, MIN_PASSWORD_LEN};
pub use advisory::{AdvisoryFailure, AdvisoryOperation, AdvisorySink, TracingAdvisory};
pub use audit::{
    AuditLog, ACTION_CODE_VERIFIED, ACTION_EMERGENCY_DATA_ACCESS, ACTION_VIEWED_USER_DATA,
};
pub use data::{DataAccess, OwnerData, OwnerSummary};
pub use registry::{Invitation, NamedAccessLogEntry, NomineeRegistry, UNKNOWN_NOMINEE};
