//! Core record-keeping logic for fintrack
//!
//! - `store`: per-session mirror of the user's remote records
//! - `session`: session registry and signed-in state
//! - `guard`: the gate in front of protected pages
//! - `identity`: credential checks
//! - `summary`: dashboard totals

pub mod error;
pub mod guard;
pub mod identity;
pub mod models;
pub mod session;
pub mod store;
pub mod summary;

#[cfg(test)]
mod testing;

use async_trait::async_trait;
use std::sync::Arc;

pub use error::{CoreError, CoreResult, ErrorCode, ErrorContext, ErrorSeverity};
pub use guard::{is_signed_in_flag, GuardDecision, SessionGuard, AUTH_ROUTE};
pub use identity::{ConfiguredIdentityProvider, Identity, IdentityProvider, IdentityRef};
pub use models::FinancialRecord;
pub use session::{Session, SessionRegistry, SessionStatus};
pub use store::RecordStore;
pub use summary::{CategoryTotal, RecordSummary};

// ==================== Remote API Trait ====================

/// Shared handle to a records backend
pub type ApiRef = Arc<dyn RecordsApi>;

/// The remote financial-records service
///
/// Implementations report transport, status and decode failures as
/// distinct `CoreError` variants; callers treat them alike.
#[async_trait]
pub trait RecordsApi: Send + Sync {
    /// Every record owned by `user_id`
    async fn fetch_all(&self, user_id: &str) -> CoreResult<Vec<FinancialRecord>>;

    /// Store a new record and return it with its assigned id
    async fn create(&self, record: &FinancialRecord) -> CoreResult<FinancialRecord>;

    /// Replace the record stored under `id`
    async fn update(&self, id: &str, record: &FinancialRecord) -> CoreResult<FinancialRecord>;

    /// Remove the record stored under `id`
    async fn delete(&self, id: &str) -> CoreResult<()>;
}
