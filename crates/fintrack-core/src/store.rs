//! Per-session record store
//!
//! Mirrors the signed-in user's records from the remote API. The collection
//! is only ever replaced or edited with what the server sent back; a failed
//! call leaves it untouched. Mutators are not serialised against each other,
//! so whichever response lands last decides the local state.

use std::future::Future;

use tokio::sync::{Mutex, RwLock};
use tokio_util::sync::CancellationToken;

use crate::error::{log_error, CoreError, CoreResult, ErrorContext};
use crate::models::FinancialRecord;
use crate::summary::RecordSummary;
use crate::ApiRef;

#[derive(Debug)]
struct StoreState {
    records: Vec<FinancialRecord>,
    loading: bool,
}

/// In-memory view of one user's records
pub struct RecordStore {
    user_id: String,
    api: ApiRef,
    state: RwLock<StoreState>,
    /// Serialises initial fetches so a second caller waits for the first
    init_gate: Mutex<()>,
    cancel: CancellationToken,
}

impl RecordStore {
    /// Create an uninitialized store (`loading` is true, no records)
    pub fn new(user_id: &str, api: ApiRef) -> Self {
        Self {
            user_id: user_id.to_string(),
            api,
            state: RwLock::new(StoreState {
                records: Vec::new(),
                loading: true,
            }),
            init_gate: Mutex::new(()),
            cancel: CancellationToken::new(),
        }
    }

    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    /// Snapshot of the records in server order
    pub async fn records(&self) -> Vec<FinancialRecord> {
        self.state.read().await.records.clone()
    }

    pub async fn is_loading(&self) -> bool {
        self.state.read().await.loading
    }

    pub async fn summary(&self) -> RecordSummary {
        RecordSummary::from_records(&self.state.read().await.records)
    }

    /// Fetch everything for the user if the store is still loading.
    ///
    /// Success replaces the collection, failure empties it; either way
    /// `loading` ends up false.
    pub async fn initialize(&self) {
        let _gate = self.init_gate.lock().await;
        if !self.state.read().await.loading {
            return;
        }

        log::debug!("Fetching records for user {}", self.user_id);
        let result = self.run(self.api.fetch_all(&self.user_id)).await;

        let mut state = self.state.write().await;
        if self.cancel.is_cancelled() {
            return;
        }
        match result {
            Ok(records) => {
                log::info!("Loaded {} records for user {}", records.len(), self.user_id);
                state.records = records;
            }
            Err(e) => {
                self.report("fetch records", &e);
                state.records.clear();
            }
        }
        state.loading = false;
    }

    /// Wait until the first fetch has resolved
    pub async fn ensure_loaded(&self) {
        if self.is_loading().await {
            self.initialize().await;
        }
    }

    /// Mark the store as loading again and refetch
    pub async fn reload(&self) {
        {
            let _gate = self.init_gate.lock().await;
            self.state.write().await.loading = true;
        }
        self.initialize().await;
    }

    /// Create `record` remotely and append the stored version
    pub async fn add(&self, record: FinancialRecord) {
        match self.run(self.api.create(&record)).await {
            Ok(created) => {
                log::debug!("Added record {:?} for user {}", created.id, self.user_id);
                self.apply(|state| state.records.push(created)).await;
            }
            Err(e) => self.report("add record", &e),
        }
    }

    /// Replace the record `id` remotely, then swap it in place locally
    pub async fn update(&self, id: &str, record: FinancialRecord) {
        match self.run(self.api.update(id, &record)).await {
            Ok(updated) => {
                self.apply(|state| {
                    for entry in state.records.iter_mut().filter(|r| r.has_id(id)) {
                        *entry = updated.clone();
                    }
                })
                .await;
            }
            Err(e) => self.report("update record", &e),
        }
    }

    /// Delete the record `id` remotely, then drop every local match
    pub async fn delete(&self, id: &str) {
        match self.run(self.api.delete(id)).await {
            Ok(()) => {
                self.apply(|state| state.records.retain(|r| !r.has_id(id))).await;
            }
            Err(e) => self.report("delete record", &e),
        }
    }

    /// Abort in-flight requests; nothing is applied after this
    pub fn close(&self) {
        if !self.cancel.is_cancelled() {
            log::debug!("Closing record store for user {}", self.user_id);
            self.cancel.cancel();
        }
    }

    pub fn is_closed(&self) -> bool {
        self.cancel.is_cancelled()
    }

    async fn run<T>(&self, request: impl Future<Output = CoreResult<T>>) -> CoreResult<T> {
        tokio::select! {
            biased;
            _ = self.cancel.cancelled() => Err(CoreError::Cancelled),
            result = request => result,
        }
    }

    async fn apply(&self, change: impl FnOnce(&mut StoreState)) {
        let mut state = self.state.write().await;
        if !self.cancel.is_cancelled() {
            change(&mut state);
        }
    }

    fn report(&self, operation: &str, error: &CoreError) {
        log_error(error, &ErrorContext::new(operation).with_user_id(&self.user_id));
    }
}

impl Drop for RecordStore {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

// ==================== Tests ====================
