//! In-memory records backend for unit tests

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{TimeZone, Utc};

use crate::error::{CoreError, CoreResult};
use crate::models::FinancialRecord;
use crate::RecordsApi;

pub(crate) fn record(id: Option<&str>, user_id: &str, amount: f64) -> FinancialRecord {
    FinancialRecord {
        id: id.map(str::to_string),
        user_id: user_id.to_string(),
        date: Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap(),
        description: "coffee".to_string(),
        amount,
        category: "food".to_string(),
        payment_method: "card".to_string(),
    }
}

#[derive(Default)]
pub(crate) struct MockApi {
    pub records: Mutex<Vec<FinancialRecord>>,
    pub fail: AtomicBool,
    pub hang: AtomicBool,
    pub fetch_calls: AtomicUsize,
    /// Consumed one per call, in call order
    delays: Mutex<VecDeque<Duration>>,
    next_id: AtomicUsize,
}

impl MockApi {
    pub fn with_records(records: Vec<FinancialRecord>) -> Self {
        Self {
            records: Mutex::new(records),
            ..Default::default()
        }
    }

    pub fn delay_calls(&self, delays: &[Duration]) {
        self.delays.lock().unwrap().extend(delays.iter().copied());
    }

    async fn gate(&self) -> CoreResult<()> {
        let delay = self.delays.lock().unwrap().pop_front();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        if self.hang.load(Ordering::SeqCst) {
            std::future::pending::<()>().await;
        }
        if self.fail.load(Ordering::SeqCst) {
            return Err(CoreError::Status { status: 500 });
        }
        Ok(())
    }
}

#[async_trait]
impl RecordsApi for MockApi {
    async fn fetch_all(&self, user_id: &str) -> CoreResult<Vec<FinancialRecord>> {
        self.fetch_calls.fetch_add(1, Ordering::SeqCst);
        self.gate().await?;
        let records = self.records.lock().unwrap();
        Ok(records.iter().filter(|r| r.user_id == user_id).cloned().collect())
    }

    async fn create(&self, record: &FinancialRecord) -> CoreResult<FinancialRecord> {
        self.gate().await?;
        let n = self.next_id.fetch_add(1, Ordering::SeqCst) + 1;
        let mut created = record.clone();
        created.id = Some(format!("r{n}"));
        self.records.lock().unwrap().push(created.clone());
        Ok(created)
    }

    async fn update(&self, id: &str, record: &FinancialRecord) -> CoreResult<FinancialRecord> {
        self.gate().await?;
        let mut records = self.records.lock().unwrap();
        let mut updated = record.clone();
        updated.id = Some(id.to_string());
        match records.iter_mut().find(|r| r.has_id(id)) {
            Some(existing) => {
                *existing = updated.clone();
                Ok(updated)
            }
            None => Err(CoreError::NotFound { resource: id.to_string() }),
        }
    }

    async fn delete(&self, id: &str) -> CoreResult<()> {
        self.gate().await?;
        self.records.lock().unwrap().retain(|r| !r.has_id(id));
        Ok(())
    }
}
