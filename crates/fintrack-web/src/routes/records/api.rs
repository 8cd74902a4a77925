//! Records API endpoints - JSON API over the session's record store
//!
//! Mutating endpoints answer with the store's records after the operation.
//! A failed remote call leaves the store unchanged, so the response then
//! shows the previous state.

use axum::extract::Path;
use axum::Json;
use chrono::{DateTime, Utc};
use fintrack_core::{FinancialRecord, RecordSummary};
use serde::Deserialize;

use crate::error::ApiError;
use crate::session::RecordsContext;

/// Record fields accepted from API clients
///
/// The owner always comes from the session, never from the body.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordInput {
    /// Defaults to now
    #[serde(default)]
    pub date: Option<DateTime<Utc>>,
    pub description: String,
    pub amount: f64,
    pub category: String,
    pub payment_method: String,
}

impl RecordInput {
    pub fn into_record(self, user_id: &str) -> Result<FinancialRecord, ApiError> {
        if self.description.trim().is_empty() {
            return Err(ApiError::bad_request("description must not be empty"));
        }
        if !self.amount.is_finite() {
            return Err(ApiError::bad_request("amount must be a finite number"));
        }
        Ok(FinancialRecord::new(
            user_id,
            self.date.unwrap_or_else(Utc::now),
            self.description.trim(),
            self.amount,
            self.category.trim(),
            self.payment_method.trim(),
        ))
    }
}

pub async fn api_records(ctx: RecordsContext) -> Json<Vec<FinancialRecord>> {
    Json(ctx.store.records().await)
}

pub async fn api_add_record(
    ctx: RecordsContext,
    Json(input): Json<RecordInput>,
) -> Result<Json<Vec<FinancialRecord>>, ApiError> {
    let record = input.into_record(&ctx.session.user_id)?;
    ctx.store.add(record).await;
    Ok(Json(ctx.store.records().await))
}

pub async fn api_update_record(
    ctx: RecordsContext,
    Path(id): Path<String>,
    Json(input): Json<RecordInput>,
) -> Result<Json<Vec<FinancialRecord>>, ApiError> {
    let mut record = input.into_record(&ctx.session.user_id)?;
    record.id = Some(id.clone());
    ctx.store.update(&id, record).await;
    Ok(Json(ctx.store.records().await))
}

pub async fn api_delete_record(
    ctx: RecordsContext,
    Path(id): Path<String>,
) -> Json<Vec<FinancialRecord>> {
    ctx.store.delete(&id).await;
    Json(ctx.store.records().await)
}

/// Refetch everything from the remote API
pub async fn api_reload(ctx: RecordsContext) -> Json<Vec<FinancialRecord>> {
    ctx.store.reload().await;
    Json(ctx.store.records().await)
}

pub async fn api_summary(ctx: RecordsContext) -> Json<RecordSummary> {
    Json(ctx.store.summary().await)
}
