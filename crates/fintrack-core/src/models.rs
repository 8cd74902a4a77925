//! Record model shared with the remote API

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One ledger entry owned by a user
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FinancialRecord {
    /// Server-assigned identifier, absent until created
    #[serde(rename = "_id", alias = "id", default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// Owner identifier
    pub user_id: String,
    /// When the transaction happened
    pub date: DateTime<Utc>,
    pub description: String,
    /// Signed amount, negative for spending
    pub amount: f64,
    pub category: String,
    pub payment_method: String,
}

impl FinancialRecord {
    /// Build a record that has not been stored yet
    pub fn new(
        user_id: &str,
        date: DateTime<Utc>,
        description: &str,
        amount: f64,
        category: &str,
        payment_method: &str,
    ) -> Self {
        Self {
            id: None,
            user_id: user_id.to_string(),
            date,
            description: description.to_string(),
            amount,
            category: category.to_string(),
            payment_method: payment_method.to_string(),
        }
    }

    /// Whether this record carries the given identifier
    pub fn has_id(&self, id: &str) -> bool {
        self.id.as_deref() == Some(id)
    }

    /// Copy with the owner replaced
    pub fn owned_by(mut self, user_id: &str) -> Self {
        self.user_id = user_id.to_string();
        self
    }
}
