//! Dashboard page and record form posts

use axum::extract::Path;
use axum::response::{Html, Redirect};
use axum::Form;
use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use fintrack_core::{FinancialRecord, RecordSummary};
use fintrack_utils::{escape_html, format_amount};
use serde::Deserialize;

use crate::error::ApiError;
use crate::session::RecordsContext;

/// Fields posted by the add and edit forms
#[derive(Debug, Clone, Deserialize)]
pub struct RecordForm {
    /// `YYYY-MM-DD`; empty means today
    #[serde(default)]
    pub date: String,
    pub description: String,
    pub amount: String,
    pub category: String,
    pub payment_method: String,
}

impl RecordForm {
    pub fn into_record(self, user_id: &str) -> Result<FinancialRecord, ApiError> {
        let description = self.description.trim();
        if description.is_empty() {
            return Err(ApiError::bad_request("description must not be empty"));
        }
        let amount: f64 = self
            .amount
            .trim()
            .parse()
            .map_err(|_| ApiError::bad_request(format!("invalid amount: {}", self.amount)))?;
        if !amount.is_finite() {
            return Err(ApiError::bad_request(format!("invalid amount: {}", self.amount)));
        }
        let date = parse_form_date(&self.date)?;

        Ok(FinancialRecord::new(
            user_id,
            date,
            description,
            amount,
            self.category.trim(),
            self.payment_method.trim(),
        ))
    }
}

fn parse_form_date(value: &str) -> Result<DateTime<Utc>, ApiError> {
    let value = value.trim();
    if value.is_empty() {
        return Ok(Utc::now());
    }
    let day = NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .map_err(|_| ApiError::bad_request(format!("invalid date: {}", value)))?;
    let midnight = day
        .and_hms_opt(0, 0, 0)
        .ok_or_else(|| ApiError::bad_request(format!("invalid date: {}", value)))?;
    Ok(Utc.from_utc_datetime(&midnight))
}

pub async fn page_dashboard(ctx: RecordsContext) -> Html<String> {
    let records = ctx.store.records().await;
    let summary = RecordSummary::from_records(&records);

    let inner_content = format!(
        r#"<div class='mb-6'><h2 class='text-2xl font-bold'>Welcome, {}</h2></div>
        {}
        {}
        {}"#,
        escape_html(&ctx.session.display_name),
        render_summary(&summary),
        render_add_form(),
        render_records(&records),
    );

    Html(crate::page_response(
        "Dashboard",
        "/",
        &ctx.session.display_name,
        &inner_content,
    ))
}

pub async fn form_add_record(
    ctx: RecordsContext,
    Form(form): Form<RecordForm>,
) -> Result<Redirect, ApiError> {
    let record = form.into_record(&ctx.session.user_id)?;
    ctx.store.add(record).await;
    Ok(Redirect::to("/"))
}

pub async fn form_update_record(
    ctx: RecordsContext,
    Path(id): Path<String>,
    Form(form): Form<RecordForm>,
) -> Result<Redirect, ApiError> {
    let mut record = form.into_record(&ctx.session.user_id)?;
    record.id = Some(id.clone());
    ctx.store.update(&id, record).await;
    Ok(Redirect::to("/"))
}

pub async fn form_delete_record(ctx: RecordsContext, Path(id): Path<String>) -> Redirect {
    ctx.store.delete(&id).await;
    Redirect::to("/")
}

// ==================== Rendering ====================

fn render_summary(summary: &RecordSummary) -> String {
    let mut categories = String::new();
    for category in &summary.categories {
        categories.push_str(&format!(
            "<li class='flex justify-between'><span>{}</span><span>{} ({})</span></li>",
            escape_html(&category.category),
            escape_html(&category.total),
            category.count
        ));
    }

    format!(
        r#"<div class='grid grid-cols-4 gap-4 mb-6'>
            <div class='bg-white rounded-xl shadow-sm p-4'><p class='text-sm text-gray-500'>Records</p><p class='text-xl font-semibold'>{}</p></div>
            <div class='bg-white rounded-xl shadow-sm p-4'><p class='text-sm text-gray-500'>Income</p><p class='text-xl font-semibold text-green-600'>{}</p></div>
            <div class='bg-white rounded-xl shadow-sm p-4'><p class='text-sm text-gray-500'>Expenses</p><p class='text-xl font-semibold text-red-600'>{}</p></div>
            <div class='bg-white rounded-xl shadow-sm p-4'><p class='text-sm text-gray-500'>Net</p><p class='text-xl font-semibold'>{}</p></div>
        </div>
        <div class='bg-white rounded-xl shadow-sm p-4 mb-6'><h3 class='font-semibold mb-2'>By category</h3><ul class='space-y-1'>{}</ul></div>"#,
        summary.count,
        escape_html(&summary.total_income),
        escape_html(&summary.total_expenses),
        escape_html(&summary.net_total),
        categories
    )
}

fn record_fields(record: Option<&FinancialRecord>) -> String {
    let value = |f: fn(&FinancialRecord) -> String| record.map(f).unwrap_or_default();
    format!(
        r#"<input name='date' type='date' value='{}' class='border rounded px-2 py-1'>
        <input name='description' placeholder='Description' value='{}' class='border rounded px-2 py-1'>
        <input name='amount' placeholder='Amount' value='{}' class='border rounded px-2 py-1 w-28'>
        <input name='category' placeholder='Category' value='{}' class='border rounded px-2 py-1'>
        <input name='payment_method' placeholder='Payment method' value='{}' class='border rounded px-2 py-1'>"#,
        value(|r| r.date.format("%Y-%m-%d").to_string()),
        escape_html(&value(|r| r.description.clone())),
        value(|r| r.amount.to_string()),
        escape_html(&value(|r| r.category.clone())),
        escape_html(&value(|r| r.payment_method.clone())),
    )
}

fn render_add_form() -> String {
    format!(
        r#"<div class='bg-white rounded-xl shadow-sm p-4 mb-6'>
            <h3 class='font-semibold mb-2'>Add record</h3>
            <form method='post' action='/records' class='flex flex-wrap gap-2'>{}<button class='bg-indigo-600 text-white rounded px-3 py-1'>Add</button></form>
        </div>"#,
        record_fields(None)
    )
}

fn render_records(records: &[FinancialRecord]) -> String {
    if records.is_empty() {
        return "<div class='bg-white rounded-xl shadow-sm p-6 text-gray-500'>No records yet</div>"
            .to_string();
    }

    let mut rows = String::new();
    for record in records {
        // Records the server sent without an id can be shown but not edited
        let actions = match record.id.as_deref() {
            Some(id) => {
                let id = urlencoding::encode(id);
                format!(
                    r#"<div class='flex flex-wrap gap-2'>
                    <form method='post' action='/records/{}/update' class='flex flex-wrap gap-2'>{}<button class='text-indigo-600'>Save</button></form>
                    <form method='post' action='/records/{}/delete'><button class='text-red-600'>Delete</button></form>
                </div>"#,
                    id,
                    record_fields(Some(record)),
                    id,
                )
            }
            None => "<p class='text-xs text-gray-400'>Not editable</p>".to_string(),
        };
        rows.push_str(&format!(
            r#"<li class='py-3 border-b'>
                <div class='flex justify-between mb-2'><span>{} {}</span><span class='{}'>{}</span></div>
                {}
            </li>"#,
            record.date.format("%Y-%m-%d"),
            escape_html(&record.description),
            if record.amount < 0.0 { "text-red-600" } else { "text-green-600" },
            format_amount(record.amount),
            actions,
        ));
    }

    format!(
        "<div class='bg-white rounded-xl shadow-sm p-4'><h3 class='font-semibold mb-2'>Records</h3><ul>{}</ul></div>",
        rows
    )
}
