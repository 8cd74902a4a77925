//! Records routes - Dashboard, forms and JSON API

pub mod api;
pub mod page;

pub use api::{
    api_add_record, api_delete_record, api_records, api_reload, api_summary, api_update_record,
};
pub use page::{form_add_record, form_delete_record, form_update_record, page_dashboard};
