//! Route modules for the web server
//!
//! - records: Dashboard, record forms, JSON records API
//! - auth: Sign-in page, sign-in and sign-out
//!
//! Each module follows a consistent structure:
//! - mod.rs: Module declaration and exports
//! - api.rs: JSON API endpoints
//! - page.rs: HTML page rendering and form posts

pub mod auth;
pub mod records;
