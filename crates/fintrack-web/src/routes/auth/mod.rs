//! Auth routes - Sign in and sign out

pub mod page;

pub use page::{page_sign_in, sign_in, sign_out};
