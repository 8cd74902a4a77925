//! Gate in front of protected pages
//!
//! The decision is made before anything protected is rendered: either the
//! request carries a live session, or it is sent to the sign-in page.

use crate::session::{Session, SessionRegistry, SessionStatus};

/// Where signed-out requests are sent
pub const AUTH_ROUTE: &str = "/auth";

/// The legacy marker check: only the exact literal `"true"` counts
pub fn is_signed_in_flag(value: Option<&str>) -> bool {
    value == Some("true")
}

/// What to do with a protected request
#[derive(Debug, Clone)]
pub enum GuardDecision {
    Allow(Session),
    Redirect(&'static str),
}

impl GuardDecision {
    pub fn is_redirect(&self) -> bool {
        matches!(self, GuardDecision::Redirect(_))
    }
}

/// Resolves markers against a session registry
pub struct SessionGuard<'a> {
    registry: &'a SessionRegistry,
}

impl<'a> SessionGuard<'a> {
    pub fn new(registry: &'a SessionRegistry) -> Self {
        Self { registry }
    }

    /// Decide for the marker read from the request
    pub fn check(&self, marker: Option<&str>) -> GuardDecision {
        match self.registry.resolve(marker) {
            SessionStatus::SignedIn(session) => GuardDecision::Allow(session),
            SessionStatus::SignedOut => {
                log::debug!("No live session, redirecting to {}", AUTH_ROUTE);
                GuardDecision::Redirect(AUTH_ROUTE)
            }
        }
    }
}
