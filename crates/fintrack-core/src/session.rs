//! Signed-in sessions
//!
//! A session is created after the identity provider has verified a user and
//! owns that user's `RecordStore`. Tokens are opaque uuids; the marker kept
//! by the browser is the token itself.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use chrono::{DateTime, Duration, Utc};

use crate::guard::is_signed_in_flag;
use crate::identity::Identity;
use crate::store::RecordStore;
use crate::ApiRef;

/// One signed-in user and their record store
#[derive(Clone)]
pub struct Session {
    pub token: String,
    pub user_id: String,
    pub display_name: String,
    pub issued_at: DateTime<Utc>,
    /// `None` for sessions that never expire
    pub expires_at: Option<DateTime<Utc>>,
    store: Arc<RecordStore>,
}

impl Session {
    pub fn store(&self) -> Arc<RecordStore> {
        self.store.clone()
    }

    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.map(|t| now >= t).unwrap_or(false)
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("user_id", &self.user_id)
            .field("issued_at", &self.issued_at)
            .field("expires_at", &self.expires_at)
            .finish_non_exhaustive()
    }
}

/// Outcome of resolving a session marker
#[derive(Debug, Clone)]
pub enum SessionStatus {
    SignedIn(Session),
    SignedOut,
}

impl SessionStatus {
    pub fn is_signed_in(&self) -> bool {
        matches!(self, SessionStatus::SignedIn(_))
    }
}

/// All live sessions of the process
pub struct SessionRegistry {
    api: ApiRef,
    ttl: Duration,
    trusted_flag_user: Option<Identity>,
    sessions: RwLock<HashMap<String, Session>>,
    flag_session: RwLock<Option<Session>>,
}

impl SessionRegistry {
    pub fn new(api: ApiRef, ttl: Duration) -> Self {
        Self {
            api,
            ttl,
            trusted_flag_user: None,
            sessions: RwLock::new(HashMap::new()),
            flag_session: RwLock::new(None),
        }
    }

    /// Accept the bare `"true"` marker as a session for `identity`
    pub fn with_trusted_flag(mut self, identity: Identity) -> Self {
        self.trusted_flag_user = Some(identity);
        self
    }

    /// Start a session for a verified user
    pub fn sign_in(&self, identity: Identity) -> Session {
        self.sign_in_at(identity, Utc::now())
    }

    pub fn sign_in_at(&self, identity: Identity, now: DateTime<Utc>) -> Session {
        let token = uuid::Uuid::new_v4().to_string();
        // Lifetimes past the calendar's end are capped at its last instant
        let expires_at = now.checked_add_signed(self.ttl).unwrap_or(DateTime::<Utc>::MAX_UTC);
        let session = self.new_session(token.clone(), identity, now, Some(expires_at));
        self.sessions.write().unwrap().insert(token, session.clone());
        log::info!("User {} signed in", session.user_id);
        session
    }

    /// Look up the session behind a marker
    pub fn resolve(&self, marker: Option<&str>) -> SessionStatus {
        self.resolve_at(marker, Utc::now())
    }

    pub fn resolve_at(&self, marker: Option<&str>, now: DateTime<Utc>) -> SessionStatus {
        let marker = match marker {
            Some(m) if !m.is_empty() => m,
            _ => return SessionStatus::SignedOut,
        };

        if is_signed_in_flag(Some(marker)) {
            return match &self.trusted_flag_user {
                Some(identity) => SessionStatus::SignedIn(self.flag_session(identity, now)),
                None => SessionStatus::SignedOut,
            };
        }

        let found = self.sessions.read().unwrap().get(marker).cloned();
        match found {
            Some(session) if session.is_expired_at(now) => {
                log::debug!("Session for user {} expired", session.user_id);
                self.sign_out(marker);
                SessionStatus::SignedOut
            }
            Some(session) => SessionStatus::SignedIn(session),
            None => SessionStatus::SignedOut,
        }
    }

    /// Drop the session and close its store; false if it did not exist
    pub fn sign_out(&self, token: &str) -> bool {
        let removed = self.sessions.write().unwrap().remove(token);
        match removed {
            Some(session) => {
                session.store.close();
                log::info!("User {} signed out", session.user_id);
                true
            }
            None => false,
        }
    }

    /// Remove every expired session, returning how many went away
    pub fn purge_expired(&self) -> usize {
        self.purge_expired_at(Utc::now())
    }

    pub fn purge_expired_at(&self, now: DateTime<Utc>) -> usize {
        let mut sessions = self.sessions.write().unwrap();
        let expired: Vec<String> = sessions
            .iter()
            .filter(|(_, s)| s.is_expired_at(now))
            .map(|(token, _)| token.clone())
            .collect();
        for token in &expired {
            if let Some(session) = sessions.remove(token) {
                session.store.close();
            }
        }
        expired.len()
    }

    pub fn active_count(&self) -> usize {
        self.sessions.read().unwrap().len()
    }

    fn flag_session(&self, identity: &Identity, now: DateTime<Utc>) -> Session {
        let mut slot = self.flag_session.write().unwrap();
        slot.get_or_insert_with(|| self.new_session("true".to_string(), identity.clone(), now, None))
            .clone()
    }

    fn new_session(
        &self,
        token: String,
        identity: Identity,
        now: DateTime<Utc>,
        expires_at: Option<DateTime<Utc>>,
    ) -> Session {
        let store = Arc::new(RecordStore::new(&identity.user_id, self.api.clone()));
        Session {
            token,
            user_id: identity.user_id,
            display_name: identity.display_name,
            issued_at: now,
            expires_at,
            store,
        }
    }
}

// ==================== Tests ====================
