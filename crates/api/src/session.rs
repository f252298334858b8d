// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Session-based authentication for admin and driver actors.
//!
//! Sessions are in-memory tokens with a fixed TTL. A driver session binds
//! the token to one driver identity; room authorization and stop ownership
//! checks key off that identity for the life of the session.

use crate::auth::{AuthenticatedActor, Role};
use crate::error::AuthError;
use lastmile_domain::DriverId;
use std::collections::HashMap;
use time::{Duration, OffsetDateTime};
use tracing::debug;

/// How long a session stays valid after login.
pub const SESSION_TTL: Duration = Duration::hours(12);

struct SessionRecord {
    actor: AuthenticatedActor,
    expires_at: OffsetDateTime,
}

/// In-memory session service.
///
/// The server wraps this in a mutex alongside the store; session churn is
/// tiny compared to mutation traffic.
#[derive(Default)]
pub struct SessionService {
    sessions: HashMap<String, SessionRecord>,
}

impl SessionService {
    /// Creates an empty session service.
    #[must_use]
    pub fn new() -> Self {
        Self {
            sessions: HashMap::new(),
        }
    }

    /// Opens an admin session and returns its token.
    pub fn login_admin(&mut self, actor_id: String) -> String {
        self.open_session(AuthenticatedActor::admin(actor_id))
    }

    /// Opens a driver session bound to one driver identity.
    pub fn login_driver(&mut self, actor_id: String, driver_id: DriverId) -> String {
        self.open_session(AuthenticatedActor::driver(actor_id, driver_id))
    }

    /// Validates a session token and returns the authenticated actor.
    ///
    /// # Errors
    ///
    /// Returns an error if the token is unknown or the session expired.
    /// Expired sessions are removed on the failed lookup.
    pub fn validate(&mut self, token: &str) -> Result<AuthenticatedActor, AuthError> {
        let Some(expires_at) = self.sessions.get(token).map(|record| record.expires_at) else {
            return Err(AuthError::AuthenticationFailed {
                reason: String::from("Invalid session token"),
            });
        };

        if OffsetDateTime::now_utc() > expires_at {
            self.sessions.remove(token);
            return Err(AuthError::AuthenticationFailed {
                reason: String::from("Session expired"),
            });
        }

        self.sessions
            .get(token)
            .map(|record| record.actor.clone())
            .ok_or(AuthError::AuthenticationFailed {
                reason: String::from("Invalid session token"),
            })
    }

    /// Logs out by deleting the session.
    pub fn revoke(&mut self, token: &str) {
        if self.sessions.remove(token).is_some() {
            debug!("Revoked session");
        }
    }

    /// Returns how many sessions are currently held, expired or not.
    #[must_use]
    pub fn session_count(&self) -> usize {
        self.sessions.len()
    }

    fn open_session(&mut self, actor: AuthenticatedActor) -> String {
        let token: String = Self::generate_session_token();
        let expires_at: OffsetDateTime = OffsetDateTime::now_utc() + SESSION_TTL;
        debug!(actor_id = %actor.id, role = actor.role.as_str(), "Opened session");
        self.sessions
            .insert(token.clone(), SessionRecord { actor, expires_at });
        token
    }

    /// Generates a session token.
    ///
    /// Uses a timestamp plus random component. Tokens are opaque; nothing
    /// parses them back.
    fn generate_session_token() -> String {
        let timestamp: i64 = OffsetDateTime::now_utc().unix_timestamp();
        format!("session_{timestamp}_{}", rand::random::<u64>())
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::expect_used)]

    use super::*;

    #[test]
    fn test_login_then_validate_returns_actor() {
        let mut sessions = SessionService::new();
        let token = sessions.login_driver(String::from("driver-7"), DriverId::new(7));

        let actor = sessions.validate(&token).expect("valid session");

        assert_eq!(actor.role, Role::Driver);
        assert_eq!(actor.driver_id, Some(DriverId::new(7)));
    }

    #[test]
    fn test_unknown_token_is_refused() {
        let mut sessions = SessionService::new();

        let result = sessions.validate("session_0_0");

        assert!(matches!(
            result,
            Err(AuthError::AuthenticationFailed { .. })
        ));
    }

    #[test]
    fn test_revoked_token_is_refused() {
        let mut sessions = SessionService::new();
        let token = sessions.login_admin(String::from("dispatch-1"));

        sessions.revoke(&token);

        assert!(sessions.validate(&token).is_err());
        assert_eq!(sessions.session_count(), 0);
    }

    #[test]
    fn test_tokens_are_unique() {
        let mut sessions = SessionService::new();
        let first = sessions.login_admin(String::from("dispatch-1"));
        let second = sessions.login_admin(String::from("dispatch-1"));

        assert_ne!(first, second);
        assert_eq!(sessions.session_count(), 2);
    }
}
