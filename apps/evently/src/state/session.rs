//! # Session
//!
//! The caller's identity, passed explicitly to every command.
//!
//! ```text
//! signup / login ──► Session { user: Some(..) } ──► commands
//!                          │
//!  switch_role ────────────┤ (stored user and session updated together)
//!                          │
//!  logout ─────────────────┴──► Session { user: None }
//! ```
//!
//! There is no global "current user". Two sessions for two users can drive
//! the same `AppState` at once.

use serde::{Deserialize, Serialize};

use crate::error::{ApiError, ApiResult};
use evently_core::{Role, User};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Session {
    user: Option<User>,
}

impl Session {
    /// Nobody signed in.
    pub fn anonymous() -> Self {
        Session { user: None }
    }

    pub fn for_user(user: User) -> Self {
        Session { user: Some(user) }
    }

    pub fn user(&self) -> Option<&User> {
        self.user.as_ref()
    }

    pub fn is_authenticated(&self) -> bool {
        self.user.is_some()
    }

    pub fn role(&self) -> Option<Role> {
        self.user.as_ref().map(|u| u.role)
    }

    /// The signed-in user, or `Unauthorized`.
    pub fn require_user(&self) -> ApiResult<&User> {
        self.user
            .as_ref()
            .ok_or_else(|| ApiError::unauthorized("Please sign in first"))
    }

    /// The signed-in organizer, or `Unauthorized` / `Forbidden`.
    pub fn require_organizer(&self) -> ApiResult<&User> {
        let user = self.require_user()?;
        if !user.is_organizer() {
            return Err(ApiError::forbidden("Organizer access required"));
        }
        Ok(user)
    }

    pub(crate) fn replace_user(&mut self, user: User) {
        self.user = Some(user);
    }

    pub(crate) fn clear(&mut self) {
        self.user = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;
    use chrono::Utc;

    fn user(role: Role) -> User {
        User {
            id: "u1".to_string(),
            email: "ada@example.com".to_string(),
            first_name: "Ada".to_string(),
            last_name: "Lovelace".to_string(),
            role,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_anonymous_session() {
        let session = Session::anonymous();
        assert!(!session.is_authenticated());
        assert_eq!(session.require_user().unwrap_err().code, ErrorCode::Unauthorized);
        assert_eq!(session.require_organizer().unwrap_err().code, ErrorCode::Unauthorized);
    }

    #[test]
    fn test_role_checks() {
        let attendee = Session::for_user(user(Role::Attendee));
        assert!(attendee.require_user().is_ok());
        assert_eq!(attendee.require_organizer().unwrap_err().code, ErrorCode::Forbidden);

        let organizer = Session::for_user(user(Role::Organizer));
        assert_eq!(organizer.require_organizer().unwrap().id, "u1");
        assert_eq!(organizer.role(), Some(Role::Organizer));
    }

    #[test]
    fn test_clear() {
        let mut session = Session::for_user(user(Role::Attendee));
        session.clear();
        assert!(session.user().is_none());
    }
}
