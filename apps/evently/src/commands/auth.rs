//! # Auth Commands
//!
//! Accounts and sessions. Passwords are stored as argon2 PHC strings.

use argon2::password_hash::{rand_core::OsRng, SaltString};
use argon2::{Argon2, PasswordHash, PasswordHasher, PasswordVerifier};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::error::{ApiError, ApiResult, ErrorCode};
use crate::state::{AppState, Session};
use evently_core::validation::{
    password_strength, validate_email, validate_password, validate_text, PasswordStrength,
};
use evently_core::{Role, User};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignupRequest {
    pub email: String,
    pub password: String,
    pub first_name: String,
    pub last_name: String,
    /// Defaults to attendee.
    pub role: Option<Role>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Creates an account and signs the session in.
pub async fn signup(
    state: &AppState,
    session: &mut Session,
    request: SignupRequest,
) -> ApiResult<User> {
    debug!(email = %request.email, "signup command");

    validate_email(&request.email)?;
    validate_password(&request.password)?;
    validate_text("first_name", &request.first_name, 50)?;
    validate_text("last_name", &request.last_name, 50)?;

    let user = User {
        id: Uuid::new_v4().to_string(),
        email: request.email.trim().to_lowercase(),
        first_name: request.first_name.trim().to_string(),
        last_name: request.last_name.trim().to_string(),
        role: request.role.unwrap_or_default(),
        created_at: Utc::now(),
    };

    let hash = hash_password(&request.password)?;
    state.db.users().insert(&user, &hash).await?;

    info!(user_id = %user.id, role = %user.role, "User signed up");
    session.replace_user(user.clone());
    Ok(user)
}

/// Verifies credentials and signs the session in.
pub async fn login(
    state: &AppState,
    session: &mut Session,
    request: LoginRequest,
) -> ApiResult<User> {
    debug!(email = %request.email, "login command");

    let (user, hash) = state
        .db
        .users()
        .get_credentials(&request.email.trim().to_lowercase())
        .await?
        .ok_or_else(|| ApiError::new(ErrorCode::NotFound, "User not found"))?;

    if !verify_password(&request.password, &hash) {
        warn!(user_id = %user.id, "Login rejected: wrong password");
        return Err(ApiError::unauthorized("Invalid password"));
    }

    info!(user_id = %user.id, "User logged in");
    session.replace_user(user.clone());
    Ok(user)
}

pub fn logout(session: &mut Session) {
    if let Some(user) = session.user() {
        info!(user_id = %user.id, "User logged out");
    }
    session.clear();
}

/// Changes the signed-in user's role, in storage and in the session.
pub async fn switch_role(state: &AppState, session: &mut Session, role: Role) -> ApiResult<User> {
    let user_id = session.require_user()?.id.clone();
    debug!(user_id = %user_id, role = %role, "switch_role command");

    let user = state.db.users().update_role(&user_id, role).await?;

    info!(user_id = %user.id, role = %user.role, "Role switched");
    session.replace_user(user.clone());
    Ok(user)
}

/// Score and label for a candidate password.
pub fn check_password_strength(password: &str) -> PasswordStrength {
    password_strength(password)
}

fn hash_password(password: &str) -> ApiResult<String> {
    let salt = SaltString::generate(&mut OsRng);

    let hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| {
            tracing::error!("Failed to hash password: {}", e);
            ApiError::internal("Failed to hash password")
        })?;

    Ok(hash.to_string())
}

fn verify_password(password: &str, hash: &str) -> bool {
    let parsed = match PasswordHash::new(hash) {
        Ok(h) => h,
        Err(_) => return false,
    };

    Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::test_support::{self, PASSWORD};
    use evently_core::validation::StrengthLabel;

    fn signup_request(email: &str, password: &str) -> SignupRequest {
        SignupRequest {
            email: email.to_string(),
            password: password.to_string(),
            first_name: "Grace".to_string(),
            last_name: "Hopper".to_string(),
            role: None,
        }
    }

    #[tokio::test]
    async fn test_signup_signs_in_as_attendee() {
        let state = test_support::state().await;
        let mut session = Session::anonymous();

        let user = signup(&state, &mut session, signup_request("Grace@Example.com", PASSWORD))
            .await
            .unwrap();

        assert_eq!(user.email, "grace@example.com");
        assert_eq!(user.role, Role::Attendee);
        assert_eq!(session.user(), Some(&user));
    }

    #[tokio::test]
    async fn test_signup_rejects_duplicate_and_weak() {
        let state = test_support::state().await;
        let mut session = Session::anonymous();
        signup(&state, &mut session, signup_request("grace@example.com", PASSWORD))
            .await
            .unwrap();

        let mut other = Session::anonymous();
        let err = signup(&state, &mut other, signup_request("GRACE@example.com", PASSWORD))
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::Conflict);
        assert_eq!(err.message, "Email already exists");

        let err = signup(&state, &mut other, signup_request("new@example.com", "short"))
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::ValidationError);
        assert!(!other.is_authenticated());
    }

    #[tokio::test]
    async fn test_login_checks_password() {
        let state = test_support::state().await;
        let mut session = test_support::attendee(&state).await;
        logout(&mut session);
        assert!(!session.is_authenticated());

        let err = login(
            &state,
            &mut session,
            LoginRequest {
                email: "attendee@example.com".to_string(),
                password: "Wrong123!".to_string(),
            },
        )
        .await
        .unwrap_err();
        assert_eq!(err.code, ErrorCode::Unauthorized);
        assert_eq!(err.message, "Invalid password");

        let err = login(
            &state,
            &mut session,
            LoginRequest {
                email: "nobody@example.com".to_string(),
                password: PASSWORD.to_string(),
            },
        )
        .await
        .unwrap_err();
        assert_eq!(err.message, "User not found");

        let user = login(
            &state,
            &mut session,
            LoginRequest {
                email: " Attendee@Example.com ".to_string(),
                password: PASSWORD.to_string(),
            },
        )
        .await
        .unwrap();
        assert_eq!(session.user(), Some(&user));
    }

    #[tokio::test]
    async fn test_switch_role_updates_store_and_session() {
        let state = test_support::state().await;
        let mut session = test_support::attendee(&state).await;

        let user = switch_role(&state, &mut session, Role::Organizer).await.unwrap();
        assert_eq!(user.role, Role::Organizer);
        assert_eq!(session.role(), Some(Role::Organizer));

        let stored = state.db.users().get_by_id(&user.id).await.unwrap().unwrap();
        assert_eq!(stored.role, Role::Organizer);

        let mut anonymous = Session::anonymous();
        let err = switch_role(&state, &mut anonymous, Role::Organizer)
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::Unauthorized);
    }

    #[test]
    fn test_password_strength_labels() {
        assert_eq!(check_password_strength("abc").label, StrengthLabel::Weak);
        assert_eq!(check_password_strength("abcDEF12").label, StrengthLabel::Strong);
        assert_eq!(check_password_strength(PASSWORD).score, 5);
    }
}
