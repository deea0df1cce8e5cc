pub mod access;
pub mod extractors;
pub mod middleware;
pub mod password;
pub mod session;
pub mod token;

use chrono::{DateTime, Utc};
use lazy_static::lazy_static;
use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError};

// Re-export necessary items
pub use access::{ensure_owner, is_owner};
pub use extractors::{CurrentUser, MaybeUser};
pub use middleware::SessionMiddleware;
pub use password::PasswordHasher;
pub use session::{
    create_session, destroy_session, require_user, resolve_session, SESSION_COOKIE,
};

lazy_static! {
    // Letters, digits, underscores and hyphens.
    static ref USERNAME_REGEX: regex::Regex = regex::Regex::new(r"^[a-zA-Z0-9_-]+$").unwrap();
}

/// Represents the payload for a user login request.
#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(length(min = 1, message = "Username must not be empty"))]
    pub username: String,
    #[validate(length(min = 1, message = "Password must not be empty"))]
    pub password: String,
}

/// Represents the payload for a new user registration request.
#[derive(Debug, Deserialize, Validate)]
pub struct RegisterRequest {
    /// 4 to 8 characters: letters, digits, underscores or hyphens.
    #[validate(
        length(min = 4, max = 8, message = "Username must be 4 to 8 characters long"),
        regex(
            path = "USERNAME_REGEX",
            message = "Username may only contain letters, digits, underscores or hyphens"
        )
    )]
    pub username: String,
    #[validate(length(min = 4, message = "Password must be at least 4 characters long"))]
    pub password: String,
}

/// Payload for changing the signed-in user's password.
#[derive(Debug, Deserialize, Validate)]
#[validate(schema(function = "validate_password_confirmation", skip_on_field_errors = false))]
pub struct UpdatePasswordRequest {
    #[validate(length(min = 1, message = "Old password must not be empty"))]
    pub old_password: String,
    #[validate(length(min = 4, message = "Password must be at least 4 characters long"))]
    pub new_password: String,
    pub confirm_password: String,
}

fn validate_password_confirmation(req: &UpdatePasswordRequest) -> Result<(), ValidationError> {
    if req.new_password != req.confirm_password {
        let mut err = ValidationError::new("password_mismatch");
        err.message = Some("New password and confirmation do not match".into());
        return Err(err);
    }
    Ok(())
}

/// Response body after registration.
#[derive(Debug, Serialize, Deserialize)]
pub struct RegisterResponse {
    pub user_id: i32,
    pub username: String,
}

/// Response body after login. The token itself travels in the session cookie.
#[derive(Debug, Serialize, Deserialize)]
pub struct LoginResponse {
    pub user_id: i32,
    pub username: String,
    pub expires_at: DateTime<Utc>,
}
