use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;
use validator::Validate;

/// Request body for user registration. No password strength policy, any
/// non-empty string is accepted.
#[derive(Debug, Deserialize, Validate)]
pub struct RegisterRequest {
    #[validate(email(message = "email must be a valid email address"))]
    pub email: String,
    #[validate(length(min = 1, message = "password is required"))]
    pub password: String,
}

/// Request body for login.
#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(email(message = "email must be a valid email address"))]
    pub email: String,
    #[validate(length(min = 1, message = "password is required"))]
    pub password: String,
}

/// Public part of the user returned to the client.
#[derive(Debug, Serialize)]
pub struct PublicUser {
    pub id: Uuid,
    pub email: String,
    pub created_at: OffsetDateTime,
}

#[derive(Debug, Serialize)]
pub struct RegisterResponse {
    pub status: &'static str,
    pub data: PublicUser,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub status: &'static str,
    pub token: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validation::collect_field_errors;

    #[test]
    fn register_rejects_malformed_email_and_empty_password() {
        let payload = RegisterRequest {
            email: "not-an-email".into(),
            password: String::new(),
        };
        let errors = payload.validate().unwrap_err();
        let fields = collect_field_errors(&errors);
        assert_eq!(fields.len(), 2);
        assert_eq!(fields[0].field, "email");
        assert_eq!(fields[1].field, "password");
    }

    #[test]
    fn register_accepts_any_non_empty_password() {
        let payload = RegisterRequest {
            email: "admin@mail.com".into(),
            password: "x".into(),
        };
        assert!(payload.validate().is_ok());
    }

    #[test]
    fn public_user_serializes_without_password_hash() {
        let user = PublicUser {
            id: Uuid::new_v4(),
            email: "admin@mail.com".into(),
            created_at: OffsetDateTime::now_utc(),
        };
        let json = serde_json::to_string(&user).unwrap();
        assert!(json.contains("admin@mail.com"));
        assert!(!json.contains("password"));
    }
}
