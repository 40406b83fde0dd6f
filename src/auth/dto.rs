use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::validation::{check_len, is_valid_email, password_problems, Validate, ValidationErrors};

/// Request body for user registration.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub confirm_password: String,
}

/// Request body for login.
#[derive(Debug, Serialize, Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdatePasswordRequest {
    #[serde(default)]
    pub new_password: String,
    #[serde(default)]
    pub confirm_password: String,
}

/// Returned by login, register, refresh and `/me`.
#[derive(Debug, Serialize, Deserialize)]
pub struct AuthResponse {
    pub success: bool,
    pub user: PublicUser,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PublicUser {
    pub id: Uuid,
    pub email: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct MessageResponse {
    pub success: bool,
    pub message: String,
}

impl MessageResponse {
    pub fn ok(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
        }
    }
}

fn check_email(errors: &mut ValidationErrors, email: &str) {
    if email.trim().is_empty() {
        errors.add("email", "This field is required");
    } else if !is_valid_email(email.trim()) {
        errors.add("email", "Invalid email address");
    }
}

fn check_new_password(
    errors: &mut ValidationErrors,
    field: &str,
    password: &str,
    confirm: &str,
) {
    for problem in password_problems(password) {
        errors.add(field, problem);
    }
    if confirm.is_empty() {
        errors.add("confirmPassword", "This field is required");
    } else if password != confirm {
        errors.add("confirmPassword", "Passwords do not match");
    }
}

impl Validate for LoginRequest {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        check_email(&mut errors, &self.email);
        if self.password.is_empty() {
            errors.add("password", "This field is required");
        }
        errors.into_result()
    }
}

impl Validate for RegisterRequest {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        check_email(&mut errors, &self.email);
        check_len(&mut errors, "email", &self.email, 0, 254);
        check_new_password(&mut errors, "password", &self.password, &self.confirm_password);
        errors.into_result()
    }
}

impl Validate for UpdatePasswordRequest {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        check_new_password(&mut errors, "newPassword", &self.new_password, &self.confirm_password);
        errors.into_result()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn login_requires_password() {
        let req: LoginRequest = serde_json::from_str(r#"{"email":"a@b.pl"}"#).unwrap();
        let errors = req.validate().unwrap_err();
        assert_eq!(errors.field("password").unwrap(), ["This field is required"]);
        assert!(errors.field("email").is_none());
    }

    #[test]
    fn update_password_checks_strength_and_match() {
        let req: UpdatePasswordRequest =
            serde_json::from_str(r#"{"newPassword":"abcdefgh","confirmPassword":"abcdefgi"}"#)
                .unwrap();
        let errors = req.validate().unwrap_err();
        assert_eq!(errors.field("newPassword").unwrap().len(), 2);
        assert_eq!(errors.field("confirmPassword").unwrap(), ["Passwords do not match"]);

        let ok: UpdatePasswordRequest =
            serde_json::from_str(r#"{"newPassword":"Abcdefg1","confirmPassword":"Abcdefg1"}"#)
                .unwrap();
        assert!(ok.validate().is_ok());
    }

    #[test]
    fn register_rejects_bad_email() {
        let req = RegisterRequest {
            email: "nope".into(),
            password: "Abcdefg1".into(),
            confirm_password: "Abcdefg1".into(),
        };
        let errors = req.validate().unwrap_err();
        assert_eq!(errors.field("email").unwrap(), ["Invalid email address"]);
    }
}
