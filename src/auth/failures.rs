use axum::http::StatusCode;

/// Authentication failure codes and the message shown to the user for each.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthFailure {
    InvalidCredentials,
    EmailTaken,
    SamePassword,
    SessionMissing,
    SessionExpired,
    UserNotFound,
}

impl AuthFailure {
    pub fn code(&self) -> &'static str {
        match self {
            AuthFailure::InvalidCredentials => "invalid_credentials",
            AuthFailure::EmailTaken => "email_taken",
            AuthFailure::SamePassword => "same_password",
            AuthFailure::SessionMissing => "session_missing",
            AuthFailure::SessionExpired => "session_expired",
            AuthFailure::UserNotFound => "user_not_found",
        }
    }

    pub fn from_code(code: &str) -> Option<Self> {
        Some(match code {
            "invalid_credentials" => AuthFailure::InvalidCredentials,
            "email_taken" | "user_already_exists" => AuthFailure::EmailTaken,
            "same_password" => AuthFailure::SamePassword,
            "session_missing" => AuthFailure::SessionMissing,
            "session_expired" | "refresh_token_not_found" => AuthFailure::SessionExpired,
            "user_not_found" => AuthFailure::UserNotFound,
            _ => return None,
        })
    }

    pub fn message(&self) -> &'static str {
        match self {
            AuthFailure::InvalidCredentials => "Invalid email or password",
            AuthFailure::EmailTaken => "An account with this email already exists",
            AuthFailure::SamePassword => "New password must differ from the current one",
            AuthFailure::SessionMissing => "You need to sign in to continue",
            AuthFailure::SessionExpired => "Your session has expired, please sign in again",
            AuthFailure::UserNotFound => "Account not found",
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            AuthFailure::InvalidCredentials
            | AuthFailure::SessionMissing
            | AuthFailure::SessionExpired
            | AuthFailure::UserNotFound => StatusCode::UNAUTHORIZED,
            AuthFailure::EmailTaken => StatusCode::CONFLICT,
            AuthFailure::SamePassword => StatusCode::BAD_REQUEST,
        }
    }
}
