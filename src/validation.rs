use std::collections::BTreeMap;

use axum::{
    async_trait,
    extract::{FromRequest, FromRequestParts, Path, Query, Request},
    http::request::Parts,
    Json,
};
use lazy_static::lazy_static;
use regex::Regex;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use time::{Date, Weekday};

use crate::dates::parse_date;
use crate::error::AppError;

/// Field name -> messages, serialised as the `details` of a 400 response.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ValidationErrors(BTreeMap<String, Vec<String>>);

impl ValidationErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.0.entry(field.into()).or_default().push(message.into());
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn field(&self, name: &str) -> Option<&[String]> {
        self.0.get(name).map(Vec::as_slice)
    }

    pub fn into_result(self) -> Result<(), ValidationErrors> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(self)
        }
    }
}

pub trait Validate {
    fn validate(&self) -> Result<(), ValidationErrors>;
}

/// JSON body that has passed [`Validate`].
pub struct ValidJson<T>(pub T);

#[async_trait]
impl<S, T> FromRequest<S> for ValidJson<T>
where
    S: Send + Sync,
    T: DeserializeOwned + Validate,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state)
            .await
            .map_err(|rejection| AppError::BadRequest(rejection.body_text()))?;
        value.validate()?;
        Ok(Self(value))
    }
}

/// Path parameters; a malformed segment becomes a JSON 400.
pub struct ValidPath<T>(pub T);

#[async_trait]
impl<S, T> FromRequestParts<S> for ValidPath<T>
where
    S: Send + Sync,
    T: DeserializeOwned + Send,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Path(value) = Path::<T>::from_request_parts(parts, state)
            .await
            .map_err(|rejection| AppError::BadRequest(rejection.body_text()))?;
        Ok(Self(value))
    }
}

/// Query string; undecodable input becomes a JSON 400.
pub struct ValidQuery<T>(pub T);

#[async_trait]
impl<S, T> FromRequestParts<S> for ValidQuery<T>
where
    S: Send + Sync,
    T: DeserializeOwned,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Query(value) = Query::<T>::from_request_parts(parts, state)
            .await
            .map_err(|rejection| AppError::BadRequest(rejection.body_text()))?;
        Ok(Self(value))
    }
}

pub fn is_valid_email(email: &str) -> bool {
    lazy_static! {
        static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
    }
    EMAIL_RE.is_match(email)
}

/// Checks a new password; returns every rule it breaks.
pub fn password_problems(password: &str) -> Vec<&'static str> {
    let mut problems = Vec::new();
    if password.chars().count() < 8 {
        problems.push("Password must be at least 8 characters long");
    }
    if !password.chars().any(|c| c.is_uppercase()) {
        problems.push("Password must contain an uppercase letter");
    }
    if !password.chars().any(|c| c.is_lowercase()) {
        problems.push("Password must contain a lowercase letter");
    }
    if !password.chars().any(|c| c.is_ascii_digit()) {
        problems.push("Password must contain a digit");
    }
    problems
}

/// Records a length violation for `field` when `value` (trimmed) is outside `min..=max` chars.
pub fn check_len(errors: &mut ValidationErrors, field: &str, value: &str, min: usize, max: usize) {
    let len = value.trim().chars().count();
    if len == 0 && min > 0 {
        errors.add(field, "This field is required");
    } else if len < min {
        errors.add(field, format!("Must be at least {min} characters"));
    } else if len > max {
        errors.add(field, format!("Must be at most {max} characters"));
    }
}

/// Parses `YYYY-MM-DD` and requires the date to be a Monday.
pub fn parse_week_start(value: &str) -> Result<Date, &'static str> {
    let date = parse_date(value).ok_or("Date must use the YYYY-MM-DD format")?;
    if date.weekday() != Weekday::Monday {
        return Err("Week start date must be a Monday");
    }
    Ok(date)
}
