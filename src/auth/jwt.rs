use std::time::Duration;

use axum::{
    async_trait,
    extract::{FromRef, FromRequestParts},
    http::{header, request::Parts},
};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use time::{Duration as TimeDuration, OffsetDateTime};
use tracing::{debug, warn};
use uuid::Uuid;

use super::cookies::{read_cookie, SESSION_COOKIE};
use super::failures::AuthFailure;
use crate::{config::JwtConfig, error::AppError, state::AppState};

/// Type of JWT: access or refresh.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum TokenKind {
    Access,
    Refresh,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: Uuid,
    pub exp: usize,
    pub iat: usize,
    pub iss: String,
    pub aud: String,
    pub kind: TokenKind,
}

#[derive(Clone)]
pub struct JwtKeys {
    pub encoding: EncodingKey,
    pub decoding: DecodingKey,
    pub issuer: String,
    pub audience: String,
    pub access_ttl: Duration,
    pub refresh_ttl: Duration,
}

impl FromRef<AppState> for JwtKeys {
    fn from_ref(state: &AppState) -> Self {
        let JwtConfig {
            secret,
            issuer,
            audience,
            ttl_minutes,
            refresh_ttl_minutes,
        } = state.config.jwt.clone();
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            issuer,
            audience,
            access_ttl: Duration::from_secs((ttl_minutes.max(0) as u64) * 60),
            refresh_ttl: Duration::from_secs((refresh_ttl_minutes.max(0) as u64) * 60),
        }
    }
}

/// Signed access/refresh pair plus their lifetimes in seconds.
pub struct TokenPair {
    pub access: String,
    pub access_ttl_secs: i64,
    pub refresh: String,
    pub refresh_ttl_secs: i64,
}

impl JwtKeys {
    fn sign_with_kind(&self, user_id: Uuid, kind: TokenKind) -> anyhow::Result<String> {
        let now = OffsetDateTime::now_utc();
        let ttl = match kind {
            TokenKind::Access => self.access_ttl,
            TokenKind::Refresh => self.refresh_ttl,
        };
        let exp = now + TimeDuration::seconds(ttl.as_secs() as i64);
        let claims = Claims {
            sub: user_id,
            iat: now.unix_timestamp() as usize,
            exp: exp.unix_timestamp() as usize,
            iss: self.issuer.clone(),
            aud: self.audience.clone(),
            kind,
        };
        let token = encode(&Header::default(), &claims, &self.encoding)?;
        debug!(user_id = %user_id, kind = ?kind, "jwt signed");
        Ok(token)
    }

    pub fn sign_access(&self, user_id: Uuid) -> anyhow::Result<String> {
        self.sign_with_kind(user_id, TokenKind::Access)
    }

    pub fn sign_refresh(&self, user_id: Uuid) -> anyhow::Result<String> {
        self.sign_with_kind(user_id, TokenKind::Refresh)
    }

    pub fn sign_pair(&self, user_id: Uuid) -> anyhow::Result<TokenPair> {
        Ok(TokenPair {
            access: self.sign_access(user_id)?,
            access_ttl_secs: self.access_ttl.as_secs() as i64,
            refresh: self.sign_refresh(user_id)?,
            refresh_ttl_secs: self.refresh_ttl.as_secs() as i64,
        })
    }

    pub fn verify(&self, token: &str) -> anyhow::Result<Claims> {
        let mut validation = Validation::default();
        validation.set_audience(std::slice::from_ref(&self.audience));
        validation.set_issuer(std::slice::from_ref(&self.issuer));
        let data = decode::<Claims>(token, &self.decoding, &validation)?;
        debug!(user_id = %data.claims.sub, kind = ?data.claims.kind, "jwt verified");
        Ok(data.claims)
    }

    pub fn verify_refresh(&self, token: &str) -> anyhow::Result<Claims> {
        let claims = self.verify(token)?;
        if claims.kind != TokenKind::Refresh {
            anyhow::bail!("not a refresh token");
        }
        Ok(claims)
    }
}

/// Authenticated user id, taken from the session cookie or a Bearer header.
#[derive(Debug, Clone, Copy)]
pub struct AuthUser(pub Uuid);

#[async_trait]
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
    JwtKeys: FromRef<S>,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let keys = JwtKeys::from_ref(state);

        let bearer = parts
            .headers
            .get(header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.strip_prefix("Bearer "));
        let token = bearer
            .or_else(|| read_cookie(&parts.headers, SESSION_COOKIE))
            .ok_or(AuthFailure::SessionMissing)?;

        let claims = match keys.verify(token) {
            Ok(c) => c,
            Err(e) => {
                warn!(error = %e, "invalid or expired token");
                return Err(AuthFailure::SessionExpired.into());
            }
        };

        if claims.kind != TokenKind::Access {
            return Err(AuthFailure::SessionExpired.into());
        }

        Ok(AuthUser(claims.sub))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::{HeaderValue, Request};

    fn make_keys() -> JwtKeys {
        JwtKeys::from_ref(&AppState::fake())
    }

    async fn extract(req: Request<()>) -> Result<AuthUser, AppError> {
        let (mut parts, _) = req.into_parts();
        AuthUser::from_request_parts(&mut parts, &AppState::fake()).await
    }

    #[tokio::test]
    async fn sign_and_verify_access_token() {
        let keys = make_keys();
        let user_id = Uuid::new_v4();
        let token = keys.sign_access(user_id).expect("sign access");
        let claims = keys.verify(&token).expect("verify token");
        assert_eq!(claims.sub, user_id);
        assert_eq!(claims.iss, "test-issuer");
        assert_eq!(claims.aud, "test-aud");
        assert_eq!(claims.kind, TokenKind::Access);
    }

    #[tokio::test]
    async fn verify_refresh_rejects_access_token() {
        let keys = make_keys();
        let token = keys.sign_access(Uuid::new_v4()).expect("sign access");
        let err = keys.verify_refresh(&token).unwrap_err();
        assert!(err.to_string().contains("not a refresh token"));
    }

    #[tokio::test]
    async fn verify_rejects_other_audience() {
        let keys = make_keys();
        let mut other = make_keys();
        other.audience = "someone-else".into();
        let token = other.sign_access(Uuid::new_v4()).expect("sign access");
        assert!(keys.verify(&token).is_err());
    }

    #[tokio::test]
    async fn extractor_reads_session_cookie() {
        let user_id = Uuid::new_v4();
        let token = make_keys().sign_access(user_id).unwrap();
        let req = Request::builder()
            .header(
                header::COOKIE,
                HeaderValue::from_str(&format!("{SESSION_COOKIE}={token}")).unwrap(),
            )
            .body(())
            .unwrap();
        let AuthUser(id) = extract(req).await.expect("authenticated");
        assert_eq!(id, user_id);
    }

    #[tokio::test]
    async fn extractor_rejects_refresh_token_and_missing_session() {
        let token = make_keys().sign_refresh(Uuid::new_v4()).unwrap();
        let req = Request::builder()
            .header(header::AUTHORIZATION, format!("Bearer {token}"))
            .body(())
            .unwrap();
        let err = extract(req).await.err().expect("rejected");
        assert!(matches!(err, AppError::Auth(AuthFailure::SessionExpired)));

        let err = extract(Request::new(())).await.err().expect("rejected");
        assert!(matches!(err, AppError::Auth(AuthFailure::SessionMissing)));
    }
}
