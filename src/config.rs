use anyhow::Context;
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct JwtConfig {
    pub secret: String,
    pub issuer: String,
    pub audience: String,
    pub ttl_minutes: i64,
    pub refresh_ttl_minutes: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CookieConfig {
    /// Adds the `Secure` attribute; enable behind TLS.
    pub secure: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub database_url: String,
    pub host: String,
    pub port: u16,
    pub jwt: JwtConfig,
    pub cookie: CookieConfig,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url = std::env::var("DATABASE_URL").context("DATABASE_URL is not set")?;
        let jwt = JwtConfig {
            secret: std::env::var("JWT_SECRET").context("JWT_SECRET is not set")?,
            issuer: std::env::var("JWT_ISSUER").unwrap_or_else(|_| "shopmate".into()),
            audience: std::env::var("JWT_AUDIENCE").unwrap_or_else(|_| "shopmate-users".into()),
            ttl_minutes: parse_or("JWT_TTL_MINUTES", 60),
            refresh_ttl_minutes: parse_or("JWT_REFRESH_TTL_MINUTES", 60 * 24 * 14),
        };
        let cookie = CookieConfig {
            secure: parse_or("COOKIE_SECURE", false),
        };
        Ok(Self {
            database_url,
            host: std::env::var("APP_HOST").unwrap_or_else(|_| "0.0.0.0".into()),
            port: parse_or("APP_PORT", 8080),
            jwt,
            cookie,
        })
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn parse_or<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse::<T>().ok())
        .unwrap_or(default)
}
