use axum::http::{header, HeaderMap, HeaderValue};

use crate::config::CookieConfig;

pub const SESSION_COOKIE: &str = "shopmate_session";
pub const REFRESH_COOKIE: &str = "shopmate_refresh";
const REFRESH_PATH: &str = "/api/auth";

fn build(name: &str, value: &str, path: &str, max_age_secs: i64, cfg: &CookieConfig) -> String {
    let mut cookie =
        format!("{name}={value}; Path={path}; Max-Age={max_age_secs}; HttpOnly; SameSite=Lax");
    if cfg.secure {
        cookie.push_str("; Secure");
    }
    cookie
}

/// `Set-Cookie` headers carrying a fresh access/refresh pair.
pub fn session_headers(
    access: &str,
    access_ttl_secs: i64,
    refresh: &str,
    refresh_ttl_secs: i64,
    cfg: &CookieConfig,
) -> HeaderMap {
    let mut headers = HeaderMap::new();
    for cookie in [
        build(SESSION_COOKIE, access, "/", access_ttl_secs, cfg),
        build(REFRESH_COOKIE, refresh, REFRESH_PATH, refresh_ttl_secs, cfg),
    ] {
        if let Ok(v) = HeaderValue::from_str(&cookie) {
            headers.append(header::SET_COOKIE, v);
        }
    }
    headers
}

/// `Set-Cookie` headers that expire both session cookies.
pub fn cleared_headers(cfg: &CookieConfig) -> HeaderMap {
    session_headers("", 0, "", 0, cfg)
}

/// Reads a cookie value from the request's `Cookie` headers.
pub fn read_cookie<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(k, _)| *k == name)
        .map(|(_, v)| v)
        .filter(|v| !v.is_empty())
}
