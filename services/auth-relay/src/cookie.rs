//! Anti-forgery state cookie
//!
//! The state cookie is the only place a pending login lives. It is
//! `HttpOnly` (no script needs it) and `SameSite=Lax`: the callback arrives as
//! a cross-site top-level navigation from the provider, which `Strict` would
//! strip the cookie from.

use axum::http::HeaderMap;
use axum::http::header::COOKIE;

use crate::config::CookieConfig;

const EPOCH_HTTP_DATE: &str = "Thu, 01 Jan 1970 00:00:00 GMT";

/// `Set-Cookie` value storing a freshly issued state.
pub fn state_cookie(config: &CookieConfig, state: &str) -> String {
    let mut cookie = format!(
        "{}={}; Path=/; Max-Age={}; HttpOnly; SameSite=Lax",
        config.name, state, config.max_age_secs
    );
    if config.secure {
        cookie.push_str("; Secure");
    }
    cookie
}

/// `Set-Cookie` value that expires the state cookie immediately.
pub fn clear_state_cookie(config: &CookieConfig) -> String {
    let mut cookie = format!(
        "{}=; Path=/; Max-Age=0; Expires={EPOCH_HTTP_DATE}; HttpOnly; SameSite=Lax",
        config.name
    );
    if config.secure {
        cookie.push_str("; Secure");
    }
    cookie
}

/// Value of the named cookie from the request's `Cookie` header(s).
///
/// Browsers may send several cookies in one header and, over HTTP/2, several
/// headers. The first exact name match wins.
pub fn read_cookie<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(key, _)| *key == name)
        .map(|(_, value)| value.trim_matches('"'))
}
