//! Refresh-token cookie helpers.

use actix_web::cookie::{time::Duration, Cookie, SameSite};
use actix_web::HttpRequest;

/// Cookie name for the refresh token (long-lived, 7 days).
pub const REFRESH_COOKIE_NAME: &str = "refreshToken";

const REFRESH_COOKIE_MAX_AGE_DAYS: i64 = 7;

/// HttpOnly, SameSite=Strict cookie carrying the refresh token.
pub fn refresh_cookie(token: String, secure: bool) -> Cookie<'static> {
    Cookie::build(REFRESH_COOKIE_NAME, token)
        .http_only(true)
        .same_site(SameSite::Strict)
        .path("/")
        .max_age(Duration::days(REFRESH_COOKIE_MAX_AGE_DAYS))
        .secure(secure)
        .finish()
}

/// A cookie that makes the browser drop the refresh cookie.
pub fn cleared_refresh_cookie(secure: bool) -> Cookie<'static> {
    let mut cookie = refresh_cookie(String::new(), secure);
    cookie.make_removal();
    cookie
}

/// The refresh token presented by the client, if any. Empty values count as absent.
pub fn refresh_token_from(req: &HttpRequest) -> Option<String> {
    req.cookie(REFRESH_COOKIE_NAME)
        .map(|cookie| cookie.value().to_string())
        .filter(|value| !value.is_empty())
}
