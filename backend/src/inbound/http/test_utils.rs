//! Shared helpers for HTTP adapter tests.

use actix_session::{SessionMiddleware, storage::CookieSessionStore};
use actix_web::cookie::Key;

/// Cookie name used by [`test_session_middleware`].
pub const SESSION_COOKIE: &str = "session";

/// Cookie session middleware with a throwaway key and `Secure` off, so plain
/// HTTP test clients keep the cookie.
pub fn test_session_middleware() -> SessionMiddleware<CookieSessionStore> {
    SessionMiddleware::builder(CookieSessionStore::default(), Key::generate())
        .cookie_name(SESSION_COOKIE.to_owned())
        .cookie_secure(false)
        .build()
}
