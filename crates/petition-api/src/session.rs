//! Server-side sessions: an in-memory store behind a signed cookie. Each
//! visitor's session carries the signed-in user id and any flash messages
//! waiting for the next page render.

use axum::Router;
use sha2::{Digest, Sha512};
use tower_sessions::{
    Expiry, MemoryStore, Session, SessionManagerLayer,
    cookie::{Key, SameSite},
};

pub const COOKIE_NAME: &str = "petition.sid";
pub const DEFAULT_TTL_SECS: i64 = 20;

pub(crate) const USER_ID_KEY: &str = "user_id";
/// Unix milliseconds after which the sign-in stops counting.
pub(crate) const LOGIN_EXPIRES_KEY: &str = "login_expires";
/// Messages shown above the signature listings.
pub(crate) const ERRORS_KEY: &str = "errors";
/// Messages shown on the login form.
pub(crate) const LOGIN_MESSAGES_KEY: &str = "login_messages";

#[derive(Clone)]
pub struct SessionSettings {
    /// Cookie signing secret; any length, stretched to a 64-byte key.
    pub secret: String,
    pub ttl: time::Duration,
    pub secure_cookie: bool,
}

impl SessionSettings {
    pub fn new(secret: impl Into<String>) -> Self {
        Self {
            secret: secret.into(),
            ttl: time::Duration::seconds(DEFAULT_TTL_SECS),
            secure_cookie: false,
        }
    }
}

/// Wrap `router` in the session manager. Sessions live only in this
/// process and vanish on restart.
pub fn with_sessions(router: Router, settings: &SessionSettings) -> Router {
    router.layer(
        SessionManagerLayer::new(MemoryStore::default())
            .with_name(COOKIE_NAME)
            .with_http_only(true)
            .with_secure(settings.secure_cookie)
            .with_same_site(SameSite::Lax)
            .with_expiry(Expiry::OnInactivity(settings.ttl))
            .with_signed(signing_key(&settings.secret)),
    )
}

fn signing_key(secret: &str) -> Key {
    Key::from(Sha512::digest(secret.as_bytes()).as_slice())
}

/// Queue messages for the next render, after any already waiting.
pub(crate) async fn push_messages(
    session: &Session,
    key: &str,
    messages: Vec<String>,
) -> Result<(), tower_sessions::session::Error> {
    let mut pending: Vec<String> = session.get(key).await?.unwrap_or_default();
    pending.extend(messages);
    session.insert(key, pending).await
}

/// Read and clear queued messages.
pub(crate) async fn take_messages(
    session: &Session,
    key: &str,
) -> Result<Vec<String>, tower_sessions::session::Error> {
    Ok(session.remove::<Vec<String>>(key).await?.unwrap_or_default())
}
