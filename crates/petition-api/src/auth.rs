use std::sync::Arc;

use anyhow::anyhow;
use argon2::{
    Argon2, PasswordHash, PasswordHasher, PasswordVerifier,
    password_hash::{self, SaltString, rand_core::OsRng},
};
use axum::{
    Form,
    extract::State,
    response::{IntoResponse, Redirect, Response},
};
use thiserror::Error;
use time::OffsetDateTime;
use tower_sessions::Session;
use tracing::{error, info, warn};

use petition_db::Database;
use petition_types::api::LoginForm;
use petition_types::models::User;

use crate::error::AppError;
use crate::session::{self, LOGIN_EXPIRES_KEY, LOGIN_MESSAGES_KEY, USER_ID_KEY};
use crate::views;

pub type AppState = Arc<AppStateInner>;

pub struct AppStateInner {
    pub db: Database,
    /// How long a sign-in lasts, counted from login and not extended by use.
    pub login_ttl: time::Duration,
}

impl AppStateInner {
    /// Run blocking store work off the async runtime.
    pub async fn run_db<F, T>(self: &Arc<Self>, f: F) -> anyhow::Result<T>
    where
        F: FnOnce(&Database) -> anyhow::Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let state = self.clone();
        tokio::task::spawn_blocking(move || f(&state.db))
            .await
            .map_err(|e| {
                error!("spawn_blocking join error: {}", e);
                anyhow!("blocking task failed: {}", e)
            })?
    }
}

/// Verified against when the username is unknown, so both failure paths pay
/// for one Argon2 run.
const DUMMY_HASH: &str = "$argon2id$v=19$m=19456,t=2,p=1$c29tZXNhbHRzb21lc2FsdA$AAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAA";

#[derive(Debug, Error)]
pub enum AuthError {
    /// Deliberately silent about which of the two fields was wrong.
    #[error("Notandanafn eða lykilorð vitlaust.")]
    InvalidCredentials,

    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

/// Hash a password with Argon2id and a fresh salt, as a PHC string.
pub fn hash_password(password: &str) -> anyhow::Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| anyhow!("Password hashing failed: {}", e))?
        .to_string();
    Ok(hash)
}

fn verify_password(password: &str, hash: &str) -> anyhow::Result<bool> {
    let parsed = PasswordHash::new(hash).map_err(|e| anyhow!("Stored hash unreadable: {}", e))?;

    match Argon2::default().verify_password(password.as_bytes(), &parsed) {
        Ok(()) => Ok(true),
        Err(password_hash::Error::Password) => Ok(false),
        Err(e) => Err(anyhow!("Password verification failed: {}", e)),
    }
}

pub async fn authenticate(
    state: &AppState,
    username: &str,
    password: &str,
) -> Result<User, AuthError> {
    let username = username.to_string();
    let password = password.to_string();

    let user = state
        .run_db(move |db| {
            let row = db.get_user_by_username(&username)?;
            let hash = row.as_ref().map_or(DUMMY_HASH, |r| r.password.as_str());
            let matches = verify_password(&password, hash)?;
            Ok(row.filter(|_| matches))
        })
        .await?;

    user.map(User::from).ok_or(AuthError::InvalidCredentials)
}

fn now_millis() -> i64 {
    (OffsetDateTime::now_utc().unix_timestamp_nanos() / 1_000_000) as i64
}

/// Bind the session to the user's id until `ttl` from now. A new session id
/// is issued so a pre-login cookie cannot be reused.
pub async fn establish_session(
    session: &Session,
    user: &User,
    ttl: time::Duration,
) -> Result<(), tower_sessions::session::Error> {
    session.cycle_id().await?;
    session.insert(USER_ID_KEY, user.id).await?;
    session
        .insert(LOGIN_EXPIRES_KEY, now_millis() + ttl.whole_milliseconds() as i64)
        .await
}

async fn forget_user(session: &Session) -> Result<(), tower_sessions::session::Error> {
    session.remove::<i64>(USER_ID_KEY).await?;
    session.remove::<i64>(LOGIN_EXPIRES_KEY).await?;
    Ok(())
}

/// Resolve the signed-in user from the id stored in the session. A sign-in
/// past its deadline, or an id that no longer exists, is dropped and the
/// visitor is treated as anonymous.
pub async fn current_user(state: &AppState, session: &Session) -> Result<Option<User>, AppError> {
    let Some(user_id) = session.get::<i64>(USER_ID_KEY).await? else {
        return Ok(None);
    };

    let expires = session.get::<i64>(LOGIN_EXPIRES_KEY).await?;
    if expires.is_none_or(|at| now_millis() >= at) {
        info!("Sign-in for user {} expired", user_id);
        forget_user(session).await?;
        return Ok(None);
    }

    let row = state.run_db(move |db| db.get_user_by_id(user_id)).await?;
    match row {
        Some(row) => Ok(Some(row.into())),
        None => {
            warn!("Session bound to missing user {}", user_id);
            forget_user(session).await?;
            Ok(None)
        }
    }
}

/// GET /login
pub async fn login_form(
    State(state): State<AppState>,
    session: Session,
) -> Result<Response, AppError> {
    if current_user(&state, &session).await?.is_some() {
        return Ok(Redirect::to("/admin").into_response());
    }

    let messages = session::take_messages(&session, LOGIN_MESSAGES_KEY).await?;
    Ok(views::login(&messages.join(", ")).into_response())
}

/// POST /login
pub async fn login(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<LoginForm>,
) -> Result<Redirect, AppError> {
    match authenticate(&state, &form.username, &form.password).await {
        Ok(user) => {
            establish_session(&session, &user, state.login_ttl).await?;
            info!("User {} signed in", user.username);
            Ok(Redirect::to("/admin"))
        }
        Err(AuthError::InvalidCredentials) => {
            warn!("Failed login for '{}'", form.username);
            session::push_messages(
                &session,
                LOGIN_MESSAGES_KEY,
                vec![AuthError::InvalidCredentials.to_string()],
            )
            .await?;
            Ok(Redirect::to("/login"))
        }
        Err(AuthError::Internal(e)) => Err(e.into()),
    }
}

/// GET /logout
pub async fn logout(session: Session) -> Result<Redirect, AppError> {
    session.flush().await?;
    Ok(Redirect::to("/"))
}
