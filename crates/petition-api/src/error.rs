use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;
use tracing::error;

pub const NOT_FOUND_BODY: &str = "Sorry can't find that!";
pub const INTERNAL_BODY: &str = "Something broke!";

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Not found")]
    NotFound,

    #[error("Session error: {0}")]
    Session(#[from] tower_sessions::session::Error),

    #[error("Internal error: {0:#}")]
    Internal(#[from] anyhow::Error),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        match self {
            AppError::NotFound => (StatusCode::NOT_FOUND, NOT_FOUND_BODY).into_response(),
            // Details stay in the log; clients get a fixed body.
            err => {
                error!("{}", err);
                (StatusCode::INTERNAL_SERVER_ERROR, INTERNAL_BODY).into_response()
            }
        }
    }
}

/// Router fallback for anything no route matched.
pub async fn not_found() -> AppError {
    AppError::NotFound
}
