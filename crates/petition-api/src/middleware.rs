use axum::{
    extract::{Request, State},
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use tower_sessions::Session;

use petition_types::models::User;

use crate::auth::{self, AppState};
use crate::error::AppError;

/// The signed-in user, placed in request extensions by [`require_auth`].
#[derive(Debug, Clone)]
pub struct CurrentUser(pub User);

/// Let signed-in users through; send everyone else to the front page
/// instead of answering with an error.
pub async fn require_auth(
    State(state): State<AppState>,
    session: Session,
    mut req: Request,
    next: Next,
) -> Result<Response, AppError> {
    match auth::current_user(&state, &session).await? {
        Some(user) => {
            req.extensions_mut().insert(CurrentUser(user));
            Ok(next.run(req).await)
        }
        None => Ok(Redirect::to("/").into_response()),
    }
}
