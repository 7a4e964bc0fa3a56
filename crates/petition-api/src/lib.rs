pub mod auth;
pub mod error;
pub mod middleware;
pub mod session;
pub mod signatures;
pub mod validation;
pub mod views;

use axum::{
    Router, middleware as axum_middleware,
    routing::{get, post},
};
use tower_http::trace::TraceLayer;

use crate::auth::AppState;
use crate::middleware::require_auth;
use crate::session::SessionSettings;

/// The full HTTP surface, sessions and request tracing included.
pub fn router(state: AppState, sessions: &SessionSettings) -> Router {
    let public_routes = Router::new()
        .route("/", get(signatures::index).post(signatures::submit))
        .route("/login", get(auth::login_form).post(auth::login))
        .route("/logout", get(auth::logout))
        .route("/{page}", get(signatures::page));

    let protected_routes = Router::new()
        .route("/admin", get(signatures::admin))
        .route("/admin/{page}", get(signatures::admin_page))
        .route("/delete/{id}", post(signatures::delete))
        .route_layer(axum_middleware::from_fn_with_state(state.clone(), require_auth));

    let app = Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .fallback(error::not_found)
        .method_not_allowed_fallback(error::not_found)
        .with_state(state);

    session::with_sessions(app, sessions).layer(TraceLayer::new_for_http())
}
