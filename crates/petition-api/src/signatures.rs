use axum::{
    Extension, Form,
    extract::{Path, State},
    response::{Html, IntoResponse, Redirect, Response},
};
use tower_sessions::Session;
use tracing::{debug, info, warn};

use petition_db::is_constraint_violation;
use petition_types::PAGE_SIZE;
use petition_types::api::SignatureForm;
use petition_types::models::Signature;

use crate::auth::{self, AppState};
use crate::error::AppError;
use crate::middleware::CurrentUser;
use crate::session::{self, ERRORS_KEY};
use crate::validation;
use crate::views::{self, Listing};

/// Shown when the store refuses a row that passed validation. Names no
/// field, since the store does not say which rule was broken.
pub const NOT_STORED: &str = "Ekki tókst að vista undirskrift.";

/// Path numbers are plain decimal digits: no sign, no spaces.
fn is_plain_number(raw: &str) -> bool {
    !raw.is_empty() && raw.bytes().all(|b| b.is_ascii_digit())
}

fn parse_page(raw: &str) -> Option<i64> {
    if !is_plain_number(raw) {
        return None;
    }
    raw.parse::<u32>().ok().map(i64::from)
}

fn parse_id(raw: &str) -> Option<i64> {
    if !is_plain_number(raw) {
        return None;
    }
    raw.parse::<i64>().ok()
}

async fn fetch_listing(state: &AppState, page: i64) -> Result<Listing, AppError> {
    let offset = page * PAGE_SIZE;
    let (rows, total) = state
        .run_db(move |db| {
            let rows = db.list_signatures(PAGE_SIZE, offset)?;
            let total = db.count_signatures()?;
            Ok((rows, total))
        })
        .await?;

    Ok(Listing {
        signatures: rows.into_iter().map(Signature::from).collect(),
        total,
        page,
    })
}

async fn render_index(state: &AppState, session: &Session, page: i64) -> Result<Html<String>, AppError> {
    let listing = fetch_listing(state, page).await?;
    let errors = session::take_messages(session, ERRORS_KEY).await?;
    let user = auth::current_user(state, session).await?;
    Ok(views::index(&listing, &errors, user.as_ref()))
}

async fn render_admin(
    state: &AppState,
    session: &Session,
    user: &CurrentUser,
    page: i64,
) -> Result<Html<String>, AppError> {
    let listing = fetch_listing(state, page).await?;
    let errors = session::take_messages(session, ERRORS_KEY).await?;
    Ok(views::admin(&listing, &errors, &user.0))
}

/// GET /
pub async fn index(
    State(state): State<AppState>,
    session: Session,
) -> Result<Html<String>, AppError> {
    render_index(&state, &session, 0).await
}

/// GET /{page}
pub async fn page(
    State(state): State<AppState>,
    session: Session,
    Path(raw): Path<String>,
) -> Result<Response, AppError> {
    let page = parse_page(&raw).ok_or(AppError::NotFound)?;
    if page == 0 {
        return Ok(Redirect::to("/").into_response());
    }
    Ok(render_index(&state, &session, page).await?.into_response())
}

/// POST /
pub async fn submit(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<SignatureForm>,
) -> Result<Redirect, AppError> {
    let new = match validation::validate(&form) {
        Ok(new) => new,
        Err(failure) => {
            debug!("Signature rejected: {}", failure);
            session::push_messages(&session, ERRORS_KEY, failure.messages).await?;
            return Ok(Redirect::to("/"));
        }
    };

    match state.run_db(move |db| db.insert_signature(&new)).await {
        Ok(row) => info!("Signature {} stored", row.id),
        Err(e) if is_constraint_violation(&e) => {
            warn!("Store refused signature: {:#}", e);
            session::push_messages(&session, ERRORS_KEY, vec![NOT_STORED.to_string()]).await?;
        }
        Err(e) => return Err(e.into()),
    }

    Ok(Redirect::to("/"))
}

/// GET /admin
pub async fn admin(
    State(state): State<AppState>,
    session: Session,
    Extension(user): Extension<CurrentUser>,
) -> Result<Html<String>, AppError> {
    render_admin(&state, &session, &user, 0).await
}

/// GET /admin/{page}
pub async fn admin_page(
    State(state): State<AppState>,
    session: Session,
    Extension(user): Extension<CurrentUser>,
    Path(raw): Path<String>,
) -> Result<Response, AppError> {
    let page = parse_page(&raw).ok_or(AppError::NotFound)?;
    if page == 0 {
        return Ok(Redirect::to("/admin").into_response());
    }
    Ok(render_admin(&state, &session, &user, page).await?.into_response())
}

/// POST /delete/{id}
pub async fn delete(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Path(raw): Path<String>,
) -> Result<Redirect, AppError> {
    let id = parse_id(&raw).ok_or(AppError::NotFound)?;

    let removed = state.run_db(move |db| db.delete_signature(id)).await?;
    if removed {
        info!("Signature {} deleted by {}", id, user.username);
    } else {
        debug!("Delete of missing signature {} by {}", id, user.username);
    }

    Ok(Redirect::to("/admin"))
}
