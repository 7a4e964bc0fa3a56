use std::sync::Arc;

use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode, header},
    response::Response,
};
use tower::ServiceExt;

use petition_api::auth::{AppState, AppStateInner, hash_password};
use petition_api::session::SessionSettings;
use petition_api::{router, signatures, validation};
use petition_db::Database;
use petition_types::models::NewSignature;

const ADMIN_PASSWORD: &str = "lykilorð";

fn app() -> (Router, AppState) {
    app_with_login_ttl(time::Duration::seconds(20))
}

fn app_with_login_ttl(login_ttl: time::Duration) -> (Router, AppState) {
    let db = Database::open_in_memory().unwrap();
    db.upsert_user("admin", &hash_password(ADMIN_PASSWORD).unwrap())
        .unwrap();

    let state: AppState = Arc::new(AppStateInner { db, login_ttl });
    let app = router(state.clone(), &SessionSettings::new("test-only-secret"));
    (app, state)
}

async fn send(app: &Router, req: Request<Body>) -> Response {
    app.clone().oneshot(req).await.unwrap()
}

fn get(uri: &str, cookie: Option<&str>) -> Request<Body> {
    let mut builder = Request::get(uri);
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }
    builder.body(Body::empty()).unwrap()
}

fn post_form(uri: &str, body: &str, cookie: Option<&str>) -> Request<Body> {
    let mut builder = Request::post(uri).header(
        header::CONTENT_TYPE,
        "application/x-www-form-urlencoded",
    );
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

/// `name=value` of the session cookie a response set, if any.
fn session_cookie(res: &Response) -> Option<String> {
    res.headers()
        .get(header::SET_COOKIE)?
        .to_str()
        .ok()?
        .split(';')
        .next()
        .map(str::to_string)
}

fn location(res: &Response) -> &str {
    res.headers()
        .get(header::LOCATION)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
}

async fn text(res: Response) -> String {
    let bytes = axum::body::to_bytes(res.into_body(), usize::MAX).await.unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

async fn login(app: &Router) -> String {
    let res = send(
        app,
        post_form("/login", "username=admin&password=lykilor%C3%B0", None),
    )
    .await;
    assert_eq!(res.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&res), "/admin");
    session_cookie(&res).expect("login sets a session cookie")
}

fn seed(state: &AppState, count: usize) {
    for i in 0..count {
        state
            .db
            .insert_signature(&NewSignature {
                name: format!("Nafn {i}"),
                national_id: format!("{:010}", i),
                comment: String::new(),
                anonymous: false,
            })
            .unwrap();
    }
}

#[tokio::test]
async fn valid_submission_is_stored_normalized() {
    let (app, state) = app();
    seed(&state, 3);

    let res = send(
        &app,
        post_form(
            "/",
            "name=J%C3%B3n&nationalId=010130-1234&text=stu%C3%B0ningur",
            None,
        ),
    )
    .await;
    assert_eq!(res.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&res), "/");

    let newest = state.db.list_signatures(50, 0).unwrap().remove(0);
    assert_eq!(newest.name, "Jón");
    assert_eq!(newest.national_id, "0101301234");
    assert_eq!(newest.comment, "stuðningur");
    assert!(!newest.anonymous);

    let page = text(send(&app, get("/", None)).await).await;
    assert!(page.contains("Fjöldi undirskrifta: 4"));
    assert!(page.contains("stuðningur"));
}

#[tokio::test]
async fn ticked_checkbox_marks_signature_anonymous() {
    let (app, state) = app();

    send(&app, post_form("/", "name=Gunna&nationalId=0101301234&check=on", None)).await;

    let row = state.db.list_signatures(1, 0).unwrap().remove(0);
    assert!(row.anonymous);
    assert_eq!(row.comment, "");
}

#[tokio::test]
async fn invalid_submission_is_reported_once_and_not_stored() {
    let (app, state) = app();

    let res = send(&app, post_form("/", "name=J%C3%B3n&nationalId=abc", None)).await;
    assert_eq!(res.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&res), "/");
    assert_eq!(state.db.count_signatures().unwrap(), 0);

    let cookie = session_cookie(&res).expect("errors travel in the session");
    let page = text(send(&app, get("/", Some(&cookie))).await).await;
    assert!(page.contains(validation::NATIONAL_ID_FORMAT));

    let again = text(send(&app, get("/", Some(&cookie))).await).await;
    assert!(!again.contains(validation::NATIONAL_ID_FORMAT));
}

#[tokio::test]
async fn errors_do_not_leak_between_visitors() {
    let (app, _state) = app();

    send(&app, post_form("/", "name=&nationalId=", None)).await;

    let page = text(send(&app, get("/", None)).await).await;
    assert!(!page.contains(validation::NAME_EMPTY));
    assert!(!page.contains(validation::NATIONAL_ID_EMPTY));
}

#[tokio::test]
async fn second_signature_with_same_national_id_is_refused() {
    let (app, state) = app();

    send(&app, post_form("/", "name=A&nationalId=0101301234", None)).await;
    let res = send(&app, post_form("/", "name=B&nationalId=010130-1234", None)).await;
    assert_eq!(location(&res), "/");
    assert_eq!(state.db.count_signatures().unwrap(), 1);

    let cookie = session_cookie(&res).unwrap();
    let page = text(send(&app, get("/", Some(&cookie))).await).await;
    assert!(page.contains(signatures::NOT_STORED));
}

#[tokio::test]
async fn longest_name_survives_escaping() {
    let (app, state) = app();
    let name = format!("{}%26", "a".repeat(127));

    let res = send(
        &app,
        post_form("/", &format!("name={name}&nationalId=0101301234"), None),
    )
    .await;
    assert_eq!(location(&res), "/");
    assert_eq!(state.db.count_signatures().unwrap(), 1);

    let row = state.db.list_signatures(1, 0).unwrap().remove(0);
    assert_eq!(row.name, format!("{}&amp;", "a".repeat(127)));
}

#[tokio::test]
async fn store_refusal_names_no_field() {
    let (app, _state) = app();

    send(&app, post_form("/", "name=A&nationalId=0101301234", None)).await;
    let res = send(&app, post_form("/", "name=B&nationalId=0101301234", None)).await;

    let cookie = session_cookie(&res).unwrap();
    let page = text(send(&app, get("/", Some(&cookie))).await).await;
    assert!(page.contains(signatures::NOT_STORED));
    assert!(!signatures::NOT_STORED.contains("ennitala"));
}

#[tokio::test]
async fn numeric_pages_share_the_listing() {
    let (app, state) = app();
    seed(&state, 60);

    let res = send(&app, get("/0", None)).await;
    assert_eq!(res.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&res), "/");

    let first = text(send(&app, get("/", None)).await).await;
    let second = text(send(&app, get("/1", None)).await).await;
    assert!(first.contains("Nafn 59"));
    assert!(!first.contains("Nafn 9<"));
    assert!(second.contains("Nafn 9<"));
    assert!(!second.contains("Nafn 59"));
    assert!(second.contains("Fjöldi undirskrifta: 60"));

    let beyond = send(&app, get("/40", None)).await;
    assert_eq!(beyond.status(), StatusCode::OK);
    assert!(text(beyond).await.contains("Engar undirskriftir."));
}

#[tokio::test]
async fn unknown_routes_are_404() {
    let (app, _state) = app();

    for uri in ["/abc", "/-1", "/1/2", "/admin/x/y"] {
        let res = send(&app, get(uri, None)).await;
        assert_eq!(res.status(), StatusCode::NOT_FOUND, "{uri}");
        assert_eq!(text(res).await, "Sorry can't find that!");
    }

    let res = send(&app, Request::put("/").body(Body::empty()).unwrap()).await;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn admin_requires_login() {
    let (app, state) = app();
    seed(&state, 1);

    let res = send(&app, get("/admin", None)).await;
    assert_eq!(res.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&res), "/");
    assert!(!text(res).await.contains("Nafn 0"));

    let res = send(&app, post_form("/delete/1", "", None)).await;
    assert_eq!(location(&res), "/");
    assert_eq!(state.db.count_signatures().unwrap(), 1);
}

#[tokio::test]
async fn failed_login_shows_generic_message() {
    let (app, _state) = app();

    for body in ["username=admin&password=wrong", "username=nouser&password=anything"] {
        let res = send(&app, post_form("/login", body, None)).await;
        assert_eq!(res.status(), StatusCode::SEE_OTHER);
        assert_eq!(location(&res), "/login");

        let cookie = session_cookie(&res).unwrap();
        let form = text(send(&app, get("/login", Some(&cookie))).await).await;
        assert!(form.contains("Notandanafn eða lykilorð vitlaust."));

        let admin = send(&app, get("/admin", Some(&cookie))).await;
        assert_eq!(location(&admin), "/");
    }
}

#[tokio::test]
async fn admin_can_list_and_delete() {
    let (app, state) = app();
    seed(&state, 2);
    let cookie = login(&app).await;

    let res = send(&app, get("/admin", Some(&cookie))).await;
    assert_eq!(res.status(), StatusCode::OK);
    let page = text(res).await;
    assert!(page.contains("Admin"));
    assert!(page.contains("action=\"/delete/1\""));

    let res = send(&app, get("/login", Some(&cookie))).await;
    assert_eq!(location(&res), "/admin");

    let res = send(&app, post_form("/delete/1", "", Some(&cookie))).await;
    assert_eq!(res.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&res), "/admin");
    assert_eq!(state.db.count_signatures().unwrap(), 1);

    // Already gone: still a redirect, nothing else removed.
    let res = send(&app, post_form("/delete/1", "", Some(&cookie))).await;
    assert_eq!(location(&res), "/admin");
    assert_eq!(state.db.count_signatures().unwrap(), 1);

    for id in ["1%20OR%201=1", "+2", "-2", "%202"] {
        let res = send(&app, post_form(&format!("/delete/{id}"), "", Some(&cookie))).await;
        assert_eq!(res.status(), StatusCode::NOT_FOUND, "{id}");
    }
    assert_eq!(state.db.count_signatures().unwrap(), 1);
}

#[tokio::test]
async fn logout_ends_the_session() {
    let (app, _state) = app();
    let cookie = login(&app).await;

    let res = send(&app, get("/logout", Some(&cookie))).await;
    assert_eq!(res.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&res), "/");

    let res = send(&app, get("/admin", Some(&cookie))).await;
    assert_eq!(location(&res), "/");
}

#[tokio::test]
async fn session_for_deleted_user_is_anonymous() {
    let (app, state) = app();
    let cookie = login(&app).await;

    state
        .db
        .with_conn(|conn| {
            conn.execute("DELETE FROM users", [])?;
            Ok(())
        })
        .unwrap();

    let res = send(&app, get("/admin", Some(&cookie))).await;
    assert_eq!(res.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&res), "/");
}

#[tokio::test]
async fn sign_in_expires_despite_activity() {
    let (app, _state) = app_with_login_ttl(time::Duration::milliseconds(300));
    let cookie = login(&app).await;

    let res = send(&app, get("/admin", Some(&cookie))).await;
    assert_eq!(res.status(), StatusCode::OK);

    tokio::time::sleep(std::time::Duration::from_millis(150)).await;
    let res = send(&app, get("/admin", Some(&cookie))).await;
    assert_eq!(res.status(), StatusCode::OK);

    tokio::time::sleep(std::time::Duration::from_millis(200)).await;
    let res = send(&app, get("/admin", Some(&cookie))).await;
    assert_eq!(res.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&res), "/");
}
