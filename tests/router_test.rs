mod common;

use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
};
use http_body_util::BodyExt;
use intelliquiz::{names, router, AppState};
use tower::ServiceExt;

async fn app_with_db() -> (axum::Router, intelliquiz::db::Db) {
    let db = common::create_test_db().await;
    let app = router(AppState::new(db.clone(), common::ai_without_providers(), false));
    (app, db)
}

async fn session_cookie(db: &intelliquiz::db::Db, user_id: i64) -> String {
    let session = db
        .create_user_session(user_id)
        .await
        .expect("create user session");
    format!("{}={}", names::USER_SESSION_COOKIE_NAME, session)
}

async fn body_text(resp: axum::response::Response) -> String {
    let bytes = resp
        .into_body()
        .collect()
        .await
        .expect("read body")
        .to_bytes();
    String::from_utf8_lossy(&bytes).to_string()
}

#[tokio::test]
async fn protected_routes_reject_anonymous_requests() {
    let (app, _) = app_with_db().await;

    let cases = [
        "/categories/languages",
        "/categories/languages/generate-ai",
        "/quizzes/1/session",
        "/quizzes/1/take",
        "/attempts/1/result",
        "/answers/1/explanation",
        names::HISTORY_URL,
        names::STATS_URL,
        names::LEADERBOARD_URL,
        names::ADMIN_URL,
    ];

    for uri in cases {
        let req = Request::builder()
            .method(Method::GET)
            .uri(uri)
            .body(Body::empty())
            .expect("request build should succeed");
        let resp = app.clone().oneshot(req).await.expect("router should respond");

        assert_eq!(
            resp.status(),
            StatusCode::UNAUTHORIZED,
            "expected UNAUTHORIZED for {uri}",
        );
    }
}

#[tokio::test]
async fn public_pages_render_without_login() {
    let (app, _) = app_with_db().await;

    for uri in ["/", names::LOGIN_URL, "/static/index.css"] {
        let req = Request::builder()
            .uri(uri)
            .body(Body::empty())
            .expect("request build should succeed");
        let resp = app.clone().oneshot(req).await.expect("router should respond");

        assert_eq!(resp.status(), StatusCode::OK, "expected OK for {uri}");
    }
}

#[tokio::test]
async fn state_changing_requests_need_hx_request() {
    let (app, _) = app_with_db().await;

    let req = Request::builder()
        .method(Method::POST)
        .uri(names::LOGIN_URL)
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
        .body(Body::from("username=a&password=b"))
        .expect("request build should succeed");
    let resp = app.oneshot(req).await.expect("router should respond");

    assert_eq!(resp.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn login_sets_session_cookie_and_redirects() {
    let (app, db) = app_with_db().await;
    common::create_user(&db, "alice").await;

    let req = Request::builder()
        .method(Method::POST)
        .uri(names::LOGIN_URL)
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
        .header("HX-Request", "true")
        .body(Body::from("username=alice&password=password"))
        .expect("request build should succeed");
    let resp = app.oneshot(req).await.expect("router should respond");

    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(
        resp.headers().get("HX-Redirect").and_then(|v| v.to_str().ok()),
        Some("/")
    );
    let cookie = resp
        .headers()
        .get(header::SET_COOKIE)
        .and_then(|v| v.to_str().ok())
        .expect("session cookie");
    assert!(cookie.starts_with(&format!("{}=", names::USER_SESSION_COOKIE_NAME)));
    assert!(cookie.contains("HttpOnly"));
}

#[tokio::test]
async fn failed_login_rerenders_form() {
    let (app, db) = app_with_db().await;
    common::create_user(&db, "alice").await;

    let req = Request::builder()
        .method(Method::POST)
        .uri(names::LOGIN_URL)
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
        .header("HX-Request", "true")
        .body(Body::from("username=alice&password=nope"))
        .expect("request build should succeed");
    let resp = app.oneshot(req).await.expect("router should respond");

    assert_eq!(resp.status(), StatusCode::OK);
    assert!(resp.headers().get(header::SET_COOKIE).is_none());
    let body = body_text(resp).await;
    assert!(body.contains("aria-invalid"));
    assert!(body.contains(r#"<option value="hard">Hard</option>"#));
}

#[tokio::test]
async fn admin_routes_forbid_regular_users() {
    let (app, db) = app_with_db().await;
    let user_id = common::create_user(&db, "bob").await;
    let cookie = session_cookie(&db, user_id).await;

    let req = Request::builder()
        .uri(names::ADMIN_URL)
        .header(header::COOKIE, cookie)
        .body(Body::empty())
        .expect("request build should succeed");
    let resp = app.oneshot(req).await.expect("router should respond");

    assert_eq!(resp.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn admin_dashboard_renders_for_admins() {
    let (app, db) = app_with_db().await;
    let admin_id = common::create_admin(&db, "root").await;
    let cookie = session_cookie(&db, admin_id).await;
    common::create_catalog(&db, "Languages", "Rust").await;

    let req = Request::builder()
        .uri(names::ADMIN_URL)
        .header(header::COOKIE, cookie)
        .body(Body::empty())
        .expect("request build should succeed");
    let resp = app.oneshot(req).await.expect("router should respond");

    assert_eq!(resp.status(), StatusCode::OK);
    assert!(body_text(resp).await.contains("Languages"));
}

#[tokio::test]
async fn results_are_private_to_their_owner() {
    let (app, db) = app_with_db().await;
    let owner = common::create_user(&db, "owner").await;
    let intruder = common::create_user(&db, "intruder").await;
    let quiz_id = common::create_published_quiz(&db, "Private", 2).await;
    let questions = db.questions_with_choices(quiz_id).await.expect("questions");
    let attempt = db
        .submit_full_attempt(
            owner,
            quiz_id,
            &questions,
            &Default::default(),
            chrono::Utc::now(),
        )
        .await
        .expect("submit");

    let uri = names::result_url(attempt.id);

    let req = Request::builder()
        .uri(&uri)
        .header(header::COOKIE, session_cookie(&db, intruder).await)
        .body(Body::empty())
        .expect("request build should succeed");
    let resp = app.clone().oneshot(req).await.expect("router should respond");
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);

    let req = Request::builder()
        .uri(&uri)
        .header(header::COOKIE, session_cookie(&db, owner).await)
        .body(Body::empty())
        .expect("request build should succeed");
    let resp = app.oneshot(req).await.expect("router should respond");
    assert_eq!(resp.status(), StatusCode::OK);
}

#[tokio::test]
async fn session_route_redirects_to_current_question() {
    let (app, db) = app_with_db().await;
    let user_id = common::create_user(&db, "carol").await;
    let quiz_id = common::create_published_quiz(&db, "Redirects", 3).await;
    let questions = db.questions_with_choices(quiz_id).await.expect("questions");
    let cookie = session_cookie(&db, user_id).await;

    // opening creates the attempt
    let req = Request::builder()
        .uri(names::quiz_session_url(quiz_id))
        .header(header::COOKIE, &cookie)
        .body(Body::empty())
        .expect("request build should succeed");
    let resp = app.clone().oneshot(req).await.expect("router should respond");
    assert_eq!(resp.status(), StatusCode::OK);

    let choice = questions[0].correct_choice().expect("correct choice").id;
    let req = Request::builder()
        .method(Method::POST)
        .uri(names::quiz_session_question_url(quiz_id, 0))
        .header(header::COOKIE, &cookie)
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
        .header("HX-Request", "true")
        .body(Body::from(format!("choice={choice}&nav=next")))
        .expect("request build should succeed");
    let resp = app.oneshot(req).await.expect("router should respond");

    assert_eq!(
        resp.headers().get("HX-Redirect").and_then(|v| v.to_str().ok()),
        Some(names::quiz_session_question_url(quiz_id, 1).as_str())
    );
}

#[tokio::test]
async fn start_without_selection_shows_errors() {
    let (app, db) = app_with_db().await;
    let user_id = common::create_user(&db, "dave").await;
    common::create_catalog(&db, "Languages", "Rust").await;

    let req = Request::builder()
        .method(Method::POST)
        .uri(names::start_quiz_url("languages"))
        .header(header::COOKIE, session_cookie(&db, user_id).await)
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
        .header("HX-Request", "true")
        .body(Body::from("difficulty=&num_questions=7"))
        .expect("request build should succeed");
    let resp = app.oneshot(req).await.expect("router should respond");

    assert_eq!(resp.status(), StatusCode::OK);
    assert!(resp.headers().get(header::SET_COOKIE).is_none());
    let body = body_text(resp).await;
    assert!(body.contains("aria-invalid"));
    assert!(body.contains(r#"<option value="hard">Hard</option>"#));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn pending_selection_generates_only_once() {
    let (app, db) = app_with_db().await;
    let user_id = common::create_user(&db, "erin").await;
    let (_, sub) = common::create_catalog(&db, "Languages", "Rust").await;
    let token = db
        .create_pending_request(
            user_id,
            "languages",
            sub,
            intelliquiz::models::Difficulty::Easy,
            5,
            chrono::Utc::now(),
        )
        .await
        .expect("pending request");
    let cookie = format!(
        "{}; {}={}",
        session_cookie(&db, user_id).await,
        names::PENDING_REQUEST_COOKIE_NAME,
        token
    );

    let post = || {
        Request::builder()
            .method(Method::POST)
            .uri(names::generate_ai_url("languages"))
            .header(header::COOKIE, &cookie)
            .header("HX-Request", "true")
            .body(Body::empty())
            .expect("request build should succeed")
    };
    let (first, second) = tokio::join!(app.clone().oneshot(post()), app.oneshot(post()));

    let mut targets: Vec<String> = [first, second]
        .into_iter()
        .map(|resp| {
            let resp = resp.expect("router should respond");
            assert_eq!(resp.status(), StatusCode::OK);
            resp.headers()
                .get("HX-Redirect")
                .and_then(|v| v.to_str().ok())
                .expect("redirect")
                .to_string()
        })
        .collect();
    targets.sort();

    assert_eq!(
        targets,
        vec![
            names::quiz_list_url(Some(names::NOTICE_AI_FAILED)),
            names::quiz_list_url(Some(names::NOTICE_NO_PENDING)),
        ]
    );
    assert_eq!(db.drafts(false).await.expect("drafts").len(), 1);
}
