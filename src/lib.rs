rust_i18n::i18n!("locales", fallback = "en");

pub mod ai;
pub mod db;
pub mod extractors;
pub mod handlers;
pub mod models;
pub mod names;
pub mod rejections;
pub mod services;
pub mod statics;
pub mod utils;
pub mod views;

use std::sync::Arc;

use axum::{middleware, Router};

use services::{
    auth::AuthService, generation::GenerationService, quiz_session::QuizSessionService,
};

#[derive(Clone)]
pub struct AppState {
    pub db: db::Db,
    pub auth: AuthService,
    pub sessions: QuizSessionService,
    pub generation: GenerationService,
    pub secure_cookies: bool,
}

impl AppState {
    pub fn new(db: db::Db, ai: Arc<ai::AiService>, secure_cookies: bool) -> Self {
        Self {
            auth: AuthService::new(db.clone()),
            sessions: QuizSessionService::new(db.clone()),
            generation: GenerationService::new(db.clone(), ai),
            db,
            secure_cookies,
        }
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .merge(handlers::account::routes())
        .merge(handlers::catalog::routes())
        .merge(handlers::session::routes())
        .merge(handlers::explanation::routes())
        .merge(handlers::dashboard::routes())
        .merge(handlers::admin::routes())
        .layer(middleware::from_fn(csrf_check))
        .nest("/static", statics::routes())
        .with_state(state)
}

async fn csrf_check(
    req: axum::http::Request<axum::body::Body>,
    next: middleware::Next,
) -> axum::response::Response {
    use axum::http::{Method, StatusCode};
    use axum::response::IntoResponse;

    let state_changing = [Method::POST, Method::PUT, Method::PATCH, Method::DELETE];

    if state_changing.contains(req.method()) {
        let has_hx_request = req
            .headers()
            .get("HX-Request")
            .and_then(|v| v.to_str().ok())
            .is_some_and(|v| v == "true");

        if !has_hx_request {
            tracing::warn!("rejected {} {} without HX-Request", req.method(), req.uri().path());
            return (StatusCode::FORBIDDEN, "CSRF check failed").into_response();
        }
    }

    next.run(req).await
}
