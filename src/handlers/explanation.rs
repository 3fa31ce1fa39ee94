use axum::{
    extract::{Path, State},
    routing::get,
    Form, Router,
};
use maud::Markup;
use serde::Deserialize;

use crate::{
    extractors::{AuthGuard, Locale},
    rejections::{AppError, ResultExt},
    services::generation::ExplanationOutcome,
    AppState,
};

use crate::views::explanation as explanation_views;

pub fn routes() -> Router<AppState> {
    Router::new().route(
        "/answers/{id}/explanation",
        get(explanation).post(feedback),
    )
}

async fn explanation(
    AuthGuard(user): AuthGuard,
    State(state): State<AppState>,
    Locale(locale): Locale,
    Path(answer_id): Path<i64>,
) -> Result<Markup, AppError> {
    let outcome = state
        .generation
        .explanation_for_answer(answer_id, user.id)
        .await
        .reject("could not get explanation")?;

    match outcome {
        ExplanationOutcome::Ready(explanation) => Ok(explanation_views::explanation(
            answer_id,
            &explanation,
            &locale,
        )),
        ExplanationOutcome::NotFound => Err(AppError::NotFound),
        ExplanationOutcome::Unavailable(_) => Ok(explanation_views::unavailable(&locale)),
    }
}

#[derive(Deserialize)]
struct FeedbackPost {
    action: String,
}

async fn feedback(
    AuthGuard(user): AuthGuard,
    State(state): State<AppState>,
    Locale(locale): Locale,
    Path(answer_id): Path<i64>,
    Form(body): Form<FeedbackPost>,
) -> Result<Markup, AppError> {
    let helpful = match body.action.as_str() {
        "helpful" => true,
        "not_helpful" => false,
        _ => return Err(AppError::Input("unknown feedback action")),
    };

    let explanation = state
        .generation
        .rate_explanation(answer_id, user.id, helpful)
        .await
        .reject("could not record feedback")?
        .ok_or(AppError::NotFound)?;

    Ok(explanation_views::explanation(answer_id, &explanation, &locale))
}
