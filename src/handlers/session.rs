use std::collections::HashMap;

use axum::{
    extract::{Path, Query, State},
    response::{IntoResponse, Response},
    routing::get,
    Form, Router,
};
use chrono::Utc;
use serde::Deserialize;

use crate::{
    db::models::AuthUser,
    extractors::{AuthGuard, IsHtmx, Locale},
    names,
    rejections::{AppError, ResultExt},
    services::quiz_session::{Nav, SessionOutcome, Submission},
    utils, views, AppState,
};

use crate::views::session as session_views;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route(
            "/quizzes/{id}/session",
            get(session_page).post(session_post),
        )
        .route("/quizzes/{id}/take", get(take_page).post(take_post))
        .route("/attempts/{id}/result", get(result_page))
}

#[derive(Deserialize)]
struct QuestionQuery {
    q: Option<i64>,
}

#[derive(Deserialize)]
struct AnswerPost {
    #[serde(default)]
    choice: Option<String>,
    #[serde(default)]
    nav: Option<String>,
}

fn session_response(
    outcome: SessionOutcome,
    user: &AuthUser,
    quiz_id: i64,
    is_htmx: bool,
    locale: &str,
) -> Result<Response, AppError> {
    let resp = match outcome {
        SessionOutcome::NotFound => return Err(AppError::NotFound),
        SessionOutcome::NoQuestions => {
            utils::redirect(is_htmx, &names::quiz_list_url(Some(names::NOTICE_NO_QUESTIONS)))
        }
        SessionOutcome::NoAttemptsLeft => utils::redirect(
            is_htmx,
            &names::quiz_list_url(Some(names::NOTICE_NO_ATTEMPTS_LEFT)),
        ),
        SessionOutcome::TimeUp(attempt) => utils::redirect(
            is_htmx,
            &names::result_url_with_notice(attempt.id, names::NOTICE_TIME_UP),
        ),
        SessionOutcome::Finished(attempt) => utils::redirect(
            is_htmx,
            &names::result_url_with_notice(attempt.id, names::NOTICE_SUBMITTED),
        ),
        SessionOutcome::Moved(index) => {
            utils::redirect(is_htmx, &names::quiz_session_question_url(quiz_id, index))
        }
        SessionOutcome::Page(page) => views::render(
            is_htmx,
            &page.quiz.title,
            session_views::question_page(&page, locale),
            locale,
            Some(user),
        )
        .into_response(),
    };

    Ok(resp)
}

async fn session_page(
    AuthGuard(user): AuthGuard,
    IsHtmx(is_htmx): IsHtmx,
    State(state): State<AppState>,
    Locale(locale): Locale,
    Path(quiz_id): Path<i64>,
    Query(query): Query<QuestionQuery>,
) -> Result<Response, AppError> {
    let outcome = state
        .sessions
        .open(user.id, quiz_id, query.q, Utc::now())
        .await
        .reject("could not open quiz session")?;

    session_response(outcome, &user, quiz_id, is_htmx, &locale)
}

async fn session_post(
    AuthGuard(user): AuthGuard,
    IsHtmx(is_htmx): IsHtmx,
    State(state): State<AppState>,
    Locale(locale): Locale,
    Path(quiz_id): Path<i64>,
    Query(query): Query<QuestionQuery>,
    Form(body): Form<AnswerPost>,
) -> Result<Response, AppError> {
    let submission = Submission {
        choice: body.choice.as_deref().and_then(|c| c.trim().parse().ok()),
        nav: Nav::parse(body.nav.as_deref()),
    };

    let outcome = state
        .sessions
        .submit(user.id, quiz_id, query.q, submission, Utc::now())
        .await
        .reject("could not save answer")?;

    session_response(outcome, &user, quiz_id, is_htmx, &locale)
}

async fn take_page(
    AuthGuard(user): AuthGuard,
    IsHtmx(is_htmx): IsHtmx,
    State(state): State<AppState>,
    Locale(locale): Locale,
    Path(quiz_id): Path<i64>,
) -> Result<Response, AppError> {
    let quiz = state
        .db
        .published_quiz(quiz_id)
        .await
        .reject("could not get quiz")?
        .ok_or(AppError::NotFound)?;
    let questions = state
        .db
        .questions_with_choices(quiz.id)
        .await
        .reject("could not get questions")?;

    if questions.is_empty() {
        return Ok(utils::redirect(
            is_htmx,
            &names::quiz_list_url(Some(names::NOTICE_NO_QUESTIONS)),
        ));
    }

    Ok(views::render(
        is_htmx,
        &quiz.title,
        session_views::take_page(&quiz, &questions, &locale),
        &locale,
        Some(&user),
    )
    .into_response())
}

/// `question_{id}=choice_id` pairs from the whole-form page.
fn parse_selections(form: &HashMap<String, String>) -> HashMap<i64, i64> {
    form.iter()
        .filter_map(|(key, value)| {
            let question_id = key.strip_prefix("question_")?.parse().ok()?;
            let choice_id = value.trim().parse().ok()?;
            Some((question_id, choice_id))
        })
        .collect()
}

async fn take_post(
    AuthGuard(user): AuthGuard,
    IsHtmx(is_htmx): IsHtmx,
    State(state): State<AppState>,
    Path(quiz_id): Path<i64>,
    Form(form): Form<HashMap<String, String>>,
) -> Result<Response, AppError> {
    let quiz = state
        .db
        .published_quiz(quiz_id)
        .await
        .reject("could not get quiz")?
        .ok_or(AppError::NotFound)?;
    let questions = state
        .db
        .questions_with_choices(quiz.id)
        .await
        .reject("could not get questions")?;

    if questions.is_empty() {
        return Ok(utils::redirect(
            is_htmx,
            &names::quiz_list_url(Some(names::NOTICE_NO_QUESTIONS)),
        ));
    }

    if quiz.max_attempts > 0 {
        let used = state
            .db
            .completed_attempt_count(user.id, quiz.id)
            .await
            .reject("could not count attempts")?;
        if used >= quiz.max_attempts {
            return Ok(utils::redirect(
                is_htmx,
                &names::quiz_list_url(Some(names::NOTICE_NO_ATTEMPTS_LEFT)),
            ));
        }
    }

    let attempt = state
        .db
        .submit_full_attempt(
            user.id,
            quiz.id,
            &questions,
            &parse_selections(&form),
            Utc::now(),
        )
        .await
        .reject("could not submit quiz")?;

    Ok(utils::redirect(
        is_htmx,
        &names::result_url_with_notice(attempt.id, names::NOTICE_SUBMITTED),
    ))
}

#[derive(Deserialize)]
struct ResultQuery {
    notice: Option<String>,
}

async fn result_page(
    AuthGuard(user): AuthGuard,
    IsHtmx(is_htmx): IsHtmx,
    State(state): State<AppState>,
    Locale(locale): Locale,
    Path(attempt_id): Path<i64>,
    Query(query): Query<ResultQuery>,
) -> Result<Response, AppError> {
    let attempt = state
        .db
        .attempt_for_user(attempt_id, user.id)
        .await
        .reject("could not get attempt")?
        .ok_or(AppError::NotFound)?;

    if !attempt.is_completed {
        return Ok(utils::redirect(
            is_htmx,
            &names::quiz_session_url(attempt.quiz_id),
        ));
    }

    let quiz = state
        .db
        .quiz(attempt.quiz_id)
        .await
        .reject("could not get quiz")?
        .ok_or(AppError::NotFound)?;
    let reviews = state
        .db
        .answer_reviews(attempt.id, quiz.id)
        .await
        .reject("could not get answers")?;

    Ok(views::render(
        is_htmx,
        &quiz.title,
        session_views::result_page(&quiz, &attempt, &reviews, query.notice.as_deref(), &locale),
        &locale,
        Some(&user),
    )
    .into_response())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn selections_ignore_foreign_fields() {
        let form = HashMap::from([
            ("question_3".to_string(), "11".to_string()),
            ("question_4".to_string(), " 12 ".to_string()),
            ("question_x".to_string(), "13".to_string()),
            ("question_5".to_string(), "abc".to_string()),
            ("other".to_string(), "1".to_string()),
        ]);

        let selections = parse_selections(&form);

        assert_eq!(selections, HashMap::from([(3, 11), (4, 12)]));
    }
}
