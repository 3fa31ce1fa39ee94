use axum::{
    extract::{Path, State},
    response::{IntoResponse, Response},
    routing::{get, post},
    Form, Router,
};
use color_eyre::Report;
use maud::Markup;
use rust_i18n::t;
use serde::Deserialize;

use crate::{
    db::{
        is_unique_violation,
        models::{AuthUser, NewQuiz},
        QuizRuleError,
    },
    extractors::{AdminGuard, IsHtmx, Locale},
    models::{Difficulty, QuizStatus},
    names,
    rejections::{AppError, ResultExt},
    services::generation::DraftReviewOutcome,
    utils, views,
    views::admin::{self as admin_views, AdminMessage, CatalogTree},
    AppState,
};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route(names::ADMIN_URL, get(admin_dashboard))
        .route(names::ADMIN_CATEGORIES_URL, post(create_category))
        .route(
            "/admin/categories/{id}/subcategories",
            post(create_subcategory),
        )
        .route(names::ADMIN_QUIZZES_URL, post(create_quiz))
        .route("/admin/quizzes/{id}/status", post(set_quiz_status))
        .route("/admin/drafts/{id}", get(draft_page))
        .route("/admin/drafts/{id}/import", post(import_draft))
        .route("/admin/drafts/{id}/reject", post(reject_draft))
}

/// Business-rule and uniqueness failures become a message on the form;
/// anything else is an internal error.
fn form_error(err: &Report, locale: &str) -> Option<String> {
    if let Some(rule) = err.downcast_ref::<QuizRuleError>() {
        let msg = match rule {
            QuizRuleError::UnknownSubcategory => {
                t!("admin.rule.unknown_subcategory", locale = locale)
            }
            QuizRuleError::SubcategoryMismatch => {
                t!("admin.rule.subcategory_mismatch", locale = locale)
            }
            QuizRuleError::NoQuestions => t!("admin.rule.no_questions", locale = locale),
            QuizRuleError::MissingCorrectChoice(question) => t!(
                "admin.rule.missing_correct_choice",
                locale = locale,
                question = question
            ),
        };
        return Some(msg.to_string());
    }

    if is_unique_violation(err) {
        return Some(t!("admin.duplicate", locale = locale).to_string());
    }

    None
}

async fn render_dashboard(
    state: &AppState,
    user: &AuthUser,
    is_htmx: bool,
    locale: &str,
    message: Option<AdminMessage>,
) -> Result<Markup, AppError> {
    let categories = state
        .db
        .categories()
        .await
        .reject("could not get categories")?;

    let mut tree = Vec::with_capacity(categories.len());
    for category in categories {
        let subcategories = state
            .db
            .subcategories(category.id, None)
            .await
            .reject("could not get subcategories")?;
        tree.push(CatalogTree {
            category,
            subcategories,
        });
    }

    let quizzes = state
        .db
        .all_quizzes()
        .await
        .reject("could not get quizzes")?;
    let drafts = state.db.drafts(false).await.reject("could not get drafts")?;

    Ok(views::render(
        is_htmx,
        "Admin",
        admin_views::dashboard(&tree, &quizzes, &drafts, message.as_ref(), locale),
        locale,
        Some(user),
    ))
}

/// Redirect back to the dashboard on success, re-render it with the error
/// otherwise.
async fn after_post(
    result: color_eyre::Result<i64>,
    state: &AppState,
    user: &AuthUser,
    is_htmx: bool,
    locale: &str,
    context: &'static str,
) -> Result<Response, AppError> {
    match result {
        Ok(_) => Ok(utils::redirect(is_htmx, names::ADMIN_URL)),
        Err(err) => match form_error(&err, locale) {
            Some(msg) => {
                tracing::info!("{context}: {err}");
                Ok(
                    render_dashboard(state, user, is_htmx, locale, Some(AdminMessage::Error(msg)))
                        .await?
                        .into_response(),
                )
            }
            None => Err::<Response, _>(err).reject(context),
        },
    }
}

async fn admin_dashboard(
    AdminGuard(user): AdminGuard,
    IsHtmx(is_htmx): IsHtmx,
    State(state): State<AppState>,
    Locale(locale): Locale,
) -> Result<Markup, AppError> {
    render_dashboard(&state, &user, is_htmx, &locale, None).await
}

#[derive(Deserialize)]
struct CatalogPost {
    #[serde(default)]
    name: String,
    #[serde(default)]
    slug: String,
    #[serde(default)]
    description: String,
    #[serde(default)]
    icon: String,
}

async fn create_category(
    AdminGuard(user): AdminGuard,
    IsHtmx(is_htmx): IsHtmx,
    State(state): State<AppState>,
    Locale(locale): Locale,
    Form(body): Form<CatalogPost>,
) -> Result<Response, AppError> {
    if body.name.trim().is_empty() {
        let msg = t!("admin.name_required", locale = locale).to_string();
        return Ok(
            render_dashboard(&state, &user, is_htmx, &locale, Some(AdminMessage::Error(msg)))
                .await?
                .into_response(),
        );
    }

    let result = state
        .db
        .create_category(&body.name, &body.slug, &body.description, &body.icon)
        .await;
    after_post(result, &state, &user, is_htmx, &locale, "could not create category").await
}

async fn create_subcategory(
    AdminGuard(user): AdminGuard,
    IsHtmx(is_htmx): IsHtmx,
    State(state): State<AppState>,
    Locale(locale): Locale,
    Path(category_id): Path<i64>,
    Form(body): Form<CatalogPost>,
) -> Result<Response, AppError> {
    state
        .db
        .category(category_id)
        .await
        .reject("could not get category")?
        .ok_or(AppError::NotFound)?;

    if body.name.trim().is_empty() {
        let msg = t!("admin.name_required", locale = locale).to_string();
        return Ok(
            render_dashboard(&state, &user, is_htmx, &locale, Some(AdminMessage::Error(msg)))
                .await?
                .into_response(),
        );
    }

    let result = state
        .db
        .create_subcategory(
            category_id,
            &body.name,
            &body.slug,
            &body.description,
            &body.icon,
        )
        .await;
    after_post(result, &state, &user, is_htmx, &locale, "could not create subcategory").await
}

#[derive(Deserialize)]
struct QuizPost {
    #[serde(default)]
    title: String,
    #[serde(default)]
    description: String,
    #[serde(default)]
    subcategory: String,
    #[serde(default)]
    difficulty: String,
    #[serde(default)]
    time_limit: String,
    #[serde(default)]
    passing_score: String,
    #[serde(default)]
    max_attempts: String,
}

impl QuizPost {
    fn into_new_quiz(self) -> Option<NewQuiz> {
        let title = self.title.trim();
        if title.is_empty() {
            return None;
        }

        let defaults = NewQuiz::new(title, Difficulty::Medium);
        let number = |value: &str, default: i64| value.trim().parse::<i64>().unwrap_or(default);

        Some(NewQuiz {
            description: self.description.trim().to_string(),
            subcategory_id: self.subcategory.trim().parse().ok(),
            difficulty: self.difficulty.parse().unwrap_or(defaults.difficulty),
            time_limit: number(&self.time_limit, defaults.time_limit).max(1),
            passing_score: number(&self.passing_score, defaults.passing_score).clamp(0, 100),
            max_attempts: number(&self.max_attempts, defaults.max_attempts).max(0),
            ..defaults
        })
    }
}

async fn create_quiz(
    AdminGuard(user): AdminGuard,
    IsHtmx(is_htmx): IsHtmx,
    State(state): State<AppState>,
    Locale(locale): Locale,
    Form(body): Form<QuizPost>,
) -> Result<Response, AppError> {
    let Some(quiz) = body.into_new_quiz() else {
        let msg = t!("admin.title_required", locale = locale).to_string();
        return Ok(
            render_dashboard(&state, &user, is_htmx, &locale, Some(AdminMessage::Error(msg)))
                .await?
                .into_response(),
        );
    };

    let result = state.db.create_quiz(&quiz).await;
    after_post(result, &state, &user, is_htmx, &locale, "could not create quiz").await
}

#[derive(Deserialize)]
struct StatusPost {
    status: String,
    #[serde(default)]
    is_published: Option<String>,
}

async fn set_quiz_status(
    AdminGuard(user): AdminGuard,
    IsHtmx(is_htmx): IsHtmx,
    State(state): State<AppState>,
    Locale(locale): Locale,
    Path(quiz_id): Path<i64>,
    Form(body): Form<StatusPost>,
) -> Result<Response, AppError> {
    let status = body
        .status
        .parse::<QuizStatus>()
        .reject_input("unknown quiz status")?;
    let is_published = body.is_published.is_some();

    state
        .db
        .quiz(quiz_id)
        .await
        .reject("could not get quiz")?
        .ok_or(AppError::NotFound)?;

    let result = state
        .db
        .set_quiz_status(quiz_id, status, is_published)
        .await
        .map(|()| quiz_id);
    after_post(result, &state, &user, is_htmx, &locale, "could not update quiz").await
}

async fn render_draft(
    state: &AppState,
    user: &AuthUser,
    draft_id: i64,
    is_htmx: bool,
    locale: &str,
    message: Option<AdminMessage>,
) -> Result<Markup, AppError> {
    let draft = state
        .db
        .draft(draft_id)
        .await
        .reject("could not get draft")?
        .ok_or(AppError::NotFound)?;

    Ok(views::render(
        is_htmx,
        "Draft",
        admin_views::draft(&draft, message.as_ref(), locale),
        locale,
        Some(user),
    ))
}

async fn draft_page(
    AdminGuard(user): AdminGuard,
    IsHtmx(is_htmx): IsHtmx,
    State(state): State<AppState>,
    Locale(locale): Locale,
    Path(draft_id): Path<i64>,
) -> Result<Markup, AppError> {
    render_draft(&state, &user, draft_id, is_htmx, &locale, None).await
}

async fn review_response(
    outcome: DraftReviewOutcome,
    state: &AppState,
    user: &AuthUser,
    draft_id: i64,
    is_htmx: bool,
    locale: &str,
) -> Result<Response, AppError> {
    let message = match outcome {
        DraftReviewOutcome::NotFound => return Err(AppError::NotFound),
        DraftReviewOutcome::Imported { quiz_id, questions } => {
            tracing::info!("draft {draft_id} imported {questions} questions into quiz {quiz_id}");
            return Ok(utils::redirect(is_htmx, &names::admin_draft_url(draft_id)));
        }
        DraftReviewOutcome::Rejected => {
            return Ok(utils::redirect(is_htmx, &names::admin_draft_url(draft_id)));
        }
        DraftReviewOutcome::NothingImportable => t!("admin.nothing_importable", locale = locale),
        DraftReviewOutcome::AlreadyReviewed => t!("admin.already_reviewed", locale = locale),
    };

    Ok(render_draft(
        state,
        user,
        draft_id,
        is_htmx,
        locale,
        Some(AdminMessage::Error(message.to_string())),
    )
    .await?
    .into_response())
}

async fn import_draft(
    AdminGuard(user): AdminGuard,
    IsHtmx(is_htmx): IsHtmx,
    State(state): State<AppState>,
    Locale(locale): Locale,
    Path(draft_id): Path<i64>,
) -> Result<Response, AppError> {
    let outcome = state
        .generation
        .import_draft(draft_id)
        .await
        .reject("could not import draft")?;

    review_response(outcome, &state, &user, draft_id, is_htmx, &locale).await
}

async fn reject_draft(
    AdminGuard(user): AdminGuard,
    IsHtmx(is_htmx): IsHtmx,
    State(state): State<AppState>,
    Locale(locale): Locale,
    Path(draft_id): Path<i64>,
) -> Result<Response, AppError> {
    let outcome = state
        .generation
        .reject_draft(draft_id)
        .await
        .reject("could not reject draft")?;

    review_response(outcome, &state, &user, draft_id, is_htmx, &locale).await
}

#[cfg(test)]
mod tests {
    use super::*;

    fn post(title: &str) -> QuizPost {
        QuizPost {
            title: title.to_string(),
            description: String::new(),
            subcategory: String::new(),
            difficulty: String::new(),
            time_limit: String::new(),
            passing_score: String::new(),
            max_attempts: String::new(),
        }
    }

    #[test]
    fn quiz_form_requires_a_title() {
        assert!(post("   ").into_new_quiz().is_none());
    }

    #[test]
    fn quiz_form_falls_back_to_defaults() {
        let quiz = post(" Ownership ").into_new_quiz();

        let quiz = quiz.as_ref();
        assert_eq!(quiz.map(|q| q.title.as_str()), Some("Ownership"));
        assert_eq!(quiz.and_then(|q| q.subcategory_id), None);
        assert_eq!(quiz.map(|q| q.difficulty), Some(Difficulty::Medium));
        assert_eq!(quiz.map(|q| q.time_limit), Some(30));
        assert_eq!(quiz.map(|q| q.passing_score), Some(60));
        assert_eq!(quiz.map(|q| q.max_attempts), Some(3));
    }

    #[test]
    fn quiz_form_clamps_numbers() {
        let mut body = post("Lifetimes");
        body.subcategory = "7".to_string();
        body.difficulty = "hard".to_string();
        body.time_limit = "0".to_string();
        body.passing_score = "150".to_string();
        body.max_attempts = "-2".to_string();

        let quiz = body.into_new_quiz();

        let quiz = quiz.as_ref();
        assert_eq!(quiz.and_then(|q| q.subcategory_id), Some(7));
        assert_eq!(quiz.map(|q| q.difficulty), Some(Difficulty::Hard));
        assert_eq!(quiz.map(|q| q.time_limit), Some(1));
        assert_eq!(quiz.map(|q| q.passing_score), Some(100));
        assert_eq!(quiz.map(|q| q.max_attempts), Some(0));
    }

    #[test]
    fn rule_errors_become_form_messages() {
        let err: Report = QuizRuleError::NoQuestions.into();

        assert!(form_error(&err, "en").is_some());
    }

    #[test]
    fn other_errors_are_not_form_messages() {
        let err = color_eyre::eyre::eyre!("disk on fire");

        assert!(form_error(&err, "en").is_none());
    }
}
