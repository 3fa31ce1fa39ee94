use axum::{
    extract::{Path, Query, State},
    http::header::SET_COOKIE,
    response::{IntoResponse, Response},
    routing::{get, post},
    Form, Router,
};
use axum_extra::extract::CookieJar;
use chrono::Utc;
use serde::Deserialize;

use crate::{
    db::models::{AuthUser, Category, PendingQuizRequest, Subcategory},
    extractors::{AuthGuard, IsHtmx, Locale, MaybeUser},
    models::Difficulty,
    names,
    rejections::{AppError, ResultExt},
    services::generation::{GenerationOutcome, Selection},
    utils, views, AppState,
};

use crate::views::catalog::{self as catalog_views, SelectionErrors, SelectionForm};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(quiz_list))
        .route("/categories/{slug}", get(subcategory_page))
        .route("/categories/{slug}/start", post(start_post))
        .route(
            "/categories/{slug}/generate-ai",
            get(generate_page).post(generate_post),
        )
}

#[derive(Deserialize)]
struct ListQuery {
    category: Option<i64>,
    notice: Option<String>,
}

async fn quiz_list(
    MaybeUser(user): MaybeUser,
    IsHtmx(is_htmx): IsHtmx,
    State(state): State<AppState>,
    Locale(locale): Locale,
    Query(query): Query<ListQuery>,
) -> Result<Response, AppError> {
    let quizzes = state
        .db
        .published_quizzes(query.category)
        .await
        .reject("could not get quizzes")?;
    let categories = state
        .db
        .categories()
        .await
        .reject("could not get categories")?;

    Ok(views::render(
        is_htmx,
        "Quizzes",
        catalog_views::quiz_list(
            &quizzes,
            &categories,
            query.category,
            query.notice.as_deref(),
            &locale,
        ),
        &locale,
        user.as_ref(),
    )
    .into_response())
}

async fn category_or_404(state: &AppState, slug: &str) -> Result<Category, AppError> {
    state
        .db
        .category_by_slug(slug)
        .await
        .reject("could not get category")?
        .ok_or(AppError::NotFound)
}

#[derive(Deserialize)]
struct FilterQuery {
    #[serde(default)]
    q: String,
}

#[allow(clippy::too_many_arguments)]
async fn render_selection(
    state: &AppState,
    user: &AuthUser,
    is_htmx: bool,
    locale: &str,
    category: &Category,
    filter: &str,
    form: &SelectionForm,
    errors: &SelectionErrors,
) -> Result<Response, AppError> {
    let subcategories = state
        .db
        .subcategories(category.id, Some(filter))
        .await
        .reject("could not get subcategories")?;

    Ok(views::render(
        is_htmx,
        &category.name,
        catalog_views::subcategory_select(category, &subcategories, filter, form, errors, locale),
        locale,
        Some(user),
    )
    .into_response())
}

async fn subcategory_page(
    AuthGuard(user): AuthGuard,
    IsHtmx(is_htmx): IsHtmx,
    State(state): State<AppState>,
    Locale(locale): Locale,
    Path(slug): Path<String>,
    Query(query): Query<FilterQuery>,
) -> Result<Response, AppError> {
    let category = category_or_404(&state, &slug).await?;
    let form = SelectionForm {
        num_questions: names::DEFAULT_QUESTION_COUNT,
        ..SelectionForm::default()
    };

    render_selection(
        &state,
        &user,
        is_htmx,
        &locale,
        &category,
        &query.q,
        &form,
        &SelectionErrors::default(),
    )
    .await
}

/// Raw form values; parsed by hand so bad input re-renders the form instead
/// of failing extraction.
#[derive(Deserialize)]
struct StartPost {
    #[serde(default)]
    subcategory: String,
    #[serde(default)]
    difficulty: String,
    #[serde(default)]
    num_questions: String,
}

async fn start_post(
    AuthGuard(user): AuthGuard,
    IsHtmx(is_htmx): IsHtmx,
    State(state): State<AppState>,
    Locale(locale): Locale,
    Path(slug): Path<String>,
    Form(body): Form<StartPost>,
) -> Result<Response, AppError> {
    let category = category_or_404(&state, &slug).await?;

    let subcategory = match body.subcategory.trim().parse::<i64>() {
        Ok(id) => state
            .db
            .subcategory_in_category(id, category.id)
            .await
            .reject("could not get subcategory")?,
        Err(_) => None,
    };
    let difficulty = body.difficulty.parse::<Difficulty>().ok();
    let num_questions = body
        .num_questions
        .trim()
        .parse::<i64>()
        .ok()
        .filter(|n| names::QUESTION_COUNT_OPTIONS.contains(n));

    let (Some(subcategory), Some(difficulty), Some(num_questions)) =
        (&subcategory, difficulty, num_questions)
    else {
        let errors = SelectionErrors {
            subcategory: subcategory.is_none(),
            difficulty: difficulty.is_none(),
            num_questions: num_questions.is_none(),
        };
        let form = SelectionForm {
            subcategory_id: subcategory.as_ref().map(|s| s.id),
            difficulty,
            num_questions: num_questions.unwrap_or(names::DEFAULT_QUESTION_COUNT),
        };
        tracing::debug!("invalid quiz selection for category {}", category.slug);
        return render_selection(&state, &user, is_htmx, &locale, &category, "", &form, &errors)
            .await;
    };

    let token = state
        .db
        .create_pending_request(
            user.id,
            &category.slug,
            subcategory.id,
            difficulty,
            num_questions,
            Utc::now(),
        )
        .await
        .reject("could not store quiz selection")?;

    let mut resp = utils::redirect(is_htmx, &names::generate_ai_url(&category.slug));
    resp.headers_mut().insert(
        SET_COOKIE,
        utils::cookie(names::PENDING_REQUEST_COOKIE_NAME, &token, state.secure_cookies)
            .reject("could not create cookie")?,
    );
    Ok(resp)
}

struct Pending {
    request: PendingQuizRequest,
    category: Category,
    subcategory: Subcategory,
    difficulty: Difficulty,
}

/// The caller's unexpired selection for this category, with its rows resolved.
async fn load_pending(
    state: &AppState,
    user: &AuthUser,
    jar: &CookieJar,
    slug: &str,
) -> Result<Option<Pending>, AppError> {
    let Some(token) = jar.get(names::PENDING_REQUEST_COOKIE_NAME) else {
        return Ok(None);
    };
    let Some(request) = state
        .db
        .pending_request(token.value(), user.id, Utc::now())
        .await
        .reject("could not get quiz selection")?
    else {
        return Ok(None);
    };
    if request.category_slug != slug {
        return Ok(None);
    }

    let category = category_or_404(state, slug).await?;
    let Some(subcategory) = state
        .db
        .subcategory_in_category(request.subcategory_id, category.id)
        .await
        .reject("could not get subcategory")?
    else {
        return Ok(None);
    };
    let Ok(difficulty) = request.difficulty.parse::<Difficulty>() else {
        return Ok(None);
    };

    Ok(Some(Pending {
        request,
        category,
        subcategory,
        difficulty,
    }))
}

async fn generate_page(
    AuthGuard(user): AuthGuard,
    IsHtmx(is_htmx): IsHtmx,
    State(state): State<AppState>,
    Locale(locale): Locale,
    Path(slug): Path<String>,
    jar: CookieJar,
) -> Result<Response, AppError> {
    let Some(pending) = load_pending(&state, &user, &jar, &slug).await? else {
        return Ok(utils::redirect(
            is_htmx,
            &names::quiz_list_url(Some(names::NOTICE_NO_PENDING)),
        ));
    };

    Ok(views::render(
        is_htmx,
        "Generating",
        catalog_views::generate_confirm(
            &pending.category,
            &pending.subcategory,
            pending.difficulty,
            pending.request.num_questions,
            &locale,
        ),
        &locale,
        Some(&user),
    )
    .into_response())
}

async fn generate_post(
    AuthGuard(user): AuthGuard,
    IsHtmx(is_htmx): IsHtmx,
    State(state): State<AppState>,
    Path(slug): Path<String>,
    jar: CookieJar,
) -> Result<Response, AppError> {
    let Some(pending) = load_pending(&state, &user, &jar, &slug).await? else {
        return Ok(utils::redirect(
            is_htmx,
            &names::quiz_list_url(Some(names::NOTICE_NO_PENDING)),
        ));
    };

    // claimed before the provider call so a repeated post cannot generate twice
    let claimed = state
        .db
        .consume_pending_request(&pending.request.token, user.id)
        .await
        .reject("could not clear quiz selection")?;
    if !claimed {
        tracing::info!("quiz selection for user {} was already used", user.id);
        return Ok(utils::redirect(
            is_htmx,
            &names::quiz_list_url(Some(names::NOTICE_NO_PENDING)),
        ));
    }

    let selection = Selection {
        category: &pending.category,
        subcategory: &pending.subcategory,
        difficulty: pending.difficulty,
        num_questions: pending.request.num_questions,
    };
    let outcome = state
        .generation
        .generate(user.id, &selection)
        .await
        .reject("could not generate quiz")?;

    let url = match outcome {
        GenerationOutcome::QuizReady(quiz_id) => names::quiz_session_url(quiz_id),
        GenerationOutcome::DraftSaved(_) => {
            names::quiz_list_url(Some(names::NOTICE_AI_DRAFT_SAVED))
        }
        GenerationOutcome::Failed(_) => names::quiz_list_url(Some(names::NOTICE_AI_FAILED)),
    };

    let mut resp = utils::redirect(is_htmx, &url);
    resp.headers_mut().insert(
        SET_COOKIE,
        utils::expired_cookie(names::PENDING_REQUEST_COOKIE_NAME)
            .reject("could not expire cookie")?,
    );
    Ok(resp)
}
