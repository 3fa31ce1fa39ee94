use axum::{
    extract::State,
    http::{header::SET_COOKIE, HeaderMap, HeaderValue},
    response::{IntoResponse, Response},
    routing::{get, post},
    Form, Router,
};
use axum_extra::extract::CookieJar;
use serde::Deserialize;

use crate::{
    extractors::{match_supported_locale, IsHtmx, Locale, MaybeUser},
    names,
    rejections::{AppError, ResultExt},
    services::auth::LoginOutcome,
    utils, views, AppState,
};

use crate::views::account as account_views;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route(names::LOGIN_URL, get(login_page).post(login_post))
        .route(names::LOGOUT_URL, post(logout))
        .route(names::SET_LOCALE_URL, post(set_locale))
}

async fn login_page(
    MaybeUser(user): MaybeUser,
    IsHtmx(is_htmx): IsHtmx,
    Locale(locale): Locale,
) -> Response {
    if user.is_some() {
        return utils::redirect(is_htmx, "/");
    }

    views::render(
        is_htmx,
        "Login",
        account_views::login(account_views::LoginState::NoError, &locale),
        &locale,
        None,
    )
    .into_response()
}

#[derive(Deserialize)]
struct LoginPost {
    #[serde(default)]
    username: String,
    #[serde(default)]
    password: String,
}

async fn login_post(
    State(state): State<AppState>,
    IsHtmx(is_htmx): IsHtmx,
    Locale(locale): Locale,
    Form(body): Form<LoginPost>,
) -> Result<Response, AppError> {
    let outcome = state
        .auth
        .login(&body.username, &body.password)
        .await
        .reject("could not log in")?;

    let login_state = match outcome {
        LoginOutcome::Success(session) => {
            let mut resp = utils::redirect(is_htmx, &names::quiz_list_url(None));
            resp.headers_mut().insert(
                SET_COOKIE,
                utils::cookie(names::USER_SESSION_COOKIE_NAME, &session, state.secure_cookies)
                    .reject("could not create cookie")?,
            );
            return Ok(resp);
        }
        LoginOutcome::EmptyFields => account_views::LoginState::EmptyFields,
        LoginOutcome::InvalidCredentials => account_views::LoginState::InvalidCredentials,
    };

    Ok(views::render(
        is_htmx,
        "Login",
        account_views::login(login_state, &locale),
        &locale,
        None,
    )
    .into_response())
}

async fn logout(
    State(state): State<AppState>,
    jar: CookieJar,
) -> Result<Response, AppError> {
    if let Some(session) = jar.get(names::USER_SESSION_COOKIE_NAME) {
        state
            .auth
            .logout(session.value())
            .await
            .reject("could not log out")?;
    }

    let mut resp = utils::redirect(true, names::LOGIN_URL);
    resp.headers_mut().insert(
        SET_COOKIE,
        utils::expired_cookie(names::USER_SESSION_COOKIE_NAME).reject("could not expire cookie")?,
    );
    Ok(resp)
}

#[derive(Deserialize)]
struct SetLocalePost {
    locale: String,
}

async fn set_locale(
    State(state): State<AppState>,
    Form(body): Form<SetLocalePost>,
) -> Result<Response, AppError> {
    let locale = match_supported_locale(&body.locale).unwrap_or(names::DEFAULT_LOCALE);

    let mut headers = HeaderMap::new();
    headers.insert(
        SET_COOKIE,
        utils::cookie(names::LOCALE_COOKIE_NAME, locale, state.secure_cookies)
            .reject("could not create cookie")?,
    );
    headers.insert("HX-Refresh", HeaderValue::from_static("true"));

    Ok(headers.into_response())
}
