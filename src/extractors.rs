use std::convert::Infallible;

use axum::{
    extract::FromRequestParts,
    http::{header, request::Parts},
};
use axum_extra::extract::CookieJar;

use crate::{db::models::AuthUser, names, rejections::AppError, AppState};

/// Whether the request wants an htmx fragment: `HX-Request: true` on a
/// non-boosted request. Boosted navigation swaps the whole body and gets a
/// full page.
pub struct IsHtmx(pub bool);

impl<S: Send + Sync> FromRequestParts<S> for IsHtmx {
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let header_is_true = |name: &str| {
            parts
                .headers
                .get(name)
                .and_then(|v| v.to_str().ok())
                .is_some_and(|v| v == "true")
        };
        Ok(IsHtmx(header_is_true("HX-Request") && !header_is_true("HX-Boosted")))
    }
}

/// Extracts the locale from the `lang` cookie, falling back to the browser's
/// `Accept-Language` header, then to `"en"`.
pub struct Locale(pub String);

impl<S: Send + Sync> FromRequestParts<S> for Locale {
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let jar = CookieJar::from_headers(&parts.headers);
        let locale = jar
            .get(names::LOCALE_COOKIE_NAME)
            .and_then(|c| match_supported_locale(c.value()))
            .or_else(|| {
                parts
                    .headers
                    .get(header::ACCEPT_LANGUAGE)
                    .and_then(|v| v.to_str().ok())
                    .and_then(locale_from_accept_language)
            })
            .unwrap_or(names::DEFAULT_LOCALE);
        Ok(Locale(locale.to_string()))
    }
}

/// Match a language tag against supported locales.
pub fn match_supported_locale(lang: &str) -> Option<&'static str> {
    let primary = lang.split('-').next().unwrap_or(lang);
    match primary.to_ascii_lowercase().as_str() {
        "ja" => Some("ja"),
        "en" => Some("en"),
        _ => None,
    }
}

/// Parse an `Accept-Language` header and return the best matching supported locale.
fn locale_from_accept_language(header: &str) -> Option<&'static str> {
    let mut entries: Vec<(&str, f32)> = header
        .split(',')
        .map(|entry| {
            let entry = entry.trim();
            if let Some((lang, params)) = entry.split_once(';') {
                let q = params
                    .split(';')
                    .find_map(|p| p.trim().strip_prefix("q="))
                    .and_then(|v| v.trim().parse::<f32>().ok())
                    .unwrap_or(1.0);
                (lang.trim(), q)
            } else {
                (entry, 1.0)
            }
        })
        .collect();
    entries.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
    entries
        .iter()
        .find_map(|(lang, _)| match_supported_locale(lang))
}

/// Guard extractor that verifies the user session cookie against the database.
/// Carries the authenticated user's info for use in handlers.
pub struct AuthGuard(pub AuthUser);

impl FromRequestParts<AppState> for AuthGuard {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let jar = CookieJar::from_headers(&parts.headers);

        let Some(session_id) = jar
            .get(names::USER_SESSION_COOKIE_NAME)
            .map(|c| c.value().to_string())
        else {
            return Err(AppError::Unauthorized);
        };

        match state.db.get_user_by_session(&session_id).await {
            Ok(Some(user)) => Ok(AuthGuard(user)),
            Ok(None) => Err(AppError::Unauthorized),
            Err(e) => {
                tracing::error!("session lookup failed: {e}");
                Err(AppError::Internal("session lookup failed"))
            }
        }
    }
}

/// [`AuthGuard`] that additionally requires `is_admin`.
pub struct AdminGuard(pub AuthUser);

impl FromRequestParts<AppState> for AdminGuard {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let AuthGuard(user) = AuthGuard::from_request_parts(parts, state).await?;
        if !user.is_admin {
            tracing::warn!("user {} denied admin access", user.id);
            return Err(AppError::Forbidden);
        }
        Ok(AdminGuard(user))
    }
}

/// The signed-in user when there is one; never rejects.
pub struct MaybeUser(pub Option<AuthUser>);

impl FromRequestParts<AppState> for MaybeUser {
    type Rejection = Infallible;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        Ok(MaybeUser(
            AuthGuard::from_request_parts(parts, state)
                .await
                .ok()
                .map(|AuthGuard(user)| user),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accept_language_picks_best_supported() {
        assert_eq!(locale_from_accept_language("fr-FR,ja;q=0.8,en;q=0.5"), Some("ja"));
        assert_eq!(locale_from_accept_language("en-GB;q=0.4, ja-JP;q=0.9"), Some("ja"));
        assert_eq!(locale_from_accept_language("de,fr"), None);
    }

    #[test]
    fn locale_tags_match_by_primary_subtag() {
        assert_eq!(match_supported_locale("EN-us"), Some("en"));
        assert_eq!(match_supported_locale("ja"), Some("ja"));
        assert_eq!(match_supported_locale("zh-CN"), None);
    }
}
