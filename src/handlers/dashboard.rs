use std::collections::HashMap;

use axum::{
    extract::{Query, State},
    routing::get,
    Router,
};
use chrono::Utc;
use maud::Markup;
use serde::Deserialize;

use crate::{
    db::HistoryFilter,
    extractors::{AuthGuard, IsHtmx, Locale},
    models::{HistorySort, HistoryStatus, LeaderboardPeriod},
    names,
    rejections::{AppError, ResultExt},
    services::stats,
    views, AppState,
};

use crate::views::dashboard as dashboard_views;

const RECENT_ATTEMPTS: i64 = 6;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route(names::HISTORY_URL, get(history))
        .route(names::STATS_URL, get(user_stats))
        .route(names::LEADERBOARD_URL, get(leaderboard))
}

/// Every field arrives as text; empty or unknown values mean "no filter".
#[derive(Deserialize, Default)]
struct HistoryQuery {
    #[serde(default)]
    q: String,
    #[serde(default)]
    category: String,
    #[serde(default)]
    status: String,
    #[serde(default)]
    sort: String,
}

impl HistoryQuery {
    fn into_filter(self) -> HistoryFilter {
        let q = self.q.trim();
        HistoryFilter {
            q: (!q.is_empty()).then(|| q.to_string()),
            category_id: self.category.trim().parse().ok(),
            status: self.status.parse::<HistoryStatus>().ok(),
            sort: self.sort.parse::<HistorySort>().unwrap_or_default(),
        }
    }
}

async fn history(
    AuthGuard(user): AuthGuard,
    IsHtmx(is_htmx): IsHtmx,
    State(state): State<AppState>,
    Locale(locale): Locale,
    Query(query): Query<HistoryQuery>,
) -> Result<Markup, AppError> {
    let filter = query.into_filter();

    let rows = state
        .db
        .history(user.id, &filter, None)
        .await
        .reject("could not get history")?;
    let categories = state
        .db
        .categories()
        .await
        .reject("could not get categories")?;
    let peers: HashMap<_, _> = state
        .db
        .peer_counts(user.id)
        .await
        .reject("could not get peer counts")?
        .into_iter()
        .map(|p| (p.quiz_id, p))
        .collect();

    Ok(views::render(
        is_htmx,
        "History",
        dashboard_views::history(&rows, &categories, &filter, &peers, &locale),
        &locale,
        Some(&user),
    ))
}

async fn user_stats(
    AuthGuard(user): AuthGuard,
    IsHtmx(is_htmx): IsHtmx,
    State(state): State<AppState>,
    Locale(locale): Locale,
) -> Result<Markup, AppError> {
    let completed = state
        .db
        .completed_attempts(user.id)
        .await
        .reject("could not get attempts")?;
    let recent = state
        .db
        .recent_attempts(user.id, RECENT_ATTEMPTS)
        .await
        .reject("could not get recent attempts")?;

    let summary = stats::user_stats(&completed);

    Ok(views::render(
        is_htmx,
        "Stats",
        dashboard_views::stats(&summary, &recent, &locale),
        &locale,
        Some(&user),
    ))
}

#[derive(Deserialize)]
struct LeaderboardQuery {
    #[serde(default)]
    period: String,
}

async fn leaderboard(
    AuthGuard(user): AuthGuard,
    IsHtmx(is_htmx): IsHtmx,
    State(state): State<AppState>,
    Locale(locale): Locale,
    Query(query): Query<LeaderboardQuery>,
) -> Result<Markup, AppError> {
    let period = query.period.parse::<LeaderboardPeriod>().unwrap_or_default();

    let attempts = state
        .db
        .leaderboard_attempts()
        .await
        .reject("could not get leaderboard")?;
    let board = stats::leaderboard(&attempts, period, Utc::now(), user.id);

    Ok(views::render(
        is_htmx,
        "Leaderboard",
        dashboard_views::leaderboard(&board, user.id, &locale),
        &locale,
        Some(&user),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_history_query_means_no_filter() {
        let filter = HistoryQuery::default().into_filter();

        assert_eq!(filter.q, None);
        assert_eq!(filter.category_id, None);
        assert_eq!(filter.status, None);
        assert_eq!(filter.sort, HistorySort::DateDesc);
    }

    #[test]
    fn history_query_parses_known_values() {
        let query = HistoryQuery {
            q: "  rust ".to_string(),
            category: "4".to_string(),
            status: "ongoing".to_string(),
            sort: "-score".to_string(),
        };

        let filter = query.into_filter();

        assert_eq!(filter.q.as_deref(), Some("rust"));
        assert_eq!(filter.category_id, Some(4));
        assert_eq!(filter.status, Some(HistoryStatus::Ongoing));
        assert_eq!(filter.sort, HistorySort::ScoreDesc);
    }
}
