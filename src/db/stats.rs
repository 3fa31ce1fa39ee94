use color_eyre::Result;

use super::models::{CompletedAttemptRow, HistoryRow, LeaderboardAttemptRow, PeerCount};
use super::Db;
use crate::models::{HistorySort, HistoryStatus};

/// History page filters, all optional.
#[derive(Debug, Clone, Default)]
pub struct HistoryFilter {
    pub q: Option<String>,
    pub category_id: Option<i64>,
    pub status: Option<HistoryStatus>,
    pub sort: HistorySort,
}

fn order_clause(sort: HistorySort) -> &'static str {
    match sort {
        HistorySort::DateDesc => "a.started_at DESC, a.id DESC",
        HistorySort::DateAsc => "a.started_at ASC, a.id ASC",
        HistorySort::ScoreDesc => "a.score DESC, a.started_at DESC",
        HistorySort::ScoreAsc => "a.score ASC, a.started_at DESC",
        HistorySort::TimeDesc => "a.time_taken IS NULL, a.time_taken DESC, a.started_at DESC",
        HistorySort::TimeAsc => "a.time_taken IS NULL, a.time_taken ASC, a.started_at DESC",
    }
}

impl Db {
    /// Completed attempts of a user, newest first.
    pub async fn completed_attempts(&self, user_id: i64) -> Result<Vec<CompletedAttemptRow>> {
        let rows = sqlx::query_as::<_, CompletedAttemptRow>(
            r#"
            SELECT
                a.id, a.quiz_id, q.title AS quiz_title, c.name AS category_name,
                a.score, a.correct_count, a.total, a.started_at, a.completed_at, a.time_taken
            FROM attempts a
            JOIN quizzes q ON q.id = a.quiz_id
            LEFT JOIN categories c ON c.id = q.category_id
            WHERE a.user_id = ? AND a.is_completed = 1
            ORDER BY a.started_at DESC, a.id DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    /// Every attempt of a user, completed or not, newest first, capped at `limit`.
    pub async fn recent_attempts(&self, user_id: i64, limit: i64) -> Result<Vec<HistoryRow>> {
        self.history(user_id, &HistoryFilter::default(), Some(limit))
            .await
    }

    pub async fn history(
        &self,
        user_id: i64,
        filter: &HistoryFilter,
        limit: Option<i64>,
    ) -> Result<Vec<HistoryRow>> {
        let pattern = filter
            .q
            .as_deref()
            .map(str::trim)
            .filter(|q| !q.is_empty())
            .map(|q| format!("%{}%", q.to_lowercase()));
        let completed = filter.status.map(|s| s == HistoryStatus::Completed);

        let rows = sqlx::query_as::<_, HistoryRow>(&format!(
            r#"
            SELECT
                a.id, a.quiz_id, q.title AS quiz_title, c.name AS category_name,
                a.score, a.total, a.current_index, a.is_completed,
                a.started_at, a.completed_at, a.time_taken
            FROM attempts a
            JOIN quizzes q ON q.id = a.quiz_id
            LEFT JOIN categories c ON c.id = q.category_id
            LEFT JOIN subcategories s ON s.id = q.subcategory_id
            WHERE a.user_id = ?
              AND (? IS NULL
                   OR LOWER(q.title) LIKE ?
                   OR LOWER(COALESCE(c.name, '')) LIKE ?
                   OR LOWER(COALESCE(s.name, '')) LIKE ?)
              AND (? IS NULL OR q.category_id = ?)
              AND (? IS NULL OR a.is_completed = ?)
            ORDER BY {}
            LIMIT ?
            "#,
            order_clause(filter.sort)
        ))
        .bind(user_id)
        .bind(&pattern)
        .bind(&pattern)
        .bind(&pattern)
        .bind(&pattern)
        .bind(filter.category_id)
        .bind(filter.category_id)
        .bind(completed)
        .bind(completed)
        .bind(limit.unwrap_or(-1))
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    /// Distinct other users with ongoing and completed attempts, per quiz the
    /// given user has attempted.
    pub async fn peer_counts(&self, user_id: i64) -> Result<Vec<PeerCount>> {
        let counts = sqlx::query_as::<_, PeerCount>(
            r#"
            SELECT
                quiz_id,
                COUNT(DISTINCT CASE WHEN is_completed = 0 THEN user_id END) AS ongoing,
                COUNT(DISTINCT CASE WHEN is_completed = 1 THEN user_id END) AS completed
            FROM attempts
            WHERE quiz_id IN (SELECT quiz_id FROM attempts WHERE user_id = ?)
              AND user_id IS NOT NULL
              AND user_id != ?
            GROUP BY quiz_id
            "#,
        )
        .bind(user_id)
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(counts)
    }

    /// Completed attempts of every user, for leaderboard aggregation.
    pub async fn leaderboard_attempts(&self) -> Result<Vec<LeaderboardAttemptRow>> {
        let rows = sqlx::query_as::<_, LeaderboardAttemptRow>(
            r#"
            SELECT
                a.user_id AS user_id, u.display_name AS display_name,
                a.score, a.correct_count, a.total, a.started_at, a.completed_at, a.time_taken
            FROM attempts a
            JOIN users u ON u.id = a.user_id
            WHERE a.is_completed = 1
            ORDER BY a.id
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }
}
