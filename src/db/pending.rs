use chrono::{DateTime, Duration, Utc};
use color_eyre::Result;
use ulid::Ulid;

use super::models::PendingQuizRequest;
use super::Db;
use crate::models::Difficulty;
use crate::names::PENDING_REQUEST_TTL_MINUTES;

impl Db {
    /// Store a quiz selection awaiting generation. Returns the token the
    /// browser carries to the generation step.
    pub async fn create_pending_request(
        &self,
        user_id: i64,
        category_slug: &str,
        subcategory_id: i64,
        difficulty: Difficulty,
        num_questions: i64,
        now: DateTime<Utc>,
    ) -> Result<String> {
        let token = Ulid::new().to_string();
        let expires_at = now + Duration::minutes(PENDING_REQUEST_TTL_MINUTES);

        // one pending selection per user
        sqlx::query("DELETE FROM pending_quiz_requests WHERE user_id = ? OR expires_at <= ?")
            .bind(user_id)
            .bind(now)
            .execute(&self.pool)
            .await?;

        sqlx::query(
            r#"
            INSERT INTO pending_quiz_requests
                (token, user_id, category_slug, subcategory_id, difficulty, num_questions, expires_at)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&token)
        .bind(user_id)
        .bind(category_slug)
        .bind(subcategory_id)
        .bind(difficulty.as_str())
        .bind(num_questions)
        .bind(expires_at)
        .execute(&self.pool)
        .await?;

        Ok(token)
    }

    /// The unexpired request behind `token`, only for its owner.
    pub async fn pending_request(
        &self,
        token: &str,
        user_id: i64,
        now: DateTime<Utc>,
    ) -> Result<Option<PendingQuizRequest>> {
        let request = sqlx::query_as::<_, PendingQuizRequest>(
            r#"
            SELECT token, user_id, category_slug, subcategory_id, difficulty, num_questions, expires_at
            FROM pending_quiz_requests
            WHERE token = ? AND user_id = ?
            "#,
        )
        .bind(token)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(request.filter(|r| r.expires_at > now))
    }

    /// Delete the request behind `token`. Only the caller whose delete
    /// removed the row gets `true`, so a selection is generated at most once.
    pub async fn consume_pending_request(&self, token: &str, user_id: i64) -> Result<bool> {
        let result = sqlx::query("DELETE FROM pending_quiz_requests WHERE token = ? AND user_id = ?")
            .bind(token)
            .bind(user_id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() == 1)
    }
}
