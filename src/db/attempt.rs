use std::collections::HashMap;

use chrono::{DateTime, Utc};
use color_eyre::{eyre::OptionExt, Result};
use sqlx::SqliteConnection;

use super::answer::upsert_answer;
use super::models::{AttemptModel, QuestionWithChoices};
use super::Db;
use crate::models::score_percent;

const ATTEMPT_COLUMNS: &str = r#"
    id, user_id, quiz_id, score, correct_count, total, current_index, is_completed,
    started_at, question_started_at, completed_at, time_taken
"#;

impl Db {
    /// The newest unfinished attempt of a user on a quiz.
    pub async fn in_progress_attempt(
        &self,
        user_id: i64,
        quiz_id: i64,
    ) -> Result<Option<AttemptModel>> {
        let attempt = sqlx::query_as::<_, AttemptModel>(&format!(
            r#"
            SELECT {ATTEMPT_COLUMNS} FROM attempts
            WHERE user_id = ? AND quiz_id = ? AND is_completed = 0
            ORDER BY started_at DESC, id DESC
            LIMIT 1
            "#
        ))
        .bind(user_id)
        .bind(quiz_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(attempt)
    }

    pub async fn create_attempt(
        &self,
        user_id: i64,
        quiz_id: i64,
        total: i64,
        now: DateTime<Utc>,
    ) -> Result<AttemptModel> {
        let mut conn = self.pool.acquire().await?;
        let attempt = insert_attempt(&mut *conn, user_id, quiz_id, total, now).await?;

        tracing::info!("attempt {} started: user={user_id}, quiz={quiz_id}", attempt.id);
        Ok(attempt)
    }

    pub async fn completed_attempt_count(&self, user_id: i64, quiz_id: i64) -> Result<i64> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM attempts WHERE user_id = ? AND quiz_id = ? AND is_completed = 1",
        )
        .bind(user_id)
        .bind(quiz_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(count)
    }

    pub async fn latest_completed_attempt(
        &self,
        user_id: i64,
        quiz_id: i64,
    ) -> Result<Option<AttemptModel>> {
        let attempt = sqlx::query_as::<_, AttemptModel>(&format!(
            r#"
            SELECT {ATTEMPT_COLUMNS} FROM attempts
            WHERE user_id = ? AND quiz_id = ? AND is_completed = 1
            ORDER BY completed_at DESC, id DESC
            LIMIT 1
            "#
        ))
        .bind(user_id)
        .bind(quiz_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(attempt)
    }

    /// An attempt, only when it belongs to `user_id`.
    pub async fn attempt_for_user(
        &self,
        attempt_id: i64,
        user_id: i64,
    ) -> Result<Option<AttemptModel>> {
        let attempt = sqlx::query_as::<_, AttemptModel>(&format!(
            "SELECT {ATTEMPT_COLUMNS} FROM attempts WHERE id = ? AND user_id = ?"
        ))
        .bind(attempt_id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(attempt)
    }

    /// Persist the navigation position and restart the per-question clock.
    pub async fn move_to_question(
        &self,
        attempt_id: i64,
        index: i64,
        now: DateTime<Utc>,
    ) -> Result<()> {
        sqlx::query(
            "UPDATE attempts SET current_index = ?, question_started_at = ? WHERE id = ? AND is_completed = 0",
        )
        .bind(index)
        .bind(now)
        .bind(attempt_id)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Complete an attempt from its cached answer correctness. Finalizing an
    /// already completed attempt leaves it untouched and returns it as stored.
    pub async fn finalize_attempt(
        &self,
        attempt_id: i64,
        total: i64,
        now: DateTime<Utc>,
        time_taken: i64,
    ) -> Result<AttemptModel> {
        let mut tx = self.begin_write().await?;
        let attempt = finalize(&mut *tx, attempt_id, total, now, time_taken).await?;
        tx.commit().await?;

        Ok(attempt)
    }

    /// Whole-form submission: one new attempt, one answer per question and
    /// the final score, all in a single transaction. `selections` maps
    /// question ids to the submitted choice ids.
    pub async fn submit_full_attempt(
        &self,
        user_id: i64,
        quiz_id: i64,
        questions: &[QuestionWithChoices],
        selections: &HashMap<i64, i64>,
        now: DateTime<Utc>,
    ) -> Result<AttemptModel> {
        let total = questions.len() as i64;
        let mut tx = self.begin_write().await?;

        let attempt = insert_attempt(&mut *tx, user_id, quiz_id, total, now).await?;

        for q in questions {
            let selected = selections
                .get(&q.question.id)
                .and_then(|choice_id| q.choices.iter().find(|c| c.id == *choice_id));
            upsert_answer(&mut *tx, attempt.id, q.question.id, selected, None).await?;
        }

        let attempt = finalize(&mut *tx, attempt.id, total, now, 0).await?;
        tx.commit().await?;

        Ok(attempt)
    }
}

async fn insert_attempt(
    conn: &mut SqliteConnection,
    user_id: i64,
    quiz_id: i64,
    total: i64,
    now: DateTime<Utc>,
) -> Result<AttemptModel> {
    let attempt = sqlx::query_as::<_, AttemptModel>(&format!(
        r#"
        INSERT INTO attempts (user_id, quiz_id, total, started_at, question_started_at)
        VALUES (?, ?, ?, ?, ?)
        RETURNING {ATTEMPT_COLUMNS}
        "#
    ))
    .bind(user_id)
    .bind(quiz_id)
    .bind(total)
    .bind(now)
    .bind(now)
    .fetch_one(&mut *conn)
    .await?;

    Ok(attempt)
}

async fn finalize(
    conn: &mut SqliteConnection,
    attempt_id: i64,
    total: i64,
    now: DateTime<Utc>,
    time_taken: i64,
) -> Result<AttemptModel> {
    let correct: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM answers WHERE attempt_id = ? AND is_correct_cached = 1",
    )
    .bind(attempt_id)
    .fetch_one(&mut *conn)
    .await?;

    let score = score_percent(correct, total);

    let result = sqlx::query(
        r#"
        UPDATE attempts
        SET score = ?, correct_count = ?, total = ?, is_completed = 1,
            completed_at = ?, time_taken = ?
        WHERE id = ? AND is_completed = 0
        "#,
    )
    .bind(score)
    .bind(correct)
    .bind(total)
    .bind(now)
    .bind(time_taken.max(0))
    .bind(attempt_id)
    .execute(&mut *conn)
    .await?;

    if result.rows_affected() == 0 {
        tracing::info!("attempt {attempt_id} was already finalized");
    } else {
        tracing::info!("attempt {attempt_id} finalized: {correct}/{total} = {score}%");
    }

    let attempt = sqlx::query_as::<_, AttemptModel>(&format!(
        "SELECT {ATTEMPT_COLUMNS} FROM attempts WHERE id = ?"
    ))
    .bind(attempt_id)
    .fetch_optional(&mut *conn)
    .await?
    .ok_or_eyre("attempt not found")?;

    Ok(attempt)
}
