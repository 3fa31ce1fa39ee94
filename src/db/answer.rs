use color_eyre::Result;
use sqlx::SqliteConnection;

use super::models::{AnswerModel, AnswerReview, ChoiceModel};
use super::Db;

/// The materialized value of `answers.is_correct_cached`. Every write to an
/// answer goes through this.
pub fn compute_correctness(selected: Option<&ChoiceModel>) -> bool {
    selected.is_some_and(|choice| choice.is_correct)
}

impl Db {
    /// Record the selection for one question of an attempt. A second write
    /// replaces the selection and adds to the time spent.
    pub async fn upsert_answer(
        &self,
        attempt_id: i64,
        question_id: i64,
        selected: Option<&ChoiceModel>,
        time_taken: Option<i64>,
    ) -> Result<()> {
        let mut conn = self.pool.acquire().await?;
        upsert_answer(&mut *conn, attempt_id, question_id, selected, time_taken).await
    }

    pub async fn answers_for_attempt(&self, attempt_id: i64) -> Result<Vec<AnswerModel>> {
        let answers = sqlx::query_as::<_, AnswerModel>(
            r#"
            SELECT id, attempt_id, question_id, selected_choice_id, is_correct_cached,
                   time_taken, explanation_id
            FROM answers
            WHERE attempt_id = ?
            ORDER BY question_id
            "#,
        )
        .bind(attempt_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(answers)
    }

    /// One row per question of the quiz, joined with this attempt's answer.
    pub async fn answer_reviews(&self, attempt_id: i64, quiz_id: i64) -> Result<Vec<AnswerReview>> {
        let reviews = sqlx::query_as::<_, AnswerReview>(
            r#"
            SELECT
                q.id AS question_id,
                q.text AS question_text,
                a.id AS answer_id,
                sc.text AS selected_text,
                cc.text AS correct_text,
                COALESCE(a.is_correct_cached, 0) AS is_correct,
                a.time_taken AS time_taken
            FROM questions q
            LEFT JOIN answers a ON a.question_id = q.id AND a.attempt_id = ?
            LEFT JOIN choices sc ON sc.id = a.selected_choice_id
            LEFT JOIN choices cc ON cc.question_id = q.id AND cc.is_correct = 1
            WHERE q.quiz_id = ?
            ORDER BY q.id
            "#,
        )
        .bind(attempt_id)
        .bind(quiz_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(reviews)
    }

    /// An answer, only when its attempt belongs to `user_id`.
    pub async fn answer_for_user(&self, answer_id: i64, user_id: i64) -> Result<Option<AnswerModel>> {
        let answer = sqlx::query_as::<_, AnswerModel>(
            r#"
            SELECT a.id, a.attempt_id, a.question_id, a.selected_choice_id, a.is_correct_cached,
                   a.time_taken, a.explanation_id
            FROM answers a
            JOIN attempts t ON t.id = a.attempt_id
            WHERE a.id = ? AND t.user_id = ?
            "#,
        )
        .bind(answer_id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(answer)
    }

    pub async fn set_answer_explanation(&self, answer_id: i64, explanation_id: i64) -> Result<()> {
        sqlx::query("UPDATE answers SET explanation_id = ? WHERE id = ?")
            .bind(explanation_id)
            .bind(answer_id)
            .execute(&self.pool)
            .await?;

        Ok(())
    }
}

pub(super) async fn upsert_answer(
    conn: &mut SqliteConnection,
    attempt_id: i64,
    question_id: i64,
    selected: Option<&ChoiceModel>,
    time_taken: Option<i64>,
) -> Result<()> {
    let is_correct = compute_correctness(selected);

    sqlx::query(
        r#"
        INSERT INTO answers (attempt_id, question_id, selected_choice_id, is_correct_cached, time_taken)
        VALUES (?, ?, ?, ?, ?)
        ON CONFLICT (attempt_id, question_id) DO UPDATE SET
            selected_choice_id = excluded.selected_choice_id,
            is_correct_cached = excluded.is_correct_cached,
            time_taken = COALESCE(answers.time_taken, 0) + COALESCE(excluded.time_taken, 0)
        "#,
    )
    .bind(attempt_id)
    .bind(question_id)
    .bind(selected.map(|c| c.id))
    .bind(is_correct)
    .bind(time_taken)
    .execute(&mut *conn)
    .await?;

    tracing::debug!(
        "answer saved for attempt={attempt_id} question={question_id}: correct={is_correct}"
    );
    Ok(())
}
