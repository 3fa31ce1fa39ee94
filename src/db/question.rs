use std::collections::HashMap;

use color_eyre::Result;
use sqlx::SqliteConnection;

use super::models::{ChoiceModel, QuestionModel, QuestionWithChoices};
use super::Db;
use crate::models::{DraftItem, QuestionType};

impl Db {
    /// Insert one question with its choices. `correct` is the index of the
    /// correct choice, if any.
    pub async fn add_question(
        &self,
        quiz_id: i64,
        text: &str,
        question_type: QuestionType,
        points: i64,
        choices: &[String],
        correct: Option<usize>,
    ) -> Result<QuestionModel> {
        let mut tx = self.begin_write().await?;
        let question =
            insert_question(&mut *tx, quiz_id, text, question_type, points, choices, correct)
                .await?;
        tx.commit().await?;

        Ok(question)
    }

    /// Questions of a quiz in creation order, each with its choices.
    pub async fn questions_with_choices(&self, quiz_id: i64) -> Result<Vec<QuestionWithChoices>> {
        let questions = sqlx::query_as::<_, QuestionModel>(
            "SELECT id, quiz_id, text, question_type, points FROM questions WHERE quiz_id = ? ORDER BY id",
        )
        .bind(quiz_id)
        .fetch_all(&self.pool)
        .await?;

        let choices = sqlx::query_as::<_, ChoiceModel>(
            r#"
            SELECT c.id, c.question_id, c.text, c.is_correct
            FROM choices c
            JOIN questions q ON q.id = c.question_id
            WHERE q.quiz_id = ?
            ORDER BY c.id
            "#,
        )
        .bind(quiz_id)
        .fetch_all(&self.pool)
        .await?;

        let mut by_question: HashMap<i64, Vec<ChoiceModel>> = HashMap::new();
        for choice in choices {
            by_question.entry(choice.question_id).or_default().push(choice);
        }

        Ok(questions
            .into_iter()
            .map(|question| QuestionWithChoices {
                choices: by_question.remove(&question.id).unwrap_or_default(),
                question,
            })
            .collect())
    }

    pub async fn question_with_choices(
        &self,
        question_id: i64,
    ) -> Result<Option<QuestionWithChoices>> {
        let Some(question) = sqlx::query_as::<_, QuestionModel>(
            "SELECT id, quiz_id, text, question_type, points FROM questions WHERE id = ?",
        )
        .bind(question_id)
        .fetch_optional(&self.pool)
        .await?
        else {
            return Ok(None);
        };

        let choices = sqlx::query_as::<_, ChoiceModel>(
            "SELECT id, question_id, text, is_correct FROM choices WHERE question_id = ? ORDER BY id",
        )
        .bind(question_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(Some(QuestionWithChoices { question, choices }))
    }

    pub async fn question_count(&self, quiz_id: i64) -> Result<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM questions WHERE quiz_id = ?")
            .bind(quiz_id)
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }

    /// Convert normalized draft items into questions of `quiz_id` in one
    /// transaction. Items without text, without choices, or with an
    /// out-of-range correct index are skipped.
    pub async fn import_draft_items(
        &self,
        quiz_id: i64,
        items: &[DraftItem],
    ) -> Result<Vec<QuestionModel>> {
        let mut tx = self.begin_write().await?;
        let mut created = Vec::with_capacity(items.len());

        for item in items {
            if !is_importable(item) {
                tracing::debug!("skipping malformed draft item: {:?}", item.question);
                continue;
            }

            let question = insert_question(
                &mut *tx,
                quiz_id,
                item.question.trim(),
                QuestionType::MultipleChoice,
                item.points.max(1),
                &item.choices,
                Some(item.correct_index),
            )
            .await?;
            created.push(question);
        }

        tx.commit().await?;

        tracing::info!(
            "imported {} of {} draft items into quiz {quiz_id}",
            created.len(),
            items.len()
        );
        Ok(created)
    }
}

pub(crate) fn is_importable(item: &DraftItem) -> bool {
    !item.question.trim().is_empty()
        && !item.choices.is_empty()
        && item.correct_index < item.choices.len()
}

async fn insert_question(
    conn: &mut SqliteConnection,
    quiz_id: i64,
    text: &str,
    question_type: QuestionType,
    points: i64,
    choices: &[String],
    correct: Option<usize>,
) -> Result<QuestionModel> {
    let question = sqlx::query_as::<_, QuestionModel>(
        r#"
        INSERT INTO questions (quiz_id, text, question_type, points)
        VALUES (?, ?, ?, ?)
        RETURNING id, quiz_id, text, question_type, points
        "#,
    )
    .bind(quiz_id)
    .bind(text)
    .bind(question_type.as_str())
    .bind(points)
    .fetch_one(&mut *conn)
    .await?;

    for (idx, choice) in choices.iter().enumerate() {
        sqlx::query("INSERT INTO choices (question_id, text, is_correct) VALUES (?, ?, ?)")
            .bind(question.id)
            .bind(choice.trim())
            .bind(correct == Some(idx))
            .execute(&mut *conn)
            .await?;
    }

    Ok(question)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(question: &str, choices: &[&str], correct_index: usize) -> DraftItem {
        DraftItem {
            question: question.to_string(),
            choices: choices.iter().map(|c| c.to_string()).collect(),
            correct_index,
            points: 1,
            explanation: String::new(),
        }
    }

    #[test]
    fn importable_items_need_text_choices_and_valid_index() {
        assert!(is_importable(&item("Q", &["a", "b"], 1)));
        assert!(!is_importable(&item("  ", &["a", "b"], 0)));
        assert!(!is_importable(&item("Q", &[], 0)));
        assert!(!is_importable(&item("Q", &["a", "b"], 2)));
    }
}
