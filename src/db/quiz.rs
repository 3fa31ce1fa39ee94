use chrono::Utc;
use color_eyre::Result;

use super::models::{NewQuiz, QuizListing, QuizModel};
use super::{is_unique_violation, Db};
use crate::models::QuizStatus;
use crate::utils::{random_suffix, slugify};

/// Business rules a quiz must satisfy; surfaced to the admin as form errors.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum QuizRuleError {
    #[error("the subcategory does not exist")]
    UnknownSubcategory,
    #[error("the subcategory belongs to a different category")]
    SubcategoryMismatch,
    #[error("the quiz has no questions")]
    NoQuestions,
    #[error("question \"{0}\" has no correct choice")]
    MissingCorrectChoice(String),
}

const QUIZ_COLUMNS: &str = r#"
    id, title, slug, description, category_id, subcategory_id, difficulty, status,
    is_published, time_limit, passing_score, max_attempts, created_at, updated_at
"#;

const LISTING_SELECT: &str = r#"
    SELECT
        q.id, q.title, q.description, q.difficulty, q.status, q.is_published, q.time_limit,
        c.name AS category_name,
        s.name AS subcategory_name,
        (SELECT COUNT(*) FROM questions qq WHERE qq.quiz_id = q.id) AS question_count
    FROM quizzes q
    LEFT JOIN categories c ON c.id = q.category_id
    LEFT JOIN subcategories s ON s.id = q.subcategory_id
"#;

impl Db {
    /// Create a quiz in `draft` status. The category is inferred from the
    /// subcategory and must agree with it when both are given. The slug is
    /// unique; a concurrent collision is retried once with a random suffix.
    pub async fn create_quiz(&self, quiz: &NewQuiz) -> Result<i64> {
        let category_id = match quiz.subcategory_id {
            Some(subcategory_id) => {
                let parent = self
                    .subcategory_parent(subcategory_id)
                    .await?
                    .ok_or(QuizRuleError::UnknownSubcategory)?;
                if quiz.category_id.is_some_and(|c| c != parent) {
                    return Err(QuizRuleError::SubcategoryMismatch.into());
                }
                Some(parent)
            }
            None => quiz.category_id,
        };

        let mut base = slugify(&quiz.title);
        if base.is_empty() {
            base = "quiz".to_string();
        }

        let slug = self.unique_quiz_slug(&base).await?;
        let quiz_id = self
            .insert_quiz_with_retry(quiz, category_id, &base, &slug)
            .await?;

        tracing::info!("quiz created: id={quiz_id}, title={}", quiz.title);
        Ok(quiz_id)
    }

    /// Insert under `slug`; when another writer took it since the check,
    /// retry once as `base-<random>`.
    async fn insert_quiz_with_retry(
        &self,
        quiz: &NewQuiz,
        category_id: Option<i64>,
        base: &str,
        slug: &str,
    ) -> Result<i64> {
        match self.insert_quiz(quiz, category_id, slug).await {
            Ok(id) => Ok(id),
            Err(e) if is_unique_violation(&e) => {
                let retry = format!("{base}-{}", random_suffix());
                tracing::warn!("quiz slug {slug} taken concurrently, retrying with {retry}");
                self.insert_quiz(quiz, category_id, &retry).await
            }
            Err(e) => Err(e),
        }
    }

    async fn insert_quiz(
        &self,
        quiz: &NewQuiz,
        category_id: Option<i64>,
        slug: &str,
    ) -> Result<i64> {
        let now = Utc::now();
        let id: i64 = sqlx::query_scalar(
            r#"
            INSERT INTO quizzes (
                title, slug, description, category_id, subcategory_id, difficulty,
                status, is_published, time_limit, passing_score, max_attempts,
                created_at, updated_at
            )
            VALUES (?, ?, ?, ?, ?, ?, 'draft', 0, ?, ?, ?, ?, ?)
            RETURNING id
            "#,
        )
        .bind(&quiz.title)
        .bind(slug)
        .bind(&quiz.description)
        .bind(category_id)
        .bind(quiz.subcategory_id)
        .bind(quiz.difficulty.as_str())
        .bind(quiz.time_limit)
        .bind(quiz.passing_score)
        .bind(quiz.max_attempts)
        .bind(now)
        .bind(now)
        .fetch_one(&self.pool)
        .await?;

        Ok(id)
    }

    /// `base`, or `base-2`, `base-3`, ... whichever is free first.
    async fn unique_quiz_slug(&self, base: &str) -> Result<String> {
        let taken: Vec<String> =
            sqlx::query_scalar("SELECT slug FROM quizzes WHERE slug = ? OR slug LIKE ?")
                .bind(base)
                .bind(format!("{base}-%"))
                .fetch_all(&self.pool)
                .await?;

        if !taken.iter().any(|s| s == base) {
            return Ok(base.to_string());
        }

        let mut n = 2;
        loop {
            let candidate = format!("{base}-{n}");
            if !taken.contains(&candidate) {
                return Ok(candidate);
            }
            n += 1;
        }
    }

    pub async fn quiz(&self, quiz_id: i64) -> Result<Option<QuizModel>> {
        let quiz = sqlx::query_as::<_, QuizModel>(&format!(
            "SELECT {QUIZ_COLUMNS} FROM quizzes WHERE id = ?"
        ))
        .bind(quiz_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(quiz)
    }

    pub async fn published_quiz(&self, quiz_id: i64) -> Result<Option<QuizModel>> {
        let quiz = sqlx::query_as::<_, QuizModel>(&format!(
            "SELECT {QUIZ_COLUMNS} FROM quizzes WHERE id = ? AND is_published = 1"
        ))
        .bind(quiz_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(quiz)
    }

    /// Published quizzes, newest first, optionally limited to one category.
    pub async fn published_quizzes(&self, category_id: Option<i64>) -> Result<Vec<QuizListing>> {
        let quizzes = sqlx::query_as::<_, QuizListing>(&format!(
            r#"{LISTING_SELECT}
            WHERE q.is_published = 1 AND (? IS NULL OR q.category_id = ?)
            ORDER BY q.created_at DESC, q.id DESC
            "#
        ))
        .bind(category_id)
        .bind(category_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(quizzes)
    }

    pub async fn all_quizzes(&self) -> Result<Vec<QuizListing>> {
        let quizzes = sqlx::query_as::<_, QuizListing>(&format!(
            "{LISTING_SELECT} ORDER BY q.created_at DESC, q.id DESC"
        ))
        .fetch_all(&self.pool)
        .await?;

        Ok(quizzes)
    }

    /// Change status and publication. Activating or publishing requires at
    /// least one question, each with a correct choice; the check and the
    /// update share a transaction.
    pub async fn set_quiz_status(
        &self,
        quiz_id: i64,
        status: QuizStatus,
        is_published: bool,
    ) -> Result<()> {
        let mut tx = self.begin_write().await?;

        if status == QuizStatus::Active || is_published {
            let question_count: i64 =
                sqlx::query_scalar("SELECT COUNT(*) FROM questions WHERE quiz_id = ?")
                    .bind(quiz_id)
                    .fetch_one(&mut *tx)
                    .await?;
            if question_count == 0 {
                return Err(QuizRuleError::NoQuestions.into());
            }

            let lacking: Option<String> = sqlx::query_scalar(
                r#"
                SELECT q.text FROM questions q
                WHERE q.quiz_id = ?
                  AND NOT EXISTS (
                    SELECT 1 FROM choices c WHERE c.question_id = q.id AND c.is_correct = 1
                  )
                ORDER BY q.id
                LIMIT 1
                "#,
            )
            .bind(quiz_id)
            .fetch_optional(&mut *tx)
            .await?;
            if let Some(text) = lacking {
                return Err(QuizRuleError::MissingCorrectChoice(text).into());
            }
        }

        sqlx::query("UPDATE quizzes SET status = ?, is_published = ?, updated_at = ? WHERE id = ?")
            .bind(status.as_str())
            .bind(is_published)
            .bind(Utc::now())
            .bind(quiz_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        tracing::info!("quiz {quiz_id} status set to {status}, published={is_published}");
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::models::Difficulty;

    async fn temp_db(name: &str) -> Db {
        let path = std::env::temp_dir().join(format!(
            "intelliquiz_unit_{name}_{}.db",
            std::process::id()
        ));
        let _ = std::fs::remove_file(&path);
        Db::new(format!("file:{}", path.display())).await.unwrap()
    }

    #[tokio::test]
    async fn slug_taken_after_the_check_is_retried_with_a_suffix() {
        let db = temp_db("slug_retry").await;
        let quiz = NewQuiz::new("Rust Basics", Difficulty::Easy);

        let first = db.create_quiz(&quiz).await.unwrap();
        assert_eq!(db.quiz(first).await.unwrap().unwrap().slug, "rust-basics");

        // the checked candidate is already stored, as if inserted concurrently
        let second = db
            .insert_quiz_with_retry(&quiz, None, "rust-basics", "rust-basics")
            .await
            .unwrap();

        let slug = db.quiz(second).await.unwrap().unwrap().slug;
        let suffix = slug.strip_prefix("rust-basics-").unwrap();
        assert_eq!(suffix.len(), 6);
        assert!(suffix.chars().all(|c| c.is_ascii_alphanumeric()));
        assert_eq!(suffix, suffix.to_lowercase());
    }
}
