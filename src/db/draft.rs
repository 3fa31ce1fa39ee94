use chrono::Utc;
use color_eyre::Result;

use super::models::{DraftModel, NewDraft};
use super::Db;

const DRAFT_COLUMNS: &str = r#"
    id, provider, prompt, raw_response, parsed, meta, category_id, subcategory_id,
    difficulty, num_questions, target_quiz_id, created_by, approved, rejected, error, created_at
"#;

impl Db {
    /// Record one generation call, successful or not.
    pub async fn create_draft(&self, draft: &NewDraft) -> Result<i64> {
        let id: i64 = sqlx::query_scalar(
            r#"
            INSERT INTO ai_question_drafts (
                provider, prompt, raw_response, parsed, meta, category_id, subcategory_id,
                difficulty, num_questions, created_by, error, created_at
            )
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            RETURNING id
            "#,
        )
        .bind(&draft.provider)
        .bind(&draft.prompt)
        .bind(&draft.raw_response)
        .bind(serde_json::to_string(&draft.parsed)?)
        .bind(serde_json::to_string(&draft.meta)?)
        .bind(draft.category_id)
        .bind(draft.subcategory_id)
        .bind(&draft.difficulty)
        .bind(draft.num_questions)
        .bind(draft.created_by)
        .bind(&draft.error)
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await?;

        if draft.error.is_empty() {
            tracing::info!(
                "draft {id} saved from {} with {} items",
                draft.provider,
                draft.parsed.items.len()
            );
        } else {
            tracing::warn!("draft {id} saved with error from {}: {}", draft.provider, draft.error);
        }
        Ok(id)
    }

    pub async fn draft(&self, draft_id: i64) -> Result<Option<DraftModel>> {
        let draft = sqlx::query_as::<_, DraftModel>(&format!(
            "SELECT {DRAFT_COLUMNS} FROM ai_question_drafts WHERE id = ?"
        ))
        .bind(draft_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(draft)
    }

    /// Drafts newest first; pending ones only when `pending_only`.
    pub async fn drafts(&self, pending_only: bool) -> Result<Vec<DraftModel>> {
        let drafts = sqlx::query_as::<_, DraftModel>(&format!(
            r#"
            SELECT {DRAFT_COLUMNS} FROM ai_question_drafts
            WHERE (? = 0 OR (approved = 0 AND rejected = 0))
            ORDER BY created_at DESC, id DESC
            "#
        ))
        .bind(pending_only)
        .fetch_all(&self.pool)
        .await?;

        Ok(drafts)
    }

    pub async fn set_draft_target(&self, draft_id: i64, quiz_id: i64) -> Result<()> {
        sqlx::query("UPDATE ai_question_drafts SET target_quiz_id = ? WHERE id = ?")
            .bind(quiz_id)
            .bind(draft_id)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    pub async fn approve_draft(&self, draft_id: i64) -> Result<()> {
        sqlx::query("UPDATE ai_question_drafts SET approved = 1, rejected = 0 WHERE id = ?")
            .bind(draft_id)
            .execute(&self.pool)
            .await?;

        tracing::info!("draft {draft_id} approved");
        Ok(())
    }

    pub async fn reject_draft(&self, draft_id: i64) -> Result<()> {
        sqlx::query("UPDATE ai_question_drafts SET rejected = 1, approved = 0 WHERE id = ?")
            .bind(draft_id)
            .execute(&self.pool)
            .await?;

        tracing::info!("draft {draft_id} rejected");
        Ok(())
    }
}
