use chrono::Utc;
use color_eyre::Result;

use super::models::ExplanationModel;
use super::Db;
use crate::models::Resource;

const EXPLANATION_COLUMNS: &str = r#"
    id, question_id, summary, resources, provider, helpful, not_helpful, created_at, updated_at
"#;

impl Db {
    /// The newest explanation of a question; shared by every answer to it.
    pub async fn explanation_for_question(
        &self,
        question_id: i64,
    ) -> Result<Option<ExplanationModel>> {
        let explanation = sqlx::query_as::<_, ExplanationModel>(&format!(
            "SELECT {EXPLANATION_COLUMNS} FROM explanations WHERE question_id = ? ORDER BY id DESC LIMIT 1"
        ))
        .bind(question_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(explanation)
    }

    pub async fn explanation(&self, explanation_id: i64) -> Result<Option<ExplanationModel>> {
        let explanation = sqlx::query_as::<_, ExplanationModel>(&format!(
            "SELECT {EXPLANATION_COLUMNS} FROM explanations WHERE id = ?"
        ))
        .bind(explanation_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(explanation)
    }

    pub async fn create_explanation(
        &self,
        question_id: i64,
        summary: &str,
        resources: &[Resource],
        provider: &str,
    ) -> Result<ExplanationModel> {
        let now = Utc::now();
        let explanation = sqlx::query_as::<_, ExplanationModel>(&format!(
            r#"
            INSERT INTO explanations (question_id, summary, resources, provider, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?)
            RETURNING {EXPLANATION_COLUMNS}
            "#
        ))
        .bind(question_id)
        .bind(summary)
        .bind(serde_json::to_string(resources)?)
        .bind(provider)
        .bind(now)
        .bind(now)
        .fetch_one(&self.pool)
        .await?;

        tracing::info!(
            "explanation {} created for question {question_id} via {provider}",
            explanation.id
        );
        Ok(explanation)
    }

    pub async fn record_explanation_feedback(
        &self,
        explanation_id: i64,
        helpful: bool,
    ) -> Result<()> {
        let sql = if helpful {
            "UPDATE explanations SET helpful = helpful + 1, updated_at = ? WHERE id = ?"
        } else {
            "UPDATE explanations SET not_helpful = not_helpful + 1, updated_at = ? WHERE id = ?"
        };

        sqlx::query(sql)
            .bind(Utc::now())
            .bind(explanation_id)
            .execute(&self.pool)
            .await?;

        Ok(())
    }
}
