use color_eyre::Result;

use super::models::{Category, Subcategory};
use super::Db;
use crate::utils::slugify;

impl Db {
    /// Insert a category; an empty slug is derived from the name.
    pub async fn create_category(
        &self,
        name: &str,
        slug: &str,
        description: &str,
        icon: &str,
    ) -> Result<i64> {
        let slug = if slug.trim().is_empty() {
            slugify(name)
        } else {
            slugify(slug)
        };

        let id: i64 = sqlx::query_scalar(
            "INSERT INTO categories (name, slug, description, icon) VALUES (?, ?, ?, ?) RETURNING id",
        )
        .bind(name.trim())
        .bind(&slug)
        .bind(description)
        .bind(icon)
        .fetch_one(&self.pool)
        .await?;

        tracing::info!("category created: id={id}, slug={slug}");
        Ok(id)
    }

    pub async fn categories(&self) -> Result<Vec<Category>> {
        let categories = sqlx::query_as::<_, Category>(
            "SELECT id, name, slug, description, icon FROM categories ORDER BY name",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(categories)
    }

    pub async fn category(&self, category_id: i64) -> Result<Option<Category>> {
        let category = sqlx::query_as::<_, Category>(
            "SELECT id, name, slug, description, icon FROM categories WHERE id = ?",
        )
        .bind(category_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(category)
    }

    pub async fn category_by_slug(&self, slug: &str) -> Result<Option<Category>> {
        let category = sqlx::query_as::<_, Category>(
            "SELECT id, name, slug, description, icon FROM categories WHERE slug = ?",
        )
        .bind(slug)
        .fetch_optional(&self.pool)
        .await?;

        Ok(category)
    }

    /// Insert a subcategory under `category_id`; an empty slug is derived from the name.
    pub async fn create_subcategory(
        &self,
        category_id: i64,
        name: &str,
        slug: &str,
        description: &str,
        icon: &str,
    ) -> Result<i64> {
        let slug = if slug.trim().is_empty() {
            slugify(name)
        } else {
            slugify(slug)
        };

        let id: i64 = sqlx::query_scalar(
            r#"
            INSERT INTO subcategories (category_id, name, slug, description, icon)
            VALUES (?, ?, ?, ?, ?)
            RETURNING id
            "#,
        )
        .bind(category_id)
        .bind(name.trim())
        .bind(&slug)
        .bind(description)
        .bind(icon)
        .fetch_one(&self.pool)
        .await?;

        tracing::info!("subcategory created: id={id}, category_id={category_id}, slug={slug}");
        Ok(id)
    }

    /// Subcategories of a category ordered by name, optionally filtered by a
    /// case-insensitive name fragment. `quiz_count` counts published quizzes.
    pub async fn subcategories(
        &self,
        category_id: i64,
        filter: Option<&str>,
    ) -> Result<Vec<Subcategory>> {
        let pattern = filter
            .map(str::trim)
            .filter(|f| !f.is_empty())
            .map(|f| format!("%{}%", f.to_lowercase()));

        let subcategories = sqlx::query_as::<_, Subcategory>(
            r#"
            SELECT
                s.id, s.category_id, s.name, s.slug, s.description, s.icon,
                (SELECT COUNT(*) FROM quizzes q
                 WHERE q.subcategory_id = s.id AND q.is_published = 1) AS quiz_count
            FROM subcategories s
            WHERE s.category_id = ?
              AND (? IS NULL OR LOWER(s.name) LIKE ?)
            ORDER BY s.name
            "#,
        )
        .bind(category_id)
        .bind(&pattern)
        .bind(&pattern)
        .fetch_all(&self.pool)
        .await?;

        Ok(subcategories)
    }

    /// A subcategory, only when it belongs to `category_id`.
    pub async fn subcategory_in_category(
        &self,
        subcategory_id: i64,
        category_id: i64,
    ) -> Result<Option<Subcategory>> {
        let subcategory = sqlx::query_as::<_, Subcategory>(
            r#"
            SELECT s.id, s.category_id, s.name, s.slug, s.description, s.icon, 0 AS quiz_count
            FROM subcategories s
            WHERE s.id = ? AND s.category_id = ?
            "#,
        )
        .bind(subcategory_id)
        .bind(category_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(subcategory)
    }

    pub async fn subcategory(&self, subcategory_id: i64) -> Result<Option<Subcategory>> {
        let subcategory = sqlx::query_as::<_, Subcategory>(
            r#"
            SELECT s.id, s.category_id, s.name, s.slug, s.description, s.icon, 0 AS quiz_count
            FROM subcategories s
            WHERE s.id = ?
            "#,
        )
        .bind(subcategory_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(subcategory)
    }

    pub async fn subcategory_parent(&self, subcategory_id: i64) -> Result<Option<i64>> {
        let category_id: Option<i64> =
            sqlx::query_scalar("SELECT category_id FROM subcategories WHERE id = ?")
                .bind(subcategory_id)
                .fetch_optional(&self.pool)
                .await?;

        Ok(category_id)
    }
}
