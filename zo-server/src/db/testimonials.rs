//! Testimonial database operations

use shared::models::{Testimonial, TestimonialCreate, TestimonialUpdate};
use shared::util::snowflake_id;
use sqlx::PgPool;

use super::BoxError;

const COLUMNS: &str = "id, client_name, content, rating, image_url, is_visible, created_at";

pub async fn list_testimonials(pool: &PgPool, visible_only: bool) -> Result<Vec<Testimonial>, BoxError> {
    let rows = sqlx::query_as::<_, Testimonial>(&format!(
        "SELECT {COLUMNS} FROM testimonials WHERE NOT $1 OR is_visible ORDER BY created_at DESC"
    ))
    .bind(visible_only)
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

pub async fn create_testimonial(
    pool: &PgPool,
    data: &TestimonialCreate,
    now: i64,
) -> Result<Testimonial, BoxError> {
    let row = sqlx::query_as::<_, Testimonial>(&format!(
        r#"
        INSERT INTO testimonials (id, client_name, content, rating, image_url, is_visible, created_at)
        VALUES ($1, $2, $3, $4, $5, $6, $7)
        RETURNING {COLUMNS}
        "#
    ))
    .bind(snowflake_id())
    .bind(data.client_name.trim())
    .bind(data.content.trim())
    .bind(data.rating)
    .bind(&data.image_url)
    .bind(data.is_visible.unwrap_or(true))
    .bind(now)
    .fetch_one(pool)
    .await?;
    Ok(row)
}

pub async fn update_testimonial(
    pool: &PgPool,
    id: i64,
    data: &TestimonialUpdate,
) -> Result<Option<Testimonial>, BoxError> {
    let row = sqlx::query_as::<_, Testimonial>(&format!(
        r#"
        UPDATE testimonials SET
            client_name = COALESCE($2, client_name),
            content = COALESCE($3, content),
            rating = COALESCE($4, rating),
            image_url = COALESCE($5, image_url),
            is_visible = COALESCE($6, is_visible)
        WHERE id = $1
        RETURNING {COLUMNS}
        "#
    ))
    .bind(id)
    .bind(&data.client_name)
    .bind(&data.content)
    .bind(data.rating)
    .bind(&data.image_url)
    .bind(data.is_visible)
    .fetch_optional(pool)
    .await?;
    Ok(row)
}

pub async fn delete_testimonial(pool: &PgPool, id: i64) -> Result<bool, BoxError> {
    let result = sqlx::query("DELETE FROM testimonials WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}
