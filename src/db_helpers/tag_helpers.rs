use sqlx::{Sqlite, SqlitePool};

use crate::{errors::RequestError, models::Tag};

pub async fn list_tags_in_db(pool: &SqlitePool) -> Result<Vec<Tag>, RequestError> {
    let result = sqlx::query_as::<Sqlite, Tag>(
        r#"
        SELECT id, name, color, slug FROM tags ORDER BY id
        "#,
    )
    .fetch_all(pool)
    .await?;
    Ok(result)
}

pub async fn get_tag_by_id_in_db(pool: &SqlitePool, id: i64) -> Result<Tag, RequestError> {
    let result = sqlx::query_as::<Sqlite, Tag>(
        r#"
        SELECT id, name, color, slug FROM tags WHERE id = ?
        "#,
    )
    .bind(id)
    .fetch_optional(pool)
    .await?;
    match result {
        Some(tag) => Ok(tag),
        None => Err(RequestError::NotFound("Tag not found")),
    }
}

/// Returns true when a new tag was created. Existing tags are matched by
/// name and left untouched.
pub async fn get_or_create_tag_in_db(
    pool: &SqlitePool,
    name: &str,
    color: &str,
    slug: &str,
) -> Result<bool, sqlx::Error> {
    let mut tx = pool.begin().await?;
    let result = sqlx::query(
        r#"
        INSERT INTO tags (name, color, slug)
        VALUES (?, ?, ?)
        ON CONFLICT (name) DO NOTHING
        "#,
    )
    .bind(name)
    .bind(color)
    .bind(slug)
    .execute(&mut tx)
    .await?;
    tx.commit().await?;
    Ok(result.rows_affected() > 0)
}
