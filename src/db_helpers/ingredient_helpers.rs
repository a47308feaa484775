use sqlx::{Sqlite, SqlitePool};

use crate::{errors::RequestError, models::Ingredient};

/// Without a prefix the whole catalogue is returned; with one, the match is
/// anchored at the start of the name, not a substring search.
pub async fn list_ingredients_in_db(
    pool: &SqlitePool,
    name_prefix: Option<&str>,
) -> Result<Vec<Ingredient>, RequestError> {
    let result = match name_prefix {
        Some(prefix) => {
            sqlx::query_as::<Sqlite, Ingredient>(
                r#"
                SELECT id, name, measurement_unit
                FROM ingredients
                WHERE name LIKE ? || '%'
                ORDER BY name
                "#,
            )
            .bind(prefix)
            .fetch_all(pool)
            .await?
        }
        None => {
            sqlx::query_as::<Sqlite, Ingredient>(
                r#"
                SELECT id, name, measurement_unit FROM ingredients ORDER BY name
                "#,
            )
            .fetch_all(pool)
            .await?
        }
    };
    Ok(result)
}

pub async fn get_ingredient_by_id_in_db(
    pool: &SqlitePool,
    id: i64,
) -> Result<Ingredient, RequestError> {
    let result = sqlx::query_as::<Sqlite, Ingredient>(
        r#"
        SELECT id, name, measurement_unit FROM ingredients WHERE id = ?
        "#,
    )
    .bind(id)
    .fetch_optional(pool)
    .await?;
    match result {
        Some(ingredient) => Ok(ingredient),
        None => Err(RequestError::NotFound("Ingredient not found")),
    }
}

/// Returns true when a new ingredient was created; an ingredient is
/// identified by its (name, measurement unit) pair.
pub async fn get_or_create_ingredient_in_db(
    pool: &SqlitePool,
    name: &str,
    measurement_unit: &str,
) -> Result<bool, sqlx::Error> {
    let mut tx = pool.begin().await?;
    let existing = sqlx::query_scalar::<Sqlite, i64>(
        r#"
        SELECT EXISTS (SELECT 1 FROM ingredients WHERE name = ? AND measurement_unit = ?)
        "#,
    )
    .bind(name)
    .bind(measurement_unit)
    .fetch_one(&mut tx)
    .await?;
    if existing != 0 {
        tx.commit().await?;
        return Ok(false);
    }
    sqlx::query(
        r#"
        INSERT INTO ingredients (name, measurement_unit) VALUES (?, ?)
        "#,
    )
    .bind(name)
    .bind(measurement_unit)
    .execute(&mut tx)
    .await?;
    tx.commit().await?;
    Ok(true)
}
