use sqlx::{Sqlite, SqlitePool};

use crate::{
    errors::{is_unique_violation, RequestError},
    models::User,
};

use super::get_user_by_id;

pub async fn follow_author_in_db(
    pool: &SqlitePool,
    user_id: i64,
    author_id: i64,
) -> Result<User, RequestError> {
    let author = match get_user_by_id(pool, author_id).await? {
        Some(author) => author,
        None => return Err(RequestError::NotFound("User not found")),
    };
    if user_id == author_id {
        return Err(RequestError::Validation(
            "You can not subscribe to yourself".to_string(),
        ));
    }

    let mut tx = pool.begin().await?;
    sqlx::query(
        r#"
        INSERT INTO follows (user_id, author_id)
        VALUES (?, ?)
        "#,
    )
    .bind(user_id)
    .bind(author_id)
    .execute(&mut tx)
    .await
    .map_err(|e| {
        if is_unique_violation(&e) {
            RequestError::Conflict("You are already subscribed to this author")
        } else {
            RequestError::DatabaseError(e)
        }
    })?;
    tx.commit().await?;

    Ok(author)
}

pub async fn unfollow_author_in_db(
    pool: &SqlitePool,
    user_id: i64,
    author_id: i64,
) -> Result<(), RequestError> {
    if get_user_by_id(pool, author_id).await?.is_none() {
        return Err(RequestError::NotFound("User not found"));
    }

    let mut tx = pool.begin().await?;
    let result = sqlx::query(
        r#"
        DELETE FROM follows WHERE user_id = ? AND author_id = ?
        "#,
    )
    .bind(user_id)
    .bind(author_id)
    .execute(&mut tx)
    .await?;
    tx.commit().await?;

    if result.rows_affected() == 0 {
        return Err(RequestError::NotFound(
            "You are not subscribed to this author",
        ));
    }
    Ok(())
}

/// Anonymous viewers are never subscribed to anyone.
pub async fn is_following_in_db(
    pool: &SqlitePool,
    user_id: Option<i64>,
    author_id: i64,
) -> Result<bool, RequestError> {
    let user_id = match user_id {
        Some(user_id) => user_id,
        None => return Ok(false),
    };
    let found = sqlx::query_scalar::<Sqlite, i64>(
        r#"
        SELECT EXISTS (SELECT 1 FROM follows WHERE user_id = ? AND author_id = ?)
        "#,
    )
    .bind(user_id)
    .bind(author_id)
    .fetch_one(pool)
    .await?;
    Ok(found != 0)
}

pub async fn list_followed_authors_in_db(
    pool: &SqlitePool,
    user_id: i64,
    limit: i64,
    offset: i64,
) -> Result<Vec<User>, RequestError> {
    let result = sqlx::query_as::<Sqlite, User>(
        r#"
        SELECT users.id, users.username, users.email, users.password,
               users.first_name, users.last_name, users.role, users.created_at
        FROM users
        JOIN follows ON follows.author_id = users.id
        WHERE follows.user_id = ?
        ORDER BY users.username
        LIMIT ? OFFSET ?
        "#,
    )
    .bind(user_id)
    .bind(limit)
    .bind(offset)
    .fetch_all(pool)
    .await?;
    Ok(result)
}
