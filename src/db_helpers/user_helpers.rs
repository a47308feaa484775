use sqlx::{Sqlite, SqlitePool};

use crate::{
    data_formats::RegisterRequest,
    errors::RequestError,
    models::{User, ROLE_USER},
};

/// Inserts a user whose password has already been hashed by the caller.
/// Everyone registers as a plain user; admin and moderator roles are
/// assigned out of band.
pub async fn insert_user(pool: &SqlitePool, user: &RegisterRequest) -> Result<User, RequestError> {
    let mut tx = pool.begin().await?;
    let user = sqlx::query_as::<Sqlite, User>(
        r#"
        INSERT INTO users (email, username, first_name, last_name, password, role)
        VALUES (?, ?, ?, ?, ?, ?)
        RETURNING id, username, email, password, first_name, last_name, role, created_at
        "#,
    )
    .bind(&user.email)
    .bind(&user.username)
    .bind(&user.first_name)
    .bind(&user.last_name)
    .bind(&user.password)
    .bind(ROLE_USER)
    .fetch_one(&mut tx)
    .await?;
    tx.commit().await?;
    Ok(user)
}

pub async fn list_users_in_db(
    pool: &SqlitePool,
    limit: i64,
    offset: i64,
) -> Result<Vec<User>, RequestError> {
    let result = sqlx::query_as::<Sqlite, User>(
        r#"
        SELECT id, username, email, password, first_name, last_name, role, created_at
        FROM users
        ORDER BY id
        LIMIT ? OFFSET ?
        "#,
    )
    .bind(limit)
    .bind(offset)
    .fetch_all(pool)
    .await?;
    Ok(result)
}
