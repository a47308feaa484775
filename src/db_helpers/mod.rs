use sqlx::{Sqlite, SqlitePool};

use crate::{errors::RequestError, models::User};

mod follow_helpers;
mod ingredient_helpers;
mod recipe_helpers;
mod relation_helpers;
mod shopping_list_helpers;
mod tag_helpers;
mod user_helpers;

pub use follow_helpers::*;
pub use ingredient_helpers::*;
pub use recipe_helpers::*;
pub use relation_helpers::*;
pub use shopping_list_helpers::*;
pub use tag_helpers::*;
pub use user_helpers::*;

const USER_SELECT: &str = r#"
        SELECT id, username, email, password, first_name, last_name, role, created_at
        FROM users
"#;

// ----------------- Helper Functions -----------------

pub async fn get_user_by_id(pool: &SqlitePool, id: i64) -> Result<Option<User>, RequestError> {
    let query = format!("{USER_SELECT} WHERE id = ?");
    let result = sqlx::query_as::<Sqlite, User>(&query)
        .bind(id)
        .fetch_optional(pool)
        .await?;
    Ok(result)
}

pub async fn get_user_by_email(
    pool: &SqlitePool,
    email: &str,
) -> Result<Option<User>, RequestError> {
    let query = format!("{USER_SELECT} WHERE email = ?");
    let result = sqlx::query_as::<Sqlite, User>(&query)
        .bind(email)
        .fetch_optional(pool)
        .await?;
    Ok(result)
}

pub async fn get_recipe_author_id(
    pool: &SqlitePool,
    recipe_id: i64,
) -> Result<Option<i64>, RequestError> {
    let result = sqlx::query_scalar::<Sqlite, i64>("SELECT author_id FROM recipes WHERE id = ?")
        .bind(recipe_id)
        .fetch_optional(pool)
        .await?;
    Ok(result)
}
