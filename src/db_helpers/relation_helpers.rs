use sqlx::{Sqlite, SqlitePool};

use crate::{
    errors::{is_unique_violation, RequestError},
    models::ShortRecipe,
};

/// Favorites and shopping-list entries behave identically: a (user, recipe)
/// pair that is either absent or present, nothing in between.
#[derive(Debug, Clone, Copy)]
pub enum RecipeRelation {
    Favorite,
    ShoppingCart,
}

impl RecipeRelation {
    fn table(self) -> &'static str {
        match self {
            RecipeRelation::Favorite => "favorites",
            RecipeRelation::ShoppingCart => "shopping_list",
        }
    }

    fn already_present_message(self) -> &'static str {
        match self {
            RecipeRelation::Favorite => "Recipe is already in your favorites",
            RecipeRelation::ShoppingCart => "Recipe is already in your shopping list",
        }
    }

    fn missing_message(self) -> &'static str {
        match self {
            RecipeRelation::Favorite => "Recipe is not in your favorites",
            RecipeRelation::ShoppingCart => "Recipe is not in your shopping list",
        }
    }
}

pub async fn add_recipe_relation_in_db(
    pool: &SqlitePool,
    relation: RecipeRelation,
    user_id: i64,
    recipe_id: i64,
) -> Result<ShortRecipe, RequestError> {
    let recipe = match get_short_recipe(pool, recipe_id).await? {
        Some(recipe) => recipe,
        None => return Err(RequestError::NotFound("Recipe not found")),
    };

    let mut tx = pool.begin().await?;
    let query = format!(
        "INSERT INTO {} (user_id, recipe_id) VALUES (?, ?)",
        relation.table()
    );
    sqlx::query(&query)
        .bind(user_id)
        .bind(recipe_id)
        .execute(&mut tx)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                RequestError::Conflict(relation.already_present_message())
            } else {
                RequestError::DatabaseError(e)
            }
        })?;
    tx.commit().await?;

    Ok(recipe)
}

pub async fn remove_recipe_relation_in_db(
    pool: &SqlitePool,
    relation: RecipeRelation,
    user_id: i64,
    recipe_id: i64,
) -> Result<(), RequestError> {
    if get_short_recipe(pool, recipe_id).await?.is_none() {
        return Err(RequestError::NotFound("Recipe not found"));
    }

    let mut tx = pool.begin().await?;
    let query = format!(
        "DELETE FROM {} WHERE user_id = ? AND recipe_id = ?",
        relation.table()
    );
    let result = sqlx::query(&query)
        .bind(user_id)
        .bind(recipe_id)
        .execute(&mut tx)
        .await?;
    tx.commit().await?;

    if result.rows_affected() == 0 {
        return Err(RequestError::NotFound(relation.missing_message()));
    }
    Ok(())
}

async fn get_short_recipe(
    pool: &SqlitePool,
    recipe_id: i64,
) -> Result<Option<ShortRecipe>, RequestError> {
    let result = sqlx::query_as::<Sqlite, ShortRecipe>(
        r#"
        SELECT id, name, image, cooking_time FROM recipes WHERE id = ?
        "#,
    )
    .bind(recipe_id)
    .fetch_optional(pool)
    .await?;
    Ok(result)
}
