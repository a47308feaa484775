use sqlx::{Sqlite, SqlitePool};

use crate::{errors::RequestError, models::PurchaseItem};

/// Collects every ingredient of every recipe in one user's shopping list,
/// summed per (name, measurement unit) group. The WHERE clause scopes the
/// join to the requesting user; rows from other users' lists must never
/// appear here.
pub async fn aggregate_shopping_list_in_db(
    pool: &SqlitePool,
    user_id: i64,
) -> Result<Vec<PurchaseItem>, RequestError> {
    let result = sqlx::query_as::<Sqlite, PurchaseItem>(
        r#"
        SELECT ingredients.name              AS name,
               ingredients.measurement_unit  AS measurement_unit,
               SUM(recipe_ingredients.amount) AS total_amount
        FROM recipe_ingredients
        JOIN ingredients ON ingredients.id = recipe_ingredients.ingredient_id
        JOIN shopping_list ON shopping_list.recipe_id = recipe_ingredients.recipe_id
        WHERE shopping_list.user_id = ?
        GROUP BY ingredients.name, ingredients.measurement_unit
        ORDER BY ingredients.name, ingredients.measurement_unit
        "#,
    )
    .bind(user_id)
    .fetch_all(pool)
    .await?;
    Ok(result)
}
