use sqlx::{Sqlite, SqlitePool, Transaction};

use crate::data_formats::{IngredientAmountRequest, RecipeFilterParams, RecipeRequest};
use crate::errors::RequestError;
use crate::models::{Recipe, RecipeIngredient, ShortRecipe, Tag, User};

/// Shared SELECT for recipe rows. The three leading binds are the viewer id
/// (or NULL for anonymous viewers, which makes every EXISTS come out false).
const RECIPE_SELECT: &str = r#"
        SELECT recipes.id           AS id,
               recipes.name         AS name,
               recipes.image        AS image,
               recipes.text         AS text,
               recipes.cooking_time AS cooking_time,
               recipes.pub_date     AS pub_date,
               users.id             AS author_id,
               users.username       AS author_username,
               users.email          AS author_email,
               users.first_name     AS author_first_name,
               users.last_name      AS author_last_name,
               EXISTS (SELECT 1
                       FROM follows
                       WHERE follows.user_id = ?
                         AND follows.author_id = recipes.author_id) AS is_subscribed,
               EXISTS (SELECT 1
                       FROM favorites
                       WHERE favorites.user_id = ?
                         AND favorites.recipe_id = recipes.id)      AS is_favorited,
               EXISTS (SELECT 1
                       FROM shopping_list
                       WHERE shopping_list.user_id = ?
                         AND shopping_list.recipe_id = recipes.id)  AS is_in_shopping_cart
        FROM recipes
        JOIN users ON users.id = recipes.author_id
"#;

pub async fn list_recipes_in_db(
    pool: &SqlitePool,
    viewer: Option<i64>,
    filters: &RecipeFilterParams,
) -> Result<Vec<Recipe>, RequestError> {
    let mut query = String::from(RECIPE_SELECT);
    let mut clauses: Vec<String> = Vec::new();

    if filters.author.is_some() {
        clauses.push("recipes.author_id = ?".to_string());
    }
    if !filters.tags.is_empty() {
        let placeholders = vec!["?"; filters.tags.len()].join(", ");
        clauses.push(format!(
            "EXISTS (SELECT 1 FROM recipe_tags \
             JOIN tags ON tags.id = recipe_tags.tag_id \
             WHERE recipe_tags.recipe_id = recipes.id AND tags.slug IN ({placeholders}))"
        ));
    }
    // The two viewer-scoped filters are no-ops for anonymous callers.
    let favorited_filter = filters.is_favorited && viewer.is_some();
    if favorited_filter {
        clauses.push(
            "EXISTS (SELECT 1 FROM favorites \
             WHERE favorites.user_id = ? AND favorites.recipe_id = recipes.id)"
                .to_string(),
        );
    }
    let cart_filter = filters.is_in_shopping_cart && viewer.is_some();
    if cart_filter {
        clauses.push(
            "EXISTS (SELECT 1 FROM shopping_list \
             WHERE shopping_list.user_id = ? AND shopping_list.recipe_id = recipes.id)"
                .to_string(),
        );
    }

    if !clauses.is_empty() {
        query.push_str(" WHERE ");
        query.push_str(&clauses.join(" AND "));
    }
    query.push_str(" ORDER BY recipes.pub_date DESC, recipes.id DESC LIMIT ? OFFSET ?");

    let mut result = sqlx::query_as::<Sqlite, Recipe>(&query)
        .bind(viewer)
        .bind(viewer)
        .bind(viewer);
    if let Some(author) = filters.author {
        result = result.bind(author);
    }
    for slug in &filters.tags {
        result = result.bind(slug.clone());
    }
    if favorited_filter {
        result = result.bind(viewer);
    }
    if cart_filter {
        result = result.bind(viewer);
    }
    let result = result
        .bind(filters.limit as i64)
        .bind(filters.offset as i64)
        .fetch_all(pool)
        .await?;

    Ok(result)
}

pub async fn get_recipe_by_id_in_db(
    pool: &SqlitePool,
    viewer: Option<i64>,
    recipe_id: i64,
) -> Result<Option<Recipe>, RequestError> {
    let query = format!("{RECIPE_SELECT} WHERE recipes.id = ?");
    let result = sqlx::query_as::<Sqlite, Recipe>(&query)
        .bind(viewer)
        .bind(viewer)
        .bind(viewer)
        .bind(recipe_id)
        .fetch_optional(pool)
        .await?;
    Ok(result)
}

pub async fn get_tags_for_recipe_in_db(
    pool: &SqlitePool,
    recipe_id: i64,
) -> Result<Vec<Tag>, RequestError> {
    let result = sqlx::query_as::<Sqlite, Tag>(
        r#"
        SELECT tags.id, tags.name, tags.color, tags.slug
        FROM tags
        JOIN recipe_tags ON recipe_tags.tag_id = tags.id
        WHERE recipe_tags.recipe_id = ?
        ORDER BY tags.id
        "#,
    )
    .bind(recipe_id)
    .fetch_all(pool)
    .await?;
    Ok(result)
}

pub async fn get_ingredients_for_recipe_in_db(
    pool: &SqlitePool,
    recipe_id: i64,
) -> Result<Vec<RecipeIngredient>, RequestError> {
    let result = sqlx::query_as::<Sqlite, RecipeIngredient>(
        r#"
        SELECT ingredients.id               AS id,
               ingredients.name             AS name,
               ingredients.measurement_unit AS measurement_unit,
               recipe_ingredients.amount    AS amount
        FROM recipe_ingredients
        JOIN ingredients ON ingredients.id = recipe_ingredients.ingredient_id
        WHERE recipe_ingredients.recipe_id = ?
        ORDER BY ingredients.id
        "#,
    )
    .bind(recipe_id)
    .fetch_all(pool)
    .await?;
    Ok(result)
}

/// Inserts the recipe row plus its tag links and ingredient amounts in one
/// transaction; nothing is written when any referenced id is unknown.
pub async fn create_recipe_in_db(
    pool: &SqlitePool,
    author_id: i64,
    request: &RecipeRequest,
) -> Result<i64, RequestError> {
    let mut tx = pool.begin().await?;
    ensure_tags_exist(&mut tx, &request.tags).await?;
    ensure_ingredients_exist(&mut tx, &request.ingredients).await?;

    let recipe_id = sqlx::query_scalar::<Sqlite, i64>(
        r#"
        INSERT INTO recipes (author_id, name, image, text, cooking_time)
        VALUES (?, ?, ?, ?, ?)
        RETURNING id
        "#,
    )
    .bind(author_id)
    .bind(&request.name)
    .bind(&request.image)
    .bind(&request.text)
    .bind(request.cooking_time)
    .fetch_one(&mut tx)
    .await?;

    insert_recipe_components(&mut tx, recipe_id, request).await?;
    tx.commit().await?;

    Ok(recipe_id)
}

/// Replaces the whole tag and ingredient sets (clear-then-recreate) and
/// updates the editable columns. `pub_date` is set once on insert and never
/// touched here.
pub async fn update_recipe_in_db(
    pool: &SqlitePool,
    actor: &User,
    recipe_id: i64,
    request: &RecipeRequest,
) -> Result<(), RequestError> {
    check_recipe_write_access(pool, actor, recipe_id).await?;

    let mut tx = pool.begin().await?;
    ensure_tags_exist(&mut tx, &request.tags).await?;
    ensure_ingredients_exist(&mut tx, &request.ingredients).await?;

    sqlx::query(
        r#"
        UPDATE recipes SET name = ?, image = ?, text = ?, cooking_time = ?
        WHERE id = ?
        "#,
    )
    .bind(&request.name)
    .bind(&request.image)
    .bind(&request.text)
    .bind(request.cooking_time)
    .bind(recipe_id)
    .execute(&mut tx)
    .await?;

    sqlx::query("DELETE FROM recipe_tags WHERE recipe_id = ?")
        .bind(recipe_id)
        .execute(&mut tx)
        .await?;
    sqlx::query("DELETE FROM recipe_ingredients WHERE recipe_id = ?")
        .bind(recipe_id)
        .execute(&mut tx)
        .await?;

    insert_recipe_components(&mut tx, recipe_id, request).await?;
    tx.commit().await?;

    Ok(())
}

pub async fn delete_recipe_in_db(
    pool: &SqlitePool,
    actor: &User,
    recipe_id: i64,
) -> Result<(), RequestError> {
    check_recipe_write_access(pool, actor, recipe_id).await?;

    let mut tx = pool.begin().await?;
    sqlx::query("DELETE FROM recipes WHERE id = ?")
        .bind(recipe_id)
        .execute(&mut tx)
        .await?;
    tx.commit().await?;
    Ok(())
}

pub async fn list_short_recipes_by_author_in_db(
    pool: &SqlitePool,
    author_id: i64,
    limit: Option<i64>,
) -> Result<Vec<ShortRecipe>, RequestError> {
    let result = sqlx::query_as::<Sqlite, ShortRecipe>(
        r#"
        SELECT id, name, image, cooking_time
        FROM recipes
        WHERE author_id = ?
        ORDER BY pub_date DESC, id DESC
        LIMIT ?
        "#,
    )
    .bind(author_id)
    // A negative LIMIT means unbounded in SQLite.
    .bind(limit.unwrap_or(-1))
    .fetch_all(pool)
    .await?;
    Ok(result)
}

pub async fn count_recipes_by_author_in_db(
    pool: &SqlitePool,
    author_id: i64,
) -> Result<i64, RequestError> {
    let result = sqlx::query_scalar::<Sqlite, i64>("SELECT COUNT(*) FROM recipes WHERE author_id = ?")
        .bind(author_id)
        .fetch_one(pool)
        .await?;
    Ok(result)
}

/// Recipe mutations are restricted to the author or an admin.
async fn check_recipe_write_access(
    pool: &SqlitePool,
    actor: &User,
    recipe_id: i64,
) -> Result<(), RequestError> {
    let author_id = match super::get_recipe_author_id(pool, recipe_id).await? {
        Some(author_id) => author_id,
        None => return Err(RequestError::NotFound("Recipe not found")),
    };
    if author_id != actor.id && !actor.is_admin() {
        return Err(RequestError::Forbidden(
            "Only the author can modify this recipe",
        ));
    }
    Ok(())
}

async fn insert_recipe_components(
    tx: &mut Transaction<'_, Sqlite>,
    recipe_id: i64,
    request: &RecipeRequest,
) -> Result<(), RequestError> {
    for tag_id in &request.tags {
        sqlx::query(
            r#"
            INSERT INTO recipe_tags (recipe_id, tag_id) VALUES (?, ?)
            "#,
        )
        .bind(recipe_id)
        .bind(*tag_id)
        .execute(&mut *tx)
        .await?;
    }
    for ingredient in &request.ingredients {
        sqlx::query(
            r#"
            INSERT INTO recipe_ingredients (recipe_id, ingredient_id, amount) VALUES (?, ?, ?)
            "#,
        )
        .bind(recipe_id)
        .bind(ingredient.id)
        .bind(ingredient.amount)
        .execute(&mut *tx)
        .await?;
    }
    Ok(())
}

async fn ensure_tags_exist(
    tx: &mut Transaction<'_, Sqlite>,
    tags: &[i64],
) -> Result<(), RequestError> {
    let placeholders = vec!["?"; tags.len()].join(", ");
    let query = format!("SELECT COUNT(*) FROM tags WHERE id IN ({placeholders})");
    let mut found = sqlx::query_scalar::<Sqlite, i64>(&query);
    for tag_id in tags {
        found = found.bind(*tag_id);
    }
    let found = found.fetch_one(&mut *tx).await?;
    if found as usize != tags.len() {
        return Err(RequestError::Validation(
            "The recipe references an unknown tag".to_string(),
        ));
    }
    Ok(())
}

async fn ensure_ingredients_exist(
    tx: &mut Transaction<'_, Sqlite>,
    ingredients: &[IngredientAmountRequest],
) -> Result<(), RequestError> {
    let placeholders = vec!["?"; ingredients.len()].join(", ");
    let query = format!("SELECT COUNT(*) FROM ingredients WHERE id IN ({placeholders})");
    let mut found = sqlx::query_scalar::<Sqlite, i64>(&query);
    for ingredient in ingredients {
        found = found.bind(ingredient.id);
    }
    let found = found.fetch_one(&mut *tx).await?;
    if found as usize != ingredients.len() {
        return Err(RequestError::Validation(
            "The recipe references an unknown ingredient".to_string(),
        ));
    }
    Ok(())
}
