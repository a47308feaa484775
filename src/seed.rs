use std::path::Path;

use anyhow::{bail, Context, Result};
use serde::Deserialize;
use sqlx::SqlitePool;
use tracing::info;

use crate::db_helpers::{get_or_create_ingredient_in_db, get_or_create_tag_in_db};
use crate::validation::is_valid_hex_color;

#[derive(Debug, Deserialize)]
struct IngredientSeed {
    name: String,
    measurement_unit: String,
}

#[derive(Debug, Deserialize)]
struct TagSeed {
    name: String,
    color: String,
    slug: String,
}

/// Loads the ingredient catalogue and tag set from `ingredients.json` and
/// `tags.json` in `data_dir`, creating whatever is not present yet.
/// Returns how many ingredients and tags were created.
pub async fn seed_reference_data(pool: &SqlitePool, data_dir: &Path) -> Result<(u64, u64)> {
    let ingredients: Vec<IngredientSeed> = read_json(&data_dir.join("ingredients.json"))?;
    let mut created_ingredients = 0;
    for ingredient in &ingredients {
        if ingredient.name.trim().is_empty() {
            bail!("Ingredient names can not be empty");
        }
        if get_or_create_ingredient_in_db(pool, &ingredient.name, &ingredient.measurement_unit)
            .await?
        {
            created_ingredients += 1;
        }
    }
    info!(
        "Loaded {} ingredients ({} new)",
        ingredients.len(),
        created_ingredients
    );

    let tags: Vec<TagSeed> = read_json(&data_dir.join("tags.json"))?;
    let mut created_tags = 0;
    for tag in &tags {
        if !is_valid_hex_color(&tag.color) {
            bail!("Tag {} has an invalid HEX color: {}", tag.name, tag.color);
        }
        if get_or_create_tag_in_db(pool, &tag.name, &tag.color, &tag.slug).await? {
            created_tags += 1;
        }
    }
    info!("Loaded {} tags ({} new)", tags.len(), created_tags);

    Ok((created_ingredients, created_tags))
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    serde_json::from_str(&raw).with_context(|| format!("Failed to parse {}", path.display()))
}
