use std::collections::HashSet;

use crate::data_formats::IngredientAmountRequest;
use crate::errors::RequestError;

/// Checks a recipe payload before anything touches the database. A recipe
/// must carry at least one tag and one ingredient, without duplicates, and
/// every ingredient amount must be at least 1.
pub fn validate_recipe_payload(
    tags: &[i64],
    ingredients: &[IngredientAmountRequest],
) -> Result<(), RequestError> {
    if tags.is_empty() {
        return Err(RequestError::Validation(
            "A recipe needs at least one tag".to_string(),
        ));
    }
    let mut seen_tags = HashSet::new();
    for tag in tags {
        if !seen_tags.insert(tag) {
            return Err(RequestError::Validation(format!(
                "Tag {tag} is listed more than once"
            )));
        }
    }

    if ingredients.is_empty() {
        return Err(RequestError::Validation(
            "A recipe needs at least one ingredient".to_string(),
        ));
    }
    let mut seen_ingredients = HashSet::new();
    for ingredient in ingredients {
        if !seen_ingredients.insert(ingredient.id) {
            return Err(RequestError::Validation(format!(
                "Ingredient {} is listed more than once",
                ingredient.id
            )));
        }
        if ingredient.amount < 1 {
            return Err(RequestError::Validation(format!(
                "Ingredient {} needs an amount of at least 1",
                ingredient.id
            )));
        }
    }

    Ok(())
}

pub fn validate_cooking_time(cooking_time: i64) -> Result<(), RequestError> {
    if cooking_time < 1 {
        return Err(RequestError::Validation(
            "Cooking time must be at least 1 minute".to_string(),
        ));
    }
    Ok(())
}

/// Tag colors are stored as `#RGB` or `#RRGGBB`.
pub fn is_valid_hex_color(color: &str) -> bool {
    let Some(digits) = color.strip_prefix('#') else {
        return false;
    };
    (digits.len() == 3 || digits.len() == 6) && digits.chars().all(|c| c.is_ascii_hexdigit())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ingredient(id: i64, amount: i64) -> IngredientAmountRequest {
        IngredientAmountRequest { id, amount }
    }

    #[test]
    fn accepts_a_minimal_recipe() {
        assert!(validate_recipe_payload(&[1], &[ingredient(1, 1)]).is_ok());
    }

    #[test]
    fn rejects_empty_tag_list() {
        let result = validate_recipe_payload(&[], &[ingredient(1, 1)]);
        assert!(matches!(result, Err(RequestError::Validation(_))));
    }

    #[test]
    fn rejects_duplicate_tags() {
        let result = validate_recipe_payload(&[2, 2], &[ingredient(1, 1)]);
        assert!(matches!(result, Err(RequestError::Validation(_))));
    }

    #[test]
    fn rejects_empty_ingredient_list() {
        let result = validate_recipe_payload(&[1], &[]);
        assert!(matches!(result, Err(RequestError::Validation(_))));
    }

    #[test]
    fn rejects_duplicate_ingredients() {
        let result = validate_recipe_payload(&[1], &[ingredient(3, 1), ingredient(3, 2)]);
        assert!(matches!(result, Err(RequestError::Validation(_))));
    }

    #[test]
    fn rejects_zero_amount() {
        let result = validate_recipe_payload(&[1], &[ingredient(3, 0)]);
        assert!(matches!(result, Err(RequestError::Validation(_))));
    }

    #[test]
    fn rejects_cooking_time_below_one_minute() {
        assert!(validate_cooking_time(0).is_err());
        assert!(validate_cooking_time(1).is_ok());
    }

    #[test]
    fn hex_colors() {
        assert!(is_valid_hex_color("#E26C2D"));
        assert!(is_valid_hex_color("#fff"));
        assert!(!is_valid_hex_color("E26C2D"));
        assert!(!is_valid_hex_color("#E26C2"));
        assert!(!is_valid_hex_color("#GGGGGG"));
    }
}
