use serde::{Deserialize, Serialize};

use crate::models::{Ingredient, PurchaseItem, Recipe, RecipeIngredient, ShortRecipe, Tag, User};

#[derive(Deserialize, Serialize, Debug)]
pub struct TokenResponse {
    pub token: String,
}

#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct UserResponse {
    pub id: i64,
    pub email: String,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub is_subscribed: bool,
}

#[derive(Deserialize, Serialize, Debug)]
pub struct TagResponse {
    pub id: i64,
    pub name: String,
    pub color: String,
    pub slug: String,
}

#[derive(Deserialize, Serialize, Debug)]
pub struct IngredientResponse {
    pub id: i64,
    pub name: String,
    pub measurement_unit: String,
}

#[derive(Deserialize, Serialize, Debug)]
pub struct RecipeIngredientResponse {
    pub id: i64,
    pub name: String,
    pub measurement_unit: String,
    pub amount: i64,
}

#[derive(Deserialize, Serialize, Debug)]
pub struct RecipeResponse {
    pub id: i64,
    pub author: UserResponse,
    pub name: String,
    pub image: Option<String>,
    pub text: String,
    pub cooking_time: i64,
    pub pub_date: String,
    pub tags: Vec<TagResponse>,
    pub ingredients: Vec<RecipeIngredientResponse>,
    pub is_favorited: bool,
    pub is_in_shopping_cart: bool,
}

#[derive(Deserialize, Serialize, Debug)]
pub struct ShortRecipeResponse {
    pub id: i64,
    pub name: String,
    pub image: Option<String>,
    pub cooking_time: i64,
}

/// A followed author together with a peek at their recipes, as served by
/// the subscriptions listing.
#[derive(Deserialize, Serialize, Debug)]
pub struct SubscriptionResponse {
    pub id: i64,
    pub email: String,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub is_subscribed: bool,
    pub recipes: Vec<ShortRecipeResponse>,
    pub recipes_count: i64,
}

impl UserResponse {
    pub fn new(
        User {
            id,
            username,
            email,
            first_name,
            last_name,
            ..
        }: User,
        is_subscribed: bool,
    ) -> Self {
        UserResponse {
            id,
            email,
            username,
            first_name,
            last_name,
            is_subscribed,
        }
    }
}

impl From<Tag> for TagResponse {
    fn from(Tag {
        id,
        name,
        color,
        slug,
    }: Tag) -> Self {
        TagResponse {
            id,
            name,
            color,
            slug,
        }
    }
}

impl From<Ingredient> for IngredientResponse {
    fn from(
        Ingredient {
            id,
            name,
            measurement_unit,
        }: Ingredient,
    ) -> Self {
        IngredientResponse {
            id,
            name,
            measurement_unit,
        }
    }
}

impl From<RecipeIngredient> for RecipeIngredientResponse {
    fn from(
        RecipeIngredient {
            id,
            name,
            measurement_unit,
            amount,
        }: RecipeIngredient,
    ) -> Self {
        RecipeIngredientResponse {
            id,
            name,
            measurement_unit,
            amount,
        }
    }
}

impl From<ShortRecipe> for ShortRecipeResponse {
    fn from(
        ShortRecipe {
            id,
            name,
            image,
            cooking_time,
        }: ShortRecipe,
    ) -> Self {
        ShortRecipeResponse {
            id,
            name,
            image,
            cooking_time,
        }
    }
}

impl RecipeResponse {
    pub fn new(recipe: Recipe, tags: Vec<Tag>, ingredients: Vec<RecipeIngredient>) -> Self {
        let Recipe {
            id,
            name,
            image,
            text,
            cooking_time,
            pub_date,
            author_id,
            author_username,
            author_email,
            author_first_name,
            author_last_name,
            is_subscribed,
            is_favorited,
            is_in_shopping_cart,
        } = recipe;
        RecipeResponse {
            id,
            author: UserResponse {
                id: author_id,
                email: author_email,
                username: author_username,
                first_name: author_first_name,
                last_name: author_last_name,
                is_subscribed,
            },
            name,
            image,
            text,
            cooking_time,
            pub_date: pub_date.to_string(),
            tags: tags.into_iter().map(TagResponse::from).collect(),
            ingredients: ingredients
                .into_iter()
                .map(RecipeIngredientResponse::from)
                .collect(),
            is_favorited,
            is_in_shopping_cart,
        }
    }
}

impl SubscriptionResponse {
    pub fn new(author: User, recipes: Vec<ShortRecipe>, recipes_count: i64) -> Self {
        let UserResponse {
            id,
            email,
            username,
            first_name,
            last_name,
            ..
        } = UserResponse::new(author, true);
        SubscriptionResponse {
            id,
            email,
            username,
            first_name,
            last_name,
            is_subscribed: true,
            recipes: recipes.into_iter().map(ShortRecipeResponse::from).collect(),
            recipes_count,
        }
    }
}

/// Shopping-list document, one aggregated line per (name, unit) group.
pub fn render_shopping_list(owner: &str, items: &[PurchaseItem]) -> String {
    let mut document = format!("Shopping list for {owner}\n\n");
    for item in items {
        document.push_str(&format!(
            "- {} ({}) - {}\n",
            item.name, item.measurement_unit, item.total_amount
        ));
    }
    document
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shopping_list_renders_one_line_per_group() {
        let items = vec![
            PurchaseItem {
                name: "salt".to_string(),
                measurement_unit: "g".to_string(),
                total_amount: 15,
            },
            PurchaseItem {
                name: "milk".to_string(),
                measurement_unit: "ml".to_string(),
                total_amount: 200,
            },
        ];
        let document = render_shopping_list("Ada Lovelace", &items);
        assert!(document.starts_with("Shopping list for Ada Lovelace\n"));
        assert_eq!(document.matches("salt (g) - 15").count(), 1);
        assert!(document.contains("milk (ml) - 200"));
    }

    #[test]
    fn empty_shopping_list_still_has_a_header() {
        let document = render_shopping_list("Ada Lovelace", &[]);
        assert_eq!(document, "Shopping list for Ada Lovelace\n\n");
    }
}
