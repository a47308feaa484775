mod request;
mod response;
mod wrapper;

pub use request::*;
pub use response::*;
pub use wrapper::*;

use serde::{Deserialize, Serialize};

#[derive(Deserialize, Serialize, Debug)]
pub struct PaginationParams {
    #[serde(default = "get_default_limit")]
    pub limit: u32,
    #[serde(default)]
    pub offset: u32,
}

#[derive(Deserialize, Serialize, Debug)]
pub struct IngredientQueryParams {
    #[serde(default)]
    pub name: Option<String>,
}

#[derive(Deserialize, Serialize, Debug)]
pub struct SubscriptionQueryParams {
    #[serde(default = "get_default_limit")]
    pub limit: u32,
    #[serde(default)]
    pub offset: u32,
    #[serde(default)]
    pub recipes_limit: Option<i64>,
}

/// Recipe list filters. `tags` may appear several times in the query string
/// with OR semantics, which a plain key/value map would collapse, so the
/// handler extracts the raw pair list and folds it through
/// [`parse_recipe_filters`].
#[derive(Debug, Default, PartialEq, Eq)]
pub struct RecipeFilterParams {
    pub tags: Vec<String>,
    pub author: Option<i64>,
    pub is_favorited: bool,
    pub is_in_shopping_cart: bool,
    pub limit: u32,
    pub offset: u32,
}

pub fn parse_recipe_filters(pairs: &[(String, String)]) -> RecipeFilterParams {
    let mut filters = RecipeFilterParams {
        limit: get_default_limit(),
        ..RecipeFilterParams::default()
    };
    for (key, value) in pairs {
        match key.as_str() {
            "tags" => filters.tags.push(value.clone()),
            "author" => filters.author = value.parse().ok(),
            "is_favorited" => filters.is_favorited = parse_flag(value),
            "is_in_shopping_cart" => filters.is_in_shopping_cart = parse_flag(value),
            "limit" => {
                if let Ok(limit) = value.parse() {
                    filters.limit = limit;
                }
            }
            "offset" => {
                if let Ok(offset) = value.parse() {
                    filters.offset = offset;
                }
            }
            _ => (),
        }
    }
    filters
}

fn parse_flag(value: &str) -> bool {
    matches!(value, "1" | "true" | "True")
}

fn get_default_limit() -> u32 {
    20
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pairs(raw: &[(&str, &str)]) -> Vec<(String, String)> {
        raw.iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn repeated_tags_collect_into_a_list() {
        let filters = parse_recipe_filters(&pairs(&[("tags", "breakfast"), ("tags", "vegan")]));
        assert_eq!(filters.tags, vec!["breakfast", "vegan"]);
    }

    #[test]
    fn boolean_flags_accept_one_and_true() {
        let filters = parse_recipe_filters(&pairs(&[
            ("is_favorited", "1"),
            ("is_in_shopping_cart", "true"),
        ]));
        assert!(filters.is_favorited);
        assert!(filters.is_in_shopping_cart);

        let filters = parse_recipe_filters(&pairs(&[("is_favorited", "0")]));
        assert!(!filters.is_favorited);
    }

    #[test]
    fn pagination_defaults_apply() {
        let filters = parse_recipe_filters(&[]);
        assert_eq!(filters.limit, 20);
        assert_eq!(filters.offset, 0);
    }

    #[test]
    fn author_and_pagination_parse() {
        let filters =
            parse_recipe_filters(&pairs(&[("author", "7"), ("limit", "5"), ("offset", "10")]));
        assert_eq!(filters.author, Some(7));
        assert_eq!(filters.limit, 5);
        assert_eq!(filters.offset, 10);
    }

    #[test]
    fn unknown_keys_and_garbage_are_ignored() {
        let filters = parse_recipe_filters(&pairs(&[("author", "seven"), ("page", "2")]));
        assert_eq!(filters.author, None);
    }
}
