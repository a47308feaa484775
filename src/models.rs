use chrono::NaiveDateTime;

pub const ROLE_USER: &str = "user";
pub const ROLE_ADMIN: &str = "admin";

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct User {
    pub id: i64,
    pub username: String,
    pub email: String,
    pub password: String,
    pub first_name: String,
    pub last_name: String,
    pub role: String,
    pub created_at: NaiveDateTime,
}

impl User {
    pub fn is_admin(&self) -> bool {
        self.role == ROLE_ADMIN
    }

    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
            .trim()
            .to_string()
    }
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct Ingredient {
    pub id: i64,
    pub name: String,
    pub measurement_unit: String,
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct Tag {
    pub id: i64,
    pub name: String,
    pub color: String,
    pub slug: String,
}

/// One recipe row joined with its author and the viewer-dependent flags.
/// Tag and ingredient sets are loaded separately.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct Recipe {
    pub id: i64,
    pub name: String,
    pub image: Option<String>,
    pub text: String,
    pub cooking_time: i64,
    pub pub_date: NaiveDateTime,
    pub author_id: i64,
    pub author_username: String,
    pub author_email: String,
    pub author_first_name: String,
    pub author_last_name: String,
    pub is_subscribed: bool,
    pub is_favorited: bool,
    pub is_in_shopping_cart: bool,
}

/// Ingredient of one recipe together with its amount.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct RecipeIngredient {
    pub id: i64,
    pub name: String,
    pub measurement_unit: String,
    pub amount: i64,
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ShortRecipe {
    pub id: i64,
    pub name: String,
    pub image: Option<String>,
    pub cooking_time: i64,
}

/// One aggregated line of a shopping list: same-named ingredients measured
/// in the same unit are summed across every recipe in the list.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct PurchaseItem {
    pub name: String,
    pub measurement_unit: String,
    pub total_amount: i64,
}
