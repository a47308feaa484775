use serde::{Deserialize, Serialize};

// ----------------- User Requests -----------------
#[derive(Deserialize, Serialize, Debug)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Deserialize, Serialize, Debug)]
pub struct RegisterRequest {
    pub email: String,
    pub username: String,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    pub password: String,
}

// ----------------- Recipe Requests -----------------
#[derive(Deserialize, Serialize, Debug, Clone, Copy)]
pub struct IngredientAmountRequest {
    pub id: i64,
    pub amount: i64,
}

/// Payload for both create and update. An update replaces the whole tag and
/// ingredient sets rather than diffing them, so the full sets are required
/// every time.
#[derive(Deserialize, Serialize, Debug)]
pub struct RecipeRequest {
    pub name: String,
    #[serde(default)]
    pub image: Option<String>,
    pub text: String,
    pub cooking_time: i64,
    pub tags: Vec<i64>,
    pub ingredients: Vec<IngredientAmountRequest>,
}
