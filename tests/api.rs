// End-to-end tests: every test spins up the full router on a random port
// with its own SQLite file and talks to it over HTTP.

use std::{sync::Arc, time::Duration};

use axum::Extension;
use serde_json::{json, Value};
use sqlx::{Sqlite, SqlitePool};

async fn spawn_app(test_name: &str) -> (String, SqlitePool) {
    std::env::set_var("JWT_SECRET", "integration-test-secret");
    let db_path = std::env::temp_dir().join(format!("recipeshare_{test_name}.db"));
    let _ = std::fs::remove_file(&db_path);
    let db_url = format!("sqlite://{}", db_path.display());
    let pool = recipeshare::init_db_from(&db_url).await.unwrap();

    let (port, addr) = recipeshare::get_random_free_port();
    let app = recipeshare::make_router().layer(Extension(Arc::new(pool.clone())));
    tokio::spawn(async move {
        axum::Server::bind(&addr)
            .serve(app.into_make_service())
            .await
            .unwrap();
    });

    let base = format!("http://127.0.0.1:{port}");
    for _ in 0..100 {
        if reqwest::get(format!("{base}/check_health")).await.is_ok() {
            return (base, pool);
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    panic!("Server did not come up");
}

async fn register_and_login(
    client: &reqwest::Client,
    base: &str,
    username: &str,
) -> (i64, String) {
    let response = client
        .post(format!("{base}/users"))
        .json(&json!({
            "email": format!("{username}@example.com"),
            "username": username,
            "first_name": "Test",
            "last_name": "User",
            "password": "correct horse battery staple",
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 201);
    let body: Value = response.json().await.unwrap();
    let id = body["id"].as_i64().unwrap();

    let response = client
        .post(format!("{base}/users/login"))
        .json(&json!({
            "email": format!("{username}@example.com"),
            "password": "correct horse battery staple",
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);
    let body: Value = response.json().await.unwrap();
    let token = body["token"].as_str().unwrap().to_string();
    (id, token)
}

async fn seed_tag(pool: &SqlitePool, name: &str, color: &str, slug: &str) -> i64 {
    sqlx::query_scalar::<Sqlite, i64>(
        "INSERT INTO tags (name, color, slug) VALUES (?, ?, ?) RETURNING id",
    )
    .bind(name)
    .bind(color)
    .bind(slug)
    .fetch_one(pool)
    .await
    .unwrap()
}

async fn seed_ingredient(pool: &SqlitePool, name: &str, measurement_unit: &str) -> i64 {
    sqlx::query_scalar::<Sqlite, i64>(
        "INSERT INTO ingredients (name, measurement_unit) VALUES (?, ?) RETURNING id",
    )
    .bind(name)
    .bind(measurement_unit)
    .fetch_one(pool)
    .await
    .unwrap()
}

fn recipe_payload(name: &str, tags: &[i64], ingredients: &[(i64, i64)]) -> Value {
    json!({
        "name": name,
        "text": "Stir everything together and serve.",
        "cooking_time": 10,
        "tags": tags,
        "ingredients": ingredients
            .iter()
            .map(|(id, amount)| json!({ "id": id, "amount": amount }))
            .collect::<Vec<_>>(),
    })
}

async fn create_recipe(
    client: &reqwest::Client,
    base: &str,
    token: &str,
    payload: &Value,
) -> i64 {
    let response = client
        .post(format!("{base}/recipes"))
        .header("Authorization", format!("Token {token}"))
        .json(payload)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 201);
    let body: Value = response.json().await.unwrap();
    body["id"].as_i64().unwrap()
}

#[tokio::test]
async fn register_login_and_fetch_current_user() {
    let (base, _pool) = spawn_app("register_login").await;
    let client = reqwest::Client::new();
    let (id, token) = register_and_login(&client, &base, "ada").await;

    let response = client
        .get(format!("{base}/users/me"))
        .header("Authorization", format!("Token {token}"))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["id"].as_i64().unwrap(), id);
    assert_eq!(body["username"], "ada");

    // Unauthenticated access to the profile endpoint is rejected.
    let response = client.get(format!("{base}/users/me")).send().await.unwrap();
    assert_eq!(response.status(), 401);

    // Duplicate registration trips the unique constraint.
    let response = client
        .post(format!("{base}/users"))
        .json(&json!({
            "email": "ada@example.com",
            "username": "ada",
            "password": "another password",
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 400);
}

#[tokio::test]
async fn recipe_validation_rules() {
    let (base, pool) = spawn_app("recipe_validation").await;
    let client = reqwest::Client::new();
    let (_, token) = register_and_login(&client, &base, "ada").await;
    let tag = seed_tag(&pool, "Breakfast", "#E26C2D", "breakfast").await;
    let salt = seed_ingredient(&pool, "salt", "g").await;
    let milk = seed_ingredient(&pool, "milk", "ml").await;

    let invalid_payloads = [
        recipe_payload("no tags", &[], &[(salt, 5)]),
        recipe_payload("duplicate tags", &[tag, tag], &[(salt, 5)]),
        recipe_payload("no ingredients", &[tag], &[]),
        recipe_payload("duplicate ingredients", &[tag], &[(salt, 5), (salt, 2)]),
        recipe_payload("zero amount", &[tag], &[(salt, 0)]),
        recipe_payload("unknown tag", &[tag + 100], &[(salt, 5)]),
        recipe_payload("unknown ingredient", &[tag], &[(milk + 100, 5)]),
    ];
    for payload in &invalid_payloads {
        let response = client
            .post(format!("{base}/recipes"))
            .header("Authorization", format!("Token {token}"))
            .json(payload)
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), 400, "payload: {payload}");
    }

    // Nothing was persisted by the rejected payloads.
    let response = client.get(format!("{base}/recipes")).send().await.unwrap();
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["count"].as_u64().unwrap(), 0);

    let recipe_id = create_recipe(
        &client,
        &base,
        &token,
        &recipe_payload("porridge", &[tag], &[(salt, 5), (milk, 200)]),
    )
    .await;

    let response = client
        .get(format!("{base}/recipes/{recipe_id}"))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["tags"].as_array().unwrap().len(), 1);
    assert_eq!(body["ingredients"].as_array().unwrap().len(), 2);
    assert_eq!(body["author"]["username"], "ada");
}

#[tokio::test]
async fn recipe_write_access_is_author_or_admin() {
    let (base, pool) = spawn_app("recipe_permissions").await;
    let client = reqwest::Client::new();
    let (_, author_token) = register_and_login(&client, &base, "ada").await;
    let (_, other_token) = register_and_login(&client, &base, "grace").await;
    let tag = seed_tag(&pool, "Dinner", "#8775D2", "dinner").await;
    let salt = seed_ingredient(&pool, "salt", "g").await;
    let rice = seed_ingredient(&pool, "rice", "g").await;

    // Anonymous writes are rejected outright.
    let payload = recipe_payload("pilaf", &[tag], &[(rice, 300)]);
    let response = client
        .post(format!("{base}/recipes"))
        .json(&payload)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 401);

    let recipe_id = create_recipe(&client, &base, &author_token, &payload).await;

    let update = recipe_payload("salted pilaf", &[tag], &[(salt, 3)]);
    let response = client
        .patch(format!("{base}/recipes/{recipe_id}"))
        .header("Authorization", format!("Token {other_token}"))
        .json(&update)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 403);

    // The author replaces the whole ingredient set in one go.
    let response = client
        .patch(format!("{base}/recipes/{recipe_id}"))
        .header("Authorization", format!("Token {author_token}"))
        .json(&update)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["name"], "salted pilaf");
    let ingredients = body["ingredients"].as_array().unwrap();
    assert_eq!(ingredients.len(), 1);
    assert_eq!(ingredients[0]["name"], "salt");
    assert_eq!(ingredients[0]["amount"].as_i64().unwrap(), 3);

    let response = client
        .delete(format!("{base}/recipes/{recipe_id}"))
        .header("Authorization", format!("Token {other_token}"))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 403);

    let response = client
        .delete(format!("{base}/recipes/{recipe_id}"))
        .header("Authorization", format!("Token {author_token}"))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 204);

    let response = client
        .get(format!("{base}/recipes/{recipe_id}"))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 404);
}

#[tokio::test]
async fn admin_can_modify_any_recipe() {
    let (base, pool) = spawn_app("admin_access").await;
    let client = reqwest::Client::new();
    let (_, author_token) = register_and_login(&client, &base, "ada").await;
    let (admin_id, admin_token) = register_and_login(&client, &base, "root").await;
    sqlx::query("UPDATE users SET role = 'admin' WHERE id = ?")
        .bind(admin_id)
        .execute(&pool)
        .await
        .unwrap();

    let tag = seed_tag(&pool, "Dinner", "#8775D2", "dinner").await;
    let salt = seed_ingredient(&pool, "salt", "g").await;
    let recipe_id = create_recipe(
        &client,
        &base,
        &author_token,
        &recipe_payload("pilaf", &[tag], &[(salt, 3)]),
    )
    .await;

    let response = client
        .patch(format!("{base}/recipes/{recipe_id}"))
        .header("Authorization", format!("Token {admin_token}"))
        .json(&recipe_payload("moderated pilaf", &[tag], &[(salt, 3)]))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["name"], "moderated pilaf");

    let response = client
        .delete(format!("{base}/recipes/{recipe_id}"))
        .header("Authorization", format!("Token {admin_token}"))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 204);
}

#[tokio::test]
async fn favorite_toggle_state_machine() {
    let (base, pool) = spawn_app("favorite_toggle").await;
    let client = reqwest::Client::new();
    let (_, token) = register_and_login(&client, &base, "ada").await;
    let tag = seed_tag(&pool, "Lunch", "#49B64E", "lunch").await;
    let salt = seed_ingredient(&pool, "salt", "g").await;
    let recipe_id = create_recipe(
        &client,
        &base,
        &token,
        &recipe_payload("soup", &[tag], &[(salt, 5)]),
    )
    .await;

    let url = format!("{base}/recipes/{recipe_id}/favorite");
    let auth = format!("Token {token}");

    let response = client
        .post(&url)
        .header("Authorization", &auth)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 201);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["name"], "soup");

    // Second add conflicts.
    let response = client
        .post(&url)
        .header("Authorization", &auth)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 400);

    let response = client
        .get(format!("{base}/recipes/{recipe_id}"))
        .header("Authorization", &auth)
        .send()
        .await
        .unwrap();
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["is_favorited"], json!(true));

    let response = client
        .delete(&url)
        .header("Authorization", &auth)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 204);

    // Second remove finds nothing.
    let response = client
        .delete(&url)
        .header("Authorization", &auth)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 404);

    // Unknown recipe id.
    let response = client
        .post(format!("{base}/recipes/99999/favorite"))
        .header("Authorization", &auth)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 404);
}

#[tokio::test]
async fn shopping_cart_toggle_state_machine() {
    let (base, pool) = spawn_app("cart_toggle").await;
    let client = reqwest::Client::new();
    let (_, token) = register_and_login(&client, &base, "ada").await;
    let tag = seed_tag(&pool, "Lunch", "#49B64E", "lunch").await;
    let salt = seed_ingredient(&pool, "salt", "g").await;
    let recipe_id = create_recipe(
        &client,
        &base,
        &token,
        &recipe_payload("stew", &[tag], &[(salt, 5)]),
    )
    .await;

    let url = format!("{base}/recipes/{recipe_id}/shopping_cart");
    let auth = format!("Token {token}");

    let response = client
        .post(&url)
        .header("Authorization", &auth)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 201);
    let response = client
        .post(&url)
        .header("Authorization", &auth)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 400);

    let response = client
        .get(format!("{base}/recipes/{recipe_id}"))
        .header("Authorization", &auth)
        .send()
        .await
        .unwrap();
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["is_in_shopping_cart"], json!(true));

    let response = client
        .delete(&url)
        .header("Authorization", &auth)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 204);
    let response = client
        .delete(&url)
        .header("Authorization", &auth)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 404);
}

#[tokio::test]
async fn follow_rules_and_subscriptions() {
    let (base, pool) = spawn_app("follow_rules").await;
    let client = reqwest::Client::new();
    let (ada_id, ada_token) = register_and_login(&client, &base, "ada").await;
    let (grace_id, grace_token) = register_and_login(&client, &base, "grace").await;
    let tag = seed_tag(&pool, "Dessert", "#F9A62B", "dessert").await;
    let sugar = seed_ingredient(&pool, "sugar", "g").await;
    create_recipe(
        &client,
        &base,
        &grace_token,
        &recipe_payload("pavlova", &[tag], &[(sugar, 150)]),
    )
    .await;

    let auth = format!("Token {ada_token}");

    // Nobody can follow themselves.
    let response = client
        .post(format!("{base}/users/{ada_id}/subscribe"))
        .header("Authorization", &auth)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 400);

    // Unknown target user.
    let response = client
        .post(format!("{base}/users/99999/subscribe"))
        .header("Authorization", &auth)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 404);

    let response = client
        .post(format!("{base}/users/{grace_id}/subscribe"))
        .header("Authorization", &auth)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 201);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["username"], "grace");
    assert_eq!(body["recipes_count"].as_i64().unwrap(), 1);

    // Following twice conflicts.
    let response = client
        .post(format!("{base}/users/{grace_id}/subscribe"))
        .header("Authorization", &auth)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 400);

    let response = client
        .get(format!("{base}/users/subscriptions"))
        .header("Authorization", &auth)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["count"].as_u64().unwrap(), 1);
    let subscription = &body["results"][0];
    assert_eq!(subscription["username"], "grace");
    assert_eq!(subscription["is_subscribed"], json!(true));
    assert_eq!(subscription["recipes"].as_array().unwrap().len(), 1);

    // The profile view reflects the subscription for the follower only.
    let response = client
        .get(format!("{base}/users/{grace_id}"))
        .header("Authorization", &auth)
        .send()
        .await
        .unwrap();
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["is_subscribed"], json!(true));
    let response = client
        .get(format!("{base}/users/{grace_id}"))
        .send()
        .await
        .unwrap();
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["is_subscribed"], json!(false));

    let response = client
        .delete(format!("{base}/users/{grace_id}/subscribe"))
        .header("Authorization", &auth)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 204);

    // Removing a subscription that is gone already finds nothing.
    let response = client
        .delete(format!("{base}/users/{grace_id}/subscribe"))
        .header("Authorization", &auth)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 404);
}

#[tokio::test]
async fn shopping_list_is_aggregated_and_scoped_per_user() {
    let (base, pool) = spawn_app("shopping_list").await;
    let client = reqwest::Client::new();
    let (_, ada_token) = register_and_login(&client, &base, "ada").await;
    let (_, grace_token) = register_and_login(&client, &base, "grace").await;
    let tag = seed_tag(&pool, "Lunch", "#49B64E", "lunch").await;
    let salt = seed_ingredient(&pool, "salt", "g").await;
    let milk = seed_ingredient(&pool, "milk", "ml").await;

    let soup = create_recipe(
        &client,
        &base,
        &ada_token,
        &recipe_payload("soup", &[tag], &[(salt, 5)]),
    )
    .await;
    let stew = create_recipe(
        &client,
        &base,
        &ada_token,
        &recipe_payload("stew", &[tag], &[(salt, 10)]),
    )
    .await;
    let porridge = create_recipe(
        &client,
        &base,
        &grace_token,
        &recipe_payload("porridge", &[tag], &[(milk, 200)]),
    )
    .await;

    for recipe_id in [soup, stew] {
        let response = client
            .post(format!("{base}/recipes/{recipe_id}/shopping_cart"))
            .header("Authorization", format!("Token {ada_token}"))
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), 201);
    }
    let response = client
        .post(format!("{base}/recipes/{porridge}/shopping_cart"))
        .header("Authorization", format!("Token {grace_token}"))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 201);

    let response = client
        .get(format!("{base}/recipes/download_shopping_cart"))
        .header("Authorization", format!("Token {ada_token}"))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);
    assert!(response
        .headers()
        .get("content-disposition")
        .unwrap()
        .to_str()
        .unwrap()
        .contains("shopping_list.txt"));
    let document = response.text().await.unwrap();

    // The two salt amounts collapse into a single summed line, and nothing
    // from the other user's list leaks in.
    assert_eq!(document.matches("salt (g) - 15").count(), 1);
    assert!(!document.contains("milk"));

    let response = client
        .get(format!("{base}/recipes/download_shopping_cart"))
        .header("Authorization", format!("Token {grace_token}"))
        .send()
        .await
        .unwrap();
    let document = response.text().await.unwrap();
    assert!(document.contains("milk (ml) - 200"));
    assert!(!document.contains("salt"));

    // Anonymous downloads are rejected.
    let response = client
        .get(format!("{base}/recipes/download_shopping_cart"))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 401);
}

#[tokio::test]
async fn ingredient_search_matches_prefix_only() {
    let (base, pool) = spawn_app("ingredient_search").await;
    let client = reqwest::Client::new();
    seed_ingredient(&pool, "milk", "ml").await;
    seed_ingredient(&pool, "mild cheese", "g").await;
    seed_ingredient(&pool, "almilk", "ml").await;

    let response = client
        .get(format!("{base}/ingredients?name=mil"))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);
    let body: Value = response.json().await.unwrap();
    let names: Vec<&str> = body
        .as_array()
        .unwrap()
        .iter()
        .map(|ingredient| ingredient["name"].as_str().unwrap())
        .collect();
    assert_eq!(names, vec!["mild cheese", "milk"]);

    // Without a prefix the whole catalogue comes back.
    let response = client.get(format!("{base}/ingredients")).send().await.unwrap();
    let body: Value = response.json().await.unwrap();
    assert_eq!(body.as_array().unwrap().len(), 3);
}

#[tokio::test]
async fn recipe_filters() {
    let (base, pool) = spawn_app("recipe_filters").await;
    let client = reqwest::Client::new();
    let (ada_id, ada_token) = register_and_login(&client, &base, "ada").await;
    let (_, grace_token) = register_and_login(&client, &base, "grace").await;
    let breakfast = seed_tag(&pool, "Breakfast", "#E26C2D", "breakfast").await;
    let vegan = seed_tag(&pool, "Vegan", "#3AC1A8", "vegan").await;
    let dinner = seed_tag(&pool, "Dinner", "#8775D2", "dinner").await;
    let salt = seed_ingredient(&pool, "salt", "g").await;

    let pancakes = create_recipe(
        &client,
        &base,
        &ada_token,
        &recipe_payload("pancakes", &[breakfast], &[(salt, 1)]),
    )
    .await;
    let salad = create_recipe(
        &client,
        &base,
        &grace_token,
        &recipe_payload("salad", &[vegan], &[(salt, 2)]),
    )
    .await;
    create_recipe(
        &client,
        &base,
        &grace_token,
        &recipe_payload("roast", &[dinner], &[(salt, 3)]),
    )
    .await;

    // Tag filters combine with OR.
    let response = client
        .get(format!("{base}/recipes?tags=breakfast&tags=vegan"))
        .send()
        .await
        .unwrap();
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["count"].as_u64().unwrap(), 2);
    let names: Vec<&str> = body["results"]
        .as_array()
        .unwrap()
        .iter()
        .map(|recipe| recipe["name"].as_str().unwrap())
        .collect();
    assert!(names.contains(&"pancakes"));
    assert!(names.contains(&"salad"));

    let response = client
        .get(format!("{base}/recipes?author={ada_id}"))
        .send()
        .await
        .unwrap();
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["count"].as_u64().unwrap(), 1);
    assert_eq!(body["results"][0]["id"].as_i64().unwrap(), pancakes);

    // Favorite filter is scoped to the caller and ignored for anonymous
    // viewers.
    let response = client
        .post(format!("{base}/recipes/{salad}/favorite"))
        .header("Authorization", format!("Token {ada_token}"))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 201);

    let response = client
        .get(format!("{base}/recipes?is_favorited=1"))
        .header("Authorization", format!("Token {ada_token}"))
        .send()
        .await
        .unwrap();
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["count"].as_u64().unwrap(), 1);
    assert_eq!(body["results"][0]["id"].as_i64().unwrap(), salad);

    let response = client
        .get(format!("{base}/recipes?is_favorited=1"))
        .send()
        .await
        .unwrap();
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["count"].as_u64().unwrap(), 3);

    // Cart filter behaves the same way.
    let response = client
        .post(format!("{base}/recipes/{pancakes}/shopping_cart"))
        .header("Authorization", format!("Token {ada_token}"))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 201);
    let response = client
        .get(format!("{base}/recipes?is_in_shopping_cart=true"))
        .header("Authorization", format!("Token {ada_token}"))
        .send()
        .await
        .unwrap();
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["count"].as_u64().unwrap(), 1);
    assert_eq!(body["results"][0]["id"].as_i64().unwrap(), pancakes);
}
