mod authentication;
mod data_formats;
mod db_helpers;
mod errors;
mod handlers;
mod models;
mod seed;
mod validation;

use anyhow::Context;
pub use anyhow::Result;
use axum::http::StatusCode;
use axum::{routing::*, Extension, Json, Router};
pub use data_formats::*;
use handlers::*;
pub use seed::seed_reference_data;
use sqlx::sqlite::SqliteConnectOptions;
use sqlx::SqlitePool;
use std::str::FromStr;
use std::{
    net::{SocketAddr, TcpListener},
    sync::Arc,
};
use tracing::info;

pub type JsonResponse<T> = (StatusCode, Json<T>);

pub async fn run_app(app: Router, address: SocketAddr) -> Result<()> {
    let db = init_db().await?;
    let app = app.layer(Extension(Arc::new(db)));
    axum::Server::bind(&address)
        .serve(app.into_make_service())
        .await?;
    Ok(())
}

pub async fn init_db() -> Result<SqlitePool> {
    let db_url = std::env::var("DATABASE_URL").context("DATABASE_URL must be set")?;
    init_db_from(&db_url).await
}

/// Foreign keys are off by default in SQLite; they have to be switched on
/// for the ON DELETE CASCADE clauses to fire.
pub async fn init_db_from(db_url: &str) -> Result<SqlitePool> {
    let options = SqliteConnectOptions::from_str(db_url)
        .context("Invalid DATABASE_URL")?
        .create_if_missing(true)
        .foreign_keys(true);
    let pool = SqlitePool::connect_with(options).await?;
    info!("Running migrations");
    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .context("Failed to run migrations")?;
    info!("Migrations completed");
    Ok(pool)
}

pub fn get_random_free_port() -> (u16, SocketAddr) {
    let listener = TcpListener::bind("localhost:0").unwrap();
    match listener.local_addr() {
        Ok(addr) => (addr.port(), addr),
        Err(_) => panic!("Could not get a free port"),
    }
}

pub fn make_router() -> Router {
    Router::new()
        .route("/check_health", get(alive))
        .route("/users", get(list_users).post(register_user))
        .route("/users/login", post(login_user))
        .route("/users/me", get(get_current_user))
        .route("/users/subscriptions", get(list_subscriptions))
        .route("/users/:id", get(get_user_profile))
        .route(
            "/users/:id/subscribe",
            post(subscribe_to_author).delete(unsubscribe_from_author),
        )
        .route("/tags", get(list_tags))
        .route("/tags/:id", get(get_tag))
        .route("/ingredients", get(list_ingredients))
        .route("/ingredients/:id", get(get_ingredient))
        .route("/recipes", get(list_recipes).post(create_recipe))
        .route("/recipes/download_shopping_cart", get(download_shopping_cart))
        .route(
            "/recipes/:id",
            get(get_recipe).patch(update_recipe).delete(delete_recipe),
        )
        .route(
            "/recipes/:id/favorite",
            post(favorite_recipe).delete(unfavorite_recipe),
        )
        .route(
            "/recipes/:id/shopping_cart",
            post(add_recipe_to_shopping_cart).delete(remove_recipe_from_shopping_cart),
        )
        .fallback(not_found)
}
