// Loads the reference data (ingredient catalogue and tag set) into the
// database pointed at by DATABASE_URL.

use std::path::PathBuf;

use recipeshare::{init_db, seed_reference_data};
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt::init();

    let data_dir = PathBuf::from(std::env::var("DATA_DIR").unwrap_or_else(|_| "data".to_string()));
    let pool = init_db().await?;
    let (ingredients, tags) = seed_reference_data(&pool, &data_dir).await?;
    info!("Seeding finished: {ingredients} new ingredients, {tags} new tags");
    Ok(())
}
