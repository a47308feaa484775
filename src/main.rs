use std::net::SocketAddr;

use recipeshare::{make_router, run_app};
use tracing::{error, info};

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt::init();

    let port = std::env::var("APP_PORT")
        .ok()
        .and_then(|port| port.parse().ok())
        .unwrap_or(3001);
    let addr = SocketAddr::from(([127, 0, 0, 1], port));
    let router = make_router();
    info!("Server started on {}", addr);
    if let Err(error) = run_app(router, addr).await {
        error!("Error: {}", error);
    }
}
