use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

mod handlers;
mod state;

use tower_http::cors::CorsLayer;
use tracing_subscriber::EnvFilter;

use state::AppState;
use wellsift_core::{Config, config_file};
use wellsift_store::WellStore;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let mut config = config_file::load_config().apply(Config::default());
    if let Ok(db) = std::env::var("WELLSIFT_DB") {
        config.db_path = PathBuf::from(db);
    }

    let store = WellStore::open(&config.db_path)?;
    println!("Serving wells from {}", config.db_path.display());

    let state = Arc::new(AppState {
        store: Mutex::new(store),
    });

    let app = axum::Router::new()
        .route("/api/wells", axum::routing::get(handlers::wells::list))
        .route(
            "/api/wells/{id}",
            axum::routing::get(handlers::wells::get_by_id),
        )
        .layer(CorsLayer::permissive())
        .with_state(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], 5000));
    println!("Listening on http://{addr}");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
