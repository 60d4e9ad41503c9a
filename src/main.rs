use std::path::PathBuf;

use sqlx::postgres::PgPoolOptions;
use tracing::info;
use tracing_subscriber::EnvFilter;

use cardex_api::models::{AppState, AuthConfig};
use cardex_api::rate_service::{RateFetchClient, RateService, DEFAULT_CRYPTO_API, DEFAULT_FIAT_API};
use cardex_api::routes;
use cardex_api::storage::{self, CatalogStorage, ConversionStorage, RateStorage};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let database_url = std::env::var("DATABASE_URL").expect("DATABASE_URL not set");
    let admin_token = std::env::var("ADMIN_TOKEN").expect("ADMIN_TOKEN not set");
    let admin_password = std::env::var("ADMIN_PASSWORD").expect("ADMIN_PASSWORD not set");
    let upload_dir = PathBuf::from(env_or("UPLOAD_DIR", "uploads"));
    let fiat_api = env_or("FIAT_API_URL", DEFAULT_FIAT_API);
    let crypto_api = env_or("CRYPTO_API_URL", DEFAULT_CRYPTO_API);
    let port: u16 = env_or("PORT", "8080").parse().expect("PORT must be a number");

    info!("connecting to database");
    let pool = PgPoolOptions::new()
        .max_connections(10)
        .connect(&database_url)
        .await?;
    storage::migrate(&pool).await?;
    info!("database ready");

    tokio::fs::create_dir_all(&upload_dir).await?;

    let rates = RateStorage::new(pool.clone());
    let client = RateFetchClient::new(fiat_api, crypto_api)?;
    let rate_service = RateService::new(rates.clone(), client);
    tokio::spawn(rate_service.clone().run());
    info!("rate service running");

    let state = AppState {
        rates,
        conversion: ConversionStorage::new(pool.clone()),
        catalog: CatalogStorage::new(pool),
        rate_service,
        auth: AuthConfig {
            token: admin_token,
            password: admin_password,
        },
        upload_dir,
    };
    let app = routes::init(state);
    let listener = tokio::net::TcpListener::bind(("0.0.0.0", port)).await?;
    info!("listening on port {port}");
    axum::serve(listener, app).await?;
    Ok(())
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}
