mod catalog;
mod conversion;
mod rates;

pub use catalog::CatalogStorage;
pub use conversion::ConversionStorage;
pub use rates::RateStorage;

/// Runs embedded migrations against the shared pool.
pub async fn migrate(pool: &sqlx::PgPool) -> crate::Result<()> {
    sqlx::migrate!().run(pool).await?;
    Ok(())
}
