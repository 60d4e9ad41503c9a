use crate::models::{ConversionConfig, UpdateConversionConfig};
use sqlx::types::Json;

#[derive(Clone)]
pub struct ConversionStorage {
    pool: sqlx::PgPool,
}

impl ConversionStorage {
    pub fn new(pool: sqlx::PgPool) -> Self {
        Self { pool }
    }

    /// The singleton row seeded by the migrations.
    pub async fn get(&self) -> crate::Result<ConversionConfig> {
        let query = "SELECT * FROM conversion_config ORDER BY updated_at DESC LIMIT 1";
        let config = sqlx::query_as::<_, ConversionConfig>(query)
            .fetch_one(&self.pool)
            .await?;
        Ok(config)
    }

    pub async fn update(&self, update: UpdateConversionConfig) -> crate::Result<ConversionConfig> {
        let current = self.get().await?;
        let query = "UPDATE conversion_config \
                     SET r_rate = $2, service_fee = $3, ngn_rate = $4, ghc_rate = $5, \
                         category_rates = $6, updated_at = now() \
                     WHERE id = $1 RETURNING *";
        let category_rates = update
            .category_rates
            .map(Json)
            .unwrap_or(current.category_rates);
        let config = sqlx::query_as::<_, ConversionConfig>(query)
            .bind(current.id)
            .bind(update.r_rate.unwrap_or(current.r_rate))
            .bind(update.service_fee.unwrap_or(current.service_fee))
            .bind(update.ngn_rate.unwrap_or(current.ngn_rate))
            .bind(update.ghc_rate.unwrap_or(current.ghc_rate))
            .bind(category_rates)
            .fetch_one(&self.pool)
            .await?;
        Ok(config)
    }
}
