use crate::models::{ExchangeRate, NewExchangeRate, UpdateExchangeRate};
use uuid::Uuid;

pub const BASE_CURRENCY_KEY: &str = "base_currency";
pub const DEFAULT_BASE_CURRENCY: &str = "CNY";

#[derive(Clone)]
pub struct RateStorage {
    pool: sqlx::PgPool,
}

impl RateStorage {
    pub fn new(pool: sqlx::PgPool) -> Self {
        Self { pool }
    }

    /// Primary currencies first, then alphabetically by symbol.
    pub async fn get_all(&self) -> crate::Result<Vec<ExchangeRate>> {
        let query =
            "SELECT * FROM exchange_rates ORDER BY is_primary DESC, symbol";
        let rates = sqlx::query_as::<_, ExchangeRate>(query)
            .fetch_all(&self.pool)
            .await?;
        Ok(rates)
    }

    pub async fn get(&self, id: Uuid) -> crate::Result<Option<ExchangeRate>> {
        let query = "SELECT * FROM exchange_rates WHERE id = $1";
        let rate = sqlx::query_as::<_, ExchangeRate>(query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(rate)
    }

    /// Inserts a new tracked currency, or refreshes an existing row when
    /// the symbol is already known.
    pub async fn upsert(&self, new: NewExchangeRate) -> crate::Result<ExchangeRate> {
        let query = "INSERT INTO exchange_rates (currency, symbol, rate, is_primary) \
                     VALUES ($1, $2, $3, $4) \
                     ON CONFLICT (symbol) DO UPDATE \
                     SET currency = EXCLUDED.currency, rate = EXCLUDED.rate, \
                         is_primary = EXCLUDED.is_primary, updated_at = now() \
                     RETURNING *";
        let rate = sqlx::query_as::<_, ExchangeRate>(query)
            .bind(&new.currency)
            .bind(new.symbol.to_uppercase())
            .bind(new.rate)
            .bind(new.is_primary)
            .fetch_one(&self.pool)
            .await?;
        Ok(rate)
    }

    pub async fn update(
        &self,
        id: Uuid,
        update: UpdateExchangeRate,
    ) -> crate::Result<Option<ExchangeRate>> {
        let query = "UPDATE exchange_rates \
                     SET currency = COALESCE($2, currency), \
                         rate = COALESCE($3, rate), \
                         is_primary = COALESCE($4, is_primary), \
                         updated_at = now() \
                     WHERE id = $1 RETURNING *";
        let rate = sqlx::query_as::<_, ExchangeRate>(query)
            .bind(id)
            .bind(update.currency)
            .bind(update.rate)
            .bind(update.is_primary)
            .fetch_optional(&self.pool)
            .await?;
        Ok(rate)
    }

    pub async fn delete(&self, id: Uuid) -> crate::Result<bool> {
        let result = sqlx::query("DELETE FROM exchange_rates WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Single-row write used by the sync loop; deliberately not part of
    /// any batch transaction.
    pub async fn apply_quote(
        &self,
        symbol: &str,
        rate: f64,
        change: f64,
        change_percent: f64,
    ) -> crate::Result<()> {
        let query = "UPDATE exchange_rates \
                     SET rate = $2, change = $3, change_percent = $4, updated_at = now() \
                     WHERE symbol = $1";
        sqlx::query(query)
            .bind(symbol)
            .bind(rate)
            .bind(change)
            .bind(change_percent)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    pub async fn base_currency(&self) -> crate::Result<String> {
        let query = "SELECT value FROM system_config WHERE key = $1";
        let value: Option<(String,)> = sqlx::query_as(query)
            .bind(BASE_CURRENCY_KEY)
            .fetch_optional(&self.pool)
            .await?;
        Ok(value
            .map(|(v,)| v)
            .unwrap_or_else(|| DEFAULT_BASE_CURRENCY.to_string()))
    }

    pub async fn set_base_currency(&self, code: &str) -> crate::Result<()> {
        let query = "INSERT INTO system_config (key, value) VALUES ($1, $2) \
                     ON CONFLICT (key) DO UPDATE SET value = EXCLUDED.value, updated_at = now()";
        sqlx::query(query)
            .bind(BASE_CURRENCY_KEY)
            .bind(code.to_uppercase())
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}
