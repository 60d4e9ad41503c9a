//! Background service keeping the exchange-rate table in step with the
//! public fiat and crypto providers.

mod client;
pub use client::{RateFetchClient, DEFAULT_CRYPTO_API, DEFAULT_FIAT_API};

use std::sync::Arc;

use crate::storage::RateStorage;
use crate::utils::pause;

/// Minutes between scheduled syncs.
const SYNC_INTERVAL_MINUTES: u64 = 3;

pub struct RateService {
    storage: RateStorage,
    client: RateFetchClient,
}

impl RateService {
    pub fn new(storage: RateStorage, client: RateFetchClient) -> Arc<Self> {
        Arc::new(Self { storage, client })
    }

    /// One full sync pass: fetch quotes for every tracked symbol and
    /// persist each resolved row independently. Rows the providers did
    /// not resolve keep their previous rate. Returns how many rows were
    /// updated.
    pub async fn sync(&self) -> crate::Result<usize> {
        let base = self.storage.base_currency().await?;
        let rows = self.storage.get_all().await?;
        if rows.is_empty() {
            return Ok(0);
        }
        let symbols: Vec<String> = rows.iter().map(|r| r.symbol.clone()).collect();
        let fetched = self.client.fetch(&symbols, &base).await;
        let mut updated = 0;
        for row in rows {
            let Some(new_rate) = fetched.get(&row.symbol).copied() else {
                continue;
            };
            if !(new_rate > 0.0 && new_rate.is_finite()) {
                continue;
            }
            let (change, change_percent) = rate_change(row.rate, new_rate);
            // Each row is saved on its own; a failure here only skips
            // this row, partial completion is an accepted outcome.
            if let Err(e) = self
                .storage
                .apply_quote(&row.symbol, new_rate, change, change_percent)
                .await
            {
                tracing::error!("failed to persist rate for {}: {e}", row.symbol);
                continue;
            }
            updated += 1;
        }
        Ok(updated)
    }

    /// Runs one sync immediately, then repeats on a fixed interval.
    /// Never returns.
    pub async fn run(self: Arc<Self>) {
        self.sync_and_log().await;
        loop {
            pause(SYNC_INTERVAL_MINUTES).await;
            self.sync_and_log().await;
        }
    }

    async fn sync_and_log(&self) {
        match self.sync().await {
            Ok(updated) => tracing::info!("rate sync finished, {updated} rates updated"),
            Err(e) => tracing::error!("rate sync failed: {e}"),
        }
    }
}

/// Absolute and percentage change between two consecutive rates. The
/// percentage is defined as zero when the previous rate was zero.
pub fn rate_change(old: f64, new: f64) -> (f64, f64) {
    let change = new - old;
    let percent = if old == 0.0 {
        0.0
    } else {
        change / old * 100.0
    };
    (change, percent)
}

#[cfg(test)]
mod tests {
    use super::rate_change;

    #[test]
    fn change_fields() {
        let (change, percent) = rate_change(100.0, 110.0);
        assert_eq!(change, 10.0);
        assert_eq!(percent, 10.0);

        let (change, percent) = rate_change(8.0, 6.0);
        assert_eq!(change, -2.0);
        assert_eq!(percent, -25.0);
    }

    #[test]
    fn zero_previous_rate_means_zero_percent() {
        let (change, percent) = rate_change(0.0, 7.25);
        assert_eq!(change, 7.25);
        assert_eq!(percent, 0.0);
    }
}
