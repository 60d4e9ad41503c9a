use serde::Deserialize;
use std::collections::HashMap;
use std::time::Duration;

pub const DEFAULT_FIAT_API: &str = "https://api.exchangerate.host";
pub const DEFAULT_CRYPTO_API: &str = "https://api.coingecko.com";

const FIAT_TIMEOUT: Duration = Duration::from_secs(5);
const CRYPTO_TIMEOUT: Duration = Duration::from_secs(8);

/// Provider ids for the crypto symbols the marketplace tracks. Anything
/// not in this table is treated as fiat.
fn crypto_id(symbol: &str) -> Option<&'static str> {
    match symbol {
        "BTC" => Some("bitcoin"),
        "ETH" => Some("ethereum"),
        "USDT" => Some("tether"),
        "BNB" => Some("binancecoin"),
        "XRP" => Some("ripple"),
        "SOL" => Some("solana"),
        "ADA" => Some("cardano"),
        "DOGE" => Some("dogecoin"),
        "TRX" => Some("tron"),
        "LTC" => Some("litecoin"),
        _ => None,
    }
}

/// The provider only knows the ISO code GHS; the marketplace tracks the
/// local code GHC.
fn fiat_lookup_code(symbol: &str) -> &str {
    if symbol == "GHC" {
        "GHS"
    } else {
        symbol
    }
}

#[derive(Deserialize)]
struct FiatResponse {
    rates: HashMap<String, f64>,
}

/// Fetches fiat and crypto quotes and expresses them in the base currency.
pub struct RateFetchClient {
    client: reqwest::Client,
    fiat_base: String,
    crypto_base: String,
}

impl RateFetchClient {
    pub fn new(fiat_base: impl Into<String>, crypto_base: impl Into<String>) -> crate::Result<Self> {
        let client = reqwest::Client::builder().gzip(true).build()?;
        Ok(Self {
            client,
            fiat_base: fiat_base.into(),
            crypto_base: crypto_base.into(),
        })
    }

    /// Resolves as many of `symbols` as possible into units of
    /// `base` per 1 unit of the symbol. Symbols the providers do not
    /// return are simply absent from the result; a failed provider call
    /// drops that whole bucket and is only logged.
    pub async fn fetch(&self, symbols: &[String], base: &str) -> HashMap<String, f64> {
        let mut fiat = Vec::new();
        let mut crypto = Vec::new();
        for symbol in symbols {
            let symbol = symbol.to_uppercase();
            if crypto_id(&symbol).is_some() {
                crypto.push(symbol);
            } else {
                fiat.push(symbol);
            }
        }
        let mut out = HashMap::new();
        // One fiat table serves both buckets: the direct fiat quotes and
        // the USD conversion for crypto. The provider is rate-limited,
        // so it is queried at most once per pass.
        let needs_fiat = !fiat.is_empty() || (!crypto.is_empty() && base != "USD");
        let fiat_table = if needs_fiat {
            match self.fiat_rates(base).await {
                Ok(rates) => Some(rates),
                Err(e) => {
                    tracing::error!("fiat rates request failed: {e}");
                    None
                }
            }
        } else {
            None
        };
        if !fiat.is_empty() {
            if let Some(rates) = &fiat_table {
                collect_fiat(&fiat, base, rates, &mut out);
            }
        }
        if !crypto.is_empty() {
            match usd_to_base(base, fiat_table.as_ref()) {
                Some(multiplier) => self.fetch_crypto(&crypto, multiplier, &mut out).await,
                None => tracing::error!("USD->{base} conversion unavailable, skipping crypto rates"),
            }
        }
        out
    }

    async fn fetch_crypto(
        &self,
        symbols: &[String],
        usd_to_base: f64,
        out: &mut HashMap<String, f64>,
    ) {
        let ids: Vec<&str> = symbols.iter().filter_map(|s| crypto_id(s)).collect();
        let url = format!(
            "{}/api/v3/simple/price?ids={}&vs_currencies=usd",
            self.crypto_base,
            ids.join(",")
        );
        let prices: HashMap<String, HashMap<String, f64>> = match self.get_json(&url, CRYPTO_TIMEOUT).await {
            Ok(p) => p,
            Err(e) => {
                tracing::error!("crypto rates request failed: {e}");
                return;
            }
        };
        for symbol in symbols {
            let Some(id) = crypto_id(symbol) else { continue };
            let Some(usd) = prices.get(id).and_then(|p| p.get("usd")) else {
                tracing::warn!("crypto provider has no quote for {symbol}, skipping");
                continue;
            };
            let rate = usd * usd_to_base;
            if rate > 0.0 && rate.is_finite() {
                out.insert(symbol.clone(), rate);
            }
        }
    }

    async fn fiat_rates(&self, base: &str) -> crate::Result<HashMap<String, f64>> {
        let url = format!("{}/latest?base={base}", self.fiat_base);
        let response: FiatResponse = self.get_json(&url, FIAT_TIMEOUT).await?;
        Ok(response.rates)
    }

    async fn get_json<T: serde::de::DeserializeOwned>(
        &self,
        url: &str,
        timeout: Duration,
    ) -> crate::Result<T> {
        let response = self
            .client
            .get(url)
            .timeout(timeout)
            .send()
            .await?
            .error_for_status()?;
        Ok(response.json().await?)
    }
}

fn collect_fiat(
    symbols: &[String],
    base: &str,
    rates: &HashMap<String, f64>,
    out: &mut HashMap<String, f64>,
) {
    for symbol in symbols {
        if symbol == base {
            out.insert(symbol.clone(), 1.0);
            continue;
        }
        // The provider reports base -> target; the store wants
        // target -> base, hence the inverse.
        let Some(value) = rates.get(fiat_lookup_code(symbol)) else {
            tracing::warn!("fiat provider has no quote for {symbol}, skipping");
            continue;
        };
        if *value > 0.0 && value.is_finite() {
            out.insert(symbol.clone(), 1.0 / value);
        }
    }
}

/// Crypto quotes come in USD; the shared fiat table converts them when
/// the base currency is something else.
fn usd_to_base(base: &str, rates: Option<&HashMap<String, f64>>) -> Option<f64> {
    if base == "USD" {
        return Some(1.0);
    }
    match rates?.get("USD") {
        Some(v) if *v > 0.0 && v.is_finite() => Some(1.0 / v),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client(server: &MockServer) -> RateFetchClient {
        RateFetchClient::new(server.uri(), server.uri()).unwrap()
    }

    #[tokio::test]
    async fn fiat_rates_are_inverted() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/latest"))
            .and(query_param("base", "CNY"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({"rates": {"USD": 0.1379}})),
            )
            .mount(&server)
            .await;
        let fetched = client(&server).fetch(&["USD".to_string()], "CNY").await;
        let usd = fetched["USD"];
        assert!((usd - 1.0 / 0.1379).abs() < 1e-9);
        assert!((usd - 7.2516).abs() < 1e-3);
    }

    #[tokio::test]
    async fn ghc_is_requested_as_ghs() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/latest"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({"rates": {"GHS": 2.0}})),
            )
            .mount(&server)
            .await;
        let fetched = client(&server).fetch(&["GHC".to_string()], "CNY").await;
        assert_eq!(fetched.get("GHC"), Some(&0.5));
    }

    #[tokio::test]
    async fn missing_symbol_is_skipped() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/latest"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({"rates": {"USD": 0.14}})),
            )
            .mount(&server)
            .await;
        let fetched = client(&server)
            .fetch(&["USD".to_string(), "EUR".to_string()], "CNY")
            .await;
        assert!(fetched.contains_key("USD"));
        assert!(!fetched.contains_key("EUR"));
    }

    #[tokio::test]
    async fn provider_failure_drops_the_bucket() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/latest"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;
        let fetched = client(&server).fetch(&["USD".to_string()], "CNY").await;
        assert!(fetched.is_empty());
    }

    #[tokio::test]
    async fn crypto_converted_through_usd() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/latest"))
            .and(query_param("base", "CNY"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({"rates": {"USD": 0.2}})),
            )
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/api/v3/simple/price"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({"bitcoin": {"usd": 100.0}})),
            )
            .mount(&server)
            .await;
        let fetched = client(&server).fetch(&["BTC".to_string()], "CNY").await;
        // 100 USD per BTC, 5 CNY per USD
        assert_eq!(fetched.get("BTC"), Some(&500.0));
    }

    #[tokio::test]
    async fn crypto_in_usd_base_needs_no_fiat_lookup() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/v3/simple/price"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({"ethereum": {"usd": 2500.0}})),
            )
            .mount(&server)
            .await;
        let fetched = client(&server).fetch(&["ETH".to_string()], "USD").await;
        assert_eq!(fetched.get("ETH"), Some(&2500.0));
    }

    #[tokio::test]
    async fn fiat_table_is_fetched_once_per_pass() {
        let server = MockServer::start().await;
        // With both buckets tracked the fiat endpoint must see exactly
        // one request per pass; the crypto conversion reuses the table.
        Mock::given(method("GET"))
            .and(path("/latest"))
            .and(query_param("base", "CNY"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({"rates": {"USD": 0.2}})),
            )
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/api/v3/simple/price"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({"bitcoin": {"usd": 100.0}})),
            )
            .mount(&server)
            .await;
        let fetched = client(&server)
            .fetch(&["USD".to_string(), "BTC".to_string()], "CNY")
            .await;
        assert_eq!(fetched.get("USD"), Some(&5.0));
        assert_eq!(fetched.get("BTC"), Some(&500.0));
    }

    #[tokio::test]
    async fn base_symbol_maps_to_one() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/latest"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"rates": {}})))
            .mount(&server)
            .await;
        let fetched = client(&server).fetch(&["CNY".to_string()], "CNY").await;
        assert_eq!(fetched.get("CNY"), Some(&1.0));
    }
}
