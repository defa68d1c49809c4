//! Configuration loader and application settings.

use crate::cex::split_pair;
use crate::errors::{AppError, Result};
use bigdecimal::BigDecimal;
use std::str::FromStr;
use std::time::Duration;
use url::Url;

/// Venues with a concrete client implementation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VenueKind {
    Bitflyer,
    Quoine,
}

impl VenueKind {
    /// Name used in `VENUES` and as prefix of the per-venue keys.
    pub fn name(&self) -> &'static str {
        match self {
            VenueKind::Bitflyer => "bitflyer",
            VenueKind::Quoine => "quoine",
        }
    }

    pub fn default_base_url(&self) -> &'static str {
        match self {
            VenueKind::Bitflyer => "https://api.bitflyer.com",
            VenueKind::Quoine => "https://api.liquid.com",
        }
    }
}

impl FromStr for VenueKind {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "bitflyer" | "bitflyerlightning" => Ok(VenueKind::Bitflyer),
            "quoine" | "liquid" => Ok(VenueKind::Quoine),
            other => Err(AppError::Config(format!("unknown venue {other:?}"))),
        }
    }
}

/// API key pair used to sign private requests.
#[derive(Clone)]
pub struct Credentials {
    pub api_key: String,
    pub api_secret: String,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("api_key", &self.api_key)
            .field("api_secret", &"<redacted>")
            .finish()
    }
}

/// Settings for one configured venue.
#[derive(Debug, Clone)]
pub struct VenueConfig {
    pub kind: VenueKind,
    pub base_url: Url,
    /// `None` sends unsigned requests, enough for public market data.
    pub credentials: Option<Credentials>,
    pub timeout: Duration,
}

/// Consolidated application configuration.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Canonical pair, e.g. "BTC/JPY".
    pub pair: String,
    /// Levels kept per book side.
    pub depth: usize,
    pub poll_interval: Duration,
    /// Upper bound for a single venue fetch.
    pub fetch_timeout: Duration,
    pub trade_size: BigDecimal,
    /// Fixed cost subtracted from the trade cost (fees etc.).
    pub external_cost: BigDecimal,
    /// Minimum expected return rate for a signal.
    pub return_threshold: BigDecimal,
    pub venues: Vec<VenueConfig>,
    pub log_json: bool,
}

impl AppConfig {
    /// Load configuration from environment variables.
    pub fn load() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build configuration from an arbitrary key lookup.
    pub fn from_lookup(get: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let var = |key: &str, default: &str| -> String {
            get(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
                .unwrap_or_else(|| default.to_string())
        };

        let pair = var("PAIR", "BTC/JPY").to_ascii_uppercase();
        if split_pair(&pair).is_err() {
            return Err(AppError::Config(format!(
                "PAIR must look like BASE/QUOTE, got {pair:?}"
            )));
        }

        let depth = parse_num::<usize>("BOARD_DEPTH", &var("BOARD_DEPTH", "100"))?;
        let poll_secs = parse_num::<u64>("POLL_INTERVAL_SECS", &var("POLL_INTERVAL_SECS", "3"))?;
        if poll_secs == 0 {
            return Err(AppError::Config("POLL_INTERVAL_SECS must be positive".into()));
        }
        let timeout_secs =
            parse_num::<u64>("FETCH_TIMEOUT_SECS", &var("FETCH_TIMEOUT_SECS", "10"))?;
        if timeout_secs == 0 {
            return Err(AppError::Config("FETCH_TIMEOUT_SECS must be positive".into()));
        }
        let fetch_timeout = Duration::from_secs(timeout_secs);

        let trade_size = parse_decimal("TRADE_SIZE", &var("TRADE_SIZE", "0.2"))?;
        let external_cost = parse_decimal("EXTERNAL_COST", &var("EXTERNAL_COST", "0"))?;
        let return_threshold =
            parse_decimal("RETURN_THRESHOLD", &var("RETURN_THRESHOLD", "0.0001"))?;

        let mut venues = Vec::new();
        for name in var("VENUES", "bitflyer,quoine").split(',') {
            if name.trim().is_empty() {
                continue;
            }
            let kind: VenueKind = name.parse()?;
            if venues.iter().any(|v: &VenueConfig| v.kind == kind) {
                return Err(AppError::Config(format!("venue {} listed twice", kind.name())));
            }
            let prefix = kind.name().to_ascii_uppercase();
            let base_url = Url::parse(&var(
                &format!("{prefix}_BASE_URL"),
                kind.default_base_url(),
            ))?;
            let api_key = get(&format!("{prefix}_API_KEY")).filter(|v| !v.is_empty());
            let api_secret = get(&format!("{prefix}_API_SECRET")).filter(|v| !v.is_empty());
            let credentials = match (api_key, api_secret) {
                (Some(api_key), Some(api_secret)) => Some(Credentials {
                    api_key,
                    api_secret,
                }),
                (None, None) => None,
                _ => {
                    return Err(AppError::Config(format!(
                        "{prefix}_API_KEY and {prefix}_API_SECRET must be set together"
                    )));
                }
            };
            venues.push(VenueConfig {
                kind,
                base_url,
                credentials,
                timeout: fetch_timeout,
            });
        }
        if venues.len() < 2 {
            return Err(AppError::Config(
                "at least two venues are needed to compare boards".into(),
            ));
        }

        Ok(Self {
            pair,
            depth,
            poll_interval: Duration::from_secs(poll_secs),
            fetch_timeout,
            trade_size,
            external_cost,
            return_threshold,
            venues,
            log_json: var("LOG_FORMAT", "pretty").eq_ignore_ascii_case("json"),
        })
    }
}

fn parse_num<T: FromStr>(key: &str, raw: &str) -> Result<T> {
    raw.parse()
        .map_err(|_| AppError::Config(format!("{key} must be a non-negative integer, got {raw:?}")))
}

fn parse_decimal(key: &str, raw: &str) -> Result<BigDecimal> {
    BigDecimal::from_str(raw)
        .map_err(|_| AppError::Config(format!("{key} must be a decimal number, got {raw:?}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn load(pairs: &[(&str, &str)]) -> Result<AppConfig> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        AppConfig::from_lookup(|key| map.get(key).cloned())
    }

    #[test]
    fn defaults_match_reference_behaviour() {
        let cfg = load(&[]).unwrap();
        assert_eq!(cfg.pair, "BTC/JPY");
        assert_eq!(cfg.depth, 100);
        assert_eq!(cfg.poll_interval, Duration::from_secs(3));
        assert_eq!(cfg.trade_size, BigDecimal::from_str("0.2").unwrap());
        assert_eq!(cfg.external_cost, BigDecimal::from(0));
        assert_eq!(cfg.return_threshold, BigDecimal::from_str("0.0001").unwrap());
        assert_eq!(cfg.venues.len(), 2);
        assert_eq!(cfg.venues[0].kind, VenueKind::Bitflyer);
        assert_eq!(cfg.venues[1].kind, VenueKind::Quoine);
        assert!(cfg.venues.iter().all(|v| v.credentials.is_none()));
        assert!(!cfg.log_json);
    }

    #[test]
    fn per_venue_overrides_are_read() {
        let cfg = load(&[
            ("QUOINE_BASE_URL", "http://localhost:9000"),
            ("QUOINE_API_KEY", "123"),
            ("QUOINE_API_SECRET", "s3cr3t"),
            ("LOG_FORMAT", "JSON"),
        ])
        .unwrap();
        let quoine = &cfg.venues[1];
        assert_eq!(quoine.base_url.as_str(), "http://localhost:9000/");
        assert_eq!(quoine.credentials.as_ref().unwrap().api_key, "123");
        assert!(cfg.log_json);
    }

    #[test]
    fn invalid_values_are_rejected() {
        assert!(matches!(load(&[("PAIR", "BTCJPY")]), Err(AppError::Config(_))));
        assert!(matches!(load(&[("PAIR", "/BTC/JPY")]), Err(AppError::Config(_))));
        assert!(matches!(load(&[("PAIR", "BTC//JPY")]), Err(AppError::Config(_))));
        assert!(matches!(load(&[("TRADE_SIZE", "lots")]), Err(AppError::Config(_))));
        assert!(matches!(load(&[("POLL_INTERVAL_SECS", "0")]), Err(AppError::Config(_))));
        assert!(matches!(load(&[("VENUES", "bitflyer")]), Err(AppError::Config(_))));
        assert!(matches!(load(&[("VENUES", "bitflyer,kraken")]), Err(AppError::Config(_))));
        assert!(matches!(
            load(&[("BITFLYER_API_KEY", "only-key")]),
            Err(AppError::Config(_))
        ));
        assert!(matches!(
            load(&[("BITFLYER_BASE_URL", "not a url")]),
            Err(AppError::UrlParse(_))
        ));
    }

    #[test]
    fn secret_is_not_printed() {
        let creds = Credentials {
            api_key: "k".into(),
            api_secret: "hunter2".into(),
        };
        assert!(!format!("{creds:?}").contains("hunter2"));
    }
}
