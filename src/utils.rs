//! Miscellaneous helper utilities.

use crate::errors::{AppError, Result};
use bigdecimal::BigDecimal;
use serde_json::Value;
use std::str::FromStr;
use std::time::{SystemTime, UNIX_EPOCH};
use tracing_subscriber::{EnvFilter, fmt};

/// Initialize `tracing` subscriber with env-based filter.
///
/// If `RUST_LOG` is not set, defaults to `info` level. `json` switches the
/// formatter to one JSON object per event.
pub fn init_logging(json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = fmt::Subscriber::builder()
        .with_env_filter(filter)
        .with_target(false);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

/// Parse a venue numeric that may arrive as a JSON number or a string.
pub fn decimal_from_value(value: &Value) -> Result<BigDecimal> {
    let raw = match value {
        Value::String(s) => s.trim().to_string(),
        Value::Number(n) => n.to_string(),
        other => {
            return Err(AppError::Format(format!("expected numeric, got {other}")));
        }
    };
    BigDecimal::from_str(&raw).map_err(|e| AppError::Format(format!("bad numeric {raw:?}: {e}")))
}

/// Like [`decimal_from_value`], but `null` or a missing field reads as zero.
pub fn decimal_or_zero(value: Option<&Value>) -> Result<BigDecimal> {
    match value {
        None | Some(Value::Null) => Ok(BigDecimal::from(0)),
        Some(v) => decimal_from_value(v),
    }
}

/// Seconds since the unix epoch.
pub fn unix_secs() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}

/// Seconds since the unix epoch with millisecond precision, e.g. `1700000000.123`.
pub fn unix_secs_fractional() -> String {
    let now = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default();
    format!("{}.{:03}", now.as_secs(), now.subsec_millis())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn decimals_parse_from_numbers_and_strings() {
        assert_eq!(
            decimal_from_value(&json!("1005000.5")).unwrap(),
            BigDecimal::from_str("1005000.5").unwrap()
        );
        assert_eq!(
            decimal_from_value(&json!(0.02)).unwrap(),
            BigDecimal::from_str("0.02").unwrap()
        );
        assert_eq!(
            decimal_from_value(&json!(1000000)).unwrap(),
            BigDecimal::from(1_000_000)
        );
    }

    #[test]
    fn non_numeric_values_are_format_errors() {
        assert!(matches!(
            decimal_from_value(&json!("abc")),
            Err(AppError::Format(_))
        ));
        assert!(matches!(
            decimal_from_value(&json!({"price": 1})),
            Err(AppError::Format(_))
        ));
        assert_eq!(decimal_or_zero(None).unwrap(), BigDecimal::from(0));
        assert_eq!(decimal_or_zero(Some(&Value::Null)).unwrap(), BigDecimal::from(0));
    }

    #[test]
    fn fractional_timestamp_has_millis() {
        let ts = unix_secs_fractional();
        let (secs, millis) = ts.split_once('.').unwrap();
        assert!(secs.parse::<u64>().unwrap() > 0);
        assert_eq!(millis.len(), 3);
    }
}
