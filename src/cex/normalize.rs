//! Conversion of raw venue levels into canonical [`PriceLevel`]s.
//!
//! Venues encode a level either positionally (`["1005000", "0.3"]`) or as an
//! object (`{"price": 1005000, "size": 0.3}`); numerics may be JSON numbers
//! or strings.

use crate::errors::{AppError, Result};
use crate::models::{OrderBook, PriceLevel};
use crate::utils::decimal_from_value;
use serde_json::Value;

const SIZE_KEYS: [&str; 3] = ["size", "quantity", "amount"];

/// Parse one raw level.
pub fn level_from_value(raw: &Value) -> Result<PriceLevel> {
    let (price, size) = match raw {
        Value::Array(items) if items.len() >= 2 => (&items[0], &items[1]),
        Value::Object(map) => {
            let price = map
                .get("price")
                .ok_or_else(|| AppError::Format(format!("level without price: {raw}")))?;
            let size = SIZE_KEYS
                .iter()
                .find_map(|k| map.get(*k))
                .ok_or_else(|| AppError::Format(format!("level without size: {raw}")))?;
            (price, size)
        }
        other => return Err(AppError::Format(format!("unrecognised level: {other}"))),
    };
    PriceLevel::new(decimal_from_value(price)?, decimal_from_value(size)?)
}

/// Build a normalized book from raw bid and ask levels.
pub fn book_from_values(bids: &[Value], asks: &[Value], depth: usize) -> Result<OrderBook> {
    let bids = bids.iter().map(level_from_value).collect::<Result<Vec<_>>>()?;
    let asks = asks.iter().map(level_from_value).collect::<Result<Vec<_>>>()?;
    Ok(OrderBook::new(bids, asks, depth))
}

#[cfg(test)]
mod tests {
    use super::*;
    use bigdecimal::BigDecimal;
    use serde_json::json;
    use std::str::FromStr;

    fn assert_sorted(book: &OrderBook) {
        assert!(book.bids.windows(2).all(|w| w[0].price > w[1].price));
        assert!(book.asks.windows(2).all(|w| w[0].price < w[1].price));
    }

    #[test]
    fn positional_string_levels_are_sorted() {
        let bids = json!([["999000", "0.1"], ["1000000.5", "0.02"], ["998000", "1"]]);
        let asks = json!([["1006000", "0.3"], ["1005000", "0.05"]]);
        let book = book_from_values(
            bids.as_array().unwrap(),
            asks.as_array().unwrap(),
            0,
        )
        .unwrap();
        assert_sorted(&book);
        assert_eq!(
            book.best_bid().unwrap().price,
            BigDecimal::from_str("1000000.5").unwrap()
        );
        assert_eq!(book.best_ask().unwrap().price, BigDecimal::from(1_005_000));
    }

    #[test]
    fn keyed_numeric_levels_are_sorted() {
        let bids = json!([{"price": 995000, "size": 0.05}, {"price": 1000000, "size": 0.02}]);
        let asks = json!([{"price": 1060000, "quantity": "0.05"}, {"price": 1005000, "size": 0.3}]);
        let book = book_from_values(
            bids.as_array().unwrap(),
            asks.as_array().unwrap(),
            0,
        )
        .unwrap();
        assert_sorted(&book);
        assert_eq!(book.best_bid().unwrap().size, BigDecimal::from_str("0.02").unwrap());
        assert_eq!(book.asks[1].size, BigDecimal::from_str("0.05").unwrap());
    }

    #[test]
    fn malformed_levels_are_format_errors() {
        for raw in [
            json!(["100"]),
            json!({"size": 1}),
            json!({"price": 1}),
            json!("100"),
            json!(["abc", "1"]),
            json!([true, "1"]),
            json!(["0", "1"]),
        ] {
            assert!(
                matches!(level_from_value(&raw), Err(AppError::Format(_))),
                "expected format error for {raw}"
            );
        }
    }

    #[test]
    fn top_level_survives_reserialization() {
        let cases = [
            json!([["1005000.25", "0.30000001"]]),
            json!([{"price": "1005000.25", "size": "0.30000001"}]),
        ];
        for raw in cases {
            let book = book_from_values(&[], raw.as_array().unwrap(), 0).unwrap();
            let top = serde_json::to_value(book.best_ask().unwrap()).unwrap();
            let back: PriceLevel = serde_json::from_value(top).unwrap();
            assert_eq!(back.price, BigDecimal::from_str("1005000.25").unwrap());
            assert_eq!(back.size, BigDecimal::from_str("0.30000001").unwrap());
        }
    }
}
