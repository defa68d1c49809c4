//! Shared data structures used throughout the application.

use crate::errors::{AppError, Result};
use bigdecimal::{BigDecimal, Zero};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::fmt;
use std::time::SystemTime;

/// Opaque key naming a configured venue.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ExchangeId(String);

impl ExchangeId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ExchangeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ExchangeId {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for ExchangeId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// One resting level of a book.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawPriceLevel")]
pub struct PriceLevel {
    pub price: BigDecimal,
    pub size: BigDecimal,
}

#[derive(Deserialize)]
struct RawPriceLevel {
    price: BigDecimal,
    size: BigDecimal,
}

impl TryFrom<RawPriceLevel> for PriceLevel {
    type Error = AppError;

    fn try_from(raw: RawPriceLevel) -> Result<Self> {
        Self::new(raw.price, raw.size)
    }
}

impl PriceLevel {
    /// Build a level, rejecting non-positive prices and negative sizes.
    pub fn new(price: BigDecimal, size: BigDecimal) -> Result<Self> {
        if price <= BigDecimal::zero() {
            return Err(AppError::Format(format!("non-positive price {price}")));
        }
        if size < BigDecimal::zero() {
            return Err(AppError::Format(format!("negative size {size}")));
        }
        Ok(Self { price, size })
    }
}

/// Normalized book: bids strictly descending, asks strictly ascending.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct OrderBook {
    pub bids: Vec<PriceLevel>,
    pub asks: Vec<PriceLevel>,
}

impl OrderBook {
    /// Sort both sides, merge equal prices and truncate to `depth` levels per
    /// side. A depth of zero keeps every level.
    pub fn new(bids: Vec<PriceLevel>, asks: Vec<PriceLevel>, depth: usize) -> Self {
        Self {
            bids: normalize_side(bids, depth, |a, b| b.cmp(a)),
            asks: normalize_side(asks, depth, |a, b| a.cmp(b)),
        }
    }

    pub fn best_bid(&self) -> Option<&PriceLevel> {
        self.bids.first()
    }

    pub fn best_ask(&self) -> Option<&PriceLevel> {
        self.asks.first()
    }
}

fn normalize_side(
    mut levels: Vec<PriceLevel>,
    depth: usize,
    order: impl Fn(&BigDecimal, &BigDecimal) -> Ordering,
) -> Vec<PriceLevel> {
    levels.sort_by(|a, b| order(&a.price, &b.price));

    let mut merged: Vec<PriceLevel> = Vec::with_capacity(levels.len());
    for level in levels {
        match merged.last_mut() {
            Some(last) if last.price == level.price => {
                last.size = &last.size + &level.size;
            }
            _ => merged.push(level),
        }
    }

    if depth > 0 {
        merged.truncate(depth);
    }
    merged
}

/// All books fetched for one pair during one poll cycle.
#[derive(Debug, Clone)]
pub struct BoardSnapshot {
    pub pair: String,
    pub fetched_at: SystemTime,
    pub boards: BTreeMap<ExchangeId, OrderBook>,
    /// Venues skipped this cycle, with the reason.
    pub failures: BTreeMap<ExchangeId, String>,
}

impl BoardSnapshot {
    pub fn new(pair: impl Into<String>) -> Self {
        Self {
            pair: pair.into(),
            fetched_at: SystemTime::now(),
            boards: BTreeMap::new(),
            failures: BTreeMap::new(),
        }
    }

    pub fn with_board(mut self, exchange: impl Into<ExchangeId>, book: OrderBook) -> Self {
        self.boards.insert(exchange.into(), book);
        self
    }
}

/// Entry of a venue's market list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Market {
    /// Canonical `BASE/QUOTE`, when the venue's code maps onto one.
    pub pair: Option<String>,
    /// Venue-native code (`BTC_JPY` on bitFlyer, `BTCJPY` on Quoine).
    pub product_code: String,
}

/// Best prices and last trade for a pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Ticker {
    pub pair: String,
    pub best_bid: BigDecimal,
    pub best_ask: BigDecimal,
    pub last_price: BigDecimal,
    pub volume: BigDecimal,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum OrderSide {
    Buy,
    Sell,
}

/// One fill from a venue's public trade log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Execution {
    pub id: u64,
    pub side: Option<OrderSide>,
    pub price: BigDecimal,
    pub size: BigDecimal,
    pub executed_at: String,
}

/// Order placement request. Clients only declare the capability.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderRequest {
    pub pair: String,
    pub side: OrderSide,
    pub size: BigDecimal,
    /// `None` for a market order.
    pub price: Option<BigDecimal>,
}
