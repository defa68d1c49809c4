use crate::models::ExchangeId;
use bigdecimal::BigDecimal;
use serde::Serialize;
use std::str::FromStr;

/// Configuration for arbitrage calculations
#[derive(Debug, Clone)]
pub struct ArbitrageConfig {
    /// Quantity of the base asset per trade.
    pub trade_size: BigDecimal,
    /// Fixed cost subtracted from the trade cost.
    pub external_cost: BigDecimal,
    /// A signal fires only when the expected return rate is strictly above this.
    pub threshold: BigDecimal,
}

impl Default for ArbitrageConfig {
    fn default() -> Self {
        Self {
            trade_size: BigDecimal::from_str("0.2").unwrap_or_default(),
            external_cost: BigDecimal::from(0),
            threshold: BigDecimal::from_str("0.0001").unwrap_or_default(),
        }
    }
}

/// Opportunity between a bid venue and an ask venue.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ArbitrageSignal {
    /// Venue whose best bid is used.
    pub sell_venue: ExchangeId,
    /// Venue whose best ask is used.
    pub buy_venue: ExchangeId,
    pub high_bid: BigDecimal,
    pub low_ask: BigDecimal,
    pub spread: BigDecimal,
    pub expected_return_rate: BigDecimal,
    /// In quote currency.
    pub expected_profit: BigDecimal,
}

impl ArbitrageSignal {
    pub fn description(&self) -> String {
        format!(
            "{} bid @ {} / {} ask @ {} | spread {} | rate {} | Earn {}",
            self.sell_venue,
            self.high_bid,
            self.buy_venue,
            self.low_ask,
            self.spread,
            self.expected_return_rate.round(6),
            self.expected_profit.with_scale(0),
        )
    }
}

/// Result of evaluating one ordered venue pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PairEvaluation {
    pub bid_venue: ExchangeId,
    pub ask_venue: ExchangeId,
    /// `low_ask - high_bid`.
    pub spread: BigDecimal,
    pub signal: Option<ArbitrageSignal>,
}
