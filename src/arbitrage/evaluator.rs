use super::types::{ArbitrageConfig, ArbitrageSignal, PairEvaluation};
use crate::errors::{AppError, BookSide, Result};
use crate::models::{BoardSnapshot, ExchangeId, OrderBook};
use bigdecimal::{BigDecimal, Zero};
use tracing::{debug, info, warn};

/// Evaluate one ordered pair: sell into `bid_book`'s best bid, buy from
/// `ask_book`'s best ask.
pub fn evaluate_pair(
    bid_venue: &ExchangeId,
    bid_book: &OrderBook,
    ask_venue: &ExchangeId,
    ask_book: &OrderBook,
    config: &ArbitrageConfig,
) -> Result<PairEvaluation> {
    let high_bid = &bid_book
        .best_bid()
        .ok_or_else(|| AppError::EmptyBook {
            exchange: bid_venue.to_string(),
            side: BookSide::Bids,
        })?
        .price;
    let low_ask = &ask_book
        .best_ask()
        .ok_or_else(|| AppError::EmptyBook {
            exchange: ask_venue.to_string(),
            side: BookSide::Asks,
        })?
        .price;

    let spread = low_ask - high_bid;
    let mut evaluation = PairEvaluation {
        bid_venue: bid_venue.clone(),
        ask_venue: ask_venue.clone(),
        spread: spread.clone(),
        signal: None,
    };
    if spread <= BigDecimal::zero() {
        return Ok(evaluation);
    }

    let revenue = low_ask * &config.trade_size;
    let cost = high_bid * &config.trade_size - &config.external_cost;
    if cost.is_zero() {
        return Err(AppError::DivisionByZero);
    }
    let profit = &revenue - &cost;
    let rate = &profit / &cost;

    if rate > config.threshold {
        evaluation.signal = Some(ArbitrageSignal {
            sell_venue: bid_venue.clone(),
            buy_venue: ask_venue.clone(),
            high_bid: high_bid.clone(),
            low_ask: low_ask.clone(),
            spread,
            expected_return_rate: rate,
            expected_profit: profit,
        });
    }
    Ok(evaluation)
}

/// Evaluate every ordered pair of distinct venues in the snapshot.
///
/// Pairs that cannot be evaluated (empty side, zero cost) are logged and
/// skipped; the rest are still scanned.
pub fn scan(snapshot: &BoardSnapshot, config: &ArbitrageConfig) -> Vec<ArbitrageSignal> {
    let mut signals = Vec::new();

    for (bid_venue, bid_book) in &snapshot.boards {
        for (ask_venue, ask_book) in &snapshot.boards {
            if bid_venue == ask_venue {
                continue;
            }
            match evaluate_pair(bid_venue, bid_book, ask_venue, ask_book, config) {
                Ok(eval) => {
                    debug!(
                        pair = %snapshot.pair,
                        ask_venue = %eval.ask_venue,
                        bid_venue = %eval.bid_venue,
                        spread = %eval.spread,
                        "[SPREAD]"
                    );
                    if let Some(signal) = eval.signal {
                        info!(
                            pair = %snapshot.pair,
                            expected_profit = %signal.expected_profit.with_scale(0),
                            "[OPP] {}",
                            signal.description()
                        );
                        signals.push(signal);
                    }
                }
                Err(e @ AppError::DivisionByZero) => {
                    debug!(%bid_venue, %ask_venue, error = %e, "[SPREAD] skipped pair");
                }
                Err(e) => {
                    warn!(%bid_venue, %ask_venue, error = %e, "[SPREAD] skipped pair");
                }
            }
        }
    }

    signals
}
