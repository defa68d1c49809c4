//! CEX REST clients.
//!
//! Responsibilities:
//! • Sign requests with each venue's header scheme.
//! • Fetch market data and normalize it into the shared models.
//! • Declare (but refuse) order placement.

use crate::config::{VenueConfig, VenueKind};
use crate::errors::{AppError, Result};
use crate::models::{ExchangeId, Execution, Market, OrderBook, OrderRequest, Ticker};
use async_trait::async_trait;
use std::sync::Arc;

pub mod bitflyer;
pub mod normalize;
pub mod quoine;
pub mod rest;

pub use bitflyer::BitflyerClient;
pub use quoine::QuoineClient;

/// Capability set every venue client exposes.
#[async_trait]
pub trait ExchangeClient: Send + Sync {
    fn id(&self) -> &ExchangeId;

    async fn get_markets(&self) -> Result<Vec<Market>>;

    /// Book for `pair` ("BASE/QUOTE"), at most `depth` levels per side.
    async fn get_order_book(&self, pair: &str, depth: usize) -> Result<OrderBook>;

    async fn get_ticker(&self, pair: &str) -> Result<Ticker>;

    /// Most recent public fills, newest first.
    async fn get_execution_log(&self, pair: &str, count: usize) -> Result<Vec<Execution>>;

    async fn buy(&self, _order: &OrderRequest) -> Result<String> {
        Err(AppError::Unsupported(format!("{}: order placement", self.id())))
    }

    async fn sell(&self, _order: &OrderRequest) -> Result<String> {
        Err(AppError::Unsupported(format!("{}: order placement", self.id())))
    }
}

/// Instantiate the client for a configured venue.
pub fn build_client(venue: &VenueConfig) -> Result<Arc<dyn ExchangeClient>> {
    Ok(match venue.kind {
        VenueKind::Bitflyer => Arc::new(BitflyerClient::new(venue)?),
        VenueKind::Quoine => Arc::new(QuoineClient::new(venue)?),
    })
}

/// Split "BASE/QUOTE" into its parts.
pub(crate) fn split_pair(pair: &str) -> Result<(&str, &str)> {
    match pair.split_once('/') {
        Some((base, quote)) if !base.is_empty() && !quote.is_empty() && !quote.contains('/') => {
            Ok((base, quote))
        }
        _ => Err(AppError::Format(format!("pair must be BASE/QUOTE, got {pair:?}"))),
    }
}
