//! Board aggregation across all configured venues.

use crate::cex::ExchangeClient;
use crate::errors::{AppError, Result};
use crate::models::{BoardSnapshot, ExchangeId, OrderBook};
use futures::future::join_all;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

/// Fetches one book per venue for the same pair at roughly the same instant.
#[derive(Clone)]
pub struct BoardAggregator {
    clients: Vec<Arc<dyn ExchangeClient>>,
    fetch_timeout: Duration,
}

impl BoardAggregator {
    pub fn new(clients: Vec<Arc<dyn ExchangeClient>>, fetch_timeout: Duration) -> Self {
        Self {
            clients,
            fetch_timeout,
        }
    }

    pub fn exchange_ids(&self) -> Vec<&ExchangeId> {
        self.clients.iter().map(|c| c.id()).collect()
    }

    pub fn client(&self, exchange: &ExchangeId) -> Option<&Arc<dyn ExchangeClient>> {
        self.clients.iter().find(|c| c.id() == exchange)
    }

    /// Fetch every venue concurrently and wait for all of them. A venue that
    /// fails or times out is recorded in `failures` and left out of `boards`.
    pub async fn get_all_boards(&self, pair: &str, depth: usize) -> BoardSnapshot {
        let fetches = self.clients.iter().map(|client| async move {
            (client.id().clone(), self.fetch(client.as_ref(), pair, depth).await)
        });
        let results = join_all(fetches).await;

        let mut snapshot = BoardSnapshot::new(pair);
        for (id, result) in results {
            match result {
                Ok(book) => {
                    debug!(exchange = %id, bids = book.bids.len(), asks = book.asks.len(), "[BOARD] fetched");
                    snapshot.boards.insert(id, book);
                }
                Err(e) => {
                    warn!(exchange = %id, error = %e, "[BOARD] fetch failed, skipping venue this cycle");
                    snapshot.failures.insert(id, e.to_string());
                }
            }
        }
        snapshot
    }

    /// Fetch a single named venue.
    pub async fn get_board(
        &self,
        exchange: &ExchangeId,
        pair: &str,
        depth: usize,
    ) -> Result<OrderBook> {
        let client = self
            .client(exchange)
            .ok_or_else(|| AppError::Config(format!("venue {exchange} is not configured")))?;
        self.fetch(client.as_ref(), pair, depth).await
    }

    async fn fetch(
        &self,
        client: &dyn ExchangeClient,
        pair: &str,
        depth: usize,
    ) -> Result<OrderBook> {
        match tokio::time::timeout(self.fetch_timeout, client.get_order_book(pair, depth)).await {
            Ok(result) => result,
            Err(_) => Err(AppError::Network(format!(
                "{}: no board within {:?}",
                client.id(),
                self.fetch_timeout
            ))),
        }
    }
}
