use super::normalize::book_from_values;
use super::rest::{RestClient, request_path};
use super::{ExchangeClient, split_pair};
use crate::config::{Credentials, VenueConfig};
use crate::errors::{AppError, Result};
use crate::models::{ExchangeId, Execution, Market, OrderBook, OrderSide, Ticker};
use crate::utils::{decimal_from_value, unix_secs_fractional};
use async_trait::async_trait;
use hmac::{Hmac, Mac};
use serde::Deserialize;
use serde_json::Value;
use sha2::Sha256;
use tracing::debug;

type HmacSha256 = Hmac<Sha256>;

#[derive(Debug, Deserialize)]
struct BoardMsg {
    bids: Vec<Value>,
    asks: Vec<Value>,
}

#[derive(Debug, Deserialize)]
struct MarketMsg {
    product_code: String,
}

#[derive(Debug, Deserialize)]
struct TickerMsg {
    best_bid: Value,
    best_ask: Value,
    ltp: Value,
    volume: Value,
}

#[derive(Debug, Deserialize)]
struct ExecutionMsg {
    id: u64,
    #[serde(default)]
    side: String,
    price: Value,
    size: Value,
    exec_date: String,
}

/// bitFlyer Lightning client (ACCESS-* HMAC header scheme).
pub struct BitflyerClient {
    id: ExchangeId,
    rest: RestClient,
    credentials: Option<Credentials>,
}

impl BitflyerClient {
    pub fn new(venue: &VenueConfig) -> Result<Self> {
        Ok(Self {
            id: ExchangeId::new(venue.kind.name()),
            rest: RestClient::new(venue.base_url.clone(), venue.timeout)?,
            credentials: venue.credentials.clone(),
        })
    }

    async fn get<T: serde::de::DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<T> {
        let path = request_path(path, query);
        let headers = self.auth_headers("GET", &path, "")?;
        self.rest.get_json(&path, &headers).await
    }

    fn auth_headers(
        &self,
        method: &str,
        path_with_query: &str,
        body: &str,
    ) -> Result<Vec<(&'static str, String)>> {
        let Some(creds) = &self.credentials else {
            return Ok(Vec::new());
        };
        let timestamp = unix_secs_fractional();
        let sign = sign(&creds.api_secret, &timestamp, method, path_with_query, body)?;
        Ok(vec![
            ("ACCESS-KEY", creds.api_key.clone()),
            ("ACCESS-TIMESTAMP", timestamp),
            ("ACCESS-SIGN", sign),
            ("Content-Type", "application/json".to_string()),
        ])
    }
}

/// `hex(HMAC-SHA256(secret, timestamp + method + path + body))`.
pub fn sign(
    secret: &str,
    timestamp: &str,
    method: &str,
    path_with_query: &str,
    body: &str,
) -> Result<String> {
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
        .map_err(|e| AppError::Auth(format!("invalid secret: {e}")))?;
    mac.update(timestamp.as_bytes());
    mac.update(method.as_bytes());
    mac.update(path_with_query.as_bytes());
    mac.update(body.as_bytes());
    Ok(hex::encode(mac.finalize().into_bytes()))
}

/// "BTC/JPY" -> "BTC_JPY".
pub fn product_code(pair: &str) -> Result<String> {
    let (base, quote) = split_pair(pair)?;
    Ok(format!("{base}_{quote}"))
}

fn parse_side(raw: &str) -> Option<OrderSide> {
    match raw {
        "BUY" => Some(OrderSide::Buy),
        "SELL" => Some(OrderSide::Sell),
        _ => None,
    }
}

/// "BTC_JPY" -> "BTC/JPY"; codes like "FX_BTC_JPY" or dated futures have no
/// canonical pair.
fn canonical_pair(code: &str) -> Option<String> {
    let (base, quote) = code.split_once('_')?;
    let plain = |s: &str| !s.is_empty() && s.chars().all(|c| c.is_ascii_alphabetic());
    (plain(base) && plain(quote)).then(|| format!("{base}/{quote}"))
}

fn market_from_msg(msg: MarketMsg) -> Market {
    Market {
        pair: canonical_pair(&msg.product_code),
        product_code: msg.product_code,
    }
}

fn ticker_from_msg(pair: &str, msg: &TickerMsg) -> Result<Ticker> {
    Ok(Ticker {
        pair: pair.to_string(),
        best_bid: decimal_from_value(&msg.best_bid)?,
        best_ask: decimal_from_value(&msg.best_ask)?,
        last_price: decimal_from_value(&msg.ltp)?,
        volume: decimal_from_value(&msg.volume)?,
    })
}

fn execution_from_msg(msg: ExecutionMsg) -> Result<Execution> {
    Ok(Execution {
        id: msg.id,
        side: parse_side(&msg.side),
        price: decimal_from_value(&msg.price)?,
        size: decimal_from_value(&msg.size)?,
        executed_at: msg.exec_date,
    })
}

#[async_trait]
impl ExchangeClient for BitflyerClient {
    fn id(&self) -> &ExchangeId {
        &self.id
    }

    async fn get_markets(&self) -> Result<Vec<Market>> {
        let markets: Vec<MarketMsg> = self.get("/v1/markets", &[]).await?;
        Ok(markets.into_iter().map(market_from_msg).collect())
    }

    async fn get_order_book(&self, pair: &str, depth: usize) -> Result<OrderBook> {
        let code = product_code(pair)?;
        let msg: BoardMsg = self.get("/v1/board", &[("product_code", code)]).await?;
        let book = book_from_values(&msg.bids, &msg.asks, depth)?;
        debug!(exchange = %self.id, bids = book.bids.len(), asks = book.asks.len(), "[BOARD] bitflyer board");
        Ok(book)
    }

    async fn get_ticker(&self, pair: &str) -> Result<Ticker> {
        let code = product_code(pair)?;
        let msg: TickerMsg = self.get("/v1/ticker", &[("product_code", code)]).await?;
        ticker_from_msg(pair, &msg)
    }

    async fn get_execution_log(&self, pair: &str, count: usize) -> Result<Vec<Execution>> {
        let code = product_code(pair)?;
        let msgs: Vec<ExecutionMsg> = self
            .get(
                "/v1/executions",
                &[("product_code", code), ("count", count.to_string())],
            )
            .await?;
        msgs.into_iter().map(execution_from_msg).collect()
    }
}
