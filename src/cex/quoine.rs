use super::normalize::book_from_values;
use super::rest::{RestClient, request_path};
use super::{ExchangeClient, split_pair};
use crate::config::{Credentials, VenueConfig};
use crate::errors::{AppError, Result};
use crate::models::{ExchangeId, Execution, Market, OrderBook, OrderSide, Ticker};
use crate::utils::{decimal_from_value, decimal_or_zero, unix_secs};
use async_trait::async_trait;
use jsonwebtoken::{Algorithm, EncodingKey, Header, encode};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use tokio::sync::RwLock;
use tracing::{debug, info};

const API_VERSION: &str = "2";
/// The venue returns this many levels per side unless `full=1` is asked for.
const DEFAULT_LEVELS: usize = 20;
const KNOWN_PRODUCT_IDS: [(&str, u64); 1] = [("BTC/JPY", 5)];

/// Claims of the `X-Quoine-Auth` token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthClaims {
    pub path: String,
    pub nonce: String,
    pub token_id: String,
}

#[derive(Debug, Deserialize)]
struct PriceLevelsMsg {
    buy_price_levels: Vec<Value>,
    sell_price_levels: Vec<Value>,
}

#[derive(Debug, Deserialize)]
struct ProductMsg {
    id: Value,
    currency_pair_code: String,
    #[serde(default)]
    base_currency: Option<String>,
    #[serde(default)]
    quoted_currency: Option<String>,
    #[serde(default)]
    market_bid: Option<Value>,
    #[serde(default)]
    market_ask: Option<Value>,
    #[serde(default)]
    last_traded_price: Option<Value>,
    #[serde(default)]
    volume_24h: Option<Value>,
}

#[derive(Debug, Deserialize)]
struct ExecutionsMsg {
    models: Vec<ExecutionMsg>,
}

#[derive(Debug, Deserialize)]
struct ExecutionMsg {
    id: u64,
    quantity: Value,
    price: Value,
    #[serde(default)]
    taker_side: String,
    created_at: Value,
}

/// Quoine / Liquid client (JWT header scheme).
pub struct QuoineClient {
    id: ExchangeId,
    rest: RestClient,
    credentials: Option<Credentials>,
    product_ids: RwLock<HashMap<String, u64>>,
}

impl QuoineClient {
    pub fn new(venue: &VenueConfig) -> Result<Self> {
        let known = KNOWN_PRODUCT_IDS
            .iter()
            .map(|(pair, id)| (pair.to_string(), *id))
            .collect();
        Ok(Self {
            id: ExchangeId::new(venue.kind.name()),
            rest: RestClient::new(venue.base_url.clone(), venue.timeout)?,
            credentials: venue.credentials.clone(),
            product_ids: RwLock::new(known),
        })
    }

    async fn get<T: serde::de::DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<T> {
        let path = request_path(path, query);
        let headers = self.auth_headers(&path)?;
        self.rest.get_json(&path, &headers).await
    }

    fn auth_headers(&self, path_with_query: &str) -> Result<Vec<(&'static str, String)>> {
        let mut headers = vec![
            ("X-Quoine-API-Version", API_VERSION.to_string()),
            ("Content-Type", "application/json".to_string()),
        ];
        if let Some(creds) = &self.credentials {
            let token = auth_token(
                path_with_query,
                &creds.api_key,
                &creds.api_secret,
                &unix_secs().to_string(),
            )?;
            headers.push(("X-Quoine-Auth", token));
        }
        Ok(headers)
    }

    async fn products(&self) -> Result<Vec<ProductMsg>> {
        self.get("/products", &[]).await
    }

    /// Numeric product id for a pair; unknown pairs are looked up once via
    /// `/products` and cached.
    async fn product_id(&self, pair: &str) -> Result<u64> {
        if let Some(id) = self.product_ids.read().await.get(pair) {
            return Ok(*id);
        }
        let (base, quote) = split_pair(pair)?;
        let code = format!("{base}{quote}");
        let product = self
            .products()
            .await?
            .into_iter()
            .find(|p| p.currency_pair_code.eq_ignore_ascii_case(&code))
            .ok_or_else(|| AppError::Format(format!("{}: unknown pair {pair}", self.id)))?;
        let id = product_id_from_value(&product.id)?;
        info!(exchange = %self.id, pair, id, "[INIT] resolved product id");
        self.product_ids.write().await.insert(pair.to_string(), id);
        Ok(id)
    }
}

/// HS256 token over `{path, nonce, token_id}`.
pub fn auth_token(path: &str, token_id: &str, secret: &str, nonce: &str) -> Result<String> {
    let claims = AuthClaims {
        path: path.to_string(),
        nonce: nonce.to_string(),
        token_id: token_id.to_string(),
    };
    Ok(encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )?)
}

fn product_id_from_value(raw: &Value) -> Result<u64> {
    match raw {
        Value::Number(n) => n.as_u64(),
        Value::String(s) => s.parse().ok(),
        _ => None,
    }
    .ok_or_else(|| AppError::Format(format!("bad product id {raw}")))
}

fn parse_side(raw: &str) -> Option<OrderSide> {
    match raw {
        "buy" => Some(OrderSide::Buy),
        "sell" => Some(OrderSide::Sell),
        _ => None,
    }
}

fn market_from_msg(msg: ProductMsg) -> Market {
    let pair = match (&msg.base_currency, &msg.quoted_currency) {
        (Some(base), Some(quote)) if !base.is_empty() && !quote.is_empty() => {
            Some(format!("{base}/{quote}").to_ascii_uppercase())
        }
        _ => None,
    };
    Market {
        pair,
        product_code: msg.currency_pair_code,
    }
}

fn ticker_from_msg(pair: &str, msg: &ProductMsg) -> Result<Ticker> {
    Ok(Ticker {
        pair: pair.to_string(),
        best_bid: decimal_or_zero(msg.market_bid.as_ref())?,
        best_ask: decimal_or_zero(msg.market_ask.as_ref())?,
        last_price: decimal_or_zero(msg.last_traded_price.as_ref())?,
        volume: decimal_or_zero(msg.volume_24h.as_ref())?,
    })
}

/// `created_at` arrives as unix seconds (number) or a string; either way it
/// is kept as text.
fn execution_from_msg(msg: ExecutionMsg) -> Result<Execution> {
    Ok(Execution {
        id: msg.id,
        side: parse_side(&msg.taker_side),
        price: decimal_from_value(&msg.price)?,
        size: decimal_from_value(&msg.quantity)?,
        executed_at: match msg.created_at {
            Value::String(s) => s,
            other => other.to_string(),
        },
    })
}

#[async_trait]
impl ExchangeClient for QuoineClient {
    fn id(&self) -> &ExchangeId {
        &self.id
    }

    async fn get_markets(&self) -> Result<Vec<Market>> {
        Ok(self
            .products()
            .await?
            .into_iter()
            .map(market_from_msg)
            .collect())
    }

    async fn get_order_book(&self, pair: &str, depth: usize) -> Result<OrderBook> {
        let id = self.product_id(pair).await?;
        let full = if depth == 0 || depth > DEFAULT_LEVELS { "1" } else { "0" };
        let msg: PriceLevelsMsg = self
            .get(
                &format!("/products/{id}/price_levels"),
                &[("full", full.to_string())],
            )
            .await?;
        let book = book_from_values(&msg.buy_price_levels, &msg.sell_price_levels, depth)?;
        debug!(exchange = %self.id, bids = book.bids.len(), asks = book.asks.len(), "[BOARD] quoine board");
        Ok(book)
    }

    async fn get_ticker(&self, pair: &str) -> Result<Ticker> {
        let id = self.product_id(pair).await?;
        let msg: ProductMsg = self.get(&format!("/products/{id}"), &[]).await?;
        ticker_from_msg(pair, &msg)
    }

    async fn get_execution_log(&self, pair: &str, count: usize) -> Result<Vec<Execution>> {
        let id = self.product_id(pair).await?;
        let msg: ExecutionsMsg = self
            .get(
                "/executions",
                &[("product_id", id.to_string()), ("limit", count.to_string())],
            )
            .await?;
        msg.models.into_iter().map(execution_from_msg).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::VenueKind;
    use bigdecimal::BigDecimal;
    use jsonwebtoken::{DecodingKey, Validation, decode};
    use std::collections::HashSet;
    use std::str::FromStr;
    use std::time::Duration;
    use url::Url;

    fn client(credentials: Option<Credentials>) -> QuoineClient {
        QuoineClient::new(&VenueConfig {
            kind: VenueKind::Quoine,
            base_url: Url::parse("https://api.liquid.com").unwrap(),
            credentials,
            timeout: Duration::from_secs(1),
        })
        .unwrap()
    }

    fn decode_claims(token: &str, secret: &str) -> AuthClaims {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.required_spec_claims = HashSet::new();
        validation.validate_exp = false;
        decode::<AuthClaims>(token, &DecodingKey::from_secret(secret.as_bytes()), &validation)
            .expect("token should verify")
            .claims
    }

    #[test]
    fn auth_token_carries_path_nonce_and_key() {
        let token = auth_token("/products/5/price_levels?full=1", "579911", "secret", "1700000000")
            .unwrap();
        let claims = decode_claims(&token, "secret");
        assert_eq!(
            claims,
            AuthClaims {
                path: "/products/5/price_levels?full=1".into(),
                nonce: "1700000000".into(),
                token_id: "579911".into(),
            }
        );
        let header = jsonwebtoken::decode_header(&token).unwrap();
        assert_eq!(header.alg, Algorithm::HS256);
    }

    #[test]
    fn version_header_always_sent_auth_only_with_credentials() {
        let public = client(None).auth_headers("/products").unwrap();
        assert!(public.iter().any(|(k, v)| *k == "X-Quoine-API-Version" && v == "2"));
        assert!(!public.iter().any(|(k, _)| *k == "X-Quoine-Auth"));

        let signed = client(Some(Credentials {
            api_key: "42".into(),
            api_secret: "shh".into(),
        }))
        .auth_headers("/products")
        .unwrap();
        let (_, token) = signed
            .iter()
            .find(|(k, _)| *k == "X-Quoine-Auth")
            .expect("auth header");
        let claims = decode_claims(token, "shh");
        assert_eq!(claims.path, "/products");
        assert_eq!(claims.token_id, "42");
        assert!(claims.nonce.parse::<u64>().unwrap() > 0);
    }

    #[tokio::test]
    async fn known_pairs_resolve_without_network() {
        assert_eq!(client(None).product_id("BTC/JPY").await.unwrap(), 5);
    }

    #[test]
    fn price_levels_message_normalizes() {
        let raw = r#"{
            "buy_price_levels": [["999000.0", "0.1"], ["1000000.0", "0.02"]],
            "sell_price_levels": [["1006000.0", "0.3"], ["1005000.0", "0.05"]]
        }"#;
        let msg: PriceLevelsMsg = serde_json::from_str(raw).expect("json should parse");
        let book =
            book_from_values(&msg.buy_price_levels, &msg.sell_price_levels, 0).unwrap();
        assert_eq!(book.best_bid().unwrap().price, BigDecimal::from(1_000_000));
        assert_eq!(book.best_ask().unwrap().price, BigDecimal::from(1_005_000));
        assert_eq!(book.best_ask().unwrap().size, BigDecimal::from_str("0.05").unwrap());
    }

    #[test]
    fn product_ids_accept_numbers_and_strings() {
        assert_eq!(product_id_from_value(&serde_json::json!("5")).unwrap(), 5);
        assert_eq!(product_id_from_value(&serde_json::json!(29)).unwrap(), 29);
        assert!(product_id_from_value(&serde_json::json!("x")).is_err());
        assert_eq!(parse_side("sell"), Some(OrderSide::Sell));
    }

    #[test]
    fn product_message_converts_with_null_quotes() {
        let raw = r#"{
            "id": "5",
            "product_type": "CurrencyPair",
            "code": "CASH",
            "currency_pair_code": "BTCJPY",
            "base_currency": "BTC",
            "quoted_currency": "JPY",
            "market_bid": null,
            "market_ask": "1005000.5",
            "last_traded_price": 1002000.0,
            "volume_24h": "123.4567"
        }"#;
        let msg: ProductMsg = serde_json::from_str(raw).expect("json should parse");
        assert_eq!(product_id_from_value(&msg.id).unwrap(), 5);

        let ticker = ticker_from_msg("BTC/JPY", &msg).unwrap();
        assert_eq!(ticker.best_bid, BigDecimal::from(0));
        assert_eq!(ticker.best_ask, BigDecimal::from_str("1005000.5").unwrap());
        assert_eq!(ticker.last_price, BigDecimal::from(1_002_000));
        assert_eq!(ticker.volume, BigDecimal::from_str("123.4567").unwrap());

        let market = market_from_msg(msg);
        assert_eq!(market.pair.as_deref(), Some("BTC/JPY"));
        assert_eq!(market.product_code, "BTCJPY");
    }

    #[test]
    fn product_without_quote_fields_reads_as_zero() {
        let msg: ProductMsg =
            serde_json::from_str(r#"{"id": 29, "currency_pair_code": "ETHBTC"}"#)
                .expect("json should parse");
        let ticker = ticker_from_msg("ETH/BTC", &msg).unwrap();
        assert_eq!(ticker.best_ask, BigDecimal::from(0));
        assert_eq!(ticker.volume, BigDecimal::from(0));
        assert_eq!(market_from_msg(msg).pair, None);
    }

    #[test]
    fn executions_message_converts() {
        let raw = r#"{
            "models": [
                {"id": 1011880, "quantity": "0.01", "price": "1000000.0",
                 "taker_side": "sell", "created_at": 1457193899},
                {"id": 1011879, "quantity": 0.5, "price": 999500,
                 "taker_side": "buy", "created_at": "1457193890"},
                {"id": 1011878, "quantity": "1.0", "price": "999000.0",
                 "created_at": 1457193880}
            ],
            "current_page": 1,
            "total_pages": 1
        }"#;
        let msg: ExecutionsMsg = serde_json::from_str(raw).expect("json should parse");
        let execs = msg
            .models
            .into_iter()
            .map(execution_from_msg)
            .collect::<Result<Vec<_>>>()
            .unwrap();
        assert_eq!(execs.len(), 3);
        assert_eq!(execs[0].id, 1011880);
        assert_eq!(execs[0].side, Some(OrderSide::Sell));
        assert_eq!(execs[0].price, BigDecimal::from(1_000_000));
        assert_eq!(execs[0].size, BigDecimal::from_str("0.01").unwrap());
        assert_eq!(execs[0].executed_at, "1457193899");
        assert_eq!(execs[1].side, Some(OrderSide::Buy));
        assert_eq!(execs[1].executed_at, "1457193890");
        assert_eq!(execs[2].side, None);
    }
}
