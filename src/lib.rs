//! Core library for the board-arbitrage project.
//!
//! Venue clients (`cex`) feed the `aggregator`, whose snapshots are scanned
//! by `arbitrage`; `poller` drives the cycle on a fixed interval.

pub mod aggregator;
pub mod arbitrage;
pub mod cex;
pub mod config;
pub mod errors;
pub mod models;
pub mod poller;
pub mod utils;
