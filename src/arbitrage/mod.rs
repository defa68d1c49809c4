pub mod evaluator;
pub mod types;

pub use evaluator::{evaluate_pair, scan};
pub use types::{ArbitrageConfig, ArbitrageSignal, PairEvaluation};
