//! Gradient-boosted decision trees for binary classification
//!
//! - `binning`: quantile thresholds and bin indices per feature
//! - `cart`: histogram-based tree growth with deterministic tie-breaking
//! - `booster`: logistic-loss boosting loop ([`GbdtTrainer`])
//! - `model`: the fitted ensemble ([`GbdtClassifier`])
//! - `tree`: node layout and traversal

pub mod binning;
pub mod booster;
pub mod cart;
pub mod model;
pub mod tree;

pub use booster::{GbdtConfig, GbdtTrainer};
pub use model::{GbdtClassifier, MODEL_TYPE, MODEL_VERSION};
pub use tree::{Node, Tree};
