//! Core domain types and logic.

pub mod candle;
pub mod config_validation;
pub mod error;
pub mod filter;
pub mod grid;
pub mod indicator;
pub mod strategy;
pub mod weighted;
