// src/lib.rs
pub mod broker;
pub mod config;
pub mod decision_engine;
pub mod errors;
pub mod indicators;
pub mod market_data;
pub mod scheduler;
pub mod stats;
pub mod telegram_notifier;
pub mod trade_judge;
pub mod types;
