//! `pt-analyzer` - Profit-Taker run analyzer for Warframe `EE.log` files
//!
//! This library reconstructs timed Profit-Taker runs from the game's log,
//! either from a finished file or by following the live log, and publishes
//! the results for a companion app.

pub mod cli;
pub mod config;
pub mod error;
pub mod observability;
pub mod parser;
pub mod publish;
pub mod report;
pub mod server;
pub mod session;
pub mod source;
pub mod timing;
