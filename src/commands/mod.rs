//! CLI command handlers
//!
//! One module per user action; `main.rs` only parses arguments and
//! dispatches here.

pub mod baud;
pub mod board;
pub mod build;
pub mod cache;
pub mod doctor;
pub mod library;
pub mod monitor;
pub mod port;
pub mod status;
