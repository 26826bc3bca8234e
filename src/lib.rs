//! # inox - arduino-cli from the terminal
//!
//! inox wraps `arduino-cli` with the conveniences of an editor integration:
//! a per-project board/port/baud configuration, cached board and library
//! listings, interactive pickers, and one-word compile/upload/monitor.
//!
//! ## Quick Start
//!
//! ```bash
//! # Pick the board and port once
//! inox board
//! inox port
//!
//! # Build, flash and watch the serial output
//! inox upload
//! inox monitor
//! ```
//!
//! ## Module Organization
//!
//! - [`runner`] - Spawning `arduino-cli` and streaming its output
//! - [`cache`] - Time-boxed listing cache with fallbacks
//! - [`boards`] / [`libraries`] - The two cached datasets
//! - [`config`] / [`settings`] - Project and user configuration
//! - [`commands`] - CLI command handlers

/// Board listing and built-in defaults.
pub mod boards;

/// Listing cache with fresh/live/stale/default fallbacks.
pub mod cache;

/// CLI command handlers extracted from main.
pub mod commands;

/// Project configuration (`arduino.json`).
pub mod config;

/// Per-invocation state shared by commands.
pub mod context;

/// Library listing join and management.
pub mod libraries;

/// Diagnostic logging setup.
pub mod logging;

/// Serial port detection.
pub mod ports;

/// `arduino-cli` subprocess runner.
pub mod runner;

/// User settings (`settings.toml`).
pub mod settings;

/// Sketch discovery.
pub mod sketch;

/// Terminal UI utilities (tables, spinners, prompts).
pub mod ui;
