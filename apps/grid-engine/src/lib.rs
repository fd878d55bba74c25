// Allow unwrap/expect in tests - tests should panic on unexpected errors
// Allow test-specific patterns and pedantic lints in test code
#![cfg_attr(
    test,
    allow(
        clippy::unwrap_used,
        clippy::expect_used,
        clippy::float_cmp,
        clippy::significant_drop_tightening,
        clippy::too_many_lines,
        clippy::match_same_arms,
        clippy::needless_pass_by_value,
        clippy::default_trait_access,
        clippy::items_after_statements,
        clippy::or_fun_call
    )
)]

//! Grid Engine - Rust Core Library
//!
//! Deterministic grid-strategy simulation, parameter optimization, and
//! market-wide screening.
//!
//! # Modules
//!
//! - [`market`]: bar types, kline intervals, the `KlineSource` and
//!   `SymbolUniverse` collaborator traits, a Binance spot REST adapter
//!   with bounded retry, and an in-memory test double.
//! - [`sim`]: the grid strategy simulator. Replays historical bars
//!   through a fixed price grid (evenly spaced buy lines, take-profit
//!   sells) and derives performance metrics.
//! - [`search`]: parameter search. Generates a bounded candidate
//!   lattice from train-segment percentiles, evaluates it in parallel,
//!   ranks deterministically, and validates the winner out-of-sample.
//! - [`screening`]: asynchronous market-wide screening with a pollable
//!   task registry, bounded worker pool, per-symbol timeouts, and
//!   cooperative cancellation.
//! - [`server`]: axum HTTP/JSON API over the above.
//! - [`config`]: YAML + environment configuration.

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::pedantic)]

pub mod config;
pub mod error;
pub mod market;
pub mod screening;
pub mod search;
pub mod server;
pub mod sim;

pub use config::{Config, ConfigError};
pub use error::EngineError;
