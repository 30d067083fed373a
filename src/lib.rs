//! Allocates stocked material rolls to prioritized cut requests.
//!
//! A run groups rolls and requests by material, packs each group with one of
//! the registered strategies, completes over-long units by length collage, and
//! folds the result into a [`Plan`].

pub mod accounting;
pub mod aggregate;
pub mod collage;
pub mod config;
pub mod error;
pub mod ledger;
pub mod partition;
pub mod render;
pub mod roll_bin;
pub mod solver;
pub mod strategy;
pub mod types;

#[cfg(test)]
mod test_support;

pub use aggregate::{Comparison, StrategyResult, compare_plans};
pub use config::{Job, RunOptions};
pub use error::{OptimizeError, Result};
pub use solver::{CancelToken, Solver, compare, optimize};
pub use strategy::{Strategy, StrategyInfo, StrategyKind, registry};
pub use types::{Plan, Priority, Request, Roll};
