//! Hubswap - single-sided fixed-rate liquidity pool exchange
//! Built with Domain-Driven Design principles

pub mod domain;
pub mod infrastructure;
pub mod application;
pub mod report;
pub mod shared;

// Re-export main types for convenience
pub use application::{ExchangeService, Scenario};
pub use domain::exchange::{ExchangePlan, ExchangeResult, ExchangeRouter};
pub use domain::pool::{LiquidityPool, PoolRegistry};
pub use infrastructure::state::{MemoryStore, StateStore, StateTx};
