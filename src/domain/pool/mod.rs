//! Pool domain - liquidity pool records and reserve accounting

mod liquidity_pool;
mod pool_balance;
mod pool_registry;

pub use liquidity_pool::{LiquidityPool, PoolSide};
pub use pool_balance::PoolBalanceAdapter;
pub use pool_registry::PoolRegistry;
