//! Application layer - use cases and services

pub mod commands;
pub mod scenario;
pub mod services;

pub use commands::{Cli, CommandExecutor, Commands};
pub use scenario::Scenario;
pub use services::ExchangeService;
