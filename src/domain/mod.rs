//! Domain layer - core business logic and entities

pub mod exchange;
pub mod identity;
pub mod ledger;
pub mod platform;
pub mod pool;
pub mod token;
