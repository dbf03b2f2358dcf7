//! Common types used across the application

use std::fmt;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Token identifier as issued by the token catalog
pub type TokenId = u64;

/// Client account identifier
pub type AccountId = String;

/// Exact token amount
pub type Amount = Decimal;

/// Holder of a ledger balance
///
/// Pools keep their reserves in their own ledger accounts, keyed by the
/// paired token id, so a user id can never alias a pool account.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum LedgerAccount {
    User(AccountId),
    Pool(TokenId),
}

impl LedgerAccount {
    pub fn user(id: impl Into<AccountId>) -> Self {
        LedgerAccount::User(id.into())
    }

    pub fn pool(token_id: TokenId) -> Self {
        LedgerAccount::Pool(token_id)
    }
}

impl fmt::Display for LedgerAccount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LedgerAccount::User(id) => write!(f, "{}", id),
            LedgerAccount::Pool(token_id) => write!(f, "pool#{}", token_id),
        }
    }
}

/// Platform token and fee as configured by the operator
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlatformConfig {
    pub token_id: TokenId,
    pub fee_amount: Amount,
}

/// Engine behaviour knobs
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Extra attempts after an optimistic commit conflict
    pub retry_attempts: u32,
    /// Reject hops that would drive a pool reserve below zero
    pub enforce_reserve_floor: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            retry_attempts: 3,
            enforce_reserve_floor: true,
        }
    }
}

/// Top-level service configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceConfig {
    pub platform: PlatformConfig,
    #[serde(default)]
    pub engine: EngineConfig,
}
