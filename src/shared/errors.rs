//! Error handling for the application

use rust_decimal::Decimal;
use thiserror::Error;

use crate::shared::types::{LedgerAccount, TokenId};

/// Persistence-related errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StateError {
    #[error("Commit rejected, key {0:?} changed since it was read")]
    Conflict(String),

    #[error("Invalid key component: {0:?}")]
    InvalidKey(String),

    #[error("State backend error: {0}")]
    Backend(String),
}

/// Exchange, pool and ledger errors
#[derive(Error, Debug)]
pub enum ExchangeError {
    #[error("Token {0} does not exist")]
    TokenNotFound(TokenId),

    #[error("Liquidity pool for token {0} not found")]
    PoolNotFound(TokenId),

    #[error("Liquidity pool for token {0} already exists")]
    PoolAlreadyExists(TokenId),

    #[error("Token {0} is the platform token and cannot have a pool")]
    PlatformTokenPool(TokenId),

    #[error("Failed to decode record at {key:?}: {source}")]
    Decode {
        key: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Insufficient balance of token {token_id} for {account}: has {balance}, needs {requested}")]
    InsufficientBalance {
        account: LedgerAccount,
        token_id: TokenId,
        balance: Decimal,
        requested: Decimal,
    },

    #[error("Pool {pool_token_id} reserve of token {token_id} is {reserve}, cannot release {requested}")]
    InsufficientReserve {
        pool_token_id: TokenId,
        token_id: TokenId,
        reserve: Decimal,
        requested: Decimal,
    },

    #[error("Exchange amount {gross} does not cover platform fee {fee}")]
    FeeNotCovered { gross: Decimal, fee: Decimal },

    #[error("Platform configuration missing: {0}")]
    ConfigMissing(&'static str),

    #[error("Invalid amount: {0}")]
    InvalidAmount(Decimal),

    #[error("Invalid exchange rate: {0}")]
    InvalidExchangeRate(Decimal),

    #[error("Cannot exchange token {0} for itself")]
    SameToken(TokenId),

    #[error("{caller} is not allowed to {action}")]
    Unauthorized { caller: String, action: &'static str },

    #[error("Arithmetic overflow while computing {0}")]
    Arithmetic(&'static str),

    #[error(transparent)]
    State(#[from] StateError),
}

impl ExchangeError {
    /// Whether retrying the whole operation in a fresh transaction may succeed
    pub fn is_conflict(&self) -> bool {
        matches!(self, ExchangeError::State(StateError::Conflict(_)))
    }
}

/// General application error
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Scenario error: {0}")]
    ScenarioError(String),

    #[error("Exchange error: {0}")]
    Exchange(#[from] ExchangeError),
}

impl From<StateError> for AppError {
    fn from(err: StateError) -> Self {
        AppError::Exchange(ExchangeError::State(err))
    }
}
