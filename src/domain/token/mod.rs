//! Token domain - catalog of known tokens and their creators

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::infrastructure::state::{composite_key, StateTx};
use crate::shared::errors::ExchangeError;
use crate::shared::types::{AccountId, TokenId};

const TOKEN_PREFIX: &str = "token";

/// Catalog entry for a token
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Token {
    pub id: TokenId,
    pub name: String,
    pub creator_id: AccountId,
}

/// Lookup of token metadata
#[async_trait]
pub trait TokenCatalog: Send + Sync {
    /// Name of the token; a missing or empty name means the token does not exist
    async fn token_name(&self, tx: &mut StateTx, token_id: TokenId) -> Result<String, ExchangeError>;

    async fn token_creator(&self, tx: &mut StateTx, token_id: TokenId) -> Result<AccountId, ExchangeError>;
}

/// Catalog kept in the world state
#[derive(Debug, Clone, Copy, Default)]
pub struct StateTokenCatalog;

impl StateTokenCatalog {
    pub fn new() -> Self {
        Self
    }

    pub async fn register_token(
        &self,
        tx: &mut StateTx,
        token_id: TokenId,
        name: &str,
        creator_id: &str,
    ) -> Result<Token, ExchangeError> {
        let token = Token {
            id: token_id,
            name: name.to_string(),
            creator_id: creator_id.to_string(),
        };
        tx.put_json(token_key(token_id)?, &token)?;
        Ok(token)
    }

    async fn load(&self, tx: &mut StateTx, token_id: TokenId) -> Result<Token, ExchangeError> {
        match tx.get_json::<Token>(&token_key(token_id)?).await? {
            Some(token) if !token.name.is_empty() => Ok(token),
            _ => Err(ExchangeError::TokenNotFound(token_id)),
        }
    }
}

#[async_trait]
impl TokenCatalog for StateTokenCatalog {
    async fn token_name(&self, tx: &mut StateTx, token_id: TokenId) -> Result<String, ExchangeError> {
        Ok(self.load(tx, token_id).await?.name)
    }

    async fn token_creator(&self, tx: &mut StateTx, token_id: TokenId) -> Result<AccountId, ExchangeError> {
        Ok(self.load(tx, token_id).await?.creator_id)
    }
}

fn token_key(token_id: TokenId) -> Result<String, ExchangeError> {
    Ok(composite_key(TOKEN_PREFIX, &[token_id.to_string()])?)
}
