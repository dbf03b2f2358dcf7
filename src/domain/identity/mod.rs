//! Identity domain - who is submitting the request

use crate::shared::errors::ExchangeError;
use crate::shared::types::AccountId;

/// Resolves the account id of the submitting client
pub trait IdentityResolver: Send + Sync {
    fn current_caller_id(&self) -> Result<AccountId, ExchangeError>;
}

/// Identity fixed at construction, e.g. from a CLI flag
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FixedIdentity(AccountId);

impl FixedIdentity {
    pub fn new(id: impl Into<AccountId>) -> Self {
        Self(id.into())
    }
}

impl IdentityResolver for FixedIdentity {
    fn current_caller_id(&self) -> Result<AccountId, ExchangeError> {
        Ok(self.0.clone())
    }
}
