//! Ledger domain - per-(account, token) balances

use async_trait::async_trait;
use rust_decimal::Decimal;
use tracing::trace;

use crate::infrastructure::state::{composite_key, StateTx};
use crate::shared::errors::ExchangeError;
use crate::shared::types::{Amount, LedgerAccount, TokenId};

const BALANCE_PREFIX: &str = "balance";

/// Non-negative balance store
#[async_trait]
pub trait BalanceLedger: Send + Sync {
    async fn balance_of(
        &self,
        tx: &mut StateTx,
        account: &LedgerAccount,
        token_id: TokenId,
    ) -> Result<Amount, ExchangeError>;

    async fn credit(
        &self,
        tx: &mut StateTx,
        account: &LedgerAccount,
        token_id: TokenId,
        amount: Amount,
    ) -> Result<(), ExchangeError>;

    /// Fails with `InsufficientBalance` instead of going negative
    async fn debit(
        &self,
        tx: &mut StateTx,
        account: &LedgerAccount,
        token_id: TokenId,
        amount: Amount,
    ) -> Result<(), ExchangeError>;

    /// Move `amount` of `token_id` from one holder to another
    async fn move_value(
        &self,
        tx: &mut StateTx,
        from: &LedgerAccount,
        to: &LedgerAccount,
        token_id: TokenId,
        amount: Amount,
    ) -> Result<(), ExchangeError> {
        self.debit(tx, from, token_id, amount).await?;
        self.credit(tx, to, token_id, amount).await?;
        trace!(%from, %to, token_id, %amount, "moved value");
        Ok(())
    }
}

/// Ledger kept in the world state
#[derive(Debug, Clone, Copy, Default)]
pub struct StateBalanceLedger;

impl StateBalanceLedger {
    pub fn new() -> Self {
        Self
    }

    fn store(
        &self,
        tx: &mut StateTx,
        account: &LedgerAccount,
        token_id: TokenId,
        balance: Amount,
    ) -> Result<(), ExchangeError> {
        tx.put_json(balance_key(account, token_id)?, &balance)
    }
}

#[async_trait]
impl BalanceLedger for StateBalanceLedger {
    async fn balance_of(
        &self,
        tx: &mut StateTx,
        account: &LedgerAccount,
        token_id: TokenId,
    ) -> Result<Amount, ExchangeError> {
        Ok(tx
            .get_json::<Amount>(&balance_key(account, token_id)?)
            .await?
            .unwrap_or(Decimal::ZERO))
    }

    async fn credit(
        &self,
        tx: &mut StateTx,
        account: &LedgerAccount,
        token_id: TokenId,
        amount: Amount,
    ) -> Result<(), ExchangeError> {
        ensure_non_negative(amount)?;
        let balance = self.balance_of(tx, account, token_id).await?;
        let updated = balance
            .checked_add(amount)
            .ok_or(ExchangeError::Arithmetic("ledger credit"))?;
        self.store(tx, account, token_id, updated)
    }

    async fn debit(
        &self,
        tx: &mut StateTx,
        account: &LedgerAccount,
        token_id: TokenId,
        amount: Amount,
    ) -> Result<(), ExchangeError> {
        ensure_non_negative(amount)?;
        let balance = self.balance_of(tx, account, token_id).await?;
        if balance < amount {
            return Err(ExchangeError::InsufficientBalance {
                account: account.clone(),
                token_id,
                balance,
                requested: amount,
            });
        }
        self.store(tx, account, token_id, balance - amount)
    }
}

fn ensure_non_negative(amount: Amount) -> Result<(), ExchangeError> {
    if amount < Decimal::ZERO {
        return Err(ExchangeError::InvalidAmount(amount));
    }
    Ok(())
}

fn balance_key(account: &LedgerAccount, token_id: TokenId) -> Result<String, ExchangeError> {
    let token = token_id.to_string();
    let (kind, holder) = match account {
        LedgerAccount::User(id) => ("user", id.clone()),
        LedgerAccount::Pool(pool_token_id) => ("pool", pool_token_id.to_string()),
    };
    Ok(composite_key(BALANCE_PREFIX, &[kind, holder.as_str(), token.as_str()])?)
}
