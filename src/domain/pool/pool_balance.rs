//! Value movement between users and pool reserve accounts

use std::sync::Arc;

use crate::domain::ledger::BalanceLedger;
use crate::infrastructure::state::StateTx;
use crate::shared::errors::ExchangeError;
use crate::shared::types::{Amount, LedgerAccount, TokenId};

/// Moves raw ledger balances in and out of a pool's reserve account
///
/// The pool record itself is left alone; callers keep the matching
/// `token_supply` / `token_platform_supply` field in step.
#[derive(Clone)]
pub struct PoolBalanceAdapter {
    ledger: Arc<dyn BalanceLedger>,
}

impl PoolBalanceAdapter {
    pub fn new(ledger: Arc<dyn BalanceLedger>) -> Self {
        Self { ledger }
    }

    pub fn ledger(&self) -> &Arc<dyn BalanceLedger> {
        &self.ledger
    }

    /// Move `amount` of `asset` from `adder_id` into the pool for `pool_token_id`
    pub async fn add_to_lp(
        &self,
        tx: &mut StateTx,
        adder_id: &str,
        pool_token_id: TokenId,
        asset: TokenId,
        amount: Amount,
    ) -> Result<(), ExchangeError> {
        self.ledger
            .move_value(
                tx,
                &LedgerAccount::user(adder_id),
                &LedgerAccount::pool(pool_token_id),
                asset,
                amount,
            )
            .await
    }

    /// Move `amount` of `asset` out of the pool for `pool_token_id` to `taker_id`
    pub async fn take_from_lp(
        &self,
        tx: &mut StateTx,
        taker_id: &str,
        pool_token_id: TokenId,
        asset: TokenId,
        amount: Amount,
    ) -> Result<(), ExchangeError> {
        self.ledger
            .move_value(
                tx,
                &LedgerAccount::pool(pool_token_id),
                &LedgerAccount::user(taker_id),
                asset,
                amount,
            )
            .await
    }

    /// Ledger balance of `asset` held by the pool
    pub async fn pool_balance(
        &self,
        tx: &mut StateTx,
        pool_token_id: TokenId,
        asset: TokenId,
    ) -> Result<Amount, ExchangeError> {
        self.ledger
            .balance_of(tx, &LedgerAccount::pool(pool_token_id), asset)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ledger::StateBalanceLedger;
    use crate::infrastructure::state::{MemoryStore, StateStore};
    use rust_decimal_macros::dec;

    #[tokio::test]
    async fn test_add_and_take_are_inverse_moves() {
        let store: Arc<dyn StateStore> = Arc::new(MemoryStore::new());
        let ledger = Arc::new(StateBalanceLedger::new());
        let adapter = PoolBalanceAdapter::new(ledger.clone());
        let mut tx = StateTx::begin(store);
        let alice = LedgerAccount::user("alice");

        ledger.credit(&mut tx, &alice, 2, dec!(100)).await.unwrap();

        adapter.add_to_lp(&mut tx, "alice", 2, 2, dec!(70)).await.unwrap();
        assert_eq!(adapter.pool_balance(&mut tx, 2, 2).await.unwrap(), dec!(70));
        assert_eq!(ledger.balance_of(&mut tx, &alice, 2).await.unwrap(), dec!(30));

        adapter.take_from_lp(&mut tx, "alice", 2, 2, dec!(20)).await.unwrap();
        assert_eq!(adapter.pool_balance(&mut tx, 2, 2).await.unwrap(), dec!(50));
        assert_eq!(ledger.balance_of(&mut tx, &alice, 2).await.unwrap(), dec!(50));
    }

    #[tokio::test]
    async fn test_take_beyond_pool_balance_fails() {
        let store: Arc<dyn StateStore> = Arc::new(MemoryStore::new());
        let adapter = PoolBalanceAdapter::new(Arc::new(StateBalanceLedger::new()));
        let mut tx = StateTx::begin(store);

        let err = adapter.take_from_lp(&mut tx, "bob", 2, 1, dec!(1)).await.unwrap_err();
        assert!(matches!(
            err,
            ExchangeError::InsufficientBalance { account: LedgerAccount::Pool(2), .. }
        ));
    }
}
