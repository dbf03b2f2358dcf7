//! Pool registry - creation, lookup and persistence of liquidity pools

use std::sync::Arc;

use rust_decimal::Decimal;
use tracing::{debug, info};

use super::{LiquidityPool, PoolBalanceAdapter, PoolSide};
use crate::domain::platform::PlatformConfiguration;
use crate::domain::token::TokenCatalog;
use crate::infrastructure::state::{composite_key, partial_composite_key, StateTx};
use crate::shared::errors::ExchangeError;
use crate::shared::types::{Amount, TokenId};

const LP_PREFIX: &str = "lp";

/// Manages liquidity pool records keyed by paired token id
#[derive(Clone)]
pub struct PoolRegistry {
    catalog: Arc<dyn TokenCatalog>,
    balances: PoolBalanceAdapter,
    platform: PlatformConfiguration,
}

impl PoolRegistry {
    pub fn new(catalog: Arc<dyn TokenCatalog>, balances: PoolBalanceAdapter) -> Self {
        Self {
            catalog,
            balances,
            platform: PlatformConfiguration::new(),
        }
    }

    /// Create a pool and fund it from the caller's balances
    pub async fn create_lp(
        &self,
        tx: &mut StateTx,
        caller_id: &str,
        token_id: TokenId,
        token_supply: Amount,
        token_platform_supply: Amount,
        exchange_rate: Amount,
    ) -> Result<LiquidityPool, ExchangeError> {
        let platform_token_id = self.platform.platform_token_id(tx).await?;
        if token_id == platform_token_id {
            return Err(ExchangeError::PlatformTokenPool(token_id));
        }

        let name = self.catalog.token_name(tx, token_id).await?;

        if exchange_rate <= Decimal::ZERO {
            return Err(ExchangeError::InvalidExchangeRate(exchange_rate));
        }
        for supply in [token_supply, token_platform_supply] {
            if supply < Decimal::ZERO {
                return Err(ExchangeError::InvalidAmount(supply));
            }
        }
        if self.find_lp_by_token_id(tx, token_id).await?.is_some() {
            return Err(ExchangeError::PoolAlreadyExists(token_id));
        }

        let pool = LiquidityPool::new(
            token_id,
            token_supply,
            token_platform_supply,
            caller_id,
            exchange_rate,
        );
        self.save_lp_state(tx, &pool)?;

        self.balances
            .add_to_lp(tx, caller_id, token_id, token_id, token_supply)
            .await?;
        self.balances
            .add_to_lp(tx, caller_id, token_id, platform_token_id, token_platform_supply)
            .await?;

        info!(
            token_id,
            token = %name,
            creator = caller_id,
            %token_supply,
            %token_platform_supply,
            %exchange_rate,
            "liquidity pool created"
        );
        Ok(pool)
    }

    pub async fn get_lp_by_token_id(
        &self,
        tx: &mut StateTx,
        token_id: TokenId,
    ) -> Result<LiquidityPool, ExchangeError> {
        self.find_lp_by_token_id(tx, token_id)
            .await?
            .ok_or(ExchangeError::PoolNotFound(token_id))
    }

    pub async fn find_lp_by_token_id(
        &self,
        tx: &mut StateTx,
        token_id: TokenId,
    ) -> Result<Option<LiquidityPool>, ExchangeError> {
        tx.get_json(&lp_key(token_id)?).await
    }

    /// Unconditional overwrite of the pool record
    pub fn save_lp_state(&self, tx: &mut StateTx, pool: &LiquidityPool) -> Result<(), ExchangeError> {
        debug!(
            token_id = pool.token_id,
            token_supply = %pool.token_supply,
            token_platform_supply = %pool.token_platform_supply,
            "saving pool state"
        );
        tx.put_json(lp_key(pool.token_id)?, pool)
    }

    /// Every pool, ordered by key
    pub async fn list_pools(&self, tx: &mut StateTx) -> Result<Vec<LiquidityPool>, ExchangeError> {
        let prefix = partial_composite_key::<&str>(LP_PREFIX, &[])?;
        let mut pools = Vec::new();
        for (key, bytes) in tx.scan_prefix(&prefix).await? {
            let pool: LiquidityPool = serde_json::from_slice(&bytes).map_err(|source| {
                ExchangeError::Decode {
                    key: key.escape_debug().to_string(),
                    source,
                }
            })?;
            pools.push(pool);
        }
        pools.sort_by_key(|pool| pool.token_id);
        Ok(pools)
    }

    /// Deposit both legs into an existing pool
    pub async fn add_liquidity(
        &self,
        tx: &mut StateTx,
        provider_id: &str,
        token_id: TokenId,
        token_amount: Amount,
        platform_amount: Amount,
    ) -> Result<LiquidityPool, ExchangeError> {
        for amount in [token_amount, platform_amount] {
            if amount < Decimal::ZERO {
                return Err(ExchangeError::InvalidAmount(amount));
            }
        }
        if token_amount.is_zero() && platform_amount.is_zero() {
            return Err(ExchangeError::InvalidAmount(Decimal::ZERO));
        }

        let platform_token_id = self.platform.platform_token_id(tx).await?;
        let mut pool = self.get_lp_by_token_id(tx, token_id).await?;

        if !token_amount.is_zero() {
            self.balances
                .add_to_lp(tx, provider_id, token_id, token_id, token_amount)
                .await?;
            pool.deposit(PoolSide::Token, token_amount)?;
        }
        if !platform_amount.is_zero() {
            self.balances
                .add_to_lp(tx, provider_id, token_id, platform_token_id, platform_amount)
                .await?;
            pool.deposit(PoolSide::Platform, platform_amount)?;
        }
        self.save_lp_state(tx, &pool)?;

        info!(token_id, provider = provider_id, %token_amount, %platform_amount, "liquidity added");
        Ok(pool)
    }

    /// Operator update of the fixed rate, restricted to the pool creator
    pub async fn set_exchange_rate(
        &self,
        tx: &mut StateTx,
        caller_id: &str,
        token_id: TokenId,
        exchange_rate: Amount,
    ) -> Result<LiquidityPool, ExchangeError> {
        if exchange_rate <= Decimal::ZERO {
            return Err(ExchangeError::InvalidExchangeRate(exchange_rate));
        }

        let mut pool = self.get_lp_by_token_id(tx, token_id).await?;
        if pool.creator_id != caller_id {
            return Err(ExchangeError::Unauthorized {
                caller: caller_id.to_string(),
                action: "change the pool exchange rate",
            });
        }

        let previous = pool.exchange_rate;
        pool.exchange_rate = exchange_rate;
        self.save_lp_state(tx, &pool)?;

        info!(token_id, %previous, %exchange_rate, "exchange rate updated");
        Ok(pool)
    }
}

fn lp_key(token_id: TokenId) -> Result<String, ExchangeError> {
    Ok(composite_key(LP_PREFIX, &[token_id.to_string()])?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ledger::{BalanceLedger, StateBalanceLedger};
    use crate::domain::token::StateTokenCatalog;
    use crate::infrastructure::state::{MemoryStore, StateStore};
    use crate::shared::types::LedgerAccount;
    use rust_decimal_macros::dec;

    struct Fixture {
        store: Arc<dyn StateStore>,
        ledger: Arc<StateBalanceLedger>,
        registry: PoolRegistry,
    }

    async fn fixture() -> Fixture {
        let store: Arc<dyn StateStore> = Arc::new(MemoryStore::new());
        let ledger = Arc::new(StateBalanceLedger::new());
        let catalog = StateTokenCatalog::new();
        let registry = PoolRegistry::new(
            Arc::new(catalog),
            PoolBalanceAdapter::new(ledger.clone()),
        );

        let mut tx = StateTx::begin(store.clone());
        PlatformConfiguration::new()
            .set_platform_token_id(&mut tx, 1)
            .await
            .unwrap();
        catalog.register_token(&mut tx, 1, "BUMNPoin", "adminBUMN").await.unwrap();
        catalog.register_token(&mut tx, 2, "LivinPoin", "adminLivin").await.unwrap();
        let admin = LedgerAccount::user("adminLivin");
        ledger.credit(&mut tx, &admin, 1, dec!(2000000)).await.unwrap();
        ledger.credit(&mut tx, &admin, 2, dec!(1000000)).await.unwrap();
        tx.commit().await.unwrap();

        Fixture { store, ledger, registry }
    }

    #[tokio::test]
    async fn test_create_lp_moves_initial_reserves() {
        let f = fixture().await;
        let mut tx = StateTx::begin(f.store.clone());

        let pool = f
            .registry
            .create_lp(&mut tx, "adminLivin", 2, dec!(200000), dec!(2000000), dec!(10))
            .await
            .unwrap();
        tx.commit().await.unwrap();

        let mut tx = StateTx::begin(f.store.clone());
        assert_eq!(f.registry.get_lp_by_token_id(&mut tx, 2).await.unwrap(), pool);

        let admin = LedgerAccount::user("adminLivin");
        let pool_account = LedgerAccount::pool(2);
        assert_eq!(f.ledger.balance_of(&mut tx, &admin, 2).await.unwrap(), dec!(800000));
        assert_eq!(f.ledger.balance_of(&mut tx, &admin, 1).await.unwrap(), dec!(0));
        assert_eq!(f.ledger.balance_of(&mut tx, &pool_account, 2).await.unwrap(), dec!(200000));
        assert_eq!(f.ledger.balance_of(&mut tx, &pool_account, 1).await.unwrap(), dec!(2000000));
    }

    #[tokio::test]
    async fn test_create_lp_rejections() {
        let f = fixture().await;
        let mut tx = StateTx::begin(f.store.clone());

        assert!(matches!(
            f.registry.create_lp(&mut tx, "adminLivin", 9, dec!(1), dec!(1), dec!(1)).await,
            Err(ExchangeError::TokenNotFound(9))
        ));
        assert!(matches!(
            f.registry.create_lp(&mut tx, "adminBUMN", 1, dec!(1), dec!(1), dec!(1)).await,
            Err(ExchangeError::PlatformTokenPool(1))
        ));
        assert!(matches!(
            f.registry.create_lp(&mut tx, "adminLivin", 2, dec!(1), dec!(1), dec!(0)).await,
            Err(ExchangeError::InvalidExchangeRate(_))
        ));
        assert!(matches!(
            f.registry
                .create_lp(&mut tx, "adminLivin", 2, dec!(5000000), dec!(1), dec!(10))
                .await,
            Err(ExchangeError::InsufficientBalance { .. })
        ));
    }

    #[tokio::test]
    async fn test_create_lp_twice_is_rejected() {
        let f = fixture().await;
        let mut tx = StateTx::begin(f.store.clone());
        f.registry
            .create_lp(&mut tx, "adminLivin", 2, dec!(100), dec!(100), dec!(10))
            .await
            .unwrap();

        assert!(matches!(
            f.registry.create_lp(&mut tx, "adminLivin", 2, dec!(100), dec!(100), dec!(10)).await,
            Err(ExchangeError::PoolAlreadyExists(2))
        ));
    }

    #[tokio::test]
    async fn test_save_then_get_is_deep_equal() {
        let f = fixture().await;
        let pool = LiquidityPool::new(2, dec!(12.5), dec!(0.001), "someone", dec!(3));

        let mut tx = StateTx::begin(f.store.clone());
        f.registry.save_lp_state(&mut tx, &pool).unwrap();
        tx.commit().await.unwrap();

        let mut tx = StateTx::begin(f.store.clone());
        assert_eq!(f.registry.get_lp_by_token_id(&mut tx, 2).await.unwrap(), pool);
        assert!(matches!(
            f.registry.get_lp_by_token_id(&mut tx, 3).await,
            Err(ExchangeError::PoolNotFound(3))
        ));
    }

    #[tokio::test]
    async fn test_corrupt_pool_record() {
        let f = fixture().await;
        let mut tx = StateTx::begin(f.store.clone());
        tx.put(lp_key(2).unwrap(), b"[1,2".to_vec());

        assert!(matches!(
            f.registry.get_lp_by_token_id(&mut tx, 2).await,
            Err(ExchangeError::Decode { .. })
        ));
    }

    #[tokio::test]
    async fn test_add_liquidity_and_rate_update() {
        let f = fixture().await;
        let mut tx = StateTx::begin(f.store.clone());
        f.registry
            .create_lp(&mut tx, "adminLivin", 2, dec!(100000), dec!(1000000), dec!(10))
            .await
            .unwrap();

        let pool = f
            .registry
            .add_liquidity(&mut tx, "adminLivin", 2, dec!(500), dec!(0))
            .await
            .unwrap();
        assert_eq!(pool.token_supply, dec!(100500));
        assert_eq!(pool.token_platform_supply, dec!(1000000));
        assert_eq!(
            f.ledger.balance_of(&mut tx, &LedgerAccount::pool(2), 2).await.unwrap(),
            dec!(100500)
        );

        assert!(matches!(
            f.registry.set_exchange_rate(&mut tx, "mallory", 2, dec!(50)).await,
            Err(ExchangeError::Unauthorized { .. })
        ));
        let pool = f
            .registry
            .set_exchange_rate(&mut tx, "adminLivin", 2, dec!(12))
            .await
            .unwrap();
        assert_eq!(pool.exchange_rate, dec!(12));

        let pools = f.registry.list_pools(&mut tx).await.unwrap();
        assert_eq!(pools, vec![pool]);
    }
}
