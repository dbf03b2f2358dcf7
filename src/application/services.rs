//! Application services and use cases

use std::sync::Arc;

use futures::future::BoxFuture;
use tracing::{debug, instrument, warn};

use crate::domain::exchange::{ExchangePlan, ExchangeResult, ExchangeRouter, RouterOptions};
use crate::domain::identity::IdentityResolver;
use crate::domain::ledger::{BalanceLedger, StateBalanceLedger};
use crate::domain::platform::PlatformConfiguration;
use crate::domain::pool::{LiquidityPool, PoolBalanceAdapter, PoolRegistry};
use crate::domain::token::{StateTokenCatalog, Token};
use crate::infrastructure::state::{StateStore, StateTx};
use crate::shared::errors::ExchangeError;
use crate::shared::types::{Amount, EngineConfig, LedgerAccount, PlatformConfig, TokenId};
use crate::shared::utils::generate_id;

/// Runs every use case in its own staged transaction
///
/// An operation either commits all of its writes or none. Optimistic
/// conflicts restart the operation from scratch, up to
/// `engine.retry_attempts` extra times.
#[derive(Clone)]
pub struct ExchangeService {
    store: Arc<dyn StateStore>,
    ledger: Arc<dyn BalanceLedger>,
    catalog: StateTokenCatalog,
    platform: PlatformConfiguration,
    registry: PoolRegistry,
    router: ExchangeRouter,
    engine: EngineConfig,
}

impl ExchangeService {
    pub fn new(store: Arc<dyn StateStore>, engine: EngineConfig) -> Self {
        let ledger: Arc<dyn BalanceLedger> = Arc::new(StateBalanceLedger::new());
        let catalog = StateTokenCatalog::new();
        let balances = PoolBalanceAdapter::new(ledger.clone());
        let registry = PoolRegistry::new(Arc::new(catalog), balances.clone());
        let router = ExchangeRouter::new(
            registry.clone(),
            balances,
            Arc::new(catalog),
            RouterOptions {
                enforce_reserve_floor: engine.enforce_reserve_floor,
            },
        );

        Self {
            store,
            ledger,
            catalog,
            platform: PlatformConfiguration::new(),
            registry,
            router,
            engine,
        }
    }

    #[instrument(skip(self), fields(request_id = %generate_id()))]
    pub async fn configure_platform(&self, config: PlatformConfig) -> Result<(), ExchangeError> {
        let platform = self.platform;
        self.in_transaction("configure_platform", move |tx| {
            let config = config.clone();
            Box::pin(async move { platform.apply(tx, &config).await })
        })
        .await
    }

    pub async fn platform_config(&self) -> Result<PlatformConfig, ExchangeError> {
        let platform = self.platform;
        self.in_transaction("platform_config", move |tx| {
            Box::pin(async move { platform.snapshot(tx).await })
        })
        .await
    }

    #[instrument(skip(self), fields(request_id = %generate_id()))]
    pub async fn register_token(
        &self,
        token_id: TokenId,
        name: &str,
        creator_id: &str,
    ) -> Result<Token, ExchangeError> {
        let catalog = self.catalog;
        let (name, creator_id) = (name.to_string(), creator_id.to_string());
        self.in_transaction("register_token", move |tx| {
            let (name, creator_id) = (name.clone(), creator_id.clone());
            Box::pin(async move { catalog.register_token(tx, token_id, &name, &creator_id).await })
        })
        .await
    }

    /// Seed a user balance, e.g. from a scenario file
    #[instrument(skip(self), fields(request_id = %generate_id()))]
    pub async fn credit(
        &self,
        account_id: &str,
        token_id: TokenId,
        amount: Amount,
    ) -> Result<(), ExchangeError> {
        let ledger = self.ledger.clone();
        let account = LedgerAccount::user(account_id);
        self.in_transaction("credit", move |tx| {
            let (ledger, account) = (ledger.clone(), account.clone());
            Box::pin(async move { ledger.credit(tx, &account, token_id, amount).await })
        })
        .await
    }

    pub async fn balance_of(
        &self,
        account: &LedgerAccount,
        token_id: TokenId,
    ) -> Result<Amount, ExchangeError> {
        let ledger = self.ledger.clone();
        let account = account.clone();
        self.in_transaction("balance_of", move |tx| {
            let (ledger, account) = (ledger.clone(), account.clone());
            Box::pin(async move { ledger.balance_of(tx, &account, token_id).await })
        })
        .await
    }

    #[instrument(skip(self, identity), fields(request_id = %generate_id()))]
    pub async fn create_lp(
        &self,
        identity: &dyn IdentityResolver,
        token_id: TokenId,
        token_supply: Amount,
        token_platform_supply: Amount,
        exchange_rate: Amount,
    ) -> Result<LiquidityPool, ExchangeError> {
        let caller = identity.current_caller_id()?;
        let registry = self.registry.clone();
        self.in_transaction("create_lp", move |tx| {
            let (registry, caller) = (registry.clone(), caller.clone());
            Box::pin(async move {
                registry
                    .create_lp(tx, &caller, token_id, token_supply, token_platform_supply, exchange_rate)
                    .await
            })
        })
        .await
    }

    #[instrument(skip(self, identity), fields(request_id = %generate_id()))]
    pub async fn add_liquidity(
        &self,
        identity: &dyn IdentityResolver,
        token_id: TokenId,
        token_amount: Amount,
        platform_amount: Amount,
    ) -> Result<LiquidityPool, ExchangeError> {
        let caller = identity.current_caller_id()?;
        let registry = self.registry.clone();
        self.in_transaction("add_liquidity", move |tx| {
            let (registry, caller) = (registry.clone(), caller.clone());
            Box::pin(async move {
                registry
                    .add_liquidity(tx, &caller, token_id, token_amount, platform_amount)
                    .await
            })
        })
        .await
    }

    #[instrument(skip(self, identity), fields(request_id = %generate_id()))]
    pub async fn set_exchange_rate(
        &self,
        identity: &dyn IdentityResolver,
        token_id: TokenId,
        exchange_rate: Amount,
    ) -> Result<LiquidityPool, ExchangeError> {
        let caller = identity.current_caller_id()?;
        let registry = self.registry.clone();
        self.in_transaction("set_exchange_rate", move |tx| {
            let (registry, caller) = (registry.clone(), caller.clone());
            Box::pin(async move { registry.set_exchange_rate(tx, &caller, token_id, exchange_rate).await })
        })
        .await
    }

    pub async fn get_lp(&self, token_id: TokenId) -> Result<LiquidityPool, ExchangeError> {
        let registry = self.registry.clone();
        self.in_transaction("get_lp", move |tx| {
            let registry = registry.clone();
            Box::pin(async move { registry.get_lp_by_token_id(tx, token_id).await })
        })
        .await
    }

    pub async fn list_pools(&self) -> Result<Vec<LiquidityPool>, ExchangeError> {
        let registry = self.registry.clone();
        self.in_transaction("list_pools", move |tx| {
            let registry = registry.clone();
            Box::pin(async move { registry.list_pools(tx).await })
        })
        .await
    }

    /// Plan an exchange without applying it
    pub async fn quote(
        &self,
        from_token_id: TokenId,
        to_token_id: TokenId,
        amount: Amount,
    ) -> Result<ExchangePlan, ExchangeError> {
        let router = self.router.clone();
        self.in_transaction("quote", move |tx| {
            let router = router.clone();
            Box::pin(async move { router.quote(tx, from_token_id, to_token_id, amount).await })
        })
        .await
    }

    #[instrument(skip(self, identity), fields(request_id = %generate_id()))]
    pub async fn exchange(
        &self,
        identity: &dyn IdentityResolver,
        from_token_id: TokenId,
        to_token_id: TokenId,
        amount: Amount,
    ) -> Result<ExchangeResult, ExchangeError> {
        let caller = identity.current_caller_id()?;
        let router = self.router.clone();
        self.in_transaction("exchange", move |tx| {
            let (router, caller) = (router.clone(), caller.clone());
            Box::pin(async move {
                router
                    .exchange(tx, &caller, from_token_id, to_token_id, amount)
                    .await
            })
        })
        .await
    }

    /// Run `op` in a fresh transaction, retrying the whole thing on conflict
    async fn in_transaction<T, F>(&self, operation: &'static str, mut op: F) -> Result<T, ExchangeError>
    where
        T: Send,
        F: for<'t> FnMut(&'t mut StateTx) -> BoxFuture<'t, Result<T, ExchangeError>>,
    {
        let mut attempt = 0;
        loop {
            let mut tx = StateTx::begin(self.store.clone());
            let outcome = match op(&mut tx).await {
                Ok(value) => {
                    let writes = tx.pending_writes();
                    match tx.commit().await {
                        Ok(()) => {
                            debug!(operation, writes, "transaction committed");
                            Ok(value)
                        }
                        Err(err) => Err(ExchangeError::from(err)),
                    }
                }
                Err(err) => Err(err),
            };

            match outcome {
                Err(err) if err.is_conflict() && attempt < self.engine.retry_attempts => {
                    attempt += 1;
                    warn!(operation, attempt, error = %err, "state conflict, retrying");
                }
                other => return other,
            }
        }
    }
}
