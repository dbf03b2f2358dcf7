//! Exchange router - plans every hop, then applies the balance moves

use std::sync::Arc;

use rust_decimal::Decimal;
use tracing::{debug, info};

use super::{ExchangePlan, ExchangeResult, HopQuote, Route};
use crate::domain::platform::PlatformConfiguration;
use crate::domain::pool::{LiquidityPool, PoolBalanceAdapter, PoolRegistry};
use crate::domain::token::TokenCatalog;
use crate::infrastructure::state::StateTx;
use crate::shared::errors::ExchangeError;
use crate::shared::types::{Amount, LedgerAccount, TokenId};

/// Router behaviour switches
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RouterOptions {
    /// Refuse hops whose paying reserve is smaller than the gross amount
    pub enforce_reserve_floor: bool,
}

impl Default for RouterOptions {
    fn default() -> Self {
        Self {
            enforce_reserve_floor: true,
        }
    }
}

/// Routes exchanges through the platform token
#[derive(Clone)]
pub struct ExchangeRouter {
    registry: PoolRegistry,
    balances: PoolBalanceAdapter,
    catalog: Arc<dyn TokenCatalog>,
    platform: PlatformConfiguration,
    options: RouterOptions,
}

impl ExchangeRouter {
    pub fn new(
        registry: PoolRegistry,
        balances: PoolBalanceAdapter,
        catalog: Arc<dyn TokenCatalog>,
        options: RouterOptions,
    ) -> Self {
        Self {
            registry,
            balances,
            catalog,
            platform: PlatformConfiguration::new(),
            options,
        }
    }

    /// Compute every hop and run every guard without moving any value
    pub async fn quote(
        &self,
        tx: &mut StateTx,
        from_token_id: TokenId,
        to_token_id: TokenId,
        amount: Amount,
    ) -> Result<ExchangePlan, ExchangeError> {
        if amount <= Decimal::ZERO {
            return Err(ExchangeError::InvalidAmount(amount));
        }

        let platform = self.platform.snapshot(tx).await?;
        let route = Route::classify(platform.token_id, from_token_id, to_token_id)?;

        let (leading_hop, final_hop) = match route {
            Route::ToPlatform { pool_token_id } => {
                let pool = self.registry.get_lp_by_token_id(tx, pool_token_id).await?;
                let hop = HopQuote::into_platform(&pool, platform.token_id, amount, platform.fee_amount)?;
                self.check_hop(tx, &hop, &pool).await?;
                (None, hop)
            }
            Route::FromPlatform { pool_token_id } => {
                let pool = self.registry.get_lp_by_token_id(tx, pool_token_id).await?;
                let hop = HopQuote::out_of_platform(&pool, platform.token_id, amount, platform.fee_amount)?;
                self.check_hop(tx, &hop, &pool).await?;
                (None, hop)
            }
            Route::TwoHop {
                first_pool_token_id,
                second_pool_token_id,
            } => {
                // first hop is fee-free
                let first_pool = self.registry.get_lp_by_token_id(tx, first_pool_token_id).await?;
                let first = HopQuote::into_platform(&first_pool, platform.token_id, amount, Decimal::ZERO)?;
                self.check_hop(tx, &first, &first_pool).await?;

                let second_pool = self.registry.get_lp_by_token_id(tx, second_pool_token_id).await?;
                let second = HopQuote::out_of_platform(
                    &second_pool,
                    platform.token_id,
                    first.net_amount,
                    platform.fee_amount,
                )?;
                self.check_hop(tx, &second, &second_pool).await?;
                (Some(first), second)
            }
        };

        let fee_recipient = self.catalog.token_creator(tx, platform.token_id).await?;

        Ok(ExchangePlan {
            route,
            leading_hop,
            final_hop,
            platform,
            fee_recipient,
        })
    }

    /// Swap `amount` of `from_token_id` held by `exchanger_id` into `to_token_id`
    ///
    /// Nothing is moved until every hop has been quoted and checked, so an
    /// error leaves the transaction's pending writes untouched by this call.
    pub async fn exchange(
        &self,
        tx: &mut StateTx,
        exchanger_id: &str,
        from_token_id: TokenId,
        to_token_id: TokenId,
        amount: Amount,
    ) -> Result<ExchangeResult, ExchangeError> {
        let plan = self.quote(tx, from_token_id, to_token_id, amount).await?;

        let exchanger = LedgerAccount::user(exchanger_id);
        let balance = self
            .balances
            .ledger()
            .balance_of(tx, &exchanger, from_token_id)
            .await?;
        if balance < amount {
            return Err(ExchangeError::InsufficientBalance {
                account: exchanger,
                token_id: from_token_id,
                balance,
                requested: amount,
            });
        }

        for hop in plan.hops() {
            self.apply_hop(tx, exchanger_id, &plan.fee_recipient, hop).await?;
        }

        let result = plan.result(from_token_id, amount);

        info!(
            exchanger = exchanger_id,
            from_token_id,
            to_token_id,
            amount_in = %amount,
            amount_out = %result.to_token_amount,
            fee = %result.platform_fee,
            hops = plan.route.hop_count(),
            "exchange applied"
        );
        Ok(result)
    }

    async fn apply_hop(
        &self,
        tx: &mut StateTx,
        exchanger_id: &str,
        fee_recipient: &str,
        hop: &HopQuote,
    ) -> Result<(), ExchangeError> {
        let mut pool = self.registry.get_lp_by_token_id(tx, hop.pool_token_id).await?;

        self.balances
            .add_to_lp(tx, exchanger_id, hop.pool_token_id, hop.from_token_id, hop.amount_in)
            .await?;
        self.balances
            .take_from_lp(tx, exchanger_id, hop.pool_token_id, hop.to_token_id, hop.net_amount)
            .await?;
        if !hop.fee.is_zero() {
            self.balances
                .take_from_lp(tx, fee_recipient, hop.pool_token_id, hop.to_token_id, hop.fee)
                .await?;
        }

        // the fee is paid out of the gross leg, not on top of it
        pool.deposit(hop.direction.inflow_side(), hop.amount_in)?;
        pool.withdraw(hop.direction.outflow_side(), hop.gross_amount)?;
        self.registry.save_lp_state(tx, &pool)?;

        debug!(
            pool = hop.pool_token_id,
            direction = ?hop.direction,
            amount_in = %hop.amount_in,
            gross = %hop.gross_amount,
            fee = %hop.fee,
            net = %hop.net_amount,
            "hop applied"
        );
        Ok(())
    }

    /// The pool's ledger account must cover the gross payout even with the
    /// reserve floor off, so `apply_hop` never fails halfway
    async fn check_hop(&self, tx: &mut StateTx, hop: &HopQuote, pool: &LiquidityPool) -> Result<(), ExchangeError> {
        if self.options.enforce_reserve_floor {
            hop.ensure_reserve(pool)?;
        }

        let held = self
            .balances
            .pool_balance(tx, hop.pool_token_id, hop.to_token_id)
            .await?;
        if held < hop.gross_amount {
            return Err(ExchangeError::InsufficientBalance {
                account: LedgerAccount::pool(hop.pool_token_id),
                token_id: hop.to_token_id,
                balance: held,
                requested: hop.gross_amount,
            });
        }
        Ok(())
    }
}
