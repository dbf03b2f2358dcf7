//! Route classification and per-hop amount calculation

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::pool::{LiquidityPool, PoolSide};
use crate::shared::errors::ExchangeError;
use crate::shared::types::{Amount, TokenId};

/// Path taken by an exchange request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Route {
    /// `token -> platform` through the token's pool
    ToPlatform { pool_token_id: TokenId },
    /// `platform -> token` through the token's pool
    FromPlatform { pool_token_id: TokenId },
    /// `token -> platform -> token` through two pools
    TwoHop {
        first_pool_token_id: TokenId,
        second_pool_token_id: TokenId,
    },
}

impl Route {
    pub fn classify(
        platform_token_id: TokenId,
        from_token_id: TokenId,
        to_token_id: TokenId,
    ) -> Result<Self, ExchangeError> {
        if from_token_id == to_token_id {
            return Err(ExchangeError::SameToken(from_token_id));
        }

        let route = if to_token_id == platform_token_id {
            Route::ToPlatform { pool_token_id: from_token_id }
        } else if from_token_id == platform_token_id {
            Route::FromPlatform { pool_token_id: to_token_id }
        } else {
            Route::TwoHop {
                first_pool_token_id: from_token_id,
                second_pool_token_id: to_token_id,
            }
        };
        Ok(route)
    }

    pub fn hop_count(&self) -> usize {
        match self {
            Route::ToPlatform { .. } | Route::FromPlatform { .. } => 1,
            Route::TwoHop { .. } => 2,
        }
    }
}

/// Direction of value through a single pool
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum HopDirection {
    /// Paired token in, platform token out
    IntoPlatform,
    /// Platform token in, paired token out
    OutOfPlatform,
}

impl HopDirection {
    /// Reserve that receives `amount_in`
    pub fn inflow_side(self) -> PoolSide {
        match self {
            HopDirection::IntoPlatform => PoolSide::Token,
            HopDirection::OutOfPlatform => PoolSide::Platform,
        }
    }

    /// Reserve that pays out the gross amount
    pub fn outflow_side(self) -> PoolSide {
        match self {
            HopDirection::IntoPlatform => PoolSide::Platform,
            HopDirection::OutOfPlatform => PoolSide::Token,
        }
    }
}

/// Economics of one single-pool step
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HopQuote {
    pub pool_token_id: TokenId,
    pub direction: HopDirection,
    pub from_token_id: TokenId,
    pub to_token_id: TokenId,
    pub amount_in: Amount,
    /// Effective rate applied to `amount_in`
    pub exchange_rate: Amount,
    pub gross_amount: Amount,
    pub fee: Amount,
    pub net_amount: Amount,
}

impl HopQuote {
    /// `token -> platform`: the fee is a flat platform-token amount
    pub fn into_platform(
        pool: &LiquidityPool,
        platform_token_id: TokenId,
        amount_in: Amount,
        fee: Amount,
    ) -> Result<Self, ExchangeError> {
        let rate = pool.exchange_rate;
        let gross = amount_in
            .checked_mul(rate)
            .ok_or(ExchangeError::Arithmetic("gross amount"))?;

        Self::settle(
            pool,
            HopDirection::IntoPlatform,
            pool.token_id,
            platform_token_id,
            amount_in,
            rate,
            gross,
            fee,
        )
    }

    /// `platform -> token`: the platform fee is converted at the hop's rate
    pub fn out_of_platform(
        pool: &LiquidityPool,
        platform_token_id: TokenId,
        amount_in: Amount,
        platform_fee: Amount,
    ) -> Result<Self, ExchangeError> {
        if pool.exchange_rate <= Decimal::ZERO {
            return Err(ExchangeError::InvalidExchangeRate(pool.exchange_rate));
        }
        let rate = Decimal::ONE
            .checked_div(pool.exchange_rate)
            .ok_or(ExchangeError::Arithmetic("inverse exchange rate"))?;
        // Divide by the pool rate directly; multiplying by the rounded inverse leaves dust
        let gross = amount_in
            .checked_div(pool.exchange_rate)
            .ok_or(ExchangeError::Arithmetic("gross amount"))?;
        let fee = platform_fee
            .checked_div(pool.exchange_rate)
            .ok_or(ExchangeError::Arithmetic("scaled platform fee"))?;

        Self::settle(
            pool,
            HopDirection::OutOfPlatform,
            platform_token_id,
            pool.token_id,
            amount_in,
            rate,
            gross,
            fee,
        )
    }

    #[allow(clippy::too_many_arguments)]
    fn settle(
        pool: &LiquidityPool,
        direction: HopDirection,
        from_token_id: TokenId,
        to_token_id: TokenId,
        amount_in: Amount,
        exchange_rate: Amount,
        gross_amount: Amount,
        fee: Amount,
    ) -> Result<Self, ExchangeError> {
        if fee < Decimal::ZERO {
            return Err(ExchangeError::InvalidAmount(fee));
        }
        let net_amount = gross_amount
            .checked_sub(fee)
            .ok_or(ExchangeError::Arithmetic("net amount"))?;
        if net_amount < Decimal::ZERO {
            return Err(ExchangeError::FeeNotCovered {
                gross: gross_amount,
                fee,
            });
        }

        Ok(Self {
            pool_token_id: pool.token_id,
            direction,
            from_token_id,
            to_token_id,
            amount_in,
            exchange_rate,
            gross_amount,
            fee,
            net_amount,
        })
    }

    /// Reject the hop if the paying reserve cannot cover the gross amount
    pub fn ensure_reserve(&self, pool: &LiquidityPool) -> Result<(), ExchangeError> {
        let reserve = pool.reserve(self.direction.outflow_side());
        if reserve < self.gross_amount {
            return Err(ExchangeError::InsufficientReserve {
                pool_token_id: self.pool_token_id,
                token_id: self.to_token_id,
                reserve,
                requested: self.gross_amount,
            });
        }
        Ok(())
    }
}
