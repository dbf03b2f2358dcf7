//! Liquidity pool record

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::shared::errors::ExchangeError;
use crate::shared::types::{AccountId, Amount, TokenId};

/// Reserve record pairing one token against the platform token at a fixed rate
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LiquidityPool {
    pub token_id: TokenId,
    /// Reserve of the paired token
    pub token_supply: Amount,
    /// Reserve of the platform token
    pub token_platform_supply: Amount,
    pub creator_id: AccountId,
    /// Platform-token units per one paired-token unit
    pub exchange_rate: Amount,
}

/// Which reserve of a pool an amount belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PoolSide {
    Token,
    Platform,
}

impl LiquidityPool {
    pub fn new(
        token_id: TokenId,
        token_supply: Amount,
        token_platform_supply: Amount,
        creator_id: impl Into<AccountId>,
        exchange_rate: Amount,
    ) -> Self {
        Self {
            token_id,
            token_supply,
            token_platform_supply,
            creator_id: creator_id.into(),
            exchange_rate,
        }
    }

    pub fn reserve(&self, side: PoolSide) -> Amount {
        match side {
            PoolSide::Token => self.token_supply,
            PoolSide::Platform => self.token_platform_supply,
        }
    }

    pub fn deposit(&mut self, side: PoolSide, amount: Amount) -> Result<(), ExchangeError> {
        let reserve = self.reserve_mut(side);
        *reserve = reserve
            .checked_add(amount)
            .ok_or(ExchangeError::Arithmetic("pool reserve deposit"))?;
        Ok(())
    }

    /// Reduce a reserve; the record itself does not refuse to go negative
    pub fn withdraw(&mut self, side: PoolSide, amount: Amount) -> Result<(), ExchangeError> {
        let reserve = self.reserve_mut(side);
        *reserve = reserve
            .checked_sub(amount)
            .ok_or(ExchangeError::Arithmetic("pool reserve withdrawal"))?;
        Ok(())
    }

    fn reserve_mut(&mut self, side: PoolSide) -> &mut Amount {
        match side {
            PoolSide::Token => &mut self.token_supply,
            PoolSide::Platform => &mut self.token_platform_supply,
        }
    }
}
