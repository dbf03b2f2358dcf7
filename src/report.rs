// src/report.rs
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::exchange::{ExchangePlan, ExchangeResult};
use crate::domain::pool::LiquidityPool;
use crate::shared::types::{AccountId, Amount, PlatformConfig, TokenId};

#[derive(Debug, Serialize, Deserialize)]
pub struct SimulationReport {
    pub platform: PlatformConfig,
    pub exchanges: Vec<ExchangeRecord>,
    pub quote: Option<ExchangePlan>,

    // State after the run
    pub pools: Vec<LiquidityPool>,
    pub balances: Vec<BalanceEntry>,

    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ExchangeRecord {
    pub caller: AccountId,
    pub from_token_id: TokenId,
    pub to_token_id: TokenId,
    pub amount: Amount,
    pub result: Option<ExchangeResult>,
    pub error: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BalanceEntry {
    pub account: AccountId,
    pub token_id: TokenId,
    pub amount: Amount,
}

impl SimulationReport {
    pub fn new(platform: PlatformConfig) -> Self {
        Self {
            platform,
            exchanges: Vec::new(),
            quote: None,
            pools: Vec::new(),
            balances: Vec::new(),
            timestamp: Utc::now(),
        }
    }

    pub fn record_exchange(&mut self, record: ExchangeRecord) {
        self.exchanges.push(record);
    }

    pub fn with_quote(mut self, plan: ExchangePlan) -> Self {
        self.quote = Some(plan);
        self
    }

    pub fn with_state(mut self, pools: Vec<LiquidityPool>, balances: Vec<BalanceEntry>) -> Self {
        self.pools = pools;
        self.balances = balances;
        self
    }

    pub fn failed_exchanges(&self) -> usize {
        self.exchanges.iter().filter(|r| r.error.is_some()).count()
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}
