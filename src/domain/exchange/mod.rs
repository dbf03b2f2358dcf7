//! Exchange domain - routing swaps through one or two fixed-rate pools

mod exchange_router;
mod route;

pub use exchange_router::{ExchangeRouter, RouterOptions};
pub use route::{HopDirection, HopQuote, Route};

use serde::{Deserialize, Serialize};

use crate::shared::types::{AccountId, Amount, PlatformConfig, TokenId};

/// Outcome reported to the caller
///
/// `from_*` echo the request; `to_token_amount`, `exchange_rate` and
/// `platform_fee` describe the last hop only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExchangeResult {
    pub from_token_id: TokenId,
    pub from_token_amount: Amount,
    pub to_token_id: TokenId,
    pub to_token_amount: Amount,
    pub exchange_rate: Amount,
    pub platform_fee: Amount,
}

/// Every hop of a request, computed before anything is moved
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExchangePlan {
    pub route: Route,
    /// Fee-free first leg of a two-hop route
    pub leading_hop: Option<HopQuote>,
    pub final_hop: HopQuote,
    pub platform: PlatformConfig,
    pub fee_recipient: AccountId,
}

impl ExchangePlan {
    /// Hops in execution order
    pub fn hops(&self) -> impl Iterator<Item = &HopQuote> {
        self.leading_hop.iter().chain(std::iter::once(&self.final_hop))
    }

    pub fn result(&self, from_token_id: TokenId, from_token_amount: Amount) -> ExchangeResult {
        ExchangeResult {
            from_token_id,
            from_token_amount,
            to_token_id: self.final_hop.to_token_id,
            to_token_amount: self.final_hop.net_amount,
            exchange_rate: self.final_hop.exchange_rate,
            platform_fee: self.final_hop.fee,
        }
    }

    /// Fees charged, keyed by the token each one is paid in
    pub fn fees(&self) -> Vec<(TokenId, Amount)> {
        self.hops()
            .filter(|hop| !hop.fee.is_zero())
            .map(|hop| (hop.to_token_id, hop.fee))
            .collect()
    }
}
