//! Scenario files: seed state plus a list of exchanges to run

use std::collections::BTreeSet;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::application::services::ExchangeService;
use crate::domain::identity::FixedIdentity;
use crate::shared::config::ConfigLoader;
use crate::shared::errors::AppError;
use crate::shared::types::{AccountId, Amount, ServiceConfig, TokenId};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeedToken {
    pub id: TokenId,
    pub name: String,
    pub creator: AccountId,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeedBalance {
    pub account: AccountId,
    pub token_id: TokenId,
    pub amount: Amount,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeedPool {
    pub creator: AccountId,
    pub token_id: TokenId,
    pub token_supply: Amount,
    pub platform_supply: Amount,
    pub exchange_rate: Amount,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExchangeRequest {
    pub caller: AccountId,
    pub from_token_id: TokenId,
    pub to_token_id: TokenId,
    pub amount: Amount,
}

/// Service config extended with `[[tokens]]`, `[[balances]]`, `[[pools]]`
/// and `[[exchanges]]` tables
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Scenario {
    #[serde(flatten)]
    pub config: ServiceConfig,
    #[serde(default)]
    pub tokens: Vec<SeedToken>,
    #[serde(default)]
    pub balances: Vec<SeedBalance>,
    #[serde(default)]
    pub pools: Vec<SeedPool>,
    #[serde(default)]
    pub exchanges: Vec<ExchangeRequest>,
}

impl Scenario {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, AppError> {
        let scenario: Self = ConfigLoader::from_file(path)?;
        scenario.validate()?;
        Ok(scenario)
    }

    pub fn parse(content: &str) -> Result<Self, AppError> {
        let scenario: Self = ConfigLoader::parse(content)?;
        scenario.validate()?;
        Ok(scenario)
    }

    fn validate(&self) -> Result<(), AppError> {
        let mut seen = BTreeSet::new();
        for token in &self.tokens {
            if !seen.insert(token.id) {
                return Err(AppError::ScenarioError(format!("token {} declared twice", token.id)));
            }
        }
        if !seen.contains(&self.config.platform.token_id) {
            return Err(AppError::ScenarioError(format!(
                "platform token {} is not declared in [[tokens]]",
                self.config.platform.token_id
            )));
        }
        Ok(())
    }

    /// Write tokens, balances and pools through the service
    pub async fn seed(&self, service: &ExchangeService) -> Result<(), AppError> {
        service.configure_platform(self.config.platform.clone()).await?;

        for token in &self.tokens {
            service.register_token(token.id, &token.name, &token.creator).await?;
        }
        for balance in &self.balances {
            service
                .credit(&balance.account, balance.token_id, balance.amount)
                .await?;
        }
        for pool in &self.pools {
            let creator = FixedIdentity::new(pool.creator.clone());
            service
                .create_lp(
                    &creator,
                    pool.token_id,
                    pool.token_supply,
                    pool.platform_supply,
                    pool.exchange_rate,
                )
                .await?;
        }

        info!(
            tokens = self.tokens.len(),
            balances = self.balances.len(),
            pools = self.pools.len(),
            "scenario seeded"
        );
        Ok(())
    }

    /// Every account the scenario mentions, in order
    pub fn accounts(&self) -> BTreeSet<AccountId> {
        let mut accounts = BTreeSet::new();
        accounts.extend(self.tokens.iter().map(|t| t.creator.clone()));
        accounts.extend(self.balances.iter().map(|b| b.account.clone()));
        accounts.extend(self.pools.iter().map(|p| p.creator.clone()));
        accounts.extend(self.exchanges.iter().map(|e| e.caller.clone()));
        accounts
    }

    pub fn token_ids(&self) -> Vec<TokenId> {
        self.tokens.iter().map(|t| t.id).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    const SCENARIO: &str = r#"
        [platform]
        token_id = 1
        fee_amount = 1000

        [[tokens]]
        id = 1
        name = "BUMNPoin"
        creator = "adminBUMN"

        [[tokens]]
        id = 2
        name = "LivinPoin"
        creator = "adminLivin"

        [[balances]]
        account = "adminLivin"
        token_id = 1
        amount = 2000000

        [[balances]]
        account = "adminLivin"
        token_id = 2
        amount = 1000000

        [[pools]]
        creator = "adminLivin"
        token_id = 2
        token_supply = 200000
        platform_supply = 2000000
        exchange_rate = "10"

        [[exchanges]]
        caller = "user1"
        from_token_id = 2
        to_token_id = 1
        amount = "3000"
    "#;

    #[test]
    fn test_parse_scenario() {
        let scenario = Scenario::parse(SCENARIO).unwrap();

        assert_eq!(scenario.config.platform.fee_amount, dec!(1000));
        assert_eq!(scenario.config.engine.retry_attempts, 3);
        assert_eq!(scenario.tokens.len(), 2);
        assert_eq!(scenario.pools[0].exchange_rate, dec!(10));
        assert_eq!(scenario.exchanges[0].amount, dec!(3000));
        assert_eq!(
            scenario.accounts().into_iter().collect::<Vec<_>>(),
            vec!["adminBUMN", "adminLivin", "user1"]
        );
    }

    #[test]
    fn test_platform_token_must_be_declared() {
        let content = "[platform]\ntoken_id = 9\nfee_amount = 1\n";
        assert!(matches!(Scenario::parse(content), Err(AppError::ScenarioError(_))));
    }
}
