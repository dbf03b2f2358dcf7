//! CLI commands and handlers
use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use rust_decimal::Decimal;
use tracing::{info, warn};

use crate::application::scenario::Scenario;
use crate::application::services::ExchangeService;
use crate::domain::identity::FixedIdentity;
use crate::report::{BalanceEntry, ExchangeRecord, SimulationReport};
use crate::shared::errors::AppError;
use crate::shared::types::{LedgerAccount, TokenId};
use crate::shared::utils::format_amount;

#[derive(Parser, Debug)]
#[command(name = "hubswap")]
#[command(version, about = "Fixed-rate liquidity pool exchange routed through a platform token")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Platform fee (overrides the scenario file)
    #[arg(long, global = true)]
    pub fee: Option<Decimal>,

    /// Retries after a commit conflict (overrides the scenario file)
    #[arg(long, global = true)]
    pub retry_attempts: Option<u32>,

    /// Let pool reserves go negative instead of rejecting the hop
    #[arg(long, global = true)]
    pub no_reserve_floor: bool,
}

#[derive(Args, Debug, Clone)]
pub struct ScenarioArgs {
    /// Scenario file (TOML)
    #[arg(short, long)]
    pub scenario: PathBuf,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Seed a scenario and run all of its exchanges
    Simulate {
        #[command(flatten)]
        scenario: ScenarioArgs,
    },

    /// Price an exchange against a seeded scenario without applying it
    Quote {
        #[command(flatten)]
        scenario: ScenarioArgs,

        #[arg(long)]
        from: TokenId,

        #[arg(long)]
        to: TokenId,

        #[arg(long)]
        amount: Decimal,
    },

    /// Apply a single exchange against a seeded scenario
    Exchange {
        #[command(flatten)]
        scenario: ScenarioArgs,

        /// Account submitting the exchange
        #[arg(long)]
        caller: String,

        #[arg(long)]
        from: TokenId,

        #[arg(long)]
        to: TokenId,

        #[arg(long)]
        amount: Decimal,
    },
}

impl Commands {
    pub fn scenario_path(&self) -> &PathBuf {
        match self {
            Commands::Simulate { scenario }
            | Commands::Quote { scenario, .. }
            | Commands::Exchange { scenario, .. } => &scenario.scenario,
        }
    }
}

/// Command executor
pub struct CommandExecutor {
    service: ExchangeService,
}

impl CommandExecutor {
    pub fn new(service: ExchangeService) -> Self {
        Self { service }
    }

    /// Seed `scenario`, run `command` and report the resulting state
    pub async fn execute(&self, command: &Commands, scenario: &Scenario) -> Result<SimulationReport, AppError> {
        scenario.seed(&self.service).await?;
        let mut report = SimulationReport::new(self.service.platform_config().await?);

        match command {
            Commands::Simulate { .. } => {
                for request in &scenario.exchanges {
                    let caller = FixedIdentity::new(request.caller.clone());
                    let outcome = self
                        .service
                        .exchange(&caller, request.from_token_id, request.to_token_id, request.amount)
                        .await;

                    let (result, error) = match outcome {
                        Ok(result) => {
                            info!(
                                caller = %request.caller,
                                received = %format_amount(result.to_token_amount),
                                fee = %format_amount(result.platform_fee),
                                "exchange succeeded"
                            );
                            (Some(result), None)
                        }
                        Err(err) => {
                            warn!(caller = %request.caller, error = %err, "exchange rejected");
                            (None, Some(err.to_string()))
                        }
                    };
                    report.record_exchange(ExchangeRecord {
                        caller: request.caller.clone(),
                        from_token_id: request.from_token_id,
                        to_token_id: request.to_token_id,
                        amount: request.amount,
                        result,
                        error,
                    });
                }
            }
            Commands::Quote { from, to, amount, .. } => {
                let plan = self.service.quote(*from, *to, *amount).await?;
                report = report.with_quote(plan);
            }
            Commands::Exchange { caller, from, to, amount, .. } => {
                let identity = FixedIdentity::new(caller.clone());
                let result = self.service.exchange(&identity, *from, *to, *amount).await?;
                report.record_exchange(ExchangeRecord {
                    caller: caller.clone(),
                    from_token_id: *from,
                    to_token_id: *to,
                    amount: *amount,
                    result: Some(result),
                    error: None,
                });
            }
        }

        let pools = self.service.list_pools().await?;
        let balances = self.balances(scenario, command).await?;
        Ok(report.with_state(pools, balances))
    }

    async fn balances(&self, scenario: &Scenario, command: &Commands) -> Result<Vec<BalanceEntry>, AppError> {
        let mut accounts = scenario.accounts();
        if let Commands::Exchange { caller, .. } = command {
            accounts.insert(caller.clone());
        }

        let mut entries = Vec::new();
        for account in accounts {
            for token_id in scenario.token_ids() {
                let amount = self
                    .service
                    .balance_of(&LedgerAccount::user(account.as_str()), token_id)
                    .await?;
                if !amount.is_zero() {
                    entries.push(BalanceEntry {
                        account: account.clone(),
                        token_id,
                        amount,
                    });
                }
            }
        }
        Ok(entries)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::state::MemoryStore;
    use rust_decimal_macros::dec;
    use std::sync::Arc;

    const WALKTHROUGH: &str = r#"
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

        [[tokens]]
        id = 3
        name = "MilesPoin"
        creator = "adminMiles"

        [[balances]]
        account = "adminLivin"
        token_id = 1
        amount = 2000000

        [[balances]]
        account = "adminLivin"
        token_id = 2
        amount = 1000000

        [[balances]]
        account = "adminMiles"
        token_id = 1
        amount = 3000000

        [[balances]]
        account = "adminMiles"
        token_id = 3
        amount = 200000

        [[balances]]
        account = "user1"
        token_id = 2
        amount = 10000

        [[pools]]
        creator = "adminLivin"
        token_id = 2
        token_supply = 200000
        platform_supply = 2000000
        exchange_rate = 10

        [[pools]]
        creator = "adminMiles"
        token_id = 3
        token_supply = 150000
        platform_supply = 3000000
        exchange_rate = 200

        [[exchanges]]
        caller = "user1"
        from_token_id = 2
        to_token_id = 1
        amount = 3000

        [[exchanges]]
        caller = "user1"
        from_token_id = 1
        to_token_id = 2
        amount = 3000

        [[exchanges]]
        caller = "user1"
        from_token_id = 2
        to_token_id = 3
        amount = 3000

        [[exchanges]]
        caller = "user1"
        from_token_id = 2
        to_token_id = 3
        amount = 1
    "#;

    fn executor() -> CommandExecutor {
        let scenario = Scenario::parse(WALKTHROUGH).unwrap();
        CommandExecutor::new(ExchangeService::new(
            Arc::new(MemoryStore::new()),
            scenario.config.engine.clone(),
        ))
    }

    fn args() -> ScenarioArgs {
        ScenarioArgs {
            scenario: PathBuf::from("walkthrough.toml"),
        }
    }

    #[tokio::test]
    async fn test_simulate_walkthrough() {
        let scenario = Scenario::parse(WALKTHROUGH).unwrap();
        let report = executor()
            .execute(&Commands::Simulate { scenario: args() }, &scenario)
            .await
            .unwrap();

        assert_eq!(report.exchanges.len(), 4);
        assert_eq!(report.failed_exchanges(), 1);
        let amounts: Vec<_> = report
            .exchanges
            .iter()
            .filter_map(|r| r.result.as_ref().map(|res| res.to_token_amount))
            .collect();
        assert_eq!(amounts, vec![dec!(29000), dec!(200), dec!(145)]);

        let balance = |account: &str, token_id: TokenId| {
            report
                .balances
                .iter()
                .find(|b| b.account == account && b.token_id == token_id)
                .map(|b| b.amount)
        };
        assert_eq!(balance("user1", 1), Some(dec!(26000)));
        assert_eq!(balance("user1", 2), Some(dec!(4200)));
        assert_eq!(balance("user1", 3), Some(dec!(145)));
        assert_eq!(balance("adminBUMN", 1), Some(dec!(1000)));
        assert_eq!(balance("adminBUMN", 2), Some(dec!(100)));
        assert_eq!(balance("adminBUMN", 3), Some(dec!(5)));

        assert_eq!(report.pools[0].token_supply, dec!(205700));
        assert_eq!(report.pools[0].token_platform_supply, dec!(1943000));
        assert_eq!(report.pools[1].token_supply, dec!(149850));
        assert_eq!(report.pools[1].token_platform_supply, dec!(3030000));
    }

    #[tokio::test]
    async fn test_quote_command_leaves_pools_alone() {
        let scenario = Scenario::parse(WALKTHROUGH).unwrap();
        let command = Commands::Quote {
            scenario: args(),
            from: 2,
            to: 3,
            amount: dec!(3000),
        };
        let report = executor().execute(&command, &scenario).await.unwrap();

        let plan = report.quote.unwrap();
        assert_eq!(plan.final_hop.net_amount, dec!(145));
        assert!(report.exchanges.is_empty());
        assert_eq!(report.pools[0].token_supply, dec!(200000));
    }

    #[tokio::test]
    async fn test_exchange_command_propagates_rejection() {
        let scenario = Scenario::parse(WALKTHROUGH).unwrap();
        let command = Commands::Exchange {
            scenario: args(),
            caller: "nobody".to_string(),
            from: 2,
            to: 1,
            amount: dec!(3000),
        };
        let err = executor().execute(&command, &scenario).await.unwrap_err();
        assert!(matches!(
            err,
            AppError::Exchange(crate::shared::errors::ExchangeError::InsufficientBalance { .. })
        ));
    }

    #[test]
    fn test_cli_parses_overrides() {
        let cli = Cli::try_parse_from([
            "hubswap",
            "quote",
            "--scenario",
            "s.toml",
            "--from",
            "2",
            "--to",
            "1",
            "--amount",
            "12.5",
            "--fee",
            "50",
            "--no-reserve-floor",
        ])
        .unwrap();

        assert_eq!(cli.fee, Some(dec!(50)));
        assert!(cli.no_reserve_floor);
        assert_eq!(cli.retry_attempts, None);
        assert_eq!(cli.command.scenario_path(), &PathBuf::from("s.toml"));
        assert!(matches!(cli.command, Commands::Quote { amount, .. } if amount == dec!(12.5)));
    }
}
