// src/app.rs
use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::info;

use hubswap::application::{Cli, CommandExecutor, ExchangeService, Scenario};
use hubswap::infrastructure::state::MemoryStore;
use hubswap::shared::types::ServiceConfig;

/// Scenario plus the settings actually in effect
#[derive(Debug, Clone)]
pub struct AppCfg {
    pub scenario: Scenario,
}

impl AppCfg {
    /// CLI flags take priority over the scenario file, which takes priority over defaults
    pub fn from_cli(cli: &Cli) -> Result<Self> {
        let path = cli.command.scenario_path();
        let mut scenario = Scenario::load(path)
            .with_context(|| format!("loading scenario {}", path.display()))?;

        let config = &mut scenario.config;
        if let Some(fee) = cli.fee {
            config.platform.fee_amount = fee;
        }
        if let Some(retry_attempts) = cli.retry_attempts {
            config.engine.retry_attempts = retry_attempts;
        }
        if cli.no_reserve_floor {
            config.engine.enforce_reserve_floor = false;
        }

        Ok(Self { scenario })
    }

    pub fn service_config(&self) -> &ServiceConfig {
        &self.scenario.config
    }
}

pub async fn run(cli: Cli) -> Result<()> {
    let app_cfg = AppCfg::from_cli(&cli)?;
    let config = app_cfg.service_config();
    info!(
        platform_token = config.platform.token_id,
        fee = %config.platform.fee_amount,
        retry_attempts = config.engine.retry_attempts,
        reserve_floor = config.engine.enforce_reserve_floor,
        "starting exchange engine"
    );

    let service = ExchangeService::new(Arc::new(MemoryStore::new()), config.engine.clone());
    let executor = CommandExecutor::new(service);
    let report = executor
        .execute(&cli.command, &app_cfg.scenario)
        .await
        .context("command failed")?;

    println!("{}", report.to_json()?);
    info!(
        exchanges = report.exchanges.len(),
        failed = report.failed_exchanges(),
        "done"
    );
    Ok(())
}
