//! Platform domain - hub token and flat fee settings

use tracing::info;

use crate::infrastructure::state::{composite_key, StateTx};
use crate::shared::errors::ExchangeError;
use crate::shared::types::{Amount, PlatformConfig, TokenId};

const PLATFORM_PREFIX: &str = "platform";
const TOKEN_ID_FIELD: &str = "token_id";
const FEE_AMOUNT_FIELD: &str = "fee_amount";

/// Accessors for the platform settings stored in the world state
#[derive(Debug, Clone, Copy, Default)]
pub struct PlatformConfiguration;

impl PlatformConfiguration {
    pub fn new() -> Self {
        Self
    }

    /// Fee is stored as given; negative values are not rejected here
    pub async fn set_platform_fee_amount(&self, tx: &mut StateTx, fee: Amount) -> Result<(), ExchangeError> {
        tx.put_json(field_key(FEE_AMOUNT_FIELD)?, &fee)?;
        info!(%fee, "platform fee amount set");
        Ok(())
    }

    pub async fn platform_fee_amount(&self, tx: &mut StateTx) -> Result<Amount, ExchangeError> {
        tx.get_json(&field_key(FEE_AMOUNT_FIELD)?)
            .await?
            .ok_or(ExchangeError::ConfigMissing("platform fee amount"))
    }

    pub async fn set_platform_token_id(&self, tx: &mut StateTx, token_id: TokenId) -> Result<(), ExchangeError> {
        tx.put_json(field_key(TOKEN_ID_FIELD)?, &token_id)?;
        info!(token_id, "platform token set");
        Ok(())
    }

    pub async fn platform_token_id(&self, tx: &mut StateTx) -> Result<TokenId, ExchangeError> {
        tx.get_json(&field_key(TOKEN_ID_FIELD)?)
            .await?
            .ok_or(ExchangeError::ConfigMissing("platform token id"))
    }

    /// Both settings as read by this transaction
    pub async fn snapshot(&self, tx: &mut StateTx) -> Result<PlatformConfig, ExchangeError> {
        Ok(PlatformConfig {
            token_id: self.platform_token_id(tx).await?,
            fee_amount: self.platform_fee_amount(tx).await?,
        })
    }

    pub async fn apply(&self, tx: &mut StateTx, config: &PlatformConfig) -> Result<(), ExchangeError> {
        self.set_platform_token_id(tx, config.token_id).await?;
        self.set_platform_fee_amount(tx, config.fee_amount).await
    }
}

fn field_key(field: &str) -> Result<String, ExchangeError> {
    Ok(composite_key(PLATFORM_PREFIX, &[field])?)
}
