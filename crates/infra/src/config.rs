//! Market configuration.
//!
//! Read from environment variables:
//!
//! | variable | default |
//! |---|---|
//! | `TRADEPOST_STARTING_BALANCE` | `1000` |
//! | `TRADEPOST_BALANCE_POLICY` | `reject_negative` |
//! | `TRADEPOST_PRICE_SEED` | unset (entropy) |

use std::str::FromStr;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use tradepost_market::BalancePolicy;

pub const STARTING_BALANCE_VAR: &str = "TRADEPOST_STARTING_BALANCE";
pub const BALANCE_POLICY_VAR: &str = "TRADEPOST_BALANCE_POLICY";
pub const PRICE_SEED_VAR: &str = "TRADEPOST_PRICE_SEED";

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("invalid value for {field}: {reason}")]
    InvalidValue { field: &'static str, reason: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarketConfig {
    /// Balance given to players created without an explicit one.
    pub starting_balance: Decimal,
    pub balance_policy: BalancePolicy,
    /// Seed for the price generator; `None` draws from OS entropy.
    pub price_seed: Option<u64>,
}

impl Default for MarketConfig {
    fn default() -> Self {
        Self {
            starting_balance: Decimal::ONE_THOUSAND,
            balance_policy: BalancePolicy::RejectNegative,
            price_seed: None,
        }
    }
}

impl MarketConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary variable source; unset or blank keys keep
    /// their defaults.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        if let Some(raw) = get(STARTING_BALANCE_VAR) {
            config.starting_balance = Decimal::from_str(&raw).map_err(|e| ConfigError::InvalidValue {
                field: STARTING_BALANCE_VAR,
                reason: format!("'{raw}' is not a decimal: {e}"),
            })?;
        }

        if let Some(raw) = get(BALANCE_POLICY_VAR) {
            config.balance_policy = parse_policy(&raw)?;
        }

        if let Some(raw) = get(PRICE_SEED_VAR) {
            config.price_seed = Some(raw.parse::<u64>().map_err(|e| ConfigError::InvalidValue {
                field: PRICE_SEED_VAR,
                reason: format!("'{raw}' is not an unsigned integer: {e}"),
            })?);
        }

        config.validate()?;
        Ok(config)
    }

    /// The default starting balance must itself satisfy the balance policy.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.balance_policy == BalancePolicy::RejectNegative && self.starting_balance < Decimal::ZERO {
            return Err(ConfigError::InvalidValue {
                field: STARTING_BALANCE_VAR,
                reason: "negative starting balance with reject_negative policy".to_string(),
            });
        }
        Ok(())
    }
}

fn parse_policy(raw: &str) -> Result<BalancePolicy, ConfigError> {
    match raw.to_ascii_lowercase().as_str() {
        "allow_negative" => Ok(BalancePolicy::AllowNegative),
        "reject_negative" => Ok(BalancePolicy::RejectNegative),
        other => Err(ConfigError::InvalidValue {
            field: BALANCE_POLICY_VAR,
            reason: format!("expected allow_negative or reject_negative, got '{other}'"),
        }),
    }
}
