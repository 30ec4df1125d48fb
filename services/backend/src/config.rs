use serde::Deserialize;
use shared::{Currency, MAX_BET_MINOR, MIN_BET_MINOR};
use std::env;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub api_port: u16,
    pub metrics_port: u16,
    pub redis: RedisConfig,
    pub wallet: WalletConfig,
    pub betting: BettingConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RedisConfig {
    pub url: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct WalletConfig {
    pub default_currency: Currency,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BettingConfig {
    pub min_bet_minor: u64,
    pub max_bet_minor: u64,
}

impl Config {
    pub fn load() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let default_currency = env::var("DEFAULT_CURRENCY")
            .map(|code| {
                Currency::try_from(code.as_str())
                    .map_err(|e| anyhow::anyhow!("DEFAULT_CURRENCY: {}", e))
            })
            .unwrap_or(Ok(Currency::Inr))?;

        Ok(Config {
            api_port: env::var("API_PORT")
                .unwrap_or_else(|_| "3001".to_string())
                .parse()?,
            metrics_port: env::var("METRICS_PORT")
                .unwrap_or_else(|_| "9090".to_string())
                .parse()?,
            redis: RedisConfig {
                url: env::var("REDIS_URL")
                    .unwrap_or_else(|_| "redis://localhost:6379".to_string()),
            },
            wallet: WalletConfig { default_currency },
            betting: BettingConfig {
                min_bet_minor: env::var("MIN_BET_MINOR")
                    .unwrap_or_else(|_| MIN_BET_MINOR.to_string())
                    .parse()?,
                max_bet_minor: env::var("MAX_BET_MINOR")
                    .unwrap_or_else(|_| MAX_BET_MINOR.to_string())
                    .parse()?,
            },
        })
    }

    /// Fixed configuration for tests: no env access, in-memory friendly
    pub fn for_tests() -> Self {
        Config {
            api_port: 0,
            metrics_port: 0,
            redis: RedisConfig {
                url: "redis://localhost:6379".to_string(),
            },
            wallet: WalletConfig {
                default_currency: Currency::Inr,
            },
            betting: BettingConfig {
                min_bet_minor: MIN_BET_MINOR,
                max_bet_minor: MAX_BET_MINOR,
            },
        }
    }
}
