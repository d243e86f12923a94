//! Basket configuration: the YAML document that survives between runs.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::AppError;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TickerSettings {
    /// Priority multiplier, mutated across cycles by the weight updater.
    pub weight: f64,
    /// Static dip-sensitivity multiplier.
    pub rebalance_factor: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub tickers: BTreeMap<String, TickerSettings>,
    // Older basket files spelled this "dail_limit"; keep reading them.
    #[serde(alias = "dail_limit")]
    pub daily_limit: f64,
    pub threshold: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_updated: Option<NaiveDate>,
}

impl Config {
    pub fn load(path: &Path) -> Result<Self, AppError> {
        let contents = fs::read_to_string(path).map_err(|e| AppError::ConfigRead {
            path: path.to_path_buf(),
            source: e,
        })?;
        let config: Config =
            serde_yaml::from_str(&contents).map_err(|e| AppError::ConfigParse {
                path: path.to_path_buf(),
                source: e,
            })?;
        config.validate(path)?;
        Ok(config)
    }

    fn validate(&self, path: &Path) -> Result<(), AppError> {
        for (symbol, settings) in &self.tickers {
            if settings.weight <= 0.0 {
                return Err(AppError::ConfigInvalid {
                    path: path.to_path_buf(),
                    reason: format!("{symbol}: weight must be positive"),
                });
            }
            if settings.rebalance_factor <= 0.0 {
                return Err(AppError::ConfigInvalid {
                    path: path.to_path_buf(),
                    reason: format!("{symbol}: rebalance_factor must be positive"),
                });
            }
        }
        if self.daily_limit <= 0.0 {
            return Err(AppError::ConfigInvalid {
                path: path.to_path_buf(),
                reason: "daily_limit must be positive".to_string(),
            });
        }
        Ok(())
    }

    /// Persist via temp file + rename so an interrupted run never leaves a
    /// half-written basket on disk.
    pub fn save(&self, path: &Path) -> Result<(), AppError> {
        let body = serde_yaml::to_string(self)?;
        let tmp_path = path.with_extension("tmp");
        fs::write(&tmp_path, body).map_err(|e| AppError::Persistence {
            path: path.to_path_buf(),
            source: e,
        })?;
        fs::rename(&tmp_path, path).map_err(|e| AppError::Persistence {
            path: path.to_path_buf(),
            source: e,
        })
    }
}
