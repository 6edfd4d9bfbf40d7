//! Configuration for grouping and list views

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::types::*;

/// What to do with a group id shared by more than two rows
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum OversizedGroupPolicy {
    /// Build the group from the first debit/credit pair found; extra legs are
    /// left out of the member list
    #[default]
    TakeFirstPair,
    /// Treat the whole bucket as invalid and show every row standalone
    Reject,
}

/// Settings for the movements ledger
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MovementsConfig {
    /// Substring identifying outgoing legs in the type name
    pub debit_keyword: String,
    /// Substring identifying incoming legs in the type name
    pub credit_keyword: String,
    pub oversized_group_policy: OversizedGroupPolicy,
    /// Rows per page in list views
    pub page_size: usize,
    /// Page counts above this are compressed with ellipses
    pub page_window_threshold: usize,
}

impl Default for MovementsConfig {
    fn default() -> Self {
        Self {
            debit_keyword: "egreso".into(),
            credit_keyword: "ingreso".into(),
            oversized_group_policy: OversizedGroupPolicy::TakeFirstPair,
            page_size: 10,
            page_window_threshold: 7,
        }
    }
}

impl MovementsConfig {
    /// Parse a JSON document; missing fields take their defaults
    pub fn from_json_str(data: &str) -> MovementResult<Self> {
        let config: Self =
            serde_json::from_str(data).map_err(|e| MovementError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Load from a JSON file, falling back to defaults when it does not exist
    pub fn from_path(path: impl AsRef<Path>) -> MovementResult<Self> {
        let path = path.as_ref();
        if !path.exists() {
            tracing::debug!(path = %path.display(), "config file missing, using defaults");
            return Ok(Self::default());
        }
        let data = fs::read_to_string(path)
            .map_err(|e| MovementError::Config(format!("{}: {}", path.display(), e)))?;
        Self::from_json_str(&data)
    }

    pub fn validate(&self) -> MovementResult<()> {
        if self.debit_keyword.trim().is_empty() || self.credit_keyword.trim().is_empty() {
            return Err(MovementError::Config(
                "Leg keywords cannot be empty".to_string(),
            ));
        }

        if self.debit_keyword.eq_ignore_ascii_case(&self.credit_keyword) {
            return Err(MovementError::Config(
                "Debit and credit keywords must differ".to_string(),
            ));
        }

        if self.page_size == 0 {
            return Err(MovementError::Config(
                "Page size must be greater than zero".to_string(),
            ));
        }

        Ok(())
    }
}
