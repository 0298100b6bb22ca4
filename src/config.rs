// Copyright (C) 2025 Jeremy J. Carroll. See LICENSE for details.

//! Tuning knobs for the snapshot cache and the transformer.
//!
//! Values are supplied programmatically; nothing here reads files or the
//! environment.

use crate::error::{Result, SearchError};

/// Which evaluated nodes the snapshot cache is willing to admit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StorageStrategy {
    /// Every node passing the size checks.
    #[default]
    All,
    /// Only nodes tagged `not-anonymous`.
    NonAnonymous,
}

/// Snapshot cache settings.
#[derive(Debug, Clone, PartialEq)]
pub struct HistoryConfig {
    /// Maximum number of cached snapshots. Zero disables caching.
    pub size: usize,
    /// A groupify with more classes than `rows * snapshot_size_dataset` is not cached.
    pub snapshot_size_dataset: f64,
    /// A groupify is not cached if `classes / previous_classes` exceeds this.
    pub snapshot_size_snapshot: f64,
    /// Admission trigger.
    pub storage_strategy: StorageStrategy,
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            size: 200,
            snapshot_size_dataset: 0.2,
            snapshot_size_snapshot: 0.8,
            storage_strategy: StorageStrategy::All,
        }
    }
}

impl HistoryConfig {
    /// Check that both fractions lie in `[0, 1]`.
    pub fn validate(&self) -> Result<()> {
        check_fraction("snapshot_size_dataset", self.snapshot_size_dataset)?;
        check_fraction("snapshot_size_snapshot", self.snapshot_size_snapshot)
    }
}

/// Full-scan parallelism settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransformerConfig {
    /// Worker threads for full scans. `1` scans on the calling thread.
    pub threads: usize,
    /// Slices smaller than this are not worth a worker.
    pub min_rows_per_slice: usize,
}

impl Default for TransformerConfig {
    fn default() -> Self {
        Self {
            threads: 1,
            min_rows_per_slice: 10_000,
        }
    }
}

impl TransformerConfig {
    pub fn validate(&self) -> Result<()> {
        if self.threads == 0 {
            return Err(SearchError::InvalidConfig {
                field: "threads",
                reason: "must be at least 1".to_string(),
            });
        }
        if self.min_rows_per_slice == 0 {
            return Err(SearchError::InvalidConfig {
                field: "min_rows_per_slice",
                reason: "must be at least 1".to_string(),
            });
        }
        Ok(())
    }
}

/// Everything a [`SearchContext`](crate::context::SearchContext) needs besides the data.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchConfig {
    pub history: HistoryConfig,
    pub transformer: TransformerConfig,
    /// Whether the active privacy model is monotonic, making the
    /// `anonymous`/`not-anonymous` pair predictive.
    pub property_predictable: bool,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            history: HistoryConfig::default(),
            transformer: TransformerConfig::default(),
            property_predictable: true,
        }
    }
}

impl SearchConfig {
    pub fn validate(&self) -> Result<()> {
        self.history.validate()?;
        self.transformer.validate()
    }
}

fn check_fraction(field: &'static str, value: f64) -> Result<()> {
    if !(0.0..=1.0).contains(&value) {
        return Err(SearchError::InvalidConfig {
            field,
            reason: format!("{} is not within [0, 1]", value),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        assert!(SearchConfig::default().validate().is_ok());
        assert!(SearchConfig::default().property_predictable);
        let history = HistoryConfig::default();
        assert_eq!(history.size, 200);
        assert_eq!(history.storage_strategy, StorageStrategy::All);
    }

    #[test]
    fn test_rejects_bad_fraction() {
        let config = HistoryConfig {
            snapshot_size_dataset: 1.5,
            ..HistoryConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(SearchError::InvalidConfig {
                field: "snapshot_size_dataset",
                ..
            })
        ));

        let config = HistoryConfig {
            snapshot_size_snapshot: f64::NAN,
            ..HistoryConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_rejects_zero_threads() {
        let config = TransformerConfig {
            threads: 0,
            ..TransformerConfig::default()
        };
        assert!(config.validate().is_err());
    }
}
