// Copyright (C) 2025 Jeremy J. Carroll. See LICENSE for details.

//! Immutable input data for one anonymization run.
//!
//! The [`DataManager`] bundles everything the transformer reads but never
//! writes:
//! - Encoded quasi-identifier columns (row-major [`DataMatrix`])
//! - One [`GeneralizationHierarchy`] per quasi-identifier
//! - Optional sensitive columns, feeding per-class distributions
//! - Optional research subset, feeding the secondary counter
//! - The [`Requirements`] bitmask that fixes snapshot record width
//!
//! All consistency checks run in the constructor and builder methods, so a
//! `DataManager` that exists is valid for the whole run. It is typically shared
//! behind an `Arc` by several search contexts.

pub mod hierarchy;
pub mod matrix;
pub mod requirements;
pub mod row_set;

pub use hierarchy::GeneralizationHierarchy;
pub use matrix::DataMatrix;
pub use requirements::Requirements;
pub use row_set::RowSet;

use crate::error::{Result, SearchError};
use tracing::debug;

/// Provider of encoded rows, hierarchies and bookkeeping requirements.
#[derive(Debug, Clone)]
pub struct DataManager {
    generalized: DataMatrix,
    hierarchies: Vec<GeneralizationHierarchy>,
    sensitive: Option<DataMatrix>,
    subset: Option<RowSet>,
    requirements: Requirements,
}

impl DataManager {
    /// Create a data manager from quasi-identifier columns and their hierarchies.
    ///
    /// Fails if the column and hierarchy counts differ, if any column contains a
    /// code its hierarchy does not cover, if the requirement combination is
    /// unsupported, or if the row count does not fit in `u32`.
    ///
    /// Sensitive columns and the research subset are attached with
    /// [`with_sensitive`](Self::with_sensitive) and [`with_subset`](Self::with_subset);
    /// call [`validate`](Self::validate) (done by the transformer) once everything is attached.
    pub fn new(
        qi_columns: &[Vec<u32>],
        hierarchies: Vec<GeneralizationHierarchy>,
        requirements: Requirements,
    ) -> Result<Self> {
        requirements.validate()?;
        if qi_columns.len() != hierarchies.len() {
            return Err(SearchError::DimensionMismatch {
                expected: qi_columns.len(),
                actual: hierarchies.len(),
            });
        }
        if qi_columns.is_empty() {
            return Err(SearchError::EmptyLattice);
        }

        let generalized = DataMatrix::from_columns(qi_columns)?;
        if generalized.rows() > u32::MAX as usize {
            return Err(SearchError::TooManyRows {
                rows: generalized.rows(),
                max: u32::MAX as usize,
            });
        }

        for (attribute, hierarchy) in hierarchies.iter().enumerate() {
            for (row, code) in generalized.column(attribute).enumerate() {
                if code as usize >= hierarchy.codes() {
                    return Err(SearchError::CodeOutOfHierarchy {
                        attribute,
                        row,
                        code,
                        codes: hierarchy.codes(),
                    });
                }
            }
        }

        debug!(
            rows = generalized.rows(),
            dimensions = generalized.columns(),
            %requirements,
            "data manager created"
        );

        Ok(Self {
            generalized,
            hierarchies,
            sensitive: None,
            subset: None,
            requirements,
        })
    }

    /// Attach sensitive attribute columns (one per attribute, one value per row).
    pub fn with_sensitive(mut self, columns: &[Vec<u32>]) -> Result<Self> {
        let sensitive = DataMatrix::from_columns(columns)?;
        if !columns.is_empty() && sensitive.rows() != self.rows() {
            return Err(SearchError::RowCountMismatch {
                expected: self.rows(),
                actual: sensitive.rows(),
            });
        }
        self.sensitive = Some(sensitive);
        Ok(self)
    }

    /// Attach the research subset used for secondary counts.
    pub fn with_subset(mut self, subset: RowSet) -> Result<Self> {
        if subset.rows() != self.rows() {
            return Err(SearchError::RowCountMismatch {
                expected: self.rows(),
                actual: subset.rows(),
            });
        }
        self.subset = Some(subset);
        Ok(self)
    }

    /// Check that the inputs required by the requirement bitmask are present.
    pub fn validate(&self) -> Result<()> {
        if self.requirements.has_distribution() && self.sensitive_attributes() == 0 {
            return Err(SearchError::MissingSensitiveAttributes);
        }
        if self.requirements.has_secondary() && self.subset.is_none() {
            return Err(SearchError::MissingSubset);
        }
        Ok(())
    }

    pub fn rows(&self) -> usize {
        self.generalized.rows()
    }

    /// Number of quasi-identifiers.
    pub fn dimensions(&self) -> usize {
        self.generalized.columns()
    }

    /// Number of sensitive attributes tracked in distributions.
    ///
    /// Zero unless distributions are required.
    pub fn sensitive_attributes(&self) -> usize {
        if self.requirements.has_distribution() {
            self.sensitive.as_ref().map_or(0, DataMatrix::columns)
        } else {
            0
        }
    }

    pub fn generalized(&self) -> &DataMatrix {
        &self.generalized
    }

    pub fn sensitive(&self) -> Option<&DataMatrix> {
        self.sensitive.as_ref()
    }

    pub fn subset(&self) -> Option<&RowSet> {
        self.subset.as_ref()
    }

    pub fn hierarchies(&self) -> &[GeneralizationHierarchy] {
        &self.hierarchies
    }

    pub fn requirements(&self) -> Requirements {
        self.requirements
    }

    /// Highest valid generalization level per quasi-identifier.
    pub fn max_levels(&self) -> Vec<u32> {
        self.hierarchies
            .iter()
            .map(|h| (h.levels() - 1) as u32)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn identity_hierarchy(attribute: usize, codes: u32) -> GeneralizationHierarchy {
        let table: Vec<Vec<u32>> = (0..codes).map(|c| vec![c, codes]).collect();
        GeneralizationHierarchy::new(attribute, &table).unwrap()
    }

    #[test]
    fn test_new_and_accessors() {
        let data = DataManager::new(
            &[vec![0, 1, 2], vec![1, 1, 0]],
            vec![identity_hierarchy(0, 3), identity_hierarchy(1, 2)],
            Requirements::COUNTER,
        )
        .unwrap();

        assert_eq!(data.rows(), 3);
        assert_eq!(data.dimensions(), 2);
        assert_eq!(data.max_levels(), vec![1, 1]);
        assert_eq!(data.sensitive_attributes(), 0);
        assert!(data.validate().is_ok());
    }

    #[test]
    fn test_hierarchy_count_mismatch() {
        let err = DataManager::new(
            &[vec![0], vec![0]],
            vec![identity_hierarchy(0, 1)],
            Requirements::COUNTER,
        )
        .unwrap_err();
        assert!(matches!(err, SearchError::DimensionMismatch { .. }));
    }

    #[test]
    fn test_uncovered_code() {
        let err = DataManager::new(
            &[vec![0, 5]],
            vec![identity_hierarchy(0, 3)],
            Requirements::COUNTER,
        )
        .unwrap_err();
        assert!(matches!(
            err,
            SearchError::CodeOutOfHierarchy { row: 1, code: 5, .. }
        ));
    }

    #[test]
    fn test_missing_inputs_detected() {
        let data = DataManager::new(
            &[vec![0, 1]],
            vec![identity_hierarchy(0, 2)],
            Requirements::COUNTER | Requirements::DISTRIBUTION,
        )
        .unwrap();
        assert!(matches!(
            data.validate(),
            Err(SearchError::MissingSensitiveAttributes)
        ));

        assert!(matches!(
            data.clone().with_sensitive(&[vec![7, 8, 9]]),
            Err(SearchError::RowCountMismatch {
                expected: 2,
                actual: 3
            })
        ));
        let data = data.with_sensitive(&[vec![7, 8]]).unwrap();
        assert_eq!(data.sensitive_attributes(), 1);
        assert!(data.validate().is_ok());

        let data = DataManager::new(
            &[vec![0, 1]],
            vec![identity_hierarchy(0, 2)],
            Requirements::COUNTER | Requirements::SECONDARY_COUNTER,
        )
        .unwrap();
        assert!(matches!(data.validate(), Err(SearchError::MissingSubset)));
        assert!(matches!(
            data.clone().with_subset(RowSet::empty(3)),
            Err(SearchError::RowCountMismatch { .. })
        ));
        assert!(data.with_subset(RowSet::full(2)).unwrap().validate().is_ok());
    }
}
