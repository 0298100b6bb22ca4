// Copyright (C) 2025 Jeremy J. Carroll. See LICENSE for details.

//! Row-major matrix of encoded values.

use crate::error::{Result, SearchError};

/// Dense `rows × columns` matrix of `u32` codes, stored row by row.
///
/// Scans read whole rows, so keeping a row contiguous matters more than
/// column access.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataMatrix {
    data: Vec<u32>,
    rows: usize,
    columns: usize,
}

impl DataMatrix {
    /// Transpose a set of equally long columns into a row-major matrix.
    pub fn from_columns(columns: &[Vec<u32>]) -> Result<Self> {
        let rows = columns.first().map_or(0, Vec::len);
        for (column, values) in columns.iter().enumerate() {
            if values.len() != rows {
                return Err(SearchError::RaggedColumns {
                    column,
                    expected: rows,
                    actual: values.len(),
                });
            }
        }

        let width = columns.len();
        let mut data = vec![0; rows * width];
        for (column, values) in columns.iter().enumerate() {
            for (row, &value) in values.iter().enumerate() {
                data[row * width + column] = value;
            }
        }

        Ok(Self {
            data,
            rows,
            columns: width,
        })
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn columns(&self) -> usize {
        self.columns
    }

    #[inline]
    pub fn row(&self, row: usize) -> &[u32] {
        &self.data[row * self.columns..(row + 1) * self.columns]
    }

    #[inline]
    pub fn get(&self, row: usize, column: usize) -> u32 {
        self.data[row * self.columns + column]
    }

    /// Iterate over the values of one column, top to bottom.
    pub fn column(&self, column: usize) -> impl Iterator<Item = u32> + '_ {
        self.data
            .iter()
            .skip(column)
            .step_by(self.columns.max(1))
            .copied()
    }
}
