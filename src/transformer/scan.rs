// Copyright (C) 2025 Jeremy J. Carroll. See LICENSE for details.

//! Full scans over the dataset.
//!
//! The parallel scan splits the rows into contiguous slices. Each worker
//! writes the generalized keys of its slice into its own region of one shared
//! buffer; the groupify is then filled from that buffer in row order on the
//! calling thread. Class order, representatives and distributions are therefore
//! identical to the sequential scan.

use super::{generalize_row, Transformer, INITIAL_CLASSES};
use crate::error::Result;
use crate::groupify::{DistributionSource, HashGroupify};
use crate::interrupt::Interrupt;
use rayon::prelude::*;
use tracing::trace;

/// Rows handled between two interrupt polls.
const ROW_STRIDE: usize = 8192;

pub(super) fn sequential(
    transformer: &Transformer,
    levels: &[u32],
    interrupt: &Interrupt,
) -> Result<HashGroupify> {
    let data = &transformer.data;
    let hierarchies = data.hierarchies();
    let mut groupify = transformer.new_groupify(data.rows().min(INITIAL_CLASSES));
    let mut key = vec![0u32; levels.len()];

    for row in 0..data.rows() {
        if row % ROW_STRIDE == 0 {
            interrupt.check()?;
        }
        generalize_row(hierarchies, levels, data.generalized().row(row), &mut key);
        add_row(transformer, &mut groupify, &key, row);
    }
    Ok(groupify)
}

pub(super) fn parallel(
    transformer: &Transformer,
    pool: &rayon::ThreadPool,
    levels: &[u32],
    interrupt: &Interrupt,
) -> Result<HashGroupify> {
    let data = &transformer.data;
    let hierarchies = data.hierarchies();
    let rows = data.rows();
    let dimensions = levels.len();
    let threads = pool.current_num_threads().max(1);
    let slice_rows = rows
        .div_ceil(threads)
        .max(transformer.config.min_rows_per_slice);

    trace!(rows, threads, slice_rows, "parallel scan");

    let mut keys = vec![0u32; rows * dimensions];
    pool.install(|| {
        keys.par_chunks_mut(slice_rows * dimensions)
            .enumerate()
            .try_for_each(|(slice, chunk)| -> Result<()> {
                interrupt.check()?;
                let first = slice * slice_rows;
                for (offset, key) in chunk.chunks_exact_mut(dimensions).enumerate() {
                    generalize_row(hierarchies, levels, data.generalized().row(first + offset), key);
                }
                Ok(())
            })
    })?;

    interrupt.check()?;
    let mut groupify = transformer.new_groupify(rows.min(INITIAL_CLASSES));
    for (row, key) in keys.chunks_exact(dimensions).enumerate() {
        if row % ROW_STRIDE == 0 {
            interrupt.check()?;
        }
        add_row(transformer, &mut groupify, key, row);
    }
    Ok(groupify)
}

#[inline]
fn add_row(transformer: &Transformer, groupify: &mut HashGroupify, key: &[u32], row: usize) {
    let data = &transformer.data;
    let secondary = transformer
        .subset()
        .map_or(0, |subset| subset.contains(row) as u32);
    let distributions = match data.sensitive() {
        Some(sensitive) if groupify.sensitive_attributes() > 0 => {
            DistributionSource::Values(sensitive.row(row))
        }
        _ => DistributionSource::None,
    };
    groupify.add(key, row as u32, 1, secondary, distributions);
}
