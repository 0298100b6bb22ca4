// Copyright (C) 2025 Jeremy J. Carroll. See LICENSE for details.

//! Cooperative cancellation flag.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::error::{Result, SearchError};

/// A cloneable handle to a shared interrupt flag.
///
/// The caller raises it from any thread; long-running work polls it between
/// units of work and unwinds with [`SearchError::Interrupted`].
#[derive(Debug, Clone, Default)]
pub struct Interrupt(Arc<AtomicBool>);

impl Interrupt {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation.
    pub fn raise(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    /// Clear a previous request so the next evaluation can run.
    pub fn clear(&self) {
        self.0.store(false, Ordering::Relaxed);
    }

    pub fn is_raised(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }

    /// `Err(Interrupted)` if the flag is raised.
    #[inline]
    pub fn check(&self) -> Result<()> {
        if self.is_raised() {
            Err(SearchError::Interrupted)
        } else {
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_raise_is_shared_between_clones() {
        let interrupt = Interrupt::new();
        let other = interrupt.clone();
        assert!(interrupt.check().is_ok());

        other.raise();
        assert!(interrupt.is_raised());
        assert!(matches!(interrupt.check(), Err(SearchError::Interrupted)));

        interrupt.clear();
        assert!(!other.is_raised());
    }
}
