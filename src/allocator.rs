//! Non-blocking allocation used while the registry lock is held.
//!
//! Registry memory is admitted through an [`Allocator`] before it is reserved
//! with `try_reserve`. Neither step may block, and a refusal is reported to the
//! caller as [`RegistryError::OutOfMemory`](crate::RegistryError::OutOfMemory).

use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering};

use thiserror::Error;
use tracing::debug;

/// A non-blocking allocation was refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("non-blocking allocation of {bytes} bytes refused")]
pub struct AllocError {
    pub bytes: usize,
}

/// Admission control for registry memory.
///
/// Implementations must not block or suspend: they are called with the
/// registry lock held.
pub trait Allocator: Send + Sync + fmt::Debug {
    /// Admits `bytes` more bytes, or refuses.
    fn try_alloc(&self, bytes: usize) -> Result<(), AllocError>;

    /// Returns `bytes` previously admitted by [`Allocator::try_alloc`].
    fn free(&self, bytes: usize);
}

/// Admits every request; exhaustion surfaces through `try_reserve` alone.
#[derive(Debug, Default, Clone, Copy)]
pub struct Heap;

impl Allocator for Heap {
    fn try_alloc(&self, _bytes: usize) -> Result<(), AllocError> {
        Ok(())
    }

    fn free(&self, _bytes: usize) {}
}

/// Admits requests while the outstanding byte count stays within a limit.
#[derive(Debug)]
pub struct Quota {
    limit: usize,
    in_use: AtomicUsize,
}

impl Quota {
    pub fn new(limit: usize) -> Self {
        Self {
            limit,
            in_use: AtomicUsize::new(0),
        }
    }

    pub fn limit(&self) -> usize {
        self.limit
    }

    /// Bytes admitted and not yet freed.
    pub fn in_use(&self) -> usize {
        self.in_use.load(Ordering::Acquire)
    }
}

impl Allocator for Quota {
    fn try_alloc(&self, bytes: usize) -> Result<(), AllocError> {
        self.in_use
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |used| {
                used.checked_add(bytes).filter(|&total| total <= self.limit)
            })
            .map(|_| ())
            .map_err(|used| {
                debug!(bytes, used, limit = self.limit, "allocation over quota");
                AllocError { bytes }
            })
    }

    fn free(&self, bytes: usize) {
        // fetch_update only fails when the closure returns None
        let _ = self
            .in_use
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |used| {
                Some(used.saturating_sub(bytes))
            });
    }
}
