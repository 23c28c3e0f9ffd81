//! Growable buffer backing one writer session.

use tracing::trace;

use crate::error::{Error, Result};

/// A single contiguous, resizable byte region.
///
/// Growth doubles the capacity (or jumps straight to the requested size when
/// that is larger) and keeps every byte already written. A writer borrows the
/// allocator mutably for its whole session, so growth and [`free`](Self::free)
/// can never race with an in-progress session.
#[derive(Debug, Default)]
pub struct Allocator {
    buf: Vec<u8>,
}

impl Allocator {
    /// Creates an empty allocator. Nothing is reserved until first use.
    pub fn new() -> Self {
        Self { buf: Vec::new() }
    }

    /// Creates an allocator presized to `capacity` bytes.
    pub fn with_capacity(capacity: usize) -> Result<Self> {
        let mut allocator = Self::new();
        allocator.grow(capacity)?;
        Ok(allocator)
    }

    /// Returns the number of bytes currently backed by the region.
    pub fn capacity(&self) -> usize {
        self.buf.len()
    }

    /// Returns the whole backing region.
    pub fn as_slice(&self) -> &[u8] {
        &self.buf
    }

    /// Ensures at least `min_size` bytes exist and returns the view
    /// `[offset, min_size)`.
    pub fn acquire(&mut self, min_size: usize, offset: usize) -> Result<&mut [u8]> {
        if offset > min_size {
            return Err(Error::buffer_overflow(offset, min_size));
        }
        self.grow(min_size)?;
        Ok(&mut self.buf[offset..min_size])
    }

    /// Releases the backing region.
    pub fn free(&mut self) {
        self.buf = Vec::new();
    }

    fn grow(&mut self, min_size: usize) -> Result<()> {
        let capacity = self.buf.len();
        if capacity >= min_size {
            return Ok(());
        }

        let new_size = capacity.saturating_mul(2).max(min_size);
        self.buf.try_reserve_exact(new_size - capacity)?;
        self.buf.resize(new_size, 0);
        trace!(from = capacity, to = new_size, "grew allocator");
        Ok(())
    }
}
