// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Host port allocation for serverside projects.
//!
//! Ports are picked by random probing inside the configured range, bounded
//! to a fixed number of attempts. The allocator holds no reservations; the
//! caller persists the chosen port and relies on the store's unique `port`
//! column to catch a collision.

use std::collections::HashSet;
use std::ops::Range;

use rand::Rng;
use thiserror::Error;

/// Probes made before giving up.
pub const DEFAULT_MAX_ATTEMPTS: usize = 100;

/// Port allocation errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AllocationError {
    /// Every probe hit a used port.
    #[error("no free port in {start}..{end} after {attempts} attempts")]
    Exhausted {
        /// Range start (inclusive).
        start: u16,
        /// Range end (exclusive).
        end: u16,
        /// Probes made.
        attempts: usize,
    },
}

/// Random-probe port allocator over `[start, end)`.
#[derive(Debug, Clone)]
pub struct PortAllocator {
    range: Range<u16>,
    max_attempts: usize,
}

impl PortAllocator {
    /// Allocator over `range` with the default attempt bound.
    pub fn new(range: Range<u16>) -> Self {
        Self {
            range,
            max_attempts: DEFAULT_MAX_ATTEMPTS,
        }
    }

    /// Override the attempt bound.
    pub fn with_max_attempts(mut self, max_attempts: usize) -> Self {
        self.max_attempts = max_attempts;
        self
    }

    /// The configured range.
    pub fn range(&self) -> Range<u16> {
        self.range.clone()
    }

    /// Pick a port not in `used`.
    pub fn allocate(&self, used: &HashSet<u16>) -> Result<u16, AllocationError> {
        self.allocate_with(used, &mut rand::thread_rng())
    }

    /// Pick a port not in `used`, drawing from `rng`.
    pub fn allocate_with<R: Rng>(
        &self,
        used: &HashSet<u16>,
        rng: &mut R,
    ) -> Result<u16, AllocationError> {
        let exhausted = AllocationError::Exhausted {
            start: self.range.start,
            end: self.range.end,
            attempts: self.max_attempts,
        };
        if self.range.is_empty() {
            return Err(exhausted);
        }

        for _ in 0..self.max_attempts {
            let port = rng.gen_range(self.range.clone());
            if !used.contains(&port) {
                return Ok(port);
            }
        }

        tracing::warn!(
            start = self.range.start,
            end = self.range.end,
            used = used.len(),
            attempts = self.max_attempts,
            "Port allocation exhausted"
        );
        Err(exhausted)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    #[test]
    fn test_allocates_inside_range() {
        let allocator = PortAllocator::new(10000..10010);
        let used = HashSet::new();
        for _ in 0..50 {
            let port = allocator.allocate(&used).unwrap();
            assert!((10000..10010).contains(&port));
        }
    }

    #[test]
    fn test_skips_used_ports() {
        let allocator = PortAllocator::new(10000..10003);
        let used: HashSet<u16> = [10000, 10002].into_iter().collect();
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..20 {
            assert_eq!(allocator.allocate_with(&used, &mut rng).unwrap(), 10001);
        }
    }

    #[test]
    fn test_single_port_range_already_used_is_exhausted() {
        let allocator = PortAllocator::new(15000..15001);
        let used: HashSet<u16> = [15000].into_iter().collect();

        let err = allocator.allocate(&used).unwrap_err();

        assert_eq!(
            err,
            AllocationError::Exhausted {
                start: 15000,
                end: 15001,
                attempts: DEFAULT_MAX_ATTEMPTS,
            }
        );
    }

    #[test]
    fn test_empty_range_is_exhausted() {
        let allocator = PortAllocator::new(12000..12000);
        assert!(allocator.allocate(&HashSet::new()).is_err());
    }

    #[test]
    fn test_zero_attempts_never_succeeds() {
        let allocator = PortAllocator::new(10000..20000).with_max_attempts(0);
        assert!(allocator.allocate(&HashSet::new()).is_err());
    }
}
