//! Registry of fingerprints currently being processed by a worker pool.
//!
//! Every worker claims a request's fingerprint before looking at the caches
//! and keeps the claim until its cache writes are done. A second worker that
//! pulls a request with the same fingerprint finds the claim and drops the
//! request, so no fingerprint is ever rendered twice at the same time.
//!
//! Uses `DashMap`'s entry API so check-and-insert is a single atomic step.

use crate::tile::{Fingerprint, RenderRequest, TileCoord};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};
use tracing::trace;

/// Who holds a claim, and since when.
#[derive(Debug, Clone)]
pub struct InFlightEntry {
    /// Id of the claiming worker
    pub worker: usize,
    /// Tile being processed
    pub tile: TileCoord,
    /// When the claim was taken
    pub claimed_at: Instant,
}

impl InFlightEntry {
    pub fn elapsed(&self) -> Duration {
        self.claimed_at.elapsed()
    }
}

/// Statistics for monitoring duplicate suppression.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct InFlightStats {
    /// Claims granted
    pub claims: u64,
    /// Claims refused because another worker held the fingerprint
    pub conflicts: u64,
    /// Claims currently held
    pub in_flight: usize,
}

/// Fingerprint to in-progress marker, shared by all workers of a pool.
#[derive(Debug, Default)]
pub struct InFlightRegistry {
    in_flight: DashMap<Fingerprint, InFlightEntry>,
    claims: AtomicU64,
    conflicts: AtomicU64,
}

impl InFlightRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Claims `request` for `worker`.
    ///
    /// Returns `None` if another claim on the same fingerprint is held. The
    /// returned guard releases the claim when dropped.
    pub fn try_claim(&self, request: &RenderRequest, worker: usize) -> Option<InFlightClaim<'_>> {
        let fingerprint = request.fingerprint();
        match self.in_flight.entry(fingerprint) {
            Entry::Occupied(entry) => {
                self.conflicts.fetch_add(1, Ordering::Relaxed);
                trace!(
                    fingerprint = %fingerprint,
                    holder = entry.get().worker,
                    worker,
                    "Fingerprint already in flight"
                );
                None
            }
            Entry::Vacant(entry) => {
                entry.insert(InFlightEntry {
                    worker,
                    tile: *request.tile(),
                    claimed_at: Instant::now(),
                });
                self.claims.fetch_add(1, Ordering::Relaxed);
                Some(InFlightClaim {
                    registry: self,
                    fingerprint,
                })
            }
        }
    }

    pub fn contains(&self, fingerprint: &Fingerprint) -> bool {
        self.in_flight.contains_key(fingerprint)
    }

    /// Current holder of a claim, if any.
    pub fn holder(&self, fingerprint: &Fingerprint) -> Option<InFlightEntry> {
        self.in_flight.get(fingerprint).map(|entry| entry.clone())
    }

    pub fn len(&self) -> usize {
        self.in_flight.len()
    }

    pub fn is_empty(&self) -> bool {
        self.in_flight.is_empty()
    }

    pub fn stats(&self) -> InFlightStats {
        InFlightStats {
            claims: self.claims.load(Ordering::Relaxed),
            conflicts: self.conflicts.load(Ordering::Relaxed),
            in_flight: self.in_flight.len(),
        }
    }
}

/// A held claim on a fingerprint. Released on drop.
#[derive(Debug)]
pub struct InFlightClaim<'a> {
    registry: &'a InFlightRegistry,
    fingerprint: Fingerprint,
}

impl InFlightClaim<'_> {
    pub fn fingerprint(&self) -> Fingerprint {
        self.fingerprint
    }
}

impl Drop for InFlightClaim<'_> {
    fn drop(&mut self) {
        self.registry.in_flight.remove(&self.fingerprint);
    }
}
