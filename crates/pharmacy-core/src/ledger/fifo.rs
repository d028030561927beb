//! FIFO batch algorithms over a single medication's batch list.
//!
//! Batches are kept ascending by expiration date; consumption always draws
//! from the earliest-expiring batch with stock left.

use crate::models::{Batch, BatchUsage};

/// Stock missing to satisfy a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Shortage {
    pub requested: u64,
    pub available: u64,
}

impl Shortage {
    pub fn shortfall(&self) -> u64 {
        self.requested - self.available
    }
}

/// Append a batch and restore expiration order. Equal dates keep insertion order.
pub fn insert_batch(batches: &mut Vec<Batch>, batch: Batch) {
    batches.push(batch);
    batches.sort_by_key(|b| b.expires_on);
}

/// Sum of remaining units.
pub fn total_available(batches: &[Batch]) -> u64 {
    batches.iter().map(|b| u64::from(b.quantity)).sum()
}

/// Draw `requested` units, earliest expiration first.
///
/// On shortage nothing is modified. On success exhausted batches are removed
/// and the per-batch usage trace is returned in draw order.
pub fn consume(batches: &mut Vec<Batch>, requested: u32) -> Result<Vec<BatchUsage>, Shortage> {
    let available = total_available(batches);
    if u64::from(requested) > available {
        return Err(Shortage {
            requested: u64::from(requested),
            available,
        });
    }

    let mut remaining = requested;
    let mut trace = Vec::new();

    for batch in batches.iter_mut() {
        if remaining == 0 {
            break;
        }
        if batch.is_exhausted() {
            continue;
        }

        let used = batch.quantity.min(remaining);
        batch.quantity -= used;
        remaining -= used;

        trace.push(BatchUsage {
            batch_id: batch.id.clone(),
            lot: batch.lot.clone(),
            quantity_used: used,
        });
    }

    batches.retain(|b| !b.is_exhausted());
    Ok(trace)
}
