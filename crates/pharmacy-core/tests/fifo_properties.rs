//! Property tests for FIFO consumption.

use chrono::NaiveDate;
use proptest::prelude::*;

use pharmacy_core::ledger::fifo;
use pharmacy_core::models::{Batch, NewBatch};

fn batches_from(stock: &[(u32, u32)]) -> Vec<Batch> {
    let base = NaiveDate::from_ymd_opt(2025, 1, 1).unwrap();
    let mut batches = Vec::new();
    for (i, (days, quantity)) in stock.iter().enumerate() {
        let batch = Batch::new(NewBatch {
            lot: format!("L{}", i),
            expires_on: base + chrono::Days::new(u64::from(*days)),
            quantity: *quantity,
        });
        fifo::insert_batch(&mut batches, batch);
    }
    batches
}

proptest! {
    #![proptest_config(ProptestConfig {
        cases: 256,
        ..ProptestConfig::default()
    })]

    /// Units drawn plus units left always equal the units before.
    #[test]
    fn consumption_conserves_units(
        stock in prop::collection::vec((0u32..60, 1u32..50), 1..8),
        requested in 1u32..400,
    ) {
        let mut batches = batches_from(&stock);
        let before = fifo::total_available(&batches);

        match fifo::consume(&mut batches, requested) {
            Ok(trace) => {
                let used: u64 = trace.iter().map(|u| u64::from(u.quantity_used)).sum();
                prop_assert_eq!(used, u64::from(requested));
                prop_assert_eq!(fifo::total_available(&batches), before - used);
                prop_assert!(batches.iter().all(|b| b.quantity > 0));
            }
            Err(shortage) => {
                prop_assert_eq!(shortage.available, before);
                prop_assert_eq!(shortage.shortfall(), u64::from(requested) - before);
                prop_assert_eq!(fifo::total_available(&batches), before);
            }
        }
    }

    /// Batches stay sorted by expiration, and only the last batch drawn
    /// may be left partially used.
    #[test]
    fn consumption_drains_earliest_first(
        stock in prop::collection::vec((0u32..60, 1u32..50), 1..8),
        requested in 1u32..400,
    ) {
        let mut batches = batches_from(&stock);
        prop_assert!(batches.windows(2).all(|w| w[0].expires_on <= w[1].expires_on));

        let original = batches.clone();
        if let Ok(trace) = fifo::consume(&mut batches, requested) {
            prop_assert!(batches.windows(2).all(|w| w[0].expires_on <= w[1].expires_on));

            // The trace walks a prefix of the original list in order.
            for (usage, batch) in trace.iter().zip(&original) {
                prop_assert_eq!(&usage.batch_id, &batch.id);
            }
            for usage in trace.iter().take(trace.len().saturating_sub(1)) {
                let batch = original.iter().find(|b| b.id == usage.batch_id).unwrap();
                prop_assert_eq!(usage.quantity_used, batch.quantity);
            }
        }
    }
}
