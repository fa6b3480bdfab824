//! FIFO allocation engine.
//!
//! Given one product's incoming lots and outgoing transactions, allocates each
//! transaction against the oldest lots still holding stock and reports the
//! resulting per-slice trace, shortfalls, and remaining stock.
//!
//! The engine is a pure function over borrowed input: it never mutates caller
//! data, performs no IO and does not log. Lot quantities are decremented on an
//! internal working copy.

use std::collections::VecDeque;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use stockflow_core::{DomainError, DomainResult, Entity, duplicate_ids};

use crate::allocation::{AllocationRecord, FifoAllocation, LotBalance, Shortfall};
use crate::lot::{IncomingLot, OutgoingTransaction};

/// Order in which outgoing transactions are processed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutgoingOrder {
    /// Process transactions exactly in the order supplied by the caller.
    #[default]
    AsGiven,
    /// Stable-sort transactions by `(occurred_at, id)` before allocation.
    Chronological,
}

impl FromStr for OutgoingOrder {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "as_given" | "as-given" | "caller" => Ok(OutgoingOrder::AsGiven),
            "chronological" => Ok(OutgoingOrder::Chronological),
            other => Err(DomainError::invalid_input(format!(
                "unknown outgoing order '{other}' (expected 'as_given' or 'chronological')"
            ))),
        }
    }
}

/// FIFO allocation policy.
///
/// The default engine processes outgoing transactions in caller order; see
/// [`OutgoingOrder`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FifoEngine {
    outgoing_order: OutgoingOrder,
}

impl FifoEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_outgoing_order(mut self, outgoing_order: OutgoingOrder) -> Self {
        self.outgoing_order = outgoing_order;
        self
    }

    pub fn outgoing_order(&self) -> OutgoingOrder {
        self.outgoing_order
    }

    /// Allocate `outgoing` against `lots`, oldest lot first.
    ///
    /// Fails with [`DomainError::InvalidInput`] (and no partial output) on a
    /// negative quantity, a duplicate identifier, or totals that overflow.
    /// Running out of stock is not an error: it is reported through
    /// [`FifoAllocation::shortfalls`] and [`FifoAllocation::insufficient_stock`].
    pub fn allocate(
        &self,
        lots: &[IncomingLot],
        outgoing: &[OutgoingTransaction],
    ) -> DomainResult<FifoAllocation> {
        let supply = validate_lots(lots)?;
        let demand = validate_outgoing(outgoing)?;

        let mut sorted: Vec<&IncomingLot> = lots.iter().collect();
        sorted.sort_by_key(|lot| lot.fifo_key());

        let mut balances: Vec<LotBalance> = sorted
            .iter()
            .map(|lot| LotBalance {
                lot_id: lot.id,
                received_at: lot.received_at,
                expires_at: lot.expires_at,
                original: lot.quantity,
                consumed: 0,
                remaining: lot.quantity,
            })
            .collect();

        // Indices into `balances` of lots that still hold stock, oldest first.
        let mut queue: VecDeque<usize> = balances
            .iter()
            .enumerate()
            .filter(|(_, b)| b.remaining > 0)
            .map(|(i, _)| i)
            .collect();

        let mut ordered: Vec<&OutgoingTransaction> = outgoing.iter().collect();
        if self.outgoing_order == OutgoingOrder::Chronological {
            ordered.sort_by_key(|tx| (tx.occurred_at, tx.id));
        }

        let mut records = Vec::new();
        let mut shortfalls = Vec::new();

        for tx in ordered {
            let mut remaining = tx.quantity;

            while remaining > 0 {
                let Some(&front) = queue.front() else {
                    break;
                };
                let lot = &mut balances[front];
                let taken = remaining.min(lot.remaining);

                records.push(AllocationRecord {
                    outgoing_id: tx.id,
                    outgoing_date: tx.occurred_at,
                    quantity: taken,
                    source_lot_id: lot.lot_id,
                    source_lot_expiry: lot.expires_at,
                });

                lot.remaining -= taken;
                lot.consumed += taken;
                remaining -= taken;

                if lot.remaining == 0 {
                    queue.pop_front();
                }
            }

            if remaining > 0 {
                shortfalls.push(Shortfall {
                    outgoing_id: tx.id,
                    requested: tx.quantity,
                    allocated: tx.quantity - remaining,
                    missing: remaining,
                });
            }
        }

        let on_hand: i64 = balances.iter().map(|b| b.remaining).sum();
        let missing: i64 = shortfalls.iter().map(|s| s.missing).sum();
        let remaining_stock = reconcile(supply, demand, on_hand, missing)?;

        Ok(FifoAllocation {
            insufficient_stock: !shortfalls.is_empty(),
            records,
            shortfalls,
            lot_balances: balances,
            on_hand,
            remaining_stock,
        })
    }
}

/// Allocate with the default policy (caller-supplied outgoing order).
pub fn allocate(
    lots: &[IncomingLot],
    outgoing: &[OutgoingTransaction],
) -> DomainResult<FifoAllocation> {
    FifoEngine::default().allocate(lots, outgoing)
}

fn validate_lots(lots: &[IncomingLot]) -> DomainResult<i64> {
    ensure_unique_ids(lots, "incoming lot")?;
    let mut total: i64 = 0;
    for lot in lots {
        lot.validate()?;
        total = total
            .checked_add(lot.quantity)
            .ok_or_else(|| DomainError::invalid_input("incoming quantity total overflows"))?;
    }
    Ok(total)
}

fn validate_outgoing(outgoing: &[OutgoingTransaction]) -> DomainResult<i64> {
    ensure_unique_ids(outgoing, "outgoing transaction")?;
    let mut total: i64 = 0;
    for tx in outgoing {
        tx.validate()?;
        total = total
            .checked_add(tx.quantity)
            .ok_or_else(|| DomainError::invalid_input("outgoing quantity total overflows"))?;
    }
    Ok(total)
}

fn ensure_unique_ids<T: Entity>(items: &[T], kind: &str) -> DomainResult<()> {
    match duplicate_ids(items).first() {
        Some(id) => Err(DomainError::invalid_input(format!("duplicate {kind} id {id}"))),
        None => Ok(()),
    }
}

/// Supply minus demand must equal what is left on hand less unmet demand.
/// Both totals are non-negative, so the difference cannot overflow.
fn reconcile(supply: i64, demand: i64, on_hand: i64, missing: i64) -> DomainResult<i64> {
    let remaining_stock = supply - demand;
    if remaining_stock != on_hand - missing {
        return Err(DomainError::invariant(format!(
            "remaining stock {remaining_stock} does not match on-hand {on_hand} \
             less shortfall {missing}"
        )));
    }
    Ok(remaining_stock)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, Duration, TimeZone, Utc};
    use proptest::prelude::*;
    use stockflow_core::{LotId, TransactionId};

    fn day(d: i64) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 1, 8, 0, 0).unwrap() + Duration::days(d - 1)
    }

    fn lot(id: i64, quantity: i64, received: i64) -> IncomingLot {
        IncomingLot::new(LotId::new(id), quantity, day(received))
    }

    fn out(id: i64, quantity: i64) -> OutgoingTransaction {
        OutgoingTransaction::new(TransactionId::new(id), quantity, day(20))
    }

    fn out_at(id: i64, quantity: i64, occurred: i64) -> OutgoingTransaction {
        OutgoingTransaction::new(TransactionId::new(id), quantity, day(occurred))
    }

    fn slices(result: &FifoAllocation) -> Vec<(i64, i64, i64)> {
        result
            .records
            .iter()
            .map(|r| (r.outgoing_id.get(), r.source_lot_id.get(), r.quantity))
            .collect()
    }

    #[test]
    fn exact_match_consumes_the_single_lot() {
        let result = allocate(&[lot(1, 10, 1)], &[out(100, 10)]).unwrap();

        assert_eq!(slices(&result), vec![(100, 1, 10)]);
        assert_eq!(result.remaining_stock, 0);
        assert_eq!(result.on_hand, 0);
        assert!(!result.has_shortfall());
        assert!(result.lot_balances[0].is_exhausted());
    }

    #[test]
    fn split_across_two_lots_in_arrival_order() {
        let result = allocate(&[lot(1, 5, 1), lot(2, 5, 2)], &[out(100, 8)]).unwrap();

        assert_eq!(slices(&result), vec![(100, 1, 5), (100, 2, 3)]);
        assert_eq!(result.remaining_stock, 2);
        assert_eq!(result.on_hand, 2);
        assert!(!result.has_shortfall());
    }

    #[test]
    fn shortfall_is_reported_not_failed() {
        let result = allocate(&[lot(1, 3, 1)], &[out(100, 10)]).unwrap();

        assert_eq!(slices(&result), vec![(100, 1, 3)]);
        let shortfall = result.shortfall_for(TransactionId::new(100)).unwrap();
        assert_eq!(shortfall.requested, 10);
        assert_eq!(shortfall.allocated, 3);
        assert_eq!(shortfall.missing, 7);
        assert!(result.insufficient_stock);
        assert_eq!(result.on_hand, 0);
        assert_eq!(result.remaining_stock, -7);
        assert_eq!(result.reported_stock(), 0);
    }

    #[test]
    fn no_lots_means_full_shortfall() {
        let result = allocate(&[], &[out(100, 5)]).unwrap();

        assert!(result.records.is_empty());
        assert_eq!(result.shortfall_for(TransactionId::new(100)).unwrap().missing, 5);
        assert_eq!(result.remaining_stock, -5);
    }

    #[test]
    fn sequential_drawdown_from_one_lot() {
        let result = allocate(&[lot(1, 10, 1)], &[out(100, 4), out(101, 4)]).unwrap();

        assert_eq!(slices(&result), vec![(100, 1, 4), (101, 1, 4)]);
        assert_eq!(result.lot_balances[0].consumed, 8);
        assert_eq!(result.lot_balances[0].remaining, 2);
        assert_eq!(result.remaining_stock, 2);
    }

    #[test]
    fn unsorted_lots_are_consumed_oldest_first() {
        let lots = vec![lot(7, 4, 3), lot(8, 4, 1), lot(9, 4, 2)];
        let result = allocate(&lots, &[out(100, 9)]).unwrap();

        assert_eq!(slices(&result), vec![(100, 8, 4), (100, 9, 4), (100, 7, 1)]);
        let order: Vec<i64> = result.lot_balances.iter().map(|b| b.lot_id.get()).collect();
        assert_eq!(order, vec![8, 9, 7]);
    }

    #[test]
    fn equal_arrival_is_broken_by_ascending_id() {
        let lots = vec![lot(5, 2, 1), lot(3, 2, 1)];
        let result = allocate(&lots, &[out(100, 3)]).unwrap();

        assert_eq!(slices(&result), vec![(100, 3, 2), (100, 5, 1)]);
    }

    #[test]
    fn zero_quantity_transaction_emits_nothing() {
        let result = allocate(&[lot(1, 5, 1)], &[out(100, 0)]).unwrap();

        assert!(result.records.is_empty());
        assert!(result.shortfalls.is_empty());
        assert_eq!(result.remaining_stock, 5);
    }

    #[test]
    fn zero_quantity_lot_is_skipped_but_listed() {
        let result = allocate(&[lot(1, 0, 1), lot(2, 3, 2)], &[out(100, 2)]).unwrap();

        assert_eq!(slices(&result), vec![(100, 2, 2)]);
        assert_eq!(result.lot_balances.len(), 2);
        assert_eq!(result.lot_balances[0].consumed, 0);
    }

    #[test]
    fn expiry_is_carried_to_records() {
        let expiry = day(90);
        let lots = vec![lot(1, 2, 1).with_expiry(expiry), lot(2, 2, 2)];
        let result = allocate(&lots, &[out(100, 3)]).unwrap();

        assert_eq!(result.records[0].source_lot_expiry, Some(expiry));
        assert_eq!(result.records[1].source_lot_expiry, None);
        assert_eq!(result.records[0].outgoing_date, day(20));
    }

    #[test]
    fn later_lot_with_earlier_expiry_does_not_jump_the_queue() {
        let lots = vec![lot(1, 2, 1).with_expiry(day(200)), lot(2, 2, 2).with_expiry(day(30))];
        let result = allocate(&lots, &[out(100, 2)]).unwrap();

        assert_eq!(slices(&result), vec![(100, 1, 2)]);
    }

    #[test]
    fn negative_quantity_fails_without_output() {
        let err = allocate(&[lot(1, 5, 1)], &[out(100, 2), out(101, -1)]).unwrap_err();
        assert!(matches!(err, DomainError::InvalidInput(_)));

        let err = allocate(&[lot(1, -5, 1)], &[]).unwrap_err();
        assert!(matches!(err, DomainError::InvalidInput(_)));
    }

    #[test]
    fn duplicate_ids_are_rejected() {
        let err = allocate(&[lot(1, 5, 1), lot(1, 5, 2)], &[]).unwrap_err();
        match err {
            DomainError::InvalidInput(msg) => assert!(msg.contains("duplicate incoming lot id 1")),
            other => panic!("unexpected error: {other:?}"),
        }

        let err = allocate(&[lot(1, 5, 1)], &[out(100, 1), out(100, 1)]).unwrap_err();
        assert!(matches!(err, DomainError::InvalidInput(_)));
    }

    #[test]
    fn overflowing_totals_are_rejected() {
        let err = allocate(&[lot(1, i64::MAX, 1), lot(2, 1, 2)], &[]).unwrap_err();
        assert!(matches!(err, DomainError::InvalidInput(_)));
    }

    #[test]
    fn reconcile_rejects_inconsistent_totals() {
        assert_eq!(reconcile(10, 4, 6, 0), Ok(6));
        assert_eq!(reconcile(3, 10, 0, 7), Ok(-7));

        match reconcile(10, 4, 5, 0).unwrap_err() {
            DomainError::InvariantViolation(msg) => {
                assert!(msg.contains("remaining stock 6 does not match on-hand 5"))
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn caller_order_is_kept_by_default() {
        let outgoing = vec![out_at(101, 3, 10), out_at(100, 3, 5)];
        let result = allocate(&[lot(1, 3, 1), lot(2, 3, 2)], &outgoing).unwrap();

        assert_eq!(slices(&result), vec![(101, 1, 3), (100, 2, 3)]);
    }

    #[test]
    fn chronological_order_sorts_outgoing() {
        let outgoing = vec![out_at(101, 3, 10), out_at(100, 3, 5), out_at(99, 1, 10)];
        let engine = FifoEngine::new().with_outgoing_order(OutgoingOrder::Chronological);
        let result = engine.allocate(&[lot(1, 3, 1), lot(2, 4, 2)], &outgoing).unwrap();

        assert_eq!(slices(&result), vec![(100, 1, 3), (99, 2, 1), (101, 2, 3)]);
    }

    #[test]
    fn outgoing_order_parses() {
        assert_eq!("as_given".parse::<OutgoingOrder>().unwrap(), OutgoingOrder::AsGiven);
        assert_eq!(
            " Chronological ".parse::<OutgoingOrder>().unwrap(),
            OutgoingOrder::Chronological
        );
        assert!("newest".parse::<OutgoingOrder>().is_err());
    }

    #[test]
    fn caller_input_is_untouched() {
        let lots = vec![lot(2, 5, 2), lot(1, 5, 1)];
        let outgoing = vec![out(100, 7)];
        let lots_before = lots.clone();
        let outgoing_before = outgoing.clone();

        let _ = allocate(&lots, &outgoing).unwrap();

        assert_eq!(lots, lots_before);
        assert_eq!(outgoing, outgoing_before);
    }

    #[test]
    fn can_fulfil_checks_on_hand() {
        let result = allocate(&[lot(1, 10, 1)], &[out(100, 4)]).unwrap();
        assert!(result.can_fulfil(6));
        assert!(!result.can_fulfil(7));
        assert!(!result.can_fulfil(-1));
    }

    fn arb_input() -> impl Strategy<Value = (Vec<IncomingLot>, Vec<OutgoingTransaction>)> {
        let lots = prop::collection::vec((0i64..50, 1i64..15), 0..12).prop_map(|raw| {
            raw.into_iter()
                .enumerate()
                .map(|(i, (qty, received))| lot(i as i64 + 1, qty, received))
                .collect::<Vec<_>>()
        });
        let outgoing = prop::collection::vec((0i64..60, 1i64..30), 0..12).prop_map(|raw| {
            raw.into_iter()
                .enumerate()
                .map(|(i, (qty, occurred))| out_at(i as i64 + 100, qty, occurred))
                .collect::<Vec<_>>()
        });
        (lots, outgoing)
    }

    proptest! {
        #![proptest_config(ProptestConfig {
            cases: 256,
            ..ProptestConfig::default()
        })]

        /// Property: allocated plus missing always equals demand; without a
        /// shortfall everything requested is allocated.
        #[test]
        fn demand_is_conserved((lots, outgoing) in arb_input()) {
            let result = allocate(&lots, &outgoing).unwrap();
            let demand: i64 = outgoing.iter().map(|t| t.quantity).sum();

            prop_assert_eq!(result.total_allocated() + result.total_missing(), demand);
            if !result.has_shortfall() {
                prop_assert_eq!(result.total_allocated(), demand);
            }
            for tx in &outgoing {
                prop_assert!(result.allocated_for(tx.id) <= tx.quantity);
            }
        }

        /// Property: no lot is drawn beyond its original quantity and no
        /// remainder goes negative.
        #[test]
        fn lots_are_never_overdrawn((lots, outgoing) in arb_input()) {
            let result = allocate(&lots, &outgoing).unwrap();

            for l in &lots {
                prop_assert!(result.consumed_from(l.id) <= l.quantity);
            }
            for b in &result.lot_balances {
                prop_assert!(b.remaining >= 0);
                prop_assert_eq!(b.original - b.consumed, b.remaining);
            }
            prop_assert!(result.records.iter().all(|r| r.quantity > 0));
        }

        /// Property: slices are drawn in non-decreasing arrival order.
        #[test]
        fn slices_follow_arrival_order((lots, outgoing) in arb_input()) {
            let result = allocate(&lots, &outgoing).unwrap();
            let key = |id: LotId| {
                let l = lots.iter().find(|l| l.id == id).unwrap();
                (l.received_at, l.id)
            };

            for pair in result.records.windows(2) {
                prop_assert!(key(pair[0].source_lot_id) <= key(pair[1].source_lot_id));
            }
        }

        /// Property: re-running on the same input yields identical output.
        #[test]
        fn recomputation_is_identical((lots, outgoing) in arb_input()) {
            let first = allocate(&lots, &outgoing).unwrap();
            let second = allocate(&lots, &outgoing).unwrap();

            prop_assert_eq!(
                serde_json::to_string(&first).unwrap(),
                serde_json::to_string(&second).unwrap()
            );
            prop_assert_eq!(first, second);
        }

        /// Property: signed remaining stock is supply minus demand and
        /// matches on-hand stock whenever nothing was oversold.
        #[test]
        fn remaining_stock_is_signed((lots, outgoing) in arb_input()) {
            let result = allocate(&lots, &outgoing).unwrap();
            let supply: i64 = lots.iter().map(|l| l.quantity).sum();
            let demand: i64 = outgoing.iter().map(|t| t.quantity).sum();

            prop_assert_eq!(result.remaining_stock, supply - demand);
            prop_assert_eq!(result.has_shortfall(), supply < demand);
            if !result.has_shortfall() {
                prop_assert_eq!(result.on_hand, result.remaining_stock);
            } else {
                prop_assert_eq!(result.on_hand, 0);
            }
        }
    }
}
