use criterion::{BenchmarkId, Criterion, Throughput, black_box, criterion_group, criterion_main};

use chrono::{Duration, TimeZone, Utc};
use stockflow_core::{LotId, TransactionId};
use stockflow_inventory::{FifoEngine, IncomingLot, OutgoingOrder, OutgoingTransaction, allocate};

/// Lots of 20 units each and transactions of 15 units, so most transactions
/// straddle two lots.
fn build_input(size: usize) -> (Vec<IncomingLot>, Vec<OutgoingTransaction>) {
    let start = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
    let lots = (0..size)
        .map(|i| IncomingLot::new(LotId::new(i as i64), 20, start + Duration::hours(i as i64)))
        .rev()
        .collect();
    let outgoing = (0..size)
        .map(|i| {
            OutgoingTransaction::new(
                TransactionId::new(i as i64),
                15,
                start + Duration::hours(i as i64) + Duration::minutes(30),
            )
        })
        .collect();
    (lots, outgoing)
}

fn bench_allocate(c: &mut Criterion) {
    let mut group = c.benchmark_group("fifo_allocate");

    for size in [10usize, 100, 1000, 5000].iter() {
        let (lots, outgoing) = build_input(*size);
        group.throughput(Throughput::Elements(*size as u64));
        group.bench_with_input(BenchmarkId::new("as_given", size), size, |b, _| {
            b.iter(|| allocate(black_box(&lots), black_box(&outgoing)).unwrap());
        });
    }

    group.finish();
}

fn bench_chronological(c: &mut Criterion) {
    let mut group = c.benchmark_group("fifo_allocate_chronological");
    let engine = FifoEngine::new().with_outgoing_order(OutgoingOrder::Chronological);

    for size in [100usize, 1000].iter() {
        let (lots, mut outgoing) = build_input(*size);
        outgoing.reverse();
        group.bench_with_input(BenchmarkId::new("reversed_outgoing", size), size, |b, _| {
            b.iter(|| engine.allocate(black_box(&lots), black_box(&outgoing)).unwrap());
        });
    }

    group.finish();
}

criterion_group!(benches, bench_allocate, bench_chronological);
criterion_main!(benches);
