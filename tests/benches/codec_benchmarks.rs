//! # Ledger Codec Benchmarks
//!
//! Pack/unpack cost of a populated `AddressEncumbrances`, the largest entry
//! the ledger hashes on every block that touches an encumbered address.
//!
//! | Benchmark | Measures |
//! |-----------|----------|
//! | `pack` | Canonical packed bytes |
//! | `unpack` | Decode of packed bytes with default limits |
//! | `legacy_encode` | Legacy array value tree |
//! | `add_encumbrance` | One add with full priority recalculation |

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use ledger_state::{AddressEncumbrances, EncumbranceDetail, EncumbranceEntry, Packable, StateEntry};
use std::time::Duration;

fn entry(reference: String, amount: i64) -> EncumbranceEntry {
    EncumbranceEntry::new(
        reference,
        amount,
        vec![EncumbranceDetail::new("beneficiary", 0, 0)],
        vec![
            EncumbranceDetail::new("admin1", 0, 0),
            EncumbranceDetail::new("admin2", 100, 1_000_000),
        ],
    )
}

fn populated(assets: usize, per_asset: usize) -> AddressEncumbrances {
    let mut ledger = AddressEncumbrances::new("bench-address");
    for a in 0..assets {
        let asset_id = format!("NS|Class{a}");
        for r in 0..per_asset {
            ledger.set_encumbrance_entry(
                &asset_id,
                Some(&entry(format!("ref-{r}"), 1_000 + r as i64)),
                false,
                false,
            );
        }
    }
    ledger
}

fn bench_codec(c: &mut Criterion) {
    let mut group = c.benchmark_group("address-encumbrances");
    group.measurement_time(Duration::from_secs(5));

    for per_asset in [10, 100, 1_000] {
        let ledger = populated(4, per_asset);
        let bytes = ledger.to_packed_bytes().unwrap();
        group.throughput(Throughput::Bytes(bytes.len() as u64));

        group.bench_with_input(BenchmarkId::new("pack", per_asset), &ledger, |b, ledger| {
            b.iter(|| black_box(ledger.to_packed_bytes().unwrap()))
        });

        group.bench_with_input(BenchmarkId::new("unpack", per_asset), &bytes, |b, bytes| {
            b.iter(|| black_box(AddressEncumbrances::from_packed_bytes(bytes).unwrap()))
        });

        group.bench_with_input(
            BenchmarkId::new("legacy_encode", per_asset),
            &ledger,
            |b, ledger| b.iter(|| black_box(ledger.encode(0))),
        );
    }

    group.finish();
}

fn bench_add(c: &mut Criterion) {
    let mut group = c.benchmark_group("encumbrance-engine");

    for per_asset in [10, 100, 1_000] {
        let ledger = populated(1, per_asset);
        let new_entry = entry("ref-new".to_string(), 5);
        group.bench_with_input(
            BenchmarkId::new("add_encumbrance", per_asset),
            &ledger,
            |b, ledger| {
                b.iter_batched(
                    || ledger.clone(),
                    |mut ledger| {
                        black_box(ledger.set_encumbrance_entry(
                            "NS|Class0",
                            Some(&new_entry),
                            false,
                            true,
                        ))
                    },
                    criterion::BatchSize::SmallInput,
                )
            },
        );
    }

    group.finish();
}

criterion_group!(benches, bench_codec, bench_add);
criterion_main!(benches);
