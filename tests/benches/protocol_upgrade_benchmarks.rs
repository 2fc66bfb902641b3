//! # Protocol Upgrade Benchmarks
//!
//! | Area | Claim | Target |
//! |------|-------|--------|
//! | Epoch decision | single pass over decision epoch | < 50ms for 10k blocks |
//! | Envelope decode | constant per record | < 1µs per header |

use criterion::{criterion_group, criterion_main, Criterion};
use qc_tests::benchmarks::qc_18_protocol_upgrade;

fn bench_protocol_upgrade(c: &mut Criterion) {
    qc_18_protocol_upgrade::register_benchmarks(c);
}

criterion_group!(benches, bench_protocol_upgrade);

criterion_main!(benches);
