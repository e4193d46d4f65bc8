// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use criterion::{BatchSize, Criterion, criterion_group, criterion_main};

mod runner;

macro_rules! bench_harness {
    ($($name:ident,)*) => {
        fn bench_shapes(c: &mut Criterion) {
            $(
                c.bench_function(stringify!($name), |b| {
                    b.iter_batched(
                        runner::Scenario::new,
                        |scenario| scenario.$name(),
                        BatchSize::PerIteration,
                    )
                });
            )*
        }
    };
}

bench_harness!(
    shared_transitions,
    field_generalization,
    property_loads,
    cached_field_loads,
    normalization,
);

criterion_group!(benches, bench_shapes);
criterion_main!(benches);
