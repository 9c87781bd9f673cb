//! Benchmarks for the engine crate.

use std::cell::Cell;
use std::rc::Rc;

use criterion::{Criterion, criterion_group, criterion_main};
use pacer_engine::prelude::*;
use pacer_engine::{IntervalStats, Signal};
use std::hint::black_box;

fn bench_signal_emit(c: &mut Criterion) {
    let signal = Signal::new("update");
    let count = Rc::new(Cell::new(0u64));
    for _ in 0..8 {
        let n = Rc::clone(&count);
        signal.connect(move || n.set(n.get().wrapping_add(1)));
    }

    c.bench_function("signal_emit_8_listeners", |b| {
        b.iter(|| {
            black_box(signal.emit());
        });
    });
}

fn bench_fast_engine_frame(c: &mut Criterion) {
    let host = ManualHost::shared();
    let Ok(engine) = FastEngine::new(host.clone(), EngineConfig::default()) else {
        return;
    };
    let mut ts = 0.0;

    c.bench_function("fast_engine_frame", |b| {
        b.iter(|| {
            ts += 16.0;
            black_box(host.frame(black_box(ts)));
        });
    });
    drop(engine);
}

fn bench_static_engine_catch_up(c: &mut Criterion) {
    let host = ManualHost::shared();
    let config = EngineConfig::builder().limit_hz(1000.0).unbounded_catch_up().build();
    let Ok(engine) = config.and_then(|config| StaticEngine::new(host.clone(), host.clone(), config))
    else {
        return;
    };
    let mut ts = 0.0;

    // 100 fixed steps per frame.
    c.bench_function("static_engine_catch_up_100", |b| {
        b.iter(|| {
            ts += 100.0;
            black_box(host.frame(black_box(ts)));
        });
    });
    drop(engine);
}

fn bench_precise_engine_timer(c: &mut Criterion) {
    let host = ManualHost::shared();
    let Ok(engine) = PreciseEngine::new(host.clone(), EngineConfig::with_limit(1000.0)) else {
        return;
    };

    c.bench_function("precise_engine_timer", |b| {
        b.iter(|| {
            black_box(host.advance_by(black_box(1.0)));
        });
    });
    drop(engine);
}

fn bench_interval_p99(c: &mut Criterion) {
    let mut stats = IntervalStats::with_capacity(1024);
    for i in 0..1024u32 {
        stats.record_dispatch(f64::from(i % 40));
    }

    c.bench_function("interval_p99", |b| {
        b.iter(|| {
            black_box(stats.p99_interval_ms());
        });
    });
}

criterion_group!(
    benches,
    bench_signal_emit,
    bench_fast_engine_frame,
    bench_static_engine_catch_up,
    bench_precise_engine_timer,
    bench_interval_p99
);
criterion_main!(benches);
