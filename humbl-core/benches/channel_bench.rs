//! Criterion benchmarks for the channel hot paths.
//!
//! Benchmarks:
//! 1. Point-in-time channel, with and without volatility adjustment
//! 2. Realized-volatility estimators
//! 3. Historical channel fan-out

use chrono::NaiveDate;
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

use humbl_core::channel::{calc_humbl_channel, calc_humbl_channel_historical, ChannelConfig};
use humbl_core::data::generate_synthetic_bars;
use humbl_core::volatility::{realized_volatility, Estimator, VolatilityOptions};
use humbl_core::{PriceBar, WindowSpec};

// ── Helpers ──────────────────────────────────────────────────────────

fn make_bars(years: i32) -> Vec<PriceBar> {
    let start = NaiveDate::from_ymd_opt(2024 - years, 1, 1).unwrap();
    let end = NaiveDate::from_ymd_opt(2023, 12, 31).unwrap();
    generate_synthetic_bars("BENCH", start, end)
}

// ── 1. Channel ───────────────────────────────────────────────────────

fn bench_channel(c: &mut Criterion) {
    let mut group = c.benchmark_group("channel");
    for years in [1, 5, 10] {
        let bars = make_bars(years);
        for adjust in [false, true] {
            let cfg = ChannelConfig {
                rv_adjustment: adjust,
                ..ChannelConfig::default()
            };
            let id = format!("{years}y_rv_{adjust}");
            group.bench_with_input(BenchmarkId::from_parameter(id), &bars, |b, bars| {
                b.iter(|| calc_humbl_channel(black_box(bars), &cfg, None))
            });
        }
    }
    group.finish();
}

// ── 2. Estimators ────────────────────────────────────────────────────

fn bench_estimators(c: &mut Criterion) {
    let bars = make_bars(5);
    let window = WindowSpec::parse("1mo").unwrap();
    let opts = VolatilityOptions::default();
    let mut group = c.benchmark_group("estimators");
    for estimator in Estimator::ALL {
        group.bench_function(estimator.name(), |b| {
            b.iter(|| realized_volatility(black_box(&bars), &window, estimator, &opts))
        });
    }
    group.finish();
}

// ── 3. Historical ────────────────────────────────────────────────────

fn bench_historical(c: &mut Criterion) {
    let bars = make_bars(1);
    let mut group = c.benchmark_group("historical");
    group.sample_size(10);
    for workers in [1, 4] {
        let cfg = ChannelConfig {
            rv_adjustment: false,
            max_workers: Some(workers),
            ..ChannelConfig::default()
        };
        group.bench_with_input(BenchmarkId::from_parameter(workers), &bars, |b, bars| {
            b.iter(|| calc_humbl_channel_historical(black_box(bars), &cfg))
        });
    }
    group.finish();
}

criterion_group!(benches, bench_channel, bench_estimators, bench_historical);
criterion_main!(benches);
