//! humblCOMPASS over synthetic and frame-sourced macro series.

use chrono::NaiveDate;
use humbl_core::compass::{classify_regime, CompassConfig};
use humbl_core::data::{
    date_column, generate_synthetic_macro, macro_from_frame, regime_labels_to_frame,
};
use humbl_core::{MacroObservation, Regime, WindowSpec};
use polars::prelude::*;

fn d(y: i32, m: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, day).unwrap()
}

#[test]
fn synthetic_monthly_series_are_fully_labelled_after_lag() {
    let cli = generate_synthetic_macro("CLI", "US", d(2019, 1, 1), 48);
    let cpi = generate_synthetic_macro("CPI", "US", d(2019, 1, 1), 48);
    let out = classify_regime(&cli, &cpi, &CompassConfig::default()).unwrap();
    assert_eq!(out.len(), 48);
    assert!(out[..3].iter().all(|r| r.humbl_regime.is_none()));
    // random walk deltas are never exactly zero
    assert!(out[3..].iter().all(|r| r.humbl_regime.is_some()));
    for row in &out[3..] {
        let cpi_up = row.cpi_3m_delta.unwrap() > 0.0;
        let cli_up = row.cli_3m_delta.unwrap() > 0.0;
        let expected = match (cpi_up, cli_up) {
            (true, false) => Regime::Bloat,
            (true, true) => Regime::Bounce,
            (false, true) => Regime::Boom,
            (false, false) => Regime::Bust,
        };
        assert_eq!(row.humbl_regime, Some(expected));
    }
}

#[test]
fn countries_are_classified_independently() {
    let mut cli = generate_synthetic_macro("CLI", "US", d(2020, 1, 1), 12);
    cli.extend(generate_synthetic_macro("CLI", "GB", d(2020, 1, 1), 12));
    let mut cpi = generate_synthetic_macro("CPI", "US", d(2020, 1, 1), 12);
    cpi.extend(generate_synthetic_macro("CPI", "GB", d(2020, 1, 1), 12));

    let out = classify_regime(&cli, &cpi, &CompassConfig::default()).unwrap();
    assert_eq!(out.len(), 24);
    // sorted by (country, month): GB first
    assert_eq!(out[0].country, "GB");
    assert_eq!(out[12].country, "US");
    assert!(out[12..15].iter().all(|r| r.cpi_3m_delta.is_none()));
}

#[test]
fn z_scores_over_clamped_window() {
    let cli = generate_synthetic_macro("CLI", "US", d(2020, 1, 1), 24);
    let cpi = generate_synthetic_macro("CPI", "US", d(2020, 1, 1), 24);
    let cfg = CompassConfig {
        z_score_window: Some(WindowSpec::parse("1mo").unwrap()),
        allow_z_score: true,
    };
    let clamped = classify_regime(&cli, &cpi, &cfg).unwrap();
    let three = classify_regime(
        &cli,
        &cpi,
        &CompassConfig {
            z_score_window: Some(WindowSpec::parse("3mo").unwrap()),
            allow_z_score: true,
        },
    )
    .unwrap();
    assert_eq!(clamped, three);
    assert!(clamped[..2].iter().all(|r| r.cli_zscore.is_none()));
    assert!(clamped[2..].iter().all(|r| r.cli_zscore.is_some()));
}

#[test]
fn mid_month_observations_are_normalized_and_joined() {
    let df = DataFrame::new(vec![
        date_column("date", [d(2024, 1, 15), d(2024, 2, 15), d(2024, 3, 15), d(2024, 4, 15)])
            .unwrap(),
        Column::new("value".into(), vec![100.0, 101.0, 102.0, 103.0]),
    ])
    .unwrap();
    let cpi = macro_from_frame(&df, "US").unwrap();
    let cli: Vec<MacroObservation> = [1, 2, 3, 4]
        .iter()
        .zip([99.0, 99.5, 99.0, 98.0])
        .map(|(&m, v)| MacroObservation::new(d(2024, m, 1), "US", v))
        .collect();

    let out = classify_regime(&cli, &cpi, &CompassConfig::default()).unwrap();
    assert_eq!(out.len(), 4);
    assert_eq!(out[3].date_month_start, d(2024, 4, 1));
    assert_eq!(out[3].humbl_regime, Some(Regime::Bloat));

    let frame = regime_labels_to_frame(&out).unwrap();
    assert_eq!(frame.height(), 4);
    assert_eq!(frame.column("humbl_regime").unwrap().null_count(), 3);
}
