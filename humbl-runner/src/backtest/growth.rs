//! Investment growth per (symbol, regime).
//!
//! Each regime compounds its own investment, starting from the initial
//! amount at the regime's first chronological instance and carrying the
//! value across later instances of the same regime only.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use humbl_core::Regime;

use super::RegimeInstance;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct InvestmentGrowth {
    /// Value after the last instance.
    pub final_value: f64,
    /// `final_value - initial`.
    pub growth: f64,
    /// Growth relative to the initial amount, in percent.
    pub growth_pct: f64,
}

/// Compound `initial` through instance returns (percent) in order.
pub fn compound(initial: f64, returns_pct: impl IntoIterator<Item = f64>) -> InvestmentGrowth {
    let final_value = returns_pct
        .into_iter()
        .fold(initial, |value, r| value * (1.0 + r / 100.0));
    let growth = final_value - initial;
    InvestmentGrowth {
        final_value,
        growth,
        growth_pct: if initial != 0.0 { growth / initial * 100.0 } else { 0.0 },
    }
}

/// Growth for every classified (symbol, regime) in `instances`.
pub fn regime_growth(
    instances: &[RegimeInstance],
    initial: f64,
) -> BTreeMap<(String, Regime), InvestmentGrowth> {
    let mut by_regime: BTreeMap<(String, Regime), Vec<&RegimeInstance>> = BTreeMap::new();
    for inst in instances {
        if let Some(regime) = inst.humbl_regime {
            by_regime
                .entry((inst.symbol.clone(), regime))
                .or_default()
                .push(inst);
        }
    }
    by_regime
        .into_iter()
        .map(|(key, mut runs)| {
            runs.sort_by_key(|r| r.start_date);
            let growth = compound(initial, runs.iter().filter_map(|r| r.total_return_pct));
            (key, growth)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn compounds_in_order() {
        let g = compound(1000.0, [10.0, -5.0, 2.0]);
        assert!((g.final_value - 1000.0 * 1.10 * 0.95 * 1.02).abs() < 1e-9);
        assert!((g.growth - (g.final_value - 1000.0)).abs() < 1e-12);
        assert!((g.growth_pct - 6.59).abs() < 1e-9);
    }

    #[test]
    fn no_instances_keeps_initial() {
        let g = compound(500.0, []);
        assert_eq!(g.final_value, 500.0);
        assert_eq!(g.growth, 0.0);
        assert_eq!(g.growth_pct, 0.0);
    }
}
