//! humblCOMPASS regimes.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::HumblError;

/// One of the four macro regimes.
///
/// Variant order is the canonical display order (BOOM, BOUNCE, BLOAT, BUST),
/// so sorting by `Regime` sorts for display.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Regime {
    #[serde(rename = "humblBOOM")]
    Boom,
    #[serde(rename = "humblBOUNCE")]
    Bounce,
    #[serde(rename = "humblBLOAT")]
    Bloat,
    #[serde(rename = "humblBUST")]
    Bust,
}

impl Regime {
    pub const ALL: [Regime; 4] = [Regime::Boom, Regime::Bounce, Regime::Bloat, Regime::Bust];

    pub fn label(&self) -> &'static str {
        match self {
            Regime::Boom => "humblBOOM",
            Regime::Bounce => "humblBOUNCE",
            Regime::Bloat => "humblBLOAT",
            Regime::Bust => "humblBUST",
        }
    }

    /// Sign-quadrant rule over the inflation (CPI) and growth (CLI) deltas.
    ///
    /// A zero or missing delta leaves the period unclassified.
    pub fn from_deltas(cpi_delta: Option<f64>, cli_delta: Option<f64>) -> Option<Regime> {
        let (cpi, cli) = (cpi_delta?, cli_delta?);
        if cpi > 0.0 && cli < 0.0 {
            Some(Regime::Bloat)
        } else if cpi > 0.0 && cli > 0.0 {
            Some(Regime::Bounce)
        } else if cpi < 0.0 && cli > 0.0 {
            Some(Regime::Boom)
        } else if cpi < 0.0 && cli < 0.0 {
            Some(Regime::Bust)
        } else {
            None
        }
    }
}

impl fmt::Display for Regime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Regime {
    type Err = HumblError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Regime::ALL
            .into_iter()
            .find(|r| r.label() == s)
            .ok_or_else(|| HumblError::InvalidMethod {
                kind: "regime",
                value: s.to_string(),
                expected: "humblBOOM, humblBOUNCE, humblBLOAT, humblBUST",
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quadrants() {
        assert_eq!(Regime::from_deltas(Some(1.0), Some(-1.0)), Some(Regime::Bloat));
        assert_eq!(Regime::from_deltas(Some(1.0), Some(1.0)), Some(Regime::Bounce));
        assert_eq!(Regime::from_deltas(Some(-1.2), Some(0.8)), Some(Regime::Boom));
        assert_eq!(Regime::from_deltas(Some(-1.0), Some(-1.0)), Some(Regime::Bust));
    }

    #[test]
    fn zero_or_missing_delta_is_unclassified() {
        assert_eq!(Regime::from_deltas(Some(0.0), Some(1.0)), None);
        assert_eq!(Regime::from_deltas(Some(1.0), Some(0.0)), None);
        assert_eq!(Regime::from_deltas(None, Some(1.0)), None);
        assert_eq!(Regime::from_deltas(Some(-1.0), None), None);
    }

    #[test]
    fn ordering_matches_display_order() {
        let mut regimes = vec![Regime::Bust, Regime::Boom, Regime::Bloat, Regime::Bounce];
        regimes.sort();
        assert_eq!(regimes, Regime::ALL.to_vec());
        assert!(Regime::Boom < Regime::Bounce && Regime::Bloat < Regime::Bust);
    }

    #[test]
    fn label_roundtrip() {
        for r in Regime::ALL {
            assert_eq!(r.label().parse::<Regime>().unwrap(), r);
            assert_eq!(serde_json::to_string(&r).unwrap(), format!("\"{}\"", r.label()));
        }
        assert!("humblMEH".parse::<Regime>().is_err());
    }
}
