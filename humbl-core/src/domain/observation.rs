//! Macro indicator observations (CLI, CPI).

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// One value of a macro series for a country.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MacroObservation {
    pub date: NaiveDate,
    pub country: String,
    pub value: f64,
}

impl MacroObservation {
    pub fn new(date: NaiveDate, country: impl Into<String>, value: f64) -> Self {
        Self {
            date,
            country: country.into(),
            value,
        }
    }
}
