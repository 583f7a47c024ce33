//! Domain types: price bars, macro observations and regimes.

pub mod bar;
pub mod observation;
pub mod regime;

pub use bar::PriceBar;
pub use observation::MacroObservation;
pub use regime::Regime;
