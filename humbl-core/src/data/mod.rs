//! Data boundary: canonical ordering, provider traits, polars conversion and
//! deterministic synthetic series.

pub mod canonicalize;
pub mod frame;
pub mod provider;
pub mod synthetic;

pub use canonicalize::{canonicalize, canonicalize_frame};
pub use frame::{
    bars_from_frame, bars_to_frame, channel_to_frame, date_column, date_from_days, days_from_date,
    macro_from_frame, momentum_to_frame, regime_labels_to_frame,
};
pub use provider::{
    DataError, InMemoryProvider, MacroIndicator, MacroProvider, PriceProvider, QuoteProvider,
};
pub use synthetic::{generate_synthetic_bars, generate_synthetic_macro};
