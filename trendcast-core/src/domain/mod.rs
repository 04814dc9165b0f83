//! Domain types for TrendCast

pub mod bar;
pub mod series;

pub use bar::Bar;
pub use series::{bars_from_columns, validate_bars};
