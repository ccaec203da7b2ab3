//! Social trend scoring: product alignment, priority derivation, and
//! ranked content actions for detected trends.

pub mod actions;
pub mod agent;
pub mod alignment;
pub mod source;
pub mod types;

pub use agent::TrendAgent;
pub use source::{StaticTrendSource, TrendSource};
pub use types::{PlatformSignals, Trend, TrendAction};
