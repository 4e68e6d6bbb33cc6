//! Handlers 模块

pub mod auth;
pub mod health;
pub mod measurements;
pub mod metrics;
pub mod timeseries;

pub use auth::*;
pub use health::*;
pub use measurements::*;
pub use metrics::*;
pub use timeseries::*;
