//! Handlers 模块

pub mod devices;
pub mod health;
pub mod metrics;

pub use devices::*;
pub use health::*;
pub use metrics::*;
