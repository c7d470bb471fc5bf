pub mod calendar;
pub mod client;
pub mod config;
pub mod dashboard;
pub mod error;
pub mod export;
pub mod metrics;
pub mod models;
pub mod normalize;
pub mod ticker;
pub mod timefmt;

pub use error::{AppError, Result};
