pub mod aggregate;
pub mod config;
pub mod error;
pub mod fetch;
pub mod loader;
pub mod metrics;
pub mod output;
pub mod pipeline;
pub mod presenter;

pub use error::{FleetError, Result, ValidationError};
