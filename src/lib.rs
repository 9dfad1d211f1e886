pub mod config;
pub mod error;
pub mod fetch;
pub mod indicator;
pub mod monitor;
pub mod shutdown;
pub mod status;

pub use error::{LampError, Result};
