pub mod config;
pub mod error;
pub mod types;

pub use config::F1DeskConfig;
pub use error::{AppError, Result};
pub use types::*;
