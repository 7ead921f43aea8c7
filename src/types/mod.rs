//! Data types for the grid engine.

mod config;
mod record;
mod selection;

pub use config::*;
pub use record::*;
pub use selection::*;
