//! CLI utilities for beatvault.
//!
//! Configuration file handling, application paths and result output.

pub mod config;
pub mod output;
pub mod paths;

pub use config::{Config, StoreBackend, StoreConfig, load_config};
pub use output::{Output, OutputFormat};
pub use paths::Paths;
