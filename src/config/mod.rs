//! Configuration files and their translation into [`ClientConfig`].
//!
//! [`ClientConfig`]: crate::http::ClientConfig
mod apply;
mod loader;
mod parse;
pub mod types;


pub use apply::to_client_config;
pub use loader::{load_config, load_config_file};
pub use parse::{parse_duration_value, parse_header};
pub use types::{ConfigFile, DurationValue};
