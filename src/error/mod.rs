mod app;
mod config;
mod dial;
mod http;


pub use app::{AppError, AppResult};
pub use config::ConfigError;
pub use dial::DialError;
pub use http::{ClientError, RequestError};
