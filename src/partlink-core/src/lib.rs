pub mod catalog;
pub mod config;
pub mod logging;
pub mod notify;
pub mod paths;
pub mod redact;
pub mod routes;
pub mod secrets;
pub mod settings;
pub mod supplier;
pub mod tasks;

pub use config::{Config, ConfigError, DigikeyApiConfig, HostConfig, LogLevel, LoggingConfig, ValidationError};
pub use logging::{init_logging, LoggingError, LoggingGuard};
pub use paths::{AppDirs, DirsError};
pub use supplier::{SupplierCapabilities, SupplierError, SupplierPlugin, SupplierResult};

pub const APP_NAME: &str = "partlink";
pub const APP_AUTHOR: &str = "Partlink";
pub const APP_QUALIFIER: &str = "io";
