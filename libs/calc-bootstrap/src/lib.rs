//! Shared process bootstrap for the calculator server and client binaries.

#![forbid(unsafe_code)]
#![deny(rust_2018_idioms)]

pub mod config;
pub mod logging;
pub mod signals;

pub use config::{AppConfig, CliArgs, ClientConfig, ConfigError, ENV_PREFIX, ServerConfig};
pub use logging::{LogFormat, LoggingConfig, init_logging};
pub use signals::wait_for_shutdown;
