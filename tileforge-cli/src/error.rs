//! CLI error handling with user-friendly messages.
//!
//! Centralizes error handling for the CLI, providing consistent formatting
//! and appropriate exit codes.

use std::fmt;
use std::process;
use std::time::Duration;
use tileforge::cache::CacheError;
use tileforge::config::ConfigFileError;
use tileforge::display::ViewportError;
use tileforge::service::ServiceError;
use tileforge::tile::CoordError;

/// CLI-specific errors with user-friendly messages.
#[derive(Debug)]
pub enum CliError {
    /// Failed to initialize logging
    LoggingInit(String),
    /// Configuration file could not be read or written
    Config(ConfigFileError),
    /// Invalid tile coordinates on the command line
    InvalidTile(CoordError),
    /// Requested view cannot be displayed
    InvalidViewport(ViewportError),
    /// Failed to start the tile system
    ServiceCreation(ServiceError),
    /// Cache could not be opened or cleared
    Cache(CacheError),
    /// Workers did not finish in time
    Timeout(Duration),
    /// Failed to write output file
    FileWrite { path: String, error: String },
}

impl CliError {
    /// Exit the process with an appropriate error message and code.
    pub fn exit(&self) -> ! {
        eprintln!("Error: {}", self);

        match self {
            CliError::Config(ConfigFileError::InvalidValue { .. }) => {
                eprintln!();
                eprintln!("Run 'tileforge config show' to see the effective configuration,");
                eprintln!("or 'tileforge config init --force' to restore the defaults.");
            }
            CliError::InvalidTile(_) => {
                eprintln!();
                eprintln!("Rows and columns must be below 2^zoom.");
            }
            _ => {}
        }

        process::exit(1)
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CliError::LoggingInit(msg) => write!(f, "Failed to initialize logging: {}", msg),
            CliError::Config(e) => write!(f, "Configuration error: {}", e),
            CliError::InvalidTile(e) => write!(f, "Invalid tile: {}", e),
            CliError::InvalidViewport(e) => write!(f, "Invalid view: {}", e),
            CliError::ServiceCreation(e) => write!(f, "Failed to start tile system: {}", e),
            CliError::Cache(e) => write!(f, "Cache error: {}", e),
            CliError::Timeout(d) => {
                write!(f, "Rendering did not finish within {} seconds", d.as_secs())
            }
            CliError::FileWrite { path, error } => {
                write!(f, "Failed to write file '{}': {}", path, error)
            }
        }
    }
}

impl std::error::Error for CliError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CliError::Config(e) => Some(e),
            CliError::InvalidTile(e) => Some(e),
            CliError::InvalidViewport(e) => Some(e),
            CliError::ServiceCreation(e) => Some(e),
            CliError::Cache(e) => Some(e),
            _ => None,
        }
    }
}

impl From<ConfigFileError> for CliError {
    fn from(e: ConfigFileError) -> Self {
        CliError::Config(e)
    }
}

impl From<CoordError> for CliError {
    fn from(e: CoordError) -> Self {
        CliError::InvalidTile(e)
    }
}

impl From<ViewportError> for CliError {
    fn from(e: ViewportError) -> Self {
        CliError::InvalidViewport(e)
    }
}

impl From<ServiceError> for CliError {
    fn from(e: ServiceError) -> Self {
        CliError::ServiceCreation(e)
    }
}

impl From<CacheError> for CliError {
    fn from(e: CacheError) -> Self {
        CliError::Cache(e)
    }
}
