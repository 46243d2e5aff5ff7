//! CLI-level errors (wraps infrastructure errors)

use thiserror::Error;

use crate::application::ApplicationError;
use crate::domain::ErrorKind;
use crate::exitcode;
use crate::infrastructure::InfraError;

/// CLI errors are the top-level error type.
/// These are what get displayed to the user.
#[derive(Error, Debug)]
pub enum CliError {
    #[error("{0}")]
    Infra(#[from] InfraError),

    #[error("invalid arguments: {0}")]
    InvalidArgs(String),

    #[error("{0}")]
    Usage(String),

    #[error("render output: {0}")]
    Output(#[from] serde_json::Error),
}

impl From<ApplicationError> for CliError {
    fn from(e: ApplicationError) -> Self {
        CliError::Infra(InfraError::Application(e))
    }
}

/// Result type for CLI operations.
pub type CliResult<T> = Result<T, CliError>;

impl CliError {
    /// Get the appropriate exit code for this error.
    pub fn exit_code(&self) -> i32 {
        match self {
            CliError::InvalidArgs(_) | CliError::Usage(_) => exitcode::USAGE,
            CliError::Output(_) => exitcode::SOFTWARE,
            CliError::Infra(e) => match e {
                InfraError::Io { .. } => exitcode::IOERR,
                InfraError::Application(app) => match app {
                    ApplicationError::Domain(d) => match d.kind() {
                        ErrorKind::Validation
                        | ErrorKind::ForbiddenField
                        | ErrorKind::ReferentialIntegrity
                        | ErrorKind::Conflict => exitcode::DATAERR,
                        ErrorKind::NotFound => exitcode::NOINPUT,
                        ErrorKind::Forbidden => exitcode::NOPERM,
                    },
                    ApplicationError::Storage { .. } => exitcode::IOERR,
                    ApplicationError::Config { .. } => exitcode::CONFIG,
                },
            },
        }
    }
}
