use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PortsError {
    #[error("project root not found: {}", .0.display())]
    RootNotFound(PathBuf),

    #[error("filesystem error at {}: {source}", path.display())]
    Filesystem {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("syntax error in {} line {line}: {message}", path.display())]
    ConfigSyntax {
        path: PathBuf,
        line: usize,
        message: String,
    },

    #[error("invalid variable name '{0}': must be uppercase and end in PORT")]
    InvalidVariableName(String),

    #[error("invalid port '{0}': must be an integer in 1-65535")]
    InvalidPort(String),
}

impl PortsError {
    pub fn filesystem(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        PortsError::Filesystem {
            path: path.into(),
            source,
        }
    }
}

pub type Result<T> = std::result::Result<T, PortsError>;
