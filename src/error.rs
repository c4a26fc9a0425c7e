//! Error types for the launcher pipeline.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias using our error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Every terminal failure of one launcher run.
#[derive(Error, Debug)]
pub enum Error {
    /// The running executable's own path could not be read
    #[error("Failed to read the launcher's own filename: {0}")]
    Identity(#[source] std::io::Error),

    /// Filename does not follow `<prefix>-<package>-<executable>`
    #[error("Filename '{filename}' does not follow the naming convention")]
    Decode { filename: String },

    /// Package term has no letters or digits
    #[error("Package term '{term}' has no alphanumeric content")]
    Normalization { term: String },

    /// Package query produced no usable install root
    #[error("No installed package found matching '{term}' (normalized: '{normalized}')")]
    NoPackage { term: String, normalized: String },

    /// Package found but nothing under it matched the executable term
    #[error("No executable matching '{exe_term}*' found in the package directory")]
    NoExecutable { exe_term: String },

    /// Host refused to start the selected candidate
    #[error("Failed to launch {}: {source}", path.display())]
    Launch {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl Error {
    /// Process exit status reported for this failure.
    pub fn exit_code(&self) -> i32 {
        1
    }
}
