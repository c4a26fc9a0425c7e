use crate::error::{Error, Result};
use std::path::Path;

/// Extension stripped from the launcher's filename before decoding.
pub const LAUNCHER_EXTENSION: &str = ".exe";

const SEGMENT_DELIMITER: char = '-';

/// What a renamed launcher copy asks for, decoded from its own filename.
///
/// `appstoreopener-raindropio-raindrop.exe` decodes to the package term
/// `raindropio` and the executable term `raindrop`. Any number of leading
/// segments before those two are ignored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub package_term: String,
    pub exe_term: String,
}

impl Identity {
    pub fn decode(filename: &str) -> Result<Self> {
        let stem = strip_launcher_extension(filename);
        let segments: Vec<&str> = stem.split(SEGMENT_DELIMITER).collect();

        let decode_error = || Error::Decode {
            filename: filename.to_string(),
        };

        let [.., package_term, exe_term] = segments.as_slice() else {
            return Err(decode_error());
        };
        // Two segments means the package term would be the prefix itself.
        if segments.len() < 3 || package_term.is_empty() || exe_term.is_empty() {
            return Err(decode_error());
        }

        Ok(Self {
            package_term: package_term.to_string(),
            exe_term: exe_term.to_string(),
        })
    }

    /// Decodes the identity of the currently running executable.
    pub fn from_current_exe() -> Result<Self> {
        let exe = std::env::current_exe().map_err(Error::Identity)?;
        Self::decode(&base_name(&exe))
    }
}

fn base_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default()
}

fn strip_launcher_extension(filename: &str) -> &str {
    let split = filename.len().checked_sub(LAUNCHER_EXTENSION.len());
    match split {
        Some(at)
            if filename.is_char_boundary(at)
                && filename[at..].eq_ignore_ascii_case(LAUNCHER_EXTENSION) =>
        {
            &filename[..at]
        }
        _ => filename,
    }
}
