//! User-facing notices for every terminal outcome of a run.

use crate::error::Error;
use crate::identity::Identity;
use crate::normalize::NormalizedTerm;
use crate::search::{Candidate, EXECUTABLE_SUFFIX};
use std::fmt::Write as _;

pub const TITLE: &str = "appstoreopener";
pub const DRY_RUN_TITLE: &str = "appstoreopener --dry-run";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Info,
    Warning,
    Error,
}

/// A blocking message shown to whoever started the launcher.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub title: &'static str,
    pub body: String,
    pub severity: Severity,
}

impl Notice {
    /// Presents the notice on the terminal: errors and warnings on stderr.
    pub fn show(&self) {
        match self.severity {
            Severity::Info => println!("{}\n\n{}", self.title, self.body),
            Severity::Warning | Severity::Error => eprintln!("{}\n\n{}", self.title, self.body),
        }
    }

    pub fn from_error(err: &Error) -> Self {
        let (body, severity) = match err {
            Error::Identity(_) => (err.to_string(), Severity::Error),
            Error::Decode { .. } => (
                "Rename this executable as: appstoreopener-<package>-<executable>.exe\n\n\
                 Example: appstoreopener-spotify-spotify.exe"
                    .to_string(),
                Severity::Error,
            ),
            Error::Normalization { .. } => (
                "The package term in the filename must contain alphanumeric characters.\n\n\
                 Example: appstoreopener-abc-def1.exe"
                    .to_string(),
                Severity::Error,
            ),
            Error::NoPackage { .. } => (format!("{err}.{}", no_package_hint()), Severity::Warning),
            Error::NoExecutable { exe_term } => (
                format!(
                    "No executable matching '{exe_term}*{EXECUTABLE_SUFFIX}' found in the package directory."
                ),
                Severity::Warning,
            ),
            Error::Launch { path, source } => (
                format!("Failed to launch:\n{}\n\nError: {source}", path.display()),
                Severity::Error,
            ),
        };
        Self {
            title: TITLE,
            body,
            severity,
        }
    }

    /// The diagnostic listing: search parameters then every candidate in
    /// launch order.
    pub fn dry_run(identity: &Identity, term: &NormalizedTerm, candidates: &[Candidate]) -> Self {
        let mut body = format!(
            "Package: *{}* (normalized: *{term}*)\nExecutable search: {}*{EXECUTABLE_SUFFIX}\n\n",
            identity.package_term, identity.exe_term
        );

        if candidates.is_empty() {
            body.push_str("(no matching executables found)");
        } else if let Some(list) = candidate_list(candidates) {
            body.push_str(&list);
        } else {
            tracing::warn!(count = candidates.len(), "omitting candidate list from report");
        }

        Self {
            title: DRY_RUN_TITLE,
            body,
            severity: Severity::Info,
        }
    }
}

/// Numbered candidate lines, or `None` if the buffer cannot be allocated.
fn candidate_list(candidates: &[Candidate]) -> Option<String> {
    let estimate: usize = candidates
        .iter()
        .map(|c| c.path.as_os_str().len() + 8)
        .sum();

    let mut list = String::new();
    list.try_reserve(estimate).ok()?;
    for (i, candidate) in candidates.iter().enumerate() {
        let _ = writeln!(list, "{}. {}", i + 1, candidate.path.display());
    }
    Some(list)
}

#[cfg(target_os = "windows")]
fn no_package_hint() -> &'static str {
    "\n\nWas the app installed from the Microsoft Store (C:\\Program Files\\WindowsApps\\...)?"
}

#[cfg(not(target_os = "windows"))]
fn no_package_hint() -> &'static str {
    ""
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn identity() -> Identity {
        Identity {
            package_term: "Raindrop.io".into(),
            exe_term: "raindrop".into(),
        }
    }

    #[test]
    fn dry_run_lists_candidates_in_order() {
        let term = NormalizedTerm::new("Raindrop.io").unwrap();
        let candidates = vec![
            Candidate { path: PathBuf::from("/apps/raindrop-helper.exe") },
            Candidate { path: PathBuf::from("/apps/RaindropApp.exe") },
        ];

        let notice = Notice::dry_run(&identity(), &term, &candidates);
        assert_eq!(notice.title, DRY_RUN_TITLE);
        assert_eq!(notice.severity, Severity::Info);
        assert!(notice.body.starts_with("Package: *Raindrop.io* (normalized: *raindropio*)\n"));
        assert!(notice.body.contains("Executable search: raindrop*"));
        assert!(notice
            .body
            .ends_with("1. /apps/raindrop-helper.exe\n2. /apps/RaindropApp.exe\n"));
    }

    #[test]
    fn dry_run_without_candidates_says_so() {
        let term = NormalizedTerm::new("x").unwrap();
        let notice = Notice::dry_run(&identity(), &term, &[]);
        assert!(notice.body.ends_with("(no matching executables found)"));
    }

    #[test]
    fn decode_notice_shows_the_naming_convention() {
        let notice = Notice::from_error(&Error::Decode {
            filename: "launcher.exe".into(),
        });
        assert_eq!(notice.severity, Severity::Error);
        assert!(notice.body.contains("appstoreopener-<package>-<executable>"));
        assert!(notice.body.contains("appstoreopener-spotify-spotify.exe"));
    }

    #[test]
    fn no_package_notice_names_both_terms() {
        let notice = Notice::from_error(&Error::NoPackage {
            term: "Unknown.Pkg".into(),
            normalized: "unknownpkg".into(),
        });
        assert_eq!(notice.severity, Severity::Warning);
        assert!(notice
            .body
            .starts_with("No installed package found matching 'Unknown.Pkg' (normalized: 'unknownpkg')"));
    }

    #[test]
    fn launch_notice_carries_host_detail() {
        let notice = Notice::from_error(&Error::Launch {
            path: PathBuf::from("/apps/app.exe"),
            source: std::io::Error::new(std::io::ErrorKind::PermissionDenied, "access is denied"),
        });
        assert!(notice.body.contains("/apps/app.exe"));
        assert!(notice.body.contains("access is denied"));
    }
}
