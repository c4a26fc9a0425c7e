use crate::config::{SearchLimits, MAX_PATH_CHARS};
use std::path::{Path, PathBuf};
use walkdir::{DirEntry, WalkDir};

/// An executable found under an install root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    pub path: PathBuf,
}

/// Accumulates candidates across every install root of one run.
///
/// The result cap is shared by all roots: once it is reached no further
/// directory, sibling or root is visited.
#[derive(Debug)]
pub struct SearchContext {
    exe_term_lower: String,
    limits: SearchLimits,
    matches: Vec<Candidate>,
}

impl SearchContext {
    pub fn new(exe_term: &str, limits: SearchLimits) -> Self {
        Self {
            exe_term_lower: exe_term.to_lowercase(),
            limits,
            matches: Vec::with_capacity(limits.max_results),
        }
    }

    pub fn is_full(&self) -> bool {
        self.matches.len() >= self.limits.max_results
    }

    /// Walks `root` collecting executables whose name starts with the term.
    ///
    /// Unreadable or vanished entries are skipped.
    pub fn search(&mut self, root: &Path) {
        if self.is_full() {
            return;
        }
        tracing::debug!(root = %root.display(), "searching install root");

        // Directories down to `max_depth` levels are listed, so their files sit
        // one level deeper.
        let walker = WalkDir::new(extended_path(root))
            .min_depth(1)
            .max_depth(self.limits.max_depth + 1)
            .follow_links(false)
            .sort_by_file_name();

        for entry in walker {
            if self.is_full() {
                tracing::debug!(limit = self.limits.max_results, "candidate limit reached");
                break;
            }
            let entry = match entry {
                Ok(entry) => entry,
                Err(err) => {
                    tracing::trace!(error = %err, "skipping unreadable entry");
                    continue;
                }
            };
            if entry.file_type().is_dir() || !self.is_match(&entry) {
                continue;
            }

            let path = conventional_path(entry.path());
            if path.as_os_str().len() >= MAX_PATH_CHARS {
                tracing::trace!(path = %path.display(), "skipping overlong candidate path");
                continue;
            }
            tracing::debug!(path = %path.display(), "candidate found");
            self.matches.push(Candidate { path });
        }
    }

    fn is_match(&self, entry: &DirEntry) -> bool {
        let name = entry.file_name().to_string_lossy().to_lowercase();
        name.starts_with(&self.exe_term_lower) && is_executable(entry)
    }

    /// Candidates ordered case-insensitively by path; the first one wins.
    pub fn into_sorted(self) -> Vec<Candidate> {
        let mut matches = self.matches;
        matches.sort_by_cached_key(|c| c.path.to_string_lossy().to_lowercase());
        matches
    }
}

/// Searches every root in order with one shared context.
pub fn search_roots(roots: &[PathBuf], exe_term: &str, limits: SearchLimits) -> Vec<Candidate> {
    let mut ctx = SearchContext::new(exe_term, limits);
    for root in roots {
        if ctx.is_full() {
            break;
        }
        ctx.search(root);
    }
    ctx.into_sorted()
}

/// Extension a file needs to count as an executable, shown in notices.
#[cfg(windows)]
pub const EXECUTABLE_SUFFIX: &str = ".exe";
#[cfg(not(windows))]
pub const EXECUTABLE_SUFFIX: &str = "";

#[cfg(windows)]
fn is_executable(entry: &DirEntry) -> bool {
    entry
        .path()
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("exe"))
}

#[cfg(unix)]
fn is_executable(entry: &DirEntry) -> bool {
    use std::os::unix::fs::PermissionsExt;

    // Follows symlinks so linked binaries count as the file they point to.
    std::fs::metadata(entry.path())
        .is_ok_and(|meta| meta.is_file() && meta.permissions().mode() & 0o111 != 0)
}

#[cfg(not(any(windows, unix)))]
fn is_executable(entry: &DirEntry) -> bool {
    entry.file_type().is_file()
}

#[cfg(windows)]
fn extended_path(path: &Path) -> PathBuf {
    path.to_str()
        .map(|s| PathBuf::from(to_extended(s)))
        .unwrap_or_else(|| path.to_path_buf())
}

#[cfg(not(windows))]
fn extended_path(path: &Path) -> PathBuf {
    path.to_path_buf()
}

#[cfg(windows)]
fn conventional_path(path: &Path) -> PathBuf {
    path.to_str()
        .map(|s| PathBuf::from(to_conventional(s)))
        .unwrap_or_else(|| path.to_path_buf())
}

#[cfg(not(windows))]
fn conventional_path(path: &Path) -> PathBuf {
    path.to_path_buf()
}

const VERBATIM_PREFIX: &str = r"\\?\";
const VERBATIM_UNC_PREFIX: &str = r"\\?\UNC\";

/// Rewrites a Windows path into `\\?\` form so walks are not limited by
/// `MAX_PATH`. Relative paths are left untouched.
#[cfg_attr(not(windows), allow(dead_code))]
fn to_extended(path: &str) -> String {
    if path.starts_with(VERBATIM_PREFIX) {
        path.to_string()
    } else if let Some(share) = path.strip_prefix(r"\\") {
        format!("{VERBATIM_UNC_PREFIX}{share}")
    } else if path.as_bytes().get(1) == Some(&b':') && path.len() > 2 {
        format!("{VERBATIM_PREFIX}{}", path.replace('/', r"\"))
    } else {
        path.to_string()
    }
}

/// Inverse of [`to_extended`]: the form the shell accepts for launching.
#[cfg_attr(not(windows), allow(dead_code))]
fn to_conventional(path: &str) -> String {
    if let Some(share) = path.strip_prefix(VERBATIM_UNC_PREFIX) {
        format!(r"\\{share}")
    } else if let Some(local) = path.strip_prefix(VERBATIM_PREFIX) {
        local.to_string()
    } else {
        path.to_string()
    }
}
