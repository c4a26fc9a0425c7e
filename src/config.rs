use clap::Parser;
use std::ffi::OsString;
use std::time::Duration;

/// Most candidates collected across every install root of one run.
pub const MAX_RESULTS: usize = 16;

/// Deepest directory level below an install root that is still listed.
pub const MAX_SEARCH_DEPTH: usize = 16;

/// Longest path (in characters) accepted from the package query or the walk.
pub const MAX_PATH_CHARS: usize = 4096;

/// Hard limit on the package inventory query.
pub const QUERY_TIMEOUT: Duration = Duration::from_secs(30);

/// Captured query output is truncated past this many bytes.
pub const MAX_QUERY_OUTPUT_BYTES: usize = MAX_RESULTS * MAX_PATH_CHARS * 4;

/// Environment variable holding the `tracing` filter directive.
pub const LOG_ENV: &str = "APPSTOREOPENER_LOG";

const DRY_RUN_FLAG: &str = "--dry-run";

/// Bounds for the directory search, shared across all install roots.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SearchLimits {
    pub max_depth: usize,
    pub max_results: usize,
}

impl Default for SearchLimits {
    fn default() -> Self {
        Self {
            max_depth: MAX_SEARCH_DEPTH,
            max_results: MAX_RESULTS,
        }
    }
}

#[derive(Parser, Debug, Clone, Default, PartialEq, Eq)]
#[command(
    name = "appstoreopener",
    about = "Launches the packaged app named by this executable's filename",
    disable_help_flag = true,
    disable_version_flag = true
)]
pub struct Options {
    /// List the resolved search and every candidate instead of launching
    #[arg(long)]
    pub dry_run: bool,
}

impl Options {
    /// Builds options from a full argument vector (program name first).
    ///
    /// Only whole tokens equal to `--dry-run` are recognised; every other
    /// argument is dropped before parsing, so stray arguments never fail the
    /// run and a path that merely contains the flag text does not enable it.
    pub fn from_args<I, T>(args: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<OsString>,
    {
        let mut args = args.into_iter().map(Into::into);
        let program = args.next().unwrap_or_else(|| OsString::from("appstoreopener"));
        let recognised = args.filter(|arg| arg == DRY_RUN_FLAG).take(1);

        Options::try_parse_from(std::iter::once(program).chain(recognised)).unwrap_or_default()
    }
}
