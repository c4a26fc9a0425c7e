use crate::config::{MAX_PATH_CHARS, MAX_QUERY_OUTPUT_BYTES, QUERY_TIMEOUT};
use crate::normalize::NormalizedTerm;
use crate::runner::{run_with_timeout, QueryOutcome};
use std::path::PathBuf;
use std::process::Command;
use std::time::Duration;

/// Finds install roots of installed packages whose normalized name contains
/// the search term.
///
/// An empty result covers every kind of miss: nothing installed, a failed or
/// timed out query, or output that could not be decoded.
pub trait PackageLocator {
    fn locate(&self, term: &NormalizedTerm) -> Vec<PathBuf>;
}

/// Queries the host's package inventory through a single external command.
#[derive(Debug, Clone)]
pub struct InventoryLocator {
    timeout: Duration,
}

impl Default for InventoryLocator {
    fn default() -> Self {
        Self {
            timeout: QUERY_TIMEOUT,
        }
    }
}

impl InventoryLocator {
    pub fn with_timeout(timeout: Duration) -> Self {
        Self { timeout }
    }
}

impl PackageLocator for InventoryLocator {
    fn locate(&self, term: &NormalizedTerm) -> Vec<PathBuf> {
        let Some(command) = inventory_query(term) else {
            tracing::debug!("no package inventory on this platform");
            return Vec::new();
        };

        match run_with_timeout(command, self.timeout, MAX_QUERY_OUTPUT_BYTES) {
            Ok(QueryOutcome::Output(text)) => {
                let roots = parse_install_roots(&text);
                tracing::debug!(term = %term, roots = roots.len(), "package query finished");
                roots
            }
            Ok(QueryOutcome::NoOutput) => {
                tracing::debug!(term = %term, "package query printed nothing");
                Vec::new()
            }
            Ok(QueryOutcome::TimedOut) => {
                tracing::warn!(term = %term, timeout = ?self.timeout, "package query timed out");
                Vec::new()
            }
            Err(err) => {
                tracing::warn!(error = %err, "failed to start package query");
                Vec::new()
            }
        }
    }
}

/// Splits query output into install roots, one per non-blank line.
pub fn parse_install_roots(text: &str) -> Vec<PathBuf> {
    text.split('\n')
        .map(str::trim_end)
        .filter(|line| !line.is_empty())
        .filter(|line| {
            let fits = line.chars().count() < MAX_PATH_CHARS;
            if !fits {
                tracing::debug!("skipping overlong install root");
            }
            fits
        })
        .map(PathBuf::from)
        .collect()
}

#[cfg(target_os = "windows")]
fn inventory_query(term: &NormalizedTerm) -> Option<Command> {
    use std::os::windows::process::CommandExt;
    const CREATE_NO_WINDOW: u32 = 0x0800_0000;

    let script = format!(
        "[Console]::OutputEncoding=[System.Text.Encoding]::UTF8; \
         (Get-AppxPackage | Where-Object {{ \
         ($_.Name -replace '[^a-zA-Z0-9]','') -like '*{term}*' \
         }}).InstallLocation"
    );
    let mut command = Command::new("powershell.exe");
    command
        .args(["-NoProfile", "-NonInteractive", "-Command", &script])
        .creation_flags(CREATE_NO_WINDOW);
    Some(command)
}

#[cfg(target_os = "linux")]
fn inventory_query(term: &NormalizedTerm) -> Option<Command> {
    let script = format!(
        "flatpak list --app --columns=application,name 2>/dev/null | \
         while IFS=\"$(printf '\\t')\" read -r id name; do \
         n=$(printf '%s' \"$name\" | tr -cd '[:alnum:]' | tr '[:upper:]' '[:lower:]'); \
         case \"$n\" in *{term}*) flatpak info --show-location \"$id\" 2>/dev/null;; esac; \
         done"
    );
    let mut command = Command::new("sh");
    command.args(["-c", &script]).env("LC_ALL", "C");
    Some(command)
}

#[cfg(not(any(target_os = "windows", target_os = "linux")))]
fn inventory_query(_: &NormalizedTerm) -> Option<Command> {
    None
}
