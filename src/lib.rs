//! A self-identifying launcher.
//!
//! One binary is installed under many names such as
//! `appstoreopener-spotify-spotify.exe`. Each copy decodes its own filename,
//! asks the host package inventory where the named package lives, searches
//! that directory for the executable and starts it.

pub mod config;
pub mod error;
pub mod identity;
pub mod launcher;
pub mod locator;
pub mod normalize;
pub mod report;
pub mod runner;
pub mod search;

use crate::config::{Options, SearchLimits};
use crate::error::{Error, Result};
use crate::identity::Identity;
use crate::launcher::ProcessLauncher;
use crate::locator::PackageLocator;
use crate::normalize::NormalizedTerm;
use crate::report::Notice;
use crate::search::search_roots;
use std::path::PathBuf;

/// How a successful run ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// The selected executable was handed to the host to start.
    Launched(PathBuf),
    /// Diagnostic mode: nothing was started.
    Listed(Notice),
}

/// Resolves `identity` to an executable and launches it, or lists the
/// candidates when `options.dry_run` is set.
pub fn open_app<L, P>(
    identity: &Identity,
    options: &Options,
    locator: &L,
    launcher: &P,
    limits: SearchLimits,
) -> Result<Outcome>
where
    L: PackageLocator + ?Sized,
    P: ProcessLauncher + ?Sized,
{
    let term = NormalizedTerm::new(&identity.package_term)?;
    tracing::debug!(
        package = %identity.package_term,
        normalized = %term,
        exe = %identity.exe_term,
        "resolving package"
    );

    let roots = locator.locate(&term);
    if roots.is_empty() {
        return Err(Error::NoPackage {
            term: identity.package_term.clone(),
            normalized: term.to_string(),
        });
    }

    let candidates = search_roots(&roots, &identity.exe_term, limits);
    tracing::debug!(count = candidates.len(), "search finished");

    if options.dry_run {
        return Ok(Outcome::Listed(Notice::dry_run(identity, &term, &candidates)));
    }

    let Some(first) = candidates.into_iter().next() else {
        return Err(Error::NoExecutable {
            exe_term: identity.exe_term.clone(),
        });
    };

    launcher
        .launch(&first.path)
        .map_err(|source| Error::Launch {
            path: first.path.clone(),
            source,
        })?;
    Ok(Outcome::Launched(first.path))
}
