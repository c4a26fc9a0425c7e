use anyhow::{anyhow, Context, Result};
use appstoreopener::config::{Options, SearchLimits, LOG_ENV};
use appstoreopener::identity::Identity;
use appstoreopener::launcher::ShellLauncher;
use appstoreopener::locator::InventoryLocator;
use appstoreopener::report::Notice;
use appstoreopener::{open_app, Outcome};
use tracing_subscriber::EnvFilter;

fn main() -> Result<()> {
    init_logging().context("Failed to set up logging")?;
    let options = Options::from_args(std::env::args_os());

    let result = Identity::from_current_exe().and_then(|identity| {
        open_app(
            &identity,
            &options,
            &InventoryLocator::default(),
            &ShellLauncher,
            SearchLimits::default(),
        )
    });

    match result {
        Ok(Outcome::Launched(path)) => {
            tracing::info!(path = %path.display(), "launched");
        }
        Ok(Outcome::Listed(notice)) => notice.show(),
        Err(e) => {
            Notice::from_error(&e).show();
            std::process::exit(e.exit_code());
        }
    }

    Ok(())
}

fn init_logging() -> Result<()> {
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|e| anyhow!(e))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn second_logging_setup_is_reported() {
        let _ = init_logging();
        let err = init_logging()
            .context("Failed to set up logging")
            .unwrap_err();
        assert_eq!(err.to_string(), "Failed to set up logging");
    }
}
