use tracing::info;
use tracing_subscriber::fmt;
use tracing_subscriber::EnvFilter;

/// Filter used when `RUST_LOG` is not set
fn default_filter(verbose: bool) -> &'static str {
    if verbose {
        "tabq=debug"
    } else {
        "tabq=info"
    }
}

/// Initialize logging to stderr
///
/// `RUST_LOG` takes precedence over `verbose`. Returns false when a global
/// subscriber was already installed, in which case nothing changes.
pub fn init_logging(verbose: bool, ansi_colors: bool) -> bool {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_filter(verbose)));

    let installed = fmt::Subscriber::builder()
        .with_ansi(ansi_colors)
        .with_writer(std::io::stderr)
        .with_env_filter(filter)
        .with_target(verbose)
        .try_init()
        .is_ok();

    if installed {
        info!("Initializing tabq v{}", crate::version());
    }
    installed
}
