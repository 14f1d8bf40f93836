//! Entry point for the command-line interface.
#![forbid(unsafe_code)]

use tracing_subscriber::EnvFilter;

fn main() {
    init_logging();
    if let Err(err) = dispatch_cli::run() {
        eprintln!("dispatch: {err}");
        std::process::exit(1);
    }
}

/// Route `log` records through a `tracing` fmt subscriber on stderr.
///
/// `RUST_LOG` selects the filter; without it only `info` and above show.
fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    // A subscriber installed by an embedding process wins.
    if tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init()
        .is_err()
    {
        log::debug!("global subscriber already installed");
    }
}
