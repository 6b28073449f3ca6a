//! maintainerd - CNCF maintainer registry and FOSSA onboarding.

use std::process::ExitCode;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use maintainerd::cli::{self, Cli};
use maintainerd::ui::output;

fn main() -> ExitCode {
    let cli = Cli::parse_args();

    // Logs go to stderr so `--json` output stays clean. RUST_LOG wins over
    // the flags.
    let default_filter = if cli.debug {
        "maintainerd=debug,info"
    } else if cli.quiet {
        "warn"
    } else {
        "info"
    };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter)))
        .init();

    match cli::run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            output::error(format!("{:#}", err));
            ExitCode::FAILURE
        }
    }
}
