//! ocirel CLI entry point

// CLI binary needs to output to stderr - this is intentional
#![allow(clippy::print_stderr)]

use ocirel::cli::{self, CliError, EXIT_FAILURE, EXIT_OK, render_error};
use ocirel::commands::{self, GlobalOptions};
use ocirel::tracing::init_tracing;

fn main() {
    // NOTE: eprintln! in the panic hook is intentional, the subscriber may be
    // unusable during a panic.
    std::panic::set_hook(Box::new(|panic_info| {
        eprintln!("Application panicked: {panic_info}");
        eprintln!("Internal error occurred. Run with RUST_LOG=debug for more information.");
    }));

    let cli = cli::parse();
    let json = cli.json;

    if let Err(e) = init_tracing(cli.tracing_config()) {
        eprintln!("{e:?}");
    }

    let exit_code = match run(cli) {
        Ok(()) => EXIT_OK,
        Err(err) => {
            tracing::error!(error = %err, "Command failed");
            render_error(err, json);
            EXIT_FAILURE
        }
    };
    std::process::exit(exit_code);
}

/// Run the command on a single-threaded runtime.
fn run(cli: cli::Cli) -> Result<(), CliError> {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(|source| CliError::Runtime { source })?;

    let options = GlobalOptions {
        insecure_registries: cli.insecure_registries,
    };
    runtime.block_on(commands::execute(cli.command, &options))
}
