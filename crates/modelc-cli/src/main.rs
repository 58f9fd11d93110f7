//! modelc command-line tool
//!
//! Resolves a directory of model files and inspects the result.

mod args;
mod executor;
mod formatter;

use args::Args;
use clap::Parser;
use modelc_core::{DirectorySources, ModelStore};
use std::sync::Arc;

fn main() {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "modelc=info".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    let formatter = formatter::create_formatter(args.format);

    match run(args, &*formatter) {
        Ok(true) => {}
        Ok(false) => std::process::exit(1),
        Err(e) => {
            eprintln!("{}", formatter.format_error(&e.to_string()));
            std::process::exit(1);
        }
    }
}

/// Run the command. Returns whether it succeeded.
fn run(args: Args, formatter: &dyn formatter::Formatter) -> Result<bool, executor::CliError> {
    let config = args.settings.into_config()?;
    tracing::debug!(
        root = %args.root.display(),
        app = config.app_name(),
        "configuration loaded"
    );

    let sources = Arc::new(DirectorySources::new(&args.root));
    let store = ModelStore::new(sources, config)?;

    let output = executor::execute(&store, &args.command, formatter)?;
    println!("{}", output.text);
    Ok(output.success)
}
