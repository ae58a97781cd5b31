//! sizescope: find out where the disk space went.
//!
//! Thin binary entry point. All logic lives in the `sizescope-core`
//! and `sizescope-cli` crates.

use clap::Parser;

fn main() -> anyhow::Result<()> {
    let args = sizescope_cli::Args::parse();

    let level = if args.verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .init();

    tracing::info!("sizescope starting");
    sizescope_cli::run(args)
}
