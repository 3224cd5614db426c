mod cli;
mod commands;
mod config;
mod error;
mod ffmetadata;
mod libby;
mod mux;
mod naming;
mod pipeline;
mod source;
mod timeline;

use anyhow::Result;
use clap::Parser;
use cli::{Cli, Commands};
use tracing::Level;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose, cli.quiet);

    match cli.command {
        Commands::Convert {
            book_dir,
            output_dir,
            recursive,
            format,
            dry_run,
            skip_existing,
            no_cover,
        } => {
            commands::convert::run(
                &book_dir,
                output_dir.as_deref(),
                format.as_deref(),
                commands::convert::ConvertOptions {
                    recursive,
                    dry_run,
                    skip_existing,
                    no_cover,
                },
                cli.quiet,
            )?;
        }
        Commands::Job {
            job_file,
            dest,
            format,
            no_cover,
        } => {
            commands::job::run(
                &job_file,
                dest.as_deref(),
                format.as_deref(),
                no_cover,
                cli.quiet,
            )?;
        }
        Commands::Chapters {
            path,
            json,
            ffmetadata,
        } => {
            commands::chapters::run(&path, json, ffmetadata)?;
        }
        Commands::Fields => {
            commands::fields::run()?;
        }
    }

    Ok(())
}

/// Diagnostics go to stderr so `--json` and `--ffmetadata` output stays clean
fn init_logging(verbose: bool, quiet: bool) {
    let level = if verbose {
        Level::DEBUG
    } else if quiet {
        Level::WARN
    } else {
        Level::INFO
    };

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(level.to_string().to_lowercase()));

    FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .compact()
        .init();
}
