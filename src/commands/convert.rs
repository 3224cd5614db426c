use anyhow::{bail, Context, Result};
use colored::Colorize;
use std::path::{Path, PathBuf};
use tracing::error;

use super::{output_path, print_event, print_outcome};
use crate::commands::chapters::print_table;
use crate::config::Config;
use crate::naming::{FormatTemplate, NamingFields};
use crate::pipeline::{ConversionJob, Converter, CoverSource, PreparedBook};
use crate::source::{find_book_dirs, load_book_dir};

/// Switches for the convert command
#[derive(Debug, Clone, Copy, Default)]
pub struct ConvertOptions {
    pub recursive: bool,
    pub dry_run: bool,
    pub skip_existing: bool,
    pub no_cover: bool,
}

/// Run the convert command
pub fn run(
    book_dir: &Path,
    dest_override: Option<&Path>,
    format_override: Option<&str>,
    options: ConvertOptions,
    quiet: bool,
) -> Result<()> {
    let config = Config::load().context("Failed to load config")?;
    let dest = config.dest(dest_override);
    let template =
        FormatTemplate::parse(&config.format(format_override)).context("Failed to parse format string")?;

    if !book_dir.exists() {
        bail!("Book folder does not exist: {:?}", book_dir);
    }

    let book_dirs = if options.recursive {
        let found = find_book_dirs(book_dir);
        if found.is_empty() {
            println!("No book folders found in {:?}", book_dir);
            return Ok(());
        }
        if !quiet {
            println!("Found {} book folder(s)", found.len());
        }
        found
    } else {
        vec![book_dir.to_path_buf()]
    };

    let converter = Converter::new(&config);
    let mut failed: Vec<PathBuf> = Vec::new();

    for dir in &book_dirs {
        let result = convert_one(dir, &dest, &template, &converter, options, quiet);
        match result {
            Ok(()) => {}
            Err(e) if options.recursive => {
                error!("{:?}: {:#}", dir, e);
                failed.push(dir.clone());
            }
            Err(e) => return Err(e),
        }
    }

    if !failed.is_empty() {
        eprintln!();
        eprintln!(
            "{}: {} of {} book(s) failed",
            "Error".red().bold(),
            failed.len(),
            book_dirs.len()
        );
        for dir in &failed {
            eprintln!("  {}", dir.display());
        }
        bail!("Some books could not be converted");
    }

    if options.dry_run {
        println!();
        println!("{}", "Dry run - ffmpeg was not run.".yellow());
    }

    Ok(())
}

fn convert_one(
    dir: &Path,
    dest: &Path,
    template: &FormatTemplate,
    converter: &Converter,
    options: ConvertOptions,
    quiet: bool,
) -> Result<()> {
    let book = load_book_dir(dir)?;
    let prepared = PreparedBook::from_metadata(&book.metadata)
        .with_context(|| format!("Cannot build chapters for {:?}", book.dir))?;

    let fields = NamingFields::from_book(&prepared.book, book.folder_name().as_deref());
    let output = output_path(dest, template, &fields)?;

    if options.skip_existing && output.exists() {
        if !quiet {
            println!("{} {} (already exists)", "Skipping".yellow(), output.display());
        }
        return Ok(());
    }

    let cover = if options.no_cover {
        None
    } else {
        CoverSource::pick(book.cover.clone(), &prepared.book)
    };

    let job = ConversionJob {
        prepared,
        parts: book.parts,
        cover,
    };

    if !quiet {
        println!("{} {}", "Book:".bold(), fields.title);
    }

    if options.dry_run {
        println!("  {} {}", "Output:".cyan(), output.display());
        println!("  {} {} part(s)", "Parts:".cyan(), job.parts.len());
        print_table(&job.prepared.timeline);
        println!("  {} {}", "Command:".cyan(), converter.plan(&job, &output).display_command());
        return Ok(());
    }

    let outcome = converter.convert(&job, &output, |event| print_event(&event, quiet))?;
    print_outcome(&outcome);

    Ok(())
}
