//! drm-export - exports models and textures from Gex 2 PS1 `.drm` archives

use anyhow::Context;
use clap::Parser;
use drm_tools::archive::{Archive, ArchiveError};
use drm_tools::drm::DrmError;
use drm_tools::export::{self, ExportOutcome, ExportSelection, PngDirectory};
use std::path::PathBuf;
use std::process::ExitCode;

const EXIT_INPUT_NOT_FOUND: u8 = 3;
const EXIT_INPUT_FAILED_READ: u8 = 4;
const EXIT_OUTPUT_NOT_FOUND: u8 = 5;
const EXIT_INDEX_FAILED_PARSE: u8 = 6;
const EXIT_END_OF_STREAM: u8 = 7;

#[derive(Parser)]
#[command(name = "drm-export")]
#[command(about = "Export models and textures from Gex 2 PS1 .drm archives")]
#[command(version)]
struct Cli {
    /// Input .drm archive. The .vrm texture image is looked up next to it.
    input: PathBuf,

    /// Output directory; textures go to a folder named after the archive
    #[arg(short, long, default_value = ".")]
    out: PathBuf,

    /// Object to export: -1 for everything, 0 for the level geometry only
    #[arg(short, long, default_value_t = -1, allow_negative_numbers = true)]
    index: i64,

    /// List the objects in the archive instead of exporting
    #[arg(short, long)]
    list: bool,
}

#[derive(Debug, thiserror::Error)]
#[error("selected model index {0} is invalid")]
struct InvalidIndex(i64);

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    let cli = Cli::parse();

    match run(&cli) {
        Ok(outcome) => {
            match outcome {
                ExportOutcome::Success => tracing::info!("finished with no errors"),
                ExportOutcome::SomeTexturesFailed => tracing::error!("at least one texture failed to export"),
                ExportOutcome::SomeModelsFailed => tracing::error!("at least one model failed to export"),
                ExportOutcome::AllModelsFailed => tracing::error!("no models were exported successfully"),
            }
            ExitCode::from(outcome.exit_code())
        }
        Err(e) => {
            tracing::error!("{:#}", e);
            ExitCode::from(exit_code(&e))
        }
    }
}

fn run(cli: &Cli) -> anyhow::Result<ExportOutcome> {
    let selection = ExportSelection::from_index(cli.index).ok_or(InvalidIndex(cli.index))?;

    if !cli.list && !cli.out.is_dir() {
        return Err(DrmError::OutputDirectoryUnavailable(cli.out.clone()).into());
    }

    let archive = Archive::open(&cli.input)
        .with_context(|| format!("failed to open {}", cli.input.display()))?;
    tracing::info!("reading from {}", cli.input.display());

    if cli.list {
        for (index, name) in export::list_objects(&archive.drm)? {
            println!("{}: {}", index, name);
        }
        return Ok(ExportOutcome::Success);
    }

    let mut sink = PngDirectory::create(&drm_tools::output_dir(&cli.out, &cli.input))?;
    let report = export::export_archive(&archive.drm, &archive.vram, selection, &mut sink)?;

    tracing::info!(
        "exported {} models, {} models failed, {} textures failed",
        report.models.len(),
        report.model_failures.len(),
        report.texture_failures.len()
    );
    Ok(report.outcome())
}

fn exit_code(e: &anyhow::Error) -> u8 {
    if e.downcast_ref::<InvalidIndex>().is_some() {
        return EXIT_INDEX_FAILED_PARSE;
    }
    match e.downcast_ref::<ArchiveError>() {
        Some(ArchiveError::FileNotFound(_)) => return EXIT_INPUT_NOT_FOUND,
        Some(_) => return EXIT_INPUT_FAILED_READ,
        None => {}
    }
    match e.downcast_ref::<DrmError>() {
        Some(DrmError::OutputDirectoryUnavailable(_)) => EXIT_OUTPUT_NOT_FOUND,
        _ => EXIT_END_OF_STREAM,
    }
}
