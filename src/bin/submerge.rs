// this file contains the CLI binary for submerge

use anyhow::Result;
use clap::{ArgAction, Parser, ValueEnum};
use std::{path::PathBuf, process::ExitCode};
use submerge::core::{
    batch::{run_directory, run_single},
    data::VideoFile,
    error::is_interrupted,
    interrupt::Interrupt,
    lifecycle::{Lifecycle, ReplaceStrategy},
    log::{initialize_logging, level_from_flags},
    mp4box::{Mp4Box, DEFAULT_PROGRAM},
};

/// Merges the .srt subtitle files found next to an MP4 video into the video itself.
#[derive(Parser)]
#[clap(author, version, about, long_about = None)]
struct Cli {
    /// The input mp4 file that should be processed
    #[clap(short, long)]
    input: PathBuf,

    /// Applies the action to all MP4 files in the same directory as the file selected
    #[clap(short, long)]
    dir: bool,

    /// The MP4Box executable to run
    #[clap(long, env = "SUBMERGE_MUXER", default_value = DEFAULT_PROGRAM)]
    muxer: String,

    /// How the merged video replaces the original
    #[clap(long, value_enum, default_value_t = Replace::Atomic)]
    replace: Replace,

    /// More output, repeat for even more
    #[clap(short, long, action = ArgAction::Count)]
    verbose: u8,

    /// Only show warnings and errors
    #[clap(short, long, conflicts_with = "verbose")]
    quiet: bool,
}

#[derive(Clone, Copy, ValueEnum)]
enum Replace {
    /// rename the merged file over the original in one step
    Atomic,
    /// move the original aside as <name>.orig first, then delete it
    Staged,
}

impl From<Replace> for ReplaceStrategy {
    fn from(replace: Replace) -> Self {
        match replace {
            Replace::Atomic => ReplaceStrategy::Atomic,
            Replace::Staged => ReplaceStrategy::Staged,
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    if let Err(err) = initialize_logging(level_from_flags(cli.verbose, cli.quiet)) {
        eprintln!("{err:#}");
    }

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) if is_interrupted(&err) => {
            log::error!("{err:#}");
            ExitCode::from(130)
        }
        Err(err) => {
            log::error!("{err:#}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<()> {
    // rejects anything but .mp4 before touching the disk
    let video = VideoFile::new(&cli.input)?;
    let muxer = Mp4Box::new(cli.muxer).with_interrupt(Interrupt::ctrl_c()?);
    let lifecycle = Lifecycle::new(muxer).with_replace(cli.replace.into());

    if !cli.dir {
        run_single(&lifecycle, &video).await?;
        return Ok(());
    }

    let summary = run_directory(&lifecycle, video.working_dir()).await?;
    log::info!(
        "{0} videos processed, {1} subtitle files merged",
        summary.processed.len(),
        summary.merged()
    );
    if !summary.failed.is_empty() {
        log::warn!("{0} videos could not be processed", summary.failed.len());
    }
    Ok(())
}
