#![forbid(unsafe_code)]

//! Downloads every entry of a playlist (audio as mp3 plus thumbnail) into
//! `{output}/{playlist title}/` and merges their metadata into the
//! directory's metadata file. Entries already recorded are skipped.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use youtube2wordpress::SyncError;
use youtube2wordpress::extractor::YtDlp;
use youtube2wordpress::logging::setup_logger;
use youtube2wordpress::metadata::DEFAULT_METADATA_FILE;
use youtube2wordpress::sync::{SyncContext, SyncSummary, sync_playlist};
use youtube2wordpress::thumbnail::ThumbnailDownloader;

#[derive(Debug, Parser)]
#[command(about = "Download a playlist's audio, thumbnails and metadata")]
struct Args {
    /// Playlist URL or ID.
    playlist: String,

    /// Root directory for downloaded playlists.
    #[arg(short = 'o', long, default_value = "data")]
    output_dir: PathBuf,

    /// Metadata file name inside the playlist directory.
    #[arg(long, default_value = DEFAULT_METADATA_FILE)]
    metadata_file: String,

    /// Netscape cookies file passed to yt-dlp.
    #[arg(long)]
    cookies_file: Option<PathBuf>,

    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn main() -> Result<()> {
    let args = Args::parse();
    setup_logger(args.verbose);

    if let Some(cookies) = &args.cookies_file
        && !cookies.is_file()
    {
        return Err(SyncError::not_found("Cookies file", cookies).into());
    }

    let extractor = YtDlp::new(args.cookies_file.clone());
    extractor.ensure_available()?;
    let thumbnails = ThumbnailDownloader::default();
    let ctx = SyncContext {
        extractor: &extractor,
        thumbnails: &thumbnails,
    };

    println!("Resolving playlist {}", args.playlist);
    let summary = sync_playlist(&ctx, &args.playlist, &args.output_dir, &args.metadata_file)
        .with_context(|| format!("syncing playlist {}", args.playlist))?;

    print_summary(&summary);
    Ok(())
}

fn print_summary(summary: &SyncSummary) {
    let report = &summary.report;
    println!();
    println!("Done: {}", summary.target_dir.display());
    println!("  Added: {}", report.added);
    println!("  Already present: {}", report.already_present);
    if report.incomplete > 0 {
        println!("  Recorded but missing media: {}", report.incomplete);
    }
    println!("  Skipped: {}", report.skipped);
    println!("  Failed: {}", report.failed);
    if summary.saved {
        println!("Metadata saved to {}", summary.metadata_path.display());
    } else {
        println!("No new entries; {} left unchanged", summary.metadata_path.display());
    }
}
