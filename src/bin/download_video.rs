#![forbid(unsafe_code)]

//! Downloads a single video into `{output}/{category}/`, reusing the same
//! per-item pipeline and metadata file as the playlist downloader.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use youtube2wordpress::SyncError;
use youtube2wordpress::extractor::YtDlp;
use youtube2wordpress::logging::setup_logger;
use youtube2wordpress::metadata::DEFAULT_METADATA_FILE;
use youtube2wordpress::sync::{SyncContext, sync_single_video};
use youtube2wordpress::thumbnail::ThumbnailDownloader;

#[derive(Debug, Parser)]
#[command(about = "Download one video's audio, thumbnail and metadata into a category")]
struct Args {
    /// Video URL.
    video_url: String,

    /// Category (directory) name to store the video under.
    playlist_name: String,

    #[arg(short = 'o', long, default_value = "data")]
    output_dir: PathBuf,

    #[arg(long, default_value = DEFAULT_METADATA_FILE)]
    metadata_file: String,

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

    let summary = sync_single_video(
        &ctx,
        &args.video_url,
        &args.playlist_name,
        &args.output_dir,
        &args.metadata_file,
    )
    .with_context(|| format!("downloading {}", args.video_url))?;

    let report = &summary.report;
    println!();
    if report.added > 0 {
        println!("Saved to {}", summary.target_dir.display());
        println!("Metadata updated: {}", summary.metadata_path.display());
    } else if report.already_present > 0 {
        println!("Video already downloaded in {}", summary.target_dir.display());
    } else if report.incomplete > 0 {
        println!(
            "Video is recorded in {} but its media files are missing",
            summary.metadata_path.display()
        );
    } else {
        println!("Video could not be downloaded; see errors above");
    }
    Ok(())
}
