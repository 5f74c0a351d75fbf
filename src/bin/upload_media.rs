#![forbid(unsafe_code)]

//! Uploads the audio and thumbnail of every record in a directory's metadata
//! file to the WordPress media library, then sets each attachment's title
//! (and alt text for thumbnails).

use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use clap::Parser;
use youtube2wordpress::SyncError;
use youtube2wordpress::config::{CredentialOverrides, locate_env_file, resolve_wordpress_config};
use youtube2wordpress::logging::setup_logger;
use youtube2wordpress::metadata::{DEFAULT_METADATA_FILE, MetadataStore};
use youtube2wordpress::upload::{MissingMode, collect_media_targets, upload_targets};
use youtube2wordpress::wordpress::WordPressClient;

#[derive(Debug, Parser)]
#[command(about = "Upload downloaded audio and thumbnails to the WordPress media library")]
struct Args {
    /// Directory with the media files and metadata.
    source: PathBuf,

    /// Metadata file, relative to the source directory unless absolute.
    #[arg(long, default_value = DEFAULT_METADATA_FILE)]
    metadata_file: PathBuf,

    /// Site URL (overrides WP_BASE_URL).
    #[arg(long)]
    site: Option<String>,

    /// User name (overrides WP_USERNAME).
    #[arg(long)]
    username: Option<String>,

    /// Application password (overrides WP_APP_PASSWORD).
    #[arg(long)]
    app_password: Option<String>,

    /// Credentials file. Without it .env, then wp.env, are tried.
    #[arg(long)]
    env_file: Option<PathBuf>,

    /// List what would be uploaded without contacting WordPress.
    #[arg(long)]
    dry_run: bool,

    /// Skip records missing audio or thumbnail instead of aborting.
    #[arg(long)]
    skip_missing: bool,

    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn main() -> Result<()> {
    let args = Args::parse();
    setup_logger(args.verbose);

    if !args.source.is_dir() {
        return Err(SyncError::not_found("Source directory", &args.source).into());
    }
    let metadata_path = if args.metadata_file.is_absolute() {
        args.metadata_file.clone()
    } else {
        args.source.join(&args.metadata_file)
    };

    let store = MetadataStore::load(&metadata_path)?;
    if store.is_empty() {
        bail!("No usable records in {}", metadata_path.display());
    }

    let mode = if args.skip_missing {
        MissingMode::Skip
    } else {
        MissingMode::Strict
    };
    let (targets, skipped) = collect_media_targets(&args.source, store.records(), mode)?;

    if args.dry_run {
        for target in &targets {
            println!(
                "[dry-run] {} ({}, {})",
                target.path.display(),
                target.kind,
                target.mime_type
            );
        }
        println!();
        println!("Would upload {} files; {skipped} records skipped", targets.len());
        return Ok(());
    }

    let env_file = locate_env_file(args.env_file.as_deref())?;
    let config = resolve_wordpress_config(
        env_file.as_deref(),
        CredentialOverrides {
            base_url: args.site.clone(),
            username: args.username.clone(),
            app_password: args.app_password.clone(),
        },
    )
    .context("loading WordPress credentials")?;
    let client = WordPressClient::new(&config);

    println!("Uploading {} files to {}", targets.len(), config.base_url);
    let mut summary = upload_targets(&client, &targets);
    summary.skipped = skipped;

    println!();
    println!(
        "Uploaded: {}, failed: {}, skipped records: {}",
        summary.succeeded, summary.failed, summary.skipped
    );
    Ok(())
}
