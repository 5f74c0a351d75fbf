#![forbid(unsafe_code)]

//! Publishes one post per metadata record. Every directory below the data
//! root that holds a metadata file is treated as a category named after the
//! directory.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Parser;
use walkdir::WalkDir;
use youtube2wordpress::config::{
    CredentialOverrides, DEFAULT_UPLOADS_PATH, locate_env_file, resolve_wordpress_config,
};
use youtube2wordpress::layout::{audio_path, thumbnail_path};
use youtube2wordpress::logging::setup_logger;
use youtube2wordpress::metadata::{DEFAULT_METADATA_FILE, MetadataStore};
use youtube2wordpress::post::DEFAULT_SKIP;
use youtube2wordpress::publish::{PostOptions, PostTally, publish_directory};
use youtube2wordpress::wordpress::{PostStatus, WordPressClient};

#[derive(Debug, Parser)]
#[command(about = "Create WordPress posts from downloaded playlist metadata")]
struct Args {
    /// Directory holding one sub-directory per category.
    #[arg(long, default_value = "data")]
    data_root: PathBuf,

    #[arg(long, default_value = DEFAULT_METADATA_FILE)]
    metadata_file: String,

    /// Credentials file; falls back to wp.env when missing.
    #[arg(long, default_value = ".env")]
    env_file: PathBuf,

    /// Uploads path relative to the site, used to build media URLs.
    /// Defaults to WP_UPLOADS_PATH, then the built-in path.
    #[arg(long)]
    uploads_path: Option<String>,

    #[arg(long, value_enum, default_value_t = PostStatus::Draft)]
    status: PostStatus,

    /// Only process these category directories (repeatable).
    #[arg(long = "category")]
    categories: Vec<String>,

    /// Seconds skipped at the start of playback.
    #[arg(long, default_value_t = DEFAULT_SKIP)]
    skip: u32,

    /// Print what would be posted without contacting WordPress.
    #[arg(long)]
    dry_run: bool,

    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn main() -> Result<()> {
    let args = Args::parse();
    setup_logger(args.verbose);

    if !args.data_root.is_dir() {
        anyhow::bail!("Data root not found: {}", args.data_root.display());
    }

    let directories = category_directories(&args.data_root, &args.metadata_file, &args.categories)?;
    if directories.is_empty() {
        println!(
            "No category directories with {} under {}",
            args.metadata_file,
            args.data_root.display()
        );
        return Ok(());
    }

    // Dry runs never touch the network, so they need no credentials.
    let mut publisher = if args.dry_run {
        None
    } else {
        Some(connect(&args)?)
    };
    let mut tally = PostTally::default();

    for dir in &directories {
        let category = dir_name(dir);
        println!();
        println!("Category: {category}");

        let store = match MetadataStore::load(&dir.join(&args.metadata_file)) {
            Ok(store) => store,
            Err(err) => {
                log::error!("Skipping {category}: {err}");
                tally.skipped_dirs += 1;
                continue;
            }
        };

        let Some((client, options)) = publisher.as_mut() else {
            preview(dir, &store);
            continue;
        };
        tally.merge(&publish_directory(client, &category, &store, options));
    }

    println!();
    if args.dry_run {
        println!("Dry run complete; nothing was posted.");
    } else {
        println!(
            "Posts created: {}, failed: {}, categories skipped: {}",
            tally.created, tally.failed, tally.skipped_dirs
        );
    }
    Ok(())
}

fn connect(args: &Args) -> Result<(WordPressClient, PostOptions)> {
    let env_file = locate_env_file(Some(&args.env_file))?;
    let mut config = resolve_wordpress_config(env_file.as_deref(), CredentialOverrides::default())
        .context("loading WordPress credentials")?;
    if let Some(uploads_path) = &args.uploads_path {
        config.uploads_path = Some(uploads_path.clone());
    }
    let media_base = config.media_base_url(DEFAULT_UPLOADS_PATH);
    log::info!("Media base URL: {media_base}");
    let options = PostOptions {
        media_base,
        skip: args.skip,
        status: args.status,
    };
    Ok((WordPressClient::new(&config), options))
}

/// Immediate sub-directories of `root` that contain `metadata_file`, sorted
/// by name and optionally restricted to `only`.
fn category_directories(root: &Path, metadata_file: &str, only: &[String]) -> Result<Vec<PathBuf>> {
    let mut dirs = Vec::new();
    for entry in WalkDir::new(root)
        .min_depth(1)
        .max_depth(1)
        .sort_by_file_name()
    {
        let entry = entry.with_context(|| format!("listing {}", root.display()))?;
        if !entry.file_type().is_dir() {
            continue;
        }
        let path = entry.into_path();
        if !only.is_empty() && !only.iter().any(|name| *name == dir_name(&path)) {
            continue;
        }
        if !path.join(metadata_file).is_file() {
            log::info!("Skipping {}: no {metadata_file}", path.display());
            continue;
        }
        dirs.push(path);
    }
    Ok(dirs)
}

fn dir_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default()
}

fn preview(dir: &Path, store: &MetadataStore) {
    for record in store.records() {
        println!(
            "  [dry-run] {} (audio: {}, image: {})",
            record.title,
            yes_no(audio_path(dir, &record.id).is_file()),
            yes_no(thumbnail_path(dir, &record.id).is_file()),
        );
    }
}

fn yes_no(present: bool) -> &'static str {
    if present { "yes" } else { "missing" }
}
