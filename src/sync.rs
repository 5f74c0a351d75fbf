#![forbid(unsafe_code)]

//! Incremental download of playlist entries into a category directory.
//!
//! Both entry points (whole playlist, single video) funnel into
//! [`sync_entries`]: resolve each entry, skip what is already known, download
//! audio and thumbnail for the rest, and append the new records to the
//! metadata store. The store is written once, after the batch.

use std::path::{Path, PathBuf};

use crate::error::{Result, SyncError};
use crate::extractor::{Extractor, VideoInfo};
use crate::layout::{
    audio_path, category_dir_name, ensure_dir, playlist_dir_name, thumbnail_path,
};
use crate::metadata::{MetadataStore, VideoRecord};
use crate::thumbnail::ThumbnailSource;

/// The collaborators a sync run talks to.
pub struct SyncContext<'a> {
    pub extractor: &'a dyn Extractor,
    pub thumbnails: &'a dyn ThumbnailSource,
}

/// How much the entries handed to [`sync_entries`] already know.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryDetail {
    /// Flat playlist entries; full info is fetched per item.
    Flat,
    /// Entries already carry title and description.
    Complete,
}

/// What happened to a single entry.
#[derive(Debug)]
pub enum ItemOutcome {
    Added(VideoRecord),
    /// Known record with both media files present.
    AlreadyPresent { id: String },
    /// Known record with at least one media file missing. Left as-is.
    Incomplete { id: String },
    /// Entry unusable before any download was attempted.
    Skipped { position: usize, reason: String },
    Failed { id: String, error: SyncError },
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncReport {
    pub added: usize,
    pub already_present: usize,
    pub incomplete: usize,
    pub skipped: usize,
    pub failed: usize,
}

impl SyncReport {
    fn record(&mut self, outcome: &ItemOutcome) {
        match outcome {
            ItemOutcome::Added(_) => self.added += 1,
            ItemOutcome::AlreadyPresent { .. } => self.already_present += 1,
            ItemOutcome::Incomplete { .. } => self.incomplete += 1,
            ItemOutcome::Skipped { .. } => self.skipped += 1,
            ItemOutcome::Failed { .. } => self.failed += 1,
        }
    }
}

#[derive(Debug)]
pub struct SyncSummary {
    pub target_dir: PathBuf,
    pub metadata_path: PathBuf,
    pub report: SyncReport,
    /// Whether the metadata file was rewritten.
    pub saved: bool,
}

/// Validated playlist entry.
struct Descriptor<'e> {
    id: &'e str,
    url: &'e str,
    entry: &'e VideoInfo,
}

fn describe(position: usize, entry: Option<&VideoInfo>) -> std::result::Result<Descriptor<'_>, String> {
    let Some(entry) = entry else {
        return Err(format!("Skipping entry at position {position}: no data returned"));
    };
    let Some(url) = entry.source_url() else {
        return Err(format!("Skipping entry at position {position}: missing URL"));
    };
    let Some(id) = entry.id.as_deref().filter(|id| !id.trim().is_empty()) else {
        return Err(format!("Skipping entry at position {position}: missing video ID"));
    };
    Ok(Descriptor { id, url, entry })
}

/// Downloads a whole playlist into `{output_root}/{sanitized title}`.
///
/// Failing to resolve the playlist, or resolving it to zero entries, is fatal.
/// Everything after that is per item.
pub fn sync_playlist(
    ctx: &SyncContext<'_>,
    reference: &str,
    output_root: &Path,
    metadata_file: &str,
) -> Result<SyncSummary> {
    let playlist = ctx.extractor.resolve_playlist(reference)?;
    let entries = playlist
        .entries
        .filter(|entries| !entries.is_empty())
        .ok_or_else(|| {
            SyncError::Extractor("Playlist contains no downloadable entries.".to_string())
        })?;

    let title = playlist.title.unwrap_or_default();
    let playlist_id = playlist.id.unwrap_or_else(|| "playlist".to_string());
    let target_dir = output_root.join(playlist_dir_name(&title, &playlist_id));
    ensure_dir(&target_dir)?;
    println!("Saving playlist to {}", target_dir.display());

    run_batch(ctx, &entries, EntryDetail::Flat, target_dir, metadata_file)
}

/// Downloads one video into `{output_root}/{sanitized category name}`.
pub fn sync_single_video(
    ctx: &SyncContext<'_>,
    video_url: &str,
    category_name: &str,
    output_root: &Path,
    metadata_file: &str,
) -> Result<SyncSummary> {
    let target_dir = output_root.join(category_dir_name(category_name)?);
    ensure_dir(&target_dir)?;

    let mut info = ctx.extractor.video_info(video_url)?;
    if info.webpage_url.as_deref().is_none_or(|url| url.trim().is_empty()) {
        info.webpage_url = Some(video_url.to_string());
    }

    run_batch(ctx, &[Some(info)], EntryDetail::Complete, target_dir, metadata_file)
}

fn run_batch(
    ctx: &SyncContext<'_>,
    entries: &[Option<VideoInfo>],
    detail: EntryDetail,
    target_dir: PathBuf,
    metadata_file: &str,
) -> Result<SyncSummary> {
    let metadata_path = target_dir.join(metadata_file);
    let mut store = MetadataStore::load(&metadata_path)?;
    let report = sync_entries(ctx, entries, detail, &target_dir, &mut store);

    let saved = report.added > 0;
    if saved {
        store.save()?;
    }

    Ok(SyncSummary {
        target_dir,
        metadata_path,
        report,
        saved,
    })
}

/// Processes `entries` in order against `store`. New records are appended to
/// the store; nothing is written to disk here.
pub fn sync_entries(
    ctx: &SyncContext<'_>,
    entries: &[Option<VideoInfo>],
    detail: EntryDetail,
    target_dir: &Path,
    store: &mut MetadataStore,
) -> SyncReport {
    let mut report = SyncReport::default();
    let total = entries.len();

    for (index, entry) in entries.iter().enumerate() {
        let position = index + 1;
        let outcome = match describe(position, entry.as_ref()) {
            Ok(descriptor) => {
                println!("[{position}/{total}] {}", descriptor.id);
                process_entry(ctx, &descriptor, detail, target_dir, store)
            }
            Err(reason) => ItemOutcome::Skipped { position, reason },
        };

        match &outcome {
            ItemOutcome::Added(record) => {
                println!("  Added {} ({})", record.id, record.title);
            }
            ItemOutcome::AlreadyPresent { id } => {
                println!("  Skipping {id}: already present in metadata");
            }
            ItemOutcome::Incomplete { id } => {
                log::warn!("Skipping {id}: metadata present but media files missing");
            }
            ItemOutcome::Skipped { reason, .. } => log::warn!("{reason}"),
            ItemOutcome::Failed { id, error } => log::error!("Skipping {id}: {error}"),
        }

        report.record(&outcome);
        if let ItemOutcome::Added(record) = outcome {
            store.insert(record);
        }
    }

    report
}

fn process_entry(
    ctx: &SyncContext<'_>,
    descriptor: &Descriptor<'_>,
    detail: EntryDetail,
    target_dir: &Path,
    store: &MetadataStore,
) -> ItemOutcome {
    let id = descriptor.id;
    if store.contains(id) {
        let complete =
            audio_path(target_dir, id).exists() && thumbnail_path(target_dir, id).exists();
        return if complete {
            ItemOutcome::AlreadyPresent { id: id.to_string() }
        } else {
            ItemOutcome::Incomplete { id: id.to_string() }
        };
    }

    match fetch_item(ctx, descriptor, detail, target_dir) {
        Ok(record) => ItemOutcome::Added(record),
        Err(error) => ItemOutcome::Failed {
            id: id.to_string(),
            error,
        },
    }
}

fn fetch_item(
    ctx: &SyncContext<'_>,
    descriptor: &Descriptor<'_>,
    detail: EntryDetail,
    target_dir: &Path,
) -> Result<VideoRecord> {
    let (id, url, entry) = (descriptor.id, descriptor.url, descriptor.entry);

    let fetched;
    let info = match detail {
        EntryDetail::Complete => entry,
        EntryDetail::Flat => {
            fetched = ctx.extractor.video_info(url)?;
            &fetched
        }
    };

    let audio = audio_path(target_dir, id);
    if audio.exists() {
        println!("  Audio already exists for {id}, skipping download");
    } else {
        println!("  Downloading audio for {id}");
        ctx.extractor.download_audio(url, target_dir)?;
        if !audio.exists() {
            return Err(SyncError::Extractor(format!(
                "audio download for {id} finished without producing {}",
                audio.display()
            )));
        }
    }

    let thumbnail = thumbnail_path(target_dir, id);
    if thumbnail.exists() {
        println!("  Thumbnail already exists for {id}, skipping download");
    } else {
        println!("  Downloading thumbnail for {id}");
        ctx.thumbnails.download(id, &thumbnail)?;
    }

    let title = info.display_title().unwrap_or(id);
    let description = info.description.clone().unwrap_or_default();
    Ok(VideoRecord::new(id, title, description))
}
