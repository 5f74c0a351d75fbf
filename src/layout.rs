#![forbid(unsafe_code)]

//! On-disk layout: one directory per playlist/category under the output root,
//! holding the metadata file and `{id}.mp3` / `{id}.jpg` assets.

use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{Result, SyncError};

pub const AUDIO_EXT: &str = "mp3";
pub const THUMBNAIL_EXT: &str = "jpg";

const INVALID_PATH_CHARS: &[char] = &['<', '>', ':', '"', '/', '\\', '|', '?', '*'];

/// Makes `name` safe to use as a single path component on common filesystems.
/// Returns `None` when nothing usable is left.
pub fn sanitize_path_segment(name: &str) -> Option<String> {
    let collapsed = name.split_whitespace().collect::<Vec<_>>().join(" ");
    let replaced: String = collapsed
        .chars()
        .map(|c| {
            if INVALID_PATH_CHARS.contains(&c) || c.is_control() {
                '_'
            } else {
                c
            }
        })
        .collect();
    let trimmed = replaced.trim_matches(|c: char| c == '.' || c.is_whitespace());
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

/// Directory name for a playlist, falling back to `playlist_{id}` when the
/// title sanitizes to nothing.
pub fn playlist_dir_name(title: &str, playlist_id: &str) -> String {
    sanitize_path_segment(title).unwrap_or_else(|| format!("playlist_{playlist_id}"))
}

/// Directory name for a user-provided category; empty names are rejected.
pub fn category_dir_name(name: &str) -> Result<String> {
    let name = name.trim();
    if name.is_empty() {
        return Err(SyncError::Validation(
            "Playlist name cannot be empty.".to_string(),
        ));
    }
    sanitize_path_segment(name).ok_or_else(|| {
        SyncError::Validation("Playlist name resolved to an empty directory name.".to_string())
    })
}

pub fn ensure_dir(path: &Path) -> Result<()> {
    fs::create_dir_all(path)
        .map_err(|err| SyncError::io(format!("creating {}", path.display()), err))
}

pub fn audio_path(dir: &Path, id: &str) -> PathBuf {
    dir.join(format!("{id}.{AUDIO_EXT}"))
}

pub fn thumbnail_path(dir: &Path, id: &str) -> PathBuf {
    dir.join(format!("{id}.{THUMBNAIL_EXT}"))
}
