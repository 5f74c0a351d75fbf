#![forbid(unsafe_code)]

//! Media upload pass: pair every metadata record with its audio and
//! thumbnail files, then push them to the media library one by one.

use std::fmt;
use std::path::{Path, PathBuf};

use crate::error::{Result, SyncError};
use crate::metadata::VideoRecord;
use crate::wordpress::WordPressClient;

/// Extension and MIME type, in lookup priority order.
pub const AUDIO_CANDIDATES: &[(&str, &str)] = &[
    ("mp3", "audio/mpeg"),
    ("m4a", "audio/mp4"),
    ("aac", "audio/aac"),
    ("flac", "audio/flac"),
    ("wav", "audio/wav"),
    ("ogg", "audio/ogg"),
];

pub const IMAGE_CANDIDATES: &[(&str, &str)] = &[
    ("jpg", "image/jpeg"),
    ("jpeg", "image/jpeg"),
    ("png", "image/png"),
    ("webp", "image/webp"),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaKind {
    Audio,
    Thumbnail,
}

impl fmt::Display for MediaKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MediaKind::Audio => f.write_str("audio"),
            MediaKind::Thumbnail => f.write_str("thumbnail"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaTarget {
    pub video_id: String,
    pub path: PathBuf,
    pub kind: MediaKind,
    pub mime_type: &'static str,
    pub title: String,
    pub description: String,
}

impl MediaTarget {
    fn new(record: &VideoRecord, kind: MediaKind, (path, mime_type): (PathBuf, &'static str)) -> Self {
        Self {
            video_id: record.id.clone(),
            path,
            kind,
            mime_type,
            title: record.title.clone(),
            description: record.description.clone(),
        }
    }

    pub fn file_name(&self) -> String {
        self.path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.video_id.clone())
    }

    pub fn file_stem(&self) -> String {
        self.path
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.video_id.clone())
    }
}

/// What to do with records whose audio or thumbnail is missing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MissingMode {
    /// Abort before anything is uploaded.
    Strict,
    /// Log and count them, upload the rest.
    Skip,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UploadSummary {
    pub succeeded: usize,
    pub failed: usize,
    pub skipped: usize,
}

fn find_media_file(
    dir: &Path,
    id: &str,
    candidates: &[(&str, &'static str)],
) -> Option<(PathBuf, &'static str)> {
    candidates.iter().find_map(|(ext, mime)| {
        let path = dir.join(format!("{id}.{ext}"));
        path.is_file().then_some((path, *mime))
    })
}

/// Returns the targets in record order (audio before thumbnail for each
/// record) and the number of records skipped for missing files.
pub fn collect_media_targets(
    dir: &Path,
    records: &[VideoRecord],
    mode: MissingMode,
) -> Result<(Vec<MediaTarget>, usize)> {
    let mut targets = Vec::with_capacity(records.len() * 2);
    let mut skipped = 0;

    for record in records {
        let audio = find_media_file(dir, &record.id, AUDIO_CANDIDATES);
        let image = find_media_file(dir, &record.id, IMAGE_CANDIDATES);
        match (audio, image) {
            (Some(audio), Some(image)) => {
                targets.push(MediaTarget::new(record, MediaKind::Audio, audio));
                targets.push(MediaTarget::new(record, MediaKind::Thumbnail, image));
            }
            (audio, image) => {
                let detail = format!(
                    "Missing files for {}: audio={}, thumbnail={}",
                    record.id,
                    presence(audio.is_some()),
                    presence(image.is_some()),
                );
                if mode == MissingMode::Strict {
                    return Err(SyncError::Validation(detail));
                }
                log::warn!("{detail}; skipping");
                skipped += 1;
            }
        }
    }

    Ok((targets, skipped))
}

fn presence(found: bool) -> &'static str {
    if found { "found" } else { "missing" }
}

/// Uploads each target in order. A failed upload is counted and the pass
/// continues; a failed metadata patch only logs, the upload still counts.
pub fn upload_targets(client: &WordPressClient, targets: &[MediaTarget]) -> UploadSummary {
    let mut summary = UploadSummary::default();
    for target in targets {
        let media = match client.upload_media_file(target) {
            Ok(media) => media,
            Err(err) => {
                log::error!("{err}");
                summary.failed += 1;
                continue;
            }
        };
        summary.succeeded += 1;

        let Some(media_id) = media.id else {
            println!("Uploaded {} ({}) without a media ID", target.file_name(), target.kind);
            continue;
        };
        println!("Uploaded {} ({}) as media {media_id}", target.file_name(), target.kind);
        if let Err(err) = client.update_media_metadata(media_id, target) {
            log::warn!("{err}");
        }
    }
    summary
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::WordPressConfig;
    use crate::test_server::{Reply, TestServer};
    use serde_json::json;
    use std::fs;
    use tempfile::tempdir;

    fn touch(dir: &Path, name: &str) {
        fs::write(dir.join(name), name.as_bytes()).unwrap();
    }

    fn records() -> Vec<VideoRecord> {
        vec![
            VideoRecord::new("one", "First", "First talk"),
            VideoRecord::new("two", "Second", ""),
            VideoRecord::new("three", "Third", ""),
        ]
    }

    fn client_for(server: &TestServer) -> WordPressClient {
        WordPressClient::new(&WordPressConfig {
            base_url: server.url().to_string(),
            username: "u".into(),
            app_password: "p".into(),
            uploads_path: None,
            media_base_url: None,
        })
    }

    #[test]
    fn picks_first_existing_extension_by_priority() {
        let dir = tempdir().unwrap();
        touch(dir.path(), "one.ogg");
        touch(dir.path(), "one.m4a");
        touch(dir.path(), "one.png");
        touch(dir.path(), "one.jpeg");

        let record = VideoRecord::new("one", "First", "");
        let (targets, skipped) =
            collect_media_targets(dir.path(), &[record], MissingMode::Strict).unwrap();

        assert_eq!(skipped, 0);
        assert_eq!(targets.len(), 2);
        assert_eq!(targets[0].kind, MediaKind::Audio);
        assert_eq!(targets[0].file_name(), "one.m4a");
        assert_eq!(targets[0].mime_type, "audio/mp4");
        assert_eq!(targets[1].kind, MediaKind::Thumbnail);
        assert_eq!(targets[1].file_name(), "one.jpeg");
        assert_eq!(targets[1].mime_type, "image/jpeg");
    }

    #[test]
    fn strict_mode_aborts_on_any_incomplete_record() {
        let dir = tempdir().unwrap();
        touch(dir.path(), "one.mp3");
        touch(dir.path(), "one.jpg");
        touch(dir.path(), "two.mp3");

        let err = collect_media_targets(dir.path(), &records(), MissingMode::Strict).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Missing files for two: audio=found, thumbnail=missing"
        );
    }

    #[test]
    fn skip_mode_counts_incomplete_records() {
        let dir = tempdir().unwrap();
        touch(dir.path(), "one.mp3");
        touch(dir.path(), "one.jpg");
        touch(dir.path(), "two.mp3");

        let (targets, skipped) =
            collect_media_targets(dir.path(), &records(), MissingMode::Skip).unwrap();
        assert_eq!(skipped, 2);
        let ids: Vec<_> = targets.iter().map(|t| t.video_id.as_str()).collect();
        assert_eq!(ids, vec!["one", "one"]);
    }

    #[test]
    fn upload_continues_past_failures_and_ignores_patch_errors() {
        let server = TestServer::start(|request| match request.path() {
            "/wp-json/wp/v2/media" => {
                if request.header("Slug") == Some("bad") {
                    Reply::json(500, json!({"code": "boom"}))
                } else {
                    Reply::json(201, json!({"id": 10}))
                }
            }
            _ => Reply::json(400, json!({"code": "rest_invalid_param"})),
        });
        let dir = tempdir().unwrap();
        for name in ["good.mp3", "good.jpg", "bad.mp3", "bad.jpg"] {
            touch(dir.path(), name);
        }
        let records = vec![
            VideoRecord::new("bad", "Bad", ""),
            VideoRecord::new("good", "Good", "desc"),
        ];
        let (targets, _) =
            collect_media_targets(dir.path(), &records, MissingMode::Strict).unwrap();

        let summary = upload_targets(&client_for(&server), &targets);
        assert_eq!(
            summary,
            UploadSummary {
                succeeded: 2,
                failed: 2,
                skipped: 0
            }
        );

        let paths: Vec<_> = server
            .requests()
            .iter()
            .map(|r| r.path().to_string())
            .collect();
        assert_eq!(
            paths,
            vec![
                "/wp-json/wp/v2/media",
                "/wp-json/wp/v2/media",
                "/wp-json/wp/v2/media",
                "/wp-json/wp/v2/media/10",
                "/wp-json/wp/v2/media",
                "/wp-json/wp/v2/media/10",
            ]
        );
    }
}
