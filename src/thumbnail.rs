#![forbid(unsafe_code)]

//! Thumbnail download straight from the image CDN.
//!
//! Not every video has every resolution, so candidates are tried from the
//! largest down. Only a 404 moves on to the next candidate.

use std::io;
use std::path::Path;
use std::time::Duration;

use tempfile::NamedTempFile;

use crate::error::{Result, SyncError};

pub const DEFAULT_THUMBNAIL_BASE: &str = "https://i.ytimg.com/vi/";

pub const THUMBNAIL_CANDIDATES: &[&str] = &[
    "maxresdefault.jpg",
    "sddefault.jpg",
    "hqdefault.jpg",
    "mqdefault.jpg",
    "default.jpg",
];

const THUMBNAIL_TIMEOUT: Duration = Duration::from_secs(30);

pub trait ThumbnailSource {
    /// Saves the best available thumbnail for `video_id` at `destination`.
    /// On error nothing is left at `destination`.
    fn download(&self, video_id: &str, destination: &Path) -> Result<()>;
}

#[derive(Debug, Clone)]
pub struct ThumbnailDownloader {
    agent: ureq::Agent,
    base_url: String,
}

impl Default for ThumbnailDownloader {
    fn default() -> Self {
        Self::with_base_url(DEFAULT_THUMBNAIL_BASE)
    }
}

impl ThumbnailDownloader {
    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        let agent = ureq::AgentBuilder::new()
            .timeout(THUMBNAIL_TIMEOUT)
            .build();
        let base_url = base_url.into();
        Self {
            agent,
            base_url: crate::config::ensure_trailing_slash(&base_url),
        }
    }

    fn candidate_url(&self, video_id: &str, candidate: &str) -> String {
        format!("{}{video_id}/{candidate}", self.base_url)
    }
}

impl ThumbnailSource for ThumbnailDownloader {
    fn download(&self, video_id: &str, destination: &Path) -> Result<()> {
        for candidate in THUMBNAIL_CANDIDATES {
            let url = self.candidate_url(video_id, candidate);
            let response = match self.agent.get(&url).call() {
                Ok(response) => response,
                Err(ureq::Error::Status(404, _)) => {
                    log::debug!("No {candidate} for {video_id}");
                    continue;
                }
                Err(err) => {
                    return Err(SyncError::from_http(
                        format!("Failed to fetch thumbnail {url}"),
                        err,
                    ));
                }
            };
            if response.status() != 200 {
                continue;
            }
            return write_atomically(response.into_reader(), destination);
        }

        Err(SyncError::Remote {
            context: format!("Failed to fetch a thumbnail for video {video_id}"),
            status: 404,
            body: "no candidate resolution available".to_string(),
        })
    }
}

fn write_atomically(mut reader: impl io::Read, destination: &Path) -> Result<()> {
    let context = || format!("writing {}", destination.display());
    let dir = destination
        .parent()
        .filter(|parent| !parent.as_os_str().is_empty())
        .unwrap_or(Path::new("."));
    let mut tmp = NamedTempFile::new_in(dir).map_err(|err| SyncError::io(context(), err))?;
    io::copy(&mut reader, &mut tmp).map_err(|err| SyncError::io(context(), err))?;
    tmp.persist(destination)
        .map_err(|err| SyncError::io(context(), err.error))?;
    Ok(())
}
