#![forbid(unsafe_code)]

//! Thin wrapper around `yt-dlp`, the external tool that resolves playlists,
//! extracts per-video metadata and downloads audio.
//!
//! The [`Extractor`] trait is the seam the sync pipeline talks to; [`YtDlp`]
//! is the real implementation and simply shells out.

use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use serde::Deserialize;

use crate::error::{Result, SyncError};

pub const AUDIO_FORMAT: &str = "bestaudio/best";
pub const AUDIO_CODEC: &str = "mp3";
pub const AUDIO_QUALITY: &str = "320K";

/// Subset of yt-dlp's info JSON for a single video. Playlist entries share the
/// same shape (flat entries just leave most fields empty).
#[derive(Debug, Clone, Default, Deserialize)]
pub struct VideoInfo {
    pub id: Option<String>,
    pub title: Option<String>,
    pub fulltitle: Option<String>,
    pub description: Option<String>,
    pub webpage_url: Option<String>,
    pub url: Option<String>,
}

impl VideoInfo {
    /// Best URL to hand back to yt-dlp for this entry.
    pub fn source_url(&self) -> Option<&str> {
        self.webpage_url
            .as_deref()
            .or(self.url.as_deref())
            .filter(|url| !url.trim().is_empty())
    }

    pub fn display_title(&self) -> Option<&str> {
        self.fulltitle
            .as_deref()
            .or(self.title.as_deref())
            .filter(|title| !title.is_empty())
    }
}

/// `yt-dlp --dump-single-json` output for a playlist. Entries that could not be
/// extracted come back as `null` when `--ignore-errors` is set.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PlaylistInfo {
    pub id: Option<String>,
    pub title: Option<String>,
    #[serde(default)]
    pub entries: Option<Vec<Option<VideoInfo>>>,
}

pub trait Extractor {
    fn resolve_playlist(&self, reference: &str) -> Result<PlaylistInfo>;

    fn video_info(&self, url: &str) -> Result<VideoInfo>;

    /// Downloads the best audio stream of `url` into `target_dir` as
    /// `{id}.mp3`.
    fn download_audio(&self, url: &str, target_dir: &Path) -> Result<()>;
}

#[derive(Debug, Clone)]
pub struct YtDlp {
    program: PathBuf,
    cookies: Option<PathBuf>,
}

impl YtDlp {
    pub fn new(cookies: Option<PathBuf>) -> Self {
        Self::with_program("yt-dlp", cookies)
    }

    pub fn with_program(program: impl Into<PathBuf>, cookies: Option<PathBuf>) -> Self {
        Self {
            program: program.into(),
            cookies,
        }
    }

    /// Runs `yt-dlp --version` to fail loudly when the tool is missing.
    pub fn ensure_available(&self) -> Result<()> {
        let status = Command::new(&self.program)
            .arg("--version")
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status();

        match status {
            Ok(status) if status.success() => Ok(()),
            Ok(_) => Err(SyncError::Extractor(format!(
                "{} is installed but returned a failure status",
                self.program.display()
            ))),
            Err(err) => Err(SyncError::Extractor(format!(
                "{} is not installed or not in PATH: {}",
                self.program.display(),
                err
            ))),
        }
    }

    fn command(&self) -> Command {
        let mut command = Command::new(&self.program);
        if let Some(cookies) = &self.cookies {
            command.arg("--cookies").arg(cookies);
        }
        command
    }

    fn dump_json(&self, mut command: Command, url: &str) -> Result<String> {
        let output = command
            .output()
            .map_err(|err| SyncError::Extractor(format!("fetching metadata for {url}: {err}")))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            let reason = stderr
                .lines()
                .rev()
                .find(|line| !line.trim().is_empty())
                .unwrap_or_default();
            return Err(SyncError::Extractor(format!(
                "metadata command failed for {url} (status {}) {}",
                output.status,
                reason.trim()
            )));
        }

        String::from_utf8(output.stdout)
            .map_err(|_| SyncError::Extractor(format!("metadata for {url} is not valid UTF-8")))
    }
}

impl Extractor for YtDlp {
    fn resolve_playlist(&self, reference: &str) -> Result<PlaylistInfo> {
        let mut command = self.command();
        command
            .arg("--dump-single-json")
            .arg("--flat-playlist")
            .arg("--skip-download")
            .arg("--ignore-errors")
            .arg("--no-warnings")
            .arg(reference);

        let raw = self.dump_json(command, reference)?;
        let info: Option<PlaylistInfo> = serde_json::from_str(&raw).map_err(|err| {
            SyncError::Extractor(format!("deserializing playlist JSON for {reference}: {err}"))
        })?;
        info.ok_or_else(|| {
            SyncError::Extractor("Could not retrieve playlist information.".to_string())
        })
    }

    fn video_info(&self, url: &str) -> Result<VideoInfo> {
        let mut command = self.command();
        command
            .arg("--dump-single-json")
            .arg("--skip-download")
            .arg("--no-playlist")
            .arg("--no-warnings")
            .arg("--no-progress")
            .arg(url);

        let raw = self.dump_json(command, url)?;
        let info: Option<VideoInfo> = serde_json::from_str(&raw).map_err(|err| {
            SyncError::Extractor(format!("deserializing metadata JSON for {url}: {err}"))
        })?;
        info.ok_or_else(|| {
            SyncError::Extractor(format!("Could not retrieve video information for {url}."))
        })
    }

    fn download_audio(&self, url: &str, target_dir: &Path) -> Result<()> {
        let output_pattern = target_dir.join("%(id)s.%(ext)s");
        let mut command = self.command();
        command
            .arg("--format")
            .arg(AUDIO_FORMAT)
            .arg("--extract-audio")
            .arg("--audio-format")
            .arg(AUDIO_CODEC)
            .arg("--audio-quality")
            .arg(AUDIO_QUALITY)
            .arg("--output")
            .arg(output_pattern)
            .arg("--no-playlist")
            .arg("--no-overwrites")
            .arg("--no-warnings")
            .arg(url);

        match command.status() {
            Ok(status) if status.success() => Ok(()),
            Ok(status) => Err(SyncError::Extractor(format!(
                "audio download failed for {url} (status {status})"
            ))),
            Err(err) => Err(SyncError::Extractor(format!(
                "unable to execute audio download for {url}: {err}"
            ))),
        }
    }
}

#[cfg(all(test, unix))]
pub(crate) mod stub {
    use std::fs;
    use std::os::unix::fs::PermissionsExt;
    use std::path::{Path, PathBuf};

    /// Writes a fake `yt-dlp` into `dir` that answers the three calls the
    /// extractor makes and appends every argv to `calls.log`.
    pub(crate) fn install_ytdlp_stub(dir: &Path) -> anyhow::Result<PathBuf> {
        let script_path = dir.join("yt-dlp");
        let log_path = dir.join("calls.log");
        let script = format!(
            r#"#!/usr/bin/env bash
set -eu
echo "$*" >> "{log}"
args=("$@")
output=""
while [[ $# -gt 0 ]]; do
  case "$1" in
    --output)
      shift
      output="$1"
      ;;
  esac
  shift
done

has() {{ printf '%s\n' "${{args[@]}}" | grep -q -- "^$1\$"; }}
last="${{args[${{#args[@]}}-1]}}"

if has --version; then
  echo "2024.01.01"
  exit 0
fi

if has --flat-playlist; then
  if [[ "$last" == *broken* ]]; then
    echo "ERROR: playlist does not exist" >&2
    exit 1
  fi
  cat <<'JSON'
{{
  "id": "PLstub",
  "title": "Stub: Playlist?",
  "entries": [
    {{"id": "alpha", "title": "Alpha", "url": "https://www.youtube.com/watch?v=alpha"}},
    null,
    {{"id": "beta", "title": "Beta", "webpage_url": "https://www.youtube.com/watch?v=beta"}}
  ]
}}
JSON
  exit 0
fi

if has --dump-single-json; then
  id="${{last##*v=}}"
  if [[ "$id" == *missing* ]]; then
    echo "ERROR: Video unavailable" >&2
    exit 1
  fi
  printf '{{"id": "%s", "fulltitle": "Title %s", "description": "About %s", "webpage_url": "%s"}}\n' "$id" "$id" "$id" "$last"
  exit 0
fi

if has --extract-audio; then
  id="${{last##*v=}}"
  target="$(printf '%s' "$output" | sed -e "s/%(id)s/$id/" -e "s/%(ext)s/mp3/")"
  mkdir -p "$(dirname "$target")"
  echo "audio" > "$target"
  exit 0
fi

exit 0
"#,
            log = log_path.display()
        );
        fs::write(&script_path, script)?;
        let mut perms = fs::metadata(&script_path)?.permissions();
        perms.set_mode(0o755);
        fs::set_permissions(&script_path, perms)?;
        Ok(script_path)
    }

    pub(crate) fn recorded_calls(dir: &Path) -> Vec<String> {
        fs::read_to_string(dir.join("calls.log"))
            .unwrap_or_default()
            .lines()
            .map(str::to_string)
            .collect()
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::stub::{install_ytdlp_stub, recorded_calls};
    use super::*;
    use anyhow::Result;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn ensure_available_reports_missing_program() {
        let dir = tempdir().unwrap();
        let ytdlp = YtDlp::with_program(dir.path().join("nope"), None);
        let err = ytdlp.ensure_available().unwrap_err();
        assert!(err.to_string().contains("not installed"));
    }

    #[test]
    fn resolve_playlist_keeps_null_entries() -> Result<()> {
        let dir = tempdir()?;
        let ytdlp = YtDlp::with_program(install_ytdlp_stub(dir.path())?, None);
        ytdlp.ensure_available()?;

        let playlist = ytdlp.resolve_playlist("https://www.youtube.com/playlist?list=PLstub")?;
        assert_eq!(playlist.id.as_deref(), Some("PLstub"));
        assert_eq!(playlist.title.as_deref(), Some("Stub: Playlist?"));
        let entries = playlist.entries.unwrap();
        assert_eq!(entries.len(), 3);
        assert!(entries[1].is_none());
        assert_eq!(
            entries[0].as_ref().unwrap().source_url(),
            Some("https://www.youtube.com/watch?v=alpha")
        );
        Ok(())
    }

    #[test]
    fn resolve_playlist_surfaces_tool_failure() -> Result<()> {
        let dir = tempdir()?;
        let ytdlp = YtDlp::with_program(install_ytdlp_stub(dir.path())?, None);
        let err = ytdlp.resolve_playlist("broken").unwrap_err();
        assert!(matches!(err, SyncError::Extractor(_)));
        assert!(err.to_string().contains("playlist does not exist"));
        Ok(())
    }

    #[test]
    fn video_info_prefers_full_title() -> Result<()> {
        let dir = tempdir()?;
        let ytdlp = YtDlp::with_program(install_ytdlp_stub(dir.path())?, None);
        let info = ytdlp.video_info("https://www.youtube.com/watch?v=gamma")?;
        assert_eq!(info.id.as_deref(), Some("gamma"));
        assert_eq!(info.display_title(), Some("Title gamma"));
        assert_eq!(info.description.as_deref(), Some("About gamma"));
        Ok(())
    }

    #[test]
    fn download_audio_passes_cookies_and_writes_mp3() -> Result<()> {
        let dir = tempdir()?;
        let cookies = dir.path().join("cookies.txt");
        fs::write(&cookies, "# Netscape HTTP Cookie File")?;
        let ytdlp = YtDlp::with_program(install_ytdlp_stub(dir.path())?, Some(cookies.clone()));

        let target = dir.path().join("out");
        fs::create_dir_all(&target)?;
        ytdlp.download_audio("https://www.youtube.com/watch?v=alpha", &target)?;
        assert!(target.join("alpha.mp3").exists());

        let calls = recorded_calls(dir.path());
        let call = calls.last().unwrap();
        assert!(call.contains(&format!("--cookies {}", cookies.display())));
        assert!(call.contains("--audio-format mp3"));
        assert!(call.contains("--audio-quality 320K"));
        Ok(())
    }
}
