#![forbid(unsafe_code)]

//! Credential loading for the WordPress-facing binaries.
//!
//! Values from the env file are never written into the process environment.
//! They are resolved once into a [`WordPressConfig`] which is then handed to
//! whoever needs it.

use crate::error::{Result, SyncError};
use std::{
    collections::HashMap,
    env, fs,
    path::{Path, PathBuf},
};

pub const DEFAULT_ENV_PATH: &str = ".env";
pub const FALLBACK_ENV_PATH: &str = "wp.env";
pub const DEFAULT_UPLOADS_PATH: &str = "wp-content/uploads/2025/youtube2wordpress";

const KEY_BASE_URL: &str = "WP_BASE_URL";
const KEY_USERNAME: &str = "WP_USERNAME";
const KEY_APP_PASSWORD: &str = "WP_APP_PASSWORD";
const KEY_UPLOADS_PATH: &str = "WP_UPLOADS_PATH";
const KEY_MEDIA_BASE_URL: &str = "MEDIA_BASE_URL";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WordPressConfig {
    pub base_url: String,
    pub username: String,
    pub app_password: String,
    pub uploads_path: Option<String>,
    pub media_base_url: Option<String>,
}

/// Values given on the command line. They beat both the process environment
/// and the env file.
#[derive(Debug, Clone, Default)]
pub struct CredentialOverrides {
    pub base_url: Option<String>,
    pub username: Option<String>,
    pub app_password: Option<String>,
}

/// Picks the env file to read.
///
/// An explicit path that is missing falls back to `wp.env` in the working
/// directory. Without an explicit path the first existing of `.env` and
/// `wp.env` is used; having neither is fine because credentials may come from
/// the command line or the environment.
pub fn locate_env_file(explicit: Option<&Path>) -> Result<Option<PathBuf>> {
    locate_env_file_in(explicit, Path::new("."))
}

fn locate_env_file_in(explicit: Option<&Path>, cwd: &Path) -> Result<Option<PathBuf>> {
    let fallback = cwd.join(FALLBACK_ENV_PATH);
    match explicit {
        Some(path) if path.exists() => Ok(Some(path.to_path_buf())),
        Some(path) => {
            if fallback.exists() {
                log::warn!(
                    "Env file {} not found, using {}",
                    path.display(),
                    fallback.display()
                );
                Ok(Some(fallback))
            } else {
                Err(SyncError::not_found("Env file", path))
            }
        }
        None => Ok([cwd.join(DEFAULT_ENV_PATH), fallback]
            .into_iter()
            .find(|candidate| candidate.exists())),
    }
}

/// Resolves the WordPress credentials from the given env file (if any), the
/// process environment, and command-line overrides.
pub fn resolve_wordpress_config(
    env_file: Option<&Path>,
    overrides: CredentialOverrides,
) -> Result<WordPressConfig> {
    let file_vars = match env_file {
        Some(path) => read_env_file(path)?,
        None => HashMap::new(),
    };
    build_wordpress_config(&file_vars, |key| env::var(key).ok(), overrides)
}

fn build_wordpress_config(
    file_vars: &HashMap<String, String>,
    env_lookup: impl Fn(&str) -> Option<String>,
    overrides: CredentialOverrides,
) -> Result<WordPressConfig> {
    let base_url = non_blank(overrides.base_url)
        .or_else(|| lookup_value(KEY_BASE_URL, file_vars, &env_lookup));
    let username = non_blank(overrides.username)
        .or_else(|| lookup_value(KEY_USERNAME, file_vars, &env_lookup));
    let app_password = non_blank(overrides.app_password)
        .or_else(|| lookup_value(KEY_APP_PASSWORD, file_vars, &env_lookup));

    let (Some(base_url), Some(username), Some(app_password)) = (base_url, username, app_password)
    else {
        return Err(SyncError::Validation(format!(
            "Missing WordPress credentials. Provide --site/--username/--app-password or set \
             {KEY_BASE_URL}, {KEY_USERNAME}, {KEY_APP_PASSWORD}."
        )));
    };

    Ok(WordPressConfig {
        base_url,
        username,
        app_password,
        uploads_path: lookup_value(KEY_UPLOADS_PATH, file_vars, &env_lookup),
        media_base_url: lookup_value(KEY_MEDIA_BASE_URL, file_vars, &env_lookup),
    })
}

impl WordPressConfig {
    /// Public URL prefix under which uploaded media is reachable. Always ends
    /// with a slash.
    pub fn media_base_url(&self, default_uploads_path: &str) -> String {
        if let Some(base) = &self.media_base_url {
            return ensure_trailing_slash(base.trim_end_matches('/'));
        }
        let uploads = self
            .uploads_path
            .as_deref()
            .unwrap_or(default_uploads_path)
            .trim_matches('/');
        let site = ensure_trailing_slash(self.base_url.trim_end_matches('/'));
        if uploads.is_empty() {
            site
        } else {
            format!("{site}{uploads}/")
        }
    }
}

pub fn ensure_trailing_slash(url: &str) -> String {
    if url.ends_with('/') {
        url.to_string()
    } else {
        format!("{url}/")
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.and_then(|value| {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(trimmed.to_string())
        }
    })
}

fn lookup_value(
    key: &str,
    file_vars: &HashMap<String, String>,
    env_lookup: &impl Fn(&str) -> Option<String>,
) -> Option<String> {
    // Blank values count as unset in both sources, so an empty variable in the
    // environment does not hide the file's value.
    non_blank(env_lookup(key)).or_else(|| non_blank(file_vars.get(key).cloned()))
}

/// Parses a `KEY=VALUE` file. Blank lines and `#` comments are skipped, an
/// optional `export ` prefix is accepted, and one layer of matching quotes is
/// stripped from values.
pub fn read_env_file(path: &Path) -> Result<HashMap<String, String>> {
    if !path.exists() {
        return Err(SyncError::not_found("Env file", path));
    }
    let content = fs::read_to_string(path)
        .map_err(|err| SyncError::io(format!("reading {}", path.display()), err))?;
    Ok(parse_env_lines(&content))
}

fn parse_env_lines(content: &str) -> HashMap<String, String> {
    let mut vars = HashMap::new();
    for line in content.lines() {
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }
        let line = trimmed.strip_prefix("export ").unwrap_or(trimmed);
        let Some((key, value_raw)) = line.split_once('=') else {
            continue;
        };
        let key = key.trim();
        if key.is_empty() {
            continue;
        }
        let value = value_raw.trim();
        let value = value
            .strip_prefix('"')
            .and_then(|value| value.strip_suffix('"'))
            .or_else(|| {
                value
                    .strip_prefix('\'')
                    .and_then(|value| value.strip_suffix('\''))
            })
            .unwrap_or(value);
        vars.insert(key.to_string(), value.to_string());
    }
    vars
}
