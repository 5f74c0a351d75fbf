#![forbid(unsafe_code)]

//! Blocking client for the handful of WordPress REST endpoints we use:
//! categories, posts, and media.
//!
//! Every call is sequential and authenticated with an application password
//! through HTTP basic auth.

use std::collections::HashMap;
use std::fmt;
use std::fs::File;
use std::time::Duration;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use crate::config::WordPressConfig;
use crate::error::{Result, SyncError};
use crate::upload::{MediaKind, MediaTarget};

const LOOKUP_TIMEOUT: Duration = Duration::from_secs(30);
const WRITE_TIMEOUT: Duration = Duration::from_secs(60);
const UPLOAD_TIMEOUT: Duration = Duration::from_secs(120);

/// Results per page when searching categories. Only the first page is read.
const CATEGORY_PAGE_SIZE: &str = "100";
const ALT_TEXT_MAX_CHARS: usize = 120;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum PostStatus {
    #[default]
    Draft,
    Publish,
    Pending,
    Future,
    Private,
}

impl fmt::Display for PostStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            PostStatus::Draft => "draft",
            PostStatus::Publish => "publish",
            PostStatus::Pending => "pending",
            PostStatus::Future => "future",
            PostStatus::Private => "private",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct PostDescriptor {
    pub id: Option<u64>,
    pub link: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MediaDescriptor {
    pub id: Option<u64>,
    #[serde(default)]
    pub source_url: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CategoryEntry {
    id: u64,
    #[serde(default)]
    name: String,
}

/// How a category id was obtained on a cache miss.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CategoryResolution {
    Found(u64),
    Created(u64),
}

impl CategoryResolution {
    pub fn id(self) -> u64 {
        match self {
            CategoryResolution::Found(id) | CategoryResolution::Created(id) => id,
        }
    }
}

pub struct WordPressClient {
    agent: ureq::Agent,
    site: String,
    authorization: String,
    categories: HashMap<String, u64>,
}

impl WordPressClient {
    pub fn new(config: &WordPressConfig) -> Self {
        let token = STANDARD.encode(format!("{}:{}", config.username, config.app_password));
        Self {
            agent: ureq::AgentBuilder::new().build(),
            site: config.base_url.trim_end_matches('/').to_string(),
            authorization: format!("Basic {token}"),
            categories: HashMap::new(),
        }
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/wp-json/wp/v2/{path}", self.site)
    }

    fn request(&self, method: &str, path: &str, timeout: Duration) -> ureq::Request {
        self.agent
            .request(method, &self.endpoint(path))
            .timeout(timeout)
            .set("Authorization", &self.authorization)
    }

    /// Returns the id of the category called `name`, creating it if needed.
    /// Ids are cached for the lifetime of the client, so each name costs at
    /// most one search (and one create) per run.
    pub fn ensure_category(&mut self, name: &str) -> Result<u64> {
        let key = name.to_lowercase();
        if let Some(id) = self.categories.get(&key) {
            return Ok(*id);
        }

        let resolution = self.resolve_category(name)?;
        if let CategoryResolution::Created(id) = resolution {
            println!("Created category '{name}' as ID {id}");
        }
        self.categories.insert(key, resolution.id());
        Ok(resolution.id())
    }

    fn resolve_category(&self, name: &str) -> Result<CategoryResolution> {
        let listing: Vec<CategoryEntry> = self
            .request("GET", "categories", LOOKUP_TIMEOUT)
            .query("search", name)
            .query("per_page", CATEGORY_PAGE_SIZE)
            .call()
            .map_err(|err| {
                SyncError::from_http(format!("Failed to list categories for '{name}'"), err)
            })?
            .into_json()
            .map_err(|err| SyncError::Transport {
                context: format!("Failed to read categories for '{name}'"),
                message: err.to_string(),
            })?;

        let wanted = name.to_lowercase();
        if let Some(found) = listing
            .iter()
            .find(|entry| entry.name.to_lowercase() == wanted)
        {
            return Ok(CategoryResolution::Found(found.id));
        }

        let context = format!("Failed to create category '{name}'");
        let created: Value = self
            .request("POST", "categories", LOOKUP_TIMEOUT)
            .send_json(json!({ "name": name }))
            .map_err(|err| SyncError::from_http(context.clone(), err))?
            .into_json()
            .map_err(|err| SyncError::Transport {
                context: context.clone(),
                message: err.to_string(),
            })?;

        match created.get("id").and_then(Value::as_u64) {
            Some(id) => Ok(CategoryResolution::Created(id)),
            None => Err(SyncError::Remote {
                context: format!("Unexpected response creating category '{name}'"),
                status: 200,
                body: created.to_string(),
            }),
        }
    }

    pub fn create_post(
        &self,
        title: &str,
        content: &str,
        category_id: u64,
        status: PostStatus,
    ) -> Result<PostDescriptor> {
        let context = format!("Failed to create post '{title}'");
        self.request("POST", "posts", WRITE_TIMEOUT)
            .send_json(json!({
                "title": title,
                "content": content,
                "status": status,
                "categories": [category_id],
            }))
            .map_err(|err| SyncError::from_http(context.clone(), err))?
            .into_json()
            .map_err(|err| SyncError::Transport {
                context,
                message: err.to_string(),
            })
    }

    /// Streams the file body to `/media`. The attachment keeps the local file
    /// name; the slug is the file stem.
    pub fn upload_media_file(&self, target: &MediaTarget) -> Result<MediaDescriptor> {
        let file_name = target.file_name();
        let context = format!("Failed to upload {file_name} ({})", target.kind);

        let file = File::open(&target.path)
            .map_err(|err| SyncError::io(format!("opening {}", target.path.display()), err))?;
        let length = file
            .metadata()
            .map_err(|err| SyncError::io(format!("reading {}", target.path.display()), err))?
            .len();

        self.request("POST", "media", UPLOAD_TIMEOUT)
            .set(
                "Content-Disposition",
                &format!("attachment; filename=\"{file_name}\""),
            )
            .set("Content-Type", target.mime_type)
            .set("Content-Length", &length.to_string())
            .set("Slug", &target.file_stem())
            .send(file)
            .map_err(|err| SyncError::from_http(context.clone(), err))?
            .into_json()
            .map_err(|err| SyncError::Transport {
                context,
                message: err.to_string(),
            })
    }

    /// Sets the attachment title, and alt text for thumbnails.
    pub fn update_media_metadata(&self, media_id: u64, target: &MediaTarget) -> Result<()> {
        self.request("POST", &format!("media/{media_id}"), WRITE_TIMEOUT)
            .send_json(media_metadata_payload(target))
            .map_err(|err| {
                SyncError::from_http(
                    format!("Failed to update metadata for media {media_id}"),
                    err,
                )
            })?;
        Ok(())
    }
}

fn media_metadata_payload(target: &MediaTarget) -> Value {
    let title = if target.title.is_empty() {
        target.file_stem()
    } else {
        target.title.clone()
    };
    let mut payload = json!({ "title": title });
    if target.kind == MediaKind::Thumbnail && !target.description.is_empty() {
        let alt_text = if target.title.is_empty() {
            target.description.chars().take(ALT_TEXT_MAX_CHARS).collect()
        } else {
            target.title.clone()
        };
        payload["alt_text"] = Value::String(alt_text);
    }
    payload
}
