#![forbid(unsafe_code)]

//! Post pass for one category directory: ensure the category, then create one
//! post per record. Failures are logged and counted, never propagated.

use crate::metadata::MetadataStore;
use crate::post::build_post_content;
use crate::wordpress::{PostStatus, WordPressClient};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PostTally {
    pub created: usize,
    pub failed: usize,
    pub skipped_dirs: usize,
}

impl PostTally {
    pub fn merge(&mut self, other: &PostTally) {
        self.created += other.created;
        self.failed += other.failed;
        self.skipped_dirs += other.skipped_dirs;
    }
}

/// Options shared by every directory of a run.
#[derive(Debug, Clone)]
pub struct PostOptions {
    pub media_base: String,
    pub skip: u32,
    pub status: PostStatus,
}

/// Publishes every record of `store` under `category`. An empty store is
/// skipped before any request is made.
pub fn publish_directory(
    client: &mut WordPressClient,
    category: &str,
    store: &MetadataStore,
    options: &PostOptions,
) -> PostTally {
    let mut tally = PostTally::default();

    if store.is_empty() {
        println!("  No entries in {}", store.path().display());
        tally.skipped_dirs += 1;
        return tally;
    }

    let category_id = match client.ensure_category(category) {
        Ok(id) => id,
        Err(err) => {
            log::error!("Skipping {category}: {err}");
            tally.skipped_dirs += 1;
            return tally;
        }
    };

    for record in store.records() {
        let content = build_post_content(&options.media_base, record, options.skip);
        match client.create_post(&record.title, &content, category_id, options.status) {
            Ok(post) => {
                tally.created += 1;
                let id = post.id.map(|id| id.to_string()).unwrap_or_else(|| "?".into());
                let link = post.link.unwrap_or_default();
                println!("  Created post {id} ({}) {link}", record.title);
            }
            Err(err) => {
                tally.failed += 1;
                log::error!("Failed to post {}: {err}", record.id);
            }
        }
    }
    tally
}
