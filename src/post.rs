#![forbid(unsafe_code)]

//! Builds the block-editor body for a post: one shortcode block embedding the
//! player, followed by one paragraph block per description paragraph.

use std::borrow::Cow;
use std::fmt::Write;

use crate::layout::{AUDIO_EXT, THUMBNAIL_EXT};
use crate::metadata::VideoRecord;

pub const DEFAULT_SKIP: u32 = 15;

const EMPTY_PARAGRAPH: &str = "<!-- wp:paragraph -->\n<p></p>\n<!-- /wp:paragraph -->";

/// Renders the full post content for `record`. Pure; same input, same bytes.
pub fn build_post_content(media_base: &str, record: &VideoRecord, skip: u32) -> String {
    let shortcode = build_shortcode(media_base, &record.id, &record.title, skip);
    format!(
        "<!-- wp:shortcode -->\n{shortcode}\n<!-- /wp:shortcode -->\n\n{}",
        render_description(&record.description)
    )
}

pub fn build_shortcode(media_base: &str, video_id: &str, title: &str, skip: u32) -> String {
    format!(
        "[dharma_player audio=\"{media_base}{video_id}.{AUDIO_EXT}\" \
         image=\"{media_base}{video_id}.{THUMBNAIL_EXT}\" \
         title=\"{}\" skip=\"{skip}\"]",
        escape_html(title)
    )
}

/// Blank lines separate paragraphs; lines inside a paragraph are trimmed and
/// joined with a single space. `\n`, `\r\n` and a lone `\r` all end a line.
pub fn split_paragraphs(description: &str) -> Vec<String> {
    let mut paragraphs = Vec::new();
    let mut current: Vec<&str> = Vec::new();
    let normalized = description.replace("\r\n", "\n");
    for line in normalized.split(['\n', '\r']) {
        let stripped = line.trim();
        if !stripped.is_empty() {
            current.push(stripped);
        } else if !current.is_empty() {
            paragraphs.push(current.join(" "));
            current.clear();
        }
    }
    if !current.is_empty() {
        paragraphs.push(current.join(" "));
    }
    paragraphs
}

fn render_description(description: &str) -> String {
    let paragraphs = split_paragraphs(description);
    if paragraphs.is_empty() {
        return EMPTY_PARAGRAPH.to_string();
    }

    let mut rendered = String::new();
    for (index, paragraph) in paragraphs.iter().enumerate() {
        if index > 0 {
            rendered.push('\n');
        }
        let _ = write!(
            rendered,
            "<!-- wp:paragraph -->\n<p>{}</p>\n<!-- /wp:paragraph -->",
            escape_html(paragraph)
        );
    }
    rendered
}

/// Escapes `& < > " '` so the value is safe inside both element text and a
/// quoted shortcode attribute.
pub fn escape_html(value: &str) -> Cow<'_, str> {
    html_escape::encode_quoted_attribute(value)
}
