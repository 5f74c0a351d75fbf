#![forbid(unsafe_code)]

//! Tools that mirror a video playlist onto a WordPress site: download audio,
//! thumbnails and metadata, then publish posts and media attachments.

pub mod config;
pub mod error;
pub mod extractor;
pub mod layout;
pub mod logging;
pub mod metadata;
pub mod post;
pub mod publish;
pub mod sync;
pub mod thumbnail;
pub mod upload;
pub mod wordpress;

#[cfg(test)]
mod test_server;

pub use error::{Result, SyncError};
