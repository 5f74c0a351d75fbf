#![forbid(unsafe_code)]

//! Error taxonomy shared by the library modules.
//!
//! Binaries wrap these in `anyhow` at the edge; inside the library every
//! fallible call says which of the categories below went wrong so callers can
//! decide whether a failure is fatal for the run or only for one item.

use std::path::PathBuf;

pub type Result<T, E = SyncError> = std::result::Result<T, E>;

#[derive(Debug, thiserror::Error)]
pub enum SyncError {
    /// A file or directory the run depends on does not exist.
    #[error("{what} not found: {}", path.display())]
    NotFound { what: &'static str, path: PathBuf },

    /// Metadata on disk could not be decoded.
    #[error("could not parse {}: {message}", path.display())]
    Parse { path: PathBuf, message: String },

    /// The CMS answered with a status >= 400.
    #[error("{context}: {status} {body}")]
    Remote {
        context: String,
        status: u16,
        body: String,
    },

    /// The request never produced an HTTP response.
    #[error("{context}: {message}")]
    Transport { context: String, message: String },

    /// Input that is structurally fine but unusable (empty names, missing
    /// credentials, incomplete records in strict mode).
    #[error("{0}")]
    Validation(String),

    /// yt-dlp failed to run or returned something we cannot use.
    #[error("{0}")]
    Extractor(String),

    #[error("{context}: {source}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },
}

impl SyncError {
    pub fn not_found(what: &'static str, path: impl Into<PathBuf>) -> Self {
        SyncError::NotFound {
            what,
            path: path.into(),
        }
    }

    pub fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        SyncError::Io {
            context: context.into(),
            source,
        }
    }

    /// Splits a `ureq` failure into the remote/transport halves of the taxonomy.
    pub fn from_http(context: impl Into<String>, err: ureq::Error) -> Self {
        let context = context.into();
        match err {
            ureq::Error::Status(status, response) => {
                let body = response.into_string().unwrap_or_default();
                SyncError::Remote {
                    context,
                    status,
                    body: body.trim().to_string(),
                }
            }
            ureq::Error::Transport(transport) => SyncError::Transport {
                context,
                message: transport.to_string(),
            },
        }
    }

    /// HTTP status carried by a remote error, if any.
    pub fn status(&self) -> Option<u16> {
        match self {
            SyncError::Remote { status, .. } => Some(*status),
            _ => None,
        }
    }
}
