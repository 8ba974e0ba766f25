use std::path::PathBuf;

/// Failures that abort a load. Per-record and per-relation problems are not
/// errors: the router drops those records and keeps going.
#[derive(Debug, thiserror::Error)]
pub enum IngestError {
    #[error("failed to read config {}: {source}", .path.display())]
    ConfigRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config {}: {source}", .path.display())]
    ConfigParse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("config {} has no `{key}` entry", .path.display())]
    MissingConfigEntry { path: PathBuf, key: &'static str },

    #[error("failed to open input {}: {source}", .path.display())]
    Open {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("cannot infer input format of {} (set `format` in the config)", .path.display())]
    UnknownFormat { path: PathBuf },

    #[error("input format `{format}` is not enabled in this build (compile with --features {format})")]
    FormatDisabled { format: &'static str },

    #[error("malformed container header in {}: {message}", .path.display())]
    Header { path: PathBuf, message: String },

    #[error("failed to decode record {index} of {}: {message}", .path.display())]
    Decode {
        path: PathBuf,
        index: usize,
        message: String,
    },
}

pub type Result<T> = std::result::Result<T, IngestError>;
