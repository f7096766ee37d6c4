use std::path::PathBuf;
use thiserror::Error;

/// Per-record failure kinds. The batch loop inspects these to decide whether
/// to continue (all of them) instead of burying the policy in control flow.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("network error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("datastore error ({status}): {body}")]
    Api { status: u16, body: String },

    #[error("upsert response carried no row id")]
    MissingId,

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("record has no usable name, cannot derive upsert key")]
    Unnamed,
}
