//! Error types for the review agent.
//!
//! Two channels are kept apart: [`ReviewError`] aborts a review and is
//! returned to the caller, while [`ToolError`] is rendered into the
//! conversation as tool-result text so the model can correct itself.

use std::path::PathBuf;
use thiserror::Error;

/// Hard failures that end a review request.
#[derive(Error, Debug)]
pub enum ReviewError {
    /// The request could not be sent or the response body could not be read.
    #[error("Failed to call the model API: {0}")]
    Transport(String),

    #[error("Model request timed out after {0}s")]
    Timeout(u64),

    #[error("Cannot connect to the model API at {0}")]
    Connect(String),

    /// Non-success HTTP status from the endpoint.
    #[error("Model API error {status}: {body}")]
    Api { status: u16, body: String },

    #[error("Failed to parse model response: {0}")]
    Decode(String),

    #[error("Model returned no choices")]
    EmptyResponse,

    #[error("Review did not converge after {0} rounds")]
    NotConverged(usize),

    #[error("Review cancelled")]
    Cancelled,
}

/// Recoverable tool failures, fed back to the model as text.
#[derive(Error, Debug)]
pub enum ToolError {
    #[error("Invalid tool input: {0}")]
    InvalidInput(String),

    #[error("Unsupported tool: {0}")]
    UnsupportedTool(String),

    /// Every candidate location for a file failed to read.
    #[error(
        "Failed to read file: {requested}\nTried paths: {}\nAbsolute path: {}\nError: {source}",
        display_paths(.attempted),
        .absolute.display()
    )]
    ReadFailed {
        requested: String,
        attempted: Vec<PathBuf>,
        absolute: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("File I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid glob pattern: {0}")]
    Pattern(#[from] glob::PatternError),

    #[error("Failed to walk directory: {0}")]
    Walk(#[from] walkdir::Error),

    #[error("Command execution failed: {0}")]
    CommandFailed(String),
}

fn display_paths(paths: &[PathBuf]) -> String {
    let joined = paths
        .iter()
        .map(|p| p.display().to_string())
        .collect::<Vec<_>>()
        .join(", ");
    format!("[{}]", joined)
}
