//! Error types for the guide2pdf library.
//!
//! Fatal and non-fatal failures are kept apart:
//!
//! * [`Guide2PdfError`] — **Fatal**: the request cannot produce an artifact
//!   (invalid input, the document cannot be encoded, every renderer failed).
//!   Returned as `Err(Guide2PdfError)` from the [`crate::convert::Pipeline`]
//!   entry points. No partial document is ever returned.
//!
//! * [`RenderFailure`] — **Non-fatal**: one renderer attempt failed and the
//!   orchestrator moved on to the next one. Collected in
//!   [`crate::pipeline::render::JobReport`] so callers can see why the
//!   primary renderer was skipped.
//!
//! * [`CleanupWarning`] — **Non-fatal**: a temporary file could not be
//!   removed. Logged and reported, never escalated.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use thiserror::Error;

/// All fatal errors returned by the guide2pdf library.
#[derive(Debug, Error)]
pub enum Guide2PdfError {
    // ── Request errors ────────────────────────────────────────────────────
    /// A required field is missing, empty, or malformed.
    #[error("Invalid request: field '{field}' {reason}")]
    Validation { field: &'static str, reason: String },

    // ── Document errors ───────────────────────────────────────────────────
    /// The document model cannot be serialised into the container format.
    #[error("Failed to encode document: {0}")]
    Encoding(String),

    /// An encoded document could not be read back.
    #[error("Failed to read document: {0}")]
    Decoding(String),

    // ── Conversion errors ─────────────────────────────────────────────────
    /// Every renderer in the chain failed.
    #[error("All renderers failed ({}). Last error: {last_error}", .attempted.join(", "))]
    ConversionExhausted {
        attempted: Vec<String>,
        last_error: String,
    },

    /// The job's temporary input file could not be created or written.
    #[error("Failed to prepare temporary file '{path}': {source}")]
    TempFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── I/O errors ────────────────────────────────────────────────────────
    /// Could not create or write the requested output file.
    #[error("Failed to write output file '{path}': {source}")]
    OutputWriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Guide2PdfError {
    pub(crate) fn validation(field: &'static str, reason: impl Into<String>) -> Self {
        Guide2PdfError::Validation {
            field,
            reason: reason.into(),
        }
    }

    /// Whether the caller (rather than the server) is at fault.
    pub fn is_client_error(&self) -> bool {
        matches!(self, Guide2PdfError::Validation { .. })
    }

    /// HTTP-style status and body for a transport layer to send back.
    ///
    /// Validation errors are a client rejection (400); everything else is a
    /// generic server failure (500) carrying the diagnostic in `details`.
    pub fn response(&self) -> (u16, ErrorResponse) {
        if self.is_client_error() {
            return (
                400,
                ErrorResponse {
                    error: self.to_string(),
                    details: None,
                },
            );
        }
        let summary = match self {
            Guide2PdfError::Encoding(_) => "Failed to generate document",
            Guide2PdfError::ConversionExhausted { .. } => "Failed to convert document to PDF",
            _ => "Internal server error",
        };
        (
            500,
            ErrorResponse {
                error: summary.to_string(),
                details: Some(self.to_string()),
            },
        )
    }
}

/// JSON body describing a failed request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

/// A single failed renderer attempt.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RenderFailure {
    /// The renderer program could not be started.
    #[error("{renderer}: failed to start: {detail}")]
    Spawn { renderer: String, detail: String },

    /// The renderer exited unsuccessfully.
    #[error("{renderer}: exited with {}: {stderr}", .code.map_or_else(|| "signal".to_string(), |c| format!("status {c}")))]
    NonZeroExit {
        renderer: String,
        code: Option<i32>,
        stderr: String,
    },

    /// The renderer did not finish within the per-attempt timeout.
    #[error("{renderer}: timed out after {secs}s")]
    Timeout { renderer: String, secs: u64 },

    /// The renderer reported success but left no readable output.
    #[error("{renderer}: no readable output at '{}'", .path.display())]
    MissingOutput { renderer: String, path: PathBuf },
}

impl RenderFailure {
    pub fn renderer(&self) -> &str {
        match self {
            RenderFailure::Spawn { renderer, .. }
            | RenderFailure::NonZeroExit { renderer, .. }
            | RenderFailure::Timeout { renderer, .. }
            | RenderFailure::MissingOutput { renderer, .. } => renderer,
        }
    }
}

/// A temporary file that could not be removed.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[error("Failed to remove temporary file '{}': {detail}", .path.display())]
pub struct CleanupWarning {
    pub path: PathBuf,
    pub detail: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exhausted_names_every_renderer() {
        let e = Guide2PdfError::ConversionExhausted {
            attempted: vec!["soffice".into(), "pandoc".into()],
            last_error: "pandoc: exited with status 1: boom".into(),
        };
        let msg = e.to_string();
        assert!(msg.contains("soffice, pandoc"), "got: {msg}");
        assert!(msg.contains("boom"), "got: {msg}");
    }

    #[test]
    fn validation_is_a_client_error() {
        let e = Guide2PdfError::validation("docxBuffer", "is missing");
        assert!(e.is_client_error());
        let (status, body) = e.response();
        assert_eq!(status, 400);
        assert!(body.error.contains("docxBuffer"));
        assert_eq!(body.details, None);
    }

    #[test]
    fn server_errors_carry_details() {
        let e = Guide2PdfError::ConversionExhausted {
            attempted: vec!["soffice".into(), "pandoc".into()],
            last_error: "x".into(),
        };
        let (status, body) = e.response();
        assert_eq!(status, 500);
        assert_eq!(body.error, "Failed to convert document to PDF");
        let details = body.details.unwrap();
        assert!(details.contains("soffice") && details.contains("pandoc"));

        let (status, body) = Guide2PdfError::Encoding("bad nesting".into()).response();
        assert_eq!(status, 500);
        assert!(body.details.unwrap().contains("bad nesting"));
    }

    #[test]
    fn error_response_omits_empty_details() {
        let body = ErrorResponse {
            error: "nope".into(),
            details: None,
        };
        assert_eq!(serde_json::to_string(&body).unwrap(), r#"{"error":"nope"}"#);
    }

    #[test]
    fn render_failure_display() {
        let f = RenderFailure::NonZeroExit {
            renderer: "soffice".into(),
            code: Some(77),
            stderr: "no display".into(),
        };
        assert_eq!(f.to_string(), "soffice: exited with status 77: no display");
        assert_eq!(f.renderer(), "soffice");

        let f = RenderFailure::Timeout {
            renderer: "pandoc".into(),
            secs: 5,
        };
        assert!(f.to_string().contains("5s"));
    }
}
