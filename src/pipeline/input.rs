//! Request payloads and their validation.
//!
//! Two request shapes reach the pipeline:
//!
//! * [`GuideRequest`] — generate a study guide from text.
//! * [`ConvertRequest`] — convert an existing `.docx` (base64) to PDF.
//!
//! Both are plain serde structs with camelCase field names so they
//! deserialise directly from the JSON bodies a transport layer receives.
//! Validation happens here, before any document work starts, so that a
//! malformed request is always rejected as a client error.

use crate::error::Guide2PdfError;
use crate::pipeline::assemble::ColumnStrategy;
use crate::pipeline::classify::strip_control_chars;
use crate::pipeline::theme::ThemeId;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Content used when a guide request carries no `content` field.
pub const DEFAULT_CONTENT: &str = "No content provided.";

/// Title used when a guide request carries no usable `title`.
pub const DEFAULT_TITLE: &str = "Study Guide";

/// Generate a study guide.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GuideRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    /// Overrides the pipeline's configured theme.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub theme: Option<ThemeId>,
    /// Overrides the pipeline's configured column strategy.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub layout: Option<ColumnStrategy>,
}

/// A guide request after defaults have been applied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedGuide {
    pub title: String,
    pub content: String,
    pub theme: Option<ThemeId>,
    pub layout: Option<ColumnStrategy>,
}

impl GuideRequest {
    pub fn new(title: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            title: Some(title.into()),
            content: Some(content.into()),
            ..Default::default()
        }
    }

    /// Apply defaults and reject blank content.
    ///
    /// An absent `content` falls back to [`DEFAULT_CONTENT`]; a `content`
    /// that is present but whitespace-only is a validation error. A blank
    /// or absent title falls back to `default_title`. Control characters
    /// in the title are replaced with spaces.
    pub fn resolve(&self, default_title: &str) -> Result<ResolvedGuide, Guide2PdfError> {
        let content = match self.content.as_deref() {
            None => DEFAULT_CONTENT.to_string(),
            Some(c) if c.trim().is_empty() => {
                return Err(Guide2PdfError::validation("content", "must not be blank"))
            }
            Some(c) => c.to_string(),
        };

        let title = self
            .title
            .as_deref()
            .map(|t| strip_control_chars(t).trim().to_string())
            .filter(|t| !t.is_empty())
            .unwrap_or_else(|| strip_control_chars(default_title));

        Ok(ResolvedGuide {
            title,
            content,
            theme: self.theme,
            layout: self.layout,
        })
    }
}

/// Convert an uploaded `.docx` to PDF.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConvertRequest {
    /// Base64-encoded package bytes.
    #[serde(default)]
    pub docx_buffer: Option<String>,
}

impl ConvertRequest {
    pub fn from_bytes(bytes: &[u8]) -> Self {
        Self {
            docx_buffer: Some(STANDARD.encode(bytes)),
        }
    }

    /// Decode and sanity-check the payload.
    ///
    /// The decoded bytes must start with the zip local-file signature, which
    /// every `.docx` package does.
    pub fn decode(&self) -> Result<Vec<u8>, Guide2PdfError> {
        let encoded = self
            .docx_buffer
            .as_deref()
            .ok_or_else(|| Guide2PdfError::validation("docxBuffer", "is missing"))?;

        let encoded: String = encoded.chars().filter(|c| !c.is_whitespace()).collect();
        if encoded.is_empty() {
            return Err(Guide2PdfError::validation("docxBuffer", "is empty"));
        }

        let bytes = STANDARD
            .decode(encoded.as_bytes())
            .map_err(|e| Guide2PdfError::validation("docxBuffer", format!("is not valid base64: {e}")))?;

        if !bytes.starts_with(b"PK\x03\x04") {
            return Err(Guide2PdfError::validation(
                "docxBuffer",
                "does not contain a .docx package",
            ));
        }

        debug!("Decoded docxBuffer: {} bytes", bytes.len());
        Ok(bytes)
    }
}

/// Either request shape, distinguished by its fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum InboundRequest {
    Convert(ConvertRequest),
    Guide(GuideRequest),
}

impl InboundRequest {
    /// Parse a JSON body.
    ///
    /// A body with a `docxBuffer` key is a conversion request; anything
    /// else is a guide request.
    pub fn from_json(json: &str) -> Result<Self, Guide2PdfError> {
        let value: serde_json::Value = serde_json::from_str(json)
            .map_err(|e| Guide2PdfError::validation("body", format!("is not valid JSON: {e}")))?;

        let is_convert = value
            .as_object()
            .map(|o| o.contains_key("docxBuffer"))
            .ok_or_else(|| Guide2PdfError::validation("body", "must be a JSON object"))?;

        let parsed = if is_convert {
            serde_json::from_value(value).map(InboundRequest::Convert)
        } else {
            serde_json::from_value(value).map(InboundRequest::Guide)
        };
        parsed.map_err(|e| Guide2PdfError::validation("body", e.to_string()))
    }
}
