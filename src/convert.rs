//! Request-level entry points.
//!
//! A [`Pipeline`] owns everything one deployment needs: its configuration,
//! the document encoder, and the renderer orchestrator (including the
//! process limiter shared by all of its jobs). Requests are independent;
//! the pipeline can be shared behind an `Arc` and called concurrently.
//!
//! ```text
//! GuideRequest ─▶ classify ─▶ theme ─▶ assemble ─▶ encode ─┬─▶ .docx Artifact
//!                                                          └─▶ render ─▶ .pdf Artifact
//! ConvertRequest ─▶ base64 decode ─────────────────────────────▶ render ─▶ converted.pdf
//! ```

use crate::config::PipelineConfig;
use crate::error::Guide2PdfError;
use crate::model::Document;
use crate::pipeline::assemble::{assemble, ColumnStrategy};
use crate::pipeline::classify::classify;
use crate::pipeline::encode::{DocumentEncoder, DocxEncoder, DOCX_CONTENT_TYPE};
use crate::pipeline::input::{ConvertRequest, GuideRequest, InboundRequest, ResolvedGuide};
use crate::pipeline::render::{JobReport, Orchestrator};
use crate::pipeline::theme::Theme;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::str::FromStr;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// MIME type of rendered PDFs.
pub const PDF_CONTENT_TYPE: &str = "application/pdf";

/// File name of artifacts produced by direct `.docx` conversion.
pub const CONVERTED_FILENAME: &str = "converted.pdf";

/// Artifact format for guide requests.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Rendered PDF. (default)
    #[default]
    Pdf,
    /// The encoded package, without rendering.
    Docx,
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OutputFormat::Pdf => f.write_str("pdf"),
            OutputFormat::Docx => f.write_str("docx"),
        }
    }
}

impl FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "pdf" => Ok(OutputFormat::Pdf),
            "docx" => Ok(OutputFormat::Docx),
            other => Err(format!("unknown format '{other}' (expected 'pdf' or 'docx')")),
        }
    }
}

/// A finished document ready to hand back to the caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Artifact {
    pub bytes: Vec<u8>,
    pub content_type: &'static str,
    pub filename: String,
    /// Present when a renderer produced the bytes.
    pub report: Option<JobReport>,
}

impl Artifact {
    /// Value for a `Content-Disposition` header.
    pub fn content_disposition(&self) -> String {
        format!("attachment; filename=\"{}\"", self.filename)
    }
}

/// Replace every character outside `[A-Za-z0-9]` with `_`.
///
/// ```
/// assert_eq!(guide2pdf::sanitize_filename("My Guide! #1"), "My_Guide__1");
/// ```
pub fn sanitize_filename(title: &str) -> String {
    title
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .collect()
}

/// Configured guide generation and conversion.
pub struct Pipeline {
    config: PipelineConfig,
    encoder: Arc<dyn DocumentEncoder>,
    orchestrator: Orchestrator,
}

impl fmt::Debug for Pipeline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Pipeline")
            .field("config", &self.config)
            .field("encoder", &self.encoder.name())
            .field("orchestrator", &self.orchestrator)
            .finish()
    }
}

impl Default for Pipeline {
    fn default() -> Self {
        Self::new(PipelineConfig::default())
    }
}

impl Pipeline {
    pub fn new(config: PipelineConfig) -> Self {
        let mut orchestrator = Orchestrator::new(
            config.renderer_chain(),
            config.temp_dir.clone(),
            config.render_timeout(),
            config.max_concurrent_renders,
        );
        if let Some(ref cb) = config.progress_callback {
            orchestrator = orchestrator.with_progress(Arc::clone(cb));
        }
        Self {
            config,
            encoder: Arc::new(DocxEncoder),
            orchestrator,
        }
    }

    /// Replace the default `.docx` encoder.
    pub fn with_encoder(mut self, encoder: Arc<dyn DocumentEncoder>) -> Self {
        self.encoder = encoder;
        self
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Classify, style and assemble a resolved request.
    pub fn build_document(&self, guide: &ResolvedGuide) -> Document {
        let mut strategy = guide.layout.unwrap_or(self.config.layout);
        if strategy == ColumnStrategy::Native && !self.encoder.supports_native_columns() {
            warn!(
                "Encoder '{}' has no native columns; falling back to table emulation",
                self.encoder.name()
            );
            strategy = ColumnStrategy::Table;
        }

        let sheet;
        let theme: &dyn Theme = match self.config.custom_theme {
            Some(ref custom) => custom.as_ref(),
            None => {
                sheet = guide.theme.unwrap_or(self.config.theme).style_sheet();
                &sheet
            }
        };

        let blocks = classify(&guide.content);
        assemble(
            &guide.title,
            &blocks,
            theme,
            strategy,
            self.config.page_setup(),
        )
    }

    fn encode(&self, doc: &Document) -> Result<Vec<u8>, Guide2PdfError> {
        let bytes = self.encoder.encode(doc)?;
        debug!("Encoded '{}' with {}: {} bytes", doc.title, self.encoder.name(), bytes.len());
        Ok(bytes)
    }

    /// Generate the encoded document without rendering it.
    pub fn generate_docx(&self, request: &GuideRequest) -> Result<Artifact, Guide2PdfError> {
        let guide = request.resolve(&self.config.default_title)?;
        let bytes = self.encode(&self.build_document(&guide))?;
        info!("Generated '{}' ({} bytes)", guide.title, bytes.len());
        Ok(Artifact {
            bytes,
            content_type: DOCX_CONTENT_TYPE,
            filename: format!("{}.docx", sanitize_filename(&guide.title)),
            report: None,
        })
    }

    /// Generate a study guide and render it to PDF.
    pub async fn generate_pdf(&self, request: &GuideRequest) -> Result<Artifact, Guide2PdfError> {
        let guide = request.resolve(&self.config.default_title)?;
        let docx = self.encode(&self.build_document(&guide))?;
        let (bytes, report) = self.orchestrator.convert(&docx).await?;
        info!(
            "Rendered '{}' with {} ({} bytes)",
            guide.title,
            report.renderer,
            bytes.len()
        );
        Ok(Artifact {
            bytes,
            content_type: PDF_CONTENT_TYPE,
            filename: format!("{}.pdf", sanitize_filename(&guide.title)),
            report: Some(report),
        })
    }

    /// Render an uploaded `.docx` to PDF.
    pub async fn convert_docx(&self, request: &ConvertRequest) -> Result<Artifact, Guide2PdfError> {
        let docx = request.decode()?;
        self.convert_docx_bytes(&docx).await
    }

    /// Render raw `.docx` bytes to PDF.
    pub async fn convert_docx_bytes(&self, docx: &[u8]) -> Result<Artifact, Guide2PdfError> {
        if docx.is_empty() {
            return Err(Guide2PdfError::validation("docxBuffer", "is empty"));
        }
        let (bytes, report) = self.orchestrator.convert(docx).await?;
        info!("Converted document with {} ({} bytes)", report.renderer, bytes.len());
        Ok(Artifact {
            bytes,
            content_type: PDF_CONTENT_TYPE,
            filename: CONVERTED_FILENAME.to_string(),
            report: Some(report),
        })
    }

    /// Dispatch either request shape. `format` applies to guide requests.
    pub async fn handle(
        &self,
        request: &InboundRequest,
        format: OutputFormat,
    ) -> Result<Artifact, Guide2PdfError> {
        match (request, format) {
            (InboundRequest::Convert(req), _) => self.convert_docx(req).await,
            (InboundRequest::Guide(req), OutputFormat::Docx) => self.generate_docx(req),
            (InboundRequest::Guide(req), OutputFormat::Pdf) => self.generate_pdf(req).await,
        }
    }
}

/// Write an artifact to `path`.
///
/// Uses atomic write (temp file + rename) to prevent partial files.
pub async fn write_artifact(artifact: &Artifact, path: impl AsRef<Path>) -> Result<(), Guide2PdfError> {
    let path = path.as_ref();
    let write_err = |e| Guide2PdfError::OutputWriteFailed {
        path: path.to_path_buf(),
        source: e,
    };

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent).await.map_err(write_err)?;
    }

    let mut tmp_name = path.as_os_str().to_owned();
    tmp_name.push(".tmp");
    let tmp_path = std::path::PathBuf::from(tmp_name);

    tokio::fs::write(&tmp_path, &artifact.bytes)
        .await
        .map_err(write_err)?;
    if let Err(e) = tokio::fs::rename(&tmp_path, path).await {
        let _ = tokio::fs::remove_file(&tmp_path).await;
        return Err(write_err(e));
    }
    debug!("Wrote {} bytes to {}", artifact.bytes.len(), path.display());
    Ok(())
}

/// Synchronous wrapper around [`Pipeline::generate_pdf`].
///
/// Creates a temporary tokio runtime internally, so it must not be called
/// from inside an async context.
pub fn generate_pdf_sync(pipeline: &Pipeline, request: &GuideRequest) -> Result<Artifact, Guide2PdfError> {
    tokio::runtime::Runtime::new()
        .map_err(|e| Guide2PdfError::Internal(format!("Failed to create tokio runtime: {}", e)))?
        .block_on(pipeline.generate_pdf(request))
}
