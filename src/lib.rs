//! # guide2pdf
//!
//! Turn free-form study-guide text into a themed, two-column document and
//! render it to PDF.
//!
//! ## Why this crate?
//!
//! Study guides arrive as loosely formatted text: markdown-ish headers,
//! "Label: explanation" lines, stray bold markers. This crate classifies that
//! text into header and body blocks, styles them with one of several themes,
//! lays them out in two columns, encodes a `.docx` package, and hands the
//! package to an external office renderer. Renderers are tried in order
//! (LibreOffice, then pandoc) so one broken installation does not fail the
//! request.
//!
//! ## Pipeline Overview
//!
//! ```text
//! text
//!  │
//!  ├─ 1. Input     validate the request, apply defaults
//!  ├─ 2. Classify  blank-line segments → header / body blocks
//!  ├─ 3. Theme     block → styled paragraph (formal, accent, banner, …)
//!  ├─ 4. Assemble  one section: native columns or two-cell table rows
//!  ├─ 5. Encode    deterministic .docx package
//!  └─ 6. Render    soffice → pandoc fallback, temp files always removed
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use guide2pdf::{GuideRequest, Pipeline, PipelineConfig, ThemeId};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = PipelineConfig::builder().theme(ThemeId::Accent).build()?;
//!     let pipeline = Pipeline::new(config);
//!
//!     let request = GuideRequest::new(
//!         "Cell Biology",
//!         "Main Idea: cells divide\n\nMitosis produces two identical cells.",
//!     );
//!     let pdf = pipeline.generate_pdf(&request).await?;
//!     guide2pdf::write_artifact(&pdf, &pdf.filename).await?;
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `guide2pdf` binary (clap + anyhow + tracing-subscriber + indicatif) |
//!
//! Disable `cli` when using only the library to avoid pulling in CLI-only deps:
//! ```toml
//! guide2pdf = { version = "0.1", default-features = false }
//! ```
//!
//! ## External programs
//!
//! PDF output needs at least one of `soffice` (LibreOffice) or `pandoc` with
//! a PDF engine (`wkhtmltopdf` by default) on `PATH`. Generating `.docx`
//! output needs neither.

// ── Modules ──────────────────────────────────────────────────────────────

pub mod config;
pub mod convert;
pub mod error;
pub mod model;
pub mod pipeline;
pub mod progress;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use config::{PipelineConfig, PipelineConfigBuilder};
pub use convert::{
    generate_pdf_sync, sanitize_filename, write_artifact, Artifact, OutputFormat, Pipeline,
    CONVERTED_FILENAME, PDF_CONTENT_TYPE,
};
pub use error::{CleanupWarning, ErrorResponse, Guide2PdfError, RenderFailure};
pub use model::{Block, BlockKind, Document, Paragraph, StyledRun};
pub use pipeline::assemble::ColumnStrategy;
pub use pipeline::encode::{DocumentEncoder, DocxEncoder, DOCX_CONTENT_TYPE};
pub use pipeline::input::{ConvertRequest, GuideRequest, InboundRequest};
pub use pipeline::render::{JobReport, PandocRenderer, Renderer, RendererKind, SofficeRenderer};
pub use pipeline::theme::{StyleSheet, Theme, ThemeId};
pub use progress::{JobProgressCallback, NoopProgressCallback, ProgressCallback};
