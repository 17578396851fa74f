//! Configuration for the guide-to-PDF pipeline.
//!
//! All pipeline behaviour is controlled through [`PipelineConfig`], built via
//! its [`PipelineConfigBuilder`]. Keeping every knob in one struct means a
//! [`crate::convert::Pipeline`] carries no hidden process-wide state: two
//! pipelines with different themes or renderer chains can live side by side.
//!
//! # Design choice: builder over constructor
//! Most callers only change the theme or the renderer chain. The builder
//! lets them set only what they care about and rely on documented defaults
//! for the rest, and `build()` is the single place where invalid
//! combinations are rejected.

use crate::error::Guide2PdfError;
use crate::model::{ColumnSpec, Margins, INCH_TWIPS};
use crate::pipeline::assemble::{ColumnStrategy, PageSetup};
use crate::pipeline::input::DEFAULT_TITLE;
use crate::pipeline::render::{Renderer, RendererKind};
use crate::pipeline::theme::{Theme, ThemeId};
use crate::progress::ProgressCallback;
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

/// Configuration for a [`crate::convert::Pipeline`].
///
/// # Example
/// ```rust
/// use guide2pdf::{ColumnStrategy, PipelineConfig, ThemeId};
///
/// let config = PipelineConfig::builder()
///     .theme(ThemeId::Accent)
///     .layout(ColumnStrategy::Table)
///     .render_timeout_secs(60)
///     .build()
///     .unwrap();
/// ```
#[derive(Clone)]
pub struct PipelineConfig {
    /// Built-in theme applied when a request names none. Default: formal.
    pub theme: ThemeId,

    /// Caller-supplied theme. Takes precedence over `theme` and over a
    /// request's theme override.
    pub custom_theme: Option<Arc<dyn Theme>>,

    /// Two-column strategy applied when a request names none. Default: native.
    pub layout: ColumnStrategy,

    /// Gap between native columns, in twips. Default: 708 (~0.49 in).
    pub column_gap_twips: u32,

    /// Vertical rule between native columns. Default: true.
    pub column_separator: bool,

    /// Page margins in twips. Default: one inch on every side.
    pub margins: Margins,

    /// Built-in renderer chain in priority order.
    /// Default: `[soffice, pandoc --pdf-engine=wkhtmltopdf]`.
    pub renderers: Vec<RendererKind>,

    /// Caller-supplied renderers. When non-empty they replace `renderers`.
    pub custom_renderers: Vec<Arc<dyn Renderer>>,

    /// Per-attempt renderer timeout in seconds. Default: 120.
    ///
    /// A cold LibreOffice start can take several seconds on its own; two
    /// minutes leaves room for large documents while still reaping a hung
    /// process.
    pub render_timeout_secs: u64,

    /// Renderer processes allowed to run at once across all jobs. Default: 4.
    pub max_concurrent_renders: usize,

    /// Directory for per-job temporary files. Default: the system temp dir.
    pub temp_dir: PathBuf,

    /// Title used when a request has none. Default: "Study Guide".
    pub default_title: String,

    /// Optional progress callback for job events.
    pub progress_callback: Option<ProgressCallback>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            theme: ThemeId::default(),
            custom_theme: None,
            layout: ColumnStrategy::default(),
            column_gap_twips: ColumnSpec::default().gap_twips,
            column_separator: true,
            margins: Margins::uniform(INCH_TWIPS),
            renderers: RendererKind::default_chain(),
            custom_renderers: Vec::new(),
            render_timeout_secs: 120,
            max_concurrent_renders: 4,
            temp_dir: std::env::temp_dir(),
            default_title: DEFAULT_TITLE.to_string(),
            progress_callback: None,
        }
    }
}

impl fmt::Debug for PipelineConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PipelineConfig")
            .field("theme", &self.theme)
            .field("custom_theme", &self.custom_theme.as_ref().map(|t| t.name().to_string()))
            .field("layout", &self.layout)
            .field("column_gap_twips", &self.column_gap_twips)
            .field("column_separator", &self.column_separator)
            .field("margins", &self.margins)
            .field("renderers", &self.renderers)
            .field(
                "custom_renderers",
                &self.custom_renderers.iter().map(|r| r.name()).collect::<Vec<_>>(),
            )
            .field("render_timeout_secs", &self.render_timeout_secs)
            .field("max_concurrent_renders", &self.max_concurrent_renders)
            .field("temp_dir", &self.temp_dir)
            .field("default_title", &self.default_title)
            .field(
                "progress_callback",
                &self.progress_callback.as_ref().map(|_| "<dyn JobProgressCallback>"),
            )
            .finish()
    }
}

impl PipelineConfig {
    /// Create a new builder for `PipelineConfig`.
    pub fn builder() -> PipelineConfigBuilder {
        PipelineConfigBuilder {
            config: Self::default(),
        }
    }

    /// Page geometry handed to the assembler.
    pub fn page_setup(&self) -> PageSetup {
        PageSetup {
            margins: self.margins,
            columns: ColumnSpec {
                count: 2,
                gap_twips: self.column_gap_twips,
                separator: self.column_separator,
            },
        }
    }

    /// The effective renderer chain. Custom renderers replace the built-in list.
    pub fn renderer_chain(&self) -> Vec<Arc<dyn Renderer>> {
        if self.custom_renderers.is_empty() {
            self.renderers.iter().map(RendererKind::build).collect()
        } else {
            self.custom_renderers.clone()
        }
    }

    pub fn render_timeout(&self) -> Duration {
        Duration::from_secs(self.render_timeout_secs)
    }
}

/// Builder for [`PipelineConfig`].
#[derive(Debug)]
pub struct PipelineConfigBuilder {
    config: PipelineConfig,
}

impl PipelineConfigBuilder {
    pub fn theme(mut self, theme: ThemeId) -> Self {
        self.config.theme = theme;
        self
    }

    pub fn custom_theme(mut self, theme: Arc<dyn Theme>) -> Self {
        self.config.custom_theme = Some(theme);
        self
    }

    pub fn layout(mut self, layout: ColumnStrategy) -> Self {
        self.config.layout = layout;
        self
    }

    pub fn column_gap_twips(mut self, twips: u32) -> Self {
        self.config.column_gap_twips = twips;
        self
    }

    pub fn column_separator(mut self, v: bool) -> Self {
        self.config.column_separator = v;
        self
    }

    pub fn margins(mut self, margins: Margins) -> Self {
        self.config.margins = margins;
        self
    }

    pub fn renderers(mut self, renderers: Vec<RendererKind>) -> Self {
        self.config.renderers = renderers;
        self
    }

    /// Append a caller-supplied renderer to the custom chain.
    pub fn custom_renderer(mut self, renderer: Arc<dyn Renderer>) -> Self {
        self.config.custom_renderers.push(renderer);
        self
    }

    pub fn render_timeout_secs(mut self, secs: u64) -> Self {
        self.config.render_timeout_secs = secs;
        self
    }

    pub fn max_concurrent_renders(mut self, n: usize) -> Self {
        self.config.max_concurrent_renders = n;
        self
    }

    pub fn temp_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.temp_dir = dir.into();
        self
    }

    pub fn default_title(mut self, title: impl Into<String>) -> Self {
        self.config.default_title = title.into();
        self
    }

    pub fn progress_callback(mut self, cb: ProgressCallback) -> Self {
        self.config.progress_callback = Some(cb);
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<PipelineConfig, Guide2PdfError> {
        let c = &self.config;
        if c.renderers.is_empty() && c.custom_renderers.is_empty() {
            return Err(Guide2PdfError::InvalidConfig(
                "At least one renderer is required".into(),
            ));
        }
        if c.render_timeout_secs == 0 {
            return Err(Guide2PdfError::InvalidConfig(
                "Render timeout must be ≥ 1 second".into(),
            ));
        }
        if c.max_concurrent_renders == 0 {
            return Err(Guide2PdfError::InvalidConfig(
                "max_concurrent_renders must be ≥ 1".into(),
            ));
        }
        if c.column_gap_twips == 0 {
            return Err(Guide2PdfError::InvalidConfig(
                "Column gap must be > 0 twips".into(),
            ));
        }
        Ok(self.config)
    }
}
