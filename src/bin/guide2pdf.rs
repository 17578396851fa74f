//! CLI binary for guide2pdf.
//!
//! A thin shim over the library crate that maps CLI flags to
//! `PipelineConfig`, turns each input file into a request, and writes the
//! resulting artifacts.

use anyhow::{Context, Result};
use clap::Parser;
use futures::stream::{self, StreamExt};
use guide2pdf::pipeline::decode::decode;
use guide2pdf::{
    write_artifact, Artifact, ColumnStrategy, ConvertRequest, GuideRequest, InboundRequest,
    JobProgressCallback, JobReport, OutputFormat, Pipeline, PipelineConfig, ProgressCallback,
    RendererKind, ThemeId,
};
use indicatif::{ProgressBar, ProgressStyle};
use serde::Serialize;
use std::collections::HashMap;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn red(s: &str) -> String {
    format!("\x1b[31m{s}\x1b[0m")
}
fn dim(s: &str) -> String {
    format!("\x1b[2m{s}\x1b[0m")
}
fn bold(s: &str) -> String {
    format!("\x1b[1m{s}\x1b[0m")
}
fn cyan(s: &str) -> String {
    format!("\x1b[36m{s}\x1b[0m")
}

// ── CLI progress callback using indicatif ────────────────────────────────────

/// Terminal progress callback: a spinner showing the renderer currently
/// running, plus one log line per failed or successful attempt. Jobs may
/// interleave when several inputs are in flight.
struct CliProgressCallback {
    bar: ProgressBar,
    failed_attempts: AtomicUsize,
}

impl CliProgressCallback {
    fn new() -> Arc<Self> {
        let bar = ProgressBar::new_spinner();
        let style = ProgressStyle::with_template("{spinner:.cyan} {prefix:.bold}  {msg}  ⏱ {elapsed}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"]);

        bar.set_style(style);
        bar.set_prefix("Rendering");
        bar.set_message("Preparing…");
        bar.enable_steady_tick(Duration::from_millis(80));

        Arc::new(Self {
            bar,
            failed_attempts: AtomicUsize::new(0),
        })
    }

    fn finish(&self) {
        self.bar.finish_and_clear();
        let failed = self.failed_attempts.load(Ordering::SeqCst);
        if failed > 0 {
            eprintln!("{} {} renderer attempts failed", cyan("⚠"), failed);
        }
    }
}

impl JobProgressCallback for CliProgressCallback {
    fn on_job_start(&self, job_id: &str, input_len: usize) {
        self.bar
            .set_message(format!("{job_id} {}", dim(&format!("({input_len} bytes)"))));
    }

    fn on_attempt_start(&self, job_id: &str, renderer: &str, attempt: usize, total: usize) {
        self.bar
            .set_message(format!("{job_id} → {renderer} ({attempt}/{total})"));
    }

    fn on_attempt_failed(&self, job_id: &str, renderer: &str, error: &str) {
        self.failed_attempts.fetch_add(1, Ordering::SeqCst);

        // Truncate very long error messages to keep output tidy.
        let msg: String = if error.chars().count() > 80 {
            let head: String = error.chars().take(79).collect();
            format!("{head}\u{2026}")
        } else {
            error.to_string()
        };

        self.bar.println(format!(
            "  {} {:<8} {}  {}",
            red("✗"),
            renderer,
            red(&msg),
            dim(job_id),
        ));
    }

    fn on_attempt_succeeded(&self, job_id: &str, renderer: &str, output_len: usize) {
        self.bar.println(format!(
            "  {} {:<8} {}  {}",
            green("✓"),
            renderer,
            dim(&format!("{output_len:>8} bytes")),
            dim(job_id),
        ));
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Study guide from a text file (writes notes.pdf)
  guide2pdf notes.txt

  # Pick a theme, a title and an output path
  guide2pdf --theme accent --title "Cell Biology" notes.md -o biology.pdf

  # Table-emulated columns, .docx only (no renderer needed)
  guide2pdf --layout table --format docx notes.md

  # Convert an existing .docx to PDF
  guide2pdf report.docx -o report.pdf

  # Replay a JSON request body ({"title","content"} or {"docxBuffer"})
  guide2pdf request.json --json

  # Show the paragraphs of a .docx
  guide2pdf --inspect-only report.docx

  # Several inputs, two at a time, into one directory
  guide2pdf --concurrency 2 -o out/ a.txt b.txt c.docx

INPUTS:
  .docx         converted to PDF directly (output name: converted.pdf in JSON mode)
  .json         request body; dispatched on the presence of "docxBuffer"
  anything else study-guide text; the title defaults to the file stem

THEMES:
  formal     Times New Roman, black, justified (default)
  accent     rotating colour palette, left borders, bullets
  underline  navy headers with a bottom rule
  banner     white header text on a solid fill
  heading    headers become Heading 1–6 styles

RENDERERS:
  soffice is tried first, then pandoc (--pdf-engine, default wkhtmltopdf).
  Each attempt is bounded by --render-timeout; temporary files are always
  removed.

ENVIRONMENT VARIABLES:
  Every flag can be set through GUIDE2PDF_<FLAG>, e.g. GUIDE2PDF_THEME=banner.
  RUST_LOG overrides --verbose / --quiet.
"#;

/// Turn study-guide text into themed two-column PDFs.
#[derive(Parser, Debug)]
#[command(
    name = "guide2pdf",
    version,
    about = "Turn study-guide text into themed two-column PDFs",
    long_about = "Classify study-guide text into headers and body paragraphs, style them with a \
theme, lay them out in two columns, and render the result to PDF through LibreOffice or pandoc. \
Existing .docx files can be converted directly.",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// Text, markdown, .docx or .json request files.
    #[arg(required = true)]
    inputs: Vec<PathBuf>,

    /// Output file (one input) or directory (several inputs).
    #[arg(short, long, env = "GUIDE2PDF_OUTPUT")]
    output: Option<PathBuf>,

    /// Document title. Defaults to the input file stem.
    #[arg(short, long, env = "GUIDE2PDF_TITLE")]
    title: Option<String>,

    /// Visual theme.
    #[arg(long, env = "GUIDE2PDF_THEME", value_enum, default_value = "formal")]
    theme: ThemeArg,

    /// Two-column strategy: native section columns or two-cell table rows.
    #[arg(long, env = "GUIDE2PDF_LAYOUT", value_enum, default_value = "native")]
    layout: LayoutArg,

    /// Artifact format for study-guide inputs: pdf or docx.
    #[arg(long, env = "GUIDE2PDF_FORMAT", default_value = "pdf")]
    format: OutputFormat,

    /// LibreOffice executable.
    #[arg(long, env = "GUIDE2PDF_SOFFICE", default_value = "soffice")]
    soffice: PathBuf,

    /// pandoc executable.
    #[arg(long, env = "GUIDE2PDF_PANDOC", default_value = "pandoc")]
    pandoc: PathBuf,

    /// PDF engine passed to pandoc.
    #[arg(long, env = "GUIDE2PDF_PDF_ENGINE", default_value = "wkhtmltopdf")]
    pdf_engine: String,

    /// Per-attempt renderer timeout in seconds.
    #[arg(long, env = "GUIDE2PDF_RENDER_TIMEOUT", default_value_t = 120,
          value_parser = clap::value_parser!(u64).range(1..))]
    render_timeout: u64,

    /// Renderer processes allowed at once.
    #[arg(long, env = "GUIDE2PDF_MAX_RENDERS", default_value_t = 4,
          value_parser = clap::value_parser!(u64).range(1..))]
    max_renders: u64,

    /// Input files processed concurrently.
    #[arg(short, long, env = "GUIDE2PDF_CONCURRENCY", default_value_t = 2)]
    concurrency: usize,

    /// Directory for temporary job files. Defaults to the system temp dir.
    #[arg(long, env = "GUIDE2PDF_TEMP_DIR")]
    temp_dir: Option<PathBuf>,

    /// Print one JSON result per input on stdout.
    #[arg(long, env = "GUIDE2PDF_JSON")]
    json: bool,

    /// Print the paragraphs of .docx inputs, no conversion.
    #[arg(long)]
    inspect_only: bool,

    /// Disable the progress spinner.
    #[arg(long, env = "GUIDE2PDF_NO_PROGRESS")]
    no_progress: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, env = "GUIDE2PDF_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, env = "GUIDE2PDF_QUIET")]
    quiet: bool,
}

#[derive(clap::ValueEnum, Clone, Copy, Debug)]
enum ThemeArg {
    Formal,
    Accent,
    Underline,
    Banner,
    Heading,
}

impl From<ThemeArg> for ThemeId {
    fn from(v: ThemeArg) -> Self {
        match v {
            ThemeArg::Formal => ThemeId::Formal,
            ThemeArg::Accent => ThemeId::Accent,
            ThemeArg::Underline => ThemeId::Underline,
            ThemeArg::Banner => ThemeId::Banner,
            ThemeArg::Heading => ThemeId::Heading,
        }
    }
}

#[derive(clap::ValueEnum, Clone, Copy, Debug)]
enum LayoutArg {
    Native,
    Table,
}

impl From<LayoutArg> for ColumnStrategy {
    fn from(v: LayoutArg) -> Self {
        match v {
            LayoutArg::Native => ColumnStrategy::Native,
            LayoutArg::Table => ColumnStrategy::Table,
        }
    }
}

/// One line of `--json` output.
#[derive(Serialize)]
struct InputResult {
    input: PathBuf,
    #[serde(skip_serializing_if = "Option::is_none")]
    output: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    filename: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    content_type: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    bytes: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    report: Option<JobReport>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<guide2pdf::ErrorResponse>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    // Suppress INFO-level library logs when the spinner is active; the
    // per-attempt lines carry the feedback that matters to the user.
    let show_progress = !cli.quiet && !cli.no_progress && !cli.json && !cli.inspect_only;
    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet || show_progress {
        "error"
    } else {
        "info"
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    // ── Inspect-only mode ────────────────────────────────────────────────
    if cli.inspect_only {
        for input in &cli.inputs {
            inspect(input, cli.json).await?;
        }
        return Ok(());
    }

    check_output_clashes(&cli)?;

    // ── Build pipeline ───────────────────────────────────────────────────
    let progress = show_progress.then(CliProgressCallback::new);
    let config = build_config(
        &cli,
        progress
            .as_ref()
            .map(|cb| Arc::clone(cb) as Arc<dyn JobProgressCallback>),
    )?;
    let pipeline = Pipeline::new(config);

    // ── Run ──────────────────────────────────────────────────────────────
    let started = Instant::now();
    let multiple = cli.inputs.len() > 1;
    let results: Vec<InputResult> = stream::iter(cli.inputs.iter())
        .map(|input| process(&pipeline, &cli, input, multiple))
        .buffer_unordered(cli.concurrency.max(1))
        .collect()
        .await;

    if let Some(ref cb) = progress {
        cb.finish();
    }

    let failed = results.iter().filter(|r| r.error.is_some()).count();
    for r in &results {
        if cli.json {
            println!(
                "{}",
                serde_json::to_string(r).context("Failed to serialise result")?
            );
        } else if let Some(ref e) = r.error {
            eprintln!(
                "{} {}  {}",
                red("✘"),
                r.input.display(),
                red(e.details.as_deref().unwrap_or(&e.error))
            );
        } else if !cli.quiet {
            let renderer = r
                .report
                .as_ref()
                .map(|rep| format!("  via {}", rep.renderer))
                .unwrap_or_default();
            eprintln!(
                "{}  {}  →  {}  {}{}",
                green("✔"),
                r.input.display(),
                bold(&r.output.as_deref().unwrap_or(Path::new("-")).display().to_string()),
                dim(&format!("{} bytes", r.bytes.unwrap_or(0))),
                dim(&renderer),
            );
        }
    }

    if !cli.quiet && !cli.json && multiple {
        eprintln!(
            "{}/{} inputs in {}ms",
            results.len() - failed,
            results.len(),
            started.elapsed().as_millis()
        );
    }

    if failed > 0 {
        anyhow::bail!("{failed} of {} inputs failed", results.len());
    }
    Ok(())
}

/// Map CLI args to `PipelineConfig`.
fn build_config(cli: &Cli, progress: Option<ProgressCallback>) -> Result<PipelineConfig> {
    let renderers = vec![
        RendererKind::Soffice {
            program: cli.soffice.clone(),
        },
        RendererKind::Pandoc {
            program: cli.pandoc.clone(),
            pdf_engine: cli.pdf_engine.clone(),
        },
    ];

    let mut builder = PipelineConfig::builder()
        .theme(cli.theme.into())
        .layout(cli.layout.into())
        .renderers(renderers)
        .render_timeout_secs(cli.render_timeout)
        .max_concurrent_renders(cli.max_renders as usize);

    if let Some(ref dir) = cli.temp_dir {
        builder = builder.temp_dir(dir);
    }
    if let Some(ref title) = cli.title {
        builder = builder.default_title(title);
    }
    if let Some(cb) = progress {
        builder = builder.progress_callback(cb);
    }

    builder.build().context("Invalid configuration")
}

/// The request an input file stands for.
async fn read_request(cli: &Cli, input: &Path) -> Result<InboundRequest> {
    let ext = extension(input);
    match ext.as_str() {
        "docx" => {
            let bytes = tokio::fs::read(input)
                .await
                .with_context(|| format!("Failed to read {}", input.display()))?;
            Ok(InboundRequest::Convert(ConvertRequest::from_bytes(&bytes)))
        }
        "json" => {
            let body = tokio::fs::read_to_string(input)
                .await
                .with_context(|| format!("Failed to read {}", input.display()))?;
            Ok(InboundRequest::from_json(&body)?)
        }
        _ => {
            let content = tokio::fs::read_to_string(input)
                .await
                .with_context(|| format!("Failed to read {}", input.display()))?;
            let title = cli.title.clone().or_else(|| {
                input
                    .file_stem()
                    .map(|s| s.to_string_lossy().into_owned())
            });
            Ok(InboundRequest::Guide(GuideRequest {
                title,
                content: Some(content),
                ..Default::default()
            }))
        }
    }
}

/// Where the artifact for `input` is written.
///
/// One input: `--output` as given, else next to the input. Several inputs:
/// inside the `--output` directory, else next to each input.
fn output_path(cli: &Cli, input: &Path, artifact: &Artifact, multiple: bool) -> PathBuf {
    let ext = Path::new(&artifact.filename)
        .extension()
        .map(|e| e.to_string_lossy().into_owned())
        .unwrap_or_else(|| "pdf".to_string());
    let beside_input = input.with_extension(&ext);

    match cli.output {
        Some(ref out) if !multiple => out.clone(),
        Some(ref dir) => dir.join(beside_input.file_name().unwrap_or_default()),
        None => beside_input,
    }
}

/// Reject runs in which two inputs would write the same output file.
///
/// Outputs are named `<dir>/<stem>.<ext>`, so inputs sharing a stem and a
/// destination directory collide whatever their extensions.
fn check_output_clashes(cli: &Cli) -> Result<()> {
    if cli.inputs.len() < 2 {
        return Ok(());
    }
    let mut seen: HashMap<PathBuf, &Path> = HashMap::new();
    for input in &cli.inputs {
        let dir = match cli.output {
            Some(ref out) => out.as_path(),
            None => input.parent().unwrap_or_else(|| Path::new("")),
        };
        let target = dir.join(input.file_stem().unwrap_or_default());
        if let Some(previous) = seen.insert(target.clone(), input) {
            anyhow::bail!(
                "{} and {} would both be written to {}.*; rename one or convert them separately",
                previous.display(),
                input.display(),
                target.display()
            );
        }
    }
    Ok(())
}

async fn process(pipeline: &Pipeline, cli: &Cli, input: &Path, multiple: bool) -> InputResult {
    let mut result = InputResult {
        input: input.to_path_buf(),
        output: None,
        filename: None,
        content_type: None,
        bytes: None,
        report: None,
        error: None,
    };

    let outcome = async {
        let request = read_request(cli, input).await?;
        let artifact = pipeline.handle(&request, cli.format).await?;
        let path = output_path(cli, input, &artifact, multiple);
        write_artifact(&artifact, &path).await?;
        anyhow::Ok((artifact, path))
    }
    .await;

    match outcome {
        Ok((artifact, path)) => {
            result.output = Some(path);
            result.bytes = Some(artifact.bytes.len());
            result.filename = Some(artifact.filename);
            result.content_type = Some(artifact.content_type);
            result.report = artifact.report;
        }
        Err(e) => {
            let response = match e.downcast_ref::<guide2pdf::Guide2PdfError>() {
                Some(err) => err.response().1,
                None => guide2pdf::ErrorResponse {
                    error: "Failed to read input".to_string(),
                    details: Some(format!("{e:#}")),
                },
            };
            result.error = Some(response);
        }
    }
    result
}

/// Print the decoded paragraphs of a `.docx`.
async fn inspect(input: &Path, json: bool) -> Result<()> {
    let bytes = tokio::fs::read(input)
        .await
        .with_context(|| format!("Failed to read {}", input.display()))?;
    let paragraphs = decode(&bytes).with_context(|| format!("Failed to inspect {}", input.display()))?;

    if json {
        println!(
            "{}",
            serde_json::to_string_pretty(&paragraphs).context("Failed to serialise paragraphs")?
        );
        return Ok(());
    }

    println!("File:         {}", input.display());
    println!("Paragraphs:   {}", paragraphs.len());
    println!(
        "In tables:    {}",
        paragraphs.iter().filter(|p| p.in_table).count()
    );
    for p in &paragraphs {
        let style = p.style.as_deref().unwrap_or("-");
        let text: String = p
            .runs
            .iter()
            .map(|r| if r.bold { bold(&r.text) } else { r.text.clone() })
            .collect();
        println!("  {:<9} {}", dim(style), text.replace('\n', " ⏎ "));
    }
    Ok(())
}

fn extension(path: &Path) -> String {
    path.extension()
        .map(|e| e.to_string_lossy().to_lowercase())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cli(args: &[&str]) -> Cli {
        Cli::parse_from(std::iter::once("guide2pdf").chain(args.iter().copied()))
    }

    fn artifact(filename: &str) -> Artifact {
        Artifact {
            bytes: vec![],
            content_type: guide2pdf::PDF_CONTENT_TYPE,
            filename: filename.into(),
            report: None,
        }
    }

    #[test]
    fn defaults_map_to_config() {
        let c = cli(&["notes.txt"]);
        let config = build_config(&c, None).unwrap();
        assert_eq!(config.theme, ThemeId::Formal);
        assert_eq!(config.layout, ColumnStrategy::Native);
        assert_eq!(config.render_timeout_secs, 120);
        assert_eq!(config.max_concurrent_renders, 4);
        assert_eq!(c.format, OutputFormat::Pdf);
    }

    #[test]
    fn flags_map_to_config() {
        let c = cli(&[
            "--theme", "banner", "--layout", "table", "--pdf-engine", "weasyprint",
            "--render-timeout", "30", "notes.txt",
        ]);
        let config = build_config(&c, None).unwrap();
        assert_eq!(config.theme, ThemeId::Banner);
        assert_eq!(config.layout, ColumnStrategy::Table);
        assert_eq!(config.render_timeout_secs, 30);
        assert!(matches!(
            &config.renderers[1],
            RendererKind::Pandoc { pdf_engine, .. } if pdf_engine == "weasyprint"
        ));
    }

    #[test]
    fn output_paths() {
        let single = cli(&["-o", "out.pdf", "notes.txt"]);
        assert_eq!(
            output_path(&single, Path::new("notes.txt"), &artifact("Notes.pdf"), false),
            PathBuf::from("out.pdf")
        );

        let beside = cli(&["--format", "docx", "dir/notes.md"]);
        assert_eq!(
            output_path(&beside, Path::new("dir/notes.md"), &artifact("x.docx"), false),
            PathBuf::from("dir/notes.docx")
        );

        let many = cli(&["-o", "out", "a.txt", "b.docx"]);
        assert_eq!(
            output_path(&many, Path::new("src/b.docx"), &artifact("converted.pdf"), true),
            PathBuf::from("out/b.pdf")
        );
    }

    #[test]
    fn clashing_outputs_are_rejected() {
        let err = check_output_clashes(&cli(&["-o", "out", "a/notes.md", "b/notes.md"])).unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("a/notes.md") && msg.contains("b/notes.md"), "got: {msg}");

        assert!(check_output_clashes(&cli(&["dir/notes.md", "dir/notes.txt"])).is_err());

        assert!(check_output_clashes(&cli(&["-o", "out", "a/notes.md", "b/summary.md"])).is_ok());
        assert!(check_output_clashes(&cli(&["a/notes.md", "b/notes.md"])).is_ok());
        assert!(check_output_clashes(&cli(&["-o", "out.pdf", "notes.md"])).is_ok());
    }

    #[tokio::test]
    async fn text_input_title_defaults_to_stem() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("Cell Biology.md");
        std::fs::write(&path, "Main Idea: cells").unwrap();

        let request = read_request(&cli(&["x"]), &path).await.unwrap();
        match request {
            InboundRequest::Guide(g) => {
                assert_eq!(g.title.as_deref(), Some("Cell Biology"));
                assert_eq!(g.content.as_deref(), Some("Main Idea: cells"));
            }
            other => panic!("expected guide request, got {other:?}"),
        }
    }
}
