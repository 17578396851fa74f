//! PDF rendering: encoded `.docx` bytes → PDF bytes via external programs.
//!
//! ## Why a renderer chain?
//!
//! Office-to-PDF conversion is delegated to programs we do not control.
//! LibreOffice gives the most faithful output but is heavy and occasionally
//! fails to start; pandoc is lighter but loses some layout. The
//! [`Orchestrator`] tries each [`Renderer`] in priority order and the first
//! one that leaves a readable, non-empty PDF wins.
//!
//! ## Why argument vectors?
//!
//! Every invocation is a `tokio::process::Command` with one argument per
//! element. Nothing passes through a shell, so paths containing spaces or
//! metacharacters are never re-interpreted. Paths are made absolute before
//! they are handed over so a file name can never be parsed as an option.
//!
//! ## Temp-file lifecycle
//!
//! Each job owns two files in the configured temp dir: the input
//! (`guide2pdf-<random>.docx`, created exclusively by `tempfile`) and the
//! output (same stem, `.pdf`), plus a scratch directory (same stem,
//! `.profile`) that soffice uses as its user profile. LibreOffice refuses to
//! start a second instance on a profile that is already in use, so every job
//! gets its own. [`ConversionJob::cleanup`] removes all three on every exit
//! path; its `Drop` impl repeats the removal if the job future is cancelled
//! before cleanup ran.

use crate::error::{CleanupWarning, Guide2PdfError, RenderFailure};
use crate::progress::ProgressCallback;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::process::Command;
use tokio::sync::Semaphore;
use tracing::{debug, info, warn};
use url::Url;

/// Longest stderr excerpt kept in a [`RenderFailure`].
const STDERR_TAIL_CHARS: usize = 2000;

/// Per-job scratch directory next to the job's input file.
pub fn profile_dir(input: &Path) -> PathBuf {
    input.with_extension("profile")
}

/// Converts a document file into a PDF file.
///
/// Implementations write the PDF to `output` and return `Ok(())`, or
/// describe why they could not. The orchestrator bounds every call with its
/// per-attempt timeout and checks the output file afterwards.
#[async_trait]
pub trait Renderer: Send + Sync {
    /// Short identifier used in logs, reports and errors.
    fn name(&self) -> &str;

    async fn render(&self, input: &Path, output: &Path) -> Result<(), RenderFailure>;
}

// ── Built-in renderers ───────────────────────────────────────────────────

/// LibreOffice in headless mode.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SofficeRenderer {
    pub program: PathBuf,
}

impl Default for SofficeRenderer {
    fn default() -> Self {
        Self {
            program: PathBuf::from("soffice"),
        }
    }
}

impl SofficeRenderer {
    /// The process invocation for one conversion.
    ///
    /// soffice chooses the output name itself (`<outdir>/<stem>.pdf`), so
    /// only the directory of `output` is passed. The user profile lives in
    /// [`profile_dir`] so concurrent conversions never share one.
    pub fn command(&self, input: &Path, output: &Path) -> Result<Command, RenderFailure> {
        let outdir = output.parent().unwrap_or_else(|| Path::new("."));
        let profile = Url::from_directory_path(profile_dir(input)).map_err(|()| {
            RenderFailure::Spawn {
                renderer: self.name().to_string(),
                detail: format!("cannot express '{}' as a file URL", input.display()),
            }
        })?;

        let mut cmd = Command::new(&self.program);
        cmd.arg(format!("-env:UserInstallation={profile}"))
            .arg("--headless")
            .arg("--convert-to")
            .arg("pdf")
            .arg("--outdir")
            .arg(outdir)
            .arg(input);
        Ok(cmd)
    }

    fn produced_path(input: &Path, output: &Path) -> PathBuf {
        let outdir = output.parent().unwrap_or_else(|| Path::new("."));
        let stem = input
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        outdir.join(format!("{stem}.pdf"))
    }
}

#[async_trait]
impl Renderer for SofficeRenderer {
    fn name(&self) -> &str {
        "soffice"
    }

    async fn render(&self, input: &Path, output: &Path) -> Result<(), RenderFailure> {
        run_process(self.name(), self.command(input, output)?).await?;

        let produced = Self::produced_path(input, output);
        if produced != output {
            tokio::fs::rename(&produced, output)
                .await
                .map_err(|_| RenderFailure::MissingOutput {
                    renderer: self.name().to_string(),
                    path: produced,
                })?;
        }
        Ok(())
    }
}

/// pandoc with an external PDF engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PandocRenderer {
    pub program: PathBuf,
    pub pdf_engine: String,
}

impl Default for PandocRenderer {
    fn default() -> Self {
        Self {
            program: PathBuf::from("pandoc"),
            pdf_engine: "wkhtmltopdf".to_string(),
        }
    }
}

impl PandocRenderer {
    pub fn command(&self, input: &Path, output: &Path) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.arg(input)
            .arg("-o")
            .arg(output)
            .arg(format!("--pdf-engine={}", self.pdf_engine));
        cmd
    }
}

#[async_trait]
impl Renderer for PandocRenderer {
    fn name(&self) -> &str {
        "pandoc"
    }

    async fn render(&self, input: &Path, output: &Path) -> Result<(), RenderFailure> {
        run_process(self.name(), self.command(input, output)).await
    }
}

/// Run a renderer process to completion, capturing stderr.
///
/// The child is killed if the returned future is dropped, which is how the
/// orchestrator's timeout reaps hung renderers.
async fn run_process(renderer: &str, mut cmd: Command) -> Result<(), RenderFailure> {
    cmd.stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::piped())
        .kill_on_drop(true);

    debug!("{renderer}: {:?}", cmd.as_std());

    let out = cmd.output().await.map_err(|e| RenderFailure::Spawn {
        renderer: renderer.to_string(),
        detail: e.to_string(),
    })?;

    if out.status.success() {
        Ok(())
    } else {
        Err(RenderFailure::NonZeroExit {
            renderer: renderer.to_string(),
            code: out.status.code(),
            stderr: stderr_tail(&out.stderr),
        })
    }
}

fn stderr_tail(stderr: &[u8]) -> String {
    let text = String::from_utf8_lossy(stderr);
    let text = text.trim();
    let skip = text.chars().count().saturating_sub(STDERR_TAIL_CHARS);
    text.chars().skip(skip).collect()
}

/// A configurable built-in renderer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RendererKind {
    Soffice {
        program: PathBuf,
    },
    Pandoc {
        program: PathBuf,
        pdf_engine: String,
    },
}

impl RendererKind {
    pub fn soffice() -> Self {
        RendererKind::Soffice {
            program: SofficeRenderer::default().program,
        }
    }

    pub fn pandoc() -> Self {
        let d = PandocRenderer::default();
        RendererKind::Pandoc {
            program: d.program,
            pdf_engine: d.pdf_engine,
        }
    }

    /// `[soffice, pandoc/wkhtmltopdf]`.
    pub fn default_chain() -> Vec<Self> {
        vec![Self::soffice(), Self::pandoc()]
    }

    pub fn build(&self) -> Arc<dyn Renderer> {
        match self {
            RendererKind::Soffice { program } => Arc::new(SofficeRenderer {
                program: program.clone(),
            }),
            RendererKind::Pandoc {
                program,
                pdf_engine,
            } => Arc::new(PandocRenderer {
                program: program.clone(),
                pdf_engine: pdf_engine.clone(),
            }),
        }
    }
}

// ── Jobs ─────────────────────────────────────────────────────────────────

/// Lifecycle of a [`ConversionJob`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobState {
    Created,
    InputWritten,
    /// Trying the renderer at this chain index.
    Converting(usize),
    Succeeded,
    Failed,
    OutputRead,
    CleanedUp,
}

/// One conversion request's temporary files and state.
#[derive(Debug)]
pub struct ConversionJob {
    id: String,
    input_path: PathBuf,
    output_path: PathBuf,
    input_len: usize,
    state: JobState,
}

impl ConversionJob {
    /// Write `bytes` to a fresh, exclusively created file in `temp_dir`.
    pub fn create(temp_dir: &Path, bytes: &[u8]) -> Result<Self, Guide2PdfError> {
        let dir = std::path::absolute(temp_dir).map_err(|e| Guide2PdfError::TempFile {
            path: temp_dir.to_path_buf(),
            source: e,
        })?;
        std::fs::create_dir_all(&dir).map_err(|e| Guide2PdfError::TempFile {
            path: dir.clone(),
            source: e,
        })?;

        let mut file = tempfile::Builder::new()
            .prefix("guide2pdf-")
            .suffix(".docx")
            .rand_bytes(12)
            .tempfile_in(&dir)
            .map_err(|e| Guide2PdfError::TempFile {
                path: dir.clone(),
                source: e,
            })?;

        // a failed write drops the NamedTempFile, which removes it
        file.write_all(bytes)
            .and_then(|_| file.flush())
            .map_err(|e| Guide2PdfError::TempFile {
                path: file.path().to_path_buf(),
                source: e,
            })?;

        let (_, input_path) = file.keep().map_err(|e| Guide2PdfError::TempFile {
            path: dir.clone(),
            source: e.error,
        })?;

        let id = input_path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        let output_path = input_path.with_extension("pdf");

        debug!("Job {id}: wrote {} bytes to {}", bytes.len(), input_path.display());

        Ok(Self {
            id,
            input_path,
            output_path,
            input_len: bytes.len(),
            state: JobState::InputWritten,
        })
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn input_path(&self) -> &Path {
        &self.input_path
    }

    pub fn output_path(&self) -> &Path {
        &self.output_path
    }

    pub fn state(&self) -> JobState {
        self.state
    }

    /// Scratch directory renderers may create; see [`profile_dir`].
    pub fn profile_dir(&self) -> PathBuf {
        profile_dir(&self.input_path)
    }

    /// Remove both temporary files and the scratch directory. Missing
    /// entries are not an error.
    pub async fn cleanup(&mut self) -> Vec<CleanupWarning> {
        let profile = self.profile_dir();
        let removals = [
            (&self.input_path, tokio::fs::remove_file(&self.input_path).await),
            (&self.output_path, tokio::fs::remove_file(&self.output_path).await),
            (&profile, tokio::fs::remove_dir_all(&profile).await),
        ];

        let mut warnings = Vec::new();
        for (path, result) in removals {
            match result {
                Ok(()) => {}
                Err(e) if e.kind() == ErrorKind::NotFound => {}
                Err(e) => {
                    let warning = CleanupWarning {
                        path: path.clone(),
                        detail: e.to_string(),
                    };
                    warn!("Job {}: {warning}", self.id);
                    warnings.push(warning);
                }
            }
        }
        self.state = JobState::CleanedUp;
        warnings
    }
}

impl Drop for ConversionJob {
    fn drop(&mut self) {
        if self.state != JobState::CleanedUp {
            let _ = std::fs::remove_file(&self.input_path);
            let _ = std::fs::remove_file(&self.output_path);
            let _ = std::fs::remove_dir_all(self.profile_dir());
        }
    }
}

/// What happened during one successful job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobReport {
    pub job_id: String,
    /// Renderer that produced the output.
    pub renderer: String,
    /// Every renderer invoked, in order.
    pub attempted: Vec<String>,
    /// Attempts that failed before the winning one.
    pub failures: Vec<RenderFailure>,
    pub cleanup_warnings: Vec<CleanupWarning>,
    pub input_bytes: usize,
    pub output_bytes: usize,
    pub duration_ms: u64,
}

// ── Orchestrator ─────────────────────────────────────────────────────────

/// Runs conversion jobs against an ordered renderer chain.
pub struct Orchestrator {
    renderers: Vec<Arc<dyn Renderer>>,
    temp_dir: PathBuf,
    timeout: Duration,
    limiter: Arc<Semaphore>,
    progress: Option<ProgressCallback>,
}

impl std::fmt::Debug for Orchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Orchestrator")
            .field("renderers", &self.renderer_names())
            .field("temp_dir", &self.temp_dir)
            .field("timeout", &self.timeout)
            .field("available_permits", &self.limiter.available_permits())
            .finish()
    }
}

impl Orchestrator {
    /// `max_concurrent` bounds renderer processes across all jobs run by
    /// this orchestrator; it is raised to 1 if zero.
    pub fn new(
        renderers: Vec<Arc<dyn Renderer>>,
        temp_dir: impl Into<PathBuf>,
        timeout: Duration,
        max_concurrent: usize,
    ) -> Self {
        Self {
            renderers,
            temp_dir: temp_dir.into(),
            timeout,
            limiter: Arc::new(Semaphore::new(max_concurrent.max(1))),
            progress: None,
        }
    }

    pub fn with_progress(mut self, progress: ProgressCallback) -> Self {
        self.progress = Some(progress);
        self
    }

    pub fn renderer_names(&self) -> Vec<String> {
        self.renderers.iter().map(|r| r.name().to_string()).collect()
    }

    /// Convert one encoded document to PDF.
    ///
    /// Temporary files are gone when this returns, whatever the outcome.
    pub async fn convert(&self, docx: &[u8]) -> Result<(Vec<u8>, JobReport), Guide2PdfError> {
        let started = Instant::now();
        let mut job = ConversionJob::create(&self.temp_dir, docx)?;
        if let Some(ref cb) = self.progress {
            cb.on_job_start(&job.id, job.input_len);
        }

        let mut attempted = Vec::with_capacity(self.renderers.len());
        let mut failures = Vec::new();
        let outcome = self.run_chain(&mut job, &mut attempted, &mut failures).await;

        if outcome.is_ok() {
            job.state = JobState::OutputRead;
        }
        let cleanup_warnings = job.cleanup().await;
        if let Some(ref cb) = self.progress {
            cb.on_job_complete(&job.id, outcome.is_ok());
        }

        let elapsed = started.elapsed();
        match outcome {
            Ok((renderer, bytes)) => {
                info!(
                    "Job {}: rendered {} bytes with {} in {} ms ({} failed attempts)",
                    job.id,
                    bytes.len(),
                    renderer,
                    elapsed.as_millis(),
                    failures.len()
                );
                let report = JobReport {
                    job_id: job.id.clone(),
                    renderer,
                    attempted,
                    failures,
                    cleanup_warnings,
                    input_bytes: job.input_len,
                    output_bytes: bytes.len(),
                    duration_ms: elapsed.as_millis() as u64,
                };
                Ok((bytes, report))
            }
            Err(e) => {
                warn!("Job {}: {e}", job.id);
                Err(e)
            }
        }
    }

    async fn run_chain(
        &self,
        job: &mut ConversionJob,
        attempted: &mut Vec<String>,
        failures: &mut Vec<RenderFailure>,
    ) -> Result<(String, Vec<u8>), Guide2PdfError> {
        let total = self.renderers.len();

        for (i, renderer) in self.renderers.iter().enumerate() {
            let name = renderer.name().to_string();
            job.state = JobState::Converting(i);
            attempted.push(name.clone());
            if let Some(ref cb) = self.progress {
                cb.on_attempt_start(&job.id, &name, i + 1, total);
            }

            // a previous renderer may have left a partial file behind
            if let Err(e) = tokio::fs::remove_file(&job.output_path).await {
                if e.kind() != ErrorKind::NotFound {
                    debug!("Job {}: could not clear stale output: {e}", job.id);
                }
            }

            match self.attempt(renderer.as_ref(), job).await? {
                Ok(bytes) => {
                    job.state = JobState::Succeeded;
                    if let Some(ref cb) = self.progress {
                        cb.on_attempt_succeeded(&job.id, &name, bytes.len());
                    }
                    return Ok((name, bytes));
                }
                Err(failure) => {
                    warn!("Job {}: {failure}", job.id);
                    if let Some(ref cb) = self.progress {
                        cb.on_attempt_failed(&job.id, &name, &failure.to_string());
                    }
                    failures.push(failure);
                }
            }
        }

        job.state = JobState::Failed;
        let last_error = failures
            .last()
            .map(|f| f.to_string())
            .unwrap_or_else(|| "no renderers configured".to_string());
        Err(Guide2PdfError::ConversionExhausted {
            attempted: attempted.clone(),
            last_error,
        })
    }

    /// One bounded renderer attempt. The outer `Result` is for failures of
    /// the orchestrator itself; the inner one is the attempt's outcome.
    async fn attempt(
        &self,
        renderer: &dyn Renderer,
        job: &ConversionJob,
    ) -> Result<Result<Vec<u8>, RenderFailure>, Guide2PdfError> {
        let _permit = self
            .limiter
            .acquire()
            .await
            .map_err(|e| Guide2PdfError::Internal(format!("render limiter closed: {e}")))?;

        debug!(
            "Job {}: invoking {} (timeout {:?})",
            job.id,
            renderer.name(),
            self.timeout
        );

        let rendered =
            tokio::time::timeout(self.timeout, renderer.render(&job.input_path, &job.output_path))
                .await;

        Ok(match rendered {
            Ok(Ok(())) => read_output(renderer.name(), &job.output_path).await,
            Ok(Err(failure)) => Err(failure),
            Err(_) => Err(RenderFailure::Timeout {
                renderer: renderer.name().to_string(),
                secs: self.timeout.as_secs(),
            }),
        })
    }
}

async fn read_output(renderer: &str, path: &Path) -> Result<Vec<u8>, RenderFailure> {
    match tokio::fs::read(path).await {
        Ok(bytes) if !bytes.is_empty() => Ok(bytes),
        _ => Err(RenderFailure::MissingOutput {
            renderer: renderer.to_string(),
            path: path.to_path_buf(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::ffi::OsStr;

    fn args(cmd: &Command) -> Vec<&OsStr> {
        cmd.as_std().get_args().collect()
    }

    #[test]
    fn soffice_arguments() {
        let r = SofficeRenderer::default();
        let input = Path::new("/tmp/jobs/guide2pdf-abc.docx");
        let output = Path::new("/tmp/jobs/guide2pdf-abc.pdf");
        let cmd = r.command(input, output).unwrap();
        assert_eq!(cmd.as_std().get_program(), "soffice");
        assert_eq!(
            args(&cmd),
            vec![
                "-env:UserInstallation=file:///tmp/jobs/guide2pdf-abc.profile/",
                "--headless",
                "--convert-to",
                "pdf",
                "--outdir",
                "/tmp/jobs",
                "/tmp/jobs/guide2pdf-abc.docx"
            ]
        );
        assert_eq!(SofficeRenderer::produced_path(input, output), output);
    }

    #[test]
    fn soffice_profiles_are_per_job_and_url_encoded() {
        let r = SofficeRenderer::default();
        let a = r
            .command(Path::new("/tmp/my jobs/guide2pdf-a.docx"), Path::new("/tmp/my jobs/guide2pdf-a.pdf"))
            .unwrap();
        let b = r
            .command(Path::new("/tmp/my jobs/guide2pdf-b.docx"), Path::new("/tmp/my jobs/guide2pdf-b.pdf"))
            .unwrap();
        assert_eq!(args(&a)[0], "-env:UserInstallation=file:///tmp/my%20jobs/guide2pdf-a.profile/");
        assert_ne!(args(&a)[0], args(&b)[0]);
    }

    #[test]
    fn pandoc_arguments() {
        let r = PandocRenderer::default();
        let cmd = r.command(Path::new("/a b/in.docx"), Path::new("/a b/in.pdf"));
        assert_eq!(
            args(&cmd),
            vec!["/a b/in.docx", "-o", "/a b/in.pdf", "--pdf-engine=wkhtmltopdf"]
        );
    }

    #[test]
    fn default_chain_order() {
        let names: Vec<String> = RendererKind::default_chain()
            .iter()
            .map(|k| k.build().name().to_string())
            .collect();
        assert_eq!(names, vec!["soffice", "pandoc"]);
    }

    #[test]
    fn renderer_kind_serde() {
        let json = serde_json::to_string(&RendererKind::pandoc()).unwrap();
        assert!(json.contains(r#""kind":"pandoc""#), "got: {json}");
        let back: RendererKind = serde_json::from_str(&json).unwrap();
        assert_eq!(back, RendererKind::pandoc());
    }

    #[test]
    fn stderr_tail_keeps_the_end() {
        let long = format!("{}END", "x".repeat(STDERR_TAIL_CHARS * 2));
        let tail = stderr_tail(long.as_bytes());
        assert_eq!(tail.chars().count(), STDERR_TAIL_CHARS);
        assert!(tail.ends_with("END"));
        assert_eq!(stderr_tail(b"  short \n"), "short");
    }

    #[tokio::test]
    async fn job_names_are_unique_and_cleaned_up() {
        let dir = tempfile::tempdir().unwrap();
        let mut a = ConversionJob::create(dir.path(), b"one").unwrap();
        let b = ConversionJob::create(dir.path(), b"two").unwrap();

        assert_ne!(a.input_path(), b.input_path());
        assert!(a.input_path().is_absolute());
        assert_eq!(a.output_path(), a.input_path().with_extension("pdf"));
        assert_eq!(a.state(), JobState::InputWritten);
        assert_eq!(std::fs::read(a.input_path()).unwrap(), b"one");

        std::fs::write(a.output_path(), b"%PDF").unwrap();
        let profile = a.profile_dir();
        assert_eq!(profile, a.input_path().with_extension("profile"));
        std::fs::create_dir_all(profile.join("user")).unwrap();
        std::fs::write(profile.join("user/registrymodifications.xcu"), b"<x/>").unwrap();

        let warnings = a.cleanup().await;
        assert!(warnings.is_empty());
        assert_eq!(a.state(), JobState::CleanedUp);
        assert!(!a.input_path().exists());
        assert!(!a.output_path().exists());
        assert!(!profile.exists());

        let b_input = b.input_path().to_path_buf();
        drop(b);
        assert!(!b_input.exists(), "drop must remove the input");
    }

    #[tokio::test]
    async fn missing_program_is_a_spawn_failure() {
        let dir = tempfile::tempdir().unwrap();
        let r = PandocRenderer {
            program: PathBuf::from("guide2pdf-no-such-program"),
            pdf_engine: "none".into(),
        };
        let err = r
            .render(&dir.path().join("in.docx"), &dir.path().join("in.pdf"))
            .await
            .unwrap_err();
        assert!(matches!(err, RenderFailure::Spawn { .. }), "got: {err}");
        assert_eq!(err.renderer(), "pandoc");
    }
}
