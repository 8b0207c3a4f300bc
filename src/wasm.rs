//! Browser bindings. The page owns the DOM, the timers and localStorage; this
//! module owns validation, the re-save and the bookkeeping between them.

use wasm_bindgen::prelude::*;

use crate::compress::transform;
use crate::config::PipelineConfig;
use crate::delivery::{Download, DownloadSink};
use crate::engine::{LopdfEngine, SaveSettings};
use crate::error::PipelineError;
use crate::intake::{validate, CandidateFile, DEFAULT_MAX_BYTES, PDF_MEDIA_TYPE};
use crate::notify::{Notice, Notifier};
use crate::pipeline::Pipeline;
use crate::preferences::{self, Theme};
use crate::progress::ProgressSimulator;

fn to_js_error(err: &PipelineError) -> JsError {
    if let PipelineError::Transform(cause) | PipelineError::Unexpected(cause) = err {
        web_sys::console::error_1(&format!("{}: {:?}", err, cause).into());
    }
    JsError::new(&err.user_message())
}

fn random_seed() -> u64 {
    (js_sys::Math::random() * u64::MAX as f64) as u64
}

struct BrowserConsole;

impl Notifier for BrowserConsole {
    fn notify(&mut self, notice: Notice) {
        web_sys::console::warn_1(&format!("{:?}: {}", notice.kind, notice.message).into());
    }
}

#[derive(Default)]
struct CapturedDownload {
    file_name: String,
    bytes: Vec<u8>,
}

impl DownloadSink for CapturedDownload {
    fn deliver(&mut self, download: &Download<'_>) -> anyhow::Result<()> {
        self.file_name = download.file_name.clone();
        self.bytes = download.bytes.to_vec();
        Ok(())
    }
}

/// One-shot re-save with the default settings and size limit.
#[wasm_bindgen]
pub fn compress_pdf(input: &[u8]) -> Result<Vec<u8>, JsError> {
    let candidate = CandidateFile::from_bytes("document.pdf", PDF_MEDIA_TYPE, input.to_vec());
    let selected = validate(candidate, DEFAULT_MAX_BYTES).map_err(|e| to_js_error(&e))?;
    let bytes = selected
        .read_bytes(DEFAULT_MAX_BYTES)
        .map_err(|e| to_js_error(&e))?;
    let result =
        transform(&LopdfEngine, &bytes, &SaveSettings::default()).map_err(|e| to_js_error(&e))?;
    Ok(result.into_bytes())
}

/// The bookkeeping behind [`WebPipeline`], with errors kept typed.
struct WebSession<N> {
    pipeline: Pipeline<LopdfEngine, N>,
}

impl<N: Notifier> WebSession<N> {
    fn new(notifier: N, seed: u64) -> Self {
        let pipeline = Pipeline::new(PipelineConfig::default(), LopdfEngine, notifier)
            .with_rng(fastrand::Rng::with_seed(seed));
        Self { pipeline }
    }

    fn submit(
        &mut self,
        name: String,
        media_type: String,
        bytes: Vec<u8>,
    ) -> Result<bool, PipelineError> {
        let candidate = CandidateFile::from_bytes(name, media_type, bytes);
        if !self.pipeline.intake([candidate])? {
            return Ok(false);
        }
        self.pipeline.compress_detached()?;
        Ok(true)
    }

    fn download(&mut self) -> Result<WebDownload, PipelineError> {
        let mut captured = CapturedDownload::default();
        let report = self.pipeline.deliver(&mut captured)?;
        Ok(WebDownload {
            file_name: captured.file_name,
            bytes: captured.bytes,
            summary: report.to_string(),
        })
    }
}

#[wasm_bindgen]
pub struct WebPipeline {
    inner: WebSession<BrowserConsole>,
}

#[wasm_bindgen]
impl WebPipeline {
    #[wasm_bindgen(constructor)]
    pub fn new() -> WebPipeline {
        WebPipeline {
            inner: WebSession::new(BrowserConsole, random_seed()),
        }
    }

    /// Validates and re-saves a dropped or picked file. Resolves to `false`
    /// when no file was given.
    pub fn submit(
        &mut self,
        name: String,
        media_type: String,
        bytes: Vec<u8>,
    ) -> Result<bool, JsError> {
        self.inner
            .submit(name, media_type, bytes)
            .map_err(|e| to_js_error(&e))
    }

    #[wasm_bindgen(getter)]
    pub fn busy(&self) -> bool {
        !self.inner.pipeline.accepts_intake()
    }

    #[wasm_bindgen(getter)]
    pub fn state(&self) -> String {
        format!("{:?}", self.inner.pipeline.state())
    }

    /// Hands over the compressed file and resets for the next one.
    pub fn download(&mut self) -> Result<WebDownload, JsError> {
        self.inner.download().map_err(|e| to_js_error(&e))
    }
}

impl Default for WebPipeline {
    fn default() -> Self {
        Self::new()
    }
}

#[wasm_bindgen]
pub struct WebDownload {
    file_name: String,
    bytes: Vec<u8>,
    summary: String,
}

#[wasm_bindgen]
impl WebDownload {
    #[wasm_bindgen(getter)]
    pub fn file_name(&self) -> String {
        self.file_name.clone()
    }

    #[wasm_bindgen(getter)]
    pub fn media_type(&self) -> String {
        PDF_MEDIA_TYPE.to_string()
    }

    #[wasm_bindgen(getter)]
    pub fn bytes(&self) -> js_sys::Uint8Array {
        js_sys::Uint8Array::from(&self.bytes[..])
    }

    #[wasm_bindgen(getter)]
    pub fn summary(&self) -> String {
        self.summary.clone()
    }
}

/// Simulated progress for a `setInterval` on the page. Call `complete` once
/// the real work resolves.
#[wasm_bindgen]
pub struct WebProgress {
    simulator: ProgressSimulator,
}

#[wasm_bindgen]
impl WebProgress {
    #[wasm_bindgen(constructor)]
    pub fn new() -> WebProgress {
        WebProgress::seeded(random_seed())
    }

    /// Advances one step. Returns `false` once the run is over.
    pub fn tick(&mut self) -> bool {
        self.simulator.tick().is_some()
    }

    pub fn complete(&mut self) {
        self.simulator.complete();
    }

    #[wasm_bindgen(getter)]
    pub fn percent(&self) -> f64 {
        self.simulator.state().percent
    }

    #[wasm_bindgen(getter)]
    pub fn label(&self) -> String {
        self.simulator.state().phase.label().to_string()
    }

    #[wasm_bindgen(getter)]
    pub fn finished(&self) -> bool {
        self.simulator.is_finished()
    }
}

impl WebProgress {
    fn seeded(seed: u64) -> WebProgress {
        let config = PipelineConfig::default();
        let simulator = ProgressSimulator::seeded(seed)
            .with_max_increment(config.max_increment)
            .with_ceiling(config.progress_ceiling);
        WebProgress { simulator }
    }
}

impl Default for WebProgress {
    fn default() -> Self {
        Self::new()
    }
}

#[wasm_bindgen]
pub fn resolve_theme(saved: Option<String>, system_prefers_dark: bool) -> String {
    let saved = saved.and_then(|s| s.parse::<Theme>().ok());
    preferences::resolve_theme(saved, system_prefers_dark).to_string()
}

#[wasm_bindgen]
pub fn toggle_theme(current: &str) -> Result<String, JsError> {
    let theme = current
        .parse::<Theme>()
        .map_err(|e| JsError::new(&e.to_string()))?;
    Ok(theme.toggled().to_string())
}
