use std::sync::mpsc;
use std::thread;

use anyhow::anyhow;

use crate::compress::{transform, CompressionResult};
use crate::config::PipelineConfig;
use crate::delivery::{DeliveryReport, Download, DownloadSink};
use crate::engine::{DocumentEngine, SaveSettings};
use crate::error::{PipelineError, Result};
use crate::intake::{select_first, validate, CandidateFile};
use crate::notify::{Notice, Notifier};
use crate::progress::{ProgressSimulator, ProgressState, ProgressTicker};
use crate::session::{PipelineState, Session};

/// Takes one PDF at a time from intake to download.
///
/// Every error returned from the public methods has already been reported to
/// the notifier once. A rejected intake leaves the session untouched.
pub struct Pipeline<E, N> {
    config: PipelineConfig,
    engine: E,
    notifier: N,
    session: Session,
    rng: fastrand::Rng,
}

impl<E, N> Pipeline<E, N>
where
    E: DocumentEngine + Sync,
    N: Notifier,
{
    pub fn new(config: PipelineConfig, engine: E, notifier: N) -> Self {
        Self {
            config,
            engine,
            notifier,
            session: Session::new(),
            rng: fastrand::Rng::new(),
        }
    }

    /// Seeds the progress simulation, for reproducible runs.
    pub fn with_rng(mut self, rng: fastrand::Rng) -> Self {
        self.rng = rng;
        self
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn state(&self) -> PipelineState {
        self.session.state()
    }

    pub fn accepts_intake(&self) -> bool {
        self.session.state().accepts_intake()
    }

    pub fn notifier(&self) -> &N {
        &self.notifier
    }

    /// Takes the first of `files` as the new subject. Returns `false` when
    /// there was nothing to take.
    ///
    /// The accepted file waits in `Validating` until [`Pipeline::compress`]
    /// runs. Further intake is refused as `Busy` until then, or until
    /// [`Pipeline::cancel`] drops the file.
    pub fn intake<I>(&mut self, files: I) -> Result<bool>
    where
        I: IntoIterator<Item = CandidateFile>,
    {
        let outcome = self.try_intake(files);
        self.reported(outcome)
    }

    /// Re-saves the selected file while `on_progress` receives the simulated
    /// progress. The last state it sees is always 100%.
    pub fn compress<F>(&mut self, on_progress: F) -> Result<&CompressionResult>
    where
        F: FnMut(ProgressState) + Send,
    {
        let outcome = self.try_compress(on_progress);
        self.reported(outcome)?;
        self.session
            .result()
            .ok_or(PipelineError::NoResultAvailable)
    }

    /// Like [`Pipeline::compress`], for callers that animate progress
    /// themselves (the browser front end runs its own timer).
    pub fn compress_detached(&mut self) -> Result<&CompressionResult> {
        let outcome = self.run_transform(transform::<E>);
        self.reported(outcome)?;
        self.session
            .result()
            .ok_or(PipelineError::NoResultAvailable)
    }

    /// Intake followed by compression. `Ok(None)` when `files` was empty.
    pub fn process<I, F>(&mut self, files: I, on_progress: F) -> Result<Option<&CompressionResult>>
    where
        I: IntoIterator<Item = CandidateFile>,
        F: FnMut(ProgressState) + Send,
    {
        if !self.intake(files)? {
            return Ok(None);
        }
        self.compress(on_progress).map(Some)
    }

    /// Drops a file that was taken in but not yet compressed. Returns `false`
    /// when there was nothing waiting.
    pub fn cancel(&mut self) -> bool {
        if self.session.state() != PipelineState::Validating {
            return false;
        }
        if let Some(file) = self.session.file() {
            log::info!("Dropped {} before compression", file.name());
        }
        self.session.clear();
        true
    }

    /// Hands the result to `sink`, then forgets both the file and the result.
    pub fn deliver<S>(&mut self, sink: &mut S) -> Result<DeliveryReport>
    where
        S: DownloadSink + ?Sized,
    {
        let outcome = self.try_deliver(sink);
        self.reported(outcome)
    }

    fn try_intake<I>(&mut self, files: I) -> Result<bool>
    where
        I: IntoIterator<Item = CandidateFile>,
    {
        let state = self.session.state();
        if !state.accepts_intake() {
            return Err(PipelineError::Busy(state));
        }
        let Some(candidate) = select_first(files) else {
            return Ok(false);
        };

        let selected = validate(candidate, self.config.max_bytes)?;
        log::info!("Accepted {} ({} bytes)", selected.name(), selected.len());
        self.session.begin(selected);
        Ok(true)
    }

    fn try_compress<F>(&mut self, on_progress: F) -> Result<()>
    where
        F: FnMut(ProgressState) + Send,
    {
        let simulator = ProgressSimulator::new(fastrand::Rng::with_seed(self.rng.u64(..)))
            .with_max_increment(self.config.max_increment)
            .with_ceiling(self.config.progress_ceiling);
        let ticker = ProgressTicker::new(simulator, self.config.tick);

        self.run_transform(move |engine, input, settings| {
            let (done_tx, done_rx) = mpsc::channel();
            thread::scope(|scope| {
                scope.spawn(move || ticker.run(done_rx, on_progress));
                let outcome = transform(engine, input, settings);
                let _ = done_tx.send(());
                outcome
            })
        })
    }

    fn run_transform<R>(&mut self, run: R) -> Result<()>
    where
        R: FnOnce(&E, &[u8], &SaveSettings) -> Result<CompressionResult>,
    {
        let file = match (self.session.state(), self.session.file()) {
            (PipelineState::Validating, Some(file)) => file.clone(),
            (state, _) => {
                return Err(anyhow!("No file waiting to be compressed (state {:?})", state).into())
            }
        };

        let input = match file.read_bytes(self.config.max_bytes) {
            Ok(input) => input,
            Err(e) => {
                self.session.fail();
                return Err(e);
            }
        };
        self.session.set_transforming();

        match run(&self.engine, &input[..], &self.config.save) {
            Ok(result) => {
                self.session.finish(result);
                Ok(())
            }
            Err(e) => {
                self.session.fail();
                Err(e)
            }
        }
    }

    fn try_deliver<S>(&mut self, sink: &mut S) -> Result<DeliveryReport>
    where
        S: DownloadSink + ?Sized,
    {
        let (file, result) = match (self.session.file(), self.session.result()) {
            (Some(file), Some(result)) => (file, result),
            _ => return Err(PipelineError::NoResultAvailable),
        };

        let download = Download::new(file.name(), result.bytes());
        sink.deliver(&download)?;
        let report = DeliveryReport::new(download.file_name, result.original_size(), result.size());

        self.session.clear();
        Ok(report)
    }

    fn reported<T>(&mut self, outcome: Result<T>) -> Result<T> {
        if let Err(err) = &outcome {
            match err {
                PipelineError::Transform(cause) | PipelineError::Unexpected(cause) => {
                    log::error!("{}: {:?}", err, cause)
                }
                _ => log::warn!("{}", err),
            }
            self.notifier
                .notify(Notice::from_error(err, self.config.notice_ttl));
        }
        outcome
    }
}
