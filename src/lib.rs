//! Re-saves PDFs through lopdf with object streams and hands the result back
//! as `compressed_<name>`. Shared by the CLI and the browser build.

pub mod compress;
pub mod config;
pub mod delivery;
pub mod engine;
pub mod error;
pub mod intake;
pub mod notify;
pub mod pipeline;
pub mod preferences;
pub mod progress;
pub mod session;
pub mod wasm;

pub use compress::{transform, CompressionResult};
pub use config::PipelineConfig;
pub use delivery::{size_reduction, DeliveryReport, DirectorySink, Download, DownloadSink};
pub use engine::{DocumentEngine, LopdfEngine, SaveSettings};
pub use error::{ErrorKind, PipelineError};
pub use intake::{validate, CandidateFile, SelectedFile, PDF_MEDIA_TYPE};
pub use notify::{ConsoleNotifier, Notice, Notifier};
pub use pipeline::Pipeline;
pub use progress::{Phase, ProgressSimulator, ProgressState};
pub use session::{PipelineState, Session};
