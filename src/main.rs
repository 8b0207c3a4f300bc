use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use pdf_repack::intake::DEFAULT_MAX_BYTES;
use pdf_repack::notify::NOTICE_TTL;
use pdf_repack::preferences::{resolve_theme, toggle_theme, JsonFileStore, PreferenceStore};
use pdf_repack::{
    CandidateFile, ConsoleNotifier, DirectorySink, LopdfEngine, Notice, Notifier, Pipeline,
    PipelineConfig, PipelineError, ProgressState, SaveSettings,
};

/// Re-save PDFs with object streams
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Compress a PDF file into compressed_<name>
    Compress(CompressArgs),
    /// Show or toggle the saved color theme
    Theme {
        #[command(subcommand)]
        action: ThemeAction,
    },
}

#[derive(Args, Debug)]
struct CompressArgs {
    /// Input PDF file (only the first one is processed)
    #[arg(required = true)]
    inputs: Vec<PathBuf>,

    /// Output directory (defaults to the input's directory)
    #[arg(long)]
    out_dir: Option<PathBuf>,

    /// Largest accepted input, in bytes
    #[arg(long, default_value_t = DEFAULT_MAX_BYTES)]
    max_size: u64,

    /// Progress tick interval in milliseconds
    #[arg(long, default_value_t = 200)]
    tick_ms: u64,

    /// Objects packed into each object stream
    #[arg(long, default_value_t = 20)]
    objects_per_stream: usize,

    /// Deflate level for object streams (0-9)
    #[arg(long, default_value_t = 6, value_parser = clap::value_parser!(u32).range(0..=9))]
    compression_level: u32,

    /// Write a classic xref table without object streams
    #[arg(long)]
    no_object_streams: bool,

    /// Don't draw the progress bar
    #[arg(long)]
    quiet: bool,
}

impl CompressArgs {
    fn config(&self) -> PipelineConfig {
        PipelineConfig {
            max_bytes: self.max_size,
            tick: Duration::from_millis(self.tick_ms.max(1)),
            save: SaveSettings {
                use_object_streams: !self.no_object_streams,
                add_default_page: false,
                objects_per_stream: self.objects_per_stream,
                compression_level: self.compression_level,
            },
            ..PipelineConfig::default()
        }
    }
}

#[derive(Subcommand, Debug)]
enum ThemeAction {
    /// Print the effective theme
    Show(ThemeArgs),
    /// Switch between dark and light and save the choice
    Toggle(ThemeArgs),
}

#[derive(Args, Debug)]
struct ThemeArgs {
    /// Preferences file
    #[arg(long)]
    store: Option<PathBuf>,

    /// Treat the system color scheme as dark when nothing is saved
    #[arg(long)]
    system_dark: bool,
}

fn default_store_path() -> PathBuf {
    match std::env::var_os("HOME") {
        Some(home) => PathBuf::from(home)
            .join(".config")
            .join("pdf-repack")
            .join("preferences.json"),
        None => PathBuf::from(".pdf-repack.json"),
    }
}

fn draw_progress(state: ProgressState) {
    let filled = (state.percent / 5.0) as usize;
    eprint!("\r[{:<20}] {}", "#".repeat(filled), state);
    if state.percent >= 100.0 {
        eprintln!();
    }
}

fn compress(args: CompressArgs) -> Result<()> {
    let config = args.config();
    let first = CandidateFile::from_path(&args.inputs[0])?;
    let extras = args.inputs[1..]
        .iter()
        .filter_map(|path| CandidateFile::from_path(path).ok());
    let out_dir = match &args.out_dir {
        Some(dir) => dir.clone(),
        None => args.inputs[0]
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."))
            .to_path_buf(),
    };

    println!("Loading PDF: {:?}", args.inputs[0]);
    let mut pipeline = Pipeline::new(config, LopdfEngine, ConsoleNotifier);
    pipeline.intake(std::iter::once(first).chain(extras))?;

    let quiet = args.quiet;
    let start = Instant::now();
    pipeline.compress(move |state| {
        if !quiet {
            draw_progress(state)
        }
    })?;
    println!("Re-saved in {:.2?}", start.elapsed());

    let mut sink = DirectorySink::new(out_dir);
    let report = pipeline.deliver(&mut sink)?;
    println!("{}", report);
    if let Some(path) = sink.written().first() {
        println!("Saved {}", path.display());
    }

    Ok(())
}

fn theme(action: ThemeAction) -> Result<()> {
    let (args, toggle) = match action {
        ThemeAction::Show(args) => (args, false),
        ThemeAction::Toggle(args) => (args, true),
    };
    let mut store = JsonFileStore::new(args.store.unwrap_or_else(default_store_path));
    let saved = store
        .load_theme()
        .with_context(|| format!("Failed to load preferences from {}", store.path().display()))?;
    let current = resolve_theme(saved, args.system_dark);
    let theme = if toggle {
        toggle_theme(&mut store, current)?
    } else {
        current
    };
    println!("{}", theme);
    Ok(())
}

fn main() -> ExitCode {
    env_logger::init();
    let cli = Cli::parse();

    let outcome = match cli.command {
        Command::Compress(args) => compress(args),
        Command::Theme { action } => theme(action),
    };

    match outcome {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            // The pipeline already told the user about its own errors.
            if e.downcast_ref::<PipelineError>().is_none() {
                let err = PipelineError::Unexpected(e);
                log::error!("{:?}", err);
                ConsoleNotifier.notify(Notice::from_error(&err, NOTICE_TTL));
            }
            ExitCode::FAILURE
        }
    }
}
