use std::fmt;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use crate::intake::PDF_MEDIA_TYPE;

pub const OUTPUT_PREFIX: &str = "compressed_";

/// A finished file handed to whatever stands in for the browser download.
#[derive(Debug, Clone)]
pub struct Download<'a> {
    pub file_name: String,
    pub media_type: &'static str,
    pub bytes: &'a [u8],
}

impl<'a> Download<'a> {
    pub fn new(original_name: &str, bytes: &'a [u8]) -> Self {
        Self {
            file_name: output_name(original_name),
            media_type: PDF_MEDIA_TYPE,
            bytes,
        }
    }
}

pub fn output_name(original_name: &str) -> String {
    format!("{OUTPUT_PREFIX}{original_name}")
}

pub trait DownloadSink {
    fn deliver(&mut self, download: &Download<'_>) -> Result<()>;
}

/// Writes downloads into a directory under their own file name.
#[derive(Debug, Clone)]
pub struct DirectorySink {
    dir: PathBuf,
    written: Vec<PathBuf>,
}

impl DirectorySink {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            written: Vec::new(),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn written(&self) -> &[PathBuf] {
        &self.written
    }
}

impl DownloadSink for DirectorySink {
    fn deliver(&mut self, download: &Download<'_>) -> Result<()> {
        std::fs::create_dir_all(&self.dir)
            .with_context(|| format!("Failed to create {}", self.dir.display()))?;
        let path = self.dir.join(&download.file_name);
        std::fs::write(&path, download.bytes)
            .with_context(|| format!("Failed to write {}", path.display()))?;
        log::info!("Wrote {} ({} bytes)", path.display(), download.bytes.len());
        self.written.push(path);
        Ok(())
    }
}

/// Percentage saved, rounded to one decimal. Negative when the file grew.
pub fn size_reduction(original_size: u64, compressed_size: u64) -> f64 {
    if original_size == 0 {
        return 0.0;
    }
    let original = original_size as f64;
    let reduction = (original - compressed_size as f64) / original * 100.0;
    (reduction * 10.0).round() / 10.0
}

pub fn format_file_size(bytes: u64) -> String {
    const UNITS: [&str; 4] = ["Bytes", "KB", "MB", "GB"];
    if bytes == 0 {
        return "0 Bytes".to_string();
    }
    let mut value = bytes as f64;
    let mut exp = 0;
    while value >= 1024.0 && exp < UNITS.len() - 1 {
        value /= 1024.0;
        exp += 1;
    }
    let rounded = (value * 100.0).round() / 100.0;
    format!("{} {}", rounded, UNITS[exp])
}

#[derive(Debug, Clone, PartialEq)]
pub struct DeliveryReport {
    pub file_name: String,
    pub original_size: u64,
    pub compressed_size: u64,
    pub reduction: f64,
}

impl DeliveryReport {
    pub fn new(file_name: String, original_size: u64, compressed_size: u64) -> Self {
        Self {
            file_name,
            original_size,
            compressed_size,
            reduction: size_reduction(original_size, compressed_size),
        }
    }
}

impl fmt::Display for DeliveryReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let verb = if self.reduction < 0.0 {
            "Grew"
        } else {
            "Reduced"
        };
        write!(
            f,
            "{} by {:.1}% ({} → {})",
            verb,
            self.reduction.abs(),
            format_file_size(self.original_size),
            format_file_size(self.compressed_size)
        )
    }
}
