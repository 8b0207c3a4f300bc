use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{anyhow, Context};

use crate::error::{PipelineError, Result};

pub const PDF_MEDIA_TYPE: &str = "application/pdf";

/// 10 MiB.
pub const DEFAULT_MAX_BYTES: u64 = 10 * 1024 * 1024;

#[derive(Debug, Clone)]
pub enum ByteSource {
    Memory(Arc<[u8]>),
    Path(PathBuf),
}

/// A file offered to the pipeline, before any checks.
#[derive(Debug, Clone)]
pub struct CandidateFile {
    name: String,
    media_type: String,
    len: u64,
    source: ByteSource,
}

impl CandidateFile {
    pub fn from_bytes(
        name: impl Into<String>,
        media_type: impl Into<String>,
        bytes: impl Into<Arc<[u8]>>,
    ) -> Self {
        let bytes = bytes.into();
        Self {
            name: name.into(),
            media_type: media_type.into(),
            len: bytes.len() as u64,
            source: ByteSource::Memory(bytes),
        }
    }

    /// Describes a file on disk without reading it. The media type comes from
    /// the extension, the length from the file's metadata.
    pub fn from_path(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let metadata = std::fs::metadata(path)
            .with_context(|| format!("Failed to stat {}", path.display()))?;
        if !metadata.is_file() {
            return Err(anyhow!("{} is not a regular file", path.display()));
        }
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .ok_or_else(|| anyhow!("{} has no file name", path.display()))?;

        Ok(Self {
            name,
            media_type: media_type_for_path(path).to_string(),
            len: metadata.len(),
            source: ByteSource::Path(path.to_path_buf()),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn media_type(&self) -> &str {
        &self.media_type
    }

    pub fn len(&self) -> u64 {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}

/// A candidate that passed intake. Always a PDF within the size limit.
#[derive(Debug, Clone)]
pub struct SelectedFile {
    name: String,
    len: u64,
    source: ByteSource,
}

impl SelectedFile {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn len(&self) -> u64 {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn media_type(&self) -> &'static str {
        PDF_MEDIA_TYPE
    }

    /// Materializes the file's bytes. A file on disk that grew past the limit
    /// since it was validated is rejected again.
    pub fn read_bytes(&self, max_bytes: u64) -> Result<Arc<[u8]>> {
        match &self.source {
            ByteSource::Memory(bytes) => Ok(Arc::clone(bytes)),
            ByteSource::Path(path) => {
                let bytes = std::fs::read(path)
                    .with_context(|| format!("Failed to read {}", path.display()))?;
                let size = bytes.len() as u64;
                if size > max_bytes {
                    return Err(PipelineError::TooLarge {
                        size,
                        limit: max_bytes,
                    });
                }
                if size != self.len {
                    log::warn!(
                        "{} changed size since intake ({} -> {} bytes)",
                        self.name,
                        self.len,
                        size
                    );
                }
                Ok(bytes.into())
            }
        }
    }
}

/// Checks the media type, then the size. Never touches the bytes.
pub fn validate(candidate: CandidateFile, max_bytes: u64) -> Result<SelectedFile> {
    if candidate.media_type != PDF_MEDIA_TYPE {
        return Err(PipelineError::InvalidType(candidate.media_type));
    }
    if candidate.len > max_bytes {
        return Err(PipelineError::TooLarge {
            size: candidate.len,
            limit: max_bytes,
        });
    }

    Ok(SelectedFile {
        name: candidate.name,
        len: candidate.len,
        source: candidate.source,
    })
}

/// Only one file is handled per intake; extra files are dropped.
pub fn select_first<I>(files: I) -> Option<CandidateFile>
where
    I: IntoIterator<Item = CandidateFile>,
{
    let mut files = files.into_iter();
    let first = files.next()?;
    for ignored in files {
        log::debug!("Ignoring additional file {}", ignored.name());
    }
    Some(first)
}

/// Media type a browser would declare for this path.
pub fn media_type_for_path(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .map(|e| e.to_string_lossy().to_ascii_lowercase())
        .unwrap_or_default();
    match ext.as_str() {
        "pdf" => PDF_MEDIA_TYPE,
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "txt" => "text/plain",
        "html" | "htm" => "text/html",
        "json" => "application/json",
        _ => "application/octet-stream",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use std::io::Write;

    fn pdf_of_len(len: usize) -> CandidateFile {
        CandidateFile::from_bytes("report.pdf", PDF_MEDIA_TYPE, vec![0u8; len])
    }

    #[rstest]
    #[case("image/png")]
    #[case("application/x-pdf")]
    #[case("APPLICATION/PDF")]
    #[case("")]
    fn rejects_other_media_types(#[case] media_type: &str) {
        let candidate = CandidateFile::from_bytes("report.pdf", media_type, vec![1, 2, 3]);
        let err = validate(candidate, DEFAULT_MAX_BYTES).unwrap_err();
        assert!(matches!(err, PipelineError::InvalidType(ref t) if t == media_type));
    }

    #[test]
    fn media_type_is_checked_before_size() {
        let candidate =
            CandidateFile::from_bytes("huge.png", "image/png", vec![0u8; 11 * 1024 * 1024]);
        let err = validate(candidate, DEFAULT_MAX_BYTES).unwrap_err();
        assert!(matches!(err, PipelineError::InvalidType(_)));
    }

    #[test]
    fn rejects_one_byte_over_the_limit() {
        let err = validate(pdf_of_len(10_485_761), DEFAULT_MAX_BYTES).unwrap_err();
        assert!(matches!(
            err,
            PipelineError::TooLarge {
                size: 10_485_761,
                limit: 10_485_760
            }
        ));
    }

    #[rstest]
    #[case(0)]
    #[case(500_000)]
    #[case(10_485_760)]
    fn accepts_up_to_the_limit(#[case] len: usize) {
        let selected = validate(pdf_of_len(len), DEFAULT_MAX_BYTES).unwrap();
        assert_eq!(selected.len(), len as u64);
        assert_eq!(selected.name(), "report.pdf");
        assert_eq!(selected.read_bytes(DEFAULT_MAX_BYTES).unwrap().len(), len);
    }

    #[test]
    fn first_file_wins() {
        let files = vec![
            pdf_of_len(1),
            CandidateFile::from_bytes("other.pdf", PDF_MEDIA_TYPE, vec![0u8; 2]),
        ];
        let first = select_first(files).unwrap();
        assert_eq!(first.len(), 1);
        assert!(select_first(Vec::new()).is_none());
    }

    #[rstest]
    #[case("a/b/Report.PDF", "application/pdf")]
    #[case("scan.png", "image/png")]
    #[case("notes", "application/octet-stream")]
    fn media_type_from_extension(#[case] path: &str, #[case] expected: &str) {
        assert_eq!(media_type_for_path(Path::new(path)), expected);
    }

    #[test]
    fn file_on_disk_is_described_then_read() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("invoice.pdf");
        std::fs::File::create(&path)
            .unwrap()
            .write_all(b"%PDF-1.7 body")
            .unwrap();

        let candidate = CandidateFile::from_path(&path).unwrap();
        assert_eq!(candidate.name(), "invoice.pdf");
        assert_eq!(candidate.media_type(), PDF_MEDIA_TYPE);
        assert_eq!(candidate.len(), 13);

        let selected = validate(candidate, DEFAULT_MAX_BYTES).unwrap();
        let bytes = selected.read_bytes(DEFAULT_MAX_BYTES).unwrap();
        assert_eq!(&bytes[..], b"%PDF-1.7 body");
    }

    #[test]
    fn file_that_grew_past_the_limit_is_rejected_on_read() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("grow.pdf");
        std::fs::write(&path, b"tiny").unwrap();
        let selected = validate(CandidateFile::from_path(&path).unwrap(), 8).unwrap();

        std::fs::write(&path, b"no longer tiny").unwrap();
        let err = selected.read_bytes(8).unwrap_err();
        assert!(matches!(err, PipelineError::TooLarge { size: 14, limit: 8 }));
    }
}
