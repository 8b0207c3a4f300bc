use anyhow::anyhow;

use crate::engine::{DocumentEngine, SaveSettings};
use crate::error::{PipelineError, Result};

const PDF_HEADER: &[u8] = b"%PDF-";

/// Bytes produced by one load/save cycle of the document library.
#[derive(Debug, Clone)]
pub struct CompressionResult {
    bytes: Vec<u8>,
    original_size: u64,
}

impl CompressionResult {
    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }

    pub fn size(&self) -> u64 {
        self.bytes.len() as u64
    }

    pub fn original_size(&self) -> u64 {
        self.original_size
    }
}

/// Runs the input through the engine's load and save. There is no size
/// guarantee: the output can be larger than the input.
pub fn transform<E>(engine: &E, input: &[u8], settings: &SaveSettings) -> Result<CompressionResult>
where
    E: DocumentEngine,
{
    let bytes = engine
        .load(input)
        .and_then(|mut doc| engine.save(&mut doc, settings))
        .and_then(|bytes| {
            if bytes.starts_with(PDF_HEADER) {
                Ok(bytes)
            } else {
                Err(anyhow!("Engine produced {} bytes without a PDF header", bytes.len()))
            }
        })
        .map_err(PipelineError::Transform)?;
    log::info!("Re-saved {} bytes as {} bytes", input.len(), bytes.len());

    Ok(CompressionResult {
        bytes,
        original_size: input.len() as u64,
    })
}
