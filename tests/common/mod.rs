#![allow(dead_code)]

use std::time::Duration;

use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Document, Object, Stream};
use pdf_repack::{DocumentEngine, Download, DownloadSink, SaveSettings};

/// A small but real PDF: `pages` pages of Courier text plus some loose
/// dictionaries that object streams can pack.
pub fn sample_pdf(pages: usize) -> Vec<u8> {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();
    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Courier",
    });
    let resources_id = doc.add_object(dictionary! {
        "Font" => dictionary! {
            "F1" => font_id,
        },
    });

    let mut kids: Vec<Object> = Vec::new();
    for n in 0..pages {
        let content = Content {
            operations: vec![
                Operation::new("BT", vec![]),
                Operation::new("Tf", vec!["F1".into(), 24.into()]),
                Operation::new("Td", vec![72.into(), 700.into()]),
                Operation::new(
                    "Tj",
                    vec![Object::string_literal(format!("Page {}", n + 1))],
                ),
                Operation::new("ET", vec![]),
            ],
        };
        let content_id = doc.add_object(Stream::new(dictionary! {}, content.encode().unwrap()));
        let annot_id = doc.add_object(dictionary! {
            "Type" => "Annot",
            "Subtype" => "Text",
            "Contents" => Object::string_literal(format!("Note {}", n + 1)),
            "Rect" => vec![100.into(), 100.into(), 200.into(), 200.into()],
        });
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
            "Annots" => vec![Object::Reference(annot_id)],
        });
        kids.push(Object::Reference(page_id));
    }

    let page_count = kids.len() as i64;
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => page_count,
            "Resources" => resources_id,
            "MediaBox" => vec![0.into(), 0.into(), 595.into(), 842.into()],
        }),
    );
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);

    let mut buffer = Vec::new();
    doc.save_to(&mut buffer).unwrap();
    buffer
}

pub fn page_count(bytes: &[u8]) -> usize {
    Document::load_mem(bytes).unwrap().get_pages().len()
}

pub fn assert_well_formed_pdf(bytes: &[u8]) {
    assert!(bytes.starts_with(b"%PDF-"), "missing PDF header");
    Document::load_mem(bytes).expect("output should load back");
}

/// Stands in for the document library: returns fixed bytes, or fails.
pub struct FakeEngine {
    pub output: Option<Vec<u8>>,
    pub delay: Duration,
}

impl FakeEngine {
    pub fn returning(output: &[u8]) -> Self {
        Self {
            output: Some(output.to_vec()),
            delay: Duration::ZERO,
        }
    }

    pub fn failing() -> Self {
        Self {
            output: None,
            delay: Duration::ZERO,
        }
    }

    /// Makes every save take at least `delay`.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }
}

impl DocumentEngine for FakeEngine {
    type Document = ();

    fn load(&self, bytes: &[u8]) -> anyhow::Result<()> {
        match self.output {
            Some(_) if !bytes.is_empty() => Ok(()),
            _ => Err(anyhow::anyhow!("trailer not found")),
        }
    }

    fn save(&self, _: &mut (), _: &SaveSettings) -> anyhow::Result<Vec<u8>> {
        std::thread::sleep(self.delay);
        self.output
            .clone()
            .ok_or_else(|| anyhow::anyhow!("nothing to save"))
    }
}

/// Remembers what it was handed, like a browser's download bar.
#[derive(Default)]
pub struct MemorySink {
    pub downloads: Vec<(String, &'static str, Vec<u8>)>,
}

impl DownloadSink for MemorySink {
    fn deliver(&mut self, download: &Download<'_>) -> anyhow::Result<()> {
        self.downloads.push((
            download.file_name.clone(),
            download.media_type,
            download.bytes.to_vec(),
        ));
        Ok(())
    }
}

pub struct BrokenSink;

impl DownloadSink for BrokenSink {
    fn deliver(&mut self, _: &Download<'_>) -> anyhow::Result<()> {
        Err(anyhow::anyhow!("disk full"))
    }
}
