use anyhow::{Context, Result};
use lopdf::{dictionary, Document, Object, SaveOptions};

/// What the external library is asked to do when writing a document back out.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SaveSettings {
    /// Pack non-stream objects into compressed object streams.
    pub use_object_streams: bool,
    /// Append a blank page when the document has none.
    pub add_default_page: bool,
    /// Batching hint: how many objects go into one object stream.
    pub objects_per_stream: usize,
    /// Deflate level for the object streams, 0-9.
    pub compression_level: u32,
}

impl Default for SaveSettings {
    fn default() -> Self {
        Self {
            use_object_streams: true,
            add_default_page: false,
            objects_per_stream: 20,
            compression_level: 6,
        }
    }
}

/// The load/save pair the pipeline delegates all PDF work to.
pub trait DocumentEngine {
    type Document;

    fn load(&self, bytes: &[u8]) -> Result<Self::Document>;

    fn save(&self, document: &mut Self::Document, settings: &SaveSettings) -> Result<Vec<u8>>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct LopdfEngine;

impl DocumentEngine for LopdfEngine {
    type Document = Document;

    fn load(&self, bytes: &[u8]) -> Result<Document> {
        let mut doc = Document::load_mem(bytes).context("Failed to load PDF")?;

        if doc.is_encrypted() {
            log::info!("PDF is encrypted. Attempting to decrypt with empty password...");
            if let Err(e) = doc.decrypt("") {
                log::warn!("Failed to decrypt with empty password: {:?}", e);
            }
        }
        log::debug!(
            "Loaded PDF {} with {} objects and {} pages",
            doc.version,
            doc.objects.len(),
            doc.get_pages().len()
        );

        Ok(doc)
    }

    fn save(&self, doc: &mut Document, settings: &SaveSettings) -> Result<Vec<u8>> {
        if settings.add_default_page && doc.get_pages().is_empty() {
            append_blank_page(doc).context("Failed to add default page")?;
        }

        let options = SaveOptions::builder()
            .use_object_streams(settings.use_object_streams)
            .use_xref_streams(settings.use_object_streams)
            .max_objects_per_stream(settings.objects_per_stream.max(1))
            .compression_level(settings.compression_level.min(9))
            .build();

        let mut buffer = Vec::new();
        doc.save_with_options(&mut buffer, options)
            .context("Failed to save PDF")?;

        Ok(buffer)
    }
}

// US Letter, in points.
const DEFAULT_MEDIA_BOX: [i64; 4] = [0, 0, 612, 792];

fn append_blank_page(doc: &mut Document) -> Result<()> {
    let pages_id = doc
        .catalog()
        .and_then(|catalog| catalog.get(b"Pages"))
        .and_then(Object::as_reference)
        .context("Document has no page tree")?;

    let media_box: Vec<Object> = DEFAULT_MEDIA_BOX.iter().map(|&v| v.into()).collect();
    let page_id = doc.add_object(dictionary! {
        "Type" => "Page",
        "Parent" => pages_id,
        "MediaBox" => media_box,
    });

    let pages = doc
        .get_object_mut(pages_id)
        .and_then(Object::as_dict_mut)
        .context("Page tree root is not a dictionary")?;
    let count = pages.get(b"Count").and_then(Object::as_i64).unwrap_or(0);
    let has_kids = matches!(pages.get(b"Kids"), Ok(Object::Array(_)));
    if has_kids {
        if let Ok(Object::Array(kids)) = pages.get_mut(b"Kids") {
            kids.push(Object::Reference(page_id));
        }
    } else {
        pages.set("Kids", vec![Object::Reference(page_id)]);
    }
    pages.set("Count", count + 1);

    Ok(())
}
