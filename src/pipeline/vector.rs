//! Vector-preserving PDF path.
//!
//! Instead of rasterising, the first page keeps its own content stream,
//! resources, fonts and images. The document is reduced to that page, the
//! page's content is wrapped in a white background plus one `cm` operator
//! that scales and centres it, and the MediaBox becomes the 288 × 288 pt
//! square. Text and line art stay vector at any zoom level.
//!
//! Page attributes that would no longer match the new geometry are dropped:
//! CropBox is reset to the new square (it may be inherited from a parent
//! node), BleedBox/TrimBox/ArtBox are removed, and so are `/Annots`, whose
//! rectangles are in the old coordinate space. `/Rotate` is kept: a square
//! page rotates about its own centre, so the visual orientation survives.

use crate::error::ResizeError;
use crate::geometry::{VectorPlacement, TARGET_PT};
use crate::output::OutputFormat;
use crate::pipeline::encode::square_box;
use lopdf::{dictionary, Document, Object, ObjectId, Stream};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Guard against malformed `/Parent` cycles when resolving inherited attributes.
const MAX_TREE_DEPTH: usize = 64;

/// The first page of a PDF, loaded but not rendered.
#[derive(Debug)]
pub struct VectorPage {
    path: PathBuf,
    document: Document,
    page_id: ObjectId,
    media_box: [f32; 4],
    page_count: usize,
}

impl VectorPage {
    /// Parse `path` and locate page 1 and its effective MediaBox.
    pub fn load(path: &Path) -> Result<Self, ResizeError> {
        let document = Document::load(path).map_err(|e| ResizeError::decode(path, e))?;
        if document.is_encrypted() {
            return Err(encrypted_error(path));
        }

        let (page_id, page_count) = first_page(&document, path)?;
        let media_box = rect(&document, page_id, b"MediaBox")
            .ok_or_else(|| ResizeError::decode(path, "first page has no usable MediaBox"))?;

        info!("PDF parsed: {} pages, keeping page 1 as vector", page_count);
        debug!("Page 1 MediaBox: {:?}", media_box);

        Ok(Self {
            path: path.to_path_buf(),
            document,
            page_id,
            media_box,
            page_count,
        })
    }

    pub fn page_count(&self) -> usize {
        self.page_count
    }

    /// `[llx, lly, urx, ury]` in points.
    pub fn media_box(&self) -> [f32; 4] {
        self.media_box
    }

    pub fn width(&self) -> f32 {
        (self.media_box[2] - self.media_box[0]).abs()
    }

    pub fn height(&self) -> f32 {
        (self.media_box[3] - self.media_box[1]).abs()
    }

    /// Rewrite the document to a single 288 × 288 pt page and serialise it.
    pub fn into_pdf(self, placement: &VectorPlacement) -> Result<Vec<u8>, ResizeError> {
        let VectorPage {
            path,
            mut document,
            page_id,
            media_box,
            page_count,
        } = self;
        let err = |e: lopdf::Error| ResizeError::encode(OutputFormat::Pdf, e);

        if page_count > 1 {
            let extra: Vec<u32> = (2..=page_count as u32).collect();
            document.delete_pages(&extra);
            debug!("Dropped pages 2..={}", page_count);
        }

        let original = page_content(&document, page_id, &path)?;
        let wrapped = wrap_content(&original, media_box, placement);
        let content_id = document.add_object(Stream::new(dictionary! {}, wrapped));

        let page = document.get_dictionary_mut(page_id).map_err(err)?;
        page.set("Contents", content_id);
        page.set("MediaBox", square_box());
        page.set("CropBox", square_box());
        let stale: [&[u8]; 4] = [b"BleedBox", b"TrimBox", b"ArtBox", b"Annots"];
        for key in stale {
            page.remove(key);
        }

        // Outline entries may point at the pages just removed.
        if let Ok(catalog_id) = document.trailer.get(b"Root").and_then(Object::as_reference) {
            if let Ok(catalog) = document.get_dictionary_mut(catalog_id) {
                catalog.remove(b"Outlines");
            }
        }

        let pruned = document.prune_objects();
        debug!("Pruned {} unreferenced objects", pruned.len());
        document.compress();

        let mut buf = Vec::new();
        document
            .save_to(&mut buf)
            .map_err(|e| ResizeError::encode(OutputFormat::Pdf, e))?;
        Ok(buf)
    }
}

/// Page 1 geometry as a renderer sees it.
///
/// Read from the page tree only. PDF encryption covers strings and streams,
/// not dictionaries or numbers, so this works on encrypted files without a
/// password.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageGeometry {
    pub page_count: usize,
    pub encrypted: bool,
    /// `[llx, lly, urx, ury]` in points.
    pub media_box: [f32; 4],
    /// CropBox clipped to the MediaBox; the MediaBox when absent.
    pub crop_box: [f32; 4],
    /// `/Rotate` normalised to 0, 90, 180 or 270.
    pub rotate: u16,
}

impl PageGeometry {
    pub fn read(path: &Path) -> Result<Self, ResizeError> {
        let doc = Document::load(path).map_err(|e| ResizeError::decode(path, e))?;
        let (page_id, page_count) = first_page(&doc, path)?;
        let media_box = rect(&doc, page_id, b"MediaBox")
            .ok_or_else(|| ResizeError::decode(path, "first page has no usable MediaBox"))?;
        let crop_box = rect(&doc, page_id, b"CropBox")
            .and_then(|crop| intersect(crop, media_box))
            .unwrap_or(media_box);
        let rotate = inherited(&doc, page_id, b"Rotate")
            .and_then(|obj| doc.dereference(obj).ok())
            .and_then(|(_, obj)| obj.as_i64().ok())
            .unwrap_or(0);

        Ok(Self {
            page_count,
            encrypted: doc.is_encrypted(),
            media_box,
            crop_box,
            rotate: (rotate.rem_euclid(360) / 90 * 90) as u16,
        })
    }

    /// Size of the MediaBox in points, the area the vector path rescales.
    pub fn media_size(&self) -> (f32, f32) {
        box_size(self.media_box)
    }

    /// Size of the page as displayed: the crop box, turned for `/Rotate`.
    pub fn display_size(&self) -> (f32, f32) {
        let (w, h) = box_size(self.crop_box);
        if self.rotate % 180 == 90 {
            (h, w)
        } else {
            (w, h)
        }
    }
}

fn box_size(b: [f32; 4]) -> (f32, f32) {
    (b[2] - b[0], b[3] - b[1])
}

/// Error for encrypted input on the vector path.
pub(crate) fn encrypted_error(path: &Path) -> ResizeError {
    ResizeError::decode(
        path,
        "encrypted PDFs cannot be vector-preserved; drop --preserve-vector to rasterise",
    )
}

fn first_page(doc: &Document, path: &Path) -> Result<(ObjectId, usize), ResizeError> {
    let pages = doc.get_pages();
    let page_id = *pages
        .get(&1)
        .ok_or_else(|| ResizeError::decode(path, "PDF has no pages"))?;
    Ok((page_id, pages.len()))
}

/// Decoded `/Contents` of a page, one stream per line.
///
/// Content streams may split anywhere between tokens, so a separator is
/// needed to keep the last operator of one stream off the first operand of
/// the next.
fn page_content(doc: &Document, page_id: ObjectId, path: &Path) -> Result<Vec<u8>, ResizeError> {
    let mut content = Vec::new();
    for id in doc.get_page_contents(page_id) {
        let stream = doc
            .get_object(id)
            .and_then(Object::as_stream)
            .map_err(|e| ResizeError::decode(path, format!("content stream {id:?}: {e}")))?;
        let data = if stream.dict.has(b"Filter") {
            stream
                .decompressed_content()
                .map_err(|e| ResizeError::decode(path, format!("content stream {id:?}: {e}")))?
        } else {
            stream.content.clone()
        };
        if !content.is_empty() {
            content.push(b'\n');
        }
        content.extend_from_slice(&data);
    }
    Ok(content)
}

/// Background fill, then the original content under a scale + translate.
///
/// The translation also cancels a MediaBox whose lower-left corner is not at
/// the origin, so the visible page area lands exactly on the placement.
pub fn wrap_content(original: &[u8], media_box: [f32; 4], p: &VectorPlacement) -> Vec<u8> {
    let llx = media_box[0].min(media_box[2]);
    let lly = media_box[1].min(media_box[3]);
    let tx = p.x - llx * p.scale;
    let ty = p.y - lly * p.scale;
    let size = fmt_num(TARGET_PT);

    let mut out = Vec::with_capacity(original.len() + 128);
    out.extend_from_slice(format!("q\n1 1 1 rg\n0 0 {size} {size} re\nf\nQ\n").as_bytes());
    out.extend_from_slice(
        format!(
            "q\n{s} 0 0 {s} {tx} {ty} cm\n",
            s = fmt_num(p.scale),
            tx = fmt_num(tx),
            ty = fmt_num(ty)
        )
        .as_bytes(),
    );
    out.extend_from_slice(original);
    out.extend_from_slice(b"\nQ\n");
    out
}

/// Plain decimal with at most four fractional digits; PDF has no exponent syntax.
fn fmt_num(v: f32) -> String {
    let s = format!("{:.4}", v);
    let s = s.trim_end_matches('0').trim_end_matches('.');
    match s {
        "" | "-0" => "0".to_string(),
        other => other.to_string(),
    }
}

/// Resolve a rectangle attribute on the page or the nearest ancestor,
/// normalised so the first corner is the lower-left one.
fn rect(doc: &Document, page_id: ObjectId, key: &[u8]) -> Option<[f32; 4]> {
    let obj = inherited(doc, page_id, key)?;
    let (_, obj) = doc.dereference(obj).ok()?;
    let items = obj.as_array().ok()?;
    if items.len() != 4 {
        return None;
    }

    let mut v = [0f32; 4];
    for (slot, item) in v.iter_mut().zip(items) {
        let (_, value) = doc.dereference(item).ok()?;
        *slot = value.as_float().ok()?;
    }
    Some([v[0].min(v[2]), v[1].min(v[3]), v[0].max(v[2]), v[1].max(v[3])])
}

fn intersect(a: [f32; 4], b: [f32; 4]) -> Option<[f32; 4]> {
    let r = [a[0].max(b[0]), a[1].max(b[1]), a[2].min(b[2]), a[3].min(b[3])];
    (r[2] > r[0] && r[3] > r[1]).then_some(r)
}

fn inherited<'a>(doc: &'a Document, page_id: ObjectId, key: &[u8]) -> Option<&'a Object> {
    let mut node = doc.get_dictionary(page_id).ok()?;
    for _ in 0..MAX_TREE_DEPTH {
        if let Ok(value) = node.get(key) {
            return Some(value);
        }
        let parent = node.get(b"Parent").and_then(Object::as_reference).ok()?;
        node = doc.get_dictionary(parent).ok()?;
    }
    None
}
