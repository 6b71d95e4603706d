//! Raster encoders: composited canvas → TIFF / PNG / PDF bytes.
//!
//! Each encoder returns an in-memory buffer; writing to disk is left to
//! [`crate::output::StagedOutputs`] so a failure in a later encoder never
//! leaves an earlier file behind.
//!
//! `image`'s own TIFF and PNG encoders cannot tag resolution, so the `tiff`
//! and `png` crates are driven directly here.

use crate::error::ResizeError;
use crate::geometry::{TARGET_DPI, TARGET_PT};
use crate::output::OutputFormat;
use image::RgbImage;
use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Document, Object, Stream};
use std::io::Cursor;
use tiff::encoder::{colortype, compression::Lzw, Rational, TiffEncoder};
use tiff::tags::ResolutionUnit;
use tracing::debug;

/// 300 DPI expressed in pixels per metre, the only unit PNG's `pHYs` knows.
pub const PNG_PIXELS_PER_METRE: u32 = 11_811;

/// Name of the image XObject on the raster PDF page.
const IMAGE_NAME: &str = "Im0";

/// Encode `canvas` in `format`.
pub fn encode(canvas: &RgbImage, format: OutputFormat) -> Result<Vec<u8>, ResizeError> {
    let bytes = match format {
        OutputFormat::Tiff => encode_tiff(canvas),
        OutputFormat::Png => encode_png(canvas),
        OutputFormat::Pdf => encode_pdf(canvas),
    }?;
    debug!("Encoded {} → {} bytes", format, bytes.len());
    Ok(bytes)
}

/// LZW-compressed RGB TIFF tagged 300 × 300 pixels per inch.
pub fn encode_tiff(canvas: &RgbImage) -> Result<Vec<u8>, ResizeError> {
    let err = |e: tiff::TiffError| ResizeError::encode(OutputFormat::Tiff, e);

    let mut buf = Cursor::new(Vec::new());
    {
        let mut encoder = TiffEncoder::new(&mut buf).map_err(err)?;
        let mut image = encoder
            .new_image_with_compression::<colortype::RGB8, _>(canvas.width(), canvas.height(), Lzw)
            .map_err(err)?;
        image.resolution(
            ResolutionUnit::Inch,
            Rational {
                n: TARGET_DPI,
                d: 1,
            },
        );
        image.write_data(canvas.as_raw()).map_err(err)?;
    }
    Ok(buf.into_inner())
}

/// RGB PNG with a `pHYs` chunk of ~300 DPI.
///
/// PNG stores density in pixels per metre, so 300 DPI round-trips as
/// 299.9994. Consumers should not rely on it for print sizing.
pub fn encode_png(canvas: &RgbImage) -> Result<Vec<u8>, ResizeError> {
    let err = |e: png::EncodingError| ResizeError::encode(OutputFormat::Png, e);

    let mut buf = Vec::new();
    {
        let mut encoder = png::Encoder::new(&mut buf, canvas.width(), canvas.height());
        encoder.set_color(png::ColorType::Rgb);
        encoder.set_depth(png::BitDepth::Eight);
        encoder.set_pixel_dims(Some(png::PixelDimensions {
            xppu: PNG_PIXELS_PER_METRE,
            yppu: PNG_PIXELS_PER_METRE,
            unit: png::Unit::Meter,
        }));
        let mut writer = encoder.write_header().map_err(err)?;
        writer.write_image_data(canvas.as_raw()).map_err(err)?;
        writer.finish().map_err(err)?;
    }
    Ok(buf)
}

/// Single 4 × 4 in page with `canvas` drawn edge to edge.
///
/// 1200 px across 288 pt gives an effective 300 DPI.
pub fn encode_pdf(canvas: &RgbImage) -> Result<Vec<u8>, ResizeError> {
    let err = |e: lopdf::Error| ResizeError::encode(OutputFormat::Pdf, e);

    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();

    let image_id = doc.add_object(Stream::new(
        dictionary! {
            "Type" => "XObject",
            "Subtype" => "Image",
            "Width" => canvas.width() as i64,
            "Height" => canvas.height() as i64,
            "ColorSpace" => "DeviceRGB",
            "BitsPerComponent" => 8,
        },
        canvas.as_raw().clone(),
    ));

    let content = Content {
        operations: vec![
            Operation::new("q", vec![]),
            Operation::new(
                "cm",
                vec![
                    TARGET_PT.into(),
                    0.into(),
                    0.into(),
                    TARGET_PT.into(),
                    0.into(),
                    0.into(),
                ],
            ),
            Operation::new("Do", vec![Object::Name(IMAGE_NAME.as_bytes().to_vec())]),
            Operation::new("Q", vec![]),
        ],
    };
    let content_id = doc.add_object(Stream::new(dictionary! {}, content.encode().map_err(err)?));

    let page_id = doc.add_object(dictionary! {
        "Type" => "Page",
        "Parent" => pages_id,
        "MediaBox" => square_box(),
        "Contents" => content_id,
        "Resources" => dictionary! {
            "XObject" => dictionary! { IMAGE_NAME => image_id },
        },
    });

    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => vec![page_id.into()],
            "Count" => 1,
        }),
    );
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);
    doc.compress();

    let mut buf = Vec::new();
    doc.save_to(&mut buf).map_err(|e| ResizeError::encode(OutputFormat::Pdf, e))?;
    Ok(buf)
}

/// `[0 0 288 288]`
pub(crate) fn square_box() -> Vec<Object> {
    vec![0.into(), 0.into(), TARGET_PT.into(), TARGET_PT.into()]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::TARGET_PX;
    use image::Rgb;

    fn canvas() -> RgbImage {
        let mut c = RgbImage::from_pixel(TARGET_PX, TARGET_PX, Rgb([255, 255, 255]));
        c.put_pixel(600, 600, Rgb([1, 2, 3]));
        c
    }

    #[test]
    fn tiff_carries_300_dpi() {
        use tiff::decoder::Decoder;
        use tiff::tags::Tag;

        let bytes = encode_tiff(&canvas()).unwrap();
        let mut decoder = Decoder::new(Cursor::new(bytes)).unwrap();
        assert_eq!(decoder.dimensions().unwrap(), (TARGET_PX, TARGET_PX));
        assert_eq!(
            decoder.get_tag_u32(Tag::ResolutionUnit).unwrap(),
            ResolutionUnit::Inch.to_u16() as u32
        );
        for tag in [Tag::XResolution, Tag::YResolution] {
            match decoder.get_tag(tag).unwrap() {
                tiff::decoder::ifd::Value::Rational(n, d) => assert_eq!(n / d, TARGET_DPI),
                other => panic!("unexpected {tag:?} value: {other:?}"),
            }
        }
    }

    #[test]
    fn png_carries_phys_chunk() {
        let bytes = encode_png(&canvas()).unwrap();
        let decoder = png::Decoder::new(Cursor::new(bytes));
        let reader = decoder.read_info().unwrap();
        let info = reader.info();
        assert_eq!((info.width, info.height), (TARGET_PX, TARGET_PX));
        let dims = info.pixel_dims.expect("pHYs present");
        assert_eq!(dims.xppu, PNG_PIXELS_PER_METRE);
        assert_eq!(dims.yppu, PNG_PIXELS_PER_METRE);
        assert_eq!(dims.unit, png::Unit::Meter);
    }

    #[test]
    fn png_pixels_round_trip() {
        let c = canvas();
        let decoded = image::load_from_memory(&encode_png(&c).unwrap()).unwrap();
        assert_eq!(decoded.to_rgb8(), c);
    }

    #[test]
    fn pdf_page_is_four_inches_square() {
        let bytes = encode_pdf(&canvas()).unwrap();
        assert!(bytes.starts_with(b"%PDF-1.5"));

        let doc = Document::load_mem(&bytes).unwrap();
        let pages = doc.get_pages();
        assert_eq!(pages.len(), 1);
        let page = doc.get_dictionary(pages[&1]).unwrap();
        let media_box: Vec<f32> = page
            .get(b"MediaBox")
            .unwrap()
            .as_array()
            .unwrap()
            .iter()
            .map(|o| o.as_float().unwrap())
            .collect();
        assert_eq!(media_box, vec![0.0, 0.0, 288.0, 288.0]);

        let content = String::from_utf8(doc.get_page_content(pages[&1]).unwrap()).unwrap();
        assert!(content.contains("/Im0 Do"), "content: {content}");
    }
}
