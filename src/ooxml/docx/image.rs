/// Image loading for picture insertion.
///
/// An [`Image`] is an immutable blob plus what a picture needs to know about it:
/// content type, pixel size, resolution and a content hash used to store identical
/// images only once per package. Pixel size and resolution are read straight from
/// the file header; no decoding happens.
use std::fmt::Write as _;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use sha2::{Digest, Sha256};

use crate::common::binary::{
    BinaryError, Endian, read_i32_le, read_u16, read_u16_be, read_u16_le, read_u32,
    read_u32_be, read_u32_le,
};
use crate::common::unit::Length;
use crate::ooxml::error::{OoxmlError, Result};
use crate::ooxml::opc::constants::content_type as ct;

/// Resolution assumed when a header does not declare one
pub const DEFAULT_DPI: u32 = 72;

/// Where picture bytes come from.
#[derive(Debug, Clone)]
pub enum ImageDescriptor {
    /// A file on disk; its file name becomes the picture name.
    Path(PathBuf),
    /// Bytes already in memory, with an optional file name.
    Bytes {
        data: Vec<u8>,
        filename: Option<String>,
    },
}

impl ImageDescriptor {
    pub fn bytes(data: impl Into<Vec<u8>>, filename: Option<&str>) -> Self {
        ImageDescriptor::Bytes {
            data: data.into(),
            filename: filename.map(str::to_string),
        }
    }
}

impl From<PathBuf> for ImageDescriptor {
    fn from(path: PathBuf) -> Self {
        ImageDescriptor::Path(path)
    }
}

impl From<&Path> for ImageDescriptor {
    fn from(path: &Path) -> Self {
        ImageDescriptor::Path(path.to_path_buf())
    }
}

impl From<Vec<u8>> for ImageDescriptor {
    fn from(data: Vec<u8>) -> Self {
        ImageDescriptor::Bytes {
            data,
            filename: None,
        }
    }
}

/// Raster formats a picture can hold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ImageFormat {
    Png,
    Jpeg,
    Gif,
    Bmp,
    Tiff,
}

impl ImageFormat {
    /// Detect image format from byte signature.
    pub fn detect(data: &[u8]) -> Option<Self> {
        if data.starts_with(&[0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A]) {
            return Some(Self::Png);
        }
        if data.starts_with(&[0xFF, 0xD8, 0xFF]) {
            return Some(Self::Jpeg);
        }
        if data.starts_with(b"GIF87a") || data.starts_with(b"GIF89a") {
            return Some(Self::Gif);
        }
        if data.starts_with(b"BM") {
            return Some(Self::Bmp);
        }
        if data.starts_with(&[0x49, 0x49, 0x2A, 0x00])
            || data.starts_with(&[0x4D, 0x4D, 0x00, 0x2A])
        {
            return Some(Self::Tiff);
        }
        None
    }

    pub fn content_type(self) -> &'static str {
        match self {
            Self::Png => ct::PNG,
            Self::Jpeg => ct::JPEG,
            Self::Gif => ct::GIF,
            Self::Bmp => ct::BMP,
            Self::Tiff => ct::TIFF,
        }
    }

    /// Extension used when the image comes without a file name.
    pub fn default_ext(self) -> &'static str {
        match self {
            Self::Png => "png",
            Self::Jpeg => "jpg",
            Self::Gif => "gif",
            Self::Bmp => "bmp",
            Self::Tiff => "tiff",
        }
    }
}

/// Pixel size and resolution read from a header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Header {
    px_width: u32,
    px_height: u32,
    horz_dpi: u32,
    vert_dpi: u32,
}

impl Header {
    fn new(px_width: u32, px_height: u32, horz_dpi: u32, vert_dpi: u32) -> Self {
        let dpi = |d: u32| if d == 0 { DEFAULT_DPI } else { d };
        Self {
            px_width,
            px_height,
            horz_dpi: dpi(horz_dpi),
            vert_dpi: dpi(vert_dpi),
        }
    }
}

/// An image ready to be stored in a package.
///
/// Cloning is cheap: the blob is shared.
#[derive(Debug, Clone)]
pub struct Image {
    blob: Arc<[u8]>,
    filename: String,
    format: ImageFormat,
    header: Header,
    sha256: String,
}

impl Image {
    /// Read the bytes a descriptor points at and parse their header.
    pub fn load(descriptor: ImageDescriptor) -> Result<Self> {
        match descriptor {
            ImageDescriptor::Path(path) => {
                let blob = fs::read(&path)?;
                let filename = path
                    .file_name()
                    .map(|name| name.to_string_lossy().into_owned());
                Self::from_blob(blob, filename)
            },
            ImageDescriptor::Bytes { data, filename } => Self::from_blob(data, filename),
        }
    }

    /// Build an image from bytes. Without a file name the image is called
    /// `image.{ext}` after its format.
    pub fn from_blob(blob: Vec<u8>, filename: Option<String>) -> Result<Self> {
        let format = ImageFormat::detect(&blob)
            .ok_or_else(|| OoxmlError::UnsupportedFormat("unrecognized image header".to_string()))?;
        let header = parse_header(format, &blob).map_err(|e| {
            OoxmlError::InvalidFormat(format!("truncated {:?} header: {}", format, e))
        })?;
        let filename = filename.unwrap_or_else(|| format!("image.{}", format.default_ext()));
        let sha256 = sha256_hex(&blob);

        Ok(Self {
            blob: blob.into(),
            filename,
            format,
            header,
            sha256,
        })
    }

    #[inline]
    pub fn blob(&self) -> &[u8] {
        &self.blob
    }

    #[inline]
    pub fn format(&self) -> ImageFormat {
        self.format
    }

    pub fn content_type(&self) -> &'static str {
        self.format.content_type()
    }

    pub fn filename(&self) -> &str {
        &self.filename
    }

    /// Extension for the stored part: the file name's own, else the format default.
    pub fn ext(&self) -> &str {
        match self.filename.rsplit_once('.') {
            Some((stem, ext)) if !stem.is_empty() && !ext.is_empty() => ext,
            _ => self.format.default_ext(),
        }
    }

    pub fn px_width(&self) -> u32 {
        self.header.px_width
    }

    pub fn px_height(&self) -> u32 {
        self.header.px_height
    }

    pub fn horz_dpi(&self) -> u32 {
        self.header.horz_dpi
    }

    pub fn vert_dpi(&self) -> u32 {
        self.header.vert_dpi
    }

    /// Lowercase hex SHA-256 of the blob.
    pub fn sha256(&self) -> &str {
        &self.sha256
    }

    /// Natural display width: pixel width at the horizontal resolution.
    pub fn default_cx(&self) -> Length {
        Length::from_px(self.header.px_width, self.header.horz_dpi)
    }

    pub fn default_cy(&self) -> Length {
        Length::from_px(self.header.px_height, self.header.vert_dpi)
    }

    /// Display size for a requested width and/or height. A single given
    /// dimension scales the other to keep the aspect ratio.
    pub fn scaled_dimensions(&self, width: Option<Length>, height: Option<Length>) -> (Length, Length) {
        let (native_cx, native_cy) = (self.default_cx(), self.default_cy());
        match (width, height) {
            (Some(cx), Some(cy)) => (cx, cy),
            (Some(cx), None) => (cx, native_cy.scale(cx.emus(), native_cx.emus())),
            (None, Some(cy)) => (native_cx.scale(cy.emus(), native_cy.emus()), cy),
            (None, None) => (native_cx, native_cy),
        }
    }
}

pub(crate) fn sha256_hex(blob: &[u8]) -> String {
    let digest = Sha256::digest(blob);
    let mut hex = String::with_capacity(digest.len() * 2);
    for byte in digest.iter() {
        let _ = write!(hex, "{:02x}", byte);
    }
    hex
}

fn parse_header(format: ImageFormat, data: &[u8]) -> std::result::Result<Header, BinaryError> {
    match format {
        ImageFormat::Png => parse_png(data),
        ImageFormat::Jpeg => parse_jpeg(data),
        ImageFormat::Gif => Ok(Header::new(
            read_u16_le(data, 6)? as u32,
            read_u16_le(data, 8)? as u32,
            DEFAULT_DPI,
            DEFAULT_DPI,
        )),
        ImageFormat::Bmp => parse_bmp(data),
        ImageFormat::Tiff => parse_tiff(data),
    }
}

/// Dots per inch from a pixels-per-meter density.
fn dpi_from_ppm(px_per_meter: u32) -> u32 {
    (px_per_meter as f64 * 0.0254).round() as u32
}

/// IHDR for size, then the optional pHYs chunk for resolution.
fn parse_png(data: &[u8]) -> std::result::Result<Header, BinaryError> {
    let px_width = read_u32_be(data, 16)?;
    let px_height = read_u32_be(data, 20)?;
    let (mut horz_dpi, mut vert_dpi) = (DEFAULT_DPI, DEFAULT_DPI);

    let mut offset = 8usize;
    while let Ok(len) = read_u32_be(data, offset) {
        let chunk_type = data.get(offset + 4..offset + 8).unwrap_or_default();
        match chunk_type {
            b"pHYs" => {
                let body = offset + 8;
                let unit = data.get(body + 8).copied().unwrap_or(0);
                if unit == 1 {
                    horz_dpi = dpi_from_ppm(read_u32_be(data, body)?);
                    vert_dpi = dpi_from_ppm(read_u32_be(data, body + 4)?);
                }
                break;
            },
            b"IDAT" | b"IEND" | b"" => break,
            _ => {},
        }
        offset = match offset.checked_add(12 + len as usize) {
            Some(next) => next,
            None => break,
        };
    }
    Ok(Header::new(px_width, px_height, horz_dpi, vert_dpi))
}

/// Walk marker segments until a start-of-frame; a JFIF APP0 segment gives density.
fn parse_jpeg(data: &[u8]) -> std::result::Result<Header, BinaryError> {
    let (mut horz_dpi, mut vert_dpi) = (DEFAULT_DPI, DEFAULT_DPI);
    let mut offset = 2usize;

    loop {
        while data.get(offset) == Some(&0xFF) && data.get(offset + 1) == Some(&0xFF) {
            offset += 1;
        }
        if data.get(offset) != Some(&0xFF) {
            return Err(BinaryError::ParseError(format!(
                "expected marker at offset {}",
                offset
            )));
        }
        let marker = *data.get(offset + 1).ok_or(BinaryError::InsufficientData {
            expected: offset + 2,
            available: data.len(),
        })?;
        match marker {
            0x01 | 0xD0..=0xD8 => {
                offset += 2;
                continue;
            },
            0xD9 | 0xDA => {
                return Err(BinaryError::ParseError("no start-of-frame marker".to_string()));
            },
            _ => {},
        }

        let len = read_u16_be(data, offset + 2)? as usize;
        let segment = offset + 4;
        match marker {
            0xC0..=0xC3 | 0xC5..=0xC7 | 0xC9..=0xCB | 0xCD..=0xCF => {
                let px_height = read_u16_be(data, segment + 1)? as u32;
                let px_width = read_u16_be(data, segment + 3)? as u32;
                return Ok(Header::new(px_width, px_height, horz_dpi, vert_dpi));
            },
            0xE0 if data.get(segment..segment + 5) == Some(b"JFIF\0".as_slice()) => {
                let units = data.get(segment + 7).copied().unwrap_or(0);
                let x_density = read_u16_be(data, segment + 8)? as u32;
                let y_density = read_u16_be(data, segment + 10)? as u32;
                match units {
                    1 => (horz_dpi, vert_dpi) = (x_density, y_density),
                    2 => {
                        horz_dpi = (x_density as f64 * 2.54).round() as u32;
                        vert_dpi = (y_density as f64 * 2.54).round() as u32;
                    },
                    _ => {},
                }
            },
            _ => {},
        }
        offset = segment + len.saturating_sub(2);
    }
}

/// BITMAPINFOHEADER: signed size, resolution in pixels per meter.
fn parse_bmp(data: &[u8]) -> std::result::Result<Header, BinaryError> {
    let px_width = read_i32_le(data, 18)?.unsigned_abs();
    let px_height = read_i32_le(data, 22)?.unsigned_abs();
    let bmp_dpi = |ppm: u32| if ppm == 0 { 96 } else { dpi_from_ppm(ppm) };
    let horz_dpi = read_u32_le(data, 38).map(bmp_dpi).unwrap_or(DEFAULT_DPI);
    let vert_dpi = read_u32_le(data, 42).map(bmp_dpi).unwrap_or(DEFAULT_DPI);
    Ok(Header::new(px_width, px_height, horz_dpi, vert_dpi))
}

const TIFF_IMAGE_WIDTH: u16 = 256;
const TIFF_IMAGE_LENGTH: u16 = 257;
const TIFF_X_RESOLUTION: u16 = 282;
const TIFF_Y_RESOLUTION: u16 = 283;
const TIFF_RESOLUTION_UNIT: u16 = 296;

/// First IFD only: size, resolution and resolution unit entries.
fn parse_tiff(data: &[u8]) -> std::result::Result<Header, BinaryError> {
    let endian = if data.starts_with(b"II") {
        Endian::Little
    } else {
        Endian::Big
    };
    let ifd = read_u32(data, 4, endian)? as usize;
    let count = read_u16(data, ifd, endian)? as usize;

    let (mut width, mut height) = (None, None);
    let (mut x_res, mut y_res) = (None, None);
    let mut unit = 2u32;

    for i in 0..count {
        let entry = ifd + 2 + i * 12;
        let tag = read_u16(data, entry, endian)?;
        let field_type = read_u16(data, entry + 2, endian)?;
        let scalar = || -> std::result::Result<u32, BinaryError> {
            match field_type {
                3 => Ok(read_u16(data, entry + 8, endian)? as u32),
                _ => read_u32(data, entry + 8, endian),
            }
        };
        let rational = || -> std::result::Result<f64, BinaryError> {
            let at = read_u32(data, entry + 8, endian)? as usize;
            let num = read_u32(data, at, endian)?;
            let den = read_u32(data, at + 4, endian)?;
            Ok(if den == 0 { 0.0 } else { num as f64 / den as f64 })
        };
        match tag {
            TIFF_IMAGE_WIDTH => width = Some(scalar()?),
            TIFF_IMAGE_LENGTH => height = Some(scalar()?),
            TIFF_X_RESOLUTION => x_res = Some(rational()?),
            TIFF_Y_RESOLUTION => y_res = Some(rational()?),
            TIFF_RESOLUTION_UNIT => unit = scalar()?,
            _ => {},
        }
    }

    let missing = |what: &str| BinaryError::ParseError(format!("TIFF has no {}", what));
    let to_dpi = |res: Option<f64>| match (res, unit) {
        (Some(res), 2) => res.round() as u32,
        (Some(res), 3) => (res * 2.54).round() as u32,
        _ => DEFAULT_DPI,
    };
    Ok(Header::new(
        width.ok_or_else(|| missing("ImageWidth"))?,
        height.ok_or_else(|| missing("ImageLength"))?,
        to_dpi(x_res),
        to_dpi(y_res),
    ))
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    /// A PNG header with an optional pHYs chunk; pixel data is not needed.
    pub(crate) fn png(width: u32, height: u32, ppm: Option<u32>) -> Vec<u8> {
        let mut data = vec![0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A];
        data.extend_from_slice(&13u32.to_be_bytes());
        data.extend_from_slice(b"IHDR");
        data.extend_from_slice(&width.to_be_bytes());
        data.extend_from_slice(&height.to_be_bytes());
        data.extend_from_slice(&[8, 6, 0, 0, 0]);
        data.extend_from_slice(&[0; 4]);
        if let Some(ppm) = ppm {
            data.extend_from_slice(&9u32.to_be_bytes());
            data.extend_from_slice(b"pHYs");
            data.extend_from_slice(&ppm.to_be_bytes());
            data.extend_from_slice(&ppm.to_be_bytes());
            data.push(1);
            data.extend_from_slice(&[0; 4]);
        }
        data.extend_from_slice(&0u32.to_be_bytes());
        data.extend_from_slice(b"IEND");
        data.extend_from_slice(&[0; 4]);
        data
    }

    fn jpeg(width: u16, height: u16, dpi: u16) -> Vec<u8> {
        let mut data = vec![0xFF, 0xD8];
        data.extend_from_slice(&[0xFF, 0xE0, 0x00, 0x10]);
        data.extend_from_slice(b"JFIF\0");
        data.extend_from_slice(&[1, 1, 1]);
        data.extend_from_slice(&dpi.to_be_bytes());
        data.extend_from_slice(&dpi.to_be_bytes());
        data.extend_from_slice(&[0, 0]);
        data.extend_from_slice(&[0xFF, 0xC0, 0x00, 0x11, 8]);
        data.extend_from_slice(&height.to_be_bytes());
        data.extend_from_slice(&width.to_be_bytes());
        data.extend_from_slice(&[3, 1, 0x22, 0, 2, 0x11, 1, 3, 0x11, 1]);
        data.extend_from_slice(&[0xFF, 0xD9]);
        data
    }

    #[test]
    fn test_png_size_and_resolution() {
        let image = Image::from_blob(png(300, 200, Some(5906)), None).unwrap();
        assert_eq!(image.format(), ImageFormat::Png);
        assert_eq!((image.px_width(), image.px_height()), (300, 200));
        assert_eq!((image.horz_dpi(), image.vert_dpi()), (150, 150));
        assert_eq!(image.filename(), "image.png");
        assert_eq!(image.content_type(), ct::PNG);
        assert_eq!(image.default_cx(), Length::from_inches(2.0));

        let plain = Image::from_blob(png(72, 144, None), None).unwrap();
        assert_eq!(plain.horz_dpi(), DEFAULT_DPI);
        assert_eq!(plain.default_cx(), Length::from_inches(1.0));
        assert_eq!(plain.default_cy(), Length::from_inches(2.0));
    }

    #[test]
    fn test_jpeg_sof_and_jfif_density() {
        let image = Image::from_blob(jpeg(640, 480, 96), Some("photo.JPEG".into())).unwrap();
        assert_eq!((image.px_width(), image.px_height()), (640, 480));
        assert_eq!(image.horz_dpi(), 96);
        assert_eq!(image.ext(), "JPEG");
        assert_eq!(image.content_type(), ct::JPEG);
    }

    #[test]
    fn test_gif_bmp_tiff() {
        let mut gif = b"GIF89a".to_vec();
        gif.extend_from_slice(&[10, 0, 20, 0, 0, 0, 0]);
        let image = Image::from_blob(gif, None).unwrap();
        assert_eq!((image.px_width(), image.px_height()), (10, 20));

        let mut bmp = vec![0u8; 54];
        bmp[..2].copy_from_slice(b"BM");
        bmp[18..22].copy_from_slice(&4i32.to_le_bytes());
        bmp[22..26].copy_from_slice(&(-8i32).to_le_bytes());
        bmp[38..42].copy_from_slice(&3780u32.to_le_bytes());
        let image = Image::from_blob(bmp, None).unwrap();
        assert_eq!((image.px_width(), image.px_height()), (4, 8));
        assert_eq!((image.horz_dpi(), image.vert_dpi()), (96, 96));

        let mut tiff = b"MM\x00\x2A".to_vec();
        tiff.extend_from_slice(&8u32.to_be_bytes());
        tiff.extend_from_slice(&2u16.to_be_bytes());
        for (tag, value) in [(256u16, 33u32), (257, 44)] {
            tiff.extend_from_slice(&tag.to_be_bytes());
            tiff.extend_from_slice(&4u16.to_be_bytes());
            tiff.extend_from_slice(&1u32.to_be_bytes());
            tiff.extend_from_slice(&value.to_be_bytes());
        }
        tiff.extend_from_slice(&0u32.to_be_bytes());
        let image = Image::from_blob(tiff, None).unwrap();
        assert_eq!((image.px_width(), image.px_height()), (33, 44));
        assert_eq!(image.horz_dpi(), DEFAULT_DPI);
    }

    #[test]
    fn test_unknown_and_truncated_headers() {
        assert!(matches!(
            Image::from_blob(b"not an image".to_vec(), None),
            Err(OoxmlError::UnsupportedFormat(_))
        ));
        let truncated = png(1, 1, None)[..12].to_vec();
        assert!(matches!(
            Image::from_blob(truncated, None),
            Err(OoxmlError::InvalidFormat(_))
        ));
    }

    #[test]
    fn test_hash_identifies_content() {
        let a = Image::from_blob(png(1, 1, None), Some("a.png".into())).unwrap();
        let b = Image::from_blob(png(1, 1, None), Some("b.png".into())).unwrap();
        let c = Image::from_blob(png(2, 1, None), None).unwrap();
        assert_eq!(a.sha256(), b.sha256());
        assert_ne!(a.sha256(), c.sha256());
        assert_eq!(a.sha256().len(), 64);
    }

    #[test]
    fn test_scaled_dimensions_keep_aspect() {
        let image = Image::from_blob(png(200, 100, None), None).unwrap();
        let (cx, cy) = image.scaled_dimensions(Some(Length::from_inches(1.0)), None);
        assert_eq!(cx, Length::from_inches(1.0));
        assert_eq!(cy, Length::from_inches(0.5));
        let (cx, cy) = image.scaled_dimensions(None, None);
        assert_eq!((cx, cy), (image.default_cx(), image.default_cy()));
    }
}
