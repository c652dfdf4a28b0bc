/// ImagePart - a picture stored under `/word/media/`.
use std::any::Any;
use std::borrow::Cow;

use crate::common::unit::Length;
use crate::ooxml::docx::image::Image;
use crate::ooxml::opc::error::Result;
use crate::ooxml::opc::packuri::PackURI;
use crate::ooxml::opc::part::{BlobPart, Part};
use crate::ooxml::opc::rel::Relationships;

/// A media part holding one raster image.
///
/// The content hash of the payload identifies the part when the same picture is
/// inserted again.
#[derive(Debug)]
pub struct ImagePart {
    partname: PackURI,
    content_type: String,
    image: Image,
    rels: Relationships,
}

impl ImagePart {
    pub fn new(partname: PackURI, image: Image) -> Self {
        let rels = Relationships::new(partname.base_uri().to_string());
        Self {
            partname,
            content_type: image.content_type().to_string(),
            image,
            rels,
        }
    }

    /// Part constructor for loaded image content types. Payloads whose header
    /// cannot be read stay plain blob parts.
    pub fn load(partname: PackURI, content_type: String, blob: Vec<u8>) -> Result<Box<dyn Part>> {
        let filename = format!("image.{}", partname.ext());
        match Image::from_blob(blob.clone(), Some(filename)) {
            Ok(image) => {
                let mut part = Self::new(partname, image);
                part.content_type = content_type;
                Ok(Box::new(part))
            },
            Err(e) => {
                log::warn!("{} kept as an opaque part: {}", partname, e);
                Ok(Box::new(BlobPart::new(partname, content_type, blob)))
            },
        }
    }

    #[inline]
    pub fn image(&self) -> &Image {
        &self.image
    }

    pub fn sha256(&self) -> &str {
        self.image.sha256()
    }

    /// Name the picture is known by, `image.{ext}` for loaded parts.
    pub fn filename(&self) -> &str {
        self.image.filename()
    }

    pub fn default_cx(&self) -> Length {
        self.image.default_cx()
    }

    pub fn default_cy(&self) -> Length {
        self.image.default_cy()
    }
}

impl Part for ImagePart {
    fn partname(&self) -> &PackURI {
        &self.partname
    }

    fn content_type(&self) -> &str {
        &self.content_type
    }

    fn blob(&self) -> Cow<'_, [u8]> {
        Cow::Borrowed(self.image.blob())
    }

    fn rels(&self) -> &Relationships {
        &self.rels
    }

    fn rels_mut(&mut self) -> &mut Relationships {
        &mut self.rels
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}
