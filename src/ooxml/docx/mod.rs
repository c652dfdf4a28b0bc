/// Word (.docx) document support.
///
/// Editing a document body means two things at once: changing markup in the
/// main document part and keeping the package around it consistent. The types
/// here pair both:
/// - `Package`: the .docx package, image parts shared by content hash, shape ids
/// - `Document`: paragraphs, runs and inline pictures of the body
/// - `InlineShapes`: the drawings placed inline in the text, in document order
/// - `Image`: a decoded image header plus its bytes
///
/// # Example
///
/// ```rust
/// use docx_oxml::common::Length;
/// use docx_oxml::ooxml::docx::{Document, ImageDescriptor};
/// use docx_oxml::ooxml::opc::MemPhysPkg;
///
/// # let mut gif = b"GIF89a".to_vec();
/// # gif.extend_from_slice(&[144, 0, 72, 0, 0, 0, 0]);
/// let mut doc = Document::new()?;
/// doc.add_inline_picture(ImageDescriptor::bytes(gif, Some("logo.gif")), Some(Length::from_inches(1.0)), None)?;
///
/// let mut phys = MemPhysPkg::new();
/// doc.save(&mut phys)?;
/// assert!(phys.member_names().any(|name| name == "word/media/image1.gif"));
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
pub mod document;
pub mod image;
pub mod package;
pub mod parts;
pub mod shape;

pub use document::Document;
pub use image::{Image, ImageDescriptor, ImageFormat};
pub use package::Package;
pub use shape::{InlineShape, InlineShapeMut, InlineShapeType, InlineShapes};
