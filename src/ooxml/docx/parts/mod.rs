/// Part implementations for Word documents.
///
/// The main document part and the media parts pictures are stored in.
pub mod document_part;
pub mod image_part;

pub use document_part::{DocumentPart, DocumentPartMut};
pub use image_part::ImagePart;
