//! docx-oxml - an editable, in-memory model of Office Open XML packages
//!
//! This library loads a package into a graph of parts and relationships, binds
//! the main document's markup to typed element views, and writes the graph back
//! out. Edits keep the package consistent: children are inserted in schema
//! order, image parts are shared by content hash, and relationship and drawing
//! ids are never issued twice.
//!
//! # Features
//!
//! - **Package graph**: Parts, relationships and content types with id allocation
//! - **Ordered insertion**: New children land where the element's content model puts them
//! - **Element registry**: Static lookup from qualified name to element class
//! - **Inline shapes**: Enumerate, classify, resize and insert inline pictures
//!
//! # Example - Adding a picture
//!
//! ```
//! use docx_oxml::ooxml::docx::{Document, ImageDescriptor};
//! use docx_oxml::ooxml::opc::MemPhysPkg;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! # let mut bmp = vec![0u8; 54];
//! # bmp[..2].copy_from_slice(b"BM");
//! # bmp[18..22].copy_from_slice(&96i32.to_le_bytes());
//! # bmp[22..26].copy_from_slice(&48i32.to_le_bytes());
//! let mut doc = Document::new()?;
//! let paragraph = doc.add_paragraph()?;
//! let run = doc.add_run(paragraph, "Signature: ")?;
//! doc.add_picture(ImageDescriptor::bytes(bmp, Some("sig.bmp")), run)?;
//!
//! let mut phys = MemPhysPkg::new();
//! doc.save(&mut phys)?;
//!
//! let reopened = Document::open(&phys)?;
//! assert_eq!(reopened.inline_shapes()?.len(), 1);
//! # Ok(())
//! # }
//! ```

/// Shared building blocks: lengths, id allocation, binary reads, XML helpers
pub mod common;

/// OOXML packages: the OPC layer, markup binding and Word documents
pub mod ooxml;

pub use common::Length;
pub use ooxml::docx::{Document, InlineShapeType, Package};
pub use ooxml::{OoxmlError, Result};
