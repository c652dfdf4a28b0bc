//! Office Open XML (OOXML) packages and markup.
//!
//! The implementation follows the Open Packaging Conventions (OPC) and the
//! structure of the python-docx library, adapted for Rust.
//!
//! # Architecture
//!
//! 1. **OPC Layer** (`opc`): parts, relationships, content types, and the
//!    physical package readers and writers
//! 2. **Markup Layer** (`oxml`): an editable element tree with schema-ordered
//!    child insertion and typed attribute access
//! 3. **Word Layer** (`docx`): the document body and its inline pictures
//!
//! # Example: Inspecting inline shapes
//!
//! ```rust,no_run
//! use docx_oxml::ooxml::docx::Document;
//! use docx_oxml::ooxml::opc::DirPhysPkg;
//!
//! let doc = Document::open(&DirPhysPkg::new("unzipped-docx"))?;
//! for shape in doc.inline_shapes()?.iter() {
//!     println!("{:?} {:?}x{:?}", shape.shape_type(), shape.width()?, shape.height()?);
//! }
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod docx;
pub mod error;
pub mod opc;
pub mod oxml;

pub use docx::{Document, Package};
pub use error::{OoxmlError, Result};
pub use opc::{OpcPackage, PackURI};
