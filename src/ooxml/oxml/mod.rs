//! Markup binding layer.
//!
//! An arena markup tree ([`tree`]) plus typed, schema-aware views over its nodes.
//! Element classes ([`registry`]) declare their content models, and the insertion
//! routines in [`xmlchemy`] use them to keep children in schema order no matter
//! which order callers add them in.

/// Copyable handle type wrapping one element node.
macro_rules! node_handle {
    ($name:ident) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq)]
        pub struct $name(NodeId);

        impl $name {
            pub fn new(node: NodeId) -> Self {
                Self(node)
            }

            pub fn node(&self) -> NodeId {
                self.0
            }
        }
    };
}

pub mod ns;
pub mod parser;
pub mod registry;
pub mod shape;
pub mod simpletypes;
pub mod text;
pub mod tree;
pub mod xmlchemy;

pub use parser::parse_xml;
pub use registry::{ElementClass, OxmlElement};
pub use tree::{NodeId, XmlTree};
