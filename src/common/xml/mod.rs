//! XML text helpers shared by the markup writer and the package writer.

mod escape;

pub use escape::{escape_attr, escape_text};
