//! Common types and utilities shared across the package and markup layers.

// Submodule declarations
pub mod binary;
pub mod id;
pub mod unit;
pub mod xml;

// Re-exports for convenience
pub use id::IdScopes;
pub use unit::Length;
