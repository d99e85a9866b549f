//! Specification files: syntax and discovery.

mod loader;
mod parser;

pub use loader::{SPECIFICATION_EXTENSION, SpecificationLoader};
pub use parser::{CONVERSION_DIRECTIVE, SpecificationParser};
