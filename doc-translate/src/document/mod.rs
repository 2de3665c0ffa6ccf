//! Reading source documents and writing translated ones.

mod extract;
mod write;

pub use extract::extract_text;
pub use write::{OutputFormat, output_path, write_document};
