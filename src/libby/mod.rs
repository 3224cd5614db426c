//! Libby metadata document and the book fields derived from it

mod book;
mod document;

pub use book::{BookMetadata, Creator};
pub use document::{document_path, LibbyMetadata, METADATA_PATH};
