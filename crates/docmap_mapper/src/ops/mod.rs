//! Runtime containers used while assembling documents.

mod dynamic_document;

pub use dynamic_document::DynamicDocument;
