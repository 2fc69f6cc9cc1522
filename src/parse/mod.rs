//! Readers for persisted MultiTransform documents.

pub mod document_xml;
