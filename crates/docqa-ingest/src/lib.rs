//! Offline ingestion: PDF pages → filtered page records → chunks.
//!
//! Everything here runs in the batch phase; the query path only ever sees
//! the persisted output.

pub mod chunker;
pub mod pages;
pub mod pdf;

pub use chunker::chunk_pages;
pub use pages::{is_table_of_contents_page, load_parsed_pages, save_parsed_pages, PageRecord};
pub use pdf::extract_pdf_pages;
