pub mod lexical;
pub mod tantivy_utils;

pub use lexical::LexicalRetriever;
