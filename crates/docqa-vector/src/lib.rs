pub mod schema;
pub mod semantic;
pub mod store;
pub mod writer;

pub use semantic::SemanticRetriever;
pub use store::ChunkStore;
pub use writer::PartitionWriter;
