use arrow_schema::{DataType, Field, Schema};
use std::sync::Arc;

/// Arrow schema of one chunk-store partition. The embedding dimension is a
/// parameter: strategies may use different embedding models.
pub fn build_arrow_schema(dim: i32) -> Arc<Schema> {
    Arc::new(Schema::new(vec![
        Field::new("id", DataType::Utf8, false),
        Field::new("text", DataType::Utf8, false),
        Field::new("source", DataType::Utf8, false),
        Field::new("page", DataType::Int32, false),
        Field::new(
            "vector",
            DataType::FixedSizeList(Arc::new(Field::new("item", DataType::Float32, true)), dim),
            true,
        ),
    ]))
}
