use anyhow::{Context, Result};
use futures::TryStreamExt;
use lancedb::query::{ExecutableQuery, QueryBase};
use lancedb::{connect, Connection};
use std::path::Path;

use arrow_array::RecordBatch;

use docqa_core::error::Error;
use docqa_core::types::Chunk;

/// Cap on a full-partition scan when hydrating the lexical index.
const SCAN_LIMIT: usize = 16_384;

/// Read-only provider of previously ingested chunks. One LanceDB table per
/// partition; ingestion and querying are separate process phases, so all
/// reads here go against immutable data.
pub struct ChunkStore {
    db: Connection,
    runtime: tokio::runtime::Runtime,
}

impl ChunkStore {
    pub fn open(db_path: &Path) -> Result<Self> {
        let runtime = tokio::runtime::Builder::new_current_thread().enable_all().build()?;
        let db = runtime
            .block_on(async { connect(db_path.to_string_lossy().as_ref()).execute().await })?;
        Ok(Self { db, runtime })
    }

    pub fn partition_names(&self) -> Result<Vec<String>> {
        Ok(self.runtime.block_on(async { self.db.table_names().execute().await })?)
    }

    pub fn has_partition(&self, name: &str) -> Result<bool> {
        Ok(self.partition_names()?.iter().any(|t| t == name))
    }

    /// All chunks of a partition, in insertion order. A missing partition
    /// is a distinguishable not-found condition: ingestion never ran.
    pub fn load_partition(&self, name: &str) -> Result<Vec<Chunk>> {
        if !self.has_partition(name)? {
            return Err(Error::NotFound(format!(
                "partition '{}' does not exist in the chunk store; run ingestion first",
                name
            ))
            .into());
        }
        self.runtime.block_on(async {
            let table = self.db.open_table(name).execute().await?;
            let mut stream = table.query().limit(SCAN_LIMIT).execute().await?;
            let mut chunks = Vec::new();
            while let Some(batch) = stream.try_next().await? {
                for row in 0..batch.num_rows() {
                    chunks.push(decode_chunk(&batch, row)?);
                }
            }
            Ok(chunks)
        })
    }

    /// Nearest chunks to an embedded query, most similar first.
    pub fn query_top_k(&self, name: &str, query_vec: &[f32], k: usize) -> Result<Vec<(Chunk, f32)>> {
        if k == 0 {
            return Ok(Vec::new());
        }
        self.runtime.block_on(async {
            let table = self.db.open_table(name).execute().await?;
            let mut stream = table.vector_search(query_vec.to_vec())?.limit(k).execute().await?;
            let mut hits = Vec::new();
            while let Some(batch) = stream.try_next().await? {
                for row in 0..batch.num_rows() {
                    let chunk = decode_chunk(&batch, row)?;
                    hits.push((chunk, decode_score(&batch, row)));
                }
            }
            Ok(hits)
        })
    }
}

fn column_str(batch: &RecordBatch, name: &str, row: usize) -> Result<String> {
    let col = batch.column_by_name(name).with_context(|| format!("column '{}' missing", name))?;
    let arr = col
        .as_any()
        .downcast_ref::<arrow_array::StringArray>()
        .with_context(|| format!("column '{}' is not utf8", name))?;
    Ok(arr.value(row).to_string())
}

fn decode_chunk(batch: &RecordBatch, row: usize) -> Result<Chunk> {
    let page = batch
        .column_by_name("page")
        .context("column 'page' missing")?
        .as_any()
        .downcast_ref::<arrow_array::Int32Array>()
        .context("column 'page' is not int32")?
        .value(row);
    Ok(Chunk {
        id: column_str(batch, "id", row)?,
        text: column_str(batch, "text", row)?,
        source: column_str(batch, "source", row)?,
        page: page.max(0) as u32,
    })
}

fn decode_score(batch: &RecordBatch, row: usize) -> f32 {
    // LanceDB reports a distance; flip it so higher is always better.
    if let Some(col) = batch.column_by_name("_distance") {
        if let Some(arr) = col.as_any().downcast_ref::<arrow_array::Float32Array>() {
            return 1.0 - arr.value(row);
        }
    }
    0.5
}
