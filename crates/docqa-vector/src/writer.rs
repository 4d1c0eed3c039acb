use anyhow::Result;
use indicatif::{ProgressBar, ProgressStyle};
use lancedb::{connect, Connection};
use std::path::Path;
use std::sync::Arc;

use arrow_array::{FixedSizeListArray, Int32Array, RecordBatch, RecordBatchIterator, StringArray};

use docqa_core::types::Chunk;

use crate::schema::build_arrow_schema;

/// Offline writer for one partition. Runs only during the ingestion phase;
/// no live retriever ever shares a process with it.
pub struct PartitionWriter {
    db: Connection,
    partition: String,
    dim: i32,
}

impl PartitionWriter {
    pub async fn create(db_path: &Path, partition: &str, dim: usize) -> Result<Self> {
        let db = connect(db_path.to_string_lossy().as_ref()).execute().await?;
        Ok(Self { db, partition: partition.to_string(), dim: dim as i32 })
    }

    pub async fn partition_exists(&self) -> Result<bool> {
        Ok(self.db.table_names().execute().await?.contains(&self.partition))
    }

    pub async fn write(&self, chunks: &[Chunk], embeddings: &[Vec<f32>]) -> Result<()> {
        if chunks.is_empty() {
            tracing::warn!("no chunks to write into partition '{}'", self.partition);
            return Ok(());
        }
        anyhow::ensure!(
            chunks.len() == embeddings.len(),
            "chunks and embeddings length must match"
        );
        println!("Indexing {} chunks into partition: {}", chunks.len(), self.partition);
        let pb = ProgressBar::new(chunks.len() as u64);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} chunks ({percent}%) {msg}")
                .unwrap()
                .progress_chars("#>-"),
        );
        let batch_size = 1000usize;
        for (start, batch) in chunks.chunks(batch_size).enumerate().map(|(i, b)| (i * batch_size, b)) {
            let vectors = &embeddings[start..start + batch.len()];
            self.insert_batch(batch, vectors).await?;
            pb.set_position((start + batch.len()) as u64);
        }
        pb.finish_with_message("partition written");
        Ok(())
    }

    async fn insert_batch(&self, chunks: &[Chunk], embeddings: &[Vec<f32>]) -> Result<()> {
        let record_batch = self.to_record_batch(chunks, embeddings)?;
        let schema = record_batch.schema();
        let reader = Box::new(RecordBatchIterator::new(vec![Ok(record_batch)].into_iter(), schema));
        if self.partition_exists().await? {
            self.db.open_table(&self.partition).execute().await?.add(reader).execute().await?;
        } else {
            self.db.create_table(&self.partition, reader).execute().await?;
        }
        Ok(())
    }

    fn to_record_batch(&self, chunks: &[Chunk], embeddings: &[Vec<f32>]) -> Result<RecordBatch> {
        let schema = build_arrow_schema(self.dim);
        let mut ids = Vec::new();
        let mut texts = Vec::new();
        let mut sources = Vec::new();
        let mut pages = Vec::new();
        let mut vectors: Vec<Option<Vec<Option<f32>>>> = Vec::new();
        for (chunk, embedding) in chunks.iter().zip(embeddings.iter()) {
            ids.push(chunk.id.clone());
            texts.push(chunk.text.clone());
            sources.push(chunk.source.clone());
            pages.push(chunk.page as i32);
            vectors.push(Some(embedding.iter().map(|&x| Some(x)).collect()));
        }
        let record_batch = RecordBatch::try_new(
            schema,
            vec![
                Arc::new(StringArray::from(ids)),
                Arc::new(StringArray::from(texts)),
                Arc::new(StringArray::from(sources)),
                Arc::new(Int32Array::from(pages)),
                Arc::new(FixedSizeListArray::from_iter_primitive::<arrow_array::types::Float32Type, _, _>(
                    vectors.into_iter(),
                    self.dim,
                )),
            ],
        )?;
        Ok(record_batch)
    }
}
