//! LanceDB-backed similarity index.
//!
//! Rows are keyed by document id and upserted with `merge_insert`, so
//! re-ingesting the corpus replaces passages instead of duplicating them.
//! Scores come from Lance's cosine distance, converted back to a clamped
//! similarity.

use std::sync::Arc;

use arrow_array::{Array, FixedSizeListArray, Float32Array, RecordBatch, RecordBatchIterator, StringArray};
use async_trait::async_trait;
use futures::TryStreamExt;
use lancedb::query::{ExecutableQuery, QueryBase};
use lancedb::{Connection, DistanceType, Table};
use tokio::sync::OnceCell;

use profilerag_core::error::{Error, Result};
use profilerag_core::traits::SimilarityIndex;
use profilerag_core::types::{ClearOutcome, DocumentMetadata, IndexedVector, SearchResult};

use crate::schema::build_passage_schema;
use crate::similarity::{ensure_finite, score_from_cosine_distance};
use crate::table::{ensure_table, open_db, table_exists};

fn index_err(e: impl std::fmt::Display) -> Error {
    Error::Index(e.to_string())
}

pub struct LanceIndex {
    uri: Option<String>,
    table: String,
    dim: usize,
    conn: OnceCell<Connection>,
}

impl LanceIndex {
    /// `uri = None` builds an index that reports `IndexUnavailable` on use.
    pub fn new(uri: Option<String>, table: impl Into<String>, dim: usize) -> Self {
        Self { uri: uri.filter(|u| !u.trim().is_empty()), table: table.into(), dim, conn: OnceCell::new() }
    }

    pub fn is_configured(&self) -> bool {
        self.uri.is_some()
    }

    async fn connection(&self) -> Result<&Connection> {
        let uri = self
            .uri
            .as_deref()
            .ok_or_else(|| Error::IndexUnavailable("index.uri is not set for the lance backend".into()))?;
        self.conn
            .get_or_try_init(|| async {
                tracing::info!(uri, table = %self.table, "opening LanceDB");
                open_db(uri).await.map_err(|e| Error::IndexUnavailable(format!("{:#}", e)))
            })
            .await
    }

    async fn open_table(&self) -> Result<Table> {
        let conn = self.connection().await?;
        ensure_table(conn, &self.table, build_passage_schema(self.dim as i32))
            .await
            .map_err(|e| Error::Index(format!("{:#}", e)))?;
        conn.open_table(&self.table).execute().await.map_err(index_err)
    }

    fn check_dim(&self, len: usize) -> Result<()> {
        if len != self.dim {
            return Err(Error::DimensionMismatch { expected: self.dim, actual: len });
        }
        Ok(())
    }

    fn to_record_batch(&self, rows: &[IndexedVector]) -> Result<RecordBatch> {
        let schema = build_passage_schema(self.dim as i32);
        let mut ids = Vec::with_capacity(rows.len());
        let mut texts = Vec::with_capacity(rows.len());
        let mut metas = Vec::with_capacity(rows.len());
        let mut vectors: Vec<Option<Vec<Option<f32>>>> = Vec::with_capacity(rows.len());
        for row in rows {
            ids.push(row.id.clone());
            texts.push(row.text.clone());
            metas.push(serde_json::to_string(&row.metadata).map_err(index_err)?);
            vectors.push(Some(row.embedding.iter().map(|&x| Some(x)).collect()));
        }
        RecordBatch::try_new(
            schema,
            vec![
                Arc::new(StringArray::from(ids)),
                Arc::new(StringArray::from(texts)),
                Arc::new(StringArray::from(metas)),
                Arc::new(FixedSizeListArray::from_iter_primitive::<arrow_array::types::Float32Type, _, _>(
                    vectors.into_iter(),
                    self.dim as i32,
                )),
            ],
        )
        .map_err(index_err)
    }
}

fn string_column<'a>(batch: &'a RecordBatch, name: &str) -> Result<&'a StringArray> {
    batch
        .column_by_name(name)
        .and_then(|c| c.as_any().downcast_ref::<StringArray>())
        .ok_or_else(|| Error::Index(format!("column '{}' missing from search results", name)))
}

#[async_trait]
impl SimilarityIndex for LanceIndex {
    fn backend(&self) -> &str {
        "lance"
    }

    async fn prepare(&self) -> Result<()> {
        self.open_table().await.map(|_| ())
    }

    async fn upsert(&self, vectors: Vec<IndexedVector>) -> Result<()> {
        if vectors.is_empty() {
            return Ok(());
        }
        for v in &vectors {
            self.check_dim(v.embedding.len())?;
            ensure_finite(&v.embedding)?;
        }
        let table = self.open_table().await?;
        let batch = self.to_record_batch(&vectors)?;
        let schema = batch.schema();
        let reader = Box::new(RecordBatchIterator::new(vec![Ok(batch)].into_iter(), schema));
        let mut mi = table.merge_insert(&["id"]);
        mi.when_matched_update_all(None).when_not_matched_insert_all();
        mi.execute(reader).await.map_err(index_err)?;
        tracing::debug!(rows = vectors.len(), table = %self.table, "upserted passages");
        Ok(())
    }

    async fn query(&self, vector: &[f32], top_k: usize) -> Result<Vec<SearchResult>> {
        if top_k == 0 {
            return Err(Error::InvalidInput("top_k must be at least 1".into()));
        }
        self.check_dim(vector.len())?;
        ensure_finite(vector)?;
        let table = self.open_table().await?;
        if table.count_rows(None).await.map_err(index_err)? == 0 {
            return Ok(Vec::new());
        }
        let mut stream = table
            .vector_search(vector.to_vec())
            .map_err(index_err)?
            .distance_type(DistanceType::Cosine)
            .limit(top_k)
            .execute()
            .await
            .map_err(index_err)?;

        let mut hits = Vec::new();
        while let Some(batch) = stream.try_next().await.map_err(index_err)? {
            let texts = string_column(&batch, "text")?;
            let metas = string_column(&batch, "metadata")?;
            let distances = batch
                .column_by_name("_distance")
                .and_then(|c| c.as_any().downcast_ref::<Float32Array>())
                .ok_or_else(|| Error::Index("column '_distance' missing from search results".into()))?;
            for i in 0..batch.num_rows() {
                let metadata: DocumentMetadata = if metas.is_null(i) {
                    DocumentMetadata::default()
                } else {
                    serde_json::from_str(metas.value(i)).unwrap_or_default()
                };
                hits.push(SearchResult {
                    text: texts.value(i).to_string(),
                    score: score_from_cosine_distance(distances.value(i)),
                    metadata,
                });
            }
        }
        hits.sort_by(|a, b| b.score.total_cmp(&a.score));
        hits.truncate(top_k);
        Ok(hits)
    }

    async fn len(&self) -> Result<usize> {
        let conn = self.connection().await?;
        if !table_exists(conn, &self.table).await.map_err(index_err)? {
            return Ok(0);
        }
        let table = conn.open_table(&self.table).execute().await.map_err(index_err)?;
        table.count_rows(None).await.map_err(index_err)
    }

    async fn clear(&self) -> Result<ClearOutcome> {
        if !self.is_configured() {
            tracing::warn!(table = %self.table, "index backend not configured; nothing to clear");
            return Ok(ClearOutcome::Unsupported);
        }
        let conn = self.connection().await?;
        if table_exists(conn, &self.table).await.map_err(index_err)? {
            let table = conn.open_table(&self.table).execute().await.map_err(index_err)?;
            table.delete("true").await.map_err(index_err)?;
        }
        Ok(ClearOutcome::Cleared)
    }
}
