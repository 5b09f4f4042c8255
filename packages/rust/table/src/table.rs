//! Typed CRUD accessor over one collection.

use std::marker::PhantomData;

use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{debug, instrument};

use leadpipe_http::Client;
use leadpipe_shared::{LeadPipeError, Result};

use crate::record::{FieldsBody, Page, PartialFailure, PartialResult, Record, RecordsBody};

/// Maximum number of records the service accepts in one batched write.
pub const MAX_BATCH: usize = 10;

/// Stateless accessor bound to `base_id/table_id`.
///
/// Pagination and write chunking are handled here so callers work with
/// plain sequences. Nothing is cached between calls.
#[derive(Debug, Clone)]
pub struct Table<T> {
    client: Client,
    base_id: String,
    table_id: String,
    _fields: PhantomData<fn() -> T>,
}

impl<T> Table<T>
where
    T: Serialize + DeserializeOwned,
{
    pub fn new(client: Client, base_id: impl Into<String>, table_id: impl Into<String>) -> Self {
        Self {
            client,
            base_id: base_id.into(),
            table_id: table_id.into(),
            _fields: PhantomData,
        }
    }

    fn collection(&self) -> [&str; 2] {
        [&self.base_id, &self.table_id]
    }

    /// Fetch every record, following continuation tokens until the service
    /// returns an empty one. On a page failure the records gathered so far
    /// are returned alongside the error.
    #[instrument(skip_all, fields(table = %self.table_id))]
    pub async fn list(&self) -> PartialResult<T> {
        let mut records = Vec::new();
        let mut offset = String::new();
        let mut pages = 0usize;

        loop {
            let page = match self.list_page(&offset).await {
                Ok(page) => page,
                Err(error) => return Err(PartialFailure { records, error }),
            };
            pages += 1;
            records.extend(page.records);

            if page.offset.is_empty() {
                break;
            }
            offset = page.offset;
        }

        debug!(pages, records = records.len(), "listed records");
        Ok(records)
    }

    async fn list_page(&self, offset: &str) -> Result<Page<T>> {
        let params: Vec<(&str, &str)> = if offset.is_empty() {
            Vec::new()
        } else {
            vec![("offset", offset)]
        };

        self.client
            .get_json(&self.collection(), &params)
            .await
            .map_err(|e| LeadPipeError::context("get records", e))
    }

    /// Fetch one record by id.
    pub async fn retrieve(&self, record_id: &str) -> Result<Record<T>> {
        let [base, table] = self.collection();
        self.client
            .get_json(&[base, table, record_id], &[])
            .await
            .map_err(|e| LeadPipeError::context(format!("get record {record_id}"), e))
    }

    /// Create one record; the service assigns its id and creation time.
    pub async fn create(&self, record: &Record<T>) -> Result<Record<T>> {
        self.client
            .post_json(&self.collection(), &FieldsBody { fields: &record.fields })
            .await
            .map_err(|e| LeadPipeError::context("create record", e))
    }

    /// Create many records in a single request.
    pub async fn create_many(&self, records: &[Record<T>]) -> Result<Vec<Record<T>>> {
        let page: Page<T> = self
            .client
            .post_json(&self.collection(), &RecordsBody { records })
            .await
            .map_err(|e| LeadPipeError::context("create records", e))?;
        Ok(page.records)
    }

    /// Update records in chunks of [`MAX_BATCH`], one request per chunk, in
    /// order. A failing chunk stops the run: the records updated by earlier
    /// chunks come back with the error and later chunks are not sent.
    #[instrument(skip_all, fields(table = %self.table_id, records = records.len()))]
    pub async fn update(&self, records: &[Record<T>]) -> PartialResult<T> {
        let mut updated = Vec::with_capacity(records.len());

        for (index, chunk) in records.chunks(MAX_BATCH).enumerate() {
            match self.update_chunk(chunk).await {
                Ok(page) => updated.extend(page.records),
                Err(error) => {
                    let error = LeadPipeError::context(format!("update chunk {index}"), error);
                    return Err(PartialFailure {
                        records: updated,
                        error,
                    });
                }
            }
        }

        Ok(updated)
    }

    async fn update_chunk(&self, chunk: &[Record<T>]) -> Result<Page<T>> {
        self.client
            .patch_json(&self.collection(), &RecordsBody { records: chunk })
            .await
            .map_err(|e| LeadPipeError::context("update records", e))
    }

    /// Delete one record by id.
    pub async fn delete(&self, record_id: &str) -> Result<()> {
        let [base, table] = self.collection();
        self.client
            .delete(&[base, table, record_id])
            .await
            .map_err(|e| LeadPipeError::context(format!("delete record {record_id}"), e))?;
        Ok(())
    }
}
