//! Record CRUD endpoints (`/data`)

use reqwest::multipart::{Form, Part};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::path::Path;
use tracing::debug;

use super::types::{
    AnalyticsSummary, BulkOperation, BulkReport, DeleteResponse, ImportFormat, NewRecord, Record,
    RecordPage, RecordUpdate, ValidationReport,
};
use super::ApiClient;
use crate::error::Result;

impl ApiClient {
    /// One page of records; `page` is 1-based
    pub async fn list_records(&self, page: u32, limit: usize, category: Option<&str>) -> Result<RecordPage> {
        let mut query = vec![("page", page.to_string()), ("limit", limit.to_string())];
        if let Some(category) = category {
            query.push(("category", category.to_string()));
        }
        self.get("/data/", &query).await
    }

    pub async fn get_record(&self, id: &str) -> Result<Record> {
        self.get(&format!("/data/{}", id), &[]).await
    }

    pub async fn create_record(&self, record: &NewRecord) -> Result<Record> {
        self.post("/data/", record).await
    }

    pub async fn update_record(&self, id: &str, update: &RecordUpdate) -> Result<Record> {
        self.put(&format!("/data/{}", id), update).await
    }

    /// Soft delete on the server side
    pub async fn delete_record(&self, id: &str) -> Result<DeleteResponse> {
        self.delete(&format!("/data/{}", id)).await
    }

    pub async fn validate_record(&self, record: &Map<String, Value>) -> Result<ValidationReport> {
        self.post("/data/validate", record).await
    }

    pub async fn bulk_operation(&self, operation: &BulkOperation) -> Result<BulkReport> {
        let report: BulkReport = self.post("/data/bulk", operation).await?;
        report.ensure_success()
    }

    /// Upload a file for server-side parsing and bulk insert.
    ///
    /// `mapping` renames source columns to record fields (`{"Name": "title"}`).
    pub async fn import_records(
        &self,
        path: &Path,
        format: ImportFormat,
        mapping: Option<&BTreeMap<String, String>>,
        created_by: Option<&str>,
    ) -> Result<BulkReport> {
        let bytes = tokio::fs::read(path).await?;
        let file_name = path
            .file_name()
            .and_then(|name| name.to_str())
            .unwrap_or("import")
            .to_string();
        debug!("Importing {} ({} bytes, {})", file_name, bytes.len(), format);

        let mut form = Form::new()
            .part("file", Part::bytes(bytes).file_name(file_name))
            .text("file_format", format.as_str());
        if let Some(mapping) = mapping {
            form = form.text("mapping", serde_json::to_string(mapping)?);
        }
        if let Some(created_by) = created_by {
            form = form.text("created_by", created_by.to_string());
        }

        let report: BulkReport = self.post_multipart("/data/import", form).await?;
        report.ensure_success()
    }

    pub async fn analytics_summary(&self) -> Result<AnalyticsSummary> {
        self.get("/data/analytics/summary", &[]).await
    }
}
