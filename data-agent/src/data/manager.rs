//! Data manager
//!
//! Paginated record listing plus create/update/delete. Pagination numbers
//! are shown exactly as the server reports them.

use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::path::Path;
use tracing::{debug, info, warn};

use super::cache::RecordCache;
use crate::api::types::{
    AnalyticsSummary, BulkOperation, BulkReport, ImportFormat, NewRecord, Pagination, Record,
    RecordUpdate, ValidationReport,
};
use crate::api::ApiClient;
use crate::error::{AgentError, Result};
use crate::events::{AgentEvent, EventBus};

/// Record form as entered by the user; `content` is raw JSON text
#[derive(Debug, Clone, Default)]
pub struct RecordForm {
    pub title: String,
    pub description: Option<String>,
    pub content: String,
    pub tags: Vec<String>,
    pub category: Option<String>,
}

impl RecordForm {
    /// Validate and convert to the create payload. No request is made.
    pub fn into_new_record(self) -> Result<NewRecord> {
        let title = self.title.trim();
        if title.is_empty() {
            return Err(AgentError::Validation("Title is required".to_string()));
        }

        let content = parse_content(&self.content)?;

        Ok(NewRecord {
            title: title.to_string(),
            description: non_blank(self.description),
            content,
            tags: self
                .tags
                .into_iter()
                .map(|t| t.trim().to_string())
                .filter(|t| !t.is_empty())
                .collect(),
            category: non_blank(self.category),
            metadata: Map::new(),
        })
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Parse record content; it must be a JSON object. Blank text is an empty object.
pub fn parse_content(text: &str) -> Result<Map<String, Value>> {
    if text.trim().is_empty() {
        return Ok(Map::new());
    }
    match serde_json::from_str::<Value>(text) {
        Ok(Value::Object(map)) => Ok(map),
        Ok(_) => Err(AgentError::Validation(
            "Content must be a JSON object".to_string(),
        )),
        Err(e) => Err(AgentError::Validation(format!("Invalid JSON content: {}", e))),
    }
}

/// Observable page state
#[derive(Debug, Clone, Default)]
pub struct DataPageState {
    pub records: Vec<Record>,
    pub pagination: Pagination,
    pub total_count: u64,
    pub loading: bool,
    pub error: Option<String>,
}

impl DataPageState {
    pub fn current_page(&self) -> u32 {
        self.pagination.current_page
    }

    pub fn total_pages(&self) -> u32 {
        self.pagination.total_pages
    }

    pub fn has_next(&self) -> bool {
        self.pagination.has_next
    }

    pub fn has_prev(&self) -> bool {
        self.pagination.has_prev
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeleteOutcome {
    Deleted,
    /// The confirmation was refused; nothing was sent
    Cancelled,
}

pub struct DataManager {
    api: ApiClient,
    bus: EventBus,
    page_size: usize,
    category: Option<String>,
    state: DataPageState,
    cache: RecordCache,
}

impl DataManager {
    pub fn new(api: ApiClient, bus: EventBus, page_size: usize) -> Self {
        Self {
            api,
            bus,
            page_size,
            category: None,
            state: DataPageState::default(),
            cache: RecordCache::new(),
        }
    }

    pub fn state(&self) -> &DataPageState {
        &self.state
    }

    pub fn page_size(&self) -> usize {
        self.page_size
    }

    /// Restrict listings to one category (None = all)
    pub fn set_category(&mut self, category: Option<String>) {
        self.category = category;
    }

    pub async fn load_page(&mut self, page: u32) -> Result<()> {
        let page = page.max(1);
        self.state.loading = true;
        debug!("Loading records page {} (size {})", page, self.page_size);

        match self
            .api
            .list_records(page, self.page_size, self.category.as_deref())
            .await
        {
            Ok(listing) => {
                self.cache.extend(&listing.data);
                self.state = DataPageState {
                    records: listing.data,
                    pagination: listing.pagination,
                    total_count: listing.total_count,
                    loading: false,
                    error: None,
                };
                self.bus.publish(AgentEvent::DataPageLoaded {
                    page: self.state.current_page(),
                    total_pages: self.state.total_pages(),
                });
                Ok(())
            }
            Err(e) => Err(self.fail(e)),
        }
    }

    pub async fn next_page(&mut self) -> Result<bool> {
        match self.state.pagination.next_page.filter(|_| self.state.has_next()) {
            Some(next) => self.load_page(next).await.map(|_| true),
            None => Ok(false),
        }
    }

    pub async fn prev_page(&mut self) -> Result<bool> {
        match self.state.pagination.prev_page.filter(|_| self.state.has_prev()) {
            Some(prev) => self.load_page(prev).await.map(|_| true),
            None => Ok(false),
        }
    }

    /// Reload whatever page is showing
    pub async fn refresh(&mut self) -> Result<()> {
        let page = self.state.current_page().max(1);
        self.load_page(page).await
    }

    /// Validate, create, then show page 1 where the new record lands.
    ///
    /// A failed reload does not fail the create; it is left in `state.error`.
    pub async fn create(&mut self, form: RecordForm) -> Result<Record> {
        let payload = match form.into_new_record() {
            Ok(payload) => payload,
            Err(e) => return Err(self.fail(e)),
        };

        let record = match self.api.create_record(&payload).await {
            Ok(record) => record,
            Err(e) => return Err(self.fail(e)),
        };

        info!("Created record {} ('{}')", record.id, record.title);
        self.cache.insert(record.clone());
        self.bus.publish(AgentEvent::RecordCreated {
            id: record.id.clone(),
        });

        self.reload_first_page("create").await;
        Ok(record)
    }

    /// Upload a file for import, then show page 1. The format is taken from
    /// the file extension unless given.
    pub async fn import(
        &mut self,
        path: &Path,
        format: Option<ImportFormat>,
        mapping: Option<&BTreeMap<String, String>>,
    ) -> Result<BulkReport> {
        let Some(format) = format.or_else(|| ImportFormat::from_path(path)) else {
            return Err(self.fail(AgentError::Validation(format!(
                "Cannot tell the import format of {}",
                path.display()
            ))));
        };

        let report = match self.api.import_records(path, format, mapping, None).await {
            Ok(report) => report,
            Err(e) => return Err(self.fail(e)),
        };

        info!(
            "📥 Imported {} record(s) from {} ({} rejected)",
            report.processed_count,
            path.display(),
            report.error_count
        );
        self.bus.publish(AgentEvent::RecordsImported {
            processed: report.processed_count,
            failed: report.error_count,
        });

        self.reload_first_page("import").await;
        Ok(report)
    }

    /// Server-side validation of a raw record object. Nothing is stored.
    pub async fn validate(&self, record: &Map<String, Value>) -> Result<ValidationReport> {
        self.api.validate_record(record).await
    }

    /// Run a bulk insert/update/delete, then reload the current page
    pub async fn bulk(&mut self, operation: BulkOperation) -> Result<BulkReport> {
        let report = match self.api.bulk_operation(&operation).await {
            Ok(report) => report,
            Err(e) => return Err(self.fail(e)),
        };

        info!(
            "Bulk {:?}: {} processed, {} failed",
            operation.operation, report.processed_count, report.error_count
        );
        self.cache.clear();
        if let Err(e) = self.refresh().await {
            warn!("Bulk operation applied but the page did not reload: {}", e);
        }
        Ok(report)
    }

    /// Dataset-wide counters
    pub async fn stats(&self) -> Result<AnalyticsSummary> {
        self.api.analytics_summary().await
    }

    async fn reload_first_page(&mut self, after: &str) {
        if let Err(e) = self.load_page(1).await {
            warn!("Page 1 did not reload after {}: {}", after, e);
        }
    }

    /// Fetch a record, preferring the cached copy
    pub async fn get(&mut self, id: &str) -> Result<Record> {
        if let Some(record) = self.cache.get(id) {
            debug!("Record {} served from cache", id);
            return Ok(record.clone());
        }
        let record = self.api.get_record(id).await.map_err(|e| match e {
            AgentError::Server { status: 404, .. } => AgentError::NotFound(format!("Record {}", id)),
            other => other,
        })?;
        self.cache.insert(record.clone());
        Ok(record)
    }

    pub async fn update(&mut self, id: &str, patch: RecordUpdate) -> Result<Record> {
        if let Some(title) = &patch.title {
            if title.trim().is_empty() {
                return Err(self.fail(AgentError::Validation("Title is required".to_string())));
            }
        }

        self.cache.invalidate(id);
        let record = match self.api.update_record(id, &patch).await {
            Ok(record) => record,
            Err(e) => return Err(self.fail(e)),
        };

        info!("Updated record {}", id);
        if let Some(slot) = self.state.records.iter_mut().find(|r| r.id == id) {
            *slot = record.clone();
        }
        self.bus.publish(AgentEvent::RecordUpdated { id: id.to_string() });
        Ok(record)
    }

    /// Delete after `confirm` agrees; a refusal sends nothing.
    pub async fn delete<F>(&mut self, id: &str, confirm: F) -> Result<DeleteOutcome>
    where
        F: FnOnce(&str) -> bool,
    {
        if !confirm(id) {
            debug!("Delete of {} cancelled", id);
            return Ok(DeleteOutcome::Cancelled);
        }

        if let Err(e) = self.api.delete_record(id).await {
            return Err(self.fail(e));
        }

        info!("🗑️  Deleted record {}", id);
        self.cache.invalidate(id);
        self.bus.publish(AgentEvent::RecordDeleted { id: id.to_string() });

        self.refresh().await?;
        Ok(DeleteOutcome::Deleted)
    }

    fn fail(&mut self, error: AgentError) -> AgentError {
        let message = error.user_message();
        warn!("Data operation failed: {}", error);
        self.state.loading = false;
        self.state.error = Some(message.clone());
        self.bus.publish(AgentEvent::DataFailed { message });
        error
    }
}
