//! Result rendering
//!
//! Sorting, selection, the view model handed to front ends and export.

pub mod export;
pub mod selection;
pub mod sort;
pub mod view;

pub use export::{csv_field, to_csv, to_json, ExportFormat};
pub use selection::Selection;
pub use sort::sort_results;
pub use view::{render_table, Controls, ResultsView};

use chrono::Utc;

use crate::api::types::SearchResult;
use crate::error::{AgentError, Result};
use crate::search::{SortKey, SortOrder};

/// Sort keys offered by the results view
pub fn sortable_keys() -> Vec<SortKey> {
    vec![SortKey::Relevance, SortKey::Date, SortKey::Title, SortKey::Category]
}

/// Sort, selection and export settings for the current result list
#[derive(Debug, Clone)]
pub struct ResultsRenderer {
    sort_key: SortKey,
    sort_order: SortOrder,
    selection: Selection,
    export_enabled: bool,
}

impl ResultsRenderer {
    pub fn new(export_enabled: bool) -> Self {
        Self {
            sort_key: SortKey::default(),
            sort_order: SortOrder::default(),
            selection: Selection::new(),
            export_enabled,
        }
    }

    pub fn set_sort(&mut self, key: SortKey, order: SortOrder) {
        self.sort_key = key;
        self.sort_order = order;
    }

    pub fn sort_key(&self) -> &SortKey {
        &self.sort_key
    }

    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    pub fn selection_mut(&mut self) -> &mut Selection {
        &mut self.selection
    }

    /// Results in display order
    pub fn sorted(&self, results: &[SearchResult]) -> Vec<SearchResult> {
        sort_results(results, &self.sort_key, self.sort_order)
    }

    pub fn view(&self, query: &str, results: &[SearchResult], total_count: u64) -> ResultsView {
        if results.is_empty() {
            return ResultsView::Empty {
                query: query.to_string(),
            };
        }

        let export_formats = if self.export_enabled {
            vec![ExportFormat::Csv, ExportFormat::Json]
        } else {
            Vec::new()
        };

        ResultsView::Populated {
            query: query.to_string(),
            rows: self.sorted(results),
            total_count,
            controls: Controls {
                sort_keys: sortable_keys(),
                sort_key: self.sort_key.clone(),
                sort_order: self.sort_order,
                export_formats,
            },
        }
    }

    /// Export the selection in display order, or everything when nothing is selected
    pub fn export(&self, format: ExportFormat, query: &str, results: &[SearchResult]) -> Result<String> {
        if !self.export_enabled {
            return Err(AgentError::Validation("Export is disabled".to_string()));
        }

        let sorted = self.sorted(results);
        let rows: Vec<&SearchResult> = if self.selection.is_empty() {
            sorted.iter().collect()
        } else {
            self.selection.pick(&sorted)
        };

        match format {
            ExportFormat::Csv => Ok(to_csv(rows)),
            ExportFormat::Json => to_json(query, rows, Utc::now()),
        }
    }
}
