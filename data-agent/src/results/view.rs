use std::fmt::Write;

use super::export::ExportFormat;
use super::selection::Selection;
use crate::api::types::SearchResult;
use crate::search::{SortKey, SortOrder};
use crate::storage::ResultsLayout;

/// Controls offered alongside a non-empty result list
#[derive(Debug, Clone, PartialEq)]
pub struct Controls {
    pub sort_keys: Vec<SortKey>,
    pub sort_key: SortKey,
    pub sort_order: SortOrder,
    /// Empty when export is disabled
    pub export_formats: Vec<ExportFormat>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ResultsView {
    /// Nothing matched; no sort or export controls
    Empty { query: String },
    Populated {
        query: String,
        rows: Vec<SearchResult>,
        total_count: u64,
        controls: Controls,
    },
}

impl ResultsView {
    pub fn is_empty(&self) -> bool {
        matches!(self, ResultsView::Empty { .. })
    }

    pub fn controls(&self) -> Option<&Controls> {
        match self {
            ResultsView::Empty { .. } => None,
            ResultsView::Populated { controls, .. } => Some(controls),
        }
    }

    pub fn rows(&self) -> &[SearchResult] {
        match self {
            ResultsView::Empty { .. } => &[],
            ResultsView::Populated { rows, .. } => rows,
        }
    }
}

fn truncate(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        text.to_string()
    } else {
        let cut: String = text.chars().take(max.saturating_sub(3)).collect();
        format!("{}...", cut)
    }
}

/// Text rendering used by the terminal front end
pub fn render_table(view: &ResultsView, selection: &Selection, layout: ResultsLayout) -> String {
    let mut out = String::new();

    let (query, rows, total_count, controls) = match view {
        ResultsView::Empty { query } => {
            let _ = writeln!(out, "No results found for \"{}\"", query);
            return out;
        }
        ResultsView::Populated {
            query,
            rows,
            total_count,
            controls,
        } => (query, rows, total_count, controls),
    };

    let _ = writeln!(
        out,
        "{} of {} results for \"{}\" (sorted by {} {:?})",
        rows.len(),
        total_count,
        query,
        controls.sort_key,
        controls.sort_order
    );

    match layout {
        ResultsLayout::Table => {
            let _ = writeln!(
                out,
                "    {:<24} {:<40} {:<14} {:>6}  {:<10}  {}",
                "ID", "TITLE", "CATEGORY", "SCORE", "CREATED", "TAGS"
            );
            for row in rows {
                let mark = if selection.is_selected(&row.id) { "[x]" } else { "[ ]" };
                let _ = writeln!(
                    out,
                    "{} {:<24} {:<40} {:<14} {:>6.3}  {:<10}  {}",
                    mark,
                    truncate(&row.id, 24),
                    truncate(&row.title, 40),
                    truncate(row.category.as_deref().unwrap_or("-"), 14),
                    row.score,
                    row.created_at.format("%Y-%m-%d"),
                    row.tags.join(", ")
                );
            }
        }
        ResultsLayout::Compact => {
            for row in rows {
                let mark = if selection.is_selected(&row.id) { "*" } else { " " };
                let _ = writeln!(out, "{} {} ({:.2})", mark, row.title, row.score);
            }
        }
    }

    if !controls.export_formats.is_empty() {
        let formats: Vec<&str> = controls.export_formats.iter().map(|f| f.extension()).collect();
        let _ = writeln!(out, "Export: {}", formats.join(", "));
    }

    out
}
