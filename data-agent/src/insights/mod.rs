//! Insights dashboard
//!
//! Model-generated summary, category and timeline charts and sentiment,
//! refreshed periodically or on demand.

pub mod dashboard;
pub mod types;

pub use dashboard::{DashboardState, InsightsDashboard};
pub use types::{InsightsBody, InsightsScope, InsightsSnapshot, RefreshOutcome, RefreshTrigger, Sentiment};
