//! Aggregate endpoints feeding the insights charts

use super::types::{CategoryStats, HealthStatus, TimeDistribution};
use super::ApiClient;
use crate::error::Result;

impl ApiClient {
    /// Record count per category
    pub async fn category_stats(&self) -> Result<CategoryStats> {
        self.get("/data/analytics/categories", &[]).await
    }

    /// Record count per creation day (latest 30 days)
    pub async fn time_distribution(&self) -> Result<TimeDistribution> {
        self.get("/data/analytics/time-distribution", &[]).await
    }

    pub async fn health(&self) -> Result<HealthStatus> {
        self.get_root("/health").await
    }
}
