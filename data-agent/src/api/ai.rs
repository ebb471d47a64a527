//! Hosted-model endpoints (`/ai`)

use super::types::{
    AnalysisReport, AnalyzeRequest, ChatReply, ChatRequest, EmbeddingsResponse, HealthStatus,
    InsightsReport, InsightsRequest, ProcessedQuery, SuggestionItem, SuggestionsResponse,
};
use super::ApiClient;
use crate::error::Result;

impl ApiClient {
    pub async fn chat(&self, request: &ChatRequest) -> Result<ChatReply> {
        self.post("/ai/chat", request).await
    }

    /// Structured reading of a natural-language query
    pub async fn process_query(&self, query: &str) -> Result<ProcessedQuery> {
        self.post("/ai/process-query", &serde_json::json!({ "query": query }))
            .await
    }

    pub async fn generate_insights(&self, request: &InsightsRequest) -> Result<InsightsReport> {
        self.post("/ai/generate-insights", request).await
    }

    pub async fn analyze(&self, request: &AnalyzeRequest) -> Result<AnalysisReport> {
        self.post("/ai/analyze", request).await
    }

    pub async fn generate_embeddings(&self, texts: &[String]) -> Result<EmbeddingsResponse> {
        self.post("/ai/generate-embeddings", &serde_json::json!({ "texts": texts }))
            .await
    }

    /// Model-generated query ideas, optionally steered by `context`
    pub async fn ai_suggestions(&self, context: &str) -> Result<Vec<SuggestionItem>> {
        let query = if context.is_empty() {
            Vec::new()
        } else {
            vec![("context", context.to_string())]
        };
        let response: SuggestionsResponse = self.get("/ai/suggestions/queries", &query).await?;
        Ok(response.suggestions)
    }

    pub async fn ai_health(&self) -> Result<HealthStatus> {
        self.get("/ai/health", &[]).await
    }
}
