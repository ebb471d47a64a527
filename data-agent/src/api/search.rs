//! Search endpoints (`/search`)

use super::types::{
    AdvancedSearchRequest, FacetsResponse, SearchRequest, SearchResponse, SuggestionItem,
    SuggestionsResponse,
};
use super::ApiClient;
use crate::error::Result;

impl ApiClient {
    pub async fn search(&self, request: &SearchRequest) -> Result<SearchResponse> {
        self.post("/search/", request).await
    }

    pub async fn advanced_search(&self, request: &AdvancedSearchRequest) -> Result<SearchResponse> {
        self.post("/search/advanced", request).await
    }

    /// Search with server-side query processing and inline insights
    pub async fn smart_search(&self, request: &SearchRequest) -> Result<SearchResponse> {
        self.post("/smart-search", request).await
    }

    /// Backend keyword suggestions for a partial query
    pub async fn keyword_suggestions(&self, partial: &str, limit: usize) -> Result<Vec<SuggestionItem>> {
        let response: SuggestionsResponse = self
            .get(
                "/search/suggestions",
                &[("query", partial.to_string()), ("limit", limit.to_string())],
            )
            .await?;
        Ok(response.suggestions)
    }

    pub async fn facets(&self, query: &str) -> Result<FacetsResponse> {
        self.get("/search/facets", &[("query", query.to_string())]).await
    }
}
