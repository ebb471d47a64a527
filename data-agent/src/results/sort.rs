use std::cmp::Ordering;

use crate::api::types::SearchResult;
use crate::search::{SortKey, SortOrder};

/// Stable sort into a new list; `results` is left untouched.
///
/// Equal keys keep their incoming order in both directions, so sorting an
/// already sorted list is a no-op. Unknown keys return the input order.
pub fn sort_results(results: &[SearchResult], key: &SortKey, order: SortOrder) -> Vec<SearchResult> {
    let mut sorted = results.to_vec();

    let compare: fn(&SearchResult, &SearchResult) -> Ordering = match key {
        SortKey::Relevance => |a, b| a.score.total_cmp(&b.score),
        SortKey::Date => |a, b| a.created_at.cmp(&b.created_at),
        SortKey::Title => |a, b| a.title.to_lowercase().cmp(&b.title.to_lowercase()),
        SortKey::Category => |a, b| category_key(a).cmp(&category_key(b)),
        SortKey::Other(_) => return sorted,
    };

    match order {
        SortOrder::Asc => sorted.sort_by(compare),
        SortOrder::Desc => sorted.sort_by(|a, b| compare(b, a)),
    }
    sorted
}

fn category_key(result: &SearchResult) -> String {
    result.category.as_deref().unwrap_or("").to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};
    use serde_json::Map;
    use std::collections::BTreeMap;

    fn result(id: &str, title: &str, score: f64, category: Option<&str>, age_days: i64) -> SearchResult {
        SearchResult {
            id: id.to_string(),
            title: title.to_string(),
            description: None,
            content: Map::new(),
            tags: vec![],
            category: category.map(str::to_string),
            score,
            highlights: BTreeMap::new(),
            metadata: Map::new(),
            created_at: Utc::now() - Duration::days(age_days),
        }
    }

    fn sample() -> Vec<SearchResult> {
        vec![
            result("1", "beta", 0.5, Some("tech"), 3),
            result("2", "Alpha", 0.9, None, 1),
            result("3", "gamma", 0.5, Some("Finance"), 2),
            result("4", "delta", 0.7, Some("tech"), 5),
        ]
    }

    fn ids(results: &[SearchResult]) -> Vec<&str> {
        results.iter().map(|r| r.id.as_str()).collect()
    }

    #[test]
    fn test_relevance_desc_is_stable() {
        let sorted = sort_results(&sample(), &SortKey::Relevance, SortOrder::Desc);
        assert_eq!(ids(&sorted), vec!["2", "4", "1", "3"]);
    }

    #[test]
    fn test_title_ignores_case() {
        let sorted = sort_results(&sample(), &SortKey::Title, SortOrder::Asc);
        assert_eq!(ids(&sorted), vec!["2", "1", "4", "3"]);
    }

    #[test]
    fn test_date_and_category() {
        let newest_first = sort_results(&sample(), &SortKey::Date, SortOrder::Desc);
        assert_eq!(ids(&newest_first), vec!["2", "3", "1", "4"]);

        let by_category = sort_results(&sample(), &SortKey::Category, SortOrder::Asc);
        assert_eq!(ids(&by_category), vec!["2", "3", "1", "4"]);
    }

    #[test]
    fn test_sorting_is_idempotent() {
        for key in [SortKey::Relevance, SortKey::Date, SortKey::Title, SortKey::Category] {
            for order in [SortOrder::Asc, SortOrder::Desc] {
                let once = sort_results(&sample(), &key, order);
                let twice = sort_results(&once, &key, order);
                assert_eq!(once, twice, "{} {:?}", key, order);
            }
        }
    }

    #[test]
    fn test_unknown_key_keeps_order() {
        let input = sample();
        let sorted = sort_results(&input, &SortKey::Other("author".to_string()), SortOrder::Asc);
        assert_eq!(ids(&sorted), vec!["1", "2", "3", "4"]);
    }
}
