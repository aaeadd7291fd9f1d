//! Search Services, runs listing searches against the index.
//!
//! Search is best effort: an unreachable backend or a missing index
//! yields an empty result with a `note`, never an error.
use diesel::connection::AnsiTransactionManager;
use diesel::pg::Pg;
use diesel::Connection;
use r2d2::ManageConnection;

use crate::elastic::facets::reshape;
use crate::elastic::query::compile;
use crate::elastic::ListingsElastic;
use crate::models::{SearchHit, SearchListings, SearchResults};
use crate::repos::ReposFactory;
use crate::services::types::ServiceFuture;
use crate::services::Service;

pub const SEARCH_UNAVAILABLE_NOTE: &str = "Search backend unavailable";

pub trait SearchService {
    /// Searches listings, returning hits, total count and facets
    fn search_listings(&self, search: SearchListings) -> ServiceFuture<SearchResults>;
}

impl<
        T: Connection<Backend = Pg, TransactionManager = AnsiTransactionManager> + 'static,
        M: ManageConnection<Connection = T>,
        F: ReposFactory<T>,
    > SearchService for Service<T, M, F>
{
    fn search_listings(&self, search: SearchListings) -> ServiceFuture<SearchResults> {
        let elastic = self.static_context.elastic.clone();
        self.spawn_blocking(move || Ok(run_search(&*elastic, search)))
    }
}

pub fn run_search(elastic: &dyn ListingsElastic, search: SearchListings) -> SearchResults {
    match elastic.ping() {
        Ok(true) => {}
        Ok(false) => {
            warn!("Search backend did not answer ping");
            return SearchResults::unavailable(format!("{} (ping failed)", SEARCH_UNAVAILABLE_NOTE));
        }
        Err(e) => {
            warn!("Search backend ping error: {}", e);
            return SearchResults::unavailable(SEARCH_UNAVAILABLE_NOTE);
        }
    }

    if let Err(e) = elastic.ensure_index() {
        warn!("Ensuring listings index failed, searching anyway: {}", e);
    }

    let SearchListings { filter, sort, page } = search;
    let body = compile(&filter, sort, page).into_body();

    let response = match elastic.search(body) {
        Ok(response) => response,
        Err(e) => {
            warn!("Listings search failed: {}", e);
            return SearchResults::unavailable(format!("{} or index missing: {}", SEARCH_UNAVAILABLE_NOTE, e));
        }
    };

    let total = response.total();
    let facets = reshape(&response.aggregations);
    let results = response
        .hits
        .map(|hits| {
            hits.hits
                .into_iter()
                .map(|hit| SearchHit {
                    id: hit.id,
                    score: hit.score,
                    source: hit.source,
                })
                .collect()
        })
        .unwrap_or_default();

    SearchResults {
        results,
        total,
        page: Some(page.page),
        per_page: Some(page.per_page),
        facets: Some(facets),
        note: None,
    }
}

#[cfg(test)]
pub mod tests {
    use std::sync::Arc;

    use tokio_core::reactor::Core;

    use crate::models::*;
    use crate::repos::repo_factory::tests::*;
    use crate::services::*;

    fn search() -> SearchListings {
        SearchListings {
            filter: FilterRequest::from_params(&[("attrs.color".to_string(), "red".to_string())]),
            sort: SortOrder::Newest,
            page: SearchPage::new(Some(2), Some(5), 20, 50),
        }
    }

    #[test]
    fn test_search_reshapes_response() {
        let mut core = Core::new().unwrap();
        let elastic = Arc::new(ListingsElasticMock::default());
        let service = create_service_with(None, ReposFactoryMock::default(), elastic.clone());
        let result = core.run(service.search_listings(search())).unwrap();

        assert_eq!(result.total, 1);
        assert_eq!(result.results[0].id, "1");
        assert_eq!(result.page, Some(2));
        assert_eq!(result.per_page, Some(5));
        assert!(result.note.is_none());
        let facets = result.facets.unwrap();
        assert_eq!(facets.attributes.unwrap()["color"][0].key, "red");

        let body = elastic.last_search().unwrap();
        assert_eq!(body["from"], json!(5));
        assert_eq!(body["sort"], json!([{"refreshed_at": {"order": "desc"}}]));
    }

    #[test]
    fn test_search_ping_failed() {
        let mut core = Core::new().unwrap();
        let elastic = Arc::new(ListingsElasticMock::new(ElasticMockMode::PingFalse));
        let service = create_service_with(None, ReposFactoryMock::default(), elastic);
        let result = core.run(service.search_listings(search())).unwrap();

        assert!(result.results.is_empty());
        assert_eq!(result.total, 0);
        assert_eq!(result.note, Some("Search backend unavailable (ping failed)".to_string()));
    }

    #[test]
    fn test_search_unreachable() {
        let mut core = Core::new().unwrap();
        let elastic = Arc::new(ListingsElasticMock::new(ElasticMockMode::Unreachable));
        let service = create_service_with(None, ReposFactoryMock::default(), elastic);
        let result = core.run(service.search_listings(search())).unwrap();
        assert_eq!(result.note, Some("Search backend unavailable".to_string()));
        assert!(result.facets.is_none());
    }

    #[test]
    fn test_search_index_missing() {
        let mut core = Core::new().unwrap();
        let elastic = Arc::new(ListingsElasticMock::new(ElasticMockMode::SearchFails));
        let service = create_service_with(None, ReposFactoryMock::default(), elastic);
        let result = core.run(service.search_listings(search())).unwrap();
        assert!(result.results.is_empty());
        assert!(result.note.unwrap().starts_with("Search backend unavailable or index missing"));
    }
}
