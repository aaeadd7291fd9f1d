//! System Services, healthcheck and index maintenance
use diesel::connection::AnsiTransactionManager;
use diesel::pg::Pg;
use diesel::Connection;
use failure::Error as FailureError;
use failure::Fail;
use futures::future;
use r2d2::ManageConnection;

use crate::errors::Error;
use crate::repos::ReposFactory;
use crate::services::listings::build_document;
use crate::services::types::ServiceFuture;
use crate::services::Service;

/// Outcome of a full reindex
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct ReindexReport {
    pub indexed: usize,
    pub failed: Vec<i32>,
}

pub trait SystemService {
    /// Returns "ok" while the service is up
    fn healthcheck(&self) -> ServiceFuture<String>;
    /// Ensures the listings index and writes every stored listing into it
    fn reindex_listings(&self) -> ServiceFuture<ReindexReport>;
}

impl<
        T: Connection<Backend = Pg, TransactionManager = AnsiTransactionManager> + 'static,
        M: ManageConnection<Connection = T>,
        F: ReposFactory<T>,
    > SystemService for Service<T, M, F>
{
    fn healthcheck(&self) -> ServiceFuture<String> {
        Box::new(future::ok("ok".to_string()))
    }

    fn reindex_listings(&self) -> ServiceFuture<ReindexReport> {
        let repo_factory = self.static_context.repo_factory.clone();
        let elastic = self.static_context.elastic.clone();
        let max_depth = self.static_context.config.listings.max_tree_depth;

        self.spawn_on_pool(move |conn| {
            elastic
                .ensure_index()
                .map_err(|e| e.context("Listings index could not be ensured").context(Error::SearchUnavailable))?;

            let listings_repo = repo_factory.create_listings_repo_with_sys_acl(&*conn);
            let categories_repo = repo_factory.create_categories_repo(&*conn, None);
            let locations_repo = repo_factory.create_locations_repo(&*conn, None);
            let attributes_repo = repo_factory.create_attributes_repo(&*conn, None);
            let attribute_values_repo = repo_factory.create_attribute_values_repo(&*conn, None);

            let ids = listings_repo
                .list_ids()
                .map_err(|e| e.context("SystemService, reindex_listings error occurred."))?;
            info!("Reindexing {} listings", ids.len());

            let mut report = ReindexReport::default();
            for listing_id in ids {
                let result = listings_repo
                    .find(listing_id)
                    .and_then(|listing| listing.ok_or_else(|| format_err!("Listing {} disappeared while reindexing", listing_id)))
                    .and_then(|listing| {
                        build_document(
                            &listing,
                            &*categories_repo,
                            &*locations_repo,
                            &*attribute_values_repo,
                            &*attributes_repo,
                            max_depth,
                        )
                    })
                    .and_then(|document| elastic.index_listing(&document));

                match result {
                    Ok(()) => report.indexed += 1,
                    Err(e) => {
                        warn!("Reindexing listing {} failed: {}", listing_id, e);
                        report.failed.push(listing_id);
                    }
                }
            }

            info!("Reindexed {} listings, {} failed", report.indexed, report.failed.len());
            Ok::<ReindexReport, FailureError>(report)
        })
    }
}

#[cfg(test)]
pub mod tests {
    use std::sync::Arc;

    use tokio_core::reactor::Core;

    use crate::repos::repo_factory::tests::*;
    use crate::services::*;

    #[test]
    fn test_healthcheck() {
        let mut core = Core::new().unwrap();
        let service = create_service(None);
        assert_eq!(core.run(service.healthcheck()).unwrap(), "ok");
    }

    #[test]
    fn test_reindex_all_listings() {
        let mut core = Core::new().unwrap();
        let elastic = Arc::new(ListingsElasticMock::default());
        let service = create_service_with(None, ReposFactoryMock::default(), elastic.clone());
        let report = core.run(service.reindex_listings()).unwrap();
        assert_eq!(report.indexed, 1);
        assert!(report.failed.is_empty());
        assert_eq!(elastic.indexed()[0].id, MOCK_LISTING_ID);
    }

    #[test]
    fn test_reindex_needs_backend() {
        let mut core = Core::new().unwrap();
        let elastic = Arc::new(ListingsElasticMock::new(ElasticMockMode::Unreachable));
        let service = create_service_with(None, ReposFactoryMock::default(), elastic);
        assert!(core.run(service.reindex_listings()).is_err());
    }
}
