//! Listings Services, presents create, update, read and refresh of listings.
//!
//! A listing and its attribute values are always written in one
//! transaction. The index document is written after the commit and
//! indexing failures never fail the request.
use chrono::Utc;
use diesel::connection::AnsiTransactionManager;
use diesel::pg::Pg;
use diesel::Connection;
use failure::Error as FailureError;
use r2d2::ManageConnection;
use validator::{Validate, ValidationError, ValidationErrors};

use crate::elastic::ListingsElastic;
use crate::errors::Error;
use crate::models::{
    expand_values, group_rows, GroupedAttributeValue, Listing, ListingDocument, ListingWithAttributes, NewListingPayload, RefreshedListing,
    UpdateListingPayload,
};
use crate::repos::{AttributeValuesRepo, AttributesRepo, CategoriesRepo, LocationsRepo, RepoResult, ReposFactory};
use crate::services::attribute_validation::validate_attributes;
use crate::services::attribute_values::{find_with_attributes, read_grouped, store_error, validate_and_replace};
use crate::services::categories::{category_path, lineage_schema, location_path};
use crate::services::types::ServiceFuture;
use crate::services::Service;

pub trait ListingsService {
    /// Creates a listing of the current user together with its attribute values
    fn create_listing(&self, payload: NewListingPayload) -> ServiceFuture<ListingWithAttributes>;
    /// Updates a listing of the current user, replacing its attribute values when they are present
    fn update_listing(&self, listing_id: i32, payload: UpdateListingPayload) -> ServiceFuture<ListingWithAttributes>;
    /// Returns a listing with its attribute values
    fn get_listing(&self, listing_id: i32) -> ServiceFuture<ListingWithAttributes>;
    /// Moves a listing of the current user to the top of newest first results
    fn refresh_listing(&self, listing_id: i32) -> ServiceFuture<RefreshedListing>;
    /// Returns listings of the current user, newest first
    fn my_listings(&self) -> ServiceFuture<Vec<Listing>>;
}

impl<
        T: Connection<Backend = Pg, TransactionManager = AnsiTransactionManager> + 'static,
        M: ManageConnection<Connection = T>,
        F: ReposFactory<T>,
    > ListingsService for Service<T, M, F>
{
    fn create_listing(&self, payload: NewListingPayload) -> ServiceFuture<ListingWithAttributes> {
        let user_id = self.dynamic_context.user_id;
        let repo_factory = self.static_context.repo_factory.clone();
        let elastic = self.static_context.elastic.clone();
        let max_depth = self.static_context.config.listings.max_tree_depth;

        self.spawn_on_pool(move |conn| {
            let user_id = user_id.ok_or_else(|| format_err!("Creating listing requires a user").context(Error::Unauthorized))?;
            payload
                .validate()
                .map_err(|e| format_err!("Validation of NewListingPayload failed").context(Error::Validate(e)))?;

            let listings_repo = repo_factory.create_listings_repo(&*conn, Some(user_id));
            let categories_repo = repo_factory.create_categories_repo(&*conn, Some(user_id));
            let locations_repo = repo_factory.create_locations_repo(&*conn, Some(user_id));
            let attributes_repo = repo_factory.create_attributes_repo(&*conn, Some(user_id));
            let attribute_values_repo = repo_factory.create_attribute_values_repo(&*conn, Some(user_id));

            let (new_listing, attributes) = payload.into_new_listing(user_id, Utc::now().naive_utc());
            let result = conn
                .transaction::<ListingWithAttributes, FailureError, _>(|| {
                    ensure_category(&*categories_repo, new_listing.category_id)?;
                    let schema = lineage_schema(&*categories_repo, &*attributes_repo, new_listing.category_id, max_depth)?;
                    let validated = validate_attributes(&schema, attributes).map_err(Error::InvalidAttributes)?;

                    let listing = listings_repo.create(new_listing)?;
                    let rows = attribute_values_repo.create_many(expand_values(listing.id, validated))?;
                    let attributes = group_rows(&rows, schema.definitions())
                        .into_iter()
                        .map(|(_, value)| value)
                        .collect::<Vec<GroupedAttributeValue>>();
                    Ok(ListingWithAttributes { listing, attributes })
                })
                .map_err(|e: FailureError| e.context("ListingsService, create_listing error occurred."))?;

            index_best_effort(&*elastic, &result.listing, || {
                build_document(
                    &result.listing,
                    &*categories_repo,
                    &*locations_repo,
                    &*attribute_values_repo,
                    &*attributes_repo,
                    max_depth,
                )
            });
            Ok(result)
        })
    }

    fn update_listing(&self, listing_id: i32, payload: UpdateListingPayload) -> ServiceFuture<ListingWithAttributes> {
        let user_id = self.dynamic_context.user_id;
        let repo_factory = self.static_context.repo_factory.clone();
        let elastic = self.static_context.elastic.clone();
        let max_depth = self.static_context.config.listings.max_tree_depth;

        self.spawn_on_pool(move |conn| {
            let user_id = user_id.ok_or_else(|| format_err!("Updating listing requires a user").context(Error::Unauthorized))?;
            payload
                .validate()
                .map_err(|e| format_err!("Validation of UpdateListingPayload failed").context(Error::Validate(e)))?;

            let listings_repo = repo_factory.create_listings_repo(&*conn, Some(user_id));
            let categories_repo = repo_factory.create_categories_repo(&*conn, Some(user_id));
            let locations_repo = repo_factory.create_locations_repo(&*conn, Some(user_id));
            let attributes_repo = repo_factory.create_attributes_repo(&*conn, Some(user_id));
            let attribute_values_repo = repo_factory.create_attribute_values_repo(&*conn, Some(user_id));

            let (update, attributes) = payload.split();
            let result = conn
                .transaction::<ListingWithAttributes, FailureError, _>(|| {
                    if let Some(category_id) = update.category_id {
                        ensure_category(&*categories_repo, category_id)?;
                    }
                    let listing = listings_repo.update(listing_id, update)?;

                    // attribute lineage follows the possibly new category
                    if let Some(attributes) = attributes {
                        let schema = lineage_schema(&*categories_repo, &*attributes_repo, listing.category_id, max_depth)?;
                        validate_and_replace(&*attribute_values_repo, &schema, listing.id, attributes)?;
                    }

                    let attributes = read_grouped(&*attribute_values_repo, &*attributes_repo, listing.id)?;
                    Ok(ListingWithAttributes { listing, attributes })
                })
                .map_err(|e| store_error(e, listing_id))?;

            index_best_effort(&*elastic, &result.listing, || {
                build_document(
                    &result.listing,
                    &*categories_repo,
                    &*locations_repo,
                    &*attribute_values_repo,
                    &*attributes_repo,
                    max_depth,
                )
            });
            Ok(result)
        })
    }

    fn get_listing(&self, listing_id: i32) -> ServiceFuture<ListingWithAttributes> {
        let user_id = self.dynamic_context.user_id;
        let repo_factory = self.static_context.repo_factory.clone();

        self.spawn_on_pool(move |conn| {
            let listings_repo = repo_factory.create_listings_repo(&*conn, user_id);
            let attributes_repo = repo_factory.create_attributes_repo(&*conn, user_id);
            let attribute_values_repo = repo_factory.create_attribute_values_repo(&*conn, user_id);
            find_with_attributes(&*listings_repo, &*attribute_values_repo, &*attributes_repo, listing_id)
                .and_then(|listing| {
                    listing.ok_or_else(|| format_err!("Listing {} not found", listing_id).context(Error::NotFound).into())
                })
                .map_err(|e: FailureError| e.context("ListingsService, get_listing error occurred.").into())
        })
    }

    fn refresh_listing(&self, listing_id: i32) -> ServiceFuture<RefreshedListing> {
        let user_id = self.dynamic_context.user_id;
        let repo_factory = self.static_context.repo_factory.clone();
        let elastic = self.static_context.elastic.clone();
        let max_depth = self.static_context.config.listings.max_tree_depth;

        self.spawn_on_pool(move |conn| {
            let user_id = user_id.ok_or_else(|| format_err!("Refreshing listing requires a user").context(Error::Unauthorized))?;
            let listings_repo = repo_factory.create_listings_repo(&*conn, Some(user_id));
            let listing = listings_repo
                .refresh(listing_id, Utc::now().naive_utc())
                .map_err(|e| e.context("ListingsService, refresh_listing error occurred."))?;

            let categories_repo = repo_factory.create_categories_repo(&*conn, Some(user_id));
            let locations_repo = repo_factory.create_locations_repo(&*conn, Some(user_id));
            let attributes_repo = repo_factory.create_attributes_repo(&*conn, Some(user_id));
            let attribute_values_repo = repo_factory.create_attribute_values_repo(&*conn, Some(user_id));
            index_best_effort(&*elastic, &listing, || {
                build_document(
                    &listing,
                    &*categories_repo,
                    &*locations_repo,
                    &*attribute_values_repo,
                    &*attributes_repo,
                    max_depth,
                )
            });
            Ok(RefreshedListing::new(listing.refreshed_at))
        })
    }

    fn my_listings(&self) -> ServiceFuture<Vec<Listing>> {
        let user_id = self.dynamic_context.user_id;
        let repo_factory = self.static_context.repo_factory.clone();

        self.spawn_on_pool(move |conn| {
            let user_id = user_id.ok_or_else(|| format_err!("Listing own listings requires a user").context(Error::Unauthorized))?;
            let listings_repo = repo_factory.create_listings_repo(&*conn, Some(user_id));
            listings_repo
                .list_for_user(user_id)
                .map_err(|e| e.context("ListingsService, my_listings error occurred.").into())
        })
    }
}

/// Unknown categories are a payload problem, not a missing resource
fn ensure_category(categories_repo: &dyn CategoriesRepo, category_id: i32) -> RepoResult<()> {
    if categories_repo.find(category_id)?.is_some() {
        return Ok(());
    }
    let mut errors = ValidationErrors::new();
    let mut error = ValidationError::new("not_found");
    error.message = Some(format!("Category {} does not exist", category_id).into());
    error.add_param("value".into(), &category_id);
    errors.add("category_id", error);
    Err(format_err!("Category {} not found", category_id).context(Error::Validate(errors)).into())
}

/// Index document of the listing as currently stored
pub fn build_document(
    listing: &Listing,
    categories_repo: &dyn CategoriesRepo,
    locations_repo: &dyn LocationsRepo,
    attribute_values_repo: &dyn AttributeValuesRepo,
    attributes_repo: &dyn AttributesRepo,
    max_depth: usize,
) -> RepoResult<ListingDocument> {
    let category_path = category_path(categories_repo, listing.category_id, max_depth)?;
    let location_path = location_path(locations_repo, listing.location_id, max_depth)?;
    let rows = attribute_values_repo.find_by_listing(listing.id)?;
    let mut attribute_ids = rows.iter().map(|row| row.attribute_id).collect::<Vec<_>>();
    attribute_ids.sort();
    attribute_ids.dedup();
    let definitions = if attribute_ids.is_empty() {
        vec![]
    } else {
        attributes_repo.find_many(attribute_ids)?
    };
    Ok(ListingDocument::new(listing, category_path, location_path, &rows, &definitions))
}

/// Writes the document to the index, failures are only logged
pub fn index_best_effort<B>(elastic: &dyn ListingsElastic, listing: &Listing, build: B)
where
    B: FnOnce() -> RepoResult<ListingDocument>,
{
    let result = build().and_then(|document| elastic.index_listing(&document));
    if let Err(e) = result {
        warn!("Indexing listing {} failed, search results may be stale: {}", listing.id, e);
    }
}

#[cfg(test)]
pub mod tests {
    use std::sync::Arc;

    use tokio_core::reactor::Core;

    use crate::errors::{find_error, Codeable, Error};
    use crate::models::*;
    use crate::repos::repo_factory::tests::*;
    use crate::services::*;

    use hyper::StatusCode;

    fn new_listing(category_id: i32, attributes: serde_json::Value) -> NewListingPayload {
        serde_json::from_value(json!({
            "category_id": category_id,
            "location_id": 2,
            "title": "Pixel 8",
            "description": "Barely used",
            "price_amount": 450.0,
            "attributes": attributes,
        }))
        .unwrap()
    }

    fn status(e: &failure::Error) -> Option<StatusCode> {
        find_error(e).map(Codeable::code)
    }

    #[test]
    fn test_create_listing_with_inherited_attribute() {
        let mut core = Core::new().unwrap();
        let elastic = Arc::new(ListingsElasticMock::default());
        let service = create_service_with(Some(MOCK_USER_ID), ReposFactoryMock::default(), elastic.clone());

        let payload = new_listing(3, json!([{"attribute": 1, "value": 32}, {"attribute": 2, "value": "black"}]));
        let created = core.run(service.create_listing(payload)).unwrap();
        assert_eq!(created.listing.user_id, MOCK_USER_ID);
        assert_eq!(created.listing.status, "active");
        assert_eq!(created.listing.created_at, created.listing.refreshed_at);
        assert_eq!(created.attributes[0].key, "storage_gb");
        assert_eq!(created.attributes[0].value, TypedValue::Number(32.0));

        let fetched = core.run(service.get_listing(created.listing.id)).unwrap();
        assert_eq!(fetched.attributes, created.attributes);

        let document = elastic.indexed().pop().unwrap();
        assert_eq!(document.id, created.listing.id);
        assert_eq!(document.category_path, vec!["root", "electronics", "phones"]);
        assert_eq!(document.location_path, vec!["de", "berlin"]);
        assert_eq!(document.attrs.len(), 2);
    }

    #[test]
    fn test_create_listing_range_violation() {
        let mut core = Core::new().unwrap();
        let service = create_service(Some(MOCK_USER_ID));
        let payload = new_listing(3, json!([{"attribute": 1, "value": 8}]));
        let e = core.run(service.create_listing(payload)).unwrap_err();
        match find_error(&e) {
            Some(Error::InvalidAttributes(errors)) => assert_eq!(errors.errors()[0].code(), "range_violation"),
            other => panic!("unexpected error {:?}", other),
        }
    }

    #[test]
    fn test_create_listing_missing_required() {
        let mut core = Core::new().unwrap();
        let service = create_service(Some(MOCK_USER_ID));
        let payload = new_listing(3, json!([]));
        let e = core.run(service.create_listing(payload)).unwrap_err();
        assert_eq!(status(&e), Some(StatusCode::BadRequest));
    }

    #[test]
    fn test_create_listing_attribute_of_other_branch() {
        let mut core = Core::new().unwrap();
        let service = create_service(Some(MOCK_USER_ID));
        let payload = new_listing(3, json!([{"attribute": 1, "value": 32}, {"attribute": 6, "value": "oak"}]));
        let e = core.run(service.create_listing(payload)).unwrap_err();
        assert_eq!(status(&e), Some(StatusCode::BadRequest));
    }

    #[test]
    fn test_create_listing_requires_user() {
        let mut core = Core::new().unwrap();
        let service = create_service(None);
        let e = core.run(service.create_listing(new_listing(4, json!([{"attribute": 6, "value": "oak"}])))).unwrap_err();
        assert_eq!(status(&e), Some(StatusCode::Unauthorized));
    }

    #[test]
    fn test_create_listing_unknown_category() {
        let mut core = Core::new().unwrap();
        let service = create_service(Some(MOCK_USER_ID));
        let e = core.run(service.create_listing(new_listing(99, json!([])))).unwrap_err();
        assert_eq!(status(&e), Some(StatusCode::BadRequest));
    }

    #[test]
    fn test_indexing_failure_does_not_fail_create() {
        let mut core = Core::new().unwrap();
        let elastic = Arc::new(ListingsElasticMock::new(ElasticMockMode::Unreachable));
        let service = create_service_with(Some(MOCK_USER_ID), ReposFactoryMock::default(), elastic);
        let payload = new_listing(4, json!([{"attribute": 6, "value": "oak"}]));
        assert!(core.run(service.create_listing(payload)).is_ok());
    }

    #[test]
    fn test_update_replaces_attributes() {
        let mut core = Core::new().unwrap();
        let service = create_service(Some(MOCK_USER_ID));
        let update = UpdateListingPayload {
            title: Some("Pixel 8 Pro".to_string()),
            attributes: Some(vec![
                AttributeValueInput {
                    attribute: 1,
                    value: json!(256),
                },
                AttributeValueInput {
                    attribute: 3,
                    value: json!(["nfc"]),
                },
            ]),
            ..UpdateListingPayload::default()
        };
        let updated = core.run(service.update_listing(MOCK_LISTING_ID, update)).unwrap();
        assert_eq!(updated.listing.title, "Pixel 8 Pro");
        assert_eq!(updated.attributes.len(), 2);
        assert_eq!(updated.attributes[1].value, TypedValue::MultiOptionKey(vec!["nfc".to_string()]));
    }

    #[test]
    fn test_failed_attribute_write_rolls_back_listing_update() {
        let mut core = Core::new().unwrap();
        let repo_factory = ReposFactoryMock::default();
        let service = create_service_with(Some(MOCK_USER_ID), repo_factory.clone(), Arc::new(ListingsElasticMock::default()));
        let before = core.run(service.get_listing(MOCK_LISTING_ID)).unwrap();

        repo_factory.state.lock().unwrap().fail_value_inserts = true;
        let update = UpdateListingPayload {
            title: Some("Pixel 8 Pro".to_string()),
            attributes: Some(vec![AttributeValueInput {
                attribute: 1,
                value: json!(256),
            }]),
            ..UpdateListingPayload::default()
        };
        let e = core.run(service.update_listing(MOCK_LISTING_ID, update)).unwrap_err();
        assert_eq!(status(&e), Some(StatusCode::InternalServerError));

        let after = core.run(service.get_listing(MOCK_LISTING_ID)).unwrap();
        assert_eq!(after.listing.title, before.listing.title);
        assert_eq!(after.attributes, before.attributes);
    }

    #[test]
    fn test_update_without_attributes_keeps_them() {
        let mut core = Core::new().unwrap();
        let service = create_service(Some(MOCK_USER_ID));
        core.run(service.replace_attribute_values(
            MOCK_LISTING_ID,
            vec![AttributeValueInput {
                attribute: 1,
                value: json!(64),
            }],
        ))
        .unwrap();

        let update = UpdateListingPayload {
            price_amount: Some(300.0),
            ..UpdateListingPayload::default()
        };
        let updated = core.run(service.update_listing(MOCK_LISTING_ID, update)).unwrap();
        assert_eq!(updated.listing.price_amount, Some(300.0));
        assert_eq!(updated.attributes[0].value, TypedValue::Number(64.0));
    }

    #[test]
    fn test_update_foreign_listing_forbidden() {
        let mut core = Core::new().unwrap();
        let service = create_service(Some(MOCK_USER_ID + 1));
        let update = UpdateListingPayload {
            title: Some("Mine now".to_string()),
            ..UpdateListingPayload::default()
        };
        let e = core.run(service.update_listing(MOCK_LISTING_ID, update)).unwrap_err();
        assert_eq!(status(&e), Some(StatusCode::Forbidden));
    }

    #[test]
    fn test_update_invalid_payload() {
        let mut core = Core::new().unwrap();
        let service = create_service(Some(MOCK_USER_ID));
        let update = UpdateListingPayload {
            price_currency: Some("dollars".to_string()),
            ..UpdateListingPayload::default()
        };
        let e = core.run(service.update_listing(MOCK_LISTING_ID, update)).unwrap_err();
        assert_eq!(status(&e), Some(StatusCode::BadRequest));
    }

    #[test]
    fn test_get_missing_listing() {
        let mut core = Core::new().unwrap();
        let service = create_service(None);
        let e = core.run(service.get_listing(404)).unwrap_err();
        assert_eq!(status(&e), Some(StatusCode::NotFound));
    }

    #[test]
    fn test_refresh_and_my_listings() {
        let mut core = Core::new().unwrap();
        let service = create_service(Some(MOCK_USER_ID));
        let refreshed = core.run(service.refresh_listing(MOCK_LISTING_ID)).unwrap();
        assert_eq!(refreshed.status, "refreshed");

        let mine = core.run(service.my_listings()).unwrap();
        assert_eq!(mine.len(), 1);
        assert_eq!(mine[0].refreshed_at, refreshed.refreshed_at);

        let other = create_service(Some(MOCK_USER_ID + 1));
        assert!(core.run(other.my_listings()).unwrap().is_empty());
        assert!(core.run(other.refresh_listing(MOCK_LISTING_ID)).is_err());
    }
}
