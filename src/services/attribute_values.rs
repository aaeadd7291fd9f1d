//! AttributeValue Services, stores validated attribute values of listings
//! and reads them back as one logical value per attribute
use diesel::connection::AnsiTransactionManager;
use diesel::pg::Pg;
use diesel::Connection;
use failure::Error as FailureError;
use r2d2::ManageConnection;

use crate::errors::{find_error, Error};
use crate::models::{
    expand_values, group_rows, AttributeSchema, AttributeValueInput, AttributeValueRow, GroupedAttributeValue, Listing, ListingWithAttributes,
    ValidatedAttribute,
};
use crate::repos::{AttributeValuesRepo, AttributesRepo, ListingsRepo, RepoResult, ReposFactory};
use crate::services::attribute_validation::validate_attributes;
use crate::services::categories::lineage_schema;
use crate::services::listings::{build_document, index_best_effort};
use crate::services::types::ServiceFuture;
use crate::services::Service;

pub trait AttributeValuesService {
    /// Validates and stores the attribute values of a listing, dropping all previously stored ones
    fn replace_attribute_values(&self, listing_id: i32, payload: Vec<AttributeValueInput>) -> ServiceFuture<Vec<GroupedAttributeValue>>;
    /// Returns attribute values of a listing ordered by attribute id
    fn get_attribute_values(&self, listing_id: i32) -> ServiceFuture<Vec<GroupedAttributeValue>>;
}

impl<
        T: Connection<Backend = Pg, TransactionManager = AnsiTransactionManager> + 'static,
        M: ManageConnection<Connection = T>,
        F: ReposFactory<T>,
    > AttributeValuesService for Service<T, M, F>
{
    fn replace_attribute_values(&self, listing_id: i32, payload: Vec<AttributeValueInput>) -> ServiceFuture<Vec<GroupedAttributeValue>> {
        let user_id = self.dynamic_context.user_id;
        let repo_factory = self.static_context.repo_factory.clone();
        let elastic = self.static_context.elastic.clone();
        let max_depth = self.static_context.config.listings.max_tree_depth;

        self.spawn_on_pool(move |conn| {
            let listings_repo = repo_factory.create_listings_repo(&*conn, user_id);
            let categories_repo = repo_factory.create_categories_repo(&*conn, user_id);
            let locations_repo = repo_factory.create_locations_repo(&*conn, user_id);
            let attributes_repo = repo_factory.create_attributes_repo(&*conn, user_id);
            let attribute_values_repo = repo_factory.create_attribute_values_repo(&*conn, user_id);

            let (listing, values) = conn
                .transaction::<(Listing, Vec<GroupedAttributeValue>), FailureError, _>(|| {
                    let listing = listings_repo
                        .find(listing_id)?
                        .ok_or_else(|| format_err!("Listing {} not found", listing_id).context(Error::NotFound))?;
                    let schema = lineage_schema(&*categories_repo, &*attributes_repo, listing.category_id, max_depth)?;
                    let rows = validate_and_replace(&*attribute_values_repo, &schema, listing_id, payload)?;
                    let values = group_rows(&rows, schema.definitions()).into_iter().map(|(_, value)| value).collect();
                    Ok((listing, values))
                })
                .map_err(|e| store_error(e, listing_id))?;

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
            Ok(values)
        })
    }

    fn get_attribute_values(&self, listing_id: i32) -> ServiceFuture<Vec<GroupedAttributeValue>> {
        let user_id = self.dynamic_context.user_id;
        let repo_factory = self.static_context.repo_factory.clone();

        self.spawn_on_pool(move |conn| {
            let attribute_values_repo = repo_factory.create_attribute_values_repo(&*conn, user_id);
            let attributes_repo = repo_factory.create_attributes_repo(&*conn, user_id);
            read_grouped(&*attribute_values_repo, &*attributes_repo, listing_id).map_err(|e| {
                e.context(format!("AttributeValuesService, get_attribute_values of listing {} error occurred.", listing_id))
                    .into()
            })
        })
    }
}

/// Deletes every stored value of the listing, then inserts one row per value,
/// or one row per option key for MULTISELECT. Must run inside a transaction.
pub fn replace_values(
    attribute_values_repo: &dyn AttributeValuesRepo,
    listing_id: i32,
    values: Vec<ValidatedAttribute>,
) -> RepoResult<Vec<AttributeValueRow>> {
    let deleted = attribute_values_repo.delete_by_listing(listing_id)?;
    let rows = expand_values(listing_id, values);
    debug!("Replacing {} attribute value rows of listing {} with {}", deleted, listing_id, rows.len());
    attribute_values_repo.create_many(rows)
}

/// Validates the payload against the lineage schema and replaces the stored values.
/// Must run inside a transaction.
pub fn validate_and_replace(
    attribute_values_repo: &dyn AttributeValuesRepo,
    schema: &AttributeSchema,
    listing_id: i32,
    payload: Vec<AttributeValueInput>,
) -> RepoResult<Vec<AttributeValueRow>> {
    let validated = validate_attributes(schema, payload).map_err(Error::InvalidAttributes)?;
    replace_values(attribute_values_repo, listing_id, validated)
}

/// One logical value per attribute, ordered by attribute id
pub fn read_grouped(
    attribute_values_repo: &dyn AttributeValuesRepo,
    attributes_repo: &dyn AttributesRepo,
    listing_id: i32,
) -> RepoResult<Vec<GroupedAttributeValue>> {
    let rows = attribute_values_repo.find_by_listing(listing_id)?;
    if rows.is_empty() {
        return Ok(vec![]);
    }
    let mut attribute_ids = rows.iter().map(|row| row.attribute_id).collect::<Vec<_>>();
    attribute_ids.sort();
    attribute_ids.dedup();
    let definitions = attributes_repo.find_many(attribute_ids)?;
    Ok(group_rows(&rows, &definitions).into_iter().map(|(_, value)| value).collect())
}

/// Listing with its attribute values. Kept here so that every reader of
/// grouped values goes through `read_grouped`.
pub fn find_with_attributes(
    listings_repo: &dyn ListingsRepo,
    attribute_values_repo: &dyn AttributeValuesRepo,
    attributes_repo: &dyn AttributesRepo,
    listing_id: i32,
) -> RepoResult<Option<ListingWithAttributes>> {
    let listing = match listings_repo.find(listing_id)? {
        Some(listing) => listing,
        None => return Ok(None),
    };
    let attributes = read_grouped(attribute_values_repo, attributes_repo, listing_id)?;
    Ok(Some(ListingWithAttributes { listing, attributes }))
}

/// Classified failures keep their class, anything else means the stored
/// values could not be replaced and were rolled back.
pub fn store_error(e: FailureError, listing_id: i32) -> FailureError {
    if find_error(&e).is_some() {
        e.context(format!("Replacing attribute values of listing {} error occurred.", listing_id))
            .into()
    } else {
        error!("Replacing attribute values of listing {} failed, rolled back: {}", listing_id, e);
        e.context(Error::StoreAtomicity).into()
    }
}
