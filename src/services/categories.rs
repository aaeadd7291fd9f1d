//! Categories Services, presents the category tree and the attribute
//! schema every listing of a category is validated against
use diesel::connection::AnsiTransactionManager;
use diesel::pg::Pg;
use diesel::Connection;
use failure::Error as FailureError;
use r2d2::ManageConnection;

use crate::errors::Error;
use crate::models::{AttributeDefinition, AttributeSchema, Category, Location, TreeArena};
use crate::repos::{AttributesRepo, CategoriesRepo, LocationsRepo, RepoResult, ReposFactory};
use crate::services::types::ServiceFuture;
use crate::services::Service;

pub trait CategoriesService {
    /// Returns all categories as a flat list
    fn list_categories(&self) -> ServiceFuture<Vec<Category>>;
    /// Returns attributes allowed for listings of the category, inherited ones included
    fn lineage_attributes(&self, category_id: i32) -> ServiceFuture<Vec<AttributeDefinition>>;
}

impl<
        T: Connection<Backend = Pg, TransactionManager = AnsiTransactionManager> + 'static,
        M: ManageConnection<Connection = T>,
        F: ReposFactory<T>,
    > CategoriesService for Service<T, M, F>
{
    fn list_categories(&self) -> ServiceFuture<Vec<Category>> {
        let user_id = self.dynamic_context.user_id;
        let repo_factory = self.static_context.repo_factory.clone();

        self.spawn_on_pool(move |conn| {
            let categories_repo = repo_factory.create_categories_repo(&*conn, user_id);
            categories_repo
                .list()
                .map_err(|e| e.context("CategoriesService, list_categories error occurred.").into())
        })
    }

    fn lineage_attributes(&self, category_id: i32) -> ServiceFuture<Vec<AttributeDefinition>> {
        let user_id = self.dynamic_context.user_id;
        let repo_factory = self.static_context.repo_factory.clone();
        let max_depth = self.static_context.config.listings.max_tree_depth;

        self.spawn_on_pool(move |conn| {
            let categories_repo = repo_factory.create_categories_repo(&*conn, user_id);
            let attributes_repo = repo_factory.create_attributes_repo(&*conn, user_id);
            lineage_schema(&*categories_repo, &*attributes_repo, category_id, max_depth)
                .map(AttributeSchema::into_definitions)
                .map_err(|e| {
                    e.context(format!("CategoriesService, lineage_attributes for category {} error occurred.", category_id))
                        .into()
                })
        })
    }
}

/// Categories from `category_id` up to its root, starting category first
pub fn category_lineage(categories_repo: &dyn CategoriesRepo, category_id: i32, max_depth: usize) -> RepoResult<Vec<Category>> {
    let arena = TreeArena::new(categories_repo.list()?);
    arena
        .lineage(category_id, max_depth)
        .map(|lineage| lineage.into_iter().cloned().collect())
        .ok_or_else(|| format_err!("Category {} not found", category_id).context(Error::NotFound).into())
}

/// Attribute definitions of the category and all of its ancestors
pub fn lineage_schema(
    categories_repo: &dyn CategoriesRepo,
    attributes_repo: &dyn AttributesRepo,
    category_id: i32,
    max_depth: usize,
) -> RepoResult<AttributeSchema> {
    let category_ids = category_lineage(categories_repo, category_id, max_depth)?
        .into_iter()
        .map(|category| category.id)
        .collect::<Vec<_>>();
    debug!("Attribute lineage of category {}: {:?}", category_id, category_ids);
    let definitions = attributes_repo.find_by_categories(category_ids)?;
    Ok(AttributeSchema::new(definitions))
}

/// Category slugs from the root down to `category_id`
pub fn category_path(categories_repo: &dyn CategoriesRepo, category_id: i32, max_depth: usize) -> RepoResult<Vec<String>> {
    let mut lineage = category_lineage(categories_repo, category_id, max_depth)?;
    lineage.reverse();
    Ok(lineage.into_iter().map(|category| category.slug).collect())
}

/// Location slugs from the root down to `location_id`, empty when the listing has no location.
/// A dangling location id only loses its path in the index, it never fails a write.
pub fn location_path(locations_repo: &dyn LocationsRepo, location_id: Option<i32>, max_depth: usize) -> RepoResult<Vec<String>> {
    let location_id = match location_id {
        Some(location_id) => location_id,
        None => return Ok(vec![]),
    };
    let arena = TreeArena::new(locations_repo.list()?);
    let path = match arena.lineage(location_id, max_depth) {
        Some(lineage) => lineage.into_iter().rev().map(|location: &Location| location.slug.clone()).collect(),
        None => {
            warn!("Location {} not found, indexing without location path", location_id);
            vec![]
        }
    };
    Ok(path)
}

#[cfg(test)]
pub mod tests {
    use tokio_core::reactor::Core;

    use crate::repos::repo_factory::tests::*;
    use crate::services::*;

    #[test]
    fn test_list_categories() {
        let mut core = Core::new().unwrap();
        let service = create_service(None);
        let work = service.list_categories();
        let result = core.run(work).unwrap();
        assert_eq!(result.len(), 4);
    }

    #[test]
    fn test_attributes_inherited_from_ancestors() {
        let mut core = Core::new().unwrap();
        let service = create_service(None);
        let work = service.lineage_attributes(3);
        let result = core.run(work).unwrap();
        let keys = result.into_iter().map(|a| a.key).collect::<Vec<_>>();
        assert_eq!(keys, vec!["storage_gb", "color", "features", "unlocked", "model"]);
    }

    #[test]
    fn test_attributes_not_inherited_from_siblings() {
        let mut core = Core::new().unwrap();
        let service = create_service(None);
        let work = service.lineage_attributes(4);
        let result = core.run(work).unwrap();
        let keys = result.into_iter().map(|a| a.key).collect::<Vec<_>>();
        assert_eq!(keys, vec!["material"]);
    }

    #[test]
    fn test_unknown_category() {
        let mut core = Core::new().unwrap();
        let service = create_service(None);
        let work = service.lineage_attributes(404);
        let result = core.run(work);
        assert!(result.is_err());
    }
}
