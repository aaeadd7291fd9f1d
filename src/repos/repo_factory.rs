use diesel::connection::AnsiTransactionManager;
use diesel::pg::Pg;
use diesel::Connection;
use failure::Error as FailureError;

use crate::models::*;
use crate::repos::*;

pub trait ReposFactory<C: Connection<Backend = Pg, TransactionManager = AnsiTransactionManager> + 'static>: Clone + Send + 'static {
    fn create_attributes_repo<'a>(&self, db_conn: &'a C, user_id: Option<i32>) -> Box<dyn AttributesRepo + 'a>;
    fn create_attribute_values_repo<'a>(&self, db_conn: &'a C, user_id: Option<i32>) -> Box<dyn AttributeValuesRepo + 'a>;
    fn create_categories_repo<'a>(&self, db_conn: &'a C, user_id: Option<i32>) -> Box<dyn CategoriesRepo + 'a>;
    fn create_locations_repo<'a>(&self, db_conn: &'a C, user_id: Option<i32>) -> Box<dyn LocationsRepo + 'a>;
    fn create_listings_repo<'a>(&self, db_conn: &'a C, user_id: Option<i32>) -> Box<dyn ListingsRepo + 'a>;
    fn create_listings_repo_with_sys_acl<'a>(&self, db_conn: &'a C) -> Box<dyn ListingsRepo + 'a>;
}

#[derive(Clone, Default)]
pub struct ReposFactoryImpl;

impl ReposFactoryImpl {
    pub fn new() -> Self {
        ReposFactoryImpl
    }

    fn get_acl<T>(&self, user_id: Option<i32>) -> Box<dyn Acl<Resource, Action, Scope, FailureError, T>> {
        user_id.map_or(
            Box::new(UnauthorizedAcl::default()) as Box<dyn Acl<Resource, Action, Scope, FailureError, T>>,
            |id| Box::new(ApplicationAcl::new(id)) as Box<dyn Acl<Resource, Action, Scope, FailureError, T>>,
        )
    }
}

impl<C: Connection<Backend = Pg, TransactionManager = AnsiTransactionManager> + 'static> ReposFactory<C> for ReposFactoryImpl {
    fn create_attributes_repo<'a>(&self, db_conn: &'a C, user_id: Option<i32>) -> Box<dyn AttributesRepo + 'a> {
        let acl = self.get_acl(user_id);
        Box::new(AttributesRepoImpl::new(db_conn, acl)) as Box<dyn AttributesRepo>
    }
    fn create_attribute_values_repo<'a>(&self, db_conn: &'a C, user_id: Option<i32>) -> Box<dyn AttributeValuesRepo + 'a> {
        let acl = self.get_acl(user_id);
        Box::new(AttributeValuesRepoImpl::new(db_conn, acl)) as Box<dyn AttributeValuesRepo>
    }
    fn create_categories_repo<'a>(&self, db_conn: &'a C, user_id: Option<i32>) -> Box<dyn CategoriesRepo + 'a> {
        let acl = self.get_acl(user_id);
        Box::new(CategoriesRepoImpl::new(db_conn, acl)) as Box<dyn CategoriesRepo>
    }
    fn create_locations_repo<'a>(&self, db_conn: &'a C, user_id: Option<i32>) -> Box<dyn LocationsRepo + 'a> {
        let acl = self.get_acl(user_id);
        Box::new(LocationsRepoImpl::new(db_conn, acl)) as Box<dyn LocationsRepo>
    }
    fn create_listings_repo<'a>(&self, db_conn: &'a C, user_id: Option<i32>) -> Box<dyn ListingsRepo + 'a> {
        let acl = self.get_acl(user_id);
        Box::new(ListingsRepoImpl::new(db_conn, acl)) as Box<dyn ListingsRepo>
    }
    fn create_listings_repo_with_sys_acl<'a>(&self, db_conn: &'a C) -> Box<dyn ListingsRepo + 'a> {
        Box::new(ListingsRepoImpl::new(
            db_conn,
            Box::new(SystemAcl::default()) as Box<dyn Acl<Resource, Action, Scope, FailureError, Listing>>,
        )) as Box<dyn ListingsRepo>
    }
}
