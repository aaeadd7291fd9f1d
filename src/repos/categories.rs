//! Repos contains all info about working with categories
use diesel::connection::AnsiTransactionManager;
use diesel::pg::Pg;
use diesel::prelude::*;
use diesel::query_dsl::RunQueryDsl;
use diesel::Connection;
use failure::Error as FailureError;

use crate::models::authorization::*;
use crate::models::Category;
use crate::repos::acl::{self, CheckScope};
use crate::repos::types::{RepoAcl, RepoResult};
use crate::schema::categories::dsl::*;

/// Categories repository, responsible for handling categories
pub struct CategoriesRepoImpl<'a, T: Connection<Backend = Pg, TransactionManager = AnsiTransactionManager> + 'static> {
    pub db_conn: &'a T,
    pub acl: Box<RepoAcl<Category>>,
}

pub trait CategoriesRepo {
    /// Returns all categories as a flat list ordered by id
    fn list(&self) -> RepoResult<Vec<Category>>;

    /// Find specific category by id
    fn find(&self, id_arg: i32) -> RepoResult<Option<Category>>;
}

impl<'a, T: Connection<Backend = Pg, TransactionManager = AnsiTransactionManager> + 'static> CategoriesRepoImpl<'a, T> {
    pub fn new(db_conn: &'a T, acl: Box<RepoAcl<Category>>) -> Self {
        Self { db_conn, acl }
    }
}

impl<'a, T: Connection<Backend = Pg, TransactionManager = AnsiTransactionManager> + 'static> CategoriesRepo for CategoriesRepoImpl<'a, T> {
    fn list(&self) -> RepoResult<Vec<Category>> {
        debug!("List all categories.");
        acl::check(&*self.acl, Resource::Categories, Action::Read, self, None)?;
        categories
            .order(id)
            .load::<Category>(self.db_conn)
            .map_err(From::from)
            .map_err(|e: FailureError| e.context("List all categories error occurred").into())
    }

    fn find(&self, id_arg: i32) -> RepoResult<Option<Category>> {
        debug!("Find in categories with id {}.", id_arg);
        let category = categories
            .find(id_arg)
            .get_result::<Category>(self.db_conn)
            .optional()
            .map_err(From::from)
            .map_err(|e: FailureError| e.context(format!("Find category with id {} error occurred", id_arg)))?;
        acl::check(&*self.acl, Resource::Categories, Action::Read, self, category.as_ref())?;
        Ok(category)
    }
}

impl<'a, T: Connection<Backend = Pg, TransactionManager = AnsiTransactionManager> + 'static> CheckScope<Scope, Category>
    for CategoriesRepoImpl<'a, T>
{
    fn is_in_scope(&self, _user_id: i32, scope: &Scope, _obj: Option<&Category>) -> Result<bool, FailureError> {
        Ok(match *scope {
            Scope::All => true,
            Scope::Owned => false,
        })
    }
}
