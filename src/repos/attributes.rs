//! Attributes repo, attribute definitions are owned by categories
use diesel::connection::AnsiTransactionManager;
use diesel::pg::Pg;
use diesel::prelude::*;
use diesel::query_dsl::RunQueryDsl;
use diesel::Connection;
use failure::Error as FailureError;

use crate::models::authorization::*;
use crate::models::AttributeDefinition;
use crate::repos::acl::{self, CheckScope};
use crate::repos::types::{RepoAcl, RepoResult};
use crate::schema::attributes::dsl::*;

/// Attributes repository, responsible for handling attribute definitions
pub struct AttributesRepoImpl<'a, T: Connection<Backend = Pg, TransactionManager = AnsiTransactionManager> + 'static> {
    pub db_conn: &'a T,
    pub acl: Box<RepoAcl<AttributeDefinition>>,
}

pub trait AttributesRepo {
    /// Attributes defined on any of the categories, ordered by id
    fn find_by_categories(&self, category_ids: Vec<i32>) -> RepoResult<Vec<AttributeDefinition>>;

    /// Attributes with the given ids, ordered by id
    fn find_many(&self, ids: Vec<i32>) -> RepoResult<Vec<AttributeDefinition>>;
}

impl<'a, T: Connection<Backend = Pg, TransactionManager = AnsiTransactionManager> + 'static> AttributesRepoImpl<'a, T> {
    pub fn new(db_conn: &'a T, acl: Box<RepoAcl<AttributeDefinition>>) -> Self {
        Self { db_conn, acl }
    }

    fn check_all(&self, results: Vec<AttributeDefinition>) -> RepoResult<Vec<AttributeDefinition>> {
        for result in &results {
            acl::check(&*self.acl, Resource::Attributes, Action::Read, self, Some(result))?;
        }
        Ok(results)
    }
}

impl<'a, T: Connection<Backend = Pg, TransactionManager = AnsiTransactionManager> + 'static> AttributesRepo for AttributesRepoImpl<'a, T> {
    fn find_by_categories(&self, category_ids: Vec<i32>) -> RepoResult<Vec<AttributeDefinition>> {
        debug!("Find attributes of categories {:?}.", category_ids);
        attributes
            .filter(category_id.eq_any(&category_ids))
            .order(id)
            .load::<AttributeDefinition>(self.db_conn)
            .map_err(From::from)
            .and_then(|results| self.check_all(results))
            .map_err(|e: FailureError| {
                e.context(format!("Find attributes of categories {:?} error occurred", category_ids))
                    .into()
            })
    }

    fn find_many(&self, ids: Vec<i32>) -> RepoResult<Vec<AttributeDefinition>> {
        debug!("Find attributes with ids {:?}.", ids);
        attributes
            .filter(id.eq_any(&ids))
            .order(id)
            .load::<AttributeDefinition>(self.db_conn)
            .map_err(From::from)
            .and_then(|results| self.check_all(results))
            .map_err(|e: FailureError| e.context(format!("Find attributes with ids {:?} error occurred", ids)).into())
    }
}

impl<'a, T: Connection<Backend = Pg, TransactionManager = AnsiTransactionManager> + 'static> CheckScope<Scope, AttributeDefinition>
    for AttributesRepoImpl<'a, T>
{
    fn is_in_scope(&self, _user_id: i32, scope: &Scope, _obj: Option<&AttributeDefinition>) -> Result<bool, FailureError> {
        Ok(match *scope {
            Scope::All => true,
            Scope::Owned => false,
        })
    }
}
