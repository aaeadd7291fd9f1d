//! Repos contains all info about working with locations
use diesel::connection::AnsiTransactionManager;
use diesel::pg::Pg;
use diesel::prelude::*;
use diesel::query_dsl::RunQueryDsl;
use diesel::Connection;
use failure::Error as FailureError;

use crate::models::authorization::*;
use crate::models::Location;
use crate::repos::acl::{self, CheckScope};
use crate::repos::types::{RepoAcl, RepoResult};
use crate::schema::locations::dsl::*;

/// Locations repository, responsible for handling the location tree
pub struct LocationsRepoImpl<'a, T: Connection<Backend = Pg, TransactionManager = AnsiTransactionManager> + 'static> {
    pub db_conn: &'a T,
    pub acl: Box<RepoAcl<Location>>,
}

pub trait LocationsRepo {
    /// Returns all locations as a flat list ordered by id
    fn list(&self) -> RepoResult<Vec<Location>>;
}

impl<'a, T: Connection<Backend = Pg, TransactionManager = AnsiTransactionManager> + 'static> LocationsRepoImpl<'a, T> {
    pub fn new(db_conn: &'a T, acl: Box<RepoAcl<Location>>) -> Self {
        Self { db_conn, acl }
    }
}

impl<'a, T: Connection<Backend = Pg, TransactionManager = AnsiTransactionManager> + 'static> LocationsRepo for LocationsRepoImpl<'a, T> {
    fn list(&self) -> RepoResult<Vec<Location>> {
        debug!("List all locations.");
        acl::check(&*self.acl, Resource::Locations, Action::Read, self, None)?;
        locations
            .order(id)
            .load::<Location>(self.db_conn)
            .map_err(From::from)
            .map_err(|e: FailureError| e.context("List all locations error occurred").into())
    }
}

impl<'a, T: Connection<Backend = Pg, TransactionManager = AnsiTransactionManager> + 'static> CheckScope<Scope, Location>
    for LocationsRepoImpl<'a, T>
{
    fn is_in_scope(&self, _user_id: i32, scope: &Scope, _obj: Option<&Location>) -> Result<bool, FailureError> {
        Ok(match *scope {
            Scope::All => true,
            Scope::Owned => false,
        })
    }
}
