//! Attribute values repo, physical EAV rows of listings
use diesel;
use diesel::connection::AnsiTransactionManager;
use diesel::pg::Pg;
use diesel::prelude::*;
use diesel::query_dsl::RunQueryDsl;
use diesel::Connection;
use failure::Error as FailureError;

use crate::models::authorization::*;
use crate::models::{AttributeValueRow, NewAttributeValueRow};
use crate::repos::acl::{self, CheckScope};
use crate::repos::types::{RepoAcl, RepoResult};
use crate::schema::listing_attribute_values::dsl::*;
use crate::schema::listings::dsl as Listings;

pub trait AttributeValuesRepo {
    /// Rows of a listing in insertion order
    fn find_by_listing(&self, listing_id_arg: i32) -> RepoResult<Vec<AttributeValueRow>>;

    /// Deletes all rows of a listing, returns the number of deleted rows
    fn delete_by_listing(&self, listing_id_arg: i32) -> RepoResult<usize>;

    /// Inserts rows keeping their order
    fn create_many(&self, rows: Vec<NewAttributeValueRow>) -> RepoResult<Vec<AttributeValueRow>>;
}

/// AttributeValues repository, responsible for handling listing_attribute_values
pub struct AttributeValuesRepoImpl<'a, T: Connection<Backend = Pg, TransactionManager = AnsiTransactionManager> + 'static> {
    pub db_conn: &'a T,
    pub acl: Box<RepoAcl<AttributeValueRow>>,
}

impl<'a, T> AttributeValuesRepoImpl<'a, T>
where
    T: Connection<Backend = Pg, TransactionManager = AnsiTransactionManager> + 'static,
{
    pub fn new(db_conn: &'a T, acl: Box<RepoAcl<AttributeValueRow>>) -> Self {
        Self { db_conn, acl }
    }
}

impl<'a, T> AttributeValuesRepo for AttributeValuesRepoImpl<'a, T>
where
    T: Connection<Backend = Pg, TransactionManager = AnsiTransactionManager> + 'static,
{
    fn find_by_listing(&self, listing_id_arg: i32) -> RepoResult<Vec<AttributeValueRow>> {
        debug!("Find attribute values of listing {}.", listing_id_arg);
        listing_attribute_values
            .filter(listing_id.eq(listing_id_arg))
            .order(id)
            .load::<AttributeValueRow>(self.db_conn)
            .map_err(From::from)
            .and_then(|results: Vec<AttributeValueRow>| {
                for result in &results {
                    acl::check(&*self.acl, Resource::AttributeValues, Action::Read, self, Some(result))?;
                }
                Ok(results)
            })
            .map_err(|e: FailureError| {
                e.context(format!("Find attribute values of listing {} error occurred", listing_id_arg))
                    .into()
            })
    }

    fn delete_by_listing(&self, listing_id_arg: i32) -> RepoResult<usize> {
        debug!("Delete attribute values of listing {}.", listing_id_arg);
        let existing = listing_attribute_values
            .filter(listing_id.eq(listing_id_arg))
            .load::<AttributeValueRow>(self.db_conn)?;
        for row in &existing {
            acl::check(&*self.acl, Resource::AttributeValues, Action::Update, self, Some(row))?;
        }

        diesel::delete(listing_attribute_values.filter(listing_id.eq(listing_id_arg)))
            .execute(self.db_conn)
            .map_err(From::from)
            .map_err(|e: FailureError| {
                e.context(format!("Delete attribute values of listing {} error occurred", listing_id_arg))
                    .into()
            })
    }

    fn create_many(&self, rows: Vec<NewAttributeValueRow>) -> RepoResult<Vec<AttributeValueRow>> {
        debug!("Create attribute values {:?}.", rows);
        if rows.is_empty() {
            return Ok(vec![]);
        }

        diesel::insert_into(listing_attribute_values)
            .values(&rows)
            .get_results::<AttributeValueRow>(self.db_conn)
            .map_err(From::from)
            .and_then(|created: Vec<AttributeValueRow>| {
                for row in &created {
                    acl::check(&*self.acl, Resource::AttributeValues, Action::Create, self, Some(row))?;
                }
                Ok(created)
            })
            .map_err(|e: FailureError| e.context(format!("Create attribute values {:?} error occurred", rows)).into())
    }
}

impl<'a, T: Connection<Backend = Pg, TransactionManager = AnsiTransactionManager> + 'static> CheckScope<Scope, AttributeValueRow>
    for AttributeValuesRepoImpl<'a, T>
{
    fn is_in_scope(&self, user_id_arg: i32, scope: &Scope, obj: Option<&AttributeValueRow>) -> Result<bool, FailureError> {
        match *scope {
            Scope::All => Ok(true),
            Scope::Owned => match obj {
                Some(row) => {
                    let owner = Listings::listings
                        .find(row.listing_id)
                        .select(Listings::user_id)
                        .get_result::<i32>(self.db_conn)
                        .optional()
                        .map_err(FailureError::from)
                        .map_err(|e| e.context(format!("Owner lookup of listing {} error occurred", row.listing_id)))?;
                    Ok(owner == Some(user_id_arg))
                }
                None => Ok(false),
            },
        }
    }
}
