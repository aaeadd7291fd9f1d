//! Listings repo, presents CRUD operations with db for listings
use chrono::NaiveDateTime;
use diesel;
use diesel::connection::AnsiTransactionManager;
use diesel::pg::Pg;
use diesel::prelude::*;
use diesel::query_dsl::RunQueryDsl;
use diesel::Connection;
use failure::Error as FailureError;

use crate::errors::Error;
use crate::models::authorization::*;
use crate::models::{Listing, NewListing, UpdateListing};
use crate::repos::acl::{self, CheckScope};
use crate::repos::types::{RepoAcl, RepoResult};
use crate::schema::listings::dsl::*;

pub trait ListingsRepo {
    /// Find specific listing by id
    fn find(&self, listing_id: i32) -> RepoResult<Option<Listing>>;

    /// Creates new listing
    fn create(&self, payload: NewListing) -> RepoResult<Listing>;

    /// Updates specific listing
    fn update(&self, listing_id: i32, payload: UpdateListing) -> RepoResult<Listing>;

    /// Sets refreshed_at of specific listing
    fn refresh(&self, listing_id: i32, at: NaiveDateTime) -> RepoResult<Listing>;

    /// Listings of a user, newest first
    fn list_for_user(&self, user_id_arg: i32) -> RepoResult<Vec<Listing>>;

    /// Ids of all listings
    fn list_ids(&self) -> RepoResult<Vec<i32>>;
}

/// Implementation of ListingsRepo trait
pub struct ListingsRepoImpl<'a, T: Connection<Backend = Pg, TransactionManager = AnsiTransactionManager> + 'static> {
    pub db_conn: &'a T,
    pub acl: Box<RepoAcl<Listing>>,
}

impl<'a, T: Connection<Backend = Pg, TransactionManager = AnsiTransactionManager> + 'static> ListingsRepoImpl<'a, T> {
    pub fn new(db_conn: &'a T, acl: Box<RepoAcl<Listing>>) -> Self {
        Self { db_conn, acl }
    }

    fn find_existing(&self, listing_id: i32) -> RepoResult<Listing> {
        listings
            .find(listing_id)
            .get_result::<Listing>(self.db_conn)
            .optional()?
            .ok_or_else(|| format_err!("Listing {} not found", listing_id).context(Error::NotFound).into())
    }
}

impl<'a, T: Connection<Backend = Pg, TransactionManager = AnsiTransactionManager> + 'static> ListingsRepo for ListingsRepoImpl<'a, T> {
    fn find(&self, listing_id: i32) -> RepoResult<Option<Listing>> {
        debug!("Find in listings with id {}.", listing_id);
        let listing = listings
            .find(listing_id)
            .get_result::<Listing>(self.db_conn)
            .optional()
            .map_err(From::from)
            .map_err(|e: FailureError| e.context(format!("Find listing with id {} error occurred", listing_id)))?;
        acl::check(&*self.acl, Resource::Listings, Action::Read, self, listing.as_ref())?;
        Ok(listing)
    }

    fn create(&self, payload: NewListing) -> RepoResult<Listing> {
        debug!("Create listing {:?}.", payload);
        diesel::insert_into(listings)
            .values(&payload)
            .get_result::<Listing>(self.db_conn)
            .map_err(From::from)
            .and_then(|listing| acl::check(&*self.acl, Resource::Listings, Action::Create, self, Some(&listing)).and_then(|_| Ok(listing)))
            .map_err(|e: FailureError| e.context(format!("Create listing {:?} error occurred", payload)).into())
    }

    fn update(&self, listing_id: i32, payload: UpdateListing) -> RepoResult<Listing> {
        debug!("Updating listing with id {} and payload {:?}.", listing_id, payload);
        let listing = self.find_existing(listing_id)?;
        acl::check(&*self.acl, Resource::Listings, Action::Update, self, Some(&listing))?;
        if payload.is_empty() {
            return Ok(listing);
        }

        diesel::update(listings.filter(id.eq(listing_id)))
            .set(&payload)
            .get_result::<Listing>(self.db_conn)
            .map_err(From::from)
            .map_err(|e: FailureError| {
                e.context(format!("Updating listing with id {} and payload {:?} error occurred", listing_id, payload))
                    .into()
            })
    }

    fn refresh(&self, listing_id: i32, at: NaiveDateTime) -> RepoResult<Listing> {
        debug!("Refresh listing with id {} at {}.", listing_id, at);
        let listing = self.find_existing(listing_id)?;
        acl::check(&*self.acl, Resource::Listings, Action::Update, self, Some(&listing))?;

        diesel::update(listings.filter(id.eq(listing_id)))
            .set(refreshed_at.eq(at))
            .get_result::<Listing>(self.db_conn)
            .map_err(From::from)
            .map_err(|e: FailureError| e.context(format!("Refresh listing with id {} error occurred", listing_id)).into())
    }

    fn list_for_user(&self, user_id_arg: i32) -> RepoResult<Vec<Listing>> {
        debug!("List listings of user {}.", user_id_arg);
        listings
            .filter(user_id.eq(user_id_arg))
            .order((created_at.desc(), id.desc()))
            .load::<Listing>(self.db_conn)
            .map_err(From::from)
            .and_then(|results: Vec<Listing>| {
                for result in &results {
                    acl::check(&*self.acl, Resource::Listings, Action::Read, self, Some(result))?;
                }
                Ok(results)
            })
            .map_err(|e: FailureError| e.context(format!("List listings of user {} error occurred", user_id_arg)).into())
    }

    fn list_ids(&self) -> RepoResult<Vec<i32>> {
        debug!("List all listing ids.");
        acl::check(&*self.acl, Resource::Listings, Action::Read, self, None)?;
        listings
            .select(id)
            .order(id)
            .load::<i32>(self.db_conn)
            .map_err(From::from)
            .map_err(|e: FailureError| e.context("List all listing ids error occurred").into())
    }
}

impl<'a, T: Connection<Backend = Pg, TransactionManager = AnsiTransactionManager> + 'static> CheckScope<Scope, Listing>
    for ListingsRepoImpl<'a, T>
{
    fn is_in_scope(&self, user_id_arg: i32, scope: &Scope, obj: Option<&Listing>) -> Result<bool, FailureError> {
        Ok(match *scope {
            Scope::All => true,
            Scope::Owned => obj.map(|listing| listing.user_id == user_id_arg).unwrap_or(false),
        })
    }
}
