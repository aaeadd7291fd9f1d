//! Search index modules
pub mod facets;
pub mod listings;
pub mod query;

pub use self::listings::*;

use std::fmt::Debug;

pub fn log_elastic_req<T: Debug>(item: &T) {
    debug!("Searching in elastic {:?}.", item);
}

pub fn log_elastic_resp<T: Debug>(item: &T) {
    debug!("Result of searching in elastic {:?}.", item)
}
