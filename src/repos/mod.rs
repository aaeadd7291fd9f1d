//! Repos is a module responsible for interacting with postgres db
#[macro_use]
pub mod acl;
pub mod attribute_values;
pub mod attributes;
pub mod categories;
pub mod listings;
pub mod locations;
pub mod repo_factory;
pub mod types;

pub use self::acl::*;
pub use self::attribute_values::*;
pub use self::attributes::*;
pub use self::categories::*;
pub use self::listings::*;
pub use self::locations::*;
pub use self::repo_factory::*;
pub use self::types::*;
