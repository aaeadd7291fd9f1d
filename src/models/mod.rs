//! Models contains all structures that are used in different
//! modules of the app

pub mod attribute;
pub mod attribute_errors;
pub mod attribute_value;
pub mod authorization;
pub mod category;
pub mod elastic;
pub mod listing;
pub mod location;
pub mod search;
pub mod tree;
pub mod validation_rules;

pub use self::attribute::*;
pub use self::attribute_errors::*;
pub use self::attribute_value::*;
pub use self::authorization::*;
pub use self::category::*;
pub use self::elastic::*;
pub use self::listing::*;
pub use self::location::*;
pub use self::search::*;
pub use self::tree::*;
pub use self::validation_rules::*;
