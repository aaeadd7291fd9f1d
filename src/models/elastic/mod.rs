//! Search index models
pub mod document;
pub mod index_response;
pub mod search_response;

pub use self::document::*;
pub use self::index_response::*;
pub use self::search_response::*;
