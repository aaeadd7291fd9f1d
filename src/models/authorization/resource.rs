//! Enum for resources available in ACLs
use std::fmt;

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Resource {
    Attributes,
    AttributeValues,
    Categories,
    Listings,
    Locations,
}

impl fmt::Display for Resource {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            Resource::Attributes => write!(f, "attributes"),
            Resource::AttributeValues => write!(f, "attribute values"),
            Resource::Categories => write!(f, "categories"),
            Resource::Listings => write!(f, "listings"),
            Resource::Locations => write!(f, "locations"),
        }
    }
}
