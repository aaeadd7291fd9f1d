use failure::{Context, Error as FailureError};
use hyper::StatusCode;
use serde_json;
use validator::ValidationErrors;

use crate::models::AttributeErrors;

/// Maps an error to the http status returned to the client
pub trait Codeable {
    fn code(&self) -> StatusCode;
}

/// Provides an optional json payload for the error response body
pub trait PayloadCarrier {
    fn payload(&self) -> Option<serde_json::Value>;
}

#[derive(Debug, Fail)]
pub enum Error {
    #[fail(display = "Not found")]
    NotFound,
    #[fail(display = "Parse error")]
    Parse,
    #[fail(display = "Validation error: {}", _0)]
    Validate(ValidationErrors),
    #[fail(display = "Attribute validation error: {}", _0)]
    InvalidAttributes(AttributeErrors),
    #[fail(display = "Unauthorized")]
    Unauthorized,
    #[fail(display = "Server is refusing to fullfil the request")]
    Forbidden,
    #[fail(display = "R2D2 connection error")]
    Connection,
    #[fail(display = "Attribute values could not be replaced, stored values are left intact")]
    StoreAtomicity,
    #[fail(display = "Search backend unavailable")]
    SearchUnavailable,
}

impl Codeable for Error {
    fn code(&self) -> StatusCode {
        match *self {
            Error::NotFound => StatusCode::NotFound,
            Error::Validate(_) | Error::InvalidAttributes(_) => StatusCode::BadRequest,
            Error::Parse => StatusCode::UnprocessableEntity,
            Error::Unauthorized => StatusCode::Unauthorized,
            Error::Forbidden => StatusCode::Forbidden,
            Error::Connection | Error::StoreAtomicity => StatusCode::InternalServerError,
            Error::SearchUnavailable => StatusCode::ServiceUnavailable,
        }
    }
}

impl PayloadCarrier for Error {
    fn payload(&self) -> Option<serde_json::Value> {
        match *self {
            Error::Validate(ref e) => serde_json::to_value(e).ok(),
            Error::InvalidAttributes(ref e) => serde_json::to_value(e).ok(),
            _ => None,
        }
    }
}

/// First classified error in the chain, outermost first
pub fn find_error(e: &FailureError) -> Option<&Error> {
    e.iter_chain()
        .filter_map(|cause| {
            cause
                .downcast_ref::<Context<Error>>()
                .map(|ctx| ctx.get_context())
                .or_else(|| cause.downcast_ref::<Error>())
        })
        .next()
}
