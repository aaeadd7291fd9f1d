//! `Controller` is a top layer that handles all http-related
//! stuff like reading bodies, parsing params, forming a response.
//! Basically it provides inputs to `Service` layer and converts outputs
//! of `Service` layer to http responses

pub mod context;
pub mod routes;
pub mod types;
pub mod utils;

use std::sync::Arc;

use diesel::connection::AnsiTransactionManager;
use diesel::pg::Pg;
use diesel::Connection;
use failure::Error as FailureError;
use futures::future;
use futures::Future;
use hyper;
use hyper::header::{Authorization, ContentLength, ContentType};
use hyper::server::{Request, Response, Service as HyperService};
use hyper::{Get, Post, Put, StatusCode};
use r2d2::ManageConnection;
use serde_json;

use self::context::{DynamicContext, StaticContext};
use self::routes::{Route, RouteParser};
use self::types::ControllerFuture;
use self::utils::{parse_body, query_params, user_id_from_header};
use crate::errors::{find_error, Codeable, Error, PayloadCarrier};
use crate::models::*;
use crate::repos::repo_factory::*;
use crate::services::*;

/// Turns a request into a future of the serialized response body
pub trait Controller {
    fn call(&self, req: Request) -> ControllerFuture;
}

/// Controller handles route parsing and calling `Service` layer
pub struct ControllerImpl<T, M, F>
where
    T: Connection<Backend = Pg, TransactionManager = AnsiTransactionManager> + 'static,
    M: ManageConnection<Connection = T>,
    F: ReposFactory<T>,
{
    pub static_context: StaticContext<T, M, F>,
    pub route_parser: Arc<RouteParser<Route>>,
}

impl<
        T: Connection<Backend = Pg, TransactionManager = AnsiTransactionManager> + 'static,
        M: ManageConnection<Connection = T>,
        F: ReposFactory<T>,
    > ControllerImpl<T, M, F>
{
    /// Create a new controller based on services
    pub fn new(static_context: StaticContext<T, M, F>, route_parser: Arc<RouteParser<Route>>) -> Self {
        Self {
            static_context,
            route_parser,
        }
    }
}

macro_rules! serialize_future {
    ($e:expr) => {
        Box::new($e.and_then(|resp| serde_json::to_string(&resp).map_err(FailureError::from)))
    };
}

impl<
        T: Connection<Backend = Pg, TransactionManager = AnsiTransactionManager> + 'static,
        M: ManageConnection<Connection = T>,
        F: ReposFactory<T>,
    > Controller for ControllerImpl<T, M, F>
{
    /// Handle a request and get future response
    fn call(&self, req: Request) -> ControllerFuture {
        let user_id = user_id_from_header(req.headers().get::<Authorization<String>>().map(|auth| auth.0.as_str()));
        let service = Service::new(self.static_context.clone(), DynamicContext::new(user_id));

        let method = req.method().clone();
        let path = req.path().to_string();
        debug!("User with id = '{:?}' is requesting {} {}", user_id, method, path);

        match (&method, self.route_parser.test(&path)) {
            // GET /healthcheck
            (&Get, Some(Route::Healthcheck)) => serialize_future!(service.healthcheck()),

            // GET /categories
            (&Get, Some(Route::Categories)) => serialize_future!(service.list_categories()),

            // GET /categories/<category_id>/attributes
            (&Get, Some(Route::CategoryAttributes(category_id))) => serialize_future!(service.lineage_attributes(category_id)),

            // POST /listings
            (&Post, Some(Route::Listings)) => serialize_future!(
                parse_body::<NewListingPayload>(req.body()).and_then(move |payload| service.create_listing(payload))
            ),

            // GET /listings/search
            (&Get, Some(Route::ListingsSearch)) => {
                let params = query_params(req.query());
                let listings_config = &self.static_context.config.listings;
                let search = SearchListings::from_params(&params, listings_config.default_per_page, listings_config.max_per_page);
                serialize_future!(service.search_listings(search))
            }

            // GET /listings/<listing_id>
            (&Get, Some(Route::Listing(listing_id))) => serialize_future!(service.get_listing(listing_id)),

            // PUT /listings/<listing_id>
            (&Put, Some(Route::Listing(listing_id))) => serialize_future!(
                parse_body::<UpdateListingPayload>(req.body()).and_then(move |payload| service.update_listing(listing_id, payload))
            ),

            // POST /listings/<listing_id>/refresh
            (&Post, Some(Route::ListingRefresh(listing_id))) => serialize_future!(service.refresh_listing(listing_id)),

            // GET /listings/<listing_id>/attributes
            (&Get, Some(Route::ListingAttributes(listing_id))) => serialize_future!(service.get_attribute_values(listing_id)),

            // PUT /listings/<listing_id>/attributes
            (&Put, Some(Route::ListingAttributes(listing_id))) => serialize_future!(
                parse_body::<Vec<AttributeValueInput>>(req.body()).and_then(move |payload| service.replace_attribute_values(listing_id, payload))
            ),

            // GET /my/listings
            (&Get, Some(Route::MyListings)) => serialize_future!(service.my_listings()),

            // Fallback
            (m, _) => Box::new(future::err::<String, FailureError>(
                format_err!("Request to non existing endpoint in listings microservice! {:?} {:?}", m, path)
                    .context(Error::NotFound)
                    .into(),
            )),
        }
    }
}

/// Body of every error response
#[derive(Serialize, Deserialize, Debug)]
pub struct ErrorMessage {
    pub code: u16,
    pub description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payload: Option<serde_json::Value>,
}

/// Hyper service wrapping a `Controller`
pub struct Application<C: Controller> {
    controller: C,
}

impl<C: Controller> Application<C> {
    pub fn new(controller: C) -> Self {
        Self { controller }
    }
}

impl<C: Controller> HyperService for Application<C> {
    type Request = Request;
    type Response = Response;
    type Error = hyper::Error;
    type Future = Box<dyn Future<Item = Response, Error = hyper::Error>>;

    fn call(&self, req: Request) -> Self::Future {
        Box::new(self.controller.call(req).then(|result| -> Result<Response, hyper::Error> {
            match result {
                Ok(body) => Ok(response_with_body(StatusCode::Ok, body)),
                Err(e) => Ok(response_with_error(&e)),
            }
        }))
    }
}

fn response_with_body(status: StatusCode, body: String) -> Response {
    Response::new()
        .with_status(status)
        .with_header(ContentLength(body.len() as u64))
        .with_header(ContentType::json())
        .with_body(body)
}

fn error_chain(e: &FailureError) -> String {
    e.iter_chain().map(|cause| cause.to_string()).collect::<Vec<_>>().join(" | ")
}

/// Unclassified errors become 500 without leaking their chain to the client
pub fn error_message(e: &FailureError) -> (StatusCode, ErrorMessage) {
    match find_error(e) {
        Some(err) => {
            let status = err.code();
            let message = ErrorMessage {
                code: status.as_u16(),
                description: err.to_string(),
                payload: err.payload(),
            };
            (status, message)
        }
        None => {
            let status = StatusCode::InternalServerError;
            let message = ErrorMessage {
                code: status.as_u16(),
                description: "Internal server error".to_string(),
                payload: None,
            };
            (status, message)
        }
    }
}

fn response_with_error(e: &FailureError) -> Response {
    let (status, message) = error_message(e);
    if status == StatusCode::InternalServerError {
        error!("{}", error_chain(e));
    } else {
        warn!("{}", error_chain(e));
    }
    let body = serde_json::to_string(&message).unwrap_or_else(|_| format!("{{\"code\":{}}}", message.code));
    response_with_body(status, body)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{AttributeErrors, AttributeValueError};

    #[test]
    fn test_error_message_classified() {
        let e: FailureError = format_err!("Listing 3 not found").context(Error::NotFound).into();
        let (status, message) = error_message(&e);
        assert_eq!(status, StatusCode::NotFound);
        assert_eq!(message.code, 404);
        assert!(message.payload.is_none());
    }

    #[test]
    fn test_error_message_carries_attribute_errors() {
        let errors = AttributeErrors(vec![AttributeValueError::UnknownAttribute { attribute: 99 }]);
        let e: FailureError = Error::InvalidAttributes(errors).into();
        let e: FailureError = e.context("ListingsService, create_listing error occurred.").into();
        let (_, message) = error_message(&e);
        assert_eq!(message.code, 400);
        assert!(message.payload.is_some());
    }

    #[test]
    fn test_error_message_unclassified_is_internal() {
        let e: FailureError = format_err!("connection reset by peer");
        let (status, message) = error_message(&e);
        assert_eq!(status, StatusCode::InternalServerError);
        assert_eq!(message.code, 500);
        assert_eq!(message.description, "Internal server error");
    }
}
