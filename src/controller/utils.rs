use failure::Error as FailureError;
use failure::Fail;
use futures::future::Future;
use futures::Stream;
use hyper;
use serde::de::DeserializeOwned;
use serde_json;
use url::form_urlencoded;

use crate::errors::Error;

/// Reads the whole body and deserializes it as json
pub fn parse_body<T>(body: hyper::Body) -> Box<dyn Future<Item = T, Error = FailureError>>
where
    T: DeserializeOwned + 'static,
{
    Box::new(
        body.concat2()
            .map_err(|e| FailureError::from(e.context("Failed to read request body").context(Error::Parse)))
            .and_then(|chunk| {
                serde_json::from_slice::<T>(&chunk).map_err(|e| {
                    let body = String::from_utf8_lossy(&chunk).into_owned();
                    e.context(format!("Parsing body failed, body: {}", body)).context(Error::Parse).into()
                })
            }),
    )
}

/// Decodes a query string into (key, value) pairs, keeping order and repeats
pub fn query_params(query: Option<&str>) -> Vec<(String, String)> {
    query
        .map(|query| form_urlencoded::parse(query.as_bytes()).into_owned().collect())
        .unwrap_or_default()
}

/// Caller id as forwarded by the gateway in the `Authorization` header
pub fn user_id_from_header(value: Option<&str>) -> Option<i32> {
    value.and_then(|value| value.trim().parse::<i32>().ok())
}
