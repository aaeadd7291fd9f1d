//! Listings index client, talks to the search backend over its REST api
use std::time::Duration;

use failure::Error as FailureError;
use failure::Fail;
use reqwest::{self, StatusCode};
use serde_json;

use super::{log_elastic_req, log_elastic_resp};
use crate::errors::Error;
use crate::models::{IndexResponse, ListingDocument, SearchResponse};

pub trait ListingsElastic {
    /// Whether the backend answers at all
    fn ping(&self) -> Result<bool, FailureError>;

    /// Creates the index with its mapping when missing
    fn ensure_index(&self) -> Result<(), FailureError>;

    /// Runs a compiled search request against the listings index
    fn search(&self, body: serde_json::Value) -> Result<SearchResponse, FailureError>;

    /// Puts one listing document, replacing the previous version
    fn index_listing(&self, document: &ListingDocument) -> Result<(), FailureError>;
}

/// Index mapping, attribute rows are nested so values of different rows never cross-match
pub fn listings_mapping() -> serde_json::Value {
    json!({
        "mappings": {
            "properties": {
                "id": { "type": "integer" },
                "title": { "type": "text" },
                "description": { "type": "text" },
                "price": { "type": "double" },
                "currency": { "type": "keyword" },
                "condition": { "type": "keyword" },
                "category_path": { "type": "keyword" },
                "location_path": { "type": "keyword" },
                "refreshed_at": { "type": "date" },
                "created_at": { "type": "date" },
                "attrs": {
                    "type": "nested",
                    "properties": {
                        "key": { "type": "keyword" },
                        "value_text": { "type": "keyword" },
                        "value_number": { "type": "double" },
                        "value_bool": { "type": "boolean" },
                        "value_option_key": { "type": "keyword" }
                    }
                }
            }
        }
    })
}

/// Blocking client, calls are expected to run on the cpu pool
pub struct ListingsElasticImpl {
    client: reqwest::Client,
    address: String,
    index: String,
}

impl ListingsElasticImpl {
    pub fn new(address: String, index: String, timeout: Duration) -> Result<Self, FailureError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| e.context("Building search client error occurred").context(Error::SearchUnavailable))?;
        Ok(Self { client, address, index })
    }

    fn index_url(&self) -> String {
        format!("http://{}/{}", self.address, self.index)
    }
}

impl ListingsElastic for ListingsElasticImpl {
    fn ping(&self) -> Result<bool, FailureError> {
        let url = format!("http://{}/", self.address);
        debug!("Pinging search backend at {}.", url);
        self.client
            .head(&url)
            .send()
            .map(|res| res.status().is_success())
            .map_err(|e| e.context(Error::SearchUnavailable).into())
    }

    fn ensure_index(&self) -> Result<(), FailureError> {
        let url = self.index_url();
        let exists = self
            .client
            .head(&url)
            .send()
            .map_err(|e| e.context(Error::SearchUnavailable))?
            .status();
        if exists.is_success() {
            return Ok(());
        }
        if exists != StatusCode::NOT_FOUND {
            return Err(format_err!("Checking index {} returned {}", self.index, exists)
                .context(Error::SearchUnavailable)
                .into());
        }

        info!("Creating search index {}.", self.index);
        let mut res = self
            .client
            .put(&url)
            .json(&listings_mapping())
            .send()
            .map_err(|e| e.context(Error::SearchUnavailable))?;
        if res.status().is_success() {
            Ok(())
        } else {
            let text = res.text().unwrap_or_default();
            Err(format_err!("Creating index {} failed: {}", self.index, text)
                .context(Error::SearchUnavailable)
                .into())
        }
    }

    fn search(&self, body: serde_json::Value) -> Result<SearchResponse, FailureError> {
        let url = format!("{}/_search", self.index_url());
        log_elastic_req(&body);
        let mut res = self
            .client
            .post(&url)
            .json(&body)
            .send()
            .map_err(|e| e.context(Error::SearchUnavailable))?;
        if !res.status().is_success() {
            let text = res.text().unwrap_or_default();
            return Err(format_err!("Search in index {} returned {}: {}", self.index, res.status(), text)
                .context(Error::SearchUnavailable)
                .into());
        }
        let response = res
            .json::<SearchResponse>()
            .map_err(|e| e.context("Parsing search response error occurred").context(Error::SearchUnavailable))?;
        log_elastic_resp(&response);
        Ok(response)
    }

    fn index_listing(&self, document: &ListingDocument) -> Result<(), FailureError> {
        let url = format!("{}/_doc/{}", self.index_url(), document.id);
        debug!("Indexing listing {} at {}.", document.id, url);
        let mut res = self
            .client
            .put(&url)
            .json(document)
            .send()
            .map_err(|e| e.context(Error::SearchUnavailable))?;
        if !res.status().is_success() {
            let text = res.text().unwrap_or_default();
            return Err(format_err!("Indexing listing {} returned {}: {}", document.id, res.status(), text)
                .context(Error::SearchUnavailable)
                .into());
        }
        let response = res
            .json::<IndexResponse>()
            .map_err(|e| e.context(format!("Parsing index response for listing {} error occurred", document.id)))?;
        debug!(
            "Listing {} {} in index {}.",
            document.id,
            if response.is_created() { "created" } else { "updated" },
            response.index
        );
        Ok(())
    }
}
