//! Module containing listing model for query, insert, update
use chrono::NaiveDateTime;
use validator::Validate;

use crate::models::validation_rules::*;
use crate::models::{AttributeValueInput, GroupedAttributeValue};
use crate::schema::listings;

pub const LISTING_STATUS_ACTIVE: &str = "active";
pub const DEFAULT_CURRENCY: &str = "USD";
pub const DEFAULT_CONDITION: &str = "used";

/// Payload for querying listings
#[derive(Debug, Serialize, Deserialize, Queryable, Identifiable, Clone, PartialEq)]
#[table_name = "listings"]
pub struct Listing {
    pub id: i32,
    pub user_id: i32,
    pub category_id: i32,
    pub location_id: Option<i32>,
    pub title: String,
    pub description: String,
    pub price_amount: Option<f64>,
    pub price_currency: String,
    pub condition: String,
    pub status: String,
    pub lat: Option<f64>,
    pub lon: Option<f64>,
    pub created_at: NaiveDateTime,
    pub refreshed_at: NaiveDateTime,
}

/// Row inserted for a new listing
#[derive(Debug, Serialize, Deserialize, Insertable, Clone)]
#[table_name = "listings"]
pub struct NewListing {
    pub user_id: i32,
    pub category_id: i32,
    pub location_id: Option<i32>,
    pub title: String,
    pub description: String,
    pub price_amount: Option<f64>,
    pub price_currency: String,
    pub condition: String,
    pub status: String,
    pub lat: Option<f64>,
    pub lon: Option<f64>,
    pub created_at: NaiveDateTime,
    pub refreshed_at: NaiveDateTime,
}

/// Payload for creating listings
#[derive(Debug, Serialize, Deserialize, Validate, Clone)]
pub struct NewListingPayload {
    pub category_id: i32,
    pub location_id: Option<i32>,
    #[validate(length(min = "1", max = "200"))]
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[validate(range(min = "0.0", max = "1000000000.0"))]
    pub price_amount: Option<f64>,
    #[validate(custom = "validate_currency")]
    pub price_currency: Option<String>,
    #[validate(custom = "validate_condition")]
    pub condition: Option<String>,
    #[validate(range(min = "-90.0", max = "90.0"))]
    pub lat: Option<f64>,
    #[validate(range(min = "-180.0", max = "180.0"))]
    pub lon: Option<f64>,
    #[serde(default)]
    pub attributes: Vec<AttributeValueInput>,
}

impl NewListingPayload {
    pub fn into_new_listing(self, user_id: i32, now: NaiveDateTime) -> (NewListing, Vec<AttributeValueInput>) {
        let listing = NewListing {
            user_id,
            category_id: self.category_id,
            location_id: self.location_id,
            title: self.title,
            description: self.description,
            price_amount: self.price_amount,
            price_currency: self.price_currency.unwrap_or_else(|| DEFAULT_CURRENCY.to_string()),
            condition: self.condition.unwrap_or_else(|| DEFAULT_CONDITION.to_string()),
            status: LISTING_STATUS_ACTIVE.to_string(),
            lat: self.lat,
            lon: self.lon,
            created_at: now,
            refreshed_at: now,
        };
        (listing, self.attributes)
    }
}

/// Column changes applied by an update, absent fields are left as is
#[derive(Default, Debug, Serialize, Deserialize, AsChangeset, Clone)]
#[table_name = "listings"]
pub struct UpdateListing {
    pub category_id: Option<i32>,
    pub location_id: Option<i32>,
    pub title: Option<String>,
    pub description: Option<String>,
    pub price_amount: Option<f64>,
    pub price_currency: Option<String>,
    pub condition: Option<String>,
    pub lat: Option<f64>,
    pub lon: Option<f64>,
}

impl UpdateListing {
    pub fn is_empty(&self) -> bool {
        self.category_id.is_none()
            && self.location_id.is_none()
            && self.title.is_none()
            && self.description.is_none()
            && self.price_amount.is_none()
            && self.price_currency.is_none()
            && self.condition.is_none()
            && self.lat.is_none()
            && self.lon.is_none()
    }
}

/// Payload for updating listings. When `attributes` is present
/// the stored attribute values are replaced as a whole.
#[derive(Default, Debug, Serialize, Deserialize, Validate, Clone)]
pub struct UpdateListingPayload {
    pub category_id: Option<i32>,
    pub location_id: Option<i32>,
    #[validate(length(min = "1", max = "200"))]
    pub title: Option<String>,
    pub description: Option<String>,
    #[validate(range(min = "0.0", max = "1000000000.0"))]
    pub price_amount: Option<f64>,
    #[validate(custom = "validate_currency")]
    pub price_currency: Option<String>,
    #[validate(custom = "validate_condition")]
    pub condition: Option<String>,
    #[validate(range(min = "-90.0", max = "90.0"))]
    pub lat: Option<f64>,
    #[validate(range(min = "-180.0", max = "180.0"))]
    pub lon: Option<f64>,
    pub attributes: Option<Vec<AttributeValueInput>>,
}

impl UpdateListingPayload {
    pub fn split(self) -> (UpdateListing, Option<Vec<AttributeValueInput>>) {
        let update = UpdateListing {
            category_id: self.category_id,
            location_id: self.location_id,
            title: self.title,
            description: self.description,
            price_amount: self.price_amount,
            price_currency: self.price_currency,
            condition: self.condition,
            lat: self.lat,
            lon: self.lon,
        };
        (update, self.attributes)
    }
}

/// Listing together with its attribute values ordered by attribute id
#[derive(Debug, Serialize, Clone, PartialEq)]
pub struct ListingWithAttributes {
    #[serde(flatten)]
    pub listing: Listing,
    pub attributes: Vec<GroupedAttributeValue>,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct RefreshedListing {
    pub status: String,
    pub refreshed_at: NaiveDateTime,
}

impl RefreshedListing {
    pub fn new(refreshed_at: NaiveDateTime) -> Self {
        Self {
            status: "refreshed".to_string(),
            refreshed_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use validator::Validate;

    use super::*;

    fn payload() -> NewListingPayload {
        serde_json::from_value(json!({
            "category_id": 3,
            "title": "Phone",
            "price_amount": 100.0,
            "attributes": [{"attribute": 1, "value": 32}]
        }))
        .unwrap()
    }

    #[test]
    fn test_payload_defaults() {
        let payload = payload();
        assert!(payload.validate().is_ok());
        let now = chrono::Utc::now().naive_utc();
        let (listing, attributes) = payload.into_new_listing(7, now);
        assert_eq!(listing.user_id, 7);
        assert_eq!(listing.price_currency, DEFAULT_CURRENCY);
        assert_eq!(listing.condition, DEFAULT_CONDITION);
        assert_eq!(listing.status, LISTING_STATUS_ACTIVE);
        assert_eq!(listing.created_at, listing.refreshed_at);
        assert_eq!(attributes.len(), 1);
    }

    #[test]
    fn test_payload_field_errors() {
        let mut payload = payload();
        payload.title = String::new();
        payload.price_amount = Some(-1.0);
        payload.lat = Some(91.0);
        payload.condition = Some("Like New!".to_string());
        let errors = payload.validate().unwrap_err();
        let fields = errors.field_errors();
        assert!(fields.contains_key("title"));
        assert!(fields.contains_key("price_amount"));
        assert!(fields.contains_key("lat"));
        assert!(fields.contains_key("condition"));
    }

    #[test]
    fn test_empty_update() {
        let (update, attributes) = UpdateListingPayload::default().split();
        assert!(update.is_empty());
        assert!(attributes.is_none());

        let payload: UpdateListingPayload = serde_json::from_value(json!({"title": "New", "attributes": []})).unwrap();
        let (update, attributes) = payload.split();
        assert!(!update.is_empty());
        assert_eq!(attributes, Some(vec![]));
    }
}
