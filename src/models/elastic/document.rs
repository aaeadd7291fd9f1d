//! Document stored in the listings index.
//!
//! Field names here are the ones the search query compiler filters,
//! sorts and aggregates on.
use std::collections::HashMap;

use chrono::NaiveDateTime;

use crate::models::{AttributeDefinition, AttributeValueRow, Listing};

/// One physical attribute value row, stored as a nested object
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct AttrDocument {
    pub key: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value_text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value_number: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value_bool: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value_option_key: Option<String>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct ListingDocument {
    pub id: i32,
    pub title: String,
    pub description: String,
    pub price: Option<f64>,
    pub currency: String,
    pub condition: String,
    /// Category slugs from the root down to the listing category
    pub category_path: Vec<String>,
    pub location_path: Vec<String>,
    pub refreshed_at: NaiveDateTime,
    pub created_at: NaiveDateTime,
    pub attrs: Vec<AttrDocument>,
}

impl ListingDocument {
    /// Rows whose attribute is not among `definitions` are left out
    pub fn new(
        listing: &Listing,
        category_path: Vec<String>,
        location_path: Vec<String>,
        rows: &[AttributeValueRow],
        definitions: &[AttributeDefinition],
    ) -> Self {
        let keys = definitions.iter().map(|d| (d.id, d.key.as_str())).collect::<HashMap<_, _>>();
        let attrs = rows
            .iter()
            .filter_map(|row| {
                keys.get(&row.attribute_id).map(|key| AttrDocument {
                    key: key.to_string(),
                    value_text: row.value_text.clone(),
                    value_number: row.value_number,
                    value_bool: row.value_bool,
                    value_option_key: row.value_option_key.clone(),
                })
            })
            .collect();

        Self {
            id: listing.id,
            title: listing.title.clone(),
            description: listing.description.clone(),
            price: listing.price_amount,
            currency: listing.price_currency.clone(),
            condition: listing.condition.clone(),
            category_path,
            location_path,
            refreshed_at: listing.refreshed_at,
            created_at: listing.created_at,
            attrs,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::AttributeType;

    #[test]
    fn test_document_has_row_per_value() {
        let now = chrono::Utc::now().naive_utc();
        let listing = Listing {
            id: 5,
            user_id: 1,
            category_id: 3,
            location_id: None,
            title: "Phone".to_string(),
            description: String::new(),
            price_amount: Some(250.0),
            price_currency: "USD".to_string(),
            condition: "used".to_string(),
            status: "active".to_string(),
            lat: None,
            lon: None,
            created_at: now,
            refreshed_at: now,
        };
        let definitions = vec![AttributeDefinition {
            id: 1,
            category_id: 2,
            key: "colors".to_string(),
            label: "Colors".to_string(),
            value_type: AttributeType::Multiselect,
            options: vec![],
            min_number: None,
            max_number: None,
            is_required: false,
        }];
        let row = |id: i32, attribute_id: i32, key: &str| AttributeValueRow {
            id,
            listing_id: 5,
            attribute_id,
            value_text: None,
            value_number: None,
            value_bool: None,
            value_option_key: Some(key.to_string()),
        };
        let rows = vec![row(1, 1, "red"), row(2, 1, "blue"), row(3, 9, "stale")];

        let document = ListingDocument::new(
            &listing,
            vec!["electronics".to_string(), "phones".to_string()],
            vec![],
            &rows,
            &definitions,
        );

        assert_eq!(document.attrs.len(), 2);
        let json = serde_json::to_value(&document).unwrap();
        assert_eq!(json["attrs"][0], json!({"key": "colors", "value_option_key": "red"}));
        assert_eq!(json["category_path"], json!(["electronics", "phones"]));
        assert_eq!(json["price"], json!(250.0));
    }
}
