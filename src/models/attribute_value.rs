//! EAV model attribute values.
//!
//! One logical attribute value maps to one physical row, except MULTISELECT
//! which fans out into one row per option key. `expand_values` and
//! `group_rows` are the two directions of that mapping.
use std::collections::BTreeMap;

use serde_json;

use crate::models::{AttributeDefinition, AttributeType};
use crate::schema::listing_attribute_values;

/// Attribute value as submitted by the client, not validated yet
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AttributeValueInput {
    pub attribute: i32,
    #[serde(default)]
    pub value: serde_json::Value,
}

/// Normalized attribute value tagged by its physical representation
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum TypedValue {
    Text(String),
    Number(f64),
    Bool(bool),
    OptionKey(String),
    MultiOptionKey(Vec<String>),
}

impl TypedValue {
    /// Physical rows holding this value for `listing_id`
    pub fn into_rows(self, listing_id: i32, attribute_id: i32) -> Vec<NewAttributeValueRow> {
        let row = NewAttributeValueRow::empty(listing_id, attribute_id);
        match self {
            TypedValue::Text(text) => vec![NewAttributeValueRow {
                value_text: Some(text),
                ..row
            }],
            TypedValue::Number(number) => vec![NewAttributeValueRow {
                value_number: Some(number),
                ..row
            }],
            TypedValue::Bool(flag) => vec![NewAttributeValueRow {
                value_bool: Some(flag),
                ..row
            }],
            TypedValue::OptionKey(key) => vec![NewAttributeValueRow {
                value_option_key: Some(key),
                ..row
            }],
            TypedValue::MultiOptionKey(keys) => keys
                .into_iter()
                .map(|key| NewAttributeValueRow {
                    value_option_key: Some(key),
                    ..row.clone()
                })
                .collect(),
        }
    }
}

/// Attribute value that passed validation against its definition
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ValidatedAttribute {
    pub attribute: i32,
    pub value: TypedValue,
}

/// Physical attribute value row, exactly one `value_*` column is set
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Queryable, Identifiable)]
#[table_name = "listing_attribute_values"]
pub struct AttributeValueRow {
    pub id: i32,
    pub listing_id: i32,
    pub attribute_id: i32,
    pub value_text: Option<String>,
    pub value_number: Option<f64>,
    pub value_bool: Option<bool>,
    pub value_option_key: Option<String>,
}

/// Payload for inserting attribute value rows
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Insertable)]
#[table_name = "listing_attribute_values"]
pub struct NewAttributeValueRow {
    pub listing_id: i32,
    pub attribute_id: i32,
    pub value_text: Option<String>,
    pub value_number: Option<f64>,
    pub value_bool: Option<bool>,
    pub value_option_key: Option<String>,
}

impl NewAttributeValueRow {
    fn empty(listing_id: i32, attribute_id: i32) -> Self {
        Self {
            listing_id,
            attribute_id,
            value_text: None,
            value_number: None,
            value_bool: None,
            value_option_key: None,
        }
    }
}

/// One logical attribute value of a listing, rebuilt from its rows
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GroupedAttributeValue {
    pub attribute: i32,
    pub key: String,
    pub label: String,
    #[serde(rename = "type")]
    pub value_type: AttributeType,
    pub value: TypedValue,
}

/// Expands validated values into the rows to insert, in submission order
pub fn expand_values(listing_id: i32, values: Vec<ValidatedAttribute>) -> Vec<NewAttributeValueRow> {
    values
        .into_iter()
        .flat_map(|v| v.value.into_rows(listing_id, v.attribute))
        .collect()
}

/// Rebuilds one logical value per attribute from rows ordered by insertion.
/// Rows of unknown attributes or with the wrong column populated are skipped.
pub fn group_rows<'a, I>(rows: &[AttributeValueRow], definitions: I) -> BTreeMap<i32, GroupedAttributeValue>
where
    I: IntoIterator<Item = &'a AttributeDefinition>,
{
    let definitions = definitions.into_iter().map(|d| (d.id, d)).collect::<BTreeMap<_, _>>();
    let mut grouped = BTreeMap::<i32, GroupedAttributeValue>::new();

    for row in rows {
        let definition = match definitions.get(&row.attribute_id) {
            Some(definition) => definition,
            None => {
                warn!("Attribute value row {} references unknown attribute {}", row.id, row.attribute_id);
                continue;
            }
        };
        let value = match row_value(definition.value_type, row) {
            Some(value) => value,
            None => {
                warn!(
                    "Attribute value row {} has no value for attribute {} of type {}",
                    row.id, definition.key, definition.value_type
                );
                continue;
            }
        };

        match value {
            TypedValue::MultiOptionKey(mut keys) => {
                let entry = grouped
                    .entry(definition.id)
                    .or_insert_with(|| grouped_value(definition, TypedValue::MultiOptionKey(vec![])));
                if let TypedValue::MultiOptionKey(ref mut existing) = entry.value {
                    existing.append(&mut keys);
                }
            }
            single => {
                grouped.insert(definition.id, grouped_value(definition, single));
            }
        }
    }

    grouped
}

fn grouped_value(definition: &AttributeDefinition, value: TypedValue) -> GroupedAttributeValue {
    GroupedAttributeValue {
        attribute: definition.id,
        key: definition.key.clone(),
        label: definition.label.clone(),
        value_type: definition.value_type,
        value,
    }
}

fn row_value(value_type: AttributeType, row: &AttributeValueRow) -> Option<TypedValue> {
    match value_type {
        AttributeType::Text => row.value_text.clone().map(TypedValue::Text),
        AttributeType::Number | AttributeType::Range => row.value_number.map(TypedValue::Number),
        AttributeType::Boolean => row.value_bool.map(TypedValue::Bool),
        AttributeType::Select => row.value_option_key.clone().map(TypedValue::OptionKey),
        AttributeType::Multiselect => row.value_option_key.clone().map(|key| TypedValue::MultiOptionKey(vec![key])),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn definition(id: i32, key: &str, value_type: AttributeType) -> AttributeDefinition {
        AttributeDefinition {
            id,
            category_id: 1,
            key: key.to_string(),
            label: key.to_uppercase(),
            value_type,
            options: vec![],
            min_number: None,
            max_number: None,
            is_required: false,
        }
    }

    fn stored(rows: Vec<NewAttributeValueRow>) -> Vec<AttributeValueRow> {
        rows.into_iter()
            .enumerate()
            .map(|(i, row)| AttributeValueRow {
                id: i as i32 + 1,
                listing_id: row.listing_id,
                attribute_id: row.attribute_id,
                value_text: row.value_text,
                value_number: row.value_number,
                value_bool: row.value_bool,
                value_option_key: row.value_option_key,
            })
            .collect()
    }

    #[test]
    fn test_multiselect_fans_out() {
        let rows = TypedValue::MultiOptionKey(vec!["red".to_string(), "blue".to_string()]).into_rows(7, 3);
        assert_eq!(rows.len(), 2);
        assert!(rows.iter().all(|r| r.listing_id == 7 && r.attribute_id == 3));
        assert_eq!(rows[0].value_option_key, Some("red".to_string()));
        assert_eq!(rows[1].value_option_key, Some("blue".to_string()));
        assert!(rows.iter().all(|r| r.value_text.is_none() && r.value_number.is_none() && r.value_bool.is_none()));
    }

    #[test]
    fn test_single_value_populates_one_column() {
        let rows = TypedValue::Number(32.0).into_rows(1, 2);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].value_number, Some(32.0));
        assert!(rows[0].value_text.is_none() && rows[0].value_bool.is_none() && rows[0].value_option_key.is_none());
    }

    #[test]
    fn test_expand_then_group_restores_values() {
        let definitions = vec![
            definition(1, "brand", AttributeType::Text),
            definition(2, "storage_gb", AttributeType::Number),
            definition(3, "colors", AttributeType::Multiselect),
            definition(4, "unlocked", AttributeType::Boolean),
            definition(5, "condition_grade", AttributeType::Select),
        ];
        let values = vec![
            ValidatedAttribute {
                attribute: 3,
                value: TypedValue::MultiOptionKey(vec!["green".to_string(), "black".to_string(), "red".to_string()]),
            },
            ValidatedAttribute {
                attribute: 1,
                value: TypedValue::Text("Acme".to_string()),
            },
            ValidatedAttribute {
                attribute: 2,
                value: TypedValue::Number(64.0),
            },
            ValidatedAttribute {
                attribute: 4,
                value: TypedValue::Bool(false),
            },
            ValidatedAttribute {
                attribute: 5,
                value: TypedValue::OptionKey("a".to_string()),
            },
        ];

        let rows = stored(expand_values(10, values.clone()));
        assert_eq!(rows.len(), 7);

        let grouped = group_rows(&rows, &definitions);
        assert_eq!(grouped.len(), values.len());
        for value in values {
            let restored = &grouped[&value.attribute];
            assert_eq!(restored.value, value.value);
        }
        assert_eq!(grouped[&3].key, "colors");
        assert_eq!(grouped[&3].label, "COLORS");
        assert_eq!(grouped[&3].value_type, AttributeType::Multiselect);
    }

    #[test]
    fn test_group_skips_orphan_rows() {
        let rows = stored(vec![
            NewAttributeValueRow {
                value_text: Some("left over".to_string()),
                ..NewAttributeValueRow::empty(1, 99)
            },
            NewAttributeValueRow {
                value_bool: Some(true),
                ..NewAttributeValueRow::empty(1, 1)
            },
        ]);
        let definitions = vec![definition(1, "brand", AttributeType::Text)];
        let grouped = group_rows(&rows, &definitions);
        assert!(grouped.is_empty());
    }

    #[test]
    fn test_grouped_value_serializes_plain_value() {
        let grouped = grouped_value(
            &definition(3, "colors", AttributeType::Multiselect),
            TypedValue::MultiOptionKey(vec!["red".to_string()]),
        );
        let json = serde_json::to_value(&grouped).unwrap();
        assert_eq!(
            json,
            json!({"attribute": 3, "key": "colors", "label": "COLORS", "type": "MULTISELECT", "value": ["red"]})
        );
    }
}
