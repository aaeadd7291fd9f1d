extern crate listings_lib;
#[macro_use]
extern crate serde_json;

use listings_lib::models::*;
use listings_lib::services::attribute_validation::validate_attributes;

fn definition(id: i32, key: &str, value_type: AttributeType) -> AttributeDefinition {
    AttributeDefinition {
        id,
        category_id: 1,
        key: key.to_string(),
        label: key.to_string(),
        value_type,
        options: vec![],
        min_number: None,
        max_number: None,
        is_required: false,
    }
}

fn schema() -> AttributeSchema {
    AttributeSchema::new(vec![
        AttributeDefinition {
            min_number: Some(1.0),
            max_number: Some(10.0),
            is_required: true,
            ..definition(1, "rooms", AttributeType::Number)
        },
        AttributeDefinition {
            options: vec!["gas".to_string(), "electric".to_string()],
            ..definition(2, "heating", AttributeType::Select)
        },
        AttributeDefinition {
            options: vec!["balcony".to_string(), "garden".to_string(), "garage".to_string()],
            ..definition(3, "extras", AttributeType::Multiselect)
        },
        definition(4, "furnished", AttributeType::Boolean),
    ])
}

fn input(attribute: i32, value: serde_json::Value) -> AttributeValueInput {
    AttributeValueInput { attribute, value }
}

#[test]
fn valid_payload_is_typed() {
    let validated = validate_attributes(
        &schema(),
        vec![
            input(1, json!(3)),
            input(2, json!("gas")),
            input(3, json!(["garden", "balcony"])),
            input(4, json!(true)),
        ],
    )
    .unwrap();

    let values = validated.into_iter().map(|v| (v.attribute, v.value)).collect::<Vec<_>>();
    assert_eq!(
        values,
        vec![
            (1, TypedValue::Number(3.0)),
            (2, TypedValue::OptionKey("gas".to_string())),
            (3, TypedValue::MultiOptionKey(vec!["garden".to_string(), "balcony".to_string()])),
            (4, TypedValue::Bool(true)),
        ]
    );
}

#[test]
fn every_failure_is_reported() {
    let errors = validate_attributes(
        &schema(),
        vec![input(2, json!("coal")), input(3, json!(["garden", "pool"])), input(77, json!("x"))],
    )
    .unwrap_err();

    let codes = errors.errors().iter().map(AttributeValueError::code).collect::<Vec<_>>();
    assert_eq!(codes.len(), 4);
    assert!(errors
        .errors()
        .iter()
        .any(|e| *e == AttributeValueError::MissingRequired { keys: vec!["rooms".to_string()] }));
    assert!(errors.errors().iter().any(|e| *e == AttributeValueError::UnknownAttribute { attribute: 77 }));
}

#[test]
fn errors_serialize_keyed_by_attribute() {
    let errors = validate_attributes(&schema(), vec![input(1, json!(11))]).unwrap_err();
    let serialized = serde_json::to_value(&errors).unwrap();
    assert!(serialized.get("rooms").is_some());
}
