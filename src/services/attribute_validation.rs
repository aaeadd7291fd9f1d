//! Validates submitted attribute values against the definitions allowed
//! for a listing.
//!
//! Every problem in the payload is collected before returning, so a
//! client can fix all of them in one round trip. Required attributes are
//! checked across the whole payload after the per item pass.
use std::collections::HashSet;

use serde_json::Value;

use crate::models::{
    AttributeDefinition, AttributeErrors, AttributeSchema, AttributeType, AttributeValueError, AttributeValueInput, TypedValue,
    ValidatedAttribute,
};

/// Validates the whole payload, returning normalized values in submission order
pub fn validate_attributes(schema: &AttributeSchema, submitted: Vec<AttributeValueInput>) -> Result<Vec<ValidatedAttribute>, AttributeErrors> {
    let mut errors = AttributeErrors::default();
    let mut validated = vec![];
    let mut seen = HashSet::new();
    let mut present = HashSet::new();

    for input in submitted {
        let definition = match schema.get(input.attribute) {
            Some(definition) => definition,
            None => {
                errors.push(AttributeValueError::UnknownAttribute {
                    attribute: input.attribute,
                });
                continue;
            }
        };

        if !seen.insert(definition.id) {
            errors.push(AttributeValueError::DuplicateAttribute {
                key: definition.key.clone(),
            });
            continue;
        }

        if is_empty_value(definition.value_type, &input.value) {
            continue;
        }
        present.insert(definition.id);

        match validate_value(definition, input.value) {
            Ok(value) => validated.push(ValidatedAttribute {
                attribute: definition.id,
                value,
            }),
            Err(value_errors) => {
                for error in value_errors {
                    errors.push(error);
                }
            }
        }
    }

    let missing = schema
        .required()
        .filter(|definition| !present.contains(&definition.id))
        .map(|definition| definition.key.clone())
        .collect::<Vec<_>>();
    if !missing.is_empty() {
        errors.push(AttributeValueError::MissingRequired { keys: missing });
    }

    if errors.is_empty() {
        Ok(validated)
    } else {
        Err(errors)
    }
}

/// `null` is empty for every type, `""` for TEXT and SELECT, `[]` for MULTISELECT
fn is_empty_value(value_type: AttributeType, value: &Value) -> bool {
    match (value_type, value) {
        (_, Value::Null) => true,
        (AttributeType::Text, Value::String(s)) | (AttributeType::Select, Value::String(s)) => s.is_empty(),
        (AttributeType::Multiselect, Value::Array(items)) => items.is_empty(),
        _ => false,
    }
}

fn validate_value(definition: &AttributeDefinition, value: Value) -> Result<TypedValue, Vec<AttributeValueError>> {
    let type_mismatch = |expected| {
        vec![AttributeValueError::TypeMismatch {
            key: definition.key.clone(),
            expected,
        }]
    };

    match definition.value_type {
        AttributeType::Text => match value {
            Value::String(text) => Ok(TypedValue::Text(text)),
            _ => Err(type_mismatch("string")),
        },
        AttributeType::Number | AttributeType::Range => match value.as_f64() {
            Some(number) => validate_bounds(definition, number).map(|_| TypedValue::Number(number)),
            None => Err(type_mismatch("number")),
        },
        AttributeType::Boolean => match value {
            Value::Bool(flag) => Ok(TypedValue::Bool(flag)),
            _ => Err(type_mismatch("boolean")),
        },
        AttributeType::Select => match option_key(&value) {
            Some(key) => {
                if definition.allows_option(&key) {
                    Ok(TypedValue::OptionKey(key))
                } else {
                    Err(vec![AttributeValueError::OptionNotAllowed {
                        key: definition.key.clone(),
                        value: key,
                    }])
                }
            }
            None => Err(type_mismatch("string or integer option key")),
        },
        AttributeType::Multiselect => match value {
            Value::Array(items) => validate_options(definition, &items),
            _ => Err(type_mismatch("list of option keys")),
        },
    }
}

fn validate_bounds(definition: &AttributeDefinition, number: f64) -> Result<(), Vec<AttributeValueError>> {
    let below = definition.min_number.map_or(false, |min| number < min);
    let above = definition.max_number.map_or(false, |max| number > max);
    if below || above {
        Err(vec![AttributeValueError::RangeViolation {
            key: definition.key.clone(),
            value: number,
            min: definition.min_number,
            max: definition.max_number,
        }])
    } else {
        Ok(())
    }
}

/// Each element is checked on its own. Repeated option keys are kept once.
fn validate_options(definition: &AttributeDefinition, items: &[Value]) -> Result<TypedValue, Vec<AttributeValueError>> {
    let mut keys: Vec<String> = vec![];
    let mut errors = vec![];

    for item in items {
        match option_key(item) {
            Some(key) => {
                if !definition.allows_option(&key) {
                    errors.push(AttributeValueError::OptionNotAllowed {
                        key: definition.key.clone(),
                        value: key,
                    });
                } else if !keys.contains(&key) {
                    keys.push(key);
                }
            }
            None => errors.push(AttributeValueError::TypeMismatch {
                key: definition.key.clone(),
                expected: "string or integer option key",
            }),
        }
    }

    if errors.is_empty() {
        Ok(TypedValue::MultiOptionKey(keys))
    } else {
        Err(errors)
    }
}

/// Stringified option key, only strings and integers qualify
fn option_key(value: &Value) -> Option<String> {
    match *value {
        Value::String(ref s) => Some(s.clone()),
        Value::Number(ref n) if n.is_i64() || n.is_u64() => Some(n.to_string()),
        _ => None,
    }
}
