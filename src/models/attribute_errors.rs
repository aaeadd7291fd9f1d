use std::borrow::Cow;
use std::collections::{BTreeMap, HashMap};
use std::fmt;

use serde::ser::{Serialize, Serializer};
use serde_json;
use validator::ValidationError;

/// Field under which errors without a single attribute key are reported
pub const ATTRIBUTES_FIELD: &str = "attributes";

/// Why a submitted attribute value was rejected
#[derive(Debug, Clone, PartialEq)]
pub enum AttributeValueError {
    UnknownAttribute { attribute: i32 },
    TypeMismatch { key: String, expected: &'static str },
    OptionNotAllowed { key: String, value: String },
    RangeViolation { key: String, value: f64, min: Option<f64>, max: Option<f64> },
    DuplicateAttribute { key: String },
    MissingRequired { keys: Vec<String> },
}

impl AttributeValueError {
    /// Field the error is reported under
    pub fn field(&self) -> String {
        match *self {
            AttributeValueError::UnknownAttribute { .. } | AttributeValueError::MissingRequired { .. } => ATTRIBUTES_FIELD.to_string(),
            AttributeValueError::TypeMismatch { ref key, .. }
            | AttributeValueError::OptionNotAllowed { ref key, .. }
            | AttributeValueError::RangeViolation { ref key, .. }
            | AttributeValueError::DuplicateAttribute { ref key } => key.clone(),
        }
    }

    pub fn code(&self) -> &'static str {
        match *self {
            AttributeValueError::UnknownAttribute { .. } => "unknown_attribute",
            AttributeValueError::TypeMismatch { .. } => "type_mismatch",
            AttributeValueError::OptionNotAllowed { .. } => "option_not_allowed",
            AttributeValueError::RangeViolation { .. } => "range_violation",
            AttributeValueError::DuplicateAttribute { .. } => "duplicate_attribute",
            AttributeValueError::MissingRequired { .. } => "missing_required",
        }
    }

    fn params(&self) -> HashMap<Cow<'static, str>, serde_json::Value> {
        let mut params = HashMap::new();
        match *self {
            AttributeValueError::UnknownAttribute { attribute } => {
                params.insert(Cow::from("attribute"), json!(attribute));
            }
            AttributeValueError::TypeMismatch { expected, .. } => {
                params.insert(Cow::from("expected"), json!(expected));
            }
            AttributeValueError::OptionNotAllowed { ref value, .. } => {
                params.insert(Cow::from("value"), json!(value));
            }
            AttributeValueError::RangeViolation { value, min, max, .. } => {
                params.insert(Cow::from("value"), json!(value));
                if let Some(min) = min {
                    params.insert(Cow::from("min"), json!(min));
                }
                if let Some(max) = max {
                    params.insert(Cow::from("max"), json!(max));
                }
            }
            AttributeValueError::DuplicateAttribute { .. } => {}
            AttributeValueError::MissingRequired { ref keys } => {
                params.insert(Cow::from("keys"), json!(keys));
            }
        }
        params
    }

    pub fn to_validation_error(&self) -> ValidationError {
        ValidationError {
            code: Cow::from(self.code()),
            message: Some(Cow::from(self.to_string())),
            params: self.params(),
        }
    }
}

impl fmt::Display for AttributeValueError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            AttributeValueError::UnknownAttribute { attribute } => {
                write!(f, "Attribute {} is not defined for the listing category", attribute)
            }
            AttributeValueError::TypeMismatch { ref key, expected } => write!(f, "Attribute {} expects {}", key, expected),
            AttributeValueError::OptionNotAllowed { ref key, ref value } => {
                write!(f, "Option {} is not allowed for attribute {}", value, key)
            }
            AttributeValueError::RangeViolation { ref key, value, min, max } => match (min, max) {
                (Some(min), Some(max)) => write!(f, "Attribute {} value {} is outside [{}, {}]", key, value, min, max),
                (Some(min), None) => write!(f, "Attribute {} value {} is less than {}", key, value, min),
                (None, Some(max)) => write!(f, "Attribute {} value {} is greater than {}", key, value, max),
                (None, None) => write!(f, "Attribute {} value {} is out of range", key, value),
            },
            AttributeValueError::DuplicateAttribute { ref key } => write!(f, "Attribute {} is submitted more than once", key),
            AttributeValueError::MissingRequired { ref keys } => write!(f, "Missing required attributes: {}", keys.join(", ")),
        }
    }
}

/// All errors found while validating one attribute payload
#[derive(Debug, Clone, PartialEq, Default)]
pub struct AttributeErrors(pub Vec<AttributeValueError>);

impl AttributeErrors {
    pub fn push(&mut self, error: AttributeValueError) {
        self.0.push(error);
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn errors(&self) -> &[AttributeValueError] {
        &self.0
    }

    /// Errors grouped by the field they are reported under
    pub fn field_errors(&self) -> BTreeMap<String, Vec<ValidationError>> {
        let mut fields = BTreeMap::<String, Vec<ValidationError>>::new();
        for error in &self.0 {
            fields.entry(error.field()).or_insert_with(Vec::new).push(error.to_validation_error());
        }
        fields
    }
}

impl fmt::Display for AttributeErrors {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let messages = self.0.iter().map(|e| e.to_string()).collect::<Vec<_>>();
        write!(f, "{}", messages.join("; "))
    }
}

impl Serialize for AttributeErrors {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        self.field_errors().serialize(serializer)
    }
}
