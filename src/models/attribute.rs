//! EAV model attributes
use std::collections::HashMap;
use std::fmt;
use std::io::Write;
use std::str::FromStr;

use diesel::deserialize::{self, FromSql};
use diesel::pg::Pg;
use diesel::serialize::{self, IsNull, Output, ToSql};
use diesel::sql_types::VarChar;

use crate::schema::attributes;

/// Declared value type of an attribute, decides which physical column holds its values
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, AsExpression, FromSqlRow)]
#[sql_type = "VarChar"]
#[serde(rename_all = "UPPERCASE")]
pub enum AttributeType {
    Text,
    Number,
    Range,
    Boolean,
    Select,
    Multiselect,
}

impl AttributeType {
    pub fn as_str(&self) -> &'static str {
        match *self {
            AttributeType::Text => "TEXT",
            AttributeType::Number => "NUMBER",
            AttributeType::Range => "RANGE",
            AttributeType::Boolean => "BOOLEAN",
            AttributeType::Select => "SELECT",
            AttributeType::Multiselect => "MULTISELECT",
        }
    }

    /// NUMBER and RANGE share storage and bound checks
    pub fn is_numeric(&self) -> bool {
        match *self {
            AttributeType::Number | AttributeType::Range => true,
            _ => false,
        }
    }
}

impl fmt::Display for AttributeType {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for AttributeType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "TEXT" => Ok(AttributeType::Text),
            "NUMBER" => Ok(AttributeType::Number),
            "RANGE" => Ok(AttributeType::Range),
            "BOOLEAN" => Ok(AttributeType::Boolean),
            "SELECT" => Ok(AttributeType::Select),
            "MULTISELECT" => Ok(AttributeType::Multiselect),
            other => Err(format!("Unrecognized attribute type: {}", other)),
        }
    }
}

impl ToSql<VarChar, Pg> for AttributeType {
    fn to_sql<W: Write>(&self, out: &mut Output<W, Pg>) -> serialize::Result {
        out.write_all(self.as_str().as_bytes())?;
        Ok(IsNull::No)
    }
}

impl FromSql<VarChar, Pg> for AttributeType {
    fn from_sql(bytes: Option<&[u8]>) -> deserialize::Result<Self> {
        let raw = <String as FromSql<VarChar, Pg>>::from_sql(bytes)?;
        raw.parse::<AttributeType>().map_err(|e| e.into())
    }
}

/// Attribute defined on a category and inherited by all of its descendants
#[derive(Debug, Serialize, Deserialize, Queryable, Identifiable, Clone, PartialEq)]
#[table_name = "attributes"]
pub struct AttributeDefinition {
    pub id: i32,
    pub category_id: i32,
    pub key: String,
    pub label: String,
    #[serde(rename = "type")]
    pub value_type: AttributeType,
    /// Allowed option keys, empty means unconstrained
    pub options: Vec<String>,
    pub min_number: Option<f64>,
    pub max_number: Option<f64>,
    pub is_required: bool,
}

impl AttributeDefinition {
    pub fn allows_option(&self, option: &str) -> bool {
        self.options.is_empty() || self.options.iter().any(|o| o == option)
    }
}

/// Attribute definitions allowed for one listing, looked up by attribute id.
/// Definitions are kept ordered by id.
#[derive(Debug, Clone, Default)]
pub struct AttributeSchema {
    definitions: Vec<AttributeDefinition>,
    positions: HashMap<i32, usize>,
}

impl AttributeSchema {
    pub fn new(mut definitions: Vec<AttributeDefinition>) -> Self {
        definitions.sort_by_key(|d| d.id);
        definitions.dedup_by_key(|d| d.id);
        let positions = definitions.iter().enumerate().map(|(pos, d)| (d.id, pos)).collect();
        Self { definitions, positions }
    }

    pub fn get(&self, attribute_id: i32) -> Option<&AttributeDefinition> {
        self.positions.get(&attribute_id).map(|pos| &self.definitions[*pos])
    }

    pub fn definitions(&self) -> &[AttributeDefinition] {
        &self.definitions
    }

    pub fn required(&self) -> impl Iterator<Item = &AttributeDefinition> {
        self.definitions.iter().filter(|d| d.is_required)
    }

    pub fn is_empty(&self) -> bool {
        self.definitions.is_empty()
    }

    pub fn into_definitions(self) -> Vec<AttributeDefinition> {
        self.definitions
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn definition(id: i32, key: &str) -> AttributeDefinition {
        AttributeDefinition {
            id,
            category_id: 1,
            key: key.to_string(),
            label: key.to_string(),
            value_type: AttributeType::Text,
            options: vec![],
            min_number: None,
            max_number: None,
            is_required: false,
        }
    }

    #[test]
    fn test_attribute_type_names() {
        for name in &["TEXT", "NUMBER", "RANGE", "BOOLEAN", "SELECT", "MULTISELECT"] {
            let parsed = name.parse::<AttributeType>().unwrap();
            assert_eq!(parsed.as_str(), *name);
            assert_eq!(serde_json::to_string(&parsed).unwrap(), format!("\"{}\"", name));
        }
        assert!("DATE".parse::<AttributeType>().is_err());
    }

    #[test]
    fn test_schema_lookup() {
        let schema = AttributeSchema::new(vec![definition(3, "color"), definition(1, "brand")]);
        assert_eq!(schema.get(3).unwrap().key, "color");
        assert!(schema.get(2).is_none());
        let ids = schema.definitions().iter().map(|d| d.id).collect::<Vec<_>>();
        assert_eq!(ids, vec![1, 3]);
    }

    #[test]
    fn test_empty_options_are_unconstrained() {
        let mut def = definition(1, "color");
        assert!(def.allows_option("anything"));
        def.options = vec!["red".to_string()];
        assert!(def.allows_option("red"));
        assert!(!def.allows_option("blue"));
    }
}
