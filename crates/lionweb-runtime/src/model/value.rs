//! Domain values of properties.

use crate::error::RuntimeError;
use crate::schema::{Feature, PrimitiveType, ValueType};

/// A typed property value.
#[derive(Debug, Clone, PartialEq)]
pub enum PropertyValue {
    Boolean(bool),
    Integer(i64),
    String(String),
    Json(serde_json::Value),
    /// An enumeration literal, by key.
    Literal(String),
}

impl PropertyValue {
    /// Returns whether this value may be stored under the given type.
    ///
    /// Literals conform to an enumeration type only if the enumeration
    /// declares a literal with that key.
    pub fn conforms_to(&self, value_type: &ValueType) -> bool {
        match (self, value_type) {
            (PropertyValue::Boolean(_), ValueType::Primitive(PrimitiveType::Boolean))
            | (PropertyValue::Integer(_), ValueType::Primitive(PrimitiveType::Integer))
            | (PropertyValue::String(_), ValueType::Primitive(PrimitiveType::String))
            | (PropertyValue::Json(_), ValueType::Primitive(PrimitiveType::Json)) => true,
            (PropertyValue::Literal(key), ValueType::Enumeration(enumeration)) => {
                enumeration.literal(key).is_some()
            }
            _ => false,
        }
    }

    /// Checks this value against the declared type of a property.
    pub(crate) fn check_for(&self, property: &Feature) -> Result<(), RuntimeError> {
        if self.conforms_to(&property.value_type) {
            return Ok(());
        }
        match (self, &property.value_type) {
            (PropertyValue::Literal(key), ValueType::Enumeration(enumeration)) => {
                Err(RuntimeError::UnknownEnumerationLiteral {
                    enumeration: enumeration.name.clone(),
                    literal: key.clone(),
                })
            }
            _ => Err(RuntimeError::ValueTypeMismatch {
                property: property.name.clone(),
                expected: property.value_type.to_string(),
            }),
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            PropertyValue::String(s) => Some(s),
            _ => None,
        }
    }
}

impl From<bool> for PropertyValue {
    fn from(value: bool) -> Self {
        PropertyValue::Boolean(value)
    }
}

impl From<i64> for PropertyValue {
    fn from(value: i64) -> Self {
        PropertyValue::Integer(value)
    }
}

impl From<&str> for PropertyValue {
    fn from(value: &str) -> Self {
        PropertyValue::String(value.to_string())
    }
}

impl From<String> for PropertyValue {
    fn from(value: String) -> Self {
        PropertyValue::String(value)
    }
}
