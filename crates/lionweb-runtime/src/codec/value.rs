//! Textual encoding of property values.
//!
//! On the wire every property value is a string; its declared type says how
//! to read it back.

use thiserror::Error;

use crate::model::PropertyValue;
use crate::schema::{Feature, PrimitiveType, ValueType};

/// Why a property value couldn't be decoded.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValueDecodeError {
    #[error("{reason}")]
    Invalid { reason: String },

    #[error("unknown enumeration literal {literal:?}")]
    UnknownLiteral { literal: String },
}

/// Encodes a property value as wire text.
pub fn encode_property_value(value: &PropertyValue) -> String {
    match value {
        PropertyValue::Boolean(b) => b.to_string(),
        PropertyValue::Integer(i) => i.to_string(),
        PropertyValue::String(s) => s.clone(),
        PropertyValue::Json(json) => json.to_string(),
        PropertyValue::Literal(key) => key.clone(),
    }
}

/// Decodes wire text according to the declared type of a property.
///
/// Enumeration values are looked up by literal key.
pub fn decode_property_value(property: &Feature, text: &str) -> Result<PropertyValue, ValueDecodeError> {
    match &property.value_type {
        ValueType::Primitive(PrimitiveType::Boolean) => match text {
            "true" => Ok(PropertyValue::Boolean(true)),
            "false" => Ok(PropertyValue::Boolean(false)),
            _ => Err(ValueDecodeError::Invalid {
                reason: "expected \"true\" or \"false\"".to_string(),
            }),
        },
        ValueType::Primitive(PrimitiveType::Integer) => text
            .parse::<i64>()
            .map(PropertyValue::Integer)
            .map_err(|e| ValueDecodeError::Invalid { reason: e.to_string() }),
        ValueType::Primitive(PrimitiveType::String) => Ok(PropertyValue::String(text.to_string())),
        ValueType::Primitive(PrimitiveType::Json) => serde_json::from_str(text)
            .map(PropertyValue::Json)
            .map_err(|e| ValueDecodeError::Invalid { reason: e.to_string() }),
        ValueType::Enumeration(enumeration) => match enumeration.literal(text) {
            Some(literal) => Ok(PropertyValue::Literal(literal.key.clone())),
            None => Err(ValueDecodeError::UnknownLiteral {
                literal: text.to_string(),
            }),
        },
        ValueType::Classifier(_) => Err(ValueDecodeError::Invalid {
            reason: format!("{} is not a property", property.name),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::test_language::TestLanguage;

    #[test]
    fn test_primitive_values() {
        let tl = TestLanguage::new();
        let boolean = tl.datatype_feature("booleanValue_1");
        let integer = tl.datatype_feature("integerValue_1");
        let json = tl.datatype_feature("jsonValue_0_1");

        assert_eq!(decode_property_value(&boolean, "true"), Ok(PropertyValue::Boolean(true)));
        assert!(decode_property_value(&boolean, "yes").is_err());
        assert_eq!(decode_property_value(&integer, "-42"), Ok(PropertyValue::Integer(-42)));
        assert!(decode_property_value(&integer, "4.2").is_err());

        let value = decode_property_value(&json, r#"{"a":[1,2]}"#).unwrap();
        assert_eq!(encode_property_value(&value), r#"{"a":[1,2]}"#);
        assert_eq!(encode_property_value(&PropertyValue::Integer(-7)), "-7");
    }

    #[test]
    fn test_enumeration_values() {
        let tl = TestLanguage::new();
        let enum_1 = tl.datatype_feature("enumValue_1");

        assert_eq!(
            decode_property_value(&enum_1, "TestEnumeration-literal3"),
            Ok(PropertyValue::Literal("TestEnumeration-literal3".to_string()))
        );
        assert_eq!(
            decode_property_value(&enum_1, "literal3"),
            Err(ValueDecodeError::UnknownLiteral {
                literal: "literal3".to_string()
            })
        );
    }
}
