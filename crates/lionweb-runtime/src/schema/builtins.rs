//! The built-in language every schema implicitly depends on.
//!
//! Only the part the runtime needs is modelled: the primitive data types
//! (see [`PrimitiveType`]) and the `name` property of `INamed`, which
//! classifiers pick up through [`ClassifierBuilder::named`] and which
//! supplies the `resolveInfo` of serialized reference targets.
//!
//! [`ClassifierBuilder::named`]: crate::schema::ClassifierBuilder::named

use std::sync::Arc;

use lazy_static::lazy_static;

use crate::schema::{Feature, FeatureKind, Language, MetaPointer, PrimitiveType, ValueType};

/// Key of the built-in language.
pub const BUILTINS_KEY: &str = "LionCore-builtins";

/// Version of the built-in language.
pub const BUILTINS_VERSION: &str = "2023.1";

lazy_static! {
    /// The `INamed.name` property.
    pub static ref INAMED_NAME: Arc<Feature> = Arc::new(Feature {
        meta_pointer: MetaPointer::new(BUILTINS_KEY, BUILTINS_VERSION, "LionCore-builtins-INamed-name"),
        name: "name".to_string(),
        kind: FeatureKind::Property,
        optional: false,
        multiple: false,
        value_type: ValueType::Primitive(PrimitiveType::String),
    });

    /// The built-in language itself.
    pub static ref BUILTINS: Arc<Language> = Arc::new(Language {
        key: BUILTINS_KEY.to_string(),
        version: BUILTINS_VERSION.to_string(),
        name: "LionCore_builtins".to_string(),
        classifiers: Vec::new(),
        enumerations: Vec::new(),
    });
}

/// Returns the meta-pointer of a primitive data type.
pub fn primitive_meta_pointer(primitive: PrimitiveType) -> MetaPointer {
    MetaPointer::new(BUILTINS_KEY, BUILTINS_VERSION, primitive.key())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_inamed_name_is_required_string() {
        assert_eq!(INAMED_NAME.key(), "LionCore-builtins-INamed-name");
        assert_eq!(INAMED_NAME.value_type, ValueType::Primitive(PrimitiveType::String));
        assert!(!INAMED_NAME.optional);
        assert_eq!(BUILTINS.key, INAMED_NAME.meta_pointer.language);
    }

    #[test]
    fn test_primitive_meta_pointer() {
        let pointer = primitive_meta_pointer(PrimitiveType::Json);
        assert_eq!(pointer.key, "LionCore-builtins-JSON");
        assert_eq!(pointer.version, BUILTINS_VERSION);
    }
}
