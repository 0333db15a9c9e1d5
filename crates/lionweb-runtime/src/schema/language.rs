//! Read-only schema descriptors.
//!
//! A [`Language`] groups classifiers and enumerations under a key and a
//! version. Classifiers declare features; every feature carries its kind,
//! its multiplicity and its declared value type. Descriptors are immutable
//! once built and shared through `Arc`.

use std::fmt;
use std::sync::Arc;

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

/// Pointer to a classifier or feature in a version of a language.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct MetaPointer {
    /// Key of the language.
    pub language: String,
    /// Version of the language.
    pub version: String,
    /// Key of the classifier or feature pointed to.
    pub key: String,
}

impl MetaPointer {
    pub fn new(language: impl Into<String>, version: impl Into<String>, key: impl Into<String>) -> Self {
        Self {
            language: language.into(),
            version: version.into(),
            key: key.into(),
        }
    }
}

/// Built-in primitive data types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PrimitiveType {
    Boolean,
    Integer,
    String,
    Json,
}

impl PrimitiveType {
    /// Returns the key of the data type in the built-in language.
    pub fn key(self) -> &'static str {
        match self {
            PrimitiveType::Boolean => "LionCore-builtins-Boolean",
            PrimitiveType::Integer => "LionCore-builtins-Integer",
            PrimitiveType::String => "LionCore-builtins-String",
            PrimitiveType::Json => "LionCore-builtins-JSON",
        }
    }
}

/// A literal of an enumeration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnumerationLiteral {
    pub key: String,
    pub name: String,
}

/// An enumeration data type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Enumeration {
    pub meta_pointer: MetaPointer,
    pub name: String,
    pub literals: Vec<EnumerationLiteral>,
}

impl Enumeration {
    /// Looks up a literal by its key.
    pub fn literal(&self, key: &str) -> Option<&EnumerationLiteral> {
        self.literals.iter().find(|literal| literal.key == key)
    }

    /// Looks up a literal by its name.
    pub fn literal_named(&self, name: &str) -> Option<&EnumerationLiteral> {
        self.literals.iter().find(|literal| literal.name == name)
    }
}

/// The declared type of a feature's values.
#[derive(Debug, Clone, PartialEq)]
pub enum ValueType {
    /// A built-in primitive (properties only).
    Primitive(PrimitiveType),
    /// An enumeration (properties only).
    Enumeration(Arc<Enumeration>),
    /// A classifier (containments and references).
    Classifier(MetaPointer),
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValueType::Primitive(primitive) => write!(f, "{}", primitive.key()),
            ValueType::Enumeration(enumeration) => write!(f, "{}", enumeration.meta_pointer.key),
            ValueType::Classifier(classifier) => write!(f, "{}", classifier.key),
        }
    }
}

/// The kind of a feature.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FeatureKind {
    Property,
    Containment,
    Reference,
}

impl fmt::Display for FeatureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            FeatureKind::Property => "property",
            FeatureKind::Containment => "containment",
            FeatureKind::Reference => "reference",
        })
    }
}

/// Optionality × arity of a feature.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Multiplicity {
    /// `0..1`
    ZeroOrOne,
    /// `1`
    One,
    /// `0..*`
    ZeroOrMore,
    /// `1..*`
    OneOrMore,
}

impl Multiplicity {
    pub fn from_flags(optional: bool, multiple: bool) -> Self {
        match (optional, multiple) {
            (true, false) => Multiplicity::ZeroOrOne,
            (false, false) => Multiplicity::One,
            (true, true) => Multiplicity::ZeroOrMore,
            (false, true) => Multiplicity::OneOrMore,
        }
    }

    pub fn is_optional(self) -> bool {
        matches!(self, Multiplicity::ZeroOrOne | Multiplicity::ZeroOrMore)
    }

    pub fn is_multiple(self) -> bool {
        matches!(self, Multiplicity::ZeroOrMore | Multiplicity::OneOrMore)
    }
}

impl fmt::Display for Multiplicity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Multiplicity::ZeroOrOne => "0..1",
            Multiplicity::One => "1",
            Multiplicity::ZeroOrMore => "0..*",
            Multiplicity::OneOrMore => "1..*",
        })
    }
}

/// A property, containment or reference declared by a classifier.
///
/// Features compare equal when their meta-pointers are equal.
#[derive(Debug, Clone)]
pub struct Feature {
    pub meta_pointer: MetaPointer,
    pub name: String,
    pub kind: FeatureKind,
    pub optional: bool,
    pub multiple: bool,
    pub value_type: ValueType,
}

impl Feature {
    /// Returns the key of this feature.
    pub fn key(&self) -> &str {
        &self.meta_pointer.key
    }

    pub fn multiplicity(&self) -> Multiplicity {
        Multiplicity::from_flags(self.optional, self.multiple)
    }
}

impl PartialEq for Feature {
    fn eq(&self, other: &Self) -> bool {
        self.meta_pointer == other.meta_pointer
    }
}

impl Eq for Feature {}

/// Whether instances of a classifier are ordinary nodes or annotations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ClassifierKind {
    Concept,
    Annotation,
}

/// A concept or annotation: the schema type of a node.
#[derive(Debug, Clone)]
pub struct Classifier {
    pub meta_pointer: MetaPointer,
    pub name: String,
    pub kind: ClassifierKind,
    /// Name of the declaring language, for diagnostics.
    pub language_name: String,
    /// All features, inherited ones first, in declaration order.
    features: Vec<Arc<Feature>>,
    positions: FxHashMap<String, usize>,
}

impl Classifier {
    pub(crate) fn new(
        meta_pointer: MetaPointer,
        name: String,
        kind: ClassifierKind,
        language_name: String,
        features: Vec<Arc<Feature>>,
    ) -> Self {
        let positions = features
            .iter()
            .enumerate()
            .map(|(position, feature)| (feature.key().to_string(), position))
            .collect();
        Self {
            meta_pointer,
            name,
            kind,
            language_name,
            features,
            positions,
        }
    }

    /// Returns `Language.Classifier`, as used in error messages.
    pub fn qualified_name(&self) -> String {
        format!("{}.{}", self.language_name, self.name)
    }

    pub fn features(&self) -> &[Arc<Feature>] {
        &self.features
    }

    /// Returns the declaration position of a feature with the given key.
    pub fn feature_position(&self, key: &str) -> Option<usize> {
        self.positions.get(key).copied()
    }

    /// Looks up a feature by key, falling back to its name.
    pub fn feature(&self, key_or_name: &str) -> Option<&Arc<Feature>> {
        match self.feature_position(key_or_name) {
            Some(position) => self.features.get(position),
            None => self.features.iter().find(|feature| feature.name == key_or_name),
        }
    }

    pub fn is_annotation(&self) -> bool {
        self.kind == ClassifierKind::Annotation
    }
}

impl PartialEq for Classifier {
    fn eq(&self, other: &Self) -> bool {
        self.meta_pointer == other.meta_pointer
    }
}

impl Eq for Classifier {}

/// A versioned language: the unit the wire format refers to.
#[derive(Debug, Clone)]
pub struct Language {
    pub key: String,
    pub version: String,
    pub name: String,
    pub classifiers: Vec<Arc<Classifier>>,
    pub enumerations: Vec<Arc<Enumeration>>,
}

impl Language {
    /// Looks up a classifier by key, falling back to its name.
    pub fn classifier(&self, key_or_name: &str) -> Option<&Arc<Classifier>> {
        self.classifiers
            .iter()
            .find(|classifier| classifier.meta_pointer.key == key_or_name)
            .or_else(|| self.classifiers.iter().find(|classifier| classifier.name == key_or_name))
    }

    pub fn enumeration(&self, name: &str) -> Option<&Arc<Enumeration>> {
        self.enumerations.iter().find(|enumeration| enumeration.name == name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_multiplicity_flags() {
        assert_eq!(Multiplicity::from_flags(true, false), Multiplicity::ZeroOrOne);
        assert_eq!(Multiplicity::from_flags(false, true), Multiplicity::OneOrMore);
        assert!(Multiplicity::ZeroOrMore.is_optional());
        assert!(!Multiplicity::One.is_multiple());
        assert_eq!(Multiplicity::OneOrMore.to_string(), "1..*");
    }

    #[test]
    fn test_feature_equality_is_by_meta_pointer() {
        let a = Feature {
            meta_pointer: MetaPointer::new("L", "1", "C-f"),
            name: "f".to_string(),
            kind: FeatureKind::Property,
            optional: false,
            multiple: false,
            value_type: ValueType::Primitive(PrimitiveType::String),
        };
        let mut b = a.clone();
        b.name = "renamed".to_string();
        assert_eq!(a, b);

        b.meta_pointer.version = "2".to_string();
        assert_ne!(a, b);
    }
}
