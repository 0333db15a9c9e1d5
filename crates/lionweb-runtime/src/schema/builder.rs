//! Builder API for ergonomic schema construction.
//!
//! # Example
//!
//! ```rust
//! use lionweb_runtime::schema::{LanguageBuilder, Multiplicity, PrimitiveType};
//!
//! let language = LanguageBuilder::new("Library", "1")
//!     .enumeration("Genre", ["fiction", "poetry"])
//!     .concept("Book", |c| c
//!         .named()
//!         .property("pages", PrimitiveType::Integer)
//!         .enum_property("genre", "Genre", true)
//!     )
//!     .concept("Shelf", |c| c
//!         .containment("books", "Book", Multiplicity::ZeroOrMore)
//!     )
//!     .build()
//!     .unwrap();
//!
//! assert_eq!(language.classifiers.len(), 2);
//! ```

use std::collections::HashSet;
use std::sync::Arc;

use crate::error::SchemaError;
use crate::schema::builtins::INAMED_NAME;
use crate::schema::{
    Classifier, ClassifierKind, Enumeration, EnumerationLiteral, Feature, FeatureKind, Language,
    MetaPointer, Multiplicity, PrimitiveType, ValueType,
};

/// Builder for a [`Language`].
#[derive(Debug, Clone)]
pub struct LanguageBuilder {
    name: String,
    key: String,
    version: String,
    enumerations: Vec<(String, Vec<String>)>,
    classifiers: Vec<ClassifierBuilder>,
}

impl LanguageBuilder {
    /// Creates a builder; the language key defaults to its name.
    pub fn new(name: impl Into<String>, version: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            key: name.clone(),
            name,
            version: version.into(),
            enumerations: Vec::new(),
            classifiers: Vec::new(),
        }
    }

    /// Overrides the language key.
    pub fn key(mut self, key: impl Into<String>) -> Self {
        self.key = key.into();
        self
    }

    /// Adds an enumeration with the given literal names.
    pub fn enumeration<I, S>(mut self, name: impl Into<String>, literals: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.enumerations
            .push((name.into(), literals.into_iter().map(Into::into).collect()));
        self
    }

    /// Adds a concept using a builder function.
    pub fn concept<F>(mut self, name: impl Into<String>, f: F) -> Self
    where
        F: FnOnce(ClassifierBuilder) -> ClassifierBuilder,
    {
        self.classifiers
            .push(f(ClassifierBuilder::new(name.into(), ClassifierKind::Concept)));
        self
    }

    /// Adds an annotation using a builder function.
    pub fn annotation<F>(mut self, name: impl Into<String>, f: F) -> Self
    where
        F: FnOnce(ClassifierBuilder) -> ClassifierBuilder,
    {
        self.classifiers
            .push(f(ClassifierBuilder::new(name.into(), ClassifierKind::Annotation)));
        self
    }

    fn meta_pointer(&self, key: impl Into<String>) -> MetaPointer {
        MetaPointer::new(self.key.clone(), self.version.clone(), key)
    }

    /// Builds the language, resolving enumeration names and checking keys.
    pub fn build(self) -> Result<Arc<Language>, SchemaError> {
        let mut keys = HashSet::new();
        let mut claim = |key: &str| {
            if keys.insert(key.to_string()) {
                Ok(())
            } else {
                Err(SchemaError::DuplicateKey {
                    language: self.name.clone(),
                    key: key.to_string(),
                })
            }
        };

        let mut enumerations = Vec::with_capacity(self.enumerations.len());
        for (name, literal_names) in &self.enumerations {
            claim(name)?;
            let literals = literal_names
                .iter()
                .map(|literal| EnumerationLiteral {
                    key: format!("{name}-{literal}"),
                    name: literal.clone(),
                })
                .collect();
            enumerations.push(Arc::new(Enumeration {
                meta_pointer: self.meta_pointer(name.clone()),
                name: name.clone(),
                literals,
            }));
        }

        let mut classifiers = Vec::with_capacity(self.classifiers.len());
        for builder in &self.classifiers {
            claim(&builder.name)?;

            let mut features: Vec<Arc<Feature>> = Vec::new();
            let push = |feature: Arc<Feature>, features: &mut Vec<Arc<Feature>>| {
                if !features.iter().any(|f| f.meta_pointer == feature.meta_pointer) {
                    features.push(feature);
                }
            };
            if builder.named {
                push(INAMED_NAME.clone(), &mut features);
            }
            for feature in &builder.inherited {
                push(feature.clone(), &mut features);
            }

            for decl in &builder.features {
                let key = format!("{}-{}", builder.name, decl.name);
                claim(&key)?;
                let value_type = match &decl.type_ref {
                    TypeRef::Primitive(primitive) => ValueType::Primitive(*primitive),
                    TypeRef::Enumeration(name) => {
                        let enumeration = enumerations
                            .iter()
                            .find(|e| &e.name == name)
                            .ok_or_else(|| SchemaError::UnknownEnumeration {
                                language: self.name.clone(),
                                name: name.clone(),
                            })?;
                        ValueType::Enumeration(enumeration.clone())
                    }
                    TypeRef::Classifier(name) => ValueType::Classifier(self.meta_pointer(name.clone())),
                };
                push(
                    Arc::new(Feature {
                        meta_pointer: self.meta_pointer(key),
                        name: decl.name.clone(),
                        kind: decl.kind,
                        optional: decl.multiplicity.is_optional(),
                        multiple: decl.multiplicity.is_multiple(),
                        value_type,
                    }),
                    &mut features,
                );
            }

            classifiers.push(Arc::new(Classifier::new(
                self.meta_pointer(builder.name.clone()),
                builder.name.clone(),
                builder.kind,
                self.name.clone(),
                features,
            )));
        }

        Ok(Arc::new(Language {
            key: self.key,
            version: self.version,
            name: self.name,
            classifiers,
            enumerations,
        }))
    }
}

#[derive(Debug, Clone)]
enum TypeRef {
    Primitive(PrimitiveType),
    Enumeration(String),
    Classifier(String),
}

#[derive(Debug, Clone)]
struct FeatureDecl {
    name: String,
    kind: FeatureKind,
    multiplicity: Multiplicity,
    type_ref: TypeRef,
}

/// Builder for the features of a concept or annotation.
#[derive(Debug, Clone)]
pub struct ClassifierBuilder {
    name: String,
    kind: ClassifierKind,
    named: bool,
    inherited: Vec<Arc<Feature>>,
    features: Vec<FeatureDecl>,
}

impl ClassifierBuilder {
    fn new(name: String, kind: ClassifierKind) -> Self {
        Self {
            name,
            kind,
            named: false,
            inherited: Vec::new(),
            features: Vec::new(),
        }
    }

    /// Gives instances the built-in `name` property.
    pub fn named(mut self) -> Self {
        self.named = true;
        self
    }

    /// Inherits all features of an already built classifier.
    pub fn extends(mut self, parent: &Classifier) -> Self {
        self.inherited.extend(parent.features().iter().cloned());
        self
    }

    fn feature(mut self, name: impl Into<String>, kind: FeatureKind, multiplicity: Multiplicity, type_ref: TypeRef) -> Self {
        self.features.push(FeatureDecl {
            name: name.into(),
            kind,
            multiplicity,
            type_ref,
        });
        self
    }

    // =========================================================================
    // Properties
    // =========================================================================

    /// Adds a required primitive property.
    pub fn property(self, name: impl Into<String>, primitive: PrimitiveType) -> Self {
        self.feature(name, FeatureKind::Property, Multiplicity::One, TypeRef::Primitive(primitive))
    }

    /// Adds an optional primitive property.
    pub fn optional_property(self, name: impl Into<String>, primitive: PrimitiveType) -> Self {
        self.feature(name, FeatureKind::Property, Multiplicity::ZeroOrOne, TypeRef::Primitive(primitive))
    }

    /// Adds a property typed by an enumeration of the same language.
    pub fn enum_property(self, name: impl Into<String>, enumeration: impl Into<String>, optional: bool) -> Self {
        let multiplicity = Multiplicity::from_flags(optional, false);
        self.feature(name, FeatureKind::Property, multiplicity, TypeRef::Enumeration(enumeration.into()))
    }

    // =========================================================================
    // Links
    // =========================================================================

    /// Adds a containment of instances of the named classifier.
    pub fn containment(self, name: impl Into<String>, target: impl Into<String>, multiplicity: Multiplicity) -> Self {
        self.feature(name, FeatureKind::Containment, multiplicity, TypeRef::Classifier(target.into()))
    }

    /// Adds a reference to instances of the named classifier.
    pub fn reference(self, name: impl Into<String>, target: impl Into<String>, multiplicity: Multiplicity) -> Self {
        self.feature(name, FeatureKind::Reference, multiplicity, TypeRef::Classifier(target.into()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keys_follow_declaration_names() {
        let language = LanguageBuilder::new("Shop", "3")
            .enumeration("Size", ["small", "large"])
            .concept("Item", |c| c.named().enum_property("size", "Size", false))
            .build()
            .unwrap();

        let item = language.classifier("Item").unwrap();
        assert_eq!(item.meta_pointer, MetaPointer::new("Shop", "3", "Item"));
        assert_eq!(item.features().len(), 2);
        assert_eq!(item.features()[0].key(), INAMED_NAME.key());
        assert_eq!(item.features()[1].key(), "Item-size");
        assert_eq!(item.qualified_name(), "Shop.Item");

        let size = language.enumeration("Size").unwrap();
        assert_eq!(size.literal("Size-large").unwrap().name, "large");
    }

    #[test]
    fn test_unknown_enumeration() {
        let result = LanguageBuilder::new("Shop", "1")
            .concept("Item", |c| c.enum_property("size", "Missing", true))
            .build();
        assert!(matches!(result, Err(SchemaError::UnknownEnumeration { .. })));
    }

    #[test]
    fn test_duplicate_key() {
        let result = LanguageBuilder::new("Shop", "1")
            .concept("Item", |c| c)
            .annotation("Item", |c| c)
            .build();
        assert!(matches!(result, Err(SchemaError::DuplicateKey { .. })));
    }

    #[test]
    fn test_extends_inherits_features_first() {
        let base = LanguageBuilder::new("Base", "1")
            .concept("Named", |c| c.named().optional_property("note", PrimitiveType::String))
            .build()
            .unwrap();
        let named = base.classifier("Named").unwrap().clone();

        let language = LanguageBuilder::new("Derived", "1")
            .concept("Thing", |c| c.named().extends(&named).property("count", PrimitiveType::Integer))
            .build()
            .unwrap();

        let thing = language.classifier("Thing").unwrap();
        let keys: Vec<_> = thing.features().iter().map(|f| f.key().to_string()).collect();
        assert_eq!(keys, ["LionCore-builtins-INamed-name", "Named-note", "Thing-count"]);
    }
}
