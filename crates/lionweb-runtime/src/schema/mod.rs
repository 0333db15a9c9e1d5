//! Schema descriptors consumed by the runtime.
//!
//! This module contains:
//! - Language, classifier and feature descriptors
//! - A builder for constructing languages in code
//! - The built-in language
//! - The symbol table resolving wire meta-pointers

pub mod builder;
pub mod builtins;
pub mod language;
pub mod symbol_table;

#[cfg(test)]
pub(crate) mod test_language;

pub use builder::{ClassifierBuilder, LanguageBuilder};
pub use language::{
    Classifier, ClassifierKind, Enumeration, EnumerationLiteral, Feature, FeatureKind, Language,
    MetaPointer, Multiplicity, PrimitiveType, ValueType,
};
pub use symbol_table::SymbolTable;
