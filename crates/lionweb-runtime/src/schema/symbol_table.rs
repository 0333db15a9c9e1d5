//! Meta-pointer resolution.
//!
//! Wire input refers to classifiers and features through meta-pointers. The
//! symbol table maps those pointers to the live descriptors of the languages
//! it was built from, and doubles as the per-classifier factory lookup used
//! when instantiating nodes.

use std::sync::Arc;

use rustc_hash::FxHashMap;

use crate::schema::builtins::{BUILTINS, INAMED_NAME};
use crate::schema::{Classifier, Feature, Language, MetaPointer};

/// Memoised lookup of classifiers and features by meta-pointer.
#[derive(Debug, Clone, Default)]
pub struct SymbolTable {
    languages: Vec<Arc<Language>>,
    classifiers: FxHashMap<MetaPointer, Arc<Classifier>>,
    features: FxHashMap<MetaPointer, Arc<Feature>>,
}

impl SymbolTable {
    /// Creates a symbol table over the given languages and the built-in one.
    pub fn new(languages: impl IntoIterator<Item = Arc<Language>>) -> Self {
        let mut table = Self::default();
        table.add_language(BUILTINS.clone());
        table.features.insert(INAMED_NAME.meta_pointer.clone(), INAMED_NAME.clone());
        for language in languages {
            table.add_language(language);
        }
        table
    }

    /// Registers another language.
    pub fn add_language(&mut self, language: Arc<Language>) {
        for classifier in &language.classifiers {
            self.classifiers
                .insert(classifier.meta_pointer.clone(), classifier.clone());
            for feature in classifier.features() {
                self.features
                    .entry(feature.meta_pointer.clone())
                    .or_insert_with(|| feature.clone());
            }
        }
        self.languages.push(language);
    }

    pub fn languages(&self) -> &[Arc<Language>] {
        &self.languages
    }

    /// Looks up a classifier by meta-pointer.
    pub fn classifier(&self, pointer: &MetaPointer) -> Option<&Arc<Classifier>> {
        self.classifiers.get(pointer)
    }

    /// Looks up a feature by meta-pointer.
    pub fn feature(&self, pointer: &MetaPointer) -> Option<&Arc<Feature>> {
        self.features.get(pointer)
    }

    /// Looks up a feature by meta-pointer among the features of a classifier.
    pub fn feature_matching<'a>(&self, classifier: &'a Classifier, pointer: &MetaPointer) -> Option<&'a Arc<Feature>> {
        let position = classifier.feature_position(&pointer.key)?;
        let feature = &classifier.features()[position];
        (feature.meta_pointer == *pointer).then_some(feature)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{LanguageBuilder, PrimitiveType};

    #[test]
    fn test_lookup_by_meta_pointer() {
        let language = LanguageBuilder::new("L", "1")
            .concept("C", |c| c.named().optional_property("p", PrimitiveType::Boolean))
            .build()
            .unwrap();
        let symbols = SymbolTable::new([language]);

        let classifier = symbols.classifier(&MetaPointer::new("L", "1", "C")).unwrap();
        assert_eq!(classifier.name, "C");
        assert!(symbols.classifier(&MetaPointer::new("L", "2", "C")).is_none());

        let p = MetaPointer::new("L", "1", "C-p");
        assert_eq!(symbols.feature(&p).unwrap().name, "p");
        assert!(symbols.feature_matching(classifier, &p).is_some());
        assert!(symbols.feature_matching(classifier, &INAMED_NAME.meta_pointer).is_some());
        assert!(symbols.feature(&INAMED_NAME.meta_pointer).is_some());
    }

    #[test]
    fn test_feature_matching_rejects_version_mismatch() {
        let language = LanguageBuilder::new("L", "1")
            .concept("C", |c| c.optional_property("p", PrimitiveType::Boolean))
            .build()
            .unwrap();
        let symbols = SymbolTable::new([language.clone()]);
        let classifier = language.classifier("C").unwrap();
        assert!(symbols.feature_matching(classifier, &MetaPointer::new("L", "0", "C-p")).is_none());
    }
}
