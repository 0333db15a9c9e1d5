//! Test language shared by the unit tests.

use std::sync::Arc;

use crate::schema::{Classifier, Feature, Language, LanguageBuilder, Multiplicity, PrimitiveType, SymbolTable};

pub(crate) struct TestLanguage {
    pub language: Arc<Language>,
    pub datatype: Arc<Classifier>,
    pub link: Arc<Classifier>,
    pub named: Arc<Classifier>,
    pub annotation: Arc<Classifier>,
}

impl TestLanguage {
    pub fn new() -> Self {
        let language = LanguageBuilder::new("TestLanguage", "0")
            .enumeration("TestEnumeration", ["literal1", "literal2", "literal3"])
            .concept("DataTypeTestConcept", |c| {
                c.property("booleanValue_1", PrimitiveType::Boolean)
                    .property("integerValue_1", PrimitiveType::Integer)
                    .property("stringValue_1", PrimitiveType::String)
                    .enum_property("enumValue_1", "TestEnumeration", false)
                    .optional_property("booleanValue_0_1", PrimitiveType::Boolean)
                    .optional_property("integerValue_0_1", PrimitiveType::Integer)
                    .optional_property("stringValue_0_1", PrimitiveType::String)
                    .enum_property("enumValue_0_1", "TestEnumeration", true)
                    .optional_property("jsonValue_0_1", PrimitiveType::Json)
            })
            .concept("LinkTestConcept", |c| {
                c.containment("containment_0_1", "DataTypeTestConcept", Multiplicity::ZeroOrOne)
                    .containment("containment_1", "DataTypeTestConcept", Multiplicity::One)
                    .containment("containment_0_n", "DataTypeTestConcept", Multiplicity::ZeroOrMore)
                    .containment("containment_1_n", "DataTypeTestConcept", Multiplicity::OneOrMore)
                    .reference("reference_0_1", "DataTypeTestConcept", Multiplicity::ZeroOrOne)
                    .reference("reference_1", "DataTypeTestConcept", Multiplicity::One)
                    .reference("reference_0_n", "DataTypeTestConcept", Multiplicity::ZeroOrMore)
                    .reference("reference_1_n", "DataTypeTestConcept", Multiplicity::OneOrMore)
            })
            .concept("NamedTestConcept", |c| c.named())
            .annotation("TestAnnotation", |c| c.optional_property("note", PrimitiveType::String))
            .build()
            .unwrap();

        let classifier = |name: &str| language.classifier(name).unwrap().clone();
        Self {
            datatype: classifier("DataTypeTestConcept"),
            link: classifier("LinkTestConcept"),
            named: classifier("NamedTestConcept"),
            annotation: classifier("TestAnnotation"),
            language,
        }
    }

    pub fn datatype_feature(&self, name: &str) -> Arc<Feature> {
        self.datatype.feature(name).unwrap().clone()
    }

    pub fn link_feature(&self, name: &str) -> Arc<Feature> {
        self.link.feature(name).unwrap().clone()
    }

    pub fn symbols(&self) -> SymbolTable {
        SymbolTable::new([self.language.clone()])
    }
}
