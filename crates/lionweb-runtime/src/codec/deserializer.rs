//! Chunk → graph.
//!
//! Deserialization runs in two passes. The first instantiates a node per
//! record and registers its id; the second wires properties, children,
//! reference targets and annotations, resolving ids through the graph's id
//! mapping. Issues with individual records are reported to a
//! [`ProblemHandler`] and don't abort the load.

use std::sync::Arc;

use crate::codec::chunk::{SerializationChunk, SerializedNode};
use crate::codec::value::{decode_property_value, ValueDecodeError};
use crate::error::{DecodeError, Problem, RuntimeError};
use crate::limits::MAX_NODES_PER_CHUNK;
use crate::model::{Graph, Id, NodeHandle, ReferenceTarget};
use crate::schema::{Classifier, Feature, FeatureKind, MetaPointer, SymbolTable};

/// Sink for non-fatal deserialization problems.
pub trait ProblemHandler {
    fn report(&mut self, problem: Problem);
}

impl<F> ProblemHandler for F
where
    F: FnMut(Problem),
{
    fn report(&mut self, problem: Problem) {
        self(problem)
    }
}

/// Keeps every reported problem.
#[derive(Debug, Clone, Default)]
pub struct AccumulatingProblemHandler {
    problems: Vec<Problem>,
}

impl AccumulatingProblemHandler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn problems(&self) -> &[Problem] {
        &self.problems
    }

    pub fn into_problems(self) -> Vec<Problem> {
        self.problems
    }

    pub fn is_empty(&self) -> bool {
        self.problems.is_empty()
    }
}

impl ProblemHandler for AccumulatingProblemHandler {
    fn report(&mut self, problem: Problem) {
        self.problems.push(problem);
    }
}

/// How the wiring pass mutates the graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DeserializeMode {
    /// Wire through the direct path; nothing is emitted.
    #[default]
    Silent,
    /// Wire through the emitting path, so the graph's delta handler sees
    /// every property, child, target and annotation being set.
    Emitting,
}

/// Options for deserializing chunks.
#[derive(Debug, Clone)]
pub struct DeserializeOptions {
    pub mode: DeserializeMode,
    /// Refuse chunks of another serialization format version.
    pub check_format_version: bool,
}

impl Default for DeserializeOptions {
    fn default() -> Self {
        Self {
            mode: DeserializeMode::Silent,
            check_format_version: true,
        }
    }
}

/// Reconstructs nodes from chunks, against a symbol table.
#[derive(Debug, Clone)]
pub struct Deserializer<'a> {
    symbols: &'a SymbolTable,
    options: DeserializeOptions,
}

impl<'a> Deserializer<'a> {
    pub fn new(symbols: &'a SymbolTable) -> Self {
        Self {
            symbols,
            options: DeserializeOptions::default(),
        }
    }

    pub fn with_options(mut self, options: DeserializeOptions) -> Self {
        self.options = options;
        self
    }

    pub fn options(&self) -> &DeserializeOptions {
        &self.options
    }

    /// Loads a chunk into `graph`, returning the handles of the loaded
    /// nodes that are roots afterwards, in record order.
    ///
    /// Fails only on chunk-level issues (format version, size). Everything
    /// else is reported to `problems`.
    pub fn deserialize(
        &self,
        chunk: &SerializationChunk,
        graph: &mut Graph,
        problems: &mut dyn ProblemHandler,
    ) -> Result<Vec<NodeHandle>, DecodeError> {
        if self.options.check_format_version
            && chunk.serialization_format_version != crate::SERIALIZATION_FORMAT_VERSION
        {
            return Err(DecodeError::UnsupportedFormatVersion {
                version: chunk.serialization_format_version.clone(),
            });
        }
        if chunk.nodes.len() > MAX_NODES_PER_CHUNK {
            return Err(DecodeError::LengthExceedsLimit {
                field: "nodes",
                len: chunk.nodes.len(),
                max: MAX_NODES_PER_CHUNK,
            });
        }

        let mut reporter = Reporter { sink: problems, count: 0 };

        let mut created = Vec::with_capacity(chunk.nodes.len());
        for record in &chunk.nodes {
            if let Some(handle) = self.instantiate(record, graph, &mut reporter) {
                created.push((record, handle));
            }
        }

        for (record, handle) in &created {
            self.wire(record, *handle, graph, &mut reporter);
        }

        let roots: Vec<NodeHandle> = created
            .iter()
            .map(|(_, handle)| *handle)
            .filter(|handle| graph.node(*handle).is_root())
            .collect();

        tracing::debug!(
            records = chunk.nodes.len(),
            instantiated = created.len(),
            roots = roots.len(),
            problems = reporter.count,
            "deserialized chunk"
        );
        Ok(roots)
    }

    fn instantiate(&self, record: &SerializedNode, graph: &mut Graph, reporter: &mut Reporter<'_>) -> Option<NodeHandle> {
        let Some(classifier) = self.symbols.classifier(&record.classifier) else {
            reporter.report(Problem::UnknownClassifier {
                node: record.id.clone(),
                classifier: record.classifier.clone(),
            });
            return None;
        };
        match graph.create_node(classifier, record.id.clone()) {
            Ok(handle) => Some(handle),
            Err(RuntimeError::DuplicateId { id }) => {
                reporter.report(Problem::DuplicateNodeId { node: id });
                None
            }
            Err(error) => {
                reporter.report(Problem::Rejected {
                    node: record.id.clone(),
                    error,
                });
                None
            }
        }
    }

    fn wire(&self, record: &SerializedNode, handle: NodeHandle, graph: &mut Graph, reporter: &mut Reporter<'_>) {
        let classifier = Arc::clone(graph.node(handle).classifier());
        let emitting = self.options.mode == DeserializeMode::Emitting;

        for property in &record.properties {
            let Some(feature) = self.feature(&classifier, &record.id, &property.property, FeatureKind::Property, reporter)
            else {
                continue;
            };
            let Some(text) = &property.value else {
                continue;
            };
            let value = match decode_property_value(&feature, text) {
                Ok(value) => value,
                Err(ValueDecodeError::UnknownLiteral { literal }) => {
                    reporter.report(Problem::UnknownEnumerationLiteral {
                        node: record.id.clone(),
                        property: property.property.clone(),
                        literal,
                    });
                    continue;
                }
                Err(ValueDecodeError::Invalid { reason }) => {
                    reporter.report(Problem::InvalidPropertyValue {
                        node: record.id.clone(),
                        property: property.property.clone(),
                        value: text.clone(),
                        reason,
                    });
                    continue;
                }
            };
            let result = if emitting {
                graph.set_property(handle, &feature, Some(value))
            } else {
                graph.set_property_directly(handle, &feature, Some(value)).map(drop)
            };
            reporter.rejected(&record.id, result);
        }

        for containment in &record.containments {
            let Some(feature) = self.feature(
                &classifier,
                &record.id,
                &containment.containment,
                FeatureKind::Containment,
                reporter,
            ) else {
                continue;
            };
            let children = single_shape(&feature, &record.id, &containment.containment, &containment.children, reporter);
            for child_id in children {
                let Some(child) = graph.node_by_id(child_id.as_str()) else {
                    reporter.report(Problem::UnresolvedChild {
                        node: record.id.clone(),
                        containment: containment.containment.clone(),
                        child: child_id.clone(),
                    });
                    continue;
                };
                let result = match (emitting, feature.multiple) {
                    (true, true) => graph.add_child(handle, &feature, child),
                    (true, false) => graph.set_child(handle, &feature, Some(child)),
                    (false, _) => graph.add_child_directly(handle, &feature, child),
                };
                reporter.rejected(&record.id, result);
            }
        }

        for reference in &record.references {
            let Some(feature) = self.feature(
                &classifier,
                &record.id,
                &reference.reference,
                FeatureKind::Reference,
                reporter,
            ) else {
                continue;
            };
            let targets = single_shape(&feature, &record.id, &reference.reference, &reference.targets, reporter);
            for serialized in targets {
                let resolved = serialized.target_id.as_ref().and_then(|id| graph.node_by_id(id.as_str()));
                let target = match resolved {
                    Some(target) => ReferenceTarget::Resolved(target),
                    None => {
                        reporter.report(Problem::UnresolvedReferenceTarget {
                            node: record.id.clone(),
                            reference: reference.reference.clone(),
                            target: serialized.target_id.clone(),
                        });
                        ReferenceTarget::Unresolved {
                            id: serialized.target_id.clone(),
                            resolve_info: serialized.resolve_info.clone(),
                        }
                    }
                };
                let result = match (emitting, feature.multiple) {
                    (true, true) => graph.add_target(handle, &feature, target),
                    (true, false) => graph.set_target(handle, &feature, Some(target)),
                    (false, _) => graph.add_target_directly(handle, &feature, target),
                };
                reporter.rejected(&record.id, result);
            }
        }

        for annotation_id in &record.annotations {
            let Some(annotation) = graph.node_by_id(annotation_id.as_str()) else {
                reporter.report(Problem::UnresolvedAnnotation {
                    node: record.id.clone(),
                    annotation: annotation_id.clone(),
                });
                continue;
            };
            let result = if emitting {
                graph.add_annotation(handle, annotation)
            } else {
                graph.add_annotation_directly(handle, annotation)
            };
            reporter.rejected(&record.id, result);
        }
    }

    /// Resolves a feature pointer of a record against the record's
    /// classifier, reporting unknown features and features of another kind.
    fn feature(
        &self,
        classifier: &Classifier,
        node: &Id,
        pointer: &MetaPointer,
        kind: FeatureKind,
        reporter: &mut Reporter<'_>,
    ) -> Option<Arc<Feature>> {
        match self.symbols.feature_matching(classifier, pointer) {
            Some(feature) if feature.kind == kind => Some(Arc::clone(feature)),
            _ => {
                reporter.report(Problem::UnknownFeature {
                    node: node.clone(),
                    feature: pointer.clone(),
                });
                None
            }
        }
    }
}

/// Keeps only the first value for a single-valued feature, reporting the
/// surplus.
fn single_shape<'v, T>(
    feature: &Feature,
    node: &Id,
    pointer: &MetaPointer,
    values: &'v [T],
    reporter: &mut Reporter<'_>,
) -> &'v [T] {
    if feature.multiple || values.len() <= 1 {
        return values;
    }
    reporter.report(Problem::MultiplicityViolation {
        node: node.clone(),
        feature: pointer.clone(),
        count: values.len(),
    });
    &values[..1]
}

struct Reporter<'h> {
    sink: &'h mut dyn ProblemHandler,
    count: usize,
}

impl Reporter<'_> {
    fn report(&mut self, problem: Problem) {
        tracing::warn!("{problem}");
        self.count += 1;
        self.sink.report(problem);
    }

    fn rejected(&mut self, node: &Id, result: Result<(), RuntimeError>) {
        if let Err(error) = result {
            self.report(Problem::Rejected {
                node: node.clone(),
                error,
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::chunk::{SerializedContainment, SerializedProperty, SerializedReference, SerializedReferenceTarget};
    use crate::codec::serializer::serialize_nodes;
    use crate::model::{DeltaCollector, PropertyValue};
    use crate::schema::test_language::TestLanguage;

    fn record(id: &str, classifier: MetaPointer) -> SerializedNode {
        SerializedNode {
            id: Id::from(id),
            classifier,
            properties: vec![],
            containments: vec![],
            references: vec![],
            annotations: vec![],
            parent: None,
        }
    }

    fn chunk(nodes: Vec<SerializedNode>) -> SerializationChunk {
        SerializationChunk {
            nodes,
            ..SerializationChunk::empty()
        }
    }

    fn sample_graph(tl: &TestLanguage) -> Graph {
        let mut graph = Graph::new();
        let ltc = graph.create_node(&tl.link, "ltc").unwrap();
        let a = graph.create_node(&tl.datatype, "a").unwrap();
        let b = graph.create_node(&tl.datatype, "b").unwrap();
        let ann = graph.create_node(&tl.annotation, "ann").unwrap();
        graph.set_child_directly(ltc, &tl.link_feature("containment_1"), Some(a)).unwrap();
        graph.add_child_directly(ltc, &tl.link_feature("containment_0_n"), b).unwrap();
        graph
            .set_property_directly(a, &tl.datatype_feature("stringValue_1"), Some("bar".into()))
            .unwrap();
        graph
            .set_property_directly(
                b,
                &tl.datatype_feature("enumValue_1"),
                Some(PropertyValue::Literal("TestEnumeration-literal2".to_string())),
            )
            .unwrap();
        graph.add_target_directly(ltc, &tl.link_feature("reference_0_n"), b.into()).unwrap();
        graph.add_target_directly(ltc, &tl.link_feature("reference_0_n"), a.into()).unwrap();
        graph.add_annotation_directly(ltc, ann).unwrap();
        graph
    }

    #[test]
    fn test_silent_load_reconstructs_graph() {
        let tl = TestLanguage::new();
        let source = sample_graph(&tl);
        let ltc = source.node_by_id("ltc").unwrap();
        let chunk = serialize_nodes(&source, &[ltc]);

        let collector = DeltaCollector::new();
        let mut graph = Graph::with_delta_handler(collector.clone());
        let mut problems = AccumulatingProblemHandler::new();
        let roots = Deserializer::new(&tl.symbols())
            .deserialize(&chunk, &mut graph, &mut problems)
            .unwrap();

        assert!(problems.is_empty(), "{:?}", problems.problems());
        assert!(collector.is_empty());
        assert_eq!(roots.len(), 1);
        assert_eq!(graph.id_of(roots[0]).as_str(), "ltc");
        assert_eq!(serialize_nodes(&graph, &roots), chunk);

        let a = graph.node_by_id("a").unwrap();
        assert_eq!(graph.child(roots[0], &tl.link_feature("containment_1")).unwrap(), Some(a));
        assert_eq!(
            graph.property(a, &tl.datatype_feature("stringValue_1")).unwrap(),
            Some(&PropertyValue::from("bar"))
        );
    }

    #[test]
    fn test_emitting_load_produces_deltas() {
        let tl = TestLanguage::new();
        let source = sample_graph(&tl);
        let chunk = serialize_nodes(&source, &[source.node_by_id("ltc").unwrap()]);

        let collector = DeltaCollector::new();
        let mut graph = Graph::with_delta_handler(collector.clone());
        let options = DeserializeOptions {
            mode: DeserializeMode::Emitting,
            ..DeserializeOptions::default()
        };
        Deserializer::new(&tl.symbols())
            .with_options(options)
            .deserialize(&chunk, &mut graph, &mut AccumulatingProblemHandler::new())
            .unwrap();

        let kinds: Vec<&str> = collector.deltas().iter().map(|d| d.kind()).collect();
        assert_eq!(
            kinds,
            vec![
                "ChildAdded",
                "ChildAdded",
                "ReferenceAdded",
                "ReferenceAdded",
                "AnnotationAdded",
                "PropertyAdded",
                "PropertyAdded",
            ]
        );
    }

    #[test]
    fn test_unknown_classifier_skips_node() {
        let tl = TestLanguage::new();
        let mut parent = record("ltc", tl.link.meta_pointer.clone());
        parent.containments.push(SerializedContainment {
            containment: tl.link_feature("containment_0_n").meta_pointer.clone(),
            children: vec![Id::from("x"), Id::from("a")],
        });
        let chunk = chunk(vec![
            parent,
            record("x", MetaPointer::new("Elsewhere", "1", "Unknown")),
            record("a", tl.datatype.meta_pointer.clone()),
        ]);

        let mut graph = Graph::new();
        let mut problems = AccumulatingProblemHandler::new();
        let roots = Deserializer::new(&tl.symbols())
            .deserialize(&chunk, &mut graph, &mut problems)
            .unwrap();

        assert_eq!(roots.len(), 1);
        assert_eq!(graph.len(), 2);
        assert!(matches!(problems.problems()[0], Problem::UnknownClassifier { .. }));
        assert!(matches!(problems.problems()[1], Problem::UnresolvedChild { .. }));
        let a = graph.node_by_id("a").unwrap();
        assert_eq!(graph.children(roots[0], &tl.link_feature("containment_0_n")).unwrap(), &[a]);
    }

    #[test]
    fn test_unresolved_target_becomes_placeholder() {
        let tl = TestLanguage::new();
        let mut ltc = record("ltc", tl.link.meta_pointer.clone());
        ltc.references.push(SerializedReference {
            reference: tl.link_feature("reference_0_1").meta_pointer.clone(),
            targets: vec![SerializedReferenceTarget {
                target_id: Some(Id::from("later")),
                resolve_info: Some("Later".to_string()),
            }],
        });

        let mut graph = Graph::new();
        let mut problems = AccumulatingProblemHandler::new();
        let roots = Deserializer::new(&tl.symbols())
            .deserialize(&chunk(vec![ltc]), &mut graph, &mut problems)
            .unwrap();

        assert!(matches!(
            &problems.problems()[0],
            Problem::UnresolvedReferenceTarget { target: Some(id), .. } if id.as_str() == "later"
        ));
        let reference = tl.link_feature("reference_0_1");
        assert_eq!(
            graph.target(roots[0], &reference).unwrap(),
            Some(&ReferenceTarget::Unresolved {
                id: Some(Id::from("later")),
                resolve_info: Some("Later".to_string()),
            })
        );

        // A later chunk brings the target.
        let later = record("later", tl.datatype.meta_pointer.clone());
        Deserializer::new(&tl.symbols())
            .deserialize(&chunk(vec![later]), &mut graph, &mut problems)
            .unwrap();
        assert_eq!(graph.resolve_references(), 1);
        assert!(graph.target(roots[0], &reference).unwrap().is_some_and(|t| t.is_resolved()));
    }

    #[test]
    fn test_value_problems() {
        let tl = TestLanguage::new();
        let mut dtc = record("dtc", tl.datatype.meta_pointer.clone());
        dtc.properties = vec![
            SerializedProperty {
                property: tl.datatype_feature("integerValue_1").meta_pointer.clone(),
                value: Some("forty-two".to_string()),
            },
            SerializedProperty {
                property: tl.datatype_feature("enumValue_0_1").meta_pointer.clone(),
                value: Some("TestEnumeration-literal9".to_string()),
            },
            SerializedProperty {
                property: MetaPointer::new("TestLanguage", "0", "nonsense"),
                value: Some("1".to_string()),
            },
            SerializedProperty {
                property: tl.datatype_feature("stringValue_0_1").meta_pointer.clone(),
                value: None,
            },
        ];

        let mut graph = Graph::new();
        let mut problems = AccumulatingProblemHandler::new();
        Deserializer::new(&tl.symbols())
            .deserialize(&chunk(vec![dtc]), &mut graph, &mut problems)
            .unwrap();

        let problems = problems.into_problems();
        assert_eq!(problems.len(), 3);
        assert!(matches!(problems[0], Problem::InvalidPropertyValue { .. }));
        assert!(matches!(problems[1], Problem::UnknownEnumerationLiteral { .. }));
        assert!(matches!(problems[2], Problem::UnknownFeature { .. }));
        let dtc = graph.node_by_id("dtc").unwrap();
        assert_eq!(
            graph.property_directly(dtc, &tl.datatype_feature("integerValue_1")).unwrap(),
            None
        );
    }

    #[test]
    fn test_multiplicity_and_duplicates() {
        let tl = TestLanguage::new();
        let mut ltc = record("ltc", tl.link.meta_pointer.clone());
        ltc.containments.push(SerializedContainment {
            containment: tl.link_feature("containment_0_1").meta_pointer.clone(),
            children: vec![Id::from("a"), Id::from("b")],
        });
        let chunk = chunk(vec![
            ltc,
            record("a", tl.datatype.meta_pointer.clone()),
            record("b", tl.datatype.meta_pointer.clone()),
            record("a", tl.datatype.meta_pointer.clone()),
        ]);

        let mut graph = Graph::new();
        let mut problems = AccumulatingProblemHandler::new();
        let roots = Deserializer::new(&tl.symbols())
            .deserialize(&chunk, &mut graph, &mut problems)
            .unwrap();

        let problems = problems.into_problems();
        assert!(matches!(problems[0], Problem::DuplicateNodeId { .. }));
        assert!(matches!(problems[1], Problem::MultiplicityViolation { count: 2, .. }));
        let ids: Vec<&str> = roots.iter().map(|r| graph.id_of(*r).as_str()).collect();
        assert_eq!(ids, vec!["ltc", "b"]);
    }

    #[test]
    fn test_format_version_is_checked() {
        let tl = TestLanguage::new();
        let chunk = SerializationChunk {
            serialization_format_version: "2021.1".to_string(),
            ..SerializationChunk::empty()
        };
        let mut graph = Graph::new();
        let symbols = tl.symbols();
        let result = Deserializer::new(&symbols).deserialize(&chunk, &mut graph, &mut AccumulatingProblemHandler::new());
        assert!(matches!(result, Err(DecodeError::UnsupportedFormatVersion { .. })));

        let lenient = DeserializeOptions {
            check_format_version: false,
            ..DeserializeOptions::default()
        };
        let result = Deserializer::new(&symbols)
            .with_options(lenient)
            .deserialize(&chunk, &mut graph, &mut AccumulatingProblemHandler::new());
        assert_eq!(result, Ok(vec![]));
    }
}
