//! Structural validation of model graphs.
//!
//! Mutations already keep slots in shape; what they allow, and what this
//! module reports, is a graph in an intermediate state: required features
//! left unset (nodes start out empty, and direct mutations don't check
//! required-ness) and references whose targets never resolved.

use crate::error::ValidationError;
use crate::model::node::Slot;
use crate::model::{Graph, Link, NodeHandle, ReferenceTarget};

/// Validates the containment subtree of `root`, returning every finding in
/// depth-first order.
pub fn validate_subtree(graph: &Graph, root: NodeHandle) -> Vec<ValidationError> {
    let mut errors = Vec::new();
    for handle in graph.subtree(root) {
        validate_node(graph, handle, &mut errors);
    }
    tracing::debug!(root = %graph.id_of(root), errors = errors.len(), "validated subtree");
    errors
}

/// Validates every root of the graph and the subtrees below them.
pub fn validate_graph(graph: &Graph) -> Vec<ValidationError> {
    graph.roots().flat_map(|root| validate_subtree(graph, root)).collect()
}

fn validate_node(graph: &Graph, handle: NodeHandle, errors: &mut Vec<ValidationError>) {
    let node = graph.node(handle);

    for (feature, slot) in node.classifier().features().iter().zip(&node.slots) {
        let empty = match slot {
            Slot::Property(value) => value.is_none(),
            Slot::Containment(children) => {
                for child in children {
                    let held_here = matches!(
                        graph.node(*child).parentage(),
                        Some(parentage) if parentage.parent == handle
                            && matches!(&parentage.link, Link::Containment(f) if f.key() == feature.key())
                    );
                    if !held_here {
                        errors.push(ValidationError::ParentMismatch {
                            node: graph.id_of(*child).clone(),
                        });
                    }
                }
                children.is_empty()
            }
            Slot::Reference(targets) => {
                for target in targets {
                    if let ReferenceTarget::Unresolved { id, .. } = target {
                        errors.push(ValidationError::UnresolvedReference {
                            node: node.id().clone(),
                            feature: feature.name.clone(),
                            target: id.clone(),
                        });
                    }
                }
                targets.is_empty()
            }
        };
        if empty && !feature.optional {
            errors.push(ValidationError::RequiredFeatureUnset {
                node: node.id().clone(),
                kind: feature.kind,
                feature: feature.name.clone(),
            });
        }
    }

    for annotation in node.annotations() {
        let held_here = matches!(
            graph.node(*annotation).parentage(),
            Some(parentage) if parentage.parent == handle && parentage.link == Link::Annotation
        );
        if !held_here {
            errors.push(ValidationError::ParentMismatch {
                node: graph.id_of(*annotation).clone(),
            });
        }
    }

    if node.parentage().is_some() && graph.location(handle).is_none() {
        errors.push(ValidationError::ParentMismatch {
            node: node.id().clone(),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::PropertyValue;
    use crate::schema::test_language::TestLanguage;
    use crate::schema::FeatureKind;

    #[test]
    fn test_reports_unset_required_features() {
        let tl = TestLanguage::new();
        let mut graph = Graph::new();
        let dtc = graph.create_node(&tl.datatype, "dtc").unwrap();

        let errors = validate_subtree(&graph, dtc);
        let unset: Vec<&str> = errors
            .iter()
            .filter_map(|e| match e {
                ValidationError::RequiredFeatureUnset { feature, .. } => Some(feature.as_str()),
                _ => None,
            })
            .collect();
        assert_eq!(unset, vec!["booleanValue_1", "integerValue_1", "stringValue_1", "enumValue_1"]);

        graph
            .set_property_directly(dtc, &tl.datatype_feature("booleanValue_1"), Some(PropertyValue::Boolean(true)))
            .unwrap();
        graph
            .set_property_directly(dtc, &tl.datatype_feature("integerValue_1"), Some(PropertyValue::Integer(1)))
            .unwrap();
        graph
            .set_property_directly(dtc, &tl.datatype_feature("stringValue_1"), Some("x".into()))
            .unwrap();
        graph
            .set_property_directly(
                dtc,
                &tl.datatype_feature("enumValue_1"),
                Some(PropertyValue::Literal("TestEnumeration-literal1".to_string())),
            )
            .unwrap();
        assert!(validate_subtree(&graph, dtc).is_empty());
    }

    #[test]
    fn test_reports_links_and_unresolved_targets() {
        let tl = TestLanguage::new();
        let mut graph = Graph::new();
        let ltc = graph.create_node(&tl.link, "ltc").unwrap();
        let a = graph.create_node(&tl.datatype, "a").unwrap();
        graph.set_child_directly(ltc, &tl.link_feature("containment_1"), Some(a)).unwrap();
        graph
            .set_target_directly(ltc, &tl.link_feature("reference_1"), Some(ReferenceTarget::unresolved("gone")))
            .unwrap();

        let errors: Vec<ValidationError> = validate_subtree(&graph, ltc)
            .into_iter()
            .filter(|e| match e {
                ValidationError::RequiredFeatureUnset { node, .. } => node.as_str() == "ltc",
                ValidationError::UnresolvedReference { .. } => true,
                ValidationError::ParentMismatch { .. } => false,
            })
            .collect();
        assert_eq!(
            errors,
            vec![
                ValidationError::RequiredFeatureUnset {
                    node: "ltc".into(),
                    kind: FeatureKind::Containment,
                    feature: "containment_1_n".to_string(),
                },
                ValidationError::UnresolvedReference {
                    node: "ltc".into(),
                    feature: "reference_1".to_string(),
                    target: Some("gone".into()),
                },
                ValidationError::RequiredFeatureUnset {
                    node: "ltc".into(),
                    kind: FeatureKind::Reference,
                    feature: "reference_1_n".to_string(),
                },
            ]
        );
        assert!(!validate_subtree(&graph, ltc)
            .iter()
            .any(|e| matches!(e, ValidationError::ParentMismatch { .. })));
    }

    #[test]
    fn test_validate_graph_covers_all_roots() {
        let tl = TestLanguage::new();
        let mut graph = Graph::new();
        graph.create_node(&tl.datatype, "one").unwrap();
        graph.create_node(&tl.datatype, "two").unwrap();
        assert_eq!(validate_graph(&graph).len(), 8);
    }
}
