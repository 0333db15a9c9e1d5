//! Wire form of deltas.
//!
//! Every [`Delta`] variant has one [`SerializedDelta`] counterpart that
//! refers to nodes by id and to features by meta-pointer. Deltas that bring
//! a subtree into a parent, or take one out, embed that subtree as a chunk
//! so a receiver doesn't need to fetch it.

use std::cell::RefCell;
use std::rc::Rc;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::codec::chunk::{SerializationChunk, SerializedReferenceTarget};
use crate::codec::deserializer::{Deserializer, ProblemHandler};
use crate::codec::serializer::{serialize_nodes, serialize_target};
use crate::codec::value::{decode_property_value, encode_property_value};
use crate::error::DecodeError;
use crate::model::{Delta, DeltaHandler, Graph, Id, NodeHandle, PropertyValue, ReferenceTarget};
use crate::schema::{Feature, MetaPointer, SymbolTable};

/// A delta as it travels between peers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all_fields = "camelCase")]
pub enum SerializedDelta {
    NoOp,

    PropertyAdded {
        container: Id,
        property: MetaPointer,
        value: String,
    },
    PropertyDeleted {
        container: Id,
        property: MetaPointer,
        old_value: String,
    },
    PropertyChanged {
        container: Id,
        property: MetaPointer,
        old_value: String,
        new_value: String,
    },

    ChildAdded {
        parent: Id,
        containment: MetaPointer,
        index: usize,
        new_child: Id,
        new_nodes: SerializationChunk,
    },
    ChildDeleted {
        parent: Id,
        containment: MetaPointer,
        index: usize,
        deleted_child: Id,
        deleted_nodes: SerializationChunk,
    },
    ChildReplaced {
        parent: Id,
        containment: MetaPointer,
        index: usize,
        replaced_child: Id,
        replaced_nodes: SerializationChunk,
        new_child: Id,
        new_nodes: SerializationChunk,
    },
    ChildMoved {
        old_parent: Id,
        old_containment: MetaPointer,
        old_index: usize,
        new_parent: Id,
        new_containment: MetaPointer,
        new_index: usize,
        child: Id,
    },
    ChildMovedInSameContainment {
        parent: Id,
        containment: MetaPointer,
        old_index: usize,
        new_index: usize,
        child: Id,
    },

    ReferenceAdded {
        container: Id,
        reference: MetaPointer,
        index: usize,
        new_target: SerializedReferenceTarget,
    },
    ReferenceDeleted {
        container: Id,
        reference: MetaPointer,
        index: usize,
        deleted_target: SerializedReferenceTarget,
    },
    ReferenceReplaced {
        container: Id,
        reference: MetaPointer,
        index: usize,
        replaced_target: SerializedReferenceTarget,
        new_target: SerializedReferenceTarget,
    },
    ReferenceMoved {
        old_container: Id,
        old_reference: MetaPointer,
        old_index: usize,
        new_container: Id,
        new_reference: MetaPointer,
        new_index: usize,
        target: SerializedReferenceTarget,
    },
    ReferenceMovedInSameReference {
        container: Id,
        reference: MetaPointer,
        old_index: usize,
        new_index: usize,
        target: SerializedReferenceTarget,
    },

    AnnotationAdded {
        parent: Id,
        index: usize,
        new_annotation: Id,
        new_annotation_nodes: SerializationChunk,
    },
    AnnotationDeleted {
        parent: Id,
        index: usize,
        deleted_annotation: Id,
        deleted_annotation_nodes: SerializationChunk,
    },
    AnnotationReplaced {
        parent: Id,
        index: usize,
        replaced_annotation: Id,
        replaced_annotation_nodes: SerializationChunk,
        new_annotation: Id,
        new_annotation_nodes: SerializationChunk,
    },
    AnnotationMovedFromOtherParent {
        old_parent: Id,
        old_index: usize,
        new_parent: Id,
        new_index: usize,
        moved_annotation: Id,
    },
    AnnotationMovedInSameParent {
        parent: Id,
        old_index: usize,
        new_index: usize,
        moved_annotation: Id,
    },
}

/// Serializes a delta against the graph that emitted it.
///
/// Must be called while the graph is still in the state the delta left it
/// in, since embedded subtrees are read from it.
pub fn serialize_delta(graph: &Graph, delta: &Delta) -> SerializedDelta {
    let id = |handle: &NodeHandle| graph.id_of(*handle).clone();
    let pointer = |feature: &Arc<Feature>| feature.meta_pointer.clone();
    let nodes = |handle: &NodeHandle| serialize_nodes(graph, &[*handle]);
    let target = |target: &ReferenceTarget| serialize_target(graph, target);

    match delta {
        Delta::NoOp => SerializedDelta::NoOp,

        Delta::PropertyAdded {
            container,
            property,
            value,
        } => SerializedDelta::PropertyAdded {
            container: id(container),
            property: pointer(property),
            value: encode_property_value(value),
        },
        Delta::PropertyDeleted {
            container,
            property,
            old_value,
        } => SerializedDelta::PropertyDeleted {
            container: id(container),
            property: pointer(property),
            old_value: encode_property_value(old_value),
        },
        Delta::PropertyChanged {
            container,
            property,
            old_value,
            new_value,
        } => SerializedDelta::PropertyChanged {
            container: id(container),
            property: pointer(property),
            old_value: encode_property_value(old_value),
            new_value: encode_property_value(new_value),
        },

        Delta::ChildAdded {
            parent,
            containment,
            index,
            new_child,
        } => SerializedDelta::ChildAdded {
            parent: id(parent),
            containment: pointer(containment),
            index: *index,
            new_child: id(new_child),
            new_nodes: nodes(new_child),
        },
        Delta::ChildDeleted {
            parent,
            containment,
            index,
            deleted_child,
        } => SerializedDelta::ChildDeleted {
            parent: id(parent),
            containment: pointer(containment),
            index: *index,
            deleted_child: id(deleted_child),
            deleted_nodes: nodes(deleted_child),
        },
        Delta::ChildReplaced {
            parent,
            containment,
            index,
            replaced_child,
            new_child,
        } => SerializedDelta::ChildReplaced {
            parent: id(parent),
            containment: pointer(containment),
            index: *index,
            replaced_child: id(replaced_child),
            replaced_nodes: nodes(replaced_child),
            new_child: id(new_child),
            new_nodes: nodes(new_child),
        },
        Delta::ChildMoved {
            old_parent,
            old_containment,
            old_index,
            new_parent,
            new_containment,
            new_index,
            child,
        } => SerializedDelta::ChildMoved {
            old_parent: id(old_parent),
            old_containment: pointer(old_containment),
            old_index: *old_index,
            new_parent: id(new_parent),
            new_containment: pointer(new_containment),
            new_index: *new_index,
            child: id(child),
        },
        Delta::ChildMovedInSameContainment {
            parent,
            containment,
            old_index,
            new_index,
            child,
        } => SerializedDelta::ChildMovedInSameContainment {
            parent: id(parent),
            containment: pointer(containment),
            old_index: *old_index,
            new_index: *new_index,
            child: id(child),
        },

        Delta::ReferenceAdded {
            container,
            reference,
            index,
            new_target,
        } => SerializedDelta::ReferenceAdded {
            container: id(container),
            reference: pointer(reference),
            index: *index,
            new_target: target(new_target),
        },
        Delta::ReferenceDeleted {
            container,
            reference,
            index,
            deleted_target,
        } => SerializedDelta::ReferenceDeleted {
            container: id(container),
            reference: pointer(reference),
            index: *index,
            deleted_target: target(deleted_target),
        },
        Delta::ReferenceReplaced {
            container,
            reference,
            index,
            replaced_target,
            new_target,
        } => SerializedDelta::ReferenceReplaced {
            container: id(container),
            reference: pointer(reference),
            index: *index,
            replaced_target: target(replaced_target),
            new_target: target(new_target),
        },
        Delta::ReferenceMoved {
            old_container,
            old_reference,
            old_index,
            new_container,
            new_reference,
            new_index,
            target: moved,
        } => SerializedDelta::ReferenceMoved {
            old_container: id(old_container),
            old_reference: pointer(old_reference),
            old_index: *old_index,
            new_container: id(new_container),
            new_reference: pointer(new_reference),
            new_index: *new_index,
            target: target(moved),
        },
        Delta::ReferenceMovedInSameReference {
            container,
            reference,
            old_index,
            new_index,
            target: moved,
        } => SerializedDelta::ReferenceMovedInSameReference {
            container: id(container),
            reference: pointer(reference),
            old_index: *old_index,
            new_index: *new_index,
            target: target(moved),
        },

        Delta::AnnotationAdded {
            parent,
            index,
            new_annotation,
        } => SerializedDelta::AnnotationAdded {
            parent: id(parent),
            index: *index,
            new_annotation: id(new_annotation),
            new_annotation_nodes: nodes(new_annotation),
        },
        Delta::AnnotationDeleted {
            parent,
            index,
            deleted_annotation,
        } => SerializedDelta::AnnotationDeleted {
            parent: id(parent),
            index: *index,
            deleted_annotation: id(deleted_annotation),
            deleted_annotation_nodes: nodes(deleted_annotation),
        },
        Delta::AnnotationReplaced {
            parent,
            index,
            replaced_annotation,
            new_annotation,
        } => SerializedDelta::AnnotationReplaced {
            parent: id(parent),
            index: *index,
            replaced_annotation: id(replaced_annotation),
            replaced_annotation_nodes: nodes(replaced_annotation),
            new_annotation: id(new_annotation),
            new_annotation_nodes: nodes(new_annotation),
        },
        Delta::AnnotationMovedFromOtherParent {
            old_parent,
            old_index,
            new_parent,
            new_index,
            moved_annotation,
        } => SerializedDelta::AnnotationMovedFromOtherParent {
            old_parent: id(old_parent),
            old_index: *old_index,
            new_parent: id(new_parent),
            new_index: *new_index,
            moved_annotation: id(moved_annotation),
        },
        Delta::AnnotationMovedInSameParent {
            parent,
            old_index,
            new_index,
            moved_annotation,
        } => SerializedDelta::AnnotationMovedInSameParent {
            parent: id(parent),
            old_index: *old_index,
            new_index: *new_index,
            moved_annotation: id(moved_annotation),
        },
    }
}

/// Turns wire deltas back into typed deltas against a receiving graph.
///
/// Feature meta-pointers must be known to the symbol table; a node id
/// unknown to the graph fails, except for the node a delta brings in, which
/// is instantiated from the embedded chunk first. Problems met while
/// instantiating go to the caller's [`ProblemHandler`].
#[derive(Debug, Clone, Copy)]
pub struct DeltaDeserializer<'a> {
    symbols: &'a SymbolTable,
}

impl<'a> DeltaDeserializer<'a> {
    pub fn new(symbols: &'a SymbolTable) -> Self {
        Self { symbols }
    }

    pub fn deserialize(
        &self,
        delta: &SerializedDelta,
        graph: &mut Graph,
        problems: &mut dyn ProblemHandler,
    ) -> Result<Delta, DecodeError> {
        Ok(match delta {
            SerializedDelta::NoOp => Delta::NoOp,

            SerializedDelta::PropertyAdded {
                container,
                property,
                value,
            } => {
                let property = self.feature(property)?;
                Delta::PropertyAdded {
                    container: node(graph, container)?,
                    value: decode_value(&property, value)?,
                    property,
                }
            }
            SerializedDelta::PropertyDeleted {
                container,
                property,
                old_value,
            } => {
                let property = self.feature(property)?;
                Delta::PropertyDeleted {
                    container: node(graph, container)?,
                    old_value: decode_value(&property, old_value)?,
                    property,
                }
            }
            SerializedDelta::PropertyChanged {
                container,
                property,
                old_value,
                new_value,
            } => {
                let property = self.feature(property)?;
                Delta::PropertyChanged {
                    container: node(graph, container)?,
                    old_value: decode_value(&property, old_value)?,
                    new_value: decode_value(&property, new_value)?,
                    property,
                }
            }

            SerializedDelta::ChildAdded {
                parent,
                containment,
                index,
                new_child,
                new_nodes,
            } => Delta::ChildAdded {
                parent: node(graph, parent)?,
                containment: self.feature(containment)?,
                index: *index,
                new_child: self.node_or_instantiate(graph, new_child, new_nodes, problems)?,
            },
            SerializedDelta::ChildDeleted {
                parent,
                containment,
                index,
                deleted_child,
                ..
            } => Delta::ChildDeleted {
                parent: node(graph, parent)?,
                containment: self.feature(containment)?,
                index: *index,
                deleted_child: node(graph, deleted_child)?,
            },
            SerializedDelta::ChildReplaced {
                parent,
                containment,
                index,
                replaced_child,
                new_child,
                new_nodes,
                ..
            } => Delta::ChildReplaced {
                parent: node(graph, parent)?,
                containment: self.feature(containment)?,
                index: *index,
                replaced_child: node(graph, replaced_child)?,
                new_child: self.node_or_instantiate(graph, new_child, new_nodes, problems)?,
            },
            SerializedDelta::ChildMoved {
                old_parent,
                old_containment,
                old_index,
                new_parent,
                new_containment,
                new_index,
                child,
            } => Delta::ChildMoved {
                old_parent: node(graph, old_parent)?,
                old_containment: self.feature(old_containment)?,
                old_index: *old_index,
                new_parent: node(graph, new_parent)?,
                new_containment: self.feature(new_containment)?,
                new_index: *new_index,
                child: node(graph, child)?,
            },
            SerializedDelta::ChildMovedInSameContainment {
                parent,
                containment,
                old_index,
                new_index,
                child,
            } => Delta::ChildMovedInSameContainment {
                parent: node(graph, parent)?,
                containment: self.feature(containment)?,
                old_index: *old_index,
                new_index: *new_index,
                child: node(graph, child)?,
            },

            SerializedDelta::ReferenceAdded {
                container,
                reference,
                index,
                new_target,
            } => Delta::ReferenceAdded {
                container: node(graph, container)?,
                reference: self.feature(reference)?,
                index: *index,
                new_target: target(graph, new_target),
            },
            SerializedDelta::ReferenceDeleted {
                container,
                reference,
                index,
                deleted_target,
            } => Delta::ReferenceDeleted {
                container: node(graph, container)?,
                reference: self.feature(reference)?,
                index: *index,
                deleted_target: target(graph, deleted_target),
            },
            SerializedDelta::ReferenceReplaced {
                container,
                reference,
                index,
                replaced_target,
                new_target,
            } => Delta::ReferenceReplaced {
                container: node(graph, container)?,
                reference: self.feature(reference)?,
                index: *index,
                replaced_target: target(graph, replaced_target),
                new_target: target(graph, new_target),
            },
            SerializedDelta::ReferenceMoved {
                old_container,
                old_reference,
                old_index,
                new_container,
                new_reference,
                new_index,
                target: moved,
            } => Delta::ReferenceMoved {
                old_container: node(graph, old_container)?,
                old_reference: self.feature(old_reference)?,
                old_index: *old_index,
                new_container: node(graph, new_container)?,
                new_reference: self.feature(new_reference)?,
                new_index: *new_index,
                target: target(graph, moved),
            },
            SerializedDelta::ReferenceMovedInSameReference {
                container,
                reference,
                old_index,
                new_index,
                target: moved,
            } => Delta::ReferenceMovedInSameReference {
                container: node(graph, container)?,
                reference: self.feature(reference)?,
                old_index: *old_index,
                new_index: *new_index,
                target: target(graph, moved),
            },

            SerializedDelta::AnnotationAdded {
                parent,
                index,
                new_annotation,
                new_annotation_nodes,
            } => Delta::AnnotationAdded {
                parent: node(graph, parent)?,
                index: *index,
                new_annotation: self.node_or_instantiate(graph, new_annotation, new_annotation_nodes, problems)?,
            },
            SerializedDelta::AnnotationDeleted {
                parent,
                index,
                deleted_annotation,
                ..
            } => Delta::AnnotationDeleted {
                parent: node(graph, parent)?,
                index: *index,
                deleted_annotation: node(graph, deleted_annotation)?,
            },
            SerializedDelta::AnnotationReplaced {
                parent,
                index,
                replaced_annotation,
                new_annotation,
                new_annotation_nodes,
                ..
            } => Delta::AnnotationReplaced {
                parent: node(graph, parent)?,
                index: *index,
                replaced_annotation: node(graph, replaced_annotation)?,
                new_annotation: self.node_or_instantiate(graph, new_annotation, new_annotation_nodes, problems)?,
            },
            SerializedDelta::AnnotationMovedFromOtherParent {
                old_parent,
                old_index,
                new_parent,
                new_index,
                moved_annotation,
            } => Delta::AnnotationMovedFromOtherParent {
                old_parent: node(graph, old_parent)?,
                old_index: *old_index,
                new_parent: node(graph, new_parent)?,
                new_index: *new_index,
                moved_annotation: node(graph, moved_annotation)?,
            },
            SerializedDelta::AnnotationMovedInSameParent {
                parent,
                old_index,
                new_index,
                moved_annotation,
            } => Delta::AnnotationMovedInSameParent {
                parent: node(graph, parent)?,
                old_index: *old_index,
                new_index: *new_index,
                moved_annotation: node(graph, moved_annotation)?,
            },
        })
    }

    fn feature(&self, pointer: &MetaPointer) -> Result<Arc<Feature>, DecodeError> {
        self.symbols
            .feature(pointer)
            .cloned()
            .ok_or_else(|| DecodeError::UnknownFeatureMetaPointer {
                feature: pointer.clone(),
            })
    }

    fn node_or_instantiate(
        &self,
        graph: &mut Graph,
        id: &Id,
        nodes: &SerializationChunk,
        problems: &mut dyn ProblemHandler,
    ) -> Result<NodeHandle, DecodeError> {
        if let Some(handle) = graph.node_by_id(id.as_str()) {
            return Ok(handle);
        }
        Deserializer::new(self.symbols).deserialize(nodes, graph, problems)?;
        node(graph, id)
    }
}

fn node(graph: &Graph, id: &Id) -> Result<NodeHandle, DecodeError> {
    graph
        .node_by_id(id.as_str())
        .ok_or_else(|| DecodeError::UnknownNodeId { id: id.clone() })
}

fn target(graph: &Graph, target: &SerializedReferenceTarget) -> ReferenceTarget {
    match target.target_id.as_ref().and_then(|id| graph.node_by_id(id.as_str())) {
        Some(handle) => ReferenceTarget::Resolved(handle),
        None => ReferenceTarget::Unresolved {
            id: target.target_id.clone(),
            resolve_info: target.resolve_info.clone(),
        },
    }
}

fn decode_value(property: &Feature, text: &str) -> Result<PropertyValue, DecodeError> {
    decode_property_value(property, text).map_err(|e| DecodeError::InvalidPropertyValue {
        property: property.meta_pointer.clone(),
        value: text.to_string(),
        reason: e.to_string(),
    })
}

/// Decodes a wire delta and applies it to `graph` without emitting.
///
/// Problems in a subtree the delta brings in are reported to `problems`;
/// they don't stop the delta from being applied.
pub fn replay_serialized_delta(
    graph: &mut Graph,
    symbols: &SymbolTable,
    delta: &SerializedDelta,
    problems: &mut dyn ProblemHandler,
) -> Result<Delta, DecodeError> {
    let delta = DeltaDeserializer::new(symbols).deserialize(delta, graph, problems)?;
    graph.apply_delta(&delta)?;
    Ok(delta)
}

/// A handler that serializes every delta as it is emitted.
///
/// Clones share the same buffer.
#[derive(Debug, Clone, Default)]
pub struct SerializedDeltaCollector {
    deltas: Rc<RefCell<Vec<SerializedDelta>>>,
}

impl SerializedDeltaCollector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.deltas.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.deltas.borrow().is_empty()
    }

    pub fn deltas(&self) -> Vec<SerializedDelta> {
        self.deltas.borrow().clone()
    }

    pub fn take(&self) -> Vec<SerializedDelta> {
        std::mem::take(&mut *self.deltas.borrow_mut())
    }
}

impl DeltaHandler for SerializedDeltaCollector {
    fn handle(&mut self, graph: &Graph, delta: &Delta) {
        self.deltas.borrow_mut().push(serialize_delta(graph, delta));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::deserializer::AccumulatingProblemHandler;
    use crate::error::Problem;
    use crate::schema::test_language::TestLanguage;

    #[test]
    fn test_wire_shape() {
        let tl = TestLanguage::new();
        let mut graph = Graph::new();
        let ltc = graph.create_node(&tl.link, "ltc").unwrap();
        let a = graph.create_node(&tl.datatype, "a").unwrap();
        graph.add_child_directly(ltc, &tl.link_feature("containment_0_n"), a).unwrap();

        let delta = Delta::ChildAdded {
            parent: ltc,
            containment: tl.link_feature("containment_0_n"),
            index: 0,
            new_child: a,
        };
        let json = serde_json::to_value(serialize_delta(&graph, &delta)).unwrap();
        assert_eq!(json["kind"], "ChildAdded");
        assert_eq!(json["parent"], "ltc");
        assert_eq!(json["newChild"], "a");
        assert_eq!(json["containment"]["key"], "LinkTestConcept-containment_0_n");
        assert_eq!(json["newNodes"]["nodes"][0]["id"], "a");
        assert_eq!(json["newNodes"]["nodes"][0]["parent"], "ltc");

        let noop = serde_json::to_value(SerializedDelta::NoOp).unwrap();
        assert_eq!(noop, serde_json::json!({ "kind": "NoOp" }));
    }

    #[test]
    fn test_new_subtree_is_instantiated_on_receipt() {
        let tl = TestLanguage::new();
        let collector = SerializedDeltaCollector::new();
        let mut source = Graph::with_delta_handler(collector.clone());
        let mut replica = Graph::new();
        for graph in [&mut source, &mut replica] {
            graph.create_node(&tl.link, "ltc").unwrap();
        }
        let ltc = source.node_by_id("ltc").unwrap();
        let inner = source.create_node(&tl.link, "inner").unwrap();
        let leaf = source.create_node(&tl.datatype, "leaf").unwrap();
        source.add_child_directly(inner, &tl.link_feature("containment_0_n"), leaf).unwrap();
        source
            .set_property_directly(leaf, &tl.datatype_feature("integerValue_1"), Some(PropertyValue::Integer(3)))
            .unwrap();
        source.set_child(ltc, &tl.link_feature("containment_0_1"), Some(inner)).unwrap();

        let deltas = collector.take();
        assert_eq!(deltas.len(), 1);
        let applied = replay_serialized_delta(&mut replica, &tl.symbols(), &deltas[0], &mut AccumulatingProblemHandler::new()).unwrap();
        assert_eq!(applied.kind(), "ChildAdded");

        let ltc = replica.node_by_id("ltc").unwrap();
        let inner = replica.node_by_id("inner").unwrap();
        let leaf = replica.node_by_id("leaf").unwrap();
        assert_eq!(replica.child(ltc, &tl.link_feature("containment_0_1")).unwrap(), Some(inner));
        assert_eq!(replica.node(leaf).parent(), Some(inner));
        assert_eq!(
            replica.property(leaf, &tl.datatype_feature("integerValue_1")).unwrap(),
            Some(&PropertyValue::Integer(3))
        );
    }

    #[test]
    fn test_unknown_feature_is_fatal() {
        let tl = TestLanguage::new();
        let mut graph = Graph::new();
        graph.create_node(&tl.datatype, "dtc").unwrap();
        let delta = SerializedDelta::PropertyAdded {
            container: Id::from("dtc"),
            property: MetaPointer::new("TestLanguage", "1", "DataTypeTestConcept-stringValue_1"),
            value: "bar".to_string(),
        };
        let error = DeltaDeserializer::new(&tl.symbols())
            .deserialize(&delta, &mut graph, &mut AccumulatingProblemHandler::new())
            .unwrap_err();
        assert!(matches!(error, DecodeError::UnknownFeatureMetaPointer { .. }));
        assert_eq!(error.code().code(), "E002");
    }

    #[test]
    fn test_unknown_node_and_bad_value() {
        let tl = TestLanguage::new();
        let symbols = tl.symbols();
        let mut graph = Graph::new();
        graph.create_node(&tl.datatype, "dtc").unwrap();
        let property = tl.datatype_feature("integerValue_1").meta_pointer.clone();

        let missing = SerializedDelta::PropertyAdded {
            container: Id::from("nobody"),
            property: property.clone(),
            value: "1".to_string(),
        };
        assert!(matches!(
            DeltaDeserializer::new(&symbols).deserialize(&missing, &mut graph, &mut AccumulatingProblemHandler::new()),
            Err(DecodeError::UnknownNodeId { .. })
        ));

        let garbled = SerializedDelta::PropertyAdded {
            container: Id::from("dtc"),
            property,
            value: "one".to_string(),
        };
        assert!(matches!(
            DeltaDeserializer::new(&symbols).deserialize(&garbled, &mut graph, &mut AccumulatingProblemHandler::new()),
            Err(DecodeError::InvalidPropertyValue { .. })
        ));
    }

    #[test]
    fn test_unresolved_target_survives_the_wire() {
        let tl = TestLanguage::new();
        let mut graph = Graph::new();
        let ltc = graph.create_node(&tl.link, "ltc").unwrap();
        let delta = Delta::ReferenceAdded {
            container: ltc,
            reference: tl.link_feature("reference_0_n"),
            index: 0,
            new_target: ReferenceTarget::Unresolved {
                id: None,
                resolve_info: Some("Bob".to_string()),
            },
        };
        let wire = serialize_delta(&graph, &delta);
        let decoded = DeltaDeserializer::new(&tl.symbols())
            .deserialize(&wire, &mut graph, &mut AccumulatingProblemHandler::new())
            .unwrap();
        assert_eq!(decoded, delta);
    }

    #[test]
    fn test_embedded_chunk_problems_reach_the_caller() {
        let tl = TestLanguage::new();
        let collector = SerializedDeltaCollector::new();
        let mut source = Graph::with_delta_handler(collector.clone());
        let mut replica = Graph::new();
        for graph in [&mut source, &mut replica] {
            graph.create_node(&tl.link, "ltc").unwrap();
        }
        let ltc = source.node_by_id("ltc").unwrap();
        let inner = source.create_node(&tl.link, "inner").unwrap();
        source
            .add_target_directly(inner, &tl.link_feature("reference_0_n"), ReferenceTarget::unresolved("ghost"))
            .unwrap();
        source.set_child(ltc, &tl.link_feature("containment_0_1"), Some(inner)).unwrap();

        let mut problems = AccumulatingProblemHandler::new();
        replay_serialized_delta(&mut replica, &tl.symbols(), &collector.take()[0], &mut problems).unwrap();
        assert!(matches!(
            problems.problems(),
            [Problem::UnresolvedReferenceTarget { .. }]
        ));
        assert!(replica.node_by_id("inner").is_some());
    }
}
