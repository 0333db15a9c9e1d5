//! Graph → chunk.

use std::collections::BTreeSet;

use rustc_hash::FxHashSet;

use crate::codec::chunk::{
    SerializationChunk, SerializedContainment, SerializedNode, SerializedProperty, SerializedReference,
    SerializedReferenceTarget, UsedLanguage,
};
use crate::codec::value::encode_property_value;
use crate::model::node::Slot;
use crate::model::{Graph, NodeHandle, ReferenceTarget};
use crate::schema::MetaPointer;

/// Serializes the containment subtrees of `roots` into one chunk.
///
/// Nodes are visited depth-first from each root (children by
/// feature-declaration order, then annotations) and recorded once each, even
/// if they are reachable from several roots. Unset properties and empty
/// containments and references are omitted.
pub fn serialize_nodes(graph: &Graph, roots: &[NodeHandle]) -> SerializationChunk {
    let mut seen = FxHashSet::default();
    let mut languages = BTreeSet::new();
    let mut nodes = Vec::new();

    for root in roots {
        for handle in graph.subtree(*root) {
            if !seen.insert(handle) {
                continue;
            }
            let node = serialize_node(graph, handle);
            collect_languages(&node, &mut languages);
            nodes.push(node);
        }
    }

    SerializationChunk {
        nodes,
        languages: languages.into_iter().collect(),
        ..SerializationChunk::empty()
    }
}

/// Serializes a single node record.
pub fn serialize_node(graph: &Graph, handle: NodeHandle) -> SerializedNode {
    let node = graph.node(handle);
    let features = node.classifier().features();
    let mut properties = Vec::new();
    let mut containments = Vec::new();
    let mut references = Vec::new();

    for (feature, slot) in features.iter().zip(&node.slots) {
        match slot {
            Slot::Property(Some(value)) => properties.push(SerializedProperty {
                property: feature.meta_pointer.clone(),
                value: Some(encode_property_value(value)),
            }),
            Slot::Containment(children) if !children.is_empty() => {
                containments.push(SerializedContainment {
                    containment: feature.meta_pointer.clone(),
                    children: children.iter().map(|child| graph.id_of(*child).clone()).collect(),
                })
            }
            Slot::Reference(targets) if !targets.is_empty() => references.push(SerializedReference {
                reference: feature.meta_pointer.clone(),
                targets: targets.iter().map(|target| serialize_target(graph, target)).collect(),
            }),
            _ => {}
        }
    }

    SerializedNode {
        id: node.id().clone(),
        classifier: node.classifier().meta_pointer.clone(),
        properties,
        containments,
        references,
        annotations: node.annotations().iter().map(|a| graph.id_of(*a).clone()).collect(),
        parent: node.parent().map(|parent| graph.id_of(parent).clone()),
    }
}

/// Serializes a reference target.
///
/// A resolved target carries the target's name as `resolveInfo`, if it has
/// one; a placeholder keeps what it was created with.
pub fn serialize_target(graph: &Graph, target: &ReferenceTarget) -> SerializedReferenceTarget {
    match target {
        ReferenceTarget::Resolved(handle) => SerializedReferenceTarget {
            target_id: Some(graph.id_of(*handle).clone()),
            resolve_info: graph.name_of(*handle).map(str::to_string),
        },
        ReferenceTarget::Unresolved { id, resolve_info } => SerializedReferenceTarget {
            target_id: id.clone(),
            resolve_info: resolve_info.clone(),
        },
    }
}

fn collect_languages(node: &SerializedNode, languages: &mut BTreeSet<UsedLanguage>) {
    let mut add = |pointer: &MetaPointer| {
        languages.insert(UsedLanguage {
            key: pointer.language.clone(),
            version: pointer.version.clone(),
        });
    };
    add(&node.classifier);
    node.properties.iter().for_each(|p| add(&p.property));
    node.containments.iter().for_each(|c| add(&c.containment));
    node.references.iter().for_each(|r| add(&r.reference));
}
