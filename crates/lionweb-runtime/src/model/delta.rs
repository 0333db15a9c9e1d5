//! Delta types: one elementary, replayable graph mutation each.
//!
//! Deltas refer to live nodes by handle and to features by descriptor. The
//! wire counterpart, which uses ids and meta-pointers instead, lives in
//! [`codec::delta`](crate::codec::delta).

use std::cell::RefCell;
use std::rc::Rc;
use std::sync::Arc;

use crate::model::{Graph, NodeHandle, PropertyValue, ReferenceTarget};
use crate::schema::Feature;

/// A single graph mutation.
#[derive(Debug, Clone, PartialEq)]
pub enum Delta {
    NoOp,

    PropertyAdded {
        container: NodeHandle,
        property: Arc<Feature>,
        value: PropertyValue,
    },
    PropertyDeleted {
        container: NodeHandle,
        property: Arc<Feature>,
        old_value: PropertyValue,
    },
    PropertyChanged {
        container: NodeHandle,
        property: Arc<Feature>,
        old_value: PropertyValue,
        new_value: PropertyValue,
    },

    ChildAdded {
        parent: NodeHandle,
        containment: Arc<Feature>,
        index: usize,
        new_child: NodeHandle,
    },
    ChildDeleted {
        parent: NodeHandle,
        containment: Arc<Feature>,
        index: usize,
        deleted_child: NodeHandle,
    },
    ChildReplaced {
        parent: NodeHandle,
        containment: Arc<Feature>,
        index: usize,
        replaced_child: NodeHandle,
        new_child: NodeHandle,
    },
    ChildMoved {
        old_parent: NodeHandle,
        old_containment: Arc<Feature>,
        old_index: usize,
        new_parent: NodeHandle,
        new_containment: Arc<Feature>,
        new_index: usize,
        child: NodeHandle,
    },
    ChildMovedInSameContainment {
        parent: NodeHandle,
        containment: Arc<Feature>,
        old_index: usize,
        new_index: usize,
        child: NodeHandle,
    },

    ReferenceAdded {
        container: NodeHandle,
        reference: Arc<Feature>,
        index: usize,
        new_target: ReferenceTarget,
    },
    ReferenceDeleted {
        container: NodeHandle,
        reference: Arc<Feature>,
        index: usize,
        deleted_target: ReferenceTarget,
    },
    ReferenceReplaced {
        container: NodeHandle,
        reference: Arc<Feature>,
        index: usize,
        replaced_target: ReferenceTarget,
        new_target: ReferenceTarget,
    },
    ReferenceMoved {
        old_container: NodeHandle,
        old_reference: Arc<Feature>,
        old_index: usize,
        new_container: NodeHandle,
        new_reference: Arc<Feature>,
        new_index: usize,
        target: ReferenceTarget,
    },
    ReferenceMovedInSameReference {
        container: NodeHandle,
        reference: Arc<Feature>,
        old_index: usize,
        new_index: usize,
        target: ReferenceTarget,
    },

    AnnotationAdded {
        parent: NodeHandle,
        index: usize,
        new_annotation: NodeHandle,
    },
    AnnotationDeleted {
        parent: NodeHandle,
        index: usize,
        deleted_annotation: NodeHandle,
    },
    AnnotationReplaced {
        parent: NodeHandle,
        index: usize,
        replaced_annotation: NodeHandle,
        new_annotation: NodeHandle,
    },
    AnnotationMovedFromOtherParent {
        old_parent: NodeHandle,
        old_index: usize,
        new_parent: NodeHandle,
        new_index: usize,
        moved_annotation: NodeHandle,
    },
    AnnotationMovedInSameParent {
        parent: NodeHandle,
        old_index: usize,
        new_index: usize,
        moved_annotation: NodeHandle,
    },
}

impl Delta {
    /// Returns the wire tag of this delta.
    pub fn kind(&self) -> &'static str {
        match self {
            Delta::NoOp => "NoOp",
            Delta::PropertyAdded { .. } => "PropertyAdded",
            Delta::PropertyDeleted { .. } => "PropertyDeleted",
            Delta::PropertyChanged { .. } => "PropertyChanged",
            Delta::ChildAdded { .. } => "ChildAdded",
            Delta::ChildDeleted { .. } => "ChildDeleted",
            Delta::ChildReplaced { .. } => "ChildReplaced",
            Delta::ChildMoved { .. } => "ChildMoved",
            Delta::ChildMovedInSameContainment { .. } => "ChildMovedInSameContainment",
            Delta::ReferenceAdded { .. } => "ReferenceAdded",
            Delta::ReferenceDeleted { .. } => "ReferenceDeleted",
            Delta::ReferenceReplaced { .. } => "ReferenceReplaced",
            Delta::ReferenceMoved { .. } => "ReferenceMoved",
            Delta::ReferenceMovedInSameReference { .. } => "ReferenceMovedInSameReference",
            Delta::AnnotationAdded { .. } => "AnnotationAdded",
            Delta::AnnotationDeleted { .. } => "AnnotationDeleted",
            Delta::AnnotationReplaced { .. } => "AnnotationReplaced",
            Delta::AnnotationMovedFromOtherParent { .. } => "AnnotationMovedFromOtherParent",
            Delta::AnnotationMovedInSameParent { .. } => "AnnotationMovedInSameParent",
        }
    }

    /// Returns the node whose feature (or annotation list) received the change.
    pub fn target_node(&self) -> Option<NodeHandle> {
        match self {
            Delta::NoOp => None,
            Delta::PropertyAdded { container, .. }
            | Delta::PropertyDeleted { container, .. }
            | Delta::PropertyChanged { container, .. }
            | Delta::ReferenceAdded { container, .. }
            | Delta::ReferenceDeleted { container, .. }
            | Delta::ReferenceReplaced { container, .. }
            | Delta::ReferenceMovedInSameReference { container, .. } => Some(*container),
            Delta::ChildAdded { parent, .. }
            | Delta::ChildDeleted { parent, .. }
            | Delta::ChildReplaced { parent, .. }
            | Delta::ChildMovedInSameContainment { parent, .. }
            | Delta::AnnotationAdded { parent, .. }
            | Delta::AnnotationDeleted { parent, .. }
            | Delta::AnnotationReplaced { parent, .. }
            | Delta::AnnotationMovedInSameParent { parent, .. } => Some(*parent),
            Delta::ChildMoved { new_parent, .. } | Delta::AnnotationMovedFromOtherParent { new_parent, .. } => {
                Some(*new_parent)
            }
            Delta::ReferenceMoved { new_container, .. } => Some(*new_container),
        }
    }
}

/// Sink for emitted deltas.
///
/// Invoked synchronously, once per delta, in mutation order. The graph is
/// passed in its post-mutation state.
pub trait DeltaHandler {
    fn handle(&mut self, graph: &Graph, delta: &Delta);
}

impl<F> DeltaHandler for F
where
    F: FnMut(&Graph, &Delta),
{
    fn handle(&mut self, graph: &Graph, delta: &Delta) {
        self(graph, delta)
    }
}

/// A handler that records every delta it receives.
///
/// Clones share the same buffer, so one clone can be installed on a graph
/// while another is kept for inspection.
#[derive(Debug, Clone, Default)]
pub struct DeltaCollector {
    deltas: Rc<RefCell<Vec<Delta>>>,
}

impl DeltaCollector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.deltas.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.deltas.borrow().is_empty()
    }

    /// Returns a copy of the recorded deltas.
    pub fn deltas(&self) -> Vec<Delta> {
        self.deltas.borrow().clone()
    }

    /// Removes and returns the recorded deltas.
    pub fn take(&self) -> Vec<Delta> {
        std::mem::take(&mut *self.deltas.borrow_mut())
    }
}

impl DeltaHandler for DeltaCollector {
    fn handle(&mut self, _graph: &Graph, delta: &Delta) {
        self.deltas.borrow_mut().push(delta.clone());
    }
}
