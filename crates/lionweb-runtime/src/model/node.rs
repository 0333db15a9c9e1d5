//! Nodes and their per-feature value storage.

use std::sync::Arc;

use crate::model::{Id, NodeHandle, PropertyValue};
use crate::schema::{Classifier, Feature, FeatureKind};

/// How a node hangs under its parent.
#[derive(Debug, Clone, PartialEq)]
pub enum Link {
    /// Held by a containment feature of the parent.
    Containment(Arc<Feature>),
    /// Held in the annotation list of the parent.
    Annotation,
}

/// The parent of a node together with the link it is held by.
///
/// Parent and containing feature are one value so that a node is either a
/// root or fully attached.
#[derive(Debug, Clone, PartialEq)]
pub struct Parentage {
    pub parent: NodeHandle,
    pub link: Link,
}

/// The target of a reference.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ReferenceTarget {
    /// A live node of the same graph.
    Resolved(NodeHandle),
    /// A target that has no live node (yet).
    Unresolved {
        id: Option<Id>,
        resolve_info: Option<String>,
    },
}

impl ReferenceTarget {
    /// Creates a placeholder for a target known only by id.
    pub fn unresolved(id: impl Into<Id>) -> Self {
        ReferenceTarget::Unresolved {
            id: Some(id.into()),
            resolve_info: None,
        }
    }

    pub fn handle(&self) -> Option<NodeHandle> {
        match self {
            ReferenceTarget::Resolved(handle) => Some(*handle),
            ReferenceTarget::Unresolved { .. } => None,
        }
    }

    pub fn is_resolved(&self) -> bool {
        matches!(self, ReferenceTarget::Resolved(_))
    }
}

impl From<NodeHandle> for ReferenceTarget {
    fn from(handle: NodeHandle) -> Self {
        ReferenceTarget::Resolved(handle)
    }
}

/// Storage of one feature's value(s).
///
/// Single-valued links hold at most one element.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Slot {
    Property(Option<PropertyValue>),
    Containment(Vec<NodeHandle>),
    Reference(Vec<ReferenceTarget>),
}

impl Slot {
    fn for_feature(feature: &Feature) -> Self {
        match feature.kind {
            FeatureKind::Property => Slot::Property(None),
            FeatureKind::Containment => Slot::Containment(Vec::new()),
            FeatureKind::Reference => Slot::Reference(Vec::new()),
        }
    }

    pub(crate) fn is_set(&self) -> bool {
        match self {
            Slot::Property(value) => value.is_some(),
            Slot::Containment(children) => !children.is_empty(),
            Slot::Reference(targets) => !targets.is_empty(),
        }
    }
}

/// An instance of a classifier.
#[derive(Debug, Clone)]
pub struct Node {
    id: Id,
    classifier: Arc<Classifier>,
    pub(crate) parentage: Option<Parentage>,
    pub(crate) slots: Vec<Slot>,
    pub(crate) annotations: Vec<NodeHandle>,
}

impl Node {
    pub(crate) fn new(id: Id, classifier: Arc<Classifier>) -> Self {
        let slots = classifier
            .features()
            .iter()
            .map(|feature| Slot::for_feature(feature))
            .collect();
        Self {
            id,
            classifier,
            parentage: None,
            slots,
            annotations: Vec::new(),
        }
    }

    pub fn id(&self) -> &Id {
        &self.id
    }

    pub fn classifier(&self) -> &Arc<Classifier> {
        &self.classifier
    }

    pub fn parentage(&self) -> Option<&Parentage> {
        self.parentage.as_ref()
    }

    pub fn parent(&self) -> Option<NodeHandle> {
        self.parentage.as_ref().map(|p| p.parent)
    }

    /// Returns the containment this node is held by, if any.
    pub fn containment(&self) -> Option<&Arc<Feature>> {
        match self.parentage.as_ref().map(|p| &p.link) {
            Some(Link::Containment(feature)) => Some(feature),
            _ => None,
        }
    }

    pub fn annotations(&self) -> &[NodeHandle] {
        &self.annotations
    }

    pub fn is_root(&self) -> bool {
        self.parentage.is_none()
    }

    /// Returns whether the feature at the given declaration position holds a value.
    pub fn is_set(&self, position: usize) -> bool {
        self.slots.get(position).is_some_and(Slot::is_set)
    }

    pub(crate) fn children_at(&self, position: usize) -> &[NodeHandle] {
        match self.slots.get(position) {
            Some(Slot::Containment(children)) => children,
            _ => &[],
        }
    }
}
