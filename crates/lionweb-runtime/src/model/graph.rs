//! The node arena.
//!
//! A [`Graph`] owns every node it created. Nodes refer to each other through
//! [`NodeHandle`]s: parentage is a relation resolved through the arena, not a
//! pointer, so a graph can be dropped as a whole without cycles to break.
//! Detached nodes stay in the arena as roots.

use std::fmt;
use std::sync::Arc;

use rustc_hash::{FxHashMap, FxHashSet};

use crate::error::RuntimeError;
use crate::model::node::Slot;
use crate::model::{validate_id, Delta, DeltaHandler, Id, Link, Node, NodeHandle, Parentage, ReferenceTarget};
use crate::schema::builtins::INAMED_NAME;
use crate::schema::{Classifier, Feature, FeatureKind};

/// Bidirectional table between node ids and handles.
#[derive(Debug, Clone, Default)]
pub struct IdMapping {
    by_id: FxHashMap<Id, NodeHandle>,
}

impl IdMapping {
    /// Looks up the node with the given id.
    pub fn get(&self, id: &str) -> Option<NodeHandle> {
        self.by_id.get(id).copied()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.by_id.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.by_id.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_id.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Id, NodeHandle)> {
        self.by_id.iter().map(|(id, handle)| (id, *handle))
    }

    fn insert(&mut self, id: Id, handle: NodeHandle) {
        self.by_id.insert(id, handle);
    }
}

/// An arena of nodes plus the delta handler their mutations report to.
#[derive(Default)]
pub struct Graph {
    nodes: Vec<Node>,
    ids: IdMapping,
    handler: Option<Box<dyn DeltaHandler>>,
}

impl fmt::Debug for Graph {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Graph")
            .field("nodes", &self.nodes)
            .field("has_delta_handler", &self.handler.is_some())
            .finish()
    }
}

impl Graph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a graph whose mutations report to the given handler.
    pub fn with_delta_handler(handler: impl DeltaHandler + 'static) -> Self {
        Self {
            handler: Some(Box::new(handler)),
            ..Self::default()
        }
    }

    /// Installs a delta handler, returning the previous one.
    pub fn set_delta_handler(&mut self, handler: impl DeltaHandler + 'static) -> Option<Box<dyn DeltaHandler>> {
        self.handler.replace(Box::new(handler))
    }

    /// Removes the delta handler; subsequent mutations emit nothing.
    pub fn take_delta_handler(&mut self) -> Option<Box<dyn DeltaHandler>> {
        self.handler.take()
    }

    pub fn has_delta_handler(&self) -> bool {
        self.handler.is_some()
    }

    /// Creates a new root node.
    ///
    /// Creating a node emits no delta: a node becomes part of the model
    /// through the delta that attaches it.
    pub fn create_node(&mut self, classifier: &Arc<Classifier>, id: impl Into<Id>) -> Result<NodeHandle, RuntimeError> {
        let id = id.into();
        if validate_id(id.as_str()).is_err() {
            return Err(RuntimeError::InvalidId { id: id.to_string() });
        }
        if self.ids.contains(id.as_str()) {
            return Err(RuntimeError::DuplicateId { id });
        }
        let handle = NodeHandle(self.nodes.len() as u32);
        self.ids.insert(id.clone(), handle);
        self.nodes.push(Node::new(id, classifier.clone()));
        Ok(handle)
    }

    /// Returns the node behind a handle.
    ///
    /// # Panics
    ///
    /// Panics if the handle was not issued by this graph.
    pub fn node(&self, handle: NodeHandle) -> &Node {
        &self.nodes[handle.index()]
    }

    pub fn get(&self, handle: NodeHandle) -> Option<&Node> {
        self.nodes.get(handle.index())
    }

    pub(crate) fn node_mut(&mut self, handle: NodeHandle) -> &mut Node {
        &mut self.nodes[handle.index()]
    }

    /// Looks up a node by id.
    pub fn node_by_id(&self, id: &str) -> Option<NodeHandle> {
        self.ids.get(id)
    }

    pub fn id_of(&self, handle: NodeHandle) -> &Id {
        self.node(handle).id()
    }

    pub fn id_mapping(&self) -> &IdMapping {
        &self.ids
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Iterates all handles in creation order.
    pub fn handles(&self) -> impl Iterator<Item = NodeHandle> + '_ {
        (0..self.nodes.len()).map(|index| NodeHandle(index as u32))
    }

    /// Iterates the handles of all nodes without a parent.
    pub fn roots(&self) -> impl Iterator<Item = NodeHandle> + '_ {
        self.handles().filter(|handle| self.node(*handle).is_root())
    }

    /// Returns the value of the built-in `name` property, if the node has one.
    pub fn name_of(&self, handle: NodeHandle) -> Option<&str> {
        let node = self.node(handle);
        let position = node.classifier().feature_position(INAMED_NAME.key())?;
        match &node.slots[position] {
            Slot::Property(Some(value)) => value.as_str(),
            _ => None,
        }
    }

    /// Iterates the ancestors of a node, nearest first.
    pub fn ancestors(&self, handle: NodeHandle) -> impl Iterator<Item = NodeHandle> + '_ {
        std::iter::successors(self.node(handle).parent(), move |h| self.node(*h).parent())
    }

    /// Returns whether `candidate` is `handle` or one of its ancestors.
    pub fn is_ancestor_or_self(&self, candidate: NodeHandle, handle: NodeHandle) -> bool {
        candidate == handle || self.ancestors(handle).any(|ancestor| ancestor == candidate)
    }

    /// Returns the subtree rooted at a node in depth-first order: the node,
    /// then its children by feature-declaration order and child index, then
    /// its annotations.
    pub fn subtree(&self, root: NodeHandle) -> Vec<NodeHandle> {
        let mut result = Vec::new();
        let mut stack = vec![root];
        while let Some(handle) = stack.pop() {
            result.push(handle);
            let node = self.node(handle);
            let before = stack.len();
            for slot in &node.slots {
                if let Slot::Containment(children) = slot {
                    stack.extend(children.iter().copied());
                }
            }
            stack.extend(node.annotations.iter().copied());
            stack[before..].reverse();
        }
        result
    }

    pub(crate) fn emit(&mut self, delta: Delta) {
        if let Some(target) = delta.target_node() {
            tracing::trace!(kind = delta.kind(), node = %self.id_of(target), "emitting delta");
        }
        if let Some(mut handler) = self.handler.take() {
            handler.handle(self, &delta);
            self.handler = Some(handler);
        }
    }

    /// Returns the position of a feature among the node's slots, checking
    /// that the node's classifier declares it with the expected kind.
    pub(crate) fn slot_position(
        &self,
        handle: NodeHandle,
        feature: &Feature,
        kind: FeatureKind,
    ) -> Result<usize, RuntimeError> {
        let classifier = self.node(handle).classifier();
        let position = classifier
            .feature_position(feature.key())
            .filter(|position| *classifier.features()[*position] == *feature)
            .ok_or_else(|| RuntimeError::FeatureNotFound {
                classifier: classifier.qualified_name(),
                feature: feature.name.clone(),
            })?;
        if feature.kind != kind {
            return Err(RuntimeError::FeatureKindMismatch {
                feature: feature.name.clone(),
                expected: kind,
                actual: feature.kind,
            });
        }
        Ok(position)
    }

    /// Returns the node's own descriptor for the feature at a position.
    pub(crate) fn feature_at(&self, handle: NodeHandle, position: usize) -> Arc<Feature> {
        self.node(handle).classifier().features()[position].clone()
    }

    pub(crate) fn unset_required(&self, handle: NodeHandle, feature: &Feature) -> RuntimeError {
        let node = self.node(handle);
        RuntimeError::UnsetRequired {
            kind: feature.kind,
            classifier: node.classifier().qualified_name(),
            feature: feature.name.clone(),
            id: node.id().clone(),
        }
    }

    pub(crate) fn unset_required_read(&self, handle: NodeHandle, feature: &Feature) -> RuntimeError {
        let node = self.node(handle);
        RuntimeError::UnsetRequiredRead {
            kind: feature.kind,
            classifier: node.classifier().qualified_name(),
            feature: feature.name.clone(),
            id: node.id().clone(),
        }
    }

    /// Fails if attaching `child` under `container` would create a cycle.
    pub(crate) fn check_acyclic(&self, container: NodeHandle, child: NodeHandle) -> Result<(), RuntimeError> {
        if self.is_ancestor_or_self(child, container) {
            return Err(RuntimeError::CyclicContainment {
                container: self.id_of(container).clone(),
                child: self.id_of(child).clone(),
            });
        }
        Ok(())
    }

    /// Returns the list a link of `parent` keeps its children in.
    fn list(&self, parent: NodeHandle, link: &Link) -> Option<&Vec<NodeHandle>> {
        let node = self.node(parent);
        match link {
            Link::Annotation => Some(&node.annotations),
            Link::Containment(feature) => {
                let position = node.classifier().feature_position(feature.key())?;
                match &node.slots[position] {
                    Slot::Containment(children) => Some(children),
                    _ => None,
                }
            }
        }
    }

    pub(crate) fn list_mut(&mut self, parent: NodeHandle, link: &Link) -> Option<&mut Vec<NodeHandle>> {
        let node = self.node_mut(parent);
        match link {
            Link::Annotation => Some(&mut node.annotations),
            Link::Containment(feature) => {
                let position = node.classifier().feature_position(feature.key())?;
                match &mut node.slots[position] {
                    Slot::Containment(children) => Some(children),
                    _ => None,
                }
            }
        }
    }

    /// Returns where a node is attached: its parentage and its index there.
    pub fn location(&self, child: NodeHandle) -> Option<(Parentage, usize)> {
        let parentage = self.node(child).parentage()?;
        let index = self
            .list(parentage.parent, &parentage.link)?
            .iter()
            .position(|h| *h == child)?;
        Some((parentage.clone(), index))
    }

    /// Removes a node from its parent, without emitting.
    ///
    /// Returns the old parentage and index, or `None` for a root.
    pub(crate) fn detach(&mut self, child: NodeHandle) -> Option<(Parentage, usize)> {
        let (parentage, index) = self.location(child)?;
        if let Some(list) = self.list_mut(parentage.parent, &parentage.link) {
            list.remove(index);
        }
        self.node_mut(child).parentage = None;
        Some((parentage, index))
    }

    /// Inserts a root node into a parent's list at `index`, without emitting.
    ///
    /// Callers check the index and the shape of the target list.
    pub(crate) fn attach(&mut self, child: NodeHandle, parentage: Parentage, index: usize) {
        if let Some(list) = self.list_mut(parentage.parent, &parentage.link) {
            list.insert(index, child);
        }
        self.node_mut(child).parentage = Some(parentage);
    }

    /// Copies the containment subtrees of `roots` under new ids, without
    /// emitting.
    ///
    /// The copies of `roots` are returned as roots. References to nodes
    /// inside the copied subtrees point to the copies; references to other
    /// nodes are kept.
    pub fn deep_duplicate<F>(&mut self, roots: &[NodeHandle], mut id_fn: F) -> Result<Vec<NodeHandle>, RuntimeError>
    where
        F: FnMut(&Id) -> Id,
    {
        let mut originals = Vec::new();
        let mut seen = FxHashSet::default();
        for root in roots {
            for handle in self.subtree(*root) {
                if seen.insert(handle) {
                    originals.push(handle);
                }
            }
        }

        let mut new_ids = Vec::with_capacity(originals.len());
        let mut taken = FxHashSet::default();
        for original in &originals {
            let id = id_fn(self.id_of(*original));
            if validate_id(id.as_str()).is_err() {
                return Err(RuntimeError::InvalidId { id: id.to_string() });
            }
            if self.ids.contains(id.as_str()) || !taken.insert(id.clone()) {
                return Err(RuntimeError::DuplicateId { id });
            }
            new_ids.push(id);
        }

        let mut copies: FxHashMap<NodeHandle, NodeHandle> = FxHashMap::default();
        for (original, id) in originals.iter().zip(new_ids) {
            let classifier = self.node(*original).classifier().clone();
            let copy = self.create_node(&classifier, id)?;
            copies.insert(*original, copy);
        }

        let map = |handle: &NodeHandle| copies.get(handle).copied().unwrap_or(*handle);
        for original in &originals {
            let source = self.node(*original);
            let slots: Vec<Slot> = source
                .slots
                .iter()
                .map(|slot| match slot {
                    Slot::Property(value) => Slot::Property(value.clone()),
                    Slot::Containment(children) => Slot::Containment(children.iter().map(map).collect()),
                    Slot::Reference(targets) => Slot::Reference(
                        targets
                            .iter()
                            .map(|target| match target {
                                ReferenceTarget::Resolved(h) => ReferenceTarget::Resolved(map(h)),
                                unresolved => unresolved.clone(),
                            })
                            .collect(),
                    ),
                })
                .collect();
            let annotations: Vec<NodeHandle> = source.annotations.iter().map(map).collect();
            let parentage = source
                .parentage
                .as_ref()
                .filter(|p| copies.contains_key(&p.parent))
                .map(|p| Parentage {
                    parent: map(&p.parent),
                    link: p.link.clone(),
                });

            let copy = self.node_mut(map(original));
            copy.slots = slots;
            copy.annotations = annotations;
            copy.parentage = parentage;
        }

        Ok(roots.iter().map(map).collect())
    }

    /// Replaces unresolved reference targets whose id now names a node of
    /// this graph, without emitting. Returns the number of targets resolved.
    pub fn resolve_references(&mut self) -> usize {
        let mut resolved = 0;
        let ids = &self.ids;
        for node in &mut self.nodes {
            for slot in &mut node.slots {
                let Slot::Reference(targets) = slot else {
                    continue;
                };
                for target in targets.iter_mut() {
                    if let ReferenceTarget::Unresolved { id: Some(id), .. } = target {
                        if let Some(handle) = ids.get(id.as_str()) {
                            *target = ReferenceTarget::Resolved(handle);
                            resolved += 1;
                        }
                    }
                }
            }
        }
        if resolved > 0 {
            tracing::debug!(resolved, "resolved reference targets");
        }
        resolved
    }
}
