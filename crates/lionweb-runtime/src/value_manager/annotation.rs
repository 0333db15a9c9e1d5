//! Annotation list reads and writes.
//!
//! Annotations are owned like children, but live in a per-node list that
//! isn't a feature. Only instances of annotation classifiers can be
//! annotations.

use crate::error::RuntimeError;
use crate::model::{Delta, Graph, Link, NodeHandle, Parentage};
use crate::value_manager::check_index;

impl Graph {
    fn check_annotation(&self, node: NodeHandle, annotation: NodeHandle) -> Result<(), RuntimeError> {
        let annotation_node = self.node(annotation);
        if !annotation_node.classifier().is_annotation() {
            return Err(RuntimeError::NotAnAnnotation {
                id: annotation_node.id().clone(),
                classifier: annotation_node.classifier().qualified_name(),
            });
        }
        self.check_acyclic(node, annotation)
    }

    fn annotated_by(node: NodeHandle) -> Parentage {
        Parentage {
            parent: node,
            link: Link::Annotation,
        }
    }

    /// Appends an annotation to a node.
    pub fn add_annotation(&mut self, node: NodeHandle, annotation: NodeHandle) -> Result<(), RuntimeError> {
        let len = self.node(node).annotations().len();
        self.insert_annotation(node, annotation, len)
    }

    /// Inserts an annotation at `index` (`0..=len`).
    ///
    /// Emits `AnnotationAdded`, `AnnotationMovedFromOtherParent`, or, for an
    /// annotation already on this node, `AnnotationMovedInSameParent`.
    pub fn insert_annotation(&mut self, node: NodeHandle, annotation: NodeHandle, index: usize) -> Result<(), RuntimeError> {
        check_index(index, self.node(node).annotations().len(), true)?;
        self.check_annotation(node, annotation)?;

        let here = Self::annotated_by(node);
        match self.location(annotation) {
            Some((parentage, old_index)) if parentage == here => {
                let new_index = if index > old_index { index - 1 } else { index };
                if new_index == old_index {
                    return Ok(());
                }
                self.move_annotation_directly(node, old_index, new_index)?;
                self.emit(Delta::AnnotationMovedInSameParent {
                    parent: node,
                    old_index,
                    new_index,
                    moved_annotation: annotation,
                });
            }
            Some((Parentage { parent: old_parent, .. }, old_index)) => {
                self.detach(annotation);
                self.attach(annotation, here, index);
                self.emit(Delta::AnnotationMovedFromOtherParent {
                    old_parent,
                    old_index,
                    new_parent: node,
                    new_index: index,
                    moved_annotation: annotation,
                });
            }
            None => {
                self.attach(annotation, here, index);
                self.emit(Delta::AnnotationAdded {
                    parent: node,
                    index,
                    new_annotation: annotation,
                });
            }
        }
        Ok(())
    }

    /// Appends an annotation without emitting.
    pub fn add_annotation_directly(&mut self, node: NodeHandle, annotation: NodeHandle) -> Result<(), RuntimeError> {
        let annotations = self.node(node).annotations();
        let len = annotations.len() - usize::from(annotations.contains(&annotation));
        self.insert_annotation_directly(node, annotation, len)
    }

    /// Inserts an annotation at `index` without emitting. The annotation is
    /// first detached from wherever it is; `index` refers to the list after that.
    pub fn insert_annotation_directly(
        &mut self,
        node: NodeHandle,
        annotation: NodeHandle,
        index: usize,
    ) -> Result<(), RuntimeError> {
        let annotations = self.node(node).annotations();
        let len = annotations.len() - usize::from(annotations.contains(&annotation));
        check_index(index, len, true)?;
        self.check_annotation(node, annotation)?;

        self.detach(annotation);
        self.attach(annotation, Self::annotated_by(node), index);
        Ok(())
    }

    /// Removes an annotation, emitting `AnnotationDeleted`. Removing a node
    /// that isn't an annotation of `node` is a no-op.
    pub fn remove_annotation(&mut self, node: NodeHandle, annotation: NodeHandle) -> Result<(), RuntimeError> {
        if let Some(index) = self.remove_annotation_directly(node, annotation)? {
            self.emit(Delta::AnnotationDeleted {
                parent: node,
                index,
                deleted_annotation: annotation,
            });
        }
        Ok(())
    }

    /// Removes an annotation without emitting. Returns the index it was at.
    pub fn remove_annotation_directly(
        &mut self,
        node: NodeHandle,
        annotation: NodeHandle,
    ) -> Result<Option<usize>, RuntimeError> {
        let Some(index) = self.node(node).annotations().iter().position(|a| *a == annotation) else {
            return Ok(None);
        };
        self.detach(annotation);
        Ok(Some(index))
    }

    /// Moves an annotation within a node's list, emitting
    /// `AnnotationMovedInSameParent` unless the indices are equal.
    pub fn move_annotation(&mut self, node: NodeHandle, old_index: usize, new_index: usize) -> Result<(), RuntimeError> {
        if let Some(moved_annotation) = self.move_annotation_directly(node, old_index, new_index)? {
            self.emit(Delta::AnnotationMovedInSameParent {
                parent: node,
                old_index,
                new_index,
                moved_annotation,
            });
        }
        Ok(())
    }

    /// Moves an annotation within a node's list without emitting.
    pub fn move_annotation_directly(
        &mut self,
        node: NodeHandle,
        old_index: usize,
        new_index: usize,
    ) -> Result<Option<NodeHandle>, RuntimeError> {
        let len = self.node(node).annotations().len();
        check_index(old_index, len, false)?;
        check_index(new_index, len, false)?;
        if old_index == new_index {
            return Ok(None);
        }
        let annotations = &mut self.node_mut(node).annotations;
        let moved = annotations.remove(old_index);
        annotations.insert(new_index, moved);
        Ok(Some(moved))
    }

    /// Replaces the annotation at `index`, emitting `AnnotationReplaced`.
    /// The replaced annotation becomes a root.
    pub fn replace_annotation(
        &mut self,
        node: NodeHandle,
        index: usize,
        new_annotation: NodeHandle,
    ) -> Result<(), RuntimeError> {
        let Some(replaced_annotation) = self.replace_annotation_directly(node, index, new_annotation)? else {
            return Ok(());
        };
        self.emit(Delta::AnnotationReplaced {
            parent: node,
            index,
            replaced_annotation,
            new_annotation,
        });
        Ok(())
    }

    /// Replaces the annotation at `index` without emitting.
    ///
    /// `index` refers to the list before the replacement; when the new
    /// annotation already sits earlier in the same list, it ends up one
    /// position lower. Returns the replaced annotation, or `None` if the new
    /// one was already there.
    pub fn replace_annotation_directly(
        &mut self,
        node: NodeHandle,
        index: usize,
        new_annotation: NodeHandle,
    ) -> Result<Option<NodeHandle>, RuntimeError> {
        let annotations = self.node(node).annotations();
        check_index(index, annotations.len(), false)?;
        let replaced = annotations[index];
        if replaced == new_annotation {
            return Ok(None);
        }
        self.check_annotation(node, new_annotation)?;

        let here = Self::annotated_by(node);
        self.detach(replaced);
        let new_index = match self.location(new_annotation) {
            Some((parentage, at)) if parentage == here && at < index => index - 1,
            _ => index,
        };
        self.detach(new_annotation);
        self.attach(new_annotation, here, new_index);
        Ok(Some(replaced))
    }
}
