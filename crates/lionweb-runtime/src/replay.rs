//! Replay of deltas through the non-emitting mutation path.
//!
//! A delta received from elsewhere is applied directly, so that applying it
//! doesn't produce an outbound delta of its own.

use crate::error::RuntimeError;
use crate::model::{Delta, Graph, NodeHandle, ReferenceTarget};
use crate::schema::Feature;

impl Graph {
    /// Applies a delta without emitting.
    ///
    /// Applying the deltas a graph emitted, in order, to a structurally
    /// equal graph makes the two equal again.
    pub fn apply_delta(&mut self, delta: &Delta) -> Result<(), RuntimeError> {
        tracing::debug!(kind = delta.kind(), "replaying delta");
        match delta {
            Delta::NoOp => Ok(()),

            Delta::PropertyAdded {
                container,
                property,
                value,
            } => self.set_property_directly(*container, property, Some(value.clone())).map(drop),
            Delta::PropertyChanged {
                container,
                property,
                new_value,
                ..
            } => self
                .set_property_directly(*container, property, Some(new_value.clone()))
                .map(drop),
            Delta::PropertyDeleted {
                container, property, ..
            } => self.set_property_directly(*container, property, None).map(drop),

            Delta::ChildAdded {
                parent,
                containment,
                index,
                new_child,
            } => self.insert_child_directly(*parent, containment, *new_child, *index),
            Delta::ChildDeleted {
                parent,
                containment,
                index,
                deleted_child,
            } => {
                self.expect_child_at(*parent, containment, *index, *deleted_child)?;
                self.remove_child_directly(*parent, containment, *deleted_child).map(drop)
            }
            Delta::ChildReplaced {
                parent,
                containment,
                index,
                replaced_child,
                new_child,
            } => {
                // The replaced child may already be gone when a ChildDeleted
                // for it preceded this delta.
                let children = self.children_directly(*parent, containment)?;
                if children.get(*index) == Some(replaced_child) {
                    self.replace_child_directly(*parent, containment, *index, *new_child).map(drop)
                } else {
                    self.insert_child_directly(*parent, containment, *new_child, *index)
                }
            }
            Delta::ChildMoved {
                old_parent,
                old_containment,
                old_index,
                new_parent,
                new_containment,
                new_index,
                child,
            } => {
                self.expect_child_at(*old_parent, old_containment, *old_index, *child)?;
                self.insert_child_directly(*new_parent, new_containment, *child, *new_index)
            }
            Delta::ChildMovedInSameContainment {
                parent,
                containment,
                old_index,
                new_index,
                child,
            } => {
                self.expect_child_at(*parent, containment, *old_index, *child)?;
                self.move_child_directly(*parent, containment, *old_index, *new_index)
                    .map(drop)
            }

            Delta::ReferenceAdded {
                container,
                reference,
                index,
                new_target,
            } => self.insert_target_directly(*container, reference, new_target.clone(), *index),
            Delta::ReferenceDeleted {
                container,
                reference,
                index,
                deleted_target,
            } => {
                self.expect_target_at(*container, reference, *index, deleted_target)?;
                self.remove_target_directly(*container, reference, *index).map(drop)
            }
            Delta::ReferenceReplaced {
                container,
                reference,
                index,
                replaced_target,
                new_target,
            } => {
                self.expect_target_at(*container, reference, *index, replaced_target)?;
                self.replace_target_directly(*container, reference, *index, new_target.clone())
                    .map(drop)
            }
            Delta::ReferenceMoved {
                old_container,
                old_reference,
                old_index,
                new_container,
                new_reference,
                new_index,
                target,
            } => {
                self.expect_target_at(*old_container, old_reference, *old_index, target)?;
                let moved = self.remove_target_directly(*old_container, old_reference, *old_index)?;
                if let Err(error) = self.insert_target_directly(*new_container, new_reference, moved.clone(), *new_index) {
                    // Put it back so a refused move leaves no trace.
                    self.insert_target_directly(*old_container, old_reference, moved, *old_index)?;
                    return Err(error);
                }
                Ok(())
            }
            Delta::ReferenceMovedInSameReference {
                container,
                reference,
                old_index,
                new_index,
                target,
            } => {
                self.expect_target_at(*container, reference, *old_index, target)?;
                self.move_target_directly(*container, reference, *old_index, *new_index)
                    .map(drop)
            }

            Delta::AnnotationAdded {
                parent,
                index,
                new_annotation,
            } => self.insert_annotation_directly(*parent, *new_annotation, *index),
            Delta::AnnotationDeleted {
                parent,
                index,
                deleted_annotation,
            } => {
                self.expect_annotation_at(*parent, *index, *deleted_annotation)?;
                self.remove_annotation_directly(*parent, *deleted_annotation).map(drop)
            }
            Delta::AnnotationReplaced {
                parent,
                index,
                replaced_annotation,
                new_annotation,
            } => {
                let annotations = self.node(*parent).annotations();
                if annotations.get(*index) == Some(replaced_annotation) {
                    self.replace_annotation_directly(*parent, *index, *new_annotation)
                        .map(drop)
                } else {
                    // The replaced annotation may already be gone. If it is
                    // still on this node it goes now.
                    if annotations.contains(replaced_annotation) {
                        self.remove_annotation_directly(*parent, *replaced_annotation)?;
                    }
                    self.insert_annotation_directly(*parent, *new_annotation, *index)
                }
            }
            Delta::AnnotationMovedFromOtherParent {
                old_parent,
                old_index,
                new_parent,
                new_index,
                moved_annotation,
            } => {
                self.expect_annotation_at(*old_parent, *old_index, *moved_annotation)?;
                self.insert_annotation_directly(*new_parent, *moved_annotation, *new_index)
            }
            Delta::AnnotationMovedInSameParent {
                parent,
                old_index,
                new_index,
                moved_annotation,
            } => {
                self.expect_annotation_at(*parent, *old_index, *moved_annotation)?;
                self.move_annotation_directly(*parent, *old_index, *new_index).map(drop)
            }
        }
    }

    fn expect_child_at(
        &self,
        parent: NodeHandle,
        containment: &Feature,
        index: usize,
        child: NodeHandle,
    ) -> Result<(), RuntimeError> {
        if self.children_directly(parent, containment)?.get(index) == Some(&child) {
            return Ok(());
        }
        Err(RuntimeError::DeltaMismatch {
            context: format!(
                "node with id={} isn't at index {index} of \"{}\" of node with id={}",
                self.id_of(child),
                containment.name,
                self.id_of(parent)
            ),
        })
    }

    fn expect_annotation_at(&self, parent: NodeHandle, index: usize, annotation: NodeHandle) -> Result<(), RuntimeError> {
        if self.node(parent).annotations().get(index) == Some(&annotation) {
            return Ok(());
        }
        Err(RuntimeError::DeltaMismatch {
            context: format!(
                "node with id={} isn't at index {index} of the annotations of node with id={}",
                self.id_of(annotation),
                self.id_of(parent)
            ),
        })
    }

    fn expect_target_at(
        &self,
        container: NodeHandle,
        reference: &Feature,
        index: usize,
        target: &ReferenceTarget,
    ) -> Result<(), RuntimeError> {
        if self.targets_directly(container, reference)?.get(index) == Some(target) {
            return Ok(());
        }
        Err(RuntimeError::DeltaMismatch {
            context: format!(
                "reference \"{}\" of node with id={} has no matching target at index {index}",
                reference.name,
                self.id_of(container)
            ),
        })
    }
}
