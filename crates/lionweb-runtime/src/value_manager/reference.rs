//! Reference reads and writes.
//!
//! References don't own their targets: setting one never changes the
//! target's parentage, and a node may be the target of any number of
//! references. A stored target may be an unresolved placeholder.

use crate::error::RuntimeError;
use crate::model::node::Slot;
use crate::model::{Delta, Graph, NodeHandle, ReferenceTarget};
use crate::schema::{Feature, FeatureKind};
use crate::value_manager::{check_index, expect_multiple, expect_single};

impl Graph {
    fn targets_at(&self, node: NodeHandle, position: usize) -> &[ReferenceTarget] {
        match &self.node(node).slots[position] {
            Slot::Reference(targets) => targets,
            _ => &[],
        }
    }

    fn targets_at_mut(&mut self, node: NodeHandle, position: usize) -> Option<&mut Vec<ReferenceTarget>> {
        match &mut self.node_mut(node).slots[position] {
            Slot::Reference(targets) => Some(targets),
            _ => None,
        }
    }

    /// Reads a single-valued reference.
    ///
    /// An unresolved placeholder is returned as such; use
    /// [`resolved_target`](Self::resolved_target) to require a live node.
    pub fn target(&self, node: NodeHandle, reference: &Feature) -> Result<Option<&ReferenceTarget>, RuntimeError> {
        let position = self.slot_position(node, reference, FeatureKind::Reference)?;
        expect_single(reference)?;
        let target = self.targets_at(node, position).first();
        if target.is_none() && !reference.optional {
            return Err(self.unset_required_read(node, reference));
        }
        Ok(target)
    }

    /// Reads a single-valued reference, failing with
    /// [`RuntimeError::UnresolvedReference`] for a placeholder.
    pub fn resolved_target(&self, node: NodeHandle, reference: &Feature) -> Result<Option<NodeHandle>, RuntimeError> {
        match self.target(node, reference)? {
            None => Ok(None),
            Some(ReferenceTarget::Resolved(handle)) => Ok(Some(*handle)),
            Some(ReferenceTarget::Unresolved { id, .. }) => {
                Err(RuntimeError::UnresolvedReference { target: id.clone() })
            }
        }
    }

    /// Reads a multi-valued reference.
    pub fn targets(&self, node: NodeHandle, reference: &Feature) -> Result<&[ReferenceTarget], RuntimeError> {
        let position = self.slot_position(node, reference, FeatureKind::Reference)?;
        expect_multiple(reference)?;
        let targets = self.targets_at(node, position);
        if targets.is_empty() && !reference.optional {
            return Err(self.unset_required_read(node, reference));
        }
        Ok(targets)
    }

    /// Reads the targets of any reference, without the required-ness check.
    pub fn targets_directly(&self, node: NodeHandle, reference: &Feature) -> Result<&[ReferenceTarget], RuntimeError> {
        let position = self.slot_position(node, reference, FeatureKind::Reference)?;
        Ok(self.targets_at(node, position))
    }

    /// Sets (or, with `None`, clears) a single-valued reference.
    ///
    /// Emits `ReferenceAdded`, `ReferenceReplaced` or `ReferenceDeleted`;
    /// clearing a required reference fails with
    /// [`RuntimeError::UnsetRequired`].
    pub fn set_target(
        &mut self,
        node: NodeHandle,
        reference: &Feature,
        new_target: Option<ReferenceTarget>,
    ) -> Result<(), RuntimeError> {
        let position = self.slot_position(node, reference, FeatureKind::Reference)?;
        expect_single(reference)?;
        let old_target = self.targets_at(node, position).first().cloned();
        if old_target == new_target {
            return Ok(());
        }
        if new_target.is_none() && !reference.optional {
            return Err(self.unset_required(node, reference));
        }

        if let Some(targets) = self.targets_at_mut(node, position) {
            targets.clear();
            targets.extend(new_target.clone());
        }
        let reference = self.feature_at(node, position);
        let delta = match (old_target, new_target) {
            (None, Some(new_target)) => Delta::ReferenceAdded {
                container: node,
                reference,
                index: 0,
                new_target,
            },
            (Some(deleted_target), None) => Delta::ReferenceDeleted {
                container: node,
                reference,
                index: 0,
                deleted_target,
            },
            (Some(replaced_target), Some(new_target)) => Delta::ReferenceReplaced {
                container: node,
                reference,
                index: 0,
                replaced_target,
                new_target,
            },
            (None, None) => return Ok(()),
        };
        self.emit(delta);
        Ok(())
    }

    /// Sets or clears a single-valued reference without emitting. Returns
    /// the old target.
    pub fn set_target_directly(
        &mut self,
        node: NodeHandle,
        reference: &Feature,
        new_target: Option<ReferenceTarget>,
    ) -> Result<Option<ReferenceTarget>, RuntimeError> {
        let position = self.slot_position(node, reference, FeatureKind::Reference)?;
        expect_single(reference)?;
        let Some(targets) = self.targets_at_mut(node, position) else {
            return Ok(None);
        };
        let old_target = targets.pop();
        targets.extend(new_target);
        Ok(old_target)
    }

    /// Appends a target to a multi-valued reference.
    pub fn add_target(
        &mut self,
        node: NodeHandle,
        reference: &Feature,
        target: ReferenceTarget,
    ) -> Result<(), RuntimeError> {
        let position = self.slot_position(node, reference, FeatureKind::Reference)?;
        let len = self.targets_at(node, position).len();
        self.insert_target(node, reference, target, len)
    }

    /// Inserts a target into a multi-valued reference at `index` (`0..=len`),
    /// emitting `ReferenceAdded`.
    pub fn insert_target(
        &mut self,
        node: NodeHandle,
        reference: &Feature,
        target: ReferenceTarget,
        index: usize,
    ) -> Result<(), RuntimeError> {
        let position = self.slot_position(node, reference, FeatureKind::Reference)?;
        expect_multiple(reference)?;
        self.insert_target_directly(node, reference, target.clone(), index)?;
        let reference = self.feature_at(node, position);
        self.emit(Delta::ReferenceAdded {
            container: node,
            reference,
            index,
            new_target: target,
        });
        Ok(())
    }

    /// Appends a target to a reference without emitting.
    pub fn add_target_directly(
        &mut self,
        node: NodeHandle,
        reference: &Feature,
        target: ReferenceTarget,
    ) -> Result<(), RuntimeError> {
        let position = self.slot_position(node, reference, FeatureKind::Reference)?;
        let len = self.targets_at(node, position).len();
        self.insert_target_directly(node, reference, target, len)
    }

    /// Inserts a target at `index` without emitting. A single-valued
    /// reference only accepts a target while it is empty.
    pub fn insert_target_directly(
        &mut self,
        node: NodeHandle,
        reference: &Feature,
        target: ReferenceTarget,
        index: usize,
    ) -> Result<(), RuntimeError> {
        let position = self.slot_position(node, reference, FeatureKind::Reference)?;
        let len = self.targets_at(node, position).len();
        check_index(index, len, true)?;
        if !reference.multiple && len > 0 {
            return Err(RuntimeError::SlotOccupied {
                kind: FeatureKind::Reference,
                feature: reference.name.clone(),
                id: self.id_of(node).clone(),
            });
        }
        if let Some(targets) = self.targets_at_mut(node, position) {
            targets.insert(index, target);
        }
        Ok(())
    }

    /// Removes the first occurrence of a target from a multi-valued
    /// reference, emitting `ReferenceDeleted`.
    ///
    /// Removing a target that isn't present is a no-op. Removing the last
    /// target of a required reference fails with
    /// [`RuntimeError::UnsetRequired`].
    pub fn remove_target(
        &mut self,
        node: NodeHandle,
        reference: &Feature,
        target: &ReferenceTarget,
    ) -> Result<(), RuntimeError> {
        let position = self.slot_position(node, reference, FeatureKind::Reference)?;
        expect_multiple(reference)?;
        let targets = self.targets_at(node, position);
        let Some(index) = targets.iter().position(|t| t == target) else {
            return Ok(());
        };
        if targets.len() == 1 && !reference.optional {
            return Err(self.unset_required(node, reference));
        }
        let deleted_target = self.remove_target_directly(node, reference, index)?;
        let reference = self.feature_at(node, position);
        self.emit(Delta::ReferenceDeleted {
            container: node,
            reference,
            index,
            deleted_target,
        });
        Ok(())
    }

    /// Removes the target at `index` without emitting, returning it.
    pub fn remove_target_directly(
        &mut self,
        node: NodeHandle,
        reference: &Feature,
        index: usize,
    ) -> Result<ReferenceTarget, RuntimeError> {
        let position = self.slot_position(node, reference, FeatureKind::Reference)?;
        let len = self.targets_at(node, position).len();
        check_index(index, len, false)?;
        match self.targets_at_mut(node, position) {
            Some(targets) => Ok(targets.remove(index)),
            None => Err(RuntimeError::IndexOutOfBounds { index, len }),
        }
    }

    /// Moves a target within a multi-valued reference, emitting
    /// `ReferenceMovedInSameReference` unless the indices are equal.
    pub fn move_target(
        &mut self,
        node: NodeHandle,
        reference: &Feature,
        old_index: usize,
        new_index: usize,
    ) -> Result<(), RuntimeError> {
        let position = self.slot_position(node, reference, FeatureKind::Reference)?;
        expect_multiple(reference)?;
        if let Some(target) = self.move_target_directly(node, reference, old_index, new_index)? {
            let reference = self.feature_at(node, position);
            self.emit(Delta::ReferenceMovedInSameReference {
                container: node,
                reference,
                old_index,
                new_index,
                target,
            });
        }
        Ok(())
    }

    /// Moves a target within a reference without emitting. Returns the
    /// moved target, or `None` if the indices are equal.
    pub fn move_target_directly(
        &mut self,
        node: NodeHandle,
        reference: &Feature,
        old_index: usize,
        new_index: usize,
    ) -> Result<Option<ReferenceTarget>, RuntimeError> {
        let position = self.slot_position(node, reference, FeatureKind::Reference)?;
        let len = self.targets_at(node, position).len();
        check_index(old_index, len, false)?;
        check_index(new_index, len, false)?;
        if old_index == new_index {
            return Ok(None);
        }
        let Some(targets) = self.targets_at_mut(node, position) else {
            return Ok(None);
        };
        let target = targets.remove(old_index);
        targets.insert(new_index, target.clone());
        Ok(Some(target))
    }

    /// Moves the target at `old_index` of one reference to `new_index` of
    /// another (possibly on another node), emitting one `ReferenceMoved`.
    ///
    /// Within a single reference this is [`move_target`](Self::move_target).
    pub fn move_target_to(
        &mut self,
        old_container: NodeHandle,
        old_reference: &Feature,
        old_index: usize,
        new_container: NodeHandle,
        new_reference: &Feature,
        new_index: usize,
    ) -> Result<(), RuntimeError> {
        if old_container == new_container && old_reference == new_reference {
            return self.move_target(old_container, old_reference, old_index, new_index);
        }
        let old_position = self.slot_position(old_container, old_reference, FeatureKind::Reference)?;
        let new_position = self.slot_position(new_container, new_reference, FeatureKind::Reference)?;
        let old_len = self.targets_at(old_container, old_position).len();
        check_index(old_index, old_len, false)?;
        if old_len == 1 && !old_reference.optional {
            return Err(self.unset_required(old_container, old_reference));
        }
        // Validates index and shape of the destination before anything moves.
        let new_len = self.targets_at(new_container, new_position).len();
        check_index(new_index, new_len, true)?;
        if !new_reference.multiple && new_len > 0 {
            return Err(RuntimeError::SlotOccupied {
                kind: FeatureKind::Reference,
                feature: new_reference.name.clone(),
                id: self.id_of(new_container).clone(),
            });
        }

        let target = self.remove_target_directly(old_container, old_reference, old_index)?;
        self.insert_target_directly(new_container, new_reference, target.clone(), new_index)?;
        let old_reference = self.feature_at(old_container, old_position);
        let new_reference = self.feature_at(new_container, new_position);
        self.emit(Delta::ReferenceMoved {
            old_container,
            old_reference,
            old_index,
            new_container,
            new_reference,
            new_index,
            target,
        });
        Ok(())
    }

    /// Replaces the target at `index`, emitting `ReferenceReplaced` unless
    /// the new target equals the old one.
    pub fn replace_target(
        &mut self,
        node: NodeHandle,
        reference: &Feature,
        index: usize,
        new_target: ReferenceTarget,
    ) -> Result<(), RuntimeError> {
        let position = self.slot_position(node, reference, FeatureKind::Reference)?;
        let replaced_target = self.replace_target_directly(node, reference, index, new_target.clone())?;
        if replaced_target == new_target {
            return Ok(());
        }
        let reference = self.feature_at(node, position);
        self.emit(Delta::ReferenceReplaced {
            container: node,
            reference,
            index,
            replaced_target,
            new_target,
        });
        Ok(())
    }

    /// Replaces the target at `index` without emitting, returning the old one.
    pub fn replace_target_directly(
        &mut self,
        node: NodeHandle,
        reference: &Feature,
        index: usize,
        new_target: ReferenceTarget,
    ) -> Result<ReferenceTarget, RuntimeError> {
        let position = self.slot_position(node, reference, FeatureKind::Reference)?;
        let len = self.targets_at(node, position).len();
        check_index(index, len, false)?;
        match self.targets_at_mut(node, position) {
            Some(targets) => Ok(std::mem::replace(&mut targets[index], new_target)),
            None => Err(RuntimeError::IndexOutOfBounds { index, len }),
        }
    }
}
