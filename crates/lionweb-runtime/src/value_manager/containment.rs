//! Containment reads and writes.
//!
//! A containment owns its children: attaching a child anywhere detaches it
//! from where it was, and a cross-parent move is reported as one
//! `ChildMoved` rather than a delete followed by an add.

use crate::error::RuntimeError;
use crate::model::{Delta, Graph, Link, NodeHandle, Parentage};
use crate::schema::{Feature, FeatureKind};
use crate::value_manager::{check_index, expect_multiple, expect_single};

impl Graph {
    /// Reads a single-valued containment.
    pub fn child(&self, node: NodeHandle, containment: &Feature) -> Result<Option<NodeHandle>, RuntimeError> {
        let position = self.slot_position(node, containment, FeatureKind::Containment)?;
        expect_single(containment)?;
        let child = self.node(node).children_at(position).first().copied();
        if child.is_none() && !containment.optional {
            return Err(self.unset_required_read(node, containment));
        }
        Ok(child)
    }

    /// Reads a multi-valued containment.
    pub fn children(&self, node: NodeHandle, containment: &Feature) -> Result<&[NodeHandle], RuntimeError> {
        let position = self.slot_position(node, containment, FeatureKind::Containment)?;
        expect_multiple(containment)?;
        let children = self.node(node).children_at(position);
        if children.is_empty() && !containment.optional {
            return Err(self.unset_required_read(node, containment));
        }
        Ok(children)
    }

    /// Reads the children of any containment, without the required-ness check.
    pub fn children_directly(&self, node: NodeHandle, containment: &Feature) -> Result<&[NodeHandle], RuntimeError> {
        let position = self.slot_position(node, containment, FeatureKind::Containment)?;
        Ok(self.node(node).children_at(position))
    }

    /// Checks that `child` may be held by `containment` of `node`.
    fn check_containable(&self, node: NodeHandle, containment: &Feature, child: NodeHandle) -> Result<(), RuntimeError> {
        let child_node = self.node(child);
        if child_node.classifier().is_annotation() {
            return Err(RuntimeError::AnnotationInContainment {
                id: child_node.id().clone(),
                feature: containment.name.clone(),
            });
        }
        self.check_acyclic(node, child)
    }

    /// Sets (or, with `None`, clears) a single-valued containment.
    ///
    /// - none → X: `ChildMoved` if X was attached elsewhere, else `ChildAdded`.
    /// - Y → none: `ChildDeleted`; fails with [`RuntimeError::UnsetRequired`]
    ///   if the containment is required.
    /// - Y → X: `ChildDeleted` for Y if it is still held here, then
    ///   `ChildReplaced`. X is taken from wherever it was.
    pub fn set_child(
        &mut self,
        node: NodeHandle,
        containment: &Feature,
        new_child: Option<NodeHandle>,
    ) -> Result<(), RuntimeError> {
        let position = self.slot_position(node, containment, FeatureKind::Containment)?;
        expect_single(containment)?;
        let feature = self.feature_at(node, position);
        let old_child = self.node(node).children_at(position).first().copied();
        let here = Parentage {
            parent: node,
            link: Link::Containment(feature.clone()),
        };

        match (old_child, new_child) {
            (None, None) => Ok(()),
            (Some(old), Some(new)) if old == new => Ok(()),
            (None, Some(new)) => {
                self.check_containable(node, containment, new)?;
                let previous = self.detach(new);
                self.attach(new, here, 0);
                let delta = match previous {
                    Some((Parentage { parent: old_parent, link: Link::Containment(old_containment) }, old_index)) => {
                        Delta::ChildMoved {
                            old_parent,
                            old_containment,
                            old_index,
                            new_parent: node,
                            new_containment: feature,
                            new_index: 0,
                            child: new,
                        }
                    }
                    _ => Delta::ChildAdded {
                        parent: node,
                        containment: feature,
                        index: 0,
                        new_child: new,
                    },
                };
                self.emit(delta);
                Ok(())
            }
            (Some(old), None) => {
                if !containment.optional {
                    return Err(self.unset_required(node, containment));
                }
                self.detach(old);
                self.emit(Delta::ChildDeleted {
                    parent: node,
                    containment: feature,
                    index: 0,
                    deleted_child: old,
                });
                Ok(())
            }
            (Some(old), Some(new)) => {
                self.check_containable(node, containment, new)?;
                let old_held_here = self.node(old).parentage() == Some(&here);
                self.detach(old);
                self.detach(new);
                self.attach(new, here, 0);
                if old_held_here {
                    self.emit(Delta::ChildDeleted {
                        parent: node,
                        containment: feature.clone(),
                        index: 0,
                        deleted_child: old,
                    });
                }
                self.emit(Delta::ChildReplaced {
                    parent: node,
                    containment: feature,
                    index: 0,
                    replaced_child: old,
                    new_child: new,
                });
                Ok(())
            }
        }
    }

    /// Sets or clears a single-valued containment without emitting.
    /// Returns the child that was replaced.
    pub fn set_child_directly(
        &mut self,
        node: NodeHandle,
        containment: &Feature,
        new_child: Option<NodeHandle>,
    ) -> Result<Option<NodeHandle>, RuntimeError> {
        let position = self.slot_position(node, containment, FeatureKind::Containment)?;
        expect_single(containment)?;
        let old_child = self.node(node).children_at(position).first().copied();
        if old_child == new_child {
            return Ok(None);
        }
        if let Some(new) = new_child {
            self.check_containable(node, containment, new)?;
        }
        if let Some(old) = old_child {
            self.detach(old);
        }
        if let Some(new) = new_child {
            self.detach(new);
            let here = Parentage {
                parent: node,
                link: Link::Containment(self.feature_at(node, position)),
            };
            self.attach(new, here, 0);
        }
        Ok(old_child)
    }

    /// Appends a child to a multi-valued containment.
    pub fn add_child(&mut self, node: NodeHandle, containment: &Feature, child: NodeHandle) -> Result<(), RuntimeError> {
        let position = self.slot_position(node, containment, FeatureKind::Containment)?;
        let len = self.node(node).children_at(position).len();
        self.insert_child(node, containment, child, len)
    }

    /// Inserts a child into a multi-valued containment at `index` (`0..=len`).
    ///
    /// A child without parent is reported as `ChildAdded`. A child held
    /// elsewhere is detached and reported as one `ChildMoved`. A child
    /// already held by this containment is moved within it and reported as
    /// `ChildMovedInSameContainment`, or not at all if its position doesn't
    /// change.
    pub fn insert_child(
        &mut self,
        node: NodeHandle,
        containment: &Feature,
        child: NodeHandle,
        index: usize,
    ) -> Result<(), RuntimeError> {
        let position = self.slot_position(node, containment, FeatureKind::Containment)?;
        expect_multiple(containment)?;
        let len = self.node(node).children_at(position).len();
        check_index(index, len, true)?;
        self.check_containable(node, containment, child)?;

        let feature = self.feature_at(node, position);
        let here = Parentage {
            parent: node,
            link: Link::Containment(feature.clone()),
        };
        match self.location(child) {
            Some((parentage, old_index)) if parentage == here => {
                let new_index = if index > old_index { index - 1 } else { index };
                if new_index == old_index {
                    return Ok(());
                }
                self.move_child_directly(node, containment, old_index, new_index)?;
                self.emit(Delta::ChildMovedInSameContainment {
                    parent: node,
                    containment: feature,
                    old_index,
                    new_index,
                    child,
                });
            }
            Some((Parentage { parent: old_parent, link }, old_index)) => {
                self.detach(child);
                self.attach(child, here, index);
                if let Link::Containment(old_containment) = link {
                    self.emit(Delta::ChildMoved {
                        old_parent,
                        old_containment,
                        old_index,
                        new_parent: node,
                        new_containment: feature,
                        new_index: index,
                        child,
                    });
                }
            }
            None => {
                self.attach(child, here, index);
                self.emit(Delta::ChildAdded {
                    parent: node,
                    containment: feature,
                    index,
                    new_child: child,
                });
            }
        }
        Ok(())
    }

    /// Appends a child to a containment without emitting.
    pub fn add_child_directly(
        &mut self,
        node: NodeHandle,
        containment: &Feature,
        child: NodeHandle,
    ) -> Result<(), RuntimeError> {
        let position = self.slot_position(node, containment, FeatureKind::Containment)?;
        let children = self.node(node).children_at(position);
        let len = children.len() - usize::from(children.contains(&child));
        self.insert_child_directly(node, containment, child, len)
    }

    /// Inserts a child into a containment at `index` without emitting.
    ///
    /// The child is first detached from wherever it is, including this
    /// containment; `index` refers to the list after that. A single-valued
    /// containment only accepts a child while it is empty.
    pub fn insert_child_directly(
        &mut self,
        node: NodeHandle,
        containment: &Feature,
        child: NodeHandle,
        index: usize,
    ) -> Result<(), RuntimeError> {
        let position = self.slot_position(node, containment, FeatureKind::Containment)?;
        let children = self.node(node).children_at(position);
        let len = children.len() - usize::from(children.contains(&child));
        check_index(index, len, true)?;
        if !containment.multiple && len > 0 {
            return Err(RuntimeError::SlotOccupied {
                kind: FeatureKind::Containment,
                feature: containment.name.clone(),
                id: self.id_of(node).clone(),
            });
        }
        self.check_containable(node, containment, child)?;

        self.detach(child);
        let here = Parentage {
            parent: node,
            link: Link::Containment(self.feature_at(node, position)),
        };
        self.attach(child, here, index);
        Ok(())
    }

    /// Replaces the child at `index` without emitting. Returns the child
    /// that was there.
    pub fn replace_child_directly(
        &mut self,
        node: NodeHandle,
        containment: &Feature,
        index: usize,
        new_child: NodeHandle,
    ) -> Result<NodeHandle, RuntimeError> {
        let position = self.slot_position(node, containment, FeatureKind::Containment)?;
        let children = self.node(node).children_at(position);
        check_index(index, children.len(), false)?;
        let old_child = children[index];
        if old_child == new_child {
            return Ok(old_child);
        }
        self.check_containable(node, containment, new_child)?;

        let here = Parentage {
            parent: node,
            link: Link::Containment(self.feature_at(node, position)),
        };
        self.detach(old_child);
        let new_index = match self.location(new_child) {
            Some((parentage, at)) if parentage == here && at < index => index - 1,
            _ => index,
        };
        self.detach(new_child);
        self.attach(new_child, here, new_index);
        Ok(old_child)
    }

    /// Removes a child from a multi-valued containment.
    ///
    /// Removing a node that isn't a child is a no-op. Removing the last
    /// child of a required containment fails with
    /// [`RuntimeError::UnsetRequired`].
    pub fn remove_child(&mut self, node: NodeHandle, containment: &Feature, child: NodeHandle) -> Result<(), RuntimeError> {
        let position = self.slot_position(node, containment, FeatureKind::Containment)?;
        expect_multiple(containment)?;
        let children = self.node(node).children_at(position);
        let Some(index) = children.iter().position(|c| *c == child) else {
            return Ok(());
        };
        if children.len() == 1 && !containment.optional {
            return Err(self.unset_required(node, containment));
        }
        self.detach(child);
        let feature = self.feature_at(node, position);
        self.emit(Delta::ChildDeleted {
            parent: node,
            containment: feature,
            index,
            deleted_child: child,
        });
        Ok(())
    }

    /// Removes a child from a containment without emitting. Returns the
    /// index it was at, or `None` if it wasn't a child.
    pub fn remove_child_directly(
        &mut self,
        node: NodeHandle,
        containment: &Feature,
        child: NodeHandle,
    ) -> Result<Option<usize>, RuntimeError> {
        let position = self.slot_position(node, containment, FeatureKind::Containment)?;
        let Some(index) = self.node(node).children_at(position).iter().position(|c| *c == child) else {
            return Ok(None);
        };
        self.detach(child);
        Ok(Some(index))
    }

    /// Moves a child within a multi-valued containment. Both indices must
    /// address existing children.
    pub fn move_child(
        &mut self,
        node: NodeHandle,
        containment: &Feature,
        old_index: usize,
        new_index: usize,
    ) -> Result<(), RuntimeError> {
        let position = self.slot_position(node, containment, FeatureKind::Containment)?;
        expect_multiple(containment)?;
        if let Some(child) = self.move_child_directly(node, containment, old_index, new_index)? {
            let feature = self.feature_at(node, position);
            self.emit(Delta::ChildMovedInSameContainment {
                parent: node,
                containment: feature,
                old_index,
                new_index,
                child,
            });
        }
        Ok(())
    }

    /// Moves a child within a containment without emitting. Returns the
    /// moved child, or `None` if the indices are equal.
    pub fn move_child_directly(
        &mut self,
        node: NodeHandle,
        containment: &Feature,
        old_index: usize,
        new_index: usize,
    ) -> Result<Option<NodeHandle>, RuntimeError> {
        let position = self.slot_position(node, containment, FeatureKind::Containment)?;
        let len = self.node(node).children_at(position).len();
        check_index(old_index, len, false)?;
        check_index(new_index, len, false)?;
        if old_index == new_index {
            return Ok(None);
        }
        let link = Link::Containment(self.feature_at(node, position));
        let Some(children) = self.list_mut(node, &link) else {
            return Ok(None);
        };
        let child = children.remove(old_index);
        children.insert(new_index, child);
        Ok(Some(child))
    }
}

#[cfg(test)]
mod tests {
    use crate::error::RuntimeError;
    use crate::model::{Delta, DeltaCollector, Graph};
    use crate::schema::test_language::TestLanguage;

    #[test]
    fn test_setting_a_single_value() {
        let tl = TestLanguage::new();
        let collector = DeltaCollector::new();
        let mut graph = Graph::with_delta_handler(collector.clone());
        let ltc = graph.create_node(&tl.link, "ltc").unwrap();
        let dtc = graph.create_node(&tl.datatype, "dtc").unwrap();
        let containment_1 = tl.link_feature("containment_1");

        let err = graph.child(ltc, &containment_1).unwrap_err();
        assert_eq!(
            err.to_string(),
            "can't read required containment \"containment_1\" that's unset on instance of \
             TestLanguage.LinkTestConcept with id=ltc"
        );

        graph.set_child(ltc, &containment_1, Some(dtc)).unwrap();
        assert_eq!(graph.child(ltc, &containment_1).unwrap(), Some(dtc));
        assert_eq!(graph.node(dtc).parent(), Some(ltc));
        assert_eq!(
            collector.take(),
            vec![Delta::ChildAdded {
                parent: ltc,
                containment: containment_1.clone(),
                index: 0,
                new_child: dtc,
            }]
        );
    }

    #[test]
    fn test_unsetting_required_single_containment_fails() {
        let tl = TestLanguage::new();
        let collector = DeltaCollector::new();
        let mut graph = Graph::with_delta_handler(collector.clone());
        let ltc = graph.create_node(&tl.link, "ltc").unwrap();
        let dtc = graph.create_node(&tl.datatype, "dtc").unwrap();
        let containment_1 = tl.link_feature("containment_1");

        graph.set_child(ltc, &containment_1, Some(dtc)).unwrap();
        collector.take();
        assert!(matches!(
            graph.set_child(ltc, &containment_1, None),
            Err(RuntimeError::UnsetRequired { .. })
        ));
        assert_eq!(graph.child(ltc, &containment_1).unwrap(), Some(dtc));
        assert!(collector.is_empty());
    }

    #[test]
    fn test_optional_single_set_then_unset() {
        let tl = TestLanguage::new();
        let collector = DeltaCollector::new();
        let mut graph = Graph::with_delta_handler(collector.clone());
        let ltc = graph.create_node(&tl.link, "ltc").unwrap();
        let dtc = graph.create_node(&tl.datatype, "dtc").unwrap();
        let containment_0_1 = tl.link_feature("containment_0_1");

        graph.set_child(ltc, &containment_0_1, None).unwrap();
        assert!(collector.is_empty());

        graph.set_child(ltc, &containment_0_1, Some(dtc)).unwrap();
        graph.set_child(ltc, &containment_0_1, None).unwrap();
        let deltas = collector.take();
        assert_eq!(deltas.len(), 2);
        assert_eq!(
            deltas[1],
            Delta::ChildDeleted {
                parent: ltc,
                containment: containment_0_1.clone(),
                index: 0,
                deleted_child: dtc,
            }
        );
        assert_eq!(graph.child(ltc, &containment_0_1).unwrap(), None);
        assert!(graph.node(dtc).is_root());
    }

    #[test]
    fn test_moving_a_child_between_parents() {
        let tl = TestLanguage::new();
        let collector = DeltaCollector::new();
        let mut graph = Graph::with_delta_handler(collector.clone());
        let src_parent = graph.create_node(&tl.link, "srcParent").unwrap();
        let dst_parent = graph.create_node(&tl.link, "dstParent").unwrap();
        let child = graph.create_node(&tl.datatype, "child").unwrap();
        let containment_1 = tl.link_feature("containment_1");

        graph.set_child(src_parent, &containment_1, Some(child)).unwrap();
        graph.set_child(dst_parent, &containment_1, Some(child)).unwrap();

        assert_eq!(graph.node(child).parent(), Some(dst_parent));
        assert!(matches!(
            graph.child(src_parent, &containment_1),
            Err(RuntimeError::UnsetRequiredRead { .. })
        ));
        let deltas = collector.take();
        assert_eq!(deltas.len(), 2);
        assert_eq!(
            deltas[1],
            Delta::ChildMoved {
                old_parent: src_parent,
                old_containment: containment_1.clone(),
                old_index: 0,
                new_parent: dst_parent,
                new_containment: containment_1.clone(),
                new_index: 0,
                child,
            }
        );
    }

    #[test]
    fn test_replacing_an_already_present_child() {
        let tl = TestLanguage::new();
        let collector = DeltaCollector::new();
        let mut graph = Graph::with_delta_handler(collector.clone());
        let containment_1 = tl.link_feature("containment_1");
        let already_assigned = graph.create_node(&tl.datatype, "childAlreadyAssigned").unwrap();
        let dst_parent = graph.create_node(&tl.link, "dstParent").unwrap();
        graph.set_child(dst_parent, &containment_1, Some(already_assigned)).unwrap();
        let src_parent = graph.create_node(&tl.link, "srcParent").unwrap();
        let to_move = graph.create_node(&tl.datatype, "childToMove").unwrap();
        graph.set_child(src_parent, &containment_1, Some(to_move)).unwrap();
        assert_eq!(collector.take().len(), 2);

        graph.set_child(dst_parent, &containment_1, Some(to_move)).unwrap();

        assert!(graph.child(src_parent, &containment_1).is_err());
        assert_eq!(graph.child(dst_parent, &containment_1).unwrap(), Some(to_move));
        assert_eq!(graph.node(to_move).parent(), Some(dst_parent));
        assert!(graph.node(already_assigned).is_root());
        assert_eq!(
            collector.take(),
            vec![
                Delta::ChildDeleted {
                    parent: dst_parent,
                    containment: containment_1.clone(),
                    index: 0,
                    deleted_child: already_assigned,
                },
                Delta::ChildReplaced {
                    parent: dst_parent,
                    containment: containment_1.clone(),
                    index: 0,
                    replaced_child: already_assigned,
                    new_child: to_move,
                },
            ]
        );
    }

    #[test]
    fn test_insert_at_index_zero_shifts_existing_child() {
        let tl = TestLanguage::new();
        let collector = DeltaCollector::new();
        let mut graph = Graph::with_delta_handler(collector.clone());
        let ltc = graph.create_node(&tl.link, "ltc").unwrap();
        let existing = graph.create_node(&tl.datatype, "existing").unwrap();
        let fresh = graph.create_node(&tl.datatype, "fresh").unwrap();
        let containment_0_n = tl.link_feature("containment_0_n");

        graph.insert_child_directly(ltc, &containment_0_n, existing, 0).unwrap();
        assert!(collector.is_empty());

        graph.insert_child(ltc, &containment_0_n, fresh, 0).unwrap();
        assert_eq!(graph.children(ltc, &containment_0_n).unwrap(), &[fresh, existing]);
        assert_eq!(
            collector.take(),
            vec![Delta::ChildAdded {
                parent: ltc,
                containment: containment_0_n.clone(),
                index: 0,
                new_child: fresh,
            }]
        );
    }

    #[test]
    fn test_insert_into_same_containment_is_a_move() {
        let tl = TestLanguage::new();
        let collector = DeltaCollector::new();
        let mut graph = Graph::with_delta_handler(collector.clone());
        let ltc = graph.create_node(&tl.link, "ltc").unwrap();
        let containment_0_n = tl.link_feature("containment_0_n");
        let a = graph.create_node(&tl.datatype, "a").unwrap();
        let b = graph.create_node(&tl.datatype, "b").unwrap();
        let c = graph.create_node(&tl.datatype, "c").unwrap();
        for child in [a, b, c] {
            graph.add_child(ltc, &containment_0_n, child).unwrap();
        }
        collector.take();

        // Re-adding the last child changes nothing.
        graph.add_child(ltc, &containment_0_n, c).unwrap();
        assert!(collector.is_empty());

        graph.insert_child(ltc, &containment_0_n, a, 3).unwrap();
        assert_eq!(graph.children(ltc, &containment_0_n).unwrap(), &[b, c, a]);
        assert_eq!(
            collector.take(),
            vec![Delta::ChildMovedInSameContainment {
                parent: ltc,
                containment: containment_0_n.clone(),
                old_index: 0,
                new_index: 2,
                child: a,
            }]
        );
    }

    #[test]
    fn test_insert_bounds_checked() {
        let tl = TestLanguage::new();
        let mut graph = Graph::new();
        let ltc = graph.create_node(&tl.link, "ltc").unwrap();
        let dtc = graph.create_node(&tl.datatype, "dtc").unwrap();
        let containment_0_n = tl.link_feature("containment_0_n");

        assert_eq!(
            graph.insert_child(ltc, &containment_0_n, dtc, 1),
            Err(RuntimeError::IndexOutOfBounds { index: 1, len: 0 })
        );
        assert!(graph.node(dtc).is_root());
    }

    #[test]
    fn test_cross_containment_move_reports_old_index() {
        let tl = TestLanguage::new();
        let collector = DeltaCollector::new();
        let mut graph = Graph::with_delta_handler(collector.clone());
        let ltc = graph.create_node(&tl.link, "ltc").unwrap();
        let containment_0_n = tl.link_feature("containment_0_n");
        let containment_1_n = tl.link_feature("containment_1_n");
        let a = graph.create_node(&tl.datatype, "a").unwrap();
        let b = graph.create_node(&tl.datatype, "b").unwrap();
        graph.add_child(ltc, &containment_0_n, a).unwrap();
        graph.add_child(ltc, &containment_0_n, b).unwrap();
        collector.take();

        graph.add_child(ltc, &containment_1_n, b).unwrap();
        assert_eq!(graph.children(ltc, &containment_0_n).unwrap(), &[a]);
        assert_eq!(graph.children(ltc, &containment_1_n).unwrap(), &[b]);
        assert_eq!(
            collector.take(),
            vec![Delta::ChildMoved {
                old_parent: ltc,
                old_containment: containment_0_n.clone(),
                old_index: 1,
                new_parent: ltc,
                new_containment: containment_1_n.clone(),
                new_index: 0,
                child: b,
            }]
        );
    }

    #[test]
    fn test_remove_and_required_last_child() {
        let tl = TestLanguage::new();
        let collector = DeltaCollector::new();
        let mut graph = Graph::with_delta_handler(collector.clone());
        let ltc = graph.create_node(&tl.link, "ltc").unwrap();
        let containment_1_n = tl.link_feature("containment_1_n");
        let a = graph.create_node(&tl.datatype, "a").unwrap();
        let b = graph.create_node(&tl.datatype, "b").unwrap();
        let stranger = graph.create_node(&tl.datatype, "stranger").unwrap();

        assert!(matches!(
            graph.children(ltc, &containment_1_n),
            Err(RuntimeError::UnsetRequiredRead { .. })
        ));
        graph.add_child(ltc, &containment_1_n, a).unwrap();
        graph.add_child(ltc, &containment_1_n, b).unwrap();
        collector.take();

        graph.remove_child(ltc, &containment_1_n, stranger).unwrap();
        assert!(collector.is_empty());

        graph.remove_child(ltc, &containment_1_n, a).unwrap();
        assert_eq!(
            collector.take(),
            vec![Delta::ChildDeleted {
                parent: ltc,
                containment: containment_1_n.clone(),
                index: 0,
                deleted_child: a,
            }]
        );
        assert!(graph.node(a).is_root());

        assert!(matches!(
            graph.remove_child(ltc, &containment_1_n, b),
            Err(RuntimeError::UnsetRequired { .. })
        ));
        assert_eq!(graph.children(ltc, &containment_1_n).unwrap(), &[b]);
    }

    #[test]
    fn test_move_child() {
        let tl = TestLanguage::new();
        let collector = DeltaCollector::new();
        let mut graph = Graph::with_delta_handler(collector.clone());
        let ltc = graph.create_node(&tl.link, "ltc").unwrap();
        let containment_0_n = tl.link_feature("containment_0_n");
        let a = graph.create_node(&tl.datatype, "a").unwrap();
        let b = graph.create_node(&tl.datatype, "b").unwrap();
        graph.add_child_directly(ltc, &containment_0_n, a).unwrap();
        graph.add_child_directly(ltc, &containment_0_n, b).unwrap();

        graph.move_child(ltc, &containment_0_n, 1, 1).unwrap();
        assert!(collector.is_empty());
        assert!(matches!(
            graph.move_child(ltc, &containment_0_n, 0, 2),
            Err(RuntimeError::IndexOutOfBounds { .. })
        ));

        graph.move_child(ltc, &containment_0_n, 1, 0).unwrap();
        assert_eq!(graph.children(ltc, &containment_0_n).unwrap(), &[b, a]);
        assert_eq!(
            collector.take(),
            vec![Delta::ChildMovedInSameContainment {
                parent: ltc,
                containment: containment_0_n.clone(),
                old_index: 1,
                new_index: 0,
                child: b,
            }]
        );
    }

    #[test]
    fn test_cycles_are_rejected() {
        let tl = TestLanguage::new();
        let mut graph = Graph::new();
        let outer = graph.create_node(&tl.link, "outer").unwrap();
        let inner = graph.create_node(&tl.link, "inner").unwrap();
        let containment_0_n = tl.link_feature("containment_0_n");

        // LinkTestConcept children are typed DataTypeTestConcept, but the
        // runtime only enforces ownership shape.
        graph.add_child(outer, &containment_0_n, inner).unwrap();
        assert!(matches!(
            graph.add_child(inner, &containment_0_n, outer),
            Err(RuntimeError::CyclicContainment { .. })
        ));
        assert!(matches!(
            graph.add_child(outer, &containment_0_n, outer),
            Err(RuntimeError::CyclicContainment { .. })
        ));
        assert!(graph.node(outer).is_root());
    }

    #[test]
    fn test_annotations_cannot_be_contained() {
        let tl = TestLanguage::new();
        let mut graph = Graph::new();
        let ltc = graph.create_node(&tl.link, "ltc").unwrap();
        let annotation = graph.create_node(&tl.annotation, "ann").unwrap();

        assert!(matches!(
            graph.set_child(ltc, &tl.link_feature("containment_0_1"), Some(annotation)),
            Err(RuntimeError::AnnotationInContainment { .. })
        ));
    }

    #[test]
    fn test_single_direct_insert_refuses_occupied_slot() {
        let tl = TestLanguage::new();
        let mut graph = Graph::new();
        let ltc = graph.create_node(&tl.link, "ltc").unwrap();
        let a = graph.create_node(&tl.datatype, "a").unwrap();
        let b = graph.create_node(&tl.datatype, "b").unwrap();
        let containment_0_1 = tl.link_feature("containment_0_1");

        graph.add_child_directly(ltc, &containment_0_1, a).unwrap();
        assert!(matches!(
            graph.add_child_directly(ltc, &containment_0_1, b),
            Err(RuntimeError::SlotOccupied { .. })
        ));
        assert_eq!(graph.set_child_directly(ltc, &containment_0_1, Some(b)).unwrap(), Some(a));
        assert!(graph.node(a).is_root());
        assert_eq!(graph.node(b).parent(), Some(ltc));
    }
}
