//! Property reads and writes.

use crate::error::RuntimeError;
use crate::model::node::Slot;
use crate::model::{Delta, Graph, NodeHandle, PropertyValue};
use crate::schema::{Feature, FeatureKind};

impl Graph {
    /// Reads a property.
    ///
    /// Fails with [`RuntimeError::UnsetRequiredRead`] for an unset required
    /// property, so `Ok(None)` only occurs for optional ones.
    pub fn property(&self, node: NodeHandle, property: &Feature) -> Result<Option<&PropertyValue>, RuntimeError> {
        let value = self.property_directly(node, property)?;
        if value.is_none() && !property.optional {
            return Err(self.unset_required_read(node, property));
        }
        Ok(value)
    }

    /// Reads a property without the required-ness check.
    pub fn property_directly(
        &self,
        node: NodeHandle,
        property: &Feature,
    ) -> Result<Option<&PropertyValue>, RuntimeError> {
        let position = self.slot_position(node, property, FeatureKind::Property)?;
        match &self.node(node).slots[position] {
            Slot::Property(value) => Ok(value.as_ref()),
            _ => Ok(None),
        }
    }

    /// Sets (or, with `None`, unsets) a property.
    ///
    /// Emits `PropertyAdded`, `PropertyChanged` or `PropertyDeleted`; setting
    /// the current value again emits nothing. Unsetting a required property
    /// fails with [`RuntimeError::UnsetRequired`].
    pub fn set_property(
        &mut self,
        node: NodeHandle,
        property: &Feature,
        value: Option<PropertyValue>,
    ) -> Result<(), RuntimeError> {
        let position = self.slot_position(node, property, FeatureKind::Property)?;
        if let Some(value) = &value {
            value.check_for(property)?;
        }
        let old_value = match &self.node(node).slots[position] {
            Slot::Property(old_value) => old_value.clone(),
            _ => None,
        };
        if old_value == value {
            return Ok(());
        }
        if value.is_none() && !property.optional {
            return Err(self.unset_required(node, property));
        }

        self.node_mut(node).slots[position] = Slot::Property(value.clone());
        let property = self.feature_at(node, position);
        let delta = match (old_value, value) {
            (None, Some(value)) => Delta::PropertyAdded {
                container: node,
                property,
                value,
            },
            (Some(old_value), None) => Delta::PropertyDeleted {
                container: node,
                property,
                old_value,
            },
            (Some(old_value), Some(new_value)) => Delta::PropertyChanged {
                container: node,
                property,
                old_value,
                new_value,
            },
            (None, None) => return Ok(()),
        };
        self.emit(delta);
        Ok(())
    }

    /// Sets or unsets a property without emitting. Returns the old value.
    ///
    /// The value is type-checked; required-ness is not.
    pub fn set_property_directly(
        &mut self,
        node: NodeHandle,
        property: &Feature,
        value: Option<PropertyValue>,
    ) -> Result<Option<PropertyValue>, RuntimeError> {
        let position = self.slot_position(node, property, FeatureKind::Property)?;
        if let Some(value) = &value {
            value.check_for(property)?;
        }
        let old = std::mem::replace(&mut self.node_mut(node).slots[position], Slot::Property(value));
        Ok(match old {
            Slot::Property(old_value) => old_value,
            _ => None,
        })
    }
}
