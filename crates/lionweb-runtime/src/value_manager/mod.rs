//! Per-feature mutation and read entry points.
//!
//! Every mutating operation comes in two flavours:
//! - the emitting one (`set_property`, `insert_child`, ...), which enforces
//!   multiplicity rules and reports exactly the deltas describing the change;
//! - the direct one (`set_property_directly`, `insert_child_directly`, ...),
//!   which performs the same structural change without emitting. It is used
//!   for silent loading and for replaying deltas received from elsewhere.
//!
//! Both flavours keep the tree consistent: a child is always detached from
//! its old location before it is attached to a new one. All preconditions
//! are checked before any state changes, so a failing call leaves the graph
//! untouched.

mod annotation;
mod containment;
mod property;
mod reference;

use crate::error::RuntimeError;
use crate::schema::Feature;

/// Checks that `index` addresses an element (`0..len`), or an insertion
/// point (`0..=len`) when `allow_end` is set.
pub(crate) fn check_index(index: usize, len: usize, allow_end: bool) -> Result<(), RuntimeError> {
    let in_bounds = if allow_end { index <= len } else { index < len };
    if in_bounds {
        Ok(())
    } else {
        Err(RuntimeError::IndexOutOfBounds { index, len })
    }
}

pub(crate) fn expect_single(feature: &Feature) -> Result<(), RuntimeError> {
    if feature.multiple {
        return Err(RuntimeError::MultiplicityMismatch {
            feature: feature.name.clone(),
            multiplicity: feature.multiplicity(),
        });
    }
    Ok(())
}

pub(crate) fn expect_multiple(feature: &Feature) -> Result<(), RuntimeError> {
    if !feature.multiple {
        return Err(RuntimeError::MultiplicityMismatch {
            feature: feature.name.clone(),
            multiplicity: feature.multiplicity(),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_check_index() {
        assert!(check_index(0, 0, true).is_ok());
        assert!(check_index(0, 0, false).is_err());
        assert!(check_index(2, 2, true).is_ok());
        assert_eq!(
            check_index(3, 2, true),
            Err(RuntimeError::IndexOutOfBounds { index: 3, len: 2 })
        );
        assert!(check_index(1, 2, false).is_ok());
        assert!(check_index(2, 2, false).is_err());
    }
}
