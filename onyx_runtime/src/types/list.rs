//! List objects.
//!
//! Integer-indexed, growable, internally locked. Negative indexes count
//! from the end, so `-1` is the last element.

use crate::error::{DispatchError, DispatchResult};
use crate::value::Value;
use parking_lot::RwLock;

/// A growable list of values.
pub struct ListObject {
    items: RwLock<Vec<Value>>,
}

impl ListObject {
    /// Create a list from items.
    pub fn new(items: Vec<Value>) -> Self {
        Self {
            items: RwLock::new(items),
        }
    }

    /// Number of elements.
    #[inline]
    pub fn len(&self) -> usize {
        self.items.read().len()
    }

    /// Check if empty.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.items.read().is_empty()
    }

    /// Append an element.
    pub fn push(&self, value: Value) {
        self.items.write().push(value);
    }

    /// Element at `index`, with negative-index normalization.
    pub fn get(&self, index: i64) -> DispatchResult<Value> {
        let items = self.items.read();
        let at = normalize(index, items.len())?;
        Ok(items[at].clone())
    }

    /// Replace the element at `index`.
    pub fn set(&self, index: i64, value: Value) -> DispatchResult<()> {
        let mut items = self.items.write();
        let at = normalize(index, items.len())?;
        items[at] = value;
        Ok(())
    }

    /// Remove and return the element at `index`, shifting the tail.
    pub fn remove(&self, index: i64) -> DispatchResult<Value> {
        let mut items = self.items.write();
        let at = normalize(index, items.len())?;
        Ok(items.remove(at))
    }
}

impl std::fmt::Debug for ListObject {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ListObject")
            .field("len", &self.len())
            .finish()
    }
}

/// Map a possibly negative index into `0..len`.
fn normalize(index: i64, len: usize) -> DispatchResult<usize> {
    let adjusted = if index < 0 {
        index + len as i64
    } else {
        index
    };
    if adjusted < 0 || adjusted as usize >= len {
        return Err(DispatchError::IndexOutOfRange { index, len });
    }
    Ok(adjusted as usize)
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> ListObject {
        ListObject::new(vec![Value::Int(10), Value::Int(20), Value::Int(30)])
    }

    #[test]
    fn test_get_positive_and_negative() {
        let list = sample();
        assert_eq!(list.get(0).unwrap(), Value::Int(10));
        assert_eq!(list.get(2).unwrap(), Value::Int(30));
        assert_eq!(list.get(-1).unwrap(), Value::Int(30));
        assert_eq!(list.get(-3).unwrap(), Value::Int(10));
    }

    #[test]
    fn test_out_of_range() {
        let list = sample();
        assert_eq!(
            list.get(3).unwrap_err(),
            DispatchError::IndexOutOfRange { index: 3, len: 3 }
        );
        assert!(list.get(-4).is_err());
    }

    #[test]
    fn test_set_and_remove() {
        let list = sample();
        list.set(1, Value::Int(99)).unwrap();
        assert_eq!(list.get(1).unwrap(), Value::Int(99));

        let removed = list.remove(0).unwrap();
        assert_eq!(removed, Value::Int(10));
        assert_eq!(list.len(), 2);
        assert_eq!(list.get(0).unwrap(), Value::Int(99));
    }
}
