use std::fmt;
use std::ops::{Deref, Index};

use super::{ListOp, ObjectError, ObjectMut, TrackedObject};

/// Structural operations a list could opt into. None are supported yet.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ListAffordances {
    pub replace: bool,
    pub append: bool,
    pub remove: bool,
}

/// A list of tracked objects with a fixed shape.
///
/// Elements can be read and mutated through their own setters, but the list
/// itself never grows, shrinks, or swaps elements, so the diff can match
/// elements by position.
pub struct TrackedList<C> {
    items: Vec<TrackedObject<C>>,
}

impl<C> TrackedList<C> {
    pub fn new(items: Vec<TrackedObject<C>>) -> Self {
        Self { items }
    }

    /// Fails with [`ObjectError::UnsupportedListAffordance`] if any
    /// structural operation is requested.
    pub fn with_affordances(
        items: Vec<TrackedObject<C>>,
        affordances: ListAffordances,
    ) -> Result<Self, ObjectError> {
        if affordances.replace || affordances.append || affordances.remove {
            return Err(ObjectError::UnsupportedListAffordance);
        }
        Ok(Self::new(items))
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&TrackedObject<C>> {
        self.items.get(index)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, TrackedObject<C>> {
        self.items.iter()
    }

    pub fn push(&mut self, _item: TrackedObject<C>) -> Result<(), ObjectError> {
        Err(ObjectError::ListMutation {
            op: ListOp::Append,
            index: self.items.len(),
        })
    }

    pub fn insert(&mut self, index: usize, _item: TrackedObject<C>) -> Result<(), ObjectError> {
        Err(ObjectError::ListMutation {
            op: ListOp::Append,
            index,
        })
    }

    pub fn replace(&mut self, index: usize, _item: TrackedObject<C>) -> Result<(), ObjectError> {
        Err(ObjectError::ListMutation {
            op: ListOp::Replace,
            index,
        })
    }

    pub fn remove(&mut self, index: usize) -> Result<TrackedObject<C>, ObjectError> {
        Err(ObjectError::ListMutation {
            op: ListOp::Remove,
            index,
        })
    }

    pub(crate) fn items_mut(&mut self) -> &mut Vec<TrackedObject<C>> {
        &mut self.items
    }
}

impl<C> Clone for TrackedList<C> {
    fn clone(&self) -> Self {
        Self {
            items: self.items.clone(),
        }
    }
}

impl<C> PartialEq for TrackedList<C> {
    fn eq(&self, other: &Self) -> bool {
        self.items == other.items
    }
}

impl<C> fmt::Debug for TrackedList<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(&self.items).finish()
    }
}

impl<C> Index<usize> for TrackedList<C> {
    type Output = TrackedObject<C>;

    fn index(&self, index: usize) -> &Self::Output {
        &self.items[index]
    }
}

impl<'a, C> IntoIterator for &'a TrackedList<C> {
    type Item = &'a TrackedObject<C>;
    type IntoIter = std::slice::Iter<'a, TrackedObject<C>>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}

// ============================================================================
// Mutable access
// ============================================================================

/// Mutable access to a [`TrackedList`] that only hands out element handles.
pub struct ListMut<'a, C> {
    list: &'a mut TrackedList<C>,
}

impl<'a, C> ListMut<'a, C> {
    pub(crate) fn new(list: &'a mut TrackedList<C>) -> Self {
        Self { list }
    }

    pub fn get_mut(&mut self, index: usize) -> Option<ObjectMut<'_, C>> {
        self.list.items.get_mut(index).map(ObjectMut::new)
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = ObjectMut<'_, C>> {
        self.list.items.iter_mut().map(ObjectMut::new)
    }

    pub fn push(&mut self, item: TrackedObject<C>) -> Result<(), ObjectError> {
        self.list.push(item)
    }

    pub fn insert(&mut self, index: usize, item: TrackedObject<C>) -> Result<(), ObjectError> {
        self.list.insert(index, item)
    }

    pub fn replace(&mut self, index: usize, item: TrackedObject<C>) -> Result<(), ObjectError> {
        self.list.replace(index, item)
    }

    pub fn remove(&mut self, index: usize) -> Result<TrackedObject<C>, ObjectError> {
        self.list.remove(index)
    }
}

impl<C> Deref for ListMut<'_, C> {
    type Target = TrackedList<C>;

    fn deref(&self) -> &Self::Target {
        self.list
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::object::{Field, Schema};
    use serde_json::json;

    const ITEM: Schema = Schema::new("Item", &[Field::plain("ref")]);

    fn list() -> TrackedList<()> {
        let items = (0..3)
            .map(|i| TrackedObject::parse(&ITEM, &json!({"ref": format!("r{i}")})).unwrap())
            .collect();
        TrackedList::new(items)
    }

    #[test]
    fn test_structural_changes_are_rejected() {
        let mut list = list();
        let extra = TrackedObject::parse(&ITEM, &json!({"ref": "x"})).unwrap();

        assert_eq!(
            list.push(extra.clone()).unwrap_err(),
            ObjectError::ListMutation { op: ListOp::Append, index: 3 }
        );
        assert_eq!(
            list.insert(1, extra.clone()).unwrap_err(),
            ObjectError::ListMutation { op: ListOp::Append, index: 1 }
        );
        assert_eq!(
            list.replace(0, extra).unwrap_err(),
            ObjectError::ListMutation { op: ListOp::Replace, index: 0 }
        );
        assert_eq!(
            list.remove(2).unwrap_err(),
            ObjectError::ListMutation { op: ListOp::Remove, index: 2 }
        );
        assert_eq!(list.len(), 3);
        assert_eq!(list[1].get("ref").unwrap().as_str(), Some("r1"));
    }

    #[test]
    fn test_affordances_are_unsupported() {
        assert!(TrackedList::<()>::with_affordances(vec![], ListAffordances::default()).is_ok());
        let err = TrackedList::<()>::with_affordances(
            vec![],
            ListAffordances {
                append: true,
                ..Default::default()
            },
        )
        .unwrap_err();
        assert_eq!(err, ObjectError::UnsupportedListAffordance);
    }
}
