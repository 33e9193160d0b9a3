//! External bindings for managed objects.
//!
//! A hosting environment (for example a scripting-language wrapper) can
//! associate one value of its own with any managed object. The association
//! lives in a side-table keyed by object identity rather than inside the
//! object, and entries for destroyed objects can be pruned.

use std::collections::HashMap;

use crate::object::{Handle, ObjectId, RadarObject};

struct Entry<B> {
    binding: B,
    alive: Box<dyn Fn() -> bool>,
}

/// Side-table mapping object identity to an external binding.
pub struct BindingTable<B> {
    entries: HashMap<ObjectId, Entry<B>>,
}

impl<B> Default for BindingTable<B> {
    fn default() -> Self {
        Self {
            entries: HashMap::new(),
        }
    }
}

impl<B> BindingTable<B> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind `binding` to `object`, returning the binding it replaces.
    pub fn bind<T: RadarObject>(&mut self, object: &Handle<T>, binding: B) -> Option<B> {
        let weak = object.downgrade();
        let entry = Entry {
            binding,
            alive: Box::new(move || weak.is_alive()),
        };
        self.entries
            .insert(object.id(), entry)
            .map(|previous| previous.binding)
    }

    /// Current binding of `object`, if any.
    pub fn binding<T: RadarObject>(&self, object: &Handle<T>) -> Option<&B> {
        self.entries.get(&object.id()).map(|entry| &entry.binding)
    }

    pub fn is_bound<T: RadarObject>(&self, object: &Handle<T>) -> bool {
        self.entries.contains_key(&object.id())
    }

    /// Number of bound objects, including ones not yet pruned.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Remove entries whose object has been destroyed.
    ///
    /// Returns the number of entries removed.
    pub fn prune(&mut self) -> usize {
        let before = self.entries.len();
        self.entries.retain(|_, entry| (entry.alive)());
        before - self.entries.len()
    }
}

impl<B: PartialEq> BindingTable<B> {
    /// Remove the binding of `object` if it equals `binding`.
    ///
    /// Does nothing when a different value is bound. Returns true when an
    /// entry was removed.
    pub fn unbind<T: RadarObject>(&mut self, object: &Handle<T>, binding: &B) -> bool {
        let matches = self
            .entries
            .get(&object.id())
            .map(|entry| entry.binding == *binding)
            .unwrap_or(false);
        if matches {
            self.entries.remove(&object.id());
        }
        matches
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::object::ObjectType;

    #[derive(Debug)]
    struct Bound;

    impl RadarObject for Bound {
        const TYPE: ObjectType = ObjectType::new("Bound");

        fn clone_object(&self) -> Self {
            Bound
        }
    }

    #[test]
    fn test_bind_and_get() {
        let mut table = BindingTable::new();
        let obj = Handle::new(Bound);
        assert!(!table.is_bound(&obj));
        assert_eq!(table.bind(&obj, 42u64), None);
        assert_eq!(table.binding(&obj), Some(&42));
    }

    #[test]
    fn test_binding_follows_identity_not_clones() {
        let mut table = BindingTable::new();
        let obj = Handle::new(Bound);
        table.bind(&obj, "wrapper");

        let copy = obj.clone();
        let deep = obj.deep_clone();
        assert_eq!(table.binding(&copy), Some(&"wrapper"));
        assert_eq!(table.binding(&deep), None);
    }

    #[test]
    fn test_bind_replaces_previous() {
        let mut table = BindingTable::new();
        let obj = Handle::new(Bound);
        table.bind(&obj, 1);
        assert_eq!(table.bind(&obj, 2), Some(1));
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn test_unbind_mismatch_is_noop() {
        let mut table = BindingTable::new();
        let obj = Handle::new(Bound);
        table.bind(&obj, 7);

        assert!(!table.unbind(&obj, &8));
        assert_eq!(table.binding(&obj), Some(&7));

        assert!(table.unbind(&obj, &7));
        assert!(!table.is_bound(&obj));
    }

    #[test]
    fn test_prune_drops_destroyed_objects() {
        let mut table = BindingTable::new();
        let kept = Handle::new(Bound);
        let dropped = Handle::new(Bound);
        table.bind(&kept, 1);
        table.bind(&dropped, 2);

        dropped.release();
        assert_eq!(table.prune(), 1);
        assert_eq!(table.len(), 1);
        assert!(table.is_bound(&kept));
    }
}
