//! Id-keyed callback registry shared by providers and the dispatcher.

use std::collections::BTreeMap;
use std::rc::Rc;

/// Callbacks keyed by a monotonically increasing id.
///
/// Iteration follows registration order. `snapshot` clones the handles so a
/// callback may register or remove entries while the list is being walked.
pub struct Registry<T: ?Sized> {
    next_id: u32,
    entries: BTreeMap<u32, Rc<T>>,
}

impl<T: ?Sized> Default for Registry<T> {
    fn default() -> Self {
        Registry {
            next_id: 1,
            entries: BTreeMap::new(),
        }
    }
}

impl<T: ?Sized> Registry<T> {
    pub fn insert(&mut self, entry: Rc<T>) -> u32 {
        let id = self.next_id;
        self.next_id += 1;
        self.entries.insert(id, entry);
        id
    }

    pub fn remove(&mut self, id: u32) -> Option<Rc<T>> {
        self.entries.remove(&id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn snapshot(&self) -> Vec<Rc<T>> {
        self.entries.values().cloned().collect()
    }
}
