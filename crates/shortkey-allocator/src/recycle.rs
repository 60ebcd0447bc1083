use shortkey_core::Key;
use std::collections::HashSet;

/// Released keys waiting to be handed out again.
///
/// The pool is unordered: [`RecyclePool::try_take`] returns an arbitrary
/// member, so callers must not rely on FIFO or LIFO reuse.
#[derive(Debug, Clone, Default)]
pub struct RecyclePool {
    keys: HashSet<Key>,
}

impl RecyclePool {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds `key` to the pool. Returns `false` if it was already there.
    pub fn release(&mut self, key: Key) -> bool {
        self.keys.insert(key)
    }

    /// Removes and returns any pooled key.
    pub fn try_take(&mut self) -> Option<Key> {
        let key = self.keys.iter().next().cloned()?;
        self.keys.remove(&key);
        Some(key)
    }

    pub fn contains(&self, key: &Key) -> bool {
        self.keys.contains(key)
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Key> {
        self.keys.iter()
    }
}

impl FromIterator<Key> for RecyclePool {
    fn from_iter<I: IntoIterator<Item = Key>>(iter: I) -> Self {
        Self {
            keys: iter.into_iter().collect(),
        }
    }
}
