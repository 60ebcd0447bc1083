use shortkey_allocator::{Allocator, Release};
use shortkey_core::Key;
use std::sync::Arc;

/// Trait for generating short keys.
///
/// Implementations are pure generators that don't interact with storage.
/// A key handed out by [`Generator::generate`] must not be held by any other
/// live resource across the whole cluster.
pub trait Generator: Send + Sync + 'static {
    /// Generates a key that is unique among live resources.
    fn generate(&self) -> Key;

    /// Hands a key back once its resource is gone.
    ///
    /// Generators that never reuse keys can ignore this.
    fn recycle(&self, _key: &Key) {}
}

impl Generator for Allocator {
    fn generate(&self) -> Key {
        self.allocate()
    }

    fn recycle(&self, key: &Key) {
        match self.release(key) {
            Release::Recycled => {}
            // Logged at warn by the allocator; the key stays out of the pool.
            Release::AlreadyReleased | Release::NotIssued => {}
        }
    }
}

impl<G: Generator> Generator for Arc<G> {
    fn generate(&self) -> Key {
        (**self).generate()
    }

    fn recycle(&self, key: &Key) {
        (**self).recycle(key)
    }
}
