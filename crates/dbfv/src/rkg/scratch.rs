//! Pool of temporary ring elements shared by the rounds of one engine.

use std::{
    ops::{Deref, DerefMut},
    sync::{Mutex, PoisonError},
};

use zeroize::Zeroize;

/// Free list of scratch elements.
///
/// Elements are allocated on demand the first time the pool is empty and are
/// recycled afterwards, so a busy engine holds at most one element per
/// concurrent worker.
#[derive(Debug)]
pub(crate) struct ScratchPool<E: Zeroize> {
    free: Mutex<Vec<E>>,
}

impl<E: Zeroize> ScratchPool<E> {
    pub(crate) fn new() -> Self {
        Self {
            free: Mutex::new(Vec::new()),
        }
    }

    /// Take an element from the pool, or allocate one with `alloc`.
    pub(crate) fn acquire<F: FnOnce() -> E>(&self, alloc: F) -> ScratchGuard<'_, E> {
        let element = self
            .free
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .pop()
            .unwrap_or_else(alloc);
        ScratchGuard {
            pool: self,
            element: Some(element),
        }
    }

    /// Number of elements currently in the free list.
    #[cfg(test)]
    pub(crate) fn available(&self) -> usize {
        self.free
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}

/// Exclusive access to a scratch element; the element is erased and
/// returned to its pool on drop.
pub(crate) struct ScratchGuard<'a, E: Zeroize> {
    pool: &'a ScratchPool<E>,
    element: Option<E>,
}

impl<E: Zeroize> Deref for ScratchGuard<'_, E> {
    type Target = E;

    fn deref(&self) -> &E {
        match &self.element {
            Some(element) => element,
            None => unreachable!("scratch element taken before drop"),
        }
    }
}

impl<E: Zeroize> DerefMut for ScratchGuard<'_, E> {
    fn deref_mut(&mut self) -> &mut E {
        match &mut self.element {
            Some(element) => element,
            None => unreachable!("scratch element taken before drop"),
        }
    }
}

impl<E: Zeroize> Drop for ScratchGuard<'_, E> {
    fn drop(&mut self) {
        if let Some(mut element) = self.element.take() {
            element.zeroize();
            self.pool
                .free
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .push(element);
        }
    }
}
