//! Ownership of structures copied out of the SDK cache.
//!
//! Every `copy_*` call hands out SDK-owned memory that must be released once
//! the caller has read what it needs. [`SdkAllocation`] releases it on drop,
//! so early returns and error paths release too.

use std::fmt;
use std::ops::Deref;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Counts allocations that have been handed out and not yet released.
#[derive(Debug, Default, Clone)]
pub struct AllocationCounter {
    live: Arc<AtomicUsize>,
    total: Arc<AtomicUsize>,
}

impl AllocationCounter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wrap a copied value, counting it as live until dropped.
    pub fn track<T>(&self, value: T) -> SdkAllocation<T> {
        self.live.fetch_add(1, Ordering::SeqCst);
        self.total.fetch_add(1, Ordering::SeqCst);
        SdkAllocation {
            value,
            live: Some(Arc::clone(&self.live)),
        }
    }

    /// Allocations currently outstanding.
    pub fn live(&self) -> usize {
        self.live.load(Ordering::SeqCst)
    }

    /// Allocations handed out since creation.
    pub fn total(&self) -> usize {
        self.total.load(Ordering::SeqCst)
    }
}

/// A structure copied out of the SDK, released when dropped.
pub struct SdkAllocation<T> {
    value: T,
    live: Option<Arc<AtomicUsize>>,
}

impl<T> SdkAllocation<T> {
    /// Wrap a value that is not tracked by any counter.
    pub fn untracked(value: T) -> Self {
        Self { value, live: None }
    }
}

impl<T: Clone> SdkAllocation<T> {
    /// Copy the value out; the allocation itself is released on drop.
    pub fn to_owned_value(&self) -> T {
        self.value.clone()
    }
}

impl<T> Deref for SdkAllocation<T> {
    type Target = T;

    fn deref(&self) -> &T {
        &self.value
    }
}

impl<T> Drop for SdkAllocation<T> {
    fn drop(&mut self) {
        if let Some(live) = self.live.take() {
            live.fetch_sub(1, Ordering::SeqCst);
        }
    }
}

impl<T: fmt::Debug> fmt::Debug for SdkAllocation<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("SdkAllocation").field(&self.value).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_allocations_are_released_on_drop() {
        let counter = AllocationCounter::new();
        let a = counter.track(1u32);
        let b = counter.track(String::from("x"));
        assert_eq!(counter.live(), 2);

        drop(a);
        assert_eq!(counter.live(), 1);
        assert_eq!(b.as_str(), "x");

        drop(b);
        assert_eq!(counter.live(), 0);
        assert_eq!(counter.total(), 2);
    }
}
