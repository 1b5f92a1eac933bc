//! [`Lease<T>`]: a single-owner handle over a pooled resource.
//!
//! Dropping a `Lease` returns its value to the pool it came from exactly
//! once. The return path is an owned closure rather than a back-reference
//! to a concrete pool type, so `Lease<T>` stays generic over whatever kind
//! of pool produced it (today, only [`crate::pool::LayerPool`]).

use std::fmt;
use std::ops::{Deref, DerefMut};
use std::sync::Arc;

/// Unique ownership of a pooled `T`. On drop, hands `T` back to its pool.
pub struct Lease<T> {
    value: Option<T>,
    return_fn: Arc<dyn Fn(T) + Send + Sync>,
}

impl<T> Lease<T> {
    /// Wraps `value`, to be returned via `return_fn` when this lease drops.
    pub(crate) fn new(value: T, return_fn: Arc<dyn Fn(T) + Send + Sync>) -> Self {
        Self {
            value: Some(value),
            return_fn,
        }
    }
}

impl<T> Deref for Lease<T> {
    type Target = T;

    fn deref(&self) -> &T {
        self.value.as_ref().expect("Lease value taken before drop")
    }
}

impl<T> DerefMut for Lease<T> {
    fn deref_mut(&mut self) -> &mut T {
        self.value.as_mut().expect("Lease value taken before drop")
    }
}

impl<T> Drop for Lease<T> {
    fn drop(&mut self) {
        if let Some(value) = self.value.take() {
            (self.return_fn)(value);
        }
    }
}

impl<T: fmt::Debug> fmt::Debug for Lease<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Lease").field("value", &self.value).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn drop_invokes_return_exactly_once() {
        let returned = Arc::new(AtomicUsize::new(0));
        let returned_clone = Arc::clone(&returned);
        let lease = Lease::new(42u32, Arc::new(move |_v| {
            returned_clone.fetch_add(1, Ordering::SeqCst);
        }));
        assert_eq!(*lease, 42);
        drop(lease);
        assert_eq!(returned.load(Ordering::SeqCst), 1);
    }
}
