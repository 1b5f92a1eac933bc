//! [`SharedRef<T>`]: an atomically-refcounted handle whose further sharing
//! can be cut off without disturbing copies already handed out.
//!
//! Works like an asset-tracker `WeakHandle::upgrade`: a handle can be
//! "upgraded" to a strong reference unless the tracked resource has already
//! been marked for deletion, in which case `upgrade` returns `None` instead
//! of ever producing a reference to a half-torn-down asset. `SharedRef`
//! plays the same game with a single `closed` flag rather than a full
//! strong/weak count pair — there's no "downgrade" here, just "can this
//! still be copied".

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

struct Inner<T> {
    value: T,
    closed: AtomicBool,
}

/// A reference-counted `T` that can be closed to new copies.
///
/// Closing affects only future [`SharedRef::try_copy`] calls. A `SharedRef`
/// obtained before `close()` runs stays valid — its `T` drops normally,
/// on its own schedule — so closing is how a writer tells readers "stop
/// asking for more", not "what you already have is invalid".
pub struct SharedRef<T> {
    inner: Arc<Inner<T>>,
}

impl<T> SharedRef<T> {
    #[must_use]
    pub fn new(value: T) -> Self {
        Self {
            inner: Arc::new(Inner {
                value,
                closed: AtomicBool::new(false),
            }),
        }
    }

    /// Borrows the underlying value.
    #[must_use]
    pub fn get(&self) -> &T {
        &self.inner.value
    }

    /// Mutably borrows the underlying value, but only if this is the sole
    /// handle aliasing it — mirrors `Arc::get_mut`. A freshly constructed
    /// `SharedRef` (nothing has called `try_copy` on it yet) always
    /// qualifies; that's the only case [`crate::stage::Stage::canvas_for`]
    /// relies on.
    pub fn get_mut(&mut self) -> Option<&mut T> {
        Arc::get_mut(&mut self.inner).map(|inner| &mut inner.value)
    }

    /// Clones this handle, unless it has been closed.
    #[must_use]
    pub fn try_copy(&self) -> Option<SharedRef<T>> {
        if self.inner.closed.load(Ordering::Acquire) {
            None
        } else {
            Some(SharedRef {
                inner: Arc::clone(&self.inner),
            })
        }
    }

    /// Cuts off future [`SharedRef::try_copy`] calls on this handle and any
    /// handle already cloned from it (the flag lives in the shared `Inner`).
    /// Used by [`crate::stage::Stage::shutdown`] to stop a snapshot it's
    /// retiring from being forked any further, without disturbing copies a
    /// renderer already holds.
    pub fn close(&self) {
        self.inner.closed.store(true, Ordering::Release);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn try_copy_succeeds_while_open() {
        let r = SharedRef::new(7u32);
        let copy = r.try_copy().expect("open ref should copy");
        assert_eq!(*copy.get(), 7);
    }

    #[test]
    fn try_copy_fails_once_closed() {
        let r = SharedRef::new(7u32);
        r.close();
        assert!(r.try_copy().is_none());
    }

    #[test]
    fn close_propagates_to_existing_copies() {
        let r = SharedRef::new(7u32);
        let copy = r.try_copy().unwrap();
        r.close();
        assert!(copy.try_copy().is_none());
    }

    #[test]
    fn get_mut_succeeds_while_sole_owner() {
        let mut r = SharedRef::new(1u32);
        *r.get_mut().unwrap() += 1;
        assert_eq!(*r.get(), 2);
    }

    #[test]
    fn get_mut_fails_once_aliased() {
        let mut r = SharedRef::new(1u32);
        let _copy = r.try_copy().unwrap();
        assert!(r.get_mut().is_none());
    }

    #[test]
    fn existing_copy_survives_close() {
        let r = SharedRef::new(7u32);
        let copy = r.try_copy().unwrap();
        r.close();
        assert_eq!(*copy.get(), 7);
    }
}
