//! [`FrameSnapshot`]: an immutable, fixed-size view of every layer as it
//! stood at one `on_frame_end()`.
//!
//! The fixed-size array (not a `Vec`) is what makes a snapshot swap atomic:
//! [`crate::stage::Stage`] builds one, publishes it behind a single pointer
//! swap, and a renderer reading that pointer always sees either the whole
//! old snapshot or the whole new one, never a mix of old and new layers.

use crate::lease::Lease;
use crate::pool::Layer;
use crate::shared_ref::SharedRef;

/// Number of addressable layer slots. Fixed by the wire format's one-byte
/// layer id, not by [`crate::config::Config::max_layers`] (which bounds how
/// many of those slots a given session is willing to populate).
pub const MAX_LAYERS: usize = 16;

/// A frozen view of all 16 layer slots as of one frame boundary.
pub struct FrameSnapshot {
    frame_id: u64,
    layers: [Option<SharedRef<Lease<Layer>>>; MAX_LAYERS],
}

impl FrameSnapshot {
    #[must_use]
    pub fn new(frame_id: u64, layers: [Option<SharedRef<Lease<Layer>>>; MAX_LAYERS]) -> Self {
        Self { frame_id, layers }
    }

    #[must_use]
    pub fn frame_id(&self) -> u64 {
        self.frame_id
    }

    /// Borrows slot `id`, or `None` if unset or out of range.
    #[must_use]
    pub fn layer(&self, id: usize) -> Option<&SharedRef<Lease<Layer>>> {
        self.layers.get(id).and_then(Option::as_ref)
    }

    /// Closes every populated slot's [`SharedRef`] to further forking via
    /// `try_copy`. Copies already handed out (this snapshot included) keep
    /// working; only attempts to clone *from* one of them start failing.
    pub(crate) fn close_all(&self) {
        for slot in self.layers.iter().flatten() {
            slot.close();
        }
    }

    /// Attempts to copy every populated slot. Fails as a whole the moment
    /// any single slot fails, so a caller never observes a torn snapshot —
    /// some slots copied from this frame, others already gone stale.
    #[must_use]
    pub fn try_copy(&self) -> Option<FrameSnapshot> {
        let mut out = Vec::with_capacity(MAX_LAYERS);
        for slot in &self.layers {
            match slot {
                None => out.push(None),
                Some(shared) => out.push(Some(shared.try_copy()?)),
            }
        }
        let layers: [Option<SharedRef<Lease<Layer>>>; MAX_LAYERS] =
            out.try_into().unwrap_or_else(|_| unreachable!("len fixed at MAX_LAYERS"));
        Some(FrameSnapshot {
            frame_id: self.frame_id,
            layers,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::canvas::RecordingCanvas;
    use crate::pool::LayerPool;
    use std::sync::Arc;

    fn one_layer_snapshot(frame_id: u64) -> (LayerPool, FrameSnapshot) {
        let pool = LayerPool::new(Arc::new(|_w, _h| Box::new(RecordingCanvas::new()) as Box<_>));
        let lease = pool.rent(4, 4).unwrap();
        let mut layers: [Option<SharedRef<Lease<Layer>>>; MAX_LAYERS] =
            std::array::from_fn(|_| None);
        layers[0] = Some(SharedRef::new(lease));
        (pool, FrameSnapshot::new(frame_id, layers))
    }

    #[test]
    fn empty_slots_copy_as_none() {
        let (_pool, snap) = one_layer_snapshot(1);
        let copy = snap.try_copy().unwrap();
        assert!(copy.layer(1).is_none());
        assert!(copy.layer(0).is_some());
        assert_eq!(copy.frame_id(), 1);
    }

    #[test]
    fn closed_slot_fails_whole_copy() {
        let (_pool, snap) = one_layer_snapshot(2);
        snap.layer(0).unwrap().close();
        assert!(snap.try_copy().is_none());
    }
}
