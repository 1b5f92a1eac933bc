//! The central frame-lifecycle manager coupling decoder-side frame
//! construction to renderer-side snapshot consumption.
//!
//! Two critical sections, deliberately kept separate:
//! - `frame_state`: the decoder's working array and its previous-frame
//!   lookup table. Only the decoder thread ever calls the methods that
//!   touch it, so contention is always zero — the lock exists to satisfy
//!   `Send + Sync` for a `Stage` shared as `Arc<Stage>`, not because the
//!   decoder and renderer actually race over it.
//! - `display_frame`: the handoff point the renderer actually contends on.
//!   Locked only long enough to swap a pointer and bump a refcount — never
//!   while touching a bitmap.

use std::array;
use std::sync::atomic::{AtomicBool, Ordering};

use log::{debug, warn};
use parking_lot::Mutex;

use crate::errors::{ProtocolError, StageError};
use crate::lease::Lease;
use crate::pool::{Layer, LayerPool};
use crate::shared_ref::SharedRef;
use crate::snapshot::{FrameSnapshot, MAX_LAYERS};

type Slot = Option<SharedRef<Lease<Layer>>>;

struct FrameState {
    working: [Slot; MAX_LAYERS],
    prev_frame: Option<FrameSnapshot>,
    pending_frame_id: u64,
    dimensions: [Option<(u32, u32)>; MAX_LAYERS],
}

/// Couples a [`LayerPool`] to the decoder/renderer handoff described above.
pub struct Stage {
    pool: LayerPool,
    frame_state: Mutex<FrameState>,
    display_frame: Mutex<Option<FrameSnapshot>>,
    closed: AtomicBool,
}

impl Stage {
    #[must_use]
    pub fn new(pool: LayerPool) -> Self {
        Self {
            pool,
            frame_state: Mutex::new(FrameState {
                working: array::from_fn(|_| None),
                prev_frame: None,
                pending_frame_id: 0,
                dimensions: [None; MAX_LAYERS],
            }),
            display_frame: Mutex::new(None),
            closed: AtomicBool::new(false),
        }
    }

    /// Fixes the pixel dimensions a layer id will use for every future
    /// `clear`. The wire format carries no per-frame size, so this is
    /// session-level setup the owner performs once before streaming.
    pub fn configure_layer(&self, layer_id: u8, width: u32, height: u32) {
        self.frame_state.lock().dimensions[layer_id as usize] = Some((width, height));
    }

    /// The dimensions previously fixed via `configure_layer`, if any.
    #[must_use]
    pub fn layer_dimensions(&self, layer_id: u8) -> Option<(u32, u32)> {
        self.frame_state.lock().dimensions[layer_id as usize]
    }

    /// Called once per frame, before any layer block is processed.
    pub fn on_frame_start(&self, frame_id: u64) {
        self.frame_state.lock().pending_frame_id = frame_id;
    }

    /// Rents a fresh, pre-cleared layer for `Master`/`Clear` and stores it
    /// at `working[layer_id]`, dropping any prior occupant of that slot
    /// (last-write-wins within a frame).
    ///
    /// # Errors
    ///
    /// [`ProtocolError::LayerNotConfigured`] if no prior `configure_layer`
    /// call fixed this layer's dimensions.
    pub fn clear(&self, layer_id: u8) -> Result<(), ProtocolError> {
        let (width, height) = self
            .frame_state
            .lock()
            .dimensions[layer_id as usize]
            .ok_or(ProtocolError::LayerNotConfigured(layer_id))?;
        let lease = self.pool.rent(width, height)?;
        let shared = SharedRef::new(lease);
        self.frame_state.lock().working[layer_id as usize] = Some(shared);
        Ok(())
    }

    /// Aliases the corresponding layer from the previous published frame.
    ///
    /// # Errors
    ///
    /// [`ProtocolError::BadRemain`] if `prev_frame` has no layer at this id
    /// — a producer bug, or a `Remain` on the very first frame.
    pub fn remain(&self, layer_id: u8) -> Result<(), ProtocolError> {
        let mut state = self.frame_state.lock();
        let copy = state
            .prev_frame
            .as_ref()
            .and_then(|prev| prev.layer(layer_id as usize))
            .and_then(SharedRef::try_copy)
            .ok_or(ProtocolError::BadRemain(layer_id))?;
        state.working[layer_id as usize] = Some(copy);
        Ok(())
    }

    /// Mutable canvas access to the layer just entered via `clear` this
    /// frame.
    ///
    /// # Errors
    ///
    /// [`StageError::CanvasOnRemain`] if `layer_id` was aliased via
    /// `remain` (it has more than one live reference, so no exclusive
    /// mutable borrow is available) or was never populated this frame.
    pub fn canvas_for<R>(
        &self,
        layer_id: u8,
        f: impl FnOnce(&mut (dyn crate::canvas::Canvas + Send + Sync)) -> R,
    ) -> Result<R, StageError> {
        let mut state = self.frame_state.lock();
        let slot = state.working[layer_id as usize]
            .as_mut()
            .ok_or(StageError::CanvasOnRemain(layer_id))?;
        let lease = slot.get_mut().ok_or(StageError::CanvasOnRemain(layer_id))?;
        Ok(f(lease.canvas_mut()))
    }

    /// Publishes `working` as the new `display_frame`, retains a second
    /// live copy as `prev_frame` for the next frame's `Remain` lookups, and
    /// drops the previously displayed snapshot outside the critical
    /// section so the renderer is never blocked on a bitmap's `Drop`.
    pub fn on_frame_end(&self) -> u64 {
        let (frame_id, layers) = {
            let mut state = self.frame_state.lock();
            let layers = std::mem::replace(&mut state.working, array::from_fn(|_| None));
            (state.pending_frame_id, layers)
        };
        let new_snapshot = FrameSnapshot::new(frame_id, layers);
        let prev_copy = new_snapshot
            .try_copy()
            .expect("a snapshot just built from fresh refs always copies");

        let old = {
            let mut guard = self.display_frame.lock();
            std::mem::replace(&mut *guard, Some(new_snapshot))
        };

        self.frame_state.lock().prev_frame = Some(prev_copy);
        debug!("stage published frame {frame_id}");
        drop(old);
        frame_id
    }

    /// The renderer's sole entry point: copies the currently displayed
    /// snapshot, or `None` if the stage has been shut down or nothing has
    /// been published yet.
    #[must_use]
    pub fn try_copy_frame(&self) -> Option<FrameSnapshot> {
        if self.closed.load(Ordering::Acquire) {
            return None;
        }
        self.display_frame.lock().as_ref().and_then(FrameSnapshot::try_copy)
    }

    /// Stops serving new snapshot copies and releases both `display_frame`
    /// and the decoder's `prev_frame` lookup table. Both retired snapshots
    /// are closed first, so a renderer that already holds a copy keeps
    /// using it but can no longer fork a further copy from it; the Layers
    /// it references return to the pool only once every such copy is gone.
    pub fn shutdown(&self) {
        self.closed.store(true, Ordering::Release);
        let displayed = self.display_frame.lock().take();
        if let Some(snap) = &displayed {
            snap.close_all();
            warn!("stage shut down with a displayed frame still live");
        }
        let prev = self.frame_state.lock().prev_frame.take();
        if let Some(snap) = &prev {
            snap.close_all();
        }
        drop(displayed);
        drop(prev);
    }

    #[must_use]
    pub fn pool(&self) -> &LayerPool {
        &self.pool
    }
}
