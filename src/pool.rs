//! Layer pooling.
//!
//! A free list keyed by allocation shape (`(width, height)`), grown on
//! demand and reused across frames. Unlike a GPU transient-resource pool
//! that resets its whole index at frame end, layers here come back one at a
//! time, whenever a renderer finishes with a [`crate::lease::Lease`] — so
//! the return path is a per-lease drop callback rather than a bulk
//! `reset()`.

use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;
use rustc_hash::FxHashMap;

use crate::canvas::Canvas;
use crate::errors::ProtocolError;
use crate::lease::Lease;

/// Builds a fresh `Canvas` for a layer of the given dimensions.
///
/// The concrete drawing backend is an external collaborator (see the crate
/// root docs): this crate never constructs one on its own, only through a
/// factory supplied when the pool is built.
pub type CanvasFactory = Arc<dyn Fn(u32, u32) -> Box<dyn Canvas + Send + Sync> + Send + Sync>;

/// One addressable drawing surface: fixed `(width, height)` plus whatever
/// `Canvas` the pool's factory produced for it.
pub struct Layer {
    width: u32,
    height: u32,
    canvas: Box<dyn Canvas + Send + Sync>,
}

impl Layer {
    fn new(width: u32, height: u32, factory: &CanvasFactory) -> Self {
        Self {
            width,
            height,
            canvas: factory(width, height),
        }
    }

    #[must_use]
    pub fn width(&self) -> u32 {
        self.width
    }

    #[must_use]
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Read-only canvas access — what a renderer uses to composite this
    /// layer onto a target surface.
    #[must_use]
    pub fn canvas(&self) -> &(dyn Canvas + Send + Sync) {
        self.canvas.as_ref()
    }

    /// Mutable canvas access — only valid for a layer this frame entered
    /// via `Master`; see [`crate::stage::Stage::canvas_for`].
    pub fn canvas_mut(&mut self) -> &mut (dyn Canvas + Send + Sync) {
        self.canvas.as_mut()
    }

    /// Clears the surface to transparent. Called on every `rent`, so a
    /// reused layer never leaks the previous tenant's drawing.
    pub fn clear(&mut self) {
        self.canvas.clear();
    }
}

impl fmt::Debug for Layer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Layer")
            .field("width", &self.width)
            .field("height", &self.height)
            .finish_non_exhaustive()
    }
}

type FreeList = Mutex<FxHashMap<(u32, u32), Vec<Layer>>>;

struct PoolInner {
    free: FreeList,
    active: AtomicUsize,
    factory: CanvasFactory,
}

/// A snapshot of pool occupancy, for diagnostics.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PoolStats {
    pub active: usize,
    pub free: usize,
}

/// Rents and reclaims [`Layer`]s keyed by `(width, height)`.
///
/// Cheap to clone: internally an `Arc`, so a `Stage` and whatever spawned it
/// can share one pool without wrapping it themselves.
#[derive(Clone)]
pub struct LayerPool {
    inner: Arc<PoolInner>,
}

impl LayerPool {
    /// Builds an empty pool whose layers draw via `factory`.
    #[must_use]
    pub fn new(factory: CanvasFactory) -> Self {
        Self {
            inner: Arc::new(PoolInner {
                free: Mutex::new(FxHashMap::default()),
                active: AtomicUsize::new(0),
                factory,
            }),
        }
    }

    /// Rents a layer of the given dimensions, pre-cleared to transparent.
    /// Reuses a free layer of matching `(width, height)` if one exists,
    /// otherwise allocates a new one via the pool's factory.
    ///
    /// # Errors
    ///
    /// Returns [`ProtocolError::ResourceExhausted`] if `width * height`
    /// would overflow `usize` — the only way a layer allocation can fail
    /// short of the allocator aborting the process outright.
    pub fn rent(&self, width: u32, height: u32) -> Result<Lease<Layer>, ProtocolError> {
        (width as usize)
            .checked_mul(height as usize)
            .and_then(|px| px.checked_mul(4))
            .ok_or(ProtocolError::ResourceExhausted("layer dimensions overflow"))?;

        let mut layer = {
            let mut free = self.inner.free.lock();
            free.get_mut(&(width, height)).and_then(Vec::pop)
        }
        .unwrap_or_else(|| Layer::new(width, height, &self.inner.factory));
        layer.clear();

        self.inner.active.fetch_add(1, Ordering::Relaxed);

        let inner = Arc::clone(&self.inner);
        Ok(Lease::new(
            layer,
            Arc::new(move |layer: Layer| {
                inner.active.fetch_sub(1, Ordering::Relaxed);
                inner
                    .free
                    .lock()
                    .entry((layer.width(), layer.height()))
                    .or_default()
                    .push(layer);
            }),
        ))
    }

    /// Current active/free occupancy, for diagnostics and tests.
    #[must_use]
    pub fn stats(&self) -> PoolStats {
        let free = self.inner.free.lock().values().map(Vec::len).sum();
        PoolStats {
            active: self.inner.active.load(Ordering::Relaxed),
            free,
        }
    }
}
