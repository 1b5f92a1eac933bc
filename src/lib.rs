//! A streaming wire protocol for 2D vector-graphics frames, plus a
//! lock-free, layered frame-snapshot engine (`Stage`) that decouples a
//! decoder thread from one or more renderer threads.
//!
//! The concrete 2D drawing backend is out of scope here: a [`Layer`] owns a
//! `Box<dyn Canvas + Send + Sync>` built by a factory closure supplied at
//! pool construction, so this crate never rasterizes anything itself — see
//! [`canvas`] and [`pool::CanvasFactory`].
//!
//! # Layout
//!
//! - [`codec`] — varint/zigzag primitives and a non-consuming-on-partial
//!   [`codec::ByteReader`].
//! - [`color`], [`context`] — wire value types and per-layer drawing state.
//! - [`canvas`] — the `Canvas` capability trait and a `RecordingCanvas` test
//!   double.
//! - [`decoder`] — [`decoder::StreamDecoder`], turning wire bytes into
//!   `Stage` calls.
//! - [`encoder`] — [`encoder::FrameEncoder`], the symmetric producer-side
//!   API.
//! - [`lease`], [`shared_ref`], [`pool`], [`snapshot`] — the pooling and
//!   refcounting machinery behind [`stage::Stage`].
//! - [`stage`] — the decoder/renderer handoff point.
//! - [`config`] — session-wide tunable limits.
//! - [`errors`] — [`errors::ProtocolError`] and [`errors::StageError`].

#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::cast_precision_loss)]
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_sign_loss)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::too_many_arguments)]

pub mod canvas;
pub mod codec;
pub mod color;
pub mod config;
pub mod context;
pub mod decoder;
pub mod encoder;
pub mod errors;
pub mod lease;
pub mod pool;
pub mod shared_ref;
pub mod snapshot;
pub mod stage;

pub use canvas::Canvas;
pub use color::{Color, Point};
pub use config::Config;
pub use context::{LayerContext, Matrix, State};
pub use decoder::{DecodeResult, StreamDecoder};
pub use encoder::FrameEncoder;
pub use errors::{ProtocolError, StageError};
pub use lease::Lease;
pub use pool::{CanvasFactory, Layer, LayerPool, PoolStats};
pub use shared_ref::SharedRef;
pub use snapshot::{FrameSnapshot, MAX_LAYERS};
pub use stage::Stage;
