//! Error Types
//!
//! This module defines the error types used throughout the crate.
//!
//! # Overview
//!
//! [`ProtocolError`] covers everything that can go wrong while decoding the
//! wire format; [`StageError`] covers misuse of the frame-snapshot engine.
//! Both are split out rather than merged into one enum because a caller of
//! [`crate::decoder::StreamDecoder::decode`] never needs to match on stage
//! misuse variants, and vice versa.
//!
//! # Usage
//!
//! ```rust,ignore
//! use inkstage::errors::{ProtocolError, Result};
//!
//! fn decode_one() -> Result<()> {
//!     Ok(())
//! }
//! ```

use thiserror::Error;

/// Errors raised while decoding the binary wire protocol.
///
/// Every variant here is fatal to the current stream session: the caller is
/// expected to close the transport and drop the `Stage` on receipt of one of
/// these. `NeedMoreData` is reported separately via [`crate::decoder::DecodeResult`]
/// since it is not an error at all.
#[derive(Error, Debug)]
pub enum ProtocolError {
    // ========================================================================
    // Framing Errors
    // ========================================================================
    /// The two-byte end marker (`0xFF 0xFF`) was absent or mismatched.
    #[error("bad frame: end marker mismatch")]
    BadFrame,

    /// An operation byte or a `SetContext` property byte was not recognized.
    #[error("unknown op code: {0:#04x}")]
    UnknownOp(u8),

    /// A `SetContext` property id was not recognized.
    #[error("unknown context property: {0:#04x}")]
    UnknownProp(u8),

    // ========================================================================
    // Layer Errors
    // ========================================================================
    /// A decoded layer id was outside `0..=15`.
    #[error("layer id out of range: {0}")]
    LayerId(u8),

    /// A `Remain` layer had no prior frame to alias.
    #[error("remain with no prior layer to alias (layer {0})")]
    BadRemain(u8),

    /// `Master`/`Clear` named a layer id that was never given dimensions
    /// via [`crate::stage::Stage::configure_layer`].
    #[error("layer {0} has no configured dimensions")]
    LayerNotConfigured(u8),

    // ========================================================================
    // Varint Errors
    // ========================================================================
    /// A varint's continuation bits implied more magnitude than its target
    /// integer width can hold.
    #[error("varint overflow")]
    Overflow,

    // ========================================================================
    // Resource Errors
    // ========================================================================
    /// A polygon, text payload, or pool allocation exceeded its configured bound.
    #[error("resource exhausted: {0}")]
    ResourceExhausted(&'static str),
}

/// Errors raised by misuse of the [`crate::stage::Stage`] frame-lifecycle API.
///
/// Shutdown is deliberately not one of these variants: `try_copy_frame`
/// after shutdown surfaces as a plain `None` to the renderer, never an
/// `Err` (see [`crate::stage::Stage::try_copy_frame`]).
#[derive(Error, Debug)]
pub enum StageError {
    /// `canvas_for` was called on a layer entered via `remain` this frame.
    #[error("canvas_for called on a remain-aliased layer {0}")]
    CanvasOnRemain(u8),
}

/// Alias for `Result<T, ProtocolError>`, the return type of decode-path operations.
pub type Result<T> = std::result::Result<T, ProtocolError>;
