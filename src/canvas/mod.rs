//! The `Canvas` capability set: the abstract drawing surface the decoder
//! drives. A concrete 2D drawing backend (the actual rasterizer) is an
//! out-of-scope external collaborator — this crate only defines the trait
//! and, for tests, a [`RecordingCanvas`] that logs calls instead of
//! rasterizing them.

mod recording;

pub use recording::{DrawCall, RecordingCanvas};

use crate::color::{Color, Point};
use crate::context::Matrix;

/// Polymorphic drawing surface in layer-local pixel space.
///
/// The decoder owns the composed transform and calls [`Canvas::set_matrix`]
/// after every context-mutating op (`SetContext`, `Restore`, `Reset`) so the
/// canvas and the decoder's [`crate::context::LayerContext`] never drift
/// apart. `save`/`restore` here maintain the canvas's own matrix stack so a
/// `Restore` can cheaply re-establish a previous transform without the
/// decoder recomputing it.
pub trait Canvas {
    /// Strokes a polygon through `points` using `stroke` at `thickness`.
    /// Zero points is a legal no-op.
    fn draw_polygon(&mut self, points: &[Point], stroke: Color, thickness: u32);

    /// Draws `text` with its baseline origin at `origin`.
    fn draw_text(&mut self, origin: Point, text: &str, font_color: Color, font_size: u32);

    /// Strokes a circle centered at `center` with `radius`. `thickness == 0`
    /// omits the stroke pass entirely.
    fn draw_circle(&mut self, center: Point, radius: u32, stroke: Color, thickness: u32);

    /// Strokes an axis-aligned rectangle of size `(w, h)` with top-left `origin`.
    fn draw_rect(&mut self, origin: Point, w: u32, h: u32, stroke: Color, thickness: u32);

    /// Strokes a line segment from `p1` to `p2`.
    fn draw_line(&mut self, p1: Point, p2: Point, stroke: Color, thickness: u32);

    /// Pushes the current transform onto the canvas's own matrix stack.
    fn save(&mut self);

    /// Pops the canvas's matrix stack, restoring the previous transform.
    fn restore(&mut self);

    /// Replaces the active transform wholesale.
    fn set_matrix(&mut self, matrix: Matrix);

    /// Clears the entire surface to transparent.
    fn clear(&mut self);
}
