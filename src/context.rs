//! Per-layer drawing state and its bounded save/restore stack.
//!
//! `State` carries everything a drawing op implicitly reads (stroke/fill/font
//! color, thickness, font size, and the offset/rotation/scale/skew/matrix
//! transform). `LayerContext` pairs one live `State` with a fixed-size
//! save-stack — a plain array plus a depth index, the same shape used
//! elsewhere in this crate for always-present, bounded slots: a
//! `Copy`-friendly layout avoids a heap allocation on every `SaveContext`.

use glam::{Affine2, Mat2, Vec2};

use crate::color::{Color, Point};

/// Number of save-stack slots. This is a fixed protocol constant, not a
/// session tunable: `SaveContext`/`RestoreContext` nesting deeper than this
/// is a producer bug, not something a decoder can be configured to permit —
/// a producer that needs deeper nesting is expected to flatten its own
/// save/restore pairs before encoding.
pub const SAVE_STACK_DEPTH: usize = 16;

/// A 2-D affine transform, stored in the wire's six-float layout
/// `(scaleX, skewX, transX, skewY, scaleY, transY)`.
#[derive(Clone, Copy, PartialEq, Debug)]
pub struct Matrix {
    pub scale_x: f32,
    pub skew_x: f32,
    pub trans_x: f32,
    pub skew_y: f32,
    pub scale_y: f32,
    pub trans_y: f32,
}

impl Matrix {
    /// Builds a matrix directly from the six wire fields.
    #[must_use]
    pub const fn new(
        scale_x: f32,
        skew_x: f32,
        trans_x: f32,
        skew_y: f32,
        scale_y: f32,
        trans_y: f32,
    ) -> Self {
        Self {
            scale_x,
            skew_x,
            trans_x,
            skew_y,
            scale_y,
            trans_y,
        }
    }

    /// The identity transform.
    #[must_use]
    pub const fn identity() -> Self {
        Self::new(1.0, 0.0, 0.0, 0.0, 1.0, 0.0)
    }

    /// Converts to a [`glam::Affine2`] for composition / point transforms.
    #[must_use]
    pub fn to_affine2(self) -> Affine2 {
        Affine2 {
            matrix2: Mat2::from_cols(
                Vec2::new(self.scale_x, self.skew_y),
                Vec2::new(self.skew_x, self.scale_y),
            ),
            translation: Vec2::new(self.trans_x, self.trans_y),
        }
    }

    /// Converts a composed [`glam::Affine2`] back to wire field order.
    #[must_use]
    pub fn from_affine2(m: Affine2) -> Self {
        Self {
            scale_x: m.matrix2.x_axis.x,
            skew_y: m.matrix2.x_axis.y,
            skew_x: m.matrix2.y_axis.x,
            scale_y: m.matrix2.y_axis.y,
            trans_x: m.translation.x,
            trans_y: m.translation.y,
        }
    }
}

impl Default for Matrix {
    fn default() -> Self {
        Self::identity()
    }
}

/// The drawing state that applies to every subsequent operation until
/// changed by `SetContext`, `Restore`, or `Reset`.
#[derive(Clone, Copy, PartialEq, Debug)]
pub struct State {
    pub stroke: Color,
    pub fill: Color,
    pub font_color: Color,
    pub thickness: u32,
    pub font_size: u32,
    pub offset: Point,
    /// Degrees, not radians — matches the wire's `Rotation` property.
    pub rotation: f32,
    pub scale: (f32, f32),
    pub skew: (f32, f32),
    /// When present, overrides the composed transform verbatim.
    pub matrix: Option<Matrix>,
}

impl Default for State {
    fn default() -> Self {
        Self {
            stroke: Color::BLACK,
            fill: Color::TRANSPARENT,
            font_color: Color::BLACK,
            thickness: 1,
            font_size: 12,
            offset: Point::default(),
            rotation: 0.0,
            scale: (1.0, 1.0),
            skew: (0.0, 0.0),
            matrix: None,
        }
    }
}

impl State {
    /// Composes the transform implied by this state: `M = T * R * K * S`,
    /// i.e. scale, then skew, then rotate, then translate, pre-multiplied
    /// onto an identity starting matrix. An explicit `matrix` overrides this
    /// verbatim.
    #[must_use]
    pub fn compose_matrix(&self) -> Matrix {
        if let Some(m) = self.matrix {
            return m;
        }
        let scale = Affine2::from_scale(Vec2::new(self.scale.0, self.scale.1));
        let skew = Affine2 {
            matrix2: Mat2::from_cols(Vec2::new(1.0, self.skew.1), Vec2::new(self.skew.0, 1.0)),
            translation: Vec2::ZERO,
        };
        let rotation = Affine2::from_angle(self.rotation.to_radians());
        let translate =
            Affine2::from_translation(Vec2::new(self.offset.x as f32, self.offset.y as f32));
        let composed = translate * rotation * skew * scale;
        Matrix::from_affine2(composed)
    }
}

/// Per-layer current state plus a bounded save-stack.
///
/// Persists across frames (the wire protocol does not reset it between
/// frames) so that master-context state set in one frame is still in effect
/// when the next frame's ops run, unless explicitly `Reset`.
pub struct LayerContext {
    state: State,
    stack: [State; SAVE_STACK_DEPTH],
    depth: usize,
}

impl Default for LayerContext {
    fn default() -> Self {
        Self::new()
    }
}

impl LayerContext {
    /// Creates a context with default state and an empty save-stack.
    #[must_use]
    pub fn new() -> Self {
        Self {
            state: State::default(),
            stack: [State::default(); SAVE_STACK_DEPTH],
            depth: 0,
        }
    }

    /// The currently active state.
    #[must_use]
    pub fn state(&self) -> &State {
        &self.state
    }

    /// Mutable access to the currently active state (used by `SetContext`).
    pub fn state_mut(&mut self) -> &mut State {
        &mut self.state
    }

    /// Pushes a copy of the live state. A 17th consecutive save silently
    /// drops the oldest saved entry rather than growing — fail-soft, since
    /// the wire has no channel to signal a stack fault back to the producer.
    pub fn save(&mut self) {
        if self.depth < SAVE_STACK_DEPTH {
            self.stack[self.depth] = self.state;
            self.depth += 1;
        } else {
            self.stack.copy_within(1.., 0);
            self.stack[SAVE_STACK_DEPTH - 1] = self.state;
        }
    }

    /// Pops the most recently saved state. Silently a no-op if the stack is
    /// empty (an unbalanced producer is the only way to trigger this).
    pub fn restore(&mut self) {
        if self.depth > 0 {
            self.depth -= 1;
            self.state = self.stack[self.depth];
        }
    }

    /// Resets state to defaults and empties the stack, regardless of depth.
    pub fn reset(&mut self) {
        self.state = State::default();
        self.depth = 0;
    }

    /// Current save-stack depth (test/diagnostic use).
    #[must_use]
    pub fn depth(&self) -> usize {
        self.depth
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_spec() {
        let s = State::default();
        assert_eq!(s.stroke, Color::BLACK);
        assert_eq!(s.fill, Color::TRANSPARENT);
        assert_eq!(s.thickness, 1);
        assert_eq!(s.font_size, 12);
        assert_eq!(s.scale, (1.0, 1.0));
        assert!(s.matrix.is_none());
    }

    #[test]
    fn save_restore_round_trips() {
        let mut ctx = LayerContext::new();
        ctx.state_mut().thickness = 5;
        ctx.save();
        ctx.state_mut().thickness = 9;
        assert_eq!(ctx.state().thickness, 9);
        ctx.restore();
        assert_eq!(ctx.state().thickness, 5);
    }

    #[test]
    fn restore_on_empty_stack_is_noop() {
        let mut ctx = LayerContext::new();
        ctx.state_mut().thickness = 7;
        ctx.restore();
        assert_eq!(ctx.state().thickness, 7);
    }

    #[test]
    fn seventeen_saves_keep_last_sixteen_plus_live() {
        let mut ctx = LayerContext::new();
        for i in 0..17u32 {
            ctx.state_mut().thickness = i;
            ctx.save();
        }
        assert_eq!(ctx.depth(), SAVE_STACK_DEPTH);
        ctx.state_mut().thickness = 999;
        // The oldest save (thickness=0) was evicted; the newest retained
        // save is thickness=16 (the 17th save, i.e. index 16).
        ctx.restore();
        assert_eq!(ctx.state().thickness, 16);
    }

    #[test]
    fn reset_clears_state_and_stack() {
        let mut ctx = LayerContext::new();
        ctx.state_mut().thickness = 42;
        ctx.save();
        ctx.save();
        ctx.reset();
        assert_eq!(ctx.depth(), 0);
        assert_eq!(ctx.state().thickness, 1);
    }

    #[test]
    fn identity_state_composes_identity_matrix() {
        let m = State::default().compose_matrix();
        let identity = Matrix::identity();
        assert!((m.scale_x - identity.scale_x).abs() < 1e-6);
        assert!((m.trans_x - identity.trans_x).abs() < 1e-6);
    }

    #[test]
    fn offset_only_state_translates() {
        let mut s = State::default();
        s.offset = Point::new(20, 30);
        let m = s.compose_matrix();
        assert!((m.trans_x - 20.0).abs() < 1e-4);
        assert!((m.trans_y - 30.0).abs() < 1e-4);
    }
}
