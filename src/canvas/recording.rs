//! A [`Canvas`] test double that records every call instead of rasterizing,
//! used by the decoder's own tests and available to downstream integration
//! tests that want to assert on draw-call sequences without a real backend.

use super::Canvas;
use crate::color::{Color, Point};
use crate::context::Matrix;

/// One recorded canvas call.
#[derive(Clone, Debug, PartialEq)]
pub enum DrawCall {
    Polygon {
        points: Vec<Point>,
        stroke: Color,
        thickness: u32,
    },
    Text {
        origin: Point,
        text: String,
        font_color: Color,
        font_size: u32,
    },
    Circle {
        center: Point,
        radius: u32,
        stroke: Color,
        thickness: u32,
    },
    Rect {
        origin: Point,
        w: u32,
        h: u32,
        stroke: Color,
        thickness: u32,
    },
    Line {
        p1: Point,
        p2: Point,
        stroke: Color,
        thickness: u32,
    },
    Save,
    Restore,
    SetMatrix(Matrix),
    Clear,
}

/// Records calls in order, plus a small matrix stack so `save`/`restore`
/// behave like a real canvas backend would.
#[derive(Default)]
pub struct RecordingCanvas {
    pub calls: Vec<DrawCall>,
    matrix_stack: Vec<Matrix>,
    current_matrix: Matrix,
}

impl RecordingCanvas {
    #[must_use]
    pub fn new() -> Self {
        Self {
            calls: Vec::new(),
            matrix_stack: Vec::new(),
            current_matrix: Matrix::identity(),
        }
    }

    #[must_use]
    pub fn current_matrix(&self) -> Matrix {
        self.current_matrix
    }
}

impl Canvas for RecordingCanvas {
    fn draw_polygon(&mut self, points: &[Point], stroke: Color, thickness: u32) {
        self.calls.push(DrawCall::Polygon {
            points: points.to_vec(),
            stroke,
            thickness,
        });
    }

    fn draw_text(&mut self, origin: Point, text: &str, font_color: Color, font_size: u32) {
        self.calls.push(DrawCall::Text {
            origin,
            text: text.to_owned(),
            font_color,
            font_size,
        });
    }

    fn draw_circle(&mut self, center: Point, radius: u32, stroke: Color, thickness: u32) {
        self.calls.push(DrawCall::Circle {
            center,
            radius,
            stroke,
            thickness,
        });
    }

    fn draw_rect(&mut self, origin: Point, w: u32, h: u32, stroke: Color, thickness: u32) {
        self.calls.push(DrawCall::Rect {
            origin,
            w,
            h,
            stroke,
            thickness,
        });
    }

    fn draw_line(&mut self, p1: Point, p2: Point, stroke: Color, thickness: u32) {
        self.calls.push(DrawCall::Line {
            p1,
            p2,
            stroke,
            thickness,
        });
    }

    fn save(&mut self) {
        self.matrix_stack.push(self.current_matrix);
        self.calls.push(DrawCall::Save);
    }

    fn restore(&mut self) {
        if let Some(m) = self.matrix_stack.pop() {
            self.current_matrix = m;
        }
        self.calls.push(DrawCall::Restore);
    }

    fn set_matrix(&mut self, matrix: Matrix) {
        self.current_matrix = matrix;
        self.calls.push(DrawCall::SetMatrix(matrix));
    }

    fn clear(&mut self) {
        self.calls.push(DrawCall::Clear);
    }
}
