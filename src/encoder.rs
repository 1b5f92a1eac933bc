//! Producer-side mirror of [`crate::decoder::StreamDecoder`]: builds one
//! frame's wire bytes in memory.
//!
//! Flushing those bytes to a transport is the session owner's job (the
//! transport itself is an external collaborator here, same as the concrete
//! `Canvas` backend) — `finish_frame` just returns the serialized buffer.

use crate::codec::{write_signed_varint32, write_varint32};
use crate::color::{Color, Point};
use crate::context::Matrix;

/// A `SetContext` property to emit. Mirrors [`crate::context::State`]'s
/// fields one-to-one; `Matrix` overrides the rest when present.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ContextProp {
    Stroke(Color),
    Fill(Color),
    FontColor(Color),
    Thickness(u32),
    FontSize(u32),
    Offset(Point),
    Rotation(f32),
    Scale(f32, f32),
    Skew(f32, f32),
    Matrix(Matrix),
}

impl ContextProp {
    fn encode(self, buf: &mut Vec<u8>) {
        match self {
            ContextProp::Stroke(c) => {
                buf.push(0x01);
                buf.extend_from_slice(&[c.r, c.g, c.b, c.a]);
            }
            ContextProp::Fill(c) => {
                buf.push(0x02);
                buf.extend_from_slice(&[c.r, c.g, c.b, c.a]);
            }
            ContextProp::FontColor(c) => {
                buf.push(0x03);
                buf.extend_from_slice(&[c.r, c.g, c.b, c.a]);
            }
            ContextProp::Thickness(t) => {
                buf.push(0x04);
                write_varint32(buf, t);
            }
            ContextProp::FontSize(s) => {
                buf.push(0x05);
                write_varint32(buf, s);
            }
            ContextProp::Offset(p) => {
                buf.push(0x06);
                write_signed_varint32(buf, p.x);
                write_signed_varint32(buf, p.y);
            }
            ContextProp::Rotation(r) => {
                buf.push(0x07);
                buf.extend_from_slice(&r.to_le_bytes());
            }
            ContextProp::Scale(x, y) => {
                buf.push(0x08);
                buf.extend_from_slice(&x.to_le_bytes());
                buf.extend_from_slice(&y.to_le_bytes());
            }
            ContextProp::Skew(x, y) => {
                buf.push(0x09);
                buf.extend_from_slice(&x.to_le_bytes());
                buf.extend_from_slice(&y.to_le_bytes());
            }
            ContextProp::Matrix(m) => {
                buf.push(0x0A);
                for f in [m.scale_x, m.skew_x, m.trans_x, m.skew_y, m.scale_y, m.trans_y] {
                    buf.extend_from_slice(&f.to_le_bytes());
                }
            }
        }
    }
}

enum LayerEntry {
    Clear,
    Remain,
    Master { op_count: u32, ops: Vec<u8> },
}

impl LayerEntry {
    fn master_mut(&mut self) -> (&mut u32, &mut Vec<u8>) {
        match self {
            LayerEntry::Master { op_count, ops } => (op_count, ops),
            LayerEntry::Clear | LayerEntry::Remain => {
                unreachable!("MasterLayer only ever wraps a Master entry")
            }
        }
    }
}

/// Accumulates one frame's layer blocks, to be serialized by `finish_frame`.
#[derive(Default)]
pub struct FrameEncoder {
    frame_id: u64,
    layers: Vec<(u8, LayerEntry)>,
}

impl FrameEncoder {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts recording a new frame, discarding whatever the previous
    /// `begin_frame`/`finish_frame` pair left behind.
    pub fn begin_frame(&mut self, frame_id: u64) -> &mut Self {
        self.frame_id = frame_id;
        self.layers.clear();
        self
    }

    /// Declares `layer_id` as `Clear` for this frame: a fresh, empty buffer.
    pub fn clear_layer(&mut self, layer_id: u8) -> &mut Self {
        self.layers.push((layer_id, LayerEntry::Clear));
        self
    }

    /// Declares `layer_id` as `Remain`: reuse the previous frame's buffer.
    pub fn remain_layer(&mut self, layer_id: u8) -> &mut Self {
        self.layers.push((layer_id, LayerEntry::Remain));
        self
    }

    /// Declares `layer_id` as `Master` and returns a builder for its ops.
    pub fn master_layer(&mut self, layer_id: u8) -> MasterLayer<'_> {
        self.layers.push((
            layer_id,
            LayerEntry::Master {
                op_count: 0,
                ops: Vec::new(),
            },
        ));
        MasterLayer { encoder: self }
    }

    /// Serializes the recorded frame to its wire bytes, end marker included.
    #[must_use]
    pub fn finish_frame(&self) -> Vec<u8> {
        let mut buf = Vec::new();
        buf.extend_from_slice(&self.frame_id.to_le_bytes());
        buf.push(u8::try_from(self.layers.len()).expect("at most 16 layers per frame"));
        for (layer_id, entry) in &self.layers {
            buf.push(*layer_id);
            match entry {
                LayerEntry::Master { op_count, ops } => {
                    buf.push(0);
                    write_varint32(&mut buf, *op_count);
                    buf.extend_from_slice(ops);
                }
                LayerEntry::Clear => buf.push(1),
                LayerEntry::Remain => buf.push(2),
            }
        }
        buf.extend_from_slice(&[0xFF, 0xFF]);
        buf
    }
}

/// Records operations into the `Master` layer most recently opened via
/// [`FrameEncoder::master_layer`].
pub struct MasterLayer<'a> {
    encoder: &'a mut FrameEncoder,
}

impl MasterLayer<'_> {
    fn entry(&mut self) -> &mut LayerEntry {
        let idx = self.encoder.layers.len() - 1;
        &mut self.encoder.layers[idx].1
    }

    fn push_op(&mut self, encode: impl FnOnce(&mut Vec<u8>)) -> &mut Self {
        let (op_count, ops) = self.entry().master_mut();
        encode(ops);
        *op_count += 1;
        self
    }

    pub fn set_context(&mut self, props: &[ContextProp]) -> &mut Self {
        let count = u32::try_from(props.len()).expect("prop count fits u32");
        self.push_op(|ops| {
            ops.push(0x01);
            write_varint32(ops, count);
            for prop in props {
                prop.encode(ops);
            }
        })
    }

    pub fn save_context(&mut self) -> &mut Self {
        self.push_op(|ops| ops.push(0x02))
    }

    pub fn restore_context(&mut self) -> &mut Self {
        self.push_op(|ops| ops.push(0x03))
    }

    pub fn reset_context(&mut self) -> &mut Self {
        self.push_op(|ops| ops.push(0x04))
    }

    /// Encodes `points` as the wire's delta-coded polygon: first point
    /// absolute, the rest as deltas from their predecessor.
    pub fn draw_polygon(&mut self, points: &[Point]) -> &mut Self {
        let count = u32::try_from(points.len()).expect("point count fits u32");
        self.push_op(|ops| {
            ops.push(0x10);
            write_varint32(ops, count);
            let mut prev: Option<Point> = None;
            for p in points {
                match prev {
                    None => {
                        write_signed_varint32(ops, p.x);
                        write_signed_varint32(ops, p.y);
                    }
                    Some(prev_p) => {
                        write_signed_varint32(ops, p.x - prev_p.x);
                        write_signed_varint32(ops, p.y - prev_p.y);
                    }
                }
                prev = Some(*p);
            }
        })
    }

    pub fn draw_text(&mut self, origin: Point, text: &str) -> &mut Self {
        let len = u32::try_from(text.len()).expect("text length fits u32");
        self.push_op(|ops| {
            ops.push(0x11);
            write_signed_varint32(ops, origin.x);
            write_signed_varint32(ops, origin.y);
            write_varint32(ops, len);
            ops.extend_from_slice(text.as_bytes());
        })
    }

    pub fn draw_circle(&mut self, center: Point, radius: u32) -> &mut Self {
        self.push_op(|ops| {
            ops.push(0x12);
            write_signed_varint32(ops, center.x);
            write_signed_varint32(ops, center.y);
            write_varint32(ops, radius);
        })
    }

    pub fn draw_rect(&mut self, origin: Point, w: u32, h: u32) -> &mut Self {
        self.push_op(|ops| {
            ops.push(0x13);
            write_signed_varint32(ops, origin.x);
            write_signed_varint32(ops, origin.y);
            write_varint32(ops, w);
            write_varint32(ops, h);
        })
    }

    pub fn draw_line(&mut self, p1: Point, p2: Point) -> &mut Self {
        self.push_op(|ops| {
            ops.push(0x14);
            write_signed_varint32(ops, p1.x);
            write_signed_varint32(ops, p1.y);
            write_signed_varint32(ops, p2.x);
            write_signed_varint32(ops, p2.y);
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn s1_header_and_framing_match_the_documented_layout() {
        let mut encoder = FrameEncoder::new();
        encoder
            .begin_frame(1)
            .master_layer(0)
            .set_context(&[
                ContextProp::Stroke(Color::rgba(0xFF, 0xFF, 0xFF, 0xFF)),
                ContextProp::Thickness(3),
            ])
            .draw_circle(Point::new(600, 400), 30)
            .draw_text(Point::new(20, 30), "Frame 1");

        let bytes = encoder.finish_frame();

        // header: frame_id=1 LE, layer_count=1
        assert_eq!(&bytes[0..8], &1u64.to_le_bytes());
        assert_eq!(bytes[8], 1);
        // layer block: layer_id=0, frame_type=0 (Master), op_count=3
        assert_eq!(bytes[9], 0);
        assert_eq!(bytes[10], 0);
        assert_eq!(bytes[11], 3);
        // SetContext op: 0x01, prop_count=2, Stroke prop
        assert_eq!(&bytes[12..18], &[0x01, 0x02, 0x01, 0xFF, 0xFF, 0xFF]);
        assert_eq!(bytes[bytes.len() - 2..], [0xFF, 0xFF]);
    }

    #[test]
    fn clear_and_remain_layers_carry_no_op_payload() {
        let mut encoder = FrameEncoder::new();
        encoder.begin_frame(2).clear_layer(0).remain_layer(1);
        let bytes = encoder.finish_frame();
        assert_eq!(
            bytes,
            vec![2, 0, 0, 0, 0, 0, 0, 0, 2, 0, 1, 1, 2, 0xFF, 0xFF]
        );
    }

    #[test]
    fn round_trips_through_the_stream_decoder() {
        use crate::canvas::RecordingCanvas;
        use crate::config::Config;
        use crate::decoder::{DecodeResult, StreamDecoder};
        use crate::pool::LayerPool;
        use crate::stage::Stage;
        use std::sync::Arc;

        let mut encoder = FrameEncoder::new();
        encoder
            .begin_frame(7)
            .master_layer(3)
            .draw_rect(Point::new(10, 10), 100, 100);
        let bytes = encoder.finish_frame();

        let pool = LayerPool::new(Arc::new(|_w, _h| Box::new(RecordingCanvas::new()) as Box<_>));
        let stage = Arc::new(Stage::new(pool));
        stage.configure_layer(3, 200, 200);
        let mut decoder = StreamDecoder::new(stage, Config::default());

        let result = decoder.decode(&bytes).unwrap();
        assert_eq!(
            result,
            DecodeResult::Ok {
                bytes_consumed: bytes.len(),
                frame_id: 7,
                layer_count: 1,
            }
        );
    }
}
