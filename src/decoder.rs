//! Parses the wire format into layer-local draw calls and drives a
//! [`crate::stage::Stage`] accordingly.
//!
//! Partial-buffer discipline: a frame is first parsed entirely into a
//! transient plan (`LayerPlan`/`Op`) without touching the stage at all. Only
//! once the end marker is confirmed does `decode` replay that plan onto the
//! stage. This is what keeps a `NeedMoreData` retry side-effect free — the
//! alternative of mutating `LayerContext` or calling `stage.clear` as soon
//! as each op is read would double-apply everything already processed the
//! next time the same frame is retried from its start offset.

use std::sync::Arc;

use crate::canvas::Canvas;
use crate::codec::ByteReader;
use crate::color::{Color, Point};
use crate::config::Config;
use crate::context::{LayerContext, Matrix};
use crate::errors::ProtocolError;
use crate::snapshot::MAX_LAYERS;
use crate::stage::Stage;

macro_rules! need {
    ($e:expr) => {
        match $e {
            Some(v) => v,
            None => return Ok(None),
        }
    };
}

macro_rules! needr {
    ($e:expr) => {
        match $e? {
            Some(v) => v,
            None => return Ok(None),
        }
    };
}

/// Outcome of one [`StreamDecoder::decode`] call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecodeResult {
    /// The buffer does not yet hold a complete frame. Nothing was consumed
    /// and nothing was applied to the stage.
    NeedMoreData,
    /// A complete frame was parsed and replayed onto the stage. The caller
    /// should discard `bytes_consumed` bytes from the front of its buffer.
    Ok {
        bytes_consumed: usize,
        frame_id: u64,
        layer_count: u8,
    },
}

#[derive(Debug, Clone)]
enum ContextProp {
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

#[derive(Debug, Clone)]
enum Op {
    SetContext(Vec<ContextProp>),
    SaveContext,
    RestoreContext,
    ResetContext,
    DrawPolygon(Vec<Point>),
    DrawText { origin: Point, text: String },
    DrawCircle { center: Point, radius: u32 },
    DrawRect { origin: Point, w: u32, h: u32 },
    DrawLine { p1: Point, p2: Point },
}

enum LayerPlan {
    Master(Vec<Op>),
    Clear,
    Remain,
}

fn read_color(r: &mut ByteReader) -> Option<Color> {
    let b = r.read_bytes(4)?;
    Some(Color::rgba(b[0], b[1], b[2], b[3]))
}

fn parse_props(r: &mut ByteReader) -> Result<Option<Vec<ContextProp>>, ProtocolError> {
    let prop_count = needr!(r.read_varint_u32());
    let mut props = Vec::with_capacity(prop_count as usize);
    for _ in 0..prop_count {
        let prop_id = need!(r.read_u8());
        let prop = match prop_id {
            0x01 => ContextProp::Stroke(need!(read_color(r))),
            0x02 => ContextProp::Fill(need!(read_color(r))),
            0x03 => ContextProp::FontColor(need!(read_color(r))),
            0x04 => ContextProp::Thickness(needr!(r.read_varint_u32())),
            0x05 => ContextProp::FontSize(needr!(r.read_varint_u32())),
            0x06 => {
                let x = needr!(r.read_signed_varint_i32());
                let y = needr!(r.read_signed_varint_i32());
                ContextProp::Offset(Point::new(x, y))
            }
            0x07 => ContextProp::Rotation(need!(r.read_f32_le())),
            0x08 => {
                let x = need!(r.read_f32_le());
                let y = need!(r.read_f32_le());
                ContextProp::Scale(x, y)
            }
            0x09 => {
                let x = need!(r.read_f32_le());
                let y = need!(r.read_f32_le());
                ContextProp::Skew(x, y)
            }
            0x0A => {
                let scale_x = need!(r.read_f32_le());
                let skew_x = need!(r.read_f32_le());
                let trans_x = need!(r.read_f32_le());
                let skew_y = need!(r.read_f32_le());
                let scale_y = need!(r.read_f32_le());
                let trans_y = need!(r.read_f32_le());
                ContextProp::Matrix(Matrix::new(scale_x, skew_x, trans_x, skew_y, scale_y, trans_y))
            }
            other => return Err(ProtocolError::UnknownProp(other)),
        };
        props.push(prop);
    }
    Ok(Some(props))
}

fn parse_ops(r: &mut ByteReader, config: &Config) -> Result<Option<Vec<Op>>, ProtocolError> {
    let op_count = needr!(r.read_varint_u32());
    let mut ops = Vec::with_capacity(op_count as usize);
    for _ in 0..op_count {
        let op_byte = need!(r.read_u8());
        let op = match op_byte {
            0x01 => {
                let props = match parse_props(r)? {
                    Some(p) => p,
                    None => return Ok(None),
                };
                Op::SetContext(props)
            }
            0x02 => Op::SaveContext,
            0x03 => Op::RestoreContext,
            0x04 => Op::ResetContext,
            // 0x05..=0x0F reserved; a filled-polygon op is the likely next
            // addition (DrawPolygon is stroke-only on the wire today).
            0x10 => {
                let pt_count = needr!(r.read_varint_u32());
                if pt_count > config.max_polygon_points {
                    return Err(ProtocolError::ResourceExhausted(
                        "polygon point count exceeds configured limit",
                    ));
                }
                let mut points = Vec::with_capacity(pt_count as usize);
                if pt_count > 0 {
                    let x = needr!(r.read_signed_varint_i32());
                    let y = needr!(r.read_signed_varint_i32());
                    points.push(Point::new(x, y));
                    for _ in 1..pt_count {
                        let dx = needr!(r.read_signed_varint_i32());
                        let dy = needr!(r.read_signed_varint_i32());
                        let prev = *points.last().expect("first point already pushed");
                        points.push(Point::new(prev.x + dx, prev.y + dy));
                    }
                }
                Op::DrawPolygon(points)
            }
            0x11 => {
                let x = needr!(r.read_signed_varint_i32());
                let y = needr!(r.read_signed_varint_i32());
                let len = needr!(r.read_varint_u32());
                if len > config.max_text_bytes {
                    return Err(ProtocolError::ResourceExhausted(
                        "text length exceeds configured limit",
                    ));
                }
                let bytes = need!(r.read_bytes(len as usize));
                let text = std::str::from_utf8(bytes)
                    .map_err(|_| ProtocolError::BadFrame)?
                    .to_owned();
                Op::DrawText {
                    origin: Point::new(x, y),
                    text,
                }
            }
            0x12 => {
                let cx = needr!(r.read_signed_varint_i32());
                let cy = needr!(r.read_signed_varint_i32());
                let radius = needr!(r.read_varint_u32());
                Op::DrawCircle {
                    center: Point::new(cx, cy),
                    radius,
                }
            }
            0x13 => {
                let x = needr!(r.read_signed_varint_i32());
                let y = needr!(r.read_signed_varint_i32());
                let w = needr!(r.read_varint_u32());
                let h = needr!(r.read_varint_u32());
                Op::DrawRect {
                    origin: Point::new(x, y),
                    w,
                    h,
                }
            }
            0x14 => {
                let x1 = needr!(r.read_signed_varint_i32());
                let y1 = needr!(r.read_signed_varint_i32());
                let x2 = needr!(r.read_signed_varint_i32());
                let y2 = needr!(r.read_signed_varint_i32());
                Op::DrawLine {
                    p1: Point::new(x1, y1),
                    p2: Point::new(x2, y2),
                }
            }
            other => return Err(ProtocolError::UnknownOp(other)),
        };
        ops.push(op);
    }
    Ok(Some(ops))
}

fn apply_prop(ctx: &mut LayerContext, prop: &ContextProp) {
    let state = ctx.state_mut();
    match *prop {
        ContextProp::Stroke(c) => state.stroke = c,
        ContextProp::Fill(c) => state.fill = c,
        ContextProp::FontColor(c) => state.font_color = c,
        ContextProp::Thickness(t) => state.thickness = t,
        ContextProp::FontSize(s) => state.font_size = s,
        ContextProp::Offset(p) => state.offset = p,
        ContextProp::Rotation(r) => state.rotation = r,
        ContextProp::Scale(x, y) => state.scale = (x, y),
        ContextProp::Skew(x, y) => state.skew = (x, y),
        ContextProp::Matrix(m) => state.matrix = Some(m),
    }
}

fn apply_ops(ctx: &mut LayerContext, canvas: &mut (dyn Canvas + Send + Sync), ops: &[Op]) {
    for op in ops {
        match op {
            Op::SetContext(props) => {
                for prop in props {
                    apply_prop(ctx, prop);
                }
                canvas.set_matrix(ctx.state().compose_matrix());
            }
            Op::SaveContext => {
                ctx.save();
                canvas.save();
            }
            Op::RestoreContext => {
                ctx.restore();
                canvas.restore();
                canvas.set_matrix(ctx.state().compose_matrix());
            }
            Op::ResetContext => {
                ctx.reset();
                canvas.set_matrix(ctx.state().compose_matrix());
            }
            Op::DrawPolygon(points) => {
                let s = ctx.state();
                canvas.draw_polygon(points, s.stroke, s.thickness);
            }
            Op::DrawText { origin, text } => {
                let s = ctx.state();
                canvas.draw_text(*origin, text, s.font_color, s.font_size);
            }
            Op::DrawCircle { center, radius } => {
                let s = ctx.state();
                canvas.draw_circle(*center, *radius, s.stroke, s.thickness);
            }
            Op::DrawRect { origin, w, h } => {
                let s = ctx.state();
                canvas.draw_rect(*origin, *w, *h, s.stroke, s.thickness);
            }
            Op::DrawLine { p1, p2 } => {
                let s = ctx.state();
                canvas.draw_line(*p1, *p2, s.stroke, s.thickness);
            }
        }
    }
}

/// Drives a [`Stage`] from a growing byte buffer.
///
/// Owns the per-layer [`LayerContext`]s: the wire format never resets them
/// implicitly, so state set by one frame's `SetContext` is still active
/// when a later frame's ops run unless that frame issues `ResetContext`.
pub struct StreamDecoder {
    stage: Arc<Stage>,
    config: Config,
    contexts: [LayerContext; MAX_LAYERS],
}

impl StreamDecoder {
    #[must_use]
    pub fn new(stage: Arc<Stage>, config: Config) -> Self {
        Self {
            stage,
            config,
            contexts: std::array::from_fn(|_| LayerContext::new()),
        }
    }

    /// Attempts to parse and apply one frame from the front of `buf`.
    ///
    /// On `DecodeResult::Ok`, the caller discards `bytes_consumed` bytes.
    /// On `NeedMoreData`, `buf` is untouched and nothing was applied to the
    /// stage; the caller should retry once more bytes have arrived.
    ///
    /// # Errors
    ///
    /// Every [`ProtocolError`] variant here is fatal to the stream: the
    /// caller is expected to close the transport and drop this decoder.
    pub fn decode(&mut self, buf: &[u8]) -> Result<DecodeResult, ProtocolError> {
        const HEADER_AND_MARKER: usize = 8 + 1 + 2;
        if buf.len() < HEADER_AND_MARKER {
            return Ok(DecodeResult::NeedMoreData);
        }

        let mut r = ByteReader::new(buf);
        let frame_id = need!(r.read_u64_le());
        let layer_count = need!(r.read_u8());

        let mut plans: Vec<(u8, LayerPlan)> = Vec::with_capacity(layer_count as usize);
        for _ in 0..layer_count {
            let layer_id = need!(r.read_u8());
            if layer_id as usize >= MAX_LAYERS || layer_id >= self.config.max_layers {
                return Err(ProtocolError::LayerId(layer_id));
            }
            let frame_type = need!(r.read_u8());
            let plan = match frame_type {
                0 => match parse_ops(&mut r, &self.config)? {
                    Some(ops) => LayerPlan::Master(ops),
                    None => return Ok(DecodeResult::NeedMoreData),
                },
                1 => LayerPlan::Clear,
                2 => LayerPlan::Remain,
                _ => return Err(ProtocolError::BadFrame),
            };
            plans.push((layer_id, plan));
        }

        let marker = need!(r.read_bytes(2));
        if marker != [0xFF, 0xFF] {
            return Err(ProtocolError::BadFrame);
        }

        let bytes_consumed = r.position();

        self.stage.on_frame_start(frame_id);
        for (layer_id, plan) in &plans {
            match plan {
                LayerPlan::Clear => self.stage.clear(*layer_id)?,
                LayerPlan::Remain => self.stage.remain(*layer_id)?,
                LayerPlan::Master(ops) => {
                    self.stage.clear(*layer_id)?;
                    let ctx = &mut self.contexts[*layer_id as usize];
                    self.stage
                        .canvas_for(*layer_id, |canvas| apply_ops(ctx, canvas, ops))
                        .expect("layer was just cleared; canvas_for cannot fail here");
                }
            }
        }
        self.stage.on_frame_end();

        Ok(DecodeResult::Ok {
            bytes_consumed,
            frame_id,
            layer_count,
        })
    }
}
