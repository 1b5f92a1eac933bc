//! End-to-end coverage of the wire protocol and the decoder/stage/renderer
//! handoff, using only the public API (`FrameEncoder` → `StreamDecoder` →
//! `Stage`).
//!
//! Tests for:
//! - Single-layer frame decode and publish (S1)
//! - `Remain` reuse across frames without a new pool allocation (S2)
//! - Partial delivery consuming nothing until the frame completes (S3)
//! - A corrupted end marker aborting the frame atomically (S4)
//! - A decoder that outruns the renderer skipping intermediate snapshots (S5)
//! - `shutdown` while a renderer still holds a snapshot copy (S6)

use std::sync::Arc;

use inkstage::canvas::RecordingCanvas;
use inkstage::{Color, Config, DecodeResult, FrameEncoder, LayerPool, Point, Stage, StreamDecoder};

fn new_session(layer_ids: &[u8]) -> (Arc<Stage>, StreamDecoder) {
    let pool = LayerPool::new(Arc::new(|_w, _h| Box::new(RecordingCanvas::new()) as Box<_>));
    let stage = Arc::new(Stage::new(pool));
    for &id in layer_ids {
        stage.configure_layer(id, 640, 480);
    }
    let decoder = StreamDecoder::new(Arc::clone(&stage), Config::default());
    (stage, decoder)
}

#[test]
fn s1_single_layer_frame_is_decoded_and_published() {
    let (stage, mut decoder) = new_session(&[0]);

    let mut encoder = FrameEncoder::new();
    encoder
        .begin_frame(1)
        .master_layer(0)
        .draw_circle(Point::new(600, 400), 30)
        .draw_text(Point::new(20, 30), "Frame 1");
    let bytes = encoder.finish_frame();

    let result = decoder.decode(&bytes).unwrap();
    assert_eq!(
        result,
        DecodeResult::Ok {
            bytes_consumed: bytes.len(),
            frame_id: 1,
            layer_count: 1,
        }
    );

    let snap = stage.try_copy_frame().unwrap();
    assert_eq!(snap.frame_id(), 1);
    assert!(snap.layer(0).is_some());
}

#[test]
fn s2_remain_reuses_prior_layer_without_new_allocation() {
    let (stage, mut decoder) = new_session(&[0]);

    let mut frame1 = FrameEncoder::new();
    frame1
        .begin_frame(1)
        .master_layer(0)
        .draw_rect(Point::new(10, 10), 100, 100);
    decoder.decode(&frame1.finish_frame()).unwrap();
    assert_eq!(stage.pool().stats().active, 1);

    let mut frame2 = FrameEncoder::new();
    frame2.begin_frame(2).remain_layer(0);
    let result = decoder.decode(&frame2.finish_frame()).unwrap();

    assert!(matches!(result, DecodeResult::Ok { frame_id: 2, .. }));
    assert_eq!(stage.pool().stats().active, 1);
    let snap = stage.try_copy_frame().unwrap();
    assert_eq!(snap.frame_id(), 2);
    assert!(snap.layer(0).is_some());
}

#[test]
fn s3_partial_delivery_consumes_nothing_until_whole() {
    let (_stage, mut decoder) = new_session(&[0]);

    let mut encoder = FrameEncoder::new();
    encoder
        .begin_frame(1)
        .master_layer(0)
        .draw_circle(Point::new(600, 400), 30)
        .draw_text(Point::new(20, 30), "Frame 1");
    let bytes = encoder.finish_frame();

    let prefix = &bytes[..bytes.len() - 3];
    assert_eq!(decoder.decode(prefix).unwrap(), DecodeResult::NeedMoreData);

    let result = decoder.decode(&bytes).unwrap();
    assert_eq!(
        result,
        DecodeResult::Ok {
            bytes_consumed: bytes.len(),
            frame_id: 1,
            layer_count: 1,
        }
    );
}

#[test]
fn s4_bad_end_marker_is_fatal_and_publishes_nothing() {
    let (stage, mut decoder) = new_session(&[0]);

    let mut encoder = FrameEncoder::new();
    encoder.begin_frame(1).clear_layer(0);
    let mut bytes = encoder.finish_frame();
    let len = bytes.len();
    bytes[len - 1] = 0xFE;

    let err = decoder.decode(&bytes).unwrap_err();
    assert!(matches!(err, inkstage::ProtocolError::BadFrame));
    assert!(stage.try_copy_frame().is_none());
}

#[test]
fn s5_decoder_faster_than_renderer_skips_intermediate_snapshots() {
    let (stage, mut decoder) = new_session(&[0]);

    for frame_id in 1..=3u64 {
        let mut encoder = FrameEncoder::new();
        encoder
            .begin_frame(frame_id)
            .master_layer(0)
            .draw_line(Point::new(0, 0), Point::new(1, 1));
        decoder.decode(&encoder.finish_frame()).unwrap();
    }

    // Frames 1 and 2 were never observed by a renderer; their Master layers
    // returned straight to the pool as each on_frame_end's publish dropped
    // the previous snapshot.
    assert_eq!(stage.pool().stats().active, 1);
    assert_eq!(stage.pool().stats().free, 2);

    let snap = stage.try_copy_frame().unwrap();
    assert_eq!(snap.frame_id(), 3);
}

#[test]
fn s6_shutdown_while_renderer_holds_a_copy() {
    let (stage, mut decoder) = new_session(&[0]);

    let mut encoder = FrameEncoder::new();
    encoder.begin_frame(1).clear_layer(0);
    decoder.decode(&encoder.finish_frame()).unwrap();

    let held = stage.try_copy_frame().unwrap();
    stage.shutdown();

    assert!(stage.try_copy_frame().is_none());
    assert!(held.layer(0).is_some());
    drop(held);
    assert_eq!(stage.pool().stats().active, 0);
}

#[test]
fn layer_id_sixteen_is_rejected_but_fifteen_is_valid() {
    let (_stage, mut decoder) = new_session(&[15]);

    let mut ok_encoder = FrameEncoder::new();
    ok_encoder.begin_frame(1).clear_layer(15);
    let result = decoder.decode(&ok_encoder.finish_frame()).unwrap();
    assert!(matches!(result, DecodeResult::Ok { .. }));

    let mut bad = Vec::new();
    bad.extend_from_slice(&2u64.to_le_bytes());
    bad.push(1);
    bad.push(16);
    bad.push(1);
    bad.extend_from_slice(&[0xFF, 0xFF]);
    let err = decoder.decode(&bad).unwrap_err();
    assert!(matches!(err, inkstage::ProtocolError::LayerId(16)));
}

#[test]
fn set_context_stroke_persists_across_frames_until_reset() {
    use inkstage::encoder::ContextProp;

    let (stage, mut decoder) = new_session(&[0]);

    let mut frame1 = FrameEncoder::new();
    frame1
        .begin_frame(1)
        .master_layer(0)
        .set_context(&[ContextProp::Stroke(Color::rgba(10, 20, 30, 255))]);
    decoder.decode(&frame1.finish_frame()).unwrap();

    // A second Master frame on the same layer, with no SetContext at all,
    // still draws with the stroke color set by frame 1 — LayerContext is
    // keyed by layer id and outlives any one frame.
    let mut frame2 = FrameEncoder::new();
    frame2
        .begin_frame(2)
        .master_layer(0)
        .draw_line(Point::new(0, 0), Point::new(5, 5));
    let result = decoder.decode(&frame2.finish_frame()).unwrap();
    assert!(matches!(result, DecodeResult::Ok { frame_id: 2, .. }));

    assert!(stage.try_copy_frame().is_some());
}
