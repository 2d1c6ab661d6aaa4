//! Integration tests for frame codec buffer behavior.
//!
//! Validates that the codec consumes buffers incrementally, preserves
//! partial input, and agrees byte-for-byte with the pure frame serializer.

#![allow(clippy::expect_used, clippy::unwrap_used)]

use bytes::BytesMut;
use game_transport::core::codec::FrameCodec;
use game_transport::core::packet::{Frame, HEADER_SIZE};
use game_transport::{TransportError, PROTOCOL_VERSION};
use tokio_util::codec::{Decoder, Encoder};

#[test]
fn test_decode_splits_buffer() {
    let mut codec = FrameCodec;

    let frame = Frame::new(1002, vec![1, 2, 3, 4, 5]);
    let mut buffer = BytesMut::from(&frame.to_bytes()[..]);

    let decoded = codec
        .decode(&mut buffer)
        .expect("decode failed")
        .expect("expected a complete frame");

    assert_eq!(decoded, frame);
    assert_eq!(decoded.version, PROTOCOL_VERSION);
    assert_eq!(buffer.len(), 0);
}

#[test]
fn test_partial_header_preserves_buffer() {
    let mut codec = FrameCodec;

    // Five bytes is not enough for the 16-byte header.
    let mut buffer = BytesMut::from(&[0x0A, 0x00, 0x00, 0x00, 0x01][..]);

    let result = codec.decode(&mut buffer).expect("decode should not error");

    assert!(result.is_none());
    assert_eq!(buffer.len(), 5);
}

#[test]
fn test_partial_payload_preserves_buffer() {
    let mut codec = FrameCodec;

    let frame = Frame::new(7, vec![0xAB; 32]);
    let bytes = frame.to_bytes();
    let split_at = HEADER_SIZE + 10;

    let mut buffer = BytesMut::from(&bytes[..split_at]);
    assert!(codec.decode(&mut buffer).expect("no error").is_none());
    assert_eq!(buffer.len(), split_at);

    // Feeding the rest completes the frame.
    buffer.extend_from_slice(&bytes[split_at..]);
    let decoded = codec.decode(&mut buffer).expect("no error").expect("frame");
    assert_eq!(decoded, frame);
}

#[test]
fn test_encode_agrees_with_pure_serializer() {
    let mut codec = FrameCodec;

    let frame = Frame::new(4006, vec![9u8; 100]);
    let mut buffer = BytesMut::new();
    codec.encode(frame.clone(), &mut buffer).expect("encode");

    assert_eq!(buffer.len(), HEADER_SIZE + 100);
    assert_eq!(&buffer[..], &frame.to_bytes()[..]);

    let reparsed = Frame::from_bytes(&buffer).expect("from_bytes");
    assert_eq!(reparsed, frame);
}

#[test]
fn test_multiple_frames_in_one_buffer() {
    let mut codec = FrameCodec;

    let first = Frame::new(1, vec![1, 2, 3]);
    let second = Frame::heartbeat();
    let third = Frame::new(3, vec![7; 40]);

    let mut buffer = BytesMut::new();
    for frame in [&first, &second, &third] {
        buffer.extend_from_slice(&frame.to_bytes());
    }

    assert_eq!(codec.decode(&mut buffer).unwrap().unwrap(), first);
    assert_eq!(codec.decode(&mut buffer).unwrap().unwrap(), second);
    assert_eq!(codec.decode(&mut buffer).unwrap().unwrap(), third);
    assert!(codec.decode(&mut buffer).unwrap().is_none());
    assert!(buffer.is_empty());
}

#[test]
fn test_garbage_length_is_an_error_not_a_hang() {
    let mut codec = FrameCodec;

    let mut frame_bytes = Frame::heartbeat().to_bytes();
    frame_bytes[8..12].copy_from_slice(&(-5i32).to_le_bytes());

    let mut buffer = BytesMut::from(&frame_bytes[..]);
    assert!(matches!(
        codec.decode(&mut buffer),
        Err(TransportError::MalformedHeader)
    ));
}
