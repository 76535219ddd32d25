//! Wire-level scenarios against the public API

use bytes::{Bytes, BytesMut};
use msocks_proto::{
    decode_one, encode, CodecConfig, ErrorCode, Frame, FrameBody, FrameCodec, FrameSender,
    FrameType, FrameWriter, ProtocolError, HEADER_LEN,
};
use proptest::prelude::*;

#[test]
fn syn_wire_format() {
    let frame = Frame::syn(7, "example.com:443");
    let encoded = encode(&frame).unwrap();

    let mut expected = vec![0x05, 0x00, 0x11, 0x00, 0x07, 0x00, 0x0f];
    expected.extend_from_slice(b"example.com:443");
    assert_eq!(&encoded[..], &expected[..]);

    let mut src = encoded;
    assert_eq!(decode_one(&mut src).unwrap(), frame);
    assert!(src.is_empty());
}

#[test]
fn ack_wire_format() {
    let frame = Frame::ack(3, 65536);
    let encoded = encode(&frame).unwrap();
    assert_eq!(
        &encoded[..],
        &[0x06, 0x00, 0x04, 0x00, 0x03, 0x00, 0x01, 0x00, 0x00]
    );

    let mut src = encoded;
    let decoded = decode_one(&mut src).unwrap();
    assert_eq!(decoded.body(), &FrameBody::Ack { window: 65536 });
    assert_eq!(decoded.stream_id(), 3);
}

#[test]
fn failed_frame_truncated() {
    let mut src = Bytes::from_static(&[0x02, 0x00, 0x04, 0x00, 0x01, 0x00, 0x02]);
    let err = decode_one(&mut src).unwrap_err();
    assert!(matches!(err, ProtocolError::TruncatedInput { .. }));
    assert!(err.is_fatal_to_connection());
}

#[test]
fn unknown_frame_type_reported() {
    let mut src = Bytes::from_static(&[99, 0x00, 0x00, 0x00, 0x0c]);
    let err = decode_one(&mut src).unwrap_err();

    let header = err.header().expect("header context");
    assert_eq!(header.frame_type, 99);
    assert_eq!(header.length, 0);
    assert_eq!(header.stream_id, 12);
    assert!(err.to_string().contains("type(99)"));
}

#[test]
fn oversized_string_rejected_before_writing() {
    let frame = Frame::auth(0, vec![b'a'; 65536], "pw");
    let mut buf = BytesMut::new();

    let err = frame.encode_to(&mut buf).unwrap_err();
    assert!(matches!(
        err,
        ProtocolError::OversizedField { field: "username", size: 65536, max: 65535 }
    ));
    assert!(buf.is_empty());
}

#[test]
fn failed_frame_carries_error_code() {
    let mut src = encode(&Frame::failed_with(4, ErrorCode::IdExists)).unwrap();
    let frame = decode_one(&mut src).unwrap();
    assert_eq!(frame.frame_type(), FrameType::Failed);
    assert_eq!(frame.error_code(), Some(ErrorCode::IdExists));
}

#[tokio::test]
async fn interleaved_streams_over_one_connection() {
    let (client, mut server) = tokio::io::duplex(64 * 1024);
    let mut sender = FrameWriter::new(client);

    let outbound = vec![
        Frame::auth(0, "alice", "secret"),
        Frame::syn(1, "example.com:443"),
        Frame::syn(2, "10.1.2.3:22"),
        Frame::data(1, "GET / HTTP/1.1\r\n\r\n"),
        Frame::ack(2, 262_144),
        Frame::data(2, Bytes::from_static(b"SSH-2.0-client\r\n")),
        Frame::ping(),
        Frame::fin(1),
        Frame::rst(2),
    ];

    let writer = tokio::spawn({
        let outbound = outbound.clone();
        async move {
            for frame in outbound {
                sender.send_frame(frame).await?;
            }
            sender.close().await
        }
    });

    let mut codec = FrameCodec::new();
    let mut inbound = Vec::new();
    while let Some(frame) = codec.read_frame(&mut server).await.unwrap() {
        inbound.push(frame);
    }

    writer.await.unwrap().unwrap();
    assert_eq!(inbound, outbound);
}

#[tokio::test]
async fn large_payload_split_across_frames() {
    let payload = Bytes::from(vec![0x5a; 150_000]);
    let frames = Frame::split_data(9, payload.clone());
    assert_eq!(frames.len(), 3);

    let mut wire = BytesMut::new();
    for frame in &frames {
        frame.encode_to(&mut wire).unwrap();
    }
    assert_eq!(wire.len(), payload.len() + 3 * HEADER_LEN);

    let mut codec = FrameCodec::with_config(CodecConfig::default()).unwrap();
    codec.feed(&wire);

    let mut reassembled = BytesMut::new();
    while let Some(frame) = codec.try_decode_frame().unwrap() {
        match frame.into_body() {
            FrameBody::Data { data } => reassembled.extend_from_slice(&data),
            other => panic!("unexpected frame body: {:?}", other),
        }
    }
    assert_eq!(reassembled.freeze(), payload);
}

proptest! {
    #[test]
    fn arbitrary_bytes_never_panic(data in prop::collection::vec(any::<u8>(), 0..512)) {
        let mut src = Bytes::from(data);
        // Decode until the source is exhausted or an error stops the stream
        while !src.is_empty() {
            if decode_one(&mut src).is_err() {
                break;
            }
        }
    }

    #[test]
    fn header_length_matches_payload(
        stream_id in any::<u16>(),
        address in "[a-z0-9.]{0,64}:[0-9]{1,5}",
        window in any::<u32>()
    ) {
        for frame in [Frame::syn(stream_id, address.clone()), Frame::ack(stream_id, window)] {
            let encoded = encode(&frame).unwrap();
            let declared = u16::from_be_bytes([encoded[1], encoded[2]]) as usize;
            prop_assert_eq!(declared, encoded.len() - HEADER_LEN);
        }
    }
}
