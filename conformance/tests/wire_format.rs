// SPDX-License-Identifier: BSD-3-Clause
// Copyright 2025. Triad National Security, LLC.

include!(concat!(env!("OUT_DIR"), "/basic_types.rs"));
include!(concat!(env!("OUT_DIR"), "/basic.rs"));
use basic::*;
use rt::XdrCodec;

fn flatten(iovecs: Vec<bytes::Bytes>) -> Vec<u8> {
    iovecs.iter().flat_map(|b| b.to_vec()).collect()
}

#[test]
fn int_is_big_endian_four_bytes() {
    let p = Point {
        x: 0x0102_0304,
        y: 1,
    };
    let (iovecs, total) = p.marshall();
    let bytes = flatten(iovecs);
    assert_eq!(total, 8);
    assert_eq!(bytes, vec![0x01, 0x02, 0x03, 0x04, 0x00, 0x00, 0x00, 0x01]);
}

#[test]
fn string_is_length_prefixed_and_zero_padded() {
    let n = Named {
        name: "hi".to_string(),
        value: 7,
    };
    let (iovecs, _) = n.marshall();
    let bytes = flatten(iovecs);
    assert_eq!(
        &bytes[..8],
        &[0x00, 0x00, 0x00, 0x02, b'h', b'i', 0x00, 0x00]
    );
    assert_eq!(&bytes[8..], &0x07u32.to_be_bytes());
}

#[test]
fn struct_round_trip() {
    let before = Record {
        id: 42,
        origin: Point { x: -1, y: 2 },
        active: true,
        stamps: Timestamps {
            atime: 123456789,
            mtime: -987654321,
        },
    };

    let (iovecs, _) = before.marshall();
    let after = Record::unmarshall(&iovecs).unwrap();
    assert_eq!(before, after);
}

#[test]
fn marshalling_is_deterministic() {
    let before = Record {
        id: 1,
        origin: Point { x: 3, y: 4 },
        active: false,
        stamps: Timestamps {
            atime: 1,
            mtime: 2,
        },
    };

    let (a, _) = before.marshall();
    let (b, _) = before.marshall();
    assert_eq!(flatten(a), flatten(b));
}

#[test]
fn truncated_input_is_rejected() {
    let before = Point { x: 5, y: 6 };
    let (iovecs, _) = before.marshall();
    let mut truncated = flatten(iovecs);
    truncated.truncate(4);
    let err = Point::unmarshall(&[bytes::Bytes::from(truncated)]);
    assert!(err.is_err());
}
