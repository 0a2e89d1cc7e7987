// SPDX-License-Identifier: BSD-3-Clause
// Copyright 2025. Triad National Security, LLC.

include!(concat!(env!("OUT_DIR"), "/arrays_types.rs"));
include!(concat!(env!("OUT_DIR"), "/arrays.rs"));
use arrays::*;
use rt::XdrCodec;

#[test]
fn fixed_opaque_round_trip() {
    let before = FixedBytes { data: [1, 2, 3, 4, 5, 6, 7, 8] };
    let (iovecs, _) = before.marshall();
    let after = FixedBytes::unmarshall(&iovecs).unwrap();
    assert_eq!(before, after);
}

#[test]
fn variable_opaque_round_trip() {
    let before = VarBytes { data: vec![9, 8, 7] };
    let (iovecs, _) = before.marshall();
    let after = VarBytes::unmarshall(&iovecs).unwrap();
    assert_eq!(before, after);
}

#[test]
fn variable_opaque_bound_exceeded_is_rejected() {
    let before = VarBytes {
        data: vec![0u8; 17],
    };
    let (iovecs, _) = before.marshall();
    let err = VarBytes::unmarshall(&iovecs).unwrap_err();
    assert!(matches!(
        err,
        rt::XdrCodecError::BoundExceeded { bound: 16, found: 17 }
    ));
}

#[test]
fn zerocopy_opaque_is_preserved() {
    let payload = bytes::Bytes::from_static(b"zero-copy payload bytes");
    let before = ZeroCopyBytes { payload: payload.clone() };
    let (iovecs, _) = before.marshall();
    let after = ZeroCopyBytes::unmarshall(&iovecs).unwrap();
    assert_eq!(before.payload, after.payload);
    assert_eq!(after.payload, payload);
}

#[test]
fn arrays_of_struct_round_trip() {
    let mut before = IntArrays::default();
    for i in 0..4 {
        before.fixed[i] = AnInt { a: i as u32 };
    }
    for i in 0..4 {
        before.limited.push(AnInt { a: 100 + i as u32 });
    }
    for i in 0..50 {
        before.unlimited.push(AnInt { a: i as u32 });
    }

    let (iovecs, _) = before.marshall();
    let after = IntArrays::unmarshall(&iovecs).unwrap();
    assert_eq!(before, after);
}

#[test]
fn limited_array_bound_exceeded_is_rejected() {
    let mut before = IntArrays::default();
    for i in 0..5 {
        before.limited.push(AnInt { a: i as u32 });
    }
    let (iovecs, _) = before.marshall();
    assert!(IntArrays::unmarshall(&iovecs).is_err());
}

#[test]
fn strings_round_trip() {
    let before = Strings {
        short: "abc".to_string(),
        unbounded: "a much longer string that has no declared bound".to_string(),
    };
    let (iovecs, _) = before.marshall();
    let after = Strings::unmarshall(&iovecs).unwrap();
    assert_eq!(before, after);
}
