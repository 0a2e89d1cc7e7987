// SPDX-License-Identifier: BSD-3-Clause
// Copyright 2025. Triad National Security, LLC.

include!(concat!(env!("OUT_DIR"), "/enums_unions_types.rs"));
include!(concat!(env!("OUT_DIR"), "/enums_unions.rs"));
use enums_unions::*;
use rt::XdrCodec;

#[test]
fn enum_round_trip() {
    for color in [Color::RED, Color::GREEN, Color::BLUE] {
        let (iovecs, _) = color.marshall();
        let after = Color::unmarshall(&iovecs).unwrap();
        assert_eq!(color, after);
    }
}

#[test]
fn bool_union_some_and_none() {
    let present = Toggle { value: Some(42) };
    let absent = Toggle { value: None };

    let (iovecs, _) = present.marshall();
    assert_eq!(Toggle::unmarshall(&iovecs).unwrap(), present);

    let (iovecs, _) = absent.marshall();
    assert_eq!(Toggle::unmarshall(&iovecs).unwrap(), absent);
}

#[test]
fn int_discriminated_union_round_trip() {
    let cases = vec![
        IntTagged::Var0(123),
        IntTagged::Var1(9_000_000_000),
        IntTagged::Default,
    ];
    for before in cases {
        let (iovecs, _) = before.marshall();
        let after = IntTagged::unmarshall(&iovecs).unwrap();
        assert_eq!(before, after);
    }
}

#[test]
fn enum_discriminated_union_round_trip() {
    let cases = vec![
        ColorTagged::RED(1),
        ColorTagged::GREEN(2),
        ColorTagged::Default,
    ];
    for before in cases {
        let (iovecs, _) = before.marshall();
        let after = ColorTagged::unmarshall(&iovecs).unwrap();
        assert_eq!(before, after);
    }
}
