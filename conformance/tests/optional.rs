// SPDX-License-Identifier: BSD-3-Clause
// Copyright 2025. Triad National Security, LLC.

include!(concat!(env!("OUT_DIR"), "/optional_types.rs"));
include!(concat!(env!("OUT_DIR"), "/optional.rs"));
use optional::*;
use rt::XdrCodec;

#[test]
fn empty_list_round_trips() {
    let before = ListNode { data: 1, next: Vec::new() };
    let (iovecs, _) = before.marshall();
    let after = ListNode::unmarshall(&iovecs).unwrap();
    assert_eq!(before, after);
}

#[test]
fn linked_list_round_trips() {
    let mut before = ListNode { data: 0, next: Vec::new() };
    for i in 1..5 {
        before.next.push(ListNode { data: i, next: Vec::new() });
    }

    let (iovecs, _) = before.marshall();
    let after = ListNode::unmarshall(&iovecs).unwrap();
    assert_eq!(before, after);
    assert_eq!(after.next.len(), 4);
}
