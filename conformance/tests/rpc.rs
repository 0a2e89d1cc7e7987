// SPDX-License-Identifier: BSD-3-Clause
// Copyright 2025. Triad National Security, LLC.

include!(concat!(env!("OUT_DIR"), "/rpc_types.rs"));
include!(concat!(env!("OUT_DIR"), "/rpc.rs"));

use rpc::CALC;
use rpc::CALC::CALC_V1 as calc_v1;
use rpc_types::*;
use rt::XdrCodec;

#[derive(Default)]
struct RecordingTransport {
    last_reply: Vec<bytes::Bytes>,
}

impl rt::XdrTransport for RecordingTransport {
    fn reply_dispatch(&mut self, iovecs: Vec<bytes::Bytes>) -> Result<(), rt::XdrCodecError> {
        self.last_reply = iovecs;
        Ok(())
    }
}

fn add(_ctx: &mut rt::XdrCallContext, args: Args) -> Result<i32, rt::XdrCodecError> {
    Ok(args.a + args.b)
}

fn ping(_ctx: &mut rt::XdrCallContext, _: ()) -> Result<(), rt::XdrCodecError> {
    Ok(())
}

#[test]
fn dispatches_call_and_marshalls_reply() {
    let transport = RecordingTransport::default();
    let mut desc = calc_v1::CALC_V1::init(CALC::PROGRAM, transport);
    desc.recv_call_ADD = Some(add);

    let args = Args { a: 2, b: 3 };
    let (call_iovecs, _) = args.marshall();

    calc_v1::call_dispatch_CALC_V1(&mut desc, calc_v1::ADD, &call_iovecs).unwrap();

    let reply_bytes: Vec<u8> = desc
        .transport
        .last_reply
        .iter()
        .flat_map(|b| b.to_vec())
        .collect();
    assert_eq!(reply_bytes, 5i32.to_be_bytes().to_vec());
}

#[test]
fn void_procedure_round_trips_with_empty_reply() {
    let transport = RecordingTransport::default();
    let mut desc = calc_v1::CALC_V1::init(CALC::PROGRAM, transport);
    desc.recv_call_PING = Some(ping);

    calc_v1::call_dispatch_CALC_V1(&mut desc, calc_v1::PING, &[]).unwrap();

    assert!(desc.transport.last_reply.is_empty());
}

#[test]
fn unregistered_procedure_callback_is_an_error() {
    let transport = RecordingTransport::default();
    let mut desc = calc_v1::CALC_V1::init(CALC::PROGRAM, transport);

    let args = Args { a: 1, b: 1 };
    let (call_iovecs, _) = args.marshall();
    let err = calc_v1::call_dispatch_CALC_V1(&mut desc, calc_v1::ADD, &call_iovecs).unwrap_err();
    assert!(matches!(err, rt::XdrCodecError::Unimplemented));
}

#[test]
fn unknown_procedure_id_is_an_error() {
    let transport = RecordingTransport::default();
    let mut desc = calc_v1::CALC_V1::init(CALC::PROGRAM, transport);
    let err = calc_v1::call_dispatch_CALC_V1(&mut desc, 999, &[]).unwrap_err();
    assert!(matches!(err, rt::XdrCodecError::Unimplemented));
}
