// SPDX-License-Identifier: BSD-3-Clause
// Copyright 2025. Triad National Security, LLC.

// RPC-2 dispatch scaffolding: a per-version descriptor structure, a call dispatcher, and a
// reply helper per procedure. The RPC transport itself is an external collaborator -- generated
// code only calls into `rt::XdrTransport`.

use super::*;

impl Program {
    pub(super) fn codegen(&self, buf: &mut CodeBuf, tab: &SymbolTable) {
        buf.code_block(&format!("pub mod {}", self.name), |buf| {
            buf.add_line("use super::*;");
            buf.add_line(&format!("pub const PROGRAM: u32 = {};", self.id));
            for version in self.versions.iter() {
                version.codegen(buf, tab);
            }
        });
    }
}

impl ProcedureType {
    fn as_type_name(&self, tab: &SymbolTable) -> String {
        match self {
            ProcedureType::Void => "()".to_string(),
            ProcedureType::Ty(ty) => ty.as_type_name(tab),
        }
    }
}

impl ProgramVersion {
    fn codegen(&self, buf: &mut CodeBuf, tab: &SymbolTable) {
        buf.code_block(&format!("pub mod {}", self.name), |buf| {
            buf.add_line("use super::*;");
            buf.add_line(&format!("pub const VERSION: u32 = {};", self.id));
            for procedure in self.procedures.iter() {
                buf.add_line(&format!("pub const {}: u32 = {};", procedure.name, procedure.id));
            }
            buf.add_line("");

            self.descriptor_struct(buf, tab);
            buf.add_line("");
            self.init_fn(buf);
            buf.add_line("");
            self.dispatch_fn(buf, tab);
            buf.add_line("");
            for procedure in self.procedures.iter() {
                procedure.send_reply_fn(buf, tab);
                buf.add_line("");
            }
        });
    }

    fn descriptor_struct(&self, buf: &mut CodeBuf, tab: &SymbolTable) {
        buf.code_block(&format!("pub struct {}<T: rt::XdrTransport>", self.name), |buf| {
            buf.add_line("pub program: u32,");
            buf.add_line("pub version: u32,");
            buf.add_line("pub transport: T,");
            for procedure in self.procedures.iter() {
                let arg = procedure.arg.as_type_name(tab);
                buf.add_line(&format!(
                    "pub recv_call_{}: Option<fn(&mut rt::XdrCallContext, {}) -> Result<{}, rt::XdrCodecError>>,",
                    procedure.name, arg, procedure.ret.as_type_name(tab),
                ));
            }
        });
    }

    fn init_fn(&self, buf: &mut CodeBuf) {
        buf.code_block(
            &format!("impl<T: rt::XdrTransport> {}<T>", self.name),
            |buf| {
                buf.code_block(&format!("pub fn init(program: u32, transport: T) -> Self"), |buf| {
                    buf.code_block("Self", |buf| {
                        buf.add_line("program,");
                        buf.add_line("version: VERSION,");
                        buf.add_line("transport,");
                        for procedure in self.procedures.iter() {
                            buf.add_line(&format!("recv_call_{}: None,", procedure.name));
                        }
                    });
                });
            },
        );
    }

    fn dispatch_fn(&self, buf: &mut CodeBuf, tab: &SymbolTable) {
        buf.code_block(
            &format!(
                "pub fn call_dispatch_{}<T: rt::XdrTransport>(desc: &mut {}<T>, procedure: u32, call: &[bytes::Bytes]) -> Result<(), rt::XdrCodecError>",
                self.name, self.name
            ),
            |buf| {
                buf.code_block("match procedure", |buf| {
                    for procedure in self.procedures.iter() {
                        buf.code_block(&format!("{} => ", procedure.id), |buf| {
                            buf.block_statement(&format!("let Some(callback) = desc.recv_call_{} else", procedure.name), |buf| {
                                buf.add_line("return Err(rt::XdrCodecError::Unimplemented);");
                            });
                            buf.add_line("let mut ctx = rt::XdrCallContext::new(call);");
                            match &procedure.arg {
                                ProcedureType::Void => {
                                    buf.add_line("let reply = callback(&mut ctx, ())?;");
                                }
                                ProcedureType::Ty(ty) => {
                                    buf.add_line("let mut cursor = rt::XdrReadCursor::new(ctx.iovecs);");
                                    buf.add_line("let cursor = &mut cursor;");
                                    buf.add_line("let dbuf = &mut ctx.dbuf;");
                                    buf.add_line(&format!("let mut arg = {};", ty.default_value(tab)));
                                    ty.unmarshall_scalar_into("arg", buf, tab);
                                    buf.add_line("let reply = callback(&mut ctx, arg)?;");
                                }
                            }
                            buf.add_line("let mut cursor_buf = rt::XdrWriteCursor::new();");
                            buf.add_line("let cursor = &mut cursor_buf;");
                            if let ProcedureType::Ty(ty) = &procedure.ret {
                                ty.marshall_inline("reply", buf, tab);
                            }
                            buf.add_line("let (iovecs, _) = cursor_buf.finish();");
                            buf.add_line("desc.transport.reply_dispatch(iovecs)");
                        });
                    }
                    buf.add_line("_ => Err(rt::XdrCodecError::Unimplemented),");
                });
            },
        );
    }
}

impl Procedure {
    fn send_reply_fn(&self, buf: &mut CodeBuf, tab: &SymbolTable) {
        let reply_type = self.ret.as_type_name(tab);
        buf.code_block(
            &format!(
                "pub fn send_reply_{}<T: rt::XdrTransport>(transport: &mut T, reply: &{reply_type}) -> Result<(), rt::XdrCodecError>",
                self.name
            ),
            |buf| {
                buf.add_line("let mut cursor_buf = rt::XdrWriteCursor::new();");
                buf.add_line("let cursor = &mut cursor_buf;");
                if let ProcedureType::Ty(ty) = &self.ret {
                    ty.marshall_inline("(*reply)", buf, tab);
                }
                buf.add_line("let (iovecs, _) = cursor_buf.finish();");
                buf.add_line("transport.reply_dispatch(iovecs)");
            },
        );
    }
}
