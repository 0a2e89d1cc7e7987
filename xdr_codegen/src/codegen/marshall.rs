// SPDX-License-Identifier: BSD-3-Clause
// Copyright 2025. Triad National Security, LLC.

// Marshall (encode) routines for XDR data types.

use super::*;
use crate::symbol_table::SymbolTable;

impl Array {
    pub(super) fn marshall_inline(&self, name: &str, buf: &mut CodeBuf, tab: &SymbolTable) {
        match &self.size {
            ArraySize::Fixed(_) => {}
            _ => buf.add_line(&format!("cursor.put_u32({name}.len() as u32);")),
        }
        match &self.kind {
            ArrayKind::Ascii => buf.add_line(&format!("cursor.append_padded({name}.as_bytes());")),
            ArrayKind::Byte if self.zerocopy => {
                buf.add_line(&format!("let len = {name}.len();"));
                buf.add_line(&format!("cursor.append_zerocopy({name}.clone());"));
                buf.add_line("cursor.append(&[0u8; 4][..rt::pad_len(len)]);");
            }
            ArrayKind::Byte => match &self.size {
                ArraySize::Fixed(_) => buf.add_line(&format!("cursor.append_padded(&{name});")),
                _ => buf.add_line(&format!("cursor.append_padded(&{name});")),
            },
            ArrayKind::UserType(ty) => {
                buf.block_statement(&format!("for item in {name}.iter()"), |buf| {
                    ty.marshall_inline("item", buf, tab);
                });
            }
        }
    }
}

impl NamedDeclaration {
    /// Generate code to marshall a named declaration, inline within the marshalling routine for
    /// another container type (struct, union, etc.)
    ///
    /// If `override_name` is `Some(name)`, uses `name` for the field instead of `self.<name>`.
    pub(super) fn marshall_inline(&self, override_name: Option<&str>, buf: &mut CodeBuf, tab: &SymbolTable) {
        let var_name = match override_name {
            Some(over) => over.to_string(),
            None => format!("self.{}", self.name),
        };
        match &self.kind {
            DeclarationKind::Scalar(ty) => ty.marshall_inline(&var_name, buf, tab),
            DeclarationKind::Array(a) => a.marshall_inline(&var_name, buf, tab),
            DeclarationKind::Optional(o) => o.marshall_optional_inline(&var_name, buf, tab),
        };
    }
}

impl XdrUnion {
    pub(super) fn marshall_definition(&self, buf: &mut CodeBuf, tab: &SymbolTable) {
        buf.code_block("fn marshall_into(&self, cursor: &mut rt::XdrWriteCursor)", |buf| {
            match &self.body {
                XdrUnionBody::Bool(b) => b.marshall_bool(buf, tab),
                XdrUnionBody::Enum(e) => e.marshall_enum(buf, tab),
            }
        });
    }
}

impl XdrUnionBoolBody {
    pub(super) fn marshall_bool(&self, buf: &mut CodeBuf, tab: &SymbolTable) {
        buf.code_block(&format!("match &self.{}", self.field_name()), |buf| {
            buf.code_block("Some(val) => ", |buf| {
                buf.add_line("cursor.put_u32(1);");
                match &self.true_arm {
                    Declaration::Void => {}
                    Declaration::Named(n) => n.marshall_inline(Some("val"), buf, tab),
                }
            });
            buf.add_line("None => cursor.put_u32(0),");
        });
    }
}

impl XdrUnionEnumBody {
    pub(super) fn marshall_enum(&self, buf: &mut CodeBuf, tab: &SymbolTable) {
        let mut max_disc = 0;
        buf.code_block("match self", |buf| {
            for arm in self.arms.iter() {
                let arm_name = XdrUnionEnumBody::arm_name(&arm.0);
                match &arm.1 {
                    Declaration::Void => {
                        buf.code_block(&format!("Self::{arm_name} => "), |buf| {
                            max_disc = self.marshall_discriminant_value(&arm.0, max_disc, buf, tab);
                        });
                    }
                    Declaration::Named(n) => {
                        buf.code_block(&format!("Self::{arm_name}(inner) => "), |buf| {
                            max_disc = self.marshall_discriminant_value(&arm.0, max_disc, buf, tab);
                            n.marshall_inline(Some("inner"), buf, tab);
                        });
                    }
                };
            }
            if let Some(default_arm) = &self.default_arm {
                match default_arm {
                    Declaration::Void => {
                        buf.code_block("Self::Default => ", |buf| {
                            let _ = self.marshall_discriminant_value(&Value::Int(max_disc + 1), 0, buf, tab);
                        });
                    }
                    Declaration::Named(n) => {
                        buf.code_block("Self::Default(inner) => ", |buf| {
                            let _ = self.marshall_discriminant_value(&Value::Int(max_disc + 1), 0, buf, tab);
                            n.marshall_inline(Some("inner"), buf, tab);
                        });
                    }
                };
            }
        });
    }

    /// Marshall the discriminant for `val` and return `max(max_disc, disc)`, so a default arm can
    /// be given a discriminant that doesn't collide with any declared case.
    fn marshall_discriminant_value(&self, val: &Value, max_disc: u64, buf: &mut CodeBuf, tab: &SymbolTable) -> u64 {
        let disc = self.get_discriminant_value(val, tab);
        buf.add_line(&format!("cursor.put_u32({disc}_u32);"));
        disc.max(max_disc)
    }
}

impl XdrStruct {
    pub(super) fn marshall_definition(&self, buf: &mut CodeBuf, tab: &SymbolTable) {
        buf.code_block("fn marshall_into(&self, cursor: &mut rt::XdrWriteCursor)", |buf| {
            for decl in self.members.iter() {
                let Declaration::Named(decl) = decl else {
                    continue;
                };
                decl.marshall_inline(None, buf, tab);
            }
        });
    }
}

impl XdrEnum {
    pub(super) fn marshall_definition(&self, buf: &mut CodeBuf, tab: &SymbolTable) {
        buf.code_block("fn marshall_into(&self, cursor: &mut rt::XdrWriteCursor)", |buf| {
            buf.block_statement("let val: i32 = match self", |buf| {
                for variant in self.variants.iter() {
                    let val = variant.1.as_const(tab);
                    buf.add_line(&format!("{}::{} => {},", self.name, variant.0, val));
                }
            });
            buf.add_line("cursor.put_i32(val);");
        });
    }
}

impl XdrType {
    pub(super) fn marshall_inline(&self, var_name: &str, buf: &mut CodeBuf, tab: &SymbolTable) {
        // Typedefs are collapsed by the resolver, so this only ever sees a terminal type.
        if let XdrType::Name(name) = self {
            if let Definition::TypeDef(_) = *tab.lookup_definition(name).unwrap() {
                unreachable!("typedef chains are collapsed before code generation");
            }
        }

        let expr = match self {
            XdrType::Int => format!("cursor.put_i32({var_name});"),
            XdrType::UInt => format!("cursor.put_u32({var_name});"),
            XdrType::Hyper => format!("cursor.put_i64({var_name});"),
            XdrType::UHyper => format!("cursor.put_u64({var_name});"),
            XdrType::Float => format!("cursor.append(&{var_name}.to_be_bytes());"),
            XdrType::Double => format!("cursor.append(&{var_name}.to_be_bytes());"),
            XdrType::Quadruple => todo!("128-bit float is not representable in stable Rust"),
            XdrType::Bool => format!("cursor.put_bool({var_name});"),
            XdrType::Name(_) => format!("{var_name}.marshall_into(cursor);"),
        };
        buf.add_line(&expr);
    }

    pub(super) fn marshall_optional_inline(&self, name: &str, buf: &mut CodeBuf, tab: &SymbolTable) {
        if self.self_referential_optional(tab) {
            buf.code_block(&format!("for item in {name}.iter()"), |buf| {
                buf.add_line("cursor.put_u32(1);");
                self.marshall_inline("item", buf, tab);
            });
            buf.add_line("cursor.put_u32(0);");
        } else {
            buf.block_statement(&format!("match &{name}"), |buf| {
                buf.code_block("Some(inner) => ", |buf| {
                    buf.add_line("cursor.put_u32(1);");
                    self.marshall_inline("inner", buf, tab);
                });
                buf.add_line("None => cursor.put_u32(0),");
            });
        }
    }
}
