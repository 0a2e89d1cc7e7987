// SPDX-License-Identifier: BSD-3-Clause
// Copyright 2025. Triad National Security, LLC.

// Unmarshall (decode) routines for XDR data types.

use super::*;
use crate::symbol_table::SymbolTable;

impl Array {
    pub(super) fn unmarshall_inline(&self, name: &str, buf: &mut CodeBuf, tab: &SymbolTable) {
        match &self.size {
            ArraySize::Fixed(_) => {}
            _ => {
                let bound = self.bound(tab);
                buf.add_line("let len = cursor.get_u32()?;");
                if bound > 0 {
                    buf.block_statement(&format!("if len > {bound}"), |buf| {
                        buf.add_line(&format!(
                            "return Err(rt::XdrCodecError::BoundExceeded {{ bound: {bound}, found: len }});"
                        ));
                    });
                }
            }
        }
        match &self.kind {
            ArrayKind::Ascii => {
                buf.add_line("let raw = cursor.get_vec(len as usize)?;");
                buf.add_line("cursor.skip(rt::pad_len(len as usize))?;");
                buf.add_line(&format!(
                    "{name} = String::from_utf8(raw).map_err(|_| rt::XdrCodecError::Truncated)?;"
                ));
            }
            ArrayKind::Byte if self.zerocopy => {
                let len = match &self.size {
                    ArraySize::Fixed(v) => format!("{}", value_len(v, tab)),
                    _ => "len as usize".to_string(),
                };
                buf.add_line(&format!("{name} = cursor.get_zerocopy({len}, dbuf)?;"));
                buf.add_line(&format!("cursor.skip(rt::pad_len({len}))?;"));
            }
            ArrayKind::Byte => match &self.size {
                ArraySize::Fixed(v) => {
                    let len = value_len(v, tab);
                    buf.add_line(&format!("let raw = cursor.get_vec({len})?;"));
                    buf.add_line(&format!("cursor.skip(rt::pad_len({len}))?;"));
                    buf.add_line(&format!("{name}.copy_from_slice(&raw);"));
                }
                _ => {
                    buf.add_line(&format!("{name} = cursor.get_vec(len as usize)?;"));
                    buf.add_line("cursor.skip(rt::pad_len(len as usize))?;");
                }
            },
            ArrayKind::UserType(ty) => {
                let loop_count = match &self.size {
                    ArraySize::Fixed(v) => format!("0..{}", value_len(v, tab)),
                    _ => "0..len".to_string(),
                };
                buf.block_statement(&format!("for _i in {loop_count}"), |buf| {
                    let tmp_name = "item";
                    ty.unmarshall_inline(tmp_name, buf, tab);
                    match &self.size {
                        ArraySize::Fixed(_) => buf.add_line(&format!("{name}[_i as usize] = {tmp_name};")),
                        _ => buf.add_line(&format!("{name}.push({tmp_name});")),
                    }
                });
            }
        }
    }
}

fn value_len(v: &Value, tab: &SymbolTable) -> u64 {
    match v {
        Value::Int(i) => *i,
        Value::Name(n) => tab.lookup_definition(n).expect("undefined name").as_const(tab),
    }
}

impl NamedDeclaration {
    /// Generate code to unmarshall a named declaration, inline within the unmarshalling routine
    /// for another container type (struct, union, etc.)
    ///
    /// If `override_name` is `Some(name)`, uses `name` (a fresh `let mut` binding the caller has
    /// already declared) instead of assigning directly into `self.<name>`.
    pub(super) fn unmarshall_inline(&self, override_name: Option<&str>, buf: &mut CodeBuf, tab: &SymbolTable) {
        let var_name = match override_name {
            Some(over) => over.to_string(),
            None => format!("self.{}", self.name),
        };
        match &self.kind {
            DeclarationKind::Scalar(ty) => ty.unmarshall_scalar_into(&var_name, buf, tab),
            DeclarationKind::Array(a) => a.unmarshall_inline(&var_name, buf, tab),
            DeclarationKind::Optional(o) => o.unmarshall_optional_inline(&var_name, buf, tab),
        }
    }
}

impl XdrUnion {
    pub(super) fn unmarshall_definition(&self, buf: &mut CodeBuf, tab: &SymbolTable) {
        buf.code_block(
            "fn unmarshall_from(cursor: &mut rt::XdrReadCursor, dbuf: &mut rt::XdrDecodeBuffer) -> Result<Self, rt::XdrCodecError>",
            |buf| {
                match &self.body {
                    XdrUnionBody::Bool(b) => b.unmarshall_bool(buf, tab),
                    XdrUnionBody::Enum(e) => e.unmarshall_enum(buf, tab),
                }
            },
        );
    }
}

impl XdrUnionBoolBody {
    pub(super) fn unmarshall_bool(&self, buf: &mut CodeBuf, tab: &SymbolTable) {
        buf.add_line("let discriminant = cursor.get_u32()?;");
        buf.block_statement(&format!("let {} = match discriminant", self.field_name()), |buf| {
            buf.add_line("0 => None,");
            match &self.true_arm {
                Declaration::Void => buf.add_line("_ => None,"),
                Declaration::Named(n) => {
                    buf.code_block("_ => ", |buf| {
                        buf.add_line(&format!("let mut val = {};", n.default_value(tab)));
                        n.unmarshall_inline(Some("val"), buf, tab);
                        buf.add_line("Some(val)");
                    });
                }
            };
        });
        buf.add_line("Ok(Self {");
        buf.indent();
        buf.add_line(&format!("{},", self.field_name()));
        buf.outdent();
        buf.add_line("})");
    }
}

impl XdrUnionEnumBody {
    pub(super) fn unmarshall_enum(&self, buf: &mut CodeBuf, tab: &SymbolTable) {
        buf.add_line("let discriminant = cursor.get_i32()?;");
        buf.block_statement("let result = match discriminant", |buf| {
            for arm in self.arms.iter() {
                let discriminant_value = self.get_discriminant_value(&arm.0, tab) as i64;
                buf.code_block(&format!("{discriminant_value} => "), |buf| {
                    let arm_name = XdrUnionEnumBody::arm_name(&arm.0);
                    match &arm.1 {
                        Declaration::Void => buf.add_line(&format!("Self::{arm_name}")),
                        Declaration::Named(n) => {
                            buf.add_line(&format!("let mut inner = {};", n.default_value(tab)));
                            n.unmarshall_inline(Some("inner"), buf, tab);
                            buf.add_line(&format!("Self::{arm_name}(inner)"));
                        }
                    };
                });
            }
            if let Some(default_arm) = &self.default_arm {
                match default_arm {
                    Declaration::Void => buf.add_line("_ => Self::Default,"),
                    Declaration::Named(n) => {
                        buf.code_block("_ => ", |buf| {
                            buf.add_line(&format!("let mut inner = {};", n.default_value(tab)));
                            n.unmarshall_inline(Some("inner"), buf, tab);
                            buf.add_line("Self::Default(inner)");
                        });
                    }
                };
            } else {
                buf.add_line("_ => return Err(rt::XdrCodecError::Truncated),");
            }
        });
        buf.add_line("Ok(result)");
    }
}

impl XdrStruct {
    pub(super) fn unmarshall_definition(&self, buf: &mut CodeBuf, tab: &SymbolTable) {
        buf.code_block(
            "fn unmarshall_from(cursor: &mut rt::XdrReadCursor, dbuf: &mut rt::XdrDecodeBuffer) -> Result<Self, rt::XdrCodecError>",
            |buf| {
                buf.add_line(&format!("let mut out = {}::default();", self.name));
                for decl in self.members.iter() {
                    let Declaration::Named(decl) = decl else {
                        continue;
                    };
                    buf.add_line(&format!("// {}", decl.name));
                    let var_name = format!("out.{}", decl.name);
                    match &decl.kind {
                        DeclarationKind::Scalar(ty) => ty.unmarshall_scalar_into(&var_name, buf, tab),
                        DeclarationKind::Array(a) => a.unmarshall_inline(&var_name, buf, tab),
                        DeclarationKind::Optional(o) => o.unmarshall_optional_inline(&var_name, buf, tab),
                    }
                }
                buf.add_line("Ok(out)");
            },
        );
    }
}

impl XdrEnum {
    pub(super) fn unmarshall_definition(&self, buf: &mut CodeBuf, tab: &SymbolTable) {
        buf.code_block(
            "fn unmarshall_from(cursor: &mut rt::XdrReadCursor, _dbuf: &mut rt::XdrDecodeBuffer) -> Result<Self, rt::XdrCodecError>",
            |buf| {
                buf.add_line("let val = cursor.get_i32()?;");
                buf.block_with_trailer("Ok(match val", ")", |buf| {
                    for variant in self.variants.iter() {
                        let val = variant.1.as_const(tab);
                        buf.add_line(&format!("{} => {}::{},", val, self.name, variant.0));
                    }
                    buf.add_line("_ => return Err(rt::XdrCodecError::Truncated),");
                });
            },
        );
    }
}

impl XdrType {
    /// Unmarshall this type into the pre-existing lvalue `var_name` (a `self.field` or `out.field`
    /// path, never a fresh binding -- used by struct/union member decoding).
    pub(super) fn unmarshall_scalar_into(&self, var_name: &str, buf: &mut CodeBuf, tab: &SymbolTable) {
        if let XdrType::Name(name) = self {
            if let Definition::TypeDef(_) = *tab.lookup_definition(name).unwrap() {
                unreachable!("typedef chains are collapsed before code generation");
            }
        }
        let expr = match self {
            XdrType::Int => "cursor.get_i32()?".to_string(),
            XdrType::UInt => "cursor.get_u32()?".to_string(),
            XdrType::Hyper => "cursor.get_i64()?".to_string(),
            XdrType::UHyper => "cursor.get_u64()?".to_string(),
            XdrType::Float => "f32::from_be_bytes({ let mut b = [0u8; 4]; cursor.extract(&mut b)?; b })".to_string(),
            XdrType::Double => "f64::from_be_bytes({ let mut b = [0u8; 8]; cursor.extract(&mut b)?; b })".to_string(),
            XdrType::Quadruple => todo!("128-bit float is not representable in stable Rust"),
            XdrType::Bool => "cursor.get_bool()?".to_string(),
            XdrType::Name(n) => format!("{n}::unmarshall_from(cursor, dbuf)?"),
        };
        buf.add_line(&format!("{var_name} = {expr};"));
    }

    /// Generate code to unmarshall this type into the *fresh* local `var_name` (used for vector
    /// elements and union arm payloads, where the variable has just been declared with
    /// `let mut`).
    pub(super) fn unmarshall_inline(&self, var_name: &str, buf: &mut CodeBuf, tab: &SymbolTable) {
        self.unmarshall_scalar_into(var_name, buf, tab);
    }

    pub(super) fn unmarshall_optional_inline(&self, name: &str, buf: &mut CodeBuf, tab: &SymbolTable) {
        if self.self_referential_optional(tab) {
            buf.code_block("loop", |buf| {
                buf.add_line("let item_follows = cursor.get_u32()?;");
                buf.block_statement("if item_follows == 0", |buf| {
                    buf.add_line("break;");
                });
                buf.add_line(&format!("let mut new = {};", self.default_value(tab)));
                self.unmarshall_inline("new", buf, tab);
                buf.add_line(&format!("{name}.push(new);"));
            });
        } else {
            buf.add_line("let optional_follows = cursor.get_u32()?;");
            buf.block_statement(&format!("{name} = match optional_follows"), |buf| {
                buf.add_line("0 => None,");
                buf.code_block("_ =>", |buf| {
                    buf.add_line(&format!("let mut new = {};", self.default_value(tab)));
                    self.unmarshall_inline("new", buf, tab);
                    buf.add_line("Some(new)");
                });
            });
        }
    }
}
