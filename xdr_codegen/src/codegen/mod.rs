// SPDX-License-Identifier: BSD-3-Clause
// Copyright 2025. Triad National Security, LLC.

// Emits Rust type definitions, marshall/unmarshall routines, and optional RPC-2 dispatch
// scaffolding for a resolved schema.

use crate::ast::*;
use crate::resolver::ResolvedSchema;
use crate::symbol_table::SymbolTable;

mod marshall;
mod rpc;
mod unmarshall;

use crate::runtime::RUNTIME;

/// Emits the types module: one Rust struct/enum per declared aggregate, each with its `Default`
/// impl. Analogous to the header half of the original two-artifact design -- no forward
/// declarations are needed (Rust item order is irrelevant to the compiler), but the declarations
/// are still emitted in the topologically valid order computed by the resolver, since that order
/// is itself a contract worth preserving in the output.
pub fn codegen_types(schema: &ResolvedSchema, type_module_name: &str) -> String {
    let mut buf = CodeBuf::new();

    buf.add_line("#[allow(non_camel_case_types, non_snake_case)]");
    buf.code_block(&format!("pub mod {type_module_name}"), |buf| {
        buf.add_line("use bytes::Bytes;");
        buf.add_line("");

        for name in schema.definition_list.iter() {
            let def = schema
                .symbol_table
                .lookup_definition(name)
                .expect("undefined name");
            def.definition(buf, &schema.symbol_table);
        }
    });

    buf.contents
}

/// Emits the source module: the embedded runtime, the `rt::XdrCodec` impl for every aggregate,
/// and (when enabled) RPC-2 dispatch scaffolding. Assumes `codegen_types`'s output, under
/// `type_module_name`, is a visible sibling item (the two generated files are included side by
/// side at the same scope, e.g. both via `include!` in the consuming crate's lib root).
pub fn codegen_source(schema: &ResolvedSchema, module_name: &str, type_module_name: &str) -> String {
    let mut buf = CodeBuf::new();

    buf.add_line("#[allow(dead_code)]");
    buf.code_block("mod rt", |buf| {
        for line in RUNTIME.lines() {
            buf.add_line(line);
        }
    });
    buf.add_line("");

    buf.add_line("#[allow(non_camel_case_types, non_snake_case, unused_variables)]");
    buf.code_block(&format!("pub mod {module_name}"), |buf| {
        buf.add_line(&format!("use super::{type_module_name}::*;"));
        buf.add_line("use bytes::Bytes;");
        buf.add_line("use super::rt;");
        buf.add_line("");

        for name in schema.definition_list.iter() {
            let def = schema
                .symbol_table
                .lookup_definition(name)
                .expect("undefined name");
            def.implementation(buf, &schema.symbol_table);
        }

        for prog in schema.programs.iter() {
            prog.codegen(buf, &schema.symbol_table);
        }
    });

    buf.contents
}

impl Definition {
    /// The Rust type definition: a struct, enum, or union-as-enum. Consts and typedefs emit
    /// nothing of their own -- a typedef is collapsed into its target's name wherever it's
    /// referenced, and a const becomes an inline `pub const`.
    fn definition(&self, buf: &mut CodeBuf, tab: &SymbolTable) {
        match self {
            Definition::Const(c) => match &c.value {
                Value::Int(n) => {
                    buf.add_line(&format!("pub const {}: u64 = {};", c.name.to_uppercase(), n));
                }
                Value::Name(name) => {
                    let v = tab.lookup_definition(name).unwrap().as_const(tab);
                    buf.add_line(&format!("pub const {}: u64 = {};", c.name.to_uppercase(), v));
                }
            },
            Definition::Enum(e) => e.definition(buf),
            Definition::Struct(s) => s.definition(buf, tab),
            Definition::Union(u) => u.definition(buf, tab),
            Definition::TypeDef(_) => {}
        }
    }

    /// The impl block for the type: `Default`, `rt::XdrCodec`, and a public one-shot
    /// marshall/unmarshall wrapper pair.
    fn implementation(&self, buf: &mut CodeBuf, tab: &SymbolTable) {
        match self {
            Definition::Enum(e) => e.codegen(buf, tab),
            Definition::Struct(s) => s.codegen(buf, tab),
            Definition::Union(u) => u.codegen(buf, tab),
            Definition::TypeDef(_) | Definition::Const(_) => {}
        }
    }

    /// Given a definition, get its type name in a way suitable for a struct member.
    ///
    /// If the definition is based on an UnresolvedName, recursively look that name up in the
    /// symbol table.
    fn as_type_name(&self, tab: &SymbolTable) -> String {
        match self {
            Definition::Struct(s) => s.name.to_string(),
            Definition::Enum(e) => e.name.to_string(),
            Definition::Union(u) => u.name.to_string(),
            Definition::Const(c) => c.value.as_type_name(tab),
            Definition::TypeDef(t) => match &t.decl {
                Declaration::Named(n) => match &n.kind {
                    DeclarationKind::Scalar(ty) => ty.as_type_name(tab),
                    DeclarationKind::Optional(o) => o.optional_type_name(tab),
                    DeclarationKind::Array(arr) => arr.as_type_name(tab),
                },
                Declaration::Void => panic!("void typedef is not supported"),
            },
        }
    }

    fn as_const(&self, tab: &SymbolTable) -> u64 {
        match self {
            Definition::Const(c) => c.value.as_const(tab),
            _ => panic!("not a constant"),
        }
    }
}

impl Value {
    fn as_type_name(&self, tab: &SymbolTable) -> String {
        match self {
            Value::Int(i) => format!("{i}"),
            Value::Name(name) => tab
                .lookup_definition(name)
                .expect("undefined name")
                .as_type_name(tab),
        }
    }

    fn as_const(&self, tab: &SymbolTable) -> u64 {
        match self {
            Value::Int(i) => *i,
            Value::Name(name) => tab
                .lookup_definition(name)
                .expect("undefined name")
                .as_const(tab),
        }
    }
}

impl Array {
    fn as_type_name(&self, tab: &SymbolTable) -> String {
        let inner_type = match &self.kind {
            ArrayKind::Ascii => return "String".to_string(),
            ArrayKind::Byte if self.zerocopy => return "Bytes".to_string(),
            ArrayKind::Byte => "u8".to_string(),
            ArrayKind::UserType(ty) => ty.as_type_name(tab),
        };

        match &self.size {
            ArraySize::Fixed(v) => {
                let len = match v {
                    Value::Int(i) => *i,
                    Value::Name(name) => tab.lookup_definition(name).expect("undefined name").as_const(tab),
                };
                format!("[{inner_type}; {len}]")
            }
            ArraySize::Limited(_) | ArraySize::Unlimited => format!("Vec<{inner_type}>"),
        }
    }

    fn default_value(&self, tab: &SymbolTable) -> String {
        match &self.size {
            ArraySize::Fixed(v) => self.fixed_length_array_initializer(v, tab),
            _ => match &self.kind {
                ArrayKind::Ascii => "String::new()".to_string(),
                ArrayKind::Byte if self.zerocopy => "Bytes::new()".to_string(),
                _ => "Vec::new()".to_string(),
            },
        }
    }

    fn bound(&self, tab: &SymbolTable) -> u32 {
        match &self.size {
            ArraySize::Limited(Value::Int(i)) => *i as u32,
            ArraySize::Unlimited | ArraySize::Fixed(_) => 0,
            ArraySize::Limited(Value::Name(n)) => {
                tab.lookup_definition(n).expect("undefined name").as_const(tab) as u32
            }
        }
    }

    fn fixed_length_array_initializer(&self, val: &Value, tab: &SymbolTable) -> String {
        let inner_type = match &self.kind {
            ArrayKind::Ascii => "String".to_string(),
            ArrayKind::Byte => "u8".to_string(),
            ArrayKind::UserType(ty) => ty.as_type_name(tab),
        };

        let inner_default_value = match &self.kind {
            ArrayKind::Ascii => "String::new()".to_string(),
            ArrayKind::Byte => "0_u8".to_string(),
            ArrayKind::UserType(ty) => ty.default_value(tab),
        };
        let mut buf = CodeBuf::new();
        let len = val.as_const(tab);
        buf.code_block("", |buf| {
            buf.block_with_trailer(
                &format!("let arr: [{inner_type}; {len}] = ::core::array::from_fn(|_|"),
                ");",
                |buf| {
                    buf.add_line(&inner_default_value);
                },
            );
            buf.add_line("arr");
        });
        buf.contents
    }
}

impl NamedDeclaration {
    fn as_type_name(&self, tab: &SymbolTable) -> String {
        match &self.kind {
            DeclarationKind::Scalar(s) => s.as_type_name(tab),
            DeclarationKind::Array(arr) => arr.as_type_name(tab),
            DeclarationKind::Optional(o) => o.optional_type_name(tab),
        }
    }
    fn default_value(&self, tab: &SymbolTable) -> String {
        match &self.kind {
            DeclarationKind::Scalar(s) => s.default_value(tab),
            DeclarationKind::Array(a) => a.default_value(tab),
            DeclarationKind::Optional(o) => o.optional_default_value(tab),
        }
    }
}

impl XdrUnion {
    fn definition(&self, buf: &mut CodeBuf, tab: &SymbolTable) {
        buf.type_header();
        match &self.body {
            XdrUnionBody::Bool(b) => b.definition_bool(&self.name, buf, tab),
            XdrUnionBody::Enum(e) => e.definition_enum(&self.name, buf, tab),
        };
    }
    fn default(&self, buf: &mut CodeBuf, tab: &SymbolTable) {
        buf.code_block(&format!("impl Default for {}", self.name), |buf| {
            buf.code_block("fn default() -> Self", |buf| match &self.body {
                XdrUnionBody::Bool(b) => b.default_bool(buf),
                XdrUnionBody::Enum(e) => e.default_enum(buf, tab),
            })
        });
    }
    fn codegen(&self, buf: &mut CodeBuf, tab: &SymbolTable) {
        self.default(buf, tab);
        buf.code_block(&format!("impl rt::XdrCodec for {}", self.name), |buf| {
            self.marshall_definition(buf, tab);
            buf.add_line("");
            self.unmarshall_definition(buf, tab);
        });
        buf.add_line("");
    }
}

impl XdrUnionBoolBody {
    /// The field the case payload is stored under. Named after the case member itself (e.g.
    /// `value` for `case TRUE: int value;`), not the pivot -- the pivot is just the presence of
    /// this field (`Some`/`None`) and isn't separately stored.
    fn field_name(&self) -> &str {
        match &self.true_arm {
            Declaration::Named(n) => &n.name,
            Declaration::Void => &self.pivot_name,
        }
    }

    fn definition_bool(&self, name: &str, buf: &mut CodeBuf, tab: &SymbolTable) {
        let Declaration::Void = self.false_arm else {
            unimplemented!("bool union with a non-void false arm is not supported");
        };

        let inner_type = match &self.true_arm {
            Declaration::Named(n) => n.as_type_name(tab),
            Declaration::Void => "()".to_string(),
        };

        buf.code_block(&format!("pub struct {name}"), |buf| {
            buf.add_line(&format!("pub {}: Option<{inner_type}>,", self.field_name()));
        });
    }
    fn default_bool(&self, buf: &mut CodeBuf) {
        buf.code_block("Self", |buf| {
            buf.add_line(&format!("{}: None,", self.field_name()));
        });
    }
}

impl XdrUnionEnumBody {
    /// Given a union case value, which can be either an integer or an identifier, return a name
    /// suitable for a variant in a Rust enum.
    fn arm_name(val: &Value) -> String {
        match val {
            Value::Int(i) => format!("Var{i}"),
            Value::Name(n) => n.to_string(),
        }
    }
    fn definition_enum(&self, name: &str, buf: &mut CodeBuf, tab: &SymbolTable) {
        buf.code_block(&format!("pub enum {name}"), |buf| {
            for arm in self.arms.iter() {
                let name = XdrUnionEnumBody::arm_name(&arm.0);
                match &arm.1 {
                    Declaration::Void => buf.add_line(&format!("{name},")),
                    Declaration::Named(n) => {
                        let inner_type = n.as_type_name(tab);
                        buf.add_line(&format!("{name}({inner_type}),"));
                    }
                };
            }

            match &self.default_arm {
                Some(Declaration::Void) => buf.add_line("Default,"),
                Some(Declaration::Named(n)) => {
                    let inner_type = n.as_type_name(tab);
                    buf.add_line(&format!("Default({inner_type}),"));
                }
                None => {}
            }
        })
    }
    fn default_enum(&self, buf: &mut CodeBuf, tab: &SymbolTable) {
        let (value, declaration) = &self.arms[0];
        let name = XdrUnionEnumBody::arm_name(value);
        match declaration {
            Declaration::Void => buf.add_line(&format!("Self::{name}")),
            Declaration::Named(d) => {
                let inner_default = d.default_value(tab);
                buf.add_line(&format!("Self::{name}({inner_default})"));
            }
        };
    }

    /// Given the value `val`, convert it into its integer value for encoding. If `val` is already
    /// an int, use that, otherwise if it's a name, look it up in the discriminant enum.
    fn get_discriminant_value(&self, val: &Value, tab: &SymbolTable) -> u64 {
        match val {
            Value::Int(i) => *i,
            Value::Name(n) => {
                let Some(ref disc) = self.discriminant else {
                    panic!("BUG: enum-style union without a discriminant");
                };
                let Definition::Enum(ref e) = *tab.lookup_definition(disc).unwrap() else {
                    panic!("using non-enum {n} as a union discriminant is not allowed");
                };
                e.lookup_value(n, tab).unwrap()
            }
        }
    }
}

impl XdrStruct {
    fn definition(&self, buf: &mut CodeBuf, tab: &SymbolTable) {
        buf.type_header();
        buf.code_block(&format!("pub struct {}", self.name), |buf| {
            for decl in self.members.iter() {
                let Declaration::Named(decl) = decl else {
                    unimplemented!("void is not supported as a struct member");
                };
                self.member_declaration(decl, buf, tab);
            }
        });
        buf.add_line("");
    }

    fn member_declaration(&self, decl: &NamedDeclaration, buf: &mut CodeBuf, tab: &SymbolTable) {
        let type_name = decl.as_type_name(tab);
        buf.add_line(&format!("pub {}: {},", decl.name, type_name));
    }

    fn default(&self, buf: &mut CodeBuf, tab: &SymbolTable) {
        buf.code_block(&format!("impl Default for {}", self.name), |buf| {
            buf.code_block("fn default() -> Self", |buf| {
                buf.code_block(&self.name, |buf| {
                    for decl in self.members.iter() {
                        let Declaration::Named(decl) = decl else {
                            unimplemented!("void is not supported as a struct member");
                        };
                        buf.add_line(&format!("{}: {},", decl.name, decl.default_value(tab)));
                    }
                });
            });
        });
    }

    fn codegen(&self, buf: &mut CodeBuf, tab: &SymbolTable) {
        self.default(buf, tab);
        buf.code_block(&format!("impl rt::XdrCodec for {}", self.name), |buf| {
            self.marshall_definition(buf, tab);
            buf.add_line("");
            self.unmarshall_definition(buf, tab);
        });
        buf.add_line("");
    }
}

impl XdrEnum {
    fn definition(&self, buf: &mut CodeBuf) {
        buf.type_header();
        buf.code_block(&format!("pub enum {}", self.name), |buf| {
            for var in self.variants.iter() {
                buf.add_line(&format!("{},", var.0));
            }
        });
    }
    fn default(&self, buf: &mut CodeBuf) {
        buf.code_block(&format!("impl Default for {}", self.name), |buf| {
            buf.code_block("fn default() -> Self", |buf| {
                let default_variant = &self.variants[0];
                buf.add_line(&format!("{}::{}", self.name, default_variant.0));
            });
        });
    }
    fn codegen(&self, buf: &mut CodeBuf, tab: &SymbolTable) {
        self.default(buf);
        buf.code_block(&format!("impl rt::XdrCodec for {}", self.name), |buf| {
            self.marshall_definition(buf, tab);
            buf.add_line("");
            self.unmarshall_definition(buf, tab);
        });
        buf.add_line("");
    }
    /// Given the string `name`, look it up in this enum and return its integer value.
    fn lookup_value(&self, name: &str, tab: &SymbolTable) -> Option<u64> {
        for var in self.variants.iter() {
            if name == var.0 {
                return match &var.1 {
                    Value::Int(i) => Some(*i),
                    Value::Name(n) => Some(tab.lookup_definition(n).expect("undefined name").as_const(tab)),
                };
            }
        }
        None
    }
}

impl XdrType {
    fn as_type_name(&self, tab: &SymbolTable) -> String {
        match self {
            XdrType::Int => "i32".to_string(),
            XdrType::UInt => "u32".to_string(),
            XdrType::Hyper => "i64".to_string(),
            XdrType::UHyper => "u64".to_string(),
            XdrType::Float => "f32".to_string(),
            XdrType::Double => "f64".to_string(),
            XdrType::Quadruple => todo!("128-bit float is not representable in stable Rust"),
            XdrType::Bool => "bool".to_string(),
            XdrType::Name(s) => tab.lookup_definition(s).expect("undefined name").as_type_name(tab),
        }
    }

    fn default_value(&self, tab: &SymbolTable) -> String {
        match self {
            XdrType::Int | XdrType::UInt | XdrType::Hyper | XdrType::UHyper => "0".to_string(),
            XdrType::Float | XdrType::Double | XdrType::Quadruple => "0.0".to_string(),
            XdrType::Bool => "false".to_string(),
            XdrType::Name(n) => {
                let definition = tab.lookup_definition(n).unwrap();
                match *definition {
                    Definition::TypeDef(ref tdef) => match &tdef.decl {
                        Declaration::Void => panic!("void default value is not supported"),
                        Declaration::Named(n) => n.default_value(tab),
                    },
                    _ => format!("{n}::default()"),
                }
            }
        }
    }

    /// Check if this XdrType is a "self-referential optional", e.g.:
    ///    struct foo { int data; foo *next; };
    /// Such types are represented in Rust as `Vec<T>` rather than as a linked list.
    fn self_referential_optional(&self, tab: &SymbolTable) -> bool {
        let XdrType::Name(n) = self else {
            return false;
        };
        let Definition::Struct(ref s) = *tab.lookup_definition(n).expect("undefined name") else {
            return false;
        };
        s.self_referential_optional
    }
    fn optional_type_name(&self, tab: &SymbolTable) -> String {
        let inner_type = self.as_type_name(tab);
        if self.self_referential_optional(tab) {
            format!("Vec<{inner_type}>")
        } else {
            format!("Option<{inner_type}>")
        }
    }
    fn optional_default_value(&self, tab: &SymbolTable) -> String {
        if self.self_referential_optional(tab) {
            "Vec::new()"
        } else {
            "None"
        }
        .to_string()
    }
}

pub(crate) struct CodeBuf {
    contents: String,
    indent_level: usize,
}

impl CodeBuf {
    pub fn new() -> Self {
        CodeBuf {
            contents: String::new(),
            indent_level: 0,
        }
    }

    pub fn indent(&mut self) {
        self.indent_level += 1;
    }

    pub fn outdent(&mut self) {
        self.indent_level -= 1;
    }

    /// Format a code block: `start` followed by `{`, the block contents at one further level of
    /// indentation, then a closing `}`.
    pub fn code_block<F>(&mut self, start: &str, f: F)
    where
        F: FnMut(&mut CodeBuf),
    {
        self.block_with_trailer(start, "", f)
    }

    /// Same as `code_block`, but terminates the block with a semicolon to make it a statement.
    pub fn block_statement<F>(&mut self, start: &str, f: F)
    where
        F: FnMut(&mut CodeBuf),
    {
        self.block_with_trailer(start, ";", f)
    }

    pub fn block_with_trailer<F>(&mut self, start: &str, trailer: &str, mut f: F)
    where
        F: FnMut(&mut CodeBuf),
    {
        self.add_contents(start);
        self.contents.push_str(" {\n");
        self.indent();
        f(self);
        self.outdent();
        self.add_line(&format!("}}{trailer}"));
    }

    fn add_contents(&mut self, contents: &str) {
        self.contents.push_str(&"    ".repeat(self.indent_level));
        self.contents.push_str(contents);
    }

    /// Append `lines` to the buffer, each terminated with a newline and indented to the current
    /// level (if the caller passes multiple lines at once, each gets its own indentation).
    pub fn add_line(&mut self, lines: &str) {
        for line in lines.lines() {
            self.add_contents(line);
            self.contents.push('\n');
        }
    }

    pub fn type_header(&mut self) {
        self.add_line("#[derive(Debug, PartialEq, Clone)]");
    }
}
