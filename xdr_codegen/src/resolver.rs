// SPDX-License-Identifier: BSD-3-Clause
// Copyright 2025. Triad National Security, LLC.

// Runs once after parsing: collapses typedef chains to their terminal non-typedef target,
// confirms every type reference used by a struct, union, or typedef actually resolves, and marks
// structs that hold a self-referential optional "pointer" to themselves.

use std::collections::HashSet;

use crate::ast::*;
use crate::symbol_table::{Category, SymbolTable};
use crate::topo;
use crate::XdrError;

pub struct ResolvedSchema {
    pub symbol_table: SymbolTable,
    pub definition_list: Vec<String>,
    pub programs: Vec<Program>,
    pub contains_string: bool,
}

/// Where an undefined or cyclic reference was found, for diagnostic purposes. The two struct and
/// union cases produce distinct wording -- a union case's undefined member must not be reported
/// as though it were a struct member.
enum Referrer<'a> {
    Typedef(&'a str),
    StructMember(&'a str, &'a str),
    UnionCase(&'a str, &'a str),
    UnionPivot(&'a str),
}

impl std::fmt::Display for Referrer<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            Referrer::Typedef(t) => write!(f, "typedef {t}"),
            Referrer::StructMember(s, m) => write!(f, "struct {s} member {m}"),
            Referrer::UnionCase(u, c) => write!(f, "union {u} case {c}"),
            Referrer::UnionPivot(u) => write!(f, "union {u} pivot"),
        }
    }
}

pub fn resolve(schema: Schema) -> Result<ResolvedSchema, XdrError> {
    let (symbol_table, definition_list) = SymbolTable::new(&schema)?;

    collapse_typedefs(&symbol_table, &definition_list)?;

    for name in definition_list.iter() {
        let def = symbol_table.lookup_definition(name).unwrap();
        match &*def {
            Definition::Struct(s) => check_struct(s, &symbol_table)?,
            Definition::Union(u) => check_union(u, &symbol_table)?,
            Definition::TypeDef(_) | Definition::Const(_) | Definition::Enum(_) => {}
        }
    }

    for name in definition_list.iter() {
        let mut def = symbol_table.tab.get(name).unwrap().def.borrow_mut();
        if let Definition::Struct(s) = &mut *def {
            s.self_referential_optional(&symbol_table)?;
        }
    }

    let definition_list = emission_order(&definition_list, &symbol_table)?;

    Ok(ResolvedSchema {
        symbol_table,
        definition_list,
        programs: schema.programs,
        contains_string: schema.contains_string,
    })
}

/// Orders `definitions` the way the declaration and codec emitters require: constants, enums,
/// and typedefs (none of which have emission-order dependencies) keep their declared order, and
/// every struct/union is placed according to the topological relaxation over direct embeddings
/// (`topo::order_emission`), so a member never references an aggregate that hasn't been emitted
/// yet. Surfaces a direct-embedding cycle as `XdrError::CyclicDefinition` instead of emitting two
/// infinitely-sized Rust structs.
fn emission_order(definitions: &[String], tab: &SymbolTable) -> Result<Vec<String>, XdrError> {
    let aggregate_order = topo::order_emission(definitions, tab)?;
    let mut aggregate_order = aggregate_order.into_iter();

    let mut ordered = Vec::with_capacity(definitions.len());
    for name in definitions.iter() {
        match tab.category(name)? {
            Category::Struct | Category::Union => {
                ordered.push(aggregate_order.next().expect("one slot per aggregate"));
            }
            Category::Const | Category::Enum | Category::Typedef => {
                ordered.push(name.clone());
            }
        }
    }
    Ok(ordered)
}

/// Collapses every typedef's underlying reference so that, once this returns, a `TypeDef`
/// definition's declaration never itself points at another typedef. Detects cycles (`typedef a
/// b; typedef b a;`) as `CyclicDefinition` instead of looping.
fn collapse_typedefs(tab: &SymbolTable, definitions: &[String]) -> Result<(), XdrError> {
    for name in definitions.iter() {
        let is_typedef = matches!(tab.category(name)?, Category::Typedef);
        if !is_typedef {
            continue;
        }
        let mut visiting = HashSet::new();
        visiting.insert(name.clone());
        let mut ent = tab.tab.get(name).unwrap().def.borrow_mut();
        if let Definition::TypeDef(t) = &mut *ent {
            collapse_declaration(&mut t.decl, tab, &mut visiting, Referrer::Typedef(name))?;
        }
    }
    Ok(())
}

/// Follows `ty` through typedef indirections, rewriting it in place to name the terminal
/// non-typedef target. `visiting` guards against an infinite chain.
fn collapse_type(
    ty: &mut XdrType,
    tab: &SymbolTable,
    visiting: &mut HashSet<String>,
    referrer: &Referrer,
) -> Result<(), XdrError> {
    let XdrType::Name(name) = ty else {
        return Ok(());
    };

    if !tab.tab.contains_key(name.as_str()) {
        return Err(XdrError::UnknownType {
            referrer: referrer.to_string(),
            referent: name.clone(),
        });
    }

    if tab.category(name)? != Category::Typedef {
        return Ok(());
    }

    if !visiting.insert(name.clone()) {
        return Err(XdrError::CyclicDefinition(visiting.iter().cloned().collect()));
    }

    // Resolve this typedef's own chain first (idempotent if already collapsed), then adopt its
    // terminal target as our own.
    let target_name = name.clone();
    let mut target_def = tab.tab.get(&target_name).unwrap().def.borrow_mut();
    if let Definition::TypeDef(t) = &mut *target_def {
        collapse_declaration(&mut t.decl, tab, visiting, Referrer::Typedef(&target_name))?;
        if let Declaration::Named(n) = &t.decl {
            if let DeclarationKind::Scalar(inner) = &n.kind {
                *ty = inner.clone();
            }
        }
    }

    Ok(())
}

fn collapse_declaration(
    decl: &mut Declaration,
    tab: &SymbolTable,
    visiting: &mut HashSet<String>,
    referrer: Referrer,
) -> Result<(), XdrError> {
    let Declaration::Named(n) = decl else {
        return Ok(());
    };
    match &mut n.kind {
        DeclarationKind::Scalar(ty) => collapse_type(ty, tab, visiting, &referrer),
        DeclarationKind::Optional(ty) => collapse_type(ty, tab, visiting, &referrer),
        DeclarationKind::Array(a) => {
            if let ArrayKind::UserType(ty) = &mut a.kind {
                collapse_type(ty, tab, visiting, &referrer)
            } else {
                Ok(())
            }
        }
    }
}

fn check_declaration(
    decl: &Declaration,
    tab: &SymbolTable,
    referrer: Referrer,
) -> Result<(), XdrError> {
    let Declaration::Named(n) = decl else {
        return Ok(());
    };
    let ty = match &n.kind {
        DeclarationKind::Scalar(ty) => ty,
        DeclarationKind::Optional(ty) => ty,
        DeclarationKind::Array(Array {
            kind: ArrayKind::UserType(ty),
            ..
        }) => ty,
        DeclarationKind::Array(_) => return Ok(()),
    };
    if let XdrType::Name(name) = ty {
        if !tab.tab.contains_key(name.as_str()) {
            return Err(XdrError::UnknownType {
                referrer: referrer.to_string(),
                referent: name.clone(),
            });
        }
    }
    Ok(())
}

fn check_struct(s: &XdrStruct, tab: &SymbolTable) -> Result<(), XdrError> {
    for member in s.members.iter() {
        let Declaration::Named(n) = member else {
            continue;
        };
        check_declaration(member, tab, Referrer::StructMember(&s.name, &n.name))?;
    }
    Ok(())
}

fn check_union(u: &XdrUnion, tab: &SymbolTable) -> Result<(), XdrError> {
    match &u.body {
        XdrUnionBody::Bool(b) => {
            check_declaration(&b.true_arm, tab, Referrer::UnionCase(&u.name, "TRUE"))?;
            check_declaration(&b.false_arm, tab, Referrer::UnionCase(&u.name, "FALSE"))?;
        }
        XdrUnionBody::Enum(e) => {
            if let Some(disc) = &e.discriminant {
                if !tab.tab.contains_key(disc.as_str()) {
                    return Err(XdrError::UnknownType {
                        referrer: Referrer::UnionPivot(&u.name).to_string(),
                        referent: disc.clone(),
                    });
                }
            }
            for (value, decl) in e.arms.iter() {
                let case_name = match value {
                    Value::Int(i) => i.to_string(),
                    Value::Name(n) => n.clone(),
                };
                check_declaration(decl, tab, Referrer::UnionCase(&u.name, &case_name))?;
            }
            if let Some(decl) = &e.default_arm {
                check_declaration(decl, tab, Referrer::UnionCase(&u.name, "default"))?;
            }
        }
    }
    Ok(())
}

impl XdrStruct {
    /// Determine if a struct has a "self-referential optional":
    ///
    ///    struct foo {
    ///        /* initial fields */
    ///        ...
    ///        foo *next;       /* recursive */
    ///    };
    ///
    /// To simplify code generation, only allow a self-referential optional as the final field of
    /// the struct. If such a member occurred in the middle of a struct, it would complicate
    /// correct [de]serializing.
    fn self_referential_optional(&mut self, tab: &SymbolTable) -> Result<(), XdrError> {
        for member in self.members.iter() {
            if self.self_referential_optional {
                return Err(XdrError::UnsupportedOptional(self.name.clone()));
            }
            if is_declaration_option_of_name(&self.name, member, tab) {
                self.self_referential_optional = true;
            }
        }

        // The member itself stays in `self.members`: its declared type is `Optional(Name(self))`,
        // which the codec emitter already renders as `Vec<Self>` and a push-until-absent loop once
        // this flag is set, so no special per-field handling is needed downstream.
        Ok(())
    }
}

/// Determine if the given declaration is an optional field of type `outer_name`. Typedefs are
/// already collapsed by the time this runs, so a single lookup suffices.
fn is_declaration_option_of_name(outer_name: &str, decl: &Declaration, _tab: &SymbolTable) -> bool {
    match decl {
        Declaration::Named(n) => match &n.kind {
            DeclarationKind::Optional(XdrType::Name(member_type_name)) => {
                member_type_name == outer_name
            }
            _ => false,
        },
        Declaration::Void => false,
    }
}

#[cfg(test)]
mod tests {
    use crate::{resolver, Parser, Scanner, XdrError};

    fn try_resolve(src: &str) -> crate::Result<()> {
        let mut parser = Parser::new(Scanner::new(src));
        let schema = parser.parse()?;
        let _ = resolver::resolve(schema)?;
        Ok(())
    }

    #[test]
    fn invalid_optional() {
        let res = try_resolve("struct foo { foo *next; int a; };").unwrap_err();
        assert!(matches!(res, XdrError::UnsupportedOptional(_)));
    }

    #[test]
    fn valid_optional() {
        assert!(try_resolve("struct foo { int a; foo *next; };").is_ok());
    }

    #[test]
    fn typedef_chain_collapses() {
        assert!(try_resolve(
            "typedef unsigned int uint32; typedef uint32 myid; struct foo { myid a; };"
        )
        .is_ok());
    }

    #[test]
    fn undefined_struct_member_is_reported() {
        let res = try_resolve("struct foo { bar b; };").unwrap_err();
        assert!(matches!(res, XdrError::UnknownType { .. }));
    }

    #[test]
    fn undefined_union_case_names_the_union_not_a_struct() {
        let res = try_resolve(
            "union foo switch (unsigned tag) { case 1: bar b; default: void; };",
        )
        .unwrap_err();
        match res {
            XdrError::UnknownType { referrer, .. } => assert!(referrer.contains("union foo")),
            other => panic!("expected UnknownType, got {other:?}"),
        }
    }
}
