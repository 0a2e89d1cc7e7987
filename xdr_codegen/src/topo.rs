// SPDX-License-Identifier: BSD-3-Clause
// Copyright 2025. Triad National Security, LLC.

// The topological relaxation loop the declaration and codec emitters share: struct and union
// bodies may reference each other, so they can't simply be emitted in source order. A member is
// a hard ordering dependency only when it embeds another aggregate directly (by value); a
// pointer, vector, or optional member is heap-indirect in the generated Rust and never blocks
// emission, including when it points back at the containing type itself.

use crate::ast::*;
use crate::symbol_table::{Category, SymbolTable};
use crate::XdrError;

/// Returns, in a valid emission order, the names of every struct/union in `definitions`.
pub fn order_emission(definitions: &[String], tab: &SymbolTable) -> Result<Vec<String>, XdrError> {
    let aggregates: Vec<&String> = definitions
        .iter()
        .filter(|name| {
            matches!(
                tab.category(name).unwrap(),
                Category::Struct | Category::Union
            )
        })
        .collect();

    let mut order = Vec::new();

    loop {
        let mut pending = false;
        let mut progressed = false;

        for name in aggregates.iter() {
            if tab.is_emitted(name) {
                continue;
            }

            let def = tab.lookup_definition(name).unwrap();
            let deps = direct_deps(&def);
            let ready = deps
                .iter()
                .all(|dep| dep == *name || tab.is_emitted(dep));

            if ready {
                tab.mark_emitted(name);
                order.push((*name).clone());
                progressed = true;
            } else {
                pending = true;
            }
        }

        if !pending {
            break;
        }
        if !progressed {
            let stuck: Vec<String> = aggregates
                .iter()
                .filter(|name| !tab.is_emitted(name))
                .map(|s| (*s).clone())
                .collect();
            return Err(XdrError::CyclicDefinition(stuck));
        }
    }

    Ok(order)
}

/// Non-builtin aggregate names embedded directly (by value, not by pointer/vector/optional) in
/// `def`. These are the only edges that block emission order.
fn direct_deps(def: &Definition) -> Vec<String> {
    let mut deps = Vec::new();
    match def {
        Definition::Struct(s) => {
            for member in s.members.iter() {
                collect_declaration_deps(member, &mut deps);
            }
        }
        Definition::Union(u) => match &u.body {
            XdrUnionBody::Bool(b) => {
                collect_declaration_deps(&b.true_arm, &mut deps);
                collect_declaration_deps(&b.false_arm, &mut deps);
            }
            XdrUnionBody::Enum(e) => {
                for (_, decl) in e.arms.iter() {
                    collect_declaration_deps(decl, &mut deps);
                }
                if let Some(decl) = &e.default_arm {
                    collect_declaration_deps(decl, &mut deps);
                }
            }
        },
        _ => {}
    }
    deps
}

fn collect_declaration_deps(decl: &Declaration, deps: &mut Vec<String>) {
    let Declaration::Named(n) = decl else {
        return;
    };
    // Only a direct scalar or fixed-size array of a user type is a hard dependency; optional
    // and variable-length vector members are heap-allocated in the generated Rust regardless.
    match &n.kind {
        DeclarationKind::Scalar(XdrType::Name(name)) => deps.push(name.clone()),
        DeclarationKind::Array(Array {
            kind: ArrayKind::UserType(XdrType::Name(name)),
            size: ArraySize::Fixed(_),
            ..
        }) => deps.push(name.clone()),
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use crate::{resolver, Parser, Scanner, XdrError};

    /// `resolver::resolve` now runs the topological relaxation loop itself (its
    /// `definition_list` is already in emission order), so these tests exercise it through the
    /// resolver's public surface rather than calling `order_emission` a second time, which would
    /// find every aggregate already marked emitted by the first pass.
    fn emission_order(src: &str) -> crate::Result<Vec<String>> {
        let mut parser = Parser::new(Scanner::new(src));
        let schema = parser.parse()?;
        let resolved = resolver::resolve(schema)?;
        Ok(resolved.definition_list)
    }

    #[test]
    fn forward_reference_is_reordered() {
        let order = emission_order("struct a { b inner; }; struct b { int x; };").unwrap();
        assert_eq!(order, vec!["b".to_string(), "a".to_string()]);
    }

    #[test]
    fn pointer_cycle_is_allowed() {
        let order =
            emission_order("struct a { b *next; }; struct b { a *next; };").unwrap();
        assert_eq!(order.len(), 2);
    }

    #[test]
    fn direct_embedding_cycle_is_rejected() {
        let err = emission_order("struct a { b inner; }; struct b { a inner; };").unwrap_err();
        assert!(matches!(err, XdrError::CyclicDefinition(_)));
    }
}
