// SPDX-License-Identifier: BSD-3-Clause
// Copyright 2025. Triad National Security, LLC.

use std::cell::{Cell, Ref, RefCell};
use std::collections::HashMap;

use crate::ast::*;
use crate::XdrError;

/// The category a symbol belongs to, mirroring the shape of its `Definition`. Kept as a
/// separate, cheap accessor rather than a stored field on `SymbolEntry` -- it's always derivable
/// from the `Definition` and storing it separately would just be one more place for the two to
/// drift out of sync.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Category {
    Const,
    Typedef,
    Struct,
    Enum,
    Union,
}

impl Definition {
    pub fn category(&self) -> Category {
        match self {
            Definition::Const(_) => Category::Const,
            Definition::TypeDef(_) => Category::Typedef,
            Definition::Struct(_) => Category::Struct,
            Definition::Enum(_) => Category::Enum,
            Definition::Union(_) => Category::Union,
        }
    }
}

pub struct SymbolEntry {
    pub def: RefCell<Definition>,
    /// Flipped monotonically from false to true once the declaration emitter has emitted this
    /// symbol's definition.
    pub emitted: Cell<bool>,
}

pub struct SymbolTable {
    pub tab: HashMap<UnresolvedName, SymbolEntry>,
}

pub type DefinitionList = Vec<String>;

impl SymbolTable {
    /// Builds the symbol table from a parsed schema, in source order. Fails with
    /// `DuplicateSymbol` at the first name that was already registered -- every declaration in
    /// the schema is inserted here, so a re-used identifier is caught before the resolver ever
    /// runs.
    pub fn new(schema: &Schema) -> Result<(Self, DefinitionList), XdrError> {
        let mut tab = HashMap::new();
        let mut definitions = Vec::new();

        for def in schema.definitions.iter() {
            let name = match def {
                Definition::Const(d) => &d.name,
                Definition::TypeDef(d) => match &d.decl {
                    Declaration::Named(n) => &n.name,
                    Declaration::Void => {
                        continue;
                    }
                },
                Definition::Struct(d) => &d.name,
                Definition::Enum(d) => &d.name,
                Definition::Union(d) => &d.name,
            };

            if tab.contains_key(name) {
                return Err(XdrError::DuplicateSymbol(name.clone()));
            }

            tab.insert(
                name.clone(),
                SymbolEntry {
                    def: RefCell::new(def.clone()),
                    emitted: Cell::new(false),
                },
            );
            definitions.push(name.clone());
        }

        Ok((SymbolTable { tab }, definitions))
    }

    /// Tries to resolve a name to its underlying type.
    pub fn lookup_definition(&self, name: &str) -> Result<Ref<Definition>, XdrError> {
        match self.tab.get(name) {
            Some(ent) => Ok(ent.def.borrow()),
            None => Err(XdrError::UndefinedName(name.to_string())),
        }
    }

    pub fn category(&self, name: &str) -> Result<Category, XdrError> {
        Ok(self.lookup_definition(name)?.category())
    }

    pub fn is_emitted(&self, name: &str) -> bool {
        self.tab
            .get(name)
            .map(|ent| ent.emitted.get())
            .unwrap_or(false)
    }

    pub fn mark_emitted(&self, name: &str) {
        if let Some(ent) = self.tab.get(name) {
            ent.emitted.set(true);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Parser, Scanner};

    #[test]
    fn duplicate_top_level_symbol_is_rejected() {
        let mut parser = Parser::new(Scanner::new("const FOO = 1; struct FOO { int a; };"));
        let schema = parser.parse().unwrap();
        let err = SymbolTable::new(&schema).unwrap_err();
        assert!(matches!(err, XdrError::DuplicateSymbol(n) if n == "FOO"));
    }

    #[test]
    fn emitted_watermark_starts_false() {
        let mut parser = Parser::new(Scanner::new("struct foo { int a; };"));
        let schema = parser.parse().unwrap();
        let (tab, _) = SymbolTable::new(&schema).unwrap();
        assert!(!tab.is_emitted("foo"));
        tab.mark_emitted("foo");
        assert!(tab.is_emitted("foo"));
    }
}
