// SPDX-License-Identifier: BSD-3-Clause
// Copyright 2025. Triad National Security, LLC.

use std::error::Error;
use std::fmt;
use std::path::{Path, PathBuf};

use log::{debug, warn};

mod ast;
mod codegen;
mod parser;
mod resolver;
mod runtime;
mod scanner;
mod symbol_table;
mod topo;

use parser::Parser;
use scanner::Scanner;

pub type Result<T> = std::result::Result<T, XdrError>;

#[derive(Debug)]
pub enum XdrError {
    /// The schema could not be tokenised or parsed.
    SyntaxError(String),

    /// A declared name collides with one already in the symbol table.
    DuplicateSymbol(String),

    /// `referrer` names a type that does not exist anywhere in the schema.
    UnknownType { referrer: String, referent: String },

    /// A chain of typedefs or struct embeddings forms a cycle; the field lists the member names
    /// on the cycle.
    CyclicDefinition(Vec<String>),

    /// A struct has more than one self-referential optional member, or one that isn't last.
    UnsupportedOptional(String),

    /// Internal lookup failure: a name was expected to already be in the symbol table.
    UndefinedName(String),

    /// The input schema file could not be opened or read.
    FileOpenError(PathBuf, std::io::Error),
}

impl Error for XdrError {}

impl fmt::Display for XdrError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            XdrError::SyntaxError(msg) => write!(f, "syntax error: {msg}"),
            XdrError::DuplicateSymbol(n) => write!(f, "duplicate definition of '{n}'"),
            XdrError::UnknownType { referrer, referent } => {
                write!(f, "{referrer} refers to undefined type '{referent}'")
            }
            XdrError::CyclicDefinition(names) => {
                write!(f, "cyclic definition involving: {}", names.join(", "))
            }
            XdrError::UnsupportedOptional(name) => write!(
                f,
                "struct '{name}' has more than one self-referential optional member, or one that isn't last"
            ),
            XdrError::UndefinedName(n) => write!(f, "undefined name: {n}"),
            XdrError::FileOpenError(path, err) => {
                write!(f, "could not open '{}': {err}", path.display())
            }
        }
    }
}

enum InputSource {
    StdIo,
    Files(Vec<PathBuf>),
}

/// Drives the generator end to end: parse, resolve, emit. Used both by the standalone `xdr-gen`
/// binary and by a `build.rs` invoking this crate as a build-dependency.
pub struct Compiler {
    source: InputSource,
    rpc: bool,
}

impl Compiler {
    pub fn new() -> Self {
        Compiler {
            source: InputSource::StdIo,
            rpc: false,
        }
    }

    pub fn file<P>(&mut self, path: P) -> &mut Self
    where
        P: AsRef<Path>,
    {
        match &mut self.source {
            InputSource::StdIo => {
                self.source = InputSource::Files(vec![path.as_ref().to_path_buf()]);
            }
            InputSource::Files(list) => list.push(path.as_ref().to_path_buf()),
        }
        self
    }

    /// Enables RPC-2 dispatch scaffolding in the emitted source module.
    pub fn enable_rpc(&mut self) -> &mut Self {
        self.rpc = true;
        self
    }

    /// Runs the compiler over every registered input, writing `<stem>_types.rs` and
    /// `<stem>.rs` into `OUT_DIR` for each. Intended for `build.rs` use.
    pub fn run(&mut self) -> std::result::Result<(), Box<dyn Error>> {
        let InputSource::Files(list) = &self.source else {
            return Err("Compiler::run requires at least one registered input file, see Compiler::file".into());
        };

        let out_dir = std::env::var("OUT_DIR").expect("OUT_DIR should be defined (Compiler::run is for build.rs use)");
        for infile in list.iter() {
            debug!("generating from {}", infile.display());
            let stem = infile
                .file_stem()
                .and_then(|s| s.to_str())
                .unwrap_or("xdr_interface")
                .to_string();

            let (types_src, source_src) = self.generate_file(infile, &stem)?;

            std::fs::write(Path::new(&out_dir).join(format!("{stem}_types.rs")), types_src)?;
            std::fs::write(Path::new(&out_dir).join(format!("{stem}.rs")), source_src)?;
        }
        Ok(())
    }

    /// Parses, resolves, and emits one schema file, returning `(types_module_source,
    /// codec_module_source)`.
    pub fn generate_file(&self, path: &Path, module_name: &str) -> Result<(String, String)> {
        let text = std::fs::read_to_string(path).map_err(|e| XdrError::FileOpenError(path.to_path_buf(), e))?;
        self.generate(&text, module_name)
    }

    /// Parses, resolves, and emits one schema's text, returning `(types_module_source,
    /// codec_module_source)`. The shared entry point for both the CLI binary and build-script
    /// integration.
    pub fn generate(&self, source: &str, module_name: &str) -> Result<(String, String)> {
        let mut parser = Parser::new(Scanner::new(source));
        let schema = parser.parse()?;

        debug!(
            "parsed {} top-level definitions, {} programs",
            schema.definitions.len(),
            schema.programs.len()
        );

        let mut resolved = resolver::resolve(schema)?;

        if self.rpc && resolved.programs.is_empty() {
            warn!("RPC dispatch emission was requested but the schema declares no programs");
        } else if !self.rpc && !resolved.programs.is_empty() {
            warn!(
                "schema declares {} program(s) but RPC dispatch emission is disabled (pass -r)",
                resolved.programs.len()
            );
            resolved.programs.clear();
        }

        let type_module_name = format!("{module_name}_types");
        let types_src = codegen::codegen_types(&resolved, &type_module_name);
        let source_src = codegen::codegen_source(&resolved, module_name, &type_module_name);

        Ok((types_src, source_src))
    }
}

impl Default for Compiler {
    fn default() -> Self {
        Self::new()
    }
}
