// SPDX-License-Identifier: BSD-3-Clause
// Copyright 2025. Triad National Security, LLC.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use log::error;

/// Generates Rust marshall/unmarshall code from an XDR schema.
#[derive(Parser, Debug)]
#[command(name = "xdr-gen", version, about)]
struct Args {
    /// Emit RPC-2 dispatch scaffolding for any `program` declarations in the schema.
    #[arg(short = 'r', long = "rpc")]
    rpc: bool,

    /// Input XDR schema file.
    input: PathBuf,

    /// Output path for the codec (marshall/unmarshall) module.
    output_source: PathBuf,

    /// Output path for the types module.
    output_types: PathBuf,
}

fn main() -> ExitCode {
    env_logger::init();

    let args = Args::parse();

    let module_name = args
        .input
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("xdr_interface")
        .to_string();

    let mut compiler = xdr_codegen::Compiler::new();
    if args.rpc {
        compiler.enable_rpc();
    }

    let result = compiler
        .generate_file(&args.input, &module_name)
        .and_then(|(types_src, source_src)| {
            std::fs::write(&args.output_types, types_src)
                .map_err(|e| xdr_codegen::XdrError::FileOpenError(args.output_types.clone(), e))?;
            std::fs::write(&args.output_source, source_src)
                .map_err(|e| xdr_codegen::XdrError::FileOpenError(args.output_source.clone(), e))?;
            Ok(())
        });

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e}");
            ExitCode::FAILURE
        }
    }
}
