fn main() {
    xdr_codegen::Compiler::new()
        .file("schemas/basic.x")
        .file("schemas/arrays.x")
        .file("schemas/enums_unions.x")
        .file("schemas/optional.x")
        .run()
        .expect("codegen over conformance schemas should succeed");

    xdr_codegen::Compiler::new()
        .file("schemas/rpc.x")
        .enable_rpc()
        .run()
        .expect("codegen over the RPC schema should succeed");
}
