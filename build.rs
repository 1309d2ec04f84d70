fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Use the vendored protoc unless the environment already provides one.
    if std::env::var_os("PROTOC").is_none() {
        if let Ok(protoc) = protoc_bin_vendored::protoc_bin_path() {
            std::env::set_var("PROTOC", protoc);
        }
    }

    println!("cargo:rerun-if-changed=proto/inference.proto");

    tonic_build::configure()
        .build_server(false)
        .compile_protos(&["proto/inference.proto"], &["proto"])?;

    Ok(())
}
