fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Use the vendored protoc binary so no system installation is required.
    let protoc = protoc_bin_vendored::protoc_bin_path().expect("vendored protoc not found");
    std::env::set_var("PROTOC", protoc);

    tonic_build::configure()
        .build_server(true)
        .build_client(false)
        .compile_protos(&["proto/projection.proto"], &["proto/"])?;

    println!("cargo:rerun-if-changed=proto/projection.proto");
    println!("cargo:rerun-if-changed=build.rs");

    Ok(())
}
