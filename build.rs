//! Build script for compiling the gRPC contracts.

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let proto_files = ["proto/nf_ai_comms.proto", "proto/dummy.proto"];
    let includes = ["proto"];

    // Prefer a system protoc when one is configured
    if std::env::var_os("PROTOC").is_none() {
        let protoc = protoc_bin_vendored::protoc_bin_path()?;
        // SAFETY: build scripts run single-threaded.
        unsafe { std::env::set_var("PROTOC", protoc) };
    }

    tonic_prost_build::configure()
        // JSON view of every message; missing keys decode to zero values
        .type_attribute(".", "#[derive(serde::Serialize, serde::Deserialize)]")
        .type_attribute(".", "#[serde(default)]")
        .compile_protos(&proto_files, &includes)?;

    for file in &proto_files {
        println!("cargo:rerun-if-changed={file}");
    }

    Ok(())
}
