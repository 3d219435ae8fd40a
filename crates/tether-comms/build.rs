/// Compile the gym service definition with tonic_build.
///
/// protoc comes from `protoc-bin-vendored`, so no system install is
/// needed.
fn main() -> Result<(), Box<dyn std::error::Error>> {
    let protoc = protoc_bin_vendored::protoc_bin_path().map_err(|e| e.to_string())?;
    std::env::set_var("PROTOC", protoc);
    println!("cargo:rerun-if-changed=proto/tether.proto");
    tonic_build::compile_protos("proto/tether.proto")?;
    Ok(())
}
