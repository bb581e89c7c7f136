//! Build script for native-ocr.
//!
//! With the `apple-vision` feature on macOS: generate swift-bridge FFI glue,
//! compile the Swift Vision bridge and link the frameworks it needs.
//! Everything else builds without a Swift toolchain.
//!
//! All generated files go to OUT_DIR (inside target/).

fn main() {
    println!("cargo:rerun-if-changed=build.rs");

    #[cfg(all(target_os = "macos", feature = "apple-vision"))]
    vision::build();
}

#[cfg(all(target_os = "macos", feature = "apple-vision"))]
mod vision {
    use std::path::PathBuf;
    use std::process::Command;

    const BRIDGE_SOURCE: &str = "src/ocr/apple_vision.rs";
    const SWIFT_SOURCE: &str = "swift-src/ocr_bridge.swift";

    fn env_path(key: &str) -> PathBuf {
        match std::env::var(key) {
            Ok(value) => PathBuf::from(value),
            Err(err) => panic!("{key} not set for build script: {err}"),
        }
    }

    pub fn build() {
        let manifest_dir = env_path("CARGO_MANIFEST_DIR");
        let out_dir = env_path("OUT_DIR");
        let generated_dir = out_dir.join("swift-bridge-generated");
        let crate_name = env!("CARGO_PKG_NAME");

        println!("cargo:rerun-if-changed={BRIDGE_SOURCE}");
        println!("cargo:rerun-if-changed={SWIFT_SOURCE}");

        // Step 1: FFI glue
        swift_bridge_build::parse_bridges(vec![BRIDGE_SOURCE])
            .write_all_concatenated(&generated_dir, crate_name);

        // Step 2: bridging header with absolute paths
        let bridging_header = out_dir.join("bridging-header.h");
        std::fs::write(
            &bridging_header,
            format!(
                "#ifndef BridgingHeader_h\n\
                 #define BridgingHeader_h\n\
                 #include \"{generated}/SwiftBridgeCore.h\"\n\
                 #include \"{generated}/{crate_name}/{crate_name}.h\"\n\
                 #endif\n",
                generated = generated_dir.display(),
            ),
        )
        .unwrap_or_else(|e| panic!("Failed to write bridging header: {e}"));

        // Step 3: Swift → static library
        let lib_output = out_dir.join("libocr_swift.a");
        let status = Command::new("swiftc")
            .args(["-emit-library", "-static"])
            .args(["-module-name", "ocr_swift"])
            .arg("-import-objc-header")
            .arg(&bridging_header)
            .arg(manifest_dir.join(SWIFT_SOURCE))
            .arg(generated_dir.join("SwiftBridgeCore.swift"))
            .arg(generated_dir.join(format!("{crate_name}/{crate_name}.swift")))
            .arg("-o")
            .arg(&lib_output)
            .arg("-O")
            .status()
            .unwrap_or_else(|e| panic!("Failed to run swiftc (Xcode Command Line Tools?): {e}"));
        if !status.success() {
            panic!("swiftc compilation failed");
        }

        // Step 4: link the library and frameworks
        println!("cargo:rustc-link-search={}", out_dir.display());
        println!("cargo:rustc-link-lib=static=ocr_swift");
        for framework in ["Vision", "CoreGraphics", "Foundation", "ImageIO"] {
            println!("cargo:rustc-link-lib=framework={framework}");
        }

        let xcode_path = Command::new("xcode-select")
            .arg("--print-path")
            .output()
            .ok()
            .and_then(|o| String::from_utf8(o.stdout).ok())
            .map(|s| s.trim().to_string())
            .unwrap_or_else(|| "/Applications/Xcode.app/Contents/Developer".to_string());
        println!(
            "cargo:rustc-link-search={xcode_path}/Toolchains/XcodeDefault.xctoolchain/usr/lib/swift/macosx/"
        );
        println!("cargo:rustc-link-search=/usr/lib/swift");
    }
}
