use std::env;
use std::path::PathBuf;

fn main() {
    // Only regenerate the header when the FFI source changes.
    println!("cargo:rerun-if-changed=src/ffi.rs");

    let Ok(crate_dir) = env::var("CARGO_MANIFEST_DIR") else {
        println!("cargo:warning=CARGO_MANIFEST_DIR not set, skipping C header");
        return;
    };
    let include_dir = PathBuf::from(&crate_dir).join("include");
    let output_file = include_dir.join("invoice_forge.h");

    if let Err(e) = std::fs::create_dir_all(&include_dir) {
        println!("cargo:warning=cannot create {}: {e}", include_dir.display());
        return;
    }

    let generated = cbindgen::Builder::new()
        .with_crate(&crate_dir)
        .with_language(cbindgen::Language::C)
        .with_include_guard("INVOICE_FORGE_H")
        .with_autogen_warning("/* Generated by cbindgen from src/ffi.rs. Do not edit. */")
        .with_parse_deps(false)
        .generate();

    match generated {
        Ok(bindings) => {
            bindings.write_to_file(&output_file);
        }
        Err(e) => println!("cargo:warning=cbindgen failed to generate bindings: {e}"),
    }
}
