use std::path::PathBuf;

fn main() {
    println!("cargo:rerun-if-changed=src/lib.rs");
    println!("cargo:rerun-if-changed=src/types.rs");

    let crate_dir = std::env::var("CARGO_MANIFEST_DIR").unwrap_or_else(|_| ".".to_string());
    let out_dir = std::env::var("OUT_DIR").unwrap_or_else(|_| "target".to_string());
    let header = PathBuf::from(out_dir).join("booklist.h");

    // Header generation is best effort.
    match cbindgen::Builder::new()
        .with_crate(&crate_dir)
        .with_language(cbindgen::Language::C)
        .with_include_guard("BOOKLIST_H")
        .with_documentation(true)
        .generate()
    {
        Ok(bindings) => {
            bindings.write_to_file(&header);
        }
        Err(err) => println!("cargo:warning=cbindgen failed: {err}"),
    }
}
