// Build script for audiotags-sys.
//
// Two phases:
//   1. C++ compilation: compiles the bridge (`audiotags_bridge.cpp`) against
//      TagLib's C API into a static library via the `cc` crate.
//   2. Rust FFI bindings: runs `bindgen` on the bridge header to produce
//      `bindings.rs`.
//
// TagLib is located through `TAGLIB_INCLUDE_DIR` (directory containing
// `tag_c.h`) and `TAGLIB_LIB_DIR` (directory containing `libtag_c`). When
// unset, the usual system locations are used.

use std::env;
use std::path::PathBuf;

const DEFAULT_INCLUDE_DIRS: &[&str] = &["/usr/include/taglib", "/usr/local/include/taglib"];

fn main() {
    let manifest = PathBuf::from(env::var("CARGO_MANIFEST_DIR").unwrap());
    let out_dir = PathBuf::from(env::var("OUT_DIR").unwrap());
    let bridge = manifest.join("bridge");

    // Phase 1: Compile C++ bridge
    let mut build = cc::Build::new();
    build
        .cpp(true)
        .std("c++17")
        .warnings(false)
        .define("NDEBUG", None)
        .include(&bridge)
        .file(bridge.join("audiotags_bridge.cpp"));

    match env::var_os("TAGLIB_INCLUDE_DIR") {
        Some(dir) => {
            build.include(dir);
        }
        None => {
            for dir in DEFAULT_INCLUDE_DIRS {
                build.include(dir);
            }
        }
    }

    let target = env::var("TARGET").unwrap_or_default();
    if target.contains("windows") {
        // TagLib's C API is linked statically on Windows builds.
        build.define("TAGLIB_STATIC", None).flag("/EHsc");
    }

    // Coverage: instrument C++ when running under cargo-llvm-cov
    if env::var("CARGO_LLVM_COV").is_ok() {
        build
            .flag("-fprofile-instr-generate")
            .flag("-fcoverage-mapping");
    }

    build.compile("audiotags_bridge");

    if let Some(dir) = env::var_os("TAGLIB_LIB_DIR") {
        println!("cargo:rustc-link-search=native={}", PathBuf::from(dir).display());
    }
    println!("cargo:rustc-link-lib=tag_c");
    println!("cargo:rustc-link-lib=tag");

    // Phase 2: Generate Rust FFI bindings
    let bindings = bindgen::Builder::default()
        .header(bridge.join("audiotags_bridge.h").to_str().unwrap())
        .parse_callbacks(Box::new(bindgen::CargoCallbacks::new()))
        .allowlist_function("audiotags_.*")
        .allowlist_type("Audiotags.*")
        .allowlist_var("AUDIOTAGS_.*")
        .generate()
        .expect("bindgen failed");

    bindings
        .write_to_file(out_dir.join("bindings.rs"))
        .expect("failed to write bindings.rs");

    // Rerun triggers
    println!("cargo:rerun-if-changed=bridge/");
    println!("cargo:rerun-if-env-changed=TAGLIB_INCLUDE_DIR");
    println!("cargo:rerun-if-env-changed=TAGLIB_LIB_DIR");
}
