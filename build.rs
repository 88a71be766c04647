//! Build script for the front panel firmware
//!
//! Links the RP2350 memory layout into the embedded binary.

fn main() {
    // Tell Cargo to re-run this if the linker script changes
    println!("cargo:rerun-if-changed=memory.x");
    println!("cargo:rerun-if-changed=build.rs");

    // Link memory.x from project directory
    println!(
        "cargo:rustc-link-search={}",
        std::env::var("CARGO_MANIFEST_DIR").unwrap()
    );
}
