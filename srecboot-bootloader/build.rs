// SPDX-License-Identifier: MIT
// Copyright (c) 2026 ADNT Sarl <info@adnt.io>

use std::env;
use std::fs;
use std::path::PathBuf;

fn main() {
    let out_dir = PathBuf::from(env::var("OUT_DIR").unwrap());
    let manifest_dir = PathBuf::from(env::var("CARGO_MANIFEST_DIR").unwrap());

    for script in ["memory.x", "device.x"] {
        let contents = fs::read_to_string(manifest_dir.join(script))
            .unwrap_or_else(|_| panic!("Failed to read {script}"));
        fs::write(out_dir.join(script), contents)
            .unwrap_or_else(|_| panic!("Failed to write {script}"));
        println!("cargo:rerun-if-changed={script}");
    }

    println!("cargo:rustc-link-search={}", out_dir.display());
    println!("cargo:rustc-link-arg=-Tlink.x");
    println!("cargo:rustc-link-arg=-Tdefmt.x");
    println!("cargo:rerun-if-changed=build.rs");
}
