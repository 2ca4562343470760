/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2024-2025 ByteDance and/or its affiliates.
 */

use std::env;

/// Cargo provided build script variables re-exported as `G3_BUILD_*`.
const CARGO_BUILD_VARS: &[(&str, &str)] = &[
    ("HOST", "G3_BUILD_HOST"),
    ("TARGET", "G3_BUILD_TARGET"),
    ("PROFILE", "G3_BUILD_PROFILE"),
    ("OPT_LEVEL", "G3_BUILD_OPT_LEVEL"),
    ("DEBUG", "G3_BUILD_DEBUG"),
];

pub fn check_basic() {
    let rustc = rustc_version::version_meta().expect("failed to get rustc version");
    println!(
        "cargo:rustc-env=G3_BUILD_RUSTC_VERSION={}",
        rustc.short_version_string
    );
    println!("cargo:rustc-env=G3_BUILD_RUSTC_CHANNEL={:?}", rustc.channel);

    for (cargo_var, g3_var) in CARGO_BUILD_VARS {
        let value = env::var(cargo_var).unwrap_or_else(|_| "unknown".to_string());
        println!("cargo:rustc-env={g3_var}={value}");
    }

    println!("cargo:rerun-if-env-changed=G3_PACKAGE_VERSION");
    if let Ok(v) = env::var("G3_PACKAGE_VERSION") {
        println!("cargo:rustc-env=G3_PACKAGE_VERSION={v}");
    }
}
