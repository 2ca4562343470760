/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2024-2025 ByteDance and/or its affiliates.
 */

use std::env;

/// Detected through the `DEP_OPENSSL_*` metadata of the openssl-sys links key,
/// so the calling package must depend on openssl-sys directly.
const VARIANTS: &[(&str, &str, &str)] = &[
    ("DEP_OPENSSL_LIBRESSL", "libressl", "LibreSSL"),
    ("DEP_OPENSSL_TONGSUO", "tongsuo", "Tongsuo"),
    ("DEP_OPENSSL_BORINGSSL", "boringssl", "BoringSSL"),
    ("DEP_OPENSSL_AWSLC", "awslc", "AWS-LC"),
];

pub fn check_openssl() {
    for (_, cfg, _) in VARIANTS {
        println!("cargo:rustc-check-cfg=cfg({cfg})");
    }

    for (var, cfg, name) in VARIANTS {
        if env::var(var).is_ok() {
            println!("cargo:rustc-cfg={cfg}");
            println!("cargo:rustc-env=G3_OPENSSL_VARIANT={name}");
            return;
        }
    }

    println!("cargo:rustc-env=G3_OPENSSL_VARIANT=OpenSSL");
}
