/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2025 ByteDance and/or its affiliates.
 */

fn main() {
    g3_build_env::check_basic();
    g3_build_env::check_openssl();
}
