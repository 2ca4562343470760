/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2025 ByteDance and/or its affiliates.
 */

pub mod securityapi {
    tonic::include_proto!("securityapi");
}
