/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2023-2025 ByteDance and/or its affiliates.
 */

use openssl::asn1::Asn1Integer;
use openssl::bn::{BigNum, MsbOption};
use openssl::error::ErrorStack;

/// A serial drawn uniformly from `[0, 2^128)`.
pub fn random_128() -> Result<Asn1Integer, ErrorStack> {
    let mut bn = BigNum::new()?;
    // no fixed top bit, that would shrink the space to 2^127
    bn.rand(128, MsbOption::MAYBE_ZERO, false)?;
    bn.to_asn1_integer()
}
