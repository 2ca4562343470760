/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2023-2025 ByteDance and/or its affiliates.
 */

use chrono::{DateTime, Datelike, Utc};
use openssl::asn1::Asn1Time;
use openssl::error::ErrorStack;

const RFC5280_UTC: &str = "%y%m%d%H%M%SZ";
const RFC5280_GENERALIZED: &str = "%Y%m%d%H%M%SZ";

pub(super) fn asn1_time_from_chrono(datetime: &DateTime<Utc>) -> Result<Asn1Time, ErrorStack> {
    let fmt = if datetime.year() >= 2050 {
        RFC5280_GENERALIZED
    } else {
        RFC5280_UTC
    };
    Asn1Time::from_str(&datetime.format(fmt).to_string())
}
