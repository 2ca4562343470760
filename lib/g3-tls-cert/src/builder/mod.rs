/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2023-2025 ByteDance and/or its affiliates.
 */

pub mod pkey;
pub mod serial;

mod subject;
pub use subject::SubjectNameBuilder;

mod time;
use time::asn1_time_from_chrono;

mod leaf;
pub use leaf::{IssueError, LeafCertBuilder, LeafProfile, LeafSubject, ValidityPolicy};
