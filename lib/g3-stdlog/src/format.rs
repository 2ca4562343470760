/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2023-2025 ByteDance and/or its affiliates.
 */

use std::fmt::{self, Write};

use slog::{Key, KV, OwnedKVList, Record, Serializer};

use super::StdLogValue;

pub(crate) struct StdLogFormatter {
    append_code_position: bool,
}

impl StdLogFormatter {
    pub(crate) fn new(append_code_position: bool) -> Self {
        StdLogFormatter {
            append_code_position,
        }
    }

    pub(crate) fn format_slog(
        &self,
        record: &Record,
        logger_values: &OwnedKVList,
    ) -> Result<StdLogValue, slog::Error> {
        let mut kv_formatter = KvFormatter::default();
        record.kv().serialize(record, &mut kv_formatter)?;
        logger_values.serialize(record, &mut kv_formatter)?;

        let location = if self.append_code_position {
            Some(format!("{}:{}", record.module(), record.line()))
        } else {
            None
        };

        Ok(StdLogValue {
            level: record.level(),
            message: format!("{}", record.msg()),
            kv_pairs: kv_formatter.kv_pairs,
            location,
        })
    }
}

#[derive(Default)]
struct KvFormatter {
    kv_pairs: Vec<(String, String)>,
}

impl Serializer for KvFormatter {
    fn emit_arguments(&mut self, key: Key, val: &fmt::Arguments) -> slog::Result {
        let mut value = String::new();
        value
            .write_fmt(*val)
            .map_err(|_| slog::Error::Other)?;
        self.kv_pairs.push((key.to_string(), value));
        Ok(())
    }
}
