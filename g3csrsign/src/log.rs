/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2023-2025 ByteDance and/or its affiliates.
 */

use std::sync::Arc;

use log::{debug, warn};
use slog::{Drain, slog_o};
use slog_scope::GlobalLoggerGuard;

use g3_stdlog::{AsyncLogConfig, LogSnapshot, LogStats};

const PROCESS_LOG_THREAD_NAME: &str = "log-process";

pub fn level_for_verbose(verbose_level: u8) -> log::Level {
    match verbose_level {
        0 => log::Level::Warn,
        1 => log::Level::Info,
        2 => log::Level::Debug,
        _ => log::Level::Trace,
    }
}

/// Keeps the process logger installed, and tracks records it had to drop.
pub struct ProcessLogGuard {
    _scope_guard: GlobalLoggerGuard,
    stats: Arc<LogStats>,
}

impl ProcessLogGuard {
    pub fn report_dropped(&self) {
        let snapshot = self.stats.snapshot();
        let dropped = dropped_records(&snapshot);
        if dropped > 0 {
            warn!(
                "{dropped} of {} log records were dropped (overflow: {}, closed: {}, format failed: {})",
                snapshot.total,
                snapshot.channel_overflow,
                snapshot.channel_closed,
                snapshot.format_failed
            );
        } else {
            debug!("no log records dropped out of {}", snapshot.total);
        }
    }
}

fn dropped_records(snapshot: &LogSnapshot) -> u64 {
    snapshot.channel_overflow + snapshot.channel_closed + snapshot.format_failed
}

pub fn setup(verbose_level: u8) -> Result<ProcessLogGuard, log::SetLoggerError> {
    let async_conf = AsyncLogConfig::with_name(PROCESS_LOG_THREAD_NAME);
    let drain = g3_stdlog::new_async_logger(&async_conf, verbose_level > 2, false);
    let stats = drain.get_stats();
    let logger = slog::Logger::root(
        drain.fuse(),
        slog_o!("daemon" => crate::build::PKG_NAME),
    );

    let scope_guard = slog_scope::set_global_logger(logger);

    slog_stdlog::init_with_level(level_for_verbose(verbose_level))?;
    Ok(ProcessLogGuard {
        _scope_guard: scope_guard,
        stats,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verbose_levels() {
        assert_eq!(level_for_verbose(0), log::Level::Warn);
        assert_eq!(level_for_verbose(1), log::Level::Info);
        assert_eq!(level_for_verbose(2), log::Level::Debug);
        assert_eq!(level_for_verbose(3), log::Level::Trace);
        assert_eq!(level_for_verbose(9), log::Level::Trace);
    }

    #[test]
    fn dropped_count() {
        let snapshot = LogSnapshot {
            total: 10,
            passed: 6,
            channel_overflow: 2,
            channel_closed: 1,
            format_failed: 1,
            ..Default::default()
        };
        assert_eq!(dropped_records(&snapshot), 4);
        assert_eq!(dropped_records(&LogSnapshot::default()), 0);
    }
}
