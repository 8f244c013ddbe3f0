/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2025 ByteDance and/or its affiliates.
 */

use std::io::{self, Write};

use chrono::Local;
use slog::{Drain, KV, OwnedKVList, Record, Serializer, slog_o};
use slog_scope::GlobalLoggerGuard;

use crate::opts::ProcArgs;

struct StderrDrain;

struct PlainSerializer<'a, W: Write> {
    io: &'a mut W,
}

impl<W: Write> Serializer for PlainSerializer<'_, W> {
    fn emit_arguments(&mut self, key: slog::Key, val: &std::fmt::Arguments) -> slog::Result {
        write!(self.io, " {key}: {val},")?;
        Ok(())
    }
}

impl Drain for StderrDrain {
    type Ok = ();
    type Err = io::Error;

    fn log(&self, record: &Record, values: &OwnedKVList) -> io::Result<()> {
        let mut buf = Vec::with_capacity(256);
        write!(
            buf,
            "{} {}",
            Local::now().format("%Y-%m-%d %H:%M:%S%.6f"),
            record.level().as_short_str()
        )?;

        let mut serializer = PlainSerializer { io: &mut buf };
        record
            .kv()
            .serialize(record, &mut serializer)
            .map_err(io::Error::other)?;
        values
            .serialize(record, &mut serializer)
            .map_err(io::Error::other)?;

        writeln!(buf, " {}", record.msg())?;

        let mut stderr = io::stderr().lock();
        stderr.write_all(&buf)?;
        stderr.flush()
    }
}

pub(crate) fn setup(args: &ProcArgs) -> anyhow::Result<GlobalLoggerGuard> {
    let logger = slog::Logger::root(StderrDrain.fuse(), slog_o!());
    let scope_guard = slog_scope::set_global_logger(logger);

    let log_level = match args.verbose_level {
        0 => log::Level::Warn,
        1 => log::Level::Info,
        2 => log::Level::Debug,
        _ => log::Level::Trace,
    };
    slog_stdlog::init_with_level(log_level)?;

    Ok(scope_guard)
}
