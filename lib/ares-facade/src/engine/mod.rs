/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2023-2025 ByteDance and/or its affiliates.
 */

use std::fmt;
use std::net::SocketAddr;
use std::sync::Arc;

use crate::values::ValuesSink;
use crate::waiter::WaiterSink;
use crate::{AddressFamily, HostEntry, NameInfo, ResolveError};

pub mod hosts;

#[cfg(feature = "c-ares")]
pub mod c_ares;

/// Where an engine delivers the outcome of one query.
///
/// Delivering consumes the sink. An engine that drops a sink without
/// delivering, e.g. because it was destroyed, makes the query fail with a
/// cancellation error.
pub struct QuerySink<T>(SinkTarget<T>);

enum SinkTarget<T> {
    Waiter(WaiterSink<T>),
    Values(ValuesSink<T>),
}

impl<T> QuerySink<T> {
    pub fn deliver(self, r: Result<T, ResolveError>) {
        match self.0 {
            SinkTarget::Waiter(s) => s.deliver(r),
            SinkTarget::Values(s) => s.deliver(r),
        }
    }
}

impl<T> From<WaiterSink<T>> for QuerySink<T> {
    fn from(s: WaiterSink<T>) -> Self {
        QuerySink(SinkTarget::Waiter(s))
    }
}

impl<T> From<ValuesSink<T>> for QuerySink<T> {
    fn from(s: ValuesSink<T>) -> Self {
        QuerySink(SinkTarget::Values(s))
    }
}

/// An asynchronous resolver engine session.
///
/// Every query must complete its sink exactly once, and never from inside
/// the call that issued it.
pub trait ResolveEngine: Send + Sync {
    fn gethostbyname(&self, name: &str, family: AddressFamily, sink: QuerySink<HostEntry>);

    /// Reverse lookup. An `address` that is not a valid IP address must be
    /// answered with [`ResolveError::InvalidAddress`].
    fn gethostbyaddr(&self, address: &str, sink: QuerySink<HostEntry>);

    fn getnameinfo(&self, address: SocketAddr, flags: i32, sink: QuerySink<NameInfo>);

    /// Tear down the session. Pending queries may be dropped.
    fn destroy(&self);
}

pub type BoxResolveEngine = Box<dyn ResolveEngine>;

/// Builds engine sessions, once at startup and again after every fork.
pub trait EngineFactory: Send + Sync {
    fn create_engine(&self) -> anyhow::Result<BoxResolveEngine>;
}

#[derive(Clone)]
pub enum AnyEngineConfig {
    Hosts(hosts::HostsEngineConfig),
    #[cfg(feature = "c-ares")]
    CAres(c_ares::CAresEngineConfig),
    Custom(Arc<dyn EngineFactory>),
}

impl Default for AnyEngineConfig {
    fn default() -> Self {
        AnyEngineConfig::Hosts(hosts::HostsEngineConfig::default())
    }
}

impl fmt::Debug for AnyEngineConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AnyEngineConfig::Hosts(c) => f.debug_tuple("Hosts").field(c).finish(),
            #[cfg(feature = "c-ares")]
            AnyEngineConfig::CAres(c) => f.debug_tuple("CAres").field(c).finish(),
            AnyEngineConfig::Custom(_) => f.write_str("Custom"),
        }
    }
}

impl PartialEq for AnyEngineConfig {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (AnyEngineConfig::Hosts(a), AnyEngineConfig::Hosts(b)) => a == b,
            #[cfg(feature = "c-ares")]
            (AnyEngineConfig::CAres(a), AnyEngineConfig::CAres(b)) => a == b,
            (AnyEngineConfig::Custom(a), AnyEngineConfig::Custom(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl AnyEngineConfig {
    pub fn r#type(&self) -> &'static str {
        match self {
            AnyEngineConfig::Hosts(_) => "hosts",
            #[cfg(feature = "c-ares")]
            AnyEngineConfig::CAres(_) => "c-ares",
            AnyEngineConfig::Custom(_) => "custom",
        }
    }

    pub(crate) fn spawn_engine(&self) -> anyhow::Result<BoxResolveEngine> {
        match self {
            AnyEngineConfig::Hosts(c) => c.spawn_engine(),
            #[cfg(feature = "c-ares")]
            AnyEngineConfig::CAres(c) => c.spawn_engine(),
            AnyEngineConfig::Custom(f) => f.create_engine(),
        }
    }
}
