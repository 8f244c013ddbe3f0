/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2023-2025 ByteDance and/or its affiliates.
 */

mod error;
pub use error::*;

mod family;
pub use family::*;

mod message;
pub use message::{AddrInfo, HostEntry, NameInfo};

mod waiter;
pub use waiter::{Waiter, WaiterSink};

mod values;
pub use values::{Values, ValuesSink};

pub mod engine;

mod host;
pub use host::{HostInput, LOCAL_HOSTNAMES, SockAddrArg};

mod port;
pub use port::{PortInput, PortLookup, ServiceDatabase, SystemServices, lookup_port};

mod system;
pub use system::{AddrInfoHints, LibcSystemResolver, SystemResolve};

mod assemble;
mod session;

mod fork;
pub use fork::{AtForkHook, ForkCallback, ForkHook, ManualForkHook};

mod config;
pub use config::{ResolverConfig, ResolverRuntimeConfig};

mod stats;
pub use stats::{
    ResolverQuerySnapshot, ResolverQueryStats, ResolverSessionSnapshot, ResolverSessionStats,
    ResolverSnapshot, ResolverStats,
};

mod resolver;
pub use resolver::{Resolver, ResolverBuilder};

#[cfg(feature = "yaml")]
mod yaml;
