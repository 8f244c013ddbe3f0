/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2023-2025 ByteDance and/or its affiliates.
 */

use std::net::{IpAddr, SocketAddr};
use std::str::FromStr;
use std::sync::Mutex;

use c_ares::{HostResults, NIFlags};
use tokio::runtime::Handle;

use crate::engine::{QuerySink, ResolveEngine};
use crate::{
    AddressFamily, HostEntry, NI_DGRAM, NI_NAMEREQD, NI_NOFQDN, NI_NUMERICHOST, NI_NUMERICSERV,
    NameInfo, ResolveError,
};

pub(crate) struct CAresEngine {
    inner: Mutex<Option<c_ares_resolver::Resolver>>,
    runtime: Handle,
}

impl CAresEngine {
    pub(super) fn new(resolver: c_ares_resolver::Resolver, runtime: Handle) -> Self {
        CAresEngine {
            inner: Mutex::new(Some(resolver)),
            runtime,
        }
    }
}

fn cares_family(family: AddressFamily) -> c_ares::AddressFamily {
    match family {
        AddressFamily::Unspec => c_ares::AddressFamily::UNSPEC,
        AddressFamily::Inet => c_ares::AddressFamily::INET,
        AddressFamily::Inet6 => c_ares::AddressFamily::INET6,
    }
}

fn cares_ni_flags(flags: i32) -> NIFlags {
    let mut ni_flags = NIFlags::LOOKUPHOST | NIFlags::LOOKUPSERVICE;
    for (flag, cares_flag) in [
        (NI_NOFQDN, NIFlags::NOFQDN),
        (NI_NUMERICHOST, NIFlags::NUMERICHOST),
        (NI_NAMEREQD, NIFlags::NAMEREQD),
        (NI_NUMERICSERV, NIFlags::NUMERICSERV),
        (NI_DGRAM, NIFlags::DGRAM),
    ] {
        if flags & flag != 0 {
            ni_flags |= cares_flag;
        }
    }
    ni_flags
}

fn host_entry(results: HostResults<'_>, family: AddressFamily) -> HostEntry {
    let mut entry = HostEntry::new(results.hostname(), family);
    entry.aliases = results.aliases().map(|a| a.to_string()).collect();
    entry.addresses = results.addresses().collect();
    if family == AddressFamily::Unspec {
        if let Some(ip) = entry.addresses.first() {
            entry.family = AddressFamily::of(ip);
        }
    }
    entry
}

impl ResolveEngine for CAresEngine {
    fn gethostbyname(&self, name: &str, family: AddressFamily, sink: QuerySink<HostEntry>) {
        let inner = self.inner.lock().unwrap();
        let Some(resolver) = inner.as_ref() else {
            // destroyed, dropping the sink cancels the query
            return;
        };
        resolver.get_host_by_name(name, cares_family(family), move |r| {
            sink.deliver(
                r.map(|results| host_entry(results, family))
                    .map_err(ResolveError::from_cares_error),
            );
        });
    }

    fn gethostbyaddr(&self, address: &str, sink: QuerySink<HostEntry>) {
        let ip = match IpAddr::from_str(address) {
            Ok(ip) => ip,
            Err(_) => {
                let e = ResolveError::InvalidAddress(address.to_string());
                self.runtime.spawn(async move { sink.deliver(Err(e)) });
                return;
            }
        };

        let inner = self.inner.lock().unwrap();
        let Some(resolver) = inner.as_ref() else {
            return;
        };
        let family = AddressFamily::of(&ip);
        resolver.get_host_by_address(&ip, move |r| {
            sink.deliver(
                r.map(|results| host_entry(results, family))
                    .map_err(ResolveError::from_cares_error),
            );
        });
    }

    fn getnameinfo(&self, address: SocketAddr, flags: i32, sink: QuerySink<NameInfo>) {
        let inner = self.inner.lock().unwrap();
        let Some(resolver) = inner.as_ref() else {
            return;
        };
        resolver.get_name_info(&address, cares_ni_flags(flags), move |r| {
            sink.deliver(
                r.map(|info| NameInfo {
                    node: info.node().map(|s| s.to_string()),
                    service: info.service().map(|s| s.to_string()),
                })
                .map_err(ResolveError::from_cares_error),
            );
        });
    }

    fn destroy(&self) {
        // pending queries complete with EDESTRUCTION when the channel is dropped
        let resolver = self.inner.lock().unwrap().take();
        drop(resolver);
    }
}
