/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2025 ByteDance and/or its affiliates.
 */

use std::net::{IpAddr, SocketAddr};
use std::str::FromStr;
use std::sync::Arc;

use tokio::runtime::Handle;

use super::HostsEngineConfig;
use crate::engine::{QuerySink, ResolveEngine};
use crate::{
    AddressFamily, HostEntry, NI_DGRAM, NI_NAMEREQD, NI_NUMERICHOST, NI_NUMERICSERV, NameInfo,
    ResolveError, ResolveServerError,
};

pub(crate) struct HostsEngine {
    table: Arc<HostsEngineConfig>,
    runtime: Handle,
}

impl HostsEngine {
    pub(super) fn new(table: Arc<HostsEngineConfig>, runtime: Handle) -> Self {
        HostsEngine { table, runtime }
    }

    fn deliver_later<T: Send + 'static>(&self, sink: QuerySink<T>, r: Result<T, ResolveError>) {
        self.runtime.spawn(async move { sink.deliver(r) });
    }
}

fn lookup_name(
    table: &HostsEngineConfig,
    name: &str,
    family: AddressFamily,
) -> Result<HostEntry, ResolveError> {
    if let Ok(ip) = IpAddr::from_str(name) {
        return if family.matches(&ip) {
            let mut entry = HostEntry::new(name, AddressFamily::of(&ip));
            entry.addresses.push(ip);
            Ok(entry)
        } else {
            Err(ResolveServerError::NotFound.into())
        };
    }

    let family = match family {
        AddressFamily::Unspec => {
            let has_v4 = table
                .lines
                .iter()
                .any(|l| l.address.is_ipv4() && l.has_name(name));
            if has_v4 {
                AddressFamily::Inet
            } else {
                AddressFamily::Inet6
            }
        }
        f => f,
    };

    let mut entry: Option<HostEntry> = None;
    for line in table.lines.iter().filter(|l| l.has_name(name)) {
        let entry = entry.get_or_insert_with(|| {
            let mut e = HostEntry::new(line.canonical.as_str(), family);
            e.aliases = line.aliases.clone();
            e
        });
        if family.matches(&line.address) && !entry.addresses.contains(&line.address) {
            entry.addresses.push(line.address);
        }
    }
    entry.ok_or(ResolveServerError::NotFound.into())
}

fn lookup_address(table: &HostsEngineConfig, address: &str) -> Result<HostEntry, ResolveError> {
    let ip = IpAddr::from_str(address)
        .map_err(|_| ResolveError::InvalidAddress(address.to_string()))?;
    let line = table
        .lines
        .iter()
        .find(|l| l.address == ip)
        .ok_or(ResolveServerError::NotFound)?;
    Ok(HostEntry {
        name: line.canonical.clone(),
        aliases: line.aliases.clone(),
        family: AddressFamily::of(&ip),
        addresses: vec![ip],
    })
}

fn lookup_name_info(
    table: &HostsEngineConfig,
    address: SocketAddr,
    flags: i32,
) -> Result<NameInfo, ResolveError> {
    let ip = address.ip();
    let node = if flags & NI_NUMERICHOST != 0 {
        ip.to_string()
    } else {
        match table.lines.iter().find(|l| l.address == ip) {
            Some(line) => line.canonical.clone(),
            None if flags & NI_NAMEREQD != 0 => {
                return Err(ResolveServerError::NotFound.into());
            }
            None => ip.to_string(),
        }
    };

    // port 0 means no service, the engine leaves it unset then
    let port = address.port();
    let service = if port == 0 {
        None
    } else if flags & NI_NUMERICSERV != 0 {
        Some(port.to_string())
    } else {
        Some(
            table
                .service(port, flags & NI_DGRAM != 0)
                .map(|s| s.to_string())
                .unwrap_or_else(|| port.to_string()),
        )
    };

    Ok(NameInfo {
        node: Some(node),
        service,
    })
}

impl ResolveEngine for HostsEngine {
    fn gethostbyname(&self, name: &str, family: AddressFamily, sink: QuerySink<HostEntry>) {
        let r = lookup_name(&self.table, name, family);
        self.deliver_later(sink, r);
    }

    fn gethostbyaddr(&self, address: &str, sink: QuerySink<HostEntry>) {
        let r = lookup_address(&self.table, address);
        self.deliver_later(sink, r);
    }

    fn getnameinfo(&self, address: SocketAddr, flags: i32, sink: QuerySink<NameInfo>) {
        let r = lookup_name_info(&self.table, address, flags);
        self.deliver_later(sink, r);
    }

    fn destroy(&self) {}
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::{Ipv4Addr, Ipv6Addr};

    fn table() -> HostsEngineConfig {
        let mut config = HostsEngineConfig::default();
        config
            .parse_hosts(
                "192.0.2.1 www.example.net www\n\
                 2001:db8::1 www.example.net\n\
                 192.0.2.2 www.example.net\n\
                 2001:db8::2 v6only.example.net\n",
            )
            .unwrap();
        config.add_service("http", 80, false);
        config
    }

    #[test]
    fn by_name() {
        let t = table();
        let e = lookup_name(&t, "WWW", AddressFamily::Inet).unwrap();
        assert_eq!(e.name, "www.example.net");
        assert_eq!(e.aliases, vec!["www"]);
        assert_eq!(
            e.addresses,
            vec![
                IpAddr::V4(Ipv4Addr::new(192, 0, 2, 1)),
                IpAddr::V4(Ipv4Addr::new(192, 0, 2, 2))
            ]
        );

        let e = lookup_name(&t, "www.example.net", AddressFamily::Inet6).unwrap();
        assert_eq!(e.family, AddressFamily::Inet6);
        assert_eq!(e.addresses.len(), 1);

        let e = lookup_name(&t, "v6only.example.net", AddressFamily::Unspec).unwrap();
        assert_eq!(e.family, AddressFamily::Inet6);

        let e = lookup_name(&t, "v6only.example.net", AddressFamily::Inet).unwrap();
        assert!(e.addresses.is_empty());

        assert_eq!(
            lookup_name(&t, "missing.example.net", AddressFamily::Inet).unwrap_err(),
            ResolveError::FromServer(ResolveServerError::NotFound)
        );
    }

    #[test]
    fn by_literal() {
        let t = table();
        let e = lookup_name(&t, "::1", AddressFamily::Inet6).unwrap();
        assert_eq!(e.addresses, vec![IpAddr::V6(Ipv6Addr::LOCALHOST)]);
        assert!(lookup_name(&t, "::1", AddressFamily::Inet).is_err());
    }

    #[test]
    fn by_address() {
        let t = table();
        let e = lookup_address(&t, "2001:db8::2").unwrap();
        assert_eq!(e.name, "v6only.example.net");
        assert!(matches!(
            lookup_address(&t, "not an ip").unwrap_err(),
            ResolveError::InvalidAddress(_)
        ));
        assert!(lookup_address(&t, "203.0.113.9").is_err());
    }

    #[test]
    fn name_info() {
        let t = table();
        let addr = SocketAddr::new(IpAddr::V4(Ipv4Addr::new(192, 0, 2, 1)), 80);
        let ni = lookup_name_info(&t, addr, 0).unwrap();
        assert_eq!(ni.node.as_deref(), Some("www.example.net"));
        assert_eq!(ni.service.as_deref(), Some("http"));

        let ni = lookup_name_info(&t, addr, NI_NUMERICHOST | NI_NUMERICSERV).unwrap();
        assert_eq!(ni.node.as_deref(), Some("192.0.2.1"));
        assert_eq!(ni.service.as_deref(), Some("80"));

        let unknown = SocketAddr::new(IpAddr::V4(Ipv4Addr::new(203, 0, 113, 9)), 0);
        let ni = lookup_name_info(&t, unknown, 0).unwrap();
        assert_eq!(ni.node.as_deref(), Some("203.0.113.9"));
        assert_eq!(ni.service, None);
        assert!(lookup_name_info(&t, unknown, NI_NAMEREQD).is_err());
    }
}
