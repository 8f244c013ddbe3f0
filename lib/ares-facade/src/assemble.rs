/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2025 ByteDance and/or its affiliates.
 */

use std::net::{IpAddr, Ipv6Addr, SocketAddr, SocketAddrV4, SocketAddrV6};

use crate::{AF_INET, AF_INET6, AddrInfo, HostEntry, ResolveError, SocketType};

/// The (socket type, protocol) pairs to expand every address into, narrowed
/// by the socket types implied by the service and by an explicit protocol.
pub(crate) fn socktype_protocols(socktypes: &[i32], proto: i32) -> Vec<(SocketType, i32)> {
    SocketType::CANONICAL_PROTOCOLS
        .into_iter()
        .filter(|(t, _)| socktypes.is_empty() || socktypes.contains(&t.as_raw()))
        .filter(|(_, p)| proto == 0 || proto == *p)
        .collect()
}

/// Collapse a dual-stack answer where both family queries came back with the
/// very same records.
pub(crate) fn dedup_families(values: &mut Vec<HostEntry>) {
    if values.len() == 2 && values[0] == values[1] {
        values.pop();
    }
}

/// Build the ordered result tuples: `::1` first, then every IPv4 address,
/// then the remaining IPv6 addresses.
pub(crate) fn assemble(
    values: &[HostEntry],
    port: u16,
    socktype_proto: &[(SocketType, i32)],
) -> Result<Vec<AddrInfo>, ResolveError> {
    let mut loopback6 = Vec::new();
    let mut result4 = Vec::new();
    let mut result6 = Vec::new();

    for ip in values.iter().flat_map(|e| e.addresses.iter()) {
        let (dest, family, sockaddr) = match ip {
            IpAddr::V4(ip4) => (
                &mut result4,
                AF_INET,
                SocketAddr::V4(SocketAddrV4::new(*ip4, port)),
            ),
            IpAddr::V6(ip6) => {
                let dest = if *ip6 == Ipv6Addr::LOCALHOST {
                    &mut loopback6
                } else {
                    &mut result6
                };
                (dest, AF_INET6, SocketAddr::V6(SocketAddrV6::new(*ip6, port, 0, 0)))
            }
        };
        for (socktype, protocol) in socktype_proto {
            dest.push(AddrInfo {
                family,
                socktype: socktype.as_raw(),
                protocol: *protocol,
                canonname: String::new(),
                sockaddr,
            });
        }
    }

    let mut result = loopback6;
    result.append(&mut result4);
    result.append(&mut result6);

    if result.is_empty() {
        return Err(ResolveError::NoAddress);
    }
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{AddressFamily, IPPROTO_TCP, IPPROTO_UDP, SOCK_DGRAM, SOCK_RAW, SOCK_STREAM};

    fn entry(family: AddressFamily, addrs: &[&str]) -> HostEntry {
        let mut e = HostEntry::new("example.net", family);
        e.addresses = addrs.iter().map(|s| s.parse().unwrap()).collect();
        e
    }

    #[test]
    fn protocol_filter() {
        assert_eq!(socktype_protocols(&[], 0).len(), 3);
        assert_eq!(
            socktype_protocols(&[SOCK_DGRAM], 0),
            vec![(SocketType::Datagram, IPPROTO_UDP)]
        );
        assert_eq!(
            socktype_protocols(&[], IPPROTO_TCP),
            vec![(SocketType::Stream, IPPROTO_TCP)]
        );
        assert!(socktype_protocols(&[SOCK_STREAM], IPPROTO_UDP).is_empty());
        assert_eq!(socktype_protocols(&[SOCK_RAW], 0), vec![(SocketType::Raw, 0)]);
    }

    #[test]
    fn dedup() {
        let mut values = vec![
            entry(AddressFamily::Inet, &["192.0.2.1"]),
            entry(AddressFamily::Inet, &["192.0.2.1"]),
        ];
        dedup_families(&mut values);
        assert_eq!(values.len(), 1);

        let mut values = vec![
            entry(AddressFamily::Inet, &["192.0.2.1"]),
            entry(AddressFamily::Inet6, &["2001:db8::1"]),
        ];
        dedup_families(&mut values);
        assert_eq!(values.len(), 2);
    }

    #[test]
    fn ordering() {
        // v6 answer arrived first
        let values = vec![
            entry(AddressFamily::Inet6, &["2001:db8::1", "::1"]),
            entry(AddressFamily::Inet, &["192.0.2.1", "127.0.0.1"]),
        ];
        let sp = socktype_protocols(&[SOCK_STREAM], 0);
        let r = assemble(&values, 80, &sp).unwrap();
        let ips = r.iter().map(|ai| ai.ip().to_string()).collect::<Vec<_>>();
        assert_eq!(ips, vec!["::1", "192.0.2.1", "127.0.0.1", "2001:db8::1"]);
        assert_eq!(r[0].family, AF_INET6);
        assert_eq!(r[1].family, AF_INET);
        assert_eq!(r[1].sockaddr, "192.0.2.1:80".parse().unwrap());
        assert!(r.iter().all(|ai| ai.canonname.is_empty()));
    }

    #[test]
    fn expansion() {
        let values = vec![entry(AddressFamily::Inet6, &["2001:db8::1"])];
        let sp = socktype_protocols(&[], 0);
        let r = assemble(&values, 53, &sp).unwrap();
        assert_eq!(r.len(), 3);
        assert_eq!(
            r.iter().map(|ai| (ai.socktype, ai.protocol)).collect::<Vec<_>>(),
            vec![(SOCK_STREAM, 6), (SOCK_DGRAM, 17), (SOCK_RAW, 0)]
        );
        let SocketAddr::V6(sa) = r[0].sockaddr else {
            panic!("expect ipv6 socket address");
        };
        assert_eq!(sa.flowinfo(), 0);
        assert_eq!(sa.scope_id(), 0);
        assert_eq!(sa.port(), 53);
    }

    #[test]
    fn empty() {
        let values = vec![entry(AddressFamily::Inet, &[])];
        let sp = socktype_protocols(&[], 0);
        assert_eq!(assemble(&values, 0, &sp).unwrap_err(), ResolveError::NoAddress);

        let values = vec![entry(AddressFamily::Inet, &["192.0.2.1"])];
        let sp = socktype_protocols(&[SOCK_STREAM], IPPROTO_UDP);
        assert_eq!(assemble(&values, 0, &sp).unwrap_err(), ResolveError::NoAddress);
    }
}
