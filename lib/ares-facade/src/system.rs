/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2025 ByteDance and/or its affiliates.
 */

use std::ffi::{CStr, CString};
use std::net::{Ipv4Addr, Ipv6Addr, SocketAddr, SocketAddrV4, SocketAddrV6};
use std::ptr;

use crate::{AddrInfo, ResolveError};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct AddrInfoHints {
    pub family: i32,
    pub socktype: i32,
    pub protocol: i32,
    pub flags: i32,
}

/// The plain synchronous system resolver, used where no network round trip
/// is needed.
pub trait SystemResolve: Send + Sync {
    fn getaddrinfo(
        &self,
        host: Option<&str>,
        service: Option<&str>,
        hints: &AddrInfoHints,
    ) -> Result<Vec<AddrInfo>, ResolveError>;
}

/// [`SystemResolve`] through the C library `getaddrinfo(3)`.
#[derive(Clone, Copy, Debug, Default)]
pub struct LibcSystemResolver;

fn to_cstring(s: Option<&str>) -> Result<Option<CString>, ResolveError> {
    s.map(CString::new)
        .transpose()
        .map_err(|_| ResolveError::InvalidInput("embedded nul byte".to_string()))
}

fn system_error(code: i32) -> ResolveError {
    let message = unsafe { CStr::from_ptr(libc::gai_strerror(code)) }
        .to_string_lossy()
        .into_owned();
    ResolveError::System { code, message }
}

unsafe fn sockaddr_from_raw(addr: *const libc::sockaddr, len: libc::socklen_t) -> Option<SocketAddr> {
    if addr.is_null() {
        return None;
    }
    let len = len as usize;
    unsafe {
        match (*addr).sa_family as i32 {
            libc::AF_INET if len >= size_of::<libc::sockaddr_in>() => {
                let sin = &*(addr as *const libc::sockaddr_in);
                let ip = Ipv4Addr::from(u32::from_be(sin.sin_addr.s_addr));
                Some(SocketAddr::V4(SocketAddrV4::new(ip, u16::from_be(sin.sin_port))))
            }
            libc::AF_INET6 if len >= size_of::<libc::sockaddr_in6>() => {
                let sin6 = &*(addr as *const libc::sockaddr_in6);
                Some(SocketAddr::V6(SocketAddrV6::new(
                    Ipv6Addr::from(sin6.sin6_addr.s6_addr),
                    u16::from_be(sin6.sin6_port),
                    sin6.sin6_flowinfo,
                    sin6.sin6_scope_id,
                )))
            }
            _ => None,
        }
    }
}

impl SystemResolve for LibcSystemResolver {
    fn getaddrinfo(
        &self,
        host: Option<&str>,
        service: Option<&str>,
        hints: &AddrInfoHints,
    ) -> Result<Vec<AddrInfo>, ResolveError> {
        let host = to_cstring(host)?;
        let service = to_cstring(service)?;

        let mut c_hints: libc::addrinfo = unsafe { std::mem::zeroed() };
        c_hints.ai_family = hints.family;
        c_hints.ai_socktype = hints.socktype;
        c_hints.ai_protocol = hints.protocol;
        c_hints.ai_flags = hints.flags;

        let mut res: *mut libc::addrinfo = ptr::null_mut();
        let ret = unsafe {
            libc::getaddrinfo(
                host.as_ref().map_or(ptr::null(), |s| s.as_ptr()),
                service.as_ref().map_or(ptr::null(), |s| s.as_ptr()),
                &c_hints,
                &mut res,
            )
        };
        if ret != 0 {
            return Err(system_error(ret));
        }

        let mut results = Vec::new();
        let mut cur = res;
        unsafe {
            while !cur.is_null() {
                let ai = &*cur;
                if let Some(sockaddr) = sockaddr_from_raw(ai.ai_addr, ai.ai_addrlen) {
                    let canonname = if ai.ai_canonname.is_null() {
                        String::new()
                    } else {
                        CStr::from_ptr(ai.ai_canonname)
                            .to_string_lossy()
                            .into_owned()
                    };
                    results.push(AddrInfo {
                        family: ai.ai_family,
                        socktype: ai.ai_socktype,
                        protocol: ai.ai_protocol,
                        canonname,
                        sockaddr,
                    });
                }
                cur = ai.ai_next;
            }
            libc::freeaddrinfo(res);
        }
        Ok(results)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{AF_INET, AF_INET6, AI_NUMERICHOST, AI_PASSIVE, SOCK_DGRAM, SOCK_STREAM};

    #[test]
    fn numeric_host() {
        let hints = AddrInfoHints {
            family: AF_INET,
            socktype: SOCK_STREAM,
            flags: AI_NUMERICHOST,
            ..Default::default()
        };
        let r = LibcSystemResolver
            .getaddrinfo(Some("127.0.0.1"), Some("80"), &hints)
            .unwrap();
        assert_eq!(r.len(), 1);
        assert_eq!(r[0].sockaddr, "127.0.0.1:80".parse().unwrap());
        assert_eq!(r[0].socktype, SOCK_STREAM);
    }

    #[test]
    fn passive_wildcard() {
        let hints = AddrInfoHints {
            family: AF_INET6,
            socktype: SOCK_DGRAM,
            flags: AI_PASSIVE,
            ..Default::default()
        };
        let r = LibcSystemResolver.getaddrinfo(None, Some("0"), &hints).unwrap();
        assert_eq!(r.len(), 1);
        assert_eq!(r[0].sockaddr.ip(), Ipv6Addr::UNSPECIFIED);
    }

    #[test]
    fn numeric_host_rejects_name() {
        let hints = AddrInfoHints {
            flags: AI_NUMERICHOST,
            ..Default::default()
        };
        let e = LibcSystemResolver
            .getaddrinfo(Some("not-numeric.invalid"), None, &hints)
            .unwrap_err();
        assert!(matches!(e, ResolveError::System { .. }));
        assert!(e.is_resolution_failure());
    }
}
