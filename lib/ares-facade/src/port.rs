/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2025 ByteDance and/or its affiliates.
 */

use std::ffi::CString;
use std::sync::Mutex;

use crate::{ResolveError, SOCK_DGRAM, SOCK_STREAM};

/// Port or service argument of an address lookup.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PortInput {
    None,
    Number(i64),
    Service(String),
}

impl From<u16> for PortInput {
    fn from(p: u16) -> Self {
        PortInput::Number(p as i64)
    }
}

impl From<i64> for PortInput {
    fn from(p: i64) -> Self {
        PortInput::Number(p)
    }
}

impl From<&str> for PortInput {
    fn from(s: &str) -> Self {
        PortInput::Service(s.to_string())
    }
}

impl From<String> for PortInput {
    fn from(s: String) -> Self {
        PortInput::Service(s)
    }
}

impl<T: Into<PortInput>> From<Option<T>> for PortInput {
    fn from(v: Option<T>) -> Self {
        match v {
            Some(v) => v.into(),
            None => PortInput::None,
        }
    }
}

impl PortInput {
    /// The service argument in the form the system resolver takes.
    pub(crate) fn as_service(&self) -> Option<String> {
        match self {
            PortInput::None => None,
            PortInput::Number(n) => Some(n.to_string()),
            PortInput::Service(s) => Some(s.clone()),
        }
    }
}

/// Service name database, `/etc/services` style.
pub trait ServiceDatabase: Send + Sync {
    fn port_by_name(&self, name: &str, proto: &str) -> Option<u16>;
}

/// The system service database, through `getservbyname(3)`.
#[derive(Clone, Copy, Debug, Default)]
pub struct SystemServices;

// getservbyname returns a pointer into static storage
static GETSERVBYNAME_LOCK: Mutex<()> = Mutex::new(());

impl ServiceDatabase for SystemServices {
    fn port_by_name(&self, name: &str, proto: &str) -> Option<u16> {
        let name = CString::new(name).ok()?;
        let proto = CString::new(proto).ok()?;

        let _guard = GETSERVBYNAME_LOCK.lock().unwrap();
        unsafe {
            let ent = libc::getservbyname(name.as_ptr(), proto.as_ptr());
            if ent.is_null() {
                return None;
            }
            Some(u16::from_be((*ent).s_port as u16))
        }
    }
}

/// Numeric port plus the socket types implied by the service argument.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PortLookup {
    pub port: u16,
    pub socktypes: Vec<i32>,
}

pub fn lookup_port(
    port: &PortInput,
    socktype: i32,
    services: &dyn ServiceDatabase,
) -> Result<PortLookup, ResolveError> {
    let mut socktypes = Vec::new();

    let port = match port {
        PortInput::None => 0,
        PortInput::Number(n) => *n,
        PortInput::Service(s) => match s.trim().parse::<i64>() {
            Ok(n) => n,
            Err(_) => lookup_service(s, socktype, services, &mut socktypes)? as i64,
        },
    };

    if socktypes.is_empty() && socktype != 0 {
        socktypes.push(socktype);
    }

    Ok(PortLookup {
        port: port.rem_euclid(65536) as u16,
        socktypes,
    })
}

fn lookup_service(
    name: &str,
    socktype: i32,
    services: &dyn ServiceDatabase,
    socktypes: &mut Vec<i32>,
) -> Result<u16, ResolveError> {
    match socktype {
        0 => {
            if let Some(port) = services.port_by_name(name, "tcp") {
                socktypes.push(SOCK_STREAM);
                if services.port_by_name(name, "udp") == Some(port) {
                    socktypes.push(SOCK_DGRAM);
                }
                Ok(port)
            } else if let Some(port) = services.port_by_name(name, "udp") {
                socktypes.push(SOCK_DGRAM);
                Ok(port)
            } else {
                Err(ResolveError::ServiceNotSupported)
            }
        }
        SOCK_STREAM => services
            .port_by_name(name, "tcp")
            .ok_or(ResolveError::ServiceNotSupported),
        SOCK_DGRAM => services
            .port_by_name(name, "udp")
            .ok_or(ResolveError::ServiceNotSupported),
        _ => Err(ResolveError::ServiceNotSupported),
    }
}
