/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2023-2025 ByteDance and/or its affiliates.
 */

use std::future::Future;
use std::net::{IpAddr, SocketAddr, SocketAddrV6};
use std::sync::atomic::{AtomicU32, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use anyhow::{Context, anyhow};
use arc_swap::ArcSwapOption;
use log::{debug, info, warn};
use tokio::runtime::Handle;

use crate::assemble::{assemble, dedup_families, socktype_protocols};
use crate::config::ResolverConfig;
use crate::fork::{AtForkHook, ForkHook};
use crate::host::{BROADCAST_ADDRESS, BROADCAST_NAME, is_local_hostname};
use crate::port::{PortLookup, ServiceDatabase, SystemServices, lookup_port};
use crate::session::EngineSession;
use crate::stats::{ResolverQueryStats, ResolverStats};
use crate::system::{AddrInfoHints, LibcSystemResolver, SystemResolve};
use crate::values::Values;
use crate::waiter::Waiter;
use crate::{
    AF_UNSPEC, AI_NUMERICHOST, AI_PASSIVE, AddrInfo, AddressFamily, HostEntry, HostInput,
    NameInfo, PortInput, ResolveError, ResolveLocalError, SOCK_DGRAM, SockAddrArg,
};

const IPV4_SOCKADDR_ERROR: &str = "IPv4 sockaddr must be 2 tuple";
const IPV6_SOCKADDR_ERROR: &str = "IPv6 sockaddr must be 4 tuple";

pub struct ResolverBuilder {
    resolver_config: ResolverConfig,
    fork_hook: Option<Arc<dyn ForkHook>>,
    system: Option<Arc<dyn SystemResolve>>,
    services: Option<Arc<dyn ServiceDatabase>>,
    process_id: fn() -> u32,
}

impl ResolverBuilder {
    pub fn new(config: ResolverConfig) -> Self {
        ResolverBuilder {
            resolver_config: config,
            fork_hook: None,
            system: None,
            services: None,
            process_id: std::process::id,
        }
    }

    /// Where the current process id is read from when a fork is suspected,
    /// [`std::process::id`] by default.
    pub fn process_id(&mut self, source: fn() -> u32) {
        self.process_id = source;
    }

    pub fn fork_hook(&mut self, hook: Arc<dyn ForkHook>) {
        self.fork_hook = Some(hook);
    }

    pub fn system_resolver(&mut self, system: Arc<dyn SystemResolve>) {
        self.system = Some(system);
    }

    pub fn service_database(&mut self, services: Arc<dyn ServiceDatabase>) {
        self.services = Some(services);
    }

    /// Build the resolver on the current tokio runtime, creating its first
    /// engine session.
    pub fn build(self) -> anyhow::Result<Resolver> {
        let runtime = Handle::try_current()
            .map_err(|e| anyhow!("no tokio runtime to run the resolver on: {e}"))?;

        let pid = (self.process_id)();
        let inner = Arc::new(ResolverInner {
            config: self.resolver_config,
            runtime,
            process_id: self.process_id,
            session: ArcSwapOption::empty(),
            session_lock: Mutex::new(()),
            pid: AtomicU32::new(pid),
            next_session_id: AtomicU64::new(1),
            stats: Arc::new(ResolverStats::default()),
        });
        let session = inner.new_session(pid).context(format!(
            "failed to create engine session for resolver {}",
            inner.config.name
        ))?;
        inner.session.store(Some(session));

        let fork_hook = self
            .fork_hook
            .unwrap_or_else(|| AtForkHook::new() as Arc<dyn ForkHook>);
        let weak_inner = Arc::downgrade(&inner);
        fork_hook.start(Arc::new(move || {
            if let Some(inner) = weak_inner.upgrade() {
                inner.on_fork();
            }
        }));

        Ok(Resolver {
            inner,
            fork_hook,
            system: self
                .system
                .unwrap_or_else(|| Arc::new(LibcSystemResolver) as Arc<dyn SystemResolve>),
            services: self
                .services
                .unwrap_or_else(|| Arc::new(SystemServices) as Arc<dyn ServiceDatabase>),
        })
    }
}

struct ResolverInner {
    config: ResolverConfig,
    runtime: Handle,
    process_id: fn() -> u32,
    session: ArcSwapOption<EngineSession>,
    // serialize session replacement, readers never take it
    session_lock: Mutex<()>,
    pid: AtomicU32,
    next_session_id: AtomicU64,
    stats: Arc<ResolverStats>,
}

impl ResolverInner {
    fn new_session(&self, pid: u32) -> anyhow::Result<Arc<EngineSession>> {
        let engine = match self.config.engine.spawn_engine() {
            Ok(engine) => engine,
            Err(e) => {
                self.stats.session.add_build_failed();
                return Err(e);
            }
        };
        let id = self.next_session_id.fetch_add(1, Ordering::Relaxed);
        self.stats.session.add_created();
        Ok(Arc::new(EngineSession::new(id, pid, engine)))
    }

    fn current_session(&self) -> Result<Arc<EngineSession>, ResolveError> {
        self.session
            .load_full()
            .ok_or(ResolveLocalError::NoResolverRunning.into())
    }

    fn is_current(&self, session: &Arc<EngineSession>) -> bool {
        match &*self.session.load() {
            Some(current) => Arc::ptr_eq(current, session),
            None => false,
        }
    }

    fn schedule_destroy(&self, session: Arc<EngineSession>) {
        let delay = self.config.runtime.destroy_delay;
        let stats = Arc::clone(&self.stats);
        self.runtime.spawn(async move {
            if !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }
            session.destroy();
            stats.session.add_destroyed();
        });
    }

    /// Must be called with `session_lock` held.
    fn install_new_session(&self, pid: u32) -> anyhow::Result<()> {
        let session = self.new_session(pid)?;
        let new_id = session.id();
        self.pid.store(pid, Ordering::Relaxed);
        if let Some(old) = self.session.swap(Some(session)) {
            debug!(
                "resolver {}: engine session {} replaced by {new_id}",
                self.config.name,
                old.id()
            );
            self.schedule_destroy(old);
        }
        Ok(())
    }

    fn on_fork(&self) {
        let pid = (self.process_id)();
        let _guard = self.session_lock.lock().unwrap();
        if pid == self.pid.load(Ordering::Relaxed) || self.session.load().is_none() {
            return;
        }
        match self.install_new_session(pid) {
            Ok(_) => {
                self.stats.session.add_fork_handled();
                info!(
                    "resolver {}: new engine session created in forked process {pid}",
                    self.config.name
                );
            }
            Err(e) => warn!(
                "resolver {}: failed to create engine session in forked process {pid}: {e:?}",
                self.config.name
            ),
        }
    }

    fn reinit(&self) -> anyhow::Result<()> {
        let _guard = self.session_lock.lock().unwrap();
        if self.session.load().is_none() {
            return Err(anyhow!("resolver {} is closed", self.config.name));
        }
        self.install_new_session((self.process_id)())
    }

    fn close(&self) {
        let _guard = self.session_lock.lock().unwrap();
        if let Some(old) = self.session.swap(None) {
            debug!(
                "resolver {}: closed, engine session {} scheduled for destroy",
                self.config.name,
                old.id()
            );
            self.schedule_destroy(old);
        }
    }
}

/// Blocking-style DNS resolution facade over an asynchronous engine session.
///
/// Every operation only suspends the calling task. Queries that fail
/// because the session was replaced underneath them, after a fork or a
/// [`Resolver::reinit`], are transparently reissued on the new session.
pub struct Resolver {
    inner: Arc<ResolverInner>,
    fork_hook: Arc<dyn ForkHook>,
    system: Arc<dyn SystemResolve>,
    services: Arc<dyn ServiceDatabase>,
}

impl Drop for Resolver {
    fn drop(&mut self) {
        self.close();
    }
}

fn use_system_path(host: &HostInput, flags: i32) -> bool {
    match host.encoded_name() {
        Some(name) => flags & AI_NUMERICHOST != 0 || is_local_hostname(&name),
        None => true,
    }
}

impl Resolver {
    #[inline]
    pub fn name(&self) -> &str {
        &self.inner.config.name
    }

    #[inline]
    pub fn get_config(&self) -> &ResolverConfig {
        &self.inner.config
    }

    #[inline]
    pub fn get_stats(&self) -> Arc<ResolverStats> {
        Arc::clone(&self.inner.stats)
    }

    /// Release the engine session. Every later operation fails with
    /// [`ResolveLocalError::NoResolverRunning`].
    pub fn close(&self) {
        self.fork_hook.stop();
        self.inner.close();
    }

    /// Replace the engine session now, as is done after a fork.
    pub fn reinit(&self) -> anyhow::Result<()> {
        self.inner.reinit()
    }

    async fn with_session<T, F, Fut>(
        &self,
        stats: &ResolverQueryStats,
        mut op: F,
    ) -> Result<T, ResolveError>
    where
        F: FnMut(Arc<EngineSession>) -> Fut,
        Fut: Future<Output = Result<T, ResolveError>>,
    {
        loop {
            self.fork_hook.poll();
            let session = self.inner.current_session()?;
            let e = match op(Arc::clone(&session)).await {
                Ok(v) => return Ok(v),
                Err(e) => e,
            };
            if !e.is_resolution_failure() || self.inner.is_current(&session) {
                return Err(e);
            }
            stats.add_query_retried();
            debug!(
                "resolver {}: engine session {} replaced during query, retry after error: {e}",
                self.name(),
                session.id()
            );
        }
    }

    fn resolve_special(&self, hostname: HostInput, family: i32) -> Result<HostInput, ResolveError> {
        let name = hostname.encode()?;
        if name.is_empty() {
            let hints = AddrInfoHints {
                family,
                socktype: SOCK_DGRAM,
                protocol: 0,
                flags: AI_PASSIVE,
            };
            let r = self.system.getaddrinfo(None, Some("0"), &hints)?;
            if r.len() != 1 {
                return Err(ResolveError::MultipleAddresses);
            }
            return Ok(HostInput::Text(r[0].ip().to_string()));
        }
        if name == BROADCAST_NAME {
            return Ok(HostInput::Text(BROADCAST_ADDRESS.to_string()));
        }
        Ok(hostname)
    }

    fn system_getaddrinfo(
        &self,
        host: &HostInput,
        port: &PortInput,
        hints: &AddrInfoHints,
    ) -> Result<Vec<AddrInfo>, ResolveError> {
        let host = match host {
            HostInput::None => None,
            _ => Some(host.encode()?),
        };
        let service = port.as_service();
        self.system
            .getaddrinfo(host.as_deref(), service.as_deref(), hints)
    }

    async fn lookup_addrinfo(
        &self,
        session: &EngineSession,
        host: &HostInput,
        port: &PortInput,
        hints: &AddrInfoHints,
        stats: &ResolverQueryStats,
    ) -> Result<Vec<AddrInfo>, ResolveError> {
        if use_system_path(host, hints.flags) {
            stats.add_query_fast_path();
            return self.system_getaddrinfo(host, port, hints);
        }

        let name = host.encode()?;
        let PortLookup { port, socktypes } =
            lookup_port(port, hints.socktype, self.services.as_ref())?;
        let socktype_proto = socktype_protocols(&socktypes, hints.protocol);

        let engine = session.engine();
        let mut values = match AddressFamily::try_from(hints.family)? {
            AddressFamily::Unspec => {
                let values = Values::<HostEntry>::new(2);
                engine.gethostbyname(&name, AddressFamily::Inet, values.sink().into());
                engine.gethostbyname(&name, AddressFamily::Inet6, values.sink().into());
                values.get().await?
            }
            family => {
                let (sink, mut waiter) = Waiter::<HostEntry>::pair();
                engine.gethostbyname(&name, family, sink.into());
                vec![waiter.get().await?]
            }
        };
        dedup_families(&mut values);
        assemble(&values, port, &socktype_proto)
    }

    pub async fn getaddrinfo(
        &self,
        host: impl Into<HostInput>,
        port: impl Into<PortInput>,
        family: i32,
        socktype: i32,
        proto: i32,
        flags: i32,
    ) -> Result<Vec<AddrInfo>, ResolveError> {
        let host = host.into();
        let port = port.into();
        let hints = AddrInfoHints {
            family,
            socktype,
            protocol: proto,
            flags,
        };

        let stats = &self.inner.stats.getaddrinfo;
        stats.add_query_total();
        let r = if use_system_path(&host, flags) {
            stats.add_query_fast_path();
            self.system_getaddrinfo(&host, &port, &hints)
        } else {
            let (host, port, hints) = (&host, &port, &hints);
            self.with_session(stats, move |session| async move {
                self.lookup_addrinfo(&session, host, port, hints, stats)
                    .await
            })
            .await
        };
        r.inspect_err(|e| stats.add_error(e))
    }

    async fn resolve_hostbyname_ex(
        &self,
        hostname: &HostInput,
        family: i32,
        stats: &ResolverQueryStats,
    ) -> Result<HostEntry, ResolveError> {
        let name = hostname.encode()?;
        let family = AddressFamily::try_from(family)?;
        if name == BROADCAST_ADDRESS {
            return Ok(HostEntry::broadcast());
        }

        let name: &str = &name;
        self.with_session(stats, move |session| async move {
            let (sink, mut waiter) = Waiter::<HostEntry>::pair();
            session.engine().gethostbyname(name, family, sink.into());
            let entry = waiter.get().await?;
            if entry.addresses.is_empty() {
                return Err(ResolveError::NoAddress);
            }
            Ok(entry)
        })
        .await
    }

    pub async fn gethostbyname_ex(
        &self,
        hostname: impl Into<HostInput>,
        family: i32,
    ) -> Result<HostEntry, ResolveError> {
        let hostname = hostname.into();
        let stats = &self.inner.stats.gethostbyname;
        stats.add_query_total();
        self.resolve_hostbyname_ex(&hostname, family, stats)
            .await
            .inspect_err(|e| stats.add_error(e))
    }

    async fn resolve_hostbyname(
        &self,
        hostname: HostInput,
        family: i32,
        stats: &ResolverQueryStats,
    ) -> Result<IpAddr, ResolveError> {
        AddressFamily::try_from(family)?;
        let hostname = self.resolve_special(hostname, family)?;

        if let Some(name) = hostname.encoded_name() {
            if is_local_hostname(&name) {
                stats.add_query_fast_path();
                let hints = AddrInfoHints {
                    family,
                    ..Default::default()
                };
                let r = self.system.getaddrinfo(Some(name.as_ref()), None, &hints)?;
                return r.first().map(|ai| ai.ip()).ok_or(ResolveError::NoAddress);
            }
        }

        let entry = self.resolve_hostbyname_ex(&hostname, family, stats).await?;
        entry
            .addresses
            .first()
            .copied()
            .ok_or(ResolveError::NoAddress)
    }

    pub async fn gethostbyname(
        &self,
        hostname: impl Into<HostInput>,
        family: i32,
    ) -> Result<IpAddr, ResolveError> {
        let stats = &self.inner.stats.gethostbyname;
        stats.add_query_total();
        self.resolve_hostbyname(hostname.into(), family, stats)
            .await
            .inspect_err(|e| stats.add_error(e))
    }

    async fn hostbyaddr_on(
        &self,
        session: &EngineSession,
        address: &str,
        stats: &ResolverQueryStats,
    ) -> Result<HostEntry, ResolveError> {
        let (sink, mut waiter) = Waiter::<HostEntry>::pair();
        session.engine().gethostbyaddr(address, sink.into());
        let e = match waiter.get().await {
            Err(e @ ResolveError::InvalidAddress(_)) => e,
            r => return r,
        };

        // not an address, forward resolve it and try again with the result
        let host = HostInput::Text(address.to_string());
        let hints = AddrInfoHints {
            family: AF_UNSPEC,
            socktype: SOCK_DGRAM,
            ..Default::default()
        };
        let canonical = match self
            .lookup_addrinfo(session, &host, &PortInput::None, &hints, stats)
            .await
        {
            Ok(r) => match r.first() {
                Some(ai) => ai.ip().to_string(),
                None => return Err(e),
            },
            Err(ResolveError::NoAddress) => return Err(e),
            Err(other) => return Err(other),
        };
        if canonical == address {
            return Err(e);
        }

        let sink = waiter.clear();
        session.engine().gethostbyaddr(&canonical, sink.into());
        waiter.get().await
    }

    async fn resolve_hostbyaddr(
        &self,
        ip_address: HostInput,
        stats: &ResolverQueryStats,
    ) -> Result<HostEntry, ResolveError> {
        let ip_address = self.resolve_special(ip_address, AF_UNSPEC)?;
        let address = ip_address.encode()?;

        let address: &str = &address;
        self.with_session(stats, move |session| async move {
            self.hostbyaddr_on(&session, address, stats).await
        })
        .await
    }

    pub async fn gethostbyaddr(
        &self,
        ip_address: impl Into<HostInput>,
    ) -> Result<HostEntry, ResolveError> {
        let stats = &self.inner.stats.gethostbyaddr;
        stats.add_query_total();
        self.resolve_hostbyaddr(ip_address.into(), stats)
            .await
            .inspect_err(|e| stats.add_error(e))
    }

    async fn nameinfo_on(
        &self,
        session: &EngineSession,
        sockaddr: &SockAddrArg,
        host: &str,
        flags: i32,
        stats: &ResolverQueryStats,
    ) -> Result<(String, String), ResolveError> {
        let hints = AddrInfoHints {
            family: AF_UNSPEC,
            socktype: SOCK_DGRAM,
            ..Default::default()
        };
        let result = self
            .lookup_addrinfo(
                session,
                &HostInput::Text(host.to_string()),
                &PortInput::Number(sockaddr.port() as i64),
                &hints,
                stats,
            )
            .await?;
        if result.len() != 1 {
            return Err(ResolveError::MultipleAddresses);
        }

        let address = match (result[0].sockaddr, sockaddr) {
            (SocketAddr::V4(a), SockAddrArg::Pair { .. }) => SocketAddr::V4(a),
            (SocketAddr::V4(_), SockAddrArg::Quad { .. }) => {
                return Err(ResolveError::BadSockAddr(IPV4_SOCKADDR_ERROR));
            }
            (
                SocketAddr::V6(a),
                SockAddrArg::Quad {
                    flowinfo, scope_id, ..
                },
            ) => SocketAddr::V6(SocketAddrV6::new(*a.ip(), a.port(), *flowinfo, *scope_id)),
            (SocketAddr::V6(_), SockAddrArg::Pair { .. }) => {
                return Err(ResolveError::BadSockAddr(IPV6_SOCKADDR_ERROR));
            }
        };

        let (sink, mut waiter) = Waiter::<NameInfo>::pair();
        session.engine().getnameinfo(address, flags, sink.into());
        let NameInfo { node, service } = waiter.get().await?;

        let node = node.ok_or(ResolveError::NameOrServiceUnknown)?;
        let service = match service {
            Some(service) => service,
            None if self.inner.config.runtime.strict_service_name => {
                return Err(ResolveError::NameOrServiceUnknown);
            }
            None => "0".to_string(),
        };
        Ok((node, service))
    }

    async fn resolve_nameinfo(
        &self,
        sockaddr: &SockAddrArg,
        flags: i32,
        stats: &ResolverQueryStats,
    ) -> Result<(String, String), ResolveError> {
        let host = sockaddr.host().as_text()?;
        match (host.parse::<IpAddr>(), sockaddr) {
            (Ok(IpAddr::V4(_)), SockAddrArg::Quad { .. }) => {
                return Err(ResolveError::BadSockAddr(IPV4_SOCKADDR_ERROR));
            }
            (Ok(IpAddr::V6(_)), SockAddrArg::Pair { .. }) => {
                return Err(ResolveError::BadSockAddr(IPV6_SOCKADDR_ERROR));
            }
            _ => {}
        }

        self.with_session(stats, move |session| async move {
            self.nameinfo_on(&session, sockaddr, host, flags, stats)
                .await
        })
        .await
    }

    pub async fn getnameinfo(
        &self,
        sockaddr: &SockAddrArg,
        flags: i32,
    ) -> Result<(String, String), ResolveError> {
        let stats = &self.inner.stats.getnameinfo;
        stats.add_query_total();
        self.resolve_nameinfo(sockaddr, flags, stats)
            .await
            .inspect_err(|e| stats.add_error(e))
    }
}
