/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2025 ByteDance and/or its affiliates.
 */

use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::sync::atomic::{AtomicU32, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use ares_facade::engine::{AnyEngineConfig, BoxResolveEngine, EngineFactory, QuerySink, ResolveEngine};
use ares_facade::{
    AF_INET, AF_UNSPEC, AddressFamily, HostEntry, ManualForkHook, NameInfo, ResolveError,
    ResolveLocalError, ResolveServerError, Resolver, ResolverBuilder, ResolverConfig,
    SockAddrArg,
};

#[derive(Clone, Copy, PartialEq)]
enum Mode {
    /// Keep every query pending until the engine is destroyed.
    Hold,
    /// Answer names with 192.0.2.<engine id>.
    Answer,
    /// Answer names with an empty record.
    Empty,
    /// Reject every reverse query as not an address, and answer names with
    /// the name itself.
    RejectAddress,
}

type QueryLog = Arc<Mutex<Vec<(usize, String)>>>;

struct ScriptEngine {
    id: usize,
    mode: Mode,
    log: QueryLog,
    pending: Mutex<Vec<QuerySink<HostEntry>>>,
    destroyed: Arc<AtomicUsize>,
}

impl ScriptEngine {
    fn record(&self, query: String) {
        self.log.lock().unwrap().push((self.id, query));
    }

    fn answer(&self, name: &str, family: AddressFamily) -> Result<HostEntry, ResolveError> {
        let mut entry = HostEntry::new(name, family);
        match self.mode {
            Mode::Answer if family != AddressFamily::Inet6 => {
                entry.family = AddressFamily::Inet;
                entry
                    .addresses
                    .push(IpAddr::V4(Ipv4Addr::new(192, 0, 2, self.id as u8)));
            }
            Mode::Answer | Mode::Hold => {
                return Err(ResolveServerError::NotFound.into());
            }
            Mode::Empty => {}
            Mode::RejectAddress => match name.parse::<IpAddr>() {
                Ok(ip) if family.matches(&ip) => entry.addresses.push(ip),
                _ => return Err(ResolveServerError::NotFound.into()),
            },
        }
        Ok(entry)
    }
}

impl ResolveEngine for ScriptEngine {
    fn gethostbyname(&self, name: &str, family: AddressFamily, sink: QuerySink<HostEntry>) {
        self.record(format!("name {name} {family:?}"));
        if self.mode == Mode::Hold {
            self.pending.lock().unwrap().push(sink);
            return;
        }
        let r = self.answer(name, family);
        tokio::spawn(async move { sink.deliver(r) });
    }

    fn gethostbyaddr(&self, address: &str, sink: QuerySink<HostEntry>) {
        self.record(format!("addr {address}"));
        let r = match address.parse::<IpAddr>() {
            Ok(_) if self.mode == Mode::RejectAddress => {
                Err(ResolveError::InvalidAddress(address.to_string()))
            }
            Ok(ip) => {
                let mut entry = HostEntry::new("host.example.net", AddressFamily::of(&ip));
                entry.addresses.push(ip);
                Ok(entry)
            }
            Err(_) => Err(ResolveError::InvalidAddress(address.to_string())),
        };
        tokio::spawn(async move { sink.deliver(r) });
    }

    fn getnameinfo(&self, address: SocketAddr, _flags: i32, sink: QuerySink<NameInfo>) {
        self.record(format!("nameinfo {address}"));
        tokio::spawn(async move {
            sink.deliver(Ok(NameInfo {
                node: Some("host.example.net".to_string()),
                service: Some(address.port().to_string()),
            }))
        });
    }

    fn destroy(&self) {
        // dropping the sinks cancels the queries
        self.pending.lock().unwrap().clear();
        self.destroyed.fetch_add(1, Ordering::Relaxed);
    }
}

struct ScriptFactory {
    modes: Vec<Mode>,
    created: AtomicUsize,
    destroyed: Arc<AtomicUsize>,
    log: QueryLog,
}

impl ScriptFactory {
    fn new(modes: &[Mode]) -> Arc<Self> {
        Arc::new(ScriptFactory {
            modes: modes.to_vec(),
            created: AtomicUsize::new(0),
            destroyed: Arc::new(AtomicUsize::new(0)),
            log: Arc::new(Mutex::new(Vec::new())),
        })
    }

    fn queries(&self) -> Vec<(usize, String)> {
        self.log.lock().unwrap().clone()
    }
}

impl EngineFactory for ScriptFactory {
    fn create_engine(&self) -> anyhow::Result<BoxResolveEngine> {
        let id = self.created.fetch_add(1, Ordering::Relaxed) + 1;
        let mode = self
            .modes
            .get(id - 1)
            .or(self.modes.last())
            .copied()
            .unwrap_or(Mode::Answer);
        Ok(Box::new(ScriptEngine {
            id,
            mode,
            log: Arc::clone(&self.log),
            pending: Mutex::new(Vec::new()),
            destroyed: Arc::clone(&self.destroyed),
        }))
    }
}

fn build_resolver(factory: &Arc<ScriptFactory>, hook: &Arc<ManualForkHook>) -> Resolver {
    let config = ResolverConfig::new(
        "script",
        AnyEngineConfig::Custom(Arc::clone(factory) as Arc<dyn EngineFactory>),
    );
    let mut builder = ResolverBuilder::new(config);
    builder.fork_hook(Arc::clone(hook) as _);
    builder.build().unwrap()
}

async fn wait_queries(factory: &ScriptFactory, n: usize) {
    while factory.queries().len() < n {
        tokio::task::yield_now().await;
    }
}

#[tokio::test]
async fn retry_on_replaced_session() {
    let factory = ScriptFactory::new(&[Mode::Hold, Mode::Answer]);
    let hook = ManualForkHook::new();
    let resolver = build_resolver(&factory, &hook);

    let (r, _) = tokio::join!(
        resolver.gethostbyname_ex("www.example.net", AF_INET),
        async {
            wait_queries(&factory, 1).await;
            resolver.reinit().unwrap();
        }
    );

    let entry = r.unwrap();
    assert_eq!(entry.addresses, vec![IpAddr::V4(Ipv4Addr::new(192, 0, 2, 2))]);
    assert_eq!(
        factory.queries(),
        vec![
            (1, "name www.example.net Inet".to_string()),
            (2, "name www.example.net Inet".to_string()),
        ]
    );
    assert_eq!(factory.created.load(Ordering::Relaxed), 2);
    assert_eq!(factory.destroyed.load(Ordering::Relaxed), 1);

    let s = resolver.get_stats().snapshot();
    assert_eq!(s.gethostbyname.total, 1);
    assert_eq!(s.gethostbyname.retried, 1);
    assert_eq!(s.gethostbyname.failed, 0);
    assert_eq!(s.session.created, 2);
}

#[tokio::test]
async fn retry_dual_stack_on_replaced_session() {
    let factory = ScriptFactory::new(&[Mode::Hold, Mode::Answer]);
    let hook = ManualForkHook::new();
    let resolver = build_resolver(&factory, &hook);

    let (r, _) = tokio::join!(
        resolver.getaddrinfo("www.example.net", 80u16, AF_UNSPEC, 0, 0, 0),
        async {
            wait_queries(&factory, 2).await;
            resolver.reinit().unwrap();
        }
    );

    let r = r.unwrap();
    assert_eq!(r.len(), 3);
    assert!(r.iter().all(|ai| ai.sockaddr == "192.0.2.2:80".parse().unwrap()));
    assert_eq!(factory.queries().len(), 4);
}

#[tokio::test]
async fn no_retry_on_current_session() {
    let factory = ScriptFactory::new(&[Mode::Answer]);
    let hook = ManualForkHook::new();
    let resolver = build_resolver(&factory, &hook);

    let e = resolver
        .gethostbyname_ex("www.example.net", ares_facade::AF_INET6)
        .await
        .unwrap_err();
    assert_eq!(e, ResolveError::FromServer(ResolveServerError::NotFound));
    assert_eq!(factory.queries().len(), 1);
    assert_eq!(resolver.get_stats().snapshot().gethostbyname.retried, 0);
}

#[tokio::test]
async fn fork_hook_same_process() {
    let factory = ScriptFactory::new(&[Mode::Answer]);
    let hook = ManualForkHook::new();
    let resolver = build_resolver(&factory, &hook);

    // the pid did not change, the session is kept
    hook.trigger();
    assert_eq!(factory.created.load(Ordering::Relaxed), 1);

    let ip = resolver.gethostbyname("www.example.net", AF_INET).await.unwrap();
    assert_eq!(ip, IpAddr::V4(Ipv4Addr::new(192, 0, 2, 1)));

    resolver.reinit().unwrap();
    let ip = resolver.gethostbyname("www.example.net", AF_INET).await.unwrap();
    assert_eq!(ip, IpAddr::V4(Ipv4Addr::new(192, 0, 2, 2)));
    assert_eq!(resolver.get_stats().snapshot().session.forks_handled, 0);
}

#[tokio::test]
async fn fork_replaces_session() {
    static PID: AtomicU32 = AtomicU32::new(1000);
    fn current_pid() -> u32 {
        PID.load(Ordering::Relaxed)
    }

    let factory = ScriptFactory::new(&[Mode::Hold, Mode::Answer]);
    let hook = ManualForkHook::new();
    let config = ResolverConfig::new(
        "script",
        AnyEngineConfig::Custom(Arc::clone(&factory) as Arc<dyn EngineFactory>),
    );
    let mut builder = ResolverBuilder::new(config);
    builder.fork_hook(Arc::clone(&hook) as _);
    builder.process_id(current_pid);
    let resolver = builder.build().unwrap();

    let (r, _) = tokio::join!(
        resolver.gethostbyname_ex("www.example.net", AF_INET),
        async {
            wait_queries(&factory, 1).await;
            // now running in the child
            PID.store(1001, Ordering::Relaxed);
            hook.trigger();
        }
    );

    let entry = r.unwrap();
    assert_eq!(entry.addresses, vec![IpAddr::V4(Ipv4Addr::new(192, 0, 2, 2))]);
    assert_eq!(
        factory.queries(),
        vec![
            (1, "name www.example.net Inet".to_string()),
            (2, "name www.example.net Inet".to_string()),
        ]
    );
    assert_eq!(factory.created.load(Ordering::Relaxed), 2);
    assert_eq!(factory.destroyed.load(Ordering::Relaxed), 1);

    let s = resolver.get_stats().snapshot();
    assert_eq!(s.session.forks_handled, 1);
    assert_eq!(s.session.created, 2);
    assert_eq!(s.session.destroyed, 1);
    assert_eq!(s.gethostbyname.retried, 1);

    // the pid is recorded, firing again in the same child changes nothing
    hook.trigger();
    assert_eq!(factory.created.load(Ordering::Relaxed), 2);
    assert_eq!(resolver.get_stats().snapshot().session.forks_handled, 1);
}

#[tokio::test]
async fn close_in_flight() {
    let factory = ScriptFactory::new(&[Mode::Hold]);
    let hook = ManualForkHook::new();
    let resolver = build_resolver(&factory, &hook);

    let (r, _) = tokio::join!(
        resolver.gethostbyname_ex("www.example.net", AF_INET),
        async {
            wait_queries(&factory, 1).await;
            resolver.close();
        }
    );
    assert_eq!(
        r.unwrap_err(),
        ResolveError::FromLocal(ResolveLocalError::NoResolverRunning)
    );
    assert_eq!(factory.queries().len(), 1);

    // the hook is detached once closed
    hook.trigger();
    assert_eq!(factory.created.load(Ordering::Relaxed), 1);
}

#[tokio::test]
async fn unspec_all_empty() {
    let factory = ScriptFactory::new(&[Mode::Empty]);
    let hook = ManualForkHook::new();
    let resolver = build_resolver(&factory, &hook);

    let e = resolver
        .getaddrinfo("www.example.net", 80u16, AF_UNSPEC, 0, 0, 0)
        .await
        .unwrap_err();
    assert_eq!(e, ResolveError::NoAddress);
    assert_eq!(factory.queries().len(), 2);
}

#[tokio::test]
async fn gethostbyaddr_no_loop() {
    let factory = ScriptFactory::new(&[Mode::RejectAddress]);
    let hook = ManualForkHook::new();
    let resolver = build_resolver(&factory, &hook);

    // forward resolution gives back the very same address
    let e = resolver.gethostbyaddr("192.0.2.77").await.unwrap_err();
    assert_eq!(e, ResolveError::InvalidAddress("192.0.2.77".to_string()));

    let addr_queries = factory
        .queries()
        .into_iter()
        .filter(|(_, q)| q.starts_with("addr"))
        .count();
    assert_eq!(addr_queries, 1);
}

#[tokio::test]
async fn nameinfo_checked_before_query() {
    let factory = ScriptFactory::new(&[Mode::Answer]);
    let hook = ManualForkHook::new();
    let resolver = build_resolver(&factory, &hook);

    let sockaddr = SockAddrArg::Pair {
        host: "2001:db8::1".into(),
        port: 53,
    };
    let e = resolver.getnameinfo(&sockaddr, 0).await.unwrap_err();
    assert!(matches!(e, ResolveError::BadSockAddr(_)));
    assert!(factory.queries().is_empty());

    let sockaddr = SockAddrArg::Pair {
        host: "192.0.2.1".into(),
        port: 53,
    };
    let (node, service) = resolver.getnameinfo(&sockaddr, 0).await.unwrap();
    assert_eq!(node, "host.example.net");
    assert_eq!(service, "53");
}
