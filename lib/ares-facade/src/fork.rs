/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2025 ByteDance and/or its affiliates.
 */

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, Once};

use tokio::runtime::Handle;
use tokio::sync::Notify;
use tokio::task::JoinHandle;

pub type ForkCallback = Arc<dyn Fn() + Send + Sync>;

/// Source of "the process may have forked" notifications.
pub trait ForkHook: Send + Sync {
    fn start(&self, callback: ForkCallback);
    fn stop(&self);

    /// Dispatch notifications recorded since the last call. Called before
    /// every query is issued.
    fn poll(&self) {}
}

/// A hook that only fires when told to. Also serves environments without
/// fork semantics, where it is simply never triggered.
///
/// The resolver still compares process ids when the hook fires, so
/// [`ManualForkHook::trigger`] never replaces the session within the same
/// process. Use [`Resolver::reinit`](crate::Resolver::reinit) for that.
#[derive(Default)]
pub struct ManualForkHook {
    callback: Mutex<Option<ForkCallback>>,
}

impl ManualForkHook {
    pub fn new() -> Arc<Self> {
        Arc::new(ManualForkHook::default())
    }

    pub fn trigger(&self) {
        let callback = self.callback.lock().unwrap().clone();
        if let Some(callback) = callback {
            callback();
        }
    }
}

impl ForkHook for ManualForkHook {
    fn start(&self, callback: ForkCallback) {
        *self.callback.lock().unwrap() = Some(callback);
    }

    fn stop(&self) {
        self.callback.lock().unwrap().take();
    }
}

static FORK_GENERATION: AtomicU64 = AtomicU64::new(0);
static FORK_NOTIFY: Notify = Notify::const_new();
static ATFORK_REGISTER: Once = Once::new();

extern "C" fn record_fork() {
    FORK_GENERATION.fetch_add(1, Ordering::AcqRel);
    // only the forking thread survives in the child
    FORK_NOTIFY.notify_waiters();
}

struct AtForkState {
    seen: AtomicU64,
    callback: Mutex<Option<ForkCallback>>,
}

impl AtForkState {
    fn dispatch(&self) {
        let generation = FORK_GENERATION.load(Ordering::Acquire);
        if self.seen.swap(generation, Ordering::AcqRel) == generation {
            return;
        }
        let callback = self.callback.lock().unwrap().clone();
        if let Some(callback) = callback {
            callback();
        }
    }
}

/// Records forks with `pthread_atfork(3)` and hands them to the callback.
///
/// When started on a tokio runtime, a watcher task dispatches every recorded
/// fork as soon as the runtime runs again in the child, so queries already
/// waiting on the old session are released. [`ForkHook::poll`] dispatches
/// too, for hooks started outside a runtime.
pub struct AtForkHook {
    state: Arc<AtForkState>,
    watcher: Mutex<Option<JoinHandle<()>>>,
}

impl AtForkHook {
    pub fn new() -> Arc<Self> {
        ATFORK_REGISTER.call_once(|| {
            unsafe { libc::pthread_atfork(None, None, Some(record_fork)) };
        });
        Arc::new(AtForkHook {
            state: Arc::new(AtForkState {
                seen: AtomicU64::new(FORK_GENERATION.load(Ordering::Acquire)),
                callback: Mutex::new(None),
            }),
            watcher: Mutex::new(None),
        })
    }

    fn spawn_watcher(&self, runtime: Handle) {
        let state = Arc::clone(&self.state);
        let task = runtime.spawn(async move {
            loop {
                let notified = FORK_NOTIFY.notified();
                tokio::pin!(notified);
                // register before checking, a fork in between is not lost
                notified.as_mut().enable();
                state.dispatch();
                notified.await;
            }
        });
        if let Some(old) = self.watcher.lock().unwrap().replace(task) {
            old.abort();
        }
    }
}

impl ForkHook for AtForkHook {
    fn start(&self, callback: ForkCallback) {
        self.state
            .seen
            .store(FORK_GENERATION.load(Ordering::Acquire), Ordering::Release);
        *self.state.callback.lock().unwrap() = Some(callback);
        if let Ok(runtime) = Handle::try_current() {
            self.spawn_watcher(runtime);
        }
    }

    fn stop(&self) {
        self.state.callback.lock().unwrap().take();
        if let Some(task) = self.watcher.lock().unwrap().take() {
            task.abort();
        }
    }

    fn poll(&self) {
        self.state.dispatch();
    }
}
