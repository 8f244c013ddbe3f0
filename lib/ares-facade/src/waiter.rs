/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2023-2025 ByteDance and/or its affiliates.
 */

use std::future::{Future, poll_fn};
use std::pin::Pin;
use std::task::{Context, Poll};

use tokio::sync::oneshot;

use crate::{ResolveError, ResolveLocalError};

type Outcome<T> = Result<T, ResolveError>;

/// Single-shot slot a task waits on until its producer delivers.
///
/// Exactly one [`WaiterSink`] exists per generation of the slot. If the sink
/// is dropped without delivering, the wait ends with
/// [`ResolveLocalError::QueryCancelled`].
pub struct Waiter<T> {
    receiver: Option<oneshot::Receiver<Outcome<T>>>,
}

/// Producer side of a [`Waiter`].
pub struct WaiterSink<T> {
    sender: oneshot::Sender<Outcome<T>>,
}

impl<T> Waiter<T> {
    pub fn pair() -> (WaiterSink<T>, Waiter<T>) {
        let (sender, receiver) = oneshot::channel();
        (
            WaiterSink { sender },
            Waiter {
                receiver: Some(receiver),
            },
        )
    }

    /// Reset the slot for another wait by the same task, returning the sink
    /// for the new generation. Anything delivered to an older sink is lost.
    pub fn clear(&mut self) -> WaiterSink<T> {
        let (sender, receiver) = oneshot::channel();
        self.receiver = Some(receiver);
        WaiterSink { sender }
    }

    pub fn poll_get(&mut self, cx: &mut Context<'_>) -> Poll<Outcome<T>> {
        let Some(receiver) = &mut self.receiver else {
            return Poll::Ready(Err(ResolveLocalError::QueryCancelled.into()));
        };
        let r = match Pin::new(receiver).poll(cx) {
            Poll::Pending => return Poll::Pending,
            Poll::Ready(Ok(r)) => r,
            Poll::Ready(Err(_)) => Err(ResolveLocalError::QueryCancelled.into()),
        };
        self.receiver = None;
        Poll::Ready(r)
    }

    pub async fn get(&mut self) -> Outcome<T> {
        poll_fn(|cx| self.poll_get(cx)).await
    }
}

impl<T> WaiterSink<T> {
    pub fn deliver(self, r: Outcome<T>) {
        // the waiter may have gone away, nothing to wake then
        let _ = self.sender.send(r);
    }
}
