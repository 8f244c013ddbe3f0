/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2025 ByteDance and/or its affiliates.
 */

use std::sync::{Arc, Mutex};

use crate::waiter::{Waiter, WaiterSink};
use crate::{ResolveError, ResolveLocalError};

struct ValuesState<T> {
    count: usize,
    values: Vec<T>,
    error: Option<ResolveError>,
    notify: Option<WaiterSink<()>>,
}

/// Joins a fixed number of query completions into one result.
///
/// Successful values are kept in arrival order. Errors are remembered
/// (the last one wins) but only surface if no sub-query succeeded.
pub struct Values<T> {
    state: Arc<Mutex<ValuesState<T>>>,
    waiter: Waiter<()>,
}

/// Completion handle for one sub-query of a [`Values`].
///
/// Dropping it without delivering counts as a cancelled sub-query.
pub struct ValuesSink<T> {
    state: Option<Arc<Mutex<ValuesState<T>>>>,
}

impl<T> Values<T> {
    pub fn new(count: usize) -> Self {
        let (notify, waiter) = Waiter::pair();
        Values {
            state: Arc::new(Mutex::new(ValuesState {
                count,
                values: Vec::with_capacity(count),
                error: None,
                notify: Some(notify),
            })),
            waiter,
        }
    }

    /// Sink for the next sub-query. Call once per expected completion.
    pub fn sink(&self) -> ValuesSink<T> {
        ValuesSink {
            state: Some(Arc::clone(&self.state)),
        }
    }

    pub async fn get(mut self) -> Result<Vec<T>, ResolveError> {
        self.waiter.get().await?;

        let mut state = self.state.lock().unwrap();
        if !state.values.is_empty() {
            return Ok(std::mem::take(&mut state.values));
        }
        Err(state
            .error
            .take()
            .unwrap_or(ResolveLocalError::QueryCancelled.into()))
    }
}

impl<T> ValuesSink<T> {
    pub fn deliver(mut self, r: Result<T, ResolveError>) {
        if let Some(state) = self.state.take() {
            complete(&state, r);
        }
    }
}

impl<T> Drop for ValuesSink<T> {
    fn drop(&mut self) {
        if let Some(state) = self.state.take() {
            complete(&state, Err(ResolveLocalError::QueryCancelled.into()));
        }
    }
}

fn complete<T>(state: &Mutex<ValuesState<T>>, r: Result<T, ResolveError>) {
    let notify = {
        let mut state = state.lock().unwrap();
        state.count = state.count.saturating_sub(1);
        match r {
            Ok(v) => state.values.push(v),
            Err(e) => state.error = Some(e),
        }
        if state.count == 0 {
            state.notify.take()
        } else {
            None
        }
    };
    if let Some(notify) = notify {
        notify.deliver(Ok(()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ResolveServerError;

    #[tokio::test]
    async fn all_success_in_arrival_order() {
        let values = Values::<u32>::new(2);
        let first = values.sink();
        let second = values.sink();
        second.deliver(Ok(6));
        first.deliver(Ok(4));
        assert_eq!(values.get().await.unwrap(), vec![6, 4]);
    }

    #[tokio::test]
    async fn partial_failure() {
        let values = Values::<u32>::new(2);
        let a = values.sink();
        let b = values.sink();
        a.deliver(Err(ResolveServerError::NotFound.into()));
        b.deliver(Ok(1));
        assert_eq!(values.get().await.unwrap(), vec![1]);
    }

    #[tokio::test]
    async fn all_failed_last_error_wins() {
        let values = Values::<u32>::new(2);
        let a = values.sink();
        let b = values.sink();
        a.deliver(Err(ResolveServerError::NotFound.into()));
        b.deliver(Err(ResolveServerError::ServFail.into()));
        assert_eq!(
            values.get().await.unwrap_err(),
            ResolveError::FromServer(ResolveServerError::ServFail)
        );
    }

    #[tokio::test]
    async fn waits_for_every_completion() {
        let values = Values::<u32>::new(2);
        let a = values.sink();
        let b = values.sink();
        a.deliver(Ok(1));
        let task = tokio::spawn(values.get());
        tokio::task::yield_now().await;
        assert!(!task.is_finished());
        b.deliver(Err(ResolveServerError::Refused.into()));
        assert_eq!(task.await.unwrap().unwrap(), vec![1]);
    }

    #[tokio::test]
    async fn dropped_sink_counts_as_failure() {
        let values = Values::<u32>::new(2);
        let a = values.sink();
        drop(values.sink());
        a.deliver(Ok(9));
        assert_eq!(values.get().await.unwrap(), vec![9]);

        let values = Values::<u32>::new(1);
        drop(values.sink());
        assert_eq!(
            values.get().await.unwrap_err(),
            ResolveError::FromLocal(ResolveLocalError::QueryCancelled)
        );
    }
}
