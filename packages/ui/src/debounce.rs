//! Delay-and-collapse for save callbacks.
//!
//! [`Debouncer::call`] (re)starts a timer; only the value from the last call
//! before a full quiet period reaches the action. Earlier values are dropped,
//! never merged. Once the timer fires the action runs on its own task, so
//! [`Debouncer::cancel`] can stop a pending call but not one already running.

use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::task::JoinHandle;

type Action<T> = Arc<dyn Fn(T) -> Pin<Box<dyn Future<Output = ()> + Send>> + Send + Sync>;

pub struct Debouncer<T> {
    delay: Duration,
    action: Action<T>,
    pending: Mutex<Option<JoinHandle<()>>>,
}

impl<T: Send + 'static> Debouncer<T> {
    pub fn new<F, Fut>(delay: Duration, action: F) -> Self
    where
        F: Fn(T) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        Self {
            delay,
            action: Arc::new(move |value| Box::pin(action(value))),
            pending: Mutex::new(None),
        }
    }

    /// Schedule `value`, superseding whatever was pending.
    pub fn call(&self, value: T) {
        let mut pending = self.pending.lock().unwrap();
        if let Some(timer) = pending.take() {
            timer.abort();
        }
        let action = Arc::clone(&self.action);
        let delay = self.delay;
        *pending = Some(tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            tokio::spawn(action(value));
        }));
    }

    /// Drop the pending call, if any. Returns whether one was dropped.
    pub fn cancel(&self) -> bool {
        match self.pending.lock().unwrap().take() {
            Some(timer) if !timer.is_finished() => {
                timer.abort();
                true
            }
            _ => false,
        }
    }

    /// Whether a call is waiting for its quiet period to end.
    pub fn is_pending(&self) -> bool {
        self.pending
            .lock()
            .unwrap()
            .as_ref()
            .is_some_and(|timer| !timer.is_finished())
    }
}

impl<T> Drop for Debouncer<T> {
    fn drop(&mut self) {
        let pending = match self.pending.get_mut() {
            Ok(pending) => pending.take(),
            Err(poisoned) => poisoned.into_inner().take(),
        };
        if let Some(timer) = pending {
            timer.abort();
        }
    }
}
