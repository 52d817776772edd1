//! Messages sent from flight window tasks back to the aggregator.
//!
//! Each window task owns a clone of the sender and reports exactly once. The
//! aggregator holds the only receiver and is the only place results are
//! merged, so no list or error slot is ever shared between tasks.

use crate::error::{Error, Result};
use crate::models::Flight;
use crate::span::Window;
use std::future::Future;
use tokio::sync::mpsc;

/// Outcome of one window query.
#[derive(Debug)]
pub enum WindowEvent {
    /// The window answered; `flights` is everything it returned, unfiltered.
    Completed { window: Window, flights: Vec<Flight> },
    /// The window query failed.
    Failed { window: Window, error: Error },
}

impl WindowEvent {
    pub fn new(window: Window, result: Result<Vec<Flight>>) -> Self {
        match result {
            Ok(flights) => WindowEvent::Completed { window, flights },
            Err(error) => WindowEvent::Failed { window, error },
        }
    }
}

/// Runs window queries as tasks and funnels their outcomes into one stream.
///
/// Holds an unbounded channel: every [`spawn`](WindowEvents::spawn)ed task gets
/// a clone of the sender, while the receiver is consumed by
/// [`drain`](WindowEvents::drain).
pub struct WindowEvents {
    tx: mpsc::UnboundedSender<WindowEvent>,
    rx: mpsc::UnboundedReceiver<WindowEvent>,
}

impl Default for WindowEvents {
    fn default() -> Self {
        Self::new()
    }
}

impl WindowEvents {
    pub fn new() -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        Self { tx, rx }
    }

    /// Starts `query` on the runtime; its result is reported as a
    /// [`WindowEvent`] for `window` once it finishes.
    pub fn spawn<F>(&self, window: Window, query: F)
    where
        F: Future<Output = Result<Vec<Flight>>> + Send + 'static,
    {
        let tx = self.tx.clone();
        tokio::spawn(async move {
            let result = query.await;
            tx.send(WindowEvent::new(window, result)).ok();
        });
    }

    /// Hands every event to `on_event` in arrival order and returns once all
    /// spawned tasks have finished. A task that panics simply never reports.
    pub async fn drain(self, mut on_event: impl FnMut(WindowEvent)) {
        let Self { tx, mut rx } = self;
        drop(tx);
        while let Some(event) = rx.recv().await {
            on_event(event);
        }
    }
}
