//! Periodic retry sweeper.
//!
//! A single thread wakes on a fixed interval and re-runs `retry_all()`. The
//! loop processes one pass at a time, so sweeps from this scheduler never
//! overlap; a concurrent manual `retry_all()` is covered by the dispatcher's
//! per-record locks.

use std::sync::mpsc::{self, RecvTimeoutError};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use tracing::info;

use crate::dispatcher::NotificationDispatcher;

/// Handle to control a running sweeper.
#[derive(Debug)]
pub struct RetrySweeperHandle {
    shutdown: mpsc::Sender<()>,
    join: Option<thread::JoinHandle<()>>,
}

impl RetrySweeperHandle {
    /// Request graceful shutdown and wait for the current pass to finish.
    pub fn shutdown(mut self) {
        let _ = self.shutdown.send(());
        if let Some(join) = self.join.take() {
            let _ = join.join();
        }
    }
}

/// Time-driven retry scan.
pub struct RetrySweeper;

impl RetrySweeper {
    pub fn spawn(dispatcher: Arc<NotificationDispatcher>, interval: Duration) -> RetrySweeperHandle {
        let (shutdown_tx, shutdown_rx) = mpsc::channel::<()>();

        let join = thread::Builder::new()
            .name("retry-sweeper".to_string())
            .spawn(move || {
                info!(interval_secs = interval.as_secs(), "retry sweeper started");
                loop {
                    match shutdown_rx.recv_timeout(interval) {
                        Ok(()) | Err(RecvTimeoutError::Disconnected) => break,
                        Err(RecvTimeoutError::Timeout) => {
                            let retried = dispatcher.retry_all();
                            if retried > 0 {
                                info!(retried, "sweep pass finished");
                            }
                        }
                    }
                }
                info!("retry sweeper stopped");
            })
            .expect("failed to spawn retry sweeper thread");

        RetrySweeperHandle {
            shutdown: shutdown_tx,
            join: Some(join),
        }
    }
}
