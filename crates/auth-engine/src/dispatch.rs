//! UI-thread marshaling.
//!
//! Provider acquisition has to run on the thread that owns the presentation
//! surface, and completions have to come back to it before they touch
//! UI-visible state. The host supplies a [`MainThread`] implementation; the
//! engine never blocks it.

use parking_lot::Mutex;
use std::sync::Arc;
use std::thread::{self, ThreadId};
use tokio::sync::mpsc;
use tracing::warn;

/// A unit of work to run on the UI-owning thread.
pub type MainTask = Box<dyn FnOnce() + Send + 'static>;

/// Handle to the UI-owning thread.
pub trait MainThread: Send + Sync {
    /// Schedule `task` on the UI thread. Never runs it synchronously from
    /// another thread.
    fn dispatch(&self, task: MainTask);

    /// Whether the caller is already on the UI thread.
    fn is_current(&self) -> bool;
}

/// Runs every task immediately on the calling thread.
///
/// For hosts without a UI thread (CLI, tests).
#[derive(Debug, Default, Clone, Copy)]
pub struct InlineDispatcher;

impl MainThread for InlineDispatcher {
    fn dispatch(&self, task: MainTask) {
        task();
    }

    fn is_current(&self) -> bool {
        true
    }
}

/// Task queue owned by one thread and drained by that thread's event loop.
///
/// Created on the UI thread; any thread may dispatch into it.
pub struct MainQueue {
    owner: ThreadId,
    sender: mpsc::UnboundedSender<MainTask>,
    receiver: tokio::sync::Mutex<mpsc::UnboundedReceiver<MainTask>>,
    drained: Mutex<u64>,
}

impl MainQueue {
    /// Create a queue owned by the calling thread.
    pub fn new() -> Arc<Self> {
        let (sender, receiver) = mpsc::unbounded_channel();
        Arc::new(Self {
            owner: thread::current().id(),
            sender,
            receiver: tokio::sync::Mutex::new(receiver),
            drained: Mutex::new(0),
        })
    }

    pub fn owner(&self) -> ThreadId {
        self.owner
    }

    /// Run every task queued so far. Must be called on the owner thread.
    ///
    /// Returns the number of tasks run.
    pub fn run_pending(&self) -> usize {
        if !self.is_current() {
            warn!("MainQueue drained from a foreign thread, ignoring");
            return 0;
        }

        let mut ran = 0;
        loop {
            // Pop one task at a time so a task may dispatch more work.
            let next = match self.receiver.try_lock() {
                Ok(mut receiver) => receiver.try_recv().ok(),
                Err(_) => None,
            };
            match next {
                Some(task) => {
                    task();
                    ran += 1;
                }
                None => break,
            }
        }

        *self.drained.lock() += ran as u64;
        ran
    }

    /// Wait for the next task and run it. Must be awaited on the owner thread.
    ///
    /// Returns `false` if the queue is closed.
    pub async fn run_next(&self) -> bool {
        let task = self.receiver.lock().await.recv().await;
        match task {
            Some(task) => {
                task();
                *self.drained.lock() += 1;
                true
            }
            None => false,
        }
    }

    /// Total number of tasks run so far.
    pub fn drained(&self) -> u64 {
        *self.drained.lock()
    }
}

impl MainThread for MainQueue {
    fn dispatch(&self, task: MainTask) {
        if self.sender.send(task).is_err() {
            warn!("MainQueue closed, dropping task");
        }
    }

    fn is_current(&self) -> bool {
        thread::current().id() == self.owner
    }
}

impl std::fmt::Debug for MainQueue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MainQueue")
            .field("owner", &self.owner)
            .field("drained", &self.drained())
            .finish()
    }
}

/// Run `task` on the UI thread: inline when already there, dispatched otherwise.
pub(crate) fn run_on_main(main: &Arc<dyn MainThread>, task: MainTask) {
    if main.is_current() {
        task();
    } else {
        main.dispatch(task);
    }
}
