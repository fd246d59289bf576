/*
 * Copyright (c) 2024. Govcraft
 *
 * Licensed under either of
 *   * Apache License, Version 2.0 (the "License");
 *     you may not use this file except in compliance with the License.
 *     You may obtain a copy of the License at http://www.apache.org/licenses/LICENSE-2.0
 *   * MIT license: http://opensource.org/licenses/MIT
 *
 * Unless required by applicable law or agreed to in writing, software
 * distributed under the License is distributed on an "AS IS" BASIS,
 * WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
 * See the applicable License for the specific language governing permissions and
 * limitations under that License.
 */

use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use futures::FutureExt;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tracing::{error, trace, warn};

use crate::common::{panic_message, Job};

static NEXT_QUEUE_ID: AtomicUsize = AtomicUsize::new(1);

tokio::task_local! {
    /// Id of the queue whose worker is running the current task.
    static CURRENT_QUEUE: usize;
}

/// Runs a hub's jobs one at a time, in submission order.
///
/// Jobs go into an unbounded channel drained by a single worker task.
/// [`flush`](Self::flush) swaps in a fresh channel and installs its successor
/// worker right away; the successor first waits for the old worker to finish
/// everything queued so far, signals the flush, then drains the new channel.
/// The worker slot doubles as the gate that serializes concurrent flushes.
pub(crate) struct ExecutionQueue {
    id: usize,
    sender: parking_lot::Mutex<Option<UnboundedSender<Job>>>,
    worker: tokio::sync::Mutex<Option<JoinHandle<()>>>,
    needs_flush: AtomicBool,
    scheduled: AtomicBool,
}

impl ExecutionQueue {
    /// Creates the queue and spawns its worker. Must be called within a Tokio runtime.
    pub(crate) fn new() -> Self {
        let id = NEXT_QUEUE_ID.fetch_add(1, Ordering::Relaxed);
        let (sender, receiver) = mpsc::unbounded_channel();
        Self {
            id,
            sender: parking_lot::Mutex::new(Some(sender)),
            worker: tokio::sync::Mutex::new(Some(spawn_worker(id, None, None, receiver))),
            needs_flush: AtomicBool::new(false),
            scheduled: AtomicBool::new(false),
        }
    }

    /// Enqueues `job` without waiting. Returns `false` once the queue is closed.
    pub(crate) fn schedule<F>(&self, job: F) -> bool
    where
        F: Future<Output = anyhow::Result<()>> + Send + 'static,
    {
        let guard = self.sender.lock();
        let Some(sender) = guard.as_ref() else {
            warn!(queue = self.id, "Execution queue is closed, dropping job");
            return false;
        };
        self.needs_flush.store(true, Ordering::Release);
        self.scheduled.store(true, Ordering::Release);
        sender.send(Box::pin(job)).is_ok()
    }

    #[inline]
    pub(crate) fn id(&self) -> usize {
        self.id
    }

    /// Whether the current task is one of this queue's jobs.
    pub(crate) fn is_current(&self) -> bool {
        CURRENT_QUEUE
            .try_with(|current| *current == self.id)
            .unwrap_or(false)
    }

    pub(crate) fn is_closed(&self) -> bool {
        self.sender.lock().is_none()
    }

    /// Waits until every job scheduled before the call has run.
    ///
    /// Returns whether new work was scheduled while flushing, so callers can
    /// loop until the queue is quiescent. Called from one of this queue's own
    /// jobs it returns `false` immediately. Dropping the future early leaves
    /// the queue running.
    pub(crate) async fn flush(&self) -> bool {
        if self.is_current() {
            trace!(queue = self.id, "Flush requested from within the queue, skipping");
            return false;
        }

        let mut worker = self.worker.lock().await;
        self.needs_flush.store(false, Ordering::Release);

        let (sender, receiver) = mpsc::unbounded_channel();
        let previous = {
            let mut slot = self.sender.lock();
            if slot.is_none() {
                return false;
            }
            slot.replace(sender)
        };
        drop(previous);

        let (drained, signal) = oneshot::channel();
        *worker = Some(spawn_worker(self.id, worker.take(), Some(drained), receiver));
        if signal.await.is_err() {
            warn!(queue = self.id, "Execution queue worker stopped before draining");
        }

        self.needs_flush.load(Ordering::Acquire)
    }

    /// Flushes and reports whether any job was scheduled since the previous
    /// settle, including jobs the flush itself drained.
    pub(crate) async fn settle(&self) -> bool {
        let scheduled = self.scheduled.swap(false, Ordering::AcqRel);
        let more = self.flush().await;
        scheduled || more
    }

    /// Stops accepting jobs and waits for the queued ones to finish.
    pub(crate) async fn close(&self) {
        if self.is_current() {
            warn!(queue = self.id, "Close requested from within the queue, skipping");
            return;
        }

        let mut worker = self.worker.lock().await;
        drop(self.sender.lock().take());
        if let Some(handle) = worker.take() {
            if let Err(e) = handle.await {
                error!(queue = self.id, "Execution queue worker failed: {}", e);
            }
        }
        trace!(queue = self.id, "Execution queue closed");
    }
}

/// Spawns a worker that takes over from `previous` once it has finished.
fn spawn_worker(
    id: usize,
    previous: Option<JoinHandle<()>>,
    drained: Option<oneshot::Sender<()>>,
    mut receiver: UnboundedReceiver<Job>,
) -> JoinHandle<()> {
    tokio::spawn(CURRENT_QUEUE.scope(id, async move {
        if let Some(previous) = previous {
            if let Err(e) = previous.await {
                error!(queue = id, "Execution queue worker failed: {}", e);
            }
        }
        if let Some(drained) = drained {
            let _ = drained.send(());
        }
        while let Some(job) = receiver.recv().await {
            match AssertUnwindSafe(job).catch_unwind().await {
                Ok(Ok(())) => {}
                Ok(Err(e)) => error!(queue = id, "Scheduled job failed: {:#}", e),
                Err(panic) => error!(
                    queue = id,
                    "Scheduled job panicked: {}",
                    panic_message(panic.as_ref())
                ),
            }
        }
        trace!(queue = id, "Execution queue worker drained");
    }))
}
