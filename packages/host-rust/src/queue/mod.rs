//! Invocation queue: runs remote requests against the repository under a
//! sequential or concurrent execution policy and reports completions.
//!
//! The queue owns one background worker while running. `enqueue` never
//! blocks; requests are buffered in an unbounded channel and pulled by the
//! worker. `stop` cancels the worker, discards anything still queued and
//! returns only once the worker (and, under the concurrent policy, every
//! unit it spawned) has finished.

mod state;
mod worker;

use std::sync::Arc;

use arc_swap::ArcSwap;
use objbridge_core::{BridgeMessage, InvocationComplete, InvocationRequest};
use parking_lot::RwLock;
use tokio::runtime::Handle;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, warn};

use crate::config::QueueConfig;
use crate::repository::ObjectRepository;
use worker::Worker;

pub use state::QueueState;

// ---------------------------------------------------------------------------
// Completion handler
// ---------------------------------------------------------------------------

/// Receives the outcome of every executed request.
///
/// Called from the worker (sequential policy) or from executor tasks
/// (concurrent policy); implementations must not block for long.
pub trait InvocationCompleteHandler: Send + Sync {
    fn on_invocation_complete(&self, complete: InvocationComplete);
}

impl InvocationCompleteHandler for mpsc::UnboundedSender<InvocationComplete> {
    fn on_invocation_complete(&self, complete: InvocationComplete) {
        if self.send(complete).is_err() {
            debug!("completion receiver dropped");
        }
    }
}

pub(crate) type HandlerSlot = Arc<RwLock<Option<Arc<dyn InvocationCompleteHandler>>>>;

// ---------------------------------------------------------------------------
// InvocationQueue
// ---------------------------------------------------------------------------

struct RunningWorker {
    cancel: CancellationToken,
    handle: JoinHandle<()>,
}

struct Lifecycle {
    /// Present while stopped; taken by the worker on start.
    receiver: Option<mpsc::UnboundedReceiver<InvocationRequest>>,
    worker: Option<RunningWorker>,
}

pub struct InvocationQueue {
    repository: Arc<ObjectRepository>,
    config: QueueConfig,
    sender: ArcSwap<mpsc::UnboundedSender<InvocationRequest>>,
    lifecycle: tokio::sync::Mutex<Lifecycle>,
    status: Arc<state::QueueStatus>,
    handler: HandlerSlot,
}

impl InvocationQueue {
    /// Creates a stopped queue.
    #[must_use]
    pub fn new(repository: Arc<ObjectRepository>, config: QueueConfig) -> Self {
        let (sender, receiver) = mpsc::unbounded_channel();
        Self {
            repository,
            config,
            sender: ArcSwap::from_pointee(sender),
            lifecycle: tokio::sync::Mutex::new(Lifecycle {
                receiver: Some(receiver),
                worker: None,
            }),
            status: Arc::new(state::QueueStatus::new()),
            handler: Arc::new(RwLock::new(None)),
        }
    }

    #[must_use]
    pub fn repository(&self) -> &Arc<ObjectRepository> {
        &self.repository
    }

    pub fn set_complete_handler(&self, handler: Arc<dyn InvocationCompleteHandler>) {
        *self.handler.write() = Some(handler);
    }

    pub fn clear_complete_handler(&self) {
        *self.handler.write() = None;
    }

    #[must_use]
    pub fn state(&self) -> QueueState {
        self.status.state()
    }

    /// Units of work currently executing.
    #[must_use]
    pub fn in_flight(&self) -> u64 {
        self.status.in_flight()
    }

    /// Appends a request to the work queue without waiting for it to run.
    pub fn enqueue(&self, request: InvocationRequest) {
        if let Err(rejected) = self.sender.load().send(request) {
            debug!(
                object_id = rejected.0.object_id,
                "invocation queue is stopping; request dropped"
            );
        }
    }

    /// Starts the worker. Does nothing if it is already running.
    ///
    /// If an earlier `stop()` was dropped before the worker exited, that
    /// shutdown is completed first.
    pub async fn start(&self) {
        let mut lifecycle = self.lifecycle.lock().await;
        if let Some(worker) = &lifecycle.worker {
            if !worker.cancel.is_cancelled() {
                return;
            }
            self.finish_stop(&mut lifecycle).await;
        }
        let Some(receiver) = lifecycle.receiver.take() else {
            error!("invocation queue has no request channel; start ignored");
            return;
        };

        let cancel = CancellationToken::new();
        let worker = Worker {
            repository: Arc::clone(&self.repository),
            status: Arc::clone(&self.status),
            handler: Arc::clone(&self.handler),
            policy: self.config.policy,
            executor: self.config.executor.clone().unwrap_or_else(Handle::current),
            cancel: cancel.clone(),
        };
        let handle = tokio::spawn(worker.run(receiver));
        lifecycle.worker = Some(RunningWorker { cancel, handle });
        self.status.set(QueueState::Running);
        debug!(policy = ?self.config.policy, "invocation queue started");
    }

    /// Stops the worker and waits for it to exit. Requests still queued are
    /// discarded without a completion; requests enqueued from now on are
    /// buffered for the next start. Does nothing if already stopped.
    ///
    /// Safe to cancel: the worker handle and the fresh request channel stay
    /// in the lifecycle until the join completes, so a later `stop()` or
    /// `start()` finishes the shutdown.
    pub async fn stop(&self) {
        let mut lifecycle = self.lifecycle.lock().await;
        if lifecycle.worker.is_none() {
            return;
        }
        self.finish_stop(&mut lifecycle).await;
    }

    async fn finish_stop(&self, lifecycle: &mut Lifecycle) {
        self.status.set(QueueState::Stopping);
        if lifecycle.receiver.is_none() {
            let (sender, receiver) = mpsc::unbounded_channel();
            self.sender.store(Arc::new(sender));
            lifecycle.receiver = Some(receiver);
        }

        let Some(worker) = lifecycle.worker.as_mut() else {
            self.status.set(QueueState::Stopped);
            return;
        };
        worker.cancel.cancel();
        let joined = (&mut worker.handle).await;
        lifecycle.worker = None;
        if let Err(e) = joined {
            error!(error = %e, "invocation worker failed");
        }

        self.status.set(QueueState::Stopped);
        debug!("invocation queue stopped");
    }

    /// Handles one message from the transport, returning the reply if the
    /// message has one.
    ///
    /// `INVOKE` requests are enqueued; their outcome arrives through the
    /// completion handler.
    pub fn handle_message(&self, message: BridgeMessage) -> Option<BridgeMessage> {
        match message {
            BridgeMessage::Invoke(request) => {
                self.enqueue(request);
                None
            }
            BridgeMessage::ListObjects { names } => Some(BridgeMessage::ObjectList {
                objects: self.repository.list_objects(&names),
            }),
            BridgeMessage::ObjectsBound { objects } => {
                self.repository.notify_objects_bound(objects);
                None
            }
            BridgeMessage::InvocationComplete(_) | BridgeMessage::ObjectList { .. } => {
                warn!("ignoring host-bound message received from the remote side");
                None
            }
        }
    }
}

impl Drop for InvocationQueue {
    fn drop(&mut self) {
        if let Some(worker) = self.lifecycle.get_mut().worker.take() {
            worker.cancel.cancel();
        }
    }
}
