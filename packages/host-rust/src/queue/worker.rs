//! The queue's background worker and its unit of work.

use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use futures_util::FutureExt;
use objbridge_core::{InvocationComplete, InvocationKind, InvocationRequest, InvocationResult};
use tokio::runtime::Handle;
use tokio::sync::mpsc;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{debug, debug_span, error, Instrument};

use super::state::QueueStatus;
use super::HandlerSlot;
use crate::config::ExecutionPolicy;
use crate::reflect::HostValue;
use crate::repository::{ObjectRepository, RegistryError};

/// Everything the worker loop needs, moved into its task.
pub(super) struct Worker {
    pub(super) repository: Arc<ObjectRepository>,
    pub(super) status: Arc<QueueStatus>,
    pub(super) handler: HandlerSlot,
    pub(super) policy: ExecutionPolicy,
    pub(super) executor: Handle,
    pub(super) cancel: CancellationToken,
}

impl Worker {
    /// Pulls requests until cancelled, then discards whatever is still
    /// queued and waits for units handed to the executor.
    pub(super) async fn run(self, mut receiver: mpsc::UnboundedReceiver<InvocationRequest>) {
        let mut spawned = JoinSet::new();
        loop {
            tokio::select! {
                biased;
                () = self.cancel.cancelled() => break,
                Some(joined) = spawned.join_next(), if !spawned.is_empty() => {
                    log_join_error(joined);
                }
                next = receiver.recv() => {
                    let Some(request) = next else { break };
                    match self.policy {
                        ExecutionPolicy::Sequential => {
                            let complete = execute(&self.repository, &self.status, request).await;
                            emit(&self.handler, complete);
                        }
                        ExecutionPolicy::Concurrent => {
                            let repository = Arc::clone(&self.repository);
                            let status = Arc::clone(&self.status);
                            let handler = Arc::clone(&self.handler);
                            spawned.spawn_on(
                                async move {
                                    let complete = execute(&repository, &status, request).await;
                                    emit(&handler, complete);
                                },
                                &self.executor,
                            );
                        }
                    }
                }
            }
        }

        receiver.close();
        let mut discarded = 0_usize;
        while receiver.try_recv().is_ok() {
            discarded += 1;
        }
        if discarded > 0 {
            debug!(discarded, "discarded queued invocations on stop");
        }
        while let Some(joined) = spawned.join_next().await {
            log_join_error(joined);
        }
    }
}

fn log_join_error(joined: Result<(), tokio::task::JoinError>) {
    if let Err(e) = joined {
        error!(error = %e, "invocation task failed");
    }
}

fn emit(handler: &HandlerSlot, complete: InvocationComplete) {
    let handler = handler.read().clone();
    match handler {
        Some(handler) => handler.on_invocation_complete(complete),
        None => debug!(
            object_id = complete.object_id,
            member = %complete.member,
            "no completion handler; result dropped"
        ),
    }
}

/// Runs one request against the repository. Never panics and never fails:
/// hard faults and panics become failed results.
pub(crate) async fn execute(
    repository: &ObjectRepository,
    status: &QueueStatus,
    request: InvocationRequest,
) -> InvocationComplete {
    let _guard = status.in_flight_guard();
    let InvocationRequest {
        object_id,
        kind,
        routing,
    } = request;
    let member = kind.member_name().to_string();
    let span = debug_span!("invocation", object_id, member = %member);

    let outcome = AssertUnwindSafe(dispatch(repository, object_id, kind).instrument(span))
        .catch_unwind()
        .await;
    let result = match outcome {
        Ok(Ok(result)) => result,
        Ok(Err(fault)) => {
            error!(
                object_id,
                member = %member,
                desync = fault.is_desync(),
                error = %fault,
                "invocation hard fault"
            );
            InvocationResult::failure(fault.to_string())
        }
        Err(payload) => {
            let message = panic_message(payload.as_ref());
            error!(object_id, member = %member, panic = %message, "invocation panicked");
            InvocationResult::failure(message)
        }
    };

    InvocationComplete {
        routing,
        object_id,
        member,
        result,
    }
}

async fn dispatch(
    repository: &ObjectRepository,
    object_id: i64,
    kind: InvocationKind,
) -> Result<InvocationResult, RegistryError> {
    match kind {
        InvocationKind::CallMethod { method, args } => {
            let args = args.into_iter().map(HostValue::from).collect();
            repository.call_method(object_id, &method, args).await
        }
        InvocationKind::GetProperty { property } => repository.get_property(object_id, &property),
        InvocationKind::SetProperty { property, value } => {
            repository.set_property(object_id, &property, HostValue::from(value))
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "invocation panicked".to_string()
    }
}
