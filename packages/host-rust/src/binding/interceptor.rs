//! Call interception around method thunks.

use std::sync::Arc;

use async_trait::async_trait;

use crate::reflect::{CallFuture, HostObject, HostValue, Invoker};

/// Continuation that performs the real method call.
pub struct Proceed {
    call: Box<dyn FnOnce(Vec<HostValue>) -> CallFuture + Send>,
}

impl Proceed {
    pub(crate) fn new(invoker: Invoker, target: Arc<dyn HostObject>) -> Self {
        Self {
            call: Box::new(move |args| invoker(target, args)),
        }
    }

    /// Runs the intercepted method with (possibly rewritten) arguments.
    ///
    /// # Errors
    ///
    /// Returns the method's own error.
    pub async fn run(self, args: Vec<HostValue>) -> anyhow::Result<HostValue> {
        (self.call)(args).await
    }
}

/// Wraps every method call made on objects registered with it.
///
/// The interceptor decides whether, how and with which arguments the real
/// call happens; it may also rewrite the result.
#[async_trait]
pub trait MethodInterceptor: Send + Sync {
    async fn intercept(
        &self,
        method_name: &str,
        args: Vec<HostValue>,
        proceed: Proceed,
    ) -> anyhow::Result<HostValue>;
}
