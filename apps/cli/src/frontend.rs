//! Synchronous adapter over the async rewrite pipeline.

use color_eyre::eyre::{Result, WrapErr};
use tokio::runtime::{Builder, Runtime};
use tracing::debug;

use seoscribe_core::{RewriteOutcome, RewriteProgress, RewriteRequest, Rewriter};

/// Owns a tokio runtime and drives one [`Rewriter`] call at a time.
///
/// Ctrl-C cancels the call in flight; the knowledge store survives it.
pub(crate) struct BlockingRewriter {
    runtime: Runtime,
    rewriter: Rewriter,
}

impl BlockingRewriter {
    pub(crate) fn new(rewriter: Rewriter) -> Result<Self> {
        let runtime = Builder::new_multi_thread()
            .enable_all()
            .build()
            .wrap_err("failed to start async runtime")?;
        Ok(Self { runtime, rewriter })
    }

    /// Run one request and return the text to show the user.
    pub(crate) fn rewrite(
        &self,
        request: &RewriteRequest,
        progress: &dyn RewriteProgress,
    ) -> Result<String> {
        let outcome: RewriteOutcome = self
            .runtime
            .block_on(self.rewriter.rewrite_until(request, progress, interrupted()))?;
        Ok(outcome.message().to_string())
    }

    pub(crate) fn rewriter(&self) -> &Rewriter {
        &self.rewriter
    }

    /// Block on an arbitrary future using the owned runtime.
    pub(crate) fn block_on<F: std::future::Future>(&self, fut: F) -> F::Output {
        self.runtime.block_on(fut)
    }
}

/// Resolves on Ctrl-C. Never resolves if the handler cannot be installed.
async fn interrupted() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        debug!(error = %e, "ctrl-c handler unavailable");
        std::future::pending::<()>().await;
    }
}
