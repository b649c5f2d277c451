use std::future::Future;
use std::sync::Arc;
use tracing::instrument;

use crate::context::{Context, ContextBuilder};
use crate::environment;
use crate::logging::LogSink;
use crate::service::signals::{self, ControlEvent};
use crate::stats::StatsProvider;
use crate::Result;

/// Lifecycle driver with substitutable collaborators.
///
/// The free functions in this module cover the common case; `Worker` is
/// the construction seam for embedders and tests that need to inject the
/// argument source, log sink, or stats provider.
#[derive(Debug, Default)]
pub struct Worker {
    builder: ContextBuilder,
}

impl Worker {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Use the given tokens instead of the process arguments
    #[must_use]
    pub fn argv<I, T>(mut self, argv: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        self.builder = self.builder.argv(argv);
        self
    }

    /// Write log lines to the given sink instead of standard output
    #[must_use]
    pub fn sink(mut self, sink: Arc<dyn LogSink>) -> Self {
        self.builder = self.builder.sink(sink);
        self
    }

    /// Sample runtime stats from the given provider instead of the OS
    #[must_use]
    pub fn stats_provider(mut self, provider: Arc<dyn StatsProvider>) -> Self {
        self.builder = self.builder.stats_provider(provider);
        self
    }

    /// Base entry point: run the work function with a live context.
    ///
    /// Builds the context, starts the stats sampler and the signal
    /// router, then invokes `work`. When `blocking`, the work function
    /// runs inline and its result is returned; otherwise it is spawned
    /// detached and its outcome is unobserved by contract.
    pub async fn start_ctx<F, Fut>(self, work: F, blocking: bool) -> Result<()>
    where
        F: FnOnce(Context) -> Fut + Send + 'static,
        Fut: Future<Output = Result<()>> + Send + 'static,
    {
        run(self.builder.build(), work, blocking).await
    }

    /// Run a work function that only consumes the control-event channel
    pub async fn start<F, Fut>(self, work: F, blocking: bool) -> Result<()>
    where
        F: FnOnce(flume::Receiver<ControlEvent>) -> Fut + Send + 'static,
        Fut: Future<Output = Result<()>> + Send + 'static,
    {
        self.start_ctx(move |ctx| work(ctx.env().events().clone()), blocking)
            .await
    }

    /// Run a no-argument work function to completion, always blocking
    pub async fn exec<F, Fut>(self, work: F) -> Result<()>
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = Result<()>> + Send + 'static,
    {
        self.start_ctx(move |_ctx| work(), true).await
    }

    /// Invoke a work function repeatedly until it returns an error.
    ///
    /// The control-event channel is drained in the background and no
    /// action is taken on any event, including Shutdown; the loop stops
    /// only when the work function errors.
    pub async fn run_loop<F, Fut>(self, work: F, blocking: bool) -> Result<()>
    where
        F: FnMut() -> Fut + Send + 'static,
        Fut: Future<Output = Result<()>> + Send + 'static,
    {
        self.start_ctx(move |ctx| drive_loop(ctx, work), blocking)
            .await
    }
}

/// Start a worker with a live context. See [`Worker::start_ctx`].
pub async fn start_ctx<F, Fut>(work: F, blocking: bool) -> Result<()>
where
    F: FnOnce(Context) -> Fut + Send + 'static,
    Fut: Future<Output = Result<()>> + Send + 'static,
{
    Worker::new().start_ctx(work, blocking).await
}

/// Start a worker that reads the control-event channel. See
/// [`Worker::start`].
pub async fn start<F, Fut>(work: F, blocking: bool) -> Result<()>
where
    F: FnOnce(flume::Receiver<ControlEvent>) -> Fut + Send + 'static,
    Fut: Future<Output = Result<()>> + Send + 'static,
{
    Worker::new().start(work, blocking).await
}

/// Run a worker to completion in blocking mode. See [`Worker::exec`].
pub async fn exec<F, Fut>(work: F) -> Result<()>
where
    F: FnOnce() -> Fut + Send + 'static,
    Fut: Future<Output = Result<()>> + Send + 'static,
{
    Worker::new().exec(work).await
}

/// Run a worker function in a loop until it errors. See
/// [`Worker::run_loop`].
pub async fn run_loop<F, Fut>(work: F, blocking: bool) -> Result<()>
where
    F: FnMut() -> Fut + Send + 'static,
    Fut: Future<Output = Result<()>> + Send + 'static,
{
    Worker::new().run_loop(work, blocking).await
}

/// The single underlying driver every entry point funnels through
#[instrument(skip(ctx, work))]
async fn run<F, Fut>(ctx: Context, work: F, blocking: bool) -> Result<()>
where
    F: FnOnce(Context) -> Fut + Send + 'static,
    Fut: Future<Output = Result<()>> + Send + 'static,
{
    environment::spawn_sampler(ctx.env().clone());
    signals::spawn_router(ctx.clone())?;

    if blocking {
        ctx.info("Starting worker in blocking mode");
        match work(ctx.clone()).await {
            Ok(()) => {
                ctx.info("Worker done without errors");
                Ok(())
            }
            Err(err) => {
                ctx.error(format!("Worker done with error {err}"));
                Err(err)
            }
        }
    } else {
        // Fire and forget: the outcome is discarded by contract. Callers
        // that need the result use the blocking form.
        tokio::spawn(async move {
            let _ = work(ctx).await;
        });
        Ok(())
    }
}

async fn drive_loop<F, Fut>(ctx: Context, mut work: F) -> Result<()>
where
    F: FnMut() -> Fut + Send + 'static,
    Fut: Future<Output = Result<()>> + Send + 'static,
{
    let events = ctx.env().events().clone();
    tokio::spawn(async move {
        while let Ok(event) = events.recv_async().await {
            // Events are advisory in loop mode, Shutdown included; the
            // loop terminates only through the work function's error.
            // Embedders that want signal-driven termination read the
            // channel themselves via `start`.
            let _ = event;
        }
    });

    loop {
        if let Err(err) = work().await {
            return Err(err);
        }
    }
}
