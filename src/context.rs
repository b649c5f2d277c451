use std::fmt::Display;
use std::sync::Arc;

use crate::environment::Environment;
use crate::logging::{Logger, LogSink, StdoutSink, Verbosity};
use crate::options;
use crate::stats::{ProcStatsProvider, StatsProvider};

/// Capability bundle handed to worker code: the configured logging facade
/// plus read access to the environment. Immutable after construction;
/// clones are cheap and share both.
#[derive(Clone)]
pub struct Context {
    logger: Logger,
    env: Arc<Environment>,
}

impl Context {
    /// Build a context from the live process: real arguments, stdout
    /// logging, OS-backed stats
    #[must_use]
    pub fn build() -> Self {
        ContextBuilder::new().build()
    }

    /// Start configuring a context with substituted collaborators
    #[must_use]
    pub fn builder() -> ContextBuilder {
        ContextBuilder::new()
    }

    pub fn debug<M: Display>(&self, message: M) {
        self.logger.debug(message);
    }

    pub fn info<M: Display>(&self, message: M) {
        self.logger.info(message);
    }

    pub fn error<M: Display>(&self, message: M) {
        self.logger.error(message);
    }

    /// The shared environment
    #[must_use]
    pub fn env(&self) -> &Arc<Environment> {
        &self.env
    }

    /// The configured logging facade, for components that only log
    #[must_use]
    pub const fn logger(&self) -> &Logger {
        &self.logger
    }
}

impl std::fmt::Debug for Context {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Context")
            .field("logger", &self.logger)
            .field("env", &self.env)
            .finish()
    }
}

/// Chooses the argument source, log sink, and stats provider for a
/// context. Every knob has a production default; substitution exists for
/// tests and embedders.
#[derive(Default)]
pub struct ContextBuilder {
    argv: Option<Vec<String>>,
    sink: Option<Arc<dyn LogSink>>,
    provider: Option<Arc<dyn StatsProvider>>,
}

impl ContextBuilder {
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
        self.argv = Some(argv.into_iter().map(Into::into).collect());
        self
    }

    /// Write log lines to the given sink instead of standard output
    #[must_use]
    pub fn sink(mut self, sink: Arc<dyn LogSink>) -> Self {
        self.sink = Some(sink);
        self
    }

    /// Sample runtime stats from the given provider instead of the OS
    #[must_use]
    pub fn stats_provider(mut self, provider: Arc<dyn StatsProvider>) -> Self {
        self.provider = Some(provider);
        self
    }

    /// Parse the arguments, derive the verbosity, assemble the
    /// environment, and emit the startup notices. No failure mode.
    #[must_use]
    pub fn build(self) -> Context {
        let argv = self
            .argv
            .unwrap_or_else(|| std::env::args().skip(1).collect());
        let (args, options) = options::parse(argv);

        let verbosity = Verbosity::from_options(&options);
        let sink = self.sink.unwrap_or_else(|| Arc::new(StdoutSink));
        let logger = Logger::new(verbosity, sink);

        let provider = self
            .provider
            .unwrap_or_else(|| Arc::new(ProcStatsProvider));
        let env = Arc::new(Environment::new(args, options, provider));

        let ctx = Context { logger, env };
        ctx.info("Starting worker");
        ctx.info(format!("Running on PID {}", ctx.env().pid()));
        ctx
    }
}

impl std::fmt::Debug for ContextBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ContextBuilder")
            .field("argv", &self.argv)
            .field("custom_sink", &self.sink.is_some())
            .field("custom_provider", &self.provider.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logging::BufferSink;

    #[test]
    fn test_build_parses_scenario_arguments() {
        let ctx = Context::builder()
            .argv(["--verbose", "--name=worker1", "start"])
            .sink(BufferSink::new())
            .build();

        let env = ctx.env();
        assert_eq!(env.args(), ["start"]);
        assert_eq!(env.options().get("verbose"), Some(""));
        assert_eq!(env.options().get("name"), Some("worker1"));
        assert_eq!(ctx.logger().verbosity(), Verbosity::Verbose);
    }

    #[test]
    fn test_build_emits_startup_notices() {
        let sink = BufferSink::new();
        let ctx = Context::builder()
            .argv(Vec::<String>::new())
            .sink(sink.clone())
            .build();

        let lines = sink.lines();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].ends_with("Starting worker"));
        assert!(lines[1].ends_with(&format!("Running on PID {}", ctx.env().pid())));
    }

    #[test]
    fn test_quiet_build_emits_nothing() {
        let sink = BufferSink::new();
        let ctx = Context::builder()
            .argv(["--quiet", "--verbose"])
            .sink(sink.clone())
            .build();

        ctx.debug("hidden");
        ctx.info("hidden");
        assert!(sink.lines().is_empty());

        ctx.error("shown");
        assert_eq!(sink.lines().len(), 1);
    }

    #[test]
    fn test_context_identity_fields() {
        let ctx = Context::builder()
            .argv(Vec::<String>::new())
            .sink(BufferSink::new())
            .build();

        assert_eq!(ctx.env().pid(), std::process::id());
        assert!(ctx.env().uptime() < std::time::Duration::from_secs(60));
    }
}
