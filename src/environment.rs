use std::sync::Arc;
use std::time::{Duration, Instant, SystemTime};
use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use tracing::debug;

use crate::logging::Logger;
use crate::options::Options;
use crate::service::signals::ControlEvent;
use crate::stats::{RuntimeStats, StatsProvider};

/// Interval between runtime stat refreshes
pub const SAMPLE_INTERVAL: Duration = Duration::from_secs(1);

/// Shared snapshot of the process's observable state: identity, parsed
/// inputs, the control-event channel, and the periodically refreshed
/// runtime stats block.
///
/// Created once per lifecycle invocation and shared behind an `Arc` with
/// the signal router, the sampler, and worker code. Identity and parsed
/// inputs are immutable after construction; only the stats block mutates,
/// and only under its lock.
pub struct Environment {
    pid: u32,
    host: Option<String>,
    started_at: SystemTime,
    started: Instant,
    args: Vec<String>,
    options: Options,
    events_tx: flume::Sender<ControlEvent>,
    events_rx: flume::Receiver<ControlEvent>,
    stats: RwLock<RuntimeStats>,
    provider: Arc<dyn StatsProvider>,
}

impl Environment {
    pub(crate) fn new(args: Vec<String>, options: Options, provider: Arc<dyn StatsProvider>) -> Self {
        // Capacity 1: a slow consumer throttles the producer instead of
        // growing a queue; events are never dropped.
        let (events_tx, events_rx) = flume::bounded(1);

        let host = nix::unistd::gethostname()
            .ok()
            .and_then(|name| name.into_string().ok());

        Self {
            pid: std::process::id(),
            host,
            started_at: SystemTime::now(),
            started: Instant::now(),
            args,
            options,
            events_tx,
            events_rx,
            stats: RwLock::new(RuntimeStats::default()),
            provider,
        }
    }

    /// Process id, set once at construction
    #[must_use]
    pub const fn pid(&self) -> u32 {
        self.pid
    }

    /// Host name, best-effort
    #[must_use]
    pub fn host(&self) -> Option<&str> {
        self.host.as_deref()
    }

    /// Wall-clock construction timestamp
    #[must_use]
    pub const fn started_at(&self) -> SystemTime {
        self.started_at
    }

    /// Positional arguments, input order preserved
    #[must_use]
    pub fn args(&self) -> &[String] {
        &self.args
    }

    /// Parsed command-line options
    #[must_use]
    pub const fn options(&self) -> &Options {
        &self.options
    }

    /// Elapsed time since construction; monotonically non-decreasing
    #[must_use]
    pub fn uptime(&self) -> Duration {
        self.started.elapsed()
    }

    /// Receiving side of the control-event channel.
    ///
    /// Clones share the queue: each published event is delivered to
    /// exactly one receiver.
    #[must_use]
    pub const fn events(&self) -> &flume::Receiver<ControlEvent> {
        &self.events_rx
    }

    /// Overwrite the stats block with a fresh provider sample
    pub async fn refresh_stats(&self) {
        let sample = self.provider.sample();
        let mut stats = self.stats.write().await;
        *stats = sample;
    }

    /// Whole-block copy of the current stats, taken under the lock so a
    /// concurrent refresh can never produce a torn read
    pub async fn stats(&self) -> RuntimeStats {
        *self.stats.read().await
    }

    /// Emit the fixed human-readable summary through the supplied logging
    /// capability
    pub async fn describe(&self, logger: &Logger) {
        let stats = self.stats().await;
        logger.info(format!(
            "Meta: [Pid: {}][Threads: {}][Uptime: {} s][Host: {}]",
            self.pid,
            stats.threads,
            self.uptime().as_secs(),
            self.host.as_deref().unwrap_or("unknown"),
        ));
        logger.info(format!(
            "Mem: [Resident: {}][Peak: {}][Virtual: {}][Data: {}]",
            stats.memory.resident_bytes,
            stats.memory.peak_resident_bytes,
            stats.memory.virtual_bytes,
            stats.memory.data_bytes,
        ));
    }

    /// Publish a control event, waiting while the single channel slot is
    /// occupied. The environment owns a receiver for its whole life, so
    /// the channel cannot disconnect.
    pub(crate) async fn publish(&self, event: ControlEvent) {
        let _ = self.events_tx.send_async(event).await;
    }
}

impl std::fmt::Debug for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Environment")
            .field("pid", &self.pid)
            .field("host", &self.host)
            .field("args", &self.args)
            .field("options", &self.options)
            .field("pending_events", &self.events_rx.len())
            .finish()
    }
}

/// Refresh the stats block once per interval for the life of the process.
/// Never cancelled or joined; the task ends at process exit.
pub(crate) fn spawn_sampler(env: Arc<Environment>) -> JoinHandle<()> {
    tokio::spawn(async move {
        debug!(interval = ?SAMPLE_INTERVAL, "stats sampler started");
        let mut ticker = tokio::time::interval(SAMPLE_INTERVAL);
        loop {
            ticker.tick().await;
            env.refresh_stats().await;
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logging::{BufferSink, Verbosity};
    use crate::stats::MemoryStats;

    struct FixedStats(RuntimeStats);

    impl StatsProvider for FixedStats {
        fn sample(&self) -> RuntimeStats {
            self.0
        }
    }

    fn fixed_provider(threads: u64, resident: u64) -> Arc<dyn StatsProvider> {
        Arc::new(FixedStats(RuntimeStats {
            threads,
            memory: MemoryStats {
                resident_bytes: resident,
                ..MemoryStats::default()
            },
        }))
    }

    fn empty_env(provider: Arc<dyn StatsProvider>) -> Environment {
        Environment::new(Vec::new(), Options::default(), provider)
    }

    #[test]
    fn test_uptime_monotonically_non_decreasing() {
        let env = empty_env(fixed_provider(0, 0));
        let mut previous = env.uptime();
        for _ in 0..100 {
            let current = env.uptime();
            assert!(current >= previous);
            previous = current;
        }
    }

    #[tokio::test]
    async fn test_refresh_stats_overwrites_block() {
        let env = empty_env(fixed_provider(7, 4096));
        assert_eq!(env.stats().await, RuntimeStats::default());

        env.refresh_stats().await;
        let stats = env.stats().await;
        assert_eq!(stats.threads, 7);
        assert_eq!(stats.memory.resident_bytes, 4096);
    }

    #[tokio::test]
    async fn test_describe_emits_meta_and_mem_lines() {
        let env = empty_env(fixed_provider(3, 2048));
        env.refresh_stats().await;

        let sink = BufferSink::new();
        let logger = Logger::new(Verbosity::Normal, sink.clone());
        env.describe(&logger).await;

        let lines = sink.lines();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].contains("Meta: ["));
        assert!(lines[0].contains(&format!("[Pid: {}]", std::process::id())));
        assert!(lines[0].contains("[Threads: 3]"));
        assert!(lines[1].contains("Mem: ["));
        assert!(lines[1].contains("[Resident: 2048]"));
    }

    #[tokio::test]
    async fn test_channel_holds_exactly_one_event() {
        let env = empty_env(fixed_provider(0, 0));
        env.publish(ControlEvent::Reload).await;

        // Slot occupied: a second publish would block until drained
        assert!(env.events_tx.try_send(ControlEvent::Info).is_err());

        assert_eq!(env.events().recv_async().await.unwrap(), ControlEvent::Reload);
        assert!(env.events_tx.try_send(ControlEvent::Info).is_ok());
    }

    #[tokio::test]
    async fn test_events_delivered_in_publish_order() {
        let env = Arc::new(empty_env(fixed_provider(0, 0)));

        let producer = {
            let env = env.clone();
            tokio::spawn(async move {
                env.publish(ControlEvent::Reload).await;
                env.publish(ControlEvent::Info).await;
                env.publish(ControlEvent::Shutdown).await;
            })
        };

        let events = env.events();
        assert_eq!(events.recv_async().await.unwrap(), ControlEvent::Reload);
        assert_eq!(events.recv_async().await.unwrap(), ControlEvent::Info);
        assert_eq!(events.recv_async().await.unwrap(), ControlEvent::Shutdown);
        producer.await.unwrap();
    }
}
