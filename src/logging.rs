use chrono::{Datelike, Local, Timelike};
use std::fmt::Display;
use std::sync::{Arc, Mutex};

use crate::options::Options;

/// Log levels exposed by the facade
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum LogLevel {
    Debug,
    Info,
    Error,
}

/// Output verbosity, selected once at startup from parsed options.
///
/// `q`/`quiet` suppress all informational output and win over any verbose
/// flag; `v`/`verbose`/`vv`/`vvv` are equivalent and enable debug output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Verbosity {
    Quiet,
    #[default]
    Normal,
    Verbose,
}

impl Verbosity {
    /// Derive verbosity from parsed options; quiet takes precedence
    #[must_use]
    pub fn from_options(options: &Options) -> Self {
        if options.has_one_of(&["q", "quiet"]) {
            Self::Quiet
        } else if options.has_one_of(&["v", "verbose", "vv", "vvv"]) {
            Self::Verbose
        } else {
            Self::Normal
        }
    }

    const fn allows(self, level: LogLevel) -> bool {
        match level {
            LogLevel::Error => true,
            LogLevel::Info => !matches!(self, Self::Quiet),
            LogLevel::Debug => matches!(self, Self::Verbose),
        }
    }
}

/// Destination for formatted log lines
pub trait LogSink: Send + Sync {
    fn write_line(&self, line: &str);
}

/// Production sink: one line per message on standard output
#[derive(Debug, Default)]
pub struct StdoutSink;

impl LogSink for StdoutSink {
    fn write_line(&self, line: &str) {
        println!("{line}");
    }
}

/// Capturing sink for tests and embedders that inspect harness output
#[derive(Debug, Default)]
pub struct BufferSink {
    lines: Mutex<Vec<String>>,
}

impl BufferSink {
    #[must_use]
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Snapshot of every line written so far
    #[must_use]
    pub fn lines(&self) -> Vec<String> {
        self.lines.lock().expect("sink lock poisoned").clone()
    }

    /// Drain and return the captured lines
    #[must_use]
    pub fn take(&self) -> Vec<String> {
        std::mem::take(&mut *self.lines.lock().expect("sink lock poisoned"))
    }
}

impl LogSink for BufferSink {
    fn write_line(&self, line: &str) {
        self.lines.lock().expect("sink lock poisoned").push(line.to_string());
    }
}

/// Three-level logging facade handed to every component at construction.
///
/// Cloning is cheap; clones share the underlying sink.
#[derive(Clone)]
pub struct Logger {
    verbosity: Verbosity,
    sink: Arc<dyn LogSink>,
}

impl Logger {
    #[must_use]
    pub fn new(verbosity: Verbosity, sink: Arc<dyn LogSink>) -> Self {
        Self { verbosity, sink }
    }

    /// Facade over a silent sink regardless of verbosity; error output is
    /// still formatted but goes nowhere
    #[must_use]
    pub fn silent() -> Self {
        struct NullSink;
        impl LogSink for NullSink {
            fn write_line(&self, _line: &str) {}
        }
        Self::new(Verbosity::Quiet, Arc::new(NullSink))
    }

    #[must_use]
    pub const fn verbosity(&self) -> Verbosity {
        self.verbosity
    }

    pub fn debug<M: Display>(&self, message: M) {
        self.log(LogLevel::Debug, message);
    }

    pub fn info<M: Display>(&self, message: M) {
        self.log(LogLevel::Info, message);
    }

    pub fn error<M: Display>(&self, message: M) {
        self.log(LogLevel::Error, message);
    }

    fn log<M: Display>(&self, level: LogLevel, message: M) {
        if self.verbosity.allows(level) {
            self.sink.write_line(&format_line(&message.to_string()));
        }
    }
}

impl std::fmt::Debug for Logger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Logger")
            .field("verbosity", &self.verbosity)
            .finish()
    }
}

/// Prefix a message with the day-of-year and wall-clock timestamp:
/// `DD HH:MM:SS <message>` (day-of-year padded to at least two digits)
#[must_use]
pub fn format_line(message: &str) -> String {
    let now = Local::now();
    format!(
        "{:02} {:02}:{:02}:{:02} {}",
        now.ordinal(),
        now.hour(),
        now.minute(),
        now.second(),
        message
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::options;

    fn parsed(tokens: &[&str]) -> Options {
        let argv = tokens.iter().map(ToString::to_string).collect::<Vec<_>>();
        options::parse(argv).1
    }

    #[test]
    fn test_verbosity_from_options() {
        assert_eq!(Verbosity::from_options(&parsed(&[])), Verbosity::Normal);
        assert_eq!(Verbosity::from_options(&parsed(&["-q"])), Verbosity::Quiet);
        assert_eq!(
            Verbosity::from_options(&parsed(&["--vv"])),
            Verbosity::Verbose
        );
    }

    #[test]
    fn test_quiet_wins_over_verbose() {
        let options = parsed(&["--quiet", "--verbose"]);
        assert_eq!(Verbosity::from_options(&options), Verbosity::Quiet);

        let sink = BufferSink::new();
        let logger = Logger::new(Verbosity::from_options(&options), sink.clone());
        logger.debug("hidden");
        logger.info("hidden");
        assert!(sink.lines().is_empty());
    }

    #[test]
    fn test_error_always_emits() {
        let sink = BufferSink::new();
        let logger = Logger::new(Verbosity::Quiet, sink.clone());
        logger.error("boom");
        let lines = sink.lines();
        assert_eq!(lines.len(), 1);
        assert!(lines[0].ends_with("boom"));
    }

    #[test]
    fn test_debug_requires_verbose() {
        let sink = BufferSink::new();
        let logger = Logger::new(Verbosity::Normal, sink.clone());
        logger.debug("hidden");
        assert!(sink.lines().is_empty());

        let logger = Logger::new(Verbosity::Verbose, sink.clone());
        logger.debug("shown");
        assert_eq!(sink.lines().len(), 1);
    }

    #[test]
    fn test_line_format_prefix() {
        let line = format_line("hello");
        // "DD HH:MM:SS hello" with a 2-3 digit day-of-year
        let (prefix, rest) = line.split_once(' ').unwrap();
        assert!(prefix.len() >= 2 && prefix.len() <= 3);
        assert!(prefix.chars().all(|c| c.is_ascii_digit()));
        let (clock, message) = rest.split_once(' ').unwrap();
        assert_eq!(clock.len(), 8);
        assert_eq!(clock.as_bytes()[2], b':');
        assert_eq!(clock.as_bytes()[5], b':');
        assert_eq!(message, "hello");
    }

    #[test]
    fn test_silent_logger_emits_nothing() {
        // Nothing to observe directly; just exercise every level
        let logger = Logger::silent();
        logger.debug("a");
        logger.info("b");
        logger.error("c");
    }
}
