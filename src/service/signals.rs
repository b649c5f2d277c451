use futures::stream::StreamExt;
use serde::Serialize;
use signal_hook::consts::signal::{SIGHUP, SIGINT, SIGTERM, SIGUSR1, SIGUSR2};
use signal_hook_tokio::Signals;
use tokio::task::JoinHandle;
use tracing::{debug, instrument, warn};

use crate::context::Context;
use crate::{Error, Result};

/// Control events delivered to worker code over the environment's channel.
///
/// Integer codes match the Unix signal numbers the events originate from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum ControlEvent {
    Shutdown,
    Reload,
    GarbageCollect,
    Info,
}

impl ControlEvent {
    /// Integer code of this event
    #[must_use]
    pub const fn code(self) -> i32 {
        match self {
            Self::Shutdown => SIGTERM,
            Self::Reload => SIGHUP,
            Self::GarbageCollect => SIGUSR2,
            Self::Info => SIGUSR1,
        }
    }

    /// Decode an integer-coded event
    #[must_use]
    pub const fn from_code(code: i32) -> Option<Self> {
        match code {
            SIGTERM => Some(Self::Shutdown),
            SIGHUP => Some(Self::Reload),
            SIGUSR2 => Some(Self::GarbageCollect),
            SIGUSR1 => Some(Self::Info),
            _ => None,
        }
    }
}

impl std::fmt::Display for ControlEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Shutdown => write!(f, "Shutdown"),
            Self::Reload => write!(f, "Reload"),
            Self::GarbageCollect => write!(f, "GarbageCollect"),
            Self::Info => write!(f, "Info"),
        }
    }
}

/// The subscribed process signals
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Signal {
    Term,
    Int,
    Hup,
    Usr1,
    Usr2,
}

impl Signal {
    /// The control event this signal translates to
    #[must_use]
    pub const fn event(self) -> ControlEvent {
        match self {
            Self::Term | Self::Int => ControlEvent::Shutdown,
            Self::Hup => ControlEvent::Reload,
            Self::Usr1 => ControlEvent::Info,
            Self::Usr2 => ControlEvent::GarbageCollect,
        }
    }

    pub(crate) const fn from_raw(signal: i32) -> Option<Self> {
        match signal {
            SIGTERM => Some(Self::Term),
            SIGINT => Some(Self::Int),
            SIGHUP => Some(Self::Hup),
            SIGUSR1 => Some(Self::Usr1),
            SIGUSR2 => Some(Self::Usr2),
            _ => None,
        }
    }
}

impl std::fmt::Display for Signal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Term => write!(f, "SIGTERM"),
            Self::Int => write!(f, "SIGINT"),
            Self::Hup => write!(f, "SIGHUP"),
            Self::Usr1 => write!(f, "SIGUSR1"),
            Self::Usr2 => write!(f, "SIGUSR2"),
        }
    }
}

/// Send one of the subscribed signals to a process
pub fn send_signal(pid: u32, signal: Signal) -> Result<()> {
    use nix::sys::signal;
    use nix::unistd::Pid;

    let nix_signal = match signal {
        Signal::Term => signal::Signal::SIGTERM,
        Signal::Int => signal::Signal::SIGINT,
        Signal::Hup => signal::Signal::SIGHUP,
        Signal::Usr1 => signal::Signal::SIGUSR1,
        Signal::Usr2 => signal::Signal::SIGUSR2,
    };

    signal::kill(Pid::from_raw(pid as i32), nix_signal)
        .map_err(|errno| Error::Signal(std::io::Error::from(errno)))
}

/// Register the subscribed signals and start the router task.
///
/// Registration happens before this function returns, so callers are
/// guaranteed the handlers are installed once an entry point hands back
/// control. The task runs for the process lifetime.
pub(crate) fn spawn_router(ctx: Context) -> Result<JoinHandle<()>> {
    let signals =
        Signals::new([SIGINT, SIGTERM, SIGHUP, SIGUSR1, SIGUSR2]).map_err(Error::Signal)?;
    Ok(tokio::spawn(route_signals(signals, ctx)))
}

/// Translate each inbound signal into its side effects and control event.
///
/// Side effects run immediately on receipt; only the publish step waits
/// when the channel slot is occupied, so a slow consumer throttles the
/// router without dropping or reordering events.
#[instrument(skip_all)]
async fn route_signals(mut signals: Signals, ctx: Context) {
    debug!("signal router started");

    while let Some(raw) = signals.next().await {
        let Some(signal) = Signal::from_raw(raw) else {
            // Unreachable by construction of the subscription
            warn!(signal = raw, "received unsubscribed signal");
            continue;
        };

        // Side effects run here, before the publish step can block
        match signal {
            Signal::Int | Signal::Term => {
                ctx.info(format!("Received {signal}, starting shutdown sequence"));
                ctx.env().describe(ctx.logger()).await;
            }
            Signal::Hup => {
                ctx.info(format!("Received {signal}, sending reload event"));
            }
            Signal::Usr1 => {
                ctx.info(format!("Received {signal}, starting info sequence"));
                ctx.env().describe(ctx.logger()).await;
            }
            Signal::Usr2 => {
                ctx.info(format!("Received {signal}, starting gc sequence"));
                // No collector to force in Rust; make the memory picture
                // current before announcing the event
                ctx.env().refresh_stats().await;
            }
        }

        ctx.env().publish(signal.event()).await;
    }

    debug!("signal router exiting");
}
