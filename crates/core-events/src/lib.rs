//! Runtime event types and channel helpers.
//!
//! The engine is single-threaded cooperative: every stimulus, be it a timer
//! tick, a bot output line or a shutdown request, funnels into one bounded channel
//! consumed by the main loop, which applies each event as one atomic step.
//! Producers run as background tasks and never touch engine state directly.

use std::sync::atomic::AtomicU64;

use tokio::sync::mpsc::Sender;
use tokio::task::JoinHandle;

/// Capacity of the main event channel. A single tick producer plus two bot
/// stream readers sit well below this; the bound exists so a runaway bot
/// cannot grow the queue without limit, and `blocking` sends park the
/// producer instead of dropping lines (command order is part of the
/// protocol contract).
pub const EVENT_CHANNEL_CAP: usize = 1024;

// Telemetry counters (relaxed atomics, inspected in tests and logged on
// shutdown).
pub static CHANNEL_SEND_FAILURES: AtomicU64 = AtomicU64::new(0);
pub static TICKS_EMITTED: AtomicU64 = AtomicU64::new(0);
pub static BOT_LINES_RECEIVED: AtomicU64 = AtomicU64::new(0);

/// Top-level event enum consumed by the central runtime loop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    /// Periodic monotonic tick driving the movement state machine.
    Tick,
    /// One complete command line from the bot's stdout.
    BotLine(String),
    /// One line from the bot's stderr, forwarded to the log stream.
    BotLog(String),
    /// The bot process exited.
    BotExited,
    Shutdown,
}

/// Observer for the engine's state-changed / event-logged notifications.
///
/// The simulation and the controller each own one sink. Renderers and test
/// harnesses implement this to watch the engine; the default
/// [`TracingSink`] forwards messages to the log stream and ignores
/// state-changed (a headless run has nothing to repaint).
pub trait EventSink {
    fn event_logged(&mut self, message: &str);
    fn state_changed(&mut self) {}
}

/// Log-only sink used when no observer is attached.
#[derive(Debug, Default)]
pub struct TracingSink;

impl EventSink for TracingSink {
    fn event_logged(&mut self, message: &str) {
        tracing::info!(target: "engine.events", "{message}");
    }
}

/// Trait implemented by any async event producer. Implementors hold their
/// configuration and spawn one background task that pushes [`Event`]s into
/// the shared channel, terminating promptly when the channel closes.
pub trait AsyncEventSource: Send + 'static {
    /// Stable identifier used for logging / diagnostics.
    fn name(&self) -> &'static str;
    /// Consume self and spawn the background task. Implementors stop when
    /// `tx.send(..).await` returns Err (channel closed) and must not busy
    /// loop; await timers or IO futures instead.
    fn spawn(self: Box<Self>, tx: Sender<Event>) -> JoinHandle<()>;
}

/// Registry of event sources, spawned together at startup.
#[derive(Default)]
pub struct EventSourceRegistry {
    sources: Vec<Box<dyn AsyncEventSource>>,
}

impl EventSourceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register<S: AsyncEventSource>(&mut self, src: S) {
        self.sources.push(Box::new(src));
    }

    /// Spawn all registered sources, returning their JoinHandles. Each source
    /// receives its own `Sender` clone; during shutdown the caller drops its
    /// final clone before awaiting the handles so the sources observe the
    /// closed channel and exit cooperatively.
    pub fn spawn_all(&mut self, tx: &Sender<Event>) -> Vec<JoinHandle<()>> {
        let mut out = Vec::with_capacity(self.sources.len());
        for src in self.sources.drain(..) {
            let name = src.name();
            tracing::info!(target: "runtime.events", source = name, "spawning event source");
            out.push(src.spawn(tx.clone()));
        }
        out
    }
}

/// Built-in monotonic tick source. Emits [`Event::Tick`] every configured
/// interval; each tick advances one half-step or turn in the engine.
pub struct TickEventSource {
    interval: std::time::Duration,
}

impl TickEventSource {
    pub fn new(interval: std::time::Duration) -> Self {
        Self { interval }
    }
}

impl AsyncEventSource for TickEventSource {
    fn name(&self) -> &'static str {
        "tick"
    }

    fn spawn(self: Box<Self>, tx: Sender<Event>) -> JoinHandle<()> {
        let dur = self.interval;
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(dur);
            loop {
                interval.tick().await;
                if tx.send(Event::Tick).await.is_err() {
                    break;
                }
                TICKS_EMITTED.fetch_add(1, std::sync::atomic::Ordering::Relaxed);
            }
        })
    }
}

/// Helper result type shared by the runtime wiring code.
pub type EventResult<T> = anyhow::Result<T>;
