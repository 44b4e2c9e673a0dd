//! Line-protocol controller between the bot process and the simulation.
//!
//! Bot stdout lines are enqueued here and dispatched in arrival order.
//! Query commands answer synchronously over the bot's stdin. Motion
//! commands *defer*: dispatch suspends until the engine reports the
//! movement finished, at which point `ack` or `crash` is sent and dispatch
//! resumes. The controller never advances the engine itself (ticks arrive
//! from the driver via [`Controller::tick`]), so a deferred response can
//! never re-enter the state machine that produced it.
//!
//! The controller holds no reference to the simulation; every entry point
//! borrows it for the duration of the call, which keeps the whole
//! tick/dispatch cycle single-threaded and re-entrancy free.

use std::collections::VecDeque;

use core_events::{EventSink, TracingSink};
use core_sim::Simulation;
use tracing::warn;

mod command;

pub use command::CommandOutcome;

/// Sink for lines travelling back to the bot (its stdin, in production).
pub trait BotLink {
    fn send_line(&mut self, line: &str);
}

pub struct Controller {
    queue: VecDeque<String>,
    waiting_response: bool,
    paused: bool,
    bot: Option<Box<dyn BotLink>>,
    sink: Box<dyn EventSink>,
}

impl Controller {
    pub fn new() -> Self {
        Self {
            queue: VecDeque::new(),
            waiting_response: false,
            paused: false,
            bot: None,
            sink: Box::new(TracingSink),
        }
    }

    pub fn set_sink(&mut self, sink: Box<dyn EventSink>) {
        self.sink = sink;
    }

    pub fn attach_bot(&mut self, bot: Box<dyn BotLink>) {
        self.bot = Some(bot);
    }

    /// Drops the bot link and any queued commands. An in-flight motion
    /// finishes on its own ticks with nobody listening for the response.
    pub fn detach_bot(&mut self) {
        self.bot = None;
        self.reset_state();
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    /// Pausing halts dispatch; the waiting flag is untouched so a deferred
    /// response still completes the handshake once unpaused.
    pub fn set_paused(&mut self, paused: bool, sim: &mut Simulation) {
        self.paused = paused;
        if !self.paused {
            self.process_queue(sim);
        }
    }

    /// Clears the queue and the waiting flag, e.g. when the bot dies or the
    /// engine is fully reset.
    pub fn reset_state(&mut self) {
        self.queue.clear();
        self.waiting_response = false;
    }

    /// Enqueue one complete line from the bot and dispatch as far as
    /// possible.
    pub fn enqueue_command(&mut self, sim: &mut Simulation, line: &str) {
        self.queue.push_back(line.to_string());
        self.process_queue(sim);
    }

    /// Advance the engine by one tick and complete the handshake if a
    /// movement finished. The driver calls this for every timer tick.
    pub fn tick(&mut self, sim: &mut Simulation) {
        if let Some(outcome) = sim.advance_one_tick() {
            self.on_movement_finished(sim, outcome.crashed);
        }
    }

    /// Deliver a movement-finished notification. Sends the deferred
    /// `ack`/`crash` response and resumes dispatch.
    pub fn on_movement_finished(&mut self, sim: &mut Simulation, crashed: bool) {
        if !self.waiting_response {
            return;
        }
        self.waiting_response = false;
        self.send_response(if crashed { "crash" } else { "ack" });
        self.process_queue(sim);
    }

    fn process_queue(&mut self, sim: &mut Simulation) {
        if self.paused || self.waiting_response || self.bot.is_none() {
            return;
        }

        while let Some(line) = self.queue.pop_front() {
            if line.trim().is_empty() {
                continue;
            }
            match command::process_command(sim, &line) {
                CommandOutcome::Invalid => self.handle_invalid(&line),
                CommandOutcome::Silent => {}
                CommandOutcome::Reply(response) => self.send_response(&response),
                CommandOutcome::Deferred => {
                    self.waiting_response = true;
                    break;
                }
            }
        }
    }

    fn send_response(&mut self, response: &str) {
        if let Some(bot) = self.bot.as_mut() {
            bot.send_line(response);
        }
    }

    fn handle_invalid(&mut self, line: &str) {
        warn!(target: "control", command = line, "invalid command");
        self.sink.event_logged(&format!("Invalid command: {line}"));
    }
}

impl Default for Controller {
    fn default() -> Self {
        Self::new()
    }
}

/// Reassembles complete lines from arbitrary byte-stream chunks. Carriage
/// returns are stripped; a trailing fragment without a newline is buffered
/// until the next chunk.
#[derive(Debug, Default)]
pub struct LineSplitter {
    buffer: String,
}

impl LineSplitter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn feed(&mut self, chunk: &str) -> Vec<String> {
        let text: String = chunk.chars().filter(|&c| c != '\r').collect();
        let parts: Vec<&str> = text.split('\n').collect();

        let mut lines = Vec::new();
        if parts.len() > 1 {
            let mut first = std::mem::take(&mut self.buffer);
            first.push_str(parts[0]);
            lines.push(first);
            for part in &parts[1..parts.len() - 1] {
                lines.push((*part).to_string());
            }
        }
        self.buffer.push_str(parts[parts.len() - 1]);
        lines
    }

    /// The buffered partial line, if any.
    pub fn pending(&self) -> &str {
        &self.buffer
    }
}
