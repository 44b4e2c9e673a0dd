//! Bot process plumbing.
//!
//! The bot is an ordinary child process speaking newline-delimited UTF-8
//! over its standard streams. Its stdout carries protocol commands, its
//! stderr is forwarded verbatim to the log stream, and responses travel
//! back over stdin. Reader tasks push complete lines into the runtime
//! event channel; the engine never blocks on bot IO.

use std::path::Path;
use std::process::Stdio;

use anyhow::{Context, Result, anyhow};
use core_control::{BotLink, LineSplitter};
use core_events::Event;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::process::{Child, Command};
use tokio::sync::mpsc::{Sender, UnboundedSender, unbounded_channel};
use tokio::task::JoinHandle;
use tracing::{debug, warn};

pub struct BotProcess {
    // Held for kill-on-drop; the runtime never waits on the child directly,
    // stdout EOF is the exit signal.
    _child: Child,
    stdin_tx: UnboundedSender<String>,
    _tasks: Vec<JoinHandle<()>>,
}

impl BotProcess {
    /// Spawn the bot and wire its streams into the event channel. The
    /// command line is whitespace-split; the first token is the program.
    pub fn spawn(command: &str, working_dir: Option<&Path>, events: Sender<Event>) -> Result<Self> {
        let mut parts = command.split_whitespace();
        let program = parts.next().ok_or_else(|| anyhow!("empty bot command"))?;

        let mut cmd = Command::new(program);
        cmd.args(parts)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        if let Some(dir) = working_dir {
            cmd.current_dir(dir);
        }
        let mut child = cmd
            .spawn()
            .with_context(|| format!("spawning bot process `{command}`"))?;

        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| anyhow!("bot stdout not captured"))?;
        let stderr = child
            .stderr
            .take()
            .ok_or_else(|| anyhow!("bot stderr not captured"))?;
        let stdin = child
            .stdin
            .take()
            .ok_or_else(|| anyhow!("bot stdin not captured"))?;

        let mut tasks = Vec::with_capacity(3);

        // stdout -> protocol commands, EOF doubles as the exit signal.
        let tx = events.clone();
        tasks.push(tokio::spawn(async move {
            let mut stdout = stdout;
            let mut splitter = LineSplitter::new();
            let mut buf = [0u8; 4096];
            loop {
                match stdout.read(&mut buf).await {
                    Ok(0) | Err(_) => break,
                    Ok(n) => {
                        for line in splitter.feed(&String::from_utf8_lossy(&buf[..n])) {
                            if tx.send(Event::BotLine(line)).await.is_err() {
                                return;
                            }
                        }
                    }
                }
            }
            if !splitter.pending().is_empty() {
                warn!(target: "bot", fragment = splitter.pending(), "bot exited mid-line");
            }
            let _ = tx.send(Event::BotExited).await;
        }));

        // stderr -> log stream.
        let tx = events;
        tasks.push(tokio::spawn(async move {
            let mut stderr = stderr;
            let mut splitter = LineSplitter::new();
            let mut buf = [0u8; 4096];
            loop {
                match stderr.read(&mut buf).await {
                    Ok(0) | Err(_) => break,
                    Ok(n) => {
                        for line in splitter.feed(&String::from_utf8_lossy(&buf[..n])) {
                            if tx.send(Event::BotLog(line)).await.is_err() {
                                return;
                            }
                        }
                    }
                }
            }
        }));

        // Response writer: the controller's sync `send_line` feeds this
        // queue, the task owns the async stdin handle.
        let (stdin_tx, mut stdin_rx) = unbounded_channel::<String>();
        tasks.push(tokio::spawn(async move {
            let mut stdin = stdin;
            while let Some(line) = stdin_rx.recv().await {
                debug!(target: "bot.stdin", line = line.as_str(), "response");
                if stdin.write_all(line.as_bytes()).await.is_err() {
                    break;
                }
                if stdin.write_all(b"\n").await.is_err() {
                    break;
                }
                if stdin.flush().await.is_err() {
                    break;
                }
            }
        }));

        Ok(Self {
            _child: child,
            stdin_tx,
            _tasks: tasks,
        })
    }

    /// A cloneable line sink over the bot's stdin, for the controller.
    pub fn link(&self) -> BotStdin {
        BotStdin {
            tx: self.stdin_tx.clone(),
        }
    }
}

/// [`BotLink`] implementation backed by the stdin writer task.
#[derive(Clone)]
pub struct BotStdin {
    tx: UnboundedSender<String>,
}

impl BotLink for BotStdin {
    fn send_line(&mut self, line: &str) {
        // A closed channel means the bot is gone; responses are dropped
        // just like writes to a dead process.
        let _ = self.tx.send(line.to_string());
    }
}
