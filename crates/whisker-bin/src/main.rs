//! Whisker entrypoint: headless micromouse simulator host.
//!
//! Wires the pieces together and runs the single serialized event loop:
//! timer ticks advance the simulation one half-step at a time, bot stdout
//! lines feed the controller, and every stimulus is applied as one atomic
//! step in arrival order.

use std::path::{Path, PathBuf};
use std::sync::Once;
use std::time::Duration;

use anyhow::{Context, Result, anyhow};
use clap::Parser;
use core_config::{Config, MAX_TICK_MS, MIN_TICK_MS, load_from};
use core_control::Controller;
use core_events::{EVENT_CHANNEL_CAP, Event, EventSourceRegistry, TickEventSource};
use core_maze::{Maze, generate};
use core_sim::Simulation;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};
use tracing_appender::non_blocking::WorkerGuard;

mod bot;

use bot::BotProcess;

/// CLI arguments. Flags override the corresponding `whisker.toml` fields.
#[derive(Parser, Debug)]
#[command(name = "whisker", version, about = "Headless micromouse simulator")]
struct Args {
    /// Maze file to load (`map` or `num`, auto-detected).
    pub maze: Option<PathBuf>,
    /// Configuration file path (overrides discovery of `whisker.toml`).
    #[arg(long = "config")]
    pub config: Option<PathBuf>,
    /// Generate a maze instead of loading one, e.g. `--generate 16x16`.
    #[arg(long = "generate", value_name = "WxH")]
    pub generate: Option<String>,
    /// Generator seed.
    #[arg(long = "seed")]
    pub seed: Option<u32>,
    /// Bot command line, e.g. `--bot "python3 solver.py"`.
    #[arg(long = "bot")]
    pub bot: Option<String>,
    /// Working directory for the bot process.
    #[arg(long = "bot-dir")]
    pub bot_dir: Option<PathBuf>,
    /// Tick interval in milliseconds.
    #[arg(long = "tick-ms")]
    pub tick_ms: Option<u64>,
    /// Write the maze as `num` lines to this path and exit.
    #[arg(long = "save-num", value_name = "PATH")]
    pub save_num: Option<PathBuf>,
}

fn configure_logging() -> Result<Option<WorkerGuard>> {
    let log_dir = Path::new(".");
    let log_path = log_dir.join("whisker.log");
    if log_path.exists() {
        let _ = std::fs::remove_file(&log_path);
    }

    let file_appender = tracing_appender::rolling::never(log_dir, "whisker.log");
    let (nb_writer, guard) = tracing_appender::non_blocking(file_appender);
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    match tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(nb_writer)
        .try_init()
    {
        Ok(_) => Ok(Some(guard)),
        // Global subscriber already installed (tests); drop the guard so
        // the writer shuts down.
        Err(_) => Ok(None),
    }
}

fn install_panic_hook() {
    static HOOK: Once = Once::new();
    HOOK.call_once(|| {
        let default_panic = std::panic::take_hook();
        std::panic::set_hook(Box::new(move |info| {
            tracing::error!(target: "runtime.panic", ?info, "panic");
            default_panic(info);
        }));
    });
}

/// Parse a `WxH` dimension spec such as `16x16`.
fn parse_dimensions(spec: &str) -> Result<(i32, i32)> {
    let (w, h) = spec
        .split_once(['x', 'X'])
        .ok_or_else(|| anyhow!("invalid dimension spec `{spec}`, expected WxH"))?;
    let width: i32 = w
        .trim()
        .parse()
        .with_context(|| format!("invalid width in `{spec}`"))?;
    let height: i32 = h
        .trim()
        .parse()
        .with_context(|| format!("invalid height in `{spec}`"))?;
    Ok((width, height))
}

/// Resolve the maze: explicit generation beats an explicit file, and the
/// config's generator parameters are the fallback when neither is given.
fn bootstrap_maze(args: &Args, config: &Config) -> Result<Maze> {
    if let Some(spec) = &args.generate {
        let (width, height) = parse_dimensions(spec)?;
        let seed = args.seed.unwrap_or(config.file.maze.seed);
        let maze = generate(width, height, seed)?;
        info!(target: "runtime.maze", "Generated maze {width}x{height} (seed {seed})");
        return Ok(maze);
    }

    if let Some(path) = args.maze.as_ref().or(config.file.maze.file.as_ref()) {
        let maze = Maze::from_file(path)
            .with_context(|| format!("loading maze from {}", path.display()))?;
        info!(
            target: "runtime.maze",
            "Loaded maze {}x{} from {}",
            maze.width(),
            maze.height(),
            path.display()
        );
        return Ok(maze);
    }

    let params = &config.file.maze;
    let seed = args.seed.unwrap_or(params.seed);
    let maze = generate(params.width, params.height, seed)?;
    info!(
        target: "runtime.maze",
        "Generated maze {}x{} (seed {seed})",
        params.width,
        params.height
    );
    Ok(maze)
}

fn save_num(maze: &Maze, path: &Path) -> Result<()> {
    let mut out = maze.to_num_lines().join("\n");
    out.push('\n');
    std::fs::write(path, out).with_context(|| format!("writing {}", path.display()))?;
    info!(target: "runtime.maze", "Saved maze: {}", path.display());
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let log_guard = configure_logging()?;
    install_panic_hook();

    let args = Args::parse();
    let config = load_from(args.config.clone())?;
    info!(target: "runtime", config_override = args.config.is_some(), "startup");

    let maze = bootstrap_maze(&args, &config)?;
    if let Some(path) = &args.save_num {
        save_num(&maze, path)?;
        return Ok(());
    }

    let bot_command = args
        .bot
        .clone()
        .or_else(|| config.file.bot.command.clone())
        .ok_or_else(|| anyhow!("no bot command configured (pass --bot or set [bot].command)"))?;
    let bot_dir = args
        .bot_dir
        .clone()
        .or_else(|| config.file.bot.working_dir.clone());

    let mut sim = Simulation::new();
    sim.set_maze(maze);
    let mut controller = Controller::new();

    let tick_interval = match args.tick_ms {
        Some(ms) => Duration::from_millis(ms.clamp(MIN_TICK_MS, MAX_TICK_MS)),
        None => config.tick_interval(),
    };

    let (tx, mut rx) = mpsc::channel::<Event>(EVENT_CHANNEL_CAP);
    let mut registry = EventSourceRegistry::new();
    registry.register(TickEventSource::new(tick_interval));
    let source_handles = registry.spawn_all(&tx);

    let bot = BotProcess::spawn(&bot_command, bot_dir.as_deref(), tx.clone())?;
    controller.attach_bot(Box::new(bot.link()));
    info!(
        target: "runtime",
        command = bot_command.as_str(),
        tick_ms = tick_interval.as_millis() as u64,
        "bot started"
    );

    {
        let tx = tx.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                let _ = tx.send(Event::Shutdown).await;
            }
        });
    }

    // The serialized main loop: one event, one atomic step.
    while let Some(event) = rx.recv().await {
        match event {
            Event::Tick => controller.tick(&mut sim),
            Event::BotLine(line) => {
                core_events::BOT_LINES_RECEIVED
                    .fetch_add(1, std::sync::atomic::Ordering::Relaxed);
                debug!(target: "bot.stdout", line = line.as_str(), "command");
                controller.enqueue_command(&mut sim, &line);
            }
            Event::BotLog(line) => info!(target: "bot.stderr", "{line}"),
            Event::BotExited => {
                warn!(target: "runtime", "bot process exited");
                controller.detach_bot();
                break;
            }
            Event::Shutdown => {
                info!(target: "runtime", "shutdown requested");
                break;
            }
        }
    }

    drop(tx);
    drop(bot);
    for handle in source_handles {
        let _ = handle.await;
    }
    info!(
        target: "runtime",
        steps = sim.step_count(),
        collisions = sim.collision_count(),
        solved = sim.goal_reached(),
        score = sim.stats().stat_string(core_sim::StatId::Score).as_str(),
        "engine stopped"
    );
    drop(log_guard);
    Ok(())
}
