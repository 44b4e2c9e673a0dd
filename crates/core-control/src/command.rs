//! The wire-command surface.
//!
//! Commands are whitespace-tokenized with per-verb arity checks. `setText`
//! is the one exception to tokenization: its payload is everything after
//! the third space of the raw line, preserved verbatim including trailing
//! whitespace. Unknown verbs, wrong arity and malformed integers all make
//! the whole command invalid; invalid commands are logged and get no
//! response.

use core_geom::Direction;
use core_sim::{Simulation, StatId, TurnKind, WallState};

/// What dispatching a single command produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandOutcome {
    /// Unknown verb, wrong arity or unparsable argument. Logged, no
    /// response.
    Invalid,
    /// Executed, no response line.
    Silent,
    /// Executed with a synchronous response line.
    Reply(String),
    /// A motion was started; the response is sent when it finishes.
    Deferred,
}

pub(crate) fn process_command(sim: &mut Simulation, line: &str) -> CommandOutcome {
    let mut tokens = line.split_whitespace();
    let Some(verb) = tokens.next() else {
        return CommandOutcome::Invalid;
    };
    let args: Vec<&str> = tokens.collect();

    match verb {
        "mazeWidth" if args.is_empty() => {
            CommandOutcome::Reply(sim.maze().map_or(0, |m| m.width()).to_string())
        }
        "mazeHeight" if args.is_empty() => {
            CommandOutcome::Reply(sim.maze().map_or(0, |m| m.height()).to_string())
        }

        "goalCount" if args.is_empty() => CommandOutcome::Reply(sim.goal_cells().len().to_string()),
        "goalCell" => {
            let &[index] = args.as_slice() else {
                return CommandOutcome::Invalid;
            };
            let Ok(index) = index.parse::<i32>() else {
                return CommandOutcome::Invalid;
            };
            // Reported in scan order: bottom row first, west to east.
            let mut goals: Vec<(i32, i32)> = sim.goal_cells().into_iter().collect();
            goals.sort_by_key(|&(x, y)| (y, x));
            if index < 0 || index as usize >= goals.len() {
                return CommandOutcome::Invalid;
            }
            let (x, y) = goals[index as usize];
            CommandOutcome::Reply(format!("{x} {y}"))
        }
        "isGoal" if args.is_empty() => {
            let cell = sim.mouse().position().to_cell();
            CommandOutcome::Reply(bool_reply(sim.goal_cells().contains(&cell)))
        }

        "wallFront" | "wallRight" | "wallLeft" | "wallBack" | "wallFrontRight"
        | "wallFrontLeft" | "wallBackRight" | "wallBackLeft" => {
            // Optional argument: how many half-steps away, default 1
            // (immediately ahead). The engine counts from zero.
            let Some(half_steps_away) = parse_optional_int(&args, 1) else {
                return CommandOutcome::Invalid;
            };
            let ahead = half_steps_away - 1;
            let wall = match verb {
                "wallFront" => sim.is_wall_front(ahead),
                "wallRight" => sim.is_wall_right(ahead),
                "wallLeft" => sim.is_wall_left(ahead),
                "wallBack" => sim.is_wall_back(ahead),
                "wallFrontRight" => sim.is_wall_front_right(ahead),
                "wallFrontLeft" => sim.is_wall_front_left(ahead),
                "wallBackRight" => sim.is_wall_back_right(ahead),
                _ => sim.is_wall_back_left(ahead),
            };
            CommandOutcome::Reply(bool_reply(wall))
        }

        "moveForward" => {
            let Some(distance) = parse_optional_int(&args, 1) else {
                return CommandOutcome::Invalid;
            };
            start_move(sim, distance.saturating_mul(2))
        }
        "moveForwardHalf" => {
            let Some(half_steps) = parse_optional_int(&args, 1) else {
                return CommandOutcome::Invalid;
            };
            start_move(sim, half_steps)
        }

        "turnRight" | "turnRight90" if args.is_empty() => {
            sim.request_turn(TurnKind::Right90);
            CommandOutcome::Deferred
        }
        "turnLeft" | "turnLeft90" if args.is_empty() => {
            sim.request_turn(TurnKind::Left90);
            CommandOutcome::Deferred
        }
        "turnRight45" if args.is_empty() => {
            sim.request_turn(TurnKind::Right45);
            CommandOutcome::Deferred
        }
        "turnLeft45" if args.is_empty() => {
            sim.request_turn(TurnKind::Left45);
            CommandOutcome::Deferred
        }

        "setWall" | "clearWall" => {
            let &[x, y, dir] = args.as_slice() else {
                return CommandOutcome::Invalid;
            };
            let (Ok(x), Ok(y)) = (x.parse::<i32>(), y.parse::<i32>()) else {
                return CommandOutcome::Invalid;
            };
            let Some(dir) = single_char(dir).and_then(Direction::from_char) else {
                return CommandOutcome::Invalid;
            };
            let state = if verb == "setWall" {
                WallState::Wall
            } else {
                WallState::Open
            };
            sim.set_known_wall(x, y, dir, state);
            // Mirror onto the shared edge; out-of-bounds neighbours are
            // dropped by the engine.
            let (dx, dy) = dir.delta();
            sim.set_known_wall(x + dx, y + dy, dir.opposite(), state);
            CommandOutcome::Silent
        }

        "setColor" => {
            let &[x, y, color] = args.as_slice() else {
                return CommandOutcome::Invalid;
            };
            let (Ok(x), Ok(y)) = (x.parse::<i32>(), y.parse::<i32>()) else {
                return CommandOutcome::Invalid;
            };
            let Some(color) = single_char(color) else {
                return CommandOutcome::Invalid;
            };
            sim.set_cell_color(x, y, color);
            CommandOutcome::Silent
        }
        "clearColor" => match parse_cell(&args) {
            Some((x, y)) => {
                sim.clear_cell_color(x, y);
                CommandOutcome::Silent
            }
            None => CommandOutcome::Invalid,
        },
        "clearAllColor" if args.is_empty() => {
            sim.clear_all_colors();
            CommandOutcome::Silent
        }

        "setText" => set_text(sim, line),
        "clearText" => match parse_cell(&args) {
            Some((x, y)) => {
                sim.clear_cell_text(x, y);
                CommandOutcome::Silent
            }
            None => CommandOutcome::Invalid,
        },
        "clearAllText" if args.is_empty() => {
            sim.clear_all_text();
            CommandOutcome::Silent
        }

        "wasReset" if args.is_empty() => CommandOutcome::Reply(bool_reply(sim.was_reset())),
        "ackReset" if args.is_empty() => {
            sim.ack_reset();
            CommandOutcome::Reply("ack".to_string())
        }

        "getStat" => {
            let &[name] = args.as_slice() else {
                return CommandOutcome::Invalid;
            };
            let Some(stat) = StatId::from_wire_name(name) else {
                return CommandOutcome::Invalid;
            };
            let value = sim.stats().stat_string(stat);
            CommandOutcome::Reply(if value.is_empty() {
                "-1".to_string()
            } else {
                value
            })
        }

        _ => CommandOutcome::Invalid,
    }
}

fn start_move(sim: &mut Simulation, num_half_steps: i32) -> CommandOutcome {
    if sim.request_move(num_half_steps) {
        CommandOutcome::Deferred
    } else {
        // Nothing moved; the crash is reported synchronously.
        CommandOutcome::Reply("crash".to_string())
    }
}

/// `setText x y <text...>`: coordinates are tokenized, the payload is the
/// raw remainder after the third space, verbatim.
fn set_text(sim: &mut Simulation, line: &str) -> CommandOutcome {
    let Some(first) = line.find(' ') else {
        return CommandOutcome::Invalid;
    };
    let Some(second) = line[first + 1..].find(' ').map(|i| i + first + 1) else {
        return CommandOutcome::Invalid;
    };
    let Some(third) = line[second + 1..].find(' ').map(|i| i + second + 1) else {
        return CommandOutcome::Invalid;
    };

    let (Ok(x), Ok(y)) = (
        line[first + 1..second].parse::<i32>(),
        line[second + 1..third].parse::<i32>(),
    ) else {
        return CommandOutcome::Invalid;
    };
    sim.set_cell_text(x, y, &line[third + 1..]);
    CommandOutcome::Silent
}

fn parse_optional_int(args: &[&str], default: i32) -> Option<i32> {
    match args {
        [] => Some(default),
        [value] => value.parse().ok(),
        _ => None,
    }
}

fn parse_cell(args: &[&str]) -> Option<(i32, i32)> {
    match args {
        [x, y] => Some((x.parse().ok()?, y.parse().ok()?)),
        _ => None,
    }
}

fn single_char(token: &str) -> Option<char> {
    let mut chars = token.chars();
    let c = chars.next()?;
    chars.next().is_none().then_some(c)
}

fn bool_reply(value: bool) -> String {
    (if value { "true" } else { "false" }).to_string()
}
