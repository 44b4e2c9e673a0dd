//! Controller <-> simulation handshake scenarios with a mock bot link.

use std::cell::RefCell;
use std::rc::Rc;

use core_control::{BotLink, Controller};
use core_events::EventSink;
use core_geom::Direction;
use core_maze::Maze;
use core_sim::{Simulation, WallState};

#[derive(Clone, Default)]
struct MockBot {
    sent: Rc<RefCell<Vec<String>>>,
}

impl MockBot {
    fn sent(&self) -> Vec<String> {
        self.sent.borrow().clone()
    }
}

impl BotLink for MockBot {
    fn send_line(&mut self, line: &str) {
        self.sent.borrow_mut().push(line.to_string());
    }
}

#[derive(Clone, Default)]
struct LogCapture {
    messages: Rc<RefCell<Vec<String>>>,
}

impl LogCapture {
    fn messages(&self) -> Vec<String> {
        self.messages.borrow().clone()
    }
}

impl EventSink for LogCapture {
    fn event_logged(&mut self, message: &str) {
        self.messages.borrow_mut().push(message.to_string());
    }
}

fn open_maze(width: i32, height: i32) -> Maze {
    let mut maze = Maze::new(width, height);
    for x in 0..width {
        maze.set_wall(x, 0, Direction::South, true);
        maze.set_wall(x, height - 1, Direction::North, true);
    }
    for y in 0..height {
        maze.set_wall(0, y, Direction::West, true);
        maze.set_wall(width - 1, y, Direction::East, true);
    }
    maze
}

fn harness(maze: Maze) -> (Simulation, Controller, MockBot, LogCapture) {
    let mut sim = Simulation::new();
    sim.set_maze(maze);
    let bot = MockBot::default();
    let capture = LogCapture::default();
    let mut controller = Controller::new();
    controller.set_sink(Box::new(capture.clone()));
    controller.attach_bot(Box::new(bot.clone()));
    (sim, controller, bot, capture)
}

#[test]
fn motion_defers_until_ticks_complete_it() {
    let (mut sim, mut controller, bot, _capture) = harness(open_maze(3, 3));

    controller.enqueue_command(&mut sim, "moveForward 1");
    assert!(bot.sent().is_empty(), "motion must not answer synchronously");

    controller.tick(&mut sim);
    assert!(bot.sent().is_empty(), "one half-step remains");
    controller.tick(&mut sim);
    assert_eq!(bot.sent(), vec!["ack"]);

    // Sensors answer synchronously and observe the post-motion state.
    controller.enqueue_command(&mut sim, "wallFront");
    assert_eq!(bot.sent(), vec!["ack", "false"]);
}

#[test]
fn queued_commands_wait_behind_a_deferred_motion() {
    let (mut sim, mut controller, bot, _capture) = harness(open_maze(3, 3));

    controller.enqueue_command(&mut sim, "moveForward 1");
    controller.enqueue_command(&mut sim, "wallLeft");
    controller.enqueue_command(&mut sim, "turnLeft");
    assert!(bot.sent().is_empty());

    controller.tick(&mut sim);
    controller.tick(&mut sim);
    // ack, then the sensor, then the turn deferred again.
    assert_eq!(bot.sent(), vec!["ack", "true"]);

    controller.tick(&mut sim);
    assert_eq!(bot.sent(), vec!["ack", "true", "ack"]);
}

#[test]
fn blocked_move_crashes_synchronously() {
    let mut maze = Maze::new(2, 2);
    for x in 0..2 {
        for y in 0..2 {
            for dir in core_geom::CARDINAL_DIRECTIONS {
                maze.set_wall(x, y, dir, true);
            }
        }
    }
    let (mut sim, mut controller, bot, _capture) = harness(maze);

    controller.enqueue_command(&mut sim, "moveForward");
    assert_eq!(bot.sent(), vec!["crash"]);
    assert_eq!(sim.collision_count(), 0);

    // Dispatch was not suspended: the next query answers immediately.
    controller.enqueue_command(&mut sim, "mazeWidth");
    assert_eq!(bot.sent(), vec!["crash", "2"]);
}

#[test]
fn maze_queries_and_goals() {
    let (mut sim, mut controller, bot, _capture) = harness(open_maze(4, 4));

    controller.enqueue_command(&mut sim, "mazeWidth");
    controller.enqueue_command(&mut sim, "mazeHeight");
    controller.enqueue_command(&mut sim, "goalCount");
    controller.enqueue_command(&mut sim, "goalCell 0");
    controller.enqueue_command(&mut sim, "goalCell 3");
    controller.enqueue_command(&mut sim, "isGoal");
    assert_eq!(
        bot.sent(),
        vec!["4", "4", "4", "1 1", "2 2", "false"]
    );
}

#[test]
fn goal_cells_are_indexed_row_major_from_the_south() {
    let (mut sim, mut controller, bot, _capture) = harness(open_maze(4, 4));
    sim.set_goal_cell(3, 2);
    sim.set_goal_cell(0, 2);
    sim.set_goal_cell(1, 0);

    controller.enqueue_command(&mut sim, "goalCount");
    controller.enqueue_command(&mut sim, "goalCell 0");
    controller.enqueue_command(&mut sim, "goalCell 1");
    controller.enqueue_command(&mut sim, "goalCell 2");
    assert_eq!(bot.sent(), vec!["3", "1 0", "0 2", "3 2"]);
}

#[test]
fn invalid_commands_are_logged_and_unanswered() {
    let (mut sim, mut controller, bot, capture) = harness(open_maze(3, 3));

    controller.enqueue_command(&mut sim, "frobnicate");
    controller.enqueue_command(&mut sim, "wallFront abc");
    controller.enqueue_command(&mut sim, "setWall 1");
    controller.enqueue_command(&mut sim, "setWall 1 1 q");
    controller.enqueue_command(&mut sim, "goalCell 99");
    controller.enqueue_command(&mut sim, "getStat bogus-stat");
    controller.enqueue_command(&mut sim, "turnLeft extra");

    assert!(bot.sent().is_empty());
    let logged = capture.messages();
    assert_eq!(logged.len(), 7);
    assert!(logged.iter().all(|m| m.starts_with("Invalid command: ")));
    assert!(logged.contains(&"Invalid command: wallFront abc".to_string()));

    // The controller keeps going after invalid input.
    controller.enqueue_command(&mut sim, "mazeWidth");
    assert_eq!(bot.sent(), vec!["3"]);
}

#[test]
fn known_wall_edits_mirror_both_sides() {
    let (mut sim, mut controller, _bot, _capture) = harness(open_maze(3, 3));

    controller.enqueue_command(&mut sim, "setWall 0 0 e");
    assert_eq!(sim.known_wall(0, 0, Direction::East), WallState::Wall);
    assert_eq!(sim.known_wall(1, 0, Direction::West), WallState::Wall);

    controller.enqueue_command(&mut sim, "clearWall 0 0 e");
    assert_eq!(sim.known_wall(0, 0, Direction::East), WallState::Open);
    assert_eq!(sim.known_wall(1, 0, Direction::West), WallState::Open);

    // Border edit: the outside neighbour is silently skipped.
    controller.enqueue_command(&mut sim, "setWall 0 0 w");
    assert_eq!(sim.known_wall(0, 0, Direction::West), WallState::Wall);

    // The true maze is untouched throughout.
    assert!(!sim.maze().unwrap().is_wall(0, 0, Direction::East));
}

#[test]
fn annotations_via_protocol() {
    let (mut sim, mut controller, bot, _capture) = harness(open_maze(3, 3));

    controller.enqueue_command(&mut sim, "setColor 1 2 G");
    assert_eq!(sim.cell_color(1, 2), Some('G'));
    controller.enqueue_command(&mut sim, "clearColor 1 2");
    assert_eq!(sim.cell_color(1, 2), None);

    controller.enqueue_command(&mut sim, "setText 2 1 dead end");
    assert_eq!(sim.cell_text(2, 1), "dead end");
    controller.enqueue_command(&mut sim, "clearText 2 1");
    assert_eq!(sim.cell_text(2, 1), "");

    controller.enqueue_command(&mut sim, "setColor 0 0 r");
    controller.enqueue_command(&mut sim, "setText 0 0 home");
    controller.enqueue_command(&mut sim, "clearAllColor");
    controller.enqueue_command(&mut sim, "clearAllText");
    assert_eq!(sim.cell_color(0, 0), None);
    assert_eq!(sim.cell_text(0, 0), "");

    // Annotation commands never answer.
    assert!(bot.sent().is_empty());
}

#[test]
fn set_text_payload_is_verbatim() {
    let (mut sim, mut controller, _bot, capture) = harness(open_maze(3, 3));

    controller.enqueue_command(&mut sim, "setText 0 0 a  b   c ");
    assert_eq!(sim.cell_text(0, 0), "a  b   c ");

    controller.enqueue_command(&mut sim, "setText 0 1 ");
    assert_eq!(sim.cell_text(0, 1), "");

    // Fewer than three spaces: invalid.
    controller.enqueue_command(&mut sim, "setText 0 0");
    assert_eq!(capture.messages(), vec!["Invalid command: setText 0 0"]);
}

#[test]
fn reset_dialog_round_trip() {
    let (mut sim, mut controller, bot, _capture) = harness(open_maze(3, 3));

    controller.enqueue_command(&mut sim, "wasReset");
    assert_eq!(bot.sent(), vec!["false"]);

    sim.request_reset();
    controller.enqueue_command(&mut sim, "wasReset");
    controller.enqueue_command(&mut sim, "ackReset");
    controller.enqueue_command(&mut sim, "wasReset");
    assert_eq!(bot.sent(), vec!["false", "true", "ack", "false"]);
    assert!(!sim.was_reset());
}

#[test]
fn stats_over_the_wire() {
    let (mut sim, mut controller, bot, _capture) = harness(open_maze(3, 3));

    controller.enqueue_command(&mut sim, "getStat total-distance");
    controller.enqueue_command(&mut sim, "getStat best-run-turns");
    controller.enqueue_command(&mut sim, "getStat score");
    assert_eq!(bot.sent(), vec!["0", "-1", "2000"]);

    controller.enqueue_command(&mut sim, "moveForwardHalf 3");
    for _ in 0..3 {
        controller.tick(&mut sim);
    }
    controller.enqueue_command(&mut sim, "getStat total-distance");
    controller.enqueue_command(&mut sim, "getStat total-effective-distance");
    assert_eq!(
        bot.sent(),
        vec!["0", "-1", "2000", "ack", "3", "2.5"]
    );
}

#[test]
fn pause_holds_the_queue_without_losing_it() {
    let (mut sim, mut controller, bot, _capture) = harness(open_maze(3, 3));

    controller.set_paused(true, &mut sim);
    controller.enqueue_command(&mut sim, "mazeWidth");
    controller.enqueue_command(&mut sim, "mazeHeight");
    assert!(bot.sent().is_empty());

    controller.set_paused(false, &mut sim);
    assert_eq!(bot.sent(), vec!["3", "3"]);
}

#[test]
fn pause_during_deferred_motion_still_completes_handshake() {
    let (mut sim, mut controller, bot, _capture) = harness(open_maze(3, 3));

    controller.enqueue_command(&mut sim, "moveForward 1");
    controller.enqueue_command(&mut sim, "mazeWidth");
    controller.set_paused(true, &mut sim);

    // Ticks keep flowing while paused; the deferred response is still sent.
    controller.tick(&mut sim);
    controller.tick(&mut sim);
    assert_eq!(bot.sent(), vec!["ack"]);

    // The rest of the queue drains on unpause.
    controller.set_paused(false, &mut sim);
    assert_eq!(bot.sent(), vec!["ack", "3"]);
}

#[test]
fn reset_state_drops_pending_work() {
    let (mut sim, mut controller, bot, _capture) = harness(open_maze(3, 3));

    controller.enqueue_command(&mut sim, "moveForward 1");
    controller.enqueue_command(&mut sim, "mazeWidth");
    controller.reset_state();

    // Movement completes with nobody waiting; no response is emitted.
    controller.tick(&mut sim);
    controller.tick(&mut sim);
    assert!(bot.sent().is_empty());
    assert!(!sim.is_moving());
}

#[test]
fn empty_lines_are_skipped() {
    let (mut sim, mut controller, bot, capture) = harness(open_maze(3, 3));
    controller.enqueue_command(&mut sim, "");
    controller.enqueue_command(&mut sim, "   ");
    controller.enqueue_command(&mut sim, "mazeWidth");
    assert_eq!(bot.sent(), vec!["3"]);
    assert!(capture.messages().is_empty());
}
