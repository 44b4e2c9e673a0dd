//! Tick-driven micromouse simulation engine.
//!
//! The [`Simulation`] owns the maze exclusively and tracks the mouse on the
//! half-cell lattice `[0, 2W] x [0, 2H]`. The lattice parity classes decide
//! every sensor answer:
//!
//! * (even, even): a wall corner; blocked for any motion.
//! * (odd, odd): a cell interior; diagonal motion is blocked (it would cut
//!   through a corner), cardinal motion consults the cell's wall.
//! * mixed parity: a wall midpoint; motion along the wall is blocked,
//!   perpendicular motion is free, diagonal motion consults the adjacent
//!   cell's wall on the half being entered.
//!
//! Motion is requested up front (`request_move` / `request_turn`) and then
//! executed one half-step per `advance_one_tick` call. A request whose first
//! half-step is blocked fails immediately; a longer request that runs into a
//! wall partway is *doomed*: it executes up to the last open half-step and
//! reports a crash on its final tick. Alongside the true walls the engine
//! keeps the bot's knowledge overlay, per-cell annotations and the visited
//! set, none of which feed back into movement.

use std::collections::{BTreeSet, HashSet};

use core_events::{EventSink, TracingSink};
use core_geom::{Direction, SemiDirection, SemiPosition};
use core_maze::Maze;

mod mouse;
mod stats;

pub use mouse::Mouse;
pub use stats::{STAT_IDS, StatId, Stats};

/// The bot's per-side knowledge of a wall, independent of the true walls.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WallState {
    #[default]
    Unknown,
    Open,
    Wall,
}

/// What the mouse is currently executing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Movement {
    #[default]
    None,
    MoveStraight,
    MoveDiagonal,
    TurnLeft45,
    TurnRight45,
    TurnLeft90,
    TurnRight90,
}

/// A turn request, one tick to execute.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TurnKind {
    Left45,
    Right45,
    Left90,
    Right90,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MovementState {
    pub movement: Movement,
    pub half_steps_remaining: i32,
    /// The requested distance exceeds the first blocked half-step; the move
    /// will end in a collision on its final tick.
    pub doomed: bool,
}

/// Emitted by [`Simulation::advance_one_tick`] when a movement completes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MovementOutcome {
    pub crashed: bool,
}

pub struct Simulation {
    maze: Option<Maze>,
    mouse: Mouse,
    stats: Stats,
    movement: MovementState,
    reset_requested: bool,
    goal_reached: bool,
    step_count: i32,
    collision_count: i32,

    known_walls: Vec<Vec<[WallState; 4]>>,
    visited_cells: HashSet<(i32, i32)>,
    cell_colors: Vec<Vec<Option<char>>>,
    cell_text: Vec<Vec<String>>,

    start_cell: (i32, i32),
    goal_cells: BTreeSet<(i32, i32)>,

    sink: Box<dyn EventSink>,
}

impl Simulation {
    pub fn new() -> Self {
        Self {
            maze: None,
            mouse: Mouse::new(),
            stats: Stats::new(),
            movement: MovementState::default(),
            reset_requested: false,
            goal_reached: false,
            step_count: 0,
            collision_count: 0,
            known_walls: Vec::new(),
            visited_cells: HashSet::new(),
            cell_colors: Vec::new(),
            cell_text: Vec::new(),
            start_cell: (0, 0),
            goal_cells: BTreeSet::new(),
            sink: Box::new(TracingSink),
        }
    }

    /// Replace the observer receiving state-changed / event-logged
    /// notifications.
    pub fn set_sink(&mut self, sink: Box<dyn EventSink>) {
        self.sink = sink;
    }

    /// Install a maze. The engine performs a full reset, so the mouse starts
    /// over and all overlays are cleared.
    pub fn set_maze(&mut self, maze: Maze) {
        self.maze = Some(maze);
        self.reset();
    }

    pub fn maze(&self) -> Option<&Maze> {
        self.maze.as_ref()
    }

    /// Full engine reset: mouse pose, stats, movement, counters, visited
    /// set, knowledge grid and annotations. The start cell is immediately
    /// marked visited again.
    pub fn reset(&mut self) {
        self.mouse.reset();
        self.stats.reset_all();
        self.movement = MovementState::default();
        self.reset_requested = false;
        self.goal_reached = false;
        self.step_count = 0;
        self.collision_count = 0;
        self.visited_cells.clear();
        self.init_knowledge();
        self.mark_visited();
        self.sink.state_changed();
    }

    /// Flag a reset for the bot to poll via `was_reset`.
    pub fn request_reset(&mut self) {
        self.reset_requested = true;
    }

    pub fn was_reset(&self) -> bool {
        self.reset_requested
    }

    /// The bot consumed the reset flag: the mouse goes back to the start
    /// with a scoring penalty, but the visited set, knowledge and counters
    /// other than steps survive.
    pub fn ack_reset(&mut self) {
        self.mouse.reset();
        self.movement = MovementState::default();
        self.reset_requested = false;
        self.goal_reached = false;
        self.stats.penalize_for_reset();
        self.stats.end_unfinished_run();
        self.step_count = 0;
        self.log_event("Reset acknowledged");
        self.sink.state_changed();
    }

    /// Request a translation of `num_half_steps` along the current heading.
    /// Fails (returns false) without touching any state when there is no
    /// maze, the distance is not positive, or the very next half-step is
    /// already blocked.
    pub fn request_move(&mut self, num_half_steps: i32) -> bool {
        if self.maze.is_none() {
            return false;
        }
        if num_half_steps < 1 {
            return false;
        }
        if self.is_wall_front(0) {
            return false;
        }

        let mut allowed = 1;
        while allowed < num_half_steps && !self.is_wall_front(allowed) {
            allowed += 1;
        }

        self.movement = MovementState {
            movement: if self.mouse.heading().is_diagonal() {
                Movement::MoveDiagonal
            } else {
                Movement::MoveStraight
            },
            half_steps_remaining: allowed,
            doomed: allowed != num_half_steps,
        };

        if self.mouse.position().to_cell() == self.start_cell {
            self.stats.start_run();
        }
        // The requested distance is charged, not the allowed one.
        self.stats.add_distance(num_half_steps);
        self.log_event(&format!("Move {num_half_steps} half-steps"));
        self.sink.state_changed();
        true
    }

    /// Request a turn; executes on the next tick.
    pub fn request_turn(&mut self, kind: TurnKind) {
        self.movement = MovementState {
            movement: match kind {
                TurnKind::Left45 => Movement::TurnLeft45,
                TurnKind::Right45 => Movement::TurnRight45,
                TurnKind::Left90 => Movement::TurnLeft90,
                TurnKind::Right90 => Movement::TurnRight90,
            },
            half_steps_remaining: 0,
            doomed: false,
        };
        self.stats.add_turn();
        self.log_event("Turn requested");
        self.sink.state_changed();
    }

    pub fn is_moving(&self) -> bool {
        self.movement.movement != Movement::None
    }

    pub fn movement_state(&self) -> MovementState {
        self.movement
    }

    /// Advance the movement state machine by one tick. Turns complete
    /// immediately; translations advance one half-step. Returns the
    /// completion outcome on the tick the movement finishes.
    pub fn advance_one_tick(&mut self) -> Option<MovementOutcome> {
        self.maze.as_ref()?;

        let rotated = match self.movement.movement {
            Movement::None => return None,
            Movement::TurnLeft45 => Some(self.mouse.heading().rotate_left_45()),
            Movement::TurnRight45 => Some(self.mouse.heading().rotate_right_45()),
            Movement::TurnLeft90 => Some(self.mouse.heading().rotate_left_90()),
            Movement::TurnRight90 => Some(self.mouse.heading().rotate_right_90()),
            Movement::MoveStraight | Movement::MoveDiagonal => None,
        };
        if let Some(heading) = rotated {
            self.mouse.set_heading(heading);
            self.movement = MovementState::default();
            self.sink.state_changed();
            return Some(MovementOutcome { crashed: false });
        }

        if self.movement.half_steps_remaining > 0 {
            let pos = self.mouse.position().translated(self.mouse.heading());
            self.mouse.set_position(pos);
            self.movement.half_steps_remaining -= 1;
            self.step_count += 1;
            self.mark_visited();
        }

        let mut outcome = None;
        if self.movement.half_steps_remaining == 0 {
            let crashed = self.movement.doomed;
            if crashed {
                self.collision_count += 1;
                self.log_event("Collision");
            }
            self.movement = MovementState::default();
            outcome = Some(MovementOutcome { crashed });
        }

        self.sink.state_changed();
        outcome
    }

    // ---------------------------------------------------------------------
    // Sensors
    // ---------------------------------------------------------------------

    pub fn is_wall_front(&self, half_steps_ahead: i32) -> bool {
        self.probe(self.mouse.heading(), half_steps_ahead)
    }

    pub fn is_wall_left(&self, half_steps_ahead: i32) -> bool {
        self.probe(self.mouse.heading().rotate_left_90(), half_steps_ahead)
    }

    pub fn is_wall_right(&self, half_steps_ahead: i32) -> bool {
        self.probe(self.mouse.heading().rotate_right_90(), half_steps_ahead)
    }

    pub fn is_wall_back(&self, half_steps_ahead: i32) -> bool {
        self.probe(self.mouse.heading().rotate_180(), half_steps_ahead)
    }

    pub fn is_wall_front_left(&self, half_steps_ahead: i32) -> bool {
        self.probe(self.mouse.heading().rotate_left_45(), half_steps_ahead)
    }

    pub fn is_wall_front_right(&self, half_steps_ahead: i32) -> bool {
        self.probe(self.mouse.heading().rotate_right_45(), half_steps_ahead)
    }

    pub fn is_wall_back_left(&self, half_steps_ahead: i32) -> bool {
        self.probe(
            self.mouse.heading().rotate_left_45().rotate_left_90(),
            half_steps_ahead,
        )
    }

    pub fn is_wall_back_right(&self, half_steps_ahead: i32) -> bool {
        self.probe(
            self.mouse.heading().rotate_right_45().rotate_right_90(),
            half_steps_ahead,
        )
    }

    fn probe(&self, dir: SemiDirection, half_steps_ahead: i32) -> bool {
        self.is_wall_at_depth(self.mouse.position(), dir, half_steps_ahead)
    }

    /// True if any of `pos`, `pos + delta`, ..., `pos + k*delta` answers
    /// "wall" for `dir`.
    fn is_wall_at_depth(&self, pos: SemiPosition, dir: SemiDirection, k: i32) -> bool {
        if self.is_wall_at(pos, dir) {
            return true;
        }
        let mut cursor = pos;
        for _ in 1..=k {
            cursor = cursor.translated(dir);
            if self.is_wall_at(cursor, dir) {
                return true;
            }
        }
        false
    }

    /// The sensor predicate on the half-cell lattice; see the module docs
    /// for the parity-class rules.
    fn is_wall_at(&self, pos: SemiPosition, dir: SemiDirection) -> bool {
        let Some(maze) = &self.maze else {
            return true;
        };
        let max_x = maze.width() * 2;
        let max_y = maze.height() * 2;
        if pos.x < 0 || pos.y < 0 || pos.x > max_x || pos.y > max_y {
            return true;
        }

        let (cell_x, cell_y) = pos.to_cell();
        let x_even = pos.x % 2 == 0;
        let y_even = pos.y % 2 == 0;

        if x_even && y_even {
            return true;
        }

        if !x_even && !y_even {
            if dir.is_diagonal() {
                return true;
            }
            return match dir.to_cardinal() {
                Some(cardinal) => maze.is_wall(cell_x, cell_y, cardinal),
                None => true,
            };
        }

        if x_even {
            // Vertical wall midpoint: the boundary between cell_x - 1 and
            // cell_x. Diagonals consult the north/south wall of the cell
            // being entered; at the outer border there is no such cell.
            return match dir {
                SemiDirection::North | SemiDirection::South => true,
                SemiDirection::East | SemiDirection::West => false,
                SemiDirection::NorthEast => {
                    pos.x != max_x && maze.is_wall(cell_x, cell_y, Direction::North)
                }
                SemiDirection::SouthEast => {
                    pos.x != max_x && maze.is_wall(cell_x, cell_y, Direction::South)
                }
                SemiDirection::NorthWest => {
                    pos.x != 0 && maze.is_wall(cell_x - 1, cell_y, Direction::North)
                }
                SemiDirection::SouthWest => {
                    pos.x != 0 && maze.is_wall(cell_x - 1, cell_y, Direction::South)
                }
            };
        }

        // Horizontal wall midpoint, mirrored.
        match dir {
            SemiDirection::East | SemiDirection::West => true,
            SemiDirection::North | SemiDirection::South => false,
            SemiDirection::NorthEast => {
                pos.y != max_y && maze.is_wall(cell_x, cell_y, Direction::East)
            }
            SemiDirection::NorthWest => {
                pos.y != max_y && maze.is_wall(cell_x, cell_y, Direction::West)
            }
            SemiDirection::SouthEast => {
                pos.y != 0 && maze.is_wall(cell_x, cell_y - 1, Direction::East)
            }
            SemiDirection::SouthWest => {
                pos.y != 0 && maze.is_wall(cell_x, cell_y - 1, Direction::West)
            }
        }
    }

    // ---------------------------------------------------------------------
    // Accessors
    // ---------------------------------------------------------------------

    pub fn mouse(&self) -> &Mouse {
        &self.mouse
    }

    pub fn mouse_mut(&mut self) -> &mut Mouse {
        &mut self.mouse
    }

    pub fn stats(&self) -> &Stats {
        &self.stats
    }

    pub fn collision_count(&self) -> i32 {
        self.collision_count
    }

    pub fn step_count(&self) -> i32 {
        self.step_count
    }

    pub fn goal_reached(&self) -> bool {
        self.goal_reached
    }

    pub fn start_cell(&self) -> (i32, i32) {
        self.start_cell
    }

    /// The explicit goal set, or the maze's center cells when none has been
    /// configured.
    pub fn goal_cells(&self) -> BTreeSet<(i32, i32)> {
        if !self.goal_cells.is_empty() {
            return self.goal_cells.clone();
        }
        match &self.maze {
            Some(maze) => Maze::center_cells(maze.width(), maze.height())
                .into_iter()
                .collect(),
            None => BTreeSet::new(),
        }
    }

    pub fn set_start_cell(&mut self, x: i32, y: i32) {
        if self.in_bounds(x, y) {
            self.start_cell = (x, y);
            self.sink.state_changed();
        }
    }

    pub fn set_goal_cell(&mut self, x: i32, y: i32) {
        if self.in_bounds(x, y) {
            self.goal_cells.insert((x, y));
            self.sink.state_changed();
        }
    }

    fn is_goal(&self, cell: (i32, i32)) -> bool {
        if !self.goal_cells.is_empty() {
            return self.goal_cells.contains(&cell);
        }
        match &self.maze {
            Some(maze) => maze.is_center(cell.0, cell.1),
            None => false,
        }
    }

    // ---------------------------------------------------------------------
    // Knowledge overlay
    // ---------------------------------------------------------------------

    pub fn known_wall(&self, x: i32, y: i32, dir: Direction) -> WallState {
        if !self.in_bounds(x, y) {
            return WallState::Unknown;
        }
        self.known_walls[x as usize][y as usize][dir.index()]
    }

    pub fn set_known_wall(&mut self, x: i32, y: i32, dir: Direction, state: WallState) {
        if !self.in_bounds(x, y) {
            return;
        }
        self.known_walls[x as usize][y as usize][dir.index()] = state;
        self.sink.state_changed();
    }

    pub fn cell_visited(&self, x: i32, y: i32) -> bool {
        self.visited_cells.contains(&(x, y))
    }

    pub fn visited_cells(&self) -> &HashSet<(i32, i32)> {
        &self.visited_cells
    }

    // ---------------------------------------------------------------------
    // Annotations
    // ---------------------------------------------------------------------

    pub fn cell_color(&self, x: i32, y: i32) -> Option<char> {
        if !self.in_bounds(x, y) {
            return None;
        }
        self.cell_colors[x as usize][y as usize]
    }

    pub fn set_cell_color(&mut self, x: i32, y: i32, color: char) {
        if !self.in_bounds(x, y) {
            return;
        }
        self.cell_colors[x as usize][y as usize] = Some(color);
        self.sink.state_changed();
    }

    pub fn clear_cell_color(&mut self, x: i32, y: i32) {
        if !self.in_bounds(x, y) {
            return;
        }
        self.cell_colors[x as usize][y as usize] = None;
        self.sink.state_changed();
    }

    pub fn clear_all_colors(&mut self) {
        for column in &mut self.cell_colors {
            column.fill(None);
        }
        self.sink.state_changed();
    }

    pub fn cell_text(&self, x: i32, y: i32) -> &str {
        if !self.in_bounds(x, y) {
            return "";
        }
        &self.cell_text[x as usize][y as usize]
    }

    pub fn set_cell_text(&mut self, x: i32, y: i32, text: &str) {
        if !self.in_bounds(x, y) {
            return;
        }
        self.cell_text[x as usize][y as usize] = text.to_string();
        self.sink.state_changed();
    }

    pub fn clear_cell_text(&mut self, x: i32, y: i32) {
        if !self.in_bounds(x, y) {
            return;
        }
        self.cell_text[x as usize][y as usize].clear();
        self.sink.state_changed();
    }

    pub fn clear_all_text(&mut self) {
        for column in &mut self.cell_text {
            for text in column {
                text.clear();
            }
        }
        self.sink.state_changed();
    }

    // ---------------------------------------------------------------------
    // Internals
    // ---------------------------------------------------------------------

    fn in_bounds(&self, x: i32, y: i32) -> bool {
        match &self.maze {
            Some(maze) => maze.in_bounds(x, y),
            None => false,
        }
    }

    fn init_knowledge(&mut self) {
        let (width, height) = match &self.maze {
            Some(maze) => (maze.width() as usize, maze.height() as usize),
            None => (0, 0),
        };
        self.known_walls = vec![vec![[WallState::Unknown; 4]; height]; width];
        self.cell_colors = vec![vec![None; height]; width];
        self.cell_text = vec![vec![String::new(); height]; width];
    }

    /// Record the mouse's current cell. Entering a goal cell for the first
    /// time finishes the run; re-entering the start cell without having
    /// reached the goal abandons it.
    fn mark_visited(&mut self) {
        let cell = self.mouse.position().to_cell();
        if !self.in_bounds(cell.0, cell.1) {
            return;
        }
        self.visited_cells.insert(cell);
        if self.is_goal(cell) {
            if !self.goal_reached {
                self.goal_reached = true;
                self.stats.finish_run();
                self.log_event("Goal reached");
            }
        } else if cell == self.start_cell {
            self.stats.end_unfinished_run();
        }
    }

    fn log_event(&mut self, message: &str) {
        tracing::debug!(target: "sim", "{message}");
        self.sink.event_logged(message);
    }
}

impl Default for Simulation {
    fn default() -> Self {
        Self::new()
    }
}
