//! Maze model: wall grid, structural validation, goal cells, distance field.
//!
//! A maze is a `width x height` grid of [`Cell`]s, each carrying four wall
//! flags. Walls are stored per cell side, so every interior edge exists
//! twice; the structural validators enforce that the two copies agree, that
//! the outer border is fully walled, and that the grid is rectangular.
//! File formats and generation live in the [`format`] and [`generate`]
//! submodules.

use std::collections::VecDeque;

use core_geom::Direction;

pub mod format;
pub mod generate;
mod rng;

pub use generate::generate;
pub use rng::MazeRng;

/// Structural and parse errors for mazes, see the format docs for where each
/// arises.
#[derive(Debug, thiserror::Error)]
pub enum MazeError {
    #[error("empty maze path")]
    EmptyPath,
    #[error("failed to open maze file: {0}")]
    Open(#[source] std::io::Error),
    #[error("no maze lines")]
    EmptyLines,
    #[error("invalid maze dimensions")]
    InvalidDimensions,
    #[error("map line out of range")]
    LineOutOfRange,
    #[error("map column out of range")]
    ColumnOutOfRange,
    #[error("invalid integer in maze line")]
    InvalidInteger,
    #[error("negative cell coordinates")]
    NegativeCoordinates,
    #[error("maze is not rectangular")]
    NotRectangular,
    #[error("maze is not enclosed")]
    NotEnclosed,
    #[error("maze walls are inconsistent")]
    NotConsistent,
    #[error("unsupported maze format")]
    UnsupportedFormat,
}

/// Wall flags for one cell.
///
/// It is a structural error (caught by [`Maze::validate`]) for a cell to
/// carry `east` while its eastern neighbour does not carry `west`, and so on
/// for the other shared edges.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Cell {
    pub north: bool,
    pub east: bool,
    pub south: bool,
    pub west: bool,
}

impl Cell {
    pub fn wall(&self, dir: Direction) -> bool {
        match dir {
            Direction::North => self.north,
            Direction::East => self.east,
            Direction::South => self.south,
            Direction::West => self.west,
        }
    }

    pub fn set_wall(&mut self, dir: Direction, present: bool) {
        match dir {
            Direction::North => self.north = present,
            Direction::East => self.east = present,
            Direction::South => self.south = present,
            Direction::West => self.west = present,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Maze {
    width: i32,
    height: i32,
    // Indexed cells[x][y], column major.
    cells: Vec<Vec<Cell>>,
}

impl Maze {
    /// A maze with every wall absent. Callers fill the walls in; the result
    /// is not valid until the border walls exist.
    pub fn new(width: i32, height: i32) -> Self {
        assert!(width > 0 && height > 0, "maze dimensions must be positive");
        Self {
            width,
            height,
            cells: vec![vec![Cell::default(); height as usize]; width as usize],
        }
    }

    fn from_cells(cells: Vec<Vec<Cell>>) -> Self {
        let width = cells.len() as i32;
        let height = cells[0].len() as i32;
        Self {
            width,
            height,
            cells,
        }
    }

    pub fn width(&self) -> i32 {
        self.width
    }

    pub fn height(&self) -> i32 {
        self.height
    }

    pub fn in_bounds(&self, x: i32, y: i32) -> bool {
        x >= 0 && y >= 0 && x < self.width && y < self.height
    }

    /// Direct cell access. Panics out of bounds; probe with [`Maze::in_bounds`]
    /// first.
    pub fn cell(&self, x: i32, y: i32) -> &Cell {
        &self.cells[x as usize][y as usize]
    }

    pub fn is_wall(&self, x: i32, y: i32, dir: Direction) -> bool {
        self.cell(x, y).wall(dir)
    }

    /// Sets one side of one wall. Keeping the neighbouring cell's mirror flag
    /// in sync is the caller's job; the generator and editors always write
    /// both sides.
    pub fn set_wall(&mut self, x: i32, y: i32, dir: Direction, present: bool) {
        self.cells[x as usize][y as usize].set_wall(dir, present);
    }

    /// The goal region for a `width x height` maze: the 1, 2 or 4 cells
    /// around the geometric center, depending on dimension parity.
    pub fn center_cells(width: i32, height: i32) -> Vec<(i32, i32)> {
        let a = ((width - 1) / 2, (height - 1) / 2);
        let b = (width / 2, (height - 1) / 2);
        let c = ((width - 1) / 2, height / 2);
        let d = (width / 2, height / 2);

        let mut positions = vec![a];
        if width % 2 == 0 && height % 2 == 0 {
            positions.push(b);
            positions.push(c);
            positions.push(d);
        } else if width % 2 == 0 {
            positions.push(b);
        } else if height % 2 == 0 {
            positions.push(c);
        }
        positions
    }

    pub fn is_center(&self, x: i32, y: i32) -> bool {
        Self::center_cells(self.width, self.height).contains(&(x, y))
    }

    /// Breadth-first distances from the goal set along open edges.
    /// Unreachable cells are left at -1.
    pub fn distances_to_center(&self) -> Vec<Vec<i32>> {
        let mut distances = vec![vec![-1; self.height as usize]; self.width as usize];
        let mut queue = VecDeque::new();

        for (x, y) in Self::center_cells(self.width, self.height) {
            distances[x as usize][y as usize] = 0;
            queue.push_back((x, y));
        }

        while let Some((x, y)) = queue.pop_front() {
            let base = distances[x as usize][y as usize];
            let cell = self.cell(x, y);

            if !cell.north && y + 1 < self.height && distances[x as usize][y as usize + 1] == -1 {
                distances[x as usize][y as usize + 1] = base + 1;
                queue.push_back((x, y + 1));
            }
            if !cell.east && x + 1 < self.width && distances[x as usize + 1][y as usize] == -1 {
                distances[x as usize + 1][y as usize] = base + 1;
                queue.push_back((x + 1, y));
            }
            if !cell.south && y - 1 >= 0 && distances[x as usize][y as usize - 1] == -1 {
                distances[x as usize][y as usize - 1] = base + 1;
                queue.push_back((x, y - 1));
            }
            if !cell.west && x - 1 >= 0 && distances[x as usize - 1][y as usize] == -1 {
                distances[x as usize - 1][y as usize] = base + 1;
                queue.push_back((x - 1, y));
            }
        }

        distances
    }

    /// Rectangular, enclosed and consistent, or the first violation found.
    pub fn validate(&self) -> Result<(), MazeError> {
        validate_cells(&self.cells)
    }

    pub fn is_valid(&self) -> bool {
        self.validate().is_ok()
    }
}

/// Validate a column-major cell grid under construction. Split out so the
/// parsers can reject a grid before wrapping it in a [`Maze`].
fn validate_cells(cells: &[Vec<Cell>]) -> Result<(), MazeError> {
    if !is_rectangular(cells) {
        return Err(MazeError::NotRectangular);
    }
    if !is_enclosed(cells) {
        return Err(MazeError::NotEnclosed);
    }
    if !is_consistent(cells) {
        return Err(MazeError::NotConsistent);
    }
    Ok(())
}

fn is_rectangular(cells: &[Vec<Cell>]) -> bool {
    let Some(first) = cells.first() else {
        return false;
    };
    let height = first.len();
    height > 0 && cells.iter().all(|column| column.len() == height)
}

fn is_enclosed(cells: &[Vec<Cell>]) -> bool {
    let width = cells.len();
    let height = cells[0].len();
    for (x, column) in cells.iter().enumerate() {
        for (y, cell) in column.iter().enumerate() {
            if x == 0 && !cell.west {
                return false;
            }
            if y == 0 && !cell.south {
                return false;
            }
            if x == width - 1 && !cell.east {
                return false;
            }
            if y == height - 1 && !cell.north {
                return false;
            }
        }
    }
    true
}

fn is_consistent(cells: &[Vec<Cell>]) -> bool {
    let width = cells.len();
    let height = cells[0].len();
    for x in 0..width {
        for y in 0..height {
            let cell = &cells[x][y];
            if x > 0 && cell.west != cells[x - 1][y].east {
                return false;
            }
            if y > 0 && cell.south != cells[x][y - 1].north {
                return false;
            }
            if x < width - 1 && cell.east != cells[x + 1][y].west {
                return false;
            }
            if y < height - 1 && cell.north != cells[x][y + 1].south {
                return false;
            }
        }
    }
    true
}
