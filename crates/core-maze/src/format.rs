//! Maze file formats.
//!
//! Two formats are supported, with auto-detection on load:
//!
//! * `num`: one line per cell, `x y n e s w`, where each wall flag is 0
//!   or 1. Line order is unspecified; the serializer emits column-major.
//!   Dimensions are inferred from the largest coordinates seen, and every
//!   cell in that rectangle must be present.
//! * `map`: ASCII art with a 2-line vertical and 4-column horizontal
//!   stride per cell. Line 0 of the file is the top row, so the parser
//!   reverses the lines first; after inversion cell (0,0) is bottom-left.
//!   Any non-space character at a wall slot means the wall is present.
//!
//! The `map` parser rejects grids that are not rectangular, enclosed and
//! consistent; the `num` parser checks only that the coordinate rectangle is
//! fully populated, since wall lists are also used for partially-known or
//! hand-edited mazes.

use std::fs;
use std::path::Path;

use tracing::debug;

use crate::{Cell, Maze, MazeError, validate_cells};

impl Maze {
    /// Reads a maze file, trying the `map` parser first and falling back to
    /// `num`. A file neither parser accepts is an unsupported format; the
    /// per-parser reasons are only logged.
    pub fn from_file(path: &Path) -> Result<Maze, MazeError> {
        if path.as_os_str().is_empty() {
            return Err(MazeError::EmptyPath);
        }
        let content = fs::read_to_string(path).map_err(MazeError::Open)?;
        let lines: Vec<&str> = content.lines().collect();

        let map_err = match Maze::from_map_lines(&lines) {
            Ok(maze) => return Ok(maze),
            Err(e) => e,
        };
        let num_err = match Maze::from_num_lines(&lines) {
            Ok(maze) => return Ok(maze),
            Err(e) => e,
        };
        debug!(
            target: "maze.format",
            path = %path.display(),
            %map_err,
            %num_err,
            "neither maze parser accepted the file"
        );
        Err(MazeError::UnsupportedFormat)
    }

    pub fn from_map_lines(lines: &[&str]) -> Result<Maze, MazeError> {
        if lines.is_empty() {
            return Err(MazeError::EmptyLines);
        }

        let mut rows: Vec<Vec<char>> = lines.iter().map(|line| line.chars().collect()).collect();
        rows.reverse();

        let height = rows.len() / 2;
        let width = if height > 0 { rows[0].len() / 4 } else { 0 };
        if width == 0 || height == 0 {
            return Err(MazeError::InvalidDimensions);
        }

        let mut cells = vec![vec![Cell::default(); height]; width];
        for y in 0..height {
            for x in 0..width {
                let north_line = 2 * (y + 1);
                let south_line = 2 * y;
                let east_col = 4 * (x + 1);
                let west_col = 4 * x;

                if north_line >= rows.len() || south_line + 1 >= rows.len() {
                    return Err(MazeError::LineOutOfRange);
                }
                if east_col >= rows[south_line + 1].len() {
                    return Err(MazeError::ColumnOutOfRange);
                }
                if west_col + 2 >= rows[north_line].len()
                    || west_col + 2 >= rows[south_line].len()
                {
                    return Err(MazeError::ColumnOutOfRange);
                }

                cells[x][y] = Cell {
                    north: rows[north_line][west_col + 2] != ' ',
                    south: rows[south_line][west_col + 2] != ' ',
                    east: rows[south_line + 1][east_col] != ' ',
                    west: rows[south_line + 1][west_col] != ' ',
                };
            }
        }

        validate_cells(&cells)?;
        Ok(Maze::from_cells(cells))
    }

    pub fn from_num_lines(lines: &[&str]) -> Result<Maze, MazeError> {
        if lines.is_empty() {
            return Err(MazeError::EmptyLines);
        }

        let mut cells: Vec<Vec<Cell>> = Vec::new();
        for line in lines {
            let tokens: Vec<&str> = line.split_whitespace().collect();
            if tokens.len() != 6 {
                return Err(MazeError::InvalidInteger);
            }
            let mut values = [0i32; 6];
            for (slot, token) in values.iter_mut().zip(&tokens) {
                *slot = token.parse().map_err(|_| MazeError::InvalidInteger)?;
            }
            let [x, y, n, e, s, w] = values;
            if x < 0 || y < 0 {
                return Err(MazeError::NegativeCoordinates);
            }

            let (x, y) = (x as usize, y as usize);
            while cells.len() <= x {
                cells.push(Vec::new());
            }
            while cells[x].len() <= y {
                cells[x].push(Cell::default());
            }
            cells[x][y] = Cell {
                north: n == 1,
                east: e == 1,
                south: s == 1,
                west: w == 1,
            };
        }

        if !crate::is_rectangular(&cells) {
            return Err(MazeError::NotRectangular);
        }
        Ok(Maze::from_cells(cells))
    }

    /// Serializes to `num` lines in column-major order. `from_num_lines` of
    /// the result reproduces the maze.
    pub fn to_num_lines(&self) -> Vec<String> {
        let mut lines = Vec::with_capacity((self.width() * self.height()) as usize);
        for x in 0..self.width() {
            for y in 0..self.height() {
                let cell = self.cell(x, y);
                lines.push(format!(
                    "{} {} {} {} {} {}",
                    x,
                    y,
                    cell.north as u8,
                    cell.east as u8,
                    cell.south as u8,
                    cell.west as u8
                ));
            }
        }
        lines
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn num_rejects_malformed_lines() {
        assert!(matches!(
            Maze::from_num_lines(&["0 0 1 1 1"]),
            Err(MazeError::InvalidInteger)
        ));
        assert!(matches!(
            Maze::from_num_lines(&["0 0 1 1 1 x"]),
            Err(MazeError::InvalidInteger)
        ));
        assert!(matches!(
            Maze::from_num_lines(&["-1 0 1 1 1 1"]),
            Err(MazeError::NegativeCoordinates)
        ));
        assert!(matches!(
            Maze::from_num_lines(&[]),
            Err(MazeError::EmptyLines)
        ));
    }

    #[test]
    fn num_rejects_missing_cells() {
        // (1,1) never appears, so column 1 is short.
        let lines = ["0 0 1 0 1 1", "0 1 1 1 1 0", "1 0 1 1 1 0"];
        assert!(matches!(
            Maze::from_num_lines(&lines),
            Err(MazeError::NotRectangular)
        ));
    }

    #[test]
    fn map_rejects_empty_and_tiny_inputs() {
        assert!(matches!(
            Maze::from_map_lines(&[]),
            Err(MazeError::EmptyLines)
        ));
        assert!(matches!(
            Maze::from_map_lines(&["+", "+"]),
            Err(MazeError::InvalidDimensions)
        ));
    }

    #[test]
    fn map_rejects_ragged_lines() {
        let lines = ["+---+", "|", "+---+"];
        assert!(matches!(
            Maze::from_map_lines(&lines),
            Err(MazeError::ColumnOutOfRange)
        ));
    }
}
