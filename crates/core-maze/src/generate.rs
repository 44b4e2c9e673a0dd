//! Deterministic maze generation.
//!
//! Iterative depth-first backtracker with an explicit stack. The RNG call
//! pattern is fixed: two `bounded` draws pick the start cell, then exactly
//! one draw per neighbour pick. Changing that pattern changes every maze a
//! seed produces, so treat it as part of the output format.

use core_geom::{CARDINAL_DIRECTIONS, Direction};
use tracing::debug;

use crate::rng::MazeRng;
use crate::{Maze, MazeError};

pub fn generate(width: i32, height: i32, seed: u32) -> Result<Maze, MazeError> {
    if width <= 0 || height <= 0 {
        return Err(MazeError::InvalidDimensions);
    }

    let mut maze = Maze::new(width, height);
    for x in 0..width {
        for y in 0..height {
            for dir in CARDINAL_DIRECTIONS {
                maze.set_wall(x, y, dir, true);
            }
        }
    }

    let mut rng = MazeRng::new(seed);
    let mut visited = vec![vec![false; height as usize]; width as usize];
    let mut stack: Vec<(i32, i32)> = Vec::new();

    let start_x = rng.bounded(width as u32) as i32;
    let start_y = rng.bounded(height as u32) as i32;
    visited[start_x as usize][start_y as usize] = true;
    stack.push((start_x, start_y));

    while let Some(&(x, y)) = stack.last() {
        // Unvisited 4-neighbours, always collected in N, E, S, W order.
        let mut neighbours: Vec<Direction> = Vec::with_capacity(4);
        if y + 1 < height && !visited[x as usize][y as usize + 1] {
            neighbours.push(Direction::North);
        }
        if x + 1 < width && !visited[x as usize + 1][y as usize] {
            neighbours.push(Direction::East);
        }
        if y - 1 >= 0 && !visited[x as usize][y as usize - 1] {
            neighbours.push(Direction::South);
        }
        if x - 1 >= 0 && !visited[x as usize - 1][y as usize] {
            neighbours.push(Direction::West);
        }

        if neighbours.is_empty() {
            stack.pop();
            continue;
        }

        let dir = neighbours[rng.bounded(neighbours.len() as u32) as usize];
        let (dx, dy) = dir.delta();
        let (nx, ny) = (x + dx, y + dy);

        maze.set_wall(x, y, dir, false);
        maze.set_wall(nx, ny, dir.opposite(), false);

        visited[nx as usize][ny as usize] = true;
        stack.push((nx, ny));
    }

    debug!(target: "maze.generate", width, height, seed, "maze generated");
    Ok(maze)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;

    #[test]
    fn generated_maze_is_valid() {
        let maze = generate(10, 10, 123).unwrap();
        assert!(maze.is_valid());
    }

    #[test]
    fn generation_is_deterministic() {
        let a = generate(12, 9, 0xBEEF).unwrap();
        let b = generate(12, 9, 0xBEEF).unwrap();
        for x in 0..12 {
            for y in 0..9 {
                assert_eq!(a.cell(x, y), b.cell(x, y), "cell ({x},{y}) differs");
            }
        }
    }

    #[test]
    fn different_seeds_give_different_mazes() {
        let a = generate(8, 8, 1).unwrap();
        let b = generate(8, 8, 2).unwrap();
        let mut differs = false;
        'outer: for x in 0..8 {
            for y in 0..8 {
                if a.cell(x, y) != b.cell(x, y) {
                    differs = true;
                    break 'outer;
                }
            }
        }
        assert!(differs);
    }

    #[test]
    fn generated_maze_is_a_spanning_tree() {
        let (width, height) = (9, 7);
        let maze = generate(width, height, 99).unwrap();

        // Flood fill from (0,0) along open edges must reach every cell.
        let mut seen = vec![vec![false; height as usize]; width as usize];
        let mut queue = VecDeque::from([(0i32, 0i32)]);
        seen[0][0] = true;
        let mut reached = 1;
        let mut open_edges = 0;
        for x in 0..width {
            for y in 0..height {
                if x + 1 < width && !maze.is_wall(x, y, Direction::East) {
                    open_edges += 1;
                }
                if y + 1 < height && !maze.is_wall(x, y, Direction::North) {
                    open_edges += 1;
                }
            }
        }
        while let Some((x, y)) = queue.pop_front() {
            for dir in CARDINAL_DIRECTIONS {
                let (dx, dy) = dir.delta();
                let (nx, ny) = (x + dx, y + dy);
                if maze.in_bounds(nx, ny)
                    && !maze.is_wall(x, y, dir)
                    && !seen[nx as usize][ny as usize]
                {
                    seen[nx as usize][ny as usize] = true;
                    reached += 1;
                    queue.push_back((nx, ny));
                }
            }
        }
        assert_eq!(reached, width * height);
        // Connected with exactly cells-1 edges: a spanning tree.
        assert_eq!(open_edges, width * height - 1);
    }

    #[test]
    fn single_cell_maze() {
        let maze = generate(1, 1, 5).unwrap();
        assert!(maze.is_valid());
        assert!(maze.is_wall(0, 0, Direction::North));
        assert!(maze.is_wall(0, 0, Direction::South));
    }

    #[test]
    fn rejects_non_positive_dimensions() {
        assert!(matches!(
            generate(0, 5, 1),
            Err(MazeError::InvalidDimensions)
        ));
        assert!(matches!(
            generate(5, -1, 1),
            Err(MazeError::InvalidDimensions)
        ));
    }
}
