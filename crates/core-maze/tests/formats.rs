//! Format round-trip and auto-detection scenarios.

use std::io::Write;

use core_geom::Direction;
use core_maze::{Maze, MazeError, generate};

fn assert_same_walls(a: &Maze, b: &Maze) {
    assert_eq!(a.width(), b.width());
    assert_eq!(a.height(), b.height());
    for x in 0..a.width() {
        for y in 0..a.height() {
            assert_eq!(a.cell(x, y), b.cell(x, y), "cell ({x},{y}) differs");
        }
    }
}

#[test]
fn num_parses_two_by_two() {
    let lines = ["0 0 1 1 1 1", "0 1 1 1 0 1", "1 0 1 1 1 1", "1 1 0 1 1 1"];
    let maze = Maze::from_num_lines(&lines).unwrap();
    assert_eq!(maze.width(), 2);
    assert_eq!(maze.height(), 2);
    assert!(maze.is_wall(0, 0, Direction::North));
    assert!(maze.is_wall(1, 0, Direction::East));
    assert!(!maze.is_wall(1, 1, Direction::North));
}

#[test]
fn num_round_trip_preserves_structure() {
    let lines = ["0 0 1 1 1 1", "0 1 1 1 0 1", "1 0 1 1 1 1", "1 1 0 1 1 1"];
    let maze = Maze::from_num_lines(&lines).unwrap();
    let serialized = maze.to_num_lines();
    let refs: Vec<&str> = serialized.iter().map(String::as_str).collect();
    let reparsed = Maze::from_num_lines(&refs).unwrap();
    assert_same_walls(&maze, &reparsed);
}

#[test]
fn num_round_trip_on_generated_mazes() {
    for seed in [1u32, 77, 4242] {
        let maze = generate(7, 11, seed).unwrap();
        let serialized = maze.to_num_lines();
        let refs: Vec<&str> = serialized.iter().map(String::as_str).collect();
        let reparsed = Maze::from_num_lines(&refs).unwrap();
        assert_same_walls(&maze, &reparsed);
    }
}

#[test]
fn num_line_order_is_irrelevant() {
    let maze = generate(4, 4, 9).unwrap();
    let mut serialized = maze.to_num_lines();
    serialized.reverse();
    let refs: Vec<&str> = serialized.iter().map(String::as_str).collect();
    let reparsed = Maze::from_num_lines(&refs).unwrap();
    assert_same_walls(&maze, &reparsed);
}

#[test]
fn map_parses_border_walls() {
    let lines = [
        "+---+---+",
        "|       |",
        "+   +   +",
        "|   |   |",
        "+---+---+",
    ];
    let maze = Maze::from_map_lines(&lines).unwrap();
    assert_eq!(maze.width(), 2);
    assert_eq!(maze.height(), 2);
    assert!(maze.is_wall(0, 0, Direction::West));
    assert!(maze.is_wall(1, 0, Direction::East));
    // The bottom row has an interior wall between the two cells, the top
    // row does not.
    assert!(maze.is_wall(0, 0, Direction::East));
    assert!(!maze.is_wall(0, 1, Direction::East));
    assert!(maze.is_valid());
}

#[test]
fn map_rejects_unenclosed_grid() {
    let lines = ["+---+", "    |", "+---+"];
    assert!(matches!(
        Maze::from_map_lines(&lines),
        Err(MazeError::NotEnclosed)
    ));
}

#[test]
fn from_file_detects_map_then_num() {
    let dir = tempfile::tempdir().unwrap();

    let map_path = dir.path().join("walls.map");
    {
        let mut f = std::fs::File::create(&map_path).unwrap();
        writeln!(f, "+---+").unwrap();
        writeln!(f, "|   |").unwrap();
        writeln!(f, "+---+").unwrap();
    }
    let maze = Maze::from_file(&map_path).unwrap();
    assert_eq!((maze.width(), maze.height()), (1, 1));

    let num_path = dir.path().join("walls.num");
    {
        let mut f = std::fs::File::create(&num_path).unwrap();
        for line in maze.to_num_lines() {
            writeln!(f, "{line}").unwrap();
        }
    }
    let reparsed = Maze::from_file(&num_path).unwrap();
    assert_same_walls(&maze, &reparsed);
}

#[test]
fn from_file_rejects_garbage_and_missing_paths() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("not-a-maze.txt");
    std::fs::write(&path, "hello\nworld\n").unwrap();
    assert!(matches!(
        Maze::from_file(&path),
        Err(MazeError::UnsupportedFormat)
    ));

    assert!(matches!(
        Maze::from_file(std::path::Path::new("")),
        Err(MazeError::EmptyPath)
    ));
    assert!(matches!(
        Maze::from_file(&dir.path().join("missing.num")),
        Err(MazeError::Open(_))
    ));
}

#[test]
fn crlf_maze_files_parse() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("crlf.num");
    let maze = generate(3, 3, 3).unwrap();
    std::fs::write(&path, maze.to_num_lines().join("\r\n")).unwrap();
    let reparsed = Maze::from_file(&path).unwrap();
    assert_same_walls(&maze, &reparsed);
}
