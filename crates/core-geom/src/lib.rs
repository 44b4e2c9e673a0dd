//! Direction algebra and half-cell lattice coordinates.
//!
//! Everything here is a pure function over small copy types. Rotations are
//! index arithmetic (mod 4 for cardinals, mod 8 for semi directions), so they
//! are exact and closed under repeated application. The coordinate convention
//! throughout the engine is +y = north.

/// One of the four cardinal directions, indexed `0..4` = N, E, S, W.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    North = 0,
    East = 1,
    South = 2,
    West = 3,
}

/// All four cardinals in index order. Handy for per-cell wall loops.
pub const CARDINAL_DIRECTIONS: [Direction; 4] = [
    Direction::North,
    Direction::East,
    Direction::South,
    Direction::West,
];

impl Direction {
    pub fn index(self) -> usize {
        self as usize
    }

    fn from_index(idx: usize) -> Self {
        match idx % 4 {
            0 => Direction::North,
            1 => Direction::East,
            2 => Direction::South,
            _ => Direction::West,
        }
    }

    pub fn rotate_left(self) -> Self {
        Self::from_index(self.index() + 3)
    }

    pub fn rotate_right(self) -> Self {
        Self::from_index(self.index() + 1)
    }

    pub fn opposite(self) -> Self {
        Self::from_index(self.index() + 2)
    }

    /// Unit cell delta for this direction (+y = north).
    pub fn delta(self) -> (i32, i32) {
        match self {
            Direction::North => (0, 1),
            Direction::East => (1, 0),
            Direction::South => (0, -1),
            Direction::West => (-1, 0),
        }
    }

    /// Parse the single-character form used by the wire protocol (`n`, `e`,
    /// `s`, `w`, case-insensitive).
    pub fn from_char(c: char) -> Option<Self> {
        match c {
            'n' | 'N' => Some(Direction::North),
            'e' | 'E' => Some(Direction::East),
            's' | 'S' => Some(Direction::South),
            'w' | 'W' => Some(Direction::West),
            _ => None,
        }
    }

    pub fn to_char(self) -> char {
        match self {
            Direction::North => 'n',
            Direction::East => 'e',
            Direction::South => 's',
            Direction::West => 'w',
        }
    }
}

/// One of the eight compass directions, indexed `0..8` = E, NE, N, NW, W, SW,
/// S, SE. The odd indices are the diagonals.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SemiDirection {
    East = 0,
    NorthEast = 1,
    North = 2,
    NorthWest = 3,
    West = 4,
    SouthWest = 5,
    South = 6,
    SouthEast = 7,
}

pub const SEMI_DIRECTIONS: [SemiDirection; 8] = [
    SemiDirection::East,
    SemiDirection::NorthEast,
    SemiDirection::North,
    SemiDirection::NorthWest,
    SemiDirection::West,
    SemiDirection::SouthWest,
    SemiDirection::South,
    SemiDirection::SouthEast,
];

impl SemiDirection {
    pub fn index(self) -> usize {
        self as usize
    }

    fn from_index(idx: usize) -> Self {
        SEMI_DIRECTIONS[idx % 8]
    }

    /// Rotate by `steps` 45-degree increments, positive = counter-clockwise.
    fn rotate(self, steps: i32) -> Self {
        Self::from_index((self.index() as i32 + steps).rem_euclid(8) as usize)
    }

    pub fn rotate_left_45(self) -> Self {
        self.rotate(1)
    }

    pub fn rotate_right_45(self) -> Self {
        self.rotate(-1)
    }

    pub fn rotate_left_90(self) -> Self {
        self.rotate(2)
    }

    pub fn rotate_right_90(self) -> Self {
        self.rotate(-2)
    }

    pub fn rotate_180(self) -> Self {
        self.rotate(4)
    }

    pub fn is_diagonal(self) -> bool {
        self.index() % 2 == 1
    }

    /// The cardinal equivalent, for the even (non-diagonal) indices only.
    pub fn to_cardinal(self) -> Option<Direction> {
        match self {
            SemiDirection::East => Some(Direction::East),
            SemiDirection::North => Some(Direction::North),
            SemiDirection::West => Some(Direction::West),
            SemiDirection::South => Some(Direction::South),
            _ => None,
        }
    }

    /// Unit lattice delta in `{-1, 0, 1}^2` (+y = north).
    pub fn delta(self) -> (i32, i32) {
        match self {
            SemiDirection::East => (1, 0),
            SemiDirection::NorthEast => (1, 1),
            SemiDirection::North => (0, 1),
            SemiDirection::NorthWest => (-1, 1),
            SemiDirection::West => (-1, 0),
            SemiDirection::SouthWest => (-1, -1),
            SemiDirection::South => (0, -1),
            SemiDirection::SouthEast => (1, -1),
        }
    }
}

impl From<Direction> for SemiDirection {
    fn from(dir: Direction) -> Self {
        match dir {
            Direction::North => SemiDirection::North,
            Direction::East => SemiDirection::East,
            Direction::South => SemiDirection::South,
            Direction::West => SemiDirection::West,
        }
    }
}

/// A coordinate on the half-cell lattice of a W x H maze, ranging over
/// `[0, 2W] x [0, 2H]`.
///
/// Parity determines what the point is: (even, even) is a wall corner,
/// (odd, odd) is a cell interior, mixed parity is a wall midpoint. A cell
/// interior maps back to its cell by halving both coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SemiPosition {
    pub x: i32,
    pub y: i32,
}

impl SemiPosition {
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// The cell this lattice point belongs to (integer halving, so wall
    /// midpoints land on the cell to their south/west).
    pub fn to_cell(self) -> (i32, i32) {
        (self.x.div_euclid(2), self.y.div_euclid(2))
    }

    pub fn translated(self, dir: SemiDirection) -> Self {
        let (dx, dy) = dir.delta();
        Self {
            x: self.x + dx,
            y: self.y + dy,
        }
    }
}

impl Default for SemiPosition {
    fn default() -> Self {
        // Center of cell (0, 0).
        Self { x: 1, y: 1 }
    }
}
