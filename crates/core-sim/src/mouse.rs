use core_geom::{SemiDirection, SemiPosition};

/// The mouse: a position on the half-cell lattice plus an eight-way heading.
/// Pure data carrier; the simulation decides when and where it moves.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Mouse {
    pos: SemiPosition,
    heading: SemiDirection,
}

impl Mouse {
    pub fn new() -> Self {
        Self {
            pos: SemiPosition::new(1, 1),
            heading: SemiDirection::North,
        }
    }

    /// Back to the center of cell (0,0), facing north.
    pub fn reset(&mut self) {
        *self = Self::new();
    }

    pub fn position(&self) -> SemiPosition {
        self.pos
    }

    pub fn heading(&self) -> SemiDirection {
        self.heading
    }

    pub fn set_position(&mut self, pos: SemiPosition) {
        self.pos = pos;
    }

    pub fn set_heading(&mut self, heading: SemiDirection) {
        self.heading = heading;
    }
}

impl Default for Mouse {
    fn default() -> Self {
        Self::new()
    }
}
