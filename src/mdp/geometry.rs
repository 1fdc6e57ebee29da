//! Coordinate arithmetic shared by every part of the grid world.

use std::fmt;
use std::ops::Add;

/// A cell on the grid, addressed by `(row, col)`.
///
/// Coordinates are signed so that stepping off the edge of the grid yields a
/// representable point that [`GridWorld::contains`](super::GridWorld::contains)
/// can reject.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Point {
    pub row: i32,
    pub col: i32,
}

impl Point {
    pub const fn new(row: i32, col: i32) -> Self {
        Point { row, col }
    }
}

impl Add for Point {
    type Output = Point;

    fn add(self, other: Point) -> Point {
        Point::new(self.row + other.row, self.col + other.col)
    }
}

impl From<(i32, i32)> for Point {
    fn from((row, col): (i32, i32)) -> Self {
        Point::new(row, col)
    }
}

impl fmt::Display for Point {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<{}, {}>", self.row, self.col)
    }
}

/// The four compass moves available in every state.
///
/// The discriminant doubles as the action's index into the action-value table,
/// and the declaration order is the tie-break order used when choosing a
/// greedy action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
    North = 0,
    East = 1,
    South = 2,
    West = 3,
}

impl Action {
    pub const COUNT: usize = 4;

    /// All actions in index order.
    pub const ALL: [Action; Action::COUNT] =
        [Action::North, Action::East, Action::South, Action::West];

    pub fn index(self) -> usize {
        self as usize
    }

    pub fn from_index(index: usize) -> Option<Action> {
        Action::ALL.get(index).copied()
    }

    /// Unit displacement for this move.
    pub fn delta(self) -> Point {
        match self {
            Action::North => Point::new(-1, 0),
            Action::East => Point::new(0, 1),
            Action::South => Point::new(1, 0),
            Action::West => Point::new(0, -1),
        }
    }

    /// The move 90 degrees counter-clockwise of this one.
    pub fn rotate_left(self) -> Action {
        Action::ALL[(self.index() + 3) % Action::COUNT]
    }

    /// The move 90 degrees clockwise of this one.
    pub fn rotate_right(self) -> Action {
        Action::ALL[(self.index() + 1) % Action::COUNT]
    }

    pub fn name(self) -> &'static str {
        match self {
            Action::North => "North",
            Action::East => "East",
            Action::South => "South",
            Action::West => "West",
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
