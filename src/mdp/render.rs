//! Plain-text views of a grid world's tables.

use std::fmt;

use super::geometry::{Action, Point};
use super::grid_world::{CellValue, GridWorld};

const CELL_WIDTH: usize = 6;

/// `V` laid out as the grid, two decimals per cell, `Nil` for the obstacle.
pub struct ValueTable<'a>(&'a GridWorld);

/// `Q` one cell per line, actions in North, East, South, West order.
pub struct ActionValueTable<'a>(&'a GridWorld);

/// Greedy action per cell; terminals are labelled and the obstacle is `---`.
pub struct PolicyTable<'a>(&'a GridWorld);

impl GridWorld {
    pub fn display_values(&self) -> ValueTable<'_> {
        ValueTable(self)
    }

    pub fn display_action_values(&self) -> ActionValueTable<'_> {
        ActionValueTable(self)
    }

    pub fn display_policy(&self) -> PolicyTable<'_> {
        PolicyTable(self)
    }
}

fn write_cell(f: &mut fmt::Formatter<'_>, value: CellValue) -> fmt::Result {
    match value {
        CellValue::Impassable => write!(f, "{:>width$}", "Nil", width = CELL_WIDTH),
        CellValue::Value(v) => write!(f, "{:>width$.2}", v, width = CELL_WIDTH),
    }
}

impl fmt::Display for ValueTable<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let grid = self.0;
        for row in grid.values().rows() {
            for value in row.iter() {
                write_cell(f, *value)?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

impl fmt::Display for ActionValueTable<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let grid = self.0;
        for p in grid.cells() {
            write!(f, "({}, {}):", p.row, p.col)?;
            for action in Action::ALL {
                match grid.action_value(p, action) {
                    Some(value) => write_cell(f, value)?,
                    None => return Err(fmt::Error),
                }
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

impl fmt::Display for PolicyTable<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let grid = self.0;
        for row in 0..grid.height() as i32 {
            for col in 0..grid.width() as i32 {
                let p = Point::new(row, col);
                let label = if grid.goal() == Some(p) {
                    "Goal"
                } else if grid.pit() == Some(p) {
                    "Pit"
                } else if grid.is_obstacle(p) {
                    "---"
                } else {
                    grid.action(p).map_or("?", Action::name)
                };
                write!(f, "{:>width$}", label, width = CELL_WIDTH)?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}
