//! A rectangular grid world with one goal, one pit and an optional obstacle.
//!
//! The world owns the state-value table `V`, the action-value table `Q` and the
//! greedy policy. Solvers never write into these tables in place: they build
//! a fresh [`Tables`] bundle and swap it in with [`GridWorld::replace_tables`].

use ndarray::{Array2, Array3};

use super::geometry::{Action, Point};
use crate::error::{MdpError, Result};

/// Reward pinned on the goal cell unless configured otherwise.
pub const DEFAULT_GOAL_VALUE: f64 = 1.0;
/// Reward pinned on the pit cell unless configured otherwise.
pub const DEFAULT_PIT_VALUE: f64 = -1.0;

/// Entry of the value and action-value tables.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CellValue {
    /// The cell can never be entered.
    Impassable,
    Value(f64),
}

impl CellValue {
    pub fn value(self) -> Option<f64> {
        match self {
            CellValue::Impassable => None,
            CellValue::Value(v) => Some(v),
        }
    }

    pub fn is_impassable(self) -> bool {
        matches!(self, CellValue::Impassable)
    }
}

impl Default for CellValue {
    fn default() -> Self {
        CellValue::Value(0.0)
    }
}

/// The three tables a sweep produces, swapped into the world together.
#[derive(Debug, Clone, PartialEq)]
pub struct Tables {
    /// `V`, shape `(height, width)`.
    pub values: Array2<CellValue>,
    /// `Q`, shape `(height, width, Action::COUNT)`.
    pub action_values: Array3<CellValue>,
    /// Greedy action per cell, `None` where no action has been chosen.
    pub policy: Array2<Option<Action>>,
}

impl Tables {
    fn zeros(height: usize, width: usize) -> Self {
        Tables {
            values: Array2::from_elem((height, width), CellValue::default()),
            action_values: Array3::from_elem((height, width, Action::COUNT), CellValue::default()),
            policy: Array2::from_elem((height, width), None),
        }
    }
}

#[derive(Debug, Clone)]
pub struct GridWorld {
    height: usize,
    width: usize,
    tables: Tables,
    goal: Option<Point>,
    pit: Option<Point>,
    obstacle: Option<Point>,
    goal_value: f64,
    pit_value: f64,
    terminals_pinned: bool,
}

impl GridWorld {
    /// Creates a `height` x `width` world with the default terminal rewards
    /// (+1.0 for the goal, -1.0 for the pit).
    ///
    /// Every entry of `V` and `Q` starts at `CellValue::Value(0.0)` and the
    /// policy is empty. Goal, pit and obstacle are placed afterwards with
    /// [`set_goal`](Self::set_goal), [`set_pit`](Self::set_pit) and
    /// [`set_obstacle`](Self::set_obstacle).
    ///
    /// # Arguments
    /// - `height`: number of rows, at least 1.
    /// - `width`: number of columns, at least 1.
    ///
    /// # Returns
    /// - `Ok(grid)` with no special cells placed.
    /// - `Err(MdpError::InvalidInput)` if a dimension is zero or does not fit
    ///   a signed coordinate.
    ///
    /// # Examples
    ///
    /// ```
    /// use gridmdp::{CellValue, GridWorld, Point};
    ///
    /// let mut grid = GridWorld::new(3, 4).unwrap();
    /// grid.set_obstacle(Point::new(1, 1)).unwrap();
    ///
    /// assert!(grid.contains(Point::new(2, 3)));
    /// assert!(!grid.contains(Point::new(3, 0)));
    /// assert_eq!(grid.value(Point::new(1, 1)), Some(CellValue::Impassable));
    /// assert!(GridWorld::new(0, 4).is_err());
    /// ```
    pub fn new(height: usize, width: usize) -> Result<Self> {
        Self::with_terminal_values(height, width, DEFAULT_GOAL_VALUE, DEFAULT_PIT_VALUE)
    }

    /// Creates a world whose goal and pit cells will be pinned to the given values.
    ///
    /// # Errors
    /// Returns `MdpError::InvalidInput` if either dimension is zero, does not
    /// fit a signed coordinate, or if a terminal value is not finite.
    pub fn with_terminal_values(
        height: usize,
        width: usize,
        goal_value: f64,
        pit_value: f64,
    ) -> Result<Self> {
        if height == 0 || width == 0 {
            return Err(MdpError::invalid_input(format!(
                "grid dimensions must be positive, got {}x{}",
                height, width
            )));
        }
        if i32::try_from(height).is_err() || i32::try_from(width).is_err() {
            return Err(MdpError::invalid_input(format!(
                "grid dimensions {}x{} exceed the coordinate range",
                height, width
            )));
        }
        if !goal_value.is_finite() || !pit_value.is_finite() {
            return Err(MdpError::invalid_input(
                "terminal values must be finite numbers",
            ));
        }

        Ok(GridWorld {
            height,
            width,
            tables: Tables::zeros(height, width),
            goal: None,
            pit: None,
            obstacle: None,
            goal_value,
            pit_value,
            terminals_pinned: false,
        })
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn width(&self) -> usize {
        self.width
    }

    /// Number of cells, obstacle included.
    pub fn num_cells(&self) -> usize {
        self.height * self.width
    }

    pub fn goal(&self) -> Option<Point> {
        self.goal
    }

    pub fn pit(&self) -> Option<Point> {
        self.pit
    }

    pub fn obstacle(&self) -> Option<Point> {
        self.obstacle
    }

    pub fn goal_value(&self) -> f64 {
        self.goal_value
    }

    pub fn pit_value(&self) -> f64 {
        self.pit_value
    }

    /// Whether the goal and pit carry their terminal values.
    pub fn terminals_pinned(&self) -> bool {
        self.terminals_pinned
    }

    /// Places the goal. Its action values are reset to zero until a solver
    /// pins them.
    pub fn set_goal(&mut self, loc: Point) -> Result<()> {
        self.check_placement(loc, self.goal, "goal")?;
        self.goal = Some(loc);
        self.fill_action_values(loc, CellValue::default());
        Ok(())
    }

    /// Places the pit. Its action values are reset to zero until a solver
    /// pins them.
    pub fn set_pit(&mut self, loc: Point) -> Result<()> {
        self.check_placement(loc, self.pit, "pit")?;
        self.pit = Some(loc);
        self.fill_action_values(loc, CellValue::default());
        Ok(())
    }

    /// Places the obstacle. The cell becomes impassable in both `V` and `Q`
    /// and stays that way for the lifetime of the world.
    pub fn set_obstacle(&mut self, loc: Point) -> Result<()> {
        self.check_placement(loc, self.obstacle, "obstacle")?;
        self.obstacle = Some(loc);
        if let Some(idx) = self.index_of(loc) {
            self.tables.values[idx] = CellValue::Impassable;
            self.tables.policy[idx] = None;
        }
        self.fill_action_values(loc, CellValue::Impassable);
        Ok(())
    }

    /// Whether `loc` lies inside `[0, height) x [0, width)`.
    pub fn contains(&self, loc: Point) -> bool {
        loc.row >= 0
            && (loc.row as usize) < self.height
            && loc.col >= 0
            && (loc.col as usize) < self.width
    }

    pub fn is_obstacle(&self, loc: Point) -> bool {
        self.obstacle == Some(loc)
    }

    /// Whether `loc` is the goal or the pit.
    pub fn is_terminal(&self, loc: Point) -> bool {
        self.goal == Some(loc) || self.pit == Some(loc)
    }

    /// Whether a Bellman backup may overwrite `loc`: it is none of goal,
    /// pit or obstacle.
    pub fn is_updatable(&self, loc: Point) -> bool {
        !(self.is_terminal(loc) || self.is_obstacle(loc))
    }

    /// Every cell in row-major order.
    pub fn cells(&self) -> impl Iterator<Item = Point> + '_ {
        (0..self.height as i32)
            .flat_map(move |row| (0..self.width as i32).map(move |col| Point::new(row, col)))
    }

    pub fn values(&self) -> &Array2<CellValue> {
        &self.tables.values
    }

    pub fn action_values(&self) -> &Array3<CellValue> {
        &self.tables.action_values
    }

    pub fn policy(&self) -> &Array2<Option<Action>> {
        &self.tables.policy
    }

    pub fn tables(&self) -> &Tables {
        &self.tables
    }

    /// `V[loc]`, or `None` if `loc` is off the grid.
    pub fn value(&self, loc: Point) -> Option<CellValue> {
        self.index_of(loc).map(|idx| self.tables.values[idx])
    }

    /// `Q[loc][action]`, or `None` if `loc` is off the grid.
    pub fn action_value(&self, loc: Point, action: Action) -> Option<CellValue> {
        self.index_of(loc)
            .map(|(r, c)| self.tables.action_values[[r, c, action.index()]])
    }

    /// Greedy action at `loc`, if one has been chosen.
    pub fn action(&self, loc: Point) -> Option<Action> {
        self.index_of(loc).and_then(|idx| self.tables.policy[idx])
    }

    /// Swaps in a complete set of tables and hands back the previous ones.
    ///
    /// # Errors
    /// - `MdpError::InvalidInput` if any table's shape does not match the grid.
    /// - `MdpError::TableInvariant` if the obstacle's entries are not all
    ///   impassable, another cell has an impassable or non-finite entry, or,
    ///   once pinned, a terminal cell's entries differ from its terminal value.
    ///
    /// The world is left untouched when an error is returned.
    pub fn replace_tables(&mut self, tables: Tables) -> Result<Tables> {
        let (h, w) = (self.height, self.width);
        if tables.values.dim() != (h, w)
            || tables.action_values.dim() != (h, w, Action::COUNT)
            || tables.policy.dim() != (h, w)
        {
            return Err(MdpError::invalid_input(format!(
                "table shapes do not match the {}x{} grid",
                h, w
            )));
        }
        self.check_tables(&tables)?;
        Ok(std::mem::replace(&mut self.tables, tables))
    }

    /// Writes the terminal values into `V` and every `Q` entry of the goal
    /// and pit cells.
    pub(crate) fn pin_terminals(&mut self) {
        let terminals = [(self.goal, self.goal_value), (self.pit, self.pit_value)];
        for (loc, value) in terminals {
            let Some((r, c)) = loc.and_then(|p| self.index_of(p)) else {
                continue;
            };
            self.tables.values[[r, c]] = CellValue::Value(value);
            for a in 0..Action::COUNT {
                self.tables.action_values[[r, c, a]] = CellValue::Value(value);
            }
            log::debug!("pinned terminal ({}, {}) to {}", r, c, value);
        }
        self.terminals_pinned = true;
    }

    fn check_tables(&self, tables: &Tables) -> Result<()> {
        for p in self.cells() {
            let (r, c) = (p.row as usize, p.col as usize);
            let mut entries = std::iter::once(tables.values[[r, c]])
                .chain((0..Action::COUNT).map(|a| tables.action_values[[r, c, a]]));
            let reject = |reason| MdpError::TableInvariant {
                row: p.row,
                col: p.col,
                reason,
            };

            if self.is_obstacle(p) {
                if !entries.all(CellValue::is_impassable) {
                    return Err(reject("the obstacle must stay impassable"));
                }
                continue;
            }

            let pinned = match self.terminals_pinned {
                true if self.goal == Some(p) => Some(self.goal_value),
                true if self.pit == Some(p) => Some(self.pit_value),
                _ => None,
            };
            for entry in entries {
                match (entry, pinned) {
                    (CellValue::Impassable, _) => {
                        return Err(reject("only the obstacle may be impassable"))
                    }
                    (CellValue::Value(v), _) if !v.is_finite() => {
                        return Err(reject("values must be finite"))
                    }
                    (CellValue::Value(v), Some(pin)) if v != pin => {
                        return Err(reject("terminal values are pinned"))
                    }
                    _ => {}
                }
            }
        }
        Ok(())
    }

    /// Row-major table index of `loc`, if it is on the grid.
    pub(crate) fn index_of(&self, loc: Point) -> Option<(usize, usize)> {
        self.contains(loc)
            .then(|| (loc.row as usize, loc.col as usize))
    }

    fn fill_action_values(&mut self, loc: Point, fill: CellValue) {
        if let Some((r, c)) = self.index_of(loc) {
            for a in 0..Action::COUNT {
                self.tables.action_values[[r, c, a]] = fill;
            }
        }
    }

    fn check_placement(
        &self,
        loc: Point,
        current: Option<Point>,
        role: &'static str,
    ) -> Result<()> {
        if current.is_some() {
            return Err(MdpError::AlreadyConfigured(role));
        }
        if !self.contains(loc) {
            return Err(MdpError::out_of_bounds(
                loc.row,
                loc.col,
                self.height,
                self.width,
            ));
        }
        let occupied = [
            (self.goal, "goal"),
            (self.pit, "pit"),
            (self.obstacle, "obstacle"),
        ];
        if let Some(&(_, existing)) = occupied.iter().find(|(p, _)| *p == Some(loc)) {
            return Err(MdpError::CellConflict {
                row: loc.row,
                col: loc.col,
                existing,
            });
        }
        Ok(())
    }
}
