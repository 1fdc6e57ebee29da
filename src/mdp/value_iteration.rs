//! Synchronous value iteration over a [`GridWorld`].
//!
//! A run first pins the goal and pit cells to their terminal values and then
//! performs a fixed number of Bellman sweeps:
//!
//! ```text
//! Q(s, a) = sum_{s'} T(s, a, s') [ R(s, a, s') + gamma * V(s') ]
//! V(s)    = max_a Q(s, a)
//! ```
//!
//! Each sweep reads only the previous sweep's `V` and publishes the new
//! tables in one swap, so the update is Jacobi-style rather than in-place.
//! There is no convergence test; the iteration budget alone decides when to
//! stop.

use ndarray::Array2;
#[cfg(feature = "parallel")]
use rayon::prelude::*;

use super::actuator::{NoisyActuator, TransitionModel};
use super::geometry::{Action, Point};
use super::grid_world::{CellValue, GridWorld};
use crate::error::{MdpError, Result};

/// Lifecycle of a solver.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Nothing has been written to the grid yet.
    Uninitialized,
    /// Goal and pit carry their terminal values; no sweep has run.
    TerminalPinned,
    /// At least one sweep has run and more may follow.
    Iterating,
    /// The last `run` used up its iteration budget.
    BudgetExhausted,
}

/// Outcome of [`ValueIteration::run`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SweepReport {
    /// Number of Bellman sweeps performed.
    pub sweeps: usize,
    /// Largest absolute change of `V` during the final sweep, `0.0` if no
    /// sweep ran. Reported for diagnostics only.
    pub last_delta: f64,
}

/// Bound on the transition models a solver accepts.
///
/// With the `parallel` feature the model is shared across rayon workers and
/// must be `Sync`; serial builds accept any [`TransitionModel`].
#[cfg(feature = "parallel")]
pub trait SweepModel: TransitionModel + Sync {}

#[cfg(feature = "parallel")]
impl<T: TransitionModel + Sync> SweepModel for T {}

/// Bound on the transition models a solver accepts.
///
/// With the `parallel` feature the model is shared across rayon workers and
/// must be `Sync`; serial builds accept any [`TransitionModel`].
#[cfg(not(feature = "parallel"))]
pub trait SweepModel: TransitionModel {}

#[cfg(not(feature = "parallel"))]
impl<T: TransitionModel> SweepModel for T {}

/// Value-iteration solver owning one grid world and one transition model.
#[derive(Debug, Clone)]
pub struct ValueIteration<M = NoisyActuator> {
    grid: GridWorld,
    model: M,
    gamma: f64,
    phase: Phase,
}

impl<M> ValueIteration<M>
where
    M: SweepModel,
{
    /// Binds a solver to `grid` and `model`.
    ///
    /// # Arguments
    /// - `grid`: the world to solve; it must already have a goal and a pit.
    /// - `model`: transition and reward functions, e.g. [`NoisyActuator`].
    /// - `gamma`: discount factor, strictly between 0 and 1.
    ///
    /// # Returns
    /// - `Ok(solver)` in [`Phase::Uninitialized`]; nothing is written to the
    ///   grid until [`run`](Self::run) or [`pin_terminals`](Self::pin_terminals).
    /// - `Err(MdpError::InvalidInput)` if `gamma` is not strictly between 0 and 1.
    /// - `Err(MdpError::MissingTerminal)` if the grid has no goal or no pit.
    ///
    /// # Examples
    ///
    /// ```
    /// use gridmdp::{GridWorld, MdpError, NoisyActuator, Phase, Point, ValueIteration};
    ///
    /// let mut grid = GridWorld::new(3, 4).unwrap();
    /// grid.set_goal(Point::new(0, 3)).unwrap();
    /// grid.set_pit(Point::new(1, 3)).unwrap();
    ///
    /// let solver = ValueIteration::new(grid.clone(), NoisyActuator::default(), 0.9).unwrap();
    /// assert_eq!(solver.phase(), Phase::Uninitialized);
    ///
    /// let err = ValueIteration::new(grid, NoisyActuator::default(), 1.0);
    /// assert!(matches!(err, Err(MdpError::InvalidInput(_))));
    /// ```
    pub fn new(grid: GridWorld, model: M, gamma: f64) -> Result<Self> {
        if !(gamma > 0.0 && gamma < 1.0) {
            return Err(MdpError::invalid_input(format!(
                "discount factor must lie in (0, 1), got {}",
                gamma
            )));
        }
        if grid.goal().is_none() {
            return Err(MdpError::MissingTerminal("goal"));
        }
        if grid.pit().is_none() {
            return Err(MdpError::MissingTerminal("pit"));
        }

        Ok(ValueIteration {
            grid,
            model,
            gamma,
            phase: Phase::Uninitialized,
        })
    }

    pub fn grid(&self) -> &GridWorld {
        &self.grid
    }

    pub fn model(&self) -> &M {
        &self.model
    }

    pub fn gamma(&self) -> f64 {
        self.gamma
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Releases the grid, tables included.
    pub fn into_grid(self) -> GridWorld {
        self.grid
    }

    /// Pins the terminal cells and performs `iterations - 1` sweeps.
    ///
    /// An `iterations` of 0 or 1 only pins. Calling `run` again continues from
    /// the current tables.
    ///
    /// # Arguments
    /// - `iterations`: iteration budget; pinning counts as the first one.
    ///
    /// # Returns
    /// A [`SweepReport`] with the number of sweeps performed and the largest
    /// change of `V` in the last of them. The solver ends in
    /// [`Phase::BudgetExhausted`].
    ///
    /// # Errors
    /// Propagates `MdpError::TableInvariant` if the model produces a
    /// non-finite value.
    ///
    /// # Examples
    ///
    /// ```
    /// use gridmdp::{Action, GridWorld, NoisyActuator, Point, ValueIteration};
    ///
    /// let mut grid = GridWorld::new(3, 4).unwrap();
    /// grid.set_goal(Point::new(0, 3)).unwrap();
    /// grid.set_pit(Point::new(1, 3)).unwrap();
    /// grid.set_obstacle(Point::new(1, 1)).unwrap();
    ///
    /// let mut solver = ValueIteration::new(grid, NoisyActuator::default(), 0.9).unwrap();
    /// let report = solver.run(100).unwrap();
    ///
    /// assert_eq!(report.sweeps, 99);
    /// assert!(report.last_delta < 1e-4);
    /// assert_eq!(solver.grid().action(Point::new(0, 2)), Some(Action::East));
    /// ```
    pub fn run(&mut self, iterations: usize) -> Result<SweepReport> {
        let sweeps = iterations.saturating_sub(1);
        log::info!(
            "value iteration: {} sweeps on a {}x{} grid, gamma = {}",
            sweeps,
            self.grid.height(),
            self.grid.width(),
            self.gamma
        );

        self.pin_terminals();

        let mut last_delta = 0.0;
        for i in 0..sweeps {
            last_delta = self.sweep()?;
            log::trace!("sweep {}: max |dV| = {:e}", i + 1, last_delta);
        }
        self.phase = Phase::BudgetExhausted;

        log::debug!(
            "value iteration finished after {} sweeps, last max |dV| = {:e}",
            sweeps,
            last_delta
        );
        Ok(SweepReport { sweeps, last_delta })
    }

    /// Writes the goal and pit values into `V` and every `Q` entry of those
    /// cells. Sweeps never touch them afterwards.
    pub fn pin_terminals(&mut self) {
        self.grid.pin_terminals();
        if self.phase == Phase::Uninitialized {
            self.phase = Phase::TerminalPinned;
        }
    }

    /// Performs one synchronous Bellman sweep and returns the largest absolute
    /// change of `V`.
    ///
    /// # Errors
    /// Returns `MdpError::NotPinned` if the terminal cells have not been pinned.
    pub fn sweep(&mut self) -> Result<f64> {
        if self.phase == Phase::Uninitialized {
            return Err(MdpError::NotPinned);
        }

        let backups = self.backups();

        let mut next = self.grid.tables().clone();
        let mut delta: f64 = 0.0;
        for (s, q) in backups {
            let Some((r, c)) = self.grid.index_of(s) else {
                continue;
            };
            // First maximum wins, so ties go to the lowest action index.
            let mut best_action = Action::North;
            let mut best_value = f64::NEG_INFINITY;
            for action in Action::ALL {
                let q_sa = q[action.index()];
                next.action_values[[r, c, action.index()]] = CellValue::Value(q_sa);
                if q_sa > best_value {
                    best_value = q_sa;
                    best_action = action;
                }
            }

            if let CellValue::Value(previous) = next.values[[r, c]] {
                delta = delta.max((best_value - previous).abs());
            }
            next.values[[r, c]] = CellValue::Value(best_value);
            next.policy[[r, c]] = Some(best_action);
        }

        self.grid.replace_tables(next)?;
        self.phase = Phase::Iterating;
        Ok(delta)
    }

    /// Action values of every updatable cell, computed from the current `V`.
    fn backups(&self) -> Vec<(Point, [f64; Action::COUNT])> {
        let cells: Vec<Point> = self
            .grid
            .cells()
            .filter(|p| self.grid.is_updatable(*p))
            .collect();
        let values = self.grid.values();

        #[cfg(feature = "parallel")]
        let backups = cells
            .par_iter()
            .map(|&s| (s, self.action_values_at(s, values)))
            .collect();
        #[cfg(not(feature = "parallel"))]
        let backups = cells
            .iter()
            .map(|&s| (s, self.action_values_at(s, values)))
            .collect();

        backups
    }

    fn action_values_at(&self, s: Point, values: &Array2<CellValue>) -> [f64; Action::COUNT] {
        let mut q = [0.0; Action::COUNT];
        for action in Action::ALL {
            q[action.index()] = self.q_value(s, action, values);
        }
        q
    }

    /// Compute Q(s, a) = sum_{s'} T(s, a, s') [ R(s, a, s') + gamma * V(s') ],
    /// skipping impassable successors.
    fn q_value(&self, s: Point, action: Action, values: &Array2<CellValue>) -> f64 {
        let mut total = 0.0;
        for (s_next, prob) in self.model.outcomes(&self.grid, s, action) {
            let Some(idx) = self.grid.index_of(s_next) else {
                continue;
            };
            match values[idx] {
                CellValue::Impassable => {
                    debug_assert!(
                        self.grid.is_obstacle(s_next),
                        "impassable entry off the obstacle at {}",
                        s_next
                    );
                    continue;
                }
                CellValue::Value(v) => {
                    let reward = self.model.reward(&self.grid, s, action, s_next);
                    total += prob * (reward + self.gamma * v);
                }
            }
        }
        total
    }
}
