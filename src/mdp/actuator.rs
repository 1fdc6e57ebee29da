//! Stochastic actuation model for an agent on a [`GridWorld`].
//!
//! The agent moves in the intended direction 80% of the time and slips 90
//! degrees to either side 10% of the time each. A move that would leave the
//! grid or enter the obstacle leaves the agent where it was.

use super::geometry::{Action, Point};
use super::grid_world::GridWorld;
use crate::error::{MdpError, Result};

/// Living reward charged on every transition unless configured otherwise.
pub const DEFAULT_LIVING_REWARD: f64 = -0.01;
/// Probability of moving in the intended direction.
pub const INTENDED_PROBABILITY: f64 = 0.8;
/// Probability of slipping to one particular side.
pub const SLIP_PROBABILITY: f64 = 0.1;

/// Transition and reward functions of an MDP whose states are grid cells.
///
/// The grid is passed to every call rather than stored, so a model can be
/// shared by a solver that owns and mutates the grid.
pub trait TransitionModel {
    /// `T(s, a, s')`: probability of landing in `s_next` after taking `action` in `s`.
    fn transition(&self, grid: &GridWorld, s: Point, action: Action, s_next: Point) -> f64;

    /// `R(s, a, s')`: reward for that transition.
    fn reward(&self, grid: &GridWorld, s: Point, action: Action, s_next: Point) -> f64;

    /// Every reachable successor of `(s, action)` with its probability, in
    /// row-major order.
    ///
    /// The default scans all non-obstacle cells, which is what a Bellman sum
    /// over `s'` does; models that know their support should override it.
    fn outcomes(&self, grid: &GridWorld, s: Point, action: Action) -> Vec<(Point, f64)> {
        grid.cells()
            .filter(|p| !grid.is_obstacle(*p))
            .filter_map(|p| {
                let t = self.transition(grid, s, action, p);
                (t > 0.0).then_some((p, t))
            })
            .collect()
    }
}

/// The 80/10/10 actuator with a constant living reward.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NoisyActuator {
    living_reward: f64,
}

impl NoisyActuator {
    /// Creates an actuator that charges `living_reward` on every transition.
    ///
    /// # Errors
    /// Returns `MdpError::InvalidInput` if `living_reward` is NaN or infinite.
    pub fn new(living_reward: f64) -> Result<Self> {
        if !living_reward.is_finite() {
            return Err(MdpError::invalid_input(format!(
                "living reward must be finite, got {}",
                living_reward
            )));
        }
        Ok(NoisyActuator { living_reward })
    }

    pub fn living_reward(&self) -> f64 {
        self.living_reward
    }

    /// Where a move in `direction` from `s` actually ends up: the neighbour,
    /// or `s` itself if the neighbour is off the grid or blocked.
    fn resolve(grid: &GridWorld, s: Point, direction: Action) -> Point {
        let target = s + direction.delta();
        if !grid.contains(target) || grid.is_obstacle(target) {
            s
        } else {
            target
        }
    }

    /// Intended destination, left slip and right slip, each already resolved.
    fn candidates(grid: &GridWorld, s: Point, action: Action) -> [(Point, f64); 3] {
        [
            (Self::resolve(grid, s, action), INTENDED_PROBABILITY),
            (Self::resolve(grid, s, action.rotate_left()), SLIP_PROBABILITY),
            (Self::resolve(grid, s, action.rotate_right()), SLIP_PROBABILITY),
        ]
    }
}

impl Default for NoisyActuator {
    fn default() -> Self {
        NoisyActuator {
            living_reward: DEFAULT_LIVING_REWARD,
        }
    }
}

impl TransitionModel for NoisyActuator {
    /// Sums every candidate that resolves to `s_next`, so bumping into a wall
    /// on more than one branch accumulates onto staying put.
    fn transition(&self, grid: &GridWorld, s: Point, action: Action, s_next: Point) -> f64 {
        Self::candidates(grid, s, action)
            .iter()
            .filter(|(p, _)| *p == s_next)
            .map(|(_, prob)| prob)
            .sum()
    }

    fn reward(&self, _grid: &GridWorld, _s: Point, _action: Action, _s_next: Point) -> f64 {
        self.living_reward
    }

    fn outcomes(&self, grid: &GridWorld, s: Point, action: Action) -> Vec<(Point, f64)> {
        let mut merged: Vec<(Point, f64)> = Vec::with_capacity(3);
        for (p, prob) in Self::candidates(grid, s, action) {
            match merged.iter_mut().find(|(q, _)| *q == p) {
                Some(entry) => entry.1 += prob,
                None => merged.push((p, prob)),
            }
        }
        merged.sort_by_key(|(p, _)| *p);
        merged
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use rand::Rng;

    fn demo_grid() -> GridWorld {
        let mut grid = GridWorld::new(3, 4).unwrap();
        grid.set_goal(Point::new(0, 3)).unwrap();
        grid.set_pit(Point::new(1, 3)).unwrap();
        grid.set_obstacle(Point::new(1, 1)).unwrap();
        grid
    }

    fn total_mass(model: &NoisyActuator, grid: &GridWorld, s: Point, a: Action) -> f64 {
        grid.cells().map(|p| model.transition(grid, s, a, p)).sum()
    }

    #[test]
    fn test_open_field_split() {
        let grid = demo_grid();
        let robot = NoisyActuator::default();
        let s = Point::new(2, 2);

        assert_abs_diff_eq!(robot.transition(&grid, s, Action::North, Point::new(1, 2)), 0.8);
        assert_abs_diff_eq!(robot.transition(&grid, s, Action::North, Point::new(2, 1)), 0.1);
        assert_abs_diff_eq!(robot.transition(&grid, s, Action::North, Point::new(2, 3)), 0.1);
        assert_abs_diff_eq!(robot.transition(&grid, s, Action::North, s), 0.0);
        assert_abs_diff_eq!(robot.transition(&grid, s, Action::North, Point::new(0, 2)), 0.0);
    }

    #[test]
    fn test_walls_and_obstacle_accumulate_on_self() {
        let grid = demo_grid();
        let robot = NoisyActuator::default();

        // Corner: north and west both bump, east slip moves.
        let corner = Point::new(0, 0);
        assert_abs_diff_eq!(robot.transition(&grid, corner, Action::North, corner), 0.9);
        assert_abs_diff_eq!(
            robot.transition(&grid, corner, Action::North, Point::new(0, 1)),
            0.1
        );

        // Below the obstacle, moving north bumps into it.
        let below = Point::new(2, 1);
        assert_abs_diff_eq!(robot.transition(&grid, below, Action::North, below), 0.8);
        assert_abs_diff_eq!(
            robot.transition(&grid, below, Action::North, Point::new(1, 1)),
            0.0
        );

        // (1, 0) heading east: intended hits the obstacle, both slips move.
        let left_of = Point::new(1, 0);
        assert_abs_diff_eq!(robot.transition(&grid, left_of, Action::East, left_of), 0.8);
        assert_abs_diff_eq!(
            robot.transition(&grid, left_of, Action::East, Point::new(0, 0)),
            0.1
        );
        assert_abs_diff_eq!(
            robot.transition(&grid, left_of, Action::East, Point::new(2, 0)),
            0.1
        );
    }

    #[test]
    fn test_single_cell_grid_keeps_all_mass() {
        let grid = GridWorld::new(1, 1).unwrap();
        let robot = NoisyActuator::default();
        let only = Point::new(0, 0);
        for a in Action::ALL {
            assert_abs_diff_eq!(robot.transition(&grid, only, a, only), 1.0, epsilon = 1e-12);
        }
    }

    #[test]
    fn test_probability_mass_is_conserved() {
        let grid = demo_grid();
        let robot = NoisyActuator::default();
        for s in grid.cells().filter(|p| !grid.is_obstacle(*p)) {
            for a in Action::ALL {
                assert_abs_diff_eq!(total_mass(&robot, &grid, s, a), 1.0, epsilon = 1e-12);
            }
        }
    }

    #[test]
    fn test_mass_is_conserved_on_random_grids() {
        let mut rng = rand::thread_rng();
        let robot = NoisyActuator::default();
        for _ in 0..25 {
            let height = rng.gen_range(1..7);
            let width = rng.gen_range(1..7);
            let mut grid = GridWorld::new(height, width).unwrap();
            if height * width > 1 {
                let obstacle = Point::new(
                    rng.gen_range(0..height as i32),
                    rng.gen_range(0..width as i32),
                );
                grid.set_obstacle(obstacle).unwrap();
            }
            for s in grid.cells().filter(|p| !grid.is_obstacle(*p)) {
                for a in Action::ALL {
                    assert_abs_diff_eq!(total_mass(&robot, &grid, s, a), 1.0, epsilon = 1e-12);
                }
            }
        }
    }

    #[test]
    fn test_transition_is_translation_invariant() {
        let robot = NoisyActuator::default();
        let shift = Point::new(1, 1);

        let mut base = GridWorld::new(5, 6).unwrap();
        base.set_goal(Point::new(0, 3)).unwrap();
        base.set_pit(Point::new(1, 3)).unwrap();
        base.set_obstacle(Point::new(1, 1)).unwrap();

        let mut shifted = GridWorld::new(5, 6).unwrap();
        shifted.set_goal(Point::new(0, 3) + shift).unwrap();
        shifted.set_pit(Point::new(1, 3) + shift).unwrap();
        shifted.set_obstacle(Point::new(1, 1) + shift).unwrap();

        // States whose four neighbours lie inside both grids.
        let states = (1..=2)
            .flat_map(|row| (1..=3).map(move |col| Point::new(row, col)))
            .filter(|s| !base.is_obstacle(*s));
        for s in states {
            for a in Action::ALL {
                for s_next in base.cells().filter(|p| shifted.contains(*p + shift)) {
                    assert_eq!(
                        robot.transition(&base, s, a, s_next),
                        robot.transition(&shifted, s + shift, a, s_next + shift)
                    );
                }
            }
        }
    }

    #[test]
    fn test_outcomes_agree_with_dense_scan() {
        let grid = demo_grid();
        let robot = NoisyActuator::default();
        for s in grid.cells().filter(|p| !grid.is_obstacle(*p)) {
            for a in Action::ALL {
                let sparse = robot.outcomes(&grid, s, a);
                let dense: Vec<(Point, f64)> = grid
                    .cells()
                    .filter(|p| !grid.is_obstacle(*p))
                    .filter_map(|p| {
                        let t = robot.transition(&grid, s, a, p);
                        (t > 0.0).then_some((p, t))
                    })
                    .collect();
                assert_eq!(sparse, dense);
            }
        }
    }

    #[test]
    fn test_reward_is_constant() {
        let grid = demo_grid();
        let robot = NoisyActuator::new(-0.04).unwrap();
        assert_eq!(robot.living_reward(), -0.04);
        for s in grid.cells() {
            assert_eq!(
                robot.reward(&grid, s, Action::West, Point::new(0, 3)),
                -0.04
            );
        }
    }

    #[test]
    fn test_non_finite_living_reward_rejected() {
        for reward in [f64::NAN, f64::INFINITY, f64::NEG_INFINITY] {
            assert!(matches!(
                NoisyActuator::new(reward),
                Err(MdpError::InvalidInput(_))
            ));
        }
        assert_eq!(NoisyActuator::new(DEFAULT_LIVING_REWARD), Ok(NoisyActuator::default()));
    }
}
