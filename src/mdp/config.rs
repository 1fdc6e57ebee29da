use super::actuator::{NoisyActuator, DEFAULT_LIVING_REWARD};
use super::geometry::Point;
use super::grid_world::{GridWorld, DEFAULT_GOAL_VALUE, DEFAULT_PIT_VALUE};
use super::value_iteration::ValueIteration;
use crate::error::Result;

/// Configuration for a grid-world problem and the solver that runs on it.
///
/// `Default` is the classic 3x4 world: goal at (0, 3), pit at (1, 3),
/// obstacle at (1, 1), gamma 0.9, 100 iterations.
#[derive(Debug, Clone, PartialEq)]
pub struct GridWorldConfig {
    pub height: usize,
    pub width: usize,
    pub goal: Point,
    pub pit: Point,
    /// Optional impassable cell.
    pub obstacle: Option<Point>,
    pub goal_value: f64,
    pub pit_value: f64,
    /// Reward charged on every transition.
    pub living_reward: f64,
    /// Discount factor, strictly between 0 and 1.
    pub gamma: f64,
    /// Iteration budget handed to [`ValueIteration::run`].
    pub iterations: usize,
}

impl GridWorldConfig {
    /// Create a config for a `height` x `width` grid with the given terminals,
    /// no obstacle and default rewards, discount (0.9) and budget (100).
    pub fn new(height: usize, width: usize, goal: Point, pit: Point) -> Self {
        Self {
            height,
            width,
            goal,
            pit,
            obstacle: None,
            goal_value: DEFAULT_GOAL_VALUE,
            pit_value: DEFAULT_PIT_VALUE,
            living_reward: DEFAULT_LIVING_REWARD,
            gamma: 0.9,
            iterations: 100,
        }
    }

    pub fn with_obstacle(mut self, obstacle: Point) -> Self {
        self.obstacle = Some(obstacle);
        self
    }

    pub fn with_terminal_values(mut self, goal_value: f64, pit_value: f64) -> Self {
        self.goal_value = goal_value;
        self.pit_value = pit_value;
        self
    }

    pub fn with_living_reward(mut self, living_reward: f64) -> Self {
        self.living_reward = living_reward;
        self
    }

    pub fn with_gamma(mut self, gamma: f64) -> Self {
        self.gamma = gamma;
        self
    }

    pub fn with_iterations(mut self, iterations: usize) -> Self {
        self.iterations = iterations;
        self
    }

    /// Builds the grid, places its special cells and binds a solver to it.
    ///
    /// # Errors
    /// Any error the individual construction steps report: bad dimensions,
    /// out-of-bounds or overlapping cells, a non-finite reward, or a discount
    /// factor outside (0, 1).
    pub fn build(&self) -> Result<ValueIteration<NoisyActuator>> {
        let model = NoisyActuator::new(self.living_reward)?;
        let mut grid =
            GridWorld::with_terminal_values(self.height, self.width, self.goal_value, self.pit_value)?;
        grid.set_goal(self.goal)?;
        grid.set_pit(self.pit)?;
        if let Some(obstacle) = self.obstacle {
            grid.set_obstacle(obstacle)?;
        }

        ValueIteration::new(grid, model, self.gamma)
    }

    /// Builds the solver and spends the configured iteration budget on it.
    pub fn solve(&self) -> Result<ValueIteration<NoisyActuator>> {
        let mut solver = self.build()?;
        solver.run(self.iterations)?;
        Ok(solver)
    }
}

impl Default for GridWorldConfig {
    fn default() -> Self {
        GridWorldConfig::new(3, 4, Point::new(0, 3), Point::new(1, 3)).with_obstacle(Point::new(1, 1))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::MdpError;
    use crate::mdp::{Action, CellValue, Phase};
    use approx::assert_relative_eq;

    #[test]
    fn test_default_is_the_classic_world() {
        let config = GridWorldConfig::default();
        assert_eq!((config.height, config.width), (3, 4));
        assert_eq!(config.obstacle, Some(Point::new(1, 1)));
        assert_eq!(config.gamma, 0.9);
        assert_eq!(config.iterations, 100);
        assert_eq!(config.living_reward, -0.01);

        let solver = config.solve().unwrap();
        assert_eq!(solver.phase(), Phase::BudgetExhausted);
        assert_eq!(solver.grid().action(Point::new(0, 2)), Some(Action::East));
    }

    #[test]
    fn test_builder_matches_manual_construction() {
        let mut grid = GridWorld::new(3, 4).unwrap();
        grid.set_goal(Point::new(0, 3)).unwrap();
        grid.set_pit(Point::new(1, 3)).unwrap();
        grid.set_obstacle(Point::new(1, 1)).unwrap();
        let mut manual = ValueIteration::new(grid, NoisyActuator::default(), 0.9).unwrap();
        manual.run(100).unwrap();

        let built = GridWorldConfig::default().solve().unwrap();
        assert_eq!(manual.grid().tables(), built.grid().tables());
    }

    #[test]
    fn test_custom_rewards_flow_through() {
        let solver = GridWorldConfig::new(1, 3, Point::new(0, 2), Point::new(0, 0))
            .with_terminal_values(10.0, -10.0)
            .with_living_reward(0.0)
            .with_gamma(0.5)
            .with_iterations(2)
            .solve()
            .unwrap();

        assert_eq!(solver.grid().value(Point::new(0, 2)), Some(CellValue::Value(10.0)));
        // East from the middle: 0.8 into the goal, both slips bump in place.
        let middle = solver.grid().value(Point::new(0, 1)).and_then(CellValue::value);
        assert_relative_eq!(middle.unwrap(), 0.8 * 0.5 * 10.0, epsilon = 1e-12);
    }

    #[test]
    fn test_invalid_configs_rejected() {
        let base = GridWorldConfig::default();

        let overlapping = GridWorldConfig {
            pit: Point::new(0, 3),
            ..base.clone()
        };
        assert!(matches!(
            overlapping.build(),
            Err(MdpError::CellConflict { existing: "goal", .. })
        ));

        let outside = base.clone().with_obstacle(Point::new(7, 7));
        assert!(matches!(outside.build(), Err(MdpError::OutOfBounds { .. })));

        let bad_gamma = base.clone().with_gamma(1.5);
        assert!(matches!(bad_gamma.build(), Err(MdpError::InvalidInput(_))));

        let bad_reward = base.clone().with_living_reward(f64::INFINITY);
        assert!(matches!(bad_reward.build(), Err(MdpError::InvalidInput(_))));

        let empty = GridWorldConfig { height: 0, ..base };
        assert!(matches!(empty.build(), Err(MdpError::InvalidInput(_))));
    }
}
