pub mod actuator;
pub mod config;
pub mod geometry;
pub mod grid_world;
pub mod render;
pub mod value_iteration;

// Re-export the grid-world MDP building blocks
pub use actuator::{NoisyActuator, TransitionModel, DEFAULT_LIVING_REWARD};
pub use config::GridWorldConfig;
pub use geometry::{Action, Point};
pub use grid_world::{CellValue, GridWorld, Tables, DEFAULT_GOAL_VALUE, DEFAULT_PIT_VALUE};
pub use render::{ActionValueTable, PolicyTable, ValueTable};
pub use value_iteration::{Phase, SweepModel, SweepReport, ValueIteration};
