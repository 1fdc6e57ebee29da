//! Value iteration for an agent on a small grid whose actuator is noisy.
//!
//! ```
//! use gridmdp::{GridWorldConfig, Point, Action};
//!
//! let solver = GridWorldConfig::default().solve().unwrap();
//! assert_eq!(solver.grid().action(Point::new(0, 2)), Some(Action::East));
//! println!("{}", solver.grid().display_values());
//! ```

pub mod error;
pub mod mdp;

pub use error::{MdpError, Result};
pub use mdp::*;
