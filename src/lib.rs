//! Grid maze generation and pursuit navigation.
//!
//! [`MazeGraph`] carves a perfect maze and can knock out extra walls without
//! ever disconnecting it. [`ConnectivitySearch`] computes breadth-first
//! distance fields over its passages, and [`HuntNavigator`] turns such a field
//! into one step per AI tick that closes in on a target.

pub mod components;
pub mod config;
pub mod error;
pub mod hunt;
pub mod maze;
pub mod search;

pub use components::{Cell, Direction};
pub use config::MazeConfig;
pub use error::{MazeError, MazeResult};
pub use hunt::{next_step, HuntNavigator, HuntState, MovementActuator, PatrolRoute};
pub use maze::MazeGraph;
pub use search::{ConnectivitySearch, UNREACHED};
