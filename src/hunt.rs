use log::debug;

use crate::components::{Cell, Direction};
use crate::maze::MazeGraph;
use crate::search::ConnectivitySearch;

/// Whatever actually moves a hunting entity. The navigator only decides.
pub trait MovementActuator {
    /// `None` means hold position for this tick.
    fn apply(&mut self, step: Option<Direction>);
}

/// One step from `hunter` that strictly shortens the passage distance to
/// `target`, or `None` to hold.
///
/// Builds a fresh distance field seeded at the target on every call. When
/// several neighbors qualify the first in [`Direction::ALL`] order wins
/// (up, right, down, left).
pub fn next_step<R>(maze: &MazeGraph<R>, hunter: Cell, target: Cell) -> Option<Direction> {
    if !maze.in_bounds(hunter) || !maze.in_bounds(target) {
        debug!("holding: hunter {:?} or target {:?} off the grid", hunter, target);
        return None;
    }
    let field = ConnectivitySearch::new(maze, target);
    descend(maze, &field, hunter)
}

/// Steepest-descent step over an existing distance field.
pub fn descend<R>(maze: &MazeGraph<R>, field: &ConnectivitySearch, from: Cell) -> Option<Direction> {
    let here = field.distance(from)?;
    maze.open_directions(from)
        .into_iter()
        .find(|dir| field.distance(from.step(*dir)).is_some_and(|d| d < here))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum HuntState {
    #[default]
    Idle,
    /// Recomputing the distance field inside a pursuit tick.
    Searching,
    Pursuing,
    Lost,
}

/// Per-hunter pursuit state. Detection is decided by the caller and fed in
/// through [`HuntNavigator::observe`]; the only thing carried across ticks is
/// the target's last known cell.
#[derive(Debug, Clone, Default)]
pub struct HuntNavigator {
    state: HuntState,
    last_known: Option<Cell>,
}

impl HuntNavigator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> HuntState {
        self.state
    }

    pub fn last_known_target(&self) -> Option<Cell> {
        self.last_known
    }

    pub fn observe(&mut self, in_range: bool, target: Cell) {
        if in_range {
            self.last_known = Some(target);
        }
        let next = match (self.state, in_range) {
            (HuntState::Idle | HuntState::Lost, true) => HuntState::Pursuing,
            (HuntState::Pursuing | HuntState::Searching, false) => HuntState::Lost,
            (state, _) => state,
        };
        if next != self.state {
            debug!("hunt state {:?} -> {:?}", self.state, next);
            self.state = next;
        }
    }

    /// Decision for this tick.
    ///
    /// Pursuing steps toward the target's last observed cell. Lost keeps
    /// walking to where the target was last seen and goes idle on arrival.
    pub fn tick<R>(&mut self, maze: &MazeGraph<R>, hunter: Cell) -> Option<Direction> {
        match self.state {
            HuntState::Idle | HuntState::Searching => None,
            HuntState::Pursuing => {
                self.state = HuntState::Searching;
                let step = self.last_known.and_then(|target| next_step(maze, hunter, target));
                self.state = HuntState::Pursuing;
                step
            }
            HuntState::Lost => {
                let step = self.last_known.and_then(|last| next_step(maze, hunter, last));
                if step.is_none() {
                    debug!("lost target, giving up at {:?}", hunter);
                    self.state = HuntState::Idle;
                    self.last_known = None;
                }
                step
            }
        }
    }

    /// [`HuntNavigator::tick`], with the result handed to `actuator`.
    pub fn drive<R, A>(&mut self, maze: &MazeGraph<R>, hunter: Cell, actuator: &mut A) -> Option<Direction>
    where
        A: MovementActuator + ?Sized,
    {
        let step = self.tick(maze, hunter);
        actuator.apply(step);
        step
    }
}

/// Loops through fixed waypoints, stepping along shortest passages.
#[derive(Debug, Clone)]
pub struct PatrolRoute {
    waypoints: Vec<Cell>,
    current: usize,
}

impl PatrolRoute {
    pub fn new(waypoints: Vec<Cell>) -> Self {
        Self {
            waypoints,
            current: 0,
        }
    }

    pub fn current_waypoint(&self) -> Option<Cell> {
        self.waypoints.get(self.current).copied()
    }

    /// Advances to the next waypoint once `walker` stands on the current one.
    pub fn next_step<R>(&mut self, maze: &MazeGraph<R>, walker: Cell) -> Option<Direction> {
        let waypoint = self.current_waypoint()?;
        if walker == waypoint {
            self.current = (self.current + 1) % self.waypoints.len();
        }
        let waypoint = self.current_waypoint()?;
        next_step(maze, walker, waypoint)
    }
}
