use log::{debug, info, trace};
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use crate::components::{Cell, Direction};
use crate::error::{MazeError, MazeResult};
use crate::search::ConnectivitySearch;

/// Grid maze stored as one byte of open-edge flags per cell.
///
/// Generation always yields a spanning tree of the grid, so every cell is
/// reachable from every other one. The only later mutation,
/// [`MazeGraph::break_walls`], adds passages and never removes them.
#[derive(Debug, Clone)]
pub struct MazeGraph<R = ChaCha8Rng> {
    width: i32,
    height: i32,
    open: Vec<u8>,
    passages: usize,
    generation_start: Cell,
    start_tree: Vec<Cell>,
    rng: R,
}

impl MazeGraph<ChaCha8Rng> {
    /// Generates a maze seeded from OS entropy.
    pub fn new(width: i32, height: i32) -> MazeResult<Self> {
        Self::with_rng(width, height, ChaCha8Rng::from_entropy())
    }

    /// Generates a reproducible maze: the same seed always carves the same layout.
    pub fn with_seed(width: i32, height: i32, seed: u64) -> MazeResult<Self> {
        Self::with_rng(width, height, ChaCha8Rng::seed_from_u64(seed))
    }

    pub fn square(size: i32) -> MazeResult<Self> {
        Self::new(size, size)
    }

    pub fn square_with_seed(size: i32, seed: u64) -> MazeResult<Self> {
        Self::with_seed(size, size, seed)
    }
}

impl<R> MazeGraph<R> {
    pub fn width(&self) -> i32 {
        self.width
    }

    pub fn height(&self) -> i32 {
        self.height
    }

    pub fn cell_count(&self) -> usize {
        self.open.len()
    }

    /// The cell the spanning-tree carve grew from.
    pub fn generation_start(&self) -> Cell {
        self.generation_start
    }

    /// Accepts a [`Cell`] or an `(x, y)` tuple.
    pub fn in_bounds(&self, cell: impl Into<Cell>) -> bool {
        let cell = cell.into();
        cell.x >= 0 && cell.x < self.width && cell.y >= 0 && cell.y < self.height
    }

    /// True when no passage leads from `cell` toward `dir`. Anything off the
    /// grid counts as walled.
    pub fn is_wall(&self, cell: Cell, dir: Direction) -> bool {
        if !self.in_bounds(cell) {
            return true;
        }
        self.open[self.index(cell)] & dir.bit() == 0
    }

    pub fn open_directions(&self, cell: Cell) -> Vec<Direction> {
        Direction::ALL
            .into_iter()
            .filter(|dir| !self.is_wall(cell, *dir))
            .collect()
    }

    /// Neighbors reachable through an open passage, in [`Direction::ALL`] order.
    pub fn maze_adjacent(&self, cell: Cell) -> Vec<Cell> {
        self.open_directions(cell)
            .into_iter()
            .map(|dir| cell.step(dir))
            .collect()
    }

    /// In-bounds neighbors separated from `cell` by a wall.
    pub fn not_maze_adjacent(&self, cell: Cell) -> Vec<Cell> {
        self.walled_directions(cell)
            .into_iter()
            .map(|dir| cell.step(dir))
            .collect()
    }

    /// In-bounds neighbors, walls ignored.
    pub fn adjacent(&self, cell: Cell) -> Vec<Cell> {
        if !self.in_bounds(cell) {
            return Vec::new();
        }
        Direction::ALL
            .into_iter()
            .map(|dir| cell.step(dir))
            .filter(|next| self.in_bounds(*next))
            .collect()
    }

    pub fn passage_count(&self) -> usize {
        self.passages
    }

    /// Number of grid edges between in-bounds cells, i.e. the passage count
    /// of a maze with every interior wall removed.
    pub fn max_passage_count(&self) -> usize {
        let (w, h) = (self.width as usize, self.height as usize);
        (w - 1) * h + w * (h - 1)
    }

    pub fn is_fully_connected(&self) -> bool {
        let search = ConnectivitySearch::new(self, Cell::new(0, 0));
        search.reached_count() == self.cell_count()
    }

    pub(crate) fn index(&self, cell: Cell) -> usize {
        debug_assert!(self.in_bounds(cell));
        (cell.y * self.width + cell.x) as usize
    }

    pub(crate) fn cell_at(&self, index: usize) -> Cell {
        let index = index as i32;
        Cell::new(index % self.width, index / self.width)
    }

    fn walled_directions(&self, cell: Cell) -> Vec<Direction> {
        if !self.in_bounds(cell) {
            return Vec::new();
        }
        Direction::ALL
            .into_iter()
            .filter(|dir| self.in_bounds(cell.step(*dir)) && self.is_wall(cell, *dir))
            .collect()
    }

    /// Opens the edge from `cell` toward `dir` on both sides. Returns false when
    /// the edge leaves the grid or is already open.
    fn open_passage(&mut self, cell: Cell, dir: Direction) -> bool {
        let next = cell.step(dir);
        if !self.in_bounds(cell) || !self.in_bounds(next) {
            return false;
        }
        let (a, b) = (self.index(cell), self.index(next));
        if self.open[a] & dir.bit() != 0 {
            return false;
        }
        self.open[a] |= dir.bit();
        self.open[b] |= dir.opposite().bit();
        self.passages += 1;
        true
    }
}

impl<R: Rng> MazeGraph<R> {
    /// Generates a maze drawing every random choice from `rng`.
    pub fn with_rng(width: i32, height: i32, rng: R) -> MazeResult<Self> {
        if width <= 0 || height <= 0 {
            return Err(MazeError::InvalidDimensions { width, height });
        }
        let cells = width
            .checked_mul(height)
            .ok_or(MazeError::TooLarge { width, height })?;

        let mut maze = Self {
            width,
            height,
            open: vec![0; cells as usize],
            passages: 0,
            generation_start: Cell::default(),
            start_tree: Vec::new(),
            rng,
        };
        maze.generate();
        let first_claim = maze.random_cell();
        maze.start_tree.push(first_claim);

        info!(
            "generated {}x{} maze from {:?} ({} passages)",
            width, height, maze.generation_start, maze.passages
        );
        Ok(maze)
    }

    pub fn random_cell(&mut self) -> Cell {
        Cell::new(
            self.rng.gen_range(0..self.width),
            self.rng.gen_range(0..self.height),
        )
    }

    /// Hands out spawn cells that spread across the maze.
    ///
    /// Keeps a tree of claimed cells. Each call returns the cell farthest (in
    /// passage hops) from everything claimed so far and claims the path to it.
    /// Once the whole grid is claimed the cycle restarts from a random cell.
    pub fn next_start_location(&mut self) -> Cell {
        if self.start_tree.len() >= self.cell_count() {
            let restart = self.random_cell();
            debug!("start locations exhausted, restarting cycle at {:?}", restart);
            self.start_tree.clear();
            self.start_tree.push(restart);
        }

        let search = ConnectivitySearch::from_sources(self, &self.start_tree);
        let farthest = search.most_distant();
        // The head of the path is already part of the tree.
        let path = search.shortest_path(farthest);
        self.start_tree.extend(path.into_iter().skip(1));
        farthest
    }

    /// Breaks up to `count` walls between grid-adjacent cells, adding loops.
    ///
    /// Returns the number of walls actually removed, which is smaller than
    /// `count` only when the grid ran out of interior walls.
    pub fn break_walls(&mut self, count: usize) -> usize {
        let mut broken = 0;
        while broken < count {
            if self.passages >= self.max_passage_count() {
                debug!("no walls left to break after {} of {}", broken, count);
                break;
            }
            let cell = self.random_cell();
            let walled = self.walled_directions(cell);
            let Some(&dir) = walled.choose(&mut self.rng) else {
                continue;
            };
            if self.open_passage(cell, dir) {
                trace!("broke wall {:?} -> {:?}", cell, cell.step(dir));
                broken += 1;
            }
        }
        debug_assert!(self.is_fully_connected());
        broken
    }

    /// Randomized Prim: grow the tree by joining a uniformly chosen frontier
    /// cell to a uniformly chosen neighbor already inside it.
    fn generate(&mut self) {
        let mut in_maze = vec![false; self.cell_count()];
        let mut queued = vec![false; self.cell_count()];
        let mut frontier: Vec<Cell> = Vec::new();

        let start = self.random_cell();
        self.generation_start = start;
        let start_idx = self.index(start);
        in_maze[start_idx] = true;
        queued[start_idx] = true;
        self.add_frontier(start, &mut queued, &mut frontier);

        while !frontier.is_empty() {
            let pick = self.rng.gen_range(0..frontier.len());
            let cell = frontier.swap_remove(pick);

            let joined: Vec<Direction> = Direction::ALL
                .into_iter()
                .filter(|dir| {
                    let next = cell.step(*dir);
                    self.in_bounds(next) && in_maze[self.index(next)]
                })
                .collect();
            let Some(&dir) = joined.choose(&mut self.rng) else {
                continue;
            };

            let idx = self.index(cell);
            in_maze[idx] = true;
            self.open_passage(cell, dir);
            self.add_frontier(cell, &mut queued, &mut frontier);
        }

        debug_assert_eq!(self.passages, self.cell_count() - 1);
    }

    fn add_frontier(&self, cell: Cell, queued: &mut [bool], frontier: &mut Vec<Cell>) {
        for dir in Direction::ALL {
            let next = cell.step(dir);
            if !self.in_bounds(next) {
                continue;
            }
            let idx = self.index(next);
            if !queued[idx] {
                queued[idx] = true;
                frontier.push(next);
            }
        }
    }
}
