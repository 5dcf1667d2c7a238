use std::collections::VecDeque;

use crate::components::Cell;
use crate::maze::MazeGraph;

/// Distance value of a cell the search never reached.
pub const UNREACHED: i32 = -1;

/// Breadth-first distance field over the open passages of a [`MazeGraph`].
///
/// Built eagerly and owned outright, so a hunter can compute one per tick
/// and drop it without touching shared state.
#[derive(Debug, Clone)]
pub struct ConnectivitySearch {
    width: i32,
    height: i32,
    distances: Vec<i32>,
    parents: Vec<Option<Cell>>,
    most_distant: Cell,
    reached: usize,
}

impl ConnectivitySearch {
    pub fn new<R>(maze: &MazeGraph<R>, source: Cell) -> Self {
        Self::from_sources(maze, &[source])
    }

    /// Multi-source search: every source starts at distance zero and each cell
    /// ends up measured from its nearest source. Out-of-bounds sources are skipped.
    pub fn from_sources<R>(maze: &MazeGraph<R>, sources: &[Cell]) -> Self {
        let mut dist = vec![UNREACHED; maze.cell_count()];
        let mut parents = vec![None; maze.cell_count()];
        let mut q = VecDeque::new();
        let mut most_distant = None;
        let mut best = UNREACHED;
        let mut reached = 0;

        for &source in sources {
            if !maze.in_bounds(source) {
                continue;
            }
            let idx = maze.index(source);
            if dist[idx] == UNREACHED {
                dist[idx] = 0;
                reached += 1;
                if best < 0 {
                    best = 0;
                    most_distant = Some(source);
                }
                q.push_back(source);
            }
        }

        while let Some(pos) = q.pop_front() {
            let base = dist[maze.index(pos)];
            for next in maze.maze_adjacent(pos) {
                let idx = maze.index(next);
                if dist[idx] == UNREACHED {
                    dist[idx] = base + 1;
                    parents[idx] = Some(pos);
                    reached += 1;
                    // Strictly greater: the first cell found at a new depth wins ties.
                    if base + 1 > best {
                        best = base + 1;
                        most_distant = Some(next);
                    }
                    q.push_back(next);
                }
            }
        }

        Self {
            width: maze.width(),
            height: maze.height(),
            distances: dist,
            parents,
            // No source in bounds: nothing reached, fall back to the origin.
            most_distant: most_distant.unwrap_or_default(),
            reached,
        }
    }

    /// Row-major distance table, [`UNREACHED`] for cells the search never found.
    pub fn distances(&self) -> &[i32] {
        &self.distances
    }

    pub fn distance(&self, cell: Cell) -> Option<u32> {
        let idx = self.index(cell)?;
        u32::try_from(self.distances[idx]).ok()
    }

    /// The reached cell farthest from the sources. Among cells at the maximum
    /// distance, the one discovered first in traversal order.
    ///
    /// When no source lay in bounds nothing was reached and this is
    /// `Cell::default()`, which is not a reached cell. Check
    /// [`reached_count`](Self::reached_count) before trusting it.
    pub fn most_distant(&self) -> Cell {
        self.most_distant
    }

    pub fn reached_count(&self) -> usize {
        self.reached
    }

    /// Cells from the nearest source to `end`, both included. Empty when `end`
    /// was not reached.
    pub fn shortest_path(&self, end: Cell) -> Vec<Cell> {
        let Some(mut idx) = self.index(end) else {
            return Vec::new();
        };
        if self.distances[idx] == UNREACHED {
            return Vec::new();
        }

        let mut path = vec![end];
        while let Some(prev) = self.parents[idx] {
            path.push(prev);
            idx = (prev.y * self.width + prev.x) as usize;
        }
        path.reverse();
        path
    }

    fn index(&self, cell: Cell) -> Option<usize> {
        if cell.x < 0 || cell.x >= self.width || cell.y < 0 || cell.y >= self.height {
            return None;
        }
        Some((cell.y * self.width + cell.x) as usize)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn source_is_zero_and_everything_is_reached() {
        let maze = MazeGraph::with_seed(8, 6, 5).unwrap();
        let source = Cell::new(3, 2);
        let search = ConnectivitySearch::new(&maze, source);
        assert_eq!(search.distance(source), Some(0));
        assert_eq!(search.reached_count(), maze.cell_count());
        assert!(search.distances().iter().all(|d| *d >= 0));
    }

    #[test]
    fn neighbors_differ_by_at_most_one() {
        let mut maze = MazeGraph::with_seed(7, 7, 8).unwrap();
        maze.break_walls(10);
        let search = ConnectivitySearch::new(&maze, Cell::new(0, 0));
        for i in 0..maze.cell_count() {
            let cell = maze.cell_at(i);
            let d = search.distance(cell).unwrap();
            for next in maze.maze_adjacent(cell) {
                let nd = search.distance(next).unwrap();
                assert!(d.abs_diff(nd) <= 1);
            }
        }
    }

    #[test]
    fn most_distant_is_maximal() {
        let maze = MazeGraph::with_seed(10, 9, 13).unwrap();
        let search = ConnectivitySearch::new(&maze, Cell::new(4, 4));
        let far = search.distance(search.most_distant()).unwrap() as i32;
        assert_eq!(far, *search.distances().iter().max().unwrap());
    }

    #[test]
    fn shortest_path_walks_open_passages() {
        let maze = MazeGraph::with_seed(9, 9, 17).unwrap();
        let source = Cell::new(0, 0);
        let search = ConnectivitySearch::new(&maze, source);
        let end = search.most_distant();
        let path = search.shortest_path(end);

        assert_eq!(path.first(), Some(&source));
        assert_eq!(path.last(), Some(&end));
        assert_eq!(path.len() as u32, search.distance(end).unwrap() + 1);
        for pair in path.windows(2) {
            assert!(maze.maze_adjacent(pair[0]).contains(&pair[1]));
        }
    }

    #[test]
    fn multi_source_measures_from_nearest() {
        let maze = MazeGraph::with_seed(6, 6, 23).unwrap();
        let a = Cell::new(0, 0);
        let b = Cell::new(5, 5);
        let both = ConnectivitySearch::from_sources(&maze, &[a, b]);
        let from_a = ConnectivitySearch::new(&maze, a);
        let from_b = ConnectivitySearch::new(&maze, b);
        for i in 0..maze.cell_count() {
            let cell = maze.cell_at(i);
            let expected = from_a.distance(cell).min(from_b.distance(cell));
            assert_eq!(both.distance(cell), expected);
        }
    }

    #[test]
    fn out_of_bounds_lookups_are_none() {
        let maze = MazeGraph::with_seed(3, 3, 1).unwrap();
        let search = ConnectivitySearch::new(&maze, Cell::new(1, 1));
        assert_eq!(search.distance(Cell::new(3, 0)), None);
        assert!(search.shortest_path(Cell::new(-1, 0)).is_empty());
    }

    #[test]
    fn out_of_bounds_source_reaches_nothing() {
        let maze = MazeGraph::with_seed(3, 3, 1).unwrap();
        let search = ConnectivitySearch::new(&maze, Cell::new(7, 7));
        assert_eq!(search.reached_count(), 0);
        assert!(search.distances().iter().all(|d| *d == UNREACHED));
        assert_eq!(search.most_distant(), Cell::default());
        assert_eq!(search.distance(search.most_distant()), None);
    }

    #[test]
    fn most_distant_tie_goes_to_first_discovered() {
        // Single column: (0,0) and (0,4) are both two hops from the middle,
        // and Up is expanded before Down.
        let maze = MazeGraph::with_seed(1, 5, 0).unwrap();
        let search = ConnectivitySearch::new(&maze, Cell::new(0, 2));
        assert_eq!(search.distance(Cell::new(0, 0)), Some(2));
        assert_eq!(search.distance(Cell::new(0, 4)), Some(2));
        assert_eq!(search.most_distant(), Cell::new(0, 0));
    }

    #[test]
    fn most_distant_among_sources_is_the_first_given() {
        let maze = MazeGraph::with_seed(1, 2, 0).unwrap();
        let top = Cell::new(0, 0);
        let bottom = Cell::new(0, 1);
        let search = ConnectivitySearch::from_sources(&maze, &[bottom, top]);
        assert_eq!(search.distance(search.most_distant()), Some(0));
        assert_eq!(search.most_distant(), bottom);
        let search = ConnectivitySearch::from_sources(&maze, &[top, bottom]);
        assert_eq!(search.most_distant(), top);
    }
}
