//! Pursuit behavior driven tick by tick through a recording actuator.

use maze_hunt::{
    next_step, Cell, ConnectivitySearch, Direction, HuntNavigator, HuntState, MazeGraph,
    MovementActuator,
};

#[derive(Default)]
struct Walker {
    pos: Cell,
    steps: Vec<Option<Direction>>,
}

impl MovementActuator for Walker {
    fn apply(&mut self, step: Option<Direction>) {
        if let Some(dir) = step {
            self.pos = self.pos.step(dir);
        }
        self.steps.push(step);
    }
}

#[test]
fn corridor_hunter_walks_straight_down() {
    // A one-column maze is a single corridor.
    let maze = MazeGraph::with_seed(1, 6, 0).unwrap();
    let target = Cell::new(0, 3);
    let mut walker = Walker::default();
    let mut nav = HuntNavigator::new();
    nav.observe(true, target);

    for _ in 0..3 {
        let pos = walker.pos;
        nav.drive(&maze, pos, &mut walker);
        assert!(maze.in_bounds(walker.pos));
    }
    assert_eq!(walker.pos, target);
    assert_eq!(walker.steps, vec![Some(Direction::Down); 3]);

    // Co-located: hold.
    let pos = walker.pos;
    assert_eq!(nav.drive(&maze, pos, &mut walker), None);
    assert_eq!(nav.state(), HuntState::Pursuing);
}

#[test]
fn hunters_catch_a_stationary_target_in_shortest_time() {
    let mut maze = MazeGraph::square_with_seed(13, 7).unwrap();
    maze.break_walls(10);
    let target = maze.next_start_location();

    for _ in 0..4 {
        let start = maze.next_start_location();
        let expected = ConnectivitySearch::new(&maze, target).distance(start).unwrap();

        let mut walker = Walker {
            pos: start,
            steps: Vec::new(),
        };
        let mut nav = HuntNavigator::new();
        nav.observe(true, target);
        while walker.pos != target {
            let pos = walker.pos;
            let step = nav.drive(&maze, pos, &mut walker);
            assert!(step.is_some(), "hunter stalled at {:?}", pos);
            assert!(walker.steps.len() as u32 <= expected);
        }
        assert_eq!(walker.steps.len() as u32, expected);
    }
}

#[test]
fn moving_target_is_tracked_each_tick() {
    let maze = MazeGraph::with_seed(1, 10, 0).unwrap();
    let mut walker = Walker::default();
    let mut nav = HuntNavigator::new();
    let mut target = Cell::new(0, 9);

    for _ in 0..4 {
        nav.observe(true, target);
        let pos = walker.pos;
        nav.drive(&maze, pos, &mut walker);
        // Target walks toward the hunter after each hunter step.
        target = target.step(Direction::Up);
    }
    // Hunter went down four times, target came up four times.
    assert_eq!(walker.pos, Cell::new(0, 4));
    assert_eq!(target, Cell::new(0, 5));
    assert_eq!(next_step(&maze, walker.pos, target), Some(Direction::Down));
}

#[test]
fn losing_sight_heads_for_last_known_cell() {
    let maze = MazeGraph::with_seed(1, 8, 0).unwrap();
    let mut walker = Walker::default();
    let mut nav = HuntNavigator::new();

    nav.observe(true, Cell::new(0, 2));
    nav.observe(false, Cell::new(0, 7));
    assert_eq!(nav.state(), HuntState::Lost);

    for _ in 0..2 {
        let pos = walker.pos;
        nav.drive(&maze, pos, &mut walker);
    }
    assert_eq!(walker.pos, Cell::new(0, 2));
    let pos = walker.pos;
    assert_eq!(nav.drive(&maze, pos, &mut walker), None);
    assert_eq!(nav.state(), HuntState::Idle);
}

#[test]
fn off_grid_target_holds_without_panicking() {
    let maze = MazeGraph::with_seed(5, 5, 2).unwrap();
    let mut nav = HuntNavigator::new();
    nav.observe(true, Cell::new(9, -3));
    assert_eq!(nav.tick(&maze, Cell::new(2, 2)), None);
    assert_eq!(nav.state(), HuntState::Pursuing);
}
