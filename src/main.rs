use crossterm::cursor::{Hide, MoveTo, Show};
use crossterm::event::{self, Event, KeyCode, KeyEventKind};
use crossterm::style::{Color, Print, ResetColor, SetForegroundColor};
use crossterm::terminal::{self, Clear, ClearType, EnterAlternateScreen, LeaveAlternateScreen};
use crossterm::{ExecutableCommand, QueueableCommand};
use log::{error, info};
use maze_hunt::{
    Cell, ConnectivitySearch, Direction, HuntNavigator, HuntState, MazeConfig,
    MazeGraph, MazeResult, MovementActuator, PatrolRoute,
};
use std::fs::File;
use std::io::{self, Stdout, Write};
use std::process;
use std::thread;
use std::time::{Duration, Instant};
use unicode_width::UnicodeWidthStr;

const CELL_W: usize = 2;
const INPUT_HOLD_MS: u64 = 160;

/// Where a hunter stands. The navigator decides, this moves.
struct Body {
    pos: Cell,
}

impl MovementActuator for Body {
    fn apply(&mut self, step: Option<Direction>) {
        if let Some(dir) = step {
            self.pos = self.pos.step(dir);
        }
    }
}

struct Hunter {
    body: Body,
    spawn: Cell,
    nav: HuntNavigator,
    patrol: PatrolRoute,
}

impl Hunter {
    fn new(spawn: Cell, lookout: Cell) -> Self {
        Self {
            body: Body { pos: spawn },
            spawn,
            nav: HuntNavigator::new(),
            patrol: PatrolRoute::new(vec![lookout, spawn]),
        }
    }

    fn respawn(&mut self) {
        self.body.pos = self.spawn;
        self.nav = HuntNavigator::new();
    }
}

struct Game {
    maze: MazeGraph,
    player: Cell,
    player_spawn: Cell,
    hunters: Vec<Hunter>,
    dir: Option<Direction>,
    detection_range: u32,
    hunter_tick_interval: u32,
    tick: u32,
    caught: u32,
}

impl Game {
    fn new(config: &MazeConfig) -> MazeResult<Self> {
        let mut maze = match config.seed {
            Some(seed) => MazeGraph::with_seed(config.width, config.height, seed)?,
            None => MazeGraph::new(config.width, config.height)?,
        };
        let broken = maze.break_walls(config.extra_passages);
        info!("broke {} of {} requested walls", broken, config.extra_passages);

        let player = maze.next_start_location();
        let hunters = (0..config.hunters)
            .map(|_| {
                let spawn = maze.next_start_location();
                let lookout = maze.random_cell();
                Hunter::new(spawn, lookout)
            })
            .collect();

        Ok(Game {
            maze,
            player,
            player_spawn: player,
            hunters,
            dir: None,
            detection_range: config.detection_range,
            hunter_tick_interval: config.hunter_tick_interval,
            tick: 0,
            caught: 0,
        })
    }

    fn apply_input(&mut self, desired_dir: Option<Direction>) {
        match desired_dir {
            None => self.dir = None,
            Some(dir) if !self.maze.is_wall(self.player, dir) => self.dir = Some(dir),
            Some(_) => {}
        }
    }

    fn move_player(&mut self) {
        if let Some(dir) = self.dir {
            if self.maze.is_wall(self.player, dir) {
                self.dir = None;
            } else {
                self.player = self.player.step(dir);
            }
        }
    }

    fn update_hunters(&mut self) {
        self.tick = self.tick.wrapping_add(1);
        if self.tick % self.hunter_tick_interval != 0 {
            return;
        }
        // One field from the player answers every hunter's detection check.
        let sight = ConnectivitySearch::new(&self.maze, self.player);
        for hunter in &mut self.hunters {
            let in_range = sight
                .distance(hunter.body.pos)
                .is_some_and(|d| d <= self.detection_range);
            hunter.nav.observe(in_range, self.player);
            if hunter.nav.state() == HuntState::Idle {
                let step = hunter.patrol.next_step(&self.maze, hunter.body.pos);
                hunter.body.apply(step);
            } else {
                hunter
                    .nav
                    .drive(&self.maze, hunter.body.pos, &mut hunter.body);
            }
        }
    }

    fn handle_collisions(&mut self) {
        if self.hunters.iter().any(|h| h.body.pos == self.player) {
            self.caught += 1;
            info!("caught at {:?} ({} total)", self.player, self.caught);
            self.player = self.player_spawn;
            self.dir = None;
            for hunter in &mut self.hunters {
                hunter.respawn();
            }
        }
    }
}

#[derive(Clone, Copy, PartialEq)]
enum Glyph {
    Player,
    Hunter,
    Wall,
    Empty,
}

#[derive(Clone, Copy, PartialEq)]
struct Tile {
    glyph: Glyph,
    color: Color,
}

struct Renderer {
    last: Vec<Tile>,
    last_hud: String,
    needs_full: bool,
    origin_x: u16,
    origin_y: u16,
    cols: usize,
    rows: usize,
}

impl Renderer {
    fn new(maze: &MazeGraph) -> Self {
        let cols = maze.width() as usize * 2 + 1;
        let rows = maze.height() as usize * 2 + 1;
        Self {
            last: vec![
                Tile {
                    glyph: Glyph::Empty,
                    color: Color::Reset,
                };
                cols * rows
            ],
            last_hud: String::new(),
            needs_full: true,
            origin_x: 0,
            origin_y: 1,
            cols,
            rows,
        }
    }
}

fn main() -> io::Result<()> {
    init_logging();

    let config = match load_config() {
        Ok(config) => config,
        Err(err) => {
            error!("{}", err);
            eprintln!("maze_hunt: {}", err);
            process::exit(2);
        }
    };
    let mut game = match Game::new(&config) {
        Ok(game) => game,
        Err(err) => {
            error!("{}", err);
            eprintln!("maze_hunt: {}", err);
            process::exit(2);
        }
    };

    let mut stdout = io::stdout();
    terminal::enable_raw_mode()?;
    stdout.execute(EnterAlternateScreen)?;
    stdout.execute(Hide)?;

    let result = run(&mut stdout, &mut game, &config);

    stdout.execute(Show)?;
    stdout.execute(LeaveAlternateScreen)?;
    terminal::disable_raw_mode()?;
    result
}

/// The alternate screen owns the terminal, so logs only go somewhere useful
/// when `MAZE_HUNT_LOG` names a file.
fn init_logging() {
    let mut builder =
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"));
    match std::env::var("MAZE_HUNT_LOG")
        .ok()
        .and_then(|path| File::create(path).ok())
    {
        Some(file) => {
            builder.target(env_logger::Target::Pipe(Box::new(file)));
        }
        None => {
            builder.filter_level(log::LevelFilter::Error);
        }
    }
    builder.init();
}

fn load_config() -> MazeResult<MazeConfig> {
    let mut config = match std::env::args().nth(1) {
        Some(path) => MazeConfig::load(path)?,
        None => MazeConfig::default(),
    };
    config.apply_env();
    config.validate()?;
    Ok(config)
}

fn run(stdout: &mut Stdout, game: &mut Game, config: &MazeConfig) -> io::Result<()> {
    let mut last_tick = Instant::now();
    let mut last_seen: [Option<Instant>; 4] = [None, None, None, None];
    let mut last_pressed: Option<Direction> = None;
    let mut renderer = Renderer::new(&game.maze);
    let frame_time = Duration::from_micros(1_000_000 / config.render_fps.max(1));

    loop {
        let frame_start = Instant::now();
        while event::poll(Duration::from_millis(0))? {
            if let Event::Key(key) = event::read()? {
                if !matches!(key.kind, KeyEventKind::Press | KeyEventKind::Repeat) {
                    continue;
                }
                let dir = match key.code {
                    KeyCode::Char('q') => return Ok(()),
                    KeyCode::Char('k') => Direction::Up,
                    KeyCode::Char('l') => Direction::Right,
                    KeyCode::Char('j') => Direction::Down,
                    KeyCode::Char('h') => Direction::Left,
                    _ => continue,
                };
                last_seen[idx_for_dir(dir)] = Some(Instant::now());
                last_pressed = Some(dir);
            }
        }

        if last_tick.elapsed() >= Duration::from_millis(config.tick_ms) {
            last_tick = Instant::now();
            tick(game, active_dir_recent(&last_seen, last_pressed));
        }
        render(stdout, game, &mut renderer)?;

        let elapsed = frame_start.elapsed();
        if elapsed < frame_time {
            thread::sleep(frame_time - elapsed);
        }
    }
}

fn tick(game: &mut Game, desired_dir: Option<Direction>) {
    game.apply_input(desired_dir);
    game.move_player();
    game.handle_collisions();
    game.update_hunters();
    game.handle_collisions();
}

fn render(stdout: &mut Stdout, game: &Game, renderer: &mut Renderer) -> io::Result<()> {
    stdout.queue(MoveTo(0, 0))?;

    let (term_w, term_h) = terminal::size()?;
    let Some((needed_w, needed_h)) = screen_fit(renderer, term_w, term_h) else {
        stdout.queue(Clear(ClearType::All))?;
        let msg = format!(
            "Terminal too small. Need at least {}x{} (cols x rows). Current: {}x{}.",
            renderer.cols * CELL_W,
            renderer.rows + 2,
            term_w,
            term_h
        );
        stdout.queue(Print(msg))?;
        stdout.flush()?;
        renderer.needs_full = true;
        return Ok(());
    };

    let origin_x = (term_w - needed_w) / 2;
    let origin_y = (term_h - needed_h) / 2 + 1;
    if origin_x != renderer.origin_x || origin_y != renderer.origin_y {
        renderer.origin_x = origin_x;
        renderer.origin_y = origin_y;
        renderer.needs_full = true;
    }

    let hunting = game
        .hunters
        .iter()
        .filter(|h| h.nav.state() != HuntState::Idle)
        .count();
    let hud = format!(
        "Caught: {}  Hunting: {}/{}  Passages: {}  (hjkl to move, q to quit)",
        game.caught,
        hunting,
        game.hunters.len(),
        game.maze.passage_count()
    );
    if renderer.needs_full || hud != renderer.last_hud {
        stdout.queue(MoveTo(renderer.origin_x, renderer.origin_y - 1))?;
        stdout.queue(SetForegroundColor(Color::White))?;
        stdout.queue(Clear(ClearType::CurrentLine))?;
        stdout.queue(Print(&hud))?;
        stdout.queue(ResetColor)?;
        renderer.last_hud = hud;
    }

    for ty in 0..renderer.rows {
        for tx in 0..renderer.cols {
            let tile = tile_for(game, tx, ty);
            let idx = ty * renderer.cols + tx;
            if renderer.needs_full || tile != renderer.last[idx] {
                renderer.last[idx] = tile;
                draw_tile(stdout, renderer, tx, ty, tile)?;
            }
        }
    }
    renderer.needs_full = false;

    stdout.flush()?;
    Ok(())
}

/// Screen columns and rows the maze plus HUD needs, or `None` when that does
/// not fit in a `term_w` x `term_h` terminal.
fn screen_fit(renderer: &Renderer, term_w: u16, term_h: u16) -> Option<(u16, u16)> {
    let needed_w = u16::try_from(renderer.cols.checked_mul(CELL_W)?).ok()?;
    let needed_h = u16::try_from(renderer.rows.checked_add(2)?).ok()?;
    (needed_w <= term_w && needed_h <= term_h).then_some((needed_w, needed_h))
}

/// Maps a screen tile onto the maze: odd/odd tiles are cells, tiles between
/// two cells show the wall state of that edge, even/even tiles are pillars.
fn tile_for(game: &Game, tx: usize, ty: usize) -> Tile {
    let wall = Tile {
        glyph: Glyph::Wall,
        color: Color::Blue,
    };
    let empty = Tile {
        glyph: Glyph::Empty,
        color: Color::Reset,
    };
    let (cx, cy) = ((tx / 2) as i32, (ty / 2) as i32);
    match (tx % 2, ty % 2) {
        (1, 1) => {
            let cell = Cell::new(cx, cy);
            if cell == game.player {
                return Tile {
                    glyph: Glyph::Player,
                    color: Color::Yellow,
                };
            }
            if let Some(hunter) = game.hunters.iter().find(|h| h.body.pos == cell) {
                let color = match hunter.nav.state() {
                    HuntState::Idle => Color::Cyan,
                    HuntState::Lost => Color::Magenta,
                    HuntState::Searching | HuntState::Pursuing => Color::Red,
                };
                return Tile {
                    glyph: Glyph::Hunter,
                    color,
                };
            }
            empty
        }
        // Vertical edge left of cell (cx, cy).
        (0, 1) => {
            if game.maze.is_wall(Cell::new(cx, cy), Direction::Left) {
                wall
            } else {
                empty
            }
        }
        // Horizontal edge above cell (cx, cy).
        (1, 0) => {
            if game.maze.is_wall(Cell::new(cx, cy), Direction::Up) {
                wall
            } else {
                empty
            }
        }
        _ => wall,
    }
}

fn draw_tile(stdout: &mut Stdout, renderer: &Renderer, x: usize, y: usize, tile: Tile) -> io::Result<()> {
    let (text, color) = match tile.glyph {
        Glyph::Player => ("😃", tile.color),
        Glyph::Hunter => ("👻", tile.color),
        Glyph::Wall => ("██", tile.color),
        Glyph::Empty => ("  ", tile.color),
    };
    let x_pos = renderer.origin_x + (x * CELL_W) as u16;
    let y_pos = renderer.origin_y + y as u16;
    stdout.queue(MoveTo(x_pos, y_pos))?;
    stdout.queue(SetForegroundColor(color))?;
    stdout.queue(Print(text))?;
    let w = UnicodeWidthStr::width(text);
    if w < CELL_W {
        for _ in 0..(CELL_W - w) {
            stdout.queue(Print(' '))?;
        }
    }
    stdout.queue(ResetColor)?;
    Ok(())
}

fn active_dir_recent(
    last_seen: &[Option<Instant>; 4],
    last_pressed: Option<Direction>,
) -> Option<Direction> {
    let now = Instant::now();
    let hold = Duration::from_millis(INPUT_HOLD_MS);
    if let Some(dir) = last_pressed {
        if let Some(t) = last_seen[idx_for_dir(dir)] {
            if now.duration_since(t) <= hold {
                return Some(dir);
            }
        }
    }
    let mut best: Option<(Direction, Instant)> = None;
    for dir in Direction::ALL {
        if let Some(t) = last_seen[idx_for_dir(dir)] {
            if now.duration_since(t) <= hold {
                match best {
                    None => best = Some((dir, t)),
                    Some((_, bt)) if t > bt => best = Some((dir, t)),
                    _ => {}
                }
            }
        }
    }
    best.map(|(dir, _)| dir)
}

fn idx_for_dir(dir: Direction) -> usize {
    match dir {
        Direction::Up => 0,
        Direction::Right => 1,
        Direction::Down => 2,
        Direction::Left => 3,
    }
}
