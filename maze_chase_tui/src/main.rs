use maze_chase_core::{
    config::GameConfig,
    dungeon::{MapLayout, TileKind},
    game::{FixedMap, Game, MapSource},
    maze::MazeGenerator,
    monster::MonsterMode,
    session::{GamePhase, PlayerInput, Snapshot},
};
use anyhow::{Context, Result};
use clap::Parser;
use rand::{SeedableRng, rngs::StdRng};
use ratatui::{
    crossterm::{
        self,
        event::{self, Event, KeyCode, KeyEventKind},
        execute,
        terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
    },
    prelude::*,
    widgets::*,
};
use std::{
    io::{self, Stdout},
    path::{Path, PathBuf},
    time::{Duration, Instant},
};
use tracing_appender::non_blocking::WorkerGuard;

/// How long a key press keeps steering; terminals report no key release.
const HOLD_WINDOW: Duration = Duration::from_millis(150);

#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// Map file to load (whitespace-separated codes, or a `.json` column array).
    /// A fresh maze is generated when omitted.
    #[arg(short, long, value_name = "MAP_FILE")]
    map: Option<PathBuf>,

    /// TOML config file
    #[arg(short, long, value_name = "CONFIG_FILE")]
    config: Option<PathBuf>,

    /// RNG seed, overrides the config file
    #[arg(short, long)]
    seed: Option<u64>,

    /// Log file; stderr is taken by the terminal UI
    #[arg(long, value_name = "LOG_FILE", default_value = "maze_chase.log")]
    log_file: PathBuf,
}

/// Held-key state for the four movement keys.
#[derive(Default)]
struct HeldKeys {
    up: Option<Instant>,
    down: Option<Instant>,
    left: Option<Instant>,
    right: Option<Instant>,
}

impl HeldKeys {
    fn press(&mut self, code: KeyCode) -> bool {
        let slot = match code {
            KeyCode::Char('w') | KeyCode::Up => &mut self.up,
            KeyCode::Char('s') | KeyCode::Down => &mut self.down,
            KeyCode::Char('a') | KeyCode::Left => &mut self.left,
            KeyCode::Char('d') | KeyCode::Right => &mut self.right,
            _ => return false,
        };
        *slot = Some(Instant::now());
        true
    }

    fn input(&self) -> PlayerInput {
        let held = |t: Option<Instant>| t.is_some_and(|t| t.elapsed() < HOLD_WINDOW);
        let mut x = 0;
        let mut y = 0;
        if held(self.up) {
            y -= 1;
        }
        if held(self.down) {
            y += 1;
        }
        if held(self.left) {
            x -= 1;
        }
        if held(self.right) {
            x += 1;
        }
        PlayerInput::new(x, y)
    }
}

struct App {
    game: Game,
    snapshot: Snapshot,
    keys: HeldKeys,
    cheat: bool,
    should_quit: bool,
    status: Option<String>,
}

impl App {
    fn new(game: Game) -> Self {
        let snapshot = game.session().snapshot();
        App {
            game,
            snapshot,
            keys: HeldKeys::default(),
            cheat: false,
            should_quit: false,
            status: None,
        }
    }

    /// One fixed-interval update.
    fn tick(&mut self) {
        self.snapshot = self.game.tick(self.keys.input());
    }

    fn reset(&mut self) {
        match self.game.request_reset() {
            Ok(()) => {
                self.snapshot = self.game.session().snapshot();
                self.status = None;
            }
            Err(err) => {
                tracing::error!(%err, "reset failed");
                self.status = Some(format!("Reset failed: {err}"));
            }
        }
    }

    fn toggle_cheat(&mut self) {
        self.cheat = !self.cheat;
        self.game.set_cheat(self.cheat);
        self.snapshot = self.game.session().snapshot();
    }

    fn quit(&mut self) {
        self.should_quit = true;
    }
}

fn main() -> Result<()> {
    let args = Args::parse();
    let _log_guard = init_logging(&args.log_file)?;

    let mut config = match &args.config {
        Some(path) => GameConfig::load(path)?,
        None => GameConfig::default(),
    }
    .apply_env();
    if let Some(seed) = args.seed {
        config.seed = Some(seed);
    }

    let source = map_source(args.map.as_deref(), &config)?;
    let game = Game::new(config, source)?;
    let mut app = App::new(game);

    let mut terminal = setup_terminal()?;
    let result = run_app(&mut terminal, &mut app);
    restore_terminal(&mut terminal)?;
    result
}

/// Routes `tracing` output to a file, filtered by `RUST_LOG` (default info).
fn init_logging(path: &Path) -> Result<WorkerGuard> {
    let dir = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    let file_name = path
        .file_name()
        .context("log file path has no file name")?;
    let file_appender = tracing_appender::rolling::never(dir, file_name);
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .with_writer(non_blocking)
        .with_ansi(false)
        .init();
    Ok(guard)
}

fn map_source(map: Option<&Path>, config: &GameConfig) -> Result<Box<dyn MapSource>> {
    let Some(path) = map else {
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed.wrapping_add(1)),
            None => StdRng::from_os_rng(),
        };
        return Ok(Box::new(MazeGenerator::new(config.maze, rng)));
    };

    let text = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read map file {}", path.display()))?;
    let layout = if path.extension().is_some_and(|ext| ext == "json") {
        MapLayout::from_json(&text)?
    } else {
        MapLayout::parse(&text)?
    };
    tracing::info!(map = %path.display(), "loaded map file");
    Ok(Box::new(FixedMap(layout)))
}

/// Configures the terminal for TUI interaction.
fn setup_terminal() -> Result<Terminal<CrosstermBackend<Stdout>>> {
    let mut stdout = io::stdout();
    enable_raw_mode()?;
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    Terminal::new(backend).map_err(Into::into)
}

/// Restores the terminal to its original state.
fn restore_terminal(terminal: &mut Terminal<CrosstermBackend<Stdout>>) -> Result<()> {
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;
    Ok(())
}

/// Runs the main loop: draw, poll input until the next tick is due, tick.
fn run_app(terminal: &mut Terminal<CrosstermBackend<Stdout>>, app: &mut App) -> Result<()> {
    let tick_rate = Duration::from_millis(app.game.config().tick_millis);
    let mut last_tick = Instant::now();

    loop {
        terminal.draw(|f| ui(f, app))?;

        let timeout = tick_rate
            .checked_sub(last_tick.elapsed())
            .unwrap_or_else(|| Duration::from_secs(0));

        if crossterm::event::poll(timeout)? {
            if let Event::Key(key) = event::read()? {
                if key.kind != KeyEventKind::Release && !app.keys.press(key.code) {
                    match key.code {
                        KeyCode::Char('q') | KeyCode::Esc => app.quit(),
                        KeyCode::Char('r') => app.reset(),
                        KeyCode::Char('c') => app.toggle_cheat(),
                        _ => {}
                    }
                }
            }
        }

        if last_tick.elapsed() >= tick_rate {
            app.tick();
            last_tick = Instant::now();
        }

        if app.should_quit {
            break;
        }
    }
    Ok(())
}

/// Renders the user interface.
fn ui(frame: &mut Frame, app: &App) {
    let main_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Min(5),    // Map viewport
            Constraint::Length(3), // Status line
            Constraint::Length(2), // Help
        ])
        .split(frame.area());

    render_map(frame, main_layout[0], app);
    render_status(frame, main_layout[1], app);

    let help_text = Paragraph::new("WASD/arrows: move   c: cheat   r: new game   q/Esc: quit")
        .alignment(Alignment::Center)
        .block(Block::default().borders(Borders::TOP));
    frame.render_widget(help_text, main_layout[2]);
}

fn render_status(frame: &mut Frame, area: Rect, app: &App) {
    let snap = &app.snapshot;
    let phase = match snap.phase {
        GamePhase::Playing => Span::styled("Playing", Style::default().fg(Color::White)),
        GamePhase::Won => Span::styled("YOU ESCAPED", Style::default().fg(Color::Green).bold()),
        GamePhase::Lost => Span::styled("CAUGHT", Style::default().fg(Color::Red).bold()),
    };
    let chasing = snap
        .monsters
        .iter()
        .filter(|m| matches!(m.mode, MonsterMode::Chasing | MonsterMode::ChasingByPath))
        .count();

    let mut spans = vec![
        phase,
        Span::raw(format!(
            "  Tick: {}  Key: {}  Door: {}  Chasing: {}/{}",
            snap.tick,
            if snap.has_key { "yes" } else { "no" },
            match snap.door_locked {
                Some(true) => "locked",
                Some(false) => "open",
                None => "-",
            },
            chasing,
            snap.monsters.len(),
        )),
    ];
    if app.cheat {
        spans.push(Span::styled("  [CHEAT]", Style::default().fg(Color::Magenta)));
    }
    if let Some(status) = &app.status {
        spans.push(Span::styled(
            format!("  {status}"),
            Style::default().fg(Color::Red),
        ));
    }

    let widget = Paragraph::new(Line::from(spans))
        .block(Block::default().borders(Borders::ALL).title("Status"));
    frame.render_widget(widget, area);
}

/// Renders the part of the dungeon around the player, one cell per tile.
fn render_map(frame: &mut Frame, area: Rect, app: &App) {
    let dungeon = app.game.session().dungeon();
    let snap = &app.snapshot;

    let view_w = area.width.saturating_sub(2) as isize;
    let view_h = area.height.saturating_sub(2) as isize;
    let (pc, pr) = dungeon.indices_of(snap.player);
    let left = (pc - view_w / 2).clamp(0, (dungeon.width() as isize - view_w).max(0));
    let top = (pr - view_h / 2).clamp(0, (dungeon.height() as isize - view_h).max(0));

    let monster_tiles: Vec<(isize, isize)> = snap
        .monsters
        .iter()
        .map(|m| dungeon.indices_of(m.position))
        .collect();
    let key_tile = snap.key.map(|k| dungeon.indices_of(k));

    let mut lines: Vec<Line> = Vec::with_capacity(view_h.max(0) as usize);
    for row in top..top + view_h {
        let mut spans: Vec<Span> = Vec::with_capacity(view_w.max(0) as usize);
        for col in left..left + view_w {
            let Some(tile) = dungeon.tile_at(col, row) else {
                spans.push(Span::raw(" "));
                continue;
            };
            let span = if (col, row) == (pc, pr) {
                Span::styled("@", Style::default().fg(Color::Cyan).bold())
            } else if monster_tiles.contains(&(col, row)) {
                Span::styled("M", Style::default().fg(Color::Red).bold())
            } else if key_tile == Some((col, row)) {
                Span::styled("k", Style::default().fg(Color::Yellow))
            } else {
                match tile.kind {
                    TileKind::Floor => Span::raw(" "),
                    TileKind::Wall => Span::styled("#", Style::default().fg(Color::DarkGray)),
                    TileKind::Door => Span::styled("|", Style::default().fg(Color::Yellow)),
                    TileKind::Goal => match snap.door_locked {
                        Some(true) => Span::styled("|", Style::default().fg(Color::Yellow)),
                        _ => Span::styled("G", Style::default().fg(Color::Green).bold()),
                    },
                }
            };
            spans.push(span);
        }
        lines.push(Line::from(spans));
    }

    let map_paragraph =
        Paragraph::new(lines).block(Block::default().title("Maze Chase").borders(Borders::ALL));
    frame.render_widget(map_paragraph, area);
}
