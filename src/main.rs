mod app;
mod ui;

use std::fs::File;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::Duration;

use anyhow::{Context, Result};
use app::{App, Focus};
use clap::Parser;
use crossterm::event::{
    self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEvent, KeyEventKind,
    MouseButton, MouseEvent, MouseEventKind,
};
use crossterm::execute;
use incident_atlas::dashboard::{Dashboard, DEFAULT_FROM, DEFAULT_TO};
use incident_atlas::data::{self, DatasetStore};
use incident_atlas::export;
use incident_atlas::filter::YearRange;
use incident_atlas::map::MapRenderer;
use ratatui::DefaultTerminal;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(author, version, about = "Terminal map of historical massacres", long_about = None)]
struct Cli {
    /// Incident dataset (CSV with date, location, lat_clean, lon_clean, deaths, name, description)
    #[arg(long, default_value = "massacres.csv")]
    data: PathBuf,
    /// Directory holding Natural Earth GeoJSON basemap files
    #[arg(long, default_value = "data")]
    geo_dir: PathBuf,
    /// First year of the map range
    #[arg(long, default_value_t = DEFAULT_FROM)]
    from: i32,
    /// Last year of the map range
    #[arg(long, default_value_t = DEFAULT_TO)]
    to: i32,
    /// Location tokens for the timeline (repeatable)
    #[arg(long = "location")]
    locations: Vec<String>,
    /// Write map.json and timeline.json to this directory and exit
    #[arg(long)]
    export: Option<PathBuf>,
    /// Reload the dataset every N seconds
    #[arg(long)]
    reload_secs: Option<u64>,
    /// Log destination; the terminal is taken by the UI
    #[arg(long, default_value = "incident-atlas.log")]
    log_file: PathBuf,
    /// Verbose logging
    #[arg(long)]
    debug: bool,
}

fn init_logging(cli: &Cli) -> Result<()> {
    let file = File::create(&cli.log_file)
        .with_context(|| format!("creating log file {}", cli.log_file.display()))?;
    let default_level = if cli.debug { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_ansi(false)
        .compact()
        .with_writer(Mutex::new(file))
        .init();
    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(&cli)?;

    // A missing or malformed dataset stops us before the terminal is touched
    let store = DatasetStore::open(&cli.data)
        .with_context(|| format!("loading dataset {}", cli.data.display()))?;
    let dashboard = Dashboard::new(store);
    info!(
        incidents = dashboard.dataset().len(),
        locations = dashboard.locations().len(),
        "dashboard ready"
    );
    if dashboard.dataset().is_empty() {
        warn!(path = %cli.data.display(), "dataset has no incidents with a latitude");
    }

    if let Some(dir) = &cli.export {
        return export_charts(&dashboard, &cli, dir);
    }

    let mut renderer = MapRenderer::new();
    if data::load_basemap(&mut renderer, &cli.geo_dir) == 0 || !renderer.has_data() {
        data::load_fallback_world(&mut renderer);
    }

    let mut terminal = ratatui::init();
    terminal.clear()?;
    execute!(std::io::stdout(), EnableMouseCapture)?;

    let result = run(&mut terminal, dashboard, renderer, &cli);

    let _ = execute!(std::io::stdout(), DisableMouseCapture);
    ratatui::restore();

    result
}

/// Headless mode: build both charts from the CLI inputs and write them out
fn export_charts(dashboard: &Dashboard, cli: &Cli, dir: &Path) -> Result<()> {
    let map = dashboard
        .on_year_range(YearRange::new(cli.from, cli.to))
        .context("building map chart")?;
    let timeline = dashboard.on_locations(&cli.locations);
    let paths = export::write_charts(dir, &map, &timeline)?;
    for path in paths {
        println!("{}", path.display());
    }
    Ok(())
}

/// Mouse: wheel zooms the map or the timeline, drag pans the map or moves a
/// slider, release commits a slider, clicks toggle locations.
fn handle_mouse(app: &mut App, mouse: MouseEvent) {
    let (col, row) = (mouse.column, mouse.row);

    match mouse.kind {
        MouseEventKind::Moved => app.hover(col, row),
        MouseEventKind::ScrollUp if app.in_timeline(col, row) => app.window.zoom(1.0 / 1.5),
        MouseEventKind::ScrollDown if app.in_timeline(col, row) => app.window.zoom(1.5),
        MouseEventKind::ScrollUp => app.zoom_in_at(col, row),
        MouseEventKind::ScrollDown => app.zoom_out_at(col, row),
        MouseEventKind::ScrollLeft => app.pan(-15, 0),
        MouseEventKind::ScrollRight => app.pan(15, 0),
        MouseEventKind::Down(MouseButton::Left) => {
            if let Some((focus, fraction)) = app.slider_hit(col, row) {
                app.focus = focus;
                app.dragging = Some(focus);
                if let Some(slider) = app.slider_mut(focus) {
                    slider.set_fraction(fraction);
                }
            } else if let Some(idx) = app.location_hit(col, row) {
                app.focus = Focus::Locations;
                app.toggle_location(idx);
            } else if app.map_pixel(col, row).is_some() {
                app.focus = Focus::Map;
                app.last_mouse = Some((col, row));
            }
        }
        MouseEventKind::Drag(MouseButton::Left) => match app.dragging {
            Some(focus) => {
                let track = if focus == Focus::FromYear {
                    app.regions.from_track
                } else {
                    app.regions.to_track
                };
                let span = track.width.saturating_sub(1).max(1) as f64;
                let fraction = (col.saturating_sub(track.x)) as f64 / span;
                if let Some(slider) = app.slider_mut(focus) {
                    slider.set_fraction(fraction);
                }
            }
            None => app.handle_drag(col, row),
        },
        MouseEventKind::Up(MouseButton::Left) => {
            if let Some(focus) = app.dragging.take() {
                app.release_slider(focus);
            }
            app.end_drag();
        }
        _ => {}
    }
}

fn handle_key(app: &mut App, key: KeyEvent) {
    // Global keys first
    match key.code {
        KeyCode::Char('q') | KeyCode::Esc => app.quit(),
        KeyCode::Tab => app.focus = app.focus.next(),
        KeyCode::Char('R') => app.reload(),
        KeyCode::Char('x') => app.export(),
        KeyCode::Char('r') | KeyCode::Char('0') => app.reset_view(),
        KeyCode::Char('b') | KeyCode::Char('B') => app.map_renderer.toggle_borders(),
        KeyCode::Char('m') | KeyCode::Char('M') => app.map_renderer.toggle_bubbles(),
        _ => handle_focused_key(app, key),
    }
}

fn handle_focused_key(app: &mut App, key: KeyEvent) {
    match app.focus {
        Focus::Map => match key.code {
            KeyCode::Left | KeyCode::Char('h') => app.pan(-10, 0),
            KeyCode::Right | KeyCode::Char('l') => app.pan(10, 0),
            KeyCode::Up | KeyCode::Char('k') => app.pan(0, -6),
            KeyCode::Down | KeyCode::Char('j') => app.pan(0, 6),
            KeyCode::Char('+') | KeyCode::Char('=') => app.viewport.zoom_in(),
            KeyCode::Char('-') | KeyCode::Char('_') => app.viewport.zoom_out(),
            _ => {}
        },
        focus @ (Focus::FromYear | Focus::ToYear) => match key.code {
            KeyCode::Left | KeyCode::Char('h') => app.adjust_slider(focus, -1),
            KeyCode::Right | KeyCode::Char('l') => app.adjust_slider(focus, 1),
            KeyCode::PageDown => app.adjust_slider(focus, -10),
            KeyCode::PageUp => app.adjust_slider(focus, 10),
            KeyCode::Up | KeyCode::Char('k') => app.focus = Focus::FromYear,
            KeyCode::Down | KeyCode::Char('j') => app.focus = Focus::ToYear,
            // Enter plays the role of releasing the slider knob
            KeyCode::Enter => app.release_slider(focus),
            _ => {}
        },
        Focus::Locations => match key.code {
            KeyCode::Up | KeyCode::Char('k') => app.picker.move_cursor(-1),
            KeyCode::Down | KeyCode::Char('j') => app.picker.move_cursor(1),
            KeyCode::PageUp => app.picker.move_cursor(-10),
            KeyCode::PageDown => app.picker.move_cursor(10),
            KeyCode::Char(' ') | KeyCode::Enter => app.toggle_location(app.picker.cursor),
            _ => {}
        },
        Focus::Timeline => match key.code {
            KeyCode::Left | KeyCode::Char('h') => app.window.pan(-0.2),
            KeyCode::Right | KeyCode::Char('l') => app.window.pan(0.2),
            KeyCode::Char('+') | KeyCode::Char('=') => app.window.zoom(1.0 / 1.5),
            KeyCode::Char('-') | KeyCode::Char('_') => app.window.zoom(1.5),
            _ => {}
        },
    }
}

fn run(terminal: &mut DefaultTerminal, dashboard: Dashboard, renderer: MapRenderer, cli: &Cli) -> Result<()> {
    let size = terminal.size()?;
    let mut app = App::new(dashboard, renderer, size.width, size.height);
    app.reload_every = cli.reload_secs.map(Duration::from_secs);

    loop {
        terminal.draw(|frame| ui::render(frame, &app))?;

        if event::poll(Duration::from_millis(16))? {
            match event::read()? {
                // Only handle key press events (not release)
                Event::Key(key) if key.kind == KeyEventKind::Press => handle_key(&mut app, key),
                Event::Mouse(mouse) => handle_mouse(&mut app, mouse),
                Event::Resize(width, height) => app.resize(width, height),
                _ => {}
            }
        }

        app.tick();

        if app.should_quit {
            break;
        }
    }

    Ok(())
}
