use std::path::PathBuf;
use std::time::Duration;

use chrono::{Datelike, NaiveDateTime};
use incident_atlas::chart::{MapChart, TimelineChart};
use incident_atlas::dashboard::{Dashboard, DEFAULT_FROM, DEFAULT_TO, YEAR_MAX, YEAR_MIN, YEAR_STEP};
use incident_atlas::export;
use incident_atlas::filter::YearRange;
use incident_atlas::map::{Lod, MapRenderer, Viewport};
use ratatui::layout::Rect;
use tracing::{error, info, warn};

use crate::ui::Regions;

/// Which control receives keyboard input
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Focus {
    Map,
    FromYear,
    ToYear,
    Locations,
    Timeline,
}

impl Focus {
    pub fn next(self) -> Self {
        match self {
            Focus::Map => Focus::FromYear,
            Focus::FromYear => Focus::ToYear,
            Focus::ToYear => Focus::Locations,
            Focus::Locations => Focus::Timeline,
            Focus::Timeline => Focus::Map,
        }
    }
}

/// A year slider on the [YEAR_MIN, YEAR_MAX] grid.
///
/// Moving it only changes `value`; the map follows `committed`, which is
/// updated on release.
#[derive(Clone, Debug, PartialEq)]
pub struct YearSlider {
    pub value: i32,
    pub committed: i32,
}

impl YearSlider {
    pub fn new(value: i32) -> Self {
        Self {
            value,
            committed: value,
        }
    }

    fn snap(value: i32) -> i32 {
        let steps = ((value - YEAR_MIN) as f64 / YEAR_STEP as f64).round() as i32;
        (YEAR_MIN + steps * YEAR_STEP).clamp(YEAR_MIN, YEAR_MAX)
    }

    /// Move by whole steps
    pub fn adjust(&mut self, steps: i32) {
        self.value = Self::snap(self.value + steps * YEAR_STEP);
    }

    /// Jump to a fraction of the track
    pub fn set_fraction(&mut self, fraction: f64) {
        let span = (YEAR_MAX - YEAR_MIN) as f64;
        self.value = Self::snap(YEAR_MIN + (fraction.clamp(0.0, 1.0) * span).round() as i32);
    }

    pub fn fraction(&self) -> f64 {
        (self.value - YEAR_MIN) as f64 / (YEAR_MAX - YEAR_MIN) as f64
    }

    pub fn is_pending(&self) -> bool {
        self.value != self.committed
    }

    /// Commit the pending value; true if it changed
    pub fn release(&mut self) -> bool {
        let changed = self.is_pending();
        self.committed = self.value;
        changed
    }
}

/// Multi-select list of location tokens
#[derive(Clone, Debug, Default)]
pub struct LocationPicker {
    pub options: Vec<String>,
    pub cursor: usize,
    /// Selected tokens in the order they were picked
    pub selected: Vec<String>,
}

impl LocationPicker {
    pub fn new(options: Vec<String>) -> Self {
        Self {
            options,
            cursor: 0,
            selected: Vec::new(),
        }
    }

    pub fn move_cursor(&mut self, delta: i32) {
        if self.options.is_empty() {
            return;
        }
        let last = self.options.len() as i32 - 1;
        self.cursor = (self.cursor as i32 + delta).clamp(0, last) as usize;
    }

    pub fn is_selected(&self, option: &str) -> bool {
        self.selected.iter().any(|s| s == option)
    }

    /// Toggle option `idx`; false if out of range
    pub fn toggle(&mut self, idx: usize) -> bool {
        let Some(option) = self.options.get(idx) else {
            return false;
        };
        if let Some(pos) = self.selected.iter().position(|s| s == option) {
            self.selected.remove(pos);
        } else {
            self.selected.push(option.clone());
        }
        self.cursor = idx;
        true
    }

    /// First visible row so the cursor stays on screen
    pub fn offset(&self, height: usize) -> usize {
        if height == 0 {
            return self.cursor;
        }
        self.cursor.saturating_sub(height - 1)
    }

    /// Replace options after a reload, dropping selections that vanished
    pub fn set_options(&mut self, options: Vec<String>) {
        self.selected.retain(|s| options.contains(s));
        self.cursor = self.cursor.min(options.len().saturating_sub(1));
        self.options = options;
    }
}

/// Calendar date as a fractional year
pub fn decimal_year(date: NaiveDateTime) -> f64 {
    let days = if date.date().leap_year() { 366.0 } else { 365.0 };
    date.year() as f64 + date.ordinal0() as f64 / days
}

/// Visible slice of the timeline's date axis, in fractional years
#[derive(Clone, Debug, PartialEq)]
pub struct TimeWindow {
    pub full: (f64, f64),
    pub start: f64,
    pub end: f64,
}

impl TimeWindow {
    const MIN_SPAN: f64 = 1.0;

    pub fn new(full: (f64, f64)) -> Self {
        let (lo, hi) = if full.1 - full.0 < Self::MIN_SPAN {
            (full.0 - Self::MIN_SPAN / 2.0, full.0 + Self::MIN_SPAN / 2.0)
        } else {
            full
        };
        Self {
            full: (lo, hi),
            start: lo,
            end: hi,
        }
    }

    pub fn span(&self) -> f64 {
        self.end - self.start
    }

    fn clamp_to_full(&mut self) {
        let span = self.span().min(self.full.1 - self.full.0);
        if self.start < self.full.0 {
            self.start = self.full.0;
            self.end = self.start + span;
        }
        if self.end > self.full.1 {
            self.end = self.full.1;
            self.start = self.end - span;
        }
    }

    pub fn zoom(&mut self, factor: f64) {
        let center = (self.start + self.end) / 2.0;
        let span = (self.span() * factor)
            .max(Self::MIN_SPAN)
            .min(self.full.1 - self.full.0);
        self.start = center - span / 2.0;
        self.end = center + span / 2.0;
        self.clamp_to_full();
    }

    /// Shift by a fraction of the visible span
    pub fn pan(&mut self, fraction: f64) {
        let delta = self.span() * fraction;
        self.start += delta;
        self.end += delta;
        self.clamp_to_full();
    }

    pub fn reset(&mut self) {
        self.start = self.full.0;
        self.end = self.full.1;
    }

    pub fn contains(&self, year: f64) -> bool {
        self.start <= year && year <= self.end
    }
}

/// Application state
pub struct App {
    pub dashboard: Dashboard,
    pub map_renderer: MapRenderer,
    pub viewport: Viewport,
    pub regions: Regions,
    pub focus: Focus,
    pub from_year: YearSlider,
    pub to_year: YearSlider,
    pub picker: LocationPicker,
    pub map_chart: Option<MapChart>,
    pub timeline: TimelineChart,
    pub window: TimeWindow,
    /// Bubble under the mouse, index into `map_chart`
    pub hovered: Option<usize>,
    /// Last error or notice shown in the status bar
    pub status: Option<String>,
    pub should_quit: bool,
    /// Last mouse position for map drag tracking
    pub last_mouse: Option<(u16, u16)>,
    /// Slider being dragged with the mouse
    pub dragging: Option<Focus>,
    pub reload_every: Option<Duration>,
    pub export_dir: PathBuf,
}

impl App {
    pub fn new(dashboard: Dashboard, map_renderer: MapRenderer, width: u16, height: u16) -> Self {
        let regions = Regions::compute(Rect::new(0, 0, width, height));
        let options = dashboard.locations().tokens().map(str::to_string).collect();
        let no_tokens: [&str; 0] = [];
        let timeline = dashboard.on_locations(&no_tokens);
        let window = TimeWindow::new(dataset_span(&dashboard));

        let mut app = Self {
            viewport: Viewport::world(regions.map.width as usize * 2, regions.map.height as usize * 4),
            dashboard,
            map_renderer,
            regions,
            focus: Focus::Map,
            from_year: YearSlider::new(DEFAULT_FROM),
            to_year: YearSlider::new(DEFAULT_TO),
            picker: LocationPicker::new(options),
            map_chart: None,
            timeline,
            window,
            hovered: None,
            status: None,
            should_quit: false,
            last_mouse: None,
            dragging: None,
            reload_every: None,
            export_dir: PathBuf::from("export"),
        };
        app.refresh_map();
        app
    }

    pub fn year_range(&self) -> YearRange {
        YearRange::new(self.from_year.committed, self.to_year.committed)
    }

    /// Recompute the map from the committed slider values. On a data error
    /// the previous chart stays up and the error goes to the status bar.
    pub fn refresh_map(&mut self) {
        match self.dashboard.on_year_range(self.year_range()) {
            Ok(chart) => {
                self.map_chart = Some(chart);
                self.hovered = None;
                self.status = None;
            }
            Err(e) => {
                error!(error = %e, "map chart not updated");
                self.status = Some(format!("Data error: {e}"));
            }
        }
    }

    /// Recompute the timeline from the current selection and fit the date
    /// window to its points
    pub fn refresh_timeline(&mut self) {
        self.timeline = self.dashboard.on_locations(&self.picker.selected);
        let span = self
            .timeline
            .date_span()
            .map(|(lo, hi)| (decimal_year(lo), decimal_year(hi)))
            .unwrap_or_else(|| dataset_span(&self.dashboard));
        self.window = TimeWindow::new(span);
    }

    pub fn slider_mut(&mut self, focus: Focus) -> Option<&mut YearSlider> {
        match focus {
            Focus::FromYear => Some(&mut self.from_year),
            Focus::ToYear => Some(&mut self.to_year),
            _ => None,
        }
    }

    /// Move a slider without committing it
    pub fn adjust_slider(&mut self, focus: Focus, steps: i32) {
        if let Some(slider) = self.slider_mut(focus) {
            slider.adjust(steps);
        }
    }

    /// Release a slider; the map is rebuilt only if the value moved
    pub fn release_slider(&mut self, focus: Focus) {
        let changed = self.slider_mut(focus).is_some_and(|s| s.release());
        if changed {
            info!(from = self.from_year.committed, to = self.to_year.committed, "year range released");
            self.refresh_map();
        }
    }

    pub fn toggle_location(&mut self, idx: usize) {
        if self.picker.toggle(idx) {
            self.refresh_timeline();
        }
    }

    pub fn reload(&mut self) {
        match self.dashboard.reload() {
            Ok(()) => {
                let options = self.dashboard.locations().tokens().map(str::to_string).collect();
                self.picker.set_options(options);
                self.refresh_map();
                self.refresh_timeline();
                self.status = Some(format!("Reloaded {} incidents", self.dashboard.dataset().len()));
            }
            Err(e) => self.status = Some(format!("Reload failed: {e}")),
        }
    }

    /// Periodic reload, if configured
    pub fn tick(&mut self) {
        if let Some(interval) = self.reload_every {
            if self.dashboard.reload_due(interval) {
                self.reload();
            }
        }
    }

    pub fn export(&mut self) {
        let Some(map) = &self.map_chart else {
            self.status = Some("Nothing to export".to_string());
            return;
        };
        match export::write_charts(&self.export_dir, map, &self.timeline) {
            Ok(_) => self.status = Some(format!("Exported to {}", self.export_dir.display())),
            Err(e) => {
                warn!(error = %format!("{e:#}"), "export failed");
                self.status = Some(format!("Export failed: {e}"));
            }
        }
    }

    /// Update layout and viewport when the terminal resizes
    pub fn resize(&mut self, width: u16, height: u16) {
        self.regions = Regions::compute(Rect::new(0, 0, width, height));
        self.viewport.width = self.regions.map.width as usize * 2;
        self.viewport.height = self.regions.map.height as usize * 4;
    }

    pub fn reset_view(&mut self) {
        self.viewport = Viewport::world(self.viewport.width, self.viewport.height);
        self.window.reset();
    }

    pub fn pan(&mut self, dx: i32, dy: i32) {
        self.viewport.pan(dx, dy);
    }

    /// Map-local Braille dot position of a terminal cell, if inside the map
    pub fn map_pixel(&self, col: u16, row: u16) -> Option<(i32, i32)> {
        let map = self.regions.map;
        contains(map, col, row).then(|| {
            (
                (col - map.x) as i32 * 2 + 1,
                (row - map.y) as i32 * 4 + 2,
            )
        })
    }

    pub fn zoom_in_at(&mut self, col: u16, row: u16) {
        if let Some((px, py)) = self.map_pixel(col, row) {
            self.viewport.zoom_in_at(px, py);
        }
    }

    pub fn zoom_out_at(&mut self, col: u16, row: u16) {
        if let Some((px, py)) = self.map_pixel(col, row) {
            self.viewport.zoom_out_at(px, py);
        }
    }

    /// Drag the map; the further out, the fewer degrees per cell
    pub fn handle_drag(&mut self, col: u16, row: u16) {
        if let Some((last_x, last_y)) = self.last_mouse {
            let dx = last_x as i32 - col as i32;
            let dy = last_y as i32 - row as i32;
            self.pan(dx * 2, dy * 4);
        }
        self.last_mouse = Some((col, row));
    }

    pub fn end_drag(&mut self) {
        self.last_mouse = None;
    }

    /// Track the bubble under the mouse
    pub fn hover(&mut self, col: u16, row: u16) {
        self.hovered = match (self.map_pixel(col, row), &self.map_chart) {
            (Some((px, py)), Some(chart)) => {
                self.map_renderer.bubble_at(chart, &self.viewport, px, py)
            }
            _ => None,
        };
    }

    /// Slider whose track contains the cell, with the track fraction
    pub fn slider_hit(&self, col: u16, row: u16) -> Option<(Focus, f64)> {
        [(Focus::FromYear, self.regions.from_track), (Focus::ToYear, self.regions.to_track)]
            .into_iter()
            .find(|(_, track)| contains(*track, col, row))
            .map(|(focus, track)| {
                let span = track.width.saturating_sub(1).max(1) as f64;
                (focus, (col - track.x) as f64 / span)
            })
    }

    /// Location option under the cell
    pub fn location_hit(&self, col: u16, row: u16) -> Option<usize> {
        let list = self.regions.locations;
        if !contains(list, col, row) {
            return None;
        }
        let idx = self.picker.offset(list.height as usize) + (row - list.y) as usize;
        (idx < self.picker.options.len()).then_some(idx)
    }

    pub fn in_timeline(&self, col: u16, row: u16) -> bool {
        contains(self.regions.timeline, col, row)
    }

    pub fn quit(&mut self) {
        self.should_quit = true;
    }

    pub fn zoom_level(&self) -> String {
        format!("{:.1}x", self.viewport.zoom)
    }

    pub fn lod_level(&self) -> &'static str {
        Lod::from_zoom(self.viewport.zoom).label()
    }

    pub fn center_coords(&self) -> String {
        format!(
            "{:.1}°{}, {:.1}°{}",
            self.viewport.center_lat.abs(),
            if self.viewport.center_lat >= 0.0 { "N" } else { "S" },
            self.viewport.center_lon.abs(),
            if self.viewport.center_lon >= 0.0 { "E" } else { "W" }
        )
    }
}

fn contains(rect: Rect, col: u16, row: u16) -> bool {
    col >= rect.x && col < rect.x + rect.width && row >= rect.y && row < rect.y + rect.height
}

/// Date span of the whole dataset in fractional years, or the slider domain
fn dataset_span(dashboard: &Dashboard) -> (f64, f64) {
    dashboard
        .dataset()
        .date_span()
        .map(|(lo, hi)| (decimal_year(lo), decimal_year(hi)))
        .unwrap_or((YEAR_MIN as f64, YEAR_MAX as f64))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use incident_atlas::data::{Dataset, DatasetStore, Incident};

    fn incident(name: &str, year: i32, location: &str, deaths: i64) -> Incident {
        Incident {
            name: name.to_string(),
            date: NaiveDate::from_ymd_opt(year, 7, 1)
                .unwrap()
                .and_hms_opt(0, 0, 0)
                .unwrap(),
            location: location.to_string(),
            lat: 40.0,
            lon: Some(30.0),
            deaths,
            description: String::new(),
        }
    }

    fn app(incidents: Vec<Incident>) -> App {
        let store = DatasetStore::from_dataset("unused.csv", Dataset::from_incidents(incidents));
        App::new(Dashboard::new(store), MapRenderer::new(), 160, 50)
    }

    #[test]
    fn test_slider_snaps_and_clamps() {
        let mut slider = YearSlider::new(2016);
        slider.adjust(1);
        assert_eq!(slider.value, 2020);
        slider.adjust(-1);
        assert_eq!(slider.value, 2015);
        slider.adjust(-10_000);
        assert_eq!(slider.value, YEAR_MIN);
        slider.set_fraction(1.0);
        assert_eq!(slider.value, YEAR_MAX);
    }

    #[test]
    fn test_slider_commits_only_on_release() {
        let mut slider = YearSlider::new(1900);
        slider.adjust(2);
        assert!(slider.is_pending());
        assert_eq!(slider.committed, 1900);
        assert!(slider.release());
        assert_eq!(slider.committed, 1910);
        assert!(!slider.release());
    }

    #[test]
    fn test_map_follows_release_not_drag() {
        let mut app = app(vec![
            incident("A", 1915, "Turkey", 600_000),
            incident("B", 1800, "France", 100),
        ]);
        assert_eq!(app.map_chart.as_ref().unwrap().bubbles.len(), 1);

        app.from_year.value = 1700;
        // Still showing the committed range
        assert_eq!(app.map_chart.as_ref().unwrap().range.from, 1900);

        app.release_slider(Focus::FromYear);
        let chart = app.map_chart.as_ref().unwrap();
        assert_eq!(chart.range.from, 1700);
        assert_eq!(chart.bubbles.len(), 2);
    }

    #[test]
    fn test_bad_data_keeps_previous_map() {
        let mut app = app(vec![
            incident("A", 1915, "Turkey", 600_000),
            incident("Bad", 1850, "Nowhere", 0),
        ]);
        let before = app.map_chart.clone();
        app.from_year.value = 1800;
        app.release_slider(Focus::FromYear);
        assert_eq!(app.map_chart, before);
        assert!(app.status.as_deref().unwrap().starts_with("Data error"));
    }

    #[test]
    fn test_toggle_location_rebuilds_timeline() {
        let mut app = app(vec![
            incident("A", 1915, "Turkey, Armenia", 600_000),
            incident("B", 1945, "Germany", 100),
        ]);
        assert!(app.timeline.traces.is_empty());
        assert_eq!(app.picker.options, vec!["Armenia", "Germany", "Turkey"]);

        app.toggle_location(2);
        app.toggle_location(0);
        let names: Vec<_> = app.timeline.traces.iter().map(|t| t.name.as_str()).collect();
        assert_eq!(names, vec!["Turkey", "Armenia"]);
        // Date window fits the selected points, not the whole dataset
        assert!(app.window.contains(1915.5));
        assert!(!app.window.contains(1945.0));

        app.toggle_location(2);
        assert_eq!(app.timeline.traces.len(), 1);
        assert!(!app.picker.is_selected("Turkey"));
    }

    #[test]
    fn test_picker_offset_keeps_cursor_visible() {
        let mut picker = LocationPicker::new((0..20).map(|i| i.to_string()).collect());
        picker.move_cursor(15);
        assert_eq!(picker.offset(5), 11);
        picker.move_cursor(-100);
        assert_eq!(picker.cursor, 0);
        assert_eq!(picker.offset(5), 0);
    }

    #[test]
    fn test_time_window_zoom_and_pan() {
        let mut window = TimeWindow::new((1800.0, 2000.0));
        window.zoom(0.5);
        assert_eq!((window.start, window.end), (1850.0, 1950.0));
        window.pan(1.0);
        assert_eq!((window.start, window.end), (1900.0, 2000.0));
        window.zoom(10.0);
        assert_eq!((window.start, window.end), (1800.0, 2000.0));
    }

    #[test]
    fn test_decimal_year() {
        let date = NaiveDate::from_ymd_opt(2001, 7, 2).unwrap().and_hms_opt(0, 0, 0).unwrap();
        let y = decimal_year(date);
        assert!(y > 2001.49 && y < 2001.51);
    }
}
