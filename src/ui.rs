use incident_atlas::braille::BrailleCanvas;
use incident_atlas::chart::{thousands, ColorScale, MapChart};
use incident_atlas::map::{MapLayers, SHADE_BANDS};
use ratatui::{
    buffer::Buffer,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    symbols::Marker,
    text::{Line, Span},
    widgets::{Axis, Block, Borders, Chart, Dataset, GraphType, Paragraph, Widget},
    Frame,
};

use crate::app::{decimal_year, App, Focus, YearSlider};

/// Width of the "From  1900 " label before a slider track
const SLIDER_LABEL: u16 = 11;

/// Colours cycled through for timeline traces
const TRACE_COLORS: [Color; 6] = [
    Color::Red,
    Color::Cyan,
    Color::Yellow,
    Color::Magenta,
    Color::Green,
    Color::Blue,
];

const HELP: [&str; 5] = [
    "Change \"from\" and \"to\" years to see",
    "events within a certain range.",
    "Pan, zoom, and scroll zoom; r resets.",
    "Hover a bubble for details.",
    "Wikipedia List of Events Named Massacres",
];

/// Screen areas shared by rendering and mouse hit-testing
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Regions {
    pub map_block: Rect,
    pub map: Rect,
    pub timeline_block: Rect,
    pub timeline: Rect,
    pub range_strip: Rect,
    pub sliders_block: Rect,
    pub from_track: Rect,
    pub to_track: Rect,
    pub locations_block: Rect,
    pub locations: Rect,
    pub details_block: Rect,
    pub details: Rect,
    pub status: Rect,
}

fn inner(rect: Rect) -> Rect {
    Rect::new(
        rect.x.saturating_add(1),
        rect.y.saturating_add(1),
        rect.width.saturating_sub(2),
        rect.height.saturating_sub(2),
    )
}

impl Regions {
    pub fn compute(area: Rect) -> Self {
        let rows = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Min(10), Constraint::Length(1)])
            .split(area);
        let columns = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Min(40), Constraint::Length(36)])
            .split(rows[0]);
        let left = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Percentage(62), Constraint::Percentage(38)])
            .split(columns[0]);
        let side = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(4),
                Constraint::Min(4),
                Constraint::Length(14),
            ])
            .split(columns[1]);

        let timeline_inner = inner(left[1]);
        let chart_height = timeline_inner.height.saturating_sub(1);
        let sliders = inner(side[0]);
        let track = |row: u16| {
            Rect::new(
                sliders.x + SLIDER_LABEL.min(sliders.width),
                sliders.y + row.min(sliders.height.saturating_sub(1)),
                sliders.width.saturating_sub(SLIDER_LABEL),
                sliders.height.min(1),
            )
        };

        Self {
            map_block: left[0],
            map: inner(left[0]),
            timeline_block: left[1],
            timeline: Rect { height: chart_height, ..timeline_inner },
            range_strip: Rect {
                y: timeline_inner.y + chart_height,
                height: timeline_inner.height.min(1),
                ..timeline_inner
            },
            sliders_block: side[0],
            from_track: track(0),
            to_track: track(1),
            locations_block: side[1],
            locations: inner(side[1]),
            details_block: side[2],
            details: inner(side[2]),
            status: rows[1],
        }
    }
}

/// Render the UI
pub fn render(frame: &mut Frame, app: &App) {
    let regions = Regions::compute(frame.area());

    render_map(frame, app, &regions);
    render_timeline(frame, app, &regions);
    render_sliders(frame, app, &regions);
    render_locations(frame, app, &regions);
    render_details(frame, app, &regions);
    render_status_bar(frame, app, regions.status);
}

fn panel(title: String, focused: bool) -> Block<'static> {
    let border = if focused { Color::Yellow } else { Color::DarkGray };
    Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(border))
        .title(Span::styled(
            format!(" {title} "),
            Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
        ))
}

fn render_map(frame: &mut Frame, app: &App, regions: &Regions) {
    let title = app
        .map_chart
        .as_ref()
        .map(|c| c.title.clone())
        .unwrap_or_else(|| "Massacres of the World".to_string());
    frame.render_widget(panel(title, app.focus == Focus::Map), regions.map_block);

    let inner = regions.map;
    let mut viewport = app.viewport.clone();
    viewport.width = inner.width as usize * 2;
    viewport.height = inner.height as usize * 4;

    let chart = app.map_chart.as_ref();
    let layers = app
        .map_renderer
        .render(inner.width as usize, inner.height as usize, &viewport, chart);

    let hovered = match (app.hovered, chart) {
        (Some(idx), Some(chart)) => chart.bubbles.get(idx).map(|b| {
            let (px, py) = viewport.project(b.lon, b.lat);
            ((px / 2) as u16, (py / 4) as u16)
        }),
        _ => None,
    };

    frame.render_widget(
        MapWidget {
            layers,
            chart,
            hovered,
        },
        inner,
    );
}

/// Braille basemap with bubble layers and the colour legend
struct MapWidget<'a> {
    layers: MapLayers,
    chart: Option<&'a MapChart>,
    hovered: Option<(u16, u16)>,
}

fn reds(position: f64) -> Color {
    let [r, g, b] = ColorScale::Reds.sample(position);
    Color::Rgb(r, g, b)
}

fn draw_layer(canvas: &BrailleCanvas, color: Color, area: Rect, buf: &mut Buffer) {
    for (col, row, glyph) in canvas.glyphs() {
        if col >= area.width as usize || row >= area.height as usize {
            continue;
        }
        buf[(area.x + col as u16, area.y + row as u16)]
            .set_char(glyph)
            .set_fg(color);
    }
}

impl Widget for MapWidget<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        draw_layer(&self.layers.coastlines, Color::Gray, area, buf);
        draw_layer(&self.layers.borders, Color::DarkGray, area, buf);
        for (band, canvas) in self.layers.bubbles.iter().enumerate() {
            let position = (band as f64 + 0.5) / SHADE_BANDS as f64;
            draw_layer(canvas, reds(position), area, buf);
        }

        if let Some((cx, cy)) = self.hovered {
            if cx < area.width && cy < area.height {
                buf[(area.x + cx, area.y + cy)]
                    .set_char('◉')
                    .set_style(Style::default().fg(Color::White).add_modifier(Modifier::BOLD));
            }
        }

        if let Some(chart) = self.chart {
            render_legend(chart, area, buf);
        }
    }
}

/// Colour bar in the top-left corner; ticks outside the data range are hidden
fn render_legend(chart: &MapChart, area: Rect, buf: &mut Buffer) {
    let Some((lo, hi)) = chart.color_range() else {
        return;
    };
    let bar = &chart.color_bar;
    let mut lines = vec![Line::styled(
        bar.title.clone(),
        Style::default().add_modifier(Modifier::BOLD),
    )];
    for (value, label) in bar.tick_values.iter().zip(&bar.tick_labels).rev() {
        if *value < lo || *value > hi {
            continue;
        }
        let position = if hi > lo { (value - lo) / (hi - lo) } else { 1.0 };
        let label = label.parse::<i64>().map(thousands).unwrap_or_else(|_| label.clone());
        lines.push(Line::from(vec![
            Span::styled("██ ", Style::default().fg(reds(position))),
            Span::raw(label),
        ]));
    }

    let legend_area = Rect::new(
        area.x + 1,
        area.y,
        12.min(area.width.saturating_sub(1)),
        (lines.len() as u16).min(area.height),
    );
    Paragraph::new(lines).render(legend_area, buf);
}

fn render_timeline(frame: &mut Frame, app: &App, regions: &Regions) {
    frame.render_widget(
        panel(app.timeline.title.clone(), app.focus == Focus::Timeline),
        regions.timeline_block,
    );

    let window = &app.window;
    let series: Vec<Vec<(f64, f64)>> = app
        .timeline
        .traces
        .iter()
        .map(|trace| {
            trace
                .points
                .iter()
                .filter(|p| p.deaths > 0)
                .map(|p| (decimal_year(p.date), (p.deaths as f64).log10()))
                .filter(|(x, _)| window.contains(*x))
                .collect()
        })
        .collect();

    let y_max = series
        .iter()
        .flatten()
        .map(|&(_, y)| y)
        .fold(1.0_f64, f64::max)
        .ceil();

    let datasets: Vec<Dataset> = app
        .timeline
        .traces
        .iter()
        .zip(&series)
        .enumerate()
        .map(|(i, (trace, points))| {
            Dataset::default()
                .name(trace.name.clone())
                .marker(Marker::Dot)
                .graph_type(GraphType::Scatter)
                .style(Style::default().fg(TRACE_COLORS[i % TRACE_COLORS.len()]))
                .data(points)
        })
        .collect();

    let y_labels: Vec<Span> = (0..=y_max as i32)
        .map(|exp| Span::raw(compact_power(exp)))
        .collect();
    let x_labels = vec![
        Span::raw(format!("{:.0}", window.start)),
        Span::raw(format!("{:.0}", (window.start + window.end) / 2.0)),
        Span::raw(format!("{:.0}", window.end)),
    ];

    let chart = Chart::new(datasets)
        .x_axis(
            Axis::default()
                .style(Style::default().fg(Color::DarkGray))
                .bounds([window.start, window.end])
                .labels(x_labels),
        )
        .y_axis(
            Axis::default()
                .title("Deaths")
                .style(Style::default().fg(Color::DarkGray))
                .bounds([0.0, y_max])
                .labels(y_labels),
        );
    frame.render_widget(chart, regions.timeline);

    if app.timeline.is_empty() {
        let hint = if app.timeline.traces.is_empty() {
            "Select locations to plot"
        } else {
            "No incidents for the selected locations"
        };
        let area = Rect {
            y: regions.timeline.y + regions.timeline.height / 2,
            height: regions.timeline.height.min(1),
            ..regions.timeline
        };
        frame.render_widget(
            Paragraph::new(Line::styled(hint, Style::default().fg(Color::DarkGray)))
                .alignment(Alignment::Center),
            area,
        );
    }

    render_range_strip(frame, app, regions.range_strip);
}

/// 10^exp with a short suffix
fn compact_power(exp: i32) -> String {
    match exp {
        0..=2 => 10_i64.pow(exp as u32).to_string(),
        3..=5 => format!("{}k", 10_i64.pow(exp as u32 - 3)),
        _ => format!("{}M", 10_i64.pow((exp - 6).max(0) as u32)),
    }
}

/// Range slider under the timeline: the full date span with the visible window marked
fn render_range_strip(frame: &mut Frame, app: &App, area: Rect) {
    if area.width < 12 || area.height == 0 {
        return;
    }
    let window = &app.window;
    let label_width = 5u16;
    let track_width = area.width.saturating_sub(label_width * 2) as usize;
    let span = (window.full.1 - window.full.0).max(f64::EPSILON);
    let start = (((window.start - window.full.0) / span) * track_width as f64).round() as usize;
    let end = ((((window.end - window.full.0) / span) * track_width as f64).round() as usize)
        .clamp(start + 1, track_width.max(start + 1));

    let track: String = (0..track_width)
        .map(|i| if i >= start && i < end { '█' } else { '─' })
        .collect();
    let line = Line::from(vec![
        Span::styled(
            format!("{:>4} ", window.full.0.floor()),
            Style::default().fg(Color::DarkGray),
        ),
        Span::styled(track, Style::default().fg(Color::Gray)),
        Span::styled(
            format!(" {:<4}", window.full.1.ceil()),
            Style::default().fg(Color::DarkGray),
        ),
    ]);
    frame.render_widget(Paragraph::new(line), area);
}

fn slider_line(label: &str, slider: &YearSlider, width: u16, focused: bool) -> Line<'static> {
    let width = width as usize;
    let knob = ((slider.fraction() * width.saturating_sub(1) as f64).round() as usize)
        .min(width.saturating_sub(1));
    let track: String = (0..width)
        .map(|i| match i.cmp(&knob) {
            std::cmp::Ordering::Less => '━',
            std::cmp::Ordering::Equal => '●',
            std::cmp::Ordering::Greater => '─',
        })
        .collect();

    let value_style = if slider.is_pending() {
        Style::default().fg(Color::Yellow).add_modifier(Modifier::ITALIC)
    } else {
        Style::default().fg(Color::White)
    };
    let label_style = if focused {
        Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD)
    } else {
        Style::default().fg(Color::DarkGray)
    };

    Line::from(vec![
        Span::styled(format!("{label:<6}"), label_style),
        Span::styled(format!("{:>4} ", slider.value), value_style),
        Span::styled(track, Style::default().fg(Color::Red)),
    ])
}

fn render_sliders(frame: &mut Frame, app: &App, regions: &Regions) {
    let focused = matches!(app.focus, Focus::FromYear | Focus::ToYear);
    let block = panel("Years".to_string(), focused);
    let lines = vec![
        slider_line("From", &app.from_year, regions.from_track.width, app.focus == Focus::FromYear),
        slider_line("To", &app.to_year, regions.to_track.width, app.focus == Focus::ToYear),
    ];
    frame.render_widget(Paragraph::new(lines).block(block), regions.sliders_block);
}

fn render_locations(frame: &mut Frame, app: &App, regions: &Regions) {
    let picker = &app.picker;
    let title = format!("Locations ({} selected)", picker.selected.len());
    let height = regions.locations.height as usize;
    let offset = picker.offset(height);

    let lines: Vec<Line> = if picker.options.is_empty() {
        vec![Line::styled(
            "No locations in dataset",
            Style::default().fg(Color::DarkGray),
        )]
    } else {
        picker
            .options
            .iter()
            .enumerate()
            .skip(offset)
            .take(height)
            .map(|(idx, option)| {
                let checked = if picker.is_selected(option) { "[x] " } else { "[ ] " };
                let mut style = Style::default();
                if picker.is_selected(option) {
                    style = style.fg(Color::Red);
                }
                if idx == picker.cursor && app.focus == Focus::Locations {
                    style = style.add_modifier(Modifier::REVERSED);
                }
                Line::styled(format!("{checked}{option}"), style)
            })
            .collect()
    };

    frame.render_widget(
        Paragraph::new(lines).block(panel(title, app.focus == Focus::Locations)),
        regions.locations_block,
    );
}

fn render_details(frame: &mut Frame, app: &App, regions: &Regions) {
    let hover = app
        .hovered
        .zip(app.map_chart.as_ref())
        .and_then(|(idx, chart)| chart.bubbles.get(idx))
        .map(|bubble| &bubble.hover);

    let lines: Vec<Line> = match hover {
        Some(hover) => hover
            .lines
            .iter()
            .enumerate()
            .map(|(i, text)| {
                let style = if i == 0 {
                    Style::default().fg(Color::Red).add_modifier(Modifier::BOLD)
                } else {
                    Style::default()
                };
                Line::styled(text.clone(), style)
            })
            .collect(),
        None => HELP
            .iter()
            .map(|text| Line::styled(*text, Style::default().fg(Color::DarkGray)))
            .collect(),
    };

    frame.render_widget(
        Paragraph::new(lines).block(panel("Details".to_string(), false)),
        regions.details_block,
    );
}

fn render_status_bar(frame: &mut Frame, app: &App, area: Rect) {
    let settings = &app.map_renderer.settings;
    let toggle = |on: bool, on_text: &'static str, off_text: &'static str| {
        Span::styled(
            if on { on_text } else { off_text },
            Style::default().fg(if on { Color::Green } else { Color::DarkGray }),
        )
    };

    let mut spans = vec![
        Span::styled(" Zoom: ", Style::default().fg(Color::DarkGray)),
        Span::styled(app.zoom_level(), Style::default().fg(Color::Yellow)),
        Span::styled(" (", Style::default().fg(Color::DarkGray)),
        Span::styled(app.lod_level(), Style::default().fg(Color::Magenta)),
        Span::styled(") ", Style::default().fg(Color::DarkGray)),
        toggle(settings.show_borders, "[B]order ", "[b]order "),
        toggle(settings.show_bubbles, "[M]arkers ", "[m]arkers "),
        Span::styled("| ", Style::default().fg(Color::DarkGray)),
        Span::styled(app.center_coords(), Style::default().fg(Color::Cyan)),
    ];

    if let Some(chart) = &app.map_chart {
        spans.push(Span::styled(
            format!(
                " | {} on map, {} deaths",
                chart.bubbles.len(),
                thousands(chart.total_deaths())
            ),
            Style::default().fg(Color::White),
        ));
        if chart.missing_lon > 0 {
            spans.push(Span::styled(
                format!(" ({} unplaced)", chart.missing_lon),
                Style::default().fg(Color::DarkGray),
            ));
        }
    }

    match &app.status {
        Some(message) => spans.push(Span::styled(
            format!(" | {message}"),
            Style::default().fg(Color::Red),
        )),
        None => spans.push(Span::styled(
            " | tab:focus ←→:adjust enter:apply space:select R:reload x:export q:quit",
            Style::default().fg(Color::DarkGray),
        )),
    }

    frame.render_widget(Paragraph::new(Line::from(spans)), area);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_regions_fit_inside_area() {
        let area = Rect::new(0, 0, 160, 50);
        let regions = Regions::compute(area);
        for rect in [regions.map, regions.timeline, regions.locations, regions.details] {
            assert!(rect.right() <= area.right());
            assert!(rect.bottom() <= area.bottom());
        }
        assert_eq!(regions.status.y, 49);
        assert_eq!(regions.from_track.y + 1, regions.to_track.y);
        assert_eq!(regions.range_strip.y, regions.timeline.bottom());
    }

    #[test]
    fn test_compact_power() {
        assert_eq!(compact_power(0), "1");
        assert_eq!(compact_power(2), "100");
        assert_eq!(compact_power(3), "1k");
        assert_eq!(compact_power(5), "100k");
        assert_eq!(compact_power(6), "1M");
    }

    #[test]
    fn test_slider_line_places_knob() {
        let slider = YearSlider::new(2020);
        let line = slider_line("To", &slider, 10, false);
        let text: String = line.spans.iter().map(|s| s.content.as_ref()).collect();
        assert!(text.ends_with('●'));
    }
}
