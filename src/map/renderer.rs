use crate::braille::BrailleCanvas;
use crate::chart::MapChart;
use crate::map::geometry::{draw_disc, draw_line, draw_ring};
use crate::map::projection::Viewport;

/// A geographic line (sequence of lon/lat coordinates)
pub type LineString = Vec<(f64, f64)>;

/// Number of colour bands bubbles are sorted into
pub const SHADE_BANDS: usize = 5;

/// Bubbles at or above this radius are drawn as rings
const RING_RADIUS: i32 = 5;

/// Level of detail for basemap data
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Lod {
    Low,    // 110m - world view
    Medium, // 50m - continental
    High,   // 10m - regional
}

impl Lod {
    pub fn from_zoom(zoom: f64) -> Self {
        if zoom < 2.0 {
            Lod::Low
        } else if zoom < 8.0 {
            Lod::Medium
        } else {
            Lod::High
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Lod::Low => "110m",
            Lod::Medium => "50m",
            Lod::High => "10m",
        }
    }
}

/// Layer visibility toggles
#[derive(Clone, Debug)]
pub struct DisplaySettings {
    pub show_coastlines: bool,
    pub show_borders: bool,
    pub show_bubbles: bool,
}

impl Default for DisplaySettings {
    fn default() -> Self {
        Self {
            show_coastlines: true,
            show_borders: true,
            show_bubbles: true,
        }
    }
}

/// Rasterized layers for one frame, back to front
pub struct MapLayers {
    pub coastlines: BrailleCanvas,
    pub borders: BrailleCanvas,
    /// One canvas per colour band, lightest first
    pub bubbles: Vec<BrailleCanvas>,
}

/// Basemap line data plus the bubble overlay
#[derive(Default)]
pub struct MapRenderer {
    coastlines_low: Vec<LineString>,
    coastlines_medium: Vec<LineString>,
    coastlines_high: Vec<LineString>,
    borders_medium: Vec<LineString>,
    borders_high: Vec<LineString>,
    pub settings: DisplaySettings,
}

impl MapRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Finest available coastlines not above `lod`
    fn coastlines(&self, lod: Lod) -> &[LineString] {
        let candidates = match lod {
            Lod::High => [&self.coastlines_high, &self.coastlines_medium, &self.coastlines_low],
            Lod::Medium => [&self.coastlines_medium, &self.coastlines_low, &self.coastlines_high],
            Lod::Low => [&self.coastlines_low, &self.coastlines_medium, &self.coastlines_high],
        };
        candidates
            .into_iter()
            .find(|lines| !lines.is_empty())
            .map(|lines| lines.as_slice())
            .unwrap_or(&[])
    }

    fn borders(&self, lod: Lod) -> &[LineString] {
        if lod == Lod::High && !self.borders_high.is_empty() {
            &self.borders_high
        } else {
            &self.borders_medium
        }
    }

    /// Rasterize basemap and bubbles for a `width` x `height` cell area
    pub fn render(
        &self,
        width: usize,
        height: usize,
        viewport: &Viewport,
        chart: Option<&MapChart>,
    ) -> MapLayers {
        let lod = Lod::from_zoom(viewport.zoom);
        let mut layers = MapLayers {
            coastlines: BrailleCanvas::new(width, height),
            borders: BrailleCanvas::new(width, height),
            bubbles: (0..SHADE_BANDS).map(|_| BrailleCanvas::new(width, height)).collect(),
        };

        if self.settings.show_coastlines {
            for line in self.coastlines(lod) {
                draw_linestring(&mut layers.coastlines, line, viewport);
            }
        }
        if self.settings.show_borders {
            for line in self.borders(lod) {
                draw_linestring(&mut layers.borders, line, viewport);
            }
        }

        if let (true, Some(chart)) = (self.settings.show_bubbles, chart) {
            for bubble in &chart.bubbles {
                let (px, py) = viewport.project(bubble.lon, bubble.lat);
                let radius = bubble_radius(bubble.size, viewport.zoom);
                if !viewport.is_visible(px, py) {
                    continue;
                }
                let canvas = &mut layers.bubbles[shade_band(chart.color_position(bubble))];
                if radius >= RING_RADIUS {
                    draw_ring(canvas, px, py, radius);
                    draw_disc(canvas, px, py, 1);
                } else {
                    draw_disc(canvas, px, py, radius);
                }
            }
        }

        layers
    }

    /// Index of the bubble under a dot position, preferring the closest centre
    pub fn bubble_at(&self, chart: &MapChart, viewport: &Viewport, px: i32, py: i32) -> Option<usize> {
        if !self.settings.show_bubbles {
            return None;
        }
        chart
            .bubbles
            .iter()
            .enumerate()
            .filter_map(|(idx, bubble)| {
                let (bx, by) = viewport.project(bubble.lon, bubble.lat);
                let reach = bubble_radius(bubble.size, viewport.zoom) + 1;
                let d2 = (bx - px).pow(2) + (by - py).pow(2);
                (d2 <= reach * reach).then_some((idx, d2))
            })
            .min_by_key(|&(_, d2)| d2)
            .map(|(idx, _)| idx)
    }

    pub fn add_coastline(&mut self, line: LineString, lod: Lod) {
        match lod {
            Lod::Low => self.coastlines_low.push(line),
            Lod::Medium => self.coastlines_medium.push(line),
            Lod::High => self.coastlines_high.push(line),
        }
    }

    /// Low-detail borders are shared with the medium level
    pub fn add_border(&mut self, line: LineString, lod: Lod) {
        match lod {
            Lod::High => self.borders_high.push(line),
            Lod::Low | Lod::Medium => self.borders_medium.push(line),
        }
    }

    pub fn has_data(&self) -> bool {
        !self.coastlines_low.is_empty()
            || !self.coastlines_medium.is_empty()
            || !self.coastlines_high.is_empty()
    }

    pub fn toggle_borders(&mut self) {
        self.settings.show_borders = !self.settings.show_borders;
    }

    pub fn toggle_bubbles(&mut self) {
        self.settings.show_bubbles = !self.settings.show_bubbles;
    }
}

/// Draw a linestring, skipping segments that wrap the antimeridian or are off screen
fn draw_linestring(canvas: &mut BrailleCanvas, line: &LineString, viewport: &Viewport) {
    let mut prev: Option<(i32, i32)> = None;
    for &(lon, lat) in line {
        let point = viewport.project(lon, lat);
        if let Some(last) = prev {
            let dist = ((point.0 - last.0).abs() + (point.1 - last.1).abs()) as usize;
            if dist < viewport.width && viewport.line_might_be_visible(last, point) {
                draw_line(canvas, last.0, last.1, point.0, point.1);
            }
        }
        prev = Some(point);
    }
}

/// Marker size is a diameter in screen pixels; Braille dots are coarser, so
/// shrink it and grow slowly with zoom.
pub fn bubble_radius(size: f64, zoom: f64) -> i32 {
    ((size / 8.0) * zoom.max(1.0).sqrt()).round().clamp(1.0, 12.0) as i32
}

/// Colour band for a normalized colour position
pub fn shade_band(position: f64) -> usize {
    let position = if position.is_nan() { 0.0 } else { position.clamp(0.0, 1.0) };
    ((position * SHADE_BANDS as f64) as usize).min(SHADE_BANDS - 1)
}
