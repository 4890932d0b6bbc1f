use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use geojson::{GeoJson, Geometry, Position, Value};
use tracing::{debug, info, warn};

use crate::map::{Lod, MapRenderer};

#[derive(Clone, Copy)]
enum Layer {
    Coastline,
    Border,
}

/// Natural Earth files looked up in the basemap directory
const BASEMAP_FILES: [(&str, Layer, Lod); 5] = [
    ("ne_110m_coastline.json", Layer::Coastline, Lod::Low),
    ("ne_50m_coastline.json", Layer::Coastline, Lod::Medium),
    ("ne_10m_coastline.json", Layer::Coastline, Lod::High),
    ("ne_50m_borders.json", Layer::Border, Lod::Medium),
    ("ne_10m_borders.json", Layer::Border, Lod::High),
];

/// Load whichever basemap files exist in `dir`. Unreadable files are logged
/// and skipped; returns the number of files loaded.
pub fn load_basemap(renderer: &mut MapRenderer, dir: &Path) -> usize {
    let mut loaded = 0;
    for (filename, layer, lod) in BASEMAP_FILES {
        let path = dir.join(filename);
        if !path.exists() {
            debug!(file = filename, "basemap file not present");
            continue;
        }
        match load_lines(&path) {
            Ok(lines) => {
                info!(file = filename, lines = lines.len(), "basemap layer loaded");
                for line in lines {
                    match layer {
                        Layer::Coastline => renderer.add_coastline(line, lod),
                        Layer::Border => renderer.add_border(line, lod),
                    }
                }
                loaded += 1;
            }
            Err(e) => warn!(file = filename, error = %format!("{e:#}"), "skipping basemap file"),
        }
    }
    loaded
}

/// Read a GeoJSON file into line strings
fn load_lines(path: &Path) -> Result<Vec<Vec<(f64, f64)>>> {
    let mut bytes = fs::read(path).with_context(|| format!("reading {}", path.display()))?;
    let geojson: GeoJson = simd_json::serde::from_slice(&mut bytes)
        .with_context(|| format!("parsing {}", path.display()))?;

    let mut lines = Vec::new();
    match &geojson {
        GeoJson::FeatureCollection(fc) => {
            for geometry in fc.features.iter().filter_map(|f| f.geometry.as_ref()) {
                collect_lines(geometry, &mut lines);
            }
        }
        GeoJson::Feature(f) => {
            if let Some(geometry) = &f.geometry {
                collect_lines(geometry, &mut lines);
            }
        }
        GeoJson::Geometry(geometry) => collect_lines(geometry, &mut lines),
    }
    Ok(lines)
}

/// Positions with fewer than two ordinates are dropped
fn to_line(coords: &[Position]) -> Vec<(f64, f64)> {
    coords
        .iter()
        .filter_map(|c| Some((*c.first()?, *c.get(1)?)))
        .collect()
}

/// Lines and polygon exterior rings; points are ignored
fn collect_lines(geometry: &Geometry, out: &mut Vec<Vec<(f64, f64)>>) {
    match &geometry.value {
        Value::LineString(coords) => out.push(to_line(coords)),
        Value::MultiLineString(lines) => out.extend(lines.iter().map(|l| to_line(l))),
        Value::Polygon(rings) => out.extend(rings.first().map(|r| to_line(r))),
        Value::MultiPolygon(polygons) => out.extend(
            polygons
                .iter()
                .filter_map(|rings| rings.first())
                .map(|r| to_line(r)),
        ),
        Value::GeometryCollection(geometries) => {
            for g in geometries {
                collect_lines(g, out);
            }
        }
        Value::Point(_) | Value::MultiPoint(_) => {}
    }
}

/// Coarse continent outlines for when no basemap files are available
const FALLBACK_WORLD: [&[(f64, f64)]; 7] = [
    // North America
    &[
        (-168.0, 65.0), (-166.0, 60.0), (-141.0, 60.0), (-130.0, 55.0), (-125.0, 48.0),
        (-124.0, 40.0), (-117.0, 32.0), (-110.0, 25.0), (-97.0, 25.0), (-97.0, 28.0),
        (-82.0, 24.0), (-80.0, 25.0), (-81.0, 31.0), (-75.0, 35.0), (-70.0, 41.0),
        (-67.0, 45.0), (-55.0, 47.0), (-58.0, 55.0), (-64.0, 60.0), (-80.0, 63.0),
        (-95.0, 62.0), (-110.0, 68.0), (-145.0, 70.0), (-168.0, 65.0),
    ],
    // South America
    &[
        (-80.0, 10.0), (-70.0, 5.0), (-50.0, 0.0), (-35.0, -5.0), (-38.0, -15.0),
        (-48.0, -25.0), (-58.0, -38.0), (-68.0, -50.0), (-75.0, -52.0), (-72.0, -30.0),
        (-70.0, -15.0), (-80.0, -5.0), (-80.0, 10.0),
    ],
    // Europe
    &[
        (-10.0, 36.0), (0.0, 38.0), (5.0, 43.0), (15.0, 45.0), (20.0, 40.0),
        (25.0, 37.0), (30.0, 40.0), (40.0, 43.0), (40.0, 55.0), (30.0, 60.0),
        (20.0, 70.0), (10.0, 71.0), (5.0, 58.0), (-5.0, 58.0), (-10.0, 52.0),
        (-5.0, 43.0), (-10.0, 36.0),
    ],
    // Southern Africa
    &[
        (-17.0, 15.0), (-10.0, 5.0), (10.0, 5.0), (20.0, -5.0), (35.0, -20.0),
        (30.0, -30.0), (18.0, -35.0), (10.0, -15.0), (10.0, 0.0), (-5.0, 5.0),
        (-17.0, 15.0),
    ],
    // North Africa and the Horn
    &[
        (-17.0, 15.0), (-15.0, 28.0), (-5.0, 35.0), (10.0, 37.0), (25.0, 32.0),
        (35.0, 30.0), (42.0, 12.0), (50.0, 12.0), (35.0, -5.0), (35.0, -20.0),
    ],
    // Asia
    &[
        (35.0, 42.0), (50.0, 40.0), (60.0, 25.0), (70.0, 20.0), (80.0, 8.0),
        (88.0, 22.0), (95.0, 16.0), (105.0, 10.0), (110.0, 20.0), (120.0, 22.0),
        (125.0, 30.0), (135.0, 35.0), (145.0, 45.0), (140.0, 55.0), (130.0, 52.0),
        (120.0, 40.0), (90.0, 50.0), (60.0, 55.0), (40.0, 43.0),
    ],
    // Australia
    &[
        (115.0, -20.0), (130.0, -12.0), (145.0, -15.0), (153.0, -30.0), (145.0, -38.0),
        (135.0, -35.0), (115.0, -35.0), (115.0, -20.0),
    ],
];

pub fn load_fallback_world(renderer: &mut MapRenderer) {
    for outline in FALLBACK_WORLD {
        renderer.add_coastline(outline.to_vec(), Lod::Low);
    }
    info!("using built-in world outline");
}
