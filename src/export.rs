use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing::info;

use crate::chart::{MapChart, TimelineChart};

pub const MAP_FILE: &str = "map.json";
pub const TIMELINE_FILE: &str = "timeline.json";

/// Write both chart specifications as pretty JSON into `dir`.
/// Returns the written paths (map first).
pub fn write_charts(dir: &Path, map: &MapChart, timeline: &TimelineChart) -> Result<[PathBuf; 2]> {
    fs::create_dir_all(dir).with_context(|| format!("creating {}", dir.display()))?;

    let map_path = dir.join(MAP_FILE);
    let map_json = simd_json::serde::to_string_pretty(map).context("serializing map chart")?;
    fs::write(&map_path, map_json).with_context(|| format!("writing {}", map_path.display()))?;

    let timeline_path = dir.join(TIMELINE_FILE);
    let timeline_json =
        simd_json::serde::to_string_pretty(timeline).context("serializing timeline chart")?;
    fs::write(&timeline_path, timeline_json)
        .with_context(|| format!("writing {}", timeline_path.display()))?;

    info!(dir = %dir.display(), "charts exported");
    Ok([map_path, timeline_path])
}
