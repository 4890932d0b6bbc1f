//! Typed chart specifications.
//!
//! Builders turn filtered incidents into plain values describing data and
//! layout. Renderers (the terminal UI, the JSON export) consume only these
//! values and never touch the dataset.

mod hover;
mod map;
mod timeline;

pub use hover::{thousands, wrap, HoverText, WRAP_WIDTH};
pub use map::{build_map_chart, Bubble, ColorBar, GeoLayout, MapChart, MapLayout};
pub use timeline::{
    build_timeline_chart, DateAxis, LogAxis, TimelineChart, TimelineLayout, TimelinePoint, Trace,
};

use serde::Serialize;

/// Shared page styling
pub const BACKGROUND: &str = "#eeeeee";
pub const FONT_FAMILY: &str = "palatino";
pub const TITLE_SIZE: u32 = 30;

/// Continuous colour scale for marker intensity
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum ColorScale {
    Reds,
}

impl ColorScale {
    /// Control points as (position, rgb)
    fn stops(self) -> &'static [(f64, [u8; 3])] {
        match self {
            ColorScale::Reds => &[
                (0.0, [220, 220, 220]),
                (0.2, [245, 195, 157]),
                (0.4, [245, 160, 105]),
                (1.0, [178, 10, 28]),
            ],
        }
    }

    /// Colour at normalized position `t` (clamped to [0, 1])
    pub fn sample(self, t: f64) -> [u8; 3] {
        let t = if t.is_nan() { 0.0 } else { t.clamp(0.0, 1.0) };
        let stops = self.stops();
        for pair in stops.windows(2) {
            let (p0, c0) = pair[0];
            let (p1, c1) = pair[1];
            if t <= p1 {
                let f = if p1 > p0 { (t - p0) / (p1 - p0) } else { 0.0 };
                let lerp = |a: u8, b: u8| (a as f64 + (b as f64 - a as f64) * f).round() as u8;
                return [lerp(c0[0], c1[0]), lerp(c0[1], c1[1]), lerp(c0[2], c1[2])];
            }
        }
        stops[stops.len() - 1].1
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reds_endpoints() {
        assert_eq!(ColorScale::Reds.sample(0.0), [220, 220, 220]);
        assert_eq!(ColorScale::Reds.sample(1.0), [178, 10, 28]);
        assert_eq!(ColorScale::Reds.sample(7.0), [178, 10, 28]);
        assert_eq!(ColorScale::Reds.sample(f64::NAN), [220, 220, 220]);
    }

    #[test]
    fn test_reds_darkens() {
        let light = ColorScale::Reds.sample(0.3);
        let dark = ColorScale::Reds.sample(0.9);
        assert!(dark[1] < light[1]);
    }
}
