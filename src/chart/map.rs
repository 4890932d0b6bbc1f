use serde::Serialize;
use tracing::debug;

use super::{ColorScale, HoverText, BACKGROUND, FONT_FAMILY, TITLE_SIZE};
use crate::data::Incident;
use crate::error::ChartError;
use crate::filter::YearRange;

const SIZE_FACTOR: f64 = 4.0;
const COLOR_FACTOR: f64 = 10.0;

/// Legend ticks sit on the colour axis (ln(deaths) * 10). The labels are
/// approximate death counts, so the legend reads like a log scale.
const TICK_VALUES: [f64; 6] = [0.0, 10.0, 20.0, 40.0, 80.0, 130.0];
const TICK_LABELS: [u64; 6] = [1, 100, 200, 400, 2000, 900_000];

/// One incident on the world map
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Bubble {
    pub lon: f64,
    pub lat: f64,
    /// Marker diameter, ln(deaths) * 4
    pub size: f64,
    /// Colour axis value, ln(deaths) * 10
    pub color: f64,
    pub deaths: i64,
    pub hover: HoverText,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ColorBar {
    pub title: String,
    pub x: f64,
    pub tick_values: Vec<f64>,
    pub tick_labels: Vec<String>,
    pub separate_thousands: bool,
    pub outline_color: String,
}

impl Default for ColorBar {
    fn default() -> Self {
        Self {
            title: "Deaths".to_string(),
            x: 0.03,
            tick_values: TICK_VALUES.to_vec(),
            tick_labels: TICK_LABELS.iter().map(|v| v.to_string()).collect(),
            separate_thousands: true,
            outline_color: BACKGROUND.to_string(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct GeoLayout {
    pub projection: String,
    pub show_land: bool,
    pub land_color: String,
    pub show_ocean: bool,
    pub ocean_color: String,
    pub show_countries: bool,
    pub country_color: String,
    pub show_coastlines: bool,
    pub coastline_color: String,
    pub show_frame: bool,
}

impl Default for GeoLayout {
    fn default() -> Self {
        Self {
            projection: "mercator".to_string(),
            show_land: true,
            land_color: BACKGROUND.to_string(),
            show_ocean: true,
            ocean_color: BACKGROUND.to_string(),
            show_countries: true,
            country_color: "#cccccc".to_string(),
            show_coastlines: true,
            coastline_color: "#cccccc".to_string(),
            show_frame: false,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct MapLayout {
    pub width: u32,
    pub height: u32,
    pub font_family: String,
    pub title_size: u32,
    pub paper_color: String,
    pub geo: GeoLayout,
}

impl Default for MapLayout {
    fn default() -> Self {
        Self {
            width: 1400,
            height: 700,
            font_family: FONT_FAMILY.to_string(),
            title_size: TITLE_SIZE,
            paper_color: BACKGROUND.to_string(),
            geo: GeoLayout::default(),
        }
    }
}

/// Geographic bubble chart for a year range
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct MapChart {
    pub title: String,
    pub range: YearRange,
    pub bubbles: Vec<Bubble>,
    /// Incidents in range that could not be placed for lack of a longitude
    pub missing_lon: usize,
    pub color_scale: ColorScale,
    pub color_bar: ColorBar,
    pub layout: MapLayout,
}

impl MapChart {
    /// Smallest and largest colour value, used to normalize the scale
    pub fn color_range(&self) -> Option<(f64, f64)> {
        let mut iter = self.bubbles.iter().map(|b| b.color);
        let first = iter.next()?;
        Some(iter.fold((first, first), |(lo, hi), c| (lo.min(c), hi.max(c))))
    }

    /// Position of a bubble's colour within the chart's colour range
    pub fn color_position(&self, bubble: &Bubble) -> f64 {
        match self.color_range() {
            Some((lo, hi)) if hi > lo => (bubble.color - lo) / (hi - lo),
            _ => 1.0,
        }
    }

    pub fn total_deaths(&self) -> i64 {
        self.bubbles.iter().map(|b| b.deaths).sum()
    }
}

/// Build the map chart for incidents already filtered to `range`.
///
/// Fails on the first incident whose death count is not positive, since the
/// marker scale is logarithmic.
pub fn build_map_chart(incidents: &[&Incident], range: YearRange) -> Result<MapChart, ChartError> {
    let mut bubbles = Vec::with_capacity(incidents.len());
    let mut missing_lon = 0;

    for incident in incidents {
        if incident.deaths <= 0 {
            return Err(ChartError::NonPositiveDeaths {
                name: incident.name.clone(),
                deaths: incident.deaths,
            });
        }
        let Some(lon) = incident.lon else {
            missing_lon += 1;
            continue;
        };

        let magnitude = (incident.deaths as f64).ln();
        bubbles.push(Bubble {
            lon,
            lat: incident.lat,
            size: magnitude * SIZE_FACTOR,
            color: magnitude * COLOR_FACTOR,
            deaths: incident.deaths,
            hover: HoverText::for_incident(incident),
        });
    }

    debug!(bubbles = bubbles.len(), missing_lon, from = range.from, to = range.to, "map chart built");

    Ok(MapChart {
        title: format!("Massacres of the World {} - {}   Wikipedia", range.from, range.to),
        range,
        bubbles,
        missing_lon,
        color_scale: ColorScale::Reds,
        color_bar: ColorBar::default(),
        layout: MapLayout::default(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn incident(name: &str, deaths: i64, lon: Option<f64>) -> Incident {
        Incident {
            name: name.to_string(),
            date: NaiveDate::from_ymd_opt(1915, 4, 24)
                .unwrap()
                .and_hms_opt(0, 0, 0)
                .unwrap(),
            location: "Turkey".to_string(),
            lat: 39.9,
            lon,
            deaths,
            description: "Some description".to_string(),
        }
    }

    #[test]
    fn test_marker_scaling() {
        let a = incident("A", 600_000, Some(32.8));
        let chart = build_map_chart(&[&a], YearRange::new(1900, 2016)).unwrap();
        let bubble = &chart.bubbles[0];
        let ln = 600_000f64.ln();
        assert!((bubble.size - ln * 4.0).abs() < 1e-9);
        assert!((bubble.color - ln * 10.0).abs() < 1e-9);
        assert_eq!(bubble.lon, 32.8);
        assert_eq!(bubble.lat, 39.9);
    }

    #[test]
    fn test_single_death_sits_at_zero() {
        let a = incident("A", 1, Some(0.0));
        let chart = build_map_chart(&[&a], YearRange::new(1900, 2016)).unwrap();
        assert_eq!(chart.bubbles[0].size, 0.0);
        assert_eq!(chart.bubbles[0].color, 0.0);
    }

    #[test]
    fn test_title_embeds_range() {
        let chart = build_map_chart(&[], YearRange::new(1900, 2016)).unwrap();
        assert_eq!(chart.title, "Massacres of the World 1900 - 2016   Wikipedia");
        assert!(chart.bubbles.is_empty());
        assert_eq!(chart.color_range(), None);
    }

    #[test]
    fn test_non_positive_deaths_rejected() {
        let good = incident("Good", 10, Some(1.0));
        let zero = incident("Zero", 0, Some(1.0));
        let err = build_map_chart(&[&good, &zero], YearRange::new(50, 2020)).unwrap_err();
        assert_eq!(
            err,
            ChartError::NonPositiveDeaths {
                name: "Zero".to_string(),
                deaths: 0
            }
        );

        let negative = incident("Negative", -3, None);
        assert!(build_map_chart(&[&negative], YearRange::new(50, 2020)).is_err());
    }

    #[test]
    fn test_missing_longitude_is_counted() {
        let a = incident("A", 10, Some(1.0));
        let b = incident("B", 10, None);
        let chart = build_map_chart(&[&a, &b], YearRange::new(50, 2020)).unwrap();
        assert_eq!(chart.bubbles.len(), 1);
        assert_eq!(chart.missing_lon, 1);
    }

    #[test]
    fn test_fixed_legend() {
        let chart = build_map_chart(&[], YearRange::new(50, 2020)).unwrap();
        assert_eq!(chart.color_bar.tick_values, vec![0.0, 10.0, 20.0, 40.0, 80.0, 130.0]);
        assert_eq!(
            chart.color_bar.tick_labels,
            vec!["1", "100", "200", "400", "2000", "900000"]
        );
        assert_eq!(chart.color_scale, ColorScale::Reds);
    }

    #[test]
    fn test_color_position() {
        let small = incident("S", 10, Some(0.0));
        let big = incident("B", 1000, Some(0.0));
        let chart = build_map_chart(&[&small, &big], YearRange::new(50, 2020)).unwrap();
        assert_eq!(chart.color_position(&chart.bubbles[0]), 0.0);
        assert_eq!(chart.color_position(&chart.bubbles[1]), 1.0);
        assert_eq!(chart.total_deaths(), 1010);
    }
}
