use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, warn};

use crate::chart::{build_map_chart, build_timeline_chart, MapChart, TimelineChart};
use crate::data::{Dataset, DatasetStore, LocationIndex};
use crate::error::{ChartError, DatasetError};
use crate::filter::{filter_by_year, YearRange};

/// Year slider domain
pub const YEAR_MIN: i32 = 50;
pub const YEAR_MAX: i32 = 2020;
pub const YEAR_STEP: i32 = 5;
pub const DEFAULT_FROM: i32 = 1900;
pub const DEFAULT_TO: i32 = 2016;

/// Wires filter inputs to chart outputs.
///
/// The two bindings share nothing but the read-only snapshot: the year range
/// drives the map, the selected tokens drive the timeline. Both are pure in
/// their inputs.
pub struct Dashboard {
    store: DatasetStore,
    locations: LocationIndex,
}

impl Dashboard {
    pub fn new(store: DatasetStore) -> Self {
        let locations = LocationIndex::build(store.snapshot().incidents());
        Self { store, locations }
    }

    pub fn dataset(&self) -> Arc<Dataset> {
        self.store.snapshot()
    }

    pub fn locations(&self) -> &LocationIndex {
        &self.locations
    }

    /// Year range released → new map chart
    pub fn on_year_range(&self, range: YearRange) -> Result<MapChart, ChartError> {
        let dataset = self.store.snapshot();
        let subset = filter_by_year(dataset.incidents(), range);
        debug!(from = range.from, to = range.to, matched = subset.len(), "year filter");
        build_map_chart(&subset, range).inspect_err(|e| warn!(error = %e, "map chart rejected"))
    }

    /// Location selection changed → new timeline chart
    pub fn on_locations<S>(&self, tokens: &[S]) -> TimelineChart
    where
        S: AsRef<str> + Sync,
    {
        let dataset = self.store.snapshot();
        build_timeline_chart(dataset.incidents(), tokens)
    }

    /// Re-read the dataset and rebuild the location options
    pub fn reload(&mut self) -> Result<(), DatasetError> {
        let snapshot = self.store.reload()?;
        self.locations = LocationIndex::build(snapshot.incidents());
        Ok(())
    }

    pub fn reload_due(&self, interval: Duration) -> bool {
        self.store.reload_due(interval)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::Incident;
    use chrono::NaiveDate;

    fn incident(name: &str, year: i32, location: &str, deaths: i64) -> Incident {
        Incident {
            name: name.to_string(),
            date: NaiveDate::from_ymd_opt(year, 6, 1)
                .unwrap()
                .and_hms_opt(0, 0, 0)
                .unwrap(),
            location: location.to_string(),
            lat: 10.0,
            lon: Some(20.0),
            deaths,
            description: String::new(),
        }
    }

    fn dashboard(incidents: Vec<Incident>) -> Dashboard {
        Dashboard::new(DatasetStore::from_dataset(
            "unused.csv",
            Dataset::from_incidents(incidents),
        ))
    }

    #[test]
    fn test_locations_built_once() {
        let dash = dashboard(vec![
            incident("A", 1915, "Turkey, Armenia", 600_000),
            incident("B", 1945, "Germany", 100),
        ]);
        let tokens: Vec<_> = dash.locations().tokens().collect();
        assert_eq!(tokens, vec!["Armenia", "Germany", "Turkey"]);
    }

    #[test]
    fn test_year_binding_is_idempotent() {
        let dash = dashboard(vec![
            incident("A", 1915, "Turkey", 600_000),
            incident("B", 1800, "Elsewhere", 100),
        ]);
        let range = YearRange::new(DEFAULT_FROM, DEFAULT_TO);
        let first = dash.on_year_range(range).unwrap();
        let second = dash.on_year_range(range).unwrap();
        assert_eq!(first, second);
        assert_eq!(first.bubbles.len(), 1);
    }

    #[test]
    fn test_year_binding_surfaces_bad_data() {
        let dash = dashboard(vec![incident("Bad", 1915, "Turkey", 0)]);
        assert!(dash.on_year_range(YearRange::new(1900, 2000)).is_err());
        // Outside the range the bad row is never charted
        assert!(dash.on_year_range(YearRange::new(1950, 2000)).is_ok());
    }

    #[test]
    fn test_location_binding() {
        let dash = dashboard(vec![
            incident("A", 1915, "Turkey, Armenia", 600_000),
            incident("B", 1945, "Germany", 100),
        ]);
        let chart = dash.on_locations(&["Armenia"]);
        assert_eq!(chart.traces.len(), 1);
        assert_eq!(chart.traces[0].points.len(), 1);

        let empty: [&str; 0] = [];
        assert!(dash.on_locations(&empty).traces.is_empty());
    }

    #[test]
    fn test_default_range_within_domain() {
        assert!(YEAR_MIN <= DEFAULT_FROM && DEFAULT_TO <= YEAR_MAX);
    }
}
