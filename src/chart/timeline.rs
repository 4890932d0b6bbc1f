use chrono::NaiveDateTime;
use serde::Serialize;

use super::{HoverText, BACKGROUND, FONT_FAMILY, TITLE_SIZE};
use crate::data::Incident;
use crate::filter::filter_by_location;

const MARKER_SIZE: u32 = 15;

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct TimelinePoint {
    pub date: NaiveDateTime,
    pub deaths: i64,
    pub hover: HoverText,
}

/// Points for one selected location token
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Trace {
    pub name: String,
    pub marker_size: u32,
    pub points: Vec<TimelinePoint>,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct LogAxis {
    pub kind: String,
    pub autorange: bool,
    pub tick_mode: String,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct DateAxis {
    pub kind: String,
    pub zero_line: bool,
    pub range_slider: bool,
    pub range_slider_color: String,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct TimelineLayout {
    pub height: u32,
    pub font_family: String,
    pub title_size: u32,
    pub hover_mode: String,
    pub paper_color: String,
    pub plot_color: String,
    pub y_axis: LogAxis,
    pub x_axis: DateAxis,
}

impl Default for TimelineLayout {
    fn default() -> Self {
        Self {
            height: 500,
            font_family: FONT_FAMILY.to_string(),
            title_size: TITLE_SIZE,
            hover_mode: "closest".to_string(),
            paper_color: BACKGROUND.to_string(),
            plot_color: BACKGROUND.to_string(),
            y_axis: LogAxis {
                kind: "log".to_string(),
                autorange: true,
                tick_mode: "linear".to_string(),
            },
            x_axis: DateAxis {
                kind: "date".to_string(),
                zero_line: false,
                range_slider: true,
                range_slider_color: "#dedede".to_string(),
            },
        }
    }
}

/// Deaths over time, one trace per selected location
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct TimelineChart {
    pub title: String,
    pub traces: Vec<Trace>,
    pub layout: TimelineLayout,
}

impl TimelineChart {
    pub fn is_empty(&self) -> bool {
        self.traces.iter().all(|t| t.points.is_empty())
    }

    /// Earliest and latest point across all traces
    pub fn date_span(&self) -> Option<(NaiveDateTime, NaiveDateTime)> {
        let mut dates = self.traces.iter().flat_map(|t| t.points.iter().map(|p| p.date));
        let first = dates.next()?;
        Some(dates.fold((first, first), |(lo, hi), d| (lo.min(d), hi.max(d))))
    }
}

/// Build the timeline for the selected tokens, matched per token by substring
pub fn build_timeline_chart<S>(incidents: &[Incident], tokens: &[S]) -> TimelineChart
where
    S: AsRef<str> + Sync,
{
    let traces = filter_by_location(incidents, tokens)
        .into_iter()
        .map(|m| Trace {
            name: m.token,
            marker_size: MARKER_SIZE,
            points: m
                .incidents
                .into_iter()
                .map(|i| TimelinePoint {
                    date: i.date,
                    deaths: i.deaths,
                    hover: HoverText::for_incident(i),
                })
                .collect(),
        })
        .collect();

    TimelineChart {
        title: "Number of Deaths per Massacre by Date & Location".to_string(),
        traces,
        layout: TimelineLayout::default(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn incident(name: &str, year: i32, location: &str, deaths: i64) -> Incident {
        Incident {
            name: name.to_string(),
            date: NaiveDate::from_ymd_opt(year, 1, 1)
                .unwrap()
                .and_hms_opt(0, 0, 0)
                .unwrap(),
            location: location.to_string(),
            lat: 0.0,
            lon: Some(0.0),
            deaths,
            description: String::new(),
        }
    }

    #[test]
    fn test_no_tokens_no_traces() {
        let data = vec![incident("A", 1915, "Turkey", 10)];
        let tokens: Vec<String> = Vec::new();
        let chart = build_timeline_chart(&data, &tokens);
        assert!(chart.traces.is_empty());
        assert!(chart.is_empty());
        assert_eq!(chart.date_span(), None);
    }

    #[test]
    fn test_one_trace_per_token_in_order() {
        let data = vec![
            incident("A", 1915, "Turkey, Armenia", 10),
            incident("B", 1945, "Germany", 20),
            incident("C", 1920, "Armenia", 30),
        ];
        let chart = build_timeline_chart(&data, &["Germany", "Armenia"]);
        assert_eq!(chart.traces.len(), 2);
        assert_eq!(chart.traces[0].name, "Germany");
        assert_eq!(chart.traces[1].name, "Armenia");
        let deaths: Vec<_> = chart.traces[1].points.iter().map(|p| p.deaths).collect();
        assert_eq!(deaths, vec![10, 30]);
        assert_eq!(chart.traces[1].points[0].hover.lines[0], "A");
    }

    #[test]
    fn test_layout_is_log_date() {
        let data: Vec<Incident> = Vec::new();
        let chart = build_timeline_chart(&data, &["X"]);
        assert!(chart.layout.x_axis.range_slider);
        assert!(chart.layout.y_axis.autorange);
        assert_eq!(chart.layout.y_axis.kind, "log");
        assert_eq!(chart.layout.x_axis.kind, "date");
        assert_eq!(chart.title, "Number of Deaths per Massacre by Date & Location");
        assert_eq!(chart.traces[0].marker_size, 15);
    }

    #[test]
    fn test_date_span() {
        let data = vec![
            incident("A", 1915, "Turkey", 10),
            incident("B", 1850, "Turkey", 20),
        ];
        let chart = build_timeline_chart(&data, &["Turkey"]);
        let (lo, hi) = chart.date_span().unwrap();
        assert_eq!(lo.date(), NaiveDate::from_ymd_opt(1850, 1, 1).unwrap());
        assert_eq!(hi.date(), NaiveDate::from_ymd_opt(1915, 1, 1).unwrap());
    }
}
