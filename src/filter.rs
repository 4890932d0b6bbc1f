use rayon::prelude::*;
use serde::Serialize;

use crate::data::Incident;

/// Inclusive range of calendar years
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct YearRange {
    pub from: i32,
    pub to: i32,
}

impl YearRange {
    pub fn new(from: i32, to: i32) -> Self {
        Self { from, to }
    }

    /// Inverted ranges contain nothing
    pub fn contains(&self, year: i32) -> bool {
        self.from <= year && year <= self.to
    }
}

/// Incidents whose year falls inside `range`, in dataset order
pub fn filter_by_year(incidents: &[Incident], range: YearRange) -> Vec<&Incident> {
    incidents.iter().filter(|i| range.contains(i.year())).collect()
}

/// Incidents matched by one selected location token
#[derive(Debug)]
pub struct LocationMatch<'a> {
    pub token: String,
    pub incidents: Vec<&'a Incident>,
}

/// For each token, the incidents whose location string contains it.
///
/// Matching is a plain case-sensitive substring test with no token boundary:
/// "Iran" also selects "Iranian Kurdistan". Output follows the order of
/// `tokens`.
pub fn filter_by_location<'a, S>(incidents: &'a [Incident], tokens: &[S]) -> Vec<LocationMatch<'a>>
where
    S: AsRef<str> + Sync,
{
    tokens
        .par_iter()
        .map(|token| {
            let token = token.as_ref();
            LocationMatch {
                token: token.to_string(),
                incidents: incidents
                    .iter()
                    .filter(|i| i.location.contains(token))
                    .collect(),
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn incident(name: &str, year: i32, location: &str, deaths: i64) -> Incident {
        Incident {
            name: name.to_string(),
            date: NaiveDate::from_ymd_opt(year, 4, 24)
                .unwrap()
                .and_hms_opt(0, 0, 0)
                .unwrap(),
            location: location.to_string(),
            lat: 39.9,
            lon: Some(32.8),
            deaths,
            description: String::new(),
        }
    }

    fn sample() -> Vec<Incident> {
        vec![
            incident("A", 1915, "Turkey", 600_000),
            incident("B", 1572, "Paris, France", 3_000),
            incident("C", 1988, "Halabja, Iraq", 5_000),
            incident("D", 1988, "Iranian Kurdistan", 300),
            incident("E", 1978, "Iran", 400),
            incident("F", 50, "Rome", 10),
            incident("G", 2020, "Somewhere", 20),
        ]
    }

    #[test]
    fn test_year_example() {
        let data = vec![incident("A", 1915, "Turkey", 600_000)];
        assert_eq!(filter_by_year(&data, YearRange::new(1900, 1920)).len(), 1);
        assert!(filter_by_year(&data, YearRange::new(1921, 2000)).is_empty());
    }

    #[test]
    fn test_full_range_returns_everything() {
        let data = sample();
        let all = filter_by_year(&data, YearRange::new(50, 2020));
        assert_eq!(all.len(), data.len());
        // Order is preserved
        let names: Vec<_> = all.iter().map(|i| i.name.as_str()).collect();
        assert_eq!(names, vec!["A", "B", "C", "D", "E", "F", "G"]);
    }

    #[test]
    fn test_bounds_are_inclusive() {
        let data = sample();
        let hits = filter_by_year(&data, YearRange::new(1988, 1988));
        assert_eq!(hits.len(), 2);
    }

    #[test]
    fn test_inverted_range_is_empty() {
        let data = sample();
        for (from, to) in [(2000, 1900), (51, 50), (2020, -5), (1988, 1987)] {
            assert!(filter_by_year(&data, YearRange::new(from, to)).is_empty());
        }
    }

    #[test]
    fn test_out_of_domain_bounds() {
        let data = sample();
        assert_eq!(filter_by_year(&data, YearRange::new(-10_000, 10_000)).len(), data.len());
        assert!(filter_by_year(&data, YearRange::new(3000, 4000)).is_empty());
    }

    #[test]
    fn test_substring_match_crosses_token_boundaries() {
        let data = sample();
        let matches = filter_by_location(&data, &["Iran"]);
        assert_eq!(matches.len(), 1);
        let names: Vec<_> = matches[0].incidents.iter().map(|i| i.name.as_str()).collect();
        assert_eq!(names, vec!["D", "E"]);
    }

    #[test]
    fn test_match_is_case_sensitive() {
        let data = sample();
        let matches = filter_by_location(&data, &["france"]);
        assert!(matches[0].incidents.is_empty());
    }

    #[test]
    fn test_prefix_token_yields_superset() {
        let data = sample();
        let short = filter_by_location(&data, &["Ira"]);
        let long = filter_by_location(&data, &["Iraq"]);
        assert!(!long[0].incidents.is_empty());
        for hit in &long[0].incidents {
            assert!(short[0].incidents.contains(hit));
        }
        assert!(short[0].incidents.len() >= long[0].incidents.len());
    }

    #[test]
    fn test_token_order_is_preserved() {
        let data = sample();
        let tokens = vec!["Turkey".to_string(), "France".to_string(), "Nowhere".to_string()];
        let matches = filter_by_location(&data, &tokens);
        let order: Vec<_> = matches.iter().map(|m| m.token.as_str()).collect();
        assert_eq!(order, vec!["Turkey", "France", "Nowhere"]);
        assert!(matches[2].incidents.is_empty());
    }

    #[test]
    fn test_no_tokens_no_output() {
        let data = sample();
        let tokens: [&str; 0] = [];
        assert!(filter_by_location(&data, &tokens).is_empty());
    }
}
