use std::collections::BTreeSet;

use super::Incident;

/// Separator between tokens of a composite location
pub const TOKEN_SEPARATOR: &str = ", ";

/// Distinct location tokens across the whole dataset, sorted
#[derive(Clone, Debug, Default, PartialEq)]
pub struct LocationIndex {
    tokens: BTreeSet<String>,
}

impl LocationIndex {
    pub fn build(incidents: &[Incident]) -> Self {
        Self::from_locations(incidents.iter().map(|i| i.location.as_str()))
    }

    pub fn from_locations<'a>(locations: impl IntoIterator<Item = &'a str>) -> Self {
        let tokens = locations
            .into_iter()
            .flat_map(|loc| loc.split(TOKEN_SEPARATOR))
            .map(str::to_string)
            .collect();
        Self { tokens }
    }

    pub fn tokens(&self) -> impl Iterator<Item = &str> {
        self.tokens.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_union_of_split_tokens() {
        let index = LocationIndex::from_locations(["Turkey, Armenia", "Germany"]);
        let tokens: Vec<_> = index.tokens().collect();
        assert_eq!(tokens, vec!["Armenia", "Germany", "Turkey"]);
    }

    #[test]
    fn test_duplicates_collapse() {
        let index = LocationIndex::from_locations(["Paris, France", "Lyon, France", "France"]);
        assert_eq!(index.len(), 3);
        assert!(index.tokens().any(|t| t == "France"));
    }

    #[test]
    fn test_split_is_on_comma_space_only() {
        // "A,B" has no ", " so it stays one token
        let index = LocationIndex::from_locations(["A,B"]);
        assert_eq!(index.tokens().collect::<Vec<_>>(), vec!["A,B"]);
    }
}
