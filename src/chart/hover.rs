use serde::Serialize;

use crate::data::Incident;

/// Column width for wrapped descriptions
pub const WRAP_WIDTH: usize = 40;

/// Hover text for one incident, one entry per displayed line.
///
/// Layout: name, death count, location and date, a blank line, then the
/// wrapped description.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct HoverText {
    pub lines: Vec<String>,
}

impl HoverText {
    pub fn for_incident(incident: &Incident) -> Self {
        let mut lines = vec![
            incident.name.clone(),
            format!("Deaths: {}", thousands(incident.deaths)),
            format!("{} {}", incident.location, incident.date.date()),
            String::new(),
        ];
        lines.extend(wrap(&incident.description, WRAP_WIDTH));
        Self { lines }
    }
}

/// Format an integer with `,` between groups of three digits
pub fn thousands(value: i64) -> String {
    let digits = value.unsigned_abs().to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3 + 1);
    if value < 0 {
        out.push('-');
    }
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

/// Greedy word wrap. Every whitespace character becomes a space and runs
/// of them are kept inside a line; whitespace at a line break is dropped.
/// Words longer than `width` are split across lines. Blank text yields no
/// lines.
pub fn wrap(text: &str, width: usize) -> Vec<String> {
    let width = width.max(1);
    // Stack of chunks, next chunk last
    let mut chunks = split_chunks(text);
    chunks.reverse();
    let mut lines = Vec::new();

    while !chunks.is_empty() {
        if !lines.is_empty() && chunks.last().is_some_and(|c| is_blank(c)) {
            chunks.pop();
        }

        let mut line: Vec<Vec<char>> = Vec::new();
        let mut len = 0;
        while let Some(chunk) = chunks.last() {
            if len + chunk.len() > width {
                break;
            }
            len += chunk.len();
            line.extend(chunks.pop());
        }

        if let Some(chunk) = chunks.last_mut() {
            if chunk.len() > width && len < width {
                let rest = chunk.split_off(width - len);
                line.push(std::mem::replace(chunk, rest));
            }
        }

        if line.last().is_some_and(|c| is_blank(c)) {
            line.pop();
        }
        if !line.is_empty() {
            lines.push(line.concat().into_iter().collect());
        }
    }
    lines
}

/// Alternating runs of word characters and of whitespace
fn split_chunks(text: &str) -> Vec<Vec<char>> {
    let mut chunks: Vec<Vec<char>> = Vec::new();
    for ch in text.chars() {
        let ch = if ch.is_whitespace() { ' ' } else { ch };
        match chunks.last_mut() {
            Some(chunk) if (chunk[0] == ' ') == (ch == ' ') => chunk.push(ch),
            _ => chunks.push(vec![ch]),
        }
    }
    chunks
}

fn is_blank(chunk: &[char]) -> bool {
    chunk.iter().all(|&c| c == ' ')
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn test_thousands() {
        assert_eq!(thousands(0), "0");
        assert_eq!(thousands(999), "999");
        assert_eq!(thousands(1_000), "1,000");
        assert_eq!(thousands(600_000), "600,000");
        assert_eq!(thousands(1_234_567), "1,234,567");
        assert_eq!(thousands(-4_500), "-4,500");
    }

    #[test]
    fn test_wrap_respects_width() {
        let text = "The quick brown fox jumps over the lazy dog and keeps running far away";
        let lines = wrap(text, 40);
        assert!(lines.len() > 1);
        assert!(lines.iter().all(|l| l.chars().count() <= 40));
        assert_eq!(lines.join(" "), text);
    }

    #[test]
    fn test_wrap_splits_long_words() {
        let word = "x".repeat(95);
        let lines = wrap(&word, 40);
        assert_eq!(lines.iter().map(String::len).collect::<Vec<_>>(), vec![40, 40, 15]);
    }

    #[test]
    fn test_wrap_keeps_inner_space_runs() {
        assert_eq!(wrap("Night  of violence", 40), vec!["Night  of violence"]);
        assert_eq!(wrap("a\tb\nc", 40), vec!["a b c"]);
    }

    #[test]
    fn test_wrap_drops_space_at_breaks() {
        let lines = wrap("aaaa    bbbb  cccc", 8);
        assert_eq!(lines, vec!["aaaa", "bbbb", "cccc"]);
    }

    #[test]
    fn test_wrap_empty() {
        assert!(wrap("", 40).is_empty());
        assert!(wrap("   \n ", 40).is_empty());
    }

    #[test]
    fn test_hover_layout() {
        let incident = Incident {
            name: "Example".to_string(),
            date: NaiveDate::from_ymd_opt(1915, 4, 24)
                .unwrap()
                .and_hms_opt(12, 30, 0)
                .unwrap(),
            location: "Turkey, Armenia".to_string(),
            lat: 39.9,
            lon: Some(32.8),
            deaths: 600_000,
            description: "Short text".to_string(),
        };
        let hover = HoverText::for_incident(&incident);
        assert_eq!(
            hover.lines,
            vec![
                "Example",
                "Deaths: 600,000",
                "Turkey, Armenia 1915-04-24",
                "",
                "Short text",
            ]
        );
    }
}
