//! Turns raw model text into an answer plus display-ready components. The
//! model is instructed to emit structured payloads behind fixed markers;
//! anything that fails to parse is dropped and the response degrades to text.

use serde::{Deserialize, Serialize};
use serde_json::Value;

pub const TABLE_MARKER: &str = "TABLE_DATA:";
pub const CHART_MARKER: &str = "CHART_DATA:";
pub const CARDS_MARKER: &str = "CARDS_DATA:";

const MARKERS: [&str; 3] = [TABLE_MARKER, CHART_MARKER, CARDS_MARKER];

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", content = "data", rename_all = "lowercase")]
pub enum Component {
    Table(TableData),
    Chart(ChartData),
    Cards(Vec<Card>),
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct TableData {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    pub headers: Vec<String>,
    pub rows: Vec<Vec<Value>>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ChartData {
    #[serde(rename = "type")]
    pub kind: String,
    pub title: String,
    pub labels: Vec<String>,
    pub values: Vec<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Card {
    pub title: String,
    pub value: String,
    #[serde(default)]
    pub description: String,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct FormattedResponse {
    pub text: String,
    pub components: Vec<Component>,
}

/// Splits the model's text into the free-text answer and any structured
/// components. Components are only looked for when the question asked for
/// structured data; a response without markers passes through unchanged.
pub fn parse_response(raw: &str, question: &str, structured_requested: bool) -> FormattedResponse {
    if !structured_requested {
        return FormattedResponse {
            text: raw.trim().to_string(),
            components: Vec::new(),
        };
    }

    let mut components = Vec::new();
    if let Some(section) = marker_section(raw, TABLE_MARKER) {
        if let Some(table) = parse_table(section) {
            components.push(Component::Table(table));
        }
    }
    if let Some(section) = marker_section(raw, CHART_MARKER) {
        if let Some(chart) = parse_chart(section) {
            components.push(Component::Chart(chart));
        }
    }
    if let Some(section) = marker_section(raw, CARDS_MARKER) {
        if let Some(cards) = parse_cards(section) {
            components.push(Component::Cards(cards));
        }
    }

    let mut text = leading_text(raw).trim().to_string();

    // The model sometimes emits nothing but the payload. Substitute a usable
    // lead-in so the frontend never shows components under an empty answer.
    if !components.is_empty() && text.chars().count() < 20 {
        let lowered = question.to_lowercase();
        text = if lowered.contains("employee") || lowered.contains("attendance") {
            "Here is the employee attendance data from the monthly report:".to_string()
        } else {
            "Here is the requested data from the document:".to_string()
        };
    }

    FormattedResponse { text, components }
}

/// Text before the first marker, or the whole response if there is none.
fn leading_text(raw: &str) -> &str {
    match MARKERS.iter().filter_map(|m| raw.find(m)).min() {
        Some(idx) => &raw[..idx],
        None => raw,
    }
}

/// Content between a marker and the next marker (or end of text).
fn marker_section<'a>(raw: &'a str, marker: &str) -> Option<&'a str> {
    let start = raw.find(marker)? + marker.len();
    let rest = &raw[start..];
    let end = MARKERS
        .iter()
        .filter(|m| **m != marker)
        .filter_map(|m| rest.find(m))
        .min()
        .unwrap_or(rest.len());
    Some(&rest[..end])
}

fn parse_table(section: &str) -> Option<TableData> {
    let headers_at = section.find("headers:")?;
    let headers_src = bracket_list(&section[headers_at + "headers:".len()..])?;
    let headers: Vec<String> = split_top_level(strip_brackets(headers_src))
        .into_iter()
        .map(|item| strip_quotes(item.trim()).to_string())
        .filter(|item| !item.is_empty())
        .collect();

    let rows_at = section.find("rows:")?;
    let rows_src = bracket_list(&section[rows_at + "rows:".len()..])?;
    let mut rows = Vec::new();
    for group in top_level_groups(strip_brackets(rows_src)) {
        let values: Vec<Value> = split_top_level(strip_brackets(group))
            .into_iter()
            .map(|item| parse_scalar(item.trim()))
            .collect();
        if !values.is_empty() {
            rows.push(values);
        }
    }

    if headers.is_empty() || rows.is_empty() {
        return None;
    }
    Some(TableData {
        title: None,
        headers,
        rows,
    })
}

fn parse_chart(section: &str) -> Option<ChartData> {
    let mut kind = String::from("bar");
    let mut title = String::new();
    let mut labels: Option<Vec<String>> = None;
    let mut values: Option<Vec<f64>> = None;

    for line in section.lines() {
        let line = line.trim();
        let Some((key, value)) = line.split_once(':') else {
            continue;
        };
        match key.trim() {
            "type" => kind = strip_quotes(value.trim()).to_string(),
            "title" => title = strip_quotes(value.trim()).to_string(),
            "labels" => {
                let list = bracket_list(value)?;
                labels = Some(
                    split_top_level(strip_brackets(list))
                        .into_iter()
                        .map(|item| strip_quotes(item.trim()).to_string())
                        .collect(),
                );
            }
            "values" => {
                let list = bracket_list(value)?;
                let mut parsed = Vec::new();
                for item in split_top_level(strip_brackets(list)) {
                    parsed.push(strip_quotes(item.trim()).parse::<f64>().ok()?);
                }
                values = Some(parsed);
            }
            _ => {}
        }
    }

    let labels = labels?;
    let values = values?;
    if labels.is_empty() || labels.len() != values.len() {
        log::warn!(
            "Chart data length mismatch: labels={}, values={}",
            labels.len(),
            values.len()
        );
        return None;
    }
    Some(ChartData {
        kind,
        title,
        labels,
        values,
    })
}

fn parse_cards(section: &str) -> Option<Vec<Card>> {
    let json_src = bracket_list(section)?;
    match serde_json::from_str::<Vec<Card>>(json_src) {
        Ok(cards) if !cards.is_empty() => Some(cards),
        _ => None,
    }
}

/// Slice from the first `[` to its balanced closing `]`, quote-aware.
fn bracket_list(text: &str) -> Option<&str> {
    let start = text.find('[')?;
    let mut depth = 0usize;
    let mut quote: Option<char> = None;
    for (offset, ch) in text[start..].char_indices() {
        match quote {
            Some(q) => {
                if ch == q {
                    quote = None;
                }
            }
            None => match ch {
                '"' | '\'' => quote = Some(ch),
                '[' => depth += 1,
                ']' => {
                    depth -= 1;
                    if depth == 0 {
                        return Some(&text[start..start + offset + ch.len_utf8()]);
                    }
                }
                _ => {}
            },
        }
    }
    None
}

fn strip_brackets(list: &str) -> &str {
    list.trim()
        .strip_prefix('[')
        .and_then(|s| s.strip_suffix(']'))
        .unwrap_or(list)
}

/// Splits on commas at nesting depth zero, outside quotes.
fn split_top_level(inner: &str) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut depth = 0usize;
    let mut quote: Option<char> = None;
    let mut start = 0usize;

    for (idx, ch) in inner.char_indices() {
        match quote {
            Some(q) => {
                if ch == q {
                    quote = None;
                }
            }
            None => match ch {
                '"' | '\'' => quote = Some(ch),
                '[' | '{' => depth += 1,
                ']' | '}' => depth = depth.saturating_sub(1),
                ',' if depth == 0 => {
                    parts.push(&inner[start..idx]);
                    start = idx + 1;
                }
                _ => {}
            },
        }
    }
    if start < inner.len() {
        parts.push(&inner[start..]);
    }
    parts
        .into_iter()
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .collect()
}

/// Top-level `[...]` groups inside a rows list, so multiline rows parse.
fn top_level_groups(inner: &str) -> Vec<&str> {
    let mut groups = Vec::new();
    let mut depth = 0usize;
    let mut quote: Option<char> = None;
    let mut start = None;

    for (idx, ch) in inner.char_indices() {
        match quote {
            Some(q) => {
                if ch == q {
                    quote = None;
                }
            }
            None => match ch {
                '"' | '\'' => quote = Some(ch),
                '[' => {
                    if depth == 0 {
                        start = Some(idx);
                    }
                    depth += 1;
                }
                ']' => {
                    depth = depth.saturating_sub(1);
                    if depth == 0 {
                        if let Some(s) = start.take() {
                            groups.push(&inner[s..idx + 1]);
                        }
                    }
                }
                _ => {}
            },
        }
    }
    groups
}

fn strip_quotes(token: &str) -> &str {
    let token = token.trim();
    for q in ['"', '\''] {
        if token.len() >= 2 && token.starts_with(q) && token.ends_with(q) {
            return &token[1..token.len() - 1];
        }
    }
    token
}

/// Table/row cells keep their numeric type when the model emits bare numbers.
fn parse_scalar(token: &str) -> Value {
    let stripped = strip_quotes(token);
    if stripped != token.trim() {
        return Value::String(stripped.to_string());
    }
    if let Ok(int) = stripped.parse::<i64>() {
        return Value::from(int);
    }
    if let Ok(float) = stripped.parse::<f64>() {
        if let Some(number) = serde_json::Number::from_f64(float) {
            return Value::Number(number);
        }
    }
    Value::String(stripped.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn plain_text_passes_through_untouched() {
        let raw = "Attendance was high across all departments.";
        let parsed = parse_response(raw, "how was attendance?", false);
        assert_eq!(parsed.text, raw);
        assert!(parsed.components.is_empty());
    }

    #[test]
    fn no_marker_means_no_components_even_when_requested() {
        let raw = "I could not build a table from this document.";
        let parsed = parse_response(raw, "show me a table", true);
        assert_eq!(parsed.text, raw);
        assert!(parsed.components.is_empty());
    }

    #[test]
    fn table_payload_is_extracted_and_stripped_from_text() {
        let raw = "Here is the attendance breakdown you asked for:\n\
                   TABLE_DATA:\n\
                   headers: [Name, Days Present, Days Absent]\n\
                   rows: [[\"Ahmed Ali Hassan\", 20, 2], [\"Layla Ahmed Al-Qasimi\", 18, 4]]";
        let parsed = parse_response(raw, "attendance in a table", true);

        assert_eq!(parsed.text, "Here is the attendance breakdown you asked for:");
        assert_eq!(parsed.components.len(), 1);
        match &parsed.components[0] {
            Component::Table(table) => {
                assert_eq!(table.headers, vec!["Name", "Days Present", "Days Absent"]);
                assert_eq!(table.rows.len(), 2);
                assert_eq!(table.rows[0][0], json!("Ahmed Ali Hassan"));
                assert_eq!(table.rows[0][1], json!(20));
            }
            other => panic!("expected table, got {:?}", other),
        }
    }

    #[test]
    fn multiline_rows_parse() {
        let raw = "Summary:\n\
                   TABLE_DATA:\n\
                   headers: [Department, Present]\n\
                   rows: [[\"Finance\", 38],\n\
                   [\"Marketing\", 35],\n\
                   [\"Operations\", 41]]";
        let parsed = parse_response(raw, "table please", true);
        match &parsed.components[0] {
            Component::Table(table) => assert_eq!(table.rows.len(), 3),
            other => panic!("expected table, got {:?}", other),
        }
    }

    #[test]
    fn quoted_cells_keep_embedded_commas() {
        let raw = "Data:\nTABLE_DATA:\nheaders: [Metric, Value]\n\
                   rows: [[\"Total Users\", \"1,234\"]]";
        let parsed = parse_response(raw, "table", true);
        match &parsed.components[0] {
            Component::Table(table) => assert_eq!(table.rows[0][1], json!("1,234")),
            other => panic!("expected table, got {:?}", other),
        }
    }

    #[test]
    fn chart_payload_is_extracted() {
        let raw = "Absences by department:\n\
                   CHART_DATA:\n\
                   type: pie\n\
                   title: Absences\n\
                   labels: [Finance, Marketing, Operations]\n\
                   values: [4, 7, 2]";
        let parsed = parse_response(raw, "pie chart of absences", true);
        match &parsed.components[0] {
            Component::Chart(chart) => {
                assert_eq!(chart.kind, "pie");
                assert_eq!(chart.title, "Absences");
                assert_eq!(chart.labels.len(), 3);
                assert_eq!(chart.values, vec![4.0, 7.0, 2.0]);
            }
            other => panic!("expected chart, got {:?}", other),
        }
    }

    #[test]
    fn mismatched_chart_lengths_are_dropped() {
        let raw = "Chart:\nCHART_DATA:\ntype: bar\ntitle: T\n\
                   labels: [A, B, C]\nvalues: [1, 2]";
        let parsed = parse_response(raw, "bar chart", true);
        assert!(parsed.components.is_empty());
    }

    #[test]
    fn non_numeric_chart_values_are_dropped() {
        let raw = "Chart:\nCHART_DATA:\ntype: bar\ntitle: T\n\
                   labels: [A, B]\nvalues: [1, lots]";
        let parsed = parse_response(raw, "bar chart", true);
        assert!(parsed.components.is_empty());
    }

    #[test]
    fn cards_payload_is_extracted() {
        let raw = "Key metrics:\nCARDS_DATA:\n\
                   [{\"title\": \"Attendance Rate\", \"value\": \"85%\", \
                   \"description\": \"Across 30 days\"}]";
        let parsed = parse_response(raw, "key metrics", true);
        match &parsed.components[0] {
            Component::Cards(cards) => {
                assert_eq!(cards.len(), 1);
                assert_eq!(cards[0].title, "Attendance Rate");
                assert_eq!(cards[0].value, "85%");
            }
            other => panic!("expected cards, got {:?}", other),
        }
    }

    #[test]
    fn mixed_payloads_parse_in_order() {
        let raw = "Full picture below.\n\
                   TABLE_DATA:\nheaders: [A]\nrows: [[1]]\n\
                   CHART_DATA:\ntype: bar\ntitle: T\nlabels: [A]\nvalues: [1]\n\
                   CARDS_DATA:\n[{\"title\": \"X\", \"value\": \"1\", \"description\": \"d\"}]";
        let parsed = parse_response(raw, "table and chart and dashboard", true);
        assert_eq!(parsed.components.len(), 3);
        assert!(matches!(parsed.components[0], Component::Table(_)));
        assert!(matches!(parsed.components[1], Component::Chart(_)));
        assert!(matches!(parsed.components[2], Component::Cards(_)));
        assert_eq!(parsed.text, "Full picture below.");
    }

    #[test]
    fn short_leading_text_gets_canned_summary() {
        let raw = "Done.\nTABLE_DATA:\nheaders: [A]\nrows: [[1]]";
        let parsed = parse_response(raw, "employee attendance table", true);
        assert_eq!(
            parsed.text,
            "Here is the employee attendance data from the monthly report:"
        );

        let parsed = parse_response(raw, "revenue table", true);
        assert_eq!(parsed.text, "Here is the requested data from the document:");
    }

    #[test]
    fn component_serialization_shape() {
        let component = Component::Chart(ChartData {
            kind: "bar".to_string(),
            title: "T".to_string(),
            labels: vec!["A".to_string()],
            values: vec![1.0],
        });
        let value = serde_json::to_value(&component).unwrap();
        assert_eq!(value["type"], "chart");
        assert_eq!(value["data"]["type"], "bar");
        assert_eq!(value["data"]["labels"][0], "A");
    }

    #[test]
    fn malformed_table_degrades_to_text() {
        let raw = "Answer first.\nTABLE_DATA:\nheaders: not a list\nrows: nothing";
        let parsed = parse_response(raw, "table", true);
        assert!(parsed.components.is_empty());
        assert_eq!(parsed.text, "Answer first.");
    }
}
