//! `sheet://{spreadsheet_id}/{range_name}` resource.

use lazy_static::lazy_static;
use regex::Regex;
use serde::Serialize;
use serde_json::Value;

use super::tools::sheets::DEFAULT_RANGE;

pub const SHEET_URI_TEMPLATE: &str = "sheet://{spreadsheet_id}/{range_name}";
pub const SHEET_RESOURCE_NAME: &str = "get_sheet_resource";
pub const TEXT_MIME_TYPE: &str = "text/plain";

lazy_static! {
    static ref SHEET_URI: Regex =
        Regex::new(r"^sheet://([^/]+)/?(.*)$").expect("valid sheet URI pattern");
}

#[derive(Debug, Serialize)]
pub struct ResourceTemplate {
    #[serde(rename = "uriTemplate")]
    pub uri_template: String,
    pub name: String,
    pub description: String,
    #[serde(rename = "mimeType")]
    pub mime_type: String,
}

pub fn sheet_template() -> ResourceTemplate {
    ResourceTemplate {
        uri_template: SHEET_URI_TEMPLATE.to_string(),
        name: SHEET_RESOURCE_NAME.to_string(),
        description: "Google Sheet data as text, one row per line with cells joined by ' | '"
            .to_string(),
        mime_type: TEXT_MIME_TYPE.to_string(),
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SheetUri {
    pub spreadsheet_id: String,
    pub range_name: String,
}

impl SheetUri {
    /// Returns `None` when the URI does not follow the sheet template.
    pub fn parse(uri: &str) -> Option<Self> {
        let captures = SHEET_URI.captures(uri)?;
        let spreadsheet_id = urlencoding::decode(captures.get(1)?.as_str()).ok()?;
        let range = captures.get(2).map_or("", |m| m.as_str());
        let range_name = urlencoding::decode(range).ok()?;

        if spreadsheet_id.trim().is_empty() {
            return None;
        }
        let range_name = if range_name.is_empty() {
            DEFAULT_RANGE.to_string()
        } else {
            range_name.into_owned()
        };

        Some(Self {
            spreadsheet_id: spreadsheet_id.into_owned(),
            range_name,
        })
    }
}

/// One line per row, cells joined by `" | "`.
pub fn render_grid(values: &[Vec<Value>]) -> String {
    values
        .iter()
        .map(|row| {
            row.iter()
                .map(cell_text)
                .collect::<Vec<_>>()
                .join(" | ")
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn cell_text(cell: &Value) -> String {
    match cell {
        Value::String(text) => text.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_decodes_segments() {
        let uri = SheetUri::parse("sheet://abc123/My%20Sheet!A1%3AB2").unwrap();
        assert_eq!(uri.spreadsheet_id, "abc123");
        assert_eq!(uri.range_name, "My Sheet!A1:B2");
    }

    #[test]
    fn test_parse_keeps_slashes_in_range() {
        let uri = SheetUri::parse("sheet://abc123/Q1/Q2!A1").unwrap();
        assert_eq!(uri.range_name, "Q1/Q2!A1");
    }

    #[test]
    fn test_empty_range_means_sheet1() {
        assert_eq!(SheetUri::parse("sheet://abc123/").unwrap().range_name, "Sheet1");
        assert_eq!(SheetUri::parse("sheet://abc123").unwrap().range_name, "Sheet1");
    }

    #[test]
    fn test_foreign_uri_is_rejected() {
        assert!(SheetUri::parse("file:///etc/passwd").is_none());
        assert!(SheetUri::parse("sheet:///Sheet1").is_none());
    }

    #[test]
    fn test_render_grid() {
        let grid = vec![vec![json!("a"), json!("b")], vec![json!("c"), json!("d")]];
        assert_eq!(render_grid(&grid), "a | b\nc | d");
    }

    #[test]
    fn test_render_mixed_cells() {
        let grid = vec![vec![json!(1), json!(true), Value::Null, json!("x")], vec![]];
        assert_eq!(render_grid(&grid), "1 | true |  | x\n");
    }

    #[test]
    fn test_render_empty_grid() {
        assert_eq!(render_grid(&[]), "");
    }
}
