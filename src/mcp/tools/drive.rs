//! Drive tool: listing the user's spreadsheets.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use super::registry::{parse_arguments, to_pretty_json, ToolDescriptor};
use super::validation::{validate_positive, ValidationError, ValidationErrors, Validator};
use crate::google::RemoteOp;

pub const LIST_SPREADSHEETS_TOOL: &str = "list_spreadsheets";

const DEFAULT_MAX_RESULTS: i64 = 20;

pub fn list_spreadsheets_descriptor() -> ToolDescriptor {
    ToolDescriptor {
        name: LIST_SPREADSHEETS_TOOL.to_string(),
        description: concat!(
            "List the user's Google Spreadsheets. ",
            "Returns a JSON array of objects with the spreadsheet name, ID and URL. ",
            "Use the ID with read_sheet, write_sheet or append_sheet."
        )
        .to_string(),
        input_schema: json!({
            "type": "object",
            "properties": {
                "max_results": {
                    "type": "integer",
                    "minimum": 1,
                    "default": DEFAULT_MAX_RESULTS,
                    "description": "Maximum number of spreadsheets to return (default: 20)"
                }
            }
        }),
    }
}

#[derive(Debug, Deserialize)]
pub struct ListSpreadsheetsRequest {
    #[serde(default = "default_max_results")]
    pub max_results: i64,
}

fn default_max_results() -> i64 {
    DEFAULT_MAX_RESULTS
}

impl Validator for ListSpreadsheetsRequest {
    fn validate(&self) -> Result<(), String> {
        let mut errors = ValidationErrors::new();
        validate_positive(self.max_results, "max_results", &mut errors);
        if self.max_results > i64::from(u32::MAX) {
            errors.add(ValidationError::new("max_results", "is too large"));
        }
        errors.into_result()
    }
}

pub fn prepare_list_spreadsheets(arguments: Option<Value>) -> Result<RemoteOp, String> {
    let request: ListSpreadsheetsRequest = parse_arguments(arguments)?;
    request.validate()?;
    let page_size = u32::try_from(request.max_results).map_err(|err| err.to_string())?;
    Ok(RemoteOp::ListSpreadsheets { page_size })
}

#[derive(Debug, Deserialize)]
struct DriveFileList {
    #[serde(default)]
    files: Vec<DriveFile>,
}

#[derive(Debug, Deserialize)]
struct DriveFile {
    id: String,
    #[serde(default)]
    name: String,
    #[serde(rename = "webViewLink", default)]
    web_view_link: String,
}

#[derive(Debug, Serialize)]
pub struct SpreadsheetSummary {
    pub name: String,
    pub id: String,
    pub url: String,
}

pub fn render_list_spreadsheets(response: Value) -> Result<String, String> {
    let listing: DriveFileList = serde_json::from_value(response)
        .map_err(|err| format!("Unexpected Drive response: {}", err))?;
    let summaries: Vec<SpreadsheetSummary> = listing
        .files
        .into_iter()
        .map(|file| SpreadsheetSummary {
            name: file.name,
            id: file.id,
            url: file.web_view_link,
        })
        .collect();
    to_pretty_json(&summaries)
}
