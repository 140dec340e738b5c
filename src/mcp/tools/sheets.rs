//! Sheets tools: reading, writing, appending and creating spreadsheets.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use super::registry::{parse_arguments, to_pretty_json, ToolDescriptor};
use super::validation::{validate_grid, validate_required, ValidationErrors, Validator};
use crate::google::RemoteOp;

pub const READ_SHEET_TOOL: &str = "read_sheet";
pub const WRITE_SHEET_TOOL: &str = "write_sheet";
pub const APPEND_SHEET_TOOL: &str = "append_sheet";
pub const CREATE_SPREADSHEET_TOOL: &str = "create_spreadsheet";

pub const DEFAULT_RANGE: &str = "Sheet1";

fn grid_schema(description: &str) -> Value {
    json!({
        "type": "array",
        "description": description,
        "items": {
            "type": "array",
            "items": { "type": ["string", "number", "boolean", "null"] }
        }
    })
}

pub fn read_sheet_descriptor() -> ToolDescriptor {
    ToolDescriptor {
        name: READ_SHEET_TOOL.to_string(),
        description: concat!(
            "Read data from a Google Sheet. ",
            "Returns the cell values as a JSON array of rows; trailing empty cells are omitted."
        )
        .to_string(),
        input_schema: json!({
            "type": "object",
            "properties": {
                "spreadsheet_id": {
                    "type": "string",
                    "description": "The ID of the spreadsheet (from the URL)"
                },
                "range_name": {
                    "type": "string",
                    "default": DEFAULT_RANGE,
                    "description": "The A1 notation of the range to read (default: Sheet1)"
                }
            },
            "required": ["spreadsheet_id"]
        }),
    }
}

pub fn write_sheet_descriptor() -> ToolDescriptor {
    ToolDescriptor {
        name: WRITE_SHEET_TOOL.to_string(),
        description: concat!(
            "Write data to a Google Sheet, overwriting the target range. ",
            "Values are stored as entered (no formula or date parsing)."
        )
        .to_string(),
        input_schema: json!({
            "type": "object",
            "properties": {
                "spreadsheet_id": {
                    "type": "string",
                    "description": "The ID of the spreadsheet"
                },
                "range_name": {
                    "type": "string",
                    "description": "The A1 notation of where to write"
                },
                "values": grid_schema("2D list of values to write")
            },
            "required": ["spreadsheet_id", "range_name", "values"]
        }),
    }
}

pub fn append_sheet_descriptor() -> ToolDescriptor {
    ToolDescriptor {
        name: APPEND_SHEET_TOOL.to_string(),
        description: concat!(
            "Append rows after the last row of data in a Google Sheet range. ",
            "Existing data is never overwritten."
        )
        .to_string(),
        input_schema: json!({
            "type": "object",
            "properties": {
                "spreadsheet_id": {
                    "type": "string",
                    "description": "The ID of the spreadsheet"
                },
                "range_name": {
                    "type": "string",
                    "description": "The A1 notation of the range"
                },
                "values": grid_schema("2D list of values to append")
            },
            "required": ["spreadsheet_id", "range_name", "values"]
        }),
    }
}

pub fn create_spreadsheet_descriptor() -> ToolDescriptor {
    ToolDescriptor {
        name: CREATE_SPREADSHEET_TOOL.to_string(),
        description: "Create a new Google Spreadsheet. Returns JSON with the spreadsheet ID and URL."
            .to_string(),
        input_schema: json!({
            "type": "object",
            "properties": {
                "title": {
                    "type": "string",
                    "description": "The title of the new spreadsheet"
                }
            },
            "required": ["title"]
        }),
    }
}

// =============================================================================
// Request types
// =============================================================================

#[derive(Debug, Deserialize)]
pub struct ReadSheetRequest {
    pub spreadsheet_id: String,
    #[serde(default = "default_range")]
    pub range_name: String,
}

fn default_range() -> String {
    DEFAULT_RANGE.to_string()
}

impl Validator for ReadSheetRequest {
    fn validate(&self) -> Result<(), String> {
        let mut errors = ValidationErrors::new();
        validate_required(&self.spreadsheet_id, "spreadsheet_id", "Spreadsheet ID", &mut errors);
        validate_required(&self.range_name, "range_name", "Range", &mut errors);
        errors.into_result()
    }
}

/// Shared by write_sheet and append_sheet.
#[derive(Debug, Deserialize)]
pub struct GridRequest {
    pub spreadsheet_id: String,
    pub range_name: String,
    pub values: Vec<Vec<Value>>,
}

impl Validator for GridRequest {
    fn validate(&self) -> Result<(), String> {
        let mut errors = ValidationErrors::new();
        validate_required(&self.spreadsheet_id, "spreadsheet_id", "Spreadsheet ID", &mut errors);
        validate_required(&self.range_name, "range_name", "Range", &mut errors);
        validate_grid(&self.values, "values", &mut errors);
        errors.into_result()
    }
}

#[derive(Debug, Deserialize)]
pub struct CreateSpreadsheetRequest {
    pub title: String,
}

impl Validator for CreateSpreadsheetRequest {
    fn validate(&self) -> Result<(), String> {
        let mut errors = ValidationErrors::new();
        validate_required(&self.title, "title", "Title", &mut errors);
        errors.into_result()
    }
}

// =============================================================================
// Argument preparation
// =============================================================================

pub fn prepare_read_sheet(arguments: Option<Value>) -> Result<RemoteOp, String> {
    let request: ReadSheetRequest = parse_arguments(arguments)?;
    request.validate()?;
    Ok(RemoteOp::GetValues {
        spreadsheet_id: request.spreadsheet_id,
        range: request.range_name,
    })
}

pub fn prepare_write_sheet(arguments: Option<Value>) -> Result<RemoteOp, String> {
    let request: GridRequest = parse_arguments(arguments)?;
    request.validate()?;
    Ok(RemoteOp::UpdateValues {
        spreadsheet_id: request.spreadsheet_id,
        range: request.range_name,
        values: request.values,
    })
}

pub fn prepare_append_sheet(arguments: Option<Value>) -> Result<RemoteOp, String> {
    let request: GridRequest = parse_arguments(arguments)?;
    request.validate()?;
    Ok(RemoteOp::AppendValues {
        spreadsheet_id: request.spreadsheet_id,
        range: request.range_name,
        values: request.values,
    })
}

pub fn prepare_create_spreadsheet(arguments: Option<Value>) -> Result<RemoteOp, String> {
    let request: CreateSpreadsheetRequest = parse_arguments(arguments)?;
    request.validate()?;
    Ok(RemoteOp::CreateSpreadsheet {
        title: request.title,
    })
}

// =============================================================================
// Response rendering
// =============================================================================

#[derive(Debug, Deserialize)]
struct ValueRange {
    #[serde(default)]
    values: Vec<Vec<Value>>,
}

/// Cell grid of a `values.get` response; an empty range has no `values` key.
pub fn values_of(response: Value) -> Result<Vec<Vec<Value>>, String> {
    serde_json::from_value::<ValueRange>(response)
        .map(|range| range.values)
        .map_err(|err| format!("Unexpected Sheets response: {}", err))
}

pub fn render_read_sheet(response: Value) -> Result<String, String> {
    to_pretty_json(&values_of(response)?)
}

pub fn render_write_sheet(response: Value) -> Result<String, String> {
    let cells = response
        .get("updatedCells")
        .and_then(Value::as_u64)
        .unwrap_or(0);
    Ok(format!("Updated {} cells", cells))
}

pub fn render_append_sheet(response: Value) -> Result<String, String> {
    let cells = response
        .get("updates")
        .and_then(|updates| updates.get("updatedCells"))
        .and_then(Value::as_u64)
        .unwrap_or(0);
    Ok(format!("Appended {} cells", cells))
}

#[derive(Debug, Serialize)]
struct CreatedSpreadsheet {
    spreadsheet_id: Option<String>,
    url: Option<String>,
}

pub fn render_create_spreadsheet(response: Value) -> Result<String, String> {
    let text_field = |key: &str| response.get(key).and_then(Value::as_str).map(str::to_string);
    to_pretty_json(&CreatedSpreadsheet {
        spreadsheet_id: text_field("spreadsheetId"),
        url: text_field("spreadsheetUrl"),
    })
}
