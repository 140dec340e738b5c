//! Shared fakes for the integration tests: an in-memory Google workspace and
//! scripted credential collaborators.
#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{Duration, Utc};
use parking_lot::Mutex;
use serde_json::{json, Value};

use gsheets_mcp::auth::credential::CREDENTIAL_SCHEMA_VERSION;
use gsheets_mcp::auth::{ConsentFlow, Credential, CredentialSource, TokenRefresher, SCOPES};
use gsheets_mcp::error::{AuthError, Error, RemoteError};
use gsheets_mcp::google::{RemoteBackend, RemoteOp};
use gsheets_mcp::mcp::tools::ToolRegistry;
use gsheets_mcp::mcp::McpService;

pub fn credential(access_token: &str, expires_in_secs: i64) -> Credential {
    Credential {
        version: CREDENTIAL_SCHEMA_VERSION,
        access_token: access_token.to_string(),
        refresh_token: Some("1//refresh".to_string()),
        expiry: Utc::now() + Duration::seconds(expires_in_secs),
        scopes: SCOPES.iter().map(|s| s.to_string()).collect(),
        token_uri: "https://oauth2.googleapis.com/token".to_string(),
        client_id: Some("client-id".to_string()),
        client_secret: Some("client-secret".to_string()),
    }
}

// =============================================================================
// Credential fakes
// =============================================================================

/// Hands out the same credential every time and counts the calls.
pub struct StaticCredentials {
    credential: Credential,
    pub calls: AtomicUsize,
}

impl StaticCredentials {
    pub fn new(credential: Credential) -> Self {
        Self {
            credential,
            calls: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl CredentialSource for StaticCredentials {
    async fn acquire(&self) -> Result<Credential, Error> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.credential.clone())
    }
}

/// Always fails as if the user closed the consent page.
pub struct DeniedCredentials;

#[async_trait]
impl CredentialSource for DeniedCredentials {
    async fn acquire(&self) -> Result<Credential, Error> {
        Err(AuthError::ConsentDenied("access_denied".to_string()).into())
    }
}

pub struct CountingRefresher {
    pub calls: AtomicUsize,
    fail: bool,
}

impl CountingRefresher {
    pub fn succeeding() -> Self {
        Self {
            calls: AtomicUsize::new(0),
            fail: false,
        }
    }

    pub fn failing() -> Self {
        Self {
            calls: AtomicUsize::new(0),
            fail: true,
        }
    }

    pub fn count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl TokenRefresher for CountingRefresher {
    async fn refresh(&self, stored: &Credential) -> Result<Credential, AuthError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            return Err(AuthError::TokenExchange(
                "invalid_grant: Token has been expired or revoked.".to_string(),
            ));
        }
        let mut next = stored.clone();
        next.access_token = "ya29.refreshed".to_string();
        next.expiry = Utc::now() + Duration::seconds(3600);
        Ok(next)
    }
}

pub struct CountingFlow {
    pub calls: AtomicUsize,
    pub scopes_seen: Mutex<Vec<String>>,
}

impl CountingFlow {
    pub fn new() -> Self {
        Self {
            calls: AtomicUsize::new(0),
            scopes_seen: Mutex::new(Vec::new()),
        }
    }

    pub fn count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ConsentFlow for CountingFlow {
    async fn obtain(&self, scopes: &[&str]) -> Result<Credential, AuthError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        *self.scopes_seen.lock() = scopes.iter().map(|s| s.to_string()).collect();
        Ok(credential("ya29.consented", 3600))
    }
}

// =============================================================================
// In-memory workspace
// =============================================================================

const DEFAULT_SHEET: &str = "Sheet1";

#[derive(Debug, Default)]
struct Spreadsheet {
    title: String,
    sheets: HashMap<String, Vec<Vec<Value>>>,
}

#[derive(Debug, Clone)]
pub struct FakeForm {
    pub id: String,
    pub title: String,
    pub description: Option<String>,
}

#[derive(Debug, Default)]
struct State {
    order: Vec<String>,
    spreadsheets: HashMap<String, Spreadsheet>,
    forms: Vec<FakeForm>,
    ops: Vec<RemoteOp>,
    tokens: Vec<String>,
}

/// A1-range backed fake of Sheets, Forms and Drive.
#[derive(Default)]
pub struct FakeWorkspace {
    state: Mutex<State>,
}

/// Zero-based cell bounds parsed from A1 notation.
#[derive(Debug, Clone, Copy)]
struct Bounds {
    row: usize,
    col: usize,
    end_row: Option<usize>,
    end_col: Option<usize>,
}

impl FakeWorkspace {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a spreadsheet directly, bypassing the tools.
    pub fn add_spreadsheet(&self, id: &str, title: &str) {
        let mut state = self.state.lock();
        insert_spreadsheet(&mut state, id.to_string(), title.to_string());
    }

    pub fn ops(&self) -> Vec<RemoteOp> {
        self.state.lock().ops.clone()
    }

    pub fn tokens(&self) -> Vec<String> {
        self.state.lock().tokens.clone()
    }

    pub fn forms(&self) -> Vec<FakeForm> {
        self.state.lock().forms.clone()
    }

    pub fn spreadsheet_title(&self, id: &str) -> Option<String> {
        self.state
            .lock()
            .spreadsheets
            .get(id)
            .map(|book| book.title.clone())
    }

    fn apply(state: &mut State, op: &RemoteOp) -> Result<Value, RemoteError> {
        match op {
            RemoteOp::ListSpreadsheets { page_size } => {
                let files: Vec<Value> = state
                    .order
                    .iter()
                    .take(*page_size as usize)
                    .filter_map(|id| state.spreadsheets.get(id).map(|book| (id, book)))
                    .map(|(id, book)| {
                        json!({
                            "id": id,
                            "name": book.title,
                            "webViewLink": format!("https://docs.google.com/spreadsheets/d/{}/edit", id)
                        })
                    })
                    .collect();
                Ok(json!({ "files": files }))
            }
            RemoteOp::GetValues {
                spreadsheet_id,
                range,
            } => {
                let (sheet, bounds) = parse_range(range)?;
                let grid = sheet_mut(state, spreadsheet_id, &sheet)?;
                let values = read_grid(grid, bounds);
                if values.is_empty() {
                    Ok(json!({ "range": range, "majorDimension": "ROWS" }))
                } else {
                    Ok(json!({ "range": range, "majorDimension": "ROWS", "values": values }))
                }
            }
            RemoteOp::UpdateValues {
                spreadsheet_id,
                range,
                values,
            } => {
                let (sheet, bounds) = parse_range(range)?;
                let grid = sheet_mut(state, spreadsheet_id, &sheet)?;
                let cells = write_grid(grid, bounds.row, bounds.col, values);
                Ok(json!({ "spreadsheetId": spreadsheet_id, "updatedRange": range, "updatedCells": cells }))
            }
            RemoteOp::AppendValues {
                spreadsheet_id,
                range,
                values,
            } => {
                let (sheet, bounds) = parse_range(range)?;
                let grid = sheet_mut(state, spreadsheet_id, &sheet)?;
                let next_row = last_used_row(grid).map_or(bounds.row, |last| (last + 1).max(bounds.row));
                let cells = write_grid(grid, next_row, bounds.col, values);
                Ok(json!({
                    "spreadsheetId": spreadsheet_id,
                    "updates": { "updatedRange": range, "updatedCells": cells }
                }))
            }
            RemoteOp::CreateSpreadsheet { title } => {
                let id = uuid::Uuid::new_v4().simple().to_string();
                insert_spreadsheet(state, id.clone(), title.clone());
                Ok(json!({
                    "spreadsheetId": id,
                    "properties": { "title": title },
                    "spreadsheetUrl": format!("https://docs.google.com/spreadsheets/d/{}/edit", id)
                }))
            }
            RemoteOp::CreateForm { title, description } => {
                let id = uuid::Uuid::new_v4().simple().to_string();
                state.forms.push(FakeForm {
                    id: id.clone(),
                    title: title.clone(),
                    description: description.clone(),
                });
                Ok(json!({
                    "formId": id,
                    "info": { "title": title, "documentTitle": title },
                    "responderUri": format!("https://docs.google.com/forms/d/e/{}/viewform", id)
                }))
            }
        }
    }
}

#[async_trait]
impl RemoteBackend for FakeWorkspace {
    async fn execute(&self, credential: &Credential, op: &RemoteOp) -> Result<Value, RemoteError> {
        let mut state = self.state.lock();
        state.ops.push(op.clone());
        state.tokens.push(credential.access_token.clone());
        Self::apply(&mut state, op)
    }
}

fn insert_spreadsheet(state: &mut State, id: String, title: String) {
    let mut sheets = HashMap::new();
    sheets.insert(DEFAULT_SHEET.to_string(), Vec::new());
    state.order.push(id.clone());
    state.spreadsheets.insert(id, Spreadsheet { title, sheets });
}

fn not_found() -> RemoteError {
    RemoteError::Api {
        service: "Sheets",
        status: 404,
        message: "Requested entity was not found.".to_string(),
    }
}

fn bad_range(range: &str) -> RemoteError {
    RemoteError::Api {
        service: "Sheets",
        status: 400,
        message: format!("Unable to parse range: {}", range),
    }
}

fn sheet_mut<'a>(
    state: &'a mut State,
    spreadsheet_id: &str,
    sheet: &str,
) -> Result<&'a mut Vec<Vec<Value>>, RemoteError> {
    let book = state
        .spreadsheets
        .get_mut(spreadsheet_id)
        .ok_or_else(not_found)?;
    book.sheets
        .get_mut(sheet)
        .ok_or_else(|| bad_range(sheet))
}

fn parse_range(range: &str) -> Result<(String, Bounds), RemoteError> {
    let (sheet, cells) = match range.split_once('!') {
        Some((sheet, cells)) => (sheet.trim_matches('\''), Some(cells)),
        // A bare name like "Sheet1" is a sheet; "A1:B2" is a block on the first sheet.
        None if range.contains(':') => (DEFAULT_SHEET, Some(range)),
        None => (range, None),
    };

    let whole = Bounds {
        row: 0,
        col: 0,
        end_row: None,
        end_col: None,
    };
    let bounds = match cells {
        None => whole,
        Some(cells) => {
            let (start, end) = match cells.split_once(':') {
                Some((start, end)) => (start, Some(end)),
                None => (cells, None),
            };
            let (col, row) = parse_cell(start).ok_or_else(|| bad_range(range))?;
            let (end_col, end_row) = match end {
                Some(end) => {
                    let (c, r) = parse_cell(end).ok_or_else(|| bad_range(range))?;
                    (Some(c), Some(r))
                }
                None => (Some(col), Some(row)),
            };
            Bounds {
                row,
                col,
                end_row,
                end_col,
            }
        }
    };
    Ok((sheet.to_string(), bounds))
}

/// `B3` → (1, 2).
fn parse_cell(cell: &str) -> Option<(usize, usize)> {
    let letters: String = cell.chars().take_while(|c| c.is_ascii_alphabetic()).collect();
    let digits = &cell[letters.len()..];
    if letters.is_empty() || digits.is_empty() {
        return None;
    }
    let col = letters
        .to_ascii_uppercase()
        .bytes()
        .fold(0usize, |acc, b| acc * 26 + (b - b'A' + 1) as usize);
    let row: usize = digits.parse().ok()?;
    if row == 0 {
        return None;
    }
    Some((col - 1, row - 1))
}

fn is_blank(cell: &Value) -> bool {
    match cell {
        Value::Null => true,
        Value::String(text) => text.is_empty(),
        _ => false,
    }
}

fn last_used_row(grid: &[Vec<Value>]) -> Option<usize> {
    grid.iter()
        .rposition(|row| row.iter().any(|cell| !is_blank(cell)))
}

fn write_grid(grid: &mut Vec<Vec<Value>>, row: usize, col: usize, values: &[Vec<Value>]) -> usize {
    let mut cells = 0;
    for (r, source) in values.iter().enumerate() {
        let target_row = row + r;
        if grid.len() <= target_row {
            grid.resize(target_row + 1, Vec::new());
        }
        let target = &mut grid[target_row];
        for (c, cell) in source.iter().enumerate() {
            let target_col = col + c;
            if target.len() <= target_col {
                target.resize(target_col + 1, Value::Null);
            }
            target[target_col] = cell.clone();
            cells += 1;
        }
    }
    cells
}

/// Sheets drops trailing blank cells and rows; interior blanks read as "".
fn read_grid(grid: &[Vec<Value>], bounds: Bounds) -> Vec<Vec<Value>> {
    let end_row = bounds
        .end_row
        .map_or(grid.len(), |end| (end + 1).min(grid.len()));
    let mut rows: Vec<Vec<Value>> = (bounds.row..end_row)
        .map(|r| {
            let row = &grid[r];
            let end_col = bounds
                .end_col
                .map_or(row.len(), |end| (end + 1).min(row.len()));
            let mut cells: Vec<Value> = if bounds.col < end_col {
                row[bounds.col..end_col].to_vec()
            } else {
                Vec::new()
            };
            while cells.last().map_or(false, is_blank) {
                cells.pop();
            }
            cells
                .into_iter()
                .map(|cell| if cell.is_null() { json!("") } else { cell })
                .collect()
        })
        .collect();
    while rows.last().map_or(false, |row| row.is_empty()) {
        rows.pop();
    }
    rows
}

// =============================================================================
// Wiring helpers
// =============================================================================

pub fn registry_with(
    credentials: Arc<dyn CredentialSource>,
    workspace: Arc<FakeWorkspace>,
) -> ToolRegistry {
    ToolRegistry::new(credentials, workspace)
}

pub fn fake_service() -> (McpService, Arc<FakeWorkspace>) {
    let workspace = Arc::new(FakeWorkspace::new());
    let credentials = Arc::new(StaticCredentials::new(credential("ya29.static", 3600)));
    let service = McpService::new(ToolRegistry::new(credentials, workspace.clone()));
    (service, workspace)
}
