//! Remote operation descriptors and the HTTP request each one maps to.

use reqwest::{Method, Url};
use serde_json::{json, Value};

use crate::error::RemoteError;

pub const SPREADSHEET_MIME_TYPE: &str = "application/vnd.google-apps.spreadsheet";
const DRIVE_LIST_FIELDS: &str = "files(id, name, webViewLink)";

/// One of the three capability surfaces a credential is scoped to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Service {
    Sheets,
    Forms,
    Drive,
}

impl Service {
    pub fn label(self) -> &'static str {
        match self {
            Service::Sheets => "Sheets",
            Service::Forms => "Forms",
            Service::Drive => "Drive",
        }
    }
}

/// Base URLs of the REST surfaces.
#[derive(Debug, Clone)]
pub struct Endpoints {
    pub sheets: String,
    pub forms: String,
    pub drive: String,
}

impl Default for Endpoints {
    fn default() -> Self {
        Self {
            sheets: "https://sheets.googleapis.com/v4".to_string(),
            forms: "https://forms.googleapis.com/v1".to_string(),
            drive: "https://www.googleapis.com/drive/v3".to_string(),
        }
    }
}

impl Endpoints {
    fn base(&self, service: Service) -> &str {
        match service {
            Service::Sheets => &self.sheets,
            Service::Forms => &self.forms,
            Service::Drive => &self.drive,
        }
    }

    /// `base/segment/segment?query`, each segment percent-encoded.
    pub fn url(
        &self,
        service: Service,
        segments: &[&str],
        query: &[(&str, &str)],
    ) -> Result<Url, RemoteError> {
        let invalid = |reason: String| RemoteError::Decode {
            service: service.label(),
            reason,
        };

        let mut url = Url::parse(self.base(service))
            .map_err(|err| invalid(format!("invalid base URL: {}", err)))?;
        url.path_segments_mut()
            .map_err(|_| invalid("base URL cannot have path segments".to_string()))?
            .pop_if_empty()
            .extend(segments);
        if !query.is_empty() {
            url.query_pairs_mut().extend_pairs(query);
        }
        Ok(url)
    }
}

/// A fully described HTTP exchange.
#[derive(Debug, Clone)]
pub struct RequestSpec {
    pub method: Method,
    pub url: Url,
    pub body: Option<Value>,
}

/// Every remote call a tool can make.
#[derive(Debug, Clone, PartialEq)]
pub enum RemoteOp {
    ListSpreadsheets {
        page_size: u32,
    },
    GetValues {
        spreadsheet_id: String,
        range: String,
    },
    UpdateValues {
        spreadsheet_id: String,
        range: String,
        values: Vec<Vec<Value>>,
    },
    AppendValues {
        spreadsheet_id: String,
        range: String,
        values: Vec<Vec<Value>>,
    },
    CreateSpreadsheet {
        title: String,
    },
    CreateForm {
        title: String,
        description: Option<String>,
    },
}

impl RemoteOp {
    pub fn service(&self) -> Service {
        match self {
            RemoteOp::ListSpreadsheets { .. } => Service::Drive,
            RemoteOp::CreateForm { .. } => Service::Forms,
            _ => Service::Sheets,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            RemoteOp::ListSpreadsheets { .. } => "files.list",
            RemoteOp::GetValues { .. } => "spreadsheets.values.get",
            RemoteOp::UpdateValues { .. } => "spreadsheets.values.update",
            RemoteOp::AppendValues { .. } => "spreadsheets.values.append",
            RemoteOp::CreateSpreadsheet { .. } => "spreadsheets.create",
            RemoteOp::CreateForm { .. } => "forms.create",
        }
    }

    pub fn request(&self, endpoints: &Endpoints) -> Result<RequestSpec, RemoteError> {
        let service = self.service();
        let spec = match self {
            RemoteOp::ListSpreadsheets { page_size } => {
                let query = format!("mimeType='{}'", SPREADSHEET_MIME_TYPE);
                let page_size = page_size.to_string();
                RequestSpec {
                    method: Method::GET,
                    url: endpoints.url(
                        service,
                        &["files"],
                        &[
                            ("q", query.as_str()),
                            ("pageSize", page_size.as_str()),
                            ("fields", DRIVE_LIST_FIELDS),
                        ],
                    )?,
                    body: None,
                }
            }
            RemoteOp::GetValues {
                spreadsheet_id,
                range,
            } => RequestSpec {
                method: Method::GET,
                url: endpoints.url(service, &["spreadsheets", spreadsheet_id, "values", range], &[])?,
                body: None,
            },
            RemoteOp::UpdateValues {
                spreadsheet_id,
                range,
                values,
            } => RequestSpec {
                method: Method::PUT,
                url: endpoints.url(
                    service,
                    &["spreadsheets", spreadsheet_id, "values", range],
                    &[("valueInputOption", "RAW")],
                )?,
                body: Some(json!({ "values": values })),
            },
            RemoteOp::AppendValues {
                spreadsheet_id,
                range,
                values,
            } => {
                let segment = format!("{}:append", range);
                RequestSpec {
                    method: Method::POST,
                    url: endpoints.url(
                        service,
                        &["spreadsheets", spreadsheet_id, "values", &segment],
                        &[("valueInputOption", "RAW")],
                    )?,
                    body: Some(json!({ "values": values })),
                }
            }
            RemoteOp::CreateSpreadsheet { title } => RequestSpec {
                method: Method::POST,
                url: endpoints.url(service, &["spreadsheets"], &[])?,
                body: Some(json!({ "properties": { "title": title } })),
            },
            RemoteOp::CreateForm { title, .. } => RequestSpec {
                method: Method::POST,
                url: endpoints.url(service, &["forms"], &[])?,
                // forms.create only accepts the title fields.
                body: Some(json!({ "info": { "title": title, "documentTitle": title } })),
            },
        };
        Ok(spec)
    }
}

/// Follow-up `forms.batchUpdate` that sets a form's description.
pub fn form_description_request(
    endpoints: &Endpoints,
    form_id: &str,
    description: &str,
) -> Result<RequestSpec, RemoteError> {
    let segment = format!("{}:batchUpdate", form_id);
    Ok(RequestSpec {
        method: Method::POST,
        url: endpoints.url(Service::Forms, &["forms", &segment], &[])?,
        body: Some(json!({
            "requests": [{
                "updateFormInfo": {
                    "info": { "description": description },
                    "updateMask": "description"
                }
            }]
        })),
    })
}
