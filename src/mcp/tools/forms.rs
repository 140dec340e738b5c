//! Forms tool: creating a new Google Form.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use super::registry::{parse_arguments, to_pretty_json, ToolDescriptor};
use super::validation::{validate_required, ValidationErrors, Validator};
use crate::google::RemoteOp;

pub const CREATE_FORM_TOOL: &str = "create_form";

pub fn create_form_descriptor() -> ToolDescriptor {
    ToolDescriptor {
        name: CREATE_FORM_TOOL.to_string(),
        description: concat!(
            "Create a new Google Form. ",
            "Returns JSON with the form ID and the URL respondents use to fill it in."
        )
        .to_string(),
        input_schema: json!({
            "type": "object",
            "properties": {
                "title": {
                    "type": "string",
                    "description": "The title of the form"
                },
                "description": {
                    "type": "string",
                    "default": "",
                    "description": "Optional description for the form"
                }
            },
            "required": ["title"]
        }),
    }
}

#[derive(Debug, Deserialize)]
pub struct CreateFormRequest {
    pub title: String,
    #[serde(default)]
    pub description: String,
}

impl Validator for CreateFormRequest {
    fn validate(&self) -> Result<(), String> {
        let mut errors = ValidationErrors::new();
        validate_required(&self.title, "title", "Title", &mut errors);
        errors.into_result()
    }
}

pub fn prepare_create_form(arguments: Option<Value>) -> Result<RemoteOp, String> {
    let request: CreateFormRequest = parse_arguments(arguments)?;
    request.validate()?;
    let description = Some(request.description).filter(|text| !text.is_empty());
    Ok(RemoteOp::CreateForm {
        title: request.title,
        description,
    })
}

#[derive(Debug, Serialize)]
struct CreatedForm {
    form_id: Option<String>,
    url: Option<String>,
}

pub fn render_create_form(response: Value) -> Result<String, String> {
    let text_field = |key: &str| response.get(key).and_then(Value::as_str).map(str::to_string);
    to_pretty_json(&CreatedForm {
        form_id: text_field("formId"),
        url: text_field("responderUri"),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_description_is_dropped() {
        let op = prepare_create_form(Some(json!({ "title": "Survey" }))).unwrap();
        assert_eq!(
            op,
            RemoteOp::CreateForm {
                title: "Survey".to_string(),
                description: None
            }
        );
    }

    #[test]
    fn test_description_is_kept() {
        let op = prepare_create_form(Some(json!({ "title": "Survey", "description": "Q3" })))
            .unwrap();
        assert!(matches!(op, RemoteOp::CreateForm { description: Some(ref d), .. } if d == "Q3"));
    }

    #[test]
    fn test_blank_title_is_rejected() {
        assert!(prepare_create_form(Some(json!({ "title": " " }))).is_err());
    }

    #[test]
    fn test_render_uses_responder_uri() {
        let text = render_create_form(json!({
            "formId": "f1",
            "responderUri": "https://docs.google.com/forms/d/e/f1/viewform"
        }))
        .unwrap();
        let parsed: Value = serde_json::from_str(&text).unwrap();
        assert_eq!(
            parsed,
            json!({ "form_id": "f1", "url": "https://docs.google.com/forms/d/e/f1/viewform" })
        );
    }
}
