//! W3C WebDriver wire format
//!
//! Every response body is `{"value": ...}`; failures carry
//! `{"value": {"error": "<code>", "message": "..."}}`.

use serde::Deserialize;
use serde_json::{json, Value};
use std::path::Path;

use crate::common::{Error, Result};

use super::types::{ElementRef, WindowHandle};

/// Key under which W3C drivers return element references
pub const ELEMENT_KEY: &str = "element-6066-11e4-a52f-4a5c07f8ce29";

/// Key used by pre-W3C chromedriver builds
const LEGACY_ELEMENT_KEY: &str = "ELEMENT";

#[derive(Debug, Deserialize)]
struct WireError {
    error: String,
    #[serde(default)]
    message: String,
}

/// Body for `POST /session` launching an Electron/Chromium app binary
pub fn new_session_body(app: Option<&Path>, args: &[String]) -> Value {
    let mut chrome_options = serde_json::Map::new();
    if let Some(app) = app {
        chrome_options.insert("binary".to_string(), json!(app.display().to_string()));
    }
    chrome_options.insert("args".to_string(), json!(args));

    json!({
        "capabilities": {
            "alwaysMatch": {
                "goog:chromeOptions": Value::Object(chrome_options)
            }
        }
    })
}

/// Unwrap the `value` member of a response, turning wire errors into [`Error`]s
pub fn decode_response(status: u16, body: &[u8]) -> Result<Value> {
    let parsed: Value = serde_json::from_slice(body).map_err(|e| {
        Error::SessionFailure(format!("HTTP {status}: unreadable response body: {e}"))
    })?;

    let value = parsed.get("value").cloned().unwrap_or(Value::Null);

    if let Some(err) = value
        .as_object()
        .filter(|obj| obj.contains_key("error"))
        .and_then(|_| serde_json::from_value::<WireError>(value.clone()).ok())
    {
        return Err(error_from_code(&err.error, &err.message));
    }

    if !(200..300).contains(&status) {
        return Err(Error::SessionFailure(format!(
            "HTTP {status} without an error payload"
        )));
    }

    Ok(value)
}

/// Map a W3C error code onto the runner's taxonomy
pub fn error_from_code(code: &str, message: &str) -> Error {
    match code {
        "no such element" | "stale element reference" => {
            Error::StaleElement(format!("{code}: {message}"))
        }
        "invalid selector" => Error::InvalidSelector {
            selector: String::new(),
            message: message.to_string(),
        },
        "no such window" => Error::StaleHandle(WindowHandle::new("current")),
        "invalid session id" | "session not created" => {
            Error::SessionFailure(format!("{code}: {message}"))
        }
        _ => Error::Driver {
            code: code.to_string(),
            message: message.to_string(),
        },
    }
}

/// Extract the session id from a `POST /session` response value
pub fn session_id_from_value(value: &Value) -> Result<String> {
    value
        .get("sessionId")
        .and_then(Value::as_str)
        .map(str::to_string)
        .ok_or_else(|| Error::SessionFailure("new session response has no sessionId".to_string()))
}

pub fn element_from_value(value: &Value) -> Result<ElementRef> {
    value
        .get(ELEMENT_KEY)
        .or_else(|| value.get(LEGACY_ELEMENT_KEY))
        .and_then(Value::as_str)
        .map(ElementRef::new)
        .ok_or_else(|| Error::SessionFailure(format!("not an element reference: {value}")))
}

pub fn elements_from_value(value: &Value) -> Result<Vec<ElementRef>> {
    value
        .as_array()
        .ok_or_else(|| Error::SessionFailure(format!("expected element list, got {value}")))?
        .iter()
        .map(element_from_value)
        .collect()
}

pub fn handles_from_value(value: &Value) -> Result<Vec<WindowHandle>> {
    Ok(serde_json::from_value(value.clone())?)
}

pub fn handle_from_value(value: &Value) -> Result<WindowHandle> {
    Ok(serde_json::from_value(value.clone())?)
}
