//! WebDriver client for driving an application through chromedriver
//!
//! Speaks the W3C WebDriver HTTP protocol. Launching the driver process
//! itself is left to the caller; this client only needs its base URL.

use async_trait::async_trait;
use base64::Engine;
use reqwest::Method;
use serde_json::{json, Value};
use std::path::Path;

use crate::common::{Error, Result};

use super::protocol;
use super::types::{ElementRef, WindowHandle};
use super::AutomationSession;

/// Live WebDriver session
pub struct WebDriverSession {
    http: reqwest::Client,
    /// Driver base URL without trailing slash
    base_url: String,
    session_id: String,
}

impl WebDriverSession {
    /// Create a new session on the driver at `base_url`
    ///
    /// `app` is handed to the driver as the Chromium binary, which is how
    /// Electron applications are driven.
    pub async fn connect(base_url: &str, app: Option<&Path>, app_args: &[String]) -> Result<Self> {
        let http = reqwest::Client::builder()
            .build()
            .map_err(|e| Error::SessionFailure(format!("Failed to build HTTP client: {e}")))?;
        let base_url = base_url.trim_end_matches('/').to_string();

        tracing::info!(url = %base_url, app = ?app, "Creating WebDriver session");

        let body = protocol::new_session_body(app, app_args);
        let value = send(&http, Method::POST, &format!("{base_url}/session"), Some(body)).await?;
        let session_id = protocol::session_id_from_value(&value)?;

        tracing::debug!(session_id = %session_id, "WebDriver session created");

        Ok(Self {
            http,
            base_url,
            session_id,
        })
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    /// Issue a command scoped to this session
    async fn command(&self, method: Method, path: &str, body: Option<Value>) -> Result<Value> {
        let url = format!("{}/session/{}{}", self.base_url, self.session_id, path);
        send(&self.http, method, &url, body).await
    }

    async fn element_command(
        &self,
        method: Method,
        element: &ElementRef,
        suffix: &str,
        body: Option<Value>,
    ) -> Result<Value> {
        self.command(method, &format!("/element/{}{}", element, suffix), body)
            .await
    }
}

async fn send(
    http: &reqwest::Client,
    method: Method,
    url: &str,
    body: Option<Value>,
) -> Result<Value> {
    tracing::trace!(%method, url, body = ?body, "WebDriver >>>");

    let mut request = http.request(method, url);
    if let Some(body) = body {
        request = request.json(&body);
    }

    let response = request
        .send()
        .await
        .map_err(|e| Error::SessionFailure(format!("WebDriver request failed: {e}")))?;
    let status = response.status().as_u16();
    let bytes = response
        .bytes()
        .await
        .map_err(|e| Error::SessionFailure(format!("WebDriver response failed: {e}")))?;

    tracing::trace!(status, len = bytes.len(), "WebDriver <<<");

    protocol::decode_response(status, &bytes)
}

#[async_trait]
impl AutomationSession for WebDriverSession {
    async fn current_window(&mut self) -> Result<WindowHandle> {
        let value = self.command(Method::GET, "/window", None).await?;
        protocol::handle_from_value(&value)
    }

    async fn window_handles(&mut self) -> Result<Vec<WindowHandle>> {
        let value = self.command(Method::GET, "/window/handles", None).await?;
        protocol::handles_from_value(&value)
    }

    async fn switch_to_window(&mut self, handle: &WindowHandle) -> Result<()> {
        self.command(
            Method::POST,
            "/window",
            Some(json!({ "handle": handle.as_str() })),
        )
        .await
        .map_err(|e| match e {
            Error::StaleHandle(_) => Error::StaleHandle(handle.clone()),
            other => other,
        })?;
        Ok(())
    }

    async fn close_window(&mut self) -> Result<Vec<WindowHandle>> {
        let value = self.command(Method::DELETE, "/window", None).await?;
        protocol::handles_from_value(&value)
    }

    async fn find_elements(&mut self, selector: &str) -> Result<Vec<ElementRef>> {
        let value = self
            .command(
                Method::POST,
                "/elements",
                Some(json!({ "using": "css selector", "value": selector })),
            )
            .await
            .map_err(|e| match e {
                Error::InvalidSelector { message, .. } => Error::InvalidSelector {
                    selector: selector.to_string(),
                    message,
                },
                other => other,
            })?;
        protocol::elements_from_value(&value)
    }

    async fn click(&mut self, element: &ElementRef) -> Result<()> {
        self.element_command(Method::POST, element, "/click", Some(json!({})))
            .await?;
        Ok(())
    }

    async fn clear(&mut self, element: &ElementRef) -> Result<()> {
        self.element_command(Method::POST, element, "/clear", Some(json!({})))
            .await?;
        Ok(())
    }

    async fn send_keys(&mut self, element: &ElementRef, text: &str) -> Result<()> {
        self.element_command(
            Method::POST,
            element,
            "/value",
            Some(json!({ "text": text })),
        )
        .await?;
        Ok(())
    }

    async fn text(&mut self, element: &ElementRef) -> Result<String> {
        let value = self
            .element_command(Method::GET, element, "/text", None)
            .await?;
        Ok(value.as_str().unwrap_or_default().to_string())
    }

    async fn is_displayed(&mut self, element: &ElementRef) -> Result<bool> {
        let value = self
            .element_command(Method::GET, element, "/displayed", None)
            .await?;
        Ok(value.as_bool().unwrap_or(false))
    }

    async fn screenshot(&mut self) -> Result<Vec<u8>> {
        let value = self.command(Method::GET, "/screenshot", None).await?;
        let encoded = value
            .as_str()
            .ok_or_else(|| Error::SessionFailure("screenshot response is not a string".into()))?;
        base64::engine::general_purpose::STANDARD
            .decode(encoded)
            .map_err(|e| Error::SessionFailure(format!("Invalid screenshot payload: {e}")))
    }

    async fn quit(&mut self) -> Result<()> {
        self.command(Method::DELETE, "", None).await?;
        tracing::debug!(session_id = %self.session_id, "WebDriver session closed");
        Ok(())
    }
}
