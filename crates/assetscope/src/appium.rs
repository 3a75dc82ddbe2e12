//! Appium client over the W3C WebDriver protocol.
//!
//! Blocking HTTP, one request per command. Element snapshots are filled by
//! reading the attributes screen objects consult (type, name, label, value,
//! enabled, visible and rect) right after each `elements` query.

use crate::config::SessionConfig;
use crate::driver::{
    BoundingBox, ElementHandle, Role, Screenshot, Session, SessionProvider, SwipeDirection,
};
use crate::locator::LocatorSpec;
use crate::result::{SuiteError, SuiteResult};
use reqwest::blocking::Client;
use reqwest::Method;
use serde_json::{json, Value};
use std::time::Duration;
use tracing::{debug, info, warn};

/// W3C key under which element references are returned
const ELEMENT_KEY: &str = "element-6066-11e4-a52f-4d65822e906c";

/// Per-request HTTP timeout
const HTTP_TIMEOUT: Duration = Duration::from_secs(60);

/// A live Appium session.
#[derive(Debug)]
pub struct AppiumSession {
    client: Client,
    base: String,
    session_id: String,
    bundle_id: Option<String>,
    window: BoundingBox,
}

impl AppiumSession {
    /// Create a session on the configured server.
    ///
    /// # Errors
    ///
    /// Returns [`SuiteError::SessionUnavailable`] if the server is
    /// unreachable or refuses the capabilities.
    pub fn create(config: &SessionConfig) -> SuiteResult<Self> {
        let client = Client::builder()
            .timeout(HTTP_TIMEOUT)
            .build()
            .map_err(|e| unavailable(format!("failed to build HTTP client: {e}")))?;
        let base = config.server_url.trim_end_matches('/').to_string();

        let body = json!({ "capabilities": { "alwaysMatch": config.capabilities() } });
        let value = send(&client, Method::POST, &format!("{base}/session"), Some(&body))
            .map_err(|e| unavailable(format!("session creation failed: {e}")))?;
        let session_id = value
            .get("sessionId")
            .and_then(Value::as_str)
            .ok_or_else(|| unavailable("server returned no sessionId"))?
            .to_string();
        info!(%session_id, server = %base, "appium session created");

        let mut session = Self {
            client,
            base,
            session_id,
            bundle_id: config.bundle_id.clone(),
            window: BoundingBox::new(0.0, 0.0, 390.0, 844.0),
        };
        match session.command(Method::GET, "/window/rect", None) {
            Ok(rect) => session.window = parse_rect(&rect)?,
            Err(e) => warn!(error = %e, "window size unavailable, using default"),
        }
        Ok(session)
    }

    /// End the session on the server
    ///
    /// # Errors
    ///
    /// Propagates transport errors.
    pub fn delete(&self) -> SuiteResult<()> {
        let url = format!("{}/session/{}", self.base, self.session_id);
        send(&self.client, Method::DELETE, &url, None).map(|_| ())
    }

    fn command(&self, method: Method, path: &str, body: Option<&Value>) -> SuiteResult<Value> {
        let url = format!("{}/session/{}{path}", self.base, self.session_id);
        send(&self.client, method, &url, body)
    }

    fn element_command(
        &self,
        method: Method,
        element: &ElementHandle,
        path: &str,
        body: Option<&Value>,
    ) -> SuiteResult<Value> {
        self.command(method, &format!("/element/{}{path}", element.id), body)
    }

    fn read_attribute(&self, id: &str, name: &str) -> SuiteResult<Option<String>> {
        let value = self.command(Method::GET, &format!("/element/{id}/attribute/{name}"), None)?;
        Ok(match value {
            Value::Null => None,
            Value::String(s) => Some(s),
            other => Some(other.to_string()),
        })
    }

    fn snapshot(&self, id: String) -> SuiteResult<ElementHandle> {
        let role = self
            .read_attribute(&id, "type")?
            .map_or(Role::Other, |t| Role::from_xcui_type(&t));
        let flag = |name: &str| -> SuiteResult<bool> {
            Ok(self.read_attribute(&id, name)?.as_deref() == Some("true"))
        };
        let enabled = flag("enabled")?;
        let visible = flag("visible")?;
        let rect = self.command(Method::GET, &format!("/element/{id}/rect"), None)?;

        let mut element = ElementHandle::new(id.clone(), role)
            .with_enabled(enabled)
            .with_visible(visible);
        element.name = self.read_attribute(&id, "name")?;
        element.label = self.read_attribute(&id, "label")?;
        element.value = self.read_attribute(&id, "value")?;
        element.rect = Some(parse_rect(&rect)?);
        Ok(element)
    }
}

impl Drop for AppiumSession {
    fn drop(&mut self) {
        if let Err(e) = self.delete() {
            warn!(session_id = %self.session_id, error = %e, "failed to end appium session");
        }
    }
}

impl Session for AppiumSession {
    fn session_id(&self) -> &str {
        &self.session_id
    }

    fn find_elements(&self, spec: &LocatorSpec) -> SuiteResult<Vec<ElementHandle>> {
        let (using, value) = spec.to_query();
        let found = self.command(
            Method::POST,
            "/elements",
            Some(&json!({ "using": using, "value": value })),
        )?;
        let ids: Vec<String> = found
            .as_array()
            .map(|refs| {
                refs.iter()
                    .filter_map(|r| r.get(ELEMENT_KEY).and_then(Value::as_str))
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default();
        debug!(locator = %spec, matches = ids.len(), "elements query");
        ids.into_iter().map(|id| self.snapshot(id)).collect()
    }

    fn tap(&self, element: &ElementHandle) -> SuiteResult<()> {
        self.element_command(Method::POST, element, "/click", Some(&json!({})))
            .map(|_| ())
    }

    fn type_text(&self, element: &ElementHandle, text: &str) -> SuiteResult<()> {
        self.element_command(Method::POST, element, "/value", Some(&json!({ "text": text })))
            .map(|_| ())
    }

    fn clear(&self, element: &ElementHandle) -> SuiteResult<()> {
        self.element_command(Method::POST, element, "/clear", Some(&json!({})))
            .map(|_| ())
    }

    fn attribute(&self, element: &ElementHandle, name: &str) -> SuiteResult<Option<String>> {
        self.read_attribute(&element.id, name)
    }

    fn bounding_box(&self, element: &ElementHandle) -> SuiteResult<BoundingBox> {
        parse_rect(&self.element_command(Method::GET, element, "/rect", None)?)
    }

    fn swipe(&self, direction: SwipeDirection) -> SuiteResult<()> {
        let x = self.window.x + self.window.width / 2.0;
        let (from, to) = (
            self.window.y + self.window.height * 0.7,
            self.window.y + self.window.height * 0.3,
        );
        let (start, end) = match direction {
            SwipeDirection::Up => (from, to),
            SwipeDirection::Down => (to, from),
        };
        let actions = json!({
            "actions": [{
                "type": "pointer",
                "id": "finger1",
                "parameters": { "pointerType": "touch" },
                "actions": [
                    { "type": "pointerMove", "duration": 0, "x": x, "y": start },
                    { "type": "pointerDown", "button": 0 },
                    { "type": "pause", "duration": 100 },
                    { "type": "pointerMove", "duration": 400, "x": x, "y": end },
                    { "type": "pointerUp", "button": 0 }
                ]
            }]
        });
        self.command(Method::POST, "/actions", Some(&actions))?;
        self.command(Method::DELETE, "/actions", None).map(|_| ())
    }

    fn hide_keyboard(&self) -> SuiteResult<()> {
        match self.command(Method::POST, "/appium/device/hide_keyboard", Some(&json!({}))) {
            Ok(_) => Ok(()),
            Err(SuiteError::Protocol { message }) => {
                debug!(%message, "no keyboard to hide");
                Ok(())
            }
            Err(e) => Err(e),
        }
    }

    fn screenshot(&self) -> SuiteResult<Screenshot> {
        let value = self.command(Method::GET, "/screenshot", None)?;
        let encoded = value
            .as_str()
            .ok_or_else(|| SuiteError::protocol("screenshot payload is not a string"))?;
        Screenshot::from_base64(encoded)
    }

    fn reset_app(&self) -> SuiteResult<()> {
        let bundle_id = self.bundle_id.as_deref().ok_or_else(|| SuiteError::Config {
            message: "reset needs a bundle_id".to_string(),
        })?;
        info!(bundle_id, "relaunching app");
        let body = json!({ "bundleId": bundle_id });
        self.command(Method::POST, "/appium/device/terminate_app", Some(&body))?;
        self.command(Method::POST, "/appium/device/activate_app", Some(&body))
            .map(|_| ())
    }
}

/// Creates [`AppiumSession`]s.
#[derive(Debug, Clone, Copy, Default)]
pub struct AppiumProvider;

impl SessionProvider for AppiumProvider {
    fn acquire(&self, config: &SessionConfig) -> SuiteResult<Box<dyn Session>> {
        Ok(Box::new(AppiumSession::create(config)?))
    }

    fn release(&self, session: Box<dyn Session>) -> SuiteResult<()> {
        debug!(session_id = session.session_id(), "releasing appium session");
        drop(session);
        Ok(())
    }
}

fn unavailable(message: impl Into<String>) -> SuiteError {
    SuiteError::SessionUnavailable {
        message: message.into(),
    }
}

/// Perform one request and unwrap the W3C `value` envelope
fn send(client: &Client, method: Method, url: &str, body: Option<&Value>) -> SuiteResult<Value> {
    let mut request = client.request(method.clone(), url);
    if let Some(body) = body {
        request = request.json(body);
    }
    let response = request.send().map_err(|e| {
        if e.is_connect() || e.is_timeout() {
            unavailable(format!("{method} {url}: {e}"))
        } else {
            SuiteError::protocol(format!("{method} {url}: {e}"))
        }
    })?;
    let status = response.status();
    let payload: Value = response
        .json()
        .map_err(|e| SuiteError::protocol(format!("{method} {url}: unreadable response: {e}")))?;
    let value = payload.get("value").cloned().unwrap_or(Value::Null);

    if status.is_success() {
        return Ok(value);
    }
    let error = value.get("error").and_then(Value::as_str).unwrap_or("unknown error");
    let message = value.get("message").and_then(Value::as_str).unwrap_or_default();
    if error == "invalid session id" {
        return Err(unavailable(format!("{error}: {message}")));
    }
    Err(SuiteError::protocol(format!("{method} {url} -> {status}: {error}: {message}")))
}

fn parse_rect(value: &Value) -> SuiteResult<BoundingBox> {
    #[allow(clippy::cast_possible_truncation)]
    let field = |name: &str| -> SuiteResult<f32> {
        value
            .get(name)
            .and_then(Value::as_f64)
            .map(|v| v as f32)
            .ok_or_else(|| SuiteError::protocol(format!("rect is missing '{name}'")))
    };
    Ok(BoundingBox::new(field("x")?, field("y")?, field("width")?, field("height")?))
}
