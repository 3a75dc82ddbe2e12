//! Suite configuration
//!
//! Target environment values (server endpoint, device, app binary,
//! credentials, site) are supplied externally: defaults, then an optional
//! YAML file, then `ASSETSCOPE_*` environment variables.

use crate::result::{SuiteError, SuiteResult};
use crate::runner::ResetPolicy;
use crate::wait::WaitOptions;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Prefix for every environment variable the suite reads
pub const ENV_PREFIX: &str = "ASSETSCOPE_";

/// Default bound on scroll gestures when searching for a section
pub const DEFAULT_MAX_SCROLL_ATTEMPTS: u32 = 6;

/// Capabilities for creating an automation session
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Automation server endpoint, e.g. `http://127.0.0.1:4723`
    pub server_url: String,
    /// Platform name capability
    pub platform_name: String,
    /// Platform version capability
    pub platform_version: Option<String>,
    /// Device name capability
    pub device_name: Option<String>,
    /// Device UDID
    pub udid: Option<String>,
    /// Path to the application binary
    pub app_path: Option<PathBuf>,
    /// Bundle identifier of an installed application
    pub bundle_id: Option<String>,
    /// Automation backend
    pub automation_name: String,
    /// Seconds the server waits for a command before ending the session
    pub new_command_timeout_s: u64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            server_url: "http://127.0.0.1:4723".to_string(),
            platform_name: "iOS".to_string(),
            platform_version: None,
            device_name: None,
            udid: None,
            app_path: None,
            bundle_id: None,
            automation_name: "XCUITest".to_string(),
            new_command_timeout_s: 300,
        }
    }
}

impl SessionConfig {
    /// Create new config with defaults
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the server URL
    #[must_use]
    pub fn with_server_url(mut self, url: impl Into<String>) -> Self {
        self.server_url = url.into();
        self
    }

    /// Set the device UDID
    #[must_use]
    pub fn with_udid(mut self, udid: impl Into<String>) -> Self {
        self.udid = Some(udid.into());
        self
    }

    /// Set the bundle identifier
    #[must_use]
    pub fn with_bundle_id(mut self, bundle_id: impl Into<String>) -> Self {
        self.bundle_id = Some(bundle_id.into());
        self
    }

    /// Set the application binary path
    #[must_use]
    pub fn with_app_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.app_path = Some(path.into());
        self
    }

    /// W3C `alwaysMatch` capabilities for session creation
    #[must_use]
    pub fn capabilities(&self) -> serde_json::Value {
        let mut caps = serde_json::Map::new();
        let _ = caps.insert("platformName".into(), self.platform_name.clone().into());
        let _ = caps.insert(
            "appium:automationName".into(),
            self.automation_name.clone().into(),
        );
        let _ = caps.insert(
            "appium:newCommandTimeout".into(),
            self.new_command_timeout_s.into(),
        );
        let _ = caps.insert("appium:noReset".into(), true.into());
        if let Some(v) = &self.platform_version {
            let _ = caps.insert("appium:platformVersion".into(), v.clone().into());
        }
        if let Some(v) = &self.device_name {
            let _ = caps.insert("appium:deviceName".into(), v.clone().into());
        }
        if let Some(v) = &self.udid {
            let _ = caps.insert("appium:udid".into(), v.clone().into());
        }
        if let Some(v) = &self.app_path {
            let _ = caps.insert("appium:app".into(), v.display().to_string().into());
        }
        if let Some(v) = &self.bundle_id {
            let _ = caps.insert("appium:bundleId".into(), v.clone().into());
        }
        serde_json::Value::Object(caps)
    }
}

/// Login credentials and site selection
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Credentials {
    /// User name
    pub username: String,
    /// Password (never serialized back out)
    #[serde(skip_serializing)]
    pub password: String,
    /// Site to select after login
    pub site: Option<String>,
}

impl Credentials {
    /// Create credentials
    #[must_use]
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
            site: None,
        }
    }

    /// Set the site
    #[must_use]
    pub fn with_site(mut self, site: impl Into<String>) -> Self {
        self.site = Some(site.into());
        self
    }

    /// Whether both user name and password are set
    #[must_use]
    pub fn is_complete(&self) -> bool {
        !self.username.is_empty() && !self.password.is_empty()
    }
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"********")
            .field("site", &self.site)
            .finish()
    }
}

/// Complete configuration for a suite run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SuiteConfig {
    /// Session capabilities
    pub session: SessionConfig,
    /// Login credentials
    pub credentials: Credentials,
    /// Default wait policy
    pub wait: WaitOptions,
    /// Default reset policy between scenarios
    pub reset_policy: ResetPolicy,
    /// Bound on scroll gestures per `scroll_to`
    pub max_scroll_attempts: u32,
    /// Directory for reports and screenshots
    pub output_dir: PathBuf,
    /// Capture a screenshot at every checkpoint, not only on failure
    pub screenshot_checkpoints: bool,
}

impl Default for SuiteConfig {
    fn default() -> Self {
        Self {
            session: SessionConfig::default(),
            credentials: Credentials::default(),
            wait: WaitOptions::default(),
            reset_policy: ResetPolicy::default(),
            max_scroll_attempts: DEFAULT_MAX_SCROLL_ATTEMPTS,
            output_dir: PathBuf::from("target/assetscope"),
            screenshot_checkpoints: true,
        }
    }
}

impl SuiteConfig {
    /// Create new default configuration
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the wait policy
    #[must_use]
    pub const fn with_wait(mut self, wait: WaitOptions) -> Self {
        self.wait = wait;
        self
    }

    /// Set the reset policy
    #[must_use]
    pub const fn with_reset_policy(mut self, policy: ResetPolicy) -> Self {
        self.reset_policy = policy;
        self
    }

    /// Set the output directory
    #[must_use]
    pub fn with_output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.output_dir = dir.into();
        self
    }

    /// Set credentials
    #[must_use]
    pub fn with_credentials(mut self, credentials: Credentials) -> Self {
        self.credentials = credentials;
        self
    }

    /// Load defaults, then the optional YAML file, then the process environment.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed, or an
    /// environment value is malformed.
    pub fn load(path: Option<&Path>) -> SuiteResult<Self> {
        let mut config = match path {
            Some(p) => Self::from_yaml_file(p)?,
            None => Self::default(),
        };
        config.apply_env(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    /// Parse a YAML configuration file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn from_yaml_file(path: &Path) -> SuiteResult<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_yaml_str(&text)
    }

    /// Parse YAML configuration text.
    ///
    /// # Errors
    ///
    /// Returns an error if the text is not valid configuration YAML.
    pub fn from_yaml_str(text: &str) -> SuiteResult<Self> {
        Ok(serde_yaml_ng::from_str(text)?)
    }

    /// Override fields from `ASSETSCOPE_*` variables supplied by `lookup`.
    ///
    /// # Errors
    ///
    /// Returns [`SuiteError::Config`] for values that fail to parse.
    pub fn apply_env<F>(&mut self, lookup: F) -> SuiteResult<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| lookup(&format!("{ENV_PREFIX}{name}")).filter(|v| !v.is_empty());

        if let Some(v) = get("SERVER_URL") {
            self.session.server_url = v;
        }
        if let Some(v) = get("PLATFORM_VERSION") {
            self.session.platform_version = Some(v);
        }
        if let Some(v) = get("DEVICE_NAME") {
            self.session.device_name = Some(v);
        }
        if let Some(v) = get("UDID") {
            self.session.udid = Some(v);
        }
        if let Some(v) = get("APP_PATH") {
            self.session.app_path = Some(PathBuf::from(v));
        }
        if let Some(v) = get("BUNDLE_ID") {
            self.session.bundle_id = Some(v);
        }
        if let Some(v) = get("USERNAME") {
            self.credentials.username = v;
        }
        if let Some(v) = get("PASSWORD") {
            self.credentials.password = v;
        }
        if let Some(v) = get("SITE") {
            self.credentials.site = Some(v);
        }
        if let Some(v) = get("OUTPUT_DIR") {
            self.output_dir = PathBuf::from(v);
        }
        if let Some(v) = get("WAIT_TIMEOUT_MS") {
            self.wait.timeout_ms = parse_number("WAIT_TIMEOUT_MS", &v)?;
        }
        if let Some(v) = get("POLL_INTERVAL_MS") {
            self.wait.poll_interval_ms = parse_number("POLL_INTERVAL_MS", &v)?;
        }
        if let Some(v) = get("RESET_POLICY") {
            self.reset_policy = v.parse()?;
        }
        Ok(())
    }

    /// Check everything a live device run needs is present.
    ///
    /// # Errors
    ///
    /// Returns [`SuiteError::Config`] naming the first missing value.
    pub fn validate_for_device(&self) -> SuiteResult<()> {
        if self.session.server_url.is_empty() {
            return Err(config_error("server URL is not set (ASSETSCOPE_SERVER_URL)"));
        }
        if self.session.udid.is_none() && self.session.device_name.is_none() {
            return Err(config_error(
                "no target device (ASSETSCOPE_UDID or ASSETSCOPE_DEVICE_NAME)",
            ));
        }
        if self.session.app_path.is_none() && self.session.bundle_id.is_none() {
            return Err(config_error(
                "no application (ASSETSCOPE_APP_PATH or ASSETSCOPE_BUNDLE_ID)",
            ));
        }
        if !self.credentials.is_complete() {
            return Err(config_error(
                "credentials incomplete (ASSETSCOPE_USERNAME / ASSETSCOPE_PASSWORD)",
            ));
        }
        if self.wait.timeout_ms == 0 {
            return Err(config_error("wait timeout must be greater than zero"));
        }
        Ok(())
    }

    /// Render as YAML (the password is never included)
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_yaml(&self) -> SuiteResult<String> {
        Ok(serde_yaml_ng::to_string(self)?)
    }
}

fn parse_number(name: &str, value: &str) -> SuiteResult<u64> {
    value
        .trim()
        .parse()
        .map_err(|_| config_error(format!("{ENV_PREFIX}{name} must be a number, got {value:?}")))
}

fn config_error(message: impl Into<String>) -> SuiteError {
    SuiteError::Config {
        message: message.into(),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    mod session_config_tests {
        use super::*;

        #[test]
        fn test_defaults() {
            let config = SessionConfig::default();
            assert_eq!(config.platform_name, "iOS");
            assert_eq!(config.automation_name, "XCUITest");
            assert!(config.udid.is_none());
        }

        #[test]
        fn test_capabilities() {
            let caps = SessionConfig::new()
                .with_udid("0000-TEST")
                .with_bundle_id("com.example.assets")
                .capabilities();
            assert_eq!(caps["platformName"], "iOS");
            assert_eq!(caps["appium:udid"], "0000-TEST");
            assert_eq!(caps["appium:bundleId"], "com.example.assets");
            assert!(caps.get("appium:app").is_none());
        }
    }

    mod credentials_tests {
        use super::*;

        #[test]
        fn test_debug_redacts_password() {
            let creds = Credentials::new("tech", "hunter2").with_site("Plant 4");
            let debug = format!("{creds:?}");
            assert!(debug.contains("tech"));
            assert!(!debug.contains("hunter2"));
        }

        #[test]
        fn test_is_complete() {
            assert!(Credentials::new("a", "b").is_complete());
            assert!(!Credentials::new("a", "").is_complete());
        }
    }

    mod suite_config_tests {
        use super::*;

        #[test]
        fn test_env_overrides() {
            let mut config = SuiteConfig::default();
            config
                .apply_env(env(&[
                    ("ASSETSCOPE_SERVER_URL", "http://grid:4723"),
                    ("ASSETSCOPE_UDID", "ABC"),
                    ("ASSETSCOPE_USERNAME", "tech"),
                    ("ASSETSCOPE_PASSWORD", "pw"),
                    ("ASSETSCOPE_SITE", "North Yard"),
                    ("ASSETSCOPE_WAIT_TIMEOUT_MS", "2500"),
                    ("ASSETSCOPE_RESET_POLICY", "no-reset"),
                ]))
                .unwrap();
            assert_eq!(config.session.server_url, "http://grid:4723");
            assert_eq!(config.session.udid.as_deref(), Some("ABC"));
            assert_eq!(config.credentials.site.as_deref(), Some("North Yard"));
            assert_eq!(config.wait.timeout_ms, 2500);
            assert_eq!(config.reset_policy, ResetPolicy::NoReset);
        }

        #[test]
        fn test_empty_env_values_are_ignored() {
            let mut config = SuiteConfig::default();
            config
                .apply_env(env(&[("ASSETSCOPE_SERVER_URL", "")]))
                .unwrap();
            assert_eq!(config.session.server_url, "http://127.0.0.1:4723");
        }

        #[test]
        fn test_bad_number_is_config_error() {
            let mut config = SuiteConfig::default();
            let err = config
                .apply_env(env(&[("ASSETSCOPE_POLL_INTERVAL_MS", "fast")]))
                .unwrap_err();
            assert!(matches!(err, SuiteError::Config { .. }));
        }

        #[test]
        fn test_yaml_round_trip_omits_password() {
            let config = SuiteConfig::default()
                .with_credentials(Credentials::new("tech", "secret"))
                .with_output_dir("/tmp/out");
            let yaml = config.to_yaml().unwrap();
            assert!(yaml.contains("tech"));
            assert!(!yaml.contains("secret"));

            let parsed = SuiteConfig::from_yaml_str(&yaml).unwrap();
            assert_eq!(parsed.output_dir, PathBuf::from("/tmp/out"));
            assert!(parsed.credentials.password.is_empty());
        }

        #[test]
        fn test_partial_yaml_uses_defaults() {
            let parsed = SuiteConfig::from_yaml_str(
                "session:\n  udid: DEVICE-1\nwait:\n  timeout_ms: 4000\n  poll_interval_ms: 100\n",
            )
            .unwrap();
            assert_eq!(parsed.session.udid.as_deref(), Some("DEVICE-1"));
            assert_eq!(parsed.session.platform_name, "iOS");
            assert_eq!(parsed.wait.timeout_ms, 4000);
            assert_eq!(parsed.max_scroll_attempts, DEFAULT_MAX_SCROLL_ATTEMPTS);
        }

        #[test]
        fn test_validate_for_device() {
            let mut config = SuiteConfig::default();
            assert!(config.validate_for_device().is_err());

            config.session = SessionConfig::new()
                .with_udid("X")
                .with_app_path("/apps/Assets.app");
            config.credentials = Credentials::new("u", "p");
            assert!(config.validate_for_device().is_ok());
        }
    }
}
