//! Session abstraction over the automation protocol.
//!
//! # Architecture
//!
//! ```text
//! ┌───────────────────────────────────────────────────────────────────────┐
//! │  Session (trait)                                                      │
//! ├───────────────────────────────────────────────────────────────────────┤
//! │  ┌─────────────────────┐  ┌─────────────────────┐                     │
//! │  │  AppiumSession      │  │  SimulatedApp       │                     │
//! │  │  (feature "appium") │  │  (offline runs and  │                     │
//! │  │  W3C over HTTP      │  │   unit tests)       │                     │
//! │  └─────────────────────┘  └─────────────────────┘                     │
//! └───────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Element handles are plain snapshots of what the accessibility tree
//! reported at query time; every action goes back through the session.

use crate::config::SessionConfig;
use crate::locator::LocatorSpec;
use crate::result::{SuiteError, SuiteResult};
use base64::Engine;
use serde::{Deserialize, Serialize};
use std::time::SystemTime;

/// A point in screen coordinates
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    /// X coordinate
    pub x: f32,
    /// Y coordinate
    pub y: f32,
}

impl Point {
    /// Create a new point
    #[must_use]
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

/// Bounding box of an element
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    /// X position
    pub x: f32,
    /// Y position
    pub y: f32,
    /// Width
    pub width: f32,
    /// Height
    pub height: f32,
}

impl BoundingBox {
    /// Create a new bounding box
    #[must_use]
    pub const fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Get the center point
    #[must_use]
    pub fn center(&self) -> Point {
        Point::new(self.x + self.width / 2.0, self.y + self.height / 2.0)
    }

    /// Check if a point is inside this bounding box
    #[must_use]
    pub fn contains(&self, point: &Point) -> bool {
        point.x >= self.x
            && point.x <= self.x + self.width
            && point.y >= self.y
            && point.y <= self.y + self.height
    }
}

/// Accessibility role of an element
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Role {
    /// Tappable button
    Button,
    /// Read-only label
    StaticText,
    /// Single-line text input
    TextField,
    /// Password input
    SecureTextField,
    /// Multi-line text input
    TextView,
    /// Search bar input
    SearchField,
    /// Table/collection cell
    Cell,
    /// Toggle
    Switch,
    /// Picker wheel / dropdown list
    PickerWheel,
    /// Anything else
    Other,
}

impl Role {
    /// XCUITest element type name
    #[must_use]
    pub const fn xcui_type(&self) -> &'static str {
        match self {
            Self::Button => "XCUIElementTypeButton",
            Self::StaticText => "XCUIElementTypeStaticText",
            Self::TextField => "XCUIElementTypeTextField",
            Self::SecureTextField => "XCUIElementTypeSecureTextField",
            Self::TextView => "XCUIElementTypeTextView",
            Self::SearchField => "XCUIElementTypeSearchField",
            Self::Cell => "XCUIElementTypeCell",
            Self::Switch => "XCUIElementTypeSwitch",
            Self::PickerWheel => "XCUIElementTypePickerWheel",
            Self::Other => "XCUIElementTypeOther",
        }
    }

    /// Parse an XCUITest element type name
    #[must_use]
    pub fn from_xcui_type(name: &str) -> Self {
        match name {
            "XCUIElementTypeButton" => Self::Button,
            "XCUIElementTypeStaticText" => Self::StaticText,
            "XCUIElementTypeTextField" => Self::TextField,
            "XCUIElementTypeSecureTextField" => Self::SecureTextField,
            "XCUIElementTypeTextView" => Self::TextView,
            "XCUIElementTypeSearchField" => Self::SearchField,
            "XCUIElementTypeCell" => Self::Cell,
            "XCUIElementTypeSwitch" => Self::Switch,
            "XCUIElementTypePickerWheel" => Self::PickerWheel,
            _ => Self::Other,
        }
    }

    /// Whether text can be typed into elements of this role
    #[must_use]
    pub const fn is_editable(&self) -> bool {
        matches!(
            self,
            Self::TextField | Self::SecureTextField | Self::TextView | Self::SearchField
        )
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.xcui_type())
    }
}

/// Snapshot of one element in the accessibility tree
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ElementHandle {
    /// Protocol-level element identifier
    pub id: String,
    /// Accessibility role
    pub role: Role,
    /// Accessibility identifier/name, if any
    pub name: Option<String>,
    /// Visible label
    pub label: Option<String>,
    /// Current value (text inputs, pickers, switches)
    pub value: Option<String>,
    /// Whether the element accepts interaction
    pub enabled: bool,
    /// Whether the element is on screen
    pub visible: bool,
    /// Bounding box if reported
    pub rect: Option<BoundingBox>,
}

impl ElementHandle {
    /// Create a new visible, enabled element handle
    #[must_use]
    pub fn new(id: impl Into<String>, role: Role) -> Self {
        Self {
            id: id.into(),
            role,
            name: None,
            label: None,
            value: None,
            enabled: true,
            visible: true,
            rect: None,
        }
    }

    /// Set the accessibility identifier
    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Set the label
    #[must_use]
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    /// Set the value
    #[must_use]
    pub fn with_value(mut self, value: impl Into<String>) -> Self {
        self.value = Some(value.into());
        self
    }

    /// Set enabled state
    #[must_use]
    pub const fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    /// Set visibility
    #[must_use]
    pub const fn with_visible(mut self, visible: bool) -> Self {
        self.visible = visible;
        self
    }

    /// Whether the element can be tapped right now
    #[must_use]
    pub const fn is_interactable(&self) -> bool {
        self.visible && self.enabled
    }

    /// Text a user would read: the label, falling back to the value
    #[must_use]
    pub fn display_text(&self) -> Option<&str> {
        self.label
            .as_deref()
            .filter(|l| !l.is_empty())
            .or(self.value.as_deref())
    }
}

/// Direction of a swipe gesture (direction the finger moves)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SwipeDirection {
    /// Finger moves up; content scrolls down
    Up,
    /// Finger moves down; content scrolls up
    Down,
}

/// Screenshot data with metadata
#[derive(Debug, Clone)]
pub struct Screenshot {
    /// Raw PNG data
    pub data: Vec<u8>,
    /// Width in pixels (0 if unknown)
    pub width: u32,
    /// Height in pixels (0 if unknown)
    pub height: u32,
    /// Timestamp when screenshot was taken
    pub timestamp: SystemTime,
}

const PNG_MAGIC: [u8; 8] = [0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A];

impl Screenshot {
    /// Wrap PNG bytes, reading dimensions from the IHDR chunk when present
    #[must_use]
    pub fn from_png(data: Vec<u8>) -> Self {
        let (width, height) = if data.len() >= 24 && data[..8] == PNG_MAGIC {
            (
                u32::from_be_bytes([data[16], data[17], data[18], data[19]]),
                u32::from_be_bytes([data[20], data[21], data[22], data[23]]),
            )
        } else {
            (0, 0)
        };
        Self {
            data,
            width,
            height,
            timestamp: SystemTime::now(),
        }
    }

    /// Decode the base64 PNG a WebDriver server returns for `GET /screenshot`
    ///
    /// # Errors
    ///
    /// Returns [`SuiteError::Protocol`] if the payload is not valid base64.
    pub fn from_base64(encoded: &str) -> SuiteResult<Self> {
        let data = base64::engine::general_purpose::STANDARD
            .decode(encoded.trim())
            .map_err(|e| SuiteError::protocol(format!("screenshot is not valid base64: {e}")))?;
        Ok(Self::from_png(data))
    }

    /// PNG bytes as standard base64
    #[must_use]
    pub fn to_base64(&self) -> String {
        base64::engine::general_purpose::STANDARD.encode(&self.data)
    }

    /// Get the size in bytes
    #[must_use]
    pub fn size_bytes(&self) -> usize {
        self.data.len()
    }

    /// Check if screenshot is valid (has data)
    #[must_use]
    pub fn is_valid(&self) -> bool {
        !self.data.is_empty() && self.width > 0 && self.height > 0
    }
}

/// One live automation connection to the application under test.
///
/// Methods take `&self`: a session is driven by exactly one test thread and
/// is never shared between workers.
pub trait Session {
    /// Identifier assigned by the automation server
    fn session_id(&self) -> &str;

    /// Query the accessibility tree. Zero matches is not an error.
    fn find_elements(&self, spec: &LocatorSpec) -> SuiteResult<Vec<ElementHandle>>;

    /// Tap the element
    fn tap(&self, element: &ElementHandle) -> SuiteResult<()>;

    /// Type text into the element (appends to the current value)
    fn type_text(&self, element: &ElementHandle, text: &str) -> SuiteResult<()>;

    /// Clear the element's current value
    fn clear(&self, element: &ElementHandle) -> SuiteResult<()>;

    /// Read a named attribute
    fn attribute(&self, element: &ElementHandle, name: &str) -> SuiteResult<Option<String>>;

    /// Read the element's bounding box
    fn bounding_box(&self, element: &ElementHandle) -> SuiteResult<BoundingBox>;

    /// Perform one swipe gesture across the main scroll area
    fn swipe(&self, direction: SwipeDirection) -> SuiteResult<()>;

    /// Dismiss the on-screen keyboard if shown
    fn hide_keyboard(&self) -> SuiteResult<()>;

    /// Capture the current screen
    fn screenshot(&self) -> SuiteResult<Screenshot>;

    /// Restore the application to its launch state
    fn reset_app(&self) -> SuiteResult<()>;
}

/// Launches or attaches to the application and yields sessions.
pub trait SessionProvider {
    /// Create a session for the configured target
    fn acquire(&self, config: &SessionConfig) -> SuiteResult<Box<dyn Session>>;

    /// Tear a session down
    fn release(&self, session: Box<dyn Session>) -> SuiteResult<()>;
}
