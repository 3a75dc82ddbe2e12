//! New Connection form (lineside or loadside).

use super::{ids, EditAssetScreen};
use crate::locator::LocatorSpec;
use crate::result::{SuiteError, SuiteResult};
use crate::screen::{confirm_arrival, Picker, Screen, ScreenObject};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

/// Which side of the asset a connection attaches to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ConnectionKind {
    /// Upstream supply
    Lineside,
    /// Downstream load
    Loadside,
}

impl std::fmt::Display for ConnectionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Lineside => f.write_str("Lineside"),
            Self::Loadside => f.write_str("Loadside"),
        }
    }
}

/// Result of pressing Create
#[derive(Debug)]
pub enum CreateOutcome<'s> {
    /// The connection was saved and the app returned to the asset
    Created(EditAssetScreen<'s>),
    /// The form stayed open with a validation message
    Rejected {
        /// Message the app displayed
        message: String,
    },
}

impl CreateOutcome<'_> {
    /// Whether the connection was saved
    #[must_use]
    pub const fn is_created(&self) -> bool {
        matches!(self, Self::Created(_))
    }
}

/// Form for connecting the open asset to another node.
#[derive(Debug, Clone, Copy)]
pub struct NewConnectionScreen<'s> {
    screen: Screen<'s>,
    kind: ConnectionKind,
}

impl<'s> NewConnectionScreen<'s> {
    /// Wrap the interaction core for one side
    #[must_use]
    pub const fn new(screen: Screen<'s>, kind: ConnectionKind) -> Self {
        Self { screen, kind }
    }

    /// Side this form connects
    #[must_use]
    pub const fn kind(&self) -> ConnectionKind {
        self.kind
    }

    /// Choose the source node
    ///
    /// # Errors
    ///
    /// Returns [`SuiteError::OptionNotFound`] for an unknown node.
    pub fn select_source_node(&self, node: &str) -> SuiteResult<()> {
        let picker = Picker {
            name: "Source Node",
            control: LocatorSpec::id(ids::NEW_CONNECTION_SOURCE),
            list: LocatorSpec::id(ids::NODE_LIST),
            options: LocatorSpec::id(ids::NODE_OPTION),
            dismiss: LocatorSpec::id(ids::NODE_DISMISS),
        };
        self.screen.select(&picker, node)
    }

    /// Choose the physical connection type
    ///
    /// # Errors
    ///
    /// Returns [`SuiteError::OptionNotFound`] for an unknown type.
    pub fn select_connection_type(&self, connection_type: &str) -> SuiteResult<()> {
        let picker = Picker {
            name: "Connection Type",
            control: LocatorSpec::id(ids::NEW_CONNECTION_TYPE),
            list: LocatorSpec::id(ids::CONN_TYPE_LIST),
            options: LocatorSpec::id(ids::CONN_TYPE_OPTION),
            dismiss: LocatorSpec::id(ids::CONN_TYPE_DISMISS),
        };
        self.screen.select(&picker, connection_type)
    }

    /// Press Create and report whether the app accepted the connection.
    ///
    /// # Errors
    ///
    /// Returns [`SuiteError::UnexpectedScreen`] if neither the asset nor a
    /// validation message appears.
    pub fn try_create(&self) -> SuiteResult<CreateOutcome<'s>> {
        info!(kind = %self.kind, "creating connection");
        self.screen
            .click(&LocatorSpec::id(ids::NEW_CONNECTION_CREATE))?;

        let edit = EditAssetScreen::new(self.screen);
        let error = LocatorSpec::id(ids::NEW_CONNECTION_ERROR);
        match self.screen.wait_for_any(&[&edit.signature(), &error]) {
            Ok(0) => Ok(CreateOutcome::Created(confirm_arrival(edit, "create connection")?)),
            Ok(_) => {
                let message = self.validation_message()?.unwrap_or_default();
                warn!(%message, "connection rejected");
                Ok(CreateOutcome::Rejected { message })
            }
            Err(SuiteError::TimeoutExceeded { .. }) => Err(SuiteError::UnexpectedScreen {
                expected: edit.name().to_string(),
                action: "create connection".to_string(),
            }),
            Err(e) => Err(e),
        }
    }

    /// Press Create, requiring success.
    ///
    /// # Errors
    ///
    /// Returns [`SuiteError::UnexpectedScreen`] carrying the validation
    /// message if the app rejects the connection.
    pub fn create(&self) -> SuiteResult<EditAssetScreen<'s>> {
        match self.try_create()? {
            CreateOutcome::Created(edit) => Ok(edit),
            CreateOutcome::Rejected { message } => Err(SuiteError::UnexpectedScreen {
                expected: "Edit Asset".to_string(),
                action: format!("create connection (app reported: {message})"),
            }),
        }
    }

    /// The validation message currently shown, if any
    ///
    /// # Errors
    ///
    /// Propagates transport errors.
    pub fn validation_message(&self) -> SuiteResult<Option<String>> {
        self.screen
            .value_of(&LocatorSpec::id(ids::NEW_CONNECTION_ERROR))
    }

    /// Discard the form
    ///
    /// # Errors
    ///
    /// Returns [`SuiteError::UnexpectedScreen`] if Edit Asset never
    /// reappears.
    pub fn cancel(&self) -> SuiteResult<EditAssetScreen<'s>> {
        self.screen.navigate(
            &LocatorSpec::id(ids::NEW_CONNECTION_CANCEL),
            EditAssetScreen::new(self.screen),
        )
    }
}

impl<'s> ScreenObject<'s> for NewConnectionScreen<'s> {
    fn name(&self) -> &'static str {
        match self.kind {
            ConnectionKind::Lineside => "New Lineside Connection",
            ConnectionKind::Loadside => "New Loadside Connection",
        }
    }

    fn signature(&self) -> LocatorSpec {
        LocatorSpec::predicate(format!(
            "name == '{}' AND label == 'New {} Connection'",
            ids::NEW_CONNECTION_HEADER,
            self.kind
        ))
    }

    fn screen(&self) -> &Screen<'s> {
        &self.screen
    }
}
