//! Login and site selection.

use super::ids;
use super::AssetListScreen;
use crate::config::Credentials;
use crate::driver::Role;
use crate::locator::LocatorSpec;
use crate::result::{SuiteError, SuiteResult};
use crate::screen::{confirm_arrival, EntryMode, Screen, ScreenObject};
use tracing::info;

/// The sign-in form shown at launch.
#[derive(Debug, Clone, Copy)]
pub struct LoginScreen<'s> {
    screen: Screen<'s>,
}

impl<'s> LoginScreen<'s> {
    /// Wrap the interaction core
    #[must_use]
    pub const fn new(screen: Screen<'s>) -> Self {
        Self { screen }
    }

    /// Submit credentials and wait for the site list.
    ///
    /// # Errors
    ///
    /// Returns [`SuiteError::UnexpectedScreen`] if the app rejects the
    /// credentials (the app's message is included) or never moves on.
    pub fn sign_in(&self, credentials: &Credentials) -> SuiteResult<SiteListScreen<'s>> {
        info!(user = %credentials.username, "signing in");
        let username = LocatorSpec::id(ids::LOGIN_USERNAME);
        let password = LocatorSpec::id(ids::LOGIN_PASSWORD);
        self.screen
            .enter(&username, &credentials.username, EntryMode::Replace)?;
        self.screen
            .enter(&password, &credentials.password, EntryMode::Replace)?;
        self.screen.click(&LocatorSpec::id(ids::LOGIN_SUBMIT))?;

        let sites = SiteListScreen::new(self.screen);
        let error = LocatorSpec::id(ids::LOGIN_ERROR);
        match self.screen.wait_for_any(&[&sites.signature(), &error]) {
            Ok(0) => Ok(sites),
            Ok(_) => Err(SuiteError::UnexpectedScreen {
                expected: sites.name().to_string(),
                action: format!(
                    "sign in as {} (app reported: {})",
                    credentials.username,
                    self.error_message()?.unwrap_or_default()
                ),
            }),
            Err(SuiteError::TimeoutExceeded { .. }) => Err(SuiteError::UnexpectedScreen {
                expected: sites.name().to_string(),
                action: format!("sign in as {}", credentials.username),
            }),
            Err(e) => Err(e),
        }
    }

    /// Sign in and pick the credentials' site, or the first listed site.
    ///
    /// # Errors
    ///
    /// See [`LoginScreen::sign_in`] and [`SiteListScreen::select_site`].
    pub fn sign_in_to_site(&self, credentials: &Credentials) -> SuiteResult<AssetListScreen<'s>> {
        let sites = self.sign_in(credentials)?;
        match &credentials.site {
            Some(site) => sites.select_site(site),
            None => {
                let first = sites.sites()?.into_iter().next().ok_or_else(|| {
                    SuiteError::assertion("no sites are available for this account")
                })?;
                sites.select_site(&first)
            }
        }
    }

    /// The rejection message, if one is showing
    ///
    /// # Errors
    ///
    /// Propagates transport errors.
    pub fn error_message(&self) -> SuiteResult<Option<String>> {
        self.screen.value_of(&LocatorSpec::id(ids::LOGIN_ERROR))
    }
}

impl<'s> ScreenObject<'s> for LoginScreen<'s> {
    fn name(&self) -> &'static str {
        "Login"
    }

    fn signature(&self) -> LocatorSpec {
        LocatorSpec::id(ids::LOGIN_USERNAME)
    }

    fn screen(&self) -> &Screen<'s> {
        &self.screen
    }
}

/// Site chooser shown after a successful sign-in.
#[derive(Debug, Clone, Copy)]
pub struct SiteListScreen<'s> {
    screen: Screen<'s>,
}

impl<'s> SiteListScreen<'s> {
    /// Wrap the interaction core
    #[must_use]
    pub const fn new(screen: Screen<'s>) -> Self {
        Self { screen }
    }

    /// Sites offered to this account
    ///
    /// # Errors
    ///
    /// Propagates transport errors.
    pub fn sites(&self) -> SuiteResult<Vec<String>> {
        self.screen.texts_of(&LocatorSpec::id(ids::SITE_OPTION))
    }

    /// Choose a site and land on its asset list.
    ///
    /// # Errors
    ///
    /// Returns [`SuiteError::OptionNotFound`] for an unknown site.
    pub fn select_site(&self, site: &str) -> SuiteResult<AssetListScreen<'s>> {
        let available = self.sites()?;
        if !available.iter().any(|s| s == site) {
            return Err(SuiteError::OptionNotFound {
                control: "Site".to_string(),
                option: site.to_string(),
                available,
            });
        }
        info!(site, "selecting site");
        let row = LocatorSpec::role_text(Role::Cell, site);
        self.screen.click(&row)?;
        confirm_arrival(AssetListScreen::new(self.screen), &format!("select site {site}"))
    }
}

impl<'s> ScreenObject<'s> for SiteListScreen<'s> {
    fn name(&self) -> &'static str {
        "Site Selection"
    }

    fn signature(&self) -> LocatorSpec {
        LocatorSpec::id(ids::SITE_LIST)
    }

    fn screen(&self) -> &Screen<'s> {
        &self.screen
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::screens::test_support::screen;
    use crate::sim::{demo_credentials, SimulatedApp, DEMO_USERNAME, SITES};

    #[test]
    fn test_sign_in_reaches_asset_list() {
        let app = SimulatedApp::new();
        let login = LoginScreen::new(screen(&app));
        assert!(login.is_displayed());
        let list = login.sign_in_to_site(&demo_credentials()).unwrap();
        assert!(list.is_displayed());
        assert_eq!(app.current_screen(), "Asset List");
    }

    #[test]
    fn test_site_defaults_to_first_listed() {
        let app = SimulatedApp::new();
        let creds = Credentials::new(DEMO_USERNAME, crate::sim::DEMO_PASSWORD);
        let sites = LoginScreen::new(screen(&app)).sign_in(&creds).unwrap();
        assert_eq!(sites.sites().unwrap(), SITES.to_vec());
    }

    #[test]
    fn test_rejected_credentials_report_app_message() {
        let app = SimulatedApp::new();
        let login = LoginScreen::new(screen(&app));
        let err = login
            .sign_in(&Credentials::new(DEMO_USERNAME, "wrong"))
            .unwrap_err();
        match err {
            SuiteError::UnexpectedScreen { expected, action } => {
                assert_eq!(expected, "Site Selection");
                assert!(action.contains("Invalid username or password"));
            }
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn test_unknown_site_is_option_not_found() {
        let app = SimulatedApp::new();
        let sites = LoginScreen::new(screen(&app))
            .sign_in(&demo_credentials())
            .unwrap();
        let err = sites.select_site("Atlantis").unwrap_err();
        assert!(matches!(err, SuiteError::OptionNotFound { ref available, .. } if available.len() == 2));
        assert!(sites.is_displayed());
    }
}
