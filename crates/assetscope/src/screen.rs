//! Screen Object support
//!
//! [`Screen`] is the interaction core every screen object is built on: it
//! owns the locator resolver and the wait policy and borrows the session.
//! Screen objects ([`ScreenObject`]) expose intention-revealing operations and
//! hide locator construction and waiting from scenario bodies.
//!
//! Navigation rule: a method that leaves a screen returns the next screen's
//! object only after that screen's signature element has appeared.

use crate::driver::{ElementHandle, Session, SwipeDirection};
use crate::locator::{LocatorResolver, LocatorSpec};
use crate::result::{SuiteError, SuiteResult};
use crate::wait::{TimeoutExt, WaitOptions, Waiter};
use tracing::{debug, warn};

/// Whether text entry replaces or extends the current value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EntryMode {
    /// Clear the field before typing
    #[default]
    Replace,
    /// Type after the existing value
    Append,
}

/// A dropdown/picker control and the parts of its option list
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Picker {
    /// Human-readable name for error messages
    pub name: &'static str,
    /// Control that opens the list
    pub control: LocatorSpec,
    /// Signature element of the open list
    pub list: LocatorSpec,
    /// Matches every option row in the open list
    pub options: LocatorSpec,
    /// Closes the list without choosing
    pub dismiss: LocatorSpec,
}

/// Interaction core shared by all screen objects.
#[derive(Clone, Copy)]
pub struct Screen<'s> {
    session: &'s dyn Session,
    resolver: LocatorResolver,
    waiter: Waiter,
    max_scroll_attempts: u32,
}

impl std::fmt::Debug for Screen<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Screen")
            .field("session", &self.session.session_id())
            .field("waiter", &self.waiter)
            .field("max_scroll_attempts", &self.max_scroll_attempts)
            .finish()
    }
}

impl<'s> Screen<'s> {
    /// Create an interaction core over a borrowed session
    #[must_use]
    pub fn new(session: &'s dyn Session, wait: WaitOptions) -> Self {
        Self {
            session,
            resolver: LocatorResolver::new(),
            waiter: Waiter::with_options(wait),
            max_scroll_attempts: crate::config::DEFAULT_MAX_SCROLL_ATTEMPTS,
        }
    }

    /// Bound the number of swipes `scroll_to` may perform
    #[must_use]
    pub const fn with_max_scroll_attempts(mut self, attempts: u32) -> Self {
        self.max_scroll_attempts = attempts;
        self
    }

    /// The borrowed session
    #[must_use]
    pub fn session(&self) -> &'s dyn Session {
        self.session
    }

    /// The wait policy
    #[must_use]
    pub const fn waiter(&self) -> &Waiter {
        &self.waiter
    }

    /// All current matches for `spec`.
    ///
    /// # Errors
    ///
    /// Propagates locator and transport errors.
    pub fn find(&self, spec: &LocatorSpec) -> SuiteResult<Vec<ElementHandle>> {
        self.resolver.resolve(self.session, spec)
    }

    /// Whether a visible element matches `spec`. Never fails.
    #[must_use]
    pub fn is_present(&self, spec: &LocatorSpec) -> bool {
        match self.resolver.resolve(self.session, &spec.clone().visible_only()) {
            Ok(found) => !found.is_empty(),
            Err(e @ SuiteError::InvalidLocator { .. }) => {
                warn!(locator = %spec, error = %e, "presence check on malformed locator");
                false
            }
            Err(e) => {
                debug!(locator = %spec, error = %e, "presence check failed, treating as absent");
                false
            }
        }
    }

    /// Whether a visible match is enabled. Never fails.
    #[must_use]
    pub fn is_enabled(&self, spec: &LocatorSpec) -> bool {
        self.find(&spec.clone().visible_only())
            .map(|found| found.iter().any(|e| e.enabled))
            .unwrap_or(false)
    }

    /// Number of visible matches.
    ///
    /// # Errors
    ///
    /// Propagates locator and transport errors.
    pub fn count(&self, spec: &LocatorSpec) -> SuiteResult<usize> {
        Ok(self.find(&spec.clone().visible_only())?.len())
    }

    /// Display text of every visible match, in tree order.
    ///
    /// # Errors
    ///
    /// Propagates locator and transport errors.
    pub fn texts_of(&self, spec: &LocatorSpec) -> SuiteResult<Vec<String>> {
        Ok(self
            .find(&spec.clone().visible_only())?
            .iter()
            .filter_map(|e| e.display_text().map(str::to_string))
            .collect())
    }

    /// Value of the first visible match (falls back to its label).
    ///
    /// # Errors
    ///
    /// Propagates locator and transport errors.
    pub fn value_of(&self, spec: &LocatorSpec) -> SuiteResult<Option<String>> {
        Ok(self
            .find(&spec.clone().visible_only())?
            .into_iter()
            .next()
            .and_then(|e| e.value.or(e.label)))
    }

    /// Poll `probe` under the wait policy. Transient transport errors count
    /// as "not yet"; any other error stops the wait.
    fn poll<T, F>(&self, description: &str, options: &WaitOptions, mut probe: F) -> SuiteResult<T>
    where
        F: FnMut() -> SuiteResult<Option<T>>,
    {
        let mut last_transient: Option<SuiteError> = None;
        let outcome = self
            .waiter
            .poll_for_with(description, options, || match probe() {
                Ok(Some(value)) => Some(Ok(value)),
                Ok(None) => None,
                Err(e) if e.is_transient() => {
                    debug!(waiting_for = description, error = %e, "transient error while waiting");
                    last_transient = Some(e);
                    None
                }
                Err(e) => Some(Err(e)),
            });
        match (outcome, last_transient) {
            (Err(SuiteError::TimeoutExceeded { ms, waited_for }), Some(last)) => {
                Err(SuiteError::TimeoutExceeded {
                    ms,
                    waited_for: format!("{waited_for} (last error: {last})"),
                })
            }
            (outcome, _) => outcome?,
        }
    }

    /// Wait until a visible element matches `spec`.
    ///
    /// # Errors
    ///
    /// Returns [`SuiteError::TimeoutExceeded`] if none appears.
    pub fn wait_for_present(&self, spec: &LocatorSpec) -> SuiteResult<ElementHandle> {
        let visible = spec.clone().visible_only();
        self.poll(&format!("{spec} to appear"), self.waiter.options(), || {
            self.resolver.resolve_first(self.session, &visible)
        })
    }

    /// Wait until no visible element matches `spec`.
    ///
    /// # Errors
    ///
    /// Returns [`SuiteError::TimeoutExceeded`] if it never disappears.
    pub fn wait_for_absent(&self, spec: &LocatorSpec) -> SuiteResult<()> {
        let visible = spec.clone().visible_only();
        self.poll(&format!("{spec} to disappear"), self.waiter.options(), || {
            Ok(self
                .resolver
                .resolve(self.session, &visible)?
                .is_empty()
                .then_some(()))
        })
    }

    /// Wait until the control is present, visible and enabled, then tap it.
    ///
    /// # Errors
    ///
    /// Returns [`SuiteError::ElementNotInteractable`] after the timeout.
    pub fn click(&self, spec: &LocatorSpec) -> SuiteResult<()> {
        let element = self.wait_interactable(spec)?;
        debug!(locator = %spec, "tap");
        self.session.tap(&element)
    }

    fn wait_interactable(&self, spec: &LocatorSpec) -> SuiteResult<ElementHandle> {
        let options = self.waiter.options();
        self.poll(&format!("{spec} to be interactable"), options, || {
            Ok(self
                .resolver
                .resolve(self.session, spec)?
                .into_iter()
                .find(ElementHandle::is_interactable))
        })
        .map_err(|e| match e {
            SuiteError::TimeoutExceeded { ms, .. } => SuiteError::ElementNotInteractable {
                element: spec.to_string(),
                ms,
            },
            other => other,
        })
    }

    /// Focus a text input, optionally clear it, type, and dismiss the keyboard.
    ///
    /// # Errors
    ///
    /// Returns [`SuiteError::FieldNotEditable`] if the target is not a text
    /// input, or [`SuiteError::ElementNotInteractable`] if it never becomes
    /// usable.
    pub fn enter(&self, spec: &LocatorSpec, text: &str, mode: EntryMode) -> SuiteResult<()> {
        let element = self.wait_interactable(spec)?;
        if !element.role.is_editable() {
            return Err(SuiteError::FieldNotEditable {
                field: spec.to_string(),
                role: element.role.to_string(),
            });
        }
        self.session.tap(&element)?;
        if mode == EntryMode::Replace {
            self.session.clear(&element)?;
        }
        if !text.is_empty() {
            self.session.type_text(&element, text)?;
        }
        self.session.hide_keyboard()
    }

    /// Choose `option` from a picker by exact label.
    ///
    /// Opens the list if it is not already open and waits for it to be
    /// populated and stable across two consecutive reads. If no option
    /// matches, the list is closed again (when this call opened it) and
    /// [`SuiteError::OptionNotFound`] is returned; nothing is selected.
    ///
    /// # Errors
    ///
    /// See above; transport and interaction errors propagate.
    pub fn select(&self, picker: &Picker, option: &str) -> SuiteResult<()> {
        let was_open = self.is_present(&picker.list);
        if !was_open {
            self.click(&picker.control)?;
            self.wait_for_present(&picker.list)?;
        }

        let available = self.stable_options(picker)?;
        let target = self
            .find(&picker.options.clone().visible_only())?
            .into_iter()
            .find(|e| e.display_text() == Some(option));

        match target {
            Some(element) => {
                debug!(picker = picker.name, option, "select option");
                self.session.tap(&element)?;
                self.wait_for_absent(&picker.list)
            }
            None => {
                if !was_open {
                    self.click(&picker.dismiss)?;
                    self.wait_for_absent(&picker.list)?;
                }
                Err(SuiteError::OptionNotFound {
                    control: picker.name.to_string(),
                    option: option.to_string(),
                    available,
                })
            }
        }
    }

    /// Option labels once the list is non-empty and unchanged between reads.
    /// A list that never populates yields no options.
    fn stable_options(&self, picker: &Picker) -> SuiteResult<Vec<String>> {
        let mut previous: Option<Vec<String>> = None;
        self.poll(
            &format!("{} options to settle", picker.name),
            self.waiter.options(),
            || {
                let current = self.texts_of(&picker.options)?;
                let settled = !current.is_empty() && previous.as_ref() == Some(&current);
                previous = Some(current.clone());
                Ok(settled.then_some(current))
            },
        )
        .timeout_as_none()
        .map(Option::unwrap_or_default)
    }

    /// Swipe until a visible element matches `spec`. Searches below the
    /// current position first with at most `max_scroll_attempts` swipes, then
    /// swipes back past the start and searches above it with the same budget.
    /// Returns whether it was found.
    ///
    /// # Errors
    ///
    /// Propagates gesture and transport errors; not finding is `Ok(false)`.
    pub fn scroll_to(&self, spec: &LocatorSpec) -> SuiteResult<bool> {
        if self.is_present(spec) {
            return Ok(true);
        }
        let below = self.max_scroll_attempts;
        if self.scroll_towards(spec, SwipeDirection::Up, below)? {
            return Ok(true);
        }
        // The return trip retraces the downward search before any new ground.
        let above = below.saturating_add(self.max_scroll_attempts);
        if self.scroll_towards(spec, SwipeDirection::Down, above)? {
            return Ok(true);
        }
        debug!(locator = %spec, "not found after bounded scrolling");
        Ok(false)
    }

    fn scroll_towards(
        &self,
        spec: &LocatorSpec,
        direction: SwipeDirection,
        swipes: u32,
    ) -> SuiteResult<bool> {
        let settle = WaitOptions::new()
            .with_timeout(self.waiter.options().poll_interval_ms.saturating_mul(2))
            .with_poll_interval(self.waiter.options().poll_interval_ms);

        for attempt in 1..=swipes {
            self.session.swipe(direction)?;
            let appeared = self
                .waiter
                .until_with(&format!("{spec} after swipe"), &settle, || {
                    self.is_present(spec)
                })
                .timeout_as_none()?;
            if appeared.is_some() {
                debug!(locator = %spec, ?direction, swipes = attempt, "scrolled into view");
                return Ok(true);
            }
        }
        Ok(false)
    }

    /// Value of the first match whether or not it is scrolled into view,
    /// falling back to its label.
    ///
    /// # Errors
    ///
    /// Propagates locator and transport errors.
    pub fn read_value(&self, spec: &LocatorSpec) -> SuiteResult<Option<String>> {
        Ok(self
            .find(spec)?
            .into_iter()
            .next()
            .and_then(|e| e.value.or(e.label)))
    }

    /// Display text of every match, on screen or not, in tree order.
    ///
    /// # Errors
    ///
    /// Propagates locator and transport errors.
    pub fn texts_in_tree(&self, spec: &LocatorSpec) -> SuiteResult<Vec<String>> {
        Ok(self
            .find(spec)?
            .iter()
            .filter_map(|e| e.display_text().map(str::to_string))
            .collect())
    }

    /// Wait until one of `candidates` is visible and return its index.
    ///
    /// # Errors
    ///
    /// Returns [`SuiteError::TimeoutExceeded`] if none appears.
    pub fn wait_for_any(&self, candidates: &[&LocatorSpec]) -> SuiteResult<usize> {
        let description = candidates
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(" or ");
        self.poll(&format!("{description} to appear"), self.waiter.options(), || {
            for (index, spec) in candidates.iter().enumerate() {
                let visible = (*spec).clone().visible_only();
                if !self.resolver.resolve(self.session, &visible)?.is_empty() {
                    return Ok(Some(index));
                }
            }
            Ok(None)
        })
    }

    /// Tap `trigger` and confirm arrival at `next`.
    ///
    /// # Errors
    ///
    /// Returns [`SuiteError::UnexpectedScreen`] if `next`'s signature never
    /// appears.
    pub fn navigate<S: ScreenObject<'s>>(&self, trigger: &LocatorSpec, next: S) -> SuiteResult<S> {
        self.click(trigger)?;
        confirm_arrival(next, &trigger.to_string())
    }
}

/// Wait for `screen`'s signature and hand it back, mapping a timeout to
/// [`SuiteError::UnexpectedScreen`].
///
/// # Errors
///
/// Returns [`SuiteError::UnexpectedScreen`] if the signature never appears.
pub fn confirm_arrival<'s, S: ScreenObject<'s>>(screen: S, action: &str) -> SuiteResult<S> {
    match screen.wait_until_displayed() {
        Ok(()) => Ok(screen),
        Err(SuiteError::TimeoutExceeded { .. }) => Err(SuiteError::UnexpectedScreen {
            expected: screen.name().to_string(),
            action: action.to_string(),
        }),
        Err(e) => Err(e),
    }
}

/// One logical application screen.
pub trait ScreenObject<'s> {
    /// Screen name for logging and errors
    fn name(&self) -> &'static str;

    /// The one element whose presence proves this screen is showing
    fn signature(&self) -> LocatorSpec;

    /// The interaction core
    fn screen(&self) -> &Screen<'s>;

    /// Whether the screen is showing. Never fails.
    fn is_displayed(&self) -> bool {
        self.screen().is_present(&self.signature())
    }

    /// Wait for the signature element.
    ///
    /// # Errors
    ///
    /// Returns [`SuiteError::TimeoutExceeded`] if it never appears.
    fn wait_until_displayed(&self) -> SuiteResult<()> {
        self.screen()
            .wait_for_present(&self.signature())
            .map(|_| ())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::driver::{BoundingBox, Role, Screenshot};
    use std::cell::{Cell, RefCell};

    const OPTION_PREFIX: &str = "opt-";

    /// In-memory session: a flat element list plus just enough behaviour for
    /// a site picker and a navigation button.
    struct FakeSession {
        elements: RefCell<Vec<ElementHandle>>,
        taps: RefCell<Vec<String>>,
        keyboard_dismissals: Cell<u32>,
        failing_reads: Cell<u32>,
        failure: fn() -> SuiteError,
    }

    fn stale() -> SuiteError {
        SuiteError::protocol("stale element reference")
    }

    fn session(elements: Vec<ElementHandle>) -> FakeSession {
        FakeSession {
            elements: RefCell::new(elements),
            taps: RefCell::new(Vec::new()),
            keyboard_dismissals: Cell::new(0),
            failing_reads: Cell::new(0),
            failure: stale,
        }
    }

    impl FakeSession {
        fn with_failing_reads(self, reads: u32, failure: fn() -> SuiteError) -> Self {
            self.failing_reads.set(reads);
            Self { failure, ..self }
        }

        fn value(&self, id: &str) -> Option<String> {
            self.elements
                .borrow()
                .iter()
                .find(|e| e.id == id)
                .and_then(|e| e.value.clone())
        }

        fn taps(&self) -> Vec<String> {
            self.taps.borrow().clone()
        }

        fn open_site_list(&self) {
            let mut elements = self.elements.borrow_mut();
            elements.push(ElementHandle::new("list", Role::Other).with_name("site.list"));
            elements.push(
                ElementHandle::new("done", Role::Button)
                    .with_name("site.done")
                    .with_label("Done"),
            );
            for label in ["North", "South"] {
                elements.push(
                    ElementHandle::new(format!("{OPTION_PREFIX}{label}"), Role::Cell)
                        .with_name("site.option")
                        .with_label(label),
                );
            }
        }

        fn close_site_list(&self) {
            self.elements
                .borrow_mut()
                .retain(|e| e.id != "list" && e.id != "done" && !e.id.starts_with(OPTION_PREFIX));
        }
    }

    impl Session for FakeSession {
        fn session_id(&self) -> &str {
            "fake"
        }
        fn find_elements(&self, spec: &LocatorSpec) -> SuiteResult<Vec<ElementHandle>> {
            let failing = self.failing_reads.get();
            if failing > 0 {
                self.failing_reads.set(failing - 1);
                return Err((self.failure)());
            }
            Ok(self
                .elements
                .borrow()
                .iter()
                .filter(|e| spec.matches(e).unwrap_or(false))
                .cloned()
                .collect())
        }
        fn tap(&self, element: &ElementHandle) -> SuiteResult<()> {
            self.taps.borrow_mut().push(element.id.clone());
            match element.id.as_str() {
                "control" => self.open_site_list(),
                "done" => self.close_site_list(),
                "go" => self.elements.borrow_mut().push(
                    ElementHandle::new("home", Role::StaticText).with_name("home.title"),
                ),
                id if id.starts_with(OPTION_PREFIX) => {
                    self.close_site_list();
                    if let Some(control) =
                        self.elements.borrow_mut().iter_mut().find(|e| e.id == "control")
                    {
                        control.value = element.label.clone();
                    }
                }
                _ => {}
            }
            Ok(())
        }
        fn type_text(&self, element: &ElementHandle, text: &str) -> SuiteResult<()> {
            if let Some(field) = self
                .elements
                .borrow_mut()
                .iter_mut()
                .find(|e| e.id == element.id)
            {
                field.value.get_or_insert_with(String::new).push_str(text);
            }
            Ok(())
        }
        fn clear(&self, element: &ElementHandle) -> SuiteResult<()> {
            if let Some(field) = self
                .elements
                .borrow_mut()
                .iter_mut()
                .find(|e| e.id == element.id)
            {
                field.value = Some(String::new());
            }
            Ok(())
        }
        fn attribute(&self, _: &ElementHandle, _: &str) -> SuiteResult<Option<String>> {
            Ok(None)
        }
        fn bounding_box(&self, _: &ElementHandle) -> SuiteResult<BoundingBox> {
            Ok(BoundingBox::new(0.0, 0.0, 1.0, 1.0))
        }
        fn swipe(&self, _: SwipeDirection) -> SuiteResult<()> {
            Ok(())
        }
        fn hide_keyboard(&self) -> SuiteResult<()> {
            self.keyboard_dismissals
                .set(self.keyboard_dismissals.get() + 1);
            Ok(())
        }
        fn screenshot(&self) -> SuiteResult<Screenshot> {
            Ok(Screenshot::from_png(Vec::new()))
        }
        fn reset_app(&self) -> SuiteResult<()> {
            Ok(())
        }
    }

    /// Long list of rows with a fixed-size viewport; swipes move it by a
    /// fixed step and stop at either end.
    struct ListSession {
        rows: usize,
        viewport: usize,
        step: usize,
        offset: Cell<usize>,
        swipes: Cell<u32>,
    }

    impl ListSession {
        fn at(offset: usize) -> Self {
            Self {
                rows: 30,
                viewport: 5,
                step: 3,
                offset: Cell::new(offset),
                swipes: Cell::new(0),
            }
        }
    }

    impl Session for ListSession {
        fn session_id(&self) -> &str {
            "list"
        }
        fn find_elements(&self, spec: &LocatorSpec) -> SuiteResult<Vec<ElementHandle>> {
            let offset = self.offset.get();
            Ok((0..self.rows)
                .map(|i| {
                    ElementHandle::new(i.to_string(), Role::Cell)
                        .with_name(format!("row{i}"))
                        .with_visible((offset..offset + self.viewport).contains(&i))
                })
                .filter(|e| spec.matches(e).unwrap_or(false))
                .collect())
        }
        fn tap(&self, _: &ElementHandle) -> SuiteResult<()> {
            Ok(())
        }
        fn type_text(&self, _: &ElementHandle, _: &str) -> SuiteResult<()> {
            Ok(())
        }
        fn clear(&self, _: &ElementHandle) -> SuiteResult<()> {
            Ok(())
        }
        fn attribute(&self, _: &ElementHandle, _: &str) -> SuiteResult<Option<String>> {
            Ok(None)
        }
        fn bounding_box(&self, _: &ElementHandle) -> SuiteResult<BoundingBox> {
            Ok(BoundingBox::new(0.0, 0.0, 1.0, 1.0))
        }
        fn swipe(&self, direction: SwipeDirection) -> SuiteResult<()> {
            self.swipes.set(self.swipes.get() + 1);
            let offset = self.offset.get();
            let last = self.rows - self.viewport;
            self.offset.set(match direction {
                SwipeDirection::Up => (offset + self.step).min(last),
                SwipeDirection::Down => offset.saturating_sub(self.step),
            });
            Ok(())
        }
        fn hide_keyboard(&self) -> SuiteResult<()> {
            Ok(())
        }
        fn screenshot(&self) -> SuiteResult<Screenshot> {
            Ok(Screenshot::from_png(Vec::new()))
        }
        fn reset_app(&self) -> SuiteResult<()> {
            Ok(())
        }
    }

    fn fast() -> WaitOptions {
        WaitOptions::new().with_timeout(50).with_poll_interval(1)
    }

    fn site_picker() -> Picker {
        Picker {
            name: "site picker",
            control: LocatorSpec::id("site"),
            list: LocatorSpec::id("site.list"),
            options: LocatorSpec::id("site.option"),
            dismiss: LocatorSpec::id("site.done"),
        }
    }

    fn with_site_control() -> FakeSession {
        session(vec![ElementHandle::new("control", Role::Button)
            .with_name("site")
            .with_label("Site")])
    }

    mod wait_tests {
        use super::*;

        #[test]
        fn test_stale_read_is_retried() {
            let app = session(vec![ElementHandle::new("1", Role::Cell).with_name("row1")])
                .with_failing_reads(1, stale);
            let screen = Screen::new(&app, fast());
            let found = screen.wait_for_present(&LocatorSpec::id("row1")).unwrap();
            assert_eq!(found.id, "1");
        }

        #[test]
        fn test_timeout_names_last_transient_error() {
            let app = session(Vec::new()).with_failing_reads(u32::MAX, stale);
            let screen = Screen::new(&app, fast());
            match screen.wait_for_present(&LocatorSpec::id("row1")) {
                Err(SuiteError::TimeoutExceeded { waited_for, .. }) => {
                    assert!(waited_for.contains("stale element reference"));
                }
                other => panic!("expected timeout, got {other:?}"),
            }
        }

        #[test]
        fn test_session_loss_stops_the_wait() {
            fn gone() -> SuiteError {
                SuiteError::SessionUnavailable {
                    message: "invalid session id".into(),
                }
            }
            let app = session(Vec::new()).with_failing_reads(u32::MAX, gone);
            let screen = Screen::new(&app, WaitOptions::new().with_timeout(5_000));
            let started = std::time::Instant::now();
            assert!(matches!(
                screen.click(&LocatorSpec::id("row1")),
                Err(SuiteError::SessionUnavailable { .. })
            ));
            assert!(started.elapsed() < std::time::Duration::from_secs(1));
        }

        #[test]
        fn test_disabled_control_is_not_interactable() {
            let app = session(vec![ElementHandle::new("save", Role::Button)
                .with_name("asset.save")
                .with_enabled(false)]);
            let screen = Screen::new(&app, fast());
            assert!(matches!(
                screen.click(&LocatorSpec::id("asset.save")),
                Err(SuiteError::ElementNotInteractable { ms: 50, .. })
            ));
            assert!(app.taps().is_empty());
        }
    }

    mod enter_tests {
        use super::*;

        fn name_field(value: &str) -> FakeSession {
            session(vec![
                ElementHandle::new("name", Role::TextField)
                    .with_name("asset.name")
                    .with_value(value),
                ElementHandle::new("title", Role::StaticText)
                    .with_name("asset.title")
                    .with_label("New Asset"),
            ])
        }

        #[test]
        fn test_static_text_is_not_editable() {
            let app = name_field("");
            let screen = Screen::new(&app, fast());
            let err = screen
                .enter(&LocatorSpec::id("asset.title"), "Pump", EntryMode::Replace)
                .unwrap_err();
            match err {
                SuiteError::FieldNotEditable { field, role } => {
                    assert!(field.contains("asset.title"));
                    assert_eq!(role, Role::StaticText.to_string());
                }
                other => panic!("expected FieldNotEditable, got {other:?}"),
            }
            assert!(app.taps().is_empty());
            assert_eq!(app.keyboard_dismissals.get(), 0);
        }

        #[test]
        fn test_append_keeps_existing_value() {
            let app = name_field("Pump");
            let screen = Screen::new(&app, fast());
            screen
                .enter(&LocatorSpec::id("asset.name"), " 7", EntryMode::Append)
                .unwrap();
            assert_eq!(app.value("name").as_deref(), Some("Pump 7"));
            assert_eq!(app.keyboard_dismissals.get(), 1);
        }

        #[test]
        fn test_replace_clears_first() {
            let app = name_field("Pump");
            let screen = Screen::new(&app, fast());
            screen
                .enter(&LocatorSpec::id("asset.name"), "Valve", EntryMode::Replace)
                .unwrap();
            assert_eq!(
                screen.value_of(&LocatorSpec::id("asset.name")).unwrap().as_deref(),
                Some("Valve")
            );
        }

        #[test]
        fn test_replace_with_empty_text_clears() {
            let app = name_field("Pump");
            let screen = Screen::new(&app, fast());
            screen
                .enter(&LocatorSpec::id("asset.name"), "", EntryMode::Replace)
                .unwrap();
            assert_eq!(app.value("name").as_deref(), Some(""));
        }
    }

    mod select_tests {
        use super::*;

        #[test]
        fn test_opens_list_and_chooses() {
            let app = with_site_control();
            let screen = Screen::new(&app, fast());
            screen.select(&site_picker(), "South").unwrap();
            assert_eq!(app.taps(), vec!["control".to_string(), "opt-South".to_string()]);
            assert_eq!(app.value("control").as_deref(), Some("South"));
            assert!(!screen.is_present(&site_picker().list));
        }

        #[test]
        fn test_missing_option_closes_list_it_opened() {
            let app = with_site_control();
            let screen = Screen::new(&app, fast());
            match screen.select(&site_picker(), "West") {
                Err(SuiteError::OptionNotFound { available, .. }) => {
                    assert_eq!(available, vec!["North".to_string(), "South".to_string()]);
                }
                other => panic!("expected OptionNotFound, got {other:?}"),
            }
            assert_eq!(app.taps(), vec!["control".to_string(), "done".to_string()]);
            assert!(!screen.is_present(&site_picker().list));
            assert_eq!(app.value("control"), None);
        }

        #[test]
        fn test_missing_option_leaves_open_list_open() {
            let app = with_site_control();
            app.open_site_list();
            let screen = Screen::new(&app, fast());
            assert!(matches!(
                screen.select(&site_picker(), "West"),
                Err(SuiteError::OptionNotFound { .. })
            ));
            assert!(app.taps().is_empty());
            assert!(screen.is_present(&site_picker().list));
        }

        #[test]
        fn test_already_open_list_is_not_reopened() {
            let app = with_site_control();
            app.open_site_list();
            let screen = Screen::new(&app, fast());
            screen.select(&site_picker(), "North").unwrap();
            assert_eq!(app.taps(), vec!["opt-North".to_string()]);
        }
    }

    mod scroll_tests {
        use super::*;

        #[test]
        fn test_visible_target_needs_no_swipe() {
            let list = ListSession::at(15);
            let screen = Screen::new(&list, fast());
            assert!(screen.scroll_to(&LocatorSpec::id("row17")).unwrap());
            assert_eq!(list.swipes.get(), 0);
        }

        #[test]
        fn test_finds_target_below_start() {
            let list = ListSession::at(0);
            let screen = Screen::new(&list, fast()).with_max_scroll_attempts(10);
            assert!(screen.scroll_to(&LocatorSpec::id("row28")).unwrap());
            assert_eq!(list.swipes.get(), 8);
        }

        #[test]
        fn test_finds_target_above_start() {
            let list = ListSession::at(15);
            let screen = Screen::new(&list, fast()).with_max_scroll_attempts(4);
            assert!(screen.scroll_to(&LocatorSpec::id("row2")).unwrap());
            assert!(list.offset.get() <= 2);
        }

        #[test]
        fn test_gives_up_within_budget() {
            let list = ListSession::at(15);
            let screen = Screen::new(&list, fast()).with_max_scroll_attempts(4);
            assert!(!screen.scroll_to(&LocatorSpec::id("row99")).unwrap());
            // 4 below, 4 back to the start, 4 above
            assert_eq!(list.swipes.get(), 12);
        }
    }

    mod navigation_tests {
        use super::*;

        struct Home<'s> {
            screen: Screen<'s>,
        }

        impl<'s> ScreenObject<'s> for Home<'s> {
            fn name(&self) -> &'static str {
                "home"
            }
            fn signature(&self) -> LocatorSpec {
                LocatorSpec::id("home.title")
            }
            fn screen(&self) -> &Screen<'s> {
                &self.screen
            }
        }

        fn buttons() -> FakeSession {
            session(vec![
                ElementHandle::new("go", Role::Button).with_name("nav.go"),
                ElementHandle::new("stay", Role::Button).with_name("nav.stay"),
            ])
        }

        #[test]
        fn test_navigate_waits_for_signature() {
            let app = buttons();
            let screen = Screen::new(&app, fast());
            let home = screen.navigate(&LocatorSpec::id("nav.go"), Home { screen }).unwrap();
            assert!(home.is_displayed());
        }

        #[test]
        fn test_missing_signature_is_unexpected_screen() {
            let app = buttons();
            let screen = Screen::new(&app, fast());
            match screen.navigate(&LocatorSpec::id("nav.stay"), Home { screen }) {
                Err(SuiteError::UnexpectedScreen { expected, action }) => {
                    assert_eq!(expected, "home");
                    assert!(action.contains("nav.stay"));
                }
                Err(other) => panic!("expected UnexpectedScreen, got {other:?}"),
                Ok(_) => panic!("navigation should not succeed"),
            }
        }
    }
}
