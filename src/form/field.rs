//! Per-field validation state machine
//!
//! A [`FieldHandle`] tracks one input's value, focus and touched flags and
//! the last validation result. It reads the shared focus policy from the
//! form it is attached to and reports every value mutation back to it.
//!
//! Error visibility is derived, never stored:
//!
//! | has error | touched | focused | error hidden | shown |
//! |-----------|---------|---------|--------------|-------|
//! | no        | -       | -       | -            | no    |
//! | yes       | no      | -       | -            | no    |
//! | yes       | yes     | yes     | -            | no    |
//! | yes       | yes     | no      | yes          | no    |
//! | yes       | yes     | no      | no           | yes   |

use super::coordinator::{FormCoordinator, FormInner};
use super::listener::{ErrorObserver, FocusSource, Subscription, TextSource};
use super::registry::FieldId;
use super::validator::Validator;
use crate::error::{FormError, FormResult};
use serde::Serialize;
use std::cell::RefCell;
use std::fmt;
use std::rc::{Rc, Weak};
use tracing::{debug, trace, warn};

/// Mutable flags and values of a field
#[derive(Debug, Clone, Default)]
struct FieldState {
    current_value: String,
    initial_value: String,
    /// Last computed validator result
    error: Option<String>,
    is_focused: bool,
    is_touched: bool,
    is_error_hidden: bool,
    changed_from_initial: bool,
}

impl FieldState {
    fn should_show_error(&self) -> bool {
        self.error.is_some() && self.is_touched && !self.is_error_hidden && !self.is_focused
    }
}

/// Point-in-time copy of a field's state
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldSnapshot {
    pub id: FieldId,
    pub name: Option<String>,
    pub value: String,
    pub initial_value: String,
    pub error: Option<String>,
    pub is_focused: bool,
    pub is_touched: bool,
    pub is_error_hidden: bool,
    pub changed_from_initial: bool,
    pub should_show_error: bool,
}

impl FieldSnapshot {
    pub fn has_error(&self) -> bool {
        self.error.is_some()
    }
}

/// Shared core of a field, reachable from the registry and from source
/// listeners. Borrows never outlive a single method, and no borrow is held
/// while user callbacks run.
pub(crate) struct FieldCell {
    id: FieldId,
    name: Option<String>,
    state: RefCell<FieldState>,
    validator: RefCell<Option<Rc<dyn Validator>>>,
    on_error: RefCell<Option<Rc<dyn ErrorObserver>>>,
    form: RefCell<Weak<FormInner>>,
}

impl FieldCell {
    pub(crate) fn new(
        id: FieldId,
        name: Option<String>,
        initial_value: String,
        validator: Option<Rc<dyn Validator>>,
    ) -> Self {
        Self {
            id,
            name,
            state: RefCell::new(FieldState {
                current_value: initial_value.clone(),
                initial_value,
                ..FieldState::default()
            }),
            validator: RefCell::new(validator),
            on_error: RefCell::new(None),
            form: RefCell::new(Weak::new()),
        }
    }

    pub(crate) fn id(&self) -> FieldId {
        self.id
    }

    pub(crate) fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub(crate) fn form(&self) -> Option<Rc<FormInner>> {
        self.form.borrow().upgrade()
    }

    pub(crate) fn set_form(&self, form: Weak<FormInner>) {
        *self.form.borrow_mut() = form;
    }

    pub(crate) fn clear_form(&self) {
        *self.form.borrow_mut() = Weak::new();
    }

    fn focus_gained(&self) {
        let hide_error_on_focus = self
            .form()
            .map(|form| form.config().hide_error_on_focus)
            .unwrap_or(false);
        let mut state = self.state.borrow_mut();
        state.is_focused = true;
        state.is_error_hidden = hide_error_on_focus;
        trace!(field = %self.id, hide_error_on_focus, "focus gained");
    }

    fn focus_lost(&self) {
        {
            let mut state = self.state.borrow_mut();
            state.is_focused = false;
            state.is_error_hidden = false;
        }
        trace!(field = %self.id, "focus lost");
        self.validate(false);
    }

    /// Record a value mutation and notify the owning form once
    fn value_changed(&self, value: String) {
        {
            let mut state = self.state.borrow_mut();
            state.changed_from_initial = value != state.initial_value;
            if !state.is_touched {
                state.is_touched = !value.trim().is_empty();
            }
            state.current_value = value;
            trace!(
                field = %self.id,
                changed = state.changed_from_initial,
                touched = state.is_touched,
                "value changed"
            );
        }
        if let Some(form) = self.form() {
            form.field_did_change();
        }
    }

    /// Take over a value without it counting as a user mutation
    fn adopt_value(&self, value: String) {
        let mut state = self.state.borrow_mut();
        state.changed_from_initial = value != state.initial_value;
        state.current_value = value;
    }

    pub(crate) fn validate(&self, force_show_error: bool) -> Option<String> {
        let validator = self.validator.borrow().clone();
        let Some(validator) = validator else {
            return None;
        };
        let value = self.state.borrow().current_value.clone();
        let result = validator.validate(&value);

        let notify = {
            let mut state = self.state.borrow_mut();
            state.error = result.clone();
            if force_show_error {
                state.is_error_hidden = false;
                state.is_focused = false;
                state.is_touched = true;
            }
            force_show_error || (!state.is_focused && state.is_touched)
        };
        trace!(
            field = %self.id,
            has_error = result.is_some(),
            force_show_error,
            "validated"
        );

        if notify {
            let observer = self.on_error.borrow().clone();
            if let Some(observer) = observer {
                observer.error_changed(result.clone());
            }
        }
        result
    }

    pub(crate) fn changed_from_initial(&self) -> bool {
        self.state.borrow().changed_from_initial
    }

    pub(crate) fn error(&self) -> Option<String> {
        self.state.borrow().error.clone()
    }

    pub(crate) fn snapshot(&self) -> FieldSnapshot {
        let state = self.state.borrow();
        FieldSnapshot {
            id: self.id,
            name: self.name.clone(),
            value: state.current_value.clone(),
            initial_value: state.initial_value.clone(),
            error: state.error.clone(),
            is_focused: state.is_focused,
            is_touched: state.is_touched,
            is_error_hidden: state.is_error_hidden,
            changed_from_initial: state.changed_from_initial,
            should_show_error: state.should_show_error(),
        }
    }
}

/// Construction parameters for a [`FieldHandle`]
#[derive(Default)]
pub struct FieldOptions {
    name: Option<String>,
    initial_value: Option<String>,
    validator: Option<Rc<dyn Validator>>,
    on_error: Option<Rc<dyn ErrorObserver>>,
    text_source: Option<TextSource>,
    focus_source: Option<FocusSource>,
}

impl FieldOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Human-readable name used for lookups and diagnostics
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Initial value of an owned text source. Ignored when an external
    /// text source is supplied; that source's text is the initial value.
    pub fn initial_value(mut self, value: impl Into<String>) -> Self {
        self.initial_value = Some(value.into());
        self
    }

    pub fn validator(mut self, validator: impl Validator + 'static) -> Self {
        self.validator = Some(Rc::new(validator));
        self
    }

    pub fn on_error(mut self, observer: impl ErrorObserver + 'static) -> Self {
        self.on_error = Some(Rc::new(observer));
        self
    }

    pub fn text_source(mut self, source: TextSource) -> Self {
        self.text_source = Some(source);
        self
    }

    pub fn focus_source(mut self, source: FocusSource) -> Self {
        self.focus_source = Some(source);
        self
    }
}

/// A source the field listens to, plus whether the field created it
struct SourceBinding<S> {
    source: S,
    owned: bool,
    subscription: Option<Subscription>,
}

impl<S> SourceBinding<S> {
    fn unsubscribe(&mut self) {
        if let Some(subscription) = self.subscription.take() {
            subscription.cancel();
        }
    }
}

fn subscribe_text(cell: &Rc<FieldCell>, source: &TextSource) -> Subscription {
    let weak = Rc::downgrade(cell);
    source.subscribe(move |text| {
        if let Some(cell) = weak.upgrade() {
            cell.value_changed(text.to_string());
        }
    })
}

fn subscribe_focus(cell: &Rc<FieldCell>, source: &FocusSource) -> Subscription {
    let weak = Rc::downgrade(cell);
    source.subscribe(move |focused| {
        if let Some(cell) = weak.upgrade() {
            if focused {
                cell.focus_gained();
            } else {
                cell.focus_lost();
            }
        }
    })
}

/// One validated input, owned by its mount scope
///
/// The hosting environment drives the field through its lifecycle methods
/// (`attach`, `on_focus_gained`, `on_focus_lost`, `on_value_changed`,
/// `detach`) or, equivalently, through the field's [`TextSource`] and
/// [`FocusSource`]. Dropping the handle tears it down like [`dispose`].
///
/// [`dispose`]: FieldHandle::dispose
pub struct FieldHandle {
    cell: Rc<FieldCell>,
    text: SourceBinding<TextSource>,
    focus: SourceBinding<FocusSource>,
    disposed: bool,
}

impl FieldHandle {
    pub fn new(options: FieldOptions) -> Self {
        let FieldOptions {
            name,
            initial_value,
            validator,
            on_error,
            text_source,
            focus_source,
        } = options;

        let (text_source, owns_text) = match text_source {
            Some(source) => (source, false),
            None => (TextSource::new(initial_value.unwrap_or_default()), true),
        };
        let (focus_source, owns_focus) = match focus_source {
            Some(source) => (source, false),
            None => (FocusSource::new(), true),
        };

        let cell = Rc::new(FieldCell::new(
            FieldId::new(),
            name,
            text_source.text(),
            validator,
        ));
        *cell.on_error.borrow_mut() = on_error;

        let text_subscription = subscribe_text(&cell, &text_source);
        let focus_subscription = subscribe_focus(&cell, &focus_source);
        debug!(
            field = %cell.id,
            name = cell.name().unwrap_or(""),
            owns_text,
            owns_focus,
            "field created"
        );

        Self {
            cell,
            text: SourceBinding {
                source: text_source,
                owned: owns_text,
                subscription: Some(text_subscription),
            },
            focus: SourceBinding {
                source: focus_source,
                owned: owns_focus,
                subscription: Some(focus_subscription),
            },
            disposed: false,
        }
    }

    pub(crate) fn cell(&self) -> &Rc<FieldCell> {
        &self.cell
    }

    pub fn id(&self) -> FieldId {
        self.cell.id
    }

    pub fn name(&self) -> Option<&str> {
        self.cell.name()
    }

    /// Register with `form`, leaving any previously attached form first
    pub fn attach(&self, form: &FormCoordinator) {
        form.register(self);
    }

    /// Unregister from the attached form
    pub fn detach(&self) -> FormResult<()> {
        match self.cell.form() {
            Some(form) => FormCoordinator::from_inner(form).unregister(self),
            None => {
                warn!(field = %self.cell.id, "detach called on a field that is not attached");
                Err(FormError::UnpairedUnregister {
                    field: self.cell.id,
                })
            }
        }
    }

    pub fn is_attached(&self) -> bool {
        self.cell.form().is_some()
    }

    /// Whether this field is attached to `form`
    pub fn is_attached_to(&self, form: &FormCoordinator) -> bool {
        self.cell
            .form()
            .is_some_and(|inner| form.is_same_inner(&inner))
    }

    pub fn on_focus_gained(&self) {
        self.focus.source.request_focus();
    }

    pub fn on_focus_lost(&self) {
        self.focus.source.unfocus();
    }

    pub fn on_value_changed(&self, value: impl Into<String>) {
        self.text.source.set_text(value);
    }

    /// Run the validator against the current value
    ///
    /// With `force_show_error` the field is marked touched and unfocused so
    /// that any error becomes visible, e.g. on submit.
    pub fn validate(&self, force_show_error: bool) -> Option<String> {
        self.cell.validate(force_show_error)
    }

    pub fn should_show_error(&self) -> bool {
        self.cell.state.borrow().should_show_error()
    }

    pub fn has_error(&self) -> bool {
        self.cell.state.borrow().error.is_some()
    }

    /// Last computed error message
    pub fn error(&self) -> Option<String> {
        self.cell.error()
    }

    pub fn value(&self) -> String {
        self.cell.state.borrow().current_value.clone()
    }

    pub fn initial_value(&self) -> String {
        self.cell.state.borrow().initial_value.clone()
    }

    pub fn is_focused(&self) -> bool {
        self.cell.state.borrow().is_focused
    }

    pub fn is_touched(&self) -> bool {
        self.cell.state.borrow().is_touched
    }

    pub fn is_error_hidden(&self) -> bool {
        self.cell.state.borrow().is_error_hidden
    }

    pub fn changed_from_initial(&self) -> bool {
        self.cell.changed_from_initial()
    }

    pub fn snapshot(&self) -> FieldSnapshot {
        self.cell.snapshot()
    }

    pub fn text_source(&self) -> TextSource {
        self.text.source.clone()
    }

    pub fn focus_source(&self) -> FocusSource {
        self.focus.source.clone()
    }

    pub fn owns_text_source(&self) -> bool {
        self.text.owned
    }

    pub fn owns_focus_source(&self) -> bool {
        self.focus.owned
    }

    /// Listen to a different text source
    ///
    /// The old subscription is cancelled before the new one is made. The
    /// field takes over the new source's text as its current value without
    /// firing a change notification; the initial value is kept.
    pub fn set_text_source(&mut self, source: TextSource) {
        if self.text.source.ptr_eq(&source) {
            return;
        }
        self.text.unsubscribe();
        self.cell.adopt_value(source.text());
        let subscription = subscribe_text(&self.cell, &source);
        debug!(field = %self.cell.id, released_owned = self.text.owned, "text source rebound");
        self.text = SourceBinding {
            source,
            owned: false,
            subscription: Some(subscription),
        };
    }

    /// Listen to a different focus source
    pub fn set_focus_source(&mut self, source: FocusSource) {
        if self.focus.source.ptr_eq(&source) {
            return;
        }
        self.focus.unsubscribe();
        let subscription = subscribe_focus(&self.cell, &source);
        debug!(field = %self.cell.id, released_owned = self.focus.owned, "focus source rebound");
        self.focus = SourceBinding {
            source,
            owned: false,
            subscription: Some(subscription),
        };
    }

    /// Swap the validation rule. The last computed error belonged to the old
    /// rule and is cleared; the next validation recomputes it.
    pub fn set_validator(&self, validator: Option<Rc<dyn Validator>>) {
        *self.cell.validator.borrow_mut() = validator;
        self.cell.state.borrow_mut().error = None;
    }

    pub fn set_on_error(&self, observer: Option<Rc<dyn ErrorObserver>>) {
        *self.cell.on_error.borrow_mut() = observer;
    }

    /// Tear the field down: unregister from its form if attached and detach
    /// every listener. Owned sources are released with the handle.
    pub fn dispose(mut self) -> FormResult<()> {
        self.teardown()
    }

    fn teardown(&mut self) -> FormResult<()> {
        if self.disposed {
            return Ok(());
        }
        self.disposed = true;

        let result = match self.cell.form() {
            Some(form) => FormCoordinator::from_inner(form).unregister(self),
            None => Ok(()),
        };
        self.text.unsubscribe();
        self.focus.unsubscribe();
        *self.cell.on_error.borrow_mut() = None;
        debug!(field = %self.cell.id, "field disposed");
        result
    }
}

impl Drop for FieldHandle {
    fn drop(&mut self) {
        if let Err(err) = self.teardown() {
            warn!(field = %self.cell.id, "teardown on drop failed: {err}");
        }
    }
}

impl fmt::Debug for FieldHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FieldHandle")
            .field("snapshot", &self.snapshot())
            .field("attached", &self.is_attached())
            .finish()
    }
}
