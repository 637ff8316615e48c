//! Aggregate validation and change queries over a form's live fields

use super::field::{FieldCell, FieldHandle, FieldOptions, FieldSnapshot};
use super::listener::ChangeListener;
use super::registry::{FieldId, Registry};
use crate::config::FormConfig;
use crate::error::{FormError, FormResult};
use serde::Serialize;
use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::Rc;
use tracing::{debug, warn};

/// Last computed validation failure of one field
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationError {
    pub field: FieldId,
    pub name: Option<String>,
    pub message: String,
}

pub(crate) struct FormInner {
    config: Cell<FormConfig>,
    on_changed: RefCell<Option<Rc<dyn ChangeListener>>>,
    registry: RefCell<Registry>,
}

impl FormInner {
    pub(crate) fn config(&self) -> FormConfig {
        self.config.get()
    }

    pub(crate) fn field_did_change(&self) {
        let listener = self.on_changed.borrow().clone();
        if let Some(listener) = listener {
            listener.form_changed();
        }
    }

    fn live_fields(&self) -> Vec<Rc<FieldCell>> {
        self.registry.borrow().live()
    }
}

impl Drop for FormInner {
    fn drop(&mut self) {
        let remaining = self.registry.get_mut().len();
        if remaining > 0 {
            warn!(remaining, "form dropped while fields are still registered");
        }
    }
}

/// Owner of the set of live fields for one form scope
///
/// Cloning yields another handle to the same form. Fields keep only a weak
/// reference back, so the form ends when the last `FormCoordinator` clone
/// is dropped.
#[derive(Clone)]
pub struct FormCoordinator {
    inner: Rc<FormInner>,
}

impl FormCoordinator {
    pub fn new(config: FormConfig) -> Self {
        Self {
            inner: Rc::new(FormInner {
                config: Cell::new(config),
                on_changed: RefCell::new(None),
                registry: RefCell::new(Registry::default()),
            }),
        }
    }

    pub(crate) fn from_inner(inner: Rc<FormInner>) -> Self {
        Self { inner }
    }

    pub(crate) fn is_same_inner(&self, inner: &Rc<FormInner>) -> bool {
        Rc::ptr_eq(&self.inner, inner)
    }

    /// Builder form of [`FormCoordinator::set_on_changed`]
    pub fn with_on_changed(self, listener: impl ChangeListener + 'static) -> Self {
        self.set_on_changed(listener);
        self
    }

    /// Install the callback fired once per field value mutation
    pub fn set_on_changed(&self, listener: impl ChangeListener + 'static) {
        *self.inner.on_changed.borrow_mut() = Some(Rc::new(listener));
    }

    pub fn clear_on_changed(&self) {
        *self.inner.on_changed.borrow_mut() = None;
    }

    pub fn config(&self) -> FormConfig {
        self.inner.config()
    }

    /// Replace the shared policy. Fields pick it up on their next focus gain.
    pub fn set_config(&self, config: FormConfig) {
        self.inner.config.set(config);
    }

    /// Create a field and register it with this form
    pub fn add_field(&self, options: FieldOptions) -> FieldHandle {
        let field = FieldHandle::new(options);
        self.register(&field);
        field
    }

    /// Add `field` to this form
    ///
    /// Registering an already registered field is a no-op, since rebuilds
    /// legitimately re-register live fields. A field attached to another form
    /// is unregistered from it first.
    pub fn register(&self, field: &FieldHandle) {
        let cell = field.cell();
        if let Some(current) = cell.form() {
            if !Rc::ptr_eq(&current, &self.inner) {
                if let Err(err) = Self::from_inner(current).unregister(field) {
                    warn!(field = %cell.id(), "leaving previous form failed: {err}");
                }
            }
        }

        let inserted = self.inner.registry.borrow_mut().insert(cell);
        cell.set_form(Rc::downgrade(&self.inner));
        if inserted {
            debug!(field = %cell.id(), name = cell.name().unwrap_or(""), "field registered");
        }
    }

    /// Remove `field` from this form
    ///
    /// The field must currently be registered here; anything else is a
    /// mount/unmount pairing bug and is reported as
    /// [`FormError::UnpairedUnregister`].
    pub fn unregister(&self, field: &FieldHandle) -> FormResult<()> {
        let id = field.id();
        let removed = self.inner.registry.borrow_mut().remove(id);
        match removed {
            Ok(_) => {
                let cell = field.cell();
                if cell.form().is_some_and(|form| Rc::ptr_eq(&form, &self.inner)) {
                    cell.clear_form();
                }
                debug!(field = %id, "field unregistered");
                Ok(())
            }
            Err(err) => {
                warn!(field = %id, "unpaired unregister");
                Err(err)
            }
        }
    }

    /// Validate every registered field and report whether all passed
    ///
    /// Every field is validated, without stopping at the first failure, so
    /// all fields refresh their visible error together. With
    /// `force_show_error` every error becomes visible regardless of focus or
    /// touched state. Fails with [`FormError::EmptyRegistry`] when no field
    /// is registered.
    pub fn is_valid(&self, force_show_error: bool) -> FormResult<bool> {
        if self.inner.registry.borrow().is_empty() {
            warn!("is_valid called on a form with no registered fields");
            return Err(FormError::EmptyRegistry);
        }

        let mut valid = true;
        for cell in self.inner.live_fields() {
            // a callback of an earlier field may have unregistered this one
            if !self.contains(cell.id()) {
                continue;
            }
            if cell.validate(force_show_error).is_some() {
                valid = false;
            }
        }
        debug!(valid, force_show_error, "form validated");
        Ok(valid)
    }

    /// Validate a single registered field and return its error
    pub fn validate_field(
        &self,
        id: FieldId,
        force_show_error: bool,
    ) -> FormResult<Option<String>> {
        let cell = self.inner.registry.borrow().get(id);
        match cell {
            Some(cell) => Ok(cell.validate(force_show_error)),
            None => {
                warn!(field = %id, "validate_field called for an unregistered field");
                Err(FormError::NotRegistered { field: id })
            }
        }
    }

    /// Whether any registered field differs from its initial value
    pub fn is_changed(&self) -> bool {
        self.inner
            .live_fields()
            .iter()
            .any(|cell| cell.changed_from_initial())
    }

    /// Forward a field mutation to the change callback
    pub fn field_did_change(&self) {
        self.inner.field_did_change();
    }

    pub fn len(&self) -> usize {
        self.inner.registry.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.registry.borrow().is_empty()
    }

    pub fn contains(&self, id: FieldId) -> bool {
        self.inner.registry.borrow().contains(id)
    }

    pub fn field_ids(&self) -> Vec<FieldId> {
        self.inner.registry.borrow().ids()
    }

    pub fn snapshot(&self, id: FieldId) -> Option<FieldSnapshot> {
        let cell = self.inner.registry.borrow().get(id);
        cell.map(|cell| cell.snapshot())
    }

    /// First registered field with the given name
    pub fn find_by_name(&self, name: &str) -> Option<FieldSnapshot> {
        self.inner
            .live_fields()
            .into_iter()
            .find(|cell| cell.name() == Some(name))
            .map(|cell| cell.snapshot())
    }

    /// Last computed errors of all registered fields; does not revalidate
    pub fn errors(&self) -> Vec<ValidationError> {
        let mut errors: Vec<ValidationError> = self
            .inner
            .live_fields()
            .into_iter()
            .filter_map(|cell| {
                cell.error().map(|message| ValidationError {
                    field: cell.id(),
                    name: cell.name().map(str::to_string),
                    message,
                })
            })
            .collect();
        errors.sort_by(|a, b| a.name.cmp(&b.name).then(a.field.cmp(&b.field)));
        errors
    }
}

impl Default for FormCoordinator {
    fn default() -> Self {
        Self::new(FormConfig::default())
    }
}

impl fmt::Debug for FormCoordinator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FormCoordinator")
            .field("config", &self.config())
            .field("fields", &self.len())
            .finish()
    }
}
