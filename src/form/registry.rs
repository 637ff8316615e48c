//! Membership table of live fields for one form scope

use super::field::FieldCell;
use crate::error::{FormError, FormResult};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::rc::{Rc, Weak};
use uuid::Uuid;

/// Opaque identity of a field, issued once when the field is created
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct FieldId(Uuid);

impl FieldId {
    /// Issue a fresh identity
    #[allow(clippy::new_without_default)]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl fmt::Display for FieldId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Non-owning set of registered fields keyed by identity
///
/// Fields are owned by their mount scope; the registry only keeps weak
/// references, so it never extends a field's lifetime.
#[derive(Default)]
pub(crate) struct Registry {
    fields: HashMap<FieldId, Weak<FieldCell>>,
}

impl Registry {
    /// Add a field. Returns false if the identity was already present, in
    /// which case nothing changes.
    pub fn insert(&mut self, cell: &Rc<FieldCell>) -> bool {
        let id = cell.id();
        if self.fields.contains_key(&id) {
            return false;
        }
        self.fields.insert(id, Rc::downgrade(cell));
        true
    }

    /// Remove a field that must currently be registered
    pub fn remove(&mut self, id: FieldId) -> FormResult<Weak<FieldCell>> {
        self.fields
            .remove(&id)
            .ok_or(FormError::UnpairedUnregister { field: id })
    }

    pub fn contains(&self, id: FieldId) -> bool {
        self.fields.contains_key(&id)
    }

    pub fn get(&self, id: FieldId) -> Option<Rc<FieldCell>> {
        self.fields.get(&id).and_then(Weak::upgrade)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn ids(&self) -> Vec<FieldId> {
        self.fields.keys().copied().collect()
    }

    /// Strong references to every registered field that is still alive.
    ///
    /// Callers iterate the returned list after releasing the registry borrow,
    /// so fields may register or unregister from inside their callbacks.
    pub fn live(&self) -> Vec<Rc<FieldCell>> {
        self.fields.values().filter_map(Weak::upgrade).collect()
    }
}
