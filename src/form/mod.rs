//! Form coordination layer
//!
//! Fields register with a [`FormCoordinator`] while they are mounted. The
//! coordinator answers "is this form valid" and "has this form changed" by
//! querying its live fields, and forwards every value mutation to a single
//! change callback.

mod coordinator;
mod field;
mod listener;
mod registry;
pub mod validator;

pub use coordinator::{FormCoordinator, ValidationError};
pub use field::{FieldHandle, FieldOptions, FieldSnapshot};
pub use listener::{ChangeListener, ErrorObserver, FocusSource, Subscription, TextSource};
pub use registry::FieldId;
pub use validator::Validator;
