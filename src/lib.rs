//! Formwatch - validation and change tracking for dynamic form fields
//!
//! The crate coordinates validation across a changing set of input fields
//! that belong to one logical form. It does not render anything and does not
//! capture raw input; the hosting UI feeds events in through
//! [`form::TextSource`] / [`form::FocusSource`] or the lifecycle methods on
//! [`form::FieldHandle`], and queries [`form::FormCoordinator`] for the
//! aggregate answers.
//!
//! All handles are single-threaded (`!Send`): a form and its fields live on
//! one thread.

pub mod config;
pub mod error;
pub mod form;

pub use config::FormConfig;
pub use error::{FormError, FormResult};
pub use form::{
    FieldHandle, FieldId, FieldOptions, FieldSnapshot, FormCoordinator, ValidationError,
};
