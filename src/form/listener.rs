//! Observer traits and externally suppliable value/focus sources
//!
//! A field never reaches into the rendering layer. Instead the rendering
//! layer hands it a [`TextSource`] and a [`FocusSource`] (or lets the field
//! create its own) and pushes raw input events into them. The field listens
//! through a [`Subscription`] that it cancels when it is rebound or disposed.

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::{Rc, Weak};

/// Receives a notification every time any field of a form mutates its value
#[cfg_attr(test, mockall::automock)]
pub trait ChangeListener {
    fn form_changed(&self);
}

impl<F> ChangeListener for F
where
    F: Fn(),
{
    fn form_changed(&self) {
        self()
    }
}

/// Receives the error of a field whenever its visible-error state is recomputed
///
/// The payload is the literal validator message, or `None` when the field
/// currently has no error.
#[cfg_attr(test, mockall::automock)]
pub trait ErrorObserver {
    fn error_changed(&self, error: Option<String>);
}

impl<F> ErrorObserver for F
where
    F: Fn(Option<String>),
{
    fn error_changed(&self, error: Option<String>) {
        self(error)
    }
}

type Callback<A> = Rc<dyn Fn(&A)>;

/// Ordered list of callbacks keyed by a monotonically increasing id
struct Listeners<A> {
    next_id: Cell<u64>,
    entries: RefCell<Vec<(u64, Callback<A>)>>,
}

impl<A> Listeners<A> {
    fn new() -> Self {
        Self {
            next_id: Cell::new(0),
            entries: RefCell::new(Vec::new()),
        }
    }

    fn add(&self, callback: Callback<A>) -> u64 {
        let id = self.next_id.get();
        self.next_id.set(id + 1);
        self.entries.borrow_mut().push((id, callback));
        id
    }

    fn remove(&self, id: u64) -> bool {
        let mut entries = self.entries.borrow_mut();
        let before = entries.len();
        entries.retain(|(entry_id, _)| *entry_id != id);
        entries.len() != before
    }

    fn len(&self) -> usize {
        self.entries.borrow().len()
    }

    /// Invoke every callback registered at the time of the call.
    ///
    /// The list is copied first so callbacks may subscribe or unsubscribe.
    fn notify(&self, value: &A) {
        let callbacks: Vec<Callback<A>> = self
            .entries
            .borrow()
            .iter()
            .map(|(_, callback)| Rc::clone(callback))
            .collect();
        for callback in callbacks {
            callback(value);
        }
    }
}

/// Handle for a registered listener; dropping it unsubscribes
#[must_use = "dropping a Subscription unsubscribes the listener immediately"]
pub struct Subscription {
    cancel: Option<Box<dyn FnOnce()>>,
}

impl Subscription {
    fn new(cancel: impl FnOnce() + 'static) -> Self {
        Self {
            cancel: Some(Box::new(cancel)),
        }
    }

    /// Unsubscribe now
    pub fn cancel(mut self) {
        self.run_cancel();
    }

    fn run_cancel(&mut self) {
        if let Some(cancel) = self.cancel.take() {
            cancel();
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.run_cancel();
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("active", &self.cancel.is_some())
            .finish()
    }
}

struct TextInner {
    text: RefCell<String>,
    listeners: Listeners<String>,
}

/// Shared, observable text value driven by the rendering layer
///
/// Clones share the same value. Every call to [`TextSource::set_text`] is a
/// value-change event and notifies listeners, even if the text is unchanged.
#[derive(Clone)]
pub struct TextSource {
    inner: Rc<TextInner>,
}

impl TextSource {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            inner: Rc::new(TextInner {
                text: RefCell::new(text.into()),
                listeners: Listeners::new(),
            }),
        }
    }

    /// Current text
    pub fn text(&self) -> String {
        self.inner.text.borrow().clone()
    }

    /// Replace the text and notify listeners
    pub fn set_text(&self, text: impl Into<String>) {
        let text = text.into();
        *self.inner.text.borrow_mut() = text.clone();
        self.inner.listeners.notify(&text);
    }

    /// Append a character to the text
    pub fn push_char(&self, c: char) {
        let mut text = self.text();
        text.push(c);
        self.set_text(text);
    }

    /// Remove the last character from the text, if any
    pub fn pop_char(&self) {
        let mut text = self.text();
        if text.pop().is_some() {
            self.set_text(text);
        }
    }

    pub fn subscribe(&self, listener: impl Fn(&str) + 'static) -> Subscription {
        let id = self
            .inner
            .listeners
            .add(Rc::new(move |text: &String| listener(text)));
        let weak: Weak<TextInner> = Rc::downgrade(&self.inner);
        Subscription::new(move || {
            if let Some(inner) = weak.upgrade() {
                inner.listeners.remove(id);
            }
        })
    }

    pub fn listener_count(&self) -> usize {
        self.inner.listeners.len()
    }

    /// Whether both handles refer to the same underlying value
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }
}

impl Default for TextSource {
    fn default() -> Self {
        Self::new(String::new())
    }
}

impl fmt::Debug for TextSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TextSource")
            .field("text", &*self.inner.text.borrow())
            .field("listeners", &self.listener_count())
            .finish()
    }
}

struct FocusInner {
    focused: Cell<bool>,
    listeners: Listeners<bool>,
}

/// Shared, observable focus flag driven by the rendering layer
///
/// Every call to [`FocusSource::set_focused`] is a focus event and notifies
/// listeners with the new state.
#[derive(Clone)]
pub struct FocusSource {
    inner: Rc<FocusInner>,
}

impl FocusSource {
    pub fn new() -> Self {
        Self {
            inner: Rc::new(FocusInner {
                focused: Cell::new(false),
                listeners: Listeners::new(),
            }),
        }
    }

    pub fn has_focus(&self) -> bool {
        self.inner.focused.get()
    }

    pub fn set_focused(&self, focused: bool) {
        self.inner.focused.set(focused);
        self.inner.listeners.notify(&focused);
    }

    pub fn request_focus(&self) {
        self.set_focused(true);
    }

    pub fn unfocus(&self) {
        self.set_focused(false);
    }

    pub fn subscribe(&self, listener: impl Fn(bool) + 'static) -> Subscription {
        let id = self
            .inner
            .listeners
            .add(Rc::new(move |focused: &bool| listener(*focused)));
        let weak: Weak<FocusInner> = Rc::downgrade(&self.inner);
        Subscription::new(move || {
            if let Some(inner) = weak.upgrade() {
                inner.listeners.remove(id);
            }
        })
    }

    pub fn listener_count(&self) -> usize {
        self.inner.listeners.len()
    }

    pub fn ptr_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }
}

impl Default for FocusSource {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for FocusSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FocusSource")
            .field("focused", &self.has_focus())
            .field("listeners", &self.listener_count())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    mod text_source {
        use super::*;

        #[test]
        fn test_set_text_notifies_every_call() {
            let source = TextSource::new("a");
            let seen = Rc::new(RefCell::new(Vec::new()));
            let sink = Rc::clone(&seen);
            let _sub = source.subscribe(move |text| sink.borrow_mut().push(text.to_string()));

            source.set_text("b");
            source.set_text("b");

            assert_eq!(*seen.borrow(), vec!["b".to_string(), "b".to_string()]);
            assert_eq!(source.text(), "b");
        }

        #[test]
        fn test_dropping_subscription_unsubscribes() {
            let source = TextSource::default();
            let count = Rc::new(Cell::new(0));
            let counter = Rc::clone(&count);
            let sub = source.subscribe(move |_| counter.set(counter.get() + 1));
            assert_eq!(source.listener_count(), 1);

            drop(sub);
            source.set_text("x");

            assert_eq!(source.listener_count(), 0);
            assert_eq!(count.get(), 0);
        }

        #[test]
        fn test_cancel_is_explicit_unsubscribe() {
            let source = TextSource::default();
            let sub = source.subscribe(|_| {});
            sub.cancel();
            assert_eq!(source.listener_count(), 0);
        }

        #[test]
        fn test_push_and_pop_char() {
            let source = TextSource::new("ab");
            source.push_char('c');
            assert_eq!(source.text(), "abc");
            source.pop_char();
            source.pop_char();
            assert_eq!(source.text(), "a");
        }

        #[test]
        fn test_pop_char_on_empty_does_not_notify() {
            let source = TextSource::default();
            let count = Rc::new(Cell::new(0));
            let counter = Rc::clone(&count);
            let _sub = source.subscribe(move |_| counter.set(counter.get() + 1));
            source.pop_char();
            assert_eq!(count.get(), 0);
        }

        #[test]
        fn test_clones_share_value() {
            let source = TextSource::new("x");
            let other = source.clone();
            other.set_text("y");
            assert_eq!(source.text(), "y");
            assert!(source.ptr_eq(&other));
            assert!(!source.ptr_eq(&TextSource::new("y")));
        }

        #[test]
        fn test_listener_may_unsubscribe_during_notify() {
            let source = TextSource::default();
            let slot: Rc<RefCell<Option<Subscription>>> = Rc::new(RefCell::new(None));
            let inner_slot = Rc::clone(&slot);
            let sub = source.subscribe(move |_| {
                inner_slot.borrow_mut().take();
            });
            *slot.borrow_mut() = Some(sub);

            source.set_text("go");

            assert_eq!(source.listener_count(), 0);
        }

        #[test]
        fn test_subscription_outliving_source_is_harmless() {
            let source = TextSource::default();
            let sub = source.subscribe(|_| {});
            drop(source);
            sub.cancel();
        }
    }

    mod focus_source {
        use super::*;

        #[test]
        fn test_request_focus_and_unfocus() {
            let source = FocusSource::new();
            let seen = Rc::new(RefCell::new(Vec::new()));
            let sink = Rc::clone(&seen);
            let _sub = source.subscribe(move |focused| sink.borrow_mut().push(focused));

            source.request_focus();
            assert!(source.has_focus());
            source.unfocus();
            assert!(!source.has_focus());

            assert_eq!(*seen.borrow(), vec![true, false]);
        }

        #[test]
        fn test_default_is_unfocused() {
            assert!(!FocusSource::default().has_focus());
        }
    }

    mod observers {
        use super::*;

        #[test]
        fn test_closure_is_change_listener() {
            let count = Rc::new(Cell::new(0));
            let counter = Rc::clone(&count);
            let listener = move || counter.set(counter.get() + 1);
            listener.form_changed();
            listener.form_changed();
            assert_eq!(count.get(), 2);
        }

        #[test]
        fn test_closure_is_error_observer() {
            let last = Rc::new(RefCell::new(None));
            let sink = Rc::clone(&last);
            let observer = move |error: Option<String>| *sink.borrow_mut() = error;
            observer.error_changed(Some("bad".to_string()));
            assert_eq!(*last.borrow(), Some("bad".to_string()));
        }
    }
}
