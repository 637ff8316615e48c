//! Demo application state and key handling

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use formwatch::form::validator::{all, contains, min_length, required};
use formwatch::{FieldHandle, FieldOptions, FormConfig, FormCoordinator};
use std::cell::Cell;
use std::rc::Rc;

/// One field on the sign-up screen
pub struct DemoField {
    pub label: &'static str,
    pub handle: FieldHandle,
    /// Render the value as bullets
    pub masked: bool,
}

/// Main application struct
pub struct App {
    /// Declared before `form` so fields unregister before the form drops
    pub fields: Vec<DemoField>,
    pub form: FormCoordinator,
    /// Index of the field holding focus
    pub active: usize,
    /// Number of change notifications received from the form
    pub edits: Rc<Cell<u32>>,
    /// Result of the last submit
    pub status_message: Option<String>,
    quit: bool,
}

impl App {
    pub fn new(config: FormConfig) -> Self {
        let edits = Rc::new(Cell::new(0u32));
        let counter = Rc::clone(&edits);
        let form = FormCoordinator::new(config)
            .with_on_changed(move || counter.set(counter.get().saturating_add(1)));

        let fields = vec![
            DemoField {
                label: "Name",
                handle: form.add_field(
                    FieldOptions::new()
                        .name("name")
                        .validator(required("Please enter your name")),
                ),
                masked: false,
            },
            DemoField {
                label: "Email",
                handle: form.add_field(
                    FieldOptions::new().name("email").validator(all(vec![
                        Box::new(required("Please enter your email")),
                        Box::new(contains("@", "Please enter a valid email")),
                    ])),
                ),
                masked: false,
            },
            DemoField {
                label: "Password",
                handle: form.add_field(
                    FieldOptions::new()
                        .name("password")
                        .validator(min_length(8, "Use at least 8 characters")),
                ),
                masked: true,
            },
        ];

        let app = Self {
            fields,
            form,
            active: 0,
            edits,
            status_message: None,
            quit: false,
        };
        app.fields[0].handle.on_focus_gained();
        app
    }

    /// Check if app should quit
    pub fn should_quit(&self) -> bool {
        self.quit
    }

    pub fn active_field(&self) -> &DemoField {
        &self.fields[self.active]
    }

    pub fn handle_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Esc => self.quit = true,
            KeyCode::Tab => self.focus((self.active + 1) % self.fields.len()),
            KeyCode::BackTab => {
                let count = self.fields.len();
                self.focus((self.active + count - 1) % count);
            }
            KeyCode::Enter => self.submit(),
            KeyCode::Backspace => self.active_field().handle.text_source().pop_char(),
            KeyCode::Char(c) if !key.modifiers.contains(KeyModifiers::CONTROL) => {
                self.active_field().handle.text_source().push_char(c);
            }
            _ => {}
        }
    }

    /// Move focus to the field at `index`
    fn focus(&mut self, index: usize) {
        if index == self.active {
            return;
        }
        self.fields[self.active].handle.on_focus_lost();
        self.active = index;
        self.fields[self.active].handle.on_focus_gained();
    }

    fn submit(&mut self) {
        let message = match self.form.is_valid(true) {
            Ok(true) => {
                let name = self.fields[0].handle.value();
                tracing::info!(name = %name, "sign-up submitted");
                format!("Welcome, {name}!")
            }
            Ok(false) => {
                let count = self.form.errors().len();
                tracing::info!(count, "sign-up rejected");
                format!("Please fix {count} field(s)")
            }
            Err(err) => {
                tracing::warn!("submit failed: {err}");
                format!("Error: {err}")
            }
        };
        self.status_message = Some(message);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn type_text(app: &mut App, text: &str) {
        for c in text.chars() {
            app.handle_key(key(KeyCode::Char(c)));
        }
    }

    #[test]
    fn test_starts_focused_on_first_field() {
        let app = App::new(FormConfig::default());
        assert_eq!(app.active, 0);
        assert!(app.fields[0].handle.is_focused());
        assert_eq!(app.form.len(), 3);
    }

    #[test]
    fn test_typing_updates_active_field_and_counts_edits() {
        let mut app = App::new(FormConfig::default());
        type_text(&mut app, "Ada");
        assert_eq!(app.fields[0].handle.value(), "Ada");
        assert_eq!(app.edits.get(), 3);
        assert!(app.form.is_changed());

        app.handle_key(key(KeyCode::Backspace));
        assert_eq!(app.fields[0].handle.value(), "Ad");
    }

    #[test]
    fn test_tab_moves_focus_and_validates_previous() {
        let mut app = App::new(FormConfig::default());
        type_text(&mut app, " ");
        app.handle_key(key(KeyCode::Tab));
        assert_eq!(app.active, 1);
        assert!(app.fields[0].handle.has_error());

        app.handle_key(key(KeyCode::BackTab));
        app.handle_key(key(KeyCode::BackTab));
        assert_eq!(app.active, 2);
    }

    #[test]
    fn test_submit_shows_all_errors() {
        let mut app = App::new(FormConfig::default());
        app.handle_key(key(KeyCode::Enter));

        assert_eq!(app.status_message.as_deref(), Some("Please fix 3 field(s)"));
        assert!(app.fields.iter().all(|f| f.handle.should_show_error()));
    }

    #[test]
    fn test_valid_submit() {
        let mut app = App::new(FormConfig::default());
        type_text(&mut app, "Ada");
        app.handle_key(key(KeyCode::Tab));
        type_text(&mut app, "ada@example.com");
        app.handle_key(key(KeyCode::Tab));
        type_text(&mut app, "correct horse");
        app.handle_key(key(KeyCode::Enter));

        assert_eq!(app.status_message.as_deref(), Some("Welcome, Ada!"));
    }

    #[test]
    fn test_escape_quits() {
        let mut app = App::new(FormConfig::default());
        assert!(!app.should_quit());
        app.handle_key(key(KeyCode::Esc));
        assert!(app.should_quit());
    }
}
