//! Terminal sign-up form driving the form coordinator

mod app;
mod ui;

pub use app::App;
pub use ui::draw;
