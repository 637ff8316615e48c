//! Drawing for the demo sign-up form

use super::app::{App, DemoField};
use ratatui::{
    layout::{Constraint, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};

/// Height of one field: bordered input plus an error line
const FIELD_HEIGHT: u16 = 4;

pub fn draw(frame: &mut Frame, app: &App) {
    let mut constraints = vec![Constraint::Length(2)];
    constraints.extend(app.fields.iter().map(|_| Constraint::Length(FIELD_HEIGHT)));
    constraints.push(Constraint::Length(3));
    constraints.push(Constraint::Min(1));
    let areas = Layout::vertical(constraints).split(frame.area());

    let title = Paragraph::new(Line::from(Span::styled(
        "Sign up",
        Style::default().add_modifier(Modifier::BOLD),
    )));
    frame.render_widget(title, areas[0]);

    for (index, field) in app.fields.iter().enumerate() {
        draw_field(frame, areas[index + 1], field, index == app.active);
    }

    let status_index = app.fields.len() + 1;
    draw_status(frame, areas[status_index], app);

    let help = Paragraph::new(Line::from(Span::styled(
        "Tab/Shift+Tab: move  Enter: submit  Esc: quit",
        Style::default().fg(Color::DarkGray),
    )));
    frame.render_widget(help, areas[status_index + 1]);
}

/// Draw one input with its error line underneath
fn draw_field(frame: &mut Frame, area: Rect, field: &DemoField, is_active: bool) {
    let snapshot = field.handle.snapshot();
    let [input_area, error_area] =
        Layout::vertical([Constraint::Length(3), Constraint::Length(1)]).areas(area);

    let border_style = if snapshot.should_show_error {
        Style::default().fg(Color::Red)
    } else if is_active {
        Style::default().fg(Color::Cyan)
    } else {
        Style::default().fg(Color::DarkGray)
    };

    let display_value = if field.masked {
        "•".repeat(snapshot.value.chars().count())
    } else {
        snapshot.value.clone()
    };
    let cursor = if is_active { "▌" } else { "" };

    let content = Paragraph::new(Line::from(vec![
        Span::raw(display_value),
        Span::styled(cursor, Style::default().fg(Color::Cyan)),
    ]));
    let block = Block::default()
        .title(format!(" {} ", field.label))
        .borders(Borders::ALL)
        .border_style(border_style);
    frame.render_widget(content.block(block), input_area);

    if snapshot.should_show_error {
        let message = snapshot.error.unwrap_or_default();
        let error = Paragraph::new(Line::from(Span::styled(
            format!(" {message}"),
            Style::default().fg(Color::Red),
        )));
        frame.render_widget(error, error_area);
    }
}

fn draw_status(frame: &mut Frame, area: Rect, app: &App) {
    let changed = if app.form.is_changed() { "yes" } else { "no" };
    let mut spans = vec![
        Span::raw(format!("changed: {changed}  edits: {}", app.edits.get())),
    ];
    if let Some(message) = &app.status_message {
        spans.push(Span::styled(
            format!("  {message}"),
            Style::default().fg(Color::Yellow),
        ));
    }
    let status = Paragraph::new(Line::from(spans)).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::DarkGray)),
    );
    frame.render_widget(status, area);
}
