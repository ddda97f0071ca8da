use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, BorderType, Borders, Clear, Paragraph, Row, Table, Wrap},
    Frame,
};
use todoboard_core::{FormErrors, Status};
use unicode_width::UnicodeWidthStr;

use crate::tui::app::{App, Field, Focus};

/// Everything the form renderer needs, borrowed from either controller.
struct FormView<'a> {
    title: &'a str,
    description: &'a str,
    errors: Option<&'a FormErrors>,
    submitting: bool,
    focus: Option<Field>,
    submit_label: &'a str,
}

pub fn draw(f: &mut Frame, app: &mut App) {
    let size = f.area();

    let main_chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Header
            Constraint::Min(1),    // Content
            Constraint::Length(1), // Notice
            Constraint::Length(1), // Footer/Help
        ])
        .split(size);

    draw_header(f, app, main_chunks[0]);

    let content_chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(60), Constraint::Percentage(40)])
        .split(main_chunks[1]);

    draw_task_list(f, app, content_chunks[0]);

    let create_focus = match app.focus {
        Focus::Create(field) => Some(field),
        _ => None,
    };
    let create_view = FormView {
        title: app.create.title(),
        description: app.create.description(),
        errors: app.create.errors(),
        submitting: app.create.is_submitting(),
        focus: create_focus,
        submit_label: "Add task",
    };
    draw_form(f, content_chunks[1], " New Task ", &create_view);

    if let Some(editor) = app.list.editor() {
        let area = centered_rect(60, 50, size);
        let edit_focus = match app.focus {
            Focus::Edit(field) => Some(field),
            _ => None,
        };
        let edit_view = FormView {
            title: editor.title(),
            description: editor.description(),
            errors: editor.errors(),
            submitting: editor.is_submitting(),
            focus: edit_focus,
            submit_label: "Save changes",
        };
        f.render_widget(Clear, area);
        draw_form(f, area, &format!(" Edit Task #{} ", editor.id()), &edit_view);
    }

    draw_notice(f, app, main_chunks[2]);

    let help = match app.focus {
        Focus::List => "j/k: Navigate | space: Toggle | e: Edit | d: Delete | a: New task | r: Reload | q: Quit",
        Focus::Create(_) => "Tab: Next field | Enter: Add | Esc: Back to list",
        Focus::Edit(_) => "Tab: Next field | Enter: Save | Esc: Cancel",
    };
    let footer = Paragraph::new(help)
        .style(Style::default().fg(Color::DarkGray))
        .alignment(Alignment::Center);
    f.render_widget(footer, main_chunks[3]);
}

fn draw_header(f: &mut Frame, app: &App, area: Rect) {
    let counts = app.list.counts();
    let header = Paragraph::new(Line::from(vec![
        Span::styled("TODOBOARD", Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD)),
        Span::raw("   "),
        Span::styled(
            format!(" Completed: {} ", counts.completed),
            Style::default().fg(Color::Black).bg(Color::Green),
        ),
        Span::raw(" "),
        Span::styled(
            format!(" Pending: {} ", counts.pending),
            Style::default().fg(Color::Black).bg(Color::Yellow),
        ),
    ]))
    .alignment(Alignment::Center)
    .block(Block::default().borders(Borders::ALL).border_type(BorderType::Rounded));
    f.render_widget(header, area);
}

fn draw_task_list(f: &mut Frame, app: &mut App, area: Rect) {
    let rows: Vec<Row> = app
        .list
        .tasks()
        .iter()
        .map(|task| {
            let (icon, status_style) = match task.status {
                Status::Completed => ("✔", Style::default().fg(Color::Green)),
                Status::Pending => ("☐", Style::default().fg(Color::Yellow)),
            };
            let title_style = if app.list.is_busy(task.id) {
                Style::default().fg(Color::DarkGray)
            } else {
                Style::default().add_modifier(Modifier::BOLD)
            };

            Row::new(vec![
                Span::styled(icon, status_style),
                Span::styled(task.title.clone(), title_style),
                Span::raw(task.description_or_empty().to_string()),
                Span::styled(task.status.as_str(), status_style),
            ])
        })
        .collect();

    let border_style = if app.focus == Focus::List {
        Style::default().fg(Color::Cyan)
    } else {
        Style::default()
    };

    let table = Table::new(
        rows,
        [
            Constraint::Length(3),      // Status icon
            Constraint::Percentage(35), // Title
            Constraint::Min(10),        // Description
            Constraint::Length(10),     // Status
        ],
    )
    .header(Row::new(vec!["St", "Task", "Description", "Status"]).style(Style::default().fg(Color::Yellow)))
    .block(
        Block::default()
            .title(" Tasks ")
            .borders(Borders::ALL)
            .border_type(BorderType::Rounded)
            .border_style(border_style),
    )
    .row_highlight_style(Style::default().bg(Color::DarkGray).add_modifier(Modifier::BOLD))
    .highlight_symbol(">> ");

    f.render_stateful_widget(table, area, &mut app.table);
}

fn draw_form(f: &mut Frame, area: Rect, heading: &str, view: &FormView) {
    let block = Block::default()
        .title(heading.to_string())
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(if view.focus.is_some() {
            Style::default().fg(Color::Cyan)
        } else {
            Style::default()
        });
    let inner = block.inner(area);
    f.render_widget(block, area);

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Title input
            Constraint::Length(1), // Title error
            Constraint::Min(3),    // Description input
            Constraint::Length(2), // General error
            Constraint::Length(1), // Submit
        ])
        .split(inner);

    let title_error = view.errors.and_then(|e| e.title());
    let input_style = if view.submitting {
        Style::default().fg(Color::DarkGray)
    } else {
        Style::default()
    };

    let title_border = if title_error.is_some() {
        Style::default().fg(Color::Red)
    } else if view.focus == Some(Field::Title) {
        Style::default().fg(Color::Cyan)
    } else {
        Style::default()
    };
    let title_input = Paragraph::new(view.title).style(input_style).block(
        Block::default()
            .title(" Title * ")
            .borders(Borders::ALL)
            .border_style(title_border),
    );
    f.render_widget(title_input, chunks[0]);

    if let Some(message) = title_error {
        f.render_widget(
            Paragraph::new(message).style(Style::default().fg(Color::Red)),
            chunks[1],
        );
    }

    let description_border = if view.focus == Some(Field::Description) {
        Style::default().fg(Color::Cyan)
    } else {
        Style::default()
    };
    let description_input = Paragraph::new(view.description)
        .style(input_style)
        .wrap(Wrap { trim: false })
        .block(
            Block::default()
                .title(" Description ")
                .borders(Borders::ALL)
                .border_style(description_border),
        );
    f.render_widget(description_input, chunks[2]);

    if let Some(message) = view.errors.and_then(|e| e.general()) {
        f.render_widget(
            Paragraph::new(message)
                .style(Style::default().fg(Color::Red).add_modifier(Modifier::BOLD))
                .wrap(Wrap { trim: true }),
            chunks[3],
        );
    }

    let submit = if view.submitting {
        Span::styled("Sending...", Style::default().fg(Color::DarkGray))
    } else {
        Span::styled(
            format!("[ {} ]", view.submit_label),
            Style::default().fg(Color::Blue).add_modifier(Modifier::BOLD),
        )
    };
    f.render_widget(Paragraph::new(Line::from(submit)).alignment(Alignment::Right), chunks[4]);

    // Cursor at the end of the focused input, unless inputs are disabled.
    if view.submitting {
        return;
    }
    match view.focus {
        Some(Field::Title) => {
            let x = cursor_x(chunks[0], view.title);
            f.set_cursor_position((x.min(chunks[0].right().saturating_sub(2)), chunks[0].y + 1));
        }
        Some(Field::Description) => {
            let x = cursor_x(chunks[2], view.description);
            f.set_cursor_position((x.min(chunks[2].right().saturating_sub(2)), chunks[2].y + 1));
        }
        None => {}
    }
}

/// Column just past `text` inside a bordered input.
fn cursor_x(input: Rect, text: &str) -> u16 {
    let width = u16::try_from(text.width()).unwrap_or(u16::MAX);
    input.x.saturating_add(1).saturating_add(width)
}

fn draw_notice(f: &mut Frame, app: &App, area: Rect) {
    let line = if let Some(notice) = app.list.notice() {
        Line::from(Span::styled(notice, Style::default().fg(Color::Red)))
    } else if let Some(flash) = &app.flash {
        Line::from(Span::styled(flash.as_str(), Style::default().fg(Color::Green)))
    } else {
        Line::from("")
    };
    f.render_widget(Paragraph::new(line).alignment(Alignment::Center), area);
}

fn centered_rect(percent_x: u16, percent_y: u16, area: Rect) -> Rect {
    let vertical = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(area);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(vertical[1])[1]
}
