//! Reusable widgets for the TUI application
//!
//! This module provides custom widgets and UI components that can be used
//! across different parts of the TUI interface.

use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span, Text},
    widgets::{Block, Borders, Cell, Clear, Paragraph, Row, Table, TableState, Wrap},
    Frame,
};
use std::collections::HashSet;

use crate::reconcile::{Alert, AlertVariant};
use crate::service::Repository;

/// Color scheme for the TUI
pub struct ColorScheme {
    pub primary: Color,
    pub secondary: Color,
    pub success: Color,
    pub warning: Color,
    pub error: Color,
    pub info: Color,
    pub text: Color,
    pub background: Color,
    pub border: Color,
}

impl Default for ColorScheme {
    fn default() -> Self {
        Self {
            primary: Color::Blue,
            secondary: Color::Cyan,
            success: Color::Green,
            warning: Color::Yellow,
            error: Color::Red,
            info: Color::Magenta,
            text: Color::White,
            background: Color::Black,
            border: Color::Gray,
        }
    }
}

/// Checkbox cell content for a table row
fn checkbox(selected: bool) -> &'static str {
    if selected {
        "[x]"
    } else {
        "[ ]"
    }
}

/// Repository table with selection checkboxes and link status
pub struct RepositoryTable<'a> {
    repositories: &'a [Repository],
    selection: &'a HashSet<String>,
    colors: &'a ColorScheme,
}

impl<'a> RepositoryTable<'a> {
    pub fn new(
        repositories: &'a [Repository],
        selection: &'a HashSet<String>,
        colors: &'a ColorScheme,
    ) -> Self {
        Self {
            repositories,
            selection,
            colors,
        }
    }

    /// Render the repository table widget
    pub fn render(&self, frame: &mut Frame, area: Rect, state: &mut TableState) {
        let header = Row::new(vec![
            Cell::from(checkbox(self.all_selected())),
            Cell::from("Name"),
            Cell::from("Description"),
            Cell::from("URL"),
            Cell::from("Project"),
        ])
        .style(
            Style::default()
                .fg(self.colors.secondary)
                .add_modifier(Modifier::BOLD),
        );

        let rows: Vec<Row> = self
            .repositories
            .iter()
            .map(|repo| {
                let (status, status_color) = match &repo.project_id {
                    Some(project_id) => (format!("✓ {}", project_id), self.colors.success),
                    None => ("unlinked".to_string(), self.colors.border),
                };

                Row::new(vec![
                    Cell::from(checkbox(self.selection.contains(&repo.id))),
                    Cell::from(Span::styled(
                        repo.name.clone(),
                        Style::default().fg(self.colors.text),
                    )),
                    Cell::from(Span::styled(
                        repo.short_description.clone(),
                        Style::default().fg(self.colors.text),
                    )),
                    Cell::from(Span::styled(
                        repo.url.clone(),
                        Style::default().fg(self.colors.secondary),
                    )),
                    Cell::from(Span::styled(status, Style::default().fg(status_color))),
                ])
            })
            .collect();

        let widths = [
            Constraint::Length(4),
            Constraint::Percentage(20),
            Constraint::Percentage(32),
            Constraint::Percentage(28),
            Constraint::Percentage(16),
        ];

        let table = Table::new(rows, widths)
            .header(header)
            .block(
                Block::default()
                    .title(format!("Repositories ({})", self.repositories.len()))
                    .borders(Borders::ALL)
                    .border_style(Style::default().fg(self.colors.border)),
            )
            .highlight_style(
                Style::default()
                    .bg(self.colors.primary)
                    .fg(Color::Black)
                    .add_modifier(Modifier::BOLD),
            )
            .highlight_symbol("> ");

        frame.render_stateful_widget(table, area, state);
    }

    fn all_selected(&self) -> bool {
        !self.repositories.is_empty() && self.selection.len() == self.repositories.len()
    }
}

/// Bulk action bar shown while the selection is non-empty
pub struct BulkActionBar<'a> {
    to_create: usize,
    to_delete: usize,
    colors: &'a ColorScheme,
}

impl<'a> BulkActionBar<'a> {
    pub fn new(to_create: usize, to_delete: usize, colors: &'a ColorScheme) -> Self {
        Self {
            to_create,
            to_delete,
            colors,
        }
    }

    /// Render the bulk action bar widget
    pub fn render(&self, frame: &mut Frame, area: Rect) {
        let mut spans = vec![Span::styled(
            format!(
                "{} projects to create, {} to delete",
                self.to_create, self.to_delete
            ),
            Style::default().fg(self.colors.text),
        )];

        if self.to_create > 0 {
            spans.push(Span::raw("   "));
            spans.push(Span::styled(
                format!("C: create {}", self.to_create),
                Style::default().fg(self.colors.success),
            ));
        }

        if self.to_delete > 0 {
            spans.push(Span::raw("   "));
            spans.push(Span::styled(
                format!("D: delete {}", self.to_delete),
                Style::default().fg(self.colors.error),
            ));
        }

        let paragraph = Paragraph::new(Line::from(spans))
            .block(
                Block::default()
                    .title("Bulk actions")
                    .borders(Borders::ALL)
                    .border_style(Style::default().fg(self.colors.primary)),
            )
            .alignment(Alignment::Left);

        frame.render_widget(paragraph, area);
    }
}

/// Transient alert overlay
pub struct AlertWidget<'a> {
    alert: &'a Alert,
    colors: &'a ColorScheme,
}

impl<'a> AlertWidget<'a> {
    pub fn new(alert: &'a Alert, colors: &'a ColorScheme) -> Self {
        Self { alert, colors }
    }

    /// Render the alert in the top-right corner of the given area
    pub fn render(&self, frame: &mut Frame, area: Rect) {
        let width = (area.width / 2).max(30).min(area.width);
        let height = 4.min(area.height);
        let popup_area = Rect::new(area.x + area.width - width, area.y, width, height);

        let accent = match self.alert.variant {
            AlertVariant::Success => self.colors.success,
            AlertVariant::Danger => self.colors.error,
        };

        // Clear the background
        frame.render_widget(Clear, popup_area);

        let paragraph = Paragraph::new(Text::from(self.alert.message.clone()))
            .block(
                Block::default()
                    .title(self.alert.title.clone())
                    .borders(Borders::ALL)
                    .border_style(Style::default().fg(accent)),
            )
            .style(Style::default().fg(self.colors.text))
            .wrap(Wrap { trim: true });

        frame.render_widget(paragraph, popup_area);
    }
}

/// Confirmation dialog for destructive actions
pub struct ConfirmDialog<'a> {
    message: &'a str,
    colors: &'a ColorScheme,
}

impl<'a> ConfirmDialog<'a> {
    pub fn new(message: &'a str, colors: &'a ColorScheme) -> Self {
        Self { message, colors }
    }

    /// Render the confirmation dialog
    pub fn render(&self, frame: &mut Frame, area: Rect) {
        let popup_area = Self::centered_rect(50, 25, area);

        // Clear the background
        frame.render_widget(Clear, popup_area);

        let text = Text::from(vec![
            Line::from(""),
            Line::from(Span::styled(
                self.message,
                Style::default().fg(self.colors.text),
            )),
            Line::from(""),
            Line::from(vec![
                Span::styled("Enter", Style::default().fg(self.colors.error)),
                Span::raw(" confirm    "),
                Span::styled("Esc", Style::default().fg(self.colors.secondary)),
                Span::raw(" cancel"),
            ]),
        ]);

        let paragraph = Paragraph::new(text)
            .block(
                Block::default()
                    .title("Confirmation")
                    .borders(Borders::ALL)
                    .border_style(Style::default().fg(self.colors.warning)),
            )
            .alignment(Alignment::Center)
            .wrap(Wrap { trim: true });

        frame.render_widget(paragraph, popup_area);
    }

    /// Helper to create a centered rectangle
    pub fn centered_rect(percent_x: u16, percent_y: u16, r: Rect) -> Rect {
        let popup_layout = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Percentage((100 - percent_y) / 2),
                Constraint::Percentage(percent_y),
                Constraint::Percentage((100 - percent_y) / 2),
            ])
            .split(r);

        Layout::default()
            .direction(Direction::Horizontal)
            .constraints([
                Constraint::Percentage((100 - percent_x) / 2),
                Constraint::Percentage(percent_x),
                Constraint::Percentage((100 - percent_x) / 2),
            ])
            .split(popup_layout[1])[1]
    }
}

/// Help dialog widget
pub struct HelpDialog<'a> {
    colors: &'a ColorScheme,
}

impl<'a> HelpDialog<'a> {
    pub fn new(colors: &'a ColorScheme) -> Self {
        Self { colors }
    }

    /// Render the help dialog
    pub fn render(&self, frame: &mut Frame, area: Rect) {
        let popup_area = ConfirmDialog::centered_rect(60, 70, area);

        // Clear the background
        frame.render_widget(Clear, popup_area);

        let help_text = Text::from(vec![
            Line::from(vec![Span::styled(
                "Keyboard Shortcuts",
                Style::default()
                    .fg(self.colors.primary)
                    .add_modifier(Modifier::BOLD),
            )]),
            Line::from(""),
            Line::from("Navigation:"),
            Line::from("  ↑/k        Move up"),
            Line::from("  ↓/j        Move down"),
            Line::from(""),
            Line::from("Selection:"),
            Line::from("  Space      Toggle current row"),
            Line::from("  a          Select all / none"),
            Line::from(""),
            Line::from("Actions:"),
            Line::from("  c          Create project for current repository"),
            Line::from("  d          Delete project for current repository"),
            Line::from("  C          Create projects for selection"),
            Line::from("  D          Delete projects for selection"),
            Line::from("  r          Reload repositories"),
            Line::from(""),
            Line::from("General:"),
            Line::from("  ?/F1       Show this help"),
            Line::from("  q/Ctrl+C   Quit"),
            Line::from(""),
            Line::from(vec![Span::styled(
                "Press Esc to close",
                Style::default().fg(self.colors.secondary),
            )]),
        ]);

        let paragraph = Paragraph::new(help_text)
            .block(
                Block::default()
                    .title("Help")
                    .borders(Borders::ALL)
                    .border_style(Style::default().fg(self.colors.border)),
            )
            .style(Style::default().fg(self.colors.text))
            .alignment(Alignment::Left);

        frame.render_widget(paragraph, popup_area);
    }
}

/// Status bar widget showing current status
pub struct StatusBar<'a> {
    left_text: Option<&'a str>,
    center_text: Option<&'a str>,
    right_text: Option<&'a str>,
    colors: &'a ColorScheme,
}

impl<'a> StatusBar<'a> {
    pub fn new(
        left_text: Option<&'a str>,
        center_text: Option<&'a str>,
        right_text: Option<&'a str>,
        colors: &'a ColorScheme,
    ) -> Self {
        Self {
            left_text,
            center_text,
            right_text,
            colors,
        }
    }

    /// Render the status bar widget
    pub fn render(&self, frame: &mut Frame, area: Rect) {
        let chunks = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([
                Constraint::Percentage(33),
                Constraint::Percentage(34),
                Constraint::Percentage(33),
            ])
            .split(area);

        // Left text
        if let Some(text) = self.left_text {
            let paragraph = Paragraph::new(Text::from(text))
                .style(Style::default().fg(self.colors.text))
                .alignment(Alignment::Left);
            frame.render_widget(paragraph, chunks[0]);
        }

        // Center text
        if let Some(text) = self.center_text {
            let paragraph = Paragraph::new(Text::from(text))
                .style(Style::default().fg(self.colors.primary))
                .alignment(Alignment::Center);
            frame.render_widget(paragraph, chunks[1]);
        }

        // Right text
        if let Some(text) = self.right_text {
            let paragraph = Paragraph::new(Text::from(text))
                .style(Style::default().fg(self.colors.secondary))
                .alignment(Alignment::Right);
            frame.render_widget(paragraph, chunks[2]);
        }
    }
}
