//! Main application state for the TUI

use super::events::{key_handler, AppAction, AppEvent, EventHandler, NavigationAction};
use super::widgets::{
    AlertWidget, BulkActionBar, ColorScheme, ConfirmDialog, HelpDialog, RepositoryTable, StatusBar,
};
use crate::config::Config;
use crate::permissions::{register_actions, ActionRegistry};
use crate::reconcile::{AlertVariant, Reconciler};
use crate::service::{HttpProjectService, ProjectService, Repository};
use anyhow::Result;
use crossterm::event::{KeyCode, KeyEvent};
use ratatui::{
    layout::{Constraint, Direction, Layout},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Paragraph, TableState},
    Frame,
};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Pending confirmation before a destructive action runs
pub enum ConfirmAction {
    DeleteSingle(Repository),
    DeleteMany(Vec<String>),
}

impl ConfirmAction {
    fn message(&self) -> &'static str {
        match self {
            ConfirmAction::DeleteSingle(_) => "Are you sure you want to delete this project?",
            ConfirmAction::DeleteMany(_) => "Are you sure you want to delete these projects?",
        }
    }
}

/// Dismiss timer for the alert currently showing
///
/// Keyed by alert id so a timer armed for a superseded alert never fires
/// against its successor.
struct AlertTimer {
    alert_id: u64,
    deadline: Instant,
}

/// Application state
pub struct App {
    config: Config,
    reconciler: Reconciler,
    registry: Arc<ActionRegistry>,

    // Event handling
    event_handler: EventHandler,

    // UI state
    colors: ColorScheme,
    table_state: TableState,
    cursor: usize,

    // Popup state
    confirm: Option<ConfirmAction>,
    show_help: bool,

    // Status
    is_loading: bool,
    status_message: String,
    alert_timer: Option<AlertTimer>,

    // Exit flag
    should_exit: bool,
}

impl App {
    /// Create a new application instance (fast, non-blocking)
    pub async fn new(config: Config) -> Result<Self> {
        // Note: Don't use tracing in TUI - raw mode conflicts with stdout

        let service: Arc<dyn ProjectService> = Arc::new(HttpProjectService::new(&config)?);

        let registry = Arc::new(ActionRegistry::new(&config.permissions.granted));
        register_actions(registry.as_ref()).await?;

        // Create event handler
        let event_handler = EventHandler::new(Duration::from_millis(250));

        // Initialize table state
        let mut table_state = TableState::default();
        table_state.select(Some(0));

        // Spawn background catalogue load
        let sender = event_handler.sender();
        let load_service = service.clone();
        tokio::spawn(async move {
            match load_service.fetch_repositories().await {
                Ok(repos) => {
                    let _ = sender.send(AppEvent::ReposLoaded(repos));
                }
                Err(err) => {
                    let _ = sender.send(AppEvent::LoadFailed(format!("{:#}", err)));
                }
            }
        });

        Ok(Self {
            config,
            reconciler: Reconciler::new(service),
            registry,
            event_handler,
            colors: ColorScheme::default(),
            table_state,
            cursor: 0,
            confirm: None,
            show_help: false,
            is_loading: true,
            status_message: "Loading repositories...".to_string(),
            alert_timer: None,
            should_exit: false,
        })
    }

    /// Check if the application should exit
    pub fn should_exit(&self) -> bool {
        self.should_exit
    }

    /// Handle keyboard events
    pub async fn handle_key_event(&mut self, key_event: KeyEvent) -> Result<()> {
        // Handle popup-specific keys first
        if self.show_help {
            if matches!(
                key_event.code,
                KeyCode::Esc | KeyCode::Char('q') | KeyCode::Char('?')
            ) {
                self.show_help = false;
            }
            return Ok(());
        }

        if self.confirm.is_some() {
            match key_event.code {
                KeyCode::Esc | KeyCode::Char('n') => {
                    self.confirm = None;
                }
                KeyCode::Enter | KeyCode::Char('y') => {
                    if let Some(action) = self.confirm.take() {
                        self.run_confirmed(action).await;
                    }
                }
                _ => {}
            }
            return Ok(());
        }

        if let Some(nav) = key_handler::key_to_navigation(&key_event) {
            self.move_cursor(nav);
            return Ok(());
        }

        match key_handler::key_to_app_action(&key_event) {
            Some(AppAction::Quit) => {
                self.should_exit = true;
            }
            Some(AppAction::Reload) => {
                self.reconciler.load().await;
                self.clamp_cursor();
                self.status_message = format!(
                    "Reloaded {} repositories",
                    self.reconciler.repos().len()
                );
            }
            Some(AppAction::ToggleSelect) => {
                if let Some(repo) = self.current_repo() {
                    let id = repo.id.clone();
                    let selected = !self.reconciler.is_selected(&id);
                    self.reconciler.toggle_select(&id, selected);
                }
            }
            Some(AppAction::ToggleSelectAll) => {
                let all = self.reconciler.selection().len() == self.reconciler.repos().len()
                    && !self.reconciler.repos().is_empty();
                self.reconciler.select_all(!all);
            }
            Some(AppAction::CreateCurrent) => {
                if !self.require("projects.create") {
                    return Ok(());
                }
                if let Some(repo) = self.current_repo().filter(|repo| !repo.is_linked()) {
                    let repo = repo.clone();
                    self.reconciler.create_single(repo).await;
                }
            }
            Some(AppAction::DeleteCurrent) => {
                if !self.require("projects.delete") {
                    return Ok(());
                }
                if let Some(repo) = self.current_repo().filter(|repo| repo.is_linked()) {
                    let repo = repo.clone();
                    if self.config.ui.confirm_delete {
                        self.confirm = Some(ConfirmAction::DeleteSingle(repo));
                    } else {
                        self.reconciler.delete_single(repo).await;
                    }
                }
            }
            Some(AppAction::CreateSelected) => {
                if !self.require("projects.create") {
                    return Ok(());
                }
                let batch = self.reconciler.pending_creates();
                if !batch.is_empty() {
                    self.reconciler.create_many(batch).await;
                }
            }
            Some(AppAction::DeleteSelected) => {
                if !self.require("projects.delete") {
                    return Ok(());
                }
                let project_ids = self.reconciler.pending_delete_ids();
                if !project_ids.is_empty() {
                    if self.config.ui.confirm_delete {
                        self.confirm = Some(ConfirmAction::DeleteMany(project_ids));
                    } else {
                        self.reconciler.delete_many(project_ids).await;
                    }
                }
            }
            Some(AppAction::ShowHelp) => {
                self.show_help = true;
            }
            None => {}
        }

        Ok(())
    }

    /// Process pending background events and timers
    pub async fn update(&mut self) -> Result<()> {
        while let Some(event) = self.event_handler.try_next() {
            match event {
                AppEvent::ReposLoaded(repos) => {
                    self.is_loading = false;
                    self.status_message = format!("Loaded {} repositories", repos.len());
                    self.reconciler.set_repos(repos);
                    self.clamp_cursor();
                }
                AppEvent::LoadFailed(message) => {
                    self.is_loading = false;
                    self.status_message = "Load failed".to_string();
                    self.reconciler.post_alert(
                        AlertVariant::Danger,
                        "Error fetching repositories",
                        message,
                    );
                }
                AppEvent::Tick => {
                    self.tick_alert_timer();
                }
            }
        }

        Ok(())
    }

    /// Draw the UI
    pub fn draw(&mut self, frame: &mut Frame) {
        let has_selection = !self.reconciler.selection().is_empty();

        let constraints = if has_selection {
            vec![
                Constraint::Length(1),
                Constraint::Length(3),
                Constraint::Min(5),
                Constraint::Length(1),
            ]
        } else {
            vec![
                Constraint::Length(1),
                Constraint::Min(5),
                Constraint::Length(1),
            ]
        };

        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints(constraints)
            .split(frame.size());

        // Header
        let header = Paragraph::new(Line::from(vec![
            Span::styled(
                "RepoBridge",
                Style::default()
                    .fg(self.colors.primary)
                    .add_modifier(Modifier::BOLD),
            ),
            Span::raw("  "),
            Span::styled(
                self.config.backend.base_url.clone(),
                Style::default().fg(self.colors.border),
            ),
        ]));
        frame.render_widget(header, chunks[0]);

        // Bulk action bar
        let table_chunk = if has_selection {
            BulkActionBar::new(
                self.reconciler.pending_creates().len(),
                self.reconciler.pending_delete_ids().len(),
                &self.colors,
            )
            .render(frame, chunks[1]);
            chunks[2]
        } else {
            chunks[1]
        };

        // Repository table
        RepositoryTable::new(
            self.reconciler.repos(),
            self.reconciler.selection(),
            &self.colors,
        )
        .render(frame, table_chunk, &mut self.table_state);

        // Status bar
        let left = format!(
            "{} repositories, {} selected",
            self.reconciler.repos().len(),
            self.reconciler.selection().len()
        );
        let center = if self.is_loading {
            "Loading...".to_string()
        } else {
            self.status_message.clone()
        };
        StatusBar::new(
            Some(left.as_str()),
            Some(center.as_str()),
            Some("?: help  q: quit"),
            &self.colors,
        )
        .render(frame, chunks[chunks.len() - 1]);

        // Overlays
        if let Some(alert) = self.reconciler.alert() {
            AlertWidget::new(alert, &self.colors).render(frame, frame.size());
        }

        if let Some(confirm) = &self.confirm {
            ConfirmDialog::new(confirm.message(), &self.colors).render(frame, frame.size());
        }

        if self.show_help {
            HelpDialog::new(&self.colors).render(frame, frame.size());
        }
    }

    async fn run_confirmed(&mut self, action: ConfirmAction) {
        match action {
            ConfirmAction::DeleteSingle(repo) => {
                self.reconciler.delete_single(repo).await;
            }
            ConfirmAction::DeleteMany(project_ids) => {
                self.reconciler.delete_many(project_ids).await;
            }
        }
    }

    /// Arm, fire, or drop the alert dismiss timer
    ///
    /// The timer follows the alert id: a new alert re-arms the clock, so a
    /// deadline set for a superseded alert can never dismiss its successor.
    fn tick_alert_timer(&mut self) {
        let Some(alert_id) = self.reconciler.alert().map(|alert| alert.id) else {
            self.alert_timer = None;
            return;
        };

        match &self.alert_timer {
            Some(timer) if timer.alert_id == alert_id => {
                if Instant::now() >= timer.deadline {
                    self.reconciler.dismiss_alert(alert_id);
                    self.alert_timer = None;
                }
            }
            _ => {
                self.alert_timer = Some(AlertTimer {
                    alert_id,
                    deadline: Instant::now() + self.config.alert_dismiss(),
                });
            }
        }
    }

    fn require(&mut self, uid: &str) -> bool {
        if self.registry.is_granted(uid) {
            true
        } else {
            self.status_message = format!("Action not permitted ({})", uid);
            false
        }
    }

    fn current_repo(&self) -> Option<&Repository> {
        self.reconciler.repos().get(self.cursor)
    }

    fn move_cursor(&mut self, nav: NavigationAction) {
        let len = self.reconciler.repos().len();
        if len == 0 {
            return;
        }

        self.cursor = match nav {
            NavigationAction::Up => self.cursor.saturating_sub(1),
            NavigationAction::Down => (self.cursor + 1).min(len - 1),
            NavigationAction::Home => 0,
            NavigationAction::End => len - 1,
        };
        self.table_state.select(Some(self.cursor));
    }

    fn clamp_cursor(&mut self) {
        let len = self.reconciler.repos().len();
        if len == 0 {
            self.cursor = 0;
            self.table_state.select(None);
        } else {
            self.cursor = self.cursor.min(len - 1);
            self.table_state.select(Some(self.cursor));
        }
    }
}
