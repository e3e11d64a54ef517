//! Event handling for the TUI application
//!
//! This module provides event processing and application state updates
//! for keyboard input, background loads, and periodic ticks.

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use std::time::{Duration, Instant};
use tokio::sync::mpsc;

use crate::service::Repository;

/// Events that can occur in the TUI application
#[derive(Debug, Clone)]
pub enum AppEvent {
    /// Repository catalogue loaded in the background
    ReposLoaded(Vec<Repository>),
    /// Background load failed
    LoadFailed(String),
    /// Periodic tick for updates
    Tick,
}

/// Event handler bridging background tasks into the UI loop
pub struct EventHandler {
    /// Receiver for application events
    receiver: mpsc::UnboundedReceiver<AppEvent>,
    /// Sender for application events (for cloning)
    sender: mpsc::UnboundedSender<AppEvent>,
    /// Last tick time for periodic updates
    last_tick: Instant,
    /// Tick interval
    tick_interval: Duration,
}

impl EventHandler {
    /// Create a new event handler
    pub fn new(tick_interval: Duration) -> Self {
        let (sender, receiver) = mpsc::unbounded_channel();

        Self {
            receiver,
            sender,
            last_tick: Instant::now(),
            tick_interval,
        }
    }

    /// Get a sender handle for sending events
    pub fn sender(&self) -> mpsc::UnboundedSender<AppEvent> {
        self.sender.clone()
    }

    /// Get the next pending event without blocking
    ///
    /// Queued events drain first; once the queue is empty a tick is
    /// emitted whenever the tick interval has elapsed.
    pub fn try_next(&mut self) -> Option<AppEvent> {
        if let Ok(event) = self.receiver.try_recv() {
            return Some(event);
        }

        if self.last_tick.elapsed() >= self.tick_interval {
            self.last_tick = Instant::now();
            return Some(AppEvent::Tick);
        }

        None
    }
}

/// Helper functions for key event processing
pub mod key_handler {
    use super::*;

    /// Convert key event to navigation action
    pub fn key_to_navigation(event: &KeyEvent) -> Option<NavigationAction> {
        match event.code {
            KeyCode::Up | KeyCode::Char('k') if event.modifiers.is_empty() => {
                Some(NavigationAction::Up)
            }
            KeyCode::Down | KeyCode::Char('j') if event.modifiers.is_empty() => {
                Some(NavigationAction::Down)
            }
            KeyCode::Home => Some(NavigationAction::Home),
            KeyCode::End => Some(NavigationAction::End),
            _ => None,
        }
    }

    /// Convert key event to application action
    pub fn key_to_app_action(event: &KeyEvent) -> Option<AppAction> {
        if event.code == KeyCode::Char('c') && event.modifiers == KeyModifiers::CONTROL {
            return Some(AppAction::Quit);
        }

        match event.code {
            KeyCode::Char('q') => Some(AppAction::Quit),
            KeyCode::Char('r') => Some(AppAction::Reload),
            KeyCode::Char(' ') => Some(AppAction::ToggleSelect),
            KeyCode::Char('a') => Some(AppAction::ToggleSelectAll),
            KeyCode::Char('c') => Some(AppAction::CreateCurrent),
            KeyCode::Char('d') => Some(AppAction::DeleteCurrent),
            KeyCode::Char('C') => Some(AppAction::CreateSelected),
            KeyCode::Char('D') => Some(AppAction::DeleteSelected),
            KeyCode::Char('?') | KeyCode::F(1) => Some(AppAction::ShowHelp),
            _ => None,
        }
    }
}

/// Navigation actions within the repository table
#[derive(Debug, Clone, PartialEq)]
pub enum NavigationAction {
    Up,
    Down,
    Home,
    End,
}

/// High-level application actions
#[derive(Debug, Clone, PartialEq)]
pub enum AppAction {
    Quit,
    Reload,
    ToggleSelect,
    ToggleSelectAll,
    CreateCurrent,
    DeleteCurrent,
    CreateSelected,
    DeleteSelected,
    ShowHelp,
}
