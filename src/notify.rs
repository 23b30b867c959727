// src/notify.rs

//! User-facing notices and navigation requests.
//!
//! The host decides how a notice is shown and what a route means; the
//! client only reports them.

use std::fmt;
use std::sync::Mutex;

/// Severity of a transient notice.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    Info,
    Success,
    Warning,
    Error,
}

/// A short message shown to the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
}

impl Notice {
    pub fn info(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Info,
            message: message.into(),
        }
    }

    pub fn success(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Success,
            message: message.into(),
        }
    }

    pub fn warning(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Warning,
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Error,
            message: message.into(),
        }
    }
}

impl fmt::Display for Notice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

/// Sink for notices and navigation.
pub trait Notifier: Send + Sync {
    fn notify(&self, notice: Notice);

    fn navigate(&self, route: &str);
}

/// Writes notices and navigation requests to the log.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn notify(&self, notice: Notice) {
        match notice.level {
            NoticeLevel::Info | NoticeLevel::Success => log::info!("{}", notice),
            NoticeLevel::Warning => log::warn!("{}", notice),
            NoticeLevel::Error => log::error!("{}", notice),
        }
    }

    fn navigate(&self, route: &str) {
        log::info!("Navigate to {}", route);
    }
}

/// Something the client asked the host to do.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UiEvent {
    Notice(Notice),
    Navigate(String),
}

/// Keeps every event for later inspection.
#[derive(Debug, Default)]
pub struct RecordingNotifier {
    events: Mutex<Vec<UiEvent>>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<UiEvent> {
        self.events
            .lock()
            .map(|events| events.clone())
            .unwrap_or_default()
    }

    pub fn notices(&self) -> Vec<Notice> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                UiEvent::Notice(n) => Some(n),
                UiEvent::Navigate(_) => None,
            })
            .collect()
    }

    pub fn routes(&self) -> Vec<String> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                UiEvent::Navigate(route) => Some(route),
                UiEvent::Notice(_) => None,
            })
            .collect()
    }

    fn push(&self, event: UiEvent) {
        if let Ok(mut events) = self.events.lock() {
            events.push(event);
        }
    }
}

impl Notifier for RecordingNotifier {
    fn notify(&self, notice: Notice) {
        self.push(UiEvent::Notice(notice));
    }

    fn navigate(&self, route: &str) {
        self.push(UiEvent::Navigate(route.to_string()));
    }
}
