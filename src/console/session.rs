//! Per-user interaction state

use crate::error::{ConsoleError, NoticeLevel};
use crate::lens::admin::AdminSession;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Top-level views a user can switch between
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Page {
    #[default]
    SqlGenerator,
    DbConsole,
    AdminPanel,
}

impl Page {
    pub fn title(&self) -> &'static str {
        match self {
            Page::SqlGenerator => "SQL Generator",
            Page::DbConsole => "Database Console",
            Page::AdminPanel => "Admin Panel",
        }
    }
}

impl fmt::Display for Page {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.title())
    }
}

impl FromStr for Page {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace(['-', ' '], "_").as_str() {
            "sql_generator" | "generator" => Ok(Page::SqlGenerator),
            "db_console" | "database_console" | "console" => Ok(Page::DbConsole),
            "admin_panel" | "admin" => Ok(Page::AdminPanel),
            _ => Err(format!("unknown page '{}'", s)),
        }
    }
}

/// A message shown to the user once
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notice {
    pub level: NoticeLevel,
    pub text: String,
}

impl Notice {
    pub fn success(text: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Success,
            text: text.into(),
        }
    }

    pub fn info(text: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Info,
            text: text.into(),
        }
    }
}

impl From<&ConsoleError> for Notice {
    fn from(err: &ConsoleError) -> Self {
        Self {
            level: err.level(),
            text: err.to_string(),
        }
    }
}

/// State carried across the commands of one user
///
/// A fresh session starts on the SQL generator page, logged out, with no
/// pending notice.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub page: Page,
    pub admin: AdminSession,
    flash: Option<Notice>,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a notice for the next render, replacing any pending one
    pub fn flash(&mut self, notice: Notice) {
        self.flash = Some(notice);
    }

    /// Take the pending notice; later calls return `None` until a new flash
    pub fn take_flash(&mut self) -> Option<Notice> {
        self.flash.take()
    }

    pub fn has_flash(&self) -> bool {
        self.flash.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_session() {
        let session = Session::new();
        assert_eq!(session.page, Page::SqlGenerator);
        assert_eq!(session.admin, AdminSession::LoggedOut);
        assert!(!session.has_flash());
    }

    #[test]
    fn test_flash_is_shown_once() {
        let mut session = Session::new();
        session.flash(Notice::success("Table created successfully"));
        assert_eq!(
            session.take_flash(),
            Some(Notice::success("Table created successfully"))
        );
        assert_eq!(session.take_flash(), None);
    }

    #[test]
    fn test_newer_flash_replaces_older() {
        let mut session = Session::new();
        session.flash(Notice::success("first"));
        session.flash(Notice::info("second"));
        assert_eq!(session.take_flash().map(|n| n.text), Some("second".into()));
    }

    #[test]
    fn test_page_parsing() {
        assert_eq!("db-console".parse::<Page>().unwrap(), Page::DbConsole);
        assert_eq!("Admin Panel".parse::<Page>().unwrap(), Page::AdminPanel);
        assert_eq!("generator".parse::<Page>().unwrap(), Page::SqlGenerator);
        assert!("settings".parse::<Page>().is_err());
    }

    #[test]
    fn test_notice_from_error_uses_level() {
        let notice = Notice::from(&ConsoleError::PolicyViolation("no".into()));
        assert_eq!(notice.level, NoticeLevel::Warning);
        let notice = Notice::from(&ConsoleError::SqlExecution("boom".into()));
        assert_eq!(notice.level, NoticeLevel::Error);
    }
}
