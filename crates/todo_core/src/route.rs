//! Screen addressing for the navigation shell.
//!
//! # Invariants
//! - The editor route carries the raw id segment exactly as it appears in
//!   the path; it is matched against task ids by string comparison.
//! - `Route::parse(route.path())` returns an equal route.

use once_cell::sync::Lazy;
use regex::Regex;
use std::error::Error;
use std::fmt::{Display, Formatter};

static EDIT_ROUTE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^/todos/([^/\s]+)/?$").expect("valid edit route regex"));

/// Screens reachable by path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    /// Task list, addressed by `/`.
    List,
    /// Task editor, addressed by `/todos/{id}`.
    EditTask(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RouteError {
    Unknown(String),
}

impl Display for RouteError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Unknown(path) => write!(f, "no screen is addressed by `{path}`"),
        }
    }
}

impl Error for RouteError {}

impl Route {
    pub fn parse(path: &str) -> Result<Self, RouteError> {
        let trimmed = path.trim();
        if matches!(trimmed, "" | "/" | "/index") {
            return Ok(Self::List);
        }
        EDIT_ROUTE_RE
            .captures(trimmed)
            .and_then(|caps| caps.get(1))
            .map(|segment| Self::EditTask(segment.as_str().to_string()))
            .ok_or_else(|| RouteError::Unknown(trimmed.to_string()))
    }

    /// Route for editing the task with the given id.
    pub fn edit(id: impl Display) -> Self {
        Self::EditTask(id.to_string())
    }

    pub fn path(&self) -> String {
        match self {
            Self::List => "/".to_string(),
            Self::EditTask(raw_id) => format!("/todos/{raw_id}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{Route, RouteError};
    use crate::model::task::TaskId;

    #[test]
    fn parses_list_and_edit_paths() {
        assert_eq!(Route::parse("/"), Ok(Route::List));
        assert_eq!(Route::parse("/todos/12"), Ok(Route::EditTask("12".into())));
        assert_eq!(Route::parse("/todos/12/"), Ok(Route::EditTask("12".into())));
    }

    #[test]
    fn keeps_raw_segment_verbatim() {
        assert_eq!(Route::parse("/todos/007"), Ok(Route::EditTask("007".into())));
    }

    #[test]
    fn rejects_unknown_paths() {
        assert!(matches!(Route::parse("/todos/"), Err(RouteError::Unknown(_))));
        assert!(matches!(Route::parse("/settings"), Err(RouteError::Unknown(_))));
        assert!(matches!(Route::parse("/todos/1/2"), Err(RouteError::Unknown(_))));
    }

    #[test]
    fn path_round_trips_through_parse() {
        let route = Route::edit(TaskId(5));
        assert_eq!(route.path(), "/todos/5");
        assert_eq!(Route::parse(&route.path()), Ok(route));
    }
}
