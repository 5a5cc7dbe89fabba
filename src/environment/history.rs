use std::sync::{Arc, Mutex};

use serde::{Deserialize, Serialize};
use strum_macros::Display;

#[derive(Clone, Debug, Default, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub struct Location {
    pub pathname: String,
    pub search: String,
}

impl Location {
    pub fn new(pathname: impl Into<String>, search: impl Into<String>) -> Self {
        Self {
            pathname: pathname.into(),
            search: search.into(),
        }
    }

    /// Split a `path?query` string
    pub fn parse(path: &str) -> Self {
        match path.find('?') {
            Some(idx) => {
                let (pathname, search) = path.split_at(idx);
                Self::new(pathname, search)
            }
            None => Self::new(path, ""),
        }
    }

    pub fn href(&self) -> String {
        format!("{}{}", self.pathname, self.search)
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Display)]
#[strum(serialize_all = "UPPERCASE")]
pub enum HistoryAction {
    Push,
    Pop,
    Replace,
}

/// A navigation event as reported by the host
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct LocationChange {
    pub location: Location,
    pub action: HistoryAction,
    pub is_first_rendering: bool,
}

impl LocationChange {
    /// Only pushes and pops lead to a new search
    pub fn triggers_search(&self) -> bool {
        matches!(self.action, HistoryAction::Push | HistoryAction::Pop)
    }
}

pub trait NavigationHost: Send + Sync {
    fn location(&self) -> Location;
    fn push(&self, location: Location) -> LocationChange;
}

#[derive(Debug)]
struct Entries {
    stack: Vec<Location>,
    index: usize,
}

/// Browser-like history kept in memory
#[derive(Clone, Debug)]
pub struct MemoryHistory {
    entries: Arc<Mutex<Entries>>,
}

impl Default for MemoryHistory {
    fn default() -> Self {
        Self::new(Location::new("/", ""))
    }
}

impl MemoryHistory {
    pub fn new(initial: Location) -> Self {
        Self {
            entries: Arc::new(Mutex::new(Entries {
                stack: vec![initial],
                index: 0,
            })),
        }
    }

    /// The change reported when the application first renders
    pub fn initial_change(&self) -> LocationChange {
        LocationChange {
            location: self.location(),
            action: HistoryAction::Pop,
            is_first_rendering: true,
        }
    }

    pub fn replace(&self, location: Location) -> LocationChange {
        if let Ok(mut entries) = self.entries.lock() {
            let index = entries.index;
            entries.stack[index] = location.clone();
        }
        Self::change(location, HistoryAction::Replace)
    }

    pub fn back(&self) -> Option<LocationChange> {
        self.go(-1)
    }

    pub fn forward(&self) -> Option<LocationChange> {
        self.go(1)
    }

    /// Number of entries on the history stack
    pub fn depth(&self) -> usize {
        self.entries.lock().map(|e| e.stack.len()).unwrap_or_default()
    }

    fn go(&self, delta: isize) -> Option<LocationChange> {
        let mut entries = self.entries.lock().ok()?;
        let index = entries.index.checked_add_signed(delta)?;
        let location = entries.stack.get(index)?.clone();
        entries.index = index;
        Some(Self::change(location, HistoryAction::Pop))
    }

    fn change(location: Location, action: HistoryAction) -> LocationChange {
        LocationChange {
            location,
            action,
            is_first_rendering: false,
        }
    }
}

impl NavigationHost for MemoryHistory {
    fn location(&self) -> Location {
        match self.entries.lock() {
            Ok(entries) => entries.stack[entries.index].clone(),
            Err(e) => {
                log::error!("History Data Error: {e:?}");
                Location::default()
            }
        }
    }

    fn push(&self, location: Location) -> LocationChange {
        match self.entries.lock() {
            Ok(mut entries) => {
                let next = entries.index + 1;
                entries.stack.truncate(next);
                entries.stack.push(location.clone());
                entries.index = next;
            }
            Err(e) => log::error!("History Data Error: {e:?}"),
        }
        Self::change(location, HistoryAction::Push)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn push_drops_forward_entries() {
        let history = MemoryHistory::default();
        history.push(Location::parse("/search/?q=a"));
        history.push(Location::parse("/search/?q=b"));
        let back = history.back().unwrap();
        assert_eq!(back.action, HistoryAction::Pop);
        assert_eq!(back.location.search, "?q=a");

        history.push(Location::parse("/search/?q=c"));
        assert!(history.forward().is_none());
        assert_eq!(history.depth(), 3);
        assert_eq!(history.location().href(), "/search/?q=c");
    }

    #[test]
    fn back_stops_at_first_entry() {
        let history = MemoryHistory::default();
        assert!(history.back().is_none());
        assert!(history.initial_change().is_first_rendering);
    }

    #[test]
    fn replace_does_not_trigger_search() {
        let history = MemoryHistory::default();
        let change = history.replace(Location::parse("/?x=1"));
        assert!(!change.triggers_search());
        assert_eq!(history.depth(), 1);
        assert_eq!(change.action.to_string(), "REPLACE");
    }
}
