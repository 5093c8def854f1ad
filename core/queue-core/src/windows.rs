//! Window enumeration parsing.
//!
//! The terminal's remote-control `ls` prints a tree of OS windows, tabs and
//! windows. Only the leaf window ids matter for staleness.

use std::collections::HashSet;

use serde::Deserialize;

use crate::error::{QueueError, Result};

#[derive(Debug, Deserialize)]
struct OsWindow {
    #[serde(default)]
    tabs: Vec<Tab>,
}

#[derive(Debug, Deserialize)]
struct Tab {
    #[serde(default)]
    windows: Vec<Window>,
}

#[derive(Debug, Deserialize)]
struct Window {
    id: u64,
}

/// Extracts every window id from `ls` JSON output.
pub fn parse_window_ids(ls_output: &[u8]) -> Result<HashSet<String>> {
    let os_windows: Vec<OsWindow> =
        serde_json::from_slice(ls_output).map_err(|source| QueueError::Json {
            context: "parsing window listing".to_string(),
            source,
        })?;

    Ok(os_windows
        .iter()
        .flat_map(|os_window| &os_window.tabs)
        .flat_map(|tab| &tab.windows)
        .map(|window| window.id.to_string())
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_nested_ids() {
        let listing = br#"[
            {"id": 1, "tabs": [
                {"id": 1, "windows": [{"id": 1, "title": "zsh"}, {"id": 4}]},
                {"id": 2, "windows": [{"id": 7}]}
            ]},
            {"id": 2, "tabs": [{"id": 3, "windows": [{"id": 12}]}]}
        ]"#;
        let ids = parse_window_ids(listing).unwrap();
        let mut sorted: Vec<_> = ids.into_iter().collect();
        sorted.sort();
        assert_eq!(sorted, vec!["1", "12", "4", "7"]);
    }

    #[test]
    fn test_parse_empty_listing() {
        assert!(parse_window_ids(b"[]").unwrap().is_empty());
    }

    #[test]
    fn test_parse_invalid_listing() {
        assert!(parse_window_ids(b"{\"not\": \"a list\"}").is_err());
        assert!(parse_window_ids(b"").is_err());
    }
}
