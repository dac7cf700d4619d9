//! Message lookup for player-facing text.
//!
//! The page supplies a translation table at bootstrap. Keys it does not
//! cover fall back to the built-in English strings below.

use std::borrow::Cow;
use std::collections::HashMap;

/// Built-in fallback strings, keyed like the page's translation table.
const FALLBACKS: &[(&str, &str)] = &[
    ("story.welcome", "Welcome to the time café. Your story is waiting to be explored..."),
    ("image.checking", "Checking for image..."),
    ("image.retrying", "Image failed to load, retrying..."),
    ("image.unavailable", "The image could not be generated."),
    ("save.default_name", "Save {time}"),
    ("save.success", "Game saved as \"{name}\"."),
    ("save.error.snapshot", "The server could not capture the current game."),
    ("save.error.network", "Could not reach the server to save. Please try again."),
    ("save.error.quota", "Local storage is full. Delete some old saves and try again."),
    ("save.error.storage", "The save could not be written to local storage."),
    ("saves.empty", "No saved games yet."),
    ("saves.load", "Load"),
    ("saves.delete", "Delete"),
    ("load.confirm", "Loading will discard all unsaved progress. Continue?"),
    ("load.not_found", "That save no longer exists."),
    ("load.error", "The server could not restore this save."),
    ("load.error.network", "Could not reach the server to load. Please try again."),
    ("delete.confirm", "Delete this save permanently?"),
    ("delete.success", "Save deleted."),
    ("character.no_detail", "No details yet."),
    ("character.no_events", "No related events yet."),
    ("character.events", "Related events"),
];

/// Translation table owned by the session.
#[derive(Debug, Clone, Default)]
pub struct Localization {
    table: HashMap<String, String>,
}

impl Localization {
    pub fn new(table: HashMap<String, String>) -> Self {
        Self { table }
    }

    /// Parse a JSON object of `key -> string`. Non-string values are skipped.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        if json.trim().is_empty() {
            return Ok(Self::default());
        }
        let raw: HashMap<String, serde_json::Value> = serde_json::from_str(json)?;
        let table = raw
            .into_iter()
            .filter_map(|(k, v)| v.as_str().map(|s| (k, s.to_string())))
            .collect();
        Ok(Self { table })
    }

    /// Look up `key`, falling back to the built-in string, then to the key itself.
    pub fn get<'a>(&'a self, key: &'a str) -> Cow<'a, str> {
        if let Some(text) = self.table.get(key) {
            return Cow::Borrowed(text.as_str());
        }
        FALLBACKS
            .iter()
            .find(|(k, _)| *k == key)
            .map(|(_, v)| Cow::Borrowed(*v))
            .unwrap_or(Cow::Borrowed(key))
    }

    /// Look up `key` and substitute `{name}` placeholders.
    pub fn format(&self, key: &str, args: &[(&str, &str)]) -> String {
        let mut text = self.get(key).into_owned();
        for (name, value) in args {
            text = text.replace(&format!("{{{}}}", name), value);
        }
        text
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn table_overrides_fallback() {
        let loc = Localization::new(HashMap::from([(
            "load.confirm".to_string(),
            "确定要读档吗？".to_string(),
        )]));
        assert_eq!(loc.get("load.confirm"), "确定要读档吗？");
        assert_eq!(loc.get("delete.confirm"), "Delete this save permanently?");
    }

    #[test]
    fn unknown_key_returns_key() {
        assert_eq!(Localization::default().get("nope.nothing"), "nope.nothing");
    }

    #[test]
    fn format_substitutes_placeholders() {
        let loc = Localization::default();
        assert_eq!(
            loc.format("save.success", &[("name", "Run 1")]),
            "Game saved as \"Run 1\"."
        );
        assert_eq!(
            loc.format("save.default_name", &[("time", "2026-10-18 09:30")]),
            "Save 2026-10-18 09:30"
        );
    }

    #[test]
    fn from_json_skips_non_strings() {
        let loc = Localization::from_json(r#"{"saves.empty":"暂无存档","x":3}"#).unwrap();
        assert_eq!(loc.get("saves.empty"), "暂无存档");
        assert_eq!(loc.get("x"), "x");
        assert!(Localization::from_json("[1,2]").is_err());
    }
}
