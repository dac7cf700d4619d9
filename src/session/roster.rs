//! Character roster and story metadata handed over by the page.

use serde::{Deserialize, Serialize};

use crate::error::ClientError;
use crate::i18n::Localization;
use crate::routes::util::escape_html;

/// A character the player has met.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Character {
    pub id: String,
    pub name: String,
    pub avatar: String,
    pub desc: String,
    pub detail: String,
    pub events: Vec<String>,
}

/// The roster as the page provides it: either already decoded or as the JSON
/// string the template embedded.
#[derive(Debug, Clone)]
pub enum RosterInput {
    Serialized(String),
    Parsed(Vec<Character>),
}

impl Default for RosterInput {
    fn default() -> Self {
        RosterInput::Parsed(Vec::new())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Roster {
    characters: Vec<Character>,
}

impl Roster {
    pub fn from_input(input: RosterInput) -> Result<Self, ClientError> {
        let characters = match input {
            RosterInput::Parsed(list) => list,
            RosterInput::Serialized(raw) if raw.trim().is_empty() => Vec::new(),
            RosterInput::Serialized(raw) => serde_json::from_str::<Option<Vec<Character>>>(&raw)
                .map_err(|e| ClientError::BootstrapParseError(format!("characters: {}", e)))?
                .unwrap_or_default(),
        };
        Ok(Self { characters })
    }

    pub fn len(&self) -> usize {
        self.characters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.characters.is_empty()
    }

    pub fn get(&self, id: &str) -> Option<&Character> {
        self.characters.iter().find(|c| c.id == id)
    }
}

/// Current story view as rendered by the server template.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Story {
    pub text: String,
    /// Up to three previous paragraphs, separated by blank lines.
    pub history_text: String,
}

/// The story as the page provides it.
#[derive(Debug, Clone)]
pub enum StoryInput {
    Serialized(String),
    Parsed(Story),
}

impl Default for StoryInput {
    fn default() -> Self {
        StoryInput::Parsed(Story::default())
    }
}

impl StoryInput {
    pub fn into_story(self) -> Result<Story, ClientError> {
        match self {
            StoryInput::Parsed(story) => Ok(story),
            StoryInput::Serialized(raw) if raw.trim().is_empty() => Ok(Story::default()),
            StoryInput::Serialized(raw) => serde_json::from_str::<Option<Story>>(&raw)
                .map(Option::unwrap_or_default)
                .map_err(|e| ClientError::BootstrapParseError(format!("story: {}", e))),
        }
    }
}

impl Story {
    /// Previous paragraphs for the history dialog, oldest first.
    pub fn history(&self) -> Vec<&str> {
        self.history_text
            .split("\n\n")
            .map(str::trim)
            .filter(|p| !p.is_empty())
            .collect()
    }
}

/// Body of the character-detail dialog.
pub fn render_character_detail(c: &Character, i18n: &Localization) -> String {
    let mut h = String::with_capacity(512);
    h.push_str(&format!(r#"<h3>✧ {} ✧</h3>"#, escape_html(&c.name)));
    if !c.avatar.is_empty() {
        h.push_str(&format!(
            r#"<img src="{}" alt="{}" class="pixel-art character-avatar">"#,
            escape_html(&c.avatar),
            escape_html(&c.name)
        ));
    }
    let detail = if c.detail.trim().is_empty() {
        i18n.get("character.no_detail").into_owned()
    } else {
        c.detail.clone()
    };
    h.push_str(&format!("<p>{}</p>", escape_html(&detail)));
    h.push_str(&format!(
        "<h4>✦ {} ✦</h4><ul>",
        escape_html(&i18n.get("character.events"))
    ));
    if c.events.is_empty() {
        h.push_str(&format!(
            "<li>{}</li>",
            escape_html(&i18n.get("character.no_events"))
        ));
    } else {
        for event in &c.events {
            h.push_str(&format!("<li>{}</li>", escape_html(event)));
        }
    }
    h.push_str("</ul>");
    h
}

#[cfg(test)]
mod tests {
    use super::*;

    const ROSTER: &str = r#"[{"id":"abby","name":"Abigail","avatar":"/a.png","desc":"x","detail":"Likes <caves>","events":["met at café"]},{"id":"seb","name":"Sebastian","extra":1}]"#;

    #[test]
    fn parses_serialized_roster_and_ignores_unknown_fields() {
        let roster = Roster::from_input(RosterInput::Serialized(ROSTER.into())).unwrap();
        assert_eq!(roster.len(), 2);
        let seb = roster.get("seb").unwrap();
        assert_eq!(seb.name, "Sebastian");
        assert!(seb.events.is_empty());
    }

    #[test]
    fn null_and_empty_roster_are_empty() {
        assert!(Roster::from_input(RosterInput::Serialized("null".into())).unwrap().is_empty());
        assert!(Roster::from_input(RosterInput::Serialized("".into())).unwrap().is_empty());
        assert!(Roster::from_input(RosterInput::default()).unwrap().is_empty());
    }

    #[test]
    fn malformed_roster_is_a_bootstrap_error() {
        let err = Roster::from_input(RosterInput::Serialized("[{".into())).unwrap_err();
        assert!(matches!(err, ClientError::BootstrapParseError(_)));
    }

    #[test]
    fn detail_escapes_and_falls_back() {
        let i18n = Localization::default();
        let roster = Roster::from_input(RosterInput::Serialized(ROSTER.into())).unwrap();

        let abby = render_character_detail(roster.get("abby").unwrap(), &i18n);
        assert!(abby.contains("Likes &lt;caves&gt;"));
        assert!(abby.contains("<li>met at café</li>"));
        assert!(abby.contains(r#"src="/a.png""#));

        let seb = render_character_detail(roster.get("seb").unwrap(), &i18n);
        assert!(seb.contains("No details yet."));
        assert!(seb.contains("No related events yet."));
        assert!(!seb.contains("<img"));
    }

    #[test]
    fn story_input_parses_template_json() {
        let story = StoryInput::Serialized(
            r#"{"text":"Hi","image":null,"image_pending":true,"options":["Wave"]}"#.into(),
        )
        .into_story()
        .unwrap();
        assert_eq!(story.text, "Hi");
        assert!(story.history().is_empty());
        assert_eq!(StoryInput::Serialized("null".into()).into_story().unwrap(), Story::default());
        assert!(matches!(
            StoryInput::Serialized("{\"text\":".into()).into_story(),
            Err(ClientError::BootstrapParseError(_))
        ));
    }

    #[test]
    fn history_splits_paragraphs() {
        let story = Story {
            history_text: "first\n\n  \n\nsecond ".into(),
            ..Story::default()
        };
        assert_eq!(story.history(), vec!["first", "second"]);
    }
}
