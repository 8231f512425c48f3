use std::fmt;
use std::hash::Hash;
use std::hash::Hasher;
use std::sync::Arc;
use std::sync::OnceLock;

use regex::Regex;
use serde::Deserialize;
use serde::Deserializer;
use serde::Serialize;
use serde::Serializer;

use crate::error::NavError;

const ACTION_PREFIX: &str = "action ";

fn action_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^action (\d+)$").expect("static action pattern"))
}

/// One step of a navigation path.
///
/// Call sites that know what the user picked build a typed token; tokens read
/// back from a URL stay `Untyped` until they are resolved against a screen.
#[derive(Debug, Clone)]
pub enum SelectionToken {
    Command(usize),
    Entity(String),
    Action(usize),
    Untyped(String),
}

impl SelectionToken {
    pub fn entity(id: impl Into<String>) -> Self {
        Self::Entity(id.into())
    }

    /// Parses a token of unknown kind. Only the `action <n>` form is
    /// self-describing; everything else waits for screen resolution.
    pub fn parse_untyped(raw: &str) -> Self {
        match parse_action_index(raw) {
            Some(index) => Self::Action(index),
            None => Self::Untyped(raw.to_string()),
        }
    }

    pub fn wire(&self) -> String {
        match self {
            Self::Command(index) => index.to_string(),
            Self::Entity(id) => id.clone(),
            Self::Action(index) => format!("{ACTION_PREFIX}{index}"),
            Self::Untyped(raw) => raw.clone(),
        }
    }

    pub fn is_action(&self) -> bool {
        match self {
            Self::Action(_) => true,
            Self::Untyped(raw) => parse_action_index(raw).is_some(),
            Self::Command(_) | Self::Entity(_) => false,
        }
    }
}

pub fn parse_action_index(raw: &str) -> Option<usize> {
    action_pattern()
        .captures(raw)
        .and_then(|caps| caps.get(1))
        .and_then(|index| index.as_str().parse().ok())
}

impl PartialEq for SelectionToken {
    fn eq(&self, other: &Self) -> bool {
        self.wire() == other.wire()
    }
}

impl Eq for SelectionToken {}

impl Hash for SelectionToken {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.wire().hash(state);
    }
}

impl fmt::Display for SelectionToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.wire())
    }
}

impl Serialize for SelectionToken {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.wire())
    }
}

impl<'de> Deserialize<'de> for SelectionToken {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Ok(Self::parse_untyped(&raw))
    }
}

/// Path from the app root to the current screen. Paths are shared, never
/// edited in place, so older paths stay valid for history.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SelectionPath(Arc<[SelectionToken]>);

impl Default for SelectionPath {
    fn default() -> Self {
        Self(Vec::new().into())
    }
}

impl SelectionPath {
    pub fn root() -> Self {
        Self::default()
    }

    pub fn from_tokens(tokens: impl IntoIterator<Item = SelectionToken>) -> Self {
        Self(tokens.into_iter().collect())
    }

    pub fn append(&self, token: SelectionToken) -> Self {
        let mut tokens = self.0.to_vec();
        tokens.push(token);
        Self(tokens.into())
    }

    pub fn truncate(&self, depth: usize) -> Result<Self, NavError> {
        if depth > self.0.len() {
            return Err(NavError::InvalidDepth {
                depth,
                len: self.0.len(),
            });
        }
        Ok(Self(self.0[..depth].into()))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn tokens(&self) -> &[SelectionToken] {
        &self.0
    }

    pub fn last(&self) -> Option<&SelectionToken> {
        self.0.last()
    }

    pub fn starts_with(&self, prefix: &SelectionPath) -> bool {
        prefix.len() <= self.len() && self.0[..prefix.len()] == prefix.0[..]
    }

    /// Prefix ending at the deepest action token, if the path has one.
    pub fn deepest_action_prefix(&self) -> Option<Self> {
        self.0
            .iter()
            .rposition(SelectionToken::is_action)
            .map(|pos| Self(self.0[..=pos].into()))
    }

    pub fn to_wire(&self) -> Vec<String> {
        self.0.iter().map(SelectionToken::wire).collect()
    }
}
