use std::fmt;

use serde::Deserialize;
use serde::Serialize;

use crate::descriptor::SessionDescriptor;
use crate::error::NavError;

/// JSON projection of a [`SessionDescriptor`], as carried after `#`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UrlFragment(String);

impl UrlFragment {
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn to_href(&self) -> String {
        format!("#{}", urlencoding::encode(&self.0))
    }

    pub fn from_href(href: &str) -> Result<Self, NavError> {
        let raw = href.split_once('#').map_or(href, |(_, fragment)| fragment);
        let decoded = urlencoding::decode(raw)
            .map_err(|err| NavError::MalformedFragment(format!("percent-decoding: {err}")))?;
        Ok(Self(decoded.into_owned()))
    }
}

impl fmt::Display for UrlFragment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

pub fn encode(descriptor: &SessionDescriptor) -> UrlFragment {
    // Maps with string keys and plain structs cannot fail to serialize.
    let raw = serde_json::to_string(descriptor).unwrap_or_default();
    UrlFragment(raw)
}

pub fn decode(fragment: &UrlFragment) -> Result<SessionDescriptor, NavError> {
    serde_json::from_str(fragment.as_str())
        .map_err(|err| NavError::MalformedFragment(err.to_string()))
}

/// Where the live fragment is written and read back from.
pub trait SessionPersistence {
    fn persist(&mut self, fragment: &UrlFragment) -> Result<(), NavError>;
    fn resume(&self) -> Result<Option<UrlFragment>, NavError>;
}

pub trait NavigationHistory: SessionPersistence {
    fn back(&mut self) -> Result<Option<UrlFragment>, NavError>;
    fn forward(&mut self) -> Result<Option<UrlFragment>, NavError>;
}

#[derive(Debug, Clone, Default)]
pub struct BrowserHistory {
    entries: Vec<UrlFragment>,
    cursor: usize,
}

impl BrowserHistory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_location(fragment: UrlFragment) -> Self {
        Self {
            entries: vec![fragment],
            cursor: 0,
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn current(&self) -> Option<&UrlFragment> {
        self.entries.get(self.cursor)
    }
}

impl SessionPersistence for BrowserHistory {
    fn persist(&mut self, fragment: &UrlFragment) -> Result<(), NavError> {
        if !self.entries.is_empty() {
            self.entries.truncate(self.cursor + 1);
        }
        if self.current() == Some(fragment) {
            return Ok(());
        }
        self.entries.push(fragment.clone());
        self.cursor = self.entries.len() - 1;
        Ok(())
    }

    fn resume(&self) -> Result<Option<UrlFragment>, NavError> {
        Ok(self.current().cloned())
    }
}

impl NavigationHistory for BrowserHistory {
    fn back(&mut self) -> Result<Option<UrlFragment>, NavError> {
        if self.cursor == 0 {
            return Ok(None);
        }
        self.cursor -= 1;
        Ok(self.current().cloned())
    }

    fn forward(&mut self) -> Result<Option<UrlFragment>, NavError> {
        if self.cursor + 1 >= self.entries.len() {
            return Ok(None);
        }
        self.cursor += 1;
        Ok(self.current().cloned())
    }
}
