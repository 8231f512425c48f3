use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::error::NavError;
use crate::response::CommandsScreen;
use crate::response::EntitiesScreen;
use crate::response::QueryScreen;
use crate::response::ScreenResponse;
use crate::selection::parse_action_index;
use crate::selection::SelectionToken;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScreenState {
    Root,
    AtCommands,
    AtEntities,
    AtQuery,
    AtForm,
}

impl ScreenState {
    pub fn of(response: &ScreenResponse) -> Self {
        match response {
            ScreenResponse::Commands(screen) if screen.commands.is_empty() => Self::AtForm,
            ScreenResponse::Commands(_) => Self::AtCommands,
            ScreenResponse::Entities(_) => Self::AtEntities,
            ScreenResponse::Query(_) => Self::AtQuery,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Root => "root",
            Self::AtCommands => "commands",
            Self::AtEntities => "entities",
            Self::AtQuery => "query",
            Self::AtForm => "form",
        }
    }

    /// Whether `action <n>` tokens may be selected from this screen.
    pub fn offers_actions(self) -> bool {
        matches!(self, Self::AtCommands | Self::AtEntities)
    }
}

/// What the next selection is validated against.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScreenCache {
    pub command_count: usize,
    pub entity_ids: Vec<String>,
    pub query_key: Option<String>,
}

impl ScreenCache {
    pub fn of(response: &ScreenResponse) -> Self {
        match response {
            ScreenResponse::Commands(screen) => Self {
                command_count: screen.commands.len(),
                ..Self::default()
            },
            ScreenResponse::Entities(screen) => Self {
                entity_ids: screen.entities.iter().map(|e| e.id.clone()).collect(),
                ..Self::default()
            },
            ScreenResponse::Query(screen) => Self {
                query_key: Some(screen.query_key.clone()),
                ..Self::default()
            },
        }
    }

    fn has_entity(&self, id: &str) -> bool {
        self.entity_ids.iter().any(|candidate| candidate == id)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Transition {
    pub next: ScreenState,
    pub cache: ScreenCache,
    /// Server asked for the whole session to be dropped.
    pub reset: bool,
}

/// Classifies a raw reply. This is the only place response shapes are
/// sniffed; everything downstream matches on [`ScreenResponse`].
pub fn classify(raw: &Value) -> Result<ScreenResponse, NavError> {
    let Some(object) = raw.as_object() else {
        return Err(NavError::MalformedResponse(
            "response is not an object".to_string(),
        ));
    };
    let present = |key: &str| object.get(key).is_some_and(|value| !value.is_null());

    if present("entities") {
        return parse_shape::<EntitiesScreen>(raw, "entities").map(ScreenResponse::Entities);
    }
    if present("displays") && present("queryKey") {
        return parse_shape::<QueryScreen>(raw, "query").map(ScreenResponse::Query);
    }
    let tagged_commands = object.get("type").and_then(Value::as_str) == Some("commands");
    if present("commands") || tagged_commands {
        return parse_shape::<CommandsScreen>(raw, "commands").map(ScreenResponse::Commands);
    }

    Err(NavError::MalformedResponse(
        "no entities, displays/queryKey or commands marker".to_string(),
    ))
}

fn parse_shape<T: DeserializeOwned>(raw: &Value, shape: &str) -> Result<T, NavError> {
    T::deserialize(raw).map_err(|err| NavError::MalformedResponse(format!("{shape}: {err}")))
}

pub fn interpret(response: &ScreenResponse) -> Transition {
    if response.clear_session() {
        return Transition {
            next: ScreenState::Root,
            cache: ScreenCache::default(),
            reset: true,
        };
    }
    Transition {
        next: ScreenState::of(response),
        cache: ScreenCache::of(response),
        reset: false,
    }
}

/// Checks `token` against the current screen before a query is issued and
/// pins down the kind of an untyped token: command index first, then entity
/// id, then action reference.
pub fn resolve_token(
    state: ScreenState,
    cache: &ScreenCache,
    token: &SelectionToken,
) -> Result<SelectionToken, NavError> {
    let reject = |reason: &str| Err(NavError::navigation(token.wire(), reason));

    match state {
        // Nothing has been rendered yet; the service resolves the token.
        ScreenState::Root => return Ok(token.clone()),
        ScreenState::AtForm => return reject("a form is open"),
        ScreenState::AtQuery => return reject("submit the query screen instead"),
        ScreenState::AtCommands | ScreenState::AtEntities => {}
    }

    match token {
        SelectionToken::Command(index) if *index < cache.command_count => Ok(token.clone()),
        SelectionToken::Command(_) => reject("no such command"),
        SelectionToken::Entity(id) if cache.has_entity(id) => Ok(token.clone()),
        SelectionToken::Entity(_) => reject("no such entity"),
        SelectionToken::Action(_) if state.offers_actions() => Ok(token.clone()),
        SelectionToken::Action(_) => reject("no actions on this screen"),
        SelectionToken::Untyped(raw) => {
            if let Ok(index) = raw.parse::<usize>() {
                if index < cache.command_count {
                    return Ok(SelectionToken::Command(index));
                }
            }
            if cache.has_entity(raw) {
                return Ok(SelectionToken::Entity(raw.clone()));
            }
            if let Some(index) = parse_action_index(raw) {
                return Ok(SelectionToken::Action(index));
            }
            reject("does not match a command, entity or action")
        }
    }
}
