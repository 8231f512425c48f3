use serde::Deserialize;
use serde::Serialize;
use serde_json::Map;
use serde_json::Value;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub error: bool,
}

/// Fields every screen reply carries.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResponseMeta {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub breadcrumbs: Vec<String>,
    #[serde(default)]
    pub notification: Notification,
    #[serde(default)]
    pub clear_session: bool,
    #[serde(default)]
    pub app_id: Option<String>,
    #[serde(default)]
    pub app_version: Option<String>,
    #[serde(default)]
    pub locales: Vec<String>,
    #[serde(default)]
    pub menu_session_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Command {
    pub title: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entity {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryDisplay {
    pub id: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommandsScreen {
    #[serde(flatten)]
    pub meta: ResponseMeta,
    #[serde(default)]
    pub commands: Vec<Command>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntitiesScreen {
    #[serde(flatten)]
    pub meta: ResponseMeta,
    pub entities: Vec<Entity>,
    #[serde(default)]
    pub num_entities_per_row: u32,
    #[serde(default)]
    pub page_count: u32,
    #[serde(default)]
    pub current_page: u32,
    #[serde(default)]
    pub uses_case_tiles: bool,
    #[serde(default)]
    pub max_width: u32,
    #[serde(default)]
    pub max_height: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryScreen {
    #[serde(flatten)]
    pub meta: ResponseMeta,
    pub query_key: String,
    pub displays: Vec<QueryDisplay>,
}

/// A classified reply from the execution service.
///
/// Built only by [`crate::interpreter::classify`]; serializes back to the
/// tagged wire shape.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ScreenResponse {
    Commands(CommandsScreen),
    Entities(EntitiesScreen),
    Query(QueryScreen),
}

impl ScreenResponse {
    pub fn meta(&self) -> &ResponseMeta {
        match self {
            Self::Commands(screen) => &screen.meta,
            Self::Entities(screen) => &screen.meta,
            Self::Query(screen) => &screen.meta,
        }
    }

    pub fn title(&self) -> &str {
        &self.meta().title
    }

    pub fn breadcrumbs(&self) -> &[String] {
        &self.meta().breadcrumbs
    }

    pub fn clear_session(&self) -> bool {
        self.meta().clear_session
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Self::Commands(_) => "commands",
            Self::Entities(_) => "entities",
            Self::Query(_) => "query",
        }
    }

    pub fn to_value(&self) -> Value {
        serde_json::to_value(self).unwrap_or(Value::Null)
    }
}
