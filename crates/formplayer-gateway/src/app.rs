use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::Path;
use std::path::PathBuf;

use formplayer_core::response::Entity;
use formplayer_core::response::QueryDisplay;
use formplayer_core::NavError;
use serde::Deserialize;
use serde::Serialize;
use serde_json::Map;
use thiserror::Error;

/// One level of an app's menu tree. The app itself is the root menu.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Menu {
    pub title: String,
    #[serde(default)]
    pub commands: Vec<Menu>,
    /// Present when selecting this menu opens a case list.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub entities: Option<Vec<Entity>>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub actions: Vec<ActionDef>,
}

impl Menu {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            commands: Vec::new(),
            entities: None,
            actions: Vec::new(),
        }
    }

    pub fn with_commands(mut self, commands: Vec<Menu>) -> Self {
        self.commands = commands;
        self
    }

    pub fn with_entities(mut self, entities: Vec<Entity>) -> Self {
        self.entities = Some(entities);
        self
    }

    pub fn with_actions(mut self, actions: Vec<ActionDef>) -> Self {
        self.actions = actions;
        self
    }

    pub fn entity(&self, id: &str) -> Option<&Entity> {
        self.entities.as_deref()?.iter().find(|entity| entity.id == id)
    }
}

/// A case search reachable as `action <n>` from a menu.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActionDef {
    pub title: String,
    pub query_key: String,
    #[serde(default)]
    pub displays: Vec<QueryDisplay>,
}

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("could not read app definitions at {path}: {source}")]
    Read { path: PathBuf, source: io::Error },

    #[error("could not parse app definitions at {path}: {message}")]
    Parse { path: PathBuf, message: String },
}

/// Static app definitions keyed by app id.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AppCatalog {
    apps: BTreeMap<String, Menu>,
}

impl AppCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// The single-app catalog used for demos and tests: `abc123`, "My App".
    pub fn fixture() -> Self {
        let survey = Menu::new("Survey Menu").with_commands(vec![Menu::new("Survey Form")]);
        let cases = Menu::new("Some Cases")
            .with_commands(vec![Menu::new("Followup Form")])
            .with_entities(vec![entity("some_case_id", "Some Case")])
            .with_actions(vec![ActionDef {
                title: "Search for Case".to_string(),
                query_key: "search_command.m1".to_string(),
                displays: vec![QueryDisplay {
                    id: "dob".to_string(),
                    extra: Map::new(),
                }],
            }]);

        let mut catalog = Self::new();
        catalog.insert("abc123", Menu::new("My App").with_commands(vec![survey, cases]));
        catalog
    }

    /// Reads a catalog from `.json`, or from YAML for any other extension.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, CatalogError> {
        let path = path.as_ref();
        let raw = fs::read_to_string(path).map_err(|source| CatalogError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let is_json = path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));
        let parsed = if is_json {
            serde_json::from_str(&raw).map_err(|err| err.to_string())
        } else {
            serde_yaml::from_str(&raw).map_err(|err| err.to_string())
        };
        let catalog: Self = parsed.map_err(|message| CatalogError::Parse {
            path: path.to_path_buf(),
            message,
        })?;
        tracing::debug!(path = %path.display(), apps = catalog.len(), "loaded app definitions");
        Ok(catalog)
    }

    pub fn insert(&mut self, app_id: impl Into<String>, app: Menu) {
        self.apps.insert(app_id.into(), app);
    }

    pub fn get(&self, app_id: &str) -> Result<&Menu, NavError> {
        self.apps
            .get(app_id)
            .ok_or_else(|| NavError::UnknownApp(app_id.to_string()))
    }

    pub fn app_ids(&self) -> impl Iterator<Item = &str> {
        self.apps.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.apps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.apps.is_empty()
    }
}

pub fn entity(id: impl Into<String>, name: impl Into<String>) -> Entity {
    Entity {
        id: id.into(),
        name: name.into(),
        extra: Map::new(),
    }
}
