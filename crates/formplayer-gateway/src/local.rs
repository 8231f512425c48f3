use formplayer_core::gateway::FormplayerTransport;
use formplayer_core::gateway::MenuRequest;
use formplayer_core::gateway::Route;
use formplayer_core::parse_action_index;
use formplayer_core::response::Command;
use formplayer_core::response::CommandsScreen;
use formplayer_core::response::EntitiesScreen;
use formplayer_core::response::Entity;
use formplayer_core::response::QueryScreen;
use formplayer_core::response::ResponseMeta;
use formplayer_core::response::ScreenResponse;
use formplayer_core::NavError;
use serde_json::Map;
use serde_json::Value;

use crate::app::ActionDef;
use crate::app::AppCatalog;
use crate::app::Menu;

pub const DEFAULT_PAGE_SIZE: usize = 10;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerInfo {
    pub app_id: String,
    pub app_version: String,
    pub locales: Vec<String>,
    pub menu_session_id: String,
}

impl Default for ServerInfo {
    fn default() -> Self {
        Self {
            app_id: "5319fe096062b0e282bf37e6faa81566".to_string(),
            app_version: "CommCare Version: 2.27, App Version: 93".to_string(),
            locales: vec!["default".to_string(), "en".to_string(), "hin".to_string()],
            menu_session_id: "e9fad761-5239-4096-bb71-0aba1ebd7377".to_string(),
        }
    }
}

/// Stateless: every reply is computed from the request alone.
#[derive(Debug, Clone)]
pub struct LocalFormplayer {
    catalog: AppCatalog,
    page_size: usize,
    server: ServerInfo,
}

enum Landing<'a> {
    Menu,
    EntityList,
    QueryScreen(&'a ActionDef),
}

impl LocalFormplayer {
    pub fn new(catalog: AppCatalog) -> Self {
        Self {
            catalog,
            page_size: DEFAULT_PAGE_SIZE,
            server: ServerInfo::default(),
        }
    }

    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size.max(1);
        self
    }

    fn menu_start(&self, app: &Menu) -> ScreenResponse {
        commands_screen(self.meta(&app.title, vec![app.title.clone()]), app)
    }

    fn navigate(&self, app: &Menu, request: &MenuRequest) -> Result<ScreenResponse, NavError> {
        if request.selections.is_empty() {
            return Err(NavError::navigation(
                "",
                "no selections given to navigate_menu",
            ));
        }

        let mut menu = app;
        let mut breadcrumbs = vec![app.title.clone()];
        let mut landing = Landing::Menu;

        for selection in &request.selections {
            if let Some(command) = selection
                .parse::<usize>()
                .ok()
                .and_then(|index| menu.commands.get(index))
            {
                menu = command;
                breadcrumbs.push(command.title.clone());
                landing = if command.entities.is_some() {
                    Landing::EntityList
                } else {
                    Landing::Menu
                };
            } else if let Some(entity) = menu.entity(selection) {
                breadcrumbs.push(entity.name.clone());
                landing = Landing::Menu;
            } else if let Some(action) =
                parse_action_index(selection).and_then(|index| menu.actions.get(index))
            {
                breadcrumbs.push(action.title.clone());
                let searched = request
                    .query_data
                    .get(&action.query_key)
                    .is_some_and(|inputs| inputs.has_inputs());
                landing = if searched {
                    Landing::EntityList
                } else {
                    Landing::QueryScreen(action)
                };
            } else {
                return Err(NavError::navigation(
                    selection.as_str(),
                    format!("not found under {}", menu.title),
                ));
            }
        }

        let meta = self.meta(&menu.title, breadcrumbs);
        Ok(match landing {
            Landing::Menu => commands_screen(meta, menu),
            Landing::EntityList => self.entities_screen(meta, menu, request),
            Landing::QueryScreen(action) => ScreenResponse::Query(QueryScreen {
                meta,
                query_key: action.query_key.clone(),
                displays: action.displays.clone(),
            }),
        })
    }

    fn entities_screen(
        &self,
        meta: ResponseMeta,
        menu: &Menu,
        request: &MenuRequest,
    ) -> ScreenResponse {
        let needle = request
            .search
            .as_deref()
            .map(str::trim)
            .filter(|text| !text.is_empty())
            .map(str::to_lowercase);
        let matching: Vec<&Entity> = menu
            .entities
            .as_deref()
            .unwrap_or_default()
            .iter()
            .filter(|entity| match &needle {
                Some(needle) => entity.name.to_lowercase().contains(needle.as_str()),
                None => true,
            })
            .collect();

        let page_count = matching.len().div_ceil(self.page_size).max(1);
        let current_page = (request.page.unwrap_or(0) as usize).min(page_count - 1);
        let entities = matching
            .into_iter()
            .skip(current_page * self.page_size)
            .take(self.page_size)
            .cloned()
            .collect();

        ScreenResponse::Entities(EntitiesScreen {
            meta,
            entities,
            num_entities_per_row: 0,
            page_count: to_u32(page_count),
            current_page: to_u32(current_page),
            uses_case_tiles: false,
            max_width: 0,
            max_height: 0,
        })
    }

    fn meta(&self, title: &str, breadcrumbs: Vec<String>) -> ResponseMeta {
        ResponseMeta {
            title: title.to_string(),
            breadcrumbs,
            app_id: Some(self.server.app_id.clone()),
            app_version: Some(self.server.app_version.clone()),
            locales: self.server.locales.clone(),
            menu_session_id: Some(self.server.menu_session_id.clone()),
            ..ResponseMeta::default()
        }
    }
}

impl FormplayerTransport for LocalFormplayer {
    fn send(&self, route: Route, request: &MenuRequest) -> Result<Value, NavError> {
        let app = self.catalog.get(&request.app_id)?;
        let response = match route {
            Route::NavigateMenuStart => self.menu_start(app),
            Route::NavigateMenu => self.navigate(app, request)?,
        };
        tracing::debug!(
            route = route.as_str(),
            kind = response.kind(),
            title = response.title(),
            "local formplayer answered"
        );
        Ok(response.to_value())
    }
}

fn commands_screen(meta: ResponseMeta, menu: &Menu) -> ScreenResponse {
    ScreenResponse::Commands(CommandsScreen {
        meta,
        commands: menu
            .commands
            .iter()
            .map(|command| Command {
                title: command.title.clone(),
                extra: Map::new(),
            })
            .collect(),
    })
}

fn to_u32(value: usize) -> u32 {
    u32::try_from(value).unwrap_or(u32::MAX)
}
