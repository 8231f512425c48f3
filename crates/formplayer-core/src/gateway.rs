use serde::Deserialize;
use serde::Serialize;
use serde_json::Value;

use crate::descriptor::QueryData;
use crate::descriptor::SessionDescriptor;
use crate::error::NavError;
use crate::interpreter::classify;
use crate::response::ScreenResponse;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Route {
    NavigateMenuStart,
    NavigateMenu,
}

impl Route {
    pub fn parse(name: &str) -> Result<Self, NavError> {
        match name {
            "navigate_menu_start" => Ok(Self::NavigateMenuStart),
            "navigate_menu" => Ok(Self::NavigateMenu),
            other => Err(NavError::UnknownRoute(other.to_string())),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::NavigateMenuStart => "navigate_menu_start",
            Self::NavigateMenu => "navigate_menu",
        }
    }

    /// The route that renders `descriptor`'s current screen.
    pub fn for_descriptor(descriptor: &SessionDescriptor) -> Self {
        if descriptor.is_root() {
            Self::NavigateMenuStart
        } else {
            Self::NavigateMenu
        }
    }
}

/// Request body sent to the execution service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MenuRequest {
    pub app_id: String,
    pub selections: Vec<String>,
    #[serde(default, skip_serializing_if = "QueryData::is_empty")]
    pub query_data: QueryData,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub search: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page: Option<u32>,
}

impl MenuRequest {
    pub fn from_descriptor(descriptor: &SessionDescriptor) -> Self {
        Self {
            app_id: descriptor.app_id.clone(),
            selections: descriptor.selections.to_wire(),
            query_data: descriptor.query_data.clone(),
            search: descriptor.search.clone(),
            page: descriptor.page,
        }
    }
}

/// The execution service. Implementations must not keep per-session state:
/// every call is answerable from the request and the app definition alone.
pub trait FormplayerTransport {
    fn send(&self, route: Route, request: &MenuRequest) -> Result<Value, NavError>;
}

impl<F> FormplayerTransport for F
where
    F: Fn(Route, &MenuRequest) -> Result<Value, NavError>,
{
    fn send(&self, route: Route, request: &MenuRequest) -> Result<Value, NavError> {
        self(route, request)
    }
}

pub fn query<T>(
    transport: &T,
    descriptor: &SessionDescriptor,
    route_name: &str,
) -> Result<ScreenResponse, NavError>
where
    T: FormplayerTransport + ?Sized,
{
    let route = Route::parse(route_name)?;
    let raw = send_checked(transport, descriptor, route)?;
    classify(&raw)
}

/// Shapes and sends the request without classifying the reply.
fn send_checked<T>(
    transport: &T,
    descriptor: &SessionDescriptor,
    route: Route,
) -> Result<Value, NavError>
where
    T: FormplayerTransport + ?Sized,
{
    match (route, descriptor.is_root()) {
        (Route::NavigateMenuStart, false) => {
            return Err(NavError::navigation(
                descriptor.selections.to_wire().join(","),
                "navigate_menu_start takes no selections",
            ));
        }
        (Route::NavigateMenu, true) => {
            return Err(NavError::navigation(
                "",
                "no selections given to navigate_menu",
            ));
        }
        _ => {}
    }

    let request = MenuRequest::from_descriptor(descriptor);
    tracing::debug!(
        route = route.as_str(),
        app_id = %request.app_id,
        selections = ?request.selections,
        "querying formplayer"
    );
    transport.send(route, &request)
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;

    use pretty_assertions::assert_eq;
    use serde_json::json;

    use super::*;
    use crate::selection::SelectionToken;

    fn root_reply() -> Value {
        json!({
            "type": "commands",
            "title": "My App",
            "breadcrumbs": ["My App"],
            "commands": [{"title": "Survey Menu"}],
        })
    }

    #[test]
    fn unknown_route_is_rejected_before_sending() {
        let sent = RefCell::new(0);
        let transport = |_: Route, _: &MenuRequest| -> Result<Value, NavError> {
            *sent.borrow_mut() += 1;
            Ok(root_reply())
        };

        let err = query(&transport, &SessionDescriptor::new("abc123"), "navigate_form")
            .expect_err("unknown route");
        assert_eq!(err, NavError::UnknownRoute("navigate_form".to_string()));
        assert_eq!(*sent.borrow(), 0);
    }

    #[test]
    fn route_must_agree_with_selection_depth() {
        let transport = |_: Route, _: &MenuRequest| -> Result<Value, NavError> { Ok(root_reply()) };
        let root = SessionDescriptor::new("abc123");
        let deeper = root.with_selection(SelectionToken::Command(0));

        assert!(query(&transport, &root, "navigate_menu").is_err());
        assert!(query(&transport, &deeper, "navigate_menu_start").is_err());
        assert!(query(&transport, &root, "navigate_menu_start").is_ok());
    }

    #[test]
    fn request_carries_wire_shaped_selections() {
        let seen = RefCell::new(None);
        let transport = |route: Route, request: &MenuRequest| -> Result<Value, NavError> {
            *seen.borrow_mut() = Some((route, request.clone()));
            Ok(root_reply())
        };
        let descriptor = SessionDescriptor::new("abc123")
            .with_selection(SelectionToken::Command(1))
            .with_selection(SelectionToken::Action(0));

        query(&transport, &descriptor, "navigate_menu").expect("query");

        let (route, request) = seen.borrow_mut().take().expect("sent");
        assert_eq!(route, Route::NavigateMenu);
        assert_eq!(request.selections, vec!["1", "action 0"]);
        assert_eq!(
            serde_json::to_value(&request).expect("serialize"),
            json!({"appId": "abc123", "selections": ["1", "action 0"]})
        );
    }

    #[test]
    fn repeated_queries_yield_equal_responses() {
        let transport = |_: Route, _: &MenuRequest| -> Result<Value, NavError> { Ok(root_reply()) };
        let descriptor = SessionDescriptor::new("abc123");
        let first = query(&transport, &descriptor, "navigate_menu_start").expect("first");
        let second = query(&transport, &descriptor, "navigate_menu_start").expect("second");
        assert_eq!(first, second);
    }
}
