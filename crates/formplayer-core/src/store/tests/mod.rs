use std::cell::RefCell;

use serde_json::json;
use serde_json::Value;

pub(super) use super::NavEffect;
pub(super) use super::PendingQuery;
pub(super) use super::SessionStore;
pub(super) use crate::descriptor::QueryInputs;
pub(super) use crate::descriptor::SessionDescriptor;
pub(super) use crate::error::NavError;
pub(super) use crate::gateway::MenuRequest;
pub(super) use crate::gateway::Route;
pub(super) use crate::interpreter::ScreenState;
pub(super) use crate::selection::SelectionToken;
pub(super) use crate::url::decode;
pub(super) use crate::url::encode;
pub(super) use crate::url::BrowserHistory;
pub(super) use crate::url::SessionPersistence;
pub(super) use crate::url::UrlFragment;

mod failures;
mod history;

const APP_ID: &str = "abc123";
const QUERY_KEY: &str = "search_command.m1";

fn store() -> SessionStore<BrowserHistory> {
    SessionStore::new(APP_ID, BrowserHistory::new())
}

fn wire(store: &SessionStore<BrowserHistory>) -> Vec<String> {
    store.selections().to_wire()
}

fn crumbs(store: &SessionStore<BrowserHistory>) -> Vec<&str> {
    store.breadcrumbs().iter().map(String::as_str).collect()
}

fn reply(kind: &str, title: &str, breadcrumbs: &[&str]) -> Value {
    json!({
        "type": kind,
        "title": title,
        "breadcrumbs": breadcrumbs,
        "notification": {"message": null, "error": false},
        "clearSession": false,
        "appId": "5319fe096062b0e282bf37e6faa81566",
        "appVersion": "CommCare Version: 2.27, App Version: 93",
        "locales": ["default", "en", "hin"],
        "menuSessionId": "e9fad761-5239-4096-bb71-0aba1ebd7377",
    })
}

fn commands(title: &str, breadcrumbs: &[&str], titles: &[&str]) -> Value {
    let mut value = reply("commands", title, breadcrumbs);
    value["commands"] = titles.iter().map(|t| json!({"title": t})).collect();
    value
}

fn entities(title: &str, breadcrumbs: &[&str]) -> Value {
    let mut value = reply("entities", title, breadcrumbs);
    value["entities"] = json!([{"id": "some_case_id", "name": "Some Case"}]);
    value["pageCount"] = json!(1);
    value["currentPage"] = json!(0);
    value
}

/// Scripted execution service for one small app:
///
/// - `0` Survey Menu → `0` Survey Form
/// - `1` Some Cases → entity `some_case_id`, action `0` Search for Case
/// - `2` Log Out clears the session
/// - `3` Broken answers with an unrecognisable shape
fn formplayer(route: Route, request: &MenuRequest) -> Result<Value, NavError> {
    if request.app_id != APP_ID {
        return Err(NavError::UnknownApp(request.app_id.clone()));
    }
    let searched = request
        .query_data
        .get(QUERY_KEY)
        .is_some_and(QueryInputs::has_inputs);
    let selections: Vec<&str> = request.selections.iter().map(String::as_str).collect();

    let value = match (route, selections.as_slice()) {
        (Route::NavigateMenuStart, []) => commands(
            "My App",
            &["My App"],
            &["Survey Menu", "Some Cases", "Log Out", "Broken"],
        ),
        (Route::NavigateMenu, ["0"]) => {
            commands("Survey Menu", &["My App", "Survey Menu"], &["Survey Form"])
        }
        (Route::NavigateMenu, ["0", "0"]) => reply(
            "commands",
            "Survey Form",
            &["My App", "Survey Menu", "Survey Form"],
        ),
        (Route::NavigateMenu, ["1"]) => entities("Some Cases", &["My App", "Some Cases"]),
        (Route::NavigateMenu, ["1", "some_case_id"]) => commands(
            "Some Cases",
            &["My App", "Some Cases", "Some Case"],
            &["Followup Form"],
        ),
        (Route::NavigateMenu, ["1", "action 0"]) if searched => entities(
            "Some Cases",
            &["My App", "Some Cases", "Search for Case"],
        ),
        (Route::NavigateMenu, ["1", "action 0"]) => {
            let mut value = reply(
                "query",
                "Search for Case",
                &["My App", "Some Cases", "Search for Case"],
            );
            value["queryKey"] = json!(QUERY_KEY);
            value["displays"] = json!([{"id": "dob"}]);
            value
        }
        (Route::NavigateMenu, ["1", "action 0", "some_case_id"]) => commands(
            "Some Cases",
            &["My App", "Some Cases", "Search for Case", "Some Case"],
            &["Followup Form"],
        ),
        (Route::NavigateMenu, ["2"]) => {
            let mut value = commands("My App", &["My App", "Log Out"], &[]);
            value["clearSession"] = json!(true);
            value["notification"] = json!({"message": "Session ended", "error": false});
            value
        }
        (Route::NavigateMenu, ["3"]) => json!({"title": "Broken", "breadcrumbs": ["My App"]}),
        _ => {
            return Err(NavError::navigation(
                selections.join(","),
                "not in the fixture app",
            ))
        }
    };
    Ok(value)
}

type Calls = RefCell<Vec<(Route, Vec<String>)>>;

fn recording(
    calls: &Calls,
) -> impl Fn(Route, &MenuRequest) -> Result<Value, NavError> + '_ {
    move |route: Route, request: &MenuRequest| {
        calls
            .borrow_mut()
            .push((route, request.selections.clone()));
        formplayer(route, request)
    }
}

fn started() -> SessionStore<BrowserHistory> {
    let mut store = store();
    store.start(&formplayer).expect("start");
    store
}
