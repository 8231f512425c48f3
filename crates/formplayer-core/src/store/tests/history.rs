use super::*;
use crate::notifications::NoticeSource;
use pretty_assertions::assert_eq;

fn at_survey_form() -> SessionStore<BrowserHistory> {
    let mut store = store();
    store
        .select(SelectionToken::Command(0), &formplayer)
        .expect("menu");
    store
        .select(SelectionToken::Command(0), &formplayer)
        .expect("form");
    store
}

#[test]
fn back_and_forward_replay_without_appending() {
    let calls = Calls::default();
    let transport = recording(&calls);
    let mut store = at_survey_form();
    let entries = store.persistence().len();

    store.go_back(&transport).expect("back");
    assert_eq!(wire(&store), vec!["0"]);
    assert_eq!(store.screen(), ScreenState::AtCommands);
    assert_eq!(store.persistence().len(), entries);
    assert_eq!(
        calls.borrow().last().cloned(),
        Some((Route::NavigateMenu, vec!["0".to_string()]))
    );

    store.go_forward(&transport).expect("forward");
    assert_eq!(wire(&store), vec!["0", "0"]);
    assert_eq!(store.screen(), ScreenState::AtForm);
    assert_eq!(store.persistence().len(), entries);
}

#[test]
fn back_to_the_root_uses_menu_start() {
    let calls = Calls::default();
    let transport = recording(&calls);
    let mut store = at_survey_form();

    store.go_back(&transport).expect("back");
    store.go_back(&transport).expect("back");

    assert!(store.selections().is_empty());
    assert_eq!(
        calls.borrow().last().map(|(route, _)| *route),
        Some(Route::NavigateMenuStart)
    );
    assert!(store.go_back(&transport).expect("nothing left").is_empty());
}

#[test]
fn breadcrumb_navigation_pushes_a_new_entry() {
    let mut store = at_survey_form();
    let entries = store.persistence().len();

    store.navigate_to_depth(1, &formplayer).expect("crumb");

    assert_eq!(wire(&store), vec!["0"]);
    assert_eq!(crumbs(&store), vec!["My App", "Survey Menu"]);
    assert_eq!(store.persistence().len(), entries + 1);
}

#[test]
fn opening_a_deep_link_resumes_at_depth() {
    let linked = SessionDescriptor::new(APP_ID)
        .with_selection(SelectionToken::Command(1))
        .with_selection(SelectionToken::entity("some_case_id"));
    let mut store =
        SessionStore::open("other-app", BrowserHistory::with_location(encode(&linked)))
            .expect("open");

    assert_eq!(store.descriptor().app_id, APP_ID);
    store.start(&formplayer).expect("start");

    assert_eq!(store.screen(), ScreenState::AtCommands);
    assert_eq!(wire(&store), vec!["1", "some_case_id"]);
    assert_eq!(crumbs(&store), vec!["My App", "Some Cases", "Some Case"]);
}

#[test]
fn server_clear_session_resets_to_root() {
    let mut store = started();

    let effects = store
        .select(SelectionToken::Command(2), &formplayer)
        .expect("log out");

    assert!(matches!(effects.first(), Some(NavEffect::SessionCleared)));
    assert!(matches!(
        effects.last(),
        Some(NavEffect::Render(ScreenState::Root))
    ));
    assert!(store.selections().is_empty());
    assert_eq!(store.screen(), ScreenState::Root);
    assert!(store.response().is_none());
    assert_eq!(
        store.persistence().resume().expect("resume"),
        Some(encode(&SessionDescriptor::new(APP_ID)))
    );
    assert_eq!(
        store.notices().latest().map(|n| (n.source, n.message.as_str())),
        Some((NoticeSource::Server, "Session ended"))
    );
}

#[test]
fn switching_apps_replaces_the_descriptor() {
    let mut store = at_survey_form();

    let err = store
        .switch_app("missing", &formplayer)
        .expect_err("unknown app");
    assert_eq!(err, NavError::UnknownApp("missing".to_string()));
    assert_eq!(store.descriptor().app_id, APP_ID);

    store.switch_app(APP_ID, &formplayer).expect("same app");
    assert!(store.selections().is_empty());
    assert_eq!(store.screen(), ScreenState::AtCommands);
}

fn offline(_: Route, _: &MenuRequest) -> Result<serde_json::Value, NavError> {
    Err(NavError::navigation("0", "formplayer unreachable"))
}

#[test]
fn failed_back_leaves_the_history_cursor_on_the_rendered_screen() {
    let mut store = at_survey_form();
    let entries = store.persistence().len();

    store.go_back(&offline).expect_err("offline");

    assert_eq!(wire(&store), vec!["0", "0"]);
    assert_eq!(store.persistence().len(), entries);
    assert_eq!(
        store.persistence().resume().expect("resume"),
        Some(store.url())
    );

    store.go_back(&formplayer).expect("back once online");
    assert_eq!(wire(&store), vec!["0"]);
}

#[test]
fn failed_forward_leaves_the_history_cursor_on_the_rendered_screen() {
    let mut store = at_survey_form();
    store.go_back(&formplayer).expect("back");

    store.go_forward(&offline).expect_err("offline");

    assert_eq!(wire(&store), vec!["0"]);
    assert_eq!(
        store.persistence().resume().expect("resume"),
        Some(store.url())
    );

    store.go_forward(&formplayer).expect("forward once online");
    assert_eq!(wire(&store), vec!["0", "0"]);
}

#[test]
fn undecodable_link_is_rejected_before_it_reaches_history() {
    let mut store = at_survey_form();
    let entries = store.persistence().len();
    let before = store.persistence().resume().expect("resume");

    let err = store
        .open_link(&UrlFragment::new("not-json"), &formplayer)
        .expect_err("malformed");

    assert!(matches!(err, NavError::MalformedFragment(_)));
    assert_eq!(store.persistence().len(), entries);
    assert_eq!(store.persistence().resume().expect("resume"), before);
    store.start(&formplayer).expect("still usable");
    assert_eq!(wire(&store), vec!["0", "0"]);
}

#[test]
fn opening_a_link_pushes_one_entry_once_rendered() {
    let mut store = started();
    let entries = store.persistence().len();
    let linked = encode(
        &SessionDescriptor::new(APP_ID)
            .with_selection(SelectionToken::Command(1))
            .with_selection(SelectionToken::entity("some_case_id")),
    );

    store.open_link(&linked, &formplayer).expect("open");

    assert_eq!(wire(&store), vec!["1", "some_case_id"]);
    assert_eq!(store.persistence().len(), entries + 1);
    assert_eq!(store.persistence().resume().expect("resume"), Some(linked));
}

#[test]
fn link_that_fails_to_render_is_not_recorded() {
    let mut store = started();
    let entries = store.persistence().len();
    let linked = encode(&SessionDescriptor::new(APP_ID).with_selection(SelectionToken::Command(9)));

    store.open_link(&linked, &formplayer).expect_err("no such command");

    assert!(store.selections().is_empty());
    assert_eq!(store.persistence().len(), entries);
}
