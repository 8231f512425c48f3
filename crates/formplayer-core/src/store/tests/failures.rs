use super::*;
use crate::notifications::NoticeLevel;
use pretty_assertions::assert_eq;

#[test]
fn malformed_response_leaves_session_untouched() {
    let mut store = started();
    let before = store.descriptor().clone();
    let url_before = store.persistence().resume().expect("resume");

    let err = store
        .select(SelectionToken::Command(3), &formplayer)
        .expect_err("malformed");

    assert!(matches!(err, NavError::MalformedResponse(_)));
    assert_eq!(*store.descriptor(), before);
    assert_eq!(store.persistence().resume().expect("resume"), url_before);
    assert_eq!(store.screen(), ScreenState::AtCommands);
    assert_eq!(
        store.notices().latest().map(|notice| notice.level),
        Some(NoticeLevel::Error)
    );
    assert!(!store.is_querying());
}

#[test]
fn out_of_range_index_is_rejected_before_querying() {
    let calls = Calls::default();
    let transport = recording(&calls);
    let mut store = store();
    store.start(&transport).expect("start");
    calls.borrow_mut().clear();

    let err = store
        .select(SelectionToken::Command(9), &transport)
        .expect_err("no such command");

    assert!(matches!(err, NavError::Navigation { .. }));
    assert!(calls.borrow().is_empty());
    assert!(store.selections().is_empty());
}

#[test]
fn unknown_app_surfaces_without_touching_the_url() {
    let mut store = SessionStore::new("missing", BrowserHistory::new());

    let err = store.start(&formplayer).expect_err("unknown app");

    assert_eq!(err, NavError::UnknownApp("missing".to_string()));
    assert!(store.persistence().is_empty());
    assert_eq!(store.screen(), ScreenState::Root);
    assert_eq!(store.notices().len(), 1);
}

#[test]
fn second_select_while_in_flight_is_a_caller_error() {
    let mut store = started();

    let pending = store
        .begin_select(SelectionToken::Command(0))
        .expect("first");
    let err = store
        .begin_select(SelectionToken::Command(1))
        .expect_err("second");
    assert_eq!(err, NavError::QueryInFlight);

    let reply = formplayer(pending.route(), &MenuRequest::from_descriptor(pending.descriptor()));
    store.complete(pending, reply).expect("complete");
    assert_eq!(wire(&store), vec!["0"]);
}

#[test]
fn form_screen_accepts_no_further_selection() {
    let mut store = started();
    store
        .select(SelectionToken::Command(0), &formplayer)
        .expect("menu");
    store
        .select(SelectionToken::Command(0), &formplayer)
        .expect("form");

    let err = store
        .select(SelectionToken::Command(0), &formplayer)
        .expect_err("form is terminal");
    assert!(matches!(err, NavError::Navigation { .. }));
    assert_eq!(wire(&store), vec!["0", "0"]);
}

#[test]
fn query_submission_needs_an_open_query_screen() {
    let mut store = started();

    let err = store
        .submit_query(QueryInputs::default(), &formplayer)
        .expect_err("no query screen");
    assert!(matches!(err, NavError::Navigation { .. }));
}

#[test]
fn breadcrumb_depth_past_the_path_is_invalid() {
    let mut store = started();
    store
        .select(SelectionToken::Command(1), &formplayer)
        .expect("case list");

    let err = store
        .navigate_to_depth(2, &formplayer)
        .expect_err("too deep");
    assert_eq!(err, NavError::InvalidDepth { depth: 2, len: 1 });
    assert_eq!(wire(&store), vec!["1"]);
}

#[test]
fn paging_outside_an_entity_list_is_rejected() {
    let mut store = started();
    let err = store.set_page(1, &formplayer).expect_err("no list");
    assert!(matches!(err, NavError::Navigation { .. }));
    assert!(store.descriptor().page.is_none());
}
