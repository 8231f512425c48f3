use std::collections::BTreeMap;

use serde_json::Value;

use crate::descriptor::QueryData;
use crate::descriptor::QueryInputs;
use crate::descriptor::SessionDescriptor;
use crate::error::NavError;
use crate::gateway::query;
use crate::gateway::FormplayerTransport;
use crate::gateway::Route;
use crate::interpreter::classify;
use crate::interpreter::interpret;
use crate::interpreter::resolve_token;
use crate::interpreter::ScreenCache;
use crate::interpreter::ScreenState;
use crate::notifications::Notice;
use crate::notifications::NoticeLog;
use crate::response::ScreenResponse;
use crate::selection::SelectionPath;
use crate::selection::SelectionToken;
use crate::url::decode;
use crate::url::encode;
use crate::url::NavigationHistory;
use crate::url::SessionPersistence;
use crate::url::UrlFragment;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NavEffect {
    Render(ScreenState),
    UrlChanged(UrlFragment),
    Notify(Notice),
    SessionCleared,
}

/// A query that has been issued but not yet applied.
///
/// Completing it against a store whose session has moved on is a no-op.
#[derive(Debug, Clone)]
pub struct PendingQuery {
    ticket: u64,
    base: SessionDescriptor,
    target: SessionDescriptor,
    anchors: BTreeMap<String, SelectionPath>,
    route: Route,
    push_url: bool,
}

impl PendingQuery {
    pub fn ticket(&self) -> u64 {
        self.ticket
    }

    pub fn route(&self) -> Route {
        self.route
    }

    pub fn descriptor(&self) -> &SessionDescriptor {
        &self.target
    }
}

#[derive(Debug)]
pub struct SessionStore<P> {
    descriptor: SessionDescriptor,
    screen: ScreenState,
    response: Option<ScreenResponse>,
    cache: ScreenCache,
    anchors: BTreeMap<String, SelectionPath>,
    next_ticket: u64,
    in_flight: Option<u64>,
    persistence: P,
    notices: NoticeLog,
}

impl<P: SessionPersistence> SessionStore<P> {
    pub fn new(app_id: impl Into<String>, persistence: P) -> Self {
        Self::with_descriptor(SessionDescriptor::new(app_id), persistence)
    }

    pub fn open(app_id: impl Into<String>, persistence: P) -> Result<Self, NavError> {
        let descriptor = match persistence.resume()? {
            Some(fragment) => decode(&fragment)?,
            None => SessionDescriptor::new(app_id),
        };
        Ok(Self::with_descriptor(descriptor, persistence))
    }

    fn with_descriptor(descriptor: SessionDescriptor, persistence: P) -> Self {
        let (query_data, anchors) =
            prune_query_data(&descriptor.query_data, &BTreeMap::new(), &descriptor.selections);
        let descriptor = SessionDescriptor {
            query_data,
            ..descriptor
        };
        Self {
            descriptor,
            screen: ScreenState::Root,
            response: None,
            cache: ScreenCache::default(),
            anchors,
            next_ticket: 1,
            in_flight: None,
            persistence,
            notices: NoticeLog::default(),
        }
    }

    pub fn with_notice_capacity(mut self, cap: usize) -> Self {
        self.notices = NoticeLog::new(cap);
        self
    }

    pub fn descriptor(&self) -> &SessionDescriptor {
        &self.descriptor
    }

    pub fn selections(&self) -> &SelectionPath {
        &self.descriptor.selections
    }

    pub fn screen(&self) -> ScreenState {
        self.screen
    }

    pub fn response(&self) -> Option<&ScreenResponse> {
        self.response.as_ref()
    }

    pub fn breadcrumbs(&self) -> &[String] {
        self.response
            .as_ref()
            .map(ScreenResponse::breadcrumbs)
            .unwrap_or_default()
    }

    pub fn notices(&self) -> &NoticeLog {
        &self.notices
    }

    pub fn persistence(&self) -> &P {
        &self.persistence
    }

    pub fn url(&self) -> UrlFragment {
        encode(&self.descriptor)
    }

    pub fn is_querying(&self) -> bool {
        self.in_flight.is_some()
    }

    pub fn start<T>(&mut self, transport: &T) -> Result<Vec<NavEffect>, NavError>
    where
        T: FormplayerTransport + ?Sized,
    {
        let pending = self.begin(self.descriptor.clone(), self.anchors.clone(), true)?;
        self.run(pending, transport)
    }

    pub fn begin_select(&mut self, token: SelectionToken) -> Result<PendingQuery, NavError> {
        self.ensure_idle()?;
        let resolved = match resolve_token(self.screen, &self.cache, &token) {
            Ok(resolved) => resolved,
            Err(err) => return Err(self.fail(err)),
        };
        let target = self.descriptor.with_selection(resolved);
        self.begin(target, self.anchors.clone(), true)
    }

    pub fn complete(
        &mut self,
        pending: PendingQuery,
        reply: Result<Value, NavError>,
    ) -> Result<Vec<NavEffect>, NavError> {
        self.finish(pending, reply.and_then(|raw| classify(&raw)))
    }

    pub fn select<T>(
        &mut self,
        token: SelectionToken,
        transport: &T,
    ) -> Result<Vec<NavEffect>, NavError>
    where
        T: FormplayerTransport + ?Sized,
    {
        let mut effects = Vec::new();
        if self.screen == ScreenState::Root {
            effects.extend(self.start(transport)?);
        }
        let pending = self.begin_select(token)?;
        effects.extend(self.run(pending, transport)?);
        Ok(effects)
    }

    pub fn submit_query<T>(
        &mut self,
        inputs: QueryInputs,
        transport: &T,
    ) -> Result<Vec<NavEffect>, NavError>
    where
        T: FormplayerTransport + ?Sized,
    {
        self.ensure_idle()?;
        let query_key = match (self.screen, self.cache.query_key.clone()) {
            (ScreenState::AtQuery, Some(query_key)) => query_key,
            _ => {
                let last = self.descriptor.selections.last().map(SelectionToken::wire);
                return Err(self.fail(NavError::navigation(
                    last.unwrap_or_default(),
                    "no query screen is open",
                )));
            }
        };

        let path = self.descriptor.selections.clone();
        let (mut query_data, mut anchors) =
            prune_query_data(&self.descriptor.query_data, &self.anchors, &path);
        query_data.insert(query_key.clone(), inputs);
        anchors.insert(query_key, path.clone());

        let target = SessionDescriptor {
            query_data,
            ..self.descriptor.with_path(path)
        };
        let pending = self.begin(target, anchors, true)?;
        self.run(pending, transport)
    }

    pub fn set_search<T>(
        &mut self,
        search: Option<String>,
        transport: &T,
    ) -> Result<Vec<NavEffect>, NavError>
    where
        T: FormplayerTransport + ?Sized,
    {
        self.ensure_idle()?;
        self.ensure_entity_list("search")?;
        let mut target = self.descriptor.clone();
        target.search = search.filter(|text| !text.trim().is_empty());
        target.page = None;
        let pending = self.begin(target, self.anchors.clone(), true)?;
        self.run(pending, transport)
    }

    pub fn set_page<T>(&mut self, page: u32, transport: &T) -> Result<Vec<NavEffect>, NavError>
    where
        T: FormplayerTransport + ?Sized,
    {
        self.ensure_idle()?;
        self.ensure_entity_list("page")?;
        let mut target = self.descriptor.clone();
        target.page = Some(page);
        let pending = self.begin(target, self.anchors.clone(), true)?;
        self.run(pending, transport)
    }

    pub fn navigate_to_depth<T>(
        &mut self,
        depth: usize,
        transport: &T,
    ) -> Result<Vec<NavEffect>, NavError>
    where
        T: FormplayerTransport + ?Sized,
    {
        self.ensure_idle()?;
        let path = match self.descriptor.selections.truncate(depth) {
            Ok(path) => path,
            Err(err) => {
                tracing::error!(%err, "breadcrumb depth out of range");
                return Err(err);
            }
        };
        let (query_data, anchors) =
            prune_query_data(&self.descriptor.query_data, &self.anchors, &path);
        let target = SessionDescriptor {
            query_data,
            ..self.descriptor.with_path(path)
        };
        let pending = self.begin(target, anchors, true)?;
        self.run(pending, transport)
    }

    pub fn history_changed<T>(
        &mut self,
        fragment: &UrlFragment,
        transport: &T,
    ) -> Result<Vec<NavEffect>, NavError>
    where
        T: FormplayerTransport + ?Sized,
    {
        self.replay(fragment, false, transport)
    }

    pub fn open_link<T>(
        &mut self,
        fragment: &UrlFragment,
        transport: &T,
    ) -> Result<Vec<NavEffect>, NavError>
    where
        T: FormplayerTransport + ?Sized,
    {
        self.replay(fragment, true, transport)
    }

    pub fn switch_app<T>(
        &mut self,
        app_id: impl Into<String>,
        transport: &T,
    ) -> Result<Vec<NavEffect>, NavError>
    where
        T: FormplayerTransport + ?Sized,
    {
        self.ensure_idle()?;
        let target = SessionDescriptor::new(app_id);
        tracing::info!(app_id = %target.app_id, "switching app");
        let pending = self.begin(target, BTreeMap::new(), true)?;
        self.run(pending, transport)
    }

    fn replay<T>(
        &mut self,
        fragment: &UrlFragment,
        push_url: bool,
        transport: &T,
    ) -> Result<Vec<NavEffect>, NavError>
    where
        T: FormplayerTransport + ?Sized,
    {
        let decoded = decode(fragment)?;
        self.in_flight = None;

        let known_anchors = if decoded.app_id == self.descriptor.app_id {
            self.anchors.clone()
        } else {
            BTreeMap::new()
        };
        let (query_data, anchors) =
            prune_query_data(&decoded.query_data, &known_anchors, &decoded.selections);
        let target = SessionDescriptor {
            query_data,
            ..decoded
        };
        let pending = self.begin(target, anchors, push_url)?;
        self.run(pending, transport)
    }

    fn finish(
        &mut self,
        pending: PendingQuery,
        reply: Result<ScreenResponse, NavError>,
    ) -> Result<Vec<NavEffect>, NavError> {
        let current = self.in_flight == Some(pending.ticket);
        if current {
            self.in_flight = None;
        }
        if !current || pending.base != self.descriptor {
            tracing::warn!(
                ticket = pending.ticket,
                selections = ?pending.target.selections.to_wire(),
                "discarding stale formplayer response"
            );
            return Ok(Vec::new());
        }

        match reply {
            Ok(response) => self.apply(pending, response),
            Err(err) => Err(self.fail(err)),
        }
    }

    fn ensure_idle(&self) -> Result<(), NavError> {
        if self.in_flight.is_some() {
            return Err(NavError::QueryInFlight);
        }
        Ok(())
    }

    fn ensure_entity_list(&mut self, what: &str) -> Result<(), NavError> {
        if self.screen == ScreenState::AtEntities {
            return Ok(());
        }
        Err(self.fail(NavError::navigation(
            what,
            format!("{} screens have no entity list", self.screen.label()),
        )))
    }

    fn begin(
        &mut self,
        target: SessionDescriptor,
        anchors: BTreeMap<String, SelectionPath>,
        push_url: bool,
    ) -> Result<PendingQuery, NavError> {
        self.ensure_idle()?;
        let ticket = self.next_ticket;
        self.next_ticket = self.next_ticket.saturating_add(1);
        self.in_flight = Some(ticket);
        Ok(PendingQuery {
            ticket,
            base: self.descriptor.clone(),
            route: Route::for_descriptor(&target),
            target,
            anchors,
            push_url,
        })
    }

    fn run<T>(&mut self, pending: PendingQuery, transport: &T) -> Result<Vec<NavEffect>, NavError>
    where
        T: FormplayerTransport + ?Sized,
    {
        let reply = query(transport, &pending.target, pending.route.as_str());
        self.finish(pending, reply)
    }

    fn apply(
        &mut self,
        pending: PendingQuery,
        response: ScreenResponse,
    ) -> Result<Vec<NavEffect>, NavError> {
        let transition = interpret(&response);
        let notice = Notice::from_server(&response.meta().notification);

        if transition.reset {
            return self.reset(pending.target.app_id, notice);
        }

        let mut effects = Vec::new();
        if pending.push_url {
            let fragment = encode(&pending.target);
            self.persistence.persist(&fragment)?;
            effects.push(NavEffect::UrlChanged(fragment));
        }

        tracing::debug!(
            screen = transition.next.label(),
            depth = pending.target.selections.len(),
            "navigation applied"
        );
        self.descriptor = pending.target;
        self.anchors = pending.anchors;
        self.screen = transition.next;
        self.cache = transition.cache;
        self.response = Some(response);

        if let Some(notice) = notice {
            self.notices.push(notice.clone());
            effects.push(NavEffect::Notify(notice));
        }
        effects.push(NavEffect::Render(self.screen));
        Ok(effects)
    }

    fn reset(&mut self, app_id: String, notice: Option<Notice>) -> Result<Vec<NavEffect>, NavError> {
        let descriptor = SessionDescriptor::new(app_id);
        let fragment = encode(&descriptor);
        self.persistence.persist(&fragment)?;
        tracing::info!(app_id = %descriptor.app_id, "server cleared the session");

        self.descriptor = descriptor;
        self.anchors.clear();
        self.screen = ScreenState::Root;
        self.cache = ScreenCache::default();
        self.response = None;

        let mut effects = vec![NavEffect::SessionCleared, NavEffect::UrlChanged(fragment)];
        if let Some(notice) = notice {
            self.notices.push(notice.clone());
            effects.push(NavEffect::Notify(notice));
        }
        effects.push(NavEffect::Render(ScreenState::Root));
        Ok(effects)
    }

    fn fail(&mut self, err: NavError) -> NavError {
        if err.is_fatal() {
            self.notices.push(Notice::from_error(&err));
        }
        err
    }
}

impl<P: NavigationHistory> SessionStore<P> {
    // A failed render moves the backend cursor back to where it was.
    pub fn go_back<T>(&mut self, transport: &T) -> Result<Vec<NavEffect>, NavError>
    where
        T: FormplayerTransport + ?Sized,
    {
        let Some(fragment) = self.persistence.back()? else {
            return Ok(Vec::new());
        };
        match self.history_changed(&fragment, transport) {
            Ok(effects) => Ok(effects),
            Err(err) => {
                self.persistence.forward()?;
                Err(err)
            }
        }
    }

    pub fn go_forward<T>(&mut self, transport: &T) -> Result<Vec<NavEffect>, NavError>
    where
        T: FormplayerTransport + ?Sized,
    {
        let Some(fragment) = self.persistence.forward()? else {
            return Ok(Vec::new());
        };
        match self.history_changed(&fragment, transport) {
            Ok(effects) => Ok(effects),
            Err(err) => {
                self.persistence.back()?;
                Err(err)
            }
        }
    }
}

/// Keeps the query data whose submitting branch is still on `path`.
///
/// Keys without a recorded anchor (a deep link) are anchored at the deepest
/// action token of `path`, and dropped when there is none.
fn prune_query_data(
    query_data: &QueryData,
    anchors: &BTreeMap<String, SelectionPath>,
    path: &SelectionPath,
) -> (QueryData, BTreeMap<String, SelectionPath>) {
    let mut kept = QueryData::new();
    let mut kept_anchors = BTreeMap::new();
    for (key, inputs) in query_data {
        let anchor = anchors
            .get(key)
            .cloned()
            .or_else(|| path.deepest_action_prefix());
        let Some(anchor) = anchor else {
            continue;
        };
        if path.starts_with(&anchor) {
            kept.insert(key.clone(), inputs.clone());
            kept_anchors.insert(key.clone(), anchor);
        }
    }
    (kept, kept_anchors)
}

#[cfg(test)]
mod tests;
