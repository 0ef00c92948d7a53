//! Navigation pipeline
//!
//! [`Router`] owns the route table, the active location, and the
//! transition state machine: resolve → redirect check → leave guards →
//! global guards → enter guards → finalize. Concurrency control is a
//! single pending token compared by `Arc` identity: starting a new
//! navigation reassigns it, and every in-flight transition re-checks the
//! token around its asynchronous waits, resolving as `Cancelled` the
//! moment it goes stale. The most recently requested navigation always
//! wins; stale ones terminate without touching the active location.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, RwLock, Weak};

use futures::future::BoxFuture;
use tokio::sync::oneshot;
use wayfare_path::{PathParams, TemplateError};

use crate::error::{NavigationError, NavigationErrorKind};
use crate::guard::{GuardOutcome, NavigationGuard};
use crate::history::{
    HistoryAdapter, HistoryState, ListenerHandle, MemoryHistory, NavigationInfo, NavigationKind,
};
use crate::location::{
    decode_params, encode_params, is_same_route_location, leaving_records, merge_state,
    resolve_relative_path, stringify_url, LocationSpec, RawLocation, RouteLocation,
};
use crate::matcher::{MatchError, MatcherId, ResolveRequest, RouteTable};
use crate::record::{RouteDefinition, RouteRecord};

/// Router configuration
#[derive(Default)]
pub struct RouterOptions {
    pub routes: Vec<RouteDefinition>,
    /// Defaults to an in-process [`MemoryHistory`]
    pub history: Option<Arc<dyn HistoryAdapter>>,
    /// Path prefix stripped before matching
    pub base: String,
}

impl RouterOptions {
    pub fn new() -> Self {
        RouterOptions::default()
    }

    pub fn route(mut self, definition: RouteDefinition) -> Self {
        self.routes.push(definition);
        self
    }

    pub fn routes(mut self, definitions: Vec<RouteDefinition>) -> Self {
        self.routes.extend(definitions);
        self
    }

    pub fn history(mut self, history: Arc<dyn HistoryAdapter>) -> Self {
        self.history = Some(history);
        self
    }

    pub fn base(mut self, base: impl Into<String>) -> Self {
        self.base = base.into();
        self
    }
}

/// Outcome of [`Router::resolve`]: the location plus a rendered href
#[derive(Debug)]
pub struct Resolved {
    pub location: Arc<RouteLocation>,
    pub href: String,
}

type AfterHookFn =
    Arc<dyn Fn(&Arc<RouteLocation>, &Arc<RouteLocation>, Option<&NavigationError>) + Send + Sync>;
type ErrorHookFn = Arc<dyn Fn(&NavigationError) + Send + Sync>;

/// Unregisters a hook when consumed; dropping it leaves the hook in place
pub struct HookHandle {
    unregister: Option<Box<dyn FnOnce() + Send>>,
}

impl HookHandle {
    fn new(unregister: impl FnOnce() + Send + 'static) -> Self {
        HookHandle {
            unregister: Some(Box::new(unregister)),
        }
    }

    pub fn remove(mut self) {
        if let Some(unregister) = self.unregister.take() {
            unregister();
        }
    }
}

/// Removal handle for a dynamically added route subtree
pub struct RouteHandle {
    router: Weak<RouterInner>,
    id: MatcherId,
}

impl RouteHandle {
    /// Removes the route, its children, and its aliases
    pub fn remove(self) {
        if let Some(inner) = self.router.upgrade() {
            inner.table.write().unwrap().remove_node(self.id);
        }
    }
}

struct ReadyState {
    ready: bool,
    listener_started: bool,
    waiters: Vec<oneshot::Sender<Result<(), Arc<NavigationError>>>>,
}

struct RouterInner {
    table: RwLock<RouteTable>,
    history: Arc<dyn HistoryAdapter>,
    current: RwLock<Arc<RouteLocation>>,
    /// The pending token: identity of the most recently requested target
    pending: Mutex<Option<Arc<RouteLocation>>>,
    /// Whether any navigation has committed yet
    changed: AtomicBool,
    ready: Mutex<ReadyState>,
    before_hooks: RwLock<Vec<(u64, Arc<dyn NavigationGuard>)>>,
    after_hooks: RwLock<Vec<(u64, AfterHookFn)>>,
    error_hooks: RwLock<Vec<(u64, ErrorHookFn)>>,
    next_hook_id: AtomicU64,
    listener_guard: Mutex<Option<ListenerHandle>>,
}

/// The navigation core: route table + transition pipeline
///
/// Cheap to clone; clones share all state. There is no global active
/// router; pass a clone (or a reference) to whatever needs navigation
/// access.
#[derive(Clone)]
pub struct Router {
    inner: Arc<RouterInner>,
}

impl Router {
    pub fn new(options: RouterOptions) -> Result<Self, TemplateError> {
        let history = options
            .history
            .unwrap_or_else(|| Arc::new(MemoryHistory::new()));

        let table = RouteTable::with_routes(options.base, &options.routes)?;

        Ok(Router {
            inner: Arc::new(RouterInner {
                table: RwLock::new(table),
                history,
                current: RwLock::new(Arc::new(RouteLocation::start())),
                pending: Mutex::new(None),
                changed: AtomicBool::new(false),
                ready: Mutex::new(ReadyState {
                    ready: false,
                    listener_started: false,
                    waiters: Vec::new(),
                }),
                before_hooks: RwLock::new(Vec::new()),
                after_hooks: RwLock::new(Vec::new()),
                error_hooks: RwLock::new(Vec::new()),
                next_hook_id: AtomicU64::new(0),
                listener_guard: Mutex::new(None),
            }),
        })
    }

    /// Performs the initial navigation to the adapter's current location
    /// and wires up history events
    pub async fn start(&self) -> Result<(), NavigationError> {
        self.inner.history.start();
        let initial = self.inner.history.location();

        match self.push(RawLocation::from(initial.as_str())).await {
            Ok(()) => Ok(()),
            Err(err) => {
                tracing::warn!(location = %initial, %err, "initial navigation failed");
                Err(err)
            }
        }
    }

    /// The active (committed) location
    pub fn current(&self) -> Arc<RouteLocation> {
        Arc::clone(&self.inner.current.read().unwrap())
    }

    pub fn history(&self) -> &Arc<dyn HistoryAdapter> {
        &self.inner.history
    }

    /// All records of the ordered matcher list, most specific first
    pub fn routes(&self) -> Vec<Arc<RouteRecord>> {
        self.inner.table.read().unwrap().records()
    }

    pub fn has_route(&self, name: &str) -> bool {
        self.inner.table.read().unwrap().has_name(name)
    }

    /// Registers a route (optionally under a named parent); the returned
    /// handle removes the whole subtree again
    pub fn add_route(
        &self,
        definition: RouteDefinition,
        parent_name: Option<&str>,
    ) -> Result<RouteHandle, TemplateError> {
        let mut table = self.inner.table.write().unwrap();
        let parent = parent_name.and_then(|name| table.name_to_id(name));
        let id = table.add(&definition, parent)?;

        Ok(RouteHandle {
            router: Arc::downgrade(&self.inner),
            id,
        })
    }

    pub fn remove_route(&self, name: &str) {
        if !self.inner.table.write().unwrap().remove_by_name(name) {
            tracing::warn!(name, "removeRoute called for an unregistered route name");
        }
    }

    /// Resolves a request without navigating
    pub fn resolve(
        &self,
        raw: impl Into<RawLocation>,
        current_override: Option<Arc<RouteLocation>>,
    ) -> Result<Resolved, NavigationError> {
        let raw = raw.into();
        let location = self.resolve_raw(&raw, current_override)?;
        let href = self.inner.history.create_href(&location.full_path);
        Ok(Resolved { location, href })
    }

    /// Navigates to a target, pushing a history entry on commit
    pub async fn push(&self, to: impl Into<RawLocation>) -> Result<(), NavigationError> {
        self.push_with_redirect(to.into(), None).await
    }

    /// Navigates to a target, replacing the current history entry
    pub async fn replace(&self, to: impl Into<RawLocation>) -> Result<(), NavigationError> {
        let raw = to.into().replace(true);
        self.push_with_redirect(raw, None).await
    }

    /// Traverses history; the resulting event runs through the pipeline
    pub fn go(&self, delta: i64) {
        self.inner.history.go(delta, true);
    }

    pub fn back(&self) {
        self.go(-1);
    }

    pub fn forward(&self) {
        self.go(1);
    }

    /// Settles once the first navigation commits or fails
    pub async fn ready(&self) -> Result<(), Arc<NavigationError>> {
        let receiver = {
            let mut ready = self.inner.ready.lock().unwrap();
            if ready.ready && self.inner.changed.load(Ordering::SeqCst) {
                return Ok(());
            }
            let (sender, receiver) = oneshot::channel();
            ready.waiters.push(sender);
            receiver
        };

        receiver.await.unwrap_or(Ok(()))
    }

    /// Registers a global before-guard, run between leave and enter chains
    pub fn before_each(&self, guard: impl NavigationGuard + 'static) -> HookHandle {
        let id = self.inner.next_hook_id.fetch_add(1, Ordering::Relaxed);
        self.inner
            .before_hooks
            .write()
            .unwrap()
            .push((id, Arc::new(guard)));

        let weak = Arc::downgrade(&self.inner);
        HookHandle::new(move || {
            if let Some(inner) = weak.upgrade() {
                inner
                    .before_hooks
                    .write()
                    .unwrap()
                    .retain(|(hook_id, _)| *hook_id != id);
            }
        })
    }

    /// Registers an after-hook, run with `(to, from, failure?)` on every
    /// settled transition
    pub fn after_each(
        &self,
        hook: impl Fn(&Arc<RouteLocation>, &Arc<RouteLocation>, Option<&NavigationError>)
            + Send
            + Sync
            + 'static,
    ) -> HookHandle {
        let id = self.inner.next_hook_id.fetch_add(1, Ordering::Relaxed);
        self.inner
            .after_hooks
            .write()
            .unwrap()
            .push((id, Arc::new(hook)));

        let weak = Arc::downgrade(&self.inner);
        HookHandle::new(move || {
            if let Some(inner) = weak.upgrade() {
                inner
                    .after_hooks
                    .write()
                    .unwrap()
                    .retain(|(hook_id, _)| *hook_id != id);
            }
        })
    }

    /// Registers an error hook; `Cancelled` failures are never delivered
    pub fn on_error(&self, hook: impl Fn(&NavigationError) + Send + Sync + 'static) -> HookHandle {
        let id = self.inner.next_hook_id.fetch_add(1, Ordering::Relaxed);
        self.inner
            .error_hooks
            .write()
            .unwrap()
            .push((id, Arc::new(hook)));

        let weak = Arc::downgrade(&self.inner);
        HookHandle::new(move || {
            if let Some(inner) = weak.upgrade() {
                inner
                    .error_hooks
                    .write()
                    .unwrap()
                    .retain(|(hook_id, _)| *hook_id != id);
            }
        })
    }

    // ------------------------------------------------------------------
    // Resolution
    // ------------------------------------------------------------------

    fn resolve_raw(
        &self,
        raw: &RawLocation,
        current_override: Option<Arc<RouteLocation>>,
    ) -> Result<Arc<RouteLocation>, NavigationError> {
        let current = current_override.unwrap_or_else(|| self.current());

        // params travel percent-encoded through stringify/parse and come
        // back decoded on the resolved location
        let (request, resolve_current) = match &raw.spec {
            LocationSpec::Path(path) => (
                ResolveRequest {
                    spec: LocationSpec::Path(resolve_relative_path(path, &current.path)),
                    params: PathParams::new(),
                },
                Arc::clone(&current),
            ),
            spec => {
                let mut encoded_current = (*current).clone();
                encoded_current.params = encode_params(&encoded_current.params);
                (
                    ResolveRequest {
                        spec: spec.clone(),
                        params: encode_params(&raw.params),
                    },
                    Arc::new(encoded_current),
                )
            }
        };

        let matched = {
            let table = self.inner.table.read().unwrap();
            table.resolve(&request, &resolve_current)
        };

        let matched = match matched {
            Ok(matched) => matched,
            Err(MatchError::NameNotFound(name)) => {
                let err = NavigationError::MatcherNotFound {
                    target: format!("name {name:?}"),
                    from: current,
                };
                self.report_error(&err);
                return Err(err);
            }
            Err(MatchError::CurrentUnmatched(at)) => {
                let err = NavigationError::MatcherNotFound {
                    target: format!("the current location {at:?}"),
                    from: current,
                };
                self.report_error(&err);
                return Err(err);
            }
            Err(MatchError::Template(template)) => {
                return Err(NavigationError::Failure {
                    to: None,
                    from: current,
                    source: anyhow::Error::new(template),
                });
            }
        };

        if matched.matched.is_empty() {
            let err = NavigationError::MatcherNotFound {
                target: raw.describe(),
                from: current,
            };
            self.report_error(&err);
            return Err(err);
        }

        let params = decode_params(&matched.params);
        let full_path = stringify_url(&matched.path, &raw.query, &raw.hash);

        Ok(Arc::new(RouteLocation {
            name: matched.name,
            path: matched.path,
            full_path,
            params,
            query: raw.query.clone(),
            hash: raw.hash.clone(),
            meta: matched.meta,
            matched: matched.matched,
            redirected_from: None,
        }))
    }

    /// Redirect declared on the deepest matched record, normalized into a
    /// raw request that carries the target's query/hash/params forward
    fn redirect_target_of(&self, to: &Arc<RouteLocation>) -> Option<RawLocation> {
        let last = to.matched.last()?;
        let redirect = last.record.redirect.as_ref()?;

        let mut target = redirect.resolve(to);
        if target.query.is_empty() {
            target.query = to.query.clone();
        }
        if target.hash.is_empty() {
            target.hash = to.hash.clone();
        }
        if !matches!(target.spec, LocationSpec::Path(_)) && target.params.is_empty() {
            target.params = to.params.clone();
        }

        Some(target)
    }

    // ------------------------------------------------------------------
    // Pipeline
    // ------------------------------------------------------------------

    fn push_with_redirect(
        &self,
        to: RawLocation,
        redirected_from: Option<Arc<RouteLocation>>,
    ) -> BoxFuture<'static, Result<(), NavigationError>> {
        let router = self.clone();

        Box::pin(async move {
            let force = to.force;
            let replace = to.replace;
            let refresh = to.refresh;
            let state = to.state.clone();

            let resolved = router.resolve_raw(&to, None)?;

            let to_location = match &redirected_from {
                Some(source) => {
                    let mut location = (*resolved).clone();
                    location.redirected_from = Some(Arc::clone(source));
                    Arc::new(location)
                }
                None => resolved,
            };

            // the new pending token; any older in-flight transition is
            // now stale
            *router.inner.pending.lock().unwrap() = Some(Arc::clone(&to_location));

            let from = router.current();

            if let Some(redirect) = router.redirect_target_of(&to_location) {
                tracing::debug!(
                    from = %to_location.full_path,
                    target = %redirect,
                    "following record redirect"
                );
                let mut next = redirect.force(force).refresh(refresh).replace(replace);
                next.state = merge_state(state, next.state.take());
                return router
                    .push_with_redirect(
                        next,
                        Some(redirected_from.unwrap_or_else(|| Arc::clone(&to_location))),
                    )
                    .await;
            }

            if !force && is_same_route_location(&from, &to_location) {
                return Err(NavigationError::Same {
                    to: to_location,
                    from,
                });
            }

            // refresh drops cached view instances before renderers can
            // observe the commit
            if refresh {
                for entry in &to_location.matched {
                    for slot in entry.record.components.values() {
                        slot.clear_cache();
                    }
                }
            }

            let outcome = router.navigate(&to_location, &from).await;

            let mut failure: Option<NavigationError> = match outcome {
                Ok(None) => None,
                Ok(Some(cancelled)) => Some(cancelled),
                Err(err) => match err.kind() {
                    NavigationErrorKind::Redirect => Some(err),
                    NavigationErrorKind::Failure => {
                        router.report_error(&err);
                        Some(err)
                    }
                    _ => {
                        router.mark_ready(Some(&err));
                        Some(err)
                    }
                },
            };

            if failure.is_none() {
                failure =
                    router.finalize_navigation(&to_location, &from, true, replace, state.clone());
            }

            match failure {
                Some(NavigationError::Redirect { to: target, .. }) => {
                    let merged_state = merge_state(state, target.state.clone());
                    let next = RawLocation {
                        replace: target.replace || replace,
                        state: merged_state,
                        ..target
                    }
                    .force(force)
                    .refresh(refresh);

                    router
                        .push_with_redirect(next, Some(redirected_from.unwrap_or(to_location)))
                        .await
                }
                failure => {
                    router.trigger_after(&to_location, &from, failure.as_ref());

                    match failure {
                        None => Ok(()),
                        Some(err) => Err(err),
                    }
                }
            }
        })
    }

    /// Runs the three guard chains in order, with a staleness check after
    /// every asynchronous wait. `Ok(Some(_))` carries a cancellation,
    /// which is an outcome rather than a guard failure.
    async fn navigate(
        &self,
        to: &Arc<RouteLocation>,
        from: &Arc<RouteLocation>,
    ) -> Result<Option<NavigationError>, NavigationError> {
        let result = self.run_guard_chains(to, from).await;

        match result {
            Ok(()) => Ok(None),
            Err(err) if err.kind() == NavigationErrorKind::Cancelled => Ok(Some(err)),
            Err(err) => Err(err),
        }
    }

    async fn run_guard_chains(
        &self,
        to: &Arc<RouteLocation>,
        from: &Arc<RouteLocation>,
    ) -> Result<(), NavigationError> {
        // leave hooks of records dropping out of the chain, in chain order
        for entry in leaving_records(to, from) {
            for guard in &entry.record.before_leave {
                self.run_guard(guard, to, from).await?;
            }
        }
        self.check_cancelled(to, from)?;

        // global before hooks, in registration order
        let before: Vec<Arc<dyn NavigationGuard>> = self
            .inner
            .before_hooks
            .read()
            .unwrap()
            .iter()
            .map(|(_, guard)| Arc::clone(guard))
            .collect();
        for guard in &before {
            self.run_guard(guard, to, from).await?;
        }
        self.check_cancelled(to, from)?;

        // enter hooks of records joining the chain, in chain order
        for entry in &to.matched {
            if !from.matched.iter().any(|present| present.is(entry)) {
                for guard in &entry.record.before_enter {
                    self.run_guard(guard, to, from).await?;
                }
            }
        }
        self.check_cancelled(to, from)?;

        Ok(())
    }

    async fn run_guard(
        &self,
        guard: &Arc<dyn NavigationGuard>,
        to: &Arc<RouteLocation>,
        from: &Arc<RouteLocation>,
    ) -> Result<(), NavigationError> {
        match guard.check(Arc::clone(to), Arc::clone(from)).await {
            GuardOutcome::Proceed => self.check_cancelled(to, from),
            GuardOutcome::Deny => Err(NavigationError::Aborted {
                to: Arc::clone(to),
                from: Arc::clone(from),
            }),
            // the redirect's `from` is the target whose guard produced it
            GuardOutcome::Redirect(target) => Err(NavigationError::Redirect {
                to: target,
                from: Arc::clone(to),
            }),
            GuardOutcome::Failure(source) => Err(NavigationError::Failure {
                to: Some(Arc::clone(to)),
                from: Arc::clone(from),
                source,
            }),
        }
    }

    fn check_cancelled(
        &self,
        to: &Arc<RouteLocation>,
        from: &Arc<RouteLocation>,
    ) -> Result<(), NavigationError> {
        let pending = self.inner.pending.lock().unwrap();
        match pending.as_ref() {
            Some(token) if Arc::ptr_eq(token, to) => Ok(()),
            _ => Err(NavigationError::Cancelled {
                to: Arc::clone(to),
                from: Arc::clone(from),
            }),
        }
    }

    /// Commits the transition unless it went stale: writes history (for
    /// pushes), swaps the active location, and marks the router ready
    fn finalize_navigation(
        &self,
        to: &Arc<RouteLocation>,
        from: &Arc<RouteLocation>,
        is_push: bool,
        replace: bool,
        state: Option<HistoryState>,
    ) -> Option<NavigationError> {
        if let Err(err) = self.check_cancelled(to, from) {
            return Some(err);
        }

        let first_navigation = !self.inner.changed.load(Ordering::SeqCst);

        if is_push {
            if replace || first_navigation {
                // the first replace keeps any scroll the adapter already
                // recorded for its entry
                let carried_scroll = if first_navigation {
                    self.inner.history.state().and_then(|entry| entry.scroll)
                } else {
                    None
                };

                let data = match (carried_scroll, state) {
                    (Some(scroll), Some(mut data)) => {
                        if data.scroll.is_none() {
                            data.scroll = Some(scroll);
                        }
                        Some(data)
                    }
                    (Some(scroll), None) => Some(HistoryState {
                        scroll: Some(scroll),
                        ..HistoryState::default()
                    }),
                    (None, data) => data,
                };

                self.inner.history.replace(&to.full_path, data);
            } else {
                self.inner.history.push(&to.full_path, state);
            }
        }

        *self.inner.current.write().unwrap() = Arc::clone(to);
        self.inner.changed.store(true, Ordering::SeqCst);
        self.mark_ready(None);

        None
    }

    // ------------------------------------------------------------------
    // History events
    // ------------------------------------------------------------------

    fn install_listener(&self) {
        let weak = Arc::downgrade(&self.inner);

        let handle = self.inner.history.listen(Arc::new(move |to, _from, info| {
            let Some(inner) = weak.upgrade() else { return };
            let router = Router { inner };
            let to = to.to_string();

            match tokio::runtime::Handle::try_current() {
                Ok(runtime) => {
                    runtime.spawn(async move {
                        router.handle_history_event(to, info).await;
                    });
                }
                Err(_) => {
                    tracing::warn!(
                        to,
                        "dropping history event: no tokio runtime on the notifying thread"
                    );
                }
            }
        }));

        *self.inner.listener_guard.lock().unwrap() = Some(handle);
    }

    /// A traversal event is an inbound navigation request: it runs the
    /// same pipeline, then compensates the stack when the transition did
    /// not commit
    async fn handle_history_event(&self, to_path: String, info: NavigationInfo) {
        let raw = RawLocation::from(to_path.as_str());

        let Ok(to_location) = self.resolve_raw(&raw, None) else {
            // resolution failures were already reported through the hooks
            return;
        };

        if let Some(redirect) = self.redirect_target_of(&to_location) {
            let _ = self
                .push_with_redirect(redirect.replace(true), Some(to_location))
                .await;
            return;
        }

        *self.inner.pending.lock().unwrap() = Some(Arc::clone(&to_location));
        let from = self.current();

        let outcome = self.navigate(&to_location, &from).await;

        let mut failure: Option<NavigationError> = match outcome {
            Ok(None) => None,
            Ok(Some(cancelled)) => Some(cancelled),
            Err(NavigationError::Redirect { to: target, .. }) => {
                let result = self
                    .push_with_redirect(target.replace(true), Some(Arc::clone(&to_location)))
                    .await;

                if let Err(err) = result {
                    if matches!(
                        err.kind(),
                        NavigationErrorKind::Aborted | NavigationErrorKind::Same
                    ) && info.delta == 0
                        && info.kind == NavigationKind::Pop
                    {
                        self.inner.history.go(-1, false);
                    }
                }
                return;
            }
            Err(err) if err.kind() == NavigationErrorKind::Aborted => Some(err),
            Err(err) => {
                if info.delta != 0 {
                    self.inner.history.go(-info.delta, false);
                }
                self.report_error(&err);
                return;
            }
        };

        if failure.is_none() {
            failure = self.finalize_navigation(&to_location, &from, false, false, None);
        }

        if let Some(err) = &failure {
            if info.delta != 0 && err.kind() != NavigationErrorKind::Cancelled {
                // undo the traversal the failed navigation came from
                self.inner.history.go(-info.delta, false);
            } else if info.kind == NavigationKind::Pop
                && matches!(
                    err.kind(),
                    NavigationErrorKind::Aborted | NavigationErrorKind::Same
                )
            {
                self.inner.history.go(-1, false);
            }
        }

        self.trigger_after(&to_location, &from, failure.as_ref());
    }

    // ------------------------------------------------------------------
    // Ready state & hooks
    // ------------------------------------------------------------------

    fn mark_ready(&self, err: Option<&NavigationError>) {
        let (waiters, start_listener) = {
            let mut ready = self.inner.ready.lock().unwrap();
            if ready.ready {
                return;
            }
            ready.ready = err.is_none();
            let start = !ready.listener_started;
            ready.listener_started = true;
            (std::mem::take(&mut ready.waiters), start)
        };

        if start_listener {
            self.install_listener();
        }

        let shared = err.map(NavigationError::to_shared);
        for waiter in waiters {
            let _ = waiter.send(match &shared {
                Some(err) => Err(Arc::clone(err)),
                None => Ok(()),
            });
        }
    }

    fn report_error(&self, err: &NavigationError) {
        self.mark_ready(Some(err));

        let hooks: Vec<ErrorHookFn> = self
            .inner
            .error_hooks
            .read()
            .unwrap()
            .iter()
            .map(|(_, hook)| Arc::clone(hook))
            .collect();

        if hooks.is_empty() {
            // MATCHER_NOT_FOUND stays loud through the returned error;
            // everything else is only worth a warning here
            if err.kind() != NavigationErrorKind::MatcherNotFound {
                tracing::warn!(%err, "navigation failed with no error hook registered");
            }
        } else {
            for hook in hooks {
                hook(err);
            }
        }
    }

    fn trigger_after(
        &self,
        to: &Arc<RouteLocation>,
        from: &Arc<RouteLocation>,
        failure: Option<&NavigationError>,
    ) {
        let hooks: Vec<AfterHookFn> = self
            .inner
            .after_hooks
            .read()
            .unwrap()
            .iter()
            .map(|(_, hook)| Arc::clone(hook))
            .collect();

        for hook in hooks {
            hook(to, from, failure);
        }
    }
}
