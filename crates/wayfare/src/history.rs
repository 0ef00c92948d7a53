//! History adapter boundary
//!
//! The pipeline consumes a [`HistoryAdapter`]: it reads the current
//! location, writes committed navigations with `push`/`replace`, and
//! treats listener events as inbound navigation requests. Adapters absorb
//! their own write failures (a browser-backed adapter falls back to a
//! full document navigation; the in-memory adapter cannot fail).
//!
//! [`MemoryHistory`] keeps the whole entry stack in process and is the
//! default adapter for tests and non-browser hosts.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

/// How a history event reached the router
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NavigationKind {
    /// Stack traversal (back/forward)
    Pop,
    /// A new entry was appended
    Push,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NavigationDirection {
    Back,
    Forward,
    Unknown,
}

/// Event payload handed to history listeners
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NavigationInfo {
    pub kind: NavigationKind,
    pub direction: NavigationDirection,
    /// Stack offset between the two entries; 0 when unknown
    pub delta: i64,
}

/// Scroll offsets carried opaquely through history state
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
pub struct ScrollPosition {
    pub left: f64,
    pub top: f64,
}

/// State payload attached to every history entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct HistoryState {
    /// Path of the previous entry, when one exists
    pub back: Option<String>,
    /// Path of this entry
    pub current: String,
    /// Path of the next entry, when known
    pub forward: Option<String>,
    /// Monotonic stack index, used to compute traversal deltas
    pub position: usize,
    /// Whether this entry replaced its predecessor
    pub replaced: bool,
    /// Saved scroll offsets; capture and restore happen outside the router
    pub scroll: Option<ScrollPosition>,
    /// Caller-supplied payload, flattened alongside the layout fields
    #[serde(flatten)]
    pub extra: HashMap<String, JsonValue>,
}

impl HistoryState {
    fn fresh(back: Option<String>, current: String, position: usize, replaced: bool) -> Self {
        HistoryState {
            back,
            current,
            forward: None,
            position,
            replaced,
            scroll: None,
            extra: HashMap::new(),
        }
    }

    fn absorb(&mut self, data: Option<HistoryState>) {
        if let Some(data) = data {
            if data.scroll.is_some() {
                self.scroll = data.scroll;
            }
            self.extra.extend(data.extra);
        }
    }
}

/// Listener invoked with `(to, from, info)` for every traversal event
pub type HistoryListener = Arc<dyn Fn(&str, &str, NavigationInfo) + Send + Sync>;

/// Unsubscribe handle returned by [`HistoryAdapter::listen`]
pub struct ListenerHandle(Option<Box<dyn FnOnce() + Send>>);

impl ListenerHandle {
    pub fn new(unlisten: impl FnOnce() + Send + 'static) -> Self {
        ListenerHandle(Some(Box::new(unlisten)))
    }

    pub fn unlisten(mut self) {
        if let Some(unlisten) = self.0.take() {
            unlisten();
        }
    }
}

/// The history collaborator consumed by the navigation pipeline
pub trait HistoryAdapter: Send + Sync {
    /// Path (plus query/hash) of the current entry
    fn location(&self) -> String;

    /// State payload of the current entry
    fn state(&self) -> Option<HistoryState>;

    /// Prepares the adapter (first-entry state, event wiring)
    fn start(&self);

    /// Appends an entry for a committed navigation
    fn push(&self, to: &str, state: Option<HistoryState>);

    /// Replaces the current entry
    fn replace(&self, to: &str, state: Option<HistoryState>);

    /// Traverses the stack; listeners fire only when `notify` is set
    fn go(&self, delta: i64, notify: bool);

    fn listen(&self, listener: HistoryListener) -> ListenerHandle;

    /// Renders a path into a link target for the host environment
    fn create_href(&self, location: &str) -> String;

    fn destroy(&self);
}

struct MemoryEntry {
    path: String,
    state: HistoryState,
}

struct MemoryStack {
    entries: Vec<MemoryEntry>,
    position: usize,
}

/// In-process history stack
pub struct MemoryHistory {
    base: String,
    stack: Arc<Mutex<MemoryStack>>,
    listeners: Arc<Mutex<Vec<(u64, HistoryListener)>>>,
    next_listener: AtomicU64,
}

impl MemoryHistory {
    pub fn new() -> Self {
        MemoryHistory::with_base("")
    }

    pub fn with_base(base: impl Into<String>) -> Self {
        let first = MemoryEntry {
            path: "/".to_string(),
            state: HistoryState::fresh(None, "/".to_string(), 0, true),
        };

        MemoryHistory {
            base: base.into(),
            stack: Arc::new(Mutex::new(MemoryStack {
                entries: vec![first],
                position: 0,
            })),
            listeners: Arc::new(Mutex::new(Vec::new())),
            next_listener: AtomicU64::new(0),
        }
    }

    /// Number of entries currently on the stack
    pub fn len(&self) -> usize {
        self.stack.lock().unwrap().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn notify(&self, to: &str, from: &str, info: NavigationInfo) {
        let listeners: Vec<HistoryListener> = self
            .listeners
            .lock()
            .unwrap()
            .iter()
            .map(|(_, listener)| listener.clone())
            .collect();

        for listener in listeners {
            listener(to, from, info);
        }
    }
}

impl Default for MemoryHistory {
    fn default() -> Self {
        MemoryHistory::new()
    }
}

impl HistoryAdapter for MemoryHistory {
    fn location(&self) -> String {
        let stack = self.stack.lock().unwrap();
        stack.entries[stack.position].path.clone()
    }

    fn state(&self) -> Option<HistoryState> {
        let stack = self.stack.lock().unwrap();
        Some(stack.entries[stack.position].state.clone())
    }

    fn start(&self) {}

    fn push(&self, to: &str, state: Option<HistoryState>) {
        let mut stack = self.stack.lock().unwrap();
        let position = stack.position;

        // pushing discards any forward entries
        stack.entries.truncate(position + 1);

        let current_path = stack.entries[position].path.clone();
        stack.entries[position].state.forward = Some(to.to_string());

        let mut new_state =
            HistoryState::fresh(Some(current_path), to.to_string(), position + 1, false);
        new_state.absorb(state);

        stack.entries.push(MemoryEntry {
            path: to.to_string(),
            state: new_state,
        });
        stack.position += 1;
    }

    fn replace(&self, to: &str, state: Option<HistoryState>) {
        let mut stack = self.stack.lock().unwrap();
        let position = stack.position;
        let entry = &mut stack.entries[position];

        let mut new_state = HistoryState::fresh(
            entry.state.back.clone(),
            to.to_string(),
            entry.state.position,
            true,
        );
        new_state.forward = entry.state.forward.clone();
        new_state.absorb(state);

        entry.path = to.to_string();
        entry.state = new_state;
    }

    fn go(&self, delta: i64, notify: bool) {
        let (to, from, actual_delta) = {
            let mut stack = self.stack.lock().unwrap();
            let last = stack.entries.len() as i64 - 1;
            let target = (stack.position as i64 + delta).clamp(0, last);
            let actual_delta = target - stack.position as i64;

            if actual_delta == 0 {
                return;
            }

            let from = stack.entries[stack.position].path.clone();
            stack.position = target as usize;
            let to = stack.entries[stack.position].path.clone();
            (to, from, actual_delta)
        };

        if notify {
            let direction = if actual_delta > 0 {
                NavigationDirection::Forward
            } else {
                NavigationDirection::Back
            };

            self.notify(
                &to,
                &from,
                NavigationInfo {
                    kind: NavigationKind::Pop,
                    direction,
                    delta: actual_delta,
                },
            );
        }
    }

    fn listen(&self, listener: HistoryListener) -> ListenerHandle {
        let id = self.next_listener.fetch_add(1, Ordering::Relaxed);
        self.listeners.lock().unwrap().push((id, listener));

        let listeners = Arc::clone(&self.listeners);
        ListenerHandle::new(move || {
            listeners
                .lock()
                .unwrap()
                .retain(|(entry_id, _)| *entry_id != id);
        })
    }

    fn create_href(&self, location: &str) -> String {
        format!("{}{location}", self.base)
    }

    fn destroy(&self) {
        self.listeners.lock().unwrap().clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_push_threads_state_layout() {
        let history = MemoryHistory::new();
        history.push("/a", None);
        history.push("/b", None);

        let state = history.state().unwrap();
        assert_eq!(state.current, "/b");
        assert_eq!(state.back.as_deref(), Some("/a"));
        assert_eq!(state.forward, None);
        assert_eq!(state.position, 2);
        assert!(!state.replaced);

        history.go(-1, false);
        let state = history.state().unwrap();
        assert_eq!(state.current, "/a");
        assert_eq!(state.forward.as_deref(), Some("/b"));
        assert_eq!(state.position, 1);
    }

    #[test]
    fn test_replace_keeps_position() {
        let history = MemoryHistory::new();
        history.push("/a", None);
        history.replace("/a2", None);

        let state = history.state().unwrap();
        assert_eq!(state.current, "/a2");
        assert_eq!(state.position, 1);
        assert!(state.replaced);
        assert_eq!(history.len(), 2);
    }

    #[test]
    fn test_push_truncates_forward_entries() {
        let history = MemoryHistory::new();
        history.push("/a", None);
        history.push("/b", None);
        history.go(-1, false);
        history.push("/c", None);

        assert_eq!(history.len(), 3);
        assert_eq!(history.location(), "/c");
        let state = history.state().unwrap();
        assert_eq!(state.back.as_deref(), Some("/a"));
    }

    #[test]
    fn test_go_clamps_and_notifies() {
        let history = MemoryHistory::new();
        history.push("/a", None);

        let events: Arc<Mutex<Vec<(String, String, i64)>>> = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&events);
        let handle = history.listen(Arc::new(move |to, from, info| {
            sink.lock()
                .unwrap()
                .push((to.to_string(), from.to_string(), info.delta));
        }));

        history.go(-5, true); // clamps to the first entry
        history.go(1, true);
        history.go(1, true); // already at the top, no event

        let seen = events.lock().unwrap().clone();
        assert_eq!(
            seen,
            vec![
                ("/".to_string(), "/a".to_string(), -1),
                ("/a".to_string(), "/".to_string(), 1),
            ]
        );

        handle.unlisten();
        history.go(-1, true);
        assert_eq!(events.lock().unwrap().len(), 2);
    }

    #[test]
    fn test_state_serde_round_trip() {
        let mut state = HistoryState::fresh(Some("/a".into()), "/b".into(), 3, false);
        state.scroll = Some(ScrollPosition { left: 0.0, top: 120.0 });
        state
            .extra
            .insert("draft".to_string(), JsonValue::from("saved"));

        let json = serde_json::to_string(&state).unwrap();
        let parsed: HistoryState = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, state);
        // caller payload flattens next to the layout fields
        assert!(json.contains("\"draft\":\"saved\""));
    }
}
