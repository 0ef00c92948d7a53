//! Route records
//!
//! [`RouteDefinition`] is the declarative, builder-style input; the table
//! normalizes each definition into a [`RouteRecord`] per registered node
//! (one for the primary path, one per alias, each with its own compiled
//! pattern but shared view slots).

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use serde_json::Value as JsonValue;

use crate::guard::NavigationGuard;
use crate::location::{RawLocation, RouteLocation};
use crate::view::{ComponentRef, ViewSlot};

/// Arbitrary per-record metadata (titles, permissions, cache settings)
pub type RouteMeta = HashMap<String, JsonValue>;

/// Whether a view-unit instance survives deactivation of its route
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum KeepAlive {
    /// Recreate on every activation
    #[default]
    Never,
    /// Retain indefinitely (drop explicitly with a refresh navigation)
    Always,
    /// Retain until the next activation, then drop
    Once,
}

/// Redirect declared on a record: a literal location or a function of the
/// resolved target
#[derive(Clone)]
pub enum RedirectTarget {
    Location(RawLocation),
    Compute(Arc<dyn Fn(&RouteLocation) -> RawLocation + Send + Sync>),
}

impl RedirectTarget {
    pub(crate) fn resolve(&self, to: &RouteLocation) -> RawLocation {
        match self {
            RedirectTarget::Location(location) => location.clone(),
            RedirectTarget::Compute(compute) => compute(to),
        }
    }
}

impl fmt::Debug for RedirectTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RedirectTarget::Location(location) => write!(f, "Redirect({location})"),
            RedirectTarget::Compute(_) => f.write_str("Redirect(<computed>)"),
        }
    }
}

impl From<&str> for RedirectTarget {
    fn from(path: &str) -> Self {
        RedirectTarget::Location(RawLocation::from(path))
    }
}

impl From<RawLocation> for RedirectTarget {
    fn from(location: RawLocation) -> Self {
        RedirectTarget::Location(location)
    }
}

/// Per-slot props: a static map, or derived from the resolved location
#[derive(Clone)]
pub enum PropsSource {
    Static(HashMap<String, JsonValue>),
    Derive(Arc<dyn Fn(&RouteLocation) -> HashMap<String, JsonValue> + Send + Sync>),
}

impl PropsSource {
    pub fn resolve(&self, location: &RouteLocation) -> HashMap<String, JsonValue> {
        match self {
            PropsSource::Static(map) => map.clone(),
            PropsSource::Derive(derive) => derive(location),
        }
    }
}

impl fmt::Debug for PropsSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PropsSource::Static(map) => write!(f, "Props({} static)", map.len()),
            PropsSource::Derive(_) => f.write_str("Props(<derived>)"),
        }
    }
}

/// Declarative route definition with an immutable builder API
///
/// ```
/// use wayfare::RouteDefinition;
///
/// let users = RouteDefinition::path("/users")
///     .name("users")
///     .component("pages/users.rsx")
///     .child(RouteDefinition::path(":id").name("user").component("pages/user.rsx"));
/// ```
#[derive(Clone, Default)]
pub struct RouteDefinition {
    pub path: String,
    pub name: Option<String>,
    pub redirect: Option<RedirectTarget>,
    pub alias: Vec<String>,
    pub meta: RouteMeta,
    pub keepalive: KeepAlive,
    pub children: Vec<RouteDefinition>,
    pub(crate) components: HashMap<String, ComponentRef>,
    pub(crate) props: HashMap<String, PropsSource>,
    pub(crate) before_enter: Vec<Arc<dyn NavigationGuard>>,
    pub(crate) before_leave: Vec<Arc<dyn NavigationGuard>>,
}

impl RouteDefinition {
    pub fn path(path: impl Into<String>) -> Self {
        RouteDefinition {
            path: path.into(),
            ..RouteDefinition::default()
        }
    }

    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn redirect(mut self, target: impl Into<RedirectTarget>) -> Self {
        self.redirect = Some(target.into());
        self
    }

    /// Redirect computed from the resolved target location
    pub fn redirect_with(
        mut self,
        compute: impl Fn(&RouteLocation) -> RawLocation + Send + Sync + 'static,
    ) -> Self {
        self.redirect = Some(RedirectTarget::Compute(Arc::new(compute)));
        self
    }

    /// Adds an alternative path template mapping to the same record
    pub fn alias(mut self, path: impl Into<String>) -> Self {
        self.alias.push(path.into());
        self
    }

    pub fn meta(mut self, key: impl Into<String>, value: impl Into<JsonValue>) -> Self {
        self.meta.insert(key.into(), value.into());
        self
    }

    pub fn keepalive(mut self, policy: KeepAlive) -> Self {
        self.keepalive = policy;
        self
    }

    pub fn child(mut self, child: RouteDefinition) -> Self {
        self.children.push(child);
        self
    }

    /// Component for the `default` view slot
    pub fn component(self, component: impl Into<ComponentRef>) -> Self {
        self.named_component("default", component)
    }

    /// Component for a named view slot
    pub fn named_component(
        mut self,
        slot: impl Into<String>,
        component: impl Into<ComponentRef>,
    ) -> Self {
        self.components.insert(slot.into(), component.into());
        self
    }

    /// Static props for the `default` slot
    pub fn props(mut self, props: HashMap<String, JsonValue>) -> Self {
        self.props
            .insert("default".to_string(), PropsSource::Static(props));
        self
    }

    /// Props for a named slot, static or derived
    pub fn slot_props(mut self, slot: impl Into<String>, source: PropsSource) -> Self {
        self.props.insert(slot.into(), source);
        self
    }

    /// Props derived from the resolved location, for the `default` slot
    pub fn derived_props(
        mut self,
        derive: impl Fn(&RouteLocation) -> HashMap<String, JsonValue> + Send + Sync + 'static,
    ) -> Self {
        self.props
            .insert("default".to_string(), PropsSource::Derive(Arc::new(derive)));
        self
    }

    pub fn before_enter(mut self, guard: impl NavigationGuard + 'static) -> Self {
        self.before_enter.push(Arc::new(guard));
        self
    }

    pub fn before_leave(mut self, guard: impl NavigationGuard + 'static) -> Self {
        self.before_leave.push(Arc::new(guard));
        self
    }

    /// Builds the slot map shared by a record and its alias nodes
    pub(crate) fn build_slots(&self) -> Arc<HashMap<String, ViewSlot>> {
        Arc::new(
            self.components
                .iter()
                .map(|(slot, component)| (slot.clone(), ViewSlot::new(component.clone())))
                .collect(),
        )
    }
}

impl fmt::Debug for RouteDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RouteDefinition")
            .field("path", &self.path)
            .field("name", &self.name)
            .field("alias", &self.alias)
            .field("children", &self.children.len())
            .finish()
    }
}

/// Normalized record held by matcher nodes and matched chains
pub struct RouteRecord {
    /// Full template path (parent-joined for nested records)
    pub path: String,
    pub name: Option<String>,
    pub redirect: Option<RedirectTarget>,
    pub meta: RouteMeta,
    pub keepalive: KeepAlive,
    /// View slots; alias nodes share the primary node's map so cached
    /// instances survive across path aliases
    pub components: Arc<HashMap<String, ViewSlot>>,
    pub props: HashMap<String, PropsSource>,
    pub(crate) before_enter: Vec<Arc<dyn NavigationGuard>>,
    pub(crate) before_leave: Vec<Arc<dyn NavigationGuard>>,
}

impl RouteRecord {
    pub(crate) fn normalize(
        definition: &RouteDefinition,
        full_path: String,
        components: Arc<HashMap<String, ViewSlot>>,
    ) -> Self {
        RouteRecord {
            path: full_path,
            name: definition.name.clone(),
            redirect: definition.redirect.clone(),
            meta: definition.meta.clone(),
            keepalive: definition.keepalive,
            components,
            props: definition.props.clone(),
            before_enter: definition.before_enter.clone(),
            before_leave: definition.before_leave.clone(),
        }
    }

    pub fn has_components(&self) -> bool {
        !self.components.is_empty()
    }
}

impl fmt::Debug for RouteRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RouteRecord")
            .field("path", &self.path)
            .field("name", &self.name)
            .field("keepalive", &self.keepalive)
            .field("redirect", &self.redirect)
            .finish()
    }
}
