//! View renderer boundary
//!
//! The pipeline does not instantiate view units; it only tells a renderer
//! *what* to mount where, and keeps (or drops) cached instances according
//! to each record's keepalive policy. [`ComponentRef`] is an opaque
//! descriptor the renderer understands; [`ViewSlot`] is the per-slot cache
//! cell the renderer checks instances in and out of.

use std::any::Any;
use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Mutex};

use serde_json::Value as JsonValue;

use crate::location::RouteLocation;
use crate::record::{KeepAlive, RouteRecord};

/// Opaque component descriptor
///
/// Renderers decide what lives inside: a template path, a factory, a
/// type tag. `From<&str>` covers the common template-path case.
#[derive(Clone)]
pub struct ComponentRef(Arc<dyn Any + Send + Sync>);

impl ComponentRef {
    pub fn new<T: Any + Send + Sync>(component: T) -> Self {
        ComponentRef(Arc::new(component))
    }

    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.0.downcast_ref()
    }
}

impl From<&str> for ComponentRef {
    fn from(template_path: &str) -> Self {
        ComponentRef::new(template_path.to_string())
    }
}

impl From<String> for ComponentRef {
    fn from(template_path: String) -> Self {
        ComponentRef::new(template_path)
    }
}

impl fmt::Debug for ComponentRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.downcast_ref::<String>() {
            Some(path) => write!(f, "ComponentRef({path:?})"),
            None => f.write_str("ComponentRef(..)"),
        }
    }
}

/// A view unit instance stowed by the renderer between activations
pub type ViewInstance = Box<dyn Any + Send + Sync>;

#[derive(Default)]
struct ViewCache {
    instance: Option<ViewInstance>,
    wake_count: u32,
}

/// One named view slot of a record: the component descriptor plus the
/// cached-instance cell guarded by the keepalive policy
pub struct ViewSlot {
    component: ComponentRef,
    cache: Mutex<ViewCache>,
}

impl ViewSlot {
    pub(crate) fn new(component: ComponentRef) -> Self {
        ViewSlot {
            component,
            cache: Mutex::new(ViewCache::default()),
        }
    }

    pub fn component(&self) -> &ComponentRef {
        &self.component
    }

    /// Checks the cached instance out for reactivation, counting the wake
    pub fn take_instance(&self) -> Option<ViewInstance> {
        let mut cache = self.cache.lock().unwrap();
        let instance = cache.instance.take();
        if instance.is_some() {
            cache.wake_count += 1;
        }
        instance
    }

    /// Stows an instance after activation, honoring the keepalive policy:
    /// `Never` drops it, `Always` retains it, `Once` retains it until the
    /// next activation and then drops it
    pub fn store_instance(&self, instance: ViewInstance, keepalive: KeepAlive) {
        let mut cache = self.cache.lock().unwrap();
        match keepalive {
            KeepAlive::Never => {
                cache.wake_count = 0;
            }
            KeepAlive::Always => {
                cache.instance = Some(instance);
            }
            KeepAlive::Once => {
                if cache.wake_count >= 1 {
                    cache.instance = None;
                    cache.wake_count = 0;
                } else {
                    cache.instance = Some(instance);
                }
            }
        }
    }

    /// Drops any cached instance; refresh navigations call this before
    /// the commit is observed by renderers
    pub fn clear_cache(&self) {
        let mut cache = self.cache.lock().unwrap();
        cache.instance = None;
        cache.wake_count = 0;
    }

    pub fn has_cached(&self) -> bool {
        self.cache.lock().unwrap().instance.is_some()
    }
}

impl fmt::Debug for ViewSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ViewSlot")
            .field("component", &self.component)
            .field("cached", &self.has_cached())
            .finish()
    }
}

/// What a renderer mounts for one chain depth and slot name
pub struct ViewTarget<'a> {
    /// Position in the matched chain, root = 0
    pub depth: usize,
    pub is_leaf: bool,
    pub slot: &'a str,
    pub record: &'a Arc<RouteRecord>,
    pub view: &'a ViewSlot,
    /// Props resolved against the location (static map or derived)
    pub props: HashMap<String, JsonValue>,
    pub keepalive: KeepAlive,
}

/// Resolves one slot at one depth of the matched chain
pub fn view_target<'a>(
    location: &'a RouteLocation,
    depth: usize,
    slot: &str,
) -> Option<ViewTarget<'a>> {
    let entry = location.matched.get(depth)?;
    let record = &entry.record;
    let (slot_name, view) = record.components.get_key_value(slot)?;

    let props = record
        .props
        .get(slot_name)
        .map(|source| source.resolve(location))
        .unwrap_or_default();

    Some(ViewTarget {
        depth,
        is_leaf: depth + 1 == location.matched.len(),
        slot: slot_name,
        record,
        view,
        props,
        keepalive: record.keepalive,
    })
}

/// All slots of every matched record, root to leaf
pub fn view_targets(location: &RouteLocation) -> Vec<ViewTarget<'_>> {
    let mut targets = Vec::new();

    for (depth, entry) in location.matched.iter().enumerate() {
        let mut slots: Vec<&String> = entry.record.components.keys().collect();
        slots.sort();

        for slot in slots {
            if let Some(target) = view_target(location, depth, slot) {
                targets.push(target);
            }
        }
    }

    targets
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_component_ref_downcast() {
        let component = ComponentRef::from("pages/users.rsx");
        assert_eq!(
            component.downcast_ref::<String>().map(String::as_str),
            Some("pages/users.rsx")
        );
        assert!(component.downcast_ref::<u32>().is_none());
    }

    #[test]
    fn test_keepalive_always_retains() {
        let slot = ViewSlot::new(ComponentRef::from("a"));
        assert!(slot.take_instance().is_none());

        slot.store_instance(Box::new(1u32), KeepAlive::Always);
        assert!(slot.has_cached());
        assert!(slot.take_instance().is_some());
        slot.store_instance(Box::new(2u32), KeepAlive::Always);
        assert!(slot.has_cached());
    }

    #[test]
    fn test_keepalive_never_drops() {
        let slot = ViewSlot::new(ComponentRef::from("a"));
        slot.store_instance(Box::new(1u32), KeepAlive::Never);
        assert!(!slot.has_cached());
    }

    #[test]
    fn test_keepalive_once_survives_one_reactivation() {
        let slot = ViewSlot::new(ComponentRef::from("a"));

        // first activation: fresh instance, retained
        slot.store_instance(Box::new(1u32), KeepAlive::Once);
        assert!(slot.has_cached());

        // second activation: woken once, dropped afterwards
        assert!(slot.take_instance().is_some());
        slot.store_instance(Box::new(1u32), KeepAlive::Once);
        assert!(!slot.has_cached());

        // the cycle restarts cleanly
        slot.store_instance(Box::new(2u32), KeepAlive::Once);
        assert!(slot.has_cached());
    }

    #[test]
    fn test_clear_cache() {
        let slot = ViewSlot::new(ComponentRef::from("a"));
        slot.store_instance(Box::new(1u32), KeepAlive::Always);
        slot.clear_cache();
        assert!(!slot.has_cached());
    }
}
