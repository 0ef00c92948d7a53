//! # Wayfare
//!
//! Location resolution and navigation sequencing:
//!
//! - a **route table** of specificity-ranked matchers built from
//!   declarative [`RouteDefinition`]s: nested children, aliases, named
//!   routes, redirects, metadata, per-slot components
//! - a **resolver** answering by-path, by-name, and relative requests
//!   with a root-to-leaf matched chain and merged metadata
//! - a **navigation pipeline** that runs cancellable leave/global/enter
//!   guard chains, follows redirects, detects stale transitions through a
//!   single pending token, and commits the winner to a pluggable
//!   [`HistoryAdapter`]
//!
//! Path matching itself lives in the `wayfare-path` crate and is
//! re-exported here.
//!
//! ## Example
//!
//! ```
//! use wayfare::{Router, RouterOptions, RouteDefinition};
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! let router = Router::new(
//!     RouterOptions::new()
//!         .route(RouteDefinition::path("/").name("home").component("home.rsx"))
//!         .route(RouteDefinition::path("/users/:id").name("user").component("user.rsx")),
//! )
//! .unwrap();
//!
//! router.push("/users/7").await.unwrap();
//! assert_eq!(router.current().path, "/users/7");
//! # }
//! ```

mod error;
mod guard;
mod history;
mod location;
mod matcher;
mod record;
mod router;
mod view;

pub use error::{NavigationError, NavigationErrorKind};
pub use guard::{GuardOutcome, NavigationGuard};
pub use history::{
    HistoryAdapter, HistoryListener, HistoryState, ListenerHandle, MemoryHistory,
    NavigationDirection, NavigationInfo, NavigationKind, ScrollPosition,
};
pub use location::{
    is_same_route_location, params_equal, parse_query, stringify_query, LocationSpec,
    MatchedRecord, Query, RawLocation, RouteLocation,
};
pub use matcher::{MatchError, MatchedLocation, MatcherId, ResolveRequest, RouteTable};
pub use record::{
    KeepAlive, PropsSource, RedirectTarget, RouteDefinition, RouteMeta, RouteRecord,
};
pub use router::{HookHandle, Resolved, RouteHandle, Router, RouterOptions};
pub use view::{view_target, view_targets, ComponentRef, ViewInstance, ViewSlot, ViewTarget};

pub use wayfare_path::{ParamValue, PathParams, PathPattern, TemplateError};
