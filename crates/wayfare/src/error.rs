//! Navigation error taxonomy
//!
//! Every failed transition resolves to one of these kinds. `Redirect` is
//! internal; the pipeline consumes it to re-enter itself and it never
//! escapes `push`/`replace`. `Cancelled` is never delivered to error
//! hooks; it only reports that a newer navigation superseded this one.

use std::sync::Arc;

use thiserror::Error;

use crate::location::{RawLocation, RouteLocation};

/// Discriminant of a [`NavigationError`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NavigationErrorKind {
    /// No pattern accepted the path, or the name is unregistered
    MatcherNotFound,
    /// A record redirect or guard redirect fired (internal)
    Redirect,
    /// A guard explicitly denied the transition
    Aborted,
    /// A newer navigation superseded this one
    Cancelled,
    /// The target equals the current location and the caller did not force
    Same,
    /// A guard (or the resolution step) raised an arbitrary error
    Failure,
}

/// Failure outcome of a navigation
#[derive(Debug, Error)]
pub enum NavigationError {
    #[error("no route record matched {target} when navigating from {}", from.full_path)]
    MatcherNotFound {
        /// Description of the requested target
        target: String,
        from: Arc<RouteLocation>,
    },

    /// Internal pipeline re-entry signal; `from` is the location whose
    /// record or guard produced the redirect
    #[error("route redirected away from {}", from.full_path)]
    Redirect {
        to: RawLocation,
        from: Arc<RouteLocation>,
    },

    #[error("navigation from {} to {} was aborted by a guard", from.full_path, to.full_path)]
    Aborted {
        to: Arc<RouteLocation>,
        from: Arc<RouteLocation>,
    },

    #[error("navigation from {} to {} was cancelled by a newer navigation", from.full_path, to.full_path)]
    Cancelled {
        to: Arc<RouteLocation>,
        from: Arc<RouteLocation>,
    },

    #[error("navigation target {} equals the current location", to.full_path)]
    Same {
        to: Arc<RouteLocation>,
        from: Arc<RouteLocation>,
    },

    #[error("navigation from {} failed: {source}", from.full_path)]
    Failure {
        /// Resolved target, when resolution got that far
        to: Option<Arc<RouteLocation>>,
        from: Arc<RouteLocation>,
        #[source]
        source: anyhow::Error,
    },
}

impl NavigationError {
    pub fn kind(&self) -> NavigationErrorKind {
        match self {
            NavigationError::MatcherNotFound { .. } => NavigationErrorKind::MatcherNotFound,
            NavigationError::Redirect { .. } => NavigationErrorKind::Redirect,
            NavigationError::Aborted { .. } => NavigationErrorKind::Aborted,
            NavigationError::Cancelled { .. } => NavigationErrorKind::Cancelled,
            NavigationError::Same { .. } => NavigationErrorKind::Same,
            NavigationError::Failure { .. } => NavigationErrorKind::Failure,
        }
    }

    /// The location the failed navigation started from
    pub fn from_location(&self) -> &Arc<RouteLocation> {
        match self {
            NavigationError::MatcherNotFound { from, .. }
            | NavigationError::Redirect { from, .. }
            | NavigationError::Aborted { from, .. }
            | NavigationError::Cancelled { from, .. }
            | NavigationError::Same { from, .. }
            | NavigationError::Failure { from, .. } => from,
        }
    }

    /// The resolved target, when the failure carries one
    pub fn to_location(&self) -> Option<&Arc<RouteLocation>> {
        match self {
            NavigationError::Aborted { to, .. }
            | NavigationError::Cancelled { to, .. }
            | NavigationError::Same { to, .. } => Some(to),
            NavigationError::Failure { to, .. } => to.as_ref(),
            NavigationError::MatcherNotFound { .. } | NavigationError::Redirect { .. } => None,
        }
    }

    /// A shareable copy for ready-state waiters; `Failure` sources are
    /// flattened to their rendered message
    pub(crate) fn to_shared(&self) -> Arc<NavigationError> {
        Arc::new(match self {
            NavigationError::MatcherNotFound { target, from } => NavigationError::MatcherNotFound {
                target: target.clone(),
                from: from.clone(),
            },
            NavigationError::Redirect { to, from } => NavigationError::Redirect {
                to: to.clone(),
                from: from.clone(),
            },
            NavigationError::Aborted { to, from } => NavigationError::Aborted {
                to: to.clone(),
                from: from.clone(),
            },
            NavigationError::Cancelled { to, from } => NavigationError::Cancelled {
                to: to.clone(),
                from: from.clone(),
            },
            NavigationError::Same { to, from } => NavigationError::Same {
                to: to.clone(),
                from: from.clone(),
            },
            NavigationError::Failure { to, from, source } => NavigationError::Failure {
                to: to.clone(),
                from: from.clone(),
                source: anyhow::anyhow!("{source:#}"),
            },
        })
    }
}
