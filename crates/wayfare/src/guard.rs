//! Navigation guards
//!
//! A guard inspects a pending transition and answers with a tagged
//! outcome; the pipeline consumes the same contract whether the guard is
//! a closure or a hand-written type, synchronous or not.

use std::fmt;
use std::future::Future;
use std::sync::Arc;

use futures::future::BoxFuture;

use crate::location::{RawLocation, RouteLocation};

/// Verdict of a single guard
pub enum GuardOutcome {
    /// Continue with the transition
    Proceed,
    /// Abort the transition
    Deny,
    /// Abandon the transition and navigate to another target instead
    Redirect(RawLocation),
    /// Fail the transition with an arbitrary error
    Failure(anyhow::Error),
}

impl GuardOutcome {
    /// Shorthand for `Failure` from any error type
    pub fn fail(err: impl Into<anyhow::Error>) -> Self {
        GuardOutcome::Failure(err.into())
    }
}

impl fmt::Debug for GuardOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GuardOutcome::Proceed => f.write_str("Proceed"),
            GuardOutcome::Deny => f.write_str("Deny"),
            GuardOutcome::Redirect(to) => write!(f, "Redirect({to})"),
            GuardOutcome::Failure(err) => write!(f, "Failure({err})"),
        }
    }
}

/// A leave/enter/global navigation hook
///
/// Implemented for free by any `Fn(Arc<RouteLocation>, Arc<RouteLocation>)`
/// closure returning a future of [`GuardOutcome`]:
///
/// ```
/// use std::sync::Arc;
/// use wayfare::{GuardOutcome, NavigationGuard, RouteLocation};
///
/// let guard = |to: Arc<RouteLocation>, _from: Arc<RouteLocation>| async move {
///     if to.path.starts_with("/admin") {
///         GuardOutcome::Redirect("/login".into())
///     } else {
///         GuardOutcome::Proceed
///     }
/// };
/// let _boxed: Box<dyn NavigationGuard> = Box::new(guard);
/// ```
pub trait NavigationGuard: Send + Sync {
    fn check(
        &self,
        to: Arc<RouteLocation>,
        from: Arc<RouteLocation>,
    ) -> BoxFuture<'static, GuardOutcome>;
}

impl<F, Fut> NavigationGuard for F
where
    F: Fn(Arc<RouteLocation>, Arc<RouteLocation>) -> Fut + Send + Sync,
    Fut: Future<Output = GuardOutcome> + Send + 'static,
{
    fn check(
        &self,
        to: Arc<RouteLocation>,
        from: Arc<RouteLocation>,
    ) -> BoxFuture<'static, GuardOutcome> {
        Box::pin(self(to, from))
    }
}
