//! Integration tests for the navigation pipeline
//!
//! Covers the transition state machine end to end:
//! - commit, history push/replace threading, ready state
//! - same-location short-circuit and force
//! - guard chains: deny, redirect, failure, ordering
//! - record redirects (literal, computed, chained)
//! - racing navigations and the pending-token cancellation
//! - history traversal events driving the same pipeline

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::sync::Notify;
use wayfare::{
    GuardOutcome, HistoryAdapter, KeepAlive, MemoryHistory, NavigationError, NavigationErrorKind,
    RawLocation, RouteDefinition, RouteLocation, Router, RouterOptions,
};

type Loc = Arc<RouteLocation>;

fn basic_router() -> Router {
    Router::new(
        RouterOptions::new()
            .route(RouteDefinition::path("/").name("home").component("home.rsx"))
            .route(RouteDefinition::path("/a").name("a").component("a.rsx"))
            .route(RouteDefinition::path("/b").name("b").component("b.rsx"))
            .route(
                RouteDefinition::path("/users/:id")
                    .name("user")
                    .component("user.rsx"),
            ),
    )
    .unwrap()
}

async fn settle() {
    tokio::time::sleep(Duration::from_millis(50)).await;
}

#[tokio::test]
async fn test_push_commits_and_threads_history() {
    let memory = Arc::new(MemoryHistory::new());
    let router = Router::new(
        RouterOptions::new()
            .route(RouteDefinition::path("/a").name("a").component("a.rsx"))
            .route(RouteDefinition::path("/b").name("b").component("b.rsx"))
            .history(memory.clone()),
    )
    .unwrap();

    // the very first navigation replaces the adapter's initial entry
    router.push("/a").await.unwrap();
    assert_eq!(router.current().path, "/a");
    assert_eq!(memory.len(), 1);
    assert!(memory.state().unwrap().replaced);

    // later navigations push
    router.push("/b").await.unwrap();
    assert_eq!(router.current().path, "/b");
    assert_eq!(memory.len(), 2);
    assert_eq!(memory.state().unwrap().back.as_deref(), Some("/a"));

    // an explicit replace overwrites the current entry
    router.replace("/a").await.unwrap();
    assert_eq!(memory.len(), 2);
    assert_eq!(memory.location(), "/a");
}

#[tokio::test]
async fn test_same_location_short_circuits_without_mutation() {
    let router = basic_router();
    router.push("/a").await.unwrap();

    let before = router.current();
    let tail_before = Arc::clone(&before.matched.last().unwrap().record);

    let err = router.push("/a").await.unwrap_err();
    assert_eq!(err.kind(), NavigationErrorKind::Same);

    // the active location is untouched, down to chain-tail identity
    let after = router.current();
    assert!(Arc::ptr_eq(&before, &after));
    assert!(Arc::ptr_eq(
        &tail_before,
        &after.matched.last().unwrap().record
    ));

    // force navigates anyway
    router
        .push(RawLocation::path("/a").force(true))
        .await
        .unwrap();
}

#[tokio::test]
async fn test_query_and_hash_resolve_into_full_path() {
    let router = basic_router();
    router.push("/users/7?tab=posts#bio").await.unwrap();

    let current = router.current();
    assert_eq!(current.path, "/users/7");
    assert_eq!(current.full_path, "/users/7?tab=posts#bio");
    assert_eq!(current.hash, "#bio");
    assert_eq!(current.params.get("id").unwrap().as_str(), Some("7"));

    // same path, different query: a distinct location
    router.push("/users/7?tab=likes#bio").await.unwrap();
    assert_eq!(router.current().full_path, "/users/7?tab=likes#bio");
}

#[tokio::test]
async fn test_relative_navigation_overrides_params() {
    let router = basic_router();
    router.push("/users/7").await.unwrap();

    router
        .push(RawLocation::relative().with_param("id", "8"))
        .await
        .unwrap();
    assert_eq!(router.current().path, "/users/8");
    assert_eq!(router.current().name.as_deref(), Some("user"));
}

#[tokio::test]
async fn test_named_navigation_inherits_required_params() {
    let router = Router::new(
        RouterOptions::new()
            .route(
                RouteDefinition::path("/users/:id")
                    .name("user")
                    .component("user.rsx"),
            )
            .route(
                RouteDefinition::path("/users/:id/posts")
                    .name("user-posts")
                    .component("posts.rsx"),
            ),
    )
    .unwrap();

    router.push("/users/7").await.unwrap();
    router.push(RawLocation::named("user-posts")).await.unwrap();
    assert_eq!(router.current().path, "/users/7/posts");
}

#[tokio::test]
async fn test_guard_deny_aborts() {
    let router = Router::new(
        RouterOptions::new()
            .route(RouteDefinition::path("/open").name("open").component("open.rsx"))
            .route(
                RouteDefinition::path("/closed")
                    .name("closed")
                    .component("closed.rsx")
                    .before_enter(|_: Loc, _: Loc| async { GuardOutcome::Deny }),
            ),
    )
    .unwrap();

    router.push("/open").await.unwrap();

    let err = router.push("/closed").await.unwrap_err();
    assert_eq!(err.kind(), NavigationErrorKind::Aborted);
    assert_eq!(router.current().path, "/open");
}

#[tokio::test]
async fn test_guard_redirect_reenters_pipeline() {
    let router = Router::new(
        RouterOptions::new()
            .route(RouteDefinition::path("/login").name("login").component("login.rsx"))
            .route(
                RouteDefinition::path("/admin")
                    .name("admin")
                    .component("admin.rsx")
                    .before_enter(|_: Loc, _: Loc| async {
                        GuardOutcome::Redirect("/login".into())
                    }),
            ),
    )
    .unwrap();

    router.push("/admin").await.unwrap();

    let current = router.current();
    assert_eq!(current.path, "/login");
    assert_eq!(
        current.redirected_from.as_ref().unwrap().path,
        "/admin"
    );
}

#[tokio::test]
async fn test_guard_failure_reaches_error_hook() {
    tracing_subscriber::fmt().with_test_writer().try_init().ok();

    let seen: Arc<Mutex<Vec<String>>> = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&seen);

    let router = Router::new(
        RouterOptions::new()
            .route(RouteDefinition::path("/ok").name("ok").component("ok.rsx"))
            .route(
                RouteDefinition::path("/broken")
                    .name("broken")
                    .component("broken.rsx")
                    .before_enter(|_: Loc, _: Loc| async {
                        GuardOutcome::fail(std::io::Error::other("backend unavailable"))
                    }),
            ),
    )
    .unwrap();

    let _hook = router.on_error(move |err| {
        sink.lock().unwrap().push(err.to_string());
    });

    router.push("/ok").await.unwrap();
    let err = router.push("/broken").await.unwrap_err();

    assert_eq!(err.kind(), NavigationErrorKind::Failure);
    assert_eq!(router.current().path, "/ok");

    let seen = seen.lock().unwrap();
    assert_eq!(seen.len(), 1);
    assert!(seen[0].contains("backend unavailable"));
}

#[tokio::test]
async fn test_leave_and_enter_chains_run_for_changing_records_only() {
    let order: Arc<Mutex<Vec<&'static str>>> = Arc::new(Mutex::new(Vec::new()));

    let leave_log = Arc::clone(&order);
    let enter_log = Arc::clone(&order);
    let shared_log = Arc::clone(&order);

    let router = Router::new(
        RouterOptions::new().route(
            RouteDefinition::path("/app")
                .name("app")
                .component("app.rsx")
                .before_enter(move |_: Loc, _: Loc| {
                    let log = Arc::clone(&shared_log);
                    async move {
                        log.lock().unwrap().push("enter app");
                        GuardOutcome::Proceed
                    }
                })
                .child(
                    RouteDefinition::path("one")
                        .name("one")
                        .component("one.rsx")
                        .before_leave(move |_: Loc, _: Loc| {
                            let log = Arc::clone(&leave_log);
                            async move {
                                log.lock().unwrap().push("leave one");
                                GuardOutcome::Proceed
                            }
                        }),
                )
                .child(
                    RouteDefinition::path("two")
                        .name("two")
                        .component("two.rsx")
                        .before_enter(move |_: Loc, _: Loc| {
                            let log = Arc::clone(&enter_log);
                            async move {
                                log.lock().unwrap().push("enter two");
                                GuardOutcome::Proceed
                            }
                        }),
                ),
        ),
    )
    .unwrap();

    router.push("/app/one").await.unwrap();
    order.lock().unwrap().clear();

    // /app stays in the chain: its enter guard must not run again
    router.push("/app/two").await.unwrap();

    assert_eq!(*order.lock().unwrap(), vec!["leave one", "enter two"]);
}

#[tokio::test]
async fn test_global_hooks_run_in_registration_order_and_unregister() {
    let order: Arc<Mutex<Vec<&'static str>>> = Arc::new(Mutex::new(Vec::new()));
    let router = basic_router();

    let first_log = Arc::clone(&order);
    let first = router.before_each(move |_: Loc, _: Loc| {
        let log = Arc::clone(&first_log);
        async move {
            log.lock().unwrap().push("first");
            GuardOutcome::Proceed
        }
    });

    let second_log = Arc::clone(&order);
    let _second = router.before_each(move |_: Loc, _: Loc| {
        let log = Arc::clone(&second_log);
        async move {
            log.lock().unwrap().push("second");
            GuardOutcome::Proceed
        }
    });

    router.push("/a").await.unwrap();
    assert_eq!(*order.lock().unwrap(), vec!["first", "second"]);

    first.remove();
    order.lock().unwrap().clear();

    router.push("/b").await.unwrap();
    assert_eq!(*order.lock().unwrap(), vec!["second"]);
}

#[tokio::test]
async fn test_after_hooks_observe_every_outcome() {
    let outcomes: Arc<Mutex<Vec<Option<NavigationErrorKind>>>> = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&outcomes);

    let router = basic_router();
    let _hook = router.after_each(move |_to, _from, failure| {
        sink.lock().unwrap().push(failure.map(NavigationError::kind));
    });

    router.push("/a").await.unwrap();
    let _ = router.push("/a").await; // SAME does not reach after hooks: no pipeline ran
    router.push("/b").await.unwrap();

    assert_eq!(*outcomes.lock().unwrap(), vec![None, None]);
}

#[tokio::test]
async fn test_record_redirects_chain_and_track_source() {
    let router = Router::new(
        RouterOptions::new()
            .route(RouteDefinition::path("/old").name("old").redirect("/mid"))
            .route(RouteDefinition::path("/mid").name("mid").redirect("/final"))
            .route(
                RouteDefinition::path("/final")
                    .name("final")
                    .component("final.rsx"),
            ),
    )
    .unwrap();

    router.push("/old").await.unwrap();

    let current = router.current();
    assert_eq!(current.path, "/final");
    assert_eq!(current.name.as_deref(), Some("final"));
    // the original target survives across both hops
    assert_eq!(
        current.redirected_from.as_ref().unwrap().path,
        "/old"
    );
}

#[tokio::test]
async fn test_computed_redirect_sees_the_resolved_target() {
    let router = Router::new(
        RouterOptions::new()
            .route(
                RouteDefinition::path("/legacy/:id").name("legacy").redirect_with(|to| {
                    RawLocation::path(format!(
                        "/users/{}",
                        to.params.get("id").map(|v| v.text()).unwrap_or_default()
                    ))
                }),
            )
            .route(
                RouteDefinition::path("/users/:id")
                    .name("user")
                    .component("user.rsx"),
            ),
    )
    .unwrap();

    router.push("/legacy/42").await.unwrap();
    assert_eq!(router.current().path, "/users/42");
}

#[tokio::test]
async fn test_newer_navigation_cancels_in_flight_one() {
    let gate = Arc::new(Notify::new());
    let gate_for_guard = Arc::clone(&gate);

    let router = Router::new(
        RouterOptions::new()
            .route(RouteDefinition::path("/fast").name("fast").component("fast.rsx"))
            .route(
                RouteDefinition::path("/slow")
                    .name("slow")
                    .component("slow.rsx")
                    .before_enter(move |_: Loc, _: Loc| {
                        let gate = Arc::clone(&gate_for_guard);
                        async move {
                            gate.notified().await;
                            GuardOutcome::Proceed
                        }
                    }),
            ),
    )
    .unwrap();

    let slow_router = router.clone();
    let slow = tokio::spawn(async move { slow_router.push("/slow").await });

    // let the slow navigation reach its guard, then overtake it
    settle().await;
    router.push("/fast").await.unwrap();
    gate.notify_one();

    let slow_result = slow.await.unwrap();
    assert_eq!(
        slow_result.unwrap_err().kind(),
        NavigationErrorKind::Cancelled
    );
    assert_eq!(router.current().path, "/fast");
}

#[tokio::test]
async fn test_matcher_not_found_is_reported_and_returned() {
    let hits = Arc::new(AtomicUsize::new(0));
    let sink = Arc::clone(&hits);

    let router = basic_router();
    let _hook = router.on_error(move |err| {
        assert_eq!(err.kind(), NavigationErrorKind::MatcherNotFound);
        sink.fetch_add(1, Ordering::SeqCst);
    });

    let err = router.push("/does/not/exist").await.unwrap_err();
    assert_eq!(err.kind(), NavigationErrorKind::MatcherNotFound);
    assert_eq!(hits.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_ready_settles_after_first_navigation() {
    let router = basic_router();

    let waiting_router = router.clone();
    let waiter = tokio::spawn(async move { waiting_router.ready().await });

    settle().await;
    assert!(!waiter.is_finished());

    router.push("/a").await.unwrap();
    waiter.await.unwrap().unwrap();

    // once ready, the future resolves immediately
    router.ready().await.unwrap();
}

#[tokio::test]
async fn test_start_navigates_to_the_adapter_location() {
    let memory = Arc::new(MemoryHistory::new());
    memory.push("/users/3", None);

    let router = Router::new(
        RouterOptions::new()
            .route(
                RouteDefinition::path("/users/:id")
                    .name("user")
                    .component("user.rsx"),
            )
            .history(memory),
    )
    .unwrap();

    router.start().await.unwrap();
    assert_eq!(router.current().path, "/users/3");
    assert_eq!(router.current().params.get("id").unwrap().as_str(), Some("3"));
}

#[tokio::test]
async fn test_history_traversal_runs_through_the_pipeline() {
    let router = basic_router();
    router.push("/a").await.unwrap();
    router.push("/b").await.unwrap();

    router.back();
    settle().await;
    assert_eq!(router.current().path, "/a");

    router.forward();
    settle().await;
    assert_eq!(router.current().path, "/b");
}

#[tokio::test]
async fn test_denied_pop_navigation_is_compensated() {
    let memory = Arc::new(MemoryHistory::new());
    let deny = Arc::new(AtomicUsize::new(0));
    let deny_switch = Arc::clone(&deny);

    let router = Router::new(
        RouterOptions::new()
            .route(
                RouteDefinition::path("/a")
                    .name("a")
                    .component("a.rsx")
                    .before_enter(move |_: Loc, _: Loc| {
                        let armed = deny_switch.load(Ordering::SeqCst) > 0;
                        async move {
                            if armed {
                                GuardOutcome::Deny
                            } else {
                                GuardOutcome::Proceed
                            }
                        }
                    }),
            )
            .route(RouteDefinition::path("/b").name("b").component("b.rsx"))
            .history(memory.clone()),
    )
    .unwrap();

    router.push("/a").await.unwrap();
    router.push("/b").await.unwrap();

    // arm the guard, then try to traverse back into /a
    deny.store(1, Ordering::SeqCst);
    router.back();
    settle().await;

    // the navigation aborted and the traversal was undone silently
    assert_eq!(router.current().path, "/b");
    assert_eq!(memory.location(), "/b");
}

#[tokio::test]
async fn test_refresh_clears_cached_view_instances() {
    let router = Router::new(
        RouterOptions::new()
            .route(
                RouteDefinition::path("/cached")
                    .name("cached")
                    .component("cached.rsx")
                    .keepalive(KeepAlive::Always),
            )
            .route(RouteDefinition::path("/other").name("other").component("other.rsx")),
    )
    .unwrap();

    router.push("/cached").await.unwrap();

    // the renderer parks an instance in the slot
    let current = router.current();
    let record = &current.matched.last().unwrap().record;
    let slot = record.components.get("default").unwrap();
    slot.store_instance(Box::new("live view"), KeepAlive::Always);
    assert!(slot.has_cached());

    router.push("/other").await.unwrap();
    router
        .push(RawLocation::path("/cached").refresh(true))
        .await
        .unwrap();

    assert!(!slot.has_cached());
}
