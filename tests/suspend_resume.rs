//! End-to-end suspend/resume behaviour of `SuspendController`.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::sync::Notify;
use tokio_util::sync::CancellationToken;

use suspendvisor::{
    ActivityError, ActivityFn, ActivityFnBuilder, ActivityRef, ControllerConfig, Event, EventKind,
    Phase, Priority, RegisterError, ResumeContext, State, Subscribe, SuspendContext,
    SuspendController, SuspendError,
};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Mark {
    Start,
    End,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct Entry {
    name: &'static str,
    phase: Phase,
    mark: Mark,
}

type Journal = Arc<Mutex<Vec<Entry>>>;

fn journal() -> Journal {
    Arc::new(Mutex::new(Vec::new()))
}

async fn step(journal: Journal, name: &'static str, phase: Phase) -> Result<(), ActivityError> {
    journal.lock().push(Entry {
        name,
        phase,
        mark: Mark::Start,
    });
    for _ in 0..3 {
        tokio::task::yield_now().await;
    }
    journal.lock().push(Entry {
        name,
        phase,
        mark: Mark::End,
    });
    Ok(())
}

/// Activity that journals the start and end of every phase call.
fn recorded(name: &'static str, journal: &Journal) -> ActivityFnBuilder {
    let (jp, js, jr) = (journal.clone(), journal.clone(), journal.clone());
    ActivityFn::builder(name)
        .on_prepare(move |_ctx: SuspendContext, _cancel: CancellationToken| {
            step(jp.clone(), name, Phase::Prepare)
        })
        .on_suspend(move |_ctx: SuspendContext, _cancel: CancellationToken| {
            step(js.clone(), name, Phase::Suspend)
        })
        .on_resume(move |_ctx: ResumeContext, _cancel: CancellationToken| {
            step(jr.clone(), name, Phase::Resume)
        })
}

fn calls(journal: &Journal, name: &str, phase: Phase) -> usize {
    journal
        .lock()
        .iter()
        .filter(|e| e.name == name && e.phase == phase && e.mark == Mark::Start)
        .count()
}

fn position(journal: &Journal, name: &str, phase: Phase, mark: Mark) -> usize {
    journal
        .lock()
        .iter()
        .position(|e| e.name == name && e.phase == phase && e.mark == mark)
        .unwrap_or_else(|| panic!("{name} never logged {phase} {mark:?}"))
}

/// Asserts every `later` call of `phase` started after every `earlier` call ended.
fn assert_after(journal: &Journal, phase: Phase, earlier: &[&str], later: &[&str]) {
    for e in earlier {
        let ended = position(journal, e, phase, Mark::End);
        for l in later {
            let started = position(journal, l, phase, Mark::Start);
            assert!(
                started > ended,
                "{l} started {phase} before {e} finished it"
            );
        }
    }
}

fn controller() -> Arc<SuspendController> {
    SuspendController::builder(ControllerConfig::default()).build()
}

async fn running(c: &Arc<SuspendController>) {
    c.resume(ResumeContext::new().with_starting(true))
        .await
        .unwrap();
    assert_eq!(c.state(), State::Running);
}

fn explode() -> Result<(), ActivityError> {
    panic!("activity bug")
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn groups_run_in_priority_order() {
    let j = journal();
    let c = controller();
    let mid = Priority::new(4).unwrap();
    for (name, priority) in [
        ("gate", Priority::FIRST),
        ("gate2", Priority::FIRST),
        ("pool", mid),
        ("cache", Priority::LAST),
    ] {
        c.register_activity(recorded(name, &j).arc(), priority)
            .await
            .unwrap();
    }
    running(&c).await;
    j.lock().clear();

    c.suspend(SuspendContext::new()).await.unwrap();
    assert_eq!(c.state(), State::Suspended);
    for phase in [Phase::Prepare, Phase::Suspend] {
        assert_after(&j, phase, &["gate", "gate2"], &["pool"]);
        assert_after(&j, phase, &["pool"], &["cache"]);
    }

    j.lock().clear();
    c.resume(ResumeContext::new()).await.unwrap();
    assert_after(&j, Phase::Resume, &["cache"], &["pool"]);
    assert_after(&j, Phase::Resume, &["pool"], &["gate", "gate2"]);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_suspends_share_one_attempt() {
    let prepares = Arc::new(Mutex::new(0usize));
    let gate = Arc::new(Notify::new());
    let c = controller();

    let (p, g) = (Arc::clone(&prepares), Arc::clone(&gate));
    let slow = ActivityFn::builder("slow")
        .on_prepare(move |_ctx: SuspendContext, _cancel: CancellationToken| {
            let (p, g) = (Arc::clone(&p), Arc::clone(&g));
            async move {
                *p.lock() += 1;
                g.notified().await;
                Ok::<_, ActivityError>(())
            }
        })
        .arc();
    c.register_activity(slow, Priority::DEFAULT).await.unwrap();
    running(&c).await;

    let (c1, c2) = (Arc::clone(&c), Arc::clone(&c));
    let first = tokio::spawn(async move { c1.suspend(SuspendContext::new()) });
    let second = tokio::spawn(async move { c2.suspend(SuspendContext::new()) });
    let first = first.await.unwrap();
    let second = second.await.unwrap();

    assert!(!first.is_done());
    assert!(!second.is_done());
    gate.notify_one();

    assert_eq!(first.await, Ok(()));
    assert_eq!(second.await, Ok(()));
    assert_eq!(*prepares.lock(), 1);
    assert_eq!(c.state(), State::Suspended);
}

#[tokio::test]
async fn suspend_while_suspended_returns_finished_attempt() {
    let j = journal();
    let c = controller();
    c.register_activity(recorded("a", &j).arc(), Priority::FIRST)
        .await
        .unwrap();
    j.lock().clear();

    let done = c.suspend(SuspendContext::new());
    assert!(done.is_done());
    assert_eq!(done.await, Ok(()));
    assert_eq!(calls(&j, "a", Phase::Prepare), 0);
    assert_eq!(calls(&j, "a", Phase::Suspend), 0);
}

#[tokio::test]
async fn resume_while_running_is_a_no_op() {
    let j = journal();
    let c = controller();
    c.register_activity(recorded("a", &j).arc(), Priority::FIRST)
        .await
        .unwrap();
    running(&c).await;
    j.lock().clear();

    let again = c.resume(ResumeContext::new());
    assert!(again.is_done());
    assert_eq!(again.await, Ok(()));
    assert!(j.lock().is_empty());
}

#[tokio::test]
async fn late_registration_suspends_before_returning() {
    let j = journal();
    let c = controller();
    assert_eq!(c.state(), State::Suspended);

    c.register_activity(recorded("late", &j).arc(), Priority::LAST)
        .await
        .unwrap();
    assert_eq!(calls(&j, "late", Phase::Suspend), 1);
    assert_eq!(position(&j, "late", Phase::Suspend, Mark::End), 1);
    assert_eq!(calls(&j, "late", Phase::Prepare), 0);

    running(&c).await;
    c.register_activity(recorded("early", &j).arc(), Priority::LAST)
        .await
        .unwrap();
    assert_eq!(calls(&j, "early", Phase::Suspend), 0);
}

#[tokio::test]
async fn failed_late_registration_stays_registered() {
    let c = controller();
    let broken: ActivityRef = ActivityFn::builder("broken")
        .on_suspend(|_ctx: SuspendContext, _cancel: CancellationToken| async {
            Err::<(), _>(ActivityError::fail("disk full"))
        })
        .arc();

    let err = c
        .register_activity(Arc::clone(&broken), Priority::DEFAULT)
        .await
        .unwrap_err();
    assert_eq!(err.as_label(), "register_late_suspend");
    assert!(matches!(
        err,
        RegisterError::LateSuspend { ref activity, .. } if activity == "broken"
    ));
    assert_eq!(c.priority_of(&broken), Some(Priority::DEFAULT));
}

#[tokio::test]
async fn invalid_priority_is_rejected_up_front() {
    let j = journal();
    let c = controller();
    let err = c
        .register_activity_at(recorded("a", &j).arc(), Priority::LEVELS as u8)
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        RegisterError::InvalidPriority {
            level: 10,
            first: 0,
            last: 9
        }
    ));
    assert_eq!(c.activity_count(), 0);
    assert!(j.lock().is_empty());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn suspend_failure_short_circuits_later_groups() {
    let j = journal();
    let c = controller();
    let failing = recorded("bad", &j)
        .on_suspend(|_ctx: SuspendContext, _cancel: CancellationToken| async {
            Err::<(), _>(ActivityError::fail("refused"))
        })
        .arc();
    running(&c).await;

    c.register_activity(recorded("ok1", &j).arc(), Priority::FIRST)
        .await
        .unwrap();
    c.register_activity(failing, Priority::FIRST).await.unwrap();
    c.register_activity(recorded("ok2", &j).arc(), Priority::FIRST)
        .await
        .unwrap();
    c.register_activity(recorded("later", &j).arc(), Priority::LAST)
        .await
        .unwrap();
    let mut events = c.subscribe();
    j.lock().clear();

    let err = c.suspend(SuspendContext::new()).await.unwrap_err();
    assert_eq!(
        err,
        SuspendError::SuspendFailed {
            source: ActivityError::fail("refused")
        }
    );
    assert_eq!(c.state(), State::Suspending);
    assert_eq!(calls(&j, "later", Phase::Prepare), 1);
    assert_eq!(calls(&j, "later", Phase::Suspend), 0);

    let failed = loop {
        let ev = events.recv().await.unwrap();
        if ev.kind == EventKind::SuspendFailed {
            break ev;
        }
    };
    assert_eq!(failed.phase, Some(Phase::Suspend));
    assert_eq!(failed.activity.as_deref(), Some("bad"));
    assert_eq!(failed.priority, Some(Priority::FIRST));
}

#[tokio::test]
async fn prepare_failure_aborts_and_keeps_pre_suspend() {
    let j = journal();
    let c = controller();
    let failing = recorded("bad", &j)
        .on_prepare(|_ctx: SuspendContext, _cancel: CancellationToken| async {
            Err::<(), _>(ActivityError::fail("busy"))
        })
        .arc();
    c.register_activity(failing, Priority::FIRST).await.unwrap();
    c.register_activity(recorded("later", &j).arc(), Priority::LAST)
        .await
        .unwrap();
    running(&c).await;
    j.lock().clear();

    let err = c.suspend(SuspendContext::new()).await.unwrap_err();
    assert!(matches!(err, SuspendError::Aborted { .. }));
    assert!(err.is_cancellation());
    assert_eq!(err.activity_error(), Some(&ActivityError::fail("busy")));
    assert_eq!(c.state(), State::PreSuspend);
    assert_eq!(calls(&j, "later", Phase::Prepare), 0);
    assert_eq!(calls(&j, "bad", Phase::Suspend), 0);

    // No automatic rollback: resuming is the caller's move.
    c.resume(ResumeContext::new()).await.unwrap();
    assert_eq!(c.state(), State::Running);
}

#[tokio::test]
async fn panicking_activity_fails_the_attempt() {
    let c = controller();
    let bomb: ActivityRef = ActivityFn::builder("bomb")
        .on_suspend(|_ctx: SuspendContext, _cancel: CancellationToken| async { explode() })
        .arc();
    running(&c).await;
    c.register_activity(bomb, Priority::FIRST).await.unwrap();

    let err = c.suspend(SuspendContext::new()).await.unwrap_err();
    match err {
        SuspendError::SuspendFailed {
            source: ActivityError::Panicked { info },
        } => assert_eq!(info, "activity bug"),
        other => panic!("unexpected outcome: {other:?}"),
    }
}

#[tokio::test]
async fn resume_failure_leaves_state_unchanged() {
    let c = controller();
    let stuck: ActivityRef = ActivityFn::builder("stuck")
        .on_resume(|_ctx: ResumeContext, _cancel: CancellationToken| async {
            Err::<(), _>(ActivityError::fail("port in use"))
        })
        .arc();
    c.register_activity(stuck, Priority::DEFAULT).await.unwrap();

    let err = c.resume(ResumeContext::new()).await.unwrap_err();
    assert_eq!(err.as_label(), "resume_failed");
    assert_eq!(c.state(), State::Suspended);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn round_trip_visits_each_phase_once() {
    let j = journal();
    let c = controller();
    for (name, level) in [("a", 0u8), ("b", 2), ("c", 2), ("d", 9)] {
        c.register_activity_at(recorded(name, &j).arc(), level)
            .await
            .unwrap();
    }
    running(&c).await;
    j.lock().clear();

    c.suspend(SuspendContext::new()).await.unwrap();
    c.resume(ResumeContext::new()).await.unwrap();
    assert_eq!(c.state(), State::Running);

    for name in ["a", "b", "c", "d"] {
        let seen: Vec<Phase> = j
            .lock()
            .iter()
            .filter(|e| e.name == name && e.mark == Mark::Start)
            .map(|e| e.phase)
            .collect();
        assert_eq!(seen, [Phase::Prepare, Phase::Suspend, Phase::Resume]);
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn fresh_controller_walkthrough() {
    let j = journal();
    let c = controller();
    c.register_activity(recorded("A", &j).arc(), Priority::FIRST)
        .await
        .unwrap();
    c.register_activity(recorded("B", &j).arc(), Priority::LAST)
        .await
        .unwrap();
    j.lock().clear();

    // Booted suspended: nothing to do.
    let noop = c.suspend(SuspendContext::new());
    assert!(noop.is_done());
    assert_eq!(noop.await, Ok(()));
    assert!(j.lock().is_empty());

    c.resume(ResumeContext::new().with_starting(true))
        .await
        .unwrap();
    assert_eq!(c.state(), State::Running);
    assert_eq!(calls(&j, "A", Phase::Resume), 1);
    assert_eq!(calls(&j, "B", Phase::Resume), 1);
    j.lock().clear();

    c.suspend(SuspendContext::new()).await.unwrap();
    assert_eq!(c.state(), State::Suspended);
    assert_after(&j, Phase::Prepare, &["A"], &["B"]);
    assert_after(&j, Phase::Suspend, &["A"], &["B"]);
    let last_prepare = position(&j, "B", Phase::Prepare, Mark::End);
    let first_suspend = position(&j, "A", Phase::Suspend, Mark::Start);
    assert!(first_suspend > last_prepare);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn resume_cancels_in_flight_suspend() {
    let j = journal();
    let gate = Arc::new(Notify::new());
    let c = controller();

    let g = Arc::clone(&gate);
    let blocker = recorded("blocker", &j)
        .on_prepare(move |_ctx: SuspendContext, cancel: CancellationToken| {
            let g = Arc::clone(&g);
            async move {
                g.notified().await;
                assert!(cancel.is_cancelled());
                Ok::<_, ActivityError>(())
            }
        })
        .arc();
    c.register_activity(blocker, Priority::FIRST).await.unwrap();
    c.register_activity(recorded("later", &j).arc(), Priority::LAST)
        .await
        .unwrap();
    running(&c).await;
    j.lock().clear();

    let attempt = c.suspend(SuspendContext::new());
    assert_eq!(c.state(), State::PreSuspend);

    c.resume(ResumeContext::new()).await.unwrap();
    assert_eq!(c.state(), State::Running);
    assert!(c.active_suspend().is_cancelled());

    assert_eq!(attempt.await, Err(SuspendError::Canceled));
    gate.notify_one();
    assert_eq!(calls(&j, "later", Phase::Prepare), 0);
    assert_eq!(c.state(), State::Running);
}

#[tokio::test]
async fn stale_resume_does_not_clobber_newer_suspend() {
    let prepares = Arc::new(Mutex::new(0usize));
    let prepare_gate = Arc::new(Notify::new());
    let resume_gate = Arc::new(Notify::new());
    let c = controller();

    let (p, pg) = (Arc::clone(&prepares), Arc::clone(&prepare_gate));
    let rg = Arc::clone(&resume_gate);
    let svc = ActivityFn::builder("svc")
        .on_prepare(move |_ctx: SuspendContext, _cancel: CancellationToken| {
            let (p, pg) = (Arc::clone(&p), Arc::clone(&pg));
            async move {
                *p.lock() += 1;
                pg.notified().await;
                Ok::<_, ActivityError>(())
            }
        })
        .on_resume(move |ctx: ResumeContext, _cancel: CancellationToken| {
            let rg = Arc::clone(&rg);
            async move {
                if !ctx.is_starting() {
                    rg.notified().await;
                }
                Ok::<_, ActivityError>(())
            }
        })
        .arc();
    c.register_activity(svc, Priority::DEFAULT).await.unwrap();

    let boot = c.resume(ResumeContext::new().with_starting(true));
    let stale = c.resume(ResumeContext::new());
    boot.await.unwrap();
    assert_eq!(c.state(), State::Running);

    let newer = c.suspend(SuspendContext::new());
    assert_eq!(c.state(), State::PreSuspend);

    resume_gate.notify_one();
    assert_eq!(stale.await, Err(SuspendError::Canceled));
    assert_eq!(c.state(), State::PreSuspend);

    let joined = c.suspend(SuspendContext::new());
    assert!(!joined.is_done());

    prepare_gate.notify_one();
    assert_eq!(newer.await, Ok(()));
    assert_eq!(joined.await, Ok(()));
    assert_eq!(c.state(), State::Suspended);
    assert_eq!(*prepares.lock(), 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn membership_changes_during_a_run_apply_to_later_groups() {
    let j = journal();
    let entered = Arc::new(Notify::new());
    let gate = Arc::new(Notify::new());
    let c = controller();

    let (e, g) = (Arc::clone(&entered), Arc::clone(&gate));
    let blocker = recorded("blocker", &j)
        .on_prepare(move |_ctx: SuspendContext, _cancel: CancellationToken| {
            let (e, g) = (Arc::clone(&e), Arc::clone(&g));
            async move {
                e.notify_one();
                g.notified().await;
                Ok::<_, ActivityError>(())
            }
        })
        .arc();
    let doomed: ActivityRef = recorded("doomed", &j).arc();
    c.register_activity(blocker, Priority::FIRST).await.unwrap();
    c.register_activity(Arc::clone(&doomed), Priority::LAST)
        .await
        .unwrap();
    running(&c).await;
    j.lock().clear();

    let attempt = c.suspend(SuspendContext::new());
    entered.notified().await;
    assert_eq!(c.state(), State::PreSuspend);

    // Not running: both joiners get their late suspend call right away.
    c.register_activity(recorded("joiner_first", &j).arc(), Priority::FIRST)
        .await
        .unwrap();
    c.register_activity(recorded("joiner_last", &j).arc(), Priority::LAST)
        .await
        .unwrap();
    assert_eq!(calls(&j, "joiner_first", Phase::Suspend), 1);
    assert_eq!(calls(&j, "joiner_last", Phase::Suspend), 1);
    assert!(c.unregister_activity(&doomed));

    gate.notify_one();
    assert_eq!(attempt.await, Ok(()));
    assert_eq!(c.state(), State::Suspended);

    // The FIRST group was snapshotted before `joiner_first` arrived.
    assert_eq!(calls(&j, "joiner_first", Phase::Prepare), 0);
    assert_eq!(calls(&j, "joiner_first", Phase::Suspend), 2);
    assert_eq!(calls(&j, "joiner_last", Phase::Prepare), 1);
    assert_eq!(calls(&j, "joiner_last", Phase::Suspend), 2);
    assert_eq!(calls(&j, "doomed", Phase::Prepare), 0);
    assert_eq!(calls(&j, "doomed", Phase::Suspend), 0);
    assert_eq!(calls(&j, "blocker", Phase::Suspend), 1);
}

#[tokio::test(start_paused = true)]
async fn caller_side_timeout() {
    let c = controller();
    let hang: ActivityRef = ActivityFn::builder("hang")
        .on_prepare(|_ctx: SuspendContext, _cancel: CancellationToken| {
            std::future::pending::<Result<(), ActivityError>>()
        })
        .arc();
    running(&c).await;
    c.register_activity(hang, Priority::FIRST).await.unwrap();

    let err = c
        .suspend(SuspendContext::new())
        .with_timeout(Duration::from_secs(30))
        .await
        .unwrap_err();
    assert_eq!(
        err,
        SuspendError::Timeout {
            timeout: Duration::from_secs(30)
        }
    );
    assert_eq!(c.state(), State::PreSuspend);
    assert!(!c.active_suspend().completion().is_done());
}

#[tokio::test]
async fn unregistered_activity_is_skipped() {
    let j = journal();
    let c = controller();
    let gone: ActivityRef = recorded("gone", &j).arc();
    c.register_activity(Arc::clone(&gone), Priority::FIRST)
        .await
        .unwrap();
    running(&c).await;
    j.lock().clear();

    assert!(c.unregister_activity(&gone));
    assert!(j.lock().is_empty());
    c.suspend(SuspendContext::new()).await.unwrap();
    assert!(j.lock().is_empty());
}

struct Kinds {
    seen: Mutex<Vec<EventKind>>,
}

#[async_trait]
impl Subscribe for Kinds {
    async fn on_event(&self, event: &Event) {
        self.seen.lock().push(event.kind);
    }

    fn name(&self) -> &'static str {
        "kinds"
    }
}

#[tokio::test]
async fn listeners_follow_the_lifecycle() {
    let kinds = Arc::new(Kinds {
        seen: Mutex::new(Vec::new()),
    });
    let listener: Arc<dyn Subscribe> = kinds.clone();
    let c = controller();
    assert!(c.add_listener(Arc::clone(&listener)));
    assert!(!c.add_listener(Arc::clone(&listener)));

    c.register_activity(ActivityFn::builder("a").arc(), Priority::FIRST)
        .await
        .unwrap();
    c.resume(ResumeContext::new()).await.unwrap();
    c.suspend(SuspendContext::new()).await.unwrap();
    c.close_listeners().await;

    assert_eq!(
        *kinds.seen.lock(),
        [
            EventKind::ActivityRegistered,
            EventKind::SuspendCancelled,
            EventKind::ResumeComplete,
            EventKind::SuspendStarted,
            EventKind::SuspendComplete,
        ]
    );
    assert!(!c.remove_listener(&listener));
}

#[tokio::test]
async fn removed_listener_hears_nothing_more() {
    let kinds = Arc::new(Kinds {
        seen: Mutex::new(Vec::new()),
    });
    let listener: Arc<dyn Subscribe> = kinds.clone();
    let c = SuspendController::builder(ControllerConfig::default())
        .with_subscribers(vec![Arc::clone(&listener)])
        .build();

    assert!(c.remove_listener(&listener));
    c.resume(ResumeContext::new()).await.unwrap();
    c.close_listeners().await;
    assert!(kinds.seen.lock().is_empty());
}
