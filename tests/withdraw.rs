mod common;

use std::time::Duration;

use tokio::time::Instant;

use common::{GateLink, buffered, ids_of, next_of};
use stagevisor::{
    Command, Config, EventKind, Orchestrator, Pipeline, Reply, RouteTable, RuntimeError, Stage,
    Task,
};

#[tokio::test(start_paused = true)]
async fn test_queued_tasks_never_reach_the_link_once_withdrawing() {
    let (link, mut entered) = GateLink::new();
    let pipeline = Pipeline::builder(Config::default())
        .with_link(link.clone())
        .with_routes(RouteTable::empty())
        .build();
    let mut rx = pipeline.subscribe();

    pipeline.submit(Task::for_stage("first", Stage::Soc, ""));
    assert_eq!(entered.recv().await.as_deref(), Some("first"));
    pipeline.submit(Task::for_stage("second", Stage::Soc, ""));
    pipeline.submit(Task::for_stage("third", Stage::Soc, ""));

    assert!(pipeline.enter_withdraw());
    assert!(!pipeline.enter_withdraw());
    link.open(1);

    let started = Instant::now();
    assert!(pipeline.wait_all_quiescent(Duration::from_secs(5)).await);
    assert!(started.elapsed() <= Config::default().withdraw_idle);

    // Only the task already in flight touched the link.
    assert!(entered.try_recv().is_err());
    let events = buffered(&mut rx);
    assert_eq!(ids_of(&events, EventKind::TaskCompleted), ["first"]);
    assert_eq!(ids_of(&events, EventKind::TaskCancelled), ["second", "third"]);
    pipeline.shutdown().await.expect("workers stop");
}

#[tokio::test(start_paused = true)]
async fn test_work_pushed_while_withdrawing_is_cancelled_then_flow_resumes() {
    let pipeline = Pipeline::builder(Config::default()).build();
    let mut rx = pipeline.subscribe();

    pipeline.enter_withdraw();
    pipeline.push(Stage::Vip, Task::for_stage("vip", Stage::Vip, ""));
    let ev = next_of(&mut rx, EventKind::TaskCancelled).await;
    assert_eq!(ev.stage, Some(Stage::Vip));
    assert_eq!(pipeline.queued(Stage::Vip), 0);

    assert!(pipeline.exit_withdraw());
    assert!(!pipeline.is_withdrawing());
    pipeline.submit(Task::for_stage("middleware", Stage::Soc, ""));
    assert!(pipeline.wait_all_quiescent(Duration::from_secs(5)).await);

    assert!(pipeline.is_completed(Stage::Soc));
    assert!(!pipeline.is_completed(Stage::Vip));
    pipeline.shutdown().await.expect("workers stop");
}

#[tokio::test(start_paused = true)]
async fn test_start_waits_for_switch_task_in_flight() {
    let pipeline = Pipeline::builder(Config::default()).build();
    let orch = Orchestrator::new(pipeline.clone());

    pipeline.push(Stage::Switch, Task::for_stage("rootfs", Stage::Switch, "/tmp/r"));
    tokio::time::sleep(Duration::from_secs(1)).await;

    let started = Instant::now();
    assert_eq!(orch.execute(Command::Start).await, Reply::Prepared);
    assert!(started.elapsed() >= Duration::from_secs(14));

    assert!(pipeline.is_completed(Stage::Switch));
    assert!(!pipeline.is_withdrawing());
    pipeline.shutdown().await.expect("workers stop");
}

#[tokio::test(start_paused = true)]
async fn test_start_fails_when_switch_outlasts_the_barrier() {
    let cfg = Config {
        barrier_timeout: Duration::from_secs(5),
        ..Config::default()
    };
    let pipeline = Pipeline::builder(cfg).build();
    let orch = Orchestrator::new(pipeline.clone());

    pipeline.push(Stage::Switch, Task::for_stage("rootfs", Stage::Switch, "/tmp/r"));
    tokio::time::sleep(Duration::from_secs(1)).await;

    assert_eq!(
        orch.execute(Command::Start).await,
        Reply::PrepareFailed(RuntimeError::QuiescenceTimeout {
            timeout: Duration::from_secs(5),
            pending: vec![Stage::Switch],
        })
    );
    assert!(!pipeline.is_withdrawing());

    // The in-flight task still finishes afterwards.
    assert!(pipeline.wait_all_quiescent(Duration::from_secs(30)).await);
    assert!(pipeline.is_completed(Stage::Switch));
    pipeline.shutdown().await.expect("workers stop");
}
