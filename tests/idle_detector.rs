//! Idle detection and start-policy wiring on a virtual clock.

use chatbar::{
    config::{Config, StartPolicy, TimingConfig},
    ActionExecutor, ChatBarDemo, IdleDetector, Interaction, MemorySurface, Surfaces,
    WorkflowEngine,
};
use std::{sync::Arc, time::Duration};

fn builtin_engine() -> WorkflowEngine {
    let registry = chatbar::workflow::builtin::builtin_registry().unwrap();
    let surface = Arc::new(MemorySurface::new());
    WorkflowEngine::new(
        registry,
        ActionExecutor::new(Surfaces::all(surface), TimingConfig::default()),
    )
}

fn config(policy: StartPolicy) -> Config {
    Config {
        policy,
        workflows_file: None,
        hide_output_on_stop: false,
        timing: TimingConfig::default(),
    }
}

async fn advance(millis: u64) {
    tokio::time::sleep(Duration::from_millis(millis)).await;
}

#[tokio::test(start_paused = true)]
async fn first_run_starts_after_one_idle_timeout() {
    let engine = builtin_engine();
    let idle = IdleDetector::spawn(engine.clone(), Duration::from_millis(2000));

    advance(1990).await;
    assert!(!engine.is_running());
    advance(20).await;
    assert!(engine.is_running());

    idle.shutdown().await;
    engine.stop();
}

#[tokio::test(start_paused = true)]
async fn interactions_stop_and_debounce_the_restart() {
    let engine = builtin_engine();
    let idle = IdleDetector::spawn(engine.clone(), Duration::from_millis(2000));

    // interaction at t=1000 pushes the first start to t=3000
    advance(1000).await;
    idle.notify(Interaction::KeyDown);
    advance(1500).await;
    assert!(!engine.is_running());
    advance(600).await;
    assert!(engine.is_running());

    idle.notify(Interaction::PointerDown);
    advance(1).await;
    assert!(!engine.is_running());

    // a burst of input keeps the engine quiet until the last one has aged out
    for _ in 0..5 {
        advance(900).await;
        idle.notify(Interaction::Scroll);
    }
    advance(1990).await;
    assert!(!engine.is_running());
    advance(20).await;
    assert!(engine.is_running());

    idle.shutdown().await;
    engine.stop();
}

#[tokio::test(start_paused = true)]
async fn shutdown_cancels_a_pending_restart() {
    let engine = builtin_engine();
    let idle = IdleDetector::spawn(engine.clone(), Duration::from_millis(2000));
    idle.notify(Interaction::TouchStart);
    advance(10).await;

    idle.shutdown().await;
    advance(5000).await;
    assert!(!engine.is_running());
}

#[tokio::test(start_paused = true)]
async fn auto_loop_policy_starts_immediately() {
    let mut demo = ChatBarDemo::new(
        &config(StartPolicy::AutoLoop),
        Surfaces::all(Arc::new(MemorySurface::new())),
    )
    .unwrap();
    demo.launch();
    advance(1).await;
    assert!(demo.engine().is_running());

    // interactions do not pause the auto loop
    demo.interaction(Interaction::KeyDown);
    advance(1).await;
    assert!(demo.engine().is_running());

    demo.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn pause_on_interaction_policy_waits_for_idle() {
    let surface = Arc::new(MemorySurface::new());
    let mut demo = ChatBarDemo::new(
        &config(StartPolicy::PauseOnInteraction),
        Surfaces::all(surface.clone()),
    )
    .unwrap();
    demo.launch();
    advance(1).await;
    assert!(!demo.engine().is_running());

    advance(2000).await;
    assert!(demo.engine().is_running());

    demo.interaction(Interaction::KeyDown);
    advance(1).await;
    assert!(!demo.engine().is_running());

    demo.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn demo_controls_jump_between_workflows() {
    let demo = ChatBarDemo::new(
        &config(StartPolicy::AutoLoop),
        Surfaces::all(Arc::new(MemorySurface::new())),
    )
    .unwrap();
    let count = demo.engine().registry().len();
    assert_eq!(count, 3);

    let _run = demo.prev();
    advance(600).await;
    assert_eq!(demo.engine().current_index(), count - 1);
    assert!(demo.engine().is_running());

    let _run = demo.next();
    advance(600).await;
    assert_eq!(demo.engine().current_index(), 0);

    demo.stop();
    assert!(!demo.engine().is_running());
    demo.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn interaction_during_a_jump_keeps_the_demo_paused() {
    let mut demo = ChatBarDemo::new(
        &config(StartPolicy::PauseOnInteraction),
        Surfaces::all(Arc::new(MemorySurface::new())),
    )
    .unwrap();
    demo.launch();
    advance(2001).await;
    assert!(demo.engine().is_running());

    let jump = demo.next();
    advance(100).await;
    demo.interaction(Interaction::KeyDown);
    advance(1).await;
    assert!(!demo.engine().is_running());

    // well past the jump cleanup, still short of the idle timeout
    advance(1500).await;
    jump.await.unwrap();
    assert!(!demo.engine().is_running());
    assert_eq!(demo.engine().current_index(), 0);

    demo.shutdown().await;
}
