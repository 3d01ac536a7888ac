//! End-to-end engine behaviour on a virtual clock.

use chatbar::{
    config::TimingConfig,
    runtime::{
        surface::{InputBuffer, StatusBar},
        EngineEvent, EngineEventKind, EngineOptions,
    },
    workflow::Tag,
    ActionExecutor, MemorySurface, Step, Surfaces, Workflow, WorkflowEngine, WorkflowRegistry,
};
use std::{
    sync::{Arc, Mutex},
    time::Duration,
};
use tokio::{sync::broadcast, task::JoinHandle, time::Instant};

fn engine_with(workflows: Vec<Workflow>, options: EngineOptions) -> (WorkflowEngine, Arc<MemorySurface>) {
    let surface = Arc::new(MemorySurface::new());
    let registry = WorkflowRegistry::new(workflows, vec!["a.jpg".into(), "b.jpg".into()]).unwrap();
    let actions = ActionExecutor::new(Surfaces::all(surface.clone()), TimingConfig::default());
    (WorkflowEngine::with_options(registry, actions, options), surface)
}

fn engine(workflows: Vec<Workflow>) -> (WorkflowEngine, Arc<MemorySurface>) {
    engine_with(workflows, EngineOptions::default())
}

fn three_short_workflows() -> Vec<Workflow> {
    ["One", "Two", "Three"]
        .into_iter()
        .map(|name| Workflow::new(name, vec![Step::type_text("ab"), Step::pause(100)]))
        .collect()
}

fn spawn_start(engine: &WorkflowEngine) -> JoinHandle<()> {
    let engine = engine.clone();
    tokio::spawn(async move { engine.start().await })
}

/// Receive events until `done` returns true, returning everything seen
async fn collect_until(
    rx: &mut broadcast::Receiver<EngineEvent>,
    mut done: impl FnMut(&EngineEvent) -> bool,
) -> Vec<EngineEvent> {
    let mut seen = Vec::new();
    loop {
        let event = rx.recv().await.expect("engine event");
        let finished = done(&event);
        seen.push(event);
        if finished {
            return seen;
        }
    }
}

#[tokio::test(start_paused = true)]
async fn steps_never_overlap() {
    let workflow = Workflow::new(
        "Overlap",
        vec![
            Step::Clear,
            Step::status("Typing..."),
            Step::type_text("Analyze "),
            Step::slash_select(0, "checkroom", "Running Shoes"),
            Step::Send,
            Step::pause(250),
            Step::SetBackground { image: None },
            Step::HideOutput,
        ],
    )
    .with_background("imgs/Runners.jpg");
    let (engine, _) = engine(vec![workflow.clone(), Workflow::new("Second", workflow.steps.clone())]);
    let mut rx = engine.subscribe();

    let handle = spawn_start(&engine);
    let mut finished = 0;
    let events = collect_until(&mut rx, |e| {
        if matches!(e.kind, EngineEventKind::WorkflowFinished { .. }) {
            finished += 1;
        }
        finished == 2
    })
    .await;
    engine.stop();
    handle.await.unwrap();

    let steps: Vec<&EngineEvent> = events
        .iter()
        .filter(|e| {
            matches!(
                e.kind,
                EngineEventKind::StepStarted { .. } | EngineEventKind::StepFinished { .. }
            )
        })
        .collect();
    assert_eq!(steps.len(), 2 * 2 * workflow.steps.len());

    for pair in steps.chunks(2) {
        let (EngineEventKind::StepStarted { workflow: w1, step: s1, .. }, EngineEventKind::StepFinished { workflow: w2, step: s2, .. }) =
            (&pair[0].kind, &pair[1].kind)
        else {
            panic!("step events out of order: {:?}", pair);
        };
        assert_eq!((w1, s1), (w2, s2));
        assert!(pair[0].at <= pair[1].at);
    }
    for window in steps.windows(2) {
        assert!(window[0].at <= window[1].at, "events must be monotonic");
    }
}

#[tokio::test(start_paused = true)]
async fn loops_back_to_the_first_workflow() {
    let (engine, _) = engine(three_short_workflows());
    let mut rx = engine.subscribe();
    let handle = spawn_start(&engine);

    let mut finished = Vec::new();
    collect_until(&mut rx, |e| {
        if let EngineEventKind::WorkflowFinished { index, .. } = e.kind {
            finished.push(index);
        }
        finished.len() == 9
    })
    .await;

    assert_eq!(finished, vec![0, 1, 2, 0, 1, 2, 0, 1, 2]);
    assert_eq!(engine.current_index(), 0);
    let snapshot = engine.snapshot();
    assert_eq!(snapshot.runs_completed % 3, 0);
    assert!(snapshot.running);
    assert!(snapshot.last_started_at.is_some());

    engine.stop();
    handle.await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn stop_is_observed_mid_typing() {
    let text = "abcdefghijklmnopqrst";
    assert_eq!(text.len(), 20);
    let (engine, surface) = engine(vec![Workflow::new(
        "Typing",
        vec![Step::type_text(text), Step::status("after")],
    )]);
    let mut rx = engine.subscribe();
    let handle = spawn_start(&engine);

    // cleanup settle (500) + warmup (400), then one character every 30ms
    tokio::time::sleep(Duration::from_millis(900 + 4 * 30 + 15)).await;
    engine.stop();
    handle.await.unwrap();
    tokio::time::sleep(Duration::from_secs(2)).await;

    let typed = surface.input_text();
    assert!((4..=6).contains(&typed.len()), "typed {:?}", typed);
    assert!(surface.snapshot().action.is_none());
    assert!(!engine.is_running());

    let mut later_steps = 0;
    while let Ok(event) = rx.try_recv() {
        if let EngineEventKind::StepStarted { step, .. } = event.kind {
            if step > 0 {
                later_steps += 1;
            }
        }
    }
    assert_eq!(later_steps, 0);
}

#[tokio::test(start_paused = true)]
async fn stop_is_idempotent() {
    let (engine, _) = engine(three_short_workflows());
    let mut rx = engine.subscribe();

    engine.stop();
    engine.stop();
    assert!(!engine.is_running());

    let handle = spawn_start(&engine);
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert!(engine.is_running());

    engine.stop();
    engine.stop();
    assert!(!engine.is_running());
    handle.await.unwrap();

    let mut stops = 0;
    while let Ok(event) = rx.try_recv() {
        if event.kind == EngineEventKind::Stopped {
            stops += 1;
        }
    }
    assert_eq!(stops, 1);
}

#[tokio::test(start_paused = true)]
async fn start_while_running_keeps_the_cursor() {
    let (engine, _) = engine(three_short_workflows());
    let handle = spawn_start(&engine);
    tokio::time::sleep(Duration::from_millis(50)).await;

    // returns immediately, does not touch the running loop
    engine.start().await;
    assert_eq!(engine.current_index(), 0);
    assert!(engine.is_running());

    engine.stop();
    handle.await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn background_step_uses_workflow_default_unless_overridden() {
    let (engine, surface) = engine(vec![
        Workflow::new("Default", vec![Step::SetBackground { image: None }, Step::pause(5000)])
            .with_background("X"),
        Workflow::new(
            "Override",
            vec![Step::SetBackground { image: Some("Y".into()) }, Step::pause(5000)],
        )
        .with_background("X"),
    ]);
    let handle = spawn_start(&engine);

    // cleanup + warmup + background settle
    tokio::time::sleep(Duration::from_millis(900 + 200 + 10)).await;
    assert_eq!(surface.background().as_deref(), Some("X"));

    engine.stop();
    handle.await.unwrap();

    let handle = tokio::spawn({
        let engine = engine.clone();
        async move { engine.next().await }
    });
    // jump cleanup + workflow cleanup + warmup + background settle
    tokio::time::sleep(Duration::from_millis(500 + 900 + 200 + 10)).await;
    assert_eq!(surface.background().as_deref(), Some("Y"));

    engine.stop();
    handle.await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn unknown_step_kinds_are_skipped() {
    let registry = WorkflowRegistry::from_json(
        r#"[{ "name": "Tolerant", "steps": [
            { "action": "doesNotExist", "text": "boom" },
            { "action": "setStatus", "text": "done" }
        ]}]"#,
    )
    .unwrap();
    let surface = Arc::new(MemorySurface::new());
    let engine = WorkflowEngine::new(
        registry,
        ActionExecutor::new(Surfaces::all(surface.clone()), TimingConfig::default()),
    );
    let mut rx = engine.subscribe();
    let handle = spawn_start(&engine);

    collect_until(&mut rx, |e| matches!(e.kind, EngineEventKind::WorkflowFinished { .. })).await;
    assert_eq!(surface.snapshot().action.as_deref(), Some("done"));

    engine.stop();
    handle.await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn next_and_prev_wrap_around() {
    let (engine, _) = engine(three_short_workflows());
    let mut rx = engine.subscribe();
    assert_eq!(engine.current_index(), 0);

    let prev = tokio::spawn({
        let engine = engine.clone();
        async move { engine.prev().await }
    });
    let events = collect_until(&mut rx, |e| matches!(e.kind, EngineEventKind::RunStarted { .. })).await;
    assert!(matches!(
        events.last().map(|e| &e.kind),
        Some(EngineEventKind::RunStarted { from_index: 2, .. })
    ));
    assert_eq!(engine.current_index(), 2);
    assert!(engine.is_running());

    let next = tokio::spawn({
        let engine = engine.clone();
        async move { engine.next().await }
    });
    let events = collect_until(&mut rx, |e| matches!(e.kind, EngineEventKind::RunStarted { .. })).await;
    assert!(matches!(
        events.last().map(|e| &e.kind),
        Some(EngineEventKind::RunStarted { from_index: 0, .. })
    ));
    assert_eq!(engine.current_index(), 0);

    engine.stop();
    prev.await.unwrap();
    next.await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn next_resumes_the_forward_loop() {
    let (engine, _) = engine(three_short_workflows());
    let mut rx = engine.subscribe();

    let handle = tokio::spawn({
        let engine = engine.clone();
        async move { engine.next().await }
    });

    let mut finished = Vec::new();
    collect_until(&mut rx, |e| {
        if let EngineEventKind::WorkflowFinished { index, .. } = e.kind {
            finished.push(index);
        }
        finished.len() == 3
    })
    .await;
    assert_eq!(finished, vec![1, 2, 0]);

    engine.stop();
    handle.await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn hide_output_on_stop_clears_the_card() {
    let (engine, surface) = engine_with(
        vec![Workflow::new(
            "Send",
            vec![Step::type_text("q"), Step::Send, Step::pause(10_000)],
        )],
        EngineOptions {
            hide_output_on_stop: true,
        },
    );
    let handle = spawn_start(&engine);

    tokio::time::sleep(Duration::from_millis(2000)).await;
    assert!(surface.snapshot().text_card.is_some());

    engine.stop();
    assert!(surface.snapshot().text_card.is_none());
    handle.await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn background_passthrough_works_while_idle() {
    let (engine, surface) = engine(three_short_workflows());

    engine.set_background("custom.png".into()).await;
    assert_eq!(surface.background().as_deref(), Some("custom.png"));
    assert!(!engine.is_running());
}

#[tokio::test(start_paused = true)]
async fn spawned_run_is_claimed_immediately() {
    let (engine, surface) = engine(three_short_workflows());

    let handle = engine.spawn_run().expect("idle engine accepts a run");
    assert!(engine.is_running());
    assert!(engine.spawn_run().is_none());

    // stopping before the task was ever polled still ends the run
    engine.stop();
    handle.await.unwrap();
    tokio::time::sleep(Duration::from_secs(3)).await;
    assert!(!engine.is_running());
    assert!(surface.input_text().is_empty());
}

#[test]
fn idle_snapshot_serializes_in_camel_case() {
    let (engine, _) = engine(three_short_workflows());
    let json = serde_json::to_value(engine.snapshot()).unwrap();

    assert_eq!(json["running"], false);
    assert_eq!(json["currentIndex"], 0);
    assert_eq!(json["currentWorkflow"], "One");
    assert_eq!(json["workflowCount"], 3);
    assert_eq!(json["runsCompleted"], 0);
    assert!(json["lastStartedAt"].is_null());
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Effect {
    Char(char),
    RemoveMarker,
    Tag,
    Status,
}

/// Input and status surface that timestamps every visible change
struct Recorder {
    surface: Arc<MemorySurface>,
    calls: Mutex<Vec<(Instant, Effect)>>,
}

impl Recorder {
    fn record(&self, effect: Effect) {
        self.calls.lock().unwrap().push((Instant::now(), effect));
    }
}

impl InputBuffer for Recorder {
    fn clear(&self) {
        InputBuffer::clear(&*self.surface);
    }

    fn push_char(&self, c: char) {
        self.record(Effect::Char(c));
        self.surface.push_char(c);
    }

    fn remove_trailing(&self, marker: char) -> bool {
        self.record(Effect::RemoveMarker);
        self.surface.remove_trailing(marker)
    }

    fn insert_tag(&self, tag: Tag) {
        self.record(Effect::Tag);
        self.surface.insert_tag(tag);
    }

    fn text(&self) -> String {
        self.surface.text()
    }
}

impl StatusBar for Recorder {
    fn set_category(&self, text: &str) {
        self.surface.set_category(text);
    }

    fn set_action(&self, text: &str) {
        self.record(Effect::Status);
        self.surface.set_action(text);
    }

    fn clear_action(&self) {
        self.surface.clear_action();
    }
}

#[tokio::test(start_paused = true)]
async fn step_effects_occupy_disjoint_intervals() {
    let surface = Arc::new(MemorySurface::new());
    let recorder = Arc::new(Recorder {
        surface: surface.clone(),
        calls: Mutex::new(Vec::new()),
    });
    let timing = TimingConfig::default();
    let surfaces = Surfaces::all(surface.clone())
        .with_input(recorder.clone())
        .with_status(recorder.clone());
    let registry = WorkflowRegistry::new(
        vec![Workflow::new(
            "Effects",
            vec![
                Step::type_text("ab"),
                Step::slash_select(0, "checkroom", "Running Shoes"),
                Step::type_text("cd"),
                Step::status("done"),
            ],
        )],
        vec![],
    )
    .unwrap();
    let engine = WorkflowEngine::new(registry, ActionExecutor::new(surfaces, timing.clone()));
    let mut rx = engine.subscribe();
    let handle = spawn_start(&engine);

    collect_until(&mut rx, |e| matches!(e.kind, EngineEventKind::WorkflowFinished { .. })).await;
    engine.stop();
    handle.await.unwrap();

    let calls = recorder.calls.lock().unwrap().clone();
    let effects: Vec<Effect> = calls.iter().map(|(_, effect)| *effect).collect();
    assert_eq!(
        effects,
        vec![
            Effect::Char('a'),
            Effect::Char('b'),
            Effect::Char('/'),
            Effect::RemoveMarker,
            Effect::Tag,
            Effect::Char('c'),
            Effect::Char('d'),
            Effect::Status,
        ]
    );

    // a typing effect lasts until the interval after its last character
    let at = |i: usize| calls[i].0;
    let spans = [
        (at(0), at(1) + timing.typing_interval()),
        (at(2), at(4)),
        (at(5), at(6) + timing.typing_interval()),
        (at(7), at(7)),
    ];
    for pair in spans.windows(2) {
        let (earlier, later) = (pair[0], pair[1]);
        assert!(earlier.0 <= earlier.1);
        assert!(
            earlier.1 + timing.step_pause() <= later.0,
            "effect starting at {:?} overlaps one ending at {:?}",
            later.0,
            earlier.1
        );
    }
}

#[tokio::test(start_paused = true)]
async fn jump_cleans_up_before_the_target_workflow() {
    let (engine, surface) = engine(vec![
        Workflow::new(
            "Interrupted",
            vec![
                Step::status("Typing..."),
                Step::ShowOutput { lines: Some(3) },
                Step::OpenPopup {
                    popup_id: "mode-popup".into(),
                    trigger_selector: "#mode-button".into(),
                },
                Step::type_text("abcdefghijklmnopqrstuvwxyz"),
            ],
        ),
        Workflow::new("Target", vec![Step::pause(5000)]),
    ]);
    let handle = spawn_start(&engine);

    // status at 900, output at 1300, popup at 2200, then typing
    tokio::time::sleep(Duration::from_millis(2300)).await;
    let before = surface.snapshot();
    assert_eq!(before.action.as_deref(), Some("Typing..."));
    assert!(before.text_card.is_some());
    assert_eq!(before.open_popup.as_deref(), Some("mode-popup"));
    assert!(!surface.input_text().is_empty());

    let mut rx = engine.subscribe();
    let jump = tokio::spawn({
        let engine = engine.clone();
        async move { engine.next().await }
    });
    collect_until(&mut rx, |e| matches!(e.kind, EngineEventKind::RunStarted { .. })).await;

    let after = surface.snapshot();
    assert!(after.input.is_empty());
    assert!(after.action.is_none());
    assert!(after.text_card.is_none());
    assert!(after.open_popup.is_none());
    assert!(!after.slash_menu_open);
    assert_eq!(engine.current_index(), 1);

    engine.stop();
    handle.await.unwrap();
    jump.await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn stop_during_jump_cleanup_wins() {
    let (engine, _) = engine(three_short_workflows());
    let mut rx = engine.subscribe();
    let handle = spawn_start(&engine);
    tokio::time::sleep(Duration::from_millis(1000)).await;

    let jump = tokio::spawn({
        let engine = engine.clone();
        async move { engine.next().await }
    });
    // still inside the 500ms jump cleanup
    tokio::time::sleep(Duration::from_millis(100)).await;
    assert!(engine.is_running());
    engine.stop();
    assert!(!engine.is_running());

    tokio::time::sleep(Duration::from_secs(2)).await;
    jump.await.unwrap();
    handle.await.unwrap();
    assert!(!engine.is_running());
    assert_eq!(engine.current_index(), 0, "an aborted jump leaves the cursor alone");

    let mut runs = 0;
    let mut stops = 0;
    while let Ok(event) = rx.try_recv() {
        match event.kind {
            EngineEventKind::RunStarted { .. } => runs += 1,
            EngineEventKind::Stopped => stops += 1,
            _ => {}
        }
    }
    assert_eq!(runs, 1, "only the original run ever started");
    assert_eq!(stops, 2);
}
