/// Looping workflow engine
///
/// Plays the registry's workflows in order, one step at a time, and starts over after
/// the last one. Control operations (`start`, `stop`, `next`, `prev`) only touch the
/// engine's own state: the workflow cursor and the cancellation token of the current
/// run. All UI state is owned by the action layer.

use crate::runtime::actions::ActionExecutor;
use crate::workflow::{registry::WorkflowRegistry, types::{BackgroundRef, Step, Workflow}};
use arc_swap::{ArcSwap, ArcSwapOption};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::{
    atomic::{AtomicU64, AtomicUsize, Ordering},
    Arc,
};
use tokio::{sync::broadcast, task::JoinHandle, time::Instant};
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

/// Capacity of the engine event channel
const EVENT_BUFFER: usize = 1024;

/// Engine behaviour switches
#[derive(Debug, Clone, Default)]
pub struct EngineOptions {
    /// Hide the output card as soon as `stop()` is called
    pub hide_output_on_stop: bool,
}

/// Something the engine did, stamped with the tokio clock
#[derive(Debug, Clone)]
pub struct EngineEvent {
    pub at: Instant,
    pub kind: EngineEventKind,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineEventKind {
    RunStarted { run_id: Uuid, from_index: usize },
    WorkflowStarted { index: usize, name: String },
    StepStarted { workflow: usize, step: usize, action: &'static str },
    StepFinished { workflow: usize, step: usize, action: &'static str },
    /// Emitted after the cursor has moved on to `next_index`
    WorkflowFinished { index: usize, name: String, next_index: usize },
    Stopped,
}

/// Point-in-time view of the engine
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EngineSnapshot {
    pub running: bool,
    pub current_index: usize,
    pub current_workflow: Option<String>,
    pub workflow_count: usize,
    pub runs_completed: u64,
    pub last_started_at: Option<DateTime<Utc>>,
}

/// Workflow engine handle; clones share the same engine
#[derive(Clone)]
pub struct WorkflowEngine {
    inner: Arc<EngineInner>,
}

struct EngineInner {
    registry: WorkflowRegistry,
    actions: ActionExecutor,
    options: EngineOptions,
    /// Token of the current run; a cancelled token means the engine is idle
    run: ArcSwap<CancellationToken>,
    /// Cursor into the registry, wraps to 0 after the last workflow
    current_index: AtomicUsize,
    runs_completed: AtomicU64,
    last_started_at: ArcSwapOption<DateTime<Utc>>,
    events: broadcast::Sender<EngineEvent>,
}

impl WorkflowEngine {
    pub fn new(registry: WorkflowRegistry, actions: ActionExecutor) -> Self {
        Self::with_options(registry, actions, EngineOptions::default())
    }

    pub fn with_options(registry: WorkflowRegistry, actions: ActionExecutor, options: EngineOptions) -> Self {
        let idle = CancellationToken::new();
        idle.cancel();
        let (events, _) = broadcast::channel(EVENT_BUFFER);

        Self {
            inner: Arc::new(EngineInner {
                registry,
                actions,
                options,
                run: ArcSwap::from_pointee(idle),
                current_index: AtomicUsize::new(0),
                runs_completed: AtomicU64::new(0),
                last_started_at: ArcSwapOption::empty(),
                events,
            }),
        }
    }

    /// Start looping from the current workflow
    ///
    /// Resolves only once the run is stopped. Starting while already running is a
    /// no-op that returns immediately.
    pub async fn start(&self) {
        match self.begin_run() {
            Some(cancel) => self.run_loop(cancel).await,
            None => tracing::debug!("▶️ Engine already running, start ignored"),
        }
    }

    /// Claim the engine now and play the loop on a background task
    ///
    /// Returns `None` when a run is already active. The run is claimed before this
    /// returns, so a `stop()` issued right after always lands on it.
    pub fn spawn_run(&self) -> Option<JoinHandle<()>> {
        let cancel = self.begin_run()?;
        let engine = self.clone();
        Some(tokio::spawn(async move { engine.run_loop(cancel).await }))
    }

    /// Stop the current run at its next checkpoint; harmless when already stopped
    pub fn stop(&self) {
        let run = self.inner.run.load();
        if run.is_cancelled() {
            return;
        }
        run.cancel();
        tracing::info!("⏹️ Workflow engine stopped");

        if self.inner.options.hide_output_on_stop {
            self.inner.actions.hide_output_now();
        }
        self.emit(EngineEventKind::Stopped);
    }

    /// Jump to the following workflow (wrapping) and keep looping from there
    pub async fn next(&self) {
        self.jump(true).await
    }

    /// Jump to the preceding workflow (wrapping) and keep looping from there
    pub async fn prev(&self) {
        self.jump(false).await
    }

    pub fn is_running(&self) -> bool {
        !self.inner.run.load().is_cancelled()
    }

    pub fn current_index(&self) -> usize {
        self.inner.current_index.load(Ordering::SeqCst)
    }

    pub fn registry(&self) -> &WorkflowRegistry {
        &self.inner.registry
    }

    /// Receive engine events from now on
    pub fn subscribe(&self) -> broadcast::Receiver<EngineEvent> {
        self.inner.events.subscribe()
    }

    pub fn snapshot(&self) -> EngineSnapshot {
        let current_index = self.current_index();
        EngineSnapshot {
            running: self.is_running(),
            current_index,
            current_workflow: self.inner.registry.get(current_index).map(|w| w.name.clone()),
            workflow_count: self.inner.registry.len(),
            runs_completed: self.inner.runs_completed.load(Ordering::SeqCst),
            last_started_at: self.inner.last_started_at.load_full().map(|at| *at),
        }
    }

    /// Swap the background outside of any workflow
    pub async fn set_background(&self, background: BackgroundRef) {
        self.inner
            .actions
            .set_background(Some(&background), &CancellationToken::new())
            .await
    }

    /// Advance the background rotation outside of any workflow
    pub async fn next_background(&self) {
        self.inner.actions.next_background(&CancellationToken::new()).await
    }

    /// Claim the engine for a new run, unless one is already active
    fn begin_run(&self) -> Option<CancellationToken> {
        let current = self.inner.run.load();
        if !current.is_cancelled() {
            return None;
        }

        let cancel = CancellationToken::new();
        let previous = self.inner.run.compare_and_swap(&current, Arc::new(cancel.clone()));
        if !Arc::ptr_eq(&previous, &current) {
            // another start won the race
            return None;
        }

        self.inner.last_started_at.store(Some(Arc::new(Utc::now())));
        self.inner.actions.prepare(self.inner.registry.backgrounds());
        Some(cancel)
    }

    async fn jump(&self, forward: bool) {
        self.stop();
        // claim before cleanup so a stop() during the settle cancels the jump itself
        let Some(cancel) = self.begin_run() else {
            tracing::debug!("⏭️ Another run claimed the engine, jump ignored");
            return;
        };

        self.inner.actions.cleanup(false, &cancel).await;
        if cancel.is_cancelled() {
            tracing::info!("⏹️ Stopped before the jump completed");
            return;
        }

        let len = self.inner.registry.len();
        let current = self.current_index() % len;
        let target = if forward { (current + 1) % len } else { (current + len - 1) % len };
        self.inner.current_index.store(target, Ordering::SeqCst);
        tracing::info!("⏭️ Jumping to workflow {} of {}", target + 1, len);

        self.run_loop(cancel).await
    }

    async fn run_loop(&self, cancel: CancellationToken) {
        let run_id = Uuid::new_v4();
        let registry = &self.inner.registry;
        let len = registry.len();
        let from_index = self.current_index() % len;

        tracing::info!("🎬 Starting demo run {} at workflow {} of {}", run_id, from_index + 1, len);
        self.emit(EngineEventKind::RunStarted { run_id, from_index });

        loop {
            let index = self.current_index() % len;
            let Some(workflow) = registry.get(index) else {
                break;
            };

            if !self.run_workflow(index, workflow, &cancel).await {
                break;
            }

            let next_index = (index + 1) % len;
            self.inner.current_index.store(next_index, Ordering::SeqCst);
            self.inner.runs_completed.fetch_add(1, Ordering::SeqCst);
            self.emit(EngineEventKind::WorkflowFinished {
                index,
                name: workflow.name.clone(),
                next_index,
            });
            if next_index == 0 {
                tracing::debug!("🔁 All {} workflows played, looping", len);
            }

            if !self.inner.actions.pause(self.inner.actions.timing().workflow_pause(), &cancel).await {
                break;
            }
        }

        tracing::info!("🛑 Demo run {} ended", run_id);
    }

    /// Play one workflow; returns false when the run was cancelled part-way
    async fn run_workflow(&self, index: usize, workflow: &Workflow, cancel: &CancellationToken) -> bool {
        let actions = &self.inner.actions;
        let started = std::time::Instant::now();

        tracing::info!("🎬 Running workflow: {}", workflow.name);
        self.emit(EngineEventKind::WorkflowStarted {
            index,
            name: workflow.name.clone(),
        });

        actions.cleanup(true, cancel).await;
        if !actions.pause(actions.timing().warmup_pause(), cancel).await {
            return false;
        }

        for (step_index, step) in workflow.steps.iter().enumerate() {
            if cancel.is_cancelled() {
                tracing::info!(
                    "⏸️ Workflow '{}' interrupted at step {}/{}",
                    workflow.name,
                    step_index + 1,
                    workflow.steps.len()
                );
                return false;
            }

            self.run_step(index, step_index, step, workflow, cancel).await;
        }

        tracing::info!("✅ Workflow '{}' finished in {:?}", workflow.name, started.elapsed());
        !cancel.is_cancelled()
    }

    async fn run_step(
        &self,
        workflow_index: usize,
        step_index: usize,
        step: &Step,
        workflow: &Workflow,
        cancel: &CancellationToken,
    ) {
        let actions = &self.inner.actions;
        let action = step.kind();

        self.emit(EngineEventKind::StepStarted {
            workflow: workflow_index,
            step: step_index,
            action,
        });
        actions.execute_step(step, workflow, cancel).await;
        self.emit(EngineEventKind::StepFinished {
            workflow: workflow_index,
            step: step_index,
            action,
        });

        if !step.is_instant() {
            actions.pause(actions.timing().step_pause(), cancel).await;
        }
    }

    fn emit(&self, kind: EngineEventKind) {
        // no subscribers is fine
        let _ = self.inner.events.send(EngineEvent {
            at: Instant::now(),
            kind,
        });
    }
}

impl std::fmt::Debug for WorkflowEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WorkflowEngine")
            .field("running", &self.is_running())
            .field("current_index", &self.current_index())
            .field("workflows", &self.inner.registry.len())
            .finish()
    }
}
