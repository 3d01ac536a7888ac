/// Idle detection service
///
/// Suspends the demo while a real user is interacting and resumes it after a quiet
/// period. Every interaction stops the engine and pushes the restart deadline back
/// (a debounce); when the deadline passes and the engine is not already running, a
/// new run is started in the background.

use crate::runtime::engine::WorkflowEngine;
use std::time::Duration;
use tokio::{sync::mpsc, task::JoinHandle, time::Instant};

/// Kinds of user input that interrupt the demo
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Interaction {
    PointerDown,
    KeyDown,
    TouchStart,
    Scroll,
}

/// Background idle-detection task bound to one engine
#[derive(Debug)]
pub struct IdleDetector {
    interactions: mpsc::UnboundedSender<Interaction>,
    task: JoinHandle<()>,
}

impl IdleDetector {
    /// Spawn the detector; the first run starts after one idle timeout
    pub fn spawn(engine: WorkflowEngine, idle_timeout: Duration) -> Self {
        let (interactions, rx) = mpsc::unbounded_channel();
        tracing::info!("💤 Idle detection enabled ({:?} timeout)", idle_timeout);
        let task = tokio::spawn(watch(engine, idle_timeout, rx));
        Self { interactions, task }
    }

    /// Report a user interaction
    pub fn notify(&self, interaction: Interaction) {
        if self.interactions.send(interaction).is_err() {
            tracing::debug!("Idle detector already shut down, ignoring {:?}", interaction);
        }
    }

    /// Stop watching; the engine is left in whatever state it is in
    pub async fn shutdown(self) {
        drop(self.interactions);
        if let Err(e) = self.task.await {
            tracing::warn!("⚠️ Idle detector task ended abnormally: {}", e);
        }
    }
}

async fn watch(engine: WorkflowEngine, idle_timeout: Duration, mut rx: mpsc::UnboundedReceiver<Interaction>) {
    let restart = tokio::time::sleep(idle_timeout);
    tokio::pin!(restart);
    let mut armed = true;

    loop {
        tokio::select! {
            interaction = rx.recv() => {
                let Some(interaction) = interaction else {
                    break;
                };
                tracing::debug!("👆 User interaction: {:?}", interaction);
                engine.stop();
                restart.as_mut().reset(Instant::now() + idle_timeout);
                armed = true;
            }
            () = &mut restart, if armed => {
                armed = false;
                if engine.spawn_run().is_some() {
                    tracing::info!("💤 User idle, started workflows");
                }
            }
        }
    }

    tracing::debug!("Idle detector stopped");
}
