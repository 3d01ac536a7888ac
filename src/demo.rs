/// Demo setup and initialization
///
/// Wires together all components: workflow registry, surfaces, action executor, engine
/// and the configured start policy. Also provides the console driver used by the binary.

use crate::{
    config::{Config, StartPolicy},
    runtime::{
        ActionExecutor, EngineOptions, IdleDetector, Interaction, MemorySurface, Surfaces,
        WorkflowEngine,
    },
    workflow::{builtin::builtin_registry, registry::WorkflowRegistry, types::BackgroundRef},
};
use anyhow::Result;
use std::sync::Arc;
use tokio::{
    io::{AsyncBufReadExt, BufReader},
    task::JoinHandle,
};
use tracing_subscriber::EnvFilter;

/// Load the configured workflows, or the built-in set
pub fn load_registry(config: &Config) -> Result<WorkflowRegistry> {
    match &config.workflows_file {
        Some(path) => WorkflowRegistry::load_file(path),
        None => {
            tracing::info!("📋 Using built-in demo workflows");
            builtin_registry()
        }
    }
}

/// A fully wired chat bar demo
#[derive(Debug)]
pub struct ChatBarDemo {
    engine: WorkflowEngine,
    policy: StartPolicy,
    idle_timeout: std::time::Duration,
    idle: Option<IdleDetector>,
}

impl ChatBarDemo {
    /// Build every component; nothing runs until `launch`
    pub fn new(config: &Config, surfaces: Surfaces) -> Result<Self> {
        let registry = load_registry(config)?;
        tracing::info!("⚙️ Initializing action executor with {:?}", surfaces);
        let actions = ActionExecutor::new(surfaces, config.timing.clone());
        let engine = WorkflowEngine::with_options(
            registry,
            actions,
            EngineOptions {
                hide_output_on_stop: config.hide_output_on_stop,
            },
        );

        Ok(Self {
            engine,
            policy: config.policy,
            idle_timeout: config.timing.idle_timeout(),
            idle: None,
        })
    }

    /// Start according to the start policy
    pub fn launch(&mut self) {
        match self.policy {
            StartPolicy::AutoLoop => {
                tracing::info!("🚀 Auto-loop: starting workflows now");
                self.start();
            }
            StartPolicy::PauseOnInteraction => {
                if self.idle.is_none() {
                    self.idle = Some(IdleDetector::spawn(self.engine.clone(), self.idle_timeout));
                }
            }
        }
    }

    /// Forward a user interaction; ignored under the auto-loop policy
    pub fn interaction(&self, interaction: Interaction) {
        match &self.idle {
            Some(idle) => idle.notify(interaction),
            None => tracing::debug!("Ignoring {:?} (auto-loop)", interaction),
        }
    }

    pub fn start(&self) -> JoinHandle<()> {
        let engine = self.engine.clone();
        tokio::spawn(async move { engine.start().await })
    }

    pub fn stop(&self) {
        self.engine.stop();
    }

    pub fn next(&self) -> JoinHandle<()> {
        let engine = self.engine.clone();
        tokio::spawn(async move { engine.next().await })
    }

    pub fn prev(&self) -> JoinHandle<()> {
        let engine = self.engine.clone();
        tokio::spawn(async move { engine.prev().await })
    }

    pub async fn set_background(&self, background: BackgroundRef) {
        self.engine.set_background(background).await
    }

    pub async fn next_background(&self) {
        self.engine.next_background().await
    }

    pub fn engine(&self) -> &WorkflowEngine {
        &self.engine
    }

    /// Stop the engine and the idle detector
    pub async fn shutdown(self) {
        if let Some(idle) = self.idle {
            idle.shutdown().await;
        }
        self.engine.stop();
    }
}

/// A line typed into the console driver
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConsoleCommand {
    Start,
    Stop,
    Next,
    Prev,
    Background(BackgroundRef),
    NextBackground,
    Status,
    Quit,
    /// Anything else counts as the user pressing a key
    Interact,
}

impl ConsoleCommand {
    pub fn parse(line: &str) -> Self {
        let mut words = line.split_whitespace();
        match (words.next(), words.next()) {
            (Some("start"), None) => Self::Start,
            (Some("stop"), None) => Self::Stop,
            (Some("next"), None) => Self::Next,
            (Some("prev"), None) => Self::Prev,
            (Some("bg"), Some(target)) => Self::Background(
                target
                    .parse::<usize>()
                    .map(BackgroundRef::Index)
                    .unwrap_or_else(|_| BackgroundRef::Url(target.to_string())),
            ),
            (Some("nextbg"), None) => Self::NextBackground,
            (Some("status"), None) => Self::Status,
            (Some("quit" | "exit"), None) => Self::Quit,
            _ => Self::Interact,
        }
    }
}

/// Initialize tracing for the console binary
pub fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(false)
        .with_level(true)
        .init();
}

/// Run the demo against an in-memory surface, driven from stdin
///
/// Control commands: start, stop, next, prev, bg <index|url>, nextbg, status, quit.
/// Any other line is treated as a key press.
pub async fn run_console(config: Config) -> Result<()> {
    init_tracing();
    tracing::info!("Starting chat bar demo...");

    let surface = Arc::new(MemorySurface::new());
    let mut demo = ChatBarDemo::new(&config, Surfaces::all(surface.clone()))?;
    demo.launch();

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        match ConsoleCommand::parse(&line) {
            ConsoleCommand::Start => drop(demo.start()),
            ConsoleCommand::Stop => demo.stop(),
            ConsoleCommand::Next => drop(demo.next()),
            ConsoleCommand::Prev => drop(demo.prev()),
            ConsoleCommand::Background(background) => demo.set_background(background).await,
            ConsoleCommand::NextBackground => demo.next_background().await,
            ConsoleCommand::Status => {
                let snapshot = demo.engine().snapshot();
                tracing::info!("📊 {} input=\"{}\"", serde_json::to_string(&snapshot)?, surface.input_text());
            }
            ConsoleCommand::Quit => break,
            ConsoleCommand::Interact => demo.interaction(Interaction::KeyDown),
        }
    }

    tracing::info!("👋 Shutting down chat bar demo");
    demo.shutdown().await;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_console_commands() {
        assert_eq!(ConsoleCommand::parse("next"), ConsoleCommand::Next);
        assert_eq!(ConsoleCommand::parse("  stop "), ConsoleCommand::Stop);
        assert_eq!(
            ConsoleCommand::parse("bg 2"),
            ConsoleCommand::Background(BackgroundRef::Index(2))
        );
        assert_eq!(
            ConsoleCommand::parse("bg imgs/x.jpg"),
            ConsoleCommand::Background(BackgroundRef::Url("imgs/x.jpg".into()))
        );
        assert_eq!(ConsoleCommand::parse("hello there"), ConsoleCommand::Interact);
        assert_eq!(ConsoleCommand::parse("next please"), ConsoleCommand::Interact);
    }

    #[test]
    fn missing_workflow_file_is_an_error() {
        let config = Config {
            workflows_file: Some("/definitely/not/here.json".into()),
            ..Config::default()
        };
        let err = load_registry(&config).unwrap_err();
        assert!(format!("{:#}", err).contains("Failed to read workflow file"));
    }
}
