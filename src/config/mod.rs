/// Configuration management for the chat bar demo
///
/// Handles timing constants, the start policy and where workflow definitions come from.
/// Read once at construction; nothing re-reads it at runtime.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Main application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Timing constants for steps, workflows and effects
    pub timing: TimingConfig,
    /// Whether the demo loops regardless of user input or pauses while the user interacts
    pub policy: StartPolicy,
    /// Optional JSON file with workflow definitions (built-in set when None)
    pub workflows_file: Option<String>,
    /// Hide the output card as soon as the engine is stopped
    pub hide_output_on_stop: bool,
}

/// How the engine gets (re)started
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum StartPolicy {
    /// Start immediately and loop forever; interactions are ignored
    AutoLoop,
    /// Stop on every interaction and restart after the idle timeout
    PauseOnInteraction,
}

impl StartPolicy {
    fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "auto-loop" | "auto" | "loop" => Some(Self::AutoLoop),
            "pause-on-interaction" | "idle" => Some(Self::PauseOnInteraction),
            _ => None,
        }
    }
}

/// Timing constants, all in milliseconds
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TimingConfig {
    /// Quiet period after the last interaction before the demo restarts
    pub idle_timeout_ms: u64,
    /// Delay between typed characters
    pub typing_interval_ms: u64,
    /// Pause inserted after every non-instant step
    pub step_pause_ms: u64,
    /// Pause between workflows (half of it is also used after cleanup)
    pub workflow_pause_ms: u64,
    /// How long the slash menu stays open before an item is highlighted
    pub slash_dwell_ms: u64,
    /// How long the highlighted slash item is shown before the tag is inserted
    pub slash_highlight_ms: u64,
    /// Time for a popup open animation to get going
    pub popup_settle_ms: u64,
    /// Time for output/visualization hide animations during cleanup
    pub cleanup_settle_ms: u64,
    /// Time for a background crossfade to begin
    pub background_settle_ms: u64,
    /// Time for the category label slide to begin
    pub category_settle_ms: u64,
    /// Time for an alert entrance/exit to begin
    pub alert_settle_ms: u64,
    /// Skeleton line count for output cards that don't specify one
    pub default_output_lines: u32,
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            idle_timeout_ms: 2000,
            typing_interval_ms: 30,
            step_pause_ms: 400,
            workflow_pause_ms: 800,
            slash_dwell_ms: 600,
            slash_highlight_ms: 300,
            popup_settle_ms: 500,
            cleanup_settle_ms: 500,
            background_settle_ms: 200,
            category_settle_ms: 100,
            alert_settle_ms: 100,
            default_output_lines: 8,
        }
    }
}

impl TimingConfig {
    pub fn idle_timeout(&self) -> Duration {
        Duration::from_millis(self.idle_timeout_ms)
    }

    pub fn typing_interval(&self) -> Duration {
        Duration::from_millis(self.typing_interval_ms)
    }

    pub fn step_pause(&self) -> Duration {
        Duration::from_millis(self.step_pause_ms)
    }

    pub fn workflow_pause(&self) -> Duration {
        Duration::from_millis(self.workflow_pause_ms)
    }

    /// Settle pause after cleanup, before the first step of a workflow
    pub fn warmup_pause(&self) -> Duration {
        Duration::from_millis(self.workflow_pause_ms / 2)
    }
}

impl Default for Config {
    /// Default configuration with ENV_VAR support for embedding/container deployment
    fn default() -> Self {
        let defaults = TimingConfig::default();
        Self {
            timing: TimingConfig {
                idle_timeout_ms: env_millis("CHATBAR_IDLE_TIMEOUT_MS", defaults.idle_timeout_ms),
                typing_interval_ms: env_millis("CHATBAR_TYPING_INTERVAL_MS", defaults.typing_interval_ms),
                step_pause_ms: env_millis("CHATBAR_STEP_PAUSE_MS", defaults.step_pause_ms),
                workflow_pause_ms: env_millis("CHATBAR_WORKFLOW_PAUSE_MS", defaults.workflow_pause_ms),
                ..defaults
            },
            policy: std::env::var("CHATBAR_START_POLICY")
                .ok()
                .and_then(|value| StartPolicy::parse(&value))
                .unwrap_or(StartPolicy::AutoLoop),
            workflows_file: std::env::var("CHATBAR_WORKFLOWS_FILE").ok(),
            hide_output_on_stop: std::env::var("CHATBAR_HIDE_OUTPUT_ON_STOP")
                .ok()
                .and_then(|value| value.parse().ok())
                .unwrap_or(false),
        }
    }
}

fn env_millis(key: &str, fallback: u64) -> u64 {
    std::env::var(key)
        .ok()
        .and_then(|value| value.parse().ok())
        .unwrap_or(fallback)
}
