/// Chatbar: scripted demo engine for a decorative chat bar widget
///
/// This library plays pre-authored, timed workflows (typing, slash-command selection,
/// status text, backgrounds, mock AI output) against a set of UI collaborators, looping
/// forever and stopping cooperatively when asked.

// Core configuration and setup
pub mod config;

// Workflow definition layer - steps, workflows and the ordered registry
pub mod workflow;

// Runtime execution engine - action effects, looping engine and idle detection
pub mod runtime;

// Demo wiring and console driver
pub mod demo;

// Re-export commonly used types for external consumers
pub use demo::{run_console, ChatBarDemo};
pub use runtime::{ActionExecutor, IdleDetector, Interaction, MemorySurface, Surfaces, WorkflowEngine};
pub use workflow::{Step, Workflow, WorkflowRegistry};
