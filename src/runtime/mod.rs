/// Runtime Execution Engine
///
/// This module plays workflows against the UI collaborators. It handles:
/// - The collaborator traits the engine talks through
/// - Step effects and their timing (the action registry)
/// - Ordered, looping, cancellable workflow execution
/// - Idle detection that pauses the demo while the user is active

// UI collaborator traits
pub mod surface;

// In-memory collaborator implementation
pub mod memory;

// Step effects
pub mod actions;

// Looping workflow engine
pub mod engine;

// Interaction-driven stop/restart
pub mod idle;

// Re-export main types
pub use actions::ActionExecutor;
pub use engine::{EngineEvent, EngineEventKind, EngineOptions, EngineSnapshot, WorkflowEngine};
pub use idle::{IdleDetector, Interaction};
pub use memory::MemorySurface;
pub use surface::Surfaces;
