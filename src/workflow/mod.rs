/// Workflow definition layer
///
/// This module holds the demo workflows as plain data:
/// - Type definitions (Workflow, Step, AlertOptions)
/// - The ordered, validated registry
/// - The built-in demo set

// Core workflow type definitions
pub mod types;

// Ordered registry with JSON loading
pub mod registry;

// Canned demo workflows
pub mod builtin;

// Re-export commonly used types
pub use registry::WorkflowRegistry;
pub use types::{AlertOptions, BackgroundRef, Step, Tag, TextCard, Workflow};
