/// Ordered workflow registry
///
/// Holds the demo workflows in play order together with the background rotation
/// they are shown against. Built once at startup and read-only afterwards, so clones
/// share the same Arc-wrapped list.

use crate::workflow::types::Workflow;
use anyhow::{Context, Result};
use serde::Deserialize;
use std::{collections::HashSet, path::Path, sync::Arc};

/// Immutable, validated list of workflows
#[derive(Debug, Clone)]
pub struct WorkflowRegistry {
    /// Workflows in play order
    workflows: Arc<[Workflow]>,
    /// Background images the rotation cycles through
    backgrounds: Arc<[String]>,
}

/// On-disk shape of a workflow definitions file
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum WorkflowFile {
    Full {
        workflows: Vec<Workflow>,
        #[serde(default)]
        backgrounds: Vec<String>,
    },
    Bare(Vec<Workflow>),
}

impl WorkflowRegistry {
    /// Build a registry, rejecting empty lists and blank or duplicate names
    pub fn new(workflows: Vec<Workflow>, backgrounds: Vec<String>) -> Result<Self> {
        if workflows.is_empty() {
            return Err(anyhow::anyhow!("Workflow registry needs at least one workflow"));
        }

        let mut seen = HashSet::new();
        for workflow in &workflows {
            if workflow.name.trim().is_empty() {
                return Err(anyhow::anyhow!("Workflow names must not be empty"));
            }
            if !seen.insert(workflow.name.as_str()) {
                return Err(anyhow::anyhow!("Duplicate workflow name: {}", workflow.name));
            }
        }

        tracing::debug!(
            "📋 Registered {} workflows with {} background images",
            workflows.len(),
            backgrounds.len()
        );

        Ok(Self {
            workflows: workflows.into(),
            backgrounds: backgrounds.into(),
        })
    }

    /// Parse a JSON definitions document
    ///
    /// Accepts either a bare array of workflows or an object with `workflows`
    /// and an optional `backgrounds` rotation.
    pub fn from_json(json: &str) -> Result<Self> {
        let file: WorkflowFile = serde_json::from_str(json)
            .map_err(|e| anyhow::anyhow!("Invalid workflow definitions: {}", e))?;

        match file {
            WorkflowFile::Full { workflows, backgrounds } => Self::new(workflows, backgrounds),
            WorkflowFile::Bare(workflows) => Self::new(workflows, Vec::new()),
        }
    }

    /// Load a JSON definitions file from disk
    pub fn load_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        tracing::info!("📥 Loading workflows from {}", path.display());
        let json = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read workflow file {}", path.display()))?;
        Self::from_json(&json).with_context(|| format!("Failed to load {}", path.display()))
    }

    pub fn len(&self) -> usize {
        self.workflows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.workflows.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Workflow> {
        self.workflows.get(index)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Workflow> {
        self.workflows.iter()
    }

    pub fn names(&self) -> Vec<&str> {
        self.workflows.iter().map(|workflow| workflow.name.as_str()).collect()
    }

    pub fn backgrounds(&self) -> &[String] {
        &self.backgrounds
    }
}
