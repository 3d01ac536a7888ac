/// Core workflow type definitions
///
/// Workflows are plain data: an ordered list of steps plus the context values
/// (category label, background) that steps fall back to. They deserialize from the
/// same JSON shape the page scripts use (`{ "action": "type", "text": "..." }`).

use serde::{Deserialize, Serialize};

/// A named, ordered demo sequence
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Workflow {
    /// Display name, unique within a registry (also keys the mock chart)
    pub name: String,
    /// Category label used by `setCategory` steps that carry no text
    #[serde(default)]
    pub category: Option<String>,
    /// Background used by `setBackground` steps that carry no image
    #[serde(default)]
    pub background: Option<BackgroundRef>,
    /// Steps executed strictly in order
    pub steps: Vec<Step>,
}

impl Workflow {
    pub fn new(name: impl Into<String>, steps: Vec<Step>) -> Self {
        Self {
            name: name.into(),
            category: None,
            background: None,
            steps,
        }
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    pub fn with_background(mut self, background: impl Into<BackgroundRef>) -> Self {
        self.background = Some(background.into());
        self
    }
}

/// A background image, either by URL or by position in the configured rotation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum BackgroundRef {
    Index(usize),
    Url(String),
}

impl From<&str> for BackgroundRef {
    fn from(url: &str) -> Self {
        Self::Url(url.to_string())
    }
}

impl From<String> for BackgroundRef {
    fn from(url: String) -> Self {
        Self::Url(url)
    }
}

impl From<usize> for BackgroundRef {
    fn from(index: usize) -> Self {
        Self::Index(index)
    }
}

/// A single action invocation
///
/// One variant per action kind, each carrying exactly the parameters that kind binds.
/// Kinds this build does not know deserialize into `Unknown` and are skipped at runtime.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "camelCase")]
pub enum Step {
    /// Empty the input buffer
    Clear,
    /// Type text into the input buffer one character at a time
    Type { text: String },
    /// Wait for `duration` milliseconds (0 when absent)
    Pause {
        #[serde(default)]
        duration: Option<u64>,
    },
    /// Type "/", open the slash menu, pick item `index` and insert it as a tag
    SlashSelect {
        index: usize,
        icon: String,
        label: String,
    },
    /// Insert an icon + label chip into the input buffer
    InsertTag { icon: String, label: String },
    /// Open a popup next to the element matched by `trigger_selector`
    OpenPopup {
        #[serde(rename = "popupId")]
        popup_id: String,
        #[serde(rename = "triggerSelector")]
        trigger_selector: String,
    },
    CloseAllPopups,
    /// Submit the input as a fake message; the chart is keyed by the workflow name
    Send,
    /// Set the action label of the status bar
    SetStatus {
        #[serde(default)]
        text: String,
    },
    ClearStatus,
    /// Set the category label, falling back to the workflow's category
    SetCategory {
        #[serde(default)]
        text: Option<String>,
    },
    /// Swap the background, falling back to the workflow's background
    SetBackground {
        #[serde(default, rename = "imageUrl", alias = "image")]
        image: Option<BackgroundRef>,
    },
    NextBackground,
    ShowAlert {
        #[serde(default)]
        options: AlertOptions,
    },
    HideAlerts,
    /// Show the text output card for the current input
    ShowOutput {
        #[serde(default)]
        lines: Option<u32>,
    },
    /// Hide the output card and any visualization under it
    HideOutput,
    /// Reset input, popups, status and output surfaces
    Cleanup,
    /// `Cleanup` plus immediate dismissal of alerts
    FullCleanup,
    #[serde(other)]
    Unknown,
}

impl Step {
    /// Action name as written in workflow definitions
    pub fn kind(&self) -> &'static str {
        match self {
            Step::Clear => "clear",
            Step::Type { .. } => "type",
            Step::Pause { .. } => "pause",
            Step::SlashSelect { .. } => "slashSelect",
            Step::InsertTag { .. } => "insertTag",
            Step::OpenPopup { .. } => "openPopup",
            Step::CloseAllPopups => "closeAllPopups",
            Step::Send => "send",
            Step::SetStatus { .. } => "setStatus",
            Step::ClearStatus => "clearStatus",
            Step::SetCategory { .. } => "setCategory",
            Step::SetBackground { .. } => "setBackground",
            Step::NextBackground => "nextBackground",
            Step::ShowAlert { .. } => "showAlert",
            Step::HideAlerts => "hideAlerts",
            Step::ShowOutput { .. } => "showOutput",
            Step::HideOutput => "hideOutput",
            Step::Cleanup => "cleanup",
            Step::FullCleanup => "fullCleanup",
            Step::Unknown => "unknown",
        }
    }

    /// Kinds that encode their own timing and get no inter-step pause
    pub fn is_instant(&self) -> bool {
        matches!(
            self,
            Step::Pause { .. }
                | Step::SetBackground { .. }
                | Step::SetCategory { .. }
                | Step::SetStatus { .. }
                | Step::ClearStatus
                | Step::ShowAlert { .. }
                | Step::HideAlerts
        )
    }

    pub fn type_text(text: impl Into<String>) -> Self {
        Step::Type { text: text.into() }
    }

    pub fn pause(ms: u64) -> Self {
        Step::Pause { duration: Some(ms) }
    }

    pub fn status(text: impl Into<String>) -> Self {
        Step::SetStatus { text: text.into() }
    }

    pub fn slash_select(index: usize, icon: impl Into<String>, label: impl Into<String>) -> Self {
        Step::SlashSelect {
            index,
            icon: icon.into(),
            label: label.into(),
        }
    }
}

/// An icon + label chip rendered inside the input
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tag {
    pub icon: String,
    pub label: String,
}

/// Mock AI response card request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextCard {
    /// Prompt echoed at the top of the card
    pub prompt: String,
    /// Number of skeleton text lines to animate
    pub lines: u32,
}

/// Options bundle for a transient notification
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AlertOptions {
    #[serde(rename = "type")]
    pub kind: AlertKind,
    pub priority: AlertPriority,
    pub title: String,
    pub description: String,
    pub timestamp: String,
    pub position: AlertPosition,
    /// Auto-hide after this many milliseconds (0 disables auto-hide)
    #[serde(rename = "autoHide")]
    pub auto_hide_ms: u64,
}

impl Default for AlertOptions {
    fn default() -> Self {
        Self {
            kind: AlertKind::Update,
            priority: AlertPriority::Medium,
            title: "Alert Title".to_string(),
            description: "Alert description goes here.".to_string(),
            timestamp: "Just now".to_string(),
            position: AlertPosition::UnderChat,
            auto_hide_ms: 4000,
        }
    }
}

/// Type tag shown on an alert
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AlertKind {
    Update,
    Alert,
    Warning,
    Insight,
    Trend,
    Report,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AlertPriority {
    High,
    Medium,
    Low,
    Success,
}

/// Where an alert stack is anchored
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AlertPosition {
    UnderChat,
    TopRight,
    TopLeft,
    BottomRight,
    BottomLeft,
}
