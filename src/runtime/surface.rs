/// UI collaborator boundary
///
/// The engine never touches UI state directly. Every visible change goes through one of
/// these narrow traits, and each collaborator is optional: an absent surface turns the
/// effects that need it into silent no-ops instead of errors.

use crate::workflow::types::{AlertOptions, BackgroundRef, Tag, TextCard};
use std::sync::Arc;
use tokio::sync::oneshot;

/// The shared input text buffer
pub trait InputBuffer: Send + Sync {
    /// Remove all text and tags
    fn clear(&self);
    /// Append a single typed character
    fn push_char(&self, c: char);
    /// Remove the most recent `marker` if it is the last thing in the buffer
    fn remove_trailing(&self, marker: char) -> bool;
    /// Append an icon + label chip
    fn insert_tag(&self, tag: Tag);
    /// Visible text content, tags rendered by label
    fn text(&self) -> String;
}

/// Category and action labels under the chat bar
pub trait StatusBar: Send + Sync {
    fn set_category(&self, text: &str);
    fn set_action(&self, text: &str);
    fn clear_action(&self);
}

/// Crossfading background behind the widget
pub trait BackgroundSurface: Send + Sync {
    /// Replace the rotation used by index-based backgrounds
    fn configure(&self, images: &[String]);
    fn set(&self, background: &BackgroundRef);
    /// Advance the rotation, wrapping at the end
    fn next(&self);
}

/// Popups and the slash command menu
pub trait PopupSurface: Send + Sync {
    /// Open a popup anchored at `trigger`; false when either is missing
    fn open(&self, popup_id: &str, trigger: &str) -> bool;
    fn close_all(&self);
    /// Show the slash menu next to the input, returning its item count
    fn show_slash_menu(&self) -> usize;
    /// Highlight a slash menu item; false when `index` is out of range
    fn highlight_slash_item(&self, index: usize) -> bool;
}

/// Transient notifications
pub trait AlertSurface: Send + Sync {
    fn show(&self, options: &AlertOptions);
    /// Dismiss every alert, skipping the exit animation when `immediate`
    fn hide_all(&self, immediate: bool);
}

/// Mock AI response: text card first, chart afterwards
pub trait OutputSurface: Send + Sync {
    /// Present a text card; the receiver fires once its text animation has finished
    fn show_text_card(&self, card: TextCard) -> oneshot::Receiver<()>;
    fn hide_text_card(&self);
    /// Present the chart matching a workflow
    fn show_visualization(&self, workflow_name: &str);
    fn hide_visualization(&self);
}

/// The set of collaborators available to effects
#[derive(Clone, Default)]
pub struct Surfaces {
    pub input: Option<Arc<dyn InputBuffer>>,
    pub status: Option<Arc<dyn StatusBar>>,
    pub background: Option<Arc<dyn BackgroundSurface>>,
    pub popups: Option<Arc<dyn PopupSurface>>,
    pub alerts: Option<Arc<dyn AlertSurface>>,
    pub output: Option<Arc<dyn OutputSurface>>,
}

impl Surfaces {
    /// No collaborators at all; every effect degrades to a timed no-op
    pub fn empty() -> Self {
        Self::default()
    }

    /// Use one object for every collaborator
    pub fn all<S>(surface: Arc<S>) -> Self
    where
        S: InputBuffer + StatusBar + BackgroundSurface + PopupSurface + AlertSurface + OutputSurface + 'static,
    {
        Self {
            input: Some(surface.clone() as Arc<dyn InputBuffer>),
            status: Some(surface.clone() as Arc<dyn StatusBar>),
            background: Some(surface.clone() as Arc<dyn BackgroundSurface>),
            popups: Some(surface.clone() as Arc<dyn PopupSurface>),
            alerts: Some(surface.clone() as Arc<dyn AlertSurface>),
            output: Some(surface as Arc<dyn OutputSurface>),
        }
    }

    pub fn with_input(mut self, input: Arc<dyn InputBuffer>) -> Self {
        self.input = Some(input);
        self
    }

    pub fn with_status(mut self, status: Arc<dyn StatusBar>) -> Self {
        self.status = Some(status);
        self
    }

    pub fn with_background(mut self, background: Arc<dyn BackgroundSurface>) -> Self {
        self.background = Some(background);
        self
    }

    pub fn with_popups(mut self, popups: Arc<dyn PopupSurface>) -> Self {
        self.popups = Some(popups);
        self
    }

    pub fn with_alerts(mut self, alerts: Arc<dyn AlertSurface>) -> Self {
        self.alerts = Some(alerts);
        self
    }

    pub fn with_output(mut self, output: Arc<dyn OutputSurface>) -> Self {
        self.output = Some(output);
        self
    }
}

impl std::fmt::Debug for Surfaces {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Surfaces")
            .field("input", &self.input.is_some())
            .field("status", &self.status.is_some())
            .field("background", &self.background.is_some())
            .field("popups", &self.popups.is_some())
            .field("alerts", &self.alerts.is_some())
            .field("output", &self.output.is_some())
            .finish()
    }
}
