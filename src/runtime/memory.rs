/// In-process chat bar surface
///
/// Implements every collaborator trait against plain in-memory state and logs each
/// visible change through tracing. Drives the console demo and the tests.

use crate::runtime::surface::{
    AlertSurface, BackgroundSurface, InputBuffer, OutputSurface, PopupSurface, StatusBar,
};
use crate::workflow::types::{AlertOptions, BackgroundRef, Tag, TextCard};
use std::{
    collections::HashSet,
    sync::{Arc, Mutex, MutexGuard, PoisonError, Weak},
    time::Duration,
};
use tokio::sync::oneshot;

/// Alerts kept visible per position before the oldest is force-hidden
const MAX_ALERTS_PER_POSITION: usize = 3;

/// Popups rendered by the chat bar markup
const DEFAULT_POPUPS: [&str; 4] = ["add-popup", "mode-popup", "context-popup", "attach-popup"];

/// A piece of the input buffer
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputSegment {
    Text(String),
    Tag(Tag),
}

/// An alert currently on screen
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VisibleAlert {
    pub id: u64,
    pub options: AlertOptions,
}

/// How the last `hide_all` dismissed the alerts
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AlertDismissal {
    /// Exit animation played
    Animated,
    /// Removed without animation (full cleanup)
    Immediate,
}

/// Observable state of the surface at one point in time
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SurfaceSnapshot {
    pub input: Vec<InputSegment>,
    pub category: Option<String>,
    pub action: Option<String>,
    pub background: Option<String>,
    pub open_popup: Option<String>,
    pub slash_menu_open: bool,
    pub highlighted_item: Option<usize>,
    pub alerts: Vec<VisibleAlert>,
    pub last_alert_dismissal: Option<AlertDismissal>,
    pub text_card: Option<TextCard>,
    pub visualization: Option<String>,
}

#[derive(Debug, Default)]
struct MemoryState {
    view: SurfaceSnapshot,
    rotation: Vec<String>,
    rotation_index: usize,
    popups: HashSet<String>,
    slash_items: Vec<Tag>,
    next_alert_id: u64,
}

/// In-memory implementation of every chat bar collaborator
#[derive(Debug)]
pub struct MemorySurface {
    state: Arc<Mutex<MemoryState>>,
}

impl Default for MemorySurface {
    fn default() -> Self {
        Self::new()
    }
}

impl MemorySurface {
    pub fn new() -> Self {
        let state = MemoryState {
            popups: DEFAULT_POPUPS.iter().map(|id| id.to_string()).collect(),
            slash_items: default_slash_items(),
            ..MemoryState::default()
        };
        Self {
            state: Arc::new(Mutex::new(state)),
        }
    }

    /// Replace the slash menu entries
    pub fn with_slash_items(self, items: Vec<Tag>) -> Self {
        self.state().slash_items = items;
        self
    }

    pub fn snapshot(&self) -> SurfaceSnapshot {
        self.state().view.clone()
    }

    pub fn input_text(&self) -> String {
        render_input(&self.state().view.input)
    }

    pub fn background(&self) -> Option<String> {
        self.state().view.background.clone()
    }

    /// How long a text card takes to finish animating
    ///
    /// Sources appear after 300ms, text lines start 2000ms later and each line
    /// takes another 80ms.
    pub fn text_card_duration(lines: u32) -> Duration {
        Duration::from_millis(300 + 2000 + u64::from(lines) * 80)
    }

    fn state(&self) -> MutexGuard<'_, MemoryState> {
        lock(&self.state)
    }
}

fn lock(state: &Mutex<MemoryState>) -> MutexGuard<'_, MemoryState> {
    state.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Resolve `background` against the rotation and make it current
fn apply_background(state: &mut MemoryState, background: &BackgroundRef) {
    let url = match background {
        BackgroundRef::Url(url) => url.clone(),
        BackgroundRef::Index(index) => {
            if state.rotation.is_empty() {
                tracing::warn!("⚠️ Background index {} requested with no rotation configured", index);
                return;
            }
            state.rotation_index = index % state.rotation.len();
            state.rotation[state.rotation_index].clone()
        }
    };
    tracing::info!("🖼️ Background: {}", url);
    state.view.background = Some(url);
}

/// Remove alert `id` after `delay`, unless it is already gone or the surface was dropped
fn schedule_auto_hide(state: Weak<Mutex<MemoryState>>, id: u64, delay: Duration) {
    let Ok(handle) = tokio::runtime::Handle::try_current() else {
        tracing::debug!("No runtime, alert {} stays until dismissed", id);
        return;
    };
    handle.spawn(async move {
        tokio::time::sleep(delay).await;
        if let Some(state) = state.upgrade() {
            lock(&state).view.alerts.retain(|alert| alert.id != id);
        }
    });
}

fn default_slash_items() -> Vec<Tag> {
    [
        ("checkroom", "Running Shoes"),
        ("checkroom", "Outdoor Apparel"),
        ("child_care", "Baby Products"),
        ("storefront", "Retail Partners"),
        ("public", "Regional Markets"),
    ]
    .into_iter()
    .map(|(icon, label)| Tag {
        icon: icon.to_string(),
        label: label.to_string(),
    })
    .collect()
}

fn render_input(segments: &[InputSegment]) -> String {
    segments
        .iter()
        .map(|segment| match segment {
            InputSegment::Text(text) => text.as_str(),
            InputSegment::Tag(tag) => tag.label.as_str(),
        })
        .collect()
}

impl InputBuffer for MemorySurface {
    fn clear(&self) {
        self.state().view.input.clear();
    }

    fn push_char(&self, c: char) {
        let mut state = self.state();
        match state.view.input.last_mut() {
            Some(InputSegment::Text(text)) => text.push(c),
            _ => state.view.input.push(InputSegment::Text(c.to_string())),
        }
    }

    fn remove_trailing(&self, marker: char) -> bool {
        let mut state = self.state();
        let input = &mut state.view.input;
        let Some(InputSegment::Text(text)) = input.last_mut() else {
            return false;
        };
        if !text.ends_with(marker) {
            return false;
        }
        text.pop();
        if text.is_empty() {
            input.pop();
        }
        true
    }

    fn insert_tag(&self, tag: Tag) {
        tracing::debug!("🏷️ Inserted tag: {} ({})", tag.label, tag.icon);
        self.state().view.input.push(InputSegment::Tag(tag));
    }

    fn text(&self) -> String {
        self.input_text()
    }
}

impl StatusBar for MemorySurface {
    fn set_category(&self, text: &str) {
        tracing::info!("🗂️ Category: {}", text);
        self.state().view.category = Some(text.to_string());
    }

    fn set_action(&self, text: &str) {
        tracing::info!("💬 Status: {}", text);
        self.state().view.action = (!text.is_empty()).then(|| text.to_string());
    }

    fn clear_action(&self) {
        self.state().view.action = None;
    }
}

impl BackgroundSurface for MemorySurface {
    fn configure(&self, images: &[String]) {
        let mut state = self.state();
        state.rotation = images.to_vec();
        state.rotation_index = 0;
    }

    fn set(&self, background: &BackgroundRef) {
        apply_background(&mut self.state(), background);
    }

    fn next(&self) {
        let mut state = self.state();
        if state.rotation.is_empty() {
            return;
        }
        let next_index = (state.rotation_index + 1) % state.rotation.len();
        apply_background(&mut state, &BackgroundRef::Index(next_index));
    }
}

impl PopupSurface for MemorySurface {
    fn open(&self, popup_id: &str, trigger: &str) -> bool {
        let mut state = self.state();
        if trigger.is_empty() || !state.popups.contains(popup_id) {
            return false;
        }
        state.view.slash_menu_open = false;
        state.view.highlighted_item = None;
        state.view.open_popup = Some(popup_id.to_string());
        true
    }

    fn close_all(&self) {
        let mut state = self.state();
        state.view.open_popup = None;
        state.view.slash_menu_open = false;
        state.view.highlighted_item = None;
    }

    fn show_slash_menu(&self) -> usize {
        let mut state = self.state();
        state.view.open_popup = None;
        state.view.slash_menu_open = true;
        state.view.highlighted_item = None;
        state.slash_items.len()
    }

    fn highlight_slash_item(&self, index: usize) -> bool {
        let mut state = self.state();
        if !state.view.slash_menu_open || index >= state.slash_items.len() {
            return false;
        }
        state.view.highlighted_item = Some(index);
        true
    }
}

impl AlertSurface for MemorySurface {
    fn show(&self, options: &AlertOptions) {
        tracing::info!("🔔 Alert: {} ({:?}, {:?})", options.title, options.kind, options.priority);
        let id = {
            let mut state = self.state();
            let id = state.next_alert_id;
            state.next_alert_id += 1;

            let alerts = &mut state.view.alerts;
            while alerts.iter().filter(|a| a.options.position == options.position).count()
                >= MAX_ALERTS_PER_POSITION
            {
                if let Some(oldest) = alerts.iter().position(|a| a.options.position == options.position) {
                    alerts.remove(oldest);
                }
            }
            alerts.push(VisibleAlert {
                id,
                options: options.clone(),
            });
            id
        };

        if options.auto_hide_ms > 0 {
            schedule_auto_hide(
                Arc::downgrade(&self.state),
                id,
                Duration::from_millis(options.auto_hide_ms),
            );
        }
    }

    fn hide_all(&self, immediate: bool) {
        let mut state = self.state();
        state.view.alerts.clear();
        state.view.last_alert_dismissal = Some(if immediate {
            AlertDismissal::Immediate
        } else {
            AlertDismissal::Animated
        });
    }
}

impl OutputSurface for MemorySurface {
    fn show_text_card(&self, card: TextCard) -> oneshot::Receiver<()> {
        tracing::info!("📝 Text card: \"{}\" ({} lines)", card.prompt, card.lines);
        let duration = Self::text_card_duration(card.lines);
        {
            let mut state = self.state();
            state.view.visualization = None;
            state.view.text_card = Some(card);
        }

        let (done_tx, done_rx) = oneshot::channel();
        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                handle.spawn(async move {
                    tokio::time::sleep(duration).await;
                    let _ = done_tx.send(());
                });
            }
            Err(_) => {
                let _ = done_tx.send(());
            }
        }
        done_rx
    }

    fn hide_text_card(&self) {
        self.state().view.text_card = None;
    }

    fn show_visualization(&self, workflow_name: &str) {
        tracing::info!("📊 Visualization for: {}", workflow_name);
        self.state().view.visualization = Some(workflow_name.to_string());
    }

    fn hide_visualization(&self) {
        self.state().view.visualization = None;
    }
}
