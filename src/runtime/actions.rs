/// Action registry: step effects and their timing contract
///
/// Each step kind maps to one effect. An effect returns once its visible part is
/// done (text typed, pause elapsed, popup animation started), so the engine can
/// simply await it before moving on. Missing collaborators turn an effect into a
/// no-op; nothing in here returns an error.

use crate::{
    config::TimingConfig,
    runtime::surface::Surfaces,
    workflow::types::{AlertOptions, BackgroundRef, Step, Tag, TextCard, Workflow},
};
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// Character typed to open the slash command menu
const SLASH_MARKER: char = '/';

/// Executes workflow steps against the configured surfaces
#[derive(Debug, Clone)]
pub struct ActionExecutor {
    /// Optional UI collaborators
    surfaces: Surfaces,
    /// Effect durations
    timing: TimingConfig,
}

impl ActionExecutor {
    pub fn new(surfaces: Surfaces, timing: TimingConfig) -> Self {
        Self { surfaces, timing }
    }

    pub fn timing(&self) -> &TimingConfig {
        &self.timing
    }

    /// Execute a single step of `workflow`
    ///
    /// Binds the step's parameters (falling back to the workflow's category and
    /// background where the step has none) and awaits the effect. Effects stop early
    /// at their internal checkpoints once `cancel` fires.
    pub async fn execute_step(&self, step: &Step, workflow: &Workflow, cancel: &CancellationToken) {
        tracing::debug!("▶️ {} :: {}", workflow.name, step.kind());

        match step {
            Step::Clear => self.clear_input(),
            Step::Type { text } => self.type_text(text, cancel).await,
            Step::Pause { duration } => {
                self.pause(Duration::from_millis(duration.unwrap_or(0)), cancel).await;
            }
            Step::SlashSelect { index, icon, label } => {
                self.slash_select(*index, icon, label, cancel).await
            }
            Step::InsertTag { icon, label } => self.insert_tag(icon, label),
            Step::OpenPopup { popup_id, trigger_selector } => {
                self.open_popup(popup_id, trigger_selector, cancel).await
            }
            Step::CloseAllPopups => self.close_popups(),
            Step::Send => self.send(&workflow.name, cancel),
            Step::SetStatus { text } => self.set_status(text),
            Step::ClearStatus => self.clear_status(),
            Step::SetCategory { text } => {
                let text = text.as_deref().or(workflow.category.as_deref());
                self.set_category(text, cancel).await
            }
            Step::SetBackground { image } => {
                let image = image.as_ref().or(workflow.background.as_ref());
                self.set_background(image, cancel).await
            }
            Step::NextBackground => self.next_background(cancel).await,
            Step::ShowAlert { options } => self.show_alert(options, cancel).await,
            Step::HideAlerts => self.hide_alerts(cancel).await,
            Step::ShowOutput { lines } => self.show_output(*lines),
            Step::HideOutput => self.hide_output_now(),
            Step::Cleanup => self.cleanup(false, cancel).await,
            Step::FullCleanup => self.cleanup(true, cancel).await,
            Step::Unknown => {
                tracing::warn!("⏭️ Skipping unknown action in workflow '{}'", workflow.name);
            }
        }
    }

    /// Sleep for `duration` unless cancelled first; returns whether it ran to the end
    pub async fn pause(&self, duration: Duration, cancel: &CancellationToken) -> bool {
        if duration.is_zero() {
            return !cancel.is_cancelled();
        }
        tokio::select! {
            biased;
            _ = cancel.cancelled() => false,
            _ = tokio::time::sleep(duration) => true,
        }
    }

    /// Hand the background rotation to the background surface
    pub fn prepare(&self, backgrounds: &[String]) {
        if backgrounds.is_empty() {
            return;
        }
        if let Some(background) = &self.surfaces.background {
            background.configure(backgrounds);
        }
    }

    /// Reset input, popups, status, alerts and output before a workflow
    ///
    /// `full` dismisses alerts without their exit animation.
    pub async fn cleanup(&self, full: bool, cancel: &CancellationToken) {
        self.clear_input();
        self.close_popups();
        self.hide_output_now();
        self.clear_status();
        if let Some(alerts) = &self.surfaces.alerts {
            alerts.hide_all(full);
        }
        self.pause(ms(self.timing.cleanup_settle_ms), cancel).await;
    }

    /// Hide the text card and any chart under it, without waiting
    pub fn hide_output_now(&self) {
        if let Some(output) = &self.surfaces.output {
            output.hide_text_card();
            output.hide_visualization();
        }
    }

    pub async fn set_background(&self, image: Option<&BackgroundRef>, cancel: &CancellationToken) {
        match (&self.surfaces.background, image) {
            (Some(background), Some(image)) => background.set(image),
            (None, _) => skipped("setBackground"),
            (Some(_), None) => tracing::debug!("🖼️ No background for this step, keeping current"),
        }
        self.pause(ms(self.timing.background_settle_ms), cancel).await;
    }

    pub async fn next_background(&self, cancel: &CancellationToken) {
        match &self.surfaces.background {
            Some(background) => background.next(),
            None => skipped("nextBackground"),
        }
        self.pause(ms(self.timing.background_settle_ms), cancel).await;
    }

    fn clear_input(&self) {
        if let Some(input) = &self.surfaces.input {
            input.clear();
        }
    }

    async fn type_text(&self, text: &str, cancel: &CancellationToken) {
        let Some(input) = &self.surfaces.input else {
            return skipped("type");
        };

        for c in text.chars() {
            if cancel.is_cancelled() {
                tracing::debug!("✂️ Typing interrupted");
                return;
            }
            input.push_char(c);
            if !self.pause(self.timing.typing_interval(), cancel).await {
                tracing::debug!("✂️ Typing interrupted");
                return;
            }
        }
    }

    async fn slash_select(&self, index: usize, icon: &str, label: &str, cancel: &CancellationToken) {
        let Some(input) = &self.surfaces.input else {
            return skipped("slashSelect");
        };

        input.push_char(SLASH_MARKER);
        let popups = self.surfaces.popups.as_ref();
        let items = popups.map(|popups| popups.show_slash_menu());
        if items.is_some_and(|items| index >= items) {
            tracing::debug!("🔎 Slash item {} out of range, nothing selected", index);
            return;
        }

        // let the menu sit on screen before "choosing"
        if !self.pause(ms(self.timing.slash_dwell_ms), cancel).await {
            return;
        }
        let Some(popups) = popups else {
            return skipped("slashSelect popup");
        };
        if !popups.highlight_slash_item(index) {
            tracing::debug!("🔎 Slash menu closed before item {} was highlighted", index);
            return;
        }

        if !self.pause(ms(self.timing.slash_highlight_ms), cancel).await {
            return;
        }
        input.remove_trailing(SLASH_MARKER);
        input.insert_tag(Tag {
            icon: icon.to_string(),
            label: label.to_string(),
        });
        popups.close_all();
    }

    fn insert_tag(&self, icon: &str, label: &str) {
        match &self.surfaces.input {
            Some(input) => input.insert_tag(Tag {
                icon: icon.to_string(),
                label: label.to_string(),
            }),
            None => skipped("insertTag"),
        }
    }

    async fn open_popup(&self, popup_id: &str, trigger: &str, cancel: &CancellationToken) {
        let opened = self
            .surfaces
            .popups
            .as_ref()
            .is_some_and(|popups| popups.open(popup_id, trigger));
        if !opened {
            tracing::debug!("🪟 Popup '{}' not opened (trigger '{}')", popup_id, trigger);
        }
        self.pause(ms(self.timing.popup_settle_ms), cancel).await;
    }

    fn close_popups(&self) {
        if let Some(popups) = &self.surfaces.popups {
            popups.close_all();
        }
    }

    /// Present the mock response for the current input
    ///
    /// Returns immediately. The chart is shown once the text card reports that its
    /// animation finished, unless the run has been cancelled by then.
    fn send(&self, workflow_name: &str, cancel: &CancellationToken) {
        let (Some(input), Some(output)) = (&self.surfaces.input, &self.surfaces.output) else {
            return skipped("send");
        };

        let prompt = input.text().trim().to_string();
        if prompt.is_empty() {
            tracing::debug!("📭 Nothing to send");
            return;
        }

        let card_done = output.show_text_card(TextCard {
            prompt,
            lines: self.timing.default_output_lines,
        });
        input.clear();

        let output = output.clone();
        let cancel = cancel.clone();
        let workflow_name = workflow_name.to_string();
        tokio::spawn(async move {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    tracing::debug!("🚫 Run stopped before chart for '{}'", workflow_name);
                }
                done = card_done => {
                    if done.is_ok() {
                        output.show_visualization(&workflow_name);
                    }
                }
            }
        });
    }

    fn set_status(&self, text: &str) {
        match &self.surfaces.status {
            Some(status) => status.set_action(text),
            None => skipped("setStatus"),
        }
    }

    fn clear_status(&self) {
        if let Some(status) = &self.surfaces.status {
            status.clear_action();
        }
    }

    async fn set_category(&self, text: Option<&str>, cancel: &CancellationToken) {
        match (&self.surfaces.status, text) {
            (Some(status), Some(text)) => status.set_category(text),
            (None, _) => skipped("setCategory"),
            (Some(_), None) => tracing::debug!("🗂️ No category for this step"),
        }
        self.pause(ms(self.timing.category_settle_ms), cancel).await;
    }

    async fn show_alert(&self, options: &AlertOptions, cancel: &CancellationToken) {
        match &self.surfaces.alerts {
            Some(alerts) => alerts.show(options),
            None => skipped("showAlert"),
        }
        self.pause(ms(self.timing.alert_settle_ms), cancel).await;
    }

    async fn hide_alerts(&self, cancel: &CancellationToken) {
        match &self.surfaces.alerts {
            Some(alerts) => alerts.hide_all(false),
            None => skipped("hideAlerts"),
        }
        self.pause(ms(self.timing.alert_settle_ms), cancel).await;
    }

    fn show_output(&self, lines: Option<u32>) {
        let Some(output) = &self.surfaces.output else {
            return skipped("showOutput");
        };
        let prompt = self
            .surfaces
            .input
            .as_ref()
            .map(|input| input.text().trim().to_string())
            .unwrap_or_default();
        // nothing downstream waits on the plain output card
        let _ = output.show_text_card(TextCard {
            prompt,
            lines: lines.unwrap_or(self.timing.default_output_lines),
        });
    }
}

fn ms(millis: u64) -> Duration {
    Duration::from_millis(millis)
}

fn skipped(action: &str) {
    tracing::debug!("🫥 No surface for '{}', skipping", action);
}
