//! Single-slot guard for destructive actions.
//!
//! At most one action waits for confirmation. A new request replaces the
//! waiting one, which is dropped without running.

use serde::Serialize;
use tracing::debug;

/// What the confirmation surface shows while an action is pending.
#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Prompt {
    pub title: String,
    pub message: String,
    pub confirm_label: String,
    pub show_cancel: bool,
}

impl Prompt {
    pub fn new(title: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            message: message.into(),
            confirm_label: "Confirm".to_string(),
            show_cancel: true,
        }
    }

    pub fn confirm_label(mut self, label: impl Into<String>) -> Self {
        self.confirm_label = label.into();
        self
    }

    pub fn without_cancel(mut self) -> Self {
        self.show_cancel = false;
        self
    }
}

pub struct ConfirmationGate<A> {
    pending: Option<(A, Prompt)>,
}

impl<A> Default for ConfirmationGate<A> {
    fn default() -> Self {
        Self { pending: None }
    }
}

impl<A> ConfirmationGate<A> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    pub fn pending(&self) -> Option<&Prompt> {
        self.pending.as_ref().map(|(_, prompt)| prompt)
    }

    pub fn pending_action(&self) -> Option<&A> {
        self.pending.as_ref().map(|(action, _)| action)
    }

    /// Returns the action this request displaced, which must not be run.
    pub fn request(&mut self, action: A, prompt: Prompt) -> Option<A> {
        debug!(title = %prompt.title, "confirmation requested");
        self.pending
            .replace((action, prompt))
            .map(|(displaced, _)| displaced)
    }

    /// Hands the pending action out exactly once and resets the gate.
    pub fn confirm(&mut self) -> Option<A> {
        self.pending.take().map(|(action, _)| action)
    }

    /// Confirms and runs the action in one step.
    pub fn confirm_with<R>(&mut self, run: impl FnOnce(A) -> R) -> Option<R> {
        self.confirm().map(run)
    }

    pub fn cancel(&mut self) {
        if self.pending.take().is_some() {
            debug!("confirmation cancelled");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use std::rc::Rc;

    type Action = Box<dyn FnOnce()>;

    fn counter_action(counter: &Rc<Cell<u32>>, by: u32) -> Action {
        let counter = counter.clone();
        Box::new(move || counter.set(counter.get() + by))
    }

    #[test]
    fn confirm_runs_action_once_then_idles() {
        let runs = Rc::new(Cell::new(0));
        let mut gate: ConfirmationGate<Action> = ConfirmationGate::new();
        gate.request(counter_action(&runs, 1), Prompt::new("Delete?", "Sure?"));
        assert!(gate.is_pending());
        gate.confirm_with(|action| action());
        assert_eq!(runs.get(), 1);
        assert!(!gate.is_pending());
        assert!(gate.confirm().is_none());
        assert_eq!(runs.get(), 1);
    }

    #[test]
    fn cancel_never_runs_action() {
        let runs = Rc::new(Cell::new(0));
        let mut gate: ConfirmationGate<Action> = ConfirmationGate::new();
        gate.request(counter_action(&runs, 1), Prompt::new("Delete?", "Sure?"));
        gate.cancel();
        assert!(gate.pending().is_none());
        gate.confirm_with(|action| action());
        assert_eq!(runs.get(), 0);
    }

    #[test]
    fn second_request_wins() {
        let runs = Rc::new(Cell::new(0));
        let mut gate: ConfirmationGate<Action> = ConfirmationGate::new();
        assert!(gate
            .request(counter_action(&runs, 1), Prompt::new("first", ""))
            .is_none());
        let displaced = gate.request(counter_action(&runs, 10), Prompt::new("second", ""));
        assert!(displaced.is_some());
        drop(displaced);
        assert_eq!(gate.pending().map(|p| p.title.as_str()), Some("second"));
        gate.confirm_with(|action| action());
        assert_eq!(runs.get(), 10);
    }

    #[test]
    fn prompt_builder_sets_labels() {
        let prompt = Prompt::new("Delete Note", "gone")
            .confirm_label("Delete")
            .without_cancel();
        assert_eq!(prompt.confirm_label, "Delete");
        assert!(!prompt.show_cancel);
    }
}
