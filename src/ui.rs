//! Presentation seam.
//!
//! The core needs exactly three things from a front end: display an image for
//! a slot, show a message to the operator, and gate which actions are
//! enabled. `Presenter` captures that; the desktop shell implements it, and
//! `LogPresenter` keeps a headless daemon observable.

use crate::controller::Action;
use crate::frame::Frame;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MessageKind {
    Info,
    Warning,
    Error,
}

pub trait Presenter: Send + Sync {
    /// Display a frame for a slot (plain or annotated, caller's choice).
    fn show_frame(&self, slot: usize, frame: &Frame);

    /// Surface a message to the operator.
    fn show_message(&self, kind: MessageKind, text: &str);

    /// Enable or disable an operator action.
    fn set_action_enabled(&self, action: Action, enabled: bool);
}

/// Headless presenter: everything goes to the log.
pub struct LogPresenter;

impl Presenter for LogPresenter {
    fn show_frame(&self, slot: usize, frame: &Frame) {
        log::trace!(
            "display slot {}: {}x{} frame",
            slot,
            frame.width(),
            frame.height()
        );
    }

    fn show_message(&self, kind: MessageKind, text: &str) {
        match kind {
            MessageKind::Info => log::info!("operator message: {text}"),
            MessageKind::Warning => log::warn!("operator message: {text}"),
            MessageKind::Error => log::error!("operator message: {text}"),
        }
    }

    fn set_action_enabled(&self, action: Action, enabled: bool) {
        log::debug!("action {:?} enabled={}", action, enabled);
    }
}

/// Records everything it is shown. For tests.
#[derive(Default)]
pub struct RecordingPresenter {
    inner: std::sync::Mutex<Recorded>,
}

#[derive(Default)]
struct Recorded {
    frames: Vec<(usize, [u8; 32])>,
    messages: Vec<(MessageKind, String)>,
    actions: std::collections::BTreeMap<&'static str, bool>,
}

impl RecordingPresenter {
    pub fn new() -> Self {
        Self::default()
    }

    /// (slot, frame content hash) pairs in display order.
    pub fn frames(&self) -> Vec<(usize, [u8; 32])> {
        self.inner.lock().expect("presenter lock").frames.clone()
    }

    pub fn messages(&self) -> Vec<(MessageKind, String)> {
        self.inner.lock().expect("presenter lock").messages.clone()
    }

    pub fn action_enabled(&self, action: Action) -> bool {
        *self
            .inner
            .lock()
            .expect("presenter lock")
            .actions
            .get(action.name())
            .unwrap_or(&false)
    }
}

impl Presenter for RecordingPresenter {
    fn show_frame(&self, slot: usize, frame: &Frame) {
        self.inner
            .lock()
            .expect("presenter lock")
            .frames
            .push((slot, frame.content_hash()));
    }

    fn show_message(&self, kind: MessageKind, text: &str) {
        self.inner
            .lock()
            .expect("presenter lock")
            .messages
            .push((kind, text.to_string()));
    }

    fn set_action_enabled(&self, action: Action, enabled: bool) {
        self.inner
            .lock()
            .expect("presenter lock")
            .actions
            .insert(action.name(), enabled);
    }
}
