//! chainwatch - chain inspection line watcher.
//!
//! Watches up to four camera feeds (or a substitute looping video file) on a
//! chain-inspection line, runs an object detector on every polling tick, and
//! halts the line when a defect is found. The detector and the capture
//! backends are external capabilities behind narrow traits; this crate owns
//! the frame-acquisition / detection-gating state machine.
//!
//! # Module structure
//!
//! - `frame`: owned RGB frame with deep-copy semantics
//! - `ingest`: capture seams (`Capture`, `CaptureProvider`) and backends
//! - `detect`: detector seam (`Detector`, `Detections`) and stubs
//! - `source`: per-slot `FrameSource` (open/read/pause/resume/close)
//! - `gate`: the `DetectionGate` state machine driven one `tick()` at a time
//! - `aggregate`: per-slot and cross-slot defect summaries
//! - `controller`: operator verbs with per-state enablement
//! - `session`, `signal`, `storage`, `scheduler`, `ui`, `config`

pub mod aggregate;
pub mod config;
pub mod controller;
pub mod detect;
pub mod frame;
pub mod gate;
pub mod ingest;
pub mod scheduler;
pub mod session;
pub mod signal;
pub mod source;
pub mod storage;
pub mod ui;

pub use aggregate::{combine, summarize, ClassStats, DefectSummary};
pub use config::ChainwatchConfig;
pub use controller::{action_enabled, Action, ActionController, SaveReport};
pub use detect::{
    display_label, DetectedBox, Detections, Detector, ScriptedDetector, StubDetector,
    DEFAULT_CONF_THRESHOLD,
};
pub use frame::Frame;
pub use gate::{DetectionGate, GateState};
pub use ingest::{
    Capture, CaptureProvider, CaptureSettings, FileCapture, ScriptedCapture, StubProvider,
    SyntheticCapture, SystemProvider,
};
pub use scheduler::PollTimer;
pub use session::Session;
pub use signal::{CountingSignal, NoopSignal, SignalLine, SysfsGpioSignal, PULSE_HOLD};
pub use source::{FrameSource, SlotStatus, SourceKind, SLOT_COUNT};
pub use ui::{LogPresenter, MessageKind, Presenter, RecordingPresenter};
