//! Batch processing of selected archives.
//!
//! [`InstallSettings`] describe one batch, [`BatchOrchestrator`] runs it and
//! reports through [`BatchEvent`]s, and the outcome is a [`BatchReport`].
//! Front ends normally call [`spawn_batch`] so the work runs off their own
//! thread.

pub mod events;
pub mod orchestrator;
pub mod result;
pub mod settings;

pub use events::{BatchEvent, EventSink, NullSink, PipelineStage};
pub use orchestrator::{spawn_batch, BatchOrchestrator, WorkItem, WorkSource, MAX_PACK_DEPTH};
pub use result::{BatchReport, ItemResult, PostProcessing, SkipReason};
pub use settings::{InstallSettings, NO_INPUTS_ISSUE};
