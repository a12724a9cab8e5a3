//! Progress events emitted by the batch worker.
//!
//! The orchestrator never talks to a terminal or window directly. It sends
//! [`BatchEvent`]s through an [`EventSink`]; front ends render them however
//! they like. A `std::sync::mpsc::Sender` is a sink, so the usual setup is a
//! channel between the worker thread and the renderer.

use std::sync::mpsc::Sender;

use super::result::{BatchReport, ItemResult, PostProcessing};

/// Pipeline stages for progress reporting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineStage {
    /// Extracting a ZIP archive.
    Extracting,
    /// Running the external PTP converter.
    Converting,
    /// Deciding between a livery and a pack of archives.
    Classifying,
    /// Normalizing staged content.
    Reorganizing,
    /// Copying content into the package.
    Materializing,
    /// Rewriting the installed configuration.
    Configuring,
    /// Generating the content manifest.
    GeneratingLayout,
    /// Updating the package descriptor.
    UpdatingDescriptor,
    /// Removing scratch directories.
    Cleanup,
}

impl PipelineStage {
    /// Get a human-readable name for the stage.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Extracting => "Extracting",
            Self::Converting => "Converting",
            Self::Classifying => "Classifying",
            Self::Reorganizing => "Reorganizing",
            Self::Materializing => "Installing",
            Self::Configuring => "Configuring",
            Self::GeneratingLayout => "Generating layout",
            Self::UpdatingDescriptor => "Updating descriptor",
            Self::Cleanup => "Cleaning up",
        }
    }
}

/// Something the batch worker wants the front end to know.
#[derive(Debug, Clone)]
pub enum BatchEvent {
    /// Work on a top-level archive began.
    ArchiveStarted {
        index: usize,
        total: usize,
        name: String,
    },
    /// A work item entered a pipeline stage.
    Stage { item: String, stage: PipelineStage },
    /// Informational or warning text worth showing.
    Notice { message: String },
    /// A leaf livery finished, successfully or not.
    ItemFinished(ItemResult),
    /// Package-level post-processing outcome.
    PostProcessing(PostProcessing),
    /// The batch is complete.
    Finished(BatchReport),
}

/// Receiver of batch events.
pub trait EventSink: Send {
    fn emit(&self, event: BatchEvent);
}

impl EventSink for Sender<BatchEvent> {
    fn emit(&self, event: BatchEvent) {
        // The receiver going away just means nobody is watching.
        let _ = self.send(event);
    }
}

/// Sink that discards every event.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSink;

impl EventSink for NullSink {
    fn emit(&self, _event: BatchEvent) {}
}
