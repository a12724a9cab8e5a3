//! Batch orchestration.
//!
//! The orchestrator drives every selected archive through the pipeline on a
//! single worker, one archive at a time:
//!
//! ```text
//! archive ──▶ extract / convert ──▶ classify ──┬─▶ pack: queue children
//!                                              └─▶ livery: reorganize ─▶ materialize
//!                                                   ─▶ configure ─▶ sidecar
//! after all archives ──▶ layout.json ──▶ manifest.json   (only on a clean batch)
//! ```
//!
//! Nested content is handled through a work queue instead of recursion:
//! children of a pack are pushed to the front of the queue in declaration
//! order, so results keep input order and then declaration order. Failures
//! are recorded per leaf livery and never stop siblings.

use std::collections::VecDeque;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::mpsc::{self, Receiver};
use std::thread::{self, JoinHandle};

use tracing::{error, info, warn};

use super::events::{BatchEvent, EventSink, PipelineStage};
use super::result::{BatchReport, ItemResult, PostProcessing, SkipReason};
use super::settings::InstallSettings;
use crate::aircraft_cfg::{add_fallback_to_texture_dir, sibling_fallback, transform_file};
use crate::archive::{
    ArchiveConverter, ArchiveExtractor, ArchiveKind, InputArchive, PtpConverter, ZipExtractor,
};
use crate::error::{LiveryError, LiveryResult};
use crate::fs_ops::{read_text_lossy, remove_dir_quietly, scratch_name, stem_of};
use crate::install::{materialize, relocate_sidecar, InstalledLivery};
use crate::package::{generate_layout, update_metadata, update_total_size, PackageRoot};
use crate::staging::{
    classify, read_multi_livery_pack, reorganize, resolve_display_name, unwrap_single_dir,
    ContentShape, NameSources,
};

/// Deepest level at which a converted PTP is checked for bundled liveries.
pub const MAX_PACK_DEPTH: usize = 2;

/// Where a work item's content comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WorkSource {
    /// An archive on disk.
    Archive { path: PathBuf, kind: ArchiveKind },
    /// A declared pack member that could not be resolved.
    Unavailable(String),
}

/// One unit of work in an archive's queue.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkItem {
    pub source: WorkSource,
    /// 0 for a selected archive, 1 for its children, and so on.
    pub depth: usize,
    /// Label used in results and progress.
    pub label: String,
    /// Display name declared by a multi-livery pack.
    pub pack_name: Option<String>,
    /// Multi-livery pack this item belongs to.
    pub pack_group: Option<usize>,
}

impl WorkItem {
    fn top_level(input: &InputArchive) -> Self {
        Self {
            source: WorkSource::Archive {
                path: input.path.clone(),
                kind: input.kind,
            },
            depth: 0,
            label: input.display_name(),
            pack_name: None,
            pack_group: None,
        }
    }

    fn child(&self, source: WorkSource, name: &str) -> Self {
        Self {
            source,
            depth: self.depth + 1,
            label: format!("{} > {}", self.label, name),
            pack_name: None,
            pack_group: None,
        }
    }
}

/// The first installed livery of a multi-livery pack.
#[derive(Debug, Clone)]
struct PackAnchor {
    folder: String,
    texture_dir: String,
}

enum ItemOutcome {
    Children(Vec<WorkItem>),
    Installed(InstalledLivery, String),
}

/// Per-archive working state.
struct ArchiveRun {
    scratch: PathBuf,
    single_input: bool,
    anchors: Vec<Option<PackAnchor>>,
    failed: bool,
}

/// Drives a batch of archives through the pipeline.
pub struct BatchOrchestrator<S: EventSink> {
    settings: InstallSettings,
    extractor: Box<dyn ArchiveExtractor>,
    converter: Option<Box<dyn ArchiveConverter>>,
    sink: S,
}

impl<S: EventSink> BatchOrchestrator<S> {
    /// Create an orchestrator using the ZIP extractor and, when configured,
    /// the PTP converter.
    pub fn new(settings: InstallSettings, sink: S) -> Self {
        let converter = settings.converter.as_ref().map(|exe| {
            Box::new(PtpConverter::new(exe).with_timeout(settings.converter_timeout))
                as Box<dyn ArchiveConverter>
        });
        Self {
            settings,
            extractor: Box::new(ZipExtractor::new()),
            converter,
            sink,
        }
    }

    /// Replace the archive extractor.
    pub fn with_extractor(mut self, extractor: Box<dyn ArchiveExtractor>) -> Self {
        self.extractor = extractor;
        self
    }

    /// Replace the PTP converter.
    pub fn with_converter(mut self, converter: Box<dyn ArchiveConverter>) -> Self {
        self.converter = Some(converter);
        self
    }

    pub fn settings(&self) -> &InstallSettings {
        &self.settings
    }

    fn stage(&self, item: &str, stage: PipelineStage) {
        self.sink.emit(BatchEvent::Stage {
            item: item.to_string(),
            stage,
        });
    }

    fn notice(&self, message: impl Into<String>) {
        self.sink.emit(BatchEvent::Notice {
            message: message.into(),
        });
    }

    /// Run the batch.
    ///
    /// Setup problems (invalid settings, unusable package root) are returned
    /// as errors before any archive is touched. Everything after that ends up
    /// in the report.
    pub fn run(&self, inputs: &[PathBuf]) -> LiveryResult<BatchReport> {
        self.settings.validate(inputs)?;
        let archives: Vec<InputArchive> = inputs
            .iter()
            .filter_map(|p| InputArchive::from_path(p.clone()))
            .collect();

        let root = PackageRoot::prepare(
            &self.settings.community_dir,
            self.settings.variant,
            &self.settings.reference_dir,
        )?;
        let metadata = self.settings.descriptor_metadata();
        if let Err(e) = update_metadata(&root.descriptor_path(), &metadata) {
            warn!(error = %e, "Could not initialize package descriptor metadata");
            self.notice(format!("warning: {}", e));
        }
        info!(
            package = %root.path().display(),
            variant = %self.settings.variant,
            archives = archives.len(),
            "Starting livery batch"
        );

        let mut items: Vec<ItemResult> = Vec::new();
        let mut failed_archives = 0;
        let single_input = archives.len() == 1;
        for (index, archive) in archives.iter().enumerate() {
            self.sink.emit(BatchEvent::ArchiveStarted {
                index,
                total: archives.len(),
                name: archive.display_name(),
            });
            if self.process_archive(archive, &root, single_input, &mut items) {
                failed_archives += 1;
            }
        }

        let successes = items.iter().filter(|i| i.success).count();
        let post_processing = if failed_archives > 0 {
            PostProcessing::Skipped(SkipReason::PartialFailure { failed_archives })
        } else if successes == 0 {
            PostProcessing::Skipped(SkipReason::NothingInstalled)
        } else {
            self.regenerate_package_files(&root)
        };
        match &post_processing {
            PostProcessing::Completed { .. } => info!("{}", post_processing),
            PostProcessing::Skipped(_) => warn!("{}", post_processing),
            PostProcessing::Failed(_) => error!("{}", post_processing),
        }
        self.sink
            .emit(BatchEvent::PostProcessing(post_processing.clone()));

        let report = BatchReport {
            items,
            archives: archives.len(),
            failed_archives,
            post_processing,
        };
        info!(
            installed = report.successes(),
            attempted = report.items.len(),
            "Livery batch finished"
        );
        self.sink.emit(BatchEvent::Finished(report.clone()));
        Ok(report)
    }

    /// Process one selected archive and its children. Returns whether any
    /// item failed.
    fn process_archive(
        &self,
        archive: &InputArchive,
        root: &PackageRoot,
        single_input: bool,
        items: &mut Vec<ItemResult>,
    ) -> bool {
        let stem = stem_of(&archive.path, "archive");
        let scratch = root.path().join(scratch_name("archive", &stem));
        let mut run = ArchiveRun {
            scratch,
            single_input,
            anchors: Vec::new(),
            failed: false,
        };

        let mut queue = VecDeque::from([WorkItem::top_level(archive)]);
        if let Err(e) = std::fs::create_dir_all(&run.scratch) {
            let err = LiveryError::write_failed(&run.scratch, e);
            self.record(items, &mut run, &queue[0], Err(err));
            return true;
        }

        while let Some(item) = queue.pop_front() {
            match self.process_item(&item, root, &mut run) {
                Ok(ItemOutcome::Children(children)) => {
                    info!(item = %item.label, children = children.len(), "Queued pack contents");
                    for child in children.into_iter().rev() {
                        queue.push_front(child);
                    }
                }
                Ok(ItemOutcome::Installed(installed, detail)) => {
                    let slot = item.pack_group.and_then(|g| run.anchors.get_mut(g));
                    if let (Some(slot), Some(texture_dir)) = (slot, installed.texture_dirs.first())
                    {
                        slot.get_or_insert_with(|| PackAnchor {
                            folder: installed.folder_name.clone(),
                            texture_dir: texture_dir.clone(),
                        });
                    }
                    self.record(items, &mut run, &item, Ok(detail));
                }
                Err(e) => self.record(items, &mut run, &item, Err(e)),
            }
        }

        self.stage(&archive.display_name(), PipelineStage::Cleanup);
        remove_dir_quietly(&run.scratch);
        run.failed
    }

    fn record(
        &self,
        items: &mut Vec<ItemResult>,
        run: &mut ArchiveRun,
        item: &WorkItem,
        outcome: Result<String, LiveryError>,
    ) {
        let result = match outcome {
            Ok(detail) => {
                info!(item = %item.label, "{}", detail);
                ItemResult::success(&item.label, detail)
            }
            Err(e) => {
                error!(item = %item.label, error = %e, "Livery failed");
                run.failed = true;
                ItemResult::failure(&item.label, e.to_string())
            }
        };
        self.sink.emit(BatchEvent::ItemFinished(result.clone()));
        items.push(result);
    }

    /// Stage one work item and either expand it or install it.
    fn process_item(
        &self,
        item: &WorkItem,
        root: &PackageRoot,
        run: &mut ArchiveRun,
    ) -> LiveryResult<ItemOutcome> {
        let (path, kind) = match &item.source {
            WorkSource::Archive { path, kind } => (path, *kind),
            WorkSource::Unavailable(reason) => {
                return Err(LiveryError::StagedContentIncomplete {
                    path: PathBuf::from(&item.label),
                    reason: reason.clone(),
                })
            }
        };
        let stem = stem_of(path, "livery");

        let content_dir = match kind {
            ArchiveKind::Zip => {
                self.stage(&item.label, PipelineStage::Extracting);
                let staged = run.scratch.join(scratch_name("zip", &stem));
                let files = self.extractor.extract(path, &staged)?;
                info!(item = %item.label, files, "Extracted archive");

                if item.depth == 0 {
                    self.stage(&item.label, PipelineStage::Classifying);
                    match classify(&staged)? {
                        ContentShape::Pack(archives) => {
                            let children = archives
                                .into_iter()
                                .map(|archive| {
                                    let kind =
                                        ArchiveKind::from_path(&archive).unwrap_or(ArchiveKind::Zip);
                                    let name = stem_of(&archive, "archive");
                                    item.child(WorkSource::Archive { path: archive, kind }, &name)
                                })
                                .collect();
                            return Ok(ItemOutcome::Children(children));
                        }
                        ContentShape::Livery(dir) => dir,
                    }
                } else {
                    unwrap_single_dir(&staged)
                }
            }
            ArchiveKind::Ptp => {
                self.stage(&item.label, PipelineStage::Converting);
                let converter = self
                    .converter
                    .as_ref()
                    .ok_or_else(|| {
                        LiveryError::ExternalToolMissing(PathBuf::from("(no converter configured)"))
                    })?;
                let staged = converter.convert(path, &run.scratch)?;

                if item.depth < MAX_PACK_DEPTH {
                    if let Some(children) = self.expand_multi_livery(item, &staged, run)? {
                        return Ok(ItemOutcome::Children(children));
                    }
                }
                staged
            }
        };

        self.install_leaf(item, &content_dir, &stem, root, run)
    }

    /// Children of a multi-livery PTP package, if it is one.
    fn expand_multi_livery(
        &self,
        item: &WorkItem,
        staged: &Path,
        run: &mut ArchiveRun,
    ) -> LiveryResult<Option<Vec<WorkItem>>> {
        let Some(entries) = read_multi_livery_pack(staged)? else {
            return Ok(None);
        };
        if entries.is_empty() {
            return Err(LiveryError::StagedContentIncomplete {
                path: staged.to_path_buf(),
                reason: "multi-livery package declares no liveries".to_string(),
            });
        }

        let group = run.anchors.len();
        run.anchors.push(None);
        let children = entries
            .into_iter()
            .enumerate()
            .map(|(i, entry)| match entry {
                Ok(entry) => {
                    let label = entry
                        .name
                        .clone()
                        .unwrap_or_else(|| stem_of(&entry.archive, "livery"));
                    let kind = ArchiveKind::from_path(&entry.archive).unwrap_or(ArchiveKind::Ptp);
                    let mut child = item.child(
                        WorkSource::Archive {
                            path: entry.archive,
                            kind,
                        },
                        &label,
                    );
                    child.pack_name = entry.name;
                    child.pack_group = Some(group);
                    child
                }
                Err(reason) => {
                    warn!(item = %item.label, reason = %reason, "Multi-livery entry unavailable");
                    item.child(
                        WorkSource::Unavailable(reason),
                        &format!("Livery {}", i + 1),
                    )
                }
            })
            .collect();
        Ok(Some(children))
    }

    /// Install a single livery from its staged content directory.
    fn install_leaf(
        &self,
        item: &WorkItem,
        content_dir: &Path,
        stem: &str,
        root: &PackageRoot,
        run: &ArchiveRun,
    ) -> LiveryResult<ItemOutcome> {
        let variant = self.settings.variant;

        self.stage(&item.label, PipelineStage::Reorganizing);
        let content = reorganize(content_dir)?;

        let config_text = read_text_lossy(&content.config).ok().map(|(text, _)| text);
        let custom_name = if run.single_input && item.depth == 0 {
            self.settings.custom_name.as_deref()
        } else {
            None
        };
        let display_name = resolve_display_name(NameSources {
            pack_name: item.pack_name.as_deref(),
            custom_name,
            config_text: config_text.as_deref(),
            archive_stem: stem,
        });

        self.stage(&item.label, PipelineStage::Materializing);
        let installed = materialize(&content, root.path(), variant, &display_name, stem)?;

        self.stage(&item.label, PipelineStage::Configuring);
        if let Err(e) = transform_file(&installed.config, variant, &display_name) {
            remove_dir_quietly(&installed.path);
            return Err(e);
        }

        let sidecar = relocate_sidecar(&content.root, &installed.config, &self.settings.state_dir);

        if let Some(Some(anchor)) = item.pack_group.and_then(|g| run.anchors.get(g)) {
            if anchor.folder != installed.folder_name {
                self.link_textures(&installed, anchor);
            }
        }

        let mut detail = format!("installed as '{}'", installed.folder_name);
        if let Some(qualifier) = sidecar.qualifier() {
            detail.push_str(&format!(" ({})", qualifier));
        }
        Ok(ItemOutcome::Installed(installed, detail))
    }

    /// Point a later pack member's textures at the first member's.
    fn link_textures(&self, installed: &InstalledLivery, anchor: &PackAnchor) {
        let fallback = sibling_fallback(&anchor.folder, &anchor.texture_dir);
        for texture in &installed.texture_dirs {
            let dir = installed.path.join(texture);
            if let Err(e) = add_fallback_to_texture_dir(&dir, &fallback) {
                warn!(dir = %dir.display(), error = %e, "Could not add texture fallback");
                self.notice(format!("warning: texture fallback not added for {}", texture));
            }
        }
    }

    /// Regenerate `layout.json` and `manifest.json`.
    fn regenerate_package_files(&self, root: &PackageRoot) -> PostProcessing {
        let label = root
            .path()
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();

        self.stage(&label, PipelineStage::GeneratingLayout);
        let layout = match generate_layout(root.path()) {
            Ok(layout) => layout,
            Err(e) => return PostProcessing::Failed(e.to_string()),
        };

        self.stage(&label, PipelineStage::UpdatingDescriptor);
        match update_total_size(&root.descriptor_path(), layout.content_size, layout.layout_size) {
            Ok(total) => PostProcessing::Completed {
                files: layout.entries,
                total_package_size: total,
            },
            Err(e) => PostProcessing::Failed(e.to_string()),
        }
    }
}

/// Run a batch on a named worker thread.
///
/// Returns the worker's join handle and the receiving end of its event
/// channel. The receiver yields events until the batch finishes.
pub fn spawn_batch(
    settings: InstallSettings,
    inputs: Vec<PathBuf>,
) -> io::Result<(JoinHandle<LiveryResult<BatchReport>>, Receiver<BatchEvent>)> {
    let (tx, rx) = mpsc::channel();
    let handle = thread::Builder::new()
        .name("livery-batch".to_string())
        .spawn(move || BatchOrchestrator::new(settings, tx).run(&inputs))?;
    Ok((handle, rx))
}
