//! Client-side upload queue.
//!
//! Files are validated and previewed when they enter the queue, then
//! submitted strictly one at a time by [`UploadPipeline::start_upload`].
//! Observers follow along through [`UploadEvent`]s.

use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use chrono::Utc;
use parking_lot::Mutex;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::domain::entities::{
    ImageId, ImageRecord, SourceFile, UploadId, UploadItem, UploadMetadata, UploadStatus,
};
use crate::domain::errors::{HttpError, UploadError, ValidationError};
use crate::domain::ports::{ImageApiPort, PreviewPort, ProgressCallback, UploadRequest};

/// MIME types accepted into the queue.
pub const ALLOWED_TYPES: [&str; 4] = ["image/jpeg", "image/png", "image/gif", "image/webp"];

/// Default size ceiling, 10 MiB.
pub const DEFAULT_MAX_BYTES: u64 = 10 * 1024 * 1024;

const SIMULATED_STEPS: u8 = 10;

/// Notification emitted while the queue is processed.
#[derive(Debug, Clone, PartialEq)]
pub enum UploadEvent {
    /// An item changed state.
    StatusChanged {
        /// Item.
        id: UploadId,
        /// New state.
        status: UploadStatus,
    },
    /// An item's progress moved.
    Progress {
        /// Item.
        id: UploadId,
        /// Percentage, 0 to 100.
        percent: u8,
    },
    /// The backend (or the offline simulation) produced a record.
    ImageUploaded(ImageRecord),
}

/// Tuning knobs of [`UploadPipeline`].
#[derive(Debug, Clone, Copy)]
pub struct UploadSettings {
    /// Largest accepted file in bytes.
    pub max_bytes: u64,
    /// How long completed items stay visible after a batch.
    pub display_delay: Duration,
    /// Complete uploads locally when the backend is unreachable.
    pub simulate_offline: bool,
    /// Pause between simulated progress steps.
    pub simulated_step: Duration,
}

impl Default for UploadSettings {
    fn default() -> Self {
        Self {
            max_bytes: DEFAULT_MAX_BYTES,
            display_delay: Duration::from_secs(2),
            simulate_offline: false,
            simulated_step: Duration::from_millis(100),
        }
    }
}

/// Final state of one item processed by a batch.
#[derive(Debug, Clone)]
pub struct UploadOutcome {
    /// Item.
    pub id: UploadId,
    /// Source file name.
    pub file_name: String,
    /// `Completed` or `Error`.
    pub status: UploadStatus,
    /// Last reported progress.
    pub progress: u8,
    /// Created record, when completed.
    pub record: Option<ImageRecord>,
    /// Failure, when failed.
    pub error: Option<UploadError>,
    /// Whether the record was synthesized offline.
    pub simulated: bool,
}

/// Per-item outcomes of one [`UploadPipeline::start_upload`] call, in order.
#[derive(Debug, Clone, Default)]
pub struct UploadReport {
    /// Outcomes in processing order.
    pub outcomes: Vec<UploadOutcome>,
}

impl UploadReport {
    /// Statuses in processing order.
    #[must_use]
    pub fn statuses(&self) -> Vec<UploadStatus> {
        self.outcomes.iter().map(|o| o.status).collect()
    }

    /// Number of completed items.
    #[must_use]
    pub fn completed(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|o| o.status == UploadStatus::Completed)
            .count()
    }

    /// Number of failed items.
    #[must_use]
    pub fn failed(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|o| o.status == UploadStatus::Error)
            .count()
    }

    /// Whether nothing was processed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.outcomes.is_empty()
    }
}

/// Clears the running flag when a batch ends, however it ends.
struct BatchGuard<'a>(&'a AtomicBool);

impl Drop for BatchGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

/// Queue of pending uploads.
pub struct UploadPipeline {
    api: Arc<dyn ImageApiPort>,
    previewer: Arc<dyn PreviewPort>,
    queue: Arc<Mutex<Vec<UploadItem>>>,
    running: AtomicBool,
    events: mpsc::UnboundedSender<UploadEvent>,
    settings: UploadSettings,
}

impl UploadPipeline {
    /// Creates an empty pipeline publishing to `events`.
    #[must_use]
    pub fn new(
        api: Arc<dyn ImageApiPort>,
        previewer: Arc<dyn PreviewPort>,
        events: mpsc::UnboundedSender<UploadEvent>,
        settings: UploadSettings,
    ) -> Self {
        Self {
            api,
            previewer,
            queue: Arc::new(Mutex::new(Vec::new())),
            running: AtomicBool::new(false),
            events,
            settings,
        }
    }

    /// Reads `path` into a [`SourceFile`], typing it by extension.
    ///
    /// # Errors
    /// Returns [`ValidationError::Unreadable`] if the file cannot be read.
    pub async fn read_file(path: &Path) -> Result<SourceFile, ValidationError> {
        let name = path
            .file_name()
            .map_or_else(|| path.display().to_string(), |n| n.to_string_lossy().into_owned());

        let bytes = tokio::fs::read(path)
            .await
            .map_err(|e| ValidationError::Unreadable {
                name: name.clone(),
                message: e.to_string(),
            })?;

        Ok(SourceFile::from_name(name, bytes))
    }

    /// Checks type, then size.
    ///
    /// # Errors
    /// Returns the first rule `file` breaks.
    pub fn validate(&self, file: &SourceFile) -> Result<(), ValidationError> {
        if !ALLOWED_TYPES.contains(&file.mime.as_str()) {
            return Err(ValidationError::UnsupportedType {
                name: file.name.clone(),
                mime: file.mime.clone(),
            });
        }
        if file.size() == 0 {
            return Err(ValidationError::Empty {
                name: file.name.clone(),
            });
        }
        if file.size() > self.settings.max_bytes {
            return Err(ValidationError::TooLarge {
                name: file.name.clone(),
                size: file.size(),
                max: self.settings.max_bytes,
            });
        }
        Ok(())
    }

    /// Validates `file`, renders its preview and appends it to the queue.
    ///
    /// # Errors
    /// Returns the validation failure; the file is not queued.
    pub async fn add_file(&self, file: SourceFile) -> Result<UploadId, ValidationError> {
        if let Err(e) = self.validate(&file) {
            warn!(error = %e, "File rejected");
            return Err(e);
        }

        let preview = self.previewer.generate(&file).await;
        let item = UploadItem::new(file, preview);
        let id = item.id;

        debug!(id = %id, file = %item.file.name, "File queued");
        self.queue.lock().push(item);
        Ok(id)
    }

    /// Queues every file, returning one result per input.
    pub async fn add_files(
        &self,
        files: impl IntoIterator<Item = SourceFile>,
    ) -> Vec<Result<UploadId, ValidationError>> {
        let mut results = Vec::new();
        for file in files {
            results.push(self.add_file(file).await);
        }
        results
    }

    /// Replaces the metadata of a queued item.
    ///
    /// # Errors
    /// Returns error if no item has `id`.
    pub fn update_metadata(&self, id: UploadId, metadata: UploadMetadata) -> Result<(), UploadError> {
        let mut queue = self.queue.lock();
        let item = queue
            .iter_mut()
            .find(|i| i.id == id)
            .ok_or_else(|| UploadError::UnknownItem { id: id.to_string() })?;
        item.metadata = metadata;
        Ok(())
    }

    /// Removes an item that is not currently uploading.
    ///
    /// # Errors
    /// Returns error if no item has `id` or it is in flight.
    pub fn discard(&self, id: UploadId) -> Result<UploadItem, UploadError> {
        let mut queue = self.queue.lock();
        let index = queue
            .iter()
            .position(|i| i.id == id)
            .ok_or_else(|| UploadError::UnknownItem { id: id.to_string() })?;
        if queue[index].status == UploadStatus::Uploading {
            return Err(UploadError::InProgress { id: id.to_string() });
        }
        Ok(queue.remove(index))
    }

    /// Snapshot of the queue.
    #[must_use]
    pub fn items(&self) -> Vec<UploadItem> {
        self.queue.lock().clone()
    }

    /// Whether a batch is being processed.
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Uploads every pending item, one at a time.
    ///
    /// A failed item is marked `error` and the batch moves on. Completed
    /// items are purged after the display delay. Files queued while the
    /// batch runs, including during that delay, are uploaded by the same
    /// batch and reported with it. Calling this while a batch is running
    /// does nothing and returns an empty report.
    pub async fn start_upload(&self) -> UploadReport {
        if self.running.swap(true, Ordering::SeqCst) {
            debug!("Upload batch already running");
            return UploadReport::default();
        }
        let _guard = BatchGuard(&self.running);

        let mut report = UploadReport::default();
        loop {
            let round_start = report.outcomes.len();
            while let Some(id) = self.next_pending() {
                report.outcomes.push(self.process(id).await);
            }

            let round = &report.outcomes[round_start..];
            if round.is_empty() {
                break;
            }
            info!(
                uploaded = round.len(),
                completed = report.completed(),
                failed = report.failed(),
                "Upload round finished"
            );

            if round.iter().any(|o| o.status == UploadStatus::Completed) {
                tokio::time::sleep(self.settings.display_delay).await;
                self.queue
                    .lock()
                    .retain(|i| i.status != UploadStatus::Completed);
            }
        }

        report
    }

    fn next_pending(&self) -> Option<UploadId> {
        self.queue
            .lock()
            .iter()
            .find(|i| i.status == UploadStatus::Pending)
            .map(|i| i.id)
    }

    async fn process(&self, id: UploadId) -> UploadOutcome {
        let Some(item) = self.transition(id, UploadStatus::Uploading) else {
            return self.outcome(id, None, false);
        };

        let request = UploadRequest::new(item.file.clone(), item.metadata.clone());
        match self.api.upload_image(request, self.progress_callback(id)).await {
            Ok(record) => {
                self.complete(id, record.clone());
                self.outcome(id, Some(record), false)
            }
            Err(e) if e.is_unreachable() && self.settings.simulate_offline => {
                info!(id = %id, error = %e, "Backend unreachable, completing upload locally");
                let record = self.simulate(&item).await;
                self.complete(id, record.clone());
                self.outcome(id, Some(record), true)
            }
            Err(e) => {
                self.fail(id, e);
                self.outcome(id, None, false)
            }
        }
    }

    fn progress_callback(&self, id: UploadId) -> ProgressCallback {
        let queue = Arc::clone(&self.queue);
        let events = self.events.clone();
        Arc::new(move |percent| {
            let percent = percent.min(100);
            if let Some(item) = queue.lock().iter_mut().find(|i| i.id == id) {
                item.progress = percent;
            }
            publish(&events, UploadEvent::Progress { id, percent });
        })
    }

    async fn simulate(&self, item: &UploadItem) -> ImageRecord {
        let progress = self.progress_callback(item.id);
        for step in 1..=SIMULATED_STEPS {
            tokio::time::sleep(self.settings.simulated_step).await;
            progress(step * (100 / SIMULATED_STEPS));
        }

        let data_url = item.preview.as_ref().map(|p| p.data_url.clone());
        ImageRecord {
            id: ImageId::new(format!("local-{}", item.id)),
            url: data_url.clone().unwrap_or_default(),
            thumbnail: data_url,
            title: item.metadata.title.clone(),
            description: item.metadata.description.clone(),
            tags: item.metadata.tags.clone(),
            upload_date: Some(Utc::now()),
            size: item.file.size(),
            filename: item.file.name.clone(),
            likes: Some(0),
            views: Some(0),
        }
    }

    fn transition(&self, id: UploadId, status: UploadStatus) -> Option<UploadItem> {
        let snapshot = {
            let mut queue = self.queue.lock();
            let item = queue.iter_mut().find(|i| i.id == id)?;
            item.status = status;
            if status == UploadStatus::Uploading {
                item.progress = 0;
                item.error = None;
            }
            item.clone()
        };
        self.emit(UploadEvent::StatusChanged { id, status });
        Some(snapshot)
    }

    fn complete(&self, id: UploadId, record: ImageRecord) {
        if let Some(item) = self.queue.lock().iter_mut().find(|i| i.id == id) {
            item.progress = 100;
        }
        self.transition(id, UploadStatus::Completed);
        info!(id = %id, record = %record.id, "Upload completed");
        self.emit(UploadEvent::ImageUploaded(record));
    }

    fn fail(&self, id: UploadId, error: HttpError) {
        warn!(id = %id, error = %error, "Upload failed");
        if let Some(item) = self.queue.lock().iter_mut().find(|i| i.id == id) {
            item.error = Some(UploadError::from(error));
        }
        self.transition(id, UploadStatus::Error);
    }

    fn outcome(&self, id: UploadId, record: Option<ImageRecord>, simulated: bool) -> UploadOutcome {
        let queue = self.queue.lock();
        let item = queue.iter().find(|i| i.id == id);
        UploadOutcome {
            id,
            file_name: item.map(|i| i.file.name.clone()).unwrap_or_default(),
            status: item.map_or(UploadStatus::Error, |i| i.status),
            progress: item.map_or(0, |i| i.progress),
            record,
            error: item.and_then(|i| i.error.clone()),
            simulated,
        }
    }

    fn emit(&self, event: UploadEvent) {
        publish(&self.events, event);
    }
}

fn publish(events: &mpsc::UnboundedSender<UploadEvent>, event: UploadEvent) {
    if events.send(event).is_err() {
        debug!("No upload event listener");
    }
}
