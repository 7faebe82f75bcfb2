//! Submission orchestrator.
//!
//! Sequences the photo upload and the catalog write for the current draft:
//!
//! ```text
//! Idle/Failed --submit--> Uploading --ok--> Persisting --ok--> Succeeded --> Idle
//!                             |                 |
//!                             +------fail-------+--> Failed --> Idle
//! ```
//!
//! The write is never issued before the upload of the same submission has
//! returned a URL. Either failure keeps the draft so the operator can retry;
//! only a successful write resets it. A failed write leaves the uploaded photo
//! orphaned at the asset host and a retry uploads it again.

use crate::asset_host::UploadError;
use crate::catalog::WriteError;
use crate::draft::{DraftEdit, DraftItem, DraftStore};
use crate::env::Env;
use crate::event::Event;
use crate::item::{CatalogRecord, PhotoUrl, RecordError};
use crate::notification::NotificationController;
use crate::now_millis;
use crate::submission::{SubmissionEvent, SubmissionState};
use crate::validate::{is_submittable, missing_requirements};
use log::{debug, error, info, warn};
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::{Mutex, RwLock};
use uuid::Uuid;

#[derive(Error, Debug)]
pub enum SubmitError {
    #[error("Photo upload failed: {0}")]
    Upload(#[from] UploadError),
    #[error("Catalog write failed, photo left at {orphaned_url}: {source}")]
    Write {
        source: WriteError,
        orphaned_url: PhotoUrl,
    },
    #[error("Could not build catalog record, photo left at {orphaned_url}: {source}")]
    Record {
        source: RecordError,
        orphaned_url: PhotoUrl,
    },
}

impl SubmitError {
    /// URL of a photo that was uploaded but is referenced by no record
    pub fn orphaned_url(&self) -> Option<&PhotoUrl> {
        match self {
            SubmitError::Upload(_) => None,
            SubmitError::Write { orphaned_url, .. } | SubmitError::Record { orphaned_url, .. } => {
                Some(orphaned_url)
            }
        }
    }
}

#[derive(Debug)]
pub enum SubmitOutcome {
    /// The gate was closed, nothing happened
    Skipped,
    Submitted(CatalogRecord),
    Failed(SubmitError),
}

impl SubmitOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, SubmitOutcome::Submitted(_))
    }
}

pub struct Orchestrator {
    env: Arc<Env>,
    draft: Arc<RwLock<DraftStore>>,
    state: Mutex<SubmissionState>,
    notifications: Arc<NotificationController>,
}

impl Orchestrator {
    pub fn new(
        env: Arc<Env>,
        draft: Arc<RwLock<DraftStore>>,
        notifications: Arc<NotificationController>,
    ) -> Self {
        Orchestrator {
            env,
            draft,
            state: Mutex::new(SubmissionState::Idle),
            notifications,
        }
    }

    pub async fn state(&self) -> SubmissionState {
        *self.state.lock().await
    }

    pub async fn draft(&self) -> DraftItem {
        self.draft.read().await.snapshot()
    }

    pub fn notifications(&self) -> &Arc<NotificationController> {
        &self.notifications
    }

    /// Whether the submit action is currently enabled
    pub async fn can_submit(&self) -> bool {
        let state = self.state.lock().await;
        let draft = self.draft.read().await;
        is_submittable(draft.draft(), *state)
    }

    /// Apply an operator edit. An outcome that has not settled yet (the
    /// notification is still being dispatched) goes back to idle.
    pub async fn edit(&self, edit: DraftEdit) {
        let settled = {
            let mut state = self.state.lock().await;
            self.draft.write().await.set_field(edit);
            match *state {
                SubmissionState::Succeeded | SubmissionState::Failed => {
                    let from = *state;
                    *state = SubmissionState::Idle;
                    Some(from)
                }
                _ => None,
            }
        };

        if let Some(from) = settled {
            debug!("Draft edited, submission state {} -> idle", from);
        }
    }

    pub async fn submit(&self) -> SubmitOutcome {
        let submission_id = Uuid::new_v4();

        // Gate check and transition to Uploading happen under one lock
        let (draft, photo, from) = {
            let mut state = self.state.lock().await;
            let draft = self.draft.read().await.snapshot();

            if !is_submittable(&draft, *state) {
                debug!(
                    "submission={}; Submit ignored: {:?}",
                    submission_id,
                    missing_requirements(&draft, *state)
                );
                return SubmitOutcome::Skipped;
            }
            let Some(photo) = draft.photo.clone() else {
                return SubmitOutcome::Skipped;
            };

            let from = *state;
            match from.apply(SubmissionEvent::Submit) {
                Ok(next) => *state = next,
                Err(e) => {
                    error!("submission={}; {}", submission_id, e);
                    return SubmitOutcome::Skipped;
                }
            }
            (draft, photo, from)
        };
        self.publish(submission_id, from, SubmissionState::Uploading, None)
            .await;

        info!(
            "submission={}; Submitting item: {}",
            submission_id, &draft.name
        );

        let photo_url = match self.env.get_uploader().upload(&photo).await {
            Ok(url) => url,
            Err(e) => {
                error!("submission={}; Upload failed: {}", submission_id, e);
                self.advance(submission_id, SubmissionEvent::UploadFailed, Some(e.to_string()))
                    .await;
                self.finish(submission_id, false).await;
                return SubmitOutcome::Failed(SubmitError::Upload(e));
            }
        };

        self.advance(
            submission_id,
            SubmissionEvent::UploadSucceeded,
            Some(photo_url.to_string()),
        )
        .await;

        let record = match CatalogRecord::from_draft(&draft, photo_url.clone()) {
            Ok(record) => record,
            Err(e) => {
                error!("submission={}; {}", submission_id, e);
                self.fail_after_upload(submission_id, &photo_url, e.to_string())
                    .await;
                return SubmitOutcome::Failed(SubmitError::Record {
                    source: e,
                    orphaned_url: photo_url,
                });
            }
        };

        if let Err(e) = self.env.get_writer().write(&record).await {
            error!("submission={}; Write failed: {}", submission_id, e);
            self.fail_after_upload(submission_id, &photo_url, e.to_string())
                .await;
            return SubmitOutcome::Failed(SubmitError::Write {
                source: e,
                orphaned_url: photo_url,
            });
        }

        self.advance(submission_id, SubmissionEvent::WriteSucceeded, None)
            .await;
        self.draft.write().await.reset();
        info!("submission={}; Item stored: {}", submission_id, &record.name);
        self.finish(submission_id, true).await;

        SubmitOutcome::Submitted(record)
    }

    async fn fail_after_upload(&self, submission_id: Uuid, photo_url: &PhotoUrl, detail: String) {
        warn!(
            "submission={}; Uploaded photo is orphaned: {}",
            submission_id, photo_url
        );
        self.advance(submission_id, SubmissionEvent::WriteFailed, Some(detail))
            .await;
        self.finish(submission_id, false).await;
    }

    /// Dispatch the notification, then return to idle
    async fn finish(&self, submission_id: Uuid, success: bool) {
        self.notifications.show_outcome(success);
        self.advance(submission_id, SubmissionEvent::Settle, None)
            .await;
    }

    async fn advance(
        &self,
        submission_id: Uuid,
        event: SubmissionEvent,
        detail: Option<String>,
    ) -> SubmissionState {
        let (from, to) = {
            let mut state = self.state.lock().await;
            let from = *state;
            match from.apply(event) {
                Ok(next) => {
                    *state = next;
                    (from, next)
                }
                Err(e) => {
                    error!("submission={}; {}", submission_id, e);
                    return from;
                }
            }
        };

        if from != to {
            self.publish(submission_id, from, to, detail).await;
        }
        to
    }

    async fn publish(
        &self,
        submission_id: Uuid,
        from: SubmissionState,
        to: SubmissionState,
        detail: Option<String>,
    ) {
        let event = Event {
            submission_id,
            from,
            to,
            detail,
            timestamp: now_millis(),
        };
        self.env.get_event_publisher().publish(&event).await;
    }
}
