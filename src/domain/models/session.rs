//! Page-side state of one ad workflow
//!
//! Pure state so the page behaviour can be tested without a renderer:
//! the hook in `shared::hooks::use_ad_workflow` wraps it in a signal and feeds
//! it the events streamed by `/api/ads`.

use serde::{Deserialize, Serialize};

use super::ad::AdDraft;
use super::image::HostedImage;
use super::workflow::{WorkflowEvent, WorkflowStage};
use crate::shared::errors::ErrorKind;

/// Error shown in place of the step that failed
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StepFailure {
    pub stage: WorkflowStage,
    pub kind: ErrorKind,
    pub message: String,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct AdSession {
    pub stage: WorkflowStage,
    pub run_id: Option<String>,
    pub filename: Option<String>,
    pub hosted: Option<HostedImage>,
    pub image_type: Option<String>,
    pub description: Option<String>,
    pub draft: Option<AdDraft>,
    /// Text captured by the last preview
    pub preview_text: Option<String>,
    pub failure: Option<StepFailure>,
    /// Bumped by every new upload or rejection; events of older runs are dropped
    pub generation: u64,
}

impl AdSession {
    /// Start a fresh run for a newly selected file, discarding everything.
    /// Returns the generation the run's events must carry.
    pub fn begin_run(&mut self, filename: impl Into<String>) -> u64 {
        let generation = self.generation + 1;
        *self = AdSession {
            stage: WorkflowStage::Uploading,
            filename: Some(filename.into()),
            generation,
            ..AdSession::default()
        };
        generation
    }

    /// Record a failure that happened before the request left the page
    pub fn reject(&mut self, kind: ErrorKind, message: impl Into<String>) {
        *self = AdSession {
            failure: Some(StepFailure {
                stage: WorkflowStage::Idle,
                kind,
                message: message.into(),
            }),
            generation: self.generation + 1,
            ..AdSession::default()
        };
    }

    pub fn is_current(&self, generation: u64) -> bool {
        self.generation == generation
    }

    /// Apply `event` only if it belongs to the run started as `generation`
    pub fn apply_for(&mut self, generation: u64, event: WorkflowEvent) -> bool {
        if !self.is_current(generation) {
            return false;
        }
        self.apply(event);
        true
    }

    /// Fail the run started as `generation`; a superseded run is left alone
    pub fn fail_for(&mut self, generation: u64, kind: ErrorKind, message: impl Into<String>) {
        if self.is_current(generation) {
            self.fail(kind, message);
        }
    }

    /// Fold one streamed event into the state
    pub fn apply(&mut self, event: WorkflowEvent) {
        if self.failure.is_some() {
            return;
        }

        match event {
            WorkflowEvent::Stage { stage } => self.advance(stage),
            WorkflowEvent::Hosted { image } => self.hosted = Some(image),
            WorkflowEvent::Classified { image_type } => self.image_type = Some(image_type),
            WorkflowEvent::Described { description } => self.description = Some(description),
            WorkflowEvent::Ready { run } => {
                self.run_id = Some(run.run_id);
                self.hosted = Some(run.image);
                self.image_type = Some(run.draft.image_type.clone());
                self.description = Some(run.draft.description.clone());
                self.draft = Some(run.draft);
                self.advance(WorkflowStage::Ready);
            }
            WorkflowEvent::Failed {
                stage,
                kind,
                message,
            } => {
                self.draft = None;
                self.preview_text = None;
                self.failure = Some(StepFailure {
                    stage,
                    kind,
                    message,
                });
            }
            WorkflowEvent::Done => {
                if self.stage.is_busy() {
                    self.failure = Some(StepFailure {
                        stage: self.stage,
                        kind: ErrorKind::Remote,
                        message: "The server ended the run before it completed".to_string(),
                    });
                }
            }
        }
    }

    /// Fail the current step with an error raised outside the event stream
    pub fn fail(&mut self, kind: ErrorKind, message: impl Into<String>) {
        let stage = self.stage;
        self.apply(WorkflowEvent::Failed {
            stage,
            kind,
            message: message.into(),
        });
    }

    /// Apply a transport-level failure (request could not be sent or read)
    pub fn fail_transport(&mut self, message: impl Into<String>) {
        self.fail(ErrorKind::Remote, message);
    }

    /// Replace the ad text; only meaningful once a draft exists
    pub fn edit_text(&mut self, text: impl Into<String>) {
        if let Some(draft) = self.draft.as_mut() {
            draft.editable_text = text.into();
            if self.stage == WorkflowStage::Previewing {
                self.stage = WorkflowStage::Ready;
            }
        }
    }

    /// Show the image with the current text; never touches the network
    pub fn preview(&mut self) -> bool {
        let Some(draft) = self.draft.as_ref() else {
            return false;
        };
        if !self.stage.can_transition_to(WorkflowStage::Previewing) {
            return false;
        }
        self.preview_text = Some(draft.editable_text.clone());
        self.stage = WorkflowStage::Previewing;
        true
    }

    pub fn is_busy(&self) -> bool {
        self.failure.is_none() && self.stage.is_busy()
    }

    fn advance(&mut self, next: WorkflowStage) {
        if self.stage.can_transition_to(next) {
            self.stage = next;
        } else {
            tracing::warn!(
                from = self.stage.as_str(),
                to = next.as_str(),
                "Ignoring out-of-order workflow stage"
            );
        }
    }
}
