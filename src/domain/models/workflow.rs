use serde::{Deserialize, Serialize};

use super::ad::AdRun;
use super::image::HostedImage;
use crate::shared::errors::ErrorKind;

/// Where a workflow run currently is
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkflowStage {
    #[default]
    Idle,
    Uploading,
    Classifying,
    Describing,
    Ready,
    Previewing,
}

impl WorkflowStage {
    pub fn as_str(&self) -> &'static str {
        match self {
            WorkflowStage::Idle => "idle",
            WorkflowStage::Uploading => "uploading",
            WorkflowStage::Classifying => "classifying",
            WorkflowStage::Describing => "describing",
            WorkflowStage::Ready => "ready",
            WorkflowStage::Previewing => "previewing",
        }
    }

    /// Progress text shown while the stage's remote call is in flight
    pub fn progress_label(&self) -> Option<&'static str> {
        match self {
            WorkflowStage::Uploading => Some("Uploading image..."),
            WorkflowStage::Classifying => Some("Identifying image type..."),
            WorkflowStage::Describing => Some("Generating description..."),
            _ => None,
        }
    }

    /// Whether a remote call is in flight
    pub fn is_busy(&self) -> bool {
        self.progress_label().is_some()
    }

    fn rank(&self) -> u8 {
        match self {
            WorkflowStage::Idle => 0,
            WorkflowStage::Uploading => 1,
            WorkflowStage::Classifying => 2,
            WorkflowStage::Describing => 3,
            WorkflowStage::Ready => 4,
            WorkflowStage::Previewing => 5,
        }
    }

    /// Forward-only transitions; ready and previewing cycle, a new upload restarts
    pub fn can_transition_to(&self, next: WorkflowStage) -> bool {
        match (self, next) {
            (_, WorkflowStage::Uploading) => true,
            (WorkflowStage::Ready, WorkflowStage::Previewing)
            | (WorkflowStage::Previewing, WorkflowStage::Ready)
            | (WorkflowStage::Previewing, WorkflowStage::Previewing) => true,
            (WorkflowStage::Ready | WorkflowStage::Previewing, _) => false,
            (current, next) => next.rank() > current.rank() && next != WorkflowStage::Previewing,
        }
    }
}

impl std::fmt::Display for WorkflowStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Progress messages streamed to the page, one NDJSON line each
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum WorkflowEvent {
    Stage { stage: WorkflowStage },
    Hosted { image: HostedImage },
    Classified { image_type: String },
    Described { description: String },
    Ready { run: AdRun },
    Failed {
        stage: WorkflowStage,
        kind: ErrorKind,
        message: String,
    },
    Done,
}

impl WorkflowEvent {
    pub fn to_ndjson(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Serialized line including the trailing newline
    pub fn to_ndjson_line(&self) -> String {
        match self.to_ndjson() {
            Ok(json) => format!("{}\n", json),
            Err(e) => {
                tracing::error!("Failed to serialize workflow event: {}", e);
                let fallback = WorkflowEvent::Failed {
                    stage: WorkflowStage::Idle,
                    kind: ErrorKind::Remote,
                    message: format!("Serialization error: {}", e),
                };
                format!("{}\n", serde_json::to_string(&fallback).unwrap_or_default())
            }
        }
    }
}
