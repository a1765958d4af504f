//! Structured logging for the ad workflow
//!
//! Provides consistent, contextual logging across the pipeline.
//! Uses tracing spans for run tracking and structured fields.

use crate::domain::models::WorkflowStage;
use crate::shared::errors::AppError;

/// Log operations for the different pipeline steps
#[derive(Debug, Clone, Copy)]
pub enum LogOperation {
    Intake,
    Hosting,
    Classification,
    Description,
    Workflow,
}

impl LogOperation {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogOperation::Intake => "intake",
            LogOperation::Hosting => "hosting",
            LogOperation::Classification => "classification",
            LogOperation::Description => "description",
            LogOperation::Workflow => "workflow",
        }
    }

    /// Operation that runs while the pipeline is in `stage`
    pub fn for_stage(stage: WorkflowStage) -> Self {
        match stage {
            WorkflowStage::Idle => LogOperation::Intake,
            WorkflowStage::Uploading => LogOperation::Hosting,
            WorkflowStage::Classifying => LogOperation::Classification,
            WorkflowStage::Describing => LogOperation::Description,
            WorkflowStage::Ready | WorkflowStage::Previewing => LogOperation::Workflow,
        }
    }
}

/// Log the start of a run
pub fn log_run_start(run_id: &str, filename: &str, size: usize) {
    tracing::info!(
        operation = LogOperation::Workflow.as_str(),
        run_id = run_id,
        filename = filename,
        size_bytes = size,
        "Starting ad workflow run"
    );
}

/// Log a completed run
pub fn log_run_success(run_id: &str, image_type: &str, description_len: usize) {
    tracing::info!(
        operation = LogOperation::Workflow.as_str(),
        run_id = run_id,
        image_type = image_type,
        description_chars = description_len,
        "Ad workflow run completed"
    );
}

/// Log a run aborted at `stage`
pub fn log_run_failure(run_id: &str, stage: WorkflowStage, error: &AppError) {
    tracing::error!(
        operation = LogOperation::for_stage(stage).as_str(),
        run_id = run_id,
        stage = stage.as_str(),
        error_kind = error.kind().as_str(),
        error = %error,
        "Ad workflow run aborted"
    );
}

/// Log a step start
pub fn log_step_start(operation: LogOperation, run_id: &str) {
    tracing::debug!(
        operation = operation.as_str(),
        run_id = run_id,
        "Step started"
    );
}

/// Log a step result
pub fn log_step_success(operation: LogOperation, run_id: &str, output_chars: usize) {
    tracing::info!(
        operation = operation.as_str(),
        run_id = run_id,
        output_chars = output_chars,
        "Step completed"
    );
}

/// Log a failed step
pub fn log_step_error(operation: LogOperation, run_id: &str, error: &AppError) {
    tracing::warn!(
        operation = operation.as_str(),
        run_id = run_id,
        error_kind = error.kind().as_str(),
        error = %error,
        "Step failed"
    );
}

/// Log the hosted resource that is left behind on the hosting service
pub fn log_hosted_image(run_id: &str, public_url: &str, delete_hash: Option<&str>) {
    tracing::info!(
        operation = LogOperation::Hosting.as_str(),
        run_id = run_id,
        public_url = public_url,
        delete_hash = delete_hash.unwrap_or("<none>"),
        "Image hosted (remote copy is not deleted)"
    );
}

/// Log temp file release problems
pub fn log_temp_release_error(path: &str, error: &std::io::Error) {
    tracing::warn!(
        operation = LogOperation::Intake.as_str(),
        path = path,
        error = %error,
        "Failed to remove temporary upload"
    );
}

/// Macro for creating structured log context
#[macro_export]
macro_rules! log_context {
    ($run_id:expr) => {
        tracing::info_span!("ad_workflow", run_id = $run_id)
    };
    ($run_id:expr, $filename:expr) => {
        tracing::info_span!("ad_workflow", run_id = $run_id, filename = $filename)
    };
}
