//! Ad generation pipeline
//!
//! Intake, hosting, classification and description run strictly in that
//! order; each remote call is awaited before the next one starts. The first
//! failure ends the run and nothing after it is attempted.

use std::sync::Arc;

use chrono::Utc;
use thiserror::Error;
use tokio::sync::mpsc::UnboundedSender;
use tracing::Instrument;

use crate::config::Settings;
use crate::domain::models::{
    AdDraft, AdRun, CredentialLayer, Credentials, UploadedImage, WorkflowEvent, WorkflowStage,
};
use crate::log_context;
use crate::shared::errors::{AppError, Result};
use crate::shared::logging::{
    LogOperation, log_hosted_image, log_run_failure, log_run_start, log_run_success,
    log_step_error, log_step_start, log_step_success,
};

use super::classifier::ImageClassifier;
use super::copywriter::AdCopyGenerator;
use super::imgur::ImageHost;
use super::intake::{TempImage, validate_upload};
use super::replicate::{ModelRef, VisionModel};

/// A run that stopped at `stage`
#[derive(Debug, Error)]
#[error("{stage} failed: {error}")]
pub struct RunFailure {
    pub stage: WorkflowStage,
    #[source]
    pub error: AppError,
}

/// Receives progress while a run is underway
pub trait ProgressSink: Send + Sync {
    fn emit(&self, event: WorkflowEvent);
}

impl ProgressSink for UnboundedSender<WorkflowEvent> {
    fn emit(&self, event: WorkflowEvent) {
        if self.send(event).is_err() {
            tracing::debug!("Progress receiver dropped, client disconnected");
        }
    }
}

pub struct AdPipeline {
    environment: CredentialLayer,
    max_upload_bytes: usize,
    host: Arc<dyn ImageHost>,
    classifier: ImageClassifier,
    copywriter: AdCopyGenerator,
}

impl AdPipeline {
    /// Fails when a configured model reference is not `owner/name:version`
    pub fn new(
        settings: &Settings,
        host: Arc<dyn ImageHost>,
        model: Arc<dyn VisionModel>,
    ) -> Result<Self> {
        let classifier = ImageClassifier::new(
            model.clone(),
            ModelRef::parse(&settings.classifier_model)?,
            settings.classifier_max_tokens,
        );
        let copywriter = AdCopyGenerator::new(model, ModelRef::parse(&settings.copywriter_model)?);

        Ok(Self {
            environment: settings.credentials.clone(),
            max_upload_bytes: settings.max_upload_bytes,
            host,
            classifier,
            copywriter,
        })
    }

    /// Presence of the environment credentials
    pub fn environment(&self) -> &CredentialLayer {
        &self.environment
    }

    pub fn max_upload_bytes(&self) -> usize {
        self.max_upload_bytes
    }

    /// Run the whole workflow for one upload.
    ///
    /// `session` holds the credentials the page sent with this run; its
    /// non-blank values override the environment.
    pub async fn run(
        &self,
        run_id: &str,
        upload: UploadedImage,
        session: &CredentialLayer,
        progress: &dyn ProgressSink,
    ) -> std::result::Result<AdRun, RunFailure> {
        let span = log_context!(run_id, upload.filename.as_str());

        async {
            log_run_start(run_id, &upload.filename, upload.size());

            let result = self.execute(run_id, &upload, session, progress).await;
            match &result {
                Ok(run) => log_run_success(run_id, &run.draft.image_type, run.draft.description.len()),
                Err(failure) => log_run_failure(run_id, failure.stage, &failure.error),
            }
            result
        }
        .instrument(span)
        .await
    }

    async fn execute(
        &self,
        run_id: &str,
        upload: &UploadedImage,
        session: &CredentialLayer,
        progress: &dyn ProgressSink,
    ) -> std::result::Result<AdRun, RunFailure> {
        validate_upload(upload, self.max_upload_bytes)
            .map_err(step_failed(WorkflowStage::Idle, run_id))?;
        let credentials = Credentials::resolve(&self.environment, session)
            .map_err(step_failed(WorkflowStage::Idle, run_id))?;
        let temp = TempImage::acquire(upload, self.max_upload_bytes)
            .map_err(step_failed(WorkflowStage::Idle, run_id))?;

        progress.emit(WorkflowEvent::Stage { stage: WorkflowStage::Uploading });
        log_step_start(LogOperation::Hosting, run_id);
        let hosted = self
            .host
            .upload(temp.path(), &credentials.hosting)
            .await
            .map_err(step_failed(WorkflowStage::Uploading, run_id))?;
        log_hosted_image(run_id, &hosted.public_url, hosted.delete_hash.as_deref());
        progress.emit(WorkflowEvent::Hosted { image: hosted.clone() });

        progress.emit(WorkflowEvent::Stage { stage: WorkflowStage::Classifying });
        log_step_start(LogOperation::Classification, run_id);
        let image_type = self
            .classifier
            .classify(&hosted, &credentials.inference_token)
            .await
            .map_err(step_failed(WorkflowStage::Classifying, run_id))?;
        log_step_success(LogOperation::Classification, run_id, image_type.chars().count());
        progress.emit(WorkflowEvent::Classified { image_type: image_type.clone() });

        progress.emit(WorkflowEvent::Stage { stage: WorkflowStage::Describing });
        log_step_start(LogOperation::Description, run_id);
        let description = self
            .copywriter
            .describe(&temp, &image_type, &credentials.inference_token)
            .await
            .map_err(step_failed(WorkflowStage::Describing, run_id))?;
        log_step_success(LogOperation::Description, run_id, description.chars().count());
        progress.emit(WorkflowEvent::Described { description: description.clone() });

        // The guard logs its own release failure; the run has already succeeded.
        let _ = temp.release();

        Ok(AdRun {
            run_id: run_id.to_string(),
            image: hosted,
            draft: AdDraft::new(image_type, description),
            generated_at: Utc::now(),
        })
    }
}

fn step_failed(stage: WorkflowStage, run_id: &str) -> impl FnOnce(AppError) -> RunFailure + '_ {
    move |error| {
        log_step_error(LogOperation::for_stage(stage), run_id, &error);
        RunFailure { stage, error }
    }
}
