//! Ad generation endpoints
//!
//! `POST /api/ads` takes the image and any session credentials as multipart
//! form data and streams the run's progress back as NDJSON.

use std::convert::Infallible;
use std::sync::Arc;

use axum::{
    Extension, Json, Router,
    body::Body,
    extract::{DefaultBodyLimit, Multipart, multipart::MultipartError},
    http::{StatusCode, header},
    response::Response,
    routing::{get, post},
};
use futures::StreamExt;
use serde::Serialize;
use tokio_stream::wrappers::UnboundedReceiverStream;
use tower_http::trace::TraceLayer;
use uuid::Uuid;

use crate::domain::models::{
    CredentialLayer, CredentialStatus, UploadLimits, UploadedImage, WorkflowEvent, WorkflowStage,
};
use crate::domain::services::{AdPipeline, ProgressSink};
use crate::shared::errors::AppError;

/// Room for multipart boundaries and the credential fields on top of the image
const MULTIPART_OVERHEAD: usize = 64 * 1024;

/// Error body for requests rejected before a run starts
#[derive(Debug, Serialize)]
pub struct ApiError {
    pub error: String,
    pub code: String,
}

type ApiRejection = (StatusCode, Json<ApiError>);

fn rejection(status: StatusCode, error: impl Into<String>, code: &str) -> ApiRejection {
    (
        status,
        Json(ApiError {
            error: error.into(),
            code: code.to_string(),
        }),
    )
}

/// Shared by both endpoints, passed as an `Extension`
#[derive(Clone)]
pub struct AdsState {
    pub pipeline: Arc<AdPipeline>,
}

impl AdsState {
    pub fn new(pipeline: AdPipeline) -> Self {
        Self {
            pipeline: Arc::new(pipeline),
        }
    }
}

/// Fields of one `POST /api/ads` form
#[derive(Default)]
struct AdForm {
    file: Option<(String, Vec<u8>)>,
    replicate_token: String,
    imgur_client_id: String,
    imgur_client_secret: String,
}

async fn read_form(mut multipart: Multipart, max_upload_bytes: usize) -> Result<AdForm, ApiRejection> {
    let invalid = |e: MultipartError| {
        let status = e.status();
        if status == StatusCode::PAYLOAD_TOO_LARGE {
            tracing::warn!(max_upload_bytes, "Upload exceeded the body limit");
            return rejection(
                status,
                format!("File too large. Maximum: {} bytes", max_upload_bytes),
                "UPLOAD_TOO_LARGE",
            );
        }
        tracing::warn!("Failed to read multipart request: {}", e);
        rejection(status, format!("Invalid multipart request: {}", e), "INVALID_REQUEST")
    };

    let mut form = AdForm::default();
    while let Some(field) = multipart.next_field().await.map_err(invalid)? {
        let name = field.name().map(str::to_string);
        match name.as_deref() {
            Some("file") => {
                let filename = field.file_name().unwrap_or_default().to_string();
                let bytes = field.bytes().await.map_err(invalid)?;
                form.file = Some((filename, bytes.to_vec()));
            }
            Some("replicate_token") => form.replicate_token = field.text().await.map_err(invalid)?,
            Some("imgur_client_id") => form.imgur_client_id = field.text().await.map_err(invalid)?,
            Some("imgur_client_secret") => {
                form.imgur_client_secret = field.text().await.map_err(invalid)?
            }
            other => tracing::debug!(field = ?other, "Ignoring unknown form field"),
        }
    }
    Ok(form)
}

fn failed_event(stage: WorkflowStage, error: &AppError) -> WorkflowEvent {
    WorkflowEvent::Failed {
        stage,
        kind: error.kind(),
        message: error.to_string(),
    }
}

/// POST /api/ads
pub async fn create_ad_handler(
    Extension(state): Extension<AdsState>,
    multipart: Multipart,
) -> Result<Response, ApiRejection> {
    let form = read_form(multipart, state.pipeline.max_upload_bytes()).await?;
    let (filename, bytes) = form.file.ok_or_else(|| {
        tracing::warn!("No file field in ad request");
        rejection(StatusCode::BAD_REQUEST, "No file provided", "NO_FILE")
    })?;
    let session = CredentialLayer::from_inputs(
        &form.replicate_token,
        &form.imgur_client_id,
        &form.imgur_client_secret,
    );

    let run_id = Uuid::new_v4().to_string();
    tracing::info!(
        run_id = %run_id,
        filename = %filename,
        session_overrides = !session.is_empty(),
        "Starting ad request"
    );

    let (tx, rx) = tokio::sync::mpsc::unbounded_channel::<WorkflowEvent>();
    let pipeline = state.pipeline.clone();
    let task_run_id = run_id.clone();
    tokio::spawn(async move {
        let outcome = match UploadedImage::new(filename, bytes) {
            Ok(upload) => match pipeline.run(&task_run_id, upload, &session, &tx).await {
                Ok(run) => WorkflowEvent::Ready { run },
                Err(failure) => failed_event(failure.stage, &failure.error),
            },
            Err(error) => {
                tracing::warn!(run_id = %task_run_id, "Rejected upload: {}", error);
                failed_event(WorkflowStage::Idle, &error)
            }
        };
        tx.emit(outcome);
        tx.emit(WorkflowEvent::Done);
    });

    let stream = UnboundedReceiverStream::new(rx)
        .map(|event| Ok::<_, Infallible>(event.to_ndjson_line()));

    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, "application/x-ndjson")
        .header(header::CACHE_CONTROL, "no-cache")
        .header("X-Run-Id", run_id)
        .body(Body::from_stream(stream))
        .map_err(|e| {
            tracing::error!("Failed to build response: {}", e);
            rejection(StatusCode::INTERNAL_SERVER_ERROR, "Failed to build response", "INTERNAL")
        })
}

/// GET /api/credentials/status
/// Which credentials the server environment provides; never the values
pub async fn credential_status_handler(
    Extension(state): Extension<AdsState>,
) -> Json<CredentialStatus> {
    Json(state.pipeline.environment().status())
}

/// GET /api/upload/limits
pub async fn upload_limits_handler(Extension(state): Extension<AdsState>) -> Json<UploadLimits> {
    Json(UploadLimits {
        max_upload_bytes: state.pipeline.max_upload_bytes(),
    })
}

/// All endpoints with their body limit, request tracing and state attached
pub fn ads_routes(state: AdsState) -> Router {
    let body_limit = state.pipeline.max_upload_bytes() + MULTIPART_OVERHEAD;

    Router::new()
        .route("/api/ads", post(create_ad_handler))
        .route("/api/credentials/status", get(credential_status_handler))
        .route("/api/upload/limits", get(upload_limits_handler))
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(TraceLayer::new_for_http())
        .layer(Extension(state))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Settings;
    use crate::domain::services::testing::{FakeHost, HOSTED_URL, ScriptedModel, png_bytes};
    use axum::http::Request;
    use http_body_util::BodyExt;
    use tower::ServiceExt;

    const BOUNDARY: &str = "----ad-generator-test";

    fn app(settings: &Settings, model: Arc<ScriptedModel>) -> Router {
        let pipeline = AdPipeline::new(settings, Arc::new(FakeHost::hosting()), model).unwrap();
        ads_routes(AdsState::new(pipeline))
    }

    fn multipart_body(file: Option<(&str, &[u8])>, fields: &[(&str, &str)]) -> Vec<u8> {
        let mut body = Vec::new();
        for (name, value) in fields {
            body.extend_from_slice(
                format!(
                    "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n"
                )
                .as_bytes(),
            );
        }
        if let Some((filename, bytes)) = file {
            body.extend_from_slice(
                format!(
                    "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"file\"; filename=\"{filename}\"\r\nContent-Type: application/octet-stream\r\n\r\n"
                )
                .as_bytes(),
            );
            body.extend_from_slice(bytes);
            body.extend_from_slice(b"\r\n");
        }
        body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());
        body
    }

    fn ads_request(body: Vec<u8>) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri("/api/ads")
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={BOUNDARY}"),
            )
            .body(Body::from(body))
            .unwrap()
    }

    async fn events(response: Response) -> Vec<WorkflowEvent> {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        String::from_utf8(bytes.to_vec())
            .unwrap()
            .lines()
            .map(|line| serde_json::from_str(line).unwrap())
            .collect()
    }

    const CREDENTIAL_FIELDS: &[(&str, &str)] = &[
        ("replicate_token", "r8_session"),
        ("imgur_client_id", "client-id"),
        ("imgur_client_secret", "client-secret"),
    ];

    #[tokio::test]
    async fn test_successful_run_streams_ready_then_done() {
        let model = Arc::new(
            ScriptedModel::new()
                .then_fragments(vec!["Sports Car"])
                .then_fragments(vec!["Built for speed."]),
        );
        let png = png_bytes();
        let response = app(&Settings::default(), model.clone())
            .oneshot(ads_request(multipart_body(Some(("car.PNG", &png)), CREDENTIAL_FIELDS)))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers()[header::CONTENT_TYPE],
            "application/x-ndjson"
        );
        let run_id = response.headers()["x-run-id"].to_str().unwrap().to_string();

        let events = events(response).await;
        assert_eq!(events.first(), Some(&WorkflowEvent::Stage { stage: WorkflowStage::Uploading }));
        assert_eq!(events.last(), Some(&WorkflowEvent::Done));

        match &events[events.len() - 2] {
            WorkflowEvent::Ready { run } => {
                assert_eq!(run.run_id, run_id);
                assert_eq!(run.image.public_url, HOSTED_URL);
                assert_eq!(
                    run.draft.editable_text,
                    "Discover the perfect sports car! Built for speed."
                );
            }
            other => panic!("expected ready event, got {:?}", other),
        }
        assert!(model.calls().iter().all(|call| call.token == "r8_session"));
    }

    #[tokio::test]
    async fn test_missing_credentials_stream_failure() {
        let model = Arc::new(ScriptedModel::new());
        let png = png_bytes();
        let response = app(&Settings::default(), model.clone())
            .oneshot(ads_request(multipart_body(Some(("car.png", &png)), &[])))
            .await
            .unwrap();

        let events = events(response).await;
        assert_eq!(events.len(), 2);
        match &events[0] {
            WorkflowEvent::Failed { stage, kind, message } => {
                assert_eq!(*stage, WorkflowStage::Idle);
                assert_eq!(*kind, crate::shared::errors::ErrorKind::Credentials);
                assert!(message.contains("Replicate API token"));
            }
            other => panic!("expected failed event, got {:?}", other),
        }
        assert_eq!(events[1], WorkflowEvent::Done);
        assert!(model.calls().is_empty());
    }

    #[tokio::test]
    async fn test_unsupported_extension_is_validation_failure() {
        let response = app(&Settings::default(), Arc::new(ScriptedModel::new()))
            .oneshot(ads_request(multipart_body(
                Some(("anim.gif", b"GIF89a")),
                CREDENTIAL_FIELDS,
            )))
            .await
            .unwrap();

        let events = events(response).await;
        assert!(matches!(
            &events[0],
            WorkflowEvent::Failed { kind: crate::shared::errors::ErrorKind::Validation, .. }
        ));
        assert_eq!(events.last(), Some(&WorkflowEvent::Done));
    }

    #[tokio::test]
    async fn test_request_without_file_is_rejected() {
        let response = app(&Settings::default(), Arc::new(ScriptedModel::new()))
            .oneshot(ads_request(multipart_body(None, CREDENTIAL_FIELDS)))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["code"], "NO_FILE");
    }

    #[tokio::test]
    async fn test_credential_status_reports_presence_only() {
        let settings = Settings::from_vars(|key| match key {
            "REPLICATE_KEY" => Some("r8_top_secret".to_string()),
            "IMGUR_CLIENT_ID" => Some("env-client-id".to_string()),
            _ => None,
        });
        let response = app(&settings, Arc::new(ScriptedModel::new()))
            .oneshot(
                Request::builder()
                    .uri("/api/credentials/status")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let text = String::from_utf8(bytes.to_vec()).unwrap();
        assert!(!text.contains("r8_top_secret"));
        assert!(!text.contains("env-client-id"));

        let status: CredentialStatus = serde_json::from_str(&text).unwrap();
        assert!(status.inference_token);
        assert!(status.hosting_client_id);
        assert!(!status.hosting_client_secret);
    }

    fn small_limit_settings() -> Settings {
        Settings::from_vars(|key| match key {
            "MAX_UPLOAD_BYTES" => Some("1024".to_string()),
            _ => None,
        })
    }

    #[tokio::test]
    async fn test_upload_limits_follow_settings() {
        let response = app(&small_limit_settings(), Arc::new(ScriptedModel::new()))
            .oneshot(
                Request::builder()
                    .uri("/api/upload/limits")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let limits: UploadLimits = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(limits.max_upload_bytes, 1024);
    }

    #[tokio::test]
    async fn test_body_over_limit_is_rejected_as_too_large() {
        let oversized = vec![0u8; 1024 + MULTIPART_OVERHEAD + 1];
        let response = app(&small_limit_settings(), Arc::new(ScriptedModel::new()))
            .oneshot(ads_request(multipart_body(
                Some(("big.png", &oversized)),
                CREDENTIAL_FIELDS,
            )))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["code"], "UPLOAD_TOO_LARGE");
        assert!(body["error"].as_str().unwrap().contains("1024 bytes"));
    }

    #[tokio::test]
    async fn test_upload_between_limit_and_body_limit_is_validation_failure() {
        let model = Arc::new(ScriptedModel::new());
        let mut png = png_bytes();
        png.resize(2048, 0);
        let response = app(&small_limit_settings(), model.clone())
            .oneshot(ads_request(multipart_body(Some(("car.png", &png)), CREDENTIAL_FIELDS)))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let events = events(response).await;
        assert!(matches!(
            &events[0],
            WorkflowEvent::Failed { kind: crate::shared::errors::ErrorKind::Validation, .. }
        ));
        assert!(model.calls().is_empty());
    }
}
