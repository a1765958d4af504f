//! Ad workflow hook
//!
//! Wraps [`AdSession`] in a signal and drives `/api/ads` from the browser:
//! the selected file and the session credentials go up as multipart form
//! data, progress comes back as NDJSON and is folded into the session.
//! The upload size limit is read from `/api/upload/limits` so the page
//! checks files against the same value the server enforces.

use dioxus::prelude::*;

use crate::domain::models::{AdSession, CredentialLayer, UploadLimits, WorkflowEvent};
use crate::shared::errors::ErrorKind;

/// DOM id of the file input the upload control renders
pub const UPLOAD_INPUT_ID: &str = "ad-image-input";

#[derive(Clone, Copy, PartialEq)]
pub struct AdWorkflowState {
    pub session: Signal<AdSession>,
    /// Server limits; the default until `/api/upload/limits` answers
    pub limits: Signal<UploadLimits>,
}

impl AdWorkflowState {
    /// Start a new run; returns the generation its events must carry
    pub fn begin(&mut self, filename: impl Into<String>) -> u64 {
        self.session.write().begin_run(filename)
    }

    /// Report a problem found before anything was sent
    pub fn reject(&mut self, kind: ErrorKind, message: impl Into<String>) {
        self.session.write().reject(kind, message);
    }

    pub fn is_current(&self, generation: u64) -> bool {
        self.session.peek().is_current(generation)
    }

    pub fn apply(&mut self, generation: u64, event: WorkflowEvent) {
        self.session.write().apply_for(generation, event);
    }

    pub fn fail(&mut self, generation: u64, kind: ErrorKind, message: impl Into<String>) {
        self.session.write().fail_for(generation, kind, message);
    }

    pub fn fail_transport(&mut self, generation: u64, message: impl Into<String>) {
        self.fail(generation, ErrorKind::Remote, message);
    }

    pub fn edit_text(&mut self, text: String) {
        self.session.write().edit_text(text);
    }

    pub fn preview(&mut self) {
        self.session.write().preview();
    }

    pub fn is_busy(&self) -> bool {
        self.session.read().is_busy()
    }
}

pub fn use_ad_workflow() -> AdWorkflowState {
    let session = use_signal(AdSession::default);
    let mut limits = use_signal(UploadLimits::default);

    use_effect(move || {
        spawn(async move {
            match fetch_upload_limits().await {
                Ok(fetched) => limits.set(fetched),
                Err(e) => tracing::warn!("Could not load upload limits: {}", e),
            }
        });
    });

    AdWorkflowState { session, limits }
}

/// Kind of a request the server refused before starting a run
pub fn rejection_kind(status: u16) -> ErrorKind {
    match status {
        // malformed form, missing file, body over the upload limit
        400 | 413 => ErrorKind::Validation,
        401 | 403 => ErrorKind::Credentials,
        _ => ErrorKind::Remote,
    }
}

/// GET /api/upload/limits
#[cfg(target_arch = "wasm32")]
pub async fn fetch_upload_limits() -> Result<UploadLimits, String> {
    use gloo_net::http::Request;

    let response = Request::get("/api/upload/limits")
        .send()
        .await
        .map_err(|e| format!("Network request failed: {}", e))?;

    if !response.ok() {
        return Err(format!("Server error: {}", response.status()));
    }

    response
        .json::<UploadLimits>()
        .await
        .map_err(|e| format!("Invalid upload limits: {}", e))
}

/// Server-side stub
#[cfg(not(target_arch = "wasm32"))]
pub async fn fetch_upload_limits() -> Result<UploadLimits, String> {
    Err("Upload limits are fetched by the browser".to_string())
}

/// Read the file picked in the upload input and start a run for it
#[cfg(target_arch = "wasm32")]
pub fn start_upload(overrides: CredentialLayer, mut state: AdWorkflowState) {
    use wasm_bindgen::JsCast;

    let file = web_sys::window()
        .and_then(|w| w.document())
        .and_then(|d| d.get_element_by_id(UPLOAD_INPUT_ID))
        .and_then(|el| el.dyn_into::<web_sys::HtmlInputElement>().ok())
        .and_then(|input| input.files())
        .and_then(|files| files.get(0));

    match file {
        Some(file) => {
            spawn(async move {
                submit_image(file, overrides, state).await;
            });
        }
        None => {
            tracing::warn!("Upload input has no selected file");
            state.reject(ErrorKind::Validation, "No file selected");
        }
    }
}

/// Server-side stub (no file input outside the browser)
#[cfg(not(target_arch = "wasm32"))]
pub fn start_upload(_overrides: CredentialLayer, _state: AdWorkflowState) {
    tracing::warn!("Uploads are only available in the browser");
}

/// Upload one file and follow the run until its `done` event
#[cfg(target_arch = "wasm32")]
pub async fn submit_image(file: web_sys::File, overrides: CredentialLayer, mut state: AdWorkflowState) {
    let filename = file.name();
    let size = file.size() as usize;

    // Same checks the server runs, so obvious mistakes never leave the page
    let limits = *state.limits.peek();
    if let Err(e) = limits.check(&filename, size) {
        state.reject(e.kind(), e.to_string());
        return;
    }

    let generation = state.begin(filename.clone());

    let response = match post_ad_form(&file, &filename, &overrides).await {
        Ok(response) => response,
        Err((kind, message)) => {
            tracing::error!("Ad request failed: {}", message);
            state.fail(generation, kind, message);
            return;
        }
    };

    if let Err(message) = read_events(response, generation, state).await {
        tracing::error!("Reading ad progress failed: {}", message);
        state.fail_transport(generation, message);
        return;
    }

    if state.is_current(generation) && state.is_busy() {
        state.fail_transport(generation, "Connection closed before the run finished");
    }
}

#[cfg(target_arch = "wasm32")]
async fn post_ad_form(
    file: &web_sys::File,
    filename: &str,
    overrides: &CredentialLayer,
) -> Result<web_sys::Response, (ErrorKind, String)> {
    use wasm_bindgen::JsCast;
    use wasm_bindgen_futures::JsFuture;
    use web_sys::{FormData, Request, RequestInit, RequestMode, Response};

    let transport = |message: String| (ErrorKind::Remote, message);

    let form = FormData::new().map_err(|_| transport("Failed to create form data".to_string()))?;
    form.append_with_blob_and_filename("file", file, filename)
        .map_err(|_| transport("Failed to attach file".to_string()))?;

    let overrides = overrides.normalized();
    let fields = [
        ("replicate_token", overrides.replicate_token),
        ("imgur_client_id", overrides.imgur_client_id),
        ("imgur_client_secret", overrides.imgur_client_secret),
    ];
    for (name, value) in fields {
        if let Some(value) = value {
            form.append_with_str(name, &value)
                .map_err(|_| transport(format!("Failed to attach {}", name)))?;
        }
    }

    // Content-Type is left to the browser so it carries the boundary
    let opts = RequestInit::new();
    opts.set_method("POST");
    opts.set_mode(RequestMode::SameOrigin);
    opts.set_body(&form);

    let request = Request::new_with_str_and_init("/api/ads", &opts)
        .map_err(|e| transport(format!("Failed to create request: {:?}", e)))?;

    let window = web_sys::window()
        .ok_or_else(|| transport("No window object available".to_string()))?;
    let value = JsFuture::from(window.fetch_with_request(&request))
        .await
        .map_err(|e| transport(format!("Network request failed: {:?}", e)))?;
    let response: Response = value
        .dyn_into()
        .map_err(|_| transport("Invalid response object".to_string()))?;

    if !response.ok() {
        let status = response.status();
        let body = match response.text() {
            Ok(promise) => JsFuture::from(promise)
                .await
                .ok()
                .and_then(|v| v.as_string())
                .unwrap_or_default(),
            Err(_) => String::new(),
        };
        let message = serde_json::from_str::<serde_json::Value>(&body)
            .ok()
            .and_then(|json| json["error"].as_str().map(str::to_string))
            .unwrap_or_else(|| format!("Server error: {}", status));
        return Err((rejection_kind(status), message));
    }

    Ok(response)
}

#[cfg(target_arch = "wasm32")]
async fn read_events(
    response: web_sys::Response,
    generation: u64,
    mut state: AdWorkflowState,
) -> Result<(), String> {
    use crate::shared::utils::NdjsonBuffer;
    use wasm_bindgen::{JsCast, JsValue};
    use wasm_bindgen_futures::JsFuture;

    let body = response.body().ok_or("Response has no body")?;
    let reader = body
        .get_reader()
        .dyn_into::<web_sys::ReadableStreamDefaultReader>()
        .map_err(|_| "Response body is not readable".to_string())?;

    let mut buffer = NdjsonBuffer::new();
    let mut apply_line = move |line: &str| -> Result<(), String> {
        let event: WorkflowEvent = serde_json::from_str(line)
            .map_err(|e| format!("Unexpected progress message: {}", e))?;
        state.apply(generation, event);
        Ok(())
    };

    loop {
        if !state.is_current(generation) {
            let _ = reader.cancel();
            return Ok(());
        }

        let result = JsFuture::from(reader.read())
            .await
            .map_err(|e| format!("Error reading stream: {:?}", e))?;

        let done = js_sys::Reflect::get(&result, &JsValue::from_str("done"))
            .unwrap_or(JsValue::TRUE)
            .as_bool()
            .unwrap_or(true);
        if done {
            break;
        }

        let chunk = js_sys::Reflect::get(&result, &JsValue::from_str("value"))
            .ok()
            .and_then(|v| v.dyn_into::<js_sys::Uint8Array>().ok());
        if let Some(chunk) = chunk {
            for line in buffer.push(&chunk.to_vec()) {
                apply_line(&line)?;
            }
        }
    }

    if let Some(line) = buffer.finish() {
        apply_line(&line)?;
    }
    Ok(())
}
