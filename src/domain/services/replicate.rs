//! Replicate predictions client
//!
//! A prediction is created with `stream: true`, then its `urls.stream`
//! endpoint is read as Server-Sent Events. Only `output` events carry text.

use std::collections::VecDeque;
use std::fmt::Display;

use async_trait::async_trait;
use futures::stream::{self, BoxStream, Stream, StreamExt};
use reqwest::{Client, StatusCode};
use serde::Deserialize;

use super::sse::{SseDecoder, SseEvent};
use crate::shared::errors::{AppError, Result};

pub const DEFAULT_REPLICATE_API_BASE: &str = "https://api.replicate.com/v1";

const SERVICE_NAME: &str = "Replicate";

/// Lazily produced text fragments of one model run
pub type FragmentStream = BoxStream<'static, Result<String>>;

/// Versioned model reference, `owner/name:version`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelRef {
    pub name: String,
    pub version: String,
}

impl ModelRef {
    pub fn parse(reference: &str) -> Result<Self> {
        let reference = reference.trim();
        let (name, version) = reference.split_once(':').ok_or_else(|| {
            AppError::Configuration(format!(
                "model reference '{}' must look like owner/name:version",
                reference
            ))
        })?;

        let valid_name = name
            .split_once('/')
            .is_some_and(|(owner, model)| !owner.is_empty() && !model.is_empty());
        if !valid_name || version.is_empty() {
            return Err(AppError::Configuration(format!(
                "model reference '{}' must look like owner/name:version",
                reference
            )));
        }

        Ok(Self {
            name: name.to_string(),
            version: version.to_string(),
        })
    }
}

impl Display for ModelRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.name, self.version)
    }
}

/// A hosted vision-language model that answers with streamed text
#[async_trait]
pub trait VisionModel: Send + Sync {
    async fn stream(
        &self,
        model: &ModelRef,
        input: serde_json::Value,
        token: &str,
    ) -> Result<FragmentStream>;
}

#[derive(Debug, Deserialize)]
struct Prediction {
    #[serde(default)]
    id: Option<String>,
    #[serde(default)]
    urls: PredictionUrls,
    #[serde(default)]
    error: Option<serde_json::Value>,
}

#[derive(Debug, Default, Deserialize)]
struct PredictionUrls {
    #[serde(default)]
    stream: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct DoneEvent {
    #[serde(default)]
    reason: Option<String>,
}

#[derive(Clone)]
pub struct ReplicateClient {
    client: Client,
    api_base: String,
}

impl ReplicateClient {
    pub fn new(api_base: impl Into<String>) -> Self {
        Self::with_client(Client::new(), api_base)
    }

    pub fn with_client(client: Client, api_base: impl Into<String>) -> Self {
        Self {
            client,
            api_base: api_base.into().trim_end_matches('/').to_string(),
        }
    }

    async fn create_prediction(
        &self,
        model: &ModelRef,
        input: serde_json::Value,
        token: &str,
    ) -> Result<Prediction> {
        let url = format!("{}/predictions", self.api_base);
        let body = serde_json::json!({
            "version": model.version,
            "input": input,
            "stream": true,
        });

        let response = self
            .client
            .post(&url)
            .bearer_auth(token)
            .json(&body)
            .send()
            .await
            .map_err(|e| AppError::Inference(format!("prediction request failed: {}", e)))?;

        let status = response.status();
        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            let message = response.text().await.unwrap_or_default();
            return Err(AppError::Unauthorized {
                service: SERVICE_NAME,
                message: format!("{} {}", status, message.trim()),
            });
        }
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(AppError::Inference(format!(
                "prediction request returned {}: {}",
                status,
                message.trim()
            )));
        }

        let prediction: Prediction = response
            .json()
            .await
            .map_err(|e| AppError::MalformedOutput(format!("prediction response: {}", e)))?;

        if let Some(error) = prediction.error.as_ref().filter(|e| !e.is_null()) {
            return Err(AppError::Inference(error.to_string()));
        }

        Ok(prediction)
    }
}

#[async_trait]
impl VisionModel for ReplicateClient {
    async fn stream(
        &self,
        model: &ModelRef,
        input: serde_json::Value,
        token: &str,
    ) -> Result<FragmentStream> {
        let prediction = self.create_prediction(model, input, token).await?;
        let stream_url = prediction.urls.stream.ok_or_else(|| {
            AppError::MalformedOutput("prediction has no stream URL".to_string())
        })?;

        tracing::debug!(
            model = %model,
            prediction_id = prediction.id.as_deref().unwrap_or("<unknown>"),
            "Prediction created, opening output stream"
        );

        let response = self
            .client
            .get(&stream_url)
            .bearer_auth(token)
            .header(reqwest::header::ACCEPT, "text/event-stream")
            .header(reqwest::header::CACHE_CONTROL, "no-store")
            .send()
            .await
            .map_err(|e| AppError::Inference(format!("output stream failed: {}", e)))?;

        if !response.status().is_success() {
            return Err(AppError::Inference(format!(
                "output stream returned {}",
                response.status()
            )));
        }

        Ok(fragment_stream(response.bytes_stream().boxed()))
    }
}

struct StreamState<S> {
    bytes: S,
    decoder: SseDecoder,
    pending: VecDeque<SseEvent>,
    eof: bool,
    finished: bool,
}

/// Turn a raw SSE byte stream into output fragments.
///
/// Ends cleanly on a `done` event; yields one error and ends on an `error`
/// event, a failed `done`, a transport error, or a stream that closes before
/// `done` arrives.
pub fn fragment_stream<S, B, E>(bytes: S) -> FragmentStream
where
    S: Stream<Item = std::result::Result<B, E>> + Send + Unpin + 'static,
    B: AsRef<[u8]> + Send + 'static,
    E: Display + Send + 'static,
{
    let state = StreamState {
        bytes,
        decoder: SseDecoder::new(),
        pending: VecDeque::new(),
        eof: false,
        finished: false,
    };

    stream::unfold(state, |mut state| async move {
        loop {
            if state.finished {
                return None;
            }

            if let Some(event) = state.pending.pop_front() {
                match event.event.as_str() {
                    "output" => return Some((Ok(event.data), state)),
                    "error" => {
                        state.finished = true;
                        return Some((Err(AppError::Inference(event.data)), state));
                    }
                    "done" => {
                        state.finished = true;
                        let done: DoneEvent = serde_json::from_str(&event.data).unwrap_or_default();
                        return match done.reason.as_deref() {
                            Some(reason @ ("canceled" | "error")) => Some((
                                Err(AppError::Inference(format!("prediction ended: {}", reason))),
                                state,
                            )),
                            _ => None,
                        };
                    }
                    _ => continue,
                }
            }

            if state.eof {
                state.finished = true;
                return Some((
                    Err(AppError::MalformedOutput(
                        "output stream closed before completion".to_string(),
                    )),
                    state,
                ));
            }

            match state.bytes.next().await {
                Some(Ok(chunk)) => {
                    let events = state.decoder.feed(chunk.as_ref());
                    state.pending.extend(events);
                }
                Some(Err(e)) => {
                    state.finished = true;
                    return Some((
                        Err(AppError::Inference(format!("output stream interrupted: {}", e))),
                        state,
                    ));
                }
                None => {
                    state.eof = true;
                    if let Some(event) = state.decoder.finish() {
                        state.pending.push_back(event);
                    }
                }
            }
        }
    })
    .boxed()
}
