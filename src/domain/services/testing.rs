//! In-memory stand-ins for the remote services, shared by the service and
//! handler tests.

use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use async_trait::async_trait;
use futures::stream::{self, StreamExt};

use super::imgur::ImageHost;
use super::replicate::{FragmentStream, ModelRef, VisionModel};
use crate::domain::models::{HostedImage, HostingCredentials};
use crate::shared::errors::{AppError, Result};

pub const HOSTED_URL: &str = "https://i.imgur.com/aB3dE.png";

/// Smallest byte sequence the intake sniffer accepts as PNG
pub fn png_bytes() -> Vec<u8> {
    let mut bytes = vec![0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A];
    bytes.extend_from_slice(b"\0\0\0\rIHDR");
    bytes
}

/// One recorded model call
#[derive(Debug, Clone)]
pub struct ModelCall {
    pub model: String,
    pub input: serde_json::Value,
    pub token: String,
}

/// Answers each call with the next scripted outcome
#[derive(Default)]
pub struct ScriptedModel {
    outcomes: Mutex<VecDeque<std::result::Result<Vec<&'static str>, fn() -> AppError>>>,
    calls: Mutex<Vec<ModelCall>>,
}

impl ScriptedModel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn then_fragments(self, fragments: Vec<&'static str>) -> Self {
        self.push(Ok(fragments))
    }

    pub fn then_error(self, error: fn() -> AppError) -> Self {
        self.push(Err(error))
    }

    fn push(self, outcome: std::result::Result<Vec<&'static str>, fn() -> AppError>) -> Self {
        self.outcomes.lock().unwrap().push_back(outcome);
        self
    }

    pub fn calls(&self) -> Vec<ModelCall> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl VisionModel for ScriptedModel {
    async fn stream(
        &self,
        model: &ModelRef,
        input: serde_json::Value,
        token: &str,
    ) -> Result<FragmentStream> {
        self.calls.lock().unwrap().push(ModelCall {
            model: model.to_string(),
            input,
            token: token.to_string(),
        });

        let outcome = self.outcomes.lock().unwrap().pop_front();
        match outcome {
            Some(Ok(fragments)) => Ok(stream::iter(
                fragments.into_iter().map(|f| Ok(f.to_string())).collect::<Vec<_>>(),
            )
            .boxed()),
            Some(Err(error)) => Err(error()),
            None => Err(AppError::Inference("no scripted response left".to_string())),
        }
    }
}

/// Image host that records what it was asked to upload
pub struct FakeHost {
    outcome: std::result::Result<HostedImage, fn() -> AppError>,
    uploads: Mutex<Vec<(PathBuf, bool)>>,
}

impl FakeHost {
    pub fn hosting() -> Self {
        Self {
            outcome: Ok(HostedImage {
                public_url: HOSTED_URL.to_string(),
                delete_hash: Some("xyz789".to_string()),
            }),
            uploads: Mutex::new(Vec::new()),
        }
    }

    pub fn failing(error: fn() -> AppError) -> Self {
        Self {
            outcome: Err(error),
            uploads: Mutex::new(Vec::new()),
        }
    }

    /// Paths uploaded so far, with whether the file existed at upload time
    pub fn uploads(&self) -> Vec<(PathBuf, bool)> {
        self.uploads.lock().unwrap().clone()
    }
}

#[async_trait]
impl ImageHost for FakeHost {
    async fn upload(&self, path: &Path, _credentials: &HostingCredentials) -> Result<HostedImage> {
        self.uploads
            .lock()
            .unwrap()
            .push((path.to_path_buf(), path.exists()));
        match &self.outcome {
            Ok(image) => Ok(image.clone()),
            Err(error) => Err(error()),
        }
    }
}
