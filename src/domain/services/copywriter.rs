use std::sync::Arc;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;

use crate::domain::models::description_prompt;
use crate::shared::errors::Result;
use crate::shared::utils::drain_fragments;

use super::intake::TempImage;
use super::replicate::{ModelRef, VisionModel};

pub const DEFAULT_COPYWRITER_MODEL: &str =
    "yorickvp/llava-13b:2facb4a474a0462c15041b78b1ad70952ea46b5ec6ad29583c0b29dbd4249591";

/// Writes the marketing description from the local image and its type
pub struct AdCopyGenerator {
    model: Arc<dyn VisionModel>,
    model_ref: ModelRef,
}

impl AdCopyGenerator {
    pub fn new(model: Arc<dyn VisionModel>, model_ref: ModelRef) -> Self {
        Self { model, model_ref }
    }

    /// The image goes inline as a data URI read from the temporary file
    pub async fn describe(&self, image: &TempImage, image_type: &str, token: &str) -> Result<String> {
        let bytes = image.read_bytes().await?;
        let data_uri = format!(
            "data:{};base64,{}",
            image.extension().media_type(),
            STANDARD.encode(&bytes)
        );

        let input = serde_json::json!({
            "image": data_uri,
            "prompt": description_prompt(image_type),
        });

        let fragments = self.model.stream(&self.model_ref, input, token).await?;
        drain_fragments(fragments).await
    }
}
