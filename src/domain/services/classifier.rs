use std::sync::Arc;

use crate::domain::models::{CLASSIFIER_PROMPT, HostedImage};
use crate::shared::errors::Result;
use crate::shared::utils::drain_fragments;

use super::replicate::{ModelRef, VisionModel};

pub const DEFAULT_CLASSIFIER_MODEL: &str =
    "lucataco/fuyu-8b:42f23bc876570a46f5a90737086fbc4c3f79dd11753a28eaa39544dd391815e9";

pub const DEFAULT_MAX_NEW_TOKENS: u32 = 512;

/// Names what the hosted image shows, in a few words
pub struct ImageClassifier {
    model: Arc<dyn VisionModel>,
    model_ref: ModelRef,
    max_new_tokens: u32,
}

impl ImageClassifier {
    pub fn new(model: Arc<dyn VisionModel>, model_ref: ModelRef, max_new_tokens: u32) -> Self {
        Self {
            model,
            model_ref,
            max_new_tokens,
        }
    }

    /// Run the classifier against the public URL and drain its output
    pub async fn classify(&self, image: &HostedImage, token: &str) -> Result<String> {
        let input = serde_json::json!({
            "image": image.public_url,
            "prompt": CLASSIFIER_PROMPT,
            "max_new_tokens": self.max_new_tokens,
        });

        let fragments = self.model.stream(&self.model_ref, input, token).await?;
        drain_fragments(fragments).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::errors::AppError;
    use crate::domain::services::testing::{HOSTED_URL, ScriptedModel};

    fn hosted() -> HostedImage {
        HostedImage {
            public_url: HOSTED_URL.to_string(),
            delete_hash: None,
        }
    }

    fn classifier(model: Arc<ScriptedModel>) -> ImageClassifier {
        ImageClassifier::new(
            model,
            ModelRef::parse(DEFAULT_CLASSIFIER_MODEL).unwrap(),
            DEFAULT_MAX_NEW_TOKENS,
        )
    }

    #[tokio::test]
    async fn test_classify_sends_url_prompt_and_budget() {
        let model = Arc::new(ScriptedModel::new().then_fragments(vec!["Sports", " Car"]));
        let image_type = classifier(model.clone()).classify(&hosted(), "r8_tok").await.unwrap();

        assert_eq!(image_type, "Sports Car");

        let calls = model.calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].model, DEFAULT_CLASSIFIER_MODEL);
        assert_eq!(calls[0].token, "r8_tok");
        assert_eq!(
            calls[0].input,
            serde_json::json!({
                "image": HOSTED_URL,
                "prompt": CLASSIFIER_PROMPT,
                "max_new_tokens": 512,
            })
        );
    }

    #[tokio::test]
    async fn test_whitespace_output_is_returned_verbatim() {
        let model = Arc::new(ScriptedModel::new().then_fragments(vec![" ", "\n"]));
        let image_type = classifier(model).classify(&hosted(), "tok").await.unwrap();
        assert_eq!(image_type, " \n");
    }

    #[tokio::test]
    async fn test_empty_stream_yields_empty_text() {
        let model = Arc::new(ScriptedModel::new().then_fragments(vec![]));
        let image_type = classifier(model).classify(&hosted(), "tok").await.unwrap();
        assert_eq!(image_type, "");
    }

    #[tokio::test]
    async fn test_model_error_propagates() {
        let model = Arc::new(
            ScriptedModel::new().then_error(|| AppError::Inference("model offline".into())),
        );
        assert!(matches!(
            classifier(model).classify(&hosted(), "tok").await,
            Err(AppError::Inference(_))
        ));
    }
}
